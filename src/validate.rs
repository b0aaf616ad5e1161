//! Contains the [FixtureValidator], which checks fixtures against the canonical registry.

use crate::{
    diff::ConfigDiff,
    fixture::{ChainOverride, RollupOverride, TestCase},
    genesis::{genesis_hash, GenesisError},
    registry::{ChainRegistry, RegistryError},
    rollup::RollupConfig,
    util::read_json,
};
use alloy_genesis::Genesis;
use alloy_primitives::B256;
use serde::Serialize;
use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tracing::{debug, info};

/// The checks run against every fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Check {
    /// The rollup config matches the registry, after overrides.
    RollupConfig,
    /// The genesis chain config matches the registry, after overrides.
    ChainConfig,
    /// The genesis block hash matches the registry's genesis block hash.
    GenesisHash,
}

impl Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RollupConfig => write!(f, "rollup config"),
            Self::ChainConfig => write!(f, "chain config"),
            Self::GenesisHash => write!(f, "genesis hash"),
        }
    }
}

/// An error raised while validating a fixture.
#[derive(Debug, Error)]
pub(crate) enum ValidationError {
    /// The fixture could not be read.
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The fixture could not be decoded.
    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The registry lookup failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The fixture could not be materialized into a genesis block.
    #[error(transparent)]
    Genesis(#[from] GenesisError),
    /// An override was declared, but the fixture already matches the registry.
    #[error("{check} of chain {chain_id} already matches the registry; the override is stale")]
    StaleOverride { check: Check, chain_id: u64 },
    /// The fixture does not match the registry.
    #[error("{check} of chain {chain_id} does not match the registry:\n{diff}")]
    Mismatch {
        check: Check,
        chain_id: u64,
        diff: ConfigDiff,
    },
    /// The configs could not be diffed.
    #[error("failed to diff {check} of chain {chain_id}")]
    Diff {
        check: Check,
        chain_id: u64,
        #[source]
        source: serde_json::Error,
    },
    /// The genesis block hashes differ.
    #[error("genesis block hash of chain {chain_id} is {fixture}, the registry's is {canonical}")]
    GenesisHash {
        chain_id: u64,
        fixture: B256,
        canonical: B256,
    },
}

/// The outcome of every check run against a [TestCase].
#[derive(Debug)]
pub(crate) struct CaseReport {
    /// The test case.
    pub(crate) case: &'static TestCase,
    /// The outcome of each check, in execution order.
    pub(crate) outcomes: Vec<(Check, Result<(), ValidationError>)>,
}

impl CaseReport {
    /// Returns true if every check passed.
    pub(crate) fn passed(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_ok())
    }

    /// Returns the failed checks.
    pub(crate) fn failures(&self) -> impl Iterator<Item = (Check, &ValidationError)> {
        self.outcomes
            .iter()
            .filter_map(|(check, outcome)| outcome.as_ref().err().map(|e| (*check, e)))
    }
}

/// The diffs of a fixture against the registry, before and after its overrides.
#[derive(Debug, Default)]
pub(crate) struct CaseDiff {
    pub(crate) rollup_before: ConfigDiff,
    pub(crate) rollup_after: ConfigDiff,
    pub(crate) chain_before: ConfigDiff,
    pub(crate) chain_after: ConfigDiff,
}

/// Validates fixtures against a [ChainRegistry].
#[derive(Clone)]
pub(crate) struct FixtureValidator {
    /// The canonical registry.
    registry: Arc<dyn ChainRegistry + Send + Sync>,
    /// The directory fixture paths are relative to.
    root: PathBuf,
}

impl FixtureValidator {
    /// Create a new [FixtureValidator].
    pub(crate) fn new(registry: Arc<dyn ChainRegistry + Send + Sync>, root: PathBuf) -> Self {
        Self { registry, root }
    }

    /// Returns the directory fixture paths are relative to.
    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    /// Runs every check against the [TestCase]. A failing check does not stop the others.
    pub(crate) async fn validate_case(&self, case: &'static TestCase) -> CaseReport {
        let rollup_path = case.rollup_path(&self.root);
        let genesis_path = case.genesis_path(&self.root);

        let outcomes = vec![
            (
                Check::RollupConfig,
                self.validate_rollup_config(&rollup_path, case.chain_id, case.rollup_override)
                    .await,
            ),
            (
                Check::ChainConfig,
                self.validate_chain_config(&genesis_path, case.chain_id, case.chain_override)
                    .await,
            ),
            (
                Check::GenesisHash,
                self.validate_genesis_hash(&genesis_path, case.chain_id)
                    .await
                    .map(|_| ()),
            ),
        ];

        let report = CaseReport { case, outcomes };
        info!(
            target: "validator",
            "{}: {}",
            case.name,
            if report.passed() { "pass" } else { "fail" }
        );
        report
    }

    /// Checks the rollup config at `path` against the registry's config for `chain_id`.
    ///
    /// ## Takes
    /// - `path` - The path of the fixture's `rollup.json`.
    /// - `chain_id` - The L2 chain ID to look up in the registry.
    /// - `override_fn` - The known delta between the fixture and the registry, if any.
    ///
    /// ## Returns
    /// - `Ok(())` if the overridden fixture equals the registry config.
    pub(crate) async fn validate_rollup_config(
        &self,
        path: &Path,
        chain_id: u64,
        override_fn: Option<RollupOverride>,
    ) -> Result<(), ValidationError> {
        let fixture: RollupConfig = read_json(path).await?;
        let canonical = self.registry.load_rollup_config(chain_id)?;
        compare(Check::RollupConfig, chain_id, fixture, &canonical, override_fn)
    }

    /// Checks the chain config embedded in the genesis at `path` against the registry's chain
    /// config for `chain_id`.
    pub(crate) async fn validate_chain_config(
        &self,
        path: &Path,
        chain_id: u64,
        override_fn: Option<ChainOverride>,
    ) -> Result<(), ValidationError> {
        let fixture: Genesis = read_json(path).await?;
        let canonical = self.registry.load_chain_config(chain_id)?;
        compare(Check::ChainConfig, chain_id, fixture.config, &canonical, override_fn)
    }

    /// Checks that the genesis at `path` materializes into the same block as the registry's
    /// genesis for `chain_id`, and returns its hash.
    pub(crate) async fn validate_genesis_hash(
        &self,
        path: &Path,
        chain_id: u64,
    ) -> Result<B256, ValidationError> {
        let fixture: Genesis = read_json(path).await?;
        let canonical = self.registry.load_genesis(chain_id)?;

        let fixture_hash = genesis_hash(&fixture)?;
        let canonical_hash = genesis_hash(&canonical)?;
        debug!(target: "validator", "Chain {chain_id} genesis: fixture {fixture_hash}, registry {canonical_hash}");

        if fixture_hash != canonical_hash {
            return Err(ValidationError::GenesisHash {
                chain_id,
                fixture: fixture_hash,
                canonical: canonical_hash,
            });
        }
        Ok(fixture_hash)
    }

    /// Diffs the fixtures of the [TestCase] against the registry, before and after the
    /// overrides are applied.
    pub(crate) async fn diff_case(&self, case: &TestCase) -> Result<CaseDiff, ValidationError> {
        let mut rollup: RollupConfig = read_json(&case.rollup_path(&self.root)).await?;
        let genesis: Genesis = read_json(&case.genesis_path(&self.root)).await?;
        let mut chain = genesis.config;

        let canonical_rollup = self.registry.load_rollup_config(case.chain_id)?;
        let canonical_chain = self.registry.load_chain_config(case.chain_id)?;

        let rollup_before = diff(Check::RollupConfig, case.chain_id, &rollup, &canonical_rollup)?;
        let chain_before = diff(Check::ChainConfig, case.chain_id, &chain, &canonical_chain)?;
        if let Some(apply) = case.rollup_override {
            apply(&mut rollup);
        }
        if let Some(apply) = case.chain_override {
            apply(&mut chain);
        }

        Ok(CaseDiff {
            rollup_before,
            rollup_after: diff(Check::RollupConfig, case.chain_id, &rollup, &canonical_rollup)?,
            chain_before,
            chain_after: diff(Check::ChainConfig, case.chain_id, &chain, &canonical_chain)?,
        })
    }
}

/// Applies the override to the fixture and compares it with the canonical value.
///
/// A declared override must be load-bearing: if the fixture already equals the canonical value,
/// the override is reported as stale.
fn compare<T: PartialEq + Serialize>(
    check: Check,
    chain_id: u64,
    mut fixture: T,
    canonical: &T,
    override_fn: Option<fn(&mut T)>,
) -> Result<(), ValidationError> {
    if let Some(apply) = override_fn {
        if fixture == *canonical {
            return Err(ValidationError::StaleOverride { check, chain_id });
        }
        apply(&mut fixture);
    }

    if fixture != *canonical {
        return Err(ValidationError::Mismatch {
            check,
            chain_id,
            diff: diff(check, chain_id, &fixture, canonical)?,
        });
    }
    debug!(target: "validator", "Chain {chain_id} {check} matches the registry");
    Ok(())
}

fn diff<T: Serialize>(
    check: Check,
    chain_id: u64,
    fixture: &T,
    canonical: &T,
) -> Result<ConfigDiff, ValidationError> {
    ConfigDiff::between(fixture, canonical).map_err(|source| ValidationError::Diff {
        check,
        chain_id,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixture::TEST_CASES, registry::SUPERCHAIN_REGISTRY};
    use alloy_primitives::U256;
    use tempfile::tempdir;

    fn reset_block_time(cfg: &mut RollupConfig) {
        cfg.block_time = crate::rollup::BLOCK_TIME;
    }

    fn validator(root: PathBuf) -> FixtureValidator {
        FixtureValidator::new(Arc::new(SUPERCHAIN_REGISTRY.clone()), root)
    }

    fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn stale_rollup_override_is_reported() {
        let dir = tempdir().unwrap();
        let canonical = SUPERCHAIN_REGISTRY.load_rollup_config(8453).unwrap();
        let path = write_json(dir.path(), "rollup.json", &canonical);

        let validator = validator(dir.path().to_path_buf());
        let err = validator
            .validate_rollup_config(&path, 8453, Some(reset_block_time))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::StaleOverride {
                check: Check::RollupConfig,
                chain_id: 8453
            }
        ));

        // Without an override, the same fixture passes.
        validator
            .validate_rollup_config(&path, 8453, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn stale_chain_override_is_reported() {
        let dir = tempdir().unwrap();
        let case = &TEST_CASES[0];
        let canonical = SUPERCHAIN_REGISTRY.load_genesis(case.chain_id).unwrap();
        let path = write_json(dir.path(), "genesis.json", &canonical);

        let err = validator(dir.path().to_path_buf())
            .validate_chain_config(&path, case.chain_id, case.chain_override)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::StaleOverride {
                check: Check::ChainConfig,
                chain_id: 8453
            }
        ));
        assert_eq!(
            err.to_string(),
            "chain config of chain 8453 already matches the registry; the override is stale"
        );
    }

    #[tokio::test]
    async fn mismatch_carries_field_diff() {
        let dir = tempdir().unwrap();
        let mut fixture = SUPERCHAIN_REGISTRY.load_rollup_config(84532).unwrap();
        fixture.seq_window_size = 1;
        let path = write_json(dir.path(), "rollup.json", &fixture);

        let err = validator(dir.path().to_path_buf())
            .validate_rollup_config(&path, 84532, None)
            .await
            .unwrap_err();
        let ValidationError::Mismatch { diff, .. } = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(diff.fields.len(), 1);
        assert_eq!(diff.fields[0].path, "seq_window_size");
        assert!(err.to_string().contains("seq_window_size: fixture = 1, canonical = 3600"));
    }

    #[tokio::test]
    async fn chain_config_without_override_fails_on_drift() {
        let case = &TEST_CASES[0];
        let validator = validator(PathBuf::from(env!("CARGO_MANIFEST_DIR")));
        let err = validator
            .validate_chain_config(&case.genesis_path(validator.root()), case.chain_id, None)
            .await
            .unwrap_err();
        let ValidationError::Mismatch { diff, .. } = err else {
            panic!("expected a mismatch");
        };
        let paths = diff.fields.iter().map(|f| f.path.as_str()).collect::<Vec<_>>();
        assert_eq!(
            paths,
            vec!["canyonTime", "optimism.eip1559DenominatorCanyon", "shanghaiTime"]
        );
    }

    #[tokio::test]
    async fn tampered_alloc_changes_genesis_hash() {
        let dir = tempdir().unwrap();
        let mut genesis = SUPERCHAIN_REGISTRY.load_genesis(424).unwrap();
        let validator = validator(dir.path().to_path_buf());

        let path = write_json(dir.path(), "genesis.json", &genesis);
        let hash = validator.validate_genesis_hash(&path, 424).await.unwrap();

        let account = genesis.alloc.values_mut().next().unwrap();
        account.balance += U256::from(1);
        let path = write_json(dir.path(), "genesis.json", &genesis);
        let err = validator.validate_genesis_hash(&path, 424).await.unwrap_err();
        assert!(matches!(
            err,
            ValidationError::GenesisHash { chain_id: 424, canonical, .. } if canonical == hash
        ));
    }

    #[tokio::test]
    async fn missing_fixture_fails_every_check() {
        let dir = tempdir().unwrap();
        let report = validator(dir.path().to_path_buf())
            .validate_case(&TEST_CASES[1])
            .await;
        assert!(!report.passed());
        assert_eq!(report.failures().count(), 3);
        assert!(report
            .failures()
            .all(|(_, e)| matches!(e, ValidationError::Read { .. })));
    }

    #[tokio::test]
    async fn unknown_chain_is_a_registry_error() {
        let validator = validator(PathBuf::from(env!("CARGO_MANIFEST_DIR")));
        let path = TEST_CASES[0].rollup_path(validator.root());
        let err = validator
            .validate_rollup_config(&path, 1, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Registry(RegistryError::UnknownChain(1))
        ));
    }

    #[tokio::test]
    async fn diff_case_is_empty_after_overrides() {
        let validator = validator(PathBuf::from(env!("CARGO_MANIFEST_DIR")));
        let diff = validator.diff_case(&TEST_CASES[6]).await.unwrap();
        assert!(!diff.rollup_before.is_empty());
        assert!(!diff.chain_before.is_empty());
        assert!(diff.rollup_after.is_empty());
        assert!(diff.chain_after.is_empty());
        assert!(diff
            .chain_before
            .fields
            .iter()
            .any(|f| f.path == "regolithTime"));
    }
}
