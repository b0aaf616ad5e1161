//! Contains the superchain registry, the canonical source of rollup and chain configs.
//!
//! The registry is compiled into the binary from the `registry/` directory at the crate root:
//! one `superchain.toml` per network, one TOML definition per chain, and one genesis allocation
//! per chain.
//!
//! The `genesis.l2.hash` anchors are recorded values; they are not derived from the embedded
//! genesis allocations.

use crate::{
    chain::{op_stack_chain_config, OpChainForks},
    rollup::{RollupConfig, BLOCK_TIME, CHANNEL_TIMEOUT, MAX_SEQUENCER_DRIFT, SEQ_WINDOW_SIZE},
};
use alloy_genesis::{ChainConfig, Genesis};
use definition::{ChainDefinition, SuperchainDefinition};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

pub(crate) mod definition;

/// The embedded superchain registry.
pub(crate) static SUPERCHAIN_REGISTRY: Lazy<SuperchainRegistry> = Lazy::new(|| {
    SuperchainRegistry::from_embedded(EMBEDDED_SUPERCHAINS)
        .expect("Failed to parse embedded superchain registry")
});

/// Embeds the definitions of a superchain and its chains.
macro_rules! embed_superchain {
    ($network:literal => [$($chain:literal),* $(,)?]) => {
        EmbeddedSuperchain {
            network: $network,
            superchain: include_str!(concat!(
                "../../registry/superchain/", $network, "/superchain.toml"
            )),
            chains: &[$(EmbeddedChain {
                definition: include_str!(concat!(
                    "../../registry/superchain/", $network, "/", $chain, ".toml"
                )),
                genesis: include_str!(concat!(
                    "../../registry/genesis/", $network, "/", $chain, ".json"
                )),
            }),*],
        }
    };
}

const EMBEDDED_SUPERCHAINS: &[EmbeddedSuperchain] = &[
    embed_superchain!("mainnet" => ["base", "pgn", "zora"]),
    embed_superchain!("sepolia" => ["base", "pgn", "zora"]),
    embed_superchain!("goerli" => ["base"]),
];

/// The raw, embedded files of a superchain.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EmbeddedSuperchain {
    pub(crate) network: &'static str,
    pub(crate) superchain: &'static str,
    pub(crate) chains: &'static [EmbeddedChain],
}

/// The raw, embedded files of a chain.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EmbeddedChain {
    pub(crate) definition: &'static str,
    pub(crate) genesis: &'static str,
}

/// An error raised by a [ChainRegistry].
#[derive(Debug, Error)]
pub(crate) enum RegistryError {
    /// No chain with the given ID is registered.
    #[error("chain {0} is not in the registry")]
    UnknownChain(u64),
    /// Two chains share an ID.
    #[error("chain {0} is registered more than once")]
    DuplicateChain(u64),
    /// A registry definition failed to parse.
    #[error("malformed definition for {network}")]
    Definition {
        network: &'static str,
        #[source]
        source: toml::de::Error,
    },
    /// A registry genesis failed to parse.
    #[error("malformed genesis for chain {chain_id}")]
    Genesis {
        chain_id: u64,
        #[source]
        source: serde_json::Error,
    },
}

/// The canonical source of rollup and chain configs, keyed by L2 chain ID.
pub(crate) trait ChainRegistry {
    /// Returns the chain IDs of every registered chain, in ascending order.
    fn chains(&self) -> Vec<u64>;

    /// Loads the canonical [RollupConfig] for the chain.
    fn load_rollup_config(&self, chain_id: u64) -> Result<RollupConfig, RegistryError>;

    /// Loads the canonical execution-layer [ChainConfig] for the chain.
    fn load_chain_config(&self, chain_id: u64) -> Result<ChainConfig, RegistryError>;

    /// Loads the canonical [Genesis] for the chain.
    fn load_genesis(&self, chain_id: u64) -> Result<Genesis, RegistryError>;
}

/// A chain registered in a [SuperchainRegistry].
#[derive(Debug, Clone)]
pub(crate) struct RegisteredChain {
    /// The network the chain belongs to.
    pub(crate) network: &'static str,
    /// The superchain the chain belongs to.
    pub(crate) superchain: SuperchainDefinition,
    /// The chain definition.
    pub(crate) chain: ChainDefinition,
    /// The genesis allocation and header template, without a chain config.
    genesis: &'static str,
}

impl RegisteredChain {
    fn forks(&self) -> OpChainForks {
        OpChainForks {
            regolith_time: self.chain.regolith_time.unwrap_or_default(),
            canyon_time: self
                .chain
                .hardforks
                .or(self.superchain.hardforks)
                .canyon_time,
        }
    }
}

/// A [ChainRegistry] backed by superchain definitions.
#[derive(Default, Debug, Clone)]
pub(crate) struct SuperchainRegistry {
    chains: BTreeMap<u64, RegisteredChain>,
}

impl SuperchainRegistry {
    /// Parses the registry from embedded superchain files.
    pub(crate) fn from_embedded(
        superchains: &[EmbeddedSuperchain],
    ) -> Result<Self, RegistryError> {
        let mut chains = BTreeMap::new();
        for embedded in superchains {
            let superchain: SuperchainDefinition =
                toml::from_str(embedded.superchain).map_err(|source| {
                    RegistryError::Definition {
                        network: embedded.network,
                        source,
                    }
                })?;

            for embedded_chain in embedded.chains {
                let chain: ChainDefinition =
                    toml::from_str(embedded_chain.definition).map_err(|source| {
                        RegistryError::Definition {
                            network: embedded.network,
                            source,
                        }
                    })?;
                let chain_id = chain.chain_id;

                let registered = RegisteredChain {
                    network: embedded.network,
                    superchain: superchain.clone(),
                    chain,
                    genesis: embedded_chain.genesis,
                };
                if chains.insert(chain_id, registered).is_some() {
                    return Err(RegistryError::DuplicateChain(chain_id));
                }
            }
        }
        Ok(Self { chains })
    }

    /// Returns the registered chain with the given ID.
    pub(crate) fn chain(&self, chain_id: u64) -> Result<&RegisteredChain, RegistryError> {
        self.chains
            .get(&chain_id)
            .ok_or(RegistryError::UnknownChain(chain_id))
    }
}

impl ChainRegistry for SuperchainRegistry {
    fn chains(&self) -> Vec<u64> {
        self.chains.keys().copied().collect()
    }

    fn load_rollup_config(&self, chain_id: u64) -> Result<RollupConfig, RegistryError> {
        let registered = self.chain(chain_id)?;
        let (chain, superchain) = (&registered.chain, &registered.superchain);
        let hardforks = chain.hardforks.or(superchain.hardforks);
        debug!(target: "registry", "Loading rollup config for chain {chain_id} ({})", chain.name);

        Ok(RollupConfig {
            genesis: chain.genesis.clone(),
            block_time: BLOCK_TIME,
            max_sequencer_drift: MAX_SEQUENCER_DRIFT,
            seq_window_size: SEQ_WINDOW_SIZE,
            channel_timeout: CHANNEL_TIMEOUT,
            l1_chain_id: superchain.l1.chain_id,
            l2_chain_id: chain.chain_id,
            regolith_time: Some(chain.regolith_time.unwrap_or_default()),
            canyon_time: hardforks.canyon_time,
            delta_time: hardforks.delta_time,
            ecotone_time: hardforks.ecotone_time,
            batch_inbox_address: chain.batch_inbox_addr,
            deposit_contract_address: chain.addresses.optimism_portal_proxy,
            l1_system_config_address: chain.addresses.system_config_proxy,
            protocol_versions_address: superchain.protocol_versions_addr,
        })
    }

    fn load_chain_config(&self, chain_id: u64) -> Result<ChainConfig, RegistryError> {
        let registered = self.chain(chain_id)?;
        debug!(target: "registry", "Loading chain config for chain {chain_id} ({})", registered.chain.name);
        Ok(op_stack_chain_config(chain_id, registered.forks()))
    }

    fn load_genesis(&self, chain_id: u64) -> Result<Genesis, RegistryError> {
        let registered = self.chain(chain_id)?;
        debug!(target: "registry", "Loading genesis for chain {chain_id} ({})", registered.chain.name);

        let malformed = |source| RegistryError::Genesis { chain_id, source };
        let mut genesis: serde_json::Value =
            serde_json::from_str(registered.genesis).map_err(malformed)?;
        let config = serde_json::to_value(op_stack_chain_config(chain_id, registered.forks()))
            .map_err(malformed)?;
        if let Some(fields) = genesis.as_object_mut() {
            fields.insert("config".to_string(), config);
        }
        serde_json::from_value(genesis).map_err(malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::OpChainConfigExt;
    use alloy_primitives::address;

    #[test]
    fn embedded_registry_parses() {
        assert_eq!(
            SUPERCHAIN_REGISTRY.chains(),
            vec![424, 8453, 58008, 84531, 84532, 7777777, 999999999]
        );
    }

    #[test]
    fn every_embedded_genesis_loads() {
        for chain_id in SUPERCHAIN_REGISTRY.chains() {
            let genesis = SUPERCHAIN_REGISTRY.load_genesis(chain_id).unwrap();
            assert_eq!(genesis.config.chain_id, chain_id);
            assert!(!genesis.alloc.is_empty());
            assert_eq!(
                genesis.config,
                SUPERCHAIN_REGISTRY.load_chain_config(chain_id).unwrap()
            );
        }
    }

    #[test]
    fn unknown_chain_is_an_error() {
        assert!(matches!(
            SUPERCHAIN_REGISTRY.load_rollup_config(10),
            Err(RegistryError::UnknownChain(10))
        ));
        assert!(matches!(
            SUPERCHAIN_REGISTRY.load_genesis(10),
            Err(RegistryError::UnknownChain(10))
        ));
    }

    #[test]
    fn base_mainnet_rollup_config() {
        let cfg = SUPERCHAIN_REGISTRY.load_rollup_config(8453).unwrap();
        assert_eq!(cfg.l1_chain_id, 1);
        assert_eq!(cfg.l2_chain_id, 8453);
        assert_eq!(cfg.regolith_time, Some(0));
        assert_eq!(cfg.canyon_time, Some(1704992401));
        assert_eq!(cfg.delta_time, None);
        assert_eq!(
            cfg.protocol_versions_address,
            address!("8062AbC286f5e7D9428a0Ccb9AbD71e50d93b935")
        );
        assert_eq!(cfg.block_time, BLOCK_TIME);
    }

    #[test]
    fn base_goerli_keeps_late_regolith() {
        let rollup = SUPERCHAIN_REGISTRY.load_rollup_config(84531).unwrap();
        assert_eq!(rollup.regolith_time, Some(1683219600));
        assert_eq!(rollup.delta_time, Some(1703116800));

        let chain = SUPERCHAIN_REGISTRY.load_chain_config(84531).unwrap();
        assert_eq!(chain.regolith_time(), Some(1683219600));
        assert_eq!(chain.canyon_time(), Some(1699981200));
        assert_eq!(chain.shanghai_time, Some(1699981200));
    }

    #[test]
    fn duplicate_chain_ids_are_rejected() {
        let doubled = [EMBEDDED_SUPERCHAINS[0], EMBEDDED_SUPERCHAINS[0]];
        assert!(matches!(
            SuperchainRegistry::from_embedded(&doubled),
            Err(RegistryError::DuplicateChain(_))
        ));
    }

    #[test]
    fn malformed_definition_names_network() {
        let broken = [EmbeddedSuperchain {
            network: "broken",
            superchain: "name = ",
            chains: &[],
        }];
        let err = SuperchainRegistry::from_embedded(&broken).unwrap_err();
        assert_eq!(err.to_string(), "malformed definition for broken");
    }
}
