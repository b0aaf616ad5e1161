//! Contains the table of fixtures under validation and the known deltas between each fixture
//! and the registry.

use crate::{chain::OpChainConfigExt, rollup::RollupConfig};
use alloy_genesis::ChainConfig;
use alloy_primitives::{address, Address};
use std::path::{Path, PathBuf};

/// An override applied to a fixture's execution-layer chain config.
pub(crate) type ChainOverride = fn(&mut ChainConfig);

/// An override applied to a fixture's rollup config.
pub(crate) type RollupOverride = fn(&mut RollupConfig);

/// The protocol versions contract on Ethereum mainnet.
pub(crate) const MAINNET_PROTOCOL_VERSIONS_ADDRESS: Address =
    address!("8062AbC286f5e7D9428a0Ccb9AbD71e50d93b935");
/// The protocol versions contract on Sepolia.
pub(crate) const SEPOLIA_PROTOCOL_VERSIONS_ADDRESS: Address =
    address!("79ADD5713B383DAa0a138d3C4780C7A1804a8090");
/// The protocol versions contract on Goerli.
pub(crate) const GOERLI_PROTOCOL_VERSIONS_ADDRESS: Address =
    address!("0C24F5098774aA366827D667494e9F889f7cFc08");

pub(crate) const MAINNET_CANYON_TIME: u64 = 1704992401;
pub(crate) const SEPOLIA_CANYON_TIME: u64 = 1699981200;
pub(crate) const GOERLI_CANYON_TIME: u64 = 1699981200;

pub(crate) const SEPOLIA_DELTA_TIME: u64 = 1703203200;
pub(crate) const GOERLI_DELTA_TIME: u64 = 1703116800;

/// Base Goerli activated Regolith after genesis.
pub(crate) const BASE_GOERLI_REGOLITH_TIME: u64 = 1683219600;

/// The post-Canyon EIP-1559 denominator the fixtures predate.
pub(crate) const CANYON_EIP1559_DENOMINATOR: u64 = 250;

/// A fixture directory and the chain it must match.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TestCase {
    /// The display name of the test case.
    pub(crate) name: &'static str,
    /// The fixture directory, relative to the fixture root.
    pub(crate) path: &'static str,
    /// The L2 chain ID of the fixture.
    pub(crate) chain_id: u64,
    /// The known delta between the fixture's chain config and the registry.
    pub(crate) chain_override: Option<ChainOverride>,
    /// The known delta between the fixture's rollup config and the registry.
    pub(crate) rollup_override: Option<RollupOverride>,
}

impl TestCase {
    /// Returns the path of the fixture's `rollup.json`.
    pub(crate) fn rollup_path(&self, root: &Path) -> PathBuf {
        root.join(self.path).join("rollup.json")
    }

    /// Returns the path of the fixture's `genesis.json`.
    pub(crate) fn genesis_path(&self, root: &Path) -> PathBuf {
        root.join(self.path).join("genesis.json")
    }
}

/// The fixtures under validation.
pub(crate) const TEST_CASES: &[TestCase] = &[
    // Mainnet
    TestCase {
        name: "Base Mainnet",
        path: "data/mainnet/base",
        chain_id: 8453,
        chain_override: Some(mainnet_chain_override),
        rollup_override: Some(mainnet_rollup_override),
    },
    TestCase {
        name: "PGN Mainnet",
        path: "data/mainnet/pgn",
        chain_id: 424,
        chain_override: Some(mainnet_chain_override),
        rollup_override: Some(mainnet_rollup_override),
    },
    TestCase {
        name: "Zora Mainnet",
        path: "data/mainnet/zora",
        chain_id: 7777777,
        chain_override: Some(mainnet_chain_override),
        rollup_override: Some(mainnet_rollup_override),
    },
    // Sepolia
    TestCase {
        name: "Base Sepolia",
        path: "data/sepolia/base",
        chain_id: 84532,
        chain_override: Some(sepolia_chain_override),
        rollup_override: Some(sepolia_rollup_override),
    },
    TestCase {
        name: "PGN Sepolia",
        path: "data/sepolia/pgn",
        chain_id: 58008,
        chain_override: Some(sepolia_chain_override),
        rollup_override: Some(sepolia_rollup_override),
    },
    TestCase {
        name: "Zora Sepolia",
        path: "data/sepolia/zora",
        chain_id: 999999999,
        chain_override: Some(sepolia_chain_override),
        rollup_override: Some(sepolia_rollup_override),
    },
    // Goerli
    TestCase {
        name: "Base Goerli",
        path: "data/goerli/base",
        chain_id: 84531,
        chain_override: Some(base_goerli_chain_override),
        rollup_override: Some(goerli_rollup_override),
    },
];

/// Activates Canyon, and Shanghai with it, on the execution layer.
fn activate_canyon(cfg: &mut ChainConfig, canyon_time: u64) {
    cfg.shanghai_time = Some(canyon_time);
    cfg.set_canyon_time(canyon_time);
    cfg.set_eip1559_denominator_canyon(CANYON_EIP1559_DENOMINATOR);
}

fn mainnet_chain_override(cfg: &mut ChainConfig) {
    activate_canyon(cfg, MAINNET_CANYON_TIME);
}

fn mainnet_rollup_override(cfg: &mut RollupConfig) {
    cfg.canyon_time = Some(MAINNET_CANYON_TIME);
    cfg.protocol_versions_address = MAINNET_PROTOCOL_VERSIONS_ADDRESS;
}

fn sepolia_chain_override(cfg: &mut ChainConfig) {
    activate_canyon(cfg, SEPOLIA_CANYON_TIME);
}

fn sepolia_rollup_override(cfg: &mut RollupConfig) {
    cfg.canyon_time = Some(SEPOLIA_CANYON_TIME);
    cfg.delta_time = Some(SEPOLIA_DELTA_TIME);
    cfg.protocol_versions_address = SEPOLIA_PROTOCOL_VERSIONS_ADDRESS;
}

fn base_goerli_chain_override(cfg: &mut ChainConfig) {
    // Not set in the Base Goerli genesis, but set in its rollup.json.
    cfg.set_regolith_time(BASE_GOERLI_REGOLITH_TIME);
    activate_canyon(cfg, GOERLI_CANYON_TIME);
}

fn goerli_rollup_override(cfg: &mut RollupConfig) {
    cfg.canyon_time = Some(GOERLI_CANYON_TIME);
    cfg.delta_time = Some(GOERLI_DELTA_TIME);
    cfg.protocol_versions_address = GOERLI_PROTOCOL_VERSIONS_ADDRESS;
}
