//! The TOML definitions a superchain registry is built from.

use crate::rollup::ChainGenesis;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Network-wide values shared by every chain of a superchain.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SuperchainDefinition {
    /// The display name of the superchain.
    pub(crate) name: String,
    /// The L1 the superchain settles on.
    pub(crate) l1: L1Definition,
    /// The L1 address of the protocol versions contract.
    pub(crate) protocol_versions_addr: Address,
    /// Default hardfork activations, inherited by chains that don't set their own.
    #[serde(flatten)]
    pub(crate) hardforks: HardforkDefaults,
}

/// The L1 of a superchain.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct L1Definition {
    pub(crate) chain_id: u64,
    pub(crate) public_rpc: String,
    pub(crate) explorer: String,
}

/// Hardfork activation timestamps.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct HardforkDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) canyon_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) delta_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) ecotone_time: Option<u64>,
}

impl HardforkDefaults {
    /// Layers `self` over `defaults`, keeping every activation `self` sets.
    pub(crate) fn or(self, defaults: Self) -> Self {
        Self {
            canyon_time: self.canyon_time.or(defaults.canyon_time),
            delta_time: self.delta_time.or(defaults.delta_time),
            ecotone_time: self.ecotone_time.or(defaults.ecotone_time),
        }
    }
}

/// A single chain of a superchain.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ChainDefinition {
    /// The display name of the chain.
    pub(crate) name: String,
    /// The L2 chain ID.
    pub(crate) chain_id: u64,
    pub(crate) public_rpc: String,
    pub(crate) sequencer_rpc: String,
    pub(crate) explorer: String,
    /// The L1 address that batches are sent to.
    pub(crate) batch_inbox_addr: Address,
    /// Regolith activation. Chains without one activated Regolith at genesis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) regolith_time: Option<u64>,
    /// Chain-specific hardfork activations.
    #[serde(flatten)]
    pub(crate) hardforks: HardforkDefaults,
    /// The genesis anchors of the chain.
    pub(crate) genesis: ChainGenesis,
    /// The L1 contracts of the chain.
    pub(crate) addresses: ChainAddresses,
}

/// L1 contract addresses of a chain.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ChainAddresses {
    pub(crate) system_config_proxy: Address,
    pub(crate) optimism_portal_proxy: Address,
}
