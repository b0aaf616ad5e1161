//! Contains the [RollupConfig] type, mirroring the `rollup.json` consumed by the rollup node.

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// The L2 block time, in seconds.
pub(crate) const BLOCK_TIME: u64 = 2;

/// The maximum number of seconds a sequencer may drift ahead of the L1 origin.
pub(crate) const MAX_SEQUENCER_DRIFT: u64 = 600;

/// The sequencing window size, in L1 blocks.
pub(crate) const SEQ_WINDOW_SIZE: u64 = 3600;

/// The number of L1 blocks a channel may stay open for.
pub(crate) const CHANNEL_TIMEOUT: u64 = 300;

/// The rollup configuration.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RollupConfig {
    /// The genesis state of the rollup.
    pub(crate) genesis: ChainGenesis,
    /// The block time of the L2, in seconds.
    pub(crate) block_time: u64,
    /// Sequencer batches may not be more than `max_sequencer_drift` seconds after the L1
    /// timestamp of the sequencing window end.
    pub(crate) max_sequencer_drift: u64,
    /// The sequencer window size.
    pub(crate) seq_window_size: u64,
    /// Number of L1 blocks between when a channel can be opened and when it can be closed.
    pub(crate) channel_timeout: u64,
    /// The L1 chain ID.
    pub(crate) l1_chain_id: u64,
    /// The L2 chain ID.
    pub(crate) l2_chain_id: u64,
    /// Regolith activation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) regolith_time: Option<u64>,
    /// Canyon activation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) canyon_time: Option<u64>,
    /// Delta activation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) delta_time: Option<u64>,
    /// Ecotone activation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) ecotone_time: Option<u64>,
    /// The L1 address that batches are sent to.
    pub(crate) batch_inbox_address: Address,
    /// The L1 address that deposits are sent to.
    pub(crate) deposit_contract_address: Address,
    /// The L1 address of the system config contract.
    pub(crate) l1_system_config_address: Address,
    /// The L1 address of the protocol versions contract. Zero when unset.
    #[serde(default)]
    pub(crate) protocol_versions_address: Address,
}

/// The genesis anchors of the rollup.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ChainGenesis {
    /// The L1 block that the rollup starts *after*.
    pub(crate) l1: BlockId,
    /// The L2 block the rollup starts from.
    pub(crate) l2: BlockId,
    /// Timestamp of the L2 genesis block.
    pub(crate) l2_time: u64,
    /// Initial system configuration values.
    pub(crate) system_config: SystemConfig,
}

/// A block hash and number pair.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct BlockId {
    pub(crate) hash: B256,
    pub(crate) number: u64,
}

/// The system configuration at genesis.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SystemConfig {
    /// The authorized batch sender.
    pub(crate) batcher_addr: Address,
    /// The L1 fee overhead.
    pub(crate) overhead: B256,
    /// The L1 fee scalar.
    pub(crate) scalar: B256,
    /// The L2 block gas limit.
    pub(crate) gas_limit: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const ROLLUP_JSON: &str = r#"{
        "genesis": {
            "l1": {
                "hash": "0x5c13d307623a926cd31415036c8b7fa14572f9dac64528e857a470511fc30771",
                "number": 17481768
            },
            "l2": {
                "hash": "0xf712aa9241cc24369b143cf6dce85f0902a9731e70d66818a3a5845b296c73dd",
                "number": 0
            },
            "l2_time": 1686789347,
            "system_config": {
                "batcherAddr": "0x5050f69a9786f081509234f1a7f4684b5e5b76c9",
                "overhead": "0x00000000000000000000000000000000000000000000000000000000000000bc",
                "scalar": "0x00000000000000000000000000000000000000000000000000000000000a6fe0",
                "gasLimit": 30000000
            }
        },
        "block_time": 2,
        "max_sequencer_drift": 600,
        "seq_window_size": 3600,
        "channel_timeout": 300,
        "l1_chain_id": 1,
        "l2_chain_id": 8453,
        "regolith_time": 0,
        "batch_inbox_address": "0xff00000000000000000000000000000000008453",
        "deposit_contract_address": "0x49048044d57e1c92a77f79988d21fa8faf74e97e",
        "l1_system_config_address": "0x73a79fab69143498ed3712e519a88a918e1f4072",
        "unknown_field": true
    }"#;

    #[test]
    fn deserializes_rollup_json() {
        let cfg: RollupConfig = serde_json::from_str(ROLLUP_JSON).unwrap();
        assert_eq!(cfg.l2_chain_id, 8453);
        assert_eq!(cfg.genesis.l1.number, 17481768);
        assert_eq!(cfg.genesis.system_config.gas_limit, 30_000_000);
        assert_eq!(
            cfg.genesis.system_config.batcher_addr,
            address!("5050f69a9786f081509234f1a7f4684b5e5b76c9")
        );
        assert_eq!(cfg.regolith_time, Some(0));
        assert_eq!(cfg.canyon_time, None);
        assert_eq!(cfg.protocol_versions_address, Address::ZERO);
    }

    #[test]
    fn omits_unset_hardforks_when_serialized() {
        let cfg: RollupConfig = serde_json::from_str(ROLLUP_JSON).unwrap();
        let value = serde_json::to_value(&cfg).unwrap();
        assert!(value.get("canyon_time").is_none());
        assert!(value.get("unknown_field").is_none());
        assert_eq!(value["regolith_time"], 0);
    }
}
