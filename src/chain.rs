//! OP-stack extensions to the execution-layer [ChainConfig].
//!
//! The OP-stack hardforks and EIP-1559 parameters are not part of the upstream chain config
//! schema, so they live in its flattened extra fields.

use alloy_genesis::ChainConfig;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// The EIP-1559 elasticity multiplier used by OP-stack chains.
pub(crate) const EIP1559_ELASTICITY: u64 = 6;

/// The EIP-1559 base fee max change denominator used by OP-stack chains.
pub(crate) const EIP1559_DENOMINATOR: u64 = 50;

/// The EIP-1559 base fee max change denominator after Canyon.
pub(crate) const EIP1559_DENOMINATOR_CANYON: u64 = 250;

const BEDROCK_BLOCK: &str = "bedrockBlock";
const REGOLITH_TIME: &str = "regolithTime";
const CANYON_TIME: &str = "canyonTime";
const OPTIMISM: &str = "optimism";
const DENOMINATOR_CANYON: &str = "eip1559DenominatorCanyon";

/// The `optimism` section of an OP-stack chain config.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OptimismConfig {
    pub(crate) eip1559_elasticity: u64,
    pub(crate) eip1559_denominator: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) eip1559_denominator_canyon: Option<u64>,
}

/// Hardfork activations of an OP-stack execution-layer chain.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OpChainForks {
    pub(crate) regolith_time: u64,
    pub(crate) canyon_time: Option<u64>,
}

/// Builds the chain config of an OP-stack chain that was deployed with Bedrock at genesis.
///
/// Every block-numbered Ethereum fork is active at genesis and Shanghai activates with Canyon.
pub(crate) fn op_stack_chain_config(chain_id: u64, forks: OpChainForks) -> ChainConfig {
    let optimism = OptimismConfig {
        eip1559_elasticity: EIP1559_ELASTICITY,
        eip1559_denominator: EIP1559_DENOMINATOR,
        eip1559_denominator_canyon: Some(EIP1559_DENOMINATOR_CANYON),
    };

    let mut cfg = ChainConfig {
        chain_id,
        homestead_block: Some(0),
        eip150_block: Some(0),
        eip155_block: Some(0),
        eip158_block: Some(0),
        byzantium_block: Some(0),
        constantinople_block: Some(0),
        petersburg_block: Some(0),
        istanbul_block: Some(0),
        muir_glacier_block: Some(0),
        berlin_block: Some(0),
        london_block: Some(0),
        arrow_glacier_block: Some(0),
        gray_glacier_block: Some(0),
        merge_netsplit_block: Some(0),
        shanghai_time: forks.canyon_time,
        cancun_time: None,
        terminal_total_difficulty: Some(U256::ZERO),
        terminal_total_difficulty_passed: true,
        extra_fields: [
            (BEDROCK_BLOCK, json!(0u64)),
            (REGOLITH_TIME, json!(forks.regolith_time)),
            (OPTIMISM, json!(optimism)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect(),
        ..Default::default()
    };
    if let Some(canyon_time) = forks.canyon_time {
        cfg.set_canyon_time(canyon_time);
    }
    cfg
}

/// Typed access to the OP-stack fields of a [ChainConfig].
pub(crate) trait OpChainConfigExt {
    /// Returns the Regolith activation timestamp, if set.
    fn regolith_time(&self) -> Option<u64>;

    /// Returns the Canyon activation timestamp, if set.
    fn canyon_time(&self) -> Option<u64>;

    /// Returns the `optimism` section, if present and well-formed.
    fn optimism(&self) -> Option<OptimismConfig>;

    /// Sets the Regolith activation timestamp.
    fn set_regolith_time(&mut self, time: u64);

    /// Sets the Canyon activation timestamp.
    fn set_canyon_time(&mut self, time: u64);

    /// Sets the post-Canyon EIP-1559 denominator, creating the `optimism` section if missing.
    fn set_eip1559_denominator_canyon(&mut self, denominator: u64);
}

impl OpChainConfigExt for ChainConfig {
    fn regolith_time(&self) -> Option<u64> {
        self.extra_fields.get(REGOLITH_TIME).and_then(Value::as_u64)
    }

    fn canyon_time(&self) -> Option<u64> {
        self.extra_fields.get(CANYON_TIME).and_then(Value::as_u64)
    }

    fn optimism(&self) -> Option<OptimismConfig> {
        self.extra_fields
            .get(OPTIMISM)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    fn set_regolith_time(&mut self, time: u64) {
        self.extra_fields.insert(REGOLITH_TIME.to_string(), time.into());
    }

    fn set_canyon_time(&mut self, time: u64) {
        self.extra_fields.insert(CANYON_TIME.to_string(), time.into());
    }

    fn set_eip1559_denominator_canyon(&mut self, denominator: u64) {
        let optimism = self
            .extra_fields
            .entry(OPTIMISM.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(params) = optimism {
            params.insert(DENOMINATOR_CANYON.to_string(), denominator.into());
        }
    }
}
