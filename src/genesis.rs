//! Materializes a [Genesis] into its genesis block header.

use alloy_consensus::{constants::EMPTY_OMMER_ROOT_HASH, Header};
use alloy_genesis::{ChainConfig, Genesis, GenesisAccount};
use alloy_primitives::{b256, keccak256, Address, B256, U256};
use alloy_rlp::RlpEncodable;
use alloy_trie::{HashBuilder, Nibbles, EMPTY_ROOT_HASH};
use itertools::Itertools;
use std::collections::BTreeMap;
use thiserror::Error;

/// The base fee of the genesis block when London is active and the genesis does not set one.
pub(crate) const INITIAL_BASE_FEE: u64 = 1_000_000_000;

/// The hash of empty code.
const KECCAK_EMPTY: B256 =
    b256!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470");

/// An error raised while materializing a genesis block.
#[derive(Debug, Error)]
pub(crate) enum GenesisError {
    /// A genesis quantity does not fit the header field it is written to.
    #[error("genesis field `{0}` overflows a 64-bit header field")]
    QuantityOverflow(&'static str),
}

/// The account leaf stored in the state trie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, RlpEncodable)]
struct TrieAccount {
    nonce: u64,
    balance: U256,
    storage_root: B256,
    code_hash: B256,
}

impl From<&GenesisAccount> for TrieAccount {
    fn from(account: &GenesisAccount) -> Self {
        Self {
            nonce: account.nonce.unwrap_or_default(),
            balance: account.balance,
            storage_root: account
                .storage
                .as_ref()
                .map(storage_root)
                .unwrap_or(EMPTY_ROOT_HASH),
            code_hash: account
                .code
                .as_ref()
                .filter(|code| !code.is_empty())
                .map(keccak256)
                .unwrap_or(KECCAK_EMPTY),
        }
    }
}

/// Computes the hash of the block materialized from the [Genesis].
pub(crate) fn genesis_hash(genesis: &Genesis) -> Result<B256, GenesisError> {
    Ok(genesis_header(genesis)?.hash_slow())
}

/// Builds the genesis block [Header], activating the header fields of every fork that is live at
/// the genesis block.
pub(crate) fn genesis_header(genesis: &Genesis) -> Result<Header, GenesisError> {
    let cfg = &genesis.config;
    let number = genesis.number.unwrap_or_default();

    let base_fee_per_gas = if is_london_active(cfg, number) {
        let base_fee = match genesis.base_fee_per_gas {
            Some(fee) => quantity(fee, "baseFeePerGas")?,
            None => INITIAL_BASE_FEE,
        };
        Some(base_fee)
    } else {
        None
    };

    let withdrawals_root =
        is_shanghai_active(cfg, number, genesis.timestamp).then_some(EMPTY_ROOT_HASH);

    let (parent_beacon_block_root, blob_gas_used, excess_blob_gas) =
        if is_cancun_active(cfg, number, genesis.timestamp) {
            let blob_gas_used = genesis
                .blob_gas_used
                .map(|gas| quantity(gas, "blobGasUsed"))
                .transpose()?
                .unwrap_or_default();
            let excess_blob_gas = genesis
                .excess_blob_gas
                .map(|gas| quantity(gas, "excessBlobGas"))
                .transpose()?
                .unwrap_or_default();
            (Some(B256::ZERO), Some(blob_gas_used), Some(excess_blob_gas))
        } else {
            (None, None, None)
        };

    Ok(Header {
        number,
        nonce: genesis.nonce.into(),
        timestamp: genesis.timestamp,
        extra_data: genesis.extra_data.clone(),
        gas_limit: quantity(genesis.gas_limit, "gasLimit")?.into(),
        difficulty: genesis.difficulty,
        mix_hash: genesis.mix_hash,
        beneficiary: genesis.coinbase,
        state_root: state_root(&genesis.alloc),
        ommers_hash: EMPTY_OMMER_ROOT_HASH,
        transactions_root: EMPTY_ROOT_HASH,
        receipts_root: EMPTY_ROOT_HASH,
        base_fee_per_gas: base_fee_per_gas.map(Into::into),
        withdrawals_root,
        parent_beacon_block_root,
        blob_gas_used: blob_gas_used.map(Into::into),
        excess_blob_gas: excess_blob_gas.map(Into::into),
        ..Default::default()
    })
}

/// Computes the state root of a genesis allocation.
pub(crate) fn state_root(alloc: &BTreeMap<Address, GenesisAccount>) -> B256 {
    trie_root(alloc.iter().map(|(address, account)| {
        (
            keccak256(address),
            alloy_rlp::encode(TrieAccount::from(account)),
        )
    }))
}

/// Computes the storage root of a genesis account. Zero-valued slots are not stored.
fn storage_root(storage: &BTreeMap<B256, B256>) -> B256 {
    trie_root(
        storage
            .iter()
            .filter(|(_, value)| !value.is_zero())
            .map(|(slot, value)| {
                (
                    keccak256(slot),
                    alloy_rlp::encode(U256::from_be_slice(value.as_slice())),
                )
            }),
    )
}

/// Builds a Merkle-Patricia trie over hashed keys and returns its root.
fn trie_root(leaves: impl Iterator<Item = (B256, Vec<u8>)>) -> B256 {
    let mut builder = HashBuilder::default();
    for (key, value) in leaves.sorted_unstable_by_key(|(key, _)| *key) {
        builder.add_leaf(Nibbles::unpack(key), &value);
    }
    builder.root()
}

/// Narrows a genesis quantity to the 64 bits used by the header.
fn quantity<T: TryInto<u64>>(value: T, field: &'static str) -> Result<u64, GenesisError> {
    value
        .try_into()
        .map_err(|_| GenesisError::QuantityOverflow(field))
}

fn is_london_active(cfg: &ChainConfig, number: u64) -> bool {
    cfg.london_block.is_some_and(|block| block <= number)
}

fn is_shanghai_active(cfg: &ChainConfig, number: u64, timestamp: u64) -> bool {
    is_london_active(cfg, number) && cfg.shanghai_time.is_some_and(|time| time <= timestamp)
}

fn is_cancun_active(cfg: &ChainConfig, number: u64, timestamp: u64) -> bool {
    is_shanghai_active(cfg, number, timestamp)
        && cfg.cancun_time.is_some_and(|time| time <= timestamp)
}
