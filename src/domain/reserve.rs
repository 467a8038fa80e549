//! Gas Reserve Policy
//!
//! Native amount withheld from a swap so the network fee can always be paid.
//! The TON figure is only a pre-filter: STON.fi swaps carry a forwarded gas
//! payment whose exact value is known only after the transaction is built, so
//! the executor re-checks the built transaction's attached value against the
//! balance before signing.

use thiserror::Error;

use super::amounts::to_human_unit;
use super::swap::Chain;

/// Reserve withheld on Solana (0.01 SOL). The live bot enforced
/// `amount + 0.01` on buys; revisions that used 0.0001 under-reserved once
/// priority fees were enabled.
pub const SOL_GAS_RESERVE_LAMPORTS: u64 = 10_000_000;

/// Static pre-check reserve on TON (0.05 TON); superseded by the exact
/// forwarded value after the build step.
pub const TON_GAS_RESERVE_NANOTON: u64 = 50_000_000;

/// Gas attached to a STON.fi router v2 message on top of the offer (0.3 TON).
/// Unspent remainder is refunded by the router.
pub const STONFI_SWAP_GAS_NANOTON: u64 = 300_000_000;

/// Reserve to withhold for the given chain, in smallest units
pub fn gas_reserve(chain: Chain) -> u64 {
    match chain {
        Chain::Solana => SOL_GAS_RESERVE_LAMPORTS,
        Chain::Ton => TON_GAS_RESERVE_NANOTON,
    }
}

/// Balance below required spend. Carries the figures the UI layer needs to
/// tell the user how much to deposit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("insufficient {chain} balance: required {required_raw}, available {available_raw} (short {shortfall_raw})")]
pub struct Shortfall {
    pub chain: Chain,
    pub required_raw: u64,
    pub available_raw: u64,
    pub shortfall_raw: u64,
}

impl Shortfall {
    /// Human-unit funding instructions, with the deposit address the way the
    /// bot shows it (non-bounceable for TON).
    pub fn funding_message(&self, funding_address: &str) -> String {
        let sym = self.chain.native_symbol();
        format!(
            "Insufficient {sym} balance: {} {sym} required, {} {sym} available. \
             Please fund your wallet to continue: {funding_address}",
            to_human_unit(self.required_raw),
            to_human_unit(self.available_raw),
        )
    }
}

/// Check that `available` covers `spend + reserve`.
pub fn check_funds(
    chain: Chain,
    available_raw: u64,
    spend_raw: u64,
    reserve_raw: u64,
) -> Result<(), Shortfall> {
    let required_raw = spend_raw.saturating_add(reserve_raw);
    if available_raw < required_raw {
        return Err(Shortfall {
            chain,
            required_raw,
            available_raw,
            shortfall_raw: required_raw - available_raw,
        });
    }
    Ok(())
}
