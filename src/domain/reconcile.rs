//! Balance Reconciliation
//!
//! Derives what a swap actually cost from pre/post native-balance snapshots.
//! Runs after broadcast: a failure to reconcile is never a swap failure, it
//! only degrades the result to "gas unknown".

use tracing::debug;

use super::swap::SwapDirection;

/// What the balance delta revealed about an executed swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    /// Native units consumed by fees (buys only, when derivable)
    pub gas_consumed_raw: Option<u64>,
    /// Net native received (sells only)
    pub native_received_raw: Option<u64>,
    /// Whether the balance changed at all — distinguishes an executed swap
    /// from an ambiguous broadcast that never landed
    pub balance_moved: bool,
}

/// Interpret the pre/post balance pair.
///
/// Native->token: `gas = before - after - amount_spent`.
/// Token->native: the native delta is the realized output net of fees.
/// A delta in the unexpected direction yields `None` rather than a bogus
/// figure (another transfer may have landed between snapshots).
pub fn settle(
    direction: SwapDirection,
    balance_before_raw: u64,
    balance_after_raw: u64,
    amount_spent_raw: u64,
) -> Settlement {
    let balance_moved = balance_after_raw != balance_before_raw;

    match direction {
        SwapDirection::NativeToToken => {
            let deducted = balance_before_raw.checked_sub(balance_after_raw);
            let gas = deducted.and_then(|d| d.checked_sub(amount_spent_raw));
            debug!(
                before = balance_before_raw,
                after = balance_after_raw,
                deducted = ?deducted,
                gas = ?gas,
                "reconciled native->token swap"
            );
            Settlement {
                gas_consumed_raw: gas,
                native_received_raw: None,
                balance_moved,
            }
        }
        SwapDirection::TokenToNative => {
            let received = balance_after_raw.checked_sub(balance_before_raw);
            debug!(
                before = balance_before_raw,
                after = balance_after_raw,
                received = ?received,
                "reconciled token->native swap"
            );
            Settlement {
                gas_consumed_raw: None,
                native_received_raw: received,
                balance_moved,
            }
        }
    }
}
