//! STON.fi Router v2 Payloads
//!
//! Message bodies for the two swap legs: a pTON ton_transfer for TON->jetton
//! and a standard jetton transfer for jetton->TON, each carrying the router's
//! cross-swap payload as forward payload.

use std::sync::Arc;

use crate::adapters::ton::address::TonAddress;
use crate::adapters::ton::cell::{Cell, CellBuilder, CellError};

/// Router v2 swap opcode (forward payload of the incoming transfer)
pub const STONFI_SWAP_OP: u32 = 0x6664de2a;

/// pTON v2 ton_transfer opcode
pub const PTON_TON_TRANSFER_OP: u32 = 0x01f3835d;

/// TEP-74 jetton transfer opcode
pub const JETTON_TRANSFER_OP: u32 = 0x0f8a7ea5;

/// Gas forwarded to the router for the cross-contract leg (0.24 TON); must
/// stay below the total attached gas so the carrying transfer can pay fees
pub const SWAP_FORWARD_GAS_NANOTON: u64 = 240_000_000;

/// The swap-parameters cell referenced by the swap body
fn swap_params(
    min_ask_raw: u64,
    receiver: &TonAddress,
    fwd_gas_raw: u64,
    _refund: &TonAddress,
) -> Result<Cell, CellError> {
    let mut b = CellBuilder::new();
    b.store_coins(min_ask_raw)?;
    b.store_address(Some(receiver))?;
    b.store_coins(fwd_gas_raw)?;
    b.store_bit(false)?; // no custom payload
    b.store_coins(0)?; // refund fwd gas
    b.store_bit(false)?; // no refund payload
    b.store_uint(0, 16)?; // referral fee
    b.store_address(None)?; // no referral
    Ok(b.build())
}

/// Router v2 cross-swap body. `ask_jetton_wallet` is the ROUTER's wallet for
/// the asset being bought (the pTON wallet when selling into TON).
pub fn swap_body(
    ask_jetton_wallet: &TonAddress,
    receiver: &TonAddress,
    refund: &TonAddress,
    min_ask_raw: u64,
) -> Result<Cell, CellError> {
    let params = Arc::new(swap_params(
        min_ask_raw,
        receiver,
        SWAP_FORWARD_GAS_NANOTON,
        refund,
    )?);
    let mut b = CellBuilder::new();
    b.store_uint(STONFI_SWAP_OP as u64, 32)?;
    b.store_address(Some(ask_jetton_wallet))?;
    b.store_address(Some(refund))?;
    b.store_address(Some(refund))?; // excesses back to the user as well
    b.store_ref(params)?;
    Ok(b.build())
}

/// TON->jetton leg: ton_transfer sent to the router's pTON wallet, wrapping
/// `offer_raw` nanoTON with the swap body as forward payload.
pub fn ton_transfer_body(
    query_id: u64,
    offer_raw: u64,
    refund: &TonAddress,
    forward: Arc<Cell>,
) -> Result<Cell, CellError> {
    let mut b = CellBuilder::new();
    b.store_uint(PTON_TON_TRANSFER_OP as u64, 32)?;
    b.store_uint(query_id, 64)?;
    b.store_coins(offer_raw)?;
    b.store_address(Some(refund))?;
    b.store_bit(true)?; // forward payload by reference
    b.store_ref(forward)?;
    Ok(b.build())
}

/// Jetton->TON leg: TEP-74 transfer of `amount_raw` jettons to the router,
/// forwarding gas plus the swap body.
pub fn jetton_transfer_body(
    query_id: u64,
    amount_raw: u64,
    router: &TonAddress,
    response_destination: &TonAddress,
    forward: Arc<Cell>,
) -> Result<Cell, CellError> {
    let mut b = CellBuilder::new();
    b.store_uint(JETTON_TRANSFER_OP as u64, 32)?;
    b.store_uint(query_id, 64)?;
    b.store_coins(amount_raw)?;
    b.store_address(Some(router))?;
    b.store_address(Some(response_destination))?;
    b.store_bit(false)?; // no custom payload
    b.store_coins(SWAP_FORWARD_GAS_NANOTON)?;
    b.store_bit(true)?; // forward payload by reference
    b.store_ref(forward)?;
    Ok(b.build())
}
