//! Codec for the Response payload.
//!
//! ```text
//! [ outcome | balance_hi | balance_lo | price_hi | price_lo ]
//! ```
//!
//! Balance is present for CheckedIn, CheckedOut and InsufficientFunds;
//! price for CheckedOut and InsufficientFunds. Other outcomes need only the
//! first byte, and trailing bytes are ignored.

use farepoint_core::constants::{RESPONSE_BALANCE_OFFSET, RESPONSE_PRICE_OFFSET};
use farepoint_core::{Error, HostResponse, Outcome, Result};
use heapless::Vec;

/// Longest encoded Response payload.
pub const RESPONSE_MAX_LEN: usize = RESPONSE_PRICE_OFFSET + 2;

/// Decode a Response payload.
///
/// Unknown outcome bytes decode to [`Outcome::Unknown`]; they are not an
/// error.
///
/// # Errors
///
/// Returns `Error::MalformedPayload` if the payload is empty or too short
/// for the amounts its outcome carries.
///
/// # Examples
///
/// ```
/// use farepoint_core::Outcome;
/// use farepoint_protocol::decode_response;
///
/// let response = decode_response(&[6, 0x01, 0x5E]).unwrap();
/// assert_eq!(response.outcome(), Outcome::CheckedIn);
/// assert_eq!(response.balance(), Some(350));
/// ```
pub fn decode_response(payload: &[u8]) -> Result<HostResponse> {
    let Some(&code) = payload.first() else {
        return Err(Error::malformed("Response", 1, 0));
    };
    let outcome = Outcome::from_code(code);

    let required = if outcome.carries_price() {
        RESPONSE_PRICE_OFFSET + 2
    } else if outcome.carries_balance() {
        RESPONSE_BALANCE_OFFSET + 2
    } else {
        1
    };
    if payload.len() < required {
        return Err(Error::malformed("Response", required, payload.len()));
    }

    let balance = if outcome.carries_balance() {
        read_u16(payload, RESPONSE_BALANCE_OFFSET)
    } else {
        0
    };
    let price = if outcome.carries_price() {
        read_u16(payload, RESPONSE_PRICE_OFFSET)
    } else {
        0
    };

    Ok(HostResponse::new(outcome, balance, price))
}

/// Encode a Response payload with only the fields its outcome carries.
pub fn encode_response(response: &HostResponse) -> Vec<u8, RESPONSE_MAX_LEN> {
    let mut out = Vec::new();
    // Capacity covers the longest form; pushes cannot fail.
    let _ = out.push(response.outcome().code());
    if let Some(balance) = response.balance() {
        let _ = out.extend_from_slice(&balance.to_be_bytes());
    }
    if let Some(price) = response.price() {
        let _ = out.extend_from_slice(&price.to_be_bytes());
    }
    out
}

#[inline]
fn read_u16(payload: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([payload[offset], payload[offset + 1]])
}
