//! Signing.
//!
//! This module contains the functions for verifying signed permission messages.

use alloy_primitives::{Address, Signature};
use alloy_sol_types::SolValue;

use crate::{sol::PermissionInput, verifier::VerifierError};

/// The message an authority signs to grant a reward-rate permission.
#[must_use]
pub fn permission_message(input: &PermissionInput) -> Vec<u8> {
    input.abi_encode()
}

/// Verifies an Ethereum signature using the `personal_sign` format.
pub fn eth_sign_verify(message: &[u8], signature: &[u8]) -> Result<Address, VerifierError> {
    let signature = Signature::from_raw(signature)
        .map_err(|e| VerifierError::InvalidSignature { error: e.to_string() })?;
    let address = signature
        .recover_address_from_msg(message)
        .map_err(|e| VerifierError::InvalidSignature { error: e.to_string() })?;
    Ok(address)
}
