//! Verifier.
//!
//! The permission certificates that authorize reward-rate updates and the verifiers that check
//! them. Producing the certificates is left to the issuing authority.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    signing::{eth_sign_verify, permission_message},
    sol::PermissionInput,
};

/// Errors returned by a [`PermissionVerifier`].
#[derive(Error, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum VerifierError {
    #[error("invalid proof")]
    InvalidProof,

    #[error("invalid signature: {error}")]
    InvalidSignature { error: String },

    #[error("permission signed by {actual}, expected {expected}")]
    SignerMismatch { expected: Address, actual: Address },
}

/// A certificate over a height-bounded permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionCertificate {
    /// The public input the certificate attests to.
    pub input: PermissionInput,
    /// The opaque proof bytes.
    pub proof: Vec<u8>,
}

impl PermissionCertificate {
    /// The height below which the permission is valid.
    #[must_use]
    pub fn permission_until_block_height(&self) -> u32 {
        self.input.permissionUntilBlockHeight
    }
}

/// Checks a [`PermissionCertificate`] before its public input is trusted.
pub trait PermissionVerifier: Send + Sync {
    /// Returns an error unless the certificate is valid.
    fn verify(&self, certificate: &PermissionCertificate) -> Result<(), VerifierError>;
}

/// Accepts every certificate.
#[derive(Debug, Clone, Default)]
pub struct MockVerifier;

impl PermissionVerifier for MockVerifier {
    fn verify(&self, _certificate: &PermissionCertificate) -> Result<(), VerifierError> {
        Ok(())
    }
}

/// Accepts certificates whose proof is a `personal_sign` signature by the authority over the
/// ABI-encoded public input, issued for the authority's own account.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    /// The only account allowed to grant permissions.
    pub authority: Address,
}

impl SignatureVerifier {
    /// Creates a verifier trusting `authority`.
    #[must_use]
    pub fn new(authority: Address) -> Self {
        Self { authority }
    }
}

impl PermissionVerifier for SignatureVerifier {
    fn verify(&self, certificate: &PermissionCertificate) -> Result<(), VerifierError> {
        let signer = eth_sign_verify(&permission_message(&certificate.input), &certificate.proof)?;
        if signer != self.authority || certificate.input.account != self.authority {
            return Err(VerifierError::SignerMismatch { expected: self.authority, actual: signer });
        }
        Ok(())
    }
}
