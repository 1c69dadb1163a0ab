//! Errors.
//!
//! This module contains error types that can be emitted by the crate.

use alloy_primitives::{Address, B256};
use std::error::Error as StdError;
use thiserror::Error;

/// The error that can be emitted by the operations of [`crate::farm::Farm`].
#[derive(Debug, PartialEq)]
pub enum FarmError {
    /// A rejected call. The operation is aborted and no state changes.
    Revert(FarmRevert),
    /// An invariant breach. The current step is aborted as a whole.
    Panic(FarmPanic),
}

/// A rejected call. Surfaced to the caller, no state change.
#[derive(Debug, Error, PartialEq)]
#[allow(missing_docs)]
pub enum FarmRevert {
    #[error("Sender {sender} is not authorized to act for {address}")]
    Unauthorized { sender: Address, address: Address },

    #[error("Farm already started by admin {admin}")]
    AlreadyInitialized { admin: Address },

    #[error("Admin {admin} is the unset sentinel")]
    InvalidAdmin { admin: Address },

    #[error("Authorization expired: height {height} >= permission until {until}")]
    AuthorizationExpired { height: u32, until: u32 },

    #[error("Invalid proof")]
    InvalidProof,
}

/// An invariant breach. Fatal for the step that raised it.
#[derive(Debug, Error, PartialEq)]
#[allow(missing_docs)]
pub enum FarmPanic {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Arithmetic underflow")]
    Underflow,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Unknown actions hash checkpoint: {hash}")]
    UnknownActionsHash { hash: B256 },

    #[error("State root mismatch: expected {expected}, store committed to {actual}")]
    StateRootMismatch { expected: B256, actual: B256 },

    #[error("Height regressed: last update {last} > current {current}")]
    HeightRegression { last: u32, current: u32 },
}

impl From<FarmRevert> for FarmError {
    fn from(err: FarmRevert) -> Self {
        FarmError::Revert(err)
    }
}

impl From<FarmPanic> for FarmError {
    fn from(err: FarmPanic) -> Self {
        FarmError::Panic(err)
    }
}

impl StdError for FarmError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            FarmError::Revert(err) => Some(err),
            FarmError::Panic(err) => Some(err),
        }
    }
}

impl std::fmt::Display for FarmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FarmError::Revert(err) => write!(f, "Farm Revert: {err}"),
            FarmError::Panic(err) => write!(f, "Farm Panic: {err}"),
        }
    }
}
