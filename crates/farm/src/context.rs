//! Execution context and authorization of controller calls.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::errors::FarmRevert;

/// The execution context of a controller call.
///
/// Carries what the host substrate knows about the call: the current height and the account
/// that authorized it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// The current block height.
    pub height: u32,
    /// The account that signed the call.
    pub sender: Address,
}

impl ExecutionContext {
    /// Creates a context at `height` signed by `sender`.
    #[must_use]
    pub fn new(height: u32, sender: Address) -> Self {
        Self { height, sender }
    }
}

/// Decides whether a call may act on behalf of an address.
pub trait Authorizer {
    /// Returns [`FarmRevert::Unauthorized`] unless the call may act for `address`.
    fn authorize(&self, ctx: &ExecutionContext, address: Address) -> Result<(), FarmRevert>;
}

/// Only the address itself may act for an address.
#[derive(Debug, Clone, Copy, Default)]
pub struct SenderAuthorizer;

impl Authorizer for SenderAuthorizer {
    fn authorize(&self, ctx: &ExecutionContext, address: Address) -> Result<(), FarmRevert> {
        if ctx.sender != address {
            return Err(FarmRevert::Unauthorized { sender: ctx.sender, address });
        }
        Ok(())
    }
}

/// Accepts every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _ctx: &ExecutionContext, _address: Address) -> Result<(), FarmRevert> {
        Ok(())
    }
}
