//! Events.
//!
//! Notifications emitted for every action a rollup applies, and the sinks that receive them.

use std::sync::mpsc::Sender;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// A notification emitted by the rollup engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FarmEvent {
    /// The pool total after an action was applied.
    TotalStakedBalance(u64),
    /// The reward settled for an address by an action.
    UserReward {
        /// The delegator.
        address: Address,
        /// The settled amount.
        reward: u64,
    },
}

/// An append-only notification channel.
///
/// Emission is best effort: a sink must not block and must not fail the rollup.
pub trait EventSink {
    /// Records one event.
    fn emit(&mut self, event: FarmEvent);
}

/// A sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&mut self, _event: FarmEvent) {}
}

impl EventSink for Vec<FarmEvent> {
    fn emit(&mut self, event: FarmEvent) {
        self.push(event);
    }
}

impl EventSink for Sender<FarmEvent> {
    fn emit(&mut self, event: FarmEvent) {
        // A disconnected receiver only loses notifications.
        let _ = self.send(event);
    }
}
