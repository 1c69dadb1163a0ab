//! Offchain-State Yield Farm Core Library.
//!
//! Users deposit and withdraw stake and earn rewards proportional to their share of the pool. The
//! per-user ledger and the pool counters live in an authenticated offchain store that is committed
//! to by a single root hash. Pending user actions are appended to a hash-chained log and
//! periodically rolled up into a new root by a deterministic state-transition function.

#![warn(clippy::pedantic)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::unreadable_literal)]
#![warn(missing_docs)]

pub mod actions;
pub mod backup;
pub mod context;
pub mod errors;
pub mod events;
pub mod farm;
pub mod math;
pub mod merkle;
pub mod offchain;
pub mod receipts;
pub mod rollup;
pub mod settings;
pub mod signing;
pub mod sol;
pub mod storage;
pub mod verifier;
