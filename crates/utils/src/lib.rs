//! Farm Utilities.
//!
//! Miscellaneous utilities shared by the farm binaries.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![warn(missing_docs)]

mod logger;

pub use logger::*;
