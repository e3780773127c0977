//! # Engine Module
//!
//! Run configuration and the machinery that evaluates a scattering run across ranks.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Immutable run parameters, their builder and the execution settings
//! - **Errors** ([`error`]) - The engine error type wrapping every lower-level failure
//! - **Progress** ([`progress`]) - Callback-based progress events
//! - **Partition** ([`partition`]) - Deterministic contiguous slicing of the power tables
//! - **Channels** ([`comm`]) - Typed rendezvous channels and the rank wiring
//! - **Aggregation** ([`aggregate`]) - Gathering partial blocks and merging the qi subsets
//! - **Tasks** ([`tasks`]) - The long-long and short-long integral evaluators

pub mod aggregate;
pub mod comm;
pub mod config;
pub mod error;
pub mod partition;
pub mod progress;
pub mod tasks;
