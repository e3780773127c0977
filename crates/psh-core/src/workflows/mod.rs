//! # Workflows Module
//!
//! Top-level entry points for a scattering run.
//!
//! ## Architecture
//!
//! - **Coordinator** ([`coordinator`]) - The rank-0 role that owns the parameter,
//!   short-range and output files (`load_inputs`, `report_results`)
//! - **Worker** ([`worker`]) - The evaluation role every rank plays on its slice
//!   (`evaluate_slice`)
//! - **Scatter** ([`scatter`]) - The complete run: ranks as scoped threads, each with its
//!   own bounded thread pool, joined by typed rendezvous channels

pub mod coordinator;
pub mod scatter;
pub mod worker;

pub use coordinator::{Coordinator, RunPaths};
pub use scatter::{Couplings, evaluate, run};
pub use worker::Worker;
