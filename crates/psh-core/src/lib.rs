//! # Ps-H Kohn Scattering Library
//!
//! Computes positronium–hydrogen scattering phase shifts with the Kohn variational
//! method. Long-range channel functions are coupled to a precomputed block of
//! correlated short-range Hylleraas terms through multi-dimensional Gauss quadrature,
//! and the resulting augmented linear system yields the Kohn, inverse Kohn and complex
//! (T-matrix) Kohn estimates of the phase shift.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`BasisTerm`, `PowerTable`,
//!   `SquareMatrix`), numerics (Gauss rules, spherical Bessel functions, coordinate
//!   meshes, channel wavefunctions), the Kohn estimators and file formats.
//!
//! - **[`engine`]: The Logic Core.** Run configuration, error types, progress reporting,
//!   the deterministic work partition, typed rendezvous channels between ranks, result
//!   aggregation and the integral evaluator tasks.
//!
//! - **[`workflows`]: The Public API.** The coordinator and worker roles and the complete
//!   scattering run that ties them together.

pub mod core;
pub mod engine;
pub mod workflows;
