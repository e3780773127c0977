//! # Core Module
//!
//! Stateless building blocks for the Ps-H scattering calculation.
//!
//! ## Architecture
//!
//! - **Physical Constants** ([`constants`]) - Immutable constants passed explicitly
//! - **Basis Terms** ([`basis`]) - Exponent tuples, term orderings and power tables
//! - **Quadrature** ([`quadrature`]) - Gauss rules, quadrature specs and coordinate meshes
//! - **Special Functions** ([`special`]) - Spherical Bessel functions of the first and second kind
//! - **Wavefunctions** ([`wavefunction`]) - Long-range channel functions and short-range terms
//! - **Linear Algebra** ([`linalg`]) - Dense row-major matrix views
//! - **Kohn Estimators** ([`kohn`]) - Augmented system assembly and the three phase-shift variants
//! - **File I/O** ([`io`]) - Parameter file, short-range binary file and the text report

pub mod basis;
pub mod constants;
pub mod io;
pub mod kohn;
pub mod linalg;
pub mod quadrature;
pub mod special;
pub mod wavefunction;
