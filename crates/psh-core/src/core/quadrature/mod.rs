//! Quadrature rules and integration meshes.
//!
//! `gauss` builds one-dimensional Gauss-Legendre and Gauss-Laguerre rules, `spec` holds the
//! per-class node counts read from the parameter file, and `mesh` turns both into weighted
//! points over the three-particle coordinates.

pub mod gauss;
pub mod mesh;
pub mod spec;

pub use gauss::GaussRule;
pub use mesh::{Coordinates, DihedralMode, Mesh, MeshPoint, Phi23Mesh, R23Mesh, RadialRules};
pub use spec::{
    CuspRadii, ElectronAxis, IntegralClass, MeshCounts, Phi23Counts, QuadratureSpec, R23Counts,
    RadialCounts,
};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuadratureError {
    #[error("{family} rule of order {order} did not converge")]
    NoConvergence { family: &'static str, order: usize },
}
