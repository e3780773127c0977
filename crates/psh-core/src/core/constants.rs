use std::f64::consts::PI;

/// Numerical constants shared by every stage of a run.
///
/// A single instance is created per run and passed by reference, so no stage depends on
/// process-wide mutable state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalConstants {
    pub pi: f64,
    /// Ground-state energy of positronium in hartree.
    pub ps_ground_energy: f64,
    /// Ground-state energy of hydrogen in hartree.
    pub h_ground_energy: f64,
    /// Total mass of positronium in electron masses.
    pub ps_mass: f64,
    /// `<S|L|C> - <C|L|S>` for unit-normalised channel functions and `L = 2(H - E)`.
    pub wronskian: f64,
}

impl PhysicalConstants {
    pub const fn new() -> Self {
        Self {
            pi: PI,
            ps_ground_energy: -0.25,
            h_ground_energy: -0.5,
            ps_mass: 2.0,
            wronskian: 0.5,
        }
    }

    /// Total energy of the scattering system for the relative momentum `kappa`.
    pub fn total_energy(&self, kappa: f64) -> f64 {
        self.ps_ground_energy + self.h_ground_energy + kappa * kappa / (2.0 * self.ps_mass)
    }

    /// Partial-wave cross section for an S-wave multiplicity.
    pub fn cross_section(&self, phase: f64) -> f64 {
        4.0 * self.pi * phase.sin().powi(2)
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self::new()
    }
}
