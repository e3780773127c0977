//! Augmented Kohn linear system and the three variational phase-shift estimators.

use super::constants::PhysicalConstants;
use super::io::short_range::ShortRangeBlock;
use super::linalg::{MatrixError, SquareMatrix};
use nalgebra::{Complex, DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum KohnError {
    #[error("the {estimator} system is singular")]
    Singular { estimator: &'static str },
    #[error("{name} holds {found} coupling entries but the short-range block has width {expected}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("short-range block is inconsistent: {0}")]
    Matrix(#[from] MatrixError),
}

/// Long-range/long-range matrix elements `<X|L|(1 + sf P23) Y>` for `X, Y` in `{S̄, C̄}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LongRangeScalars {
    pub sls: f64,
    pub slc: f64,
    pub cls: f64,
    pub clc: f64,
}

impl LongRangeScalars {
    /// `SLC - CLS`, which equals the Wronskian for exact quadrature.
    pub fn wronskian_estimate(&self) -> f64 {
        self.slc - self.cls
    }
}

impl AddAssign for LongRangeScalars {
    fn add_assign(&mut self, rhs: Self) {
        self.sls += rhs.sls;
        self.slc += rhs.slc;
        self.cls += rhs.cls;
        self.clc += rhs.clc;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseShifts {
    pub kohn: f64,
    pub inverse_kohn: f64,
    pub complex_kohn: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossSections {
    pub kohn: f64,
    pub inverse_kohn: f64,
    pub complex_kohn: f64,
}

impl PhaseShifts {
    /// Partial-wave cross sections with the S-wave multiplicity, whatever `l_value` is.
    pub fn cross_sections(&self, constants: &PhysicalConstants, l_value: u32) -> CrossSections {
        if l_value > 0 {
            warn!(
                l_value,
                "cross sections use the S-wave multiplicity; the (2l+1) factor is not applied"
            );
        }
        CrossSections {
            kohn: constants.cross_section(self.kohn),
            inverse_kohn: constants.cross_section(self.inverse_kohn),
            complex_kohn: constants.cross_section(self.complex_kohn),
        }
    }
}

/// Long-range row and vector prepended to the short-range block.
///
/// Index 0 of `a_row` and `b` holds `CLC` and `CLS`; index `i + 1` couples short-range
/// term `i` to `C̄` and `S̄` respectively.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedSystem {
    a_row: Vec<f64>,
    b: Vec<f64>,
    short_terms: SquareMatrix,
    scalars: LongRangeScalars,
    active_dim: usize,
    wronskian: f64,
}

impl AugmentedSystem {
    pub fn assemble(
        a_terms: &[f64],
        b_terms: &[f64],
        scalars: LongRangeScalars,
        block: &ShortRangeBlock,
        kappa: f64,
        l_value: u32,
        constants: &PhysicalConstants,
    ) -> Result<Self, KohnError> {
        let width = block.width();
        for (name, terms) in [("A row", a_terms), ("B vector", b_terms)] {
            if terms.len() != width {
                return Err(KohnError::LengthMismatch {
                    name,
                    expected: width,
                    found: terms.len(),
                });
            }
        }

        let shift = 1.5 - 0.5 * kappa * kappa;
        let short_terms = block
            .phi_h_phi
            .zip_with(&block.phi_phi, |h, s| h + shift * s)?;

        let mut a_row = Vec::with_capacity(width + 1);
        a_row.push(scalars.clc);
        a_row.extend_from_slice(a_terms);
        let mut b = Vec::with_capacity(width + 1);
        b.push(scalars.cls);
        b.extend_from_slice(b_terms);

        let multiplier = if l_value == 0 { 1 } else { 2 };
        Ok(Self {
            a_row,
            b,
            short_terms,
            scalars,
            active_dim: width / 2 * multiplier,
            wronskian: constants.wronskian,
        })
    }

    pub fn a_row(&self) -> &[f64] {
        &self.a_row
    }

    pub fn b(&self) -> &[f64] {
        &self.b
    }

    pub fn short_terms(&self) -> &SquareMatrix {
        &self.short_terms
    }

    pub fn scalars(&self) -> &LongRangeScalars {
        &self.scalars
    }

    /// Number of short-range functions entering the solves.
    pub fn active_dim(&self) -> usize {
        self.active_dim
    }

    /// Entries of `a_row`/`b` that take part in the solves, the scalar included.
    pub fn active_a_row(&self) -> &[f64] {
        &self.a_row[..=self.active_dim]
    }

    pub fn active_b(&self) -> &[f64] {
        &self.b[..=self.active_dim]
    }

    fn bordered(&self, corner: f64, border: &[f64]) -> Result<DMatrix<f64>, KohnError> {
        let n = self.active_dim;
        let block = self.short_terms.leading_block(n)?;
        Ok(DMatrix::from_fn(n + 1, n + 1, |i, j| match (i, j) {
            (0, 0) => corner,
            (0, j) => border[j],
            (i, 0) => border[i],
            (i, j) => block[(i - 1, j - 1)],
        }))
    }

    fn rhs(&self, head: f64, tail: &[f64]) -> DVector<f64> {
        DVector::from_fn(self.active_dim + 1, |i, _| {
            if i == 0 { -head } else { -tail[i] }
        })
    }

    fn tail_dot(solution: &DVector<f64>, vector: &[f64]) -> f64 {
        (1..solution.len()).map(|i| solution[i] * vector[i]).sum()
    }

    /// Kohn estimate with trial function `S̄ + λC̄ + Σ c_i φ_i`.
    pub fn kohn(&self) -> Result<f64, KohnError> {
        let s = &self.scalars;
        let matrix = self.bordered(s.clc, self.active_a_row())?;
        let solution = matrix
            .lu()
            .solve(&self.rhs(s.cls, &self.b))
            .ok_or(KohnError::Singular { estimator: "Kohn" })?;
        let lambda = solution[0];
        let stationary = s.sls + lambda * s.slc + Self::tail_dot(&solution, &self.b);
        let tan_delta = lambda - stationary / self.wronskian;
        Ok(tan_delta.atan())
    }

    /// Inverse Kohn estimate with trial function `C̄ + μS̄ + Σ d_i φ_i`.
    pub fn inverse_kohn(&self) -> Result<f64, KohnError> {
        let s = &self.scalars;
        let matrix = self.bordered(s.sls, self.active_b())?;
        let solution = matrix
            .lu()
            .solve(&self.rhs(s.slc, &self.a_row))
            .ok_or(KohnError::Singular {
                estimator: "inverse Kohn",
            })?;
        let mu = solution[0];
        let stationary = s.clc + mu * s.cls + Self::tail_dot(&solution, &self.a_row);
        let cot_delta = mu + stationary / self.wronskian;
        Ok((1.0 / cot_delta).atan())
    }

    /// Complex Kohn estimate with trial function `S̄ + T(C̄ + iS̄) + Σ c_i φ_i`.
    pub fn complex_kohn(&self) -> Result<f64, KohnError> {
        let s = &self.scalars;
        let n = self.active_dim;
        let block = self.short_terms.leading_block(n)?;
        let uu = Complex::new(s.clc - s.sls, s.cls + s.slc);
        let coupling = |i: usize| Complex::new(self.a_row[i], self.b[i]);

        let matrix = DMatrix::from_fn(n + 1, n + 1, |i, j| match (i, j) {
            (0, 0) => uu,
            (0, j) => coupling(j),
            (i, 0) => coupling(i),
            (i, j) => Complex::new(block[(i - 1, j - 1)], 0.0),
        });
        let rhs = DVector::from_fn(n + 1, |i, _| {
            if i == 0 {
                -Complex::new(s.cls, s.sls)
            } else {
                Complex::new(-self.b[i], 0.0)
            }
        });
        let solution = matrix.lu().solve(&rhs).ok_or(KohnError::Singular {
            estimator: "complex Kohn",
        })?;

        let t = solution[0];
        let coupling_sum: Complex<f64> = (1..=n).map(|i| solution[i] * self.b[i]).sum();
        let stationary = Complex::new(s.sls, 0.0) + t * Complex::new(s.slc, s.sls) + coupling_sum;
        let t = t - stationary / self.wronskian;
        let tan_delta = t / (Complex::new(1.0, 0.0) + Complex::new(0.0, 1.0) * t);
        Ok(tan_delta.re.atan())
    }

    pub fn phase_shifts(&self) -> Result<PhaseShifts, KohnError> {
        Ok(PhaseShifts {
            kohn: self.kohn()?,
            inverse_kohn: self.inverse_kohn()?,
            complex_kohn: self.complex_kohn()?,
        })
    }
}
