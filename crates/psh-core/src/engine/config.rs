use crate::core::basis::{NonlinearParams, TermEnumerator, TermOrdering, table_size};
use crate::core::io::{ParameterFile, ShortRangeHeader};
use crate::core::quadrature::{CuspRadii, QuadratureSpec};
use crate::core::wavefunction::ChannelParams;
use thiserror::Error;

pub use crate::core::wavefunction::SpinState;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Every scalar a rank needs to evaluate its slice. Built once by the coordinator and
/// shared read-only with all ranks.
#[derive(Debug, Clone, PartialEq)]
pub struct RunParameters {
    pub kappa: f64,
    pub omega: i32,
    pub num_short_terms: usize,
    pub l_value: u32,
    pub ordering: TermOrdering,
    pub spin: SpinState,
    pub nonlinear: NonlinearParams,
    pub mu: f64,
    pub shielding_power: i32,
    pub lambda: [f64; 3],
    pub cusps: CuspRadii,
    pub quadrature: QuadratureSpec,
}

/// Laguerre decay scales `(r1, r2, r3)` of the long-long meshes.
///
/// The long-long integrand decays as `|Φ_Ps Φ_H|²`: `e^{-r12}` leaves unit rates along r1
/// and r2, and `e^{-2 r3}` along r3.
pub const LONG_LONG_SCALES: [f64; 3] = [1.0, 1.0, 2.0];

impl RunParameters {
    pub fn enumerator(&self) -> &'static dyn TermEnumerator {
        self.ordering.enumerator()
    }

    pub fn channel_params(&self) -> ChannelParams {
        ChannelParams {
            kappa: self.kappa,
            l_value: self.l_value,
            mu: self.mu,
            shielding_power: self.shielding_power,
            exchange_sign: self.spin.exchange_sign(),
        }
    }

    /// Laguerre decay scales of the long-long meshes.
    pub fn long_long_scales(&self) -> [f64; 3] {
        LONG_LONG_SCALES
    }

    /// Laguerre decay scales of the short-long meshes: `lambda` where positive, otherwise
    /// the combined decay of the short-range term and the channel function.
    pub fn short_long_scales(&self) -> [f64; 3] {
        let NonlinearParams { alpha, beta, gamma } = self.nonlinear;
        let fallback = [alpha + 0.5, beta + 0.5, gamma + 1.0];
        let mut scales = [0.0; 3];
        for (scale, (lambda, fallback)) in scales.iter_mut().zip(self.lambda.iter().zip(fallback)) {
            *scale = if *lambda > 0.0 { *lambda } else { fallback };
        }
        scales
    }
}

#[derive(Default)]
pub struct RunParametersBuilder {
    kappa: Option<f64>,
    omega: Option<i32>,
    num_short_terms: Option<usize>,
    l_value: Option<u32>,
    ordering: Option<TermOrdering>,
    spin: Option<SpinState>,
    nonlinear: Option<NonlinearParams>,
    mu: Option<f64>,
    shielding_power: Option<i32>,
    lambda: Option<[f64; 3]>,
    cusps: Option<CuspRadii>,
    quadrature: Option<QuadratureSpec>,
}

impl RunParametersBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kappa(mut self, kappa: f64) -> Self {
        self.kappa = Some(kappa);
        self
    }
    pub fn omega(mut self, omega: i32) -> Self {
        self.omega = Some(omega);
        self
    }
    pub fn num_short_terms(mut self, n: usize) -> Self {
        self.num_short_terms = Some(n);
        self
    }
    pub fn l_value(mut self, l_value: u32) -> Self {
        self.l_value = Some(l_value);
        self
    }
    pub fn ordering(mut self, ordering: TermOrdering) -> Self {
        self.ordering = Some(ordering);
        self
    }
    pub fn spin(mut self, spin: SpinState) -> Self {
        self.spin = Some(spin);
        self
    }
    pub fn nonlinear(mut self, nonlinear: NonlinearParams) -> Self {
        self.nonlinear = Some(nonlinear);
        self
    }
    pub fn mu(mut self, mu: f64) -> Self {
        self.mu = Some(mu);
        self
    }
    pub fn shielding_power(mut self, power: i32) -> Self {
        self.shielding_power = Some(power);
        self
    }
    pub fn lambda(mut self, lambda: [f64; 3]) -> Self {
        self.lambda = Some(lambda);
        self
    }
    pub fn cusps(mut self, cusps: CuspRadii) -> Self {
        self.cusps = Some(cusps);
        self
    }
    pub fn quadrature(mut self, quadrature: QuadratureSpec) -> Self {
        self.quadrature = Some(quadrature);
        self
    }

    /// Takes the basis description from a validated short-range header.
    pub fn header(self, header: &ShortRangeHeader) -> Self {
        self.omega(header.omega)
            .num_short_terms(header.num_short_terms)
            .l_value(header.l_value)
            .ordering(header.ordering)
            .spin(header.spin)
            .nonlinear(header.nonlinear)
    }

    /// Takes the quadrature and channel settings from a parameter file.
    pub fn parameter_file(self, file: &ParameterFile) -> Self {
        self.quadrature(file.quadrature)
            .cusps(file.cusps)
            .mu(file.mu)
            .shielding_power(file.shielding_power)
            .lambda(file.lambda)
    }

    pub fn build(self) -> Result<RunParameters, ConfigError> {
        let kappa = self.kappa.ok_or(ConfigError::MissingParameter("kappa"))?;
        if !kappa.is_finite() || kappa <= 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "kappa",
                reason: format!("{kappa} is not a positive momentum"),
            });
        }

        let omega = self.omega.ok_or(ConfigError::MissingParameter("omega"))?;
        let num_short_terms = self
            .num_short_terms
            .ok_or(ConfigError::MissingParameter("num_short_terms"))?;
        if num_short_terms > table_size(omega) {
            return Err(ConfigError::InvalidValue {
                name: "num_short_terms",
                reason: format!(
                    "{num_short_terms} terms exceed the {} available for omega {omega}",
                    table_size(omega)
                ),
            });
        }

        Ok(RunParameters {
            kappa,
            omega,
            num_short_terms,
            l_value: self.l_value.ok_or(ConfigError::MissingParameter("l_value"))?,
            ordering: self.ordering.ok_or(ConfigError::MissingParameter("ordering"))?,
            spin: self.spin.ok_or(ConfigError::MissingParameter("spin"))?,
            nonlinear: self
                .nonlinear
                .ok_or(ConfigError::MissingParameter("nonlinear"))?,
            mu: self.mu.ok_or(ConfigError::MissingParameter("mu"))?,
            shielding_power: self
                .shielding_power
                .ok_or(ConfigError::MissingParameter("shielding_power"))?,
            lambda: self.lambda.unwrap_or([0.0; 3]),
            cusps: self.cusps.ok_or(ConfigError::MissingParameter("cusps"))?,
            quadrature: self
                .quadrature
                .ok_or(ConfigError::MissingParameter("quadrature"))?,
        })
    }
}

/// How many ranks run and how many threads each may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionConfig {
    pub workers: usize,
    /// `None` lets each rank's pool pick its own size.
    pub threads_per_worker: Option<usize>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            threads_per_worker: None,
        }
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidValue {
                name: "workers",
                reason: "at least one rank is required".to_string(),
            });
        }
        if self.threads_per_worker == Some(0) {
            return Err(ConfigError::InvalidValue {
                name: "threads_per_worker",
                reason: "a rank needs at least one thread".to_string(),
            });
        }
        Ok(())
    }
}
