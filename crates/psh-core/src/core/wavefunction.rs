//! Long-range channel functions and the short-range Hylleraas factors they are paired with.
//!
//! The open channel is positronium (positron 1, electron 2) in its ground state with
//! hydrogen (electron 3) in its ground state, moving with relative momentum `kappa`.
//! Distances are measured in bohr and the operator applied is `L = 2(H - E)`.

use super::basis::BasisTerm;
use super::quadrature::Coordinates;
use super::special::{spherical_j, spherical_n};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Total spin of the two electrons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpinState {
    Singlet,
    Triplet,
}

impl SpinState {
    /// Decodes the triplet flag of a short-range file.
    pub fn from_flag(flag: i32) -> Option<Self> {
        match flag {
            0 => Some(SpinState::Singlet),
            1 => Some(SpinState::Triplet),
            _ => None,
        }
    }

    pub fn flag(&self) -> i32 {
        match self {
            SpinState::Singlet => 0,
            SpinState::Triplet => 1,
        }
    }

    /// Sign of the electron-exchange term in `1 + sf·P23`.
    pub fn exchange_sign(&self) -> f64 {
        match self {
            SpinState::Singlet => 1.0,
            SpinState::Triplet => -1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpinState::Singlet => "Singlet",
            SpinState::Triplet => "Triplet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelParams {
    pub kappa: f64,
    pub l_value: u32,
    /// Shielding decay rate of the irregular function.
    pub mu: f64,
    pub shielding_power: i32,
    /// `+1` for the singlet, `-1` for the triplet electron spin state.
    pub exchange_sign: f64,
}

/// Which part of `L` a pass applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Kinetic and every potential term except the electron repulsion.
    Base,
    /// Electron repulsion `2/r23` only.
    ElectronRepulsion,
    /// The whole operator in one pass.
    Full,
}

/// `S̄`, `C̄` and `L` applied to each at one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelValues {
    pub sine: f64,
    pub cosine: f64,
    pub l_sine: f64,
    pub l_cosine: f64,
}

/// Direct-arrangement bra values and electron-exchange-symmetrised ket values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelPoint {
    pub bra: ChannelValues,
    pub ket_l_sine: f64,
    pub ket_l_cosine: f64,
}

#[derive(Debug, Clone)]
pub struct LongRangeChannel {
    params: ChannelParams,
    sqrt_kappa: f64,
    norm: f64,
}

impl LongRangeChannel {
    pub fn new(params: ChannelParams) -> Self {
        Self {
            params,
            sqrt_kappa: params.kappa.sqrt(),
            norm: 1.0 / ((8.0 * PI).sqrt() * PI.sqrt()),
        }
    }

    pub fn params(&self) -> &ChannelParams {
        &self.params
    }

    /// Values for the arrangement where electron 2 is bound to the positron.
    pub fn arrangement(&self, c: &Coordinates, interaction: Interaction) -> ChannelValues {
        let ChannelParams {
            kappa,
            l_value,
            mu,
            shielding_power,
            ..
        } = self.params;

        let bound = self.norm * (-0.5 * c.r12 - c.r3).exp();
        let rho = 0.5 * (2.0 * c.r1 * c.r1 + 2.0 * c.r2 * c.r2 - c.r12 * c.r12).max(0.0).sqrt();
        let x = kappa * rho;
        let j = spherical_j(l_value as usize, x);
        let n = spherical_n(l_value as usize, x);

        let regular = self.sqrt_kappa * j.value;
        let irregular = -self.sqrt_kappa * n.value;
        let irregular_slope = -self.sqrt_kappa * kappa * n.derivative;
        let shield = Shielding::at(rho, mu, shielding_power);

        let potential = match interaction {
            Interaction::Base => 1.0 / c.r1 - 1.0 / c.r2 - 1.0 / c.r13,
            Interaction::ElectronRepulsion => 1.0 / c.r23,
            Interaction::Full => 1.0 / c.r1 - 1.0 / c.r2 - 1.0 / c.r13 + 1.0 / c.r23,
        };
        let kinetic = match interaction {
            Interaction::ElectronRepulsion => 0.0,
            Interaction::Base | Interaction::Full => {
                -0.5 * (shield.second * irregular
                    + 2.0 * shield.first * irregular_slope
                    + 2.0 * shield.first * irregular / rho)
            }
        };

        ChannelValues {
            sine: bound * regular,
            cosine: bound * irregular * shield.value,
            l_sine: bound * 2.0 * potential * regular,
            l_cosine: bound * (2.0 * potential * irregular * shield.value + kinetic),
        }
    }

    /// Bra values of the direct arrangement with kets symmetrised by `1 + sf·P23`.
    pub fn evaluate(&self, c: &Coordinates, interaction: Interaction) -> ChannelPoint {
        let direct = self.arrangement(c, interaction);
        let exchange = self.arrangement(&c.exchanged(), interaction);
        let sign = self.params.exchange_sign;
        ChannelPoint {
            bra: direct,
            ket_l_sine: direct.l_sine + sign * exchange.l_sine,
            ket_l_cosine: direct.l_cosine + sign * exchange.l_cosine,
        }
    }
}

/// `f(ρ) = (1 - e^{-μρ})^p` and its first two derivatives.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Shielding {
    value: f64,
    first: f64,
    second: f64,
}

impl Shielding {
    fn at(rho: f64, mu: f64, power: i32) -> Self {
        if power == 0 {
            return Self {
                value: 1.0,
                first: 0.0,
                second: 0.0,
            };
        }
        let p = power as f64;
        let e = (-mu * rho).exp();
        let u = 1.0 - e;
        let mut second = -u.powi(power - 1);
        if power >= 2 {
            second += (p - 1.0) * e * u.powi(power - 2);
        }
        Self {
            value: u.powi(power),
            first: p * mu * e * u.powi(power - 1),
            second: p * mu * mu * e * second,
        }
    }
}

/// Polynomial part `r1^k r2^l r12^m r3^n r13^p r23^q` of a short-range term.
#[inline]
pub fn hylleraas_factor(term: &BasisTerm, c: &Coordinates) -> f64 {
    c.r1.powi(term.k)
        * c.r2.powi(term.l)
        * c.r12.powi(term.m)
        * c.r3.powi(term.n)
        * c.r13.powi(term.p)
        * c.r23.powi(term.q)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-10;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() <= TOLERANCE * (1.0 + a.abs().max(b.abs()))
    }

    fn params(l_value: u32, exchange_sign: f64) -> ChannelParams {
        ChannelParams {
            kappa: 0.3,
            l_value,
            mu: 0.7,
            shielding_power: 3,
            exchange_sign,
        }
    }

    fn sample() -> Coordinates {
        Coordinates {
            r1: 1.2,
            r2: 0.9,
            r3: 1.7,
            r12: 0.8,
            r13: 1.1,
            r23: 1.4,
        }
    }

    #[test]
    fn full_interaction_is_base_plus_electron_repulsion() {
        let channel = LongRangeChannel::new(params(1, 1.0));
        let c = sample();
        let base = channel.arrangement(&c, Interaction::Base);
        let repulsion = channel.arrangement(&c, Interaction::ElectronRepulsion);
        let full = channel.arrangement(&c, Interaction::Full);
        assert!(f64_approx_equal(full.l_sine, base.l_sine + repulsion.l_sine));
        assert!(f64_approx_equal(full.l_cosine, base.l_cosine + repulsion.l_cosine));
        assert_eq!(base.sine, full.sine);
    }

    #[test]
    fn triplet_ket_vanishes_at_exchange_symmetric_configuration() {
        let channel = LongRangeChannel::new(params(0, -1.0));
        let c = Coordinates {
            r1: 1.0,
            r2: 1.3,
            r3: 1.3,
            r12: 0.9,
            r13: 0.9,
            r23: 0.5,
        };
        let point = channel.evaluate(&c, Interaction::Full);
        assert!(point.ket_l_sine.abs() < 1e-15);
        assert!(point.ket_l_cosine.abs() < 1e-15);
    }

    #[test]
    fn shielding_derivatives_match_finite_differences() {
        let h = 1e-5;
        for power in 1..=4 {
            for &rho in &[0.2, 1.0, 3.5] {
                let s = Shielding::at(rho, 0.8, power);
                let plus = Shielding::at(rho + h, 0.8, power);
                let minus = Shielding::at(rho - h, 0.8, power);
                assert!(((plus.value - minus.value) / (2.0 * h) - s.first).abs() < 1e-7);
                assert!(((plus.first - minus.first) / (2.0 * h) - s.second).abs() < 1e-7);
            }
        }
    }

    #[test]
    fn zero_shielding_power_leaves_irregular_function_unshielded() {
        let shield = Shielding::at(0.4, 1.0, 0);
        assert_eq!(shield.value, 1.0);
        assert_eq!(shield.first, 0.0);
    }

    #[test]
    fn irregular_function_is_regular_at_origin_when_shielded() {
        let mut p = params(0, 1.0);
        p.shielding_power = 2;
        let channel = LongRangeChannel::new(p);
        let c = Coordinates {
            r1: 1e-4,
            r2: 1e-4,
            r3: 1.0,
            r12: 1e-4,
            r13: 1.0,
            r23: 1.0,
        };
        let values = channel.arrangement(&c, Interaction::Base);
        assert!(values.cosine.is_finite());
        assert!(values.cosine.abs() < 1e-2);
    }

    #[test]
    fn spin_flags_decode_to_exchange_signs() {
        assert_eq!(SpinState::from_flag(0).map(|s| s.exchange_sign()), Some(1.0));
        assert_eq!(SpinState::from_flag(1).map(|s| s.exchange_sign()), Some(-1.0));
        assert_eq!(SpinState::from_flag(2), None);
        assert_eq!(SpinState::Triplet.flag(), 1);
    }

    #[test]
    fn hylleraas_factor_multiplies_coordinate_powers() {
        let term = BasisTerm::new(1, 0, 2, 0, 0, 1);
        let c = sample();
        assert!(f64_approx_equal(hylleraas_factor(&term, &c), 1.2 * 0.8 * 0.8 * 1.4));
        let partner = term.partner(2);
        assert!(f64_approx_equal(
            hylleraas_factor(&partner, &c),
            0.9 * 0.9 * 0.8 * 0.8 * 1.4 / 1.2
        ));
    }
}
