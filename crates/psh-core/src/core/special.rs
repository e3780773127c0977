//! Real spherical Bessel functions `j_l` and `n_l` with their first derivatives.
//!
//! `j_l` uses its power series below the turning point `x <= l` (and for small `x`),
//! where upward recurrence loses accuracy, and upward recurrence from the closed forms of
//! `j_0`/`j_1` elsewhere. `n_l` is always generated by upward recurrence, which is stable
//! for the irregular solution.

const SERIES_CUTOFF: f64 = 1.0;
const SERIES_MAX_ITER: usize = 200;
const SERIES_REL_TOL: f64 = 1.0e-16;

/// Value and derivative (with respect to the argument) of a spherical Bessel function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BesselValue {
    pub value: f64,
    pub derivative: f64,
}

/// `j_l(x)` and `j_l'(x)`.
pub fn spherical_j(order: usize, x: f64) -> BesselValue {
    let sequence = spherical_j_sequence(order + 1, x);
    with_derivative(&sequence, order, x)
}

/// `n_l(x)` and `n_l'(x)`, with the convention `n_0(x) = -cos(x)/x`.
pub fn spherical_n(order: usize, x: f64) -> BesselValue {
    let sequence = spherical_n_sequence(order + 1, x);
    with_derivative(&sequence, order, x)
}

fn with_derivative(sequence: &[f64], order: usize, x: f64) -> BesselValue {
    // f_l' = (l / x) f_l - f_{l+1}
    let value = sequence[order];
    let derivative = order as f64 / x * value - sequence[order + 1];
    BesselValue { value, derivative }
}

fn spherical_j_sequence(max_order: usize, x: f64) -> Vec<f64> {
    let mut values = vec![0.0; max_order + 1];
    if x.abs() < SERIES_CUTOFF || x <= max_order as f64 {
        for (order, value) in values.iter_mut().enumerate() {
            *value = j_series(order, x);
        }
        return values;
    }

    let (sin, cos) = x.sin_cos();
    values[0] = sin / x;
    if max_order >= 1 {
        values[1] = sin / (x * x) - cos / x;
    }
    for order in 2..=max_order {
        values[order] = (2 * order - 1) as f64 / x * values[order - 1] - values[order - 2];
    }
    values
}

fn spherical_n_sequence(max_order: usize, x: f64) -> Vec<f64> {
    let mut values = vec![0.0; max_order + 1];
    let (sin, cos) = x.sin_cos();
    values[0] = -cos / x;
    if max_order >= 1 {
        values[1] = -cos / (x * x) - sin / x;
    }
    for order in 2..=max_order {
        values[order] = (2 * order - 1) as f64 / x * values[order - 1] - values[order - 2];
    }
    values
}

/// `j_l(x) = x^l / (2l+1)!! * sum_k (-x^2/2)^k / (k! (2l+3)(2l+5)...(2l+2k+1))`.
fn j_series(order: usize, x: f64) -> f64 {
    let mut prefactor = 1.0;
    for i in 0..order {
        prefactor *= x / (2 * i + 3) as f64;
    }
    // prefactor now holds x^l / (3 * 5 * ... * (2l+1)), which equals x^l / (2l+1)!!.
    let half_square = -0.5 * x * x;
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..=SERIES_MAX_ITER {
        term *= half_square / (k as f64 * (2 * order + 2 * k + 1) as f64);
        sum += term;
        if term.abs() <= SERIES_REL_TOL * sum.abs() {
            break;
        }
    }
    prefactor * sum
}
