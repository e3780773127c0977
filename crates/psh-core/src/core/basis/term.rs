use serde::{Deserialize, Serialize};

/// Exponents of one Hylleraas-type term over `(r1, r2, r12, r3, r13, r23)`.
///
/// Exponents are signed because the symmetry partner of a term lowers `k` by the
/// partial-wave angular momentum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BasisTerm {
    pub k: i32,
    pub l: i32,
    pub m: i32,
    pub n: i32,
    pub p: i32,
    pub q: i32,
}

impl BasisTerm {
    pub const fn new(k: i32, l: i32, m: i32, n: i32, p: i32, q: i32) -> Self {
        Self { k, l, m, n, p, q }
    }

    /// Total power `k + l + m + n + p + q`.
    pub fn order(&self) -> i32 {
        self.k + self.l + self.m + self.n + self.p + self.q
    }

    /// The symmetry-partner variant used for partial wave `l_value`.
    pub fn partner(&self, l_value: u32) -> Self {
        let shift = l_value as i32;
        Self {
            k: self.k - shift,
            l: self.l + shift,
            ..*self
        }
    }

    pub fn qi_class(&self) -> QiClass {
        if self.q == 0 {
            QiClass::Zero
        } else {
            QiClass::Positive
        }
    }
}

/// Which integral family a term belongs to, decided by its `r23` exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QiClass {
    Zero,
    Positive,
}

/// Nonlinear decay parameters shared by every term of a table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NonlinearParams {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl NonlinearParams {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }

    /// The exponential factor `exp(-(alpha r1 + beta r2 + gamma r3))`.
    #[inline]
    pub fn decay(&self, r1: f64, r2: f64, r3: f64) -> f64 {
        (-(self.alpha * r1 + self.beta * r2 + self.gamma * r3)).exp()
    }
}
