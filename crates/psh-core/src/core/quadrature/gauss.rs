use super::QuadratureError;
use std::f64::consts::PI;

const NEWTON_TOLERANCE: f64 = 3.0e-14;
const MAX_NEWTON_ITER: usize = 100;

/// A one-dimensional quadrature rule as parallel node and weight lists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GaussRule {
    nodes: Vec<f64>,
    weights: Vec<f64>,
}

impl GaussRule {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Gauss-Legendre rule on `[-1, 1]`.
    pub fn legendre(order: usize) -> Result<Self, QuadratureError> {
        let mut nodes = vec![0.0; order];
        let mut weights = vec![0.0; order];
        let n = order as f64;

        for i in 0..order.div_ceil(2) {
            let mut z = (PI * (i as f64 + 0.75) / (n + 0.5)).cos();
            let mut derivative = 0.0;
            let mut converged = false;
            for _ in 0..MAX_NEWTON_ITER {
                let mut p1 = 1.0;
                let mut p2 = 0.0;
                for j in 0..order {
                    let p3 = p2;
                    p2 = p1;
                    p1 = ((2 * j + 1) as f64 * z * p2 - j as f64 * p3) / (j + 1) as f64;
                }
                derivative = n * (z * p1 - p2) / (z * z - 1.0);
                let previous = z;
                z = previous - p1 / derivative;
                if (z - previous).abs() <= NEWTON_TOLERANCE {
                    converged = true;
                    break;
                }
            }
            if !converged {
                return Err(QuadratureError::NoConvergence {
                    family: "Gauss-Legendre",
                    order,
                });
            }
            let weight = 2.0 / ((1.0 - z * z) * derivative * derivative);
            nodes[i] = -z;
            nodes[order - 1 - i] = z;
            weights[i] = weight;
            weights[order - 1 - i] = weight;
        }

        Ok(Self { nodes, weights })
    }

    /// Gauss-Laguerre rule for `∫_0^∞ e^{-x} f(x) dx`.
    pub fn laguerre(order: usize) -> Result<Self, QuadratureError> {
        let mut nodes = vec![0.0; order];
        let mut weights = vec![0.0; order];
        let n = order as f64;
        let mut z = 0.0;

        for i in 0..order {
            z = match i {
                0 => 3.0 / (1.0 + 2.4 * n),
                1 => z + 15.0 / (1.0 + 2.5 * n),
                _ => {
                    let ai = (i - 1) as f64;
                    z + (1.0 + 2.55 * ai) / (1.9 * ai) * (z - nodes[i - 2])
                }
            };

            let mut converged = false;
            for _ in 0..MAX_NEWTON_ITER {
                let (p1, _, derivative) = laguerre_at(order, z);
                let previous = z;
                z = previous - p1 / derivative;
                if (z - previous).abs() <= NEWTON_TOLERANCE * z.abs().max(1.0) {
                    converged = true;
                    break;
                }
            }
            if !converged {
                return Err(QuadratureError::NoConvergence {
                    family: "Gauss-Laguerre",
                    order,
                });
            }
            let (_, below, derivative) = laguerre_at(order, z);
            nodes[i] = z;
            weights[i] = -1.0 / (derivative * n * below);
        }

        Ok(Self { nodes, weights })
    }

    /// Maps a rule on `[-1, 1]` onto `[lower, upper]`.
    pub fn mapped(&self, lower: f64, upper: f64) -> Self {
        let half_width = 0.5 * (upper - lower);
        let midpoint = 0.5 * (upper + lower);
        Self {
            nodes: self.nodes.iter().map(|x| midpoint + half_width * x).collect(),
            weights: self.weights.iter().map(|w| half_width * w).collect(),
        }
    }

    /// Turns a Laguerre rule into a plain rule for `∫_start^∞ f(r) dr` with decay scale `scale`.
    pub fn shifted_tail(&self, start: f64, scale: f64) -> Self {
        Self {
            nodes: self.nodes.iter().map(|x| start + x / scale).collect(),
            weights: self
                .nodes
                .iter()
                .zip(&self.weights)
                .map(|(x, w)| w * x.exp() / scale)
                .collect(),
        }
    }

    /// Concatenates two rules covering adjacent intervals.
    pub fn joined(mut self, other: Self) -> Self {
        self.nodes.extend(other.nodes);
        self.weights.extend(other.weights);
        self
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + Clone + '_ {
        self.nodes.iter().copied().zip(self.weights.iter().copied())
    }

    pub fn weight_sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    pub fn integrate(&self, f: impl Fn(f64) -> f64) -> f64 {
        self.points().map(|(x, w)| w * f(x)).sum()
    }
}

/// Returns `(L_n(z), L_{n-1}(z), L_n'(z))`.
fn laguerre_at(order: usize, z: f64) -> (f64, f64, f64) {
    let mut p1 = 1.0;
    let mut p2 = 0.0;
    for j in 0..order {
        let p3 = p2;
        p2 = p1;
        p1 = (((2 * j + 1) as f64 - z) * p2 - j as f64 * p3) / (j + 1) as f64;
    }
    let n = order as f64;
    (p1, p2, n * (p1 - p2) / z)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * (1.0 + a.abs().max(b.abs()))
    }

    #[test]
    fn zero_order_rules_are_empty() {
        assert!(GaussRule::legendre(0).unwrap().is_empty());
        assert!(GaussRule::laguerre(0).unwrap().is_empty());
    }

    #[test]
    fn point_product_covers_every_node_pair() {
        let outer = GaussRule::legendre(3).unwrap();
        let inner = GaussRule::laguerre(2).unwrap();
        let pairs: Vec<_> = itertools::iproduct!(outer.points(), inner.points()).collect();
        assert_eq!(pairs.len(), 6);
        let total: f64 = pairs.iter().map(|((_, wa), (_, wb))| wa * wb).sum();
        assert!(f64_approx_equal(total, 2.0, TOLERANCE));
        let first = (outer.nodes()[0], outer.weights()[0]);
        let second = (inner.nodes()[1], inner.weights()[1]);
        assert_eq!(pairs[1], (first, second));
    }

    #[test]
    fn single_point_legendre_is_midpoint_rule() {
        let rule = GaussRule::legendre(1).unwrap();
        assert!(rule.nodes()[0].abs() < TOLERANCE);
        assert!(f64_approx_equal(rule.weights()[0], 2.0, TOLERANCE));
    }

    #[test]
    fn single_point_laguerre_sits_at_one() {
        let rule = GaussRule::laguerre(1).unwrap();
        assert!(f64_approx_equal(rule.nodes()[0], 1.0, 1e-12));
        assert!(f64_approx_equal(rule.weights()[0], 1.0, 1e-12));
    }

    #[test]
    fn legendre_integrates_polynomials_exactly() {
        let rule = GaussRule::legendre(6).unwrap();
        assert!(f64_approx_equal(rule.weight_sum(), 2.0, TOLERANCE));
        // Exact up to degree 11.
        let value = rule.integrate(|x| x.powi(10) + 3.0 * x.powi(4));
        assert!(f64_approx_equal(value, 2.0 / 11.0 + 6.0 / 5.0, TOLERANCE));
    }

    #[test]
    fn legendre_nodes_are_symmetric_and_ascending() {
        let rule = GaussRule::legendre(7).unwrap();
        let nodes = rule.nodes();
        for i in 0..nodes.len() {
            assert!(f64_approx_equal(nodes[i], -nodes[nodes.len() - 1 - i], TOLERANCE));
        }
        assert!(nodes.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn laguerre_integrates_moments_exactly() {
        let rule = GaussRule::laguerre(8).unwrap();
        // ∫ e^{-x} x^k dx = k!
        let mut factorial = 1.0;
        for k in 0..=10 {
            if k > 0 {
                factorial *= k as f64;
            }
            let value = rule.integrate(|x| x.powi(k));
            assert!(f64_approx_equal(value, factorial, 1e-9), "moment {k}: {value}");
        }
    }

    #[test]
    fn mapped_legendre_integrates_on_interval() {
        let rule = GaussRule::legendre(5).unwrap().mapped(1.0, 3.0);
        let value = rule.integrate(|x| x * x);
        assert!(f64_approx_equal(value, 26.0 / 3.0, TOLERANCE));
    }

    #[test]
    fn shifted_tail_integrates_scaled_exponential() {
        let scale = 1.7;
        let start = 0.8;
        let rule = GaussRule::laguerre(12).unwrap().shifted_tail(start, scale);
        let value = rule.integrate(|r| (-scale * r).exp() * (r - start));
        let expected = (-scale * start).exp() / (scale * scale);
        assert!(f64_approx_equal(value, expected, 1e-10));
    }

    #[test]
    fn joined_rule_covers_both_intervals() {
        let head = GaussRule::legendre(10).unwrap().mapped(0.0, 2.0);
        let tail = GaussRule::laguerre(20).unwrap().shifted_tail(2.0, 1.0);
        let rule = head.joined(tail);
        assert_eq!(rule.len(), 30);
        let value = rule.integrate(|r| r * r * (-r).exp());
        assert!(f64_approx_equal(value, 2.0, 1e-9));
    }
}
