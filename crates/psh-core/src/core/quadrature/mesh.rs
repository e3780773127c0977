use super::QuadratureError;
use super::gauss::GaussRule;
use super::spec::{CuspRadii, ElectronAxis, MeshCounts, Phi23Counts, R23Counts, RadialCounts};
use itertools::iproduct;
use std::f64::consts::PI;

const EULER_PREFACTOR: f64 = 8.0 * PI * PI;

/// Interparticle distances of one configuration. Particle 1 is the positron, 2 and 3 the
/// electrons; the proton sits at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinates {
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub r12: f64,
    pub r13: f64,
    pub r23: f64,
}

impl Coordinates {
    /// The same configuration with electrons 2 and 3 relabelled.
    pub fn exchanged(&self) -> Self {
        Self {
            r1: self.r1,
            r2: self.r3,
            r3: self.r2,
            r12: self.r13,
            r13: self.r12,
            r23: self.r23,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshPoint {
    pub weight: f64,
    pub coords: Coordinates,
}

/// A product mesh served in batches, one per outer `r1` node, each split into chunks along
/// the next radial variable.
pub trait Mesh: Send + Sync {
    fn batch_count(&self) -> usize;

    fn chunk_count(&self) -> usize;

    fn chunk(&self, batch: usize, chunk: usize) -> Vec<MeshPoint>;

    /// Whether `r23` is a genuine coordinate of the points. Collapsed meshes leave it at zero.
    fn resolves_r23(&self) -> bool;

    fn batch(&self, index: usize) -> Vec<MeshPoint> {
        (0..self.chunk_count())
            .flat_map(|chunk| self.chunk(index, chunk))
            .collect()
    }
}

/// Whether the `φ23` rule is kept as an integration axis or summed into the weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DihedralMode {
    Collapsed,
    Resolved,
}

/// The three radial rules: `r1` on `[0, ∞)`, `r2`/`r3` split at their cusp radii.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialRules {
    pub r1: GaussRule,
    pub r2: GaussRule,
    pub r3: GaussRule,
}

impl RadialRules {
    /// `scales` are the Laguerre decay scales for `r1`, `r2` and `r3`.
    pub fn build(
        counts: &RadialCounts,
        cusps: CuspRadii,
        scales: [f64; 3],
    ) -> Result<Self, QuadratureError> {
        let r1 = GaussRule::laguerre(counts.r1)?.shifted_tail(0.0, scales[0]);
        let r2 = split_rule(counts.r2_legendre, counts.r2_laguerre, cusps.r2, scales[1])?;
        let r3 = split_rule(counts.r3_legendre, counts.r3_laguerre, cusps.r3, scales[2])?;
        Ok(Self { r1, r2, r3 })
    }

    fn rule_for(&self, axis: ElectronAxis) -> (&GaussRule, &GaussRule) {
        match axis {
            ElectronAxis::Electron2 => (&self.r2, &self.r3),
            ElectronAxis::Electron3 => (&self.r3, &self.r2),
        }
    }
}

fn split_rule(
    legendre: usize,
    laguerre: usize,
    cusp: f64,
    scale: f64,
) -> Result<GaussRule, QuadratureError> {
    let head = GaussRule::legendre(legendre)?.mapped(0.0, cusp);
    let tail = GaussRule::laguerre(laguerre)?.shifted_tail(cusp, scale);
    Ok(head.joined(tail))
}

/// Rule node `t` on `[-1, 1]` mapped onto the triangle-inequality interval `[|a-b|, a+b]`.
fn triangle_node(a: f64, b: f64, t: f64, w: f64) -> (f64, f64) {
    let lower = (a - b).abs();
    let upper = a + b;
    let half_width = 0.5 * (upper - lower);
    (0.5 * (upper + lower) + half_width * t, half_width * w)
}

/// Distance between two particles at radii `ra`, `rb` from the origin, each at a known
/// distance from a common axis particle at radius `r_axis`, separated by dihedral `phi`.
fn dihedral_distance(r_axis: f64, ra: f64, ra_axis: f64, rb: f64, rb_axis: f64, phi: f64) -> f64 {
    let cos_a = polar_cosine(ra, r_axis, ra_axis);
    let cos_b = polar_cosine(rb, r_axis, rb_axis);
    let sin_a = (1.0 - cos_a * cos_a).max(0.0).sqrt();
    let sin_b = (1.0 - cos_b * cos_b).max(0.0).sqrt();
    let cos_ab = cos_a * cos_b + sin_a * sin_b * phi.cos();
    (ra * ra + rb * rb - 2.0 * ra * rb * cos_ab).max(0.0).sqrt()
}

fn polar_cosine(r: f64, r_axis: f64, separation: f64) -> f64 {
    ((r * r + r_axis * r_axis - separation * separation) / (2.0 * r * r_axis)).clamp(-1.0, 1.0)
}

/// Mesh over `(r1, r2, r12, r3, r13, φ23)` with volume element `8π² r2 r12 r3 r13`.
#[derive(Debug, Clone)]
pub struct Phi23Mesh {
    radial: RadialRules,
    r12: GaussRule,
    r13: GaussRule,
    phi23: GaussRule,
    mode: DihedralMode,
}

impl Phi23Mesh {
    pub fn new(
        counts: &MeshCounts<Phi23Counts>,
        cusps: CuspRadii,
        scales: [f64; 3],
        mode: DihedralMode,
    ) -> Result<Self, QuadratureError> {
        Ok(Self {
            radial: RadialRules::build(&counts.radial, cusps, scales)?,
            r12: GaussRule::legendre(counts.angular.r12)?,
            r13: GaussRule::legendre(counts.angular.r13)?,
            phi23: GaussRule::legendre(counts.angular.phi23)?.mapped(0.0, 2.0 * PI),
            mode,
        })
    }
}

impl Mesh for Phi23Mesh {
    fn batch_count(&self) -> usize {
        self.radial.r1.len()
    }

    fn chunk_count(&self) -> usize {
        self.radial.r2.len()
    }

    fn chunk(&self, batch: usize, chunk: usize) -> Vec<MeshPoint> {
        let r1 = self.radial.r1.nodes()[batch];
        let w1 = self.radial.r1.weights()[batch];
        let r2 = self.radial.r2.nodes()[chunk];
        let w2 = self.radial.r2.weights()[chunk];
        let phi_sum = self.phi23.weight_sum();
        let mut points = Vec::new();

        for ((t12, u12), (r3, w3), (t13, u13)) in iproduct!(
            self.r12.points(),
            self.radial.r3.points(),
            self.r13.points()
        ) {
            let (r12, w12) = triangle_node(r1, r2, t12, u12);
            let (r13, w13) = triangle_node(r1, r3, t13, u13);
            let weight = EULER_PREFACTOR * w1 * w2 * w12 * w3 * w13 * r2 * r12 * r3 * r13;
            let coords = Coordinates { r1, r2, r3, r12, r13, r23: 0.0 };

            match self.mode {
                DihedralMode::Collapsed => points.push(MeshPoint {
                    weight: weight * phi_sum,
                    coords,
                }),
                DihedralMode::Resolved => {
                    for (phi, w_phi) in self.phi23.points() {
                        let r23 = dihedral_distance(r1, r2, r12, r3, r13, phi);
                        points.push(MeshPoint {
                            weight: weight * w_phi,
                            coords: Coordinates { r23, ..coords },
                        });
                    }
                }
            }
        }
        points
    }

    fn resolves_r23(&self) -> bool {
        self.mode == DihedralMode::Resolved
    }
}

/// Mesh with `r23` as an explicit axis, built around one electron.
///
/// Variables are `r1`, the axis radius `ra`, the other electron radius `re`, the
/// positron-axis distance `r1a`, `r23` and the dihedral between positron and the other
/// electron. Volume element `8π² r1 r1a re r23`.
#[derive(Debug, Clone)]
pub struct R23Mesh {
    radial: RadialRules,
    axis: ElectronAxis,
    partner: GaussRule,
    r23: GaussRule,
    dihedral: GaussRule,
}

impl R23Mesh {
    pub fn new(
        counts: &MeshCounts<R23Counts>,
        cusps: CuspRadii,
        scales: [f64; 3],
    ) -> Result<Self, QuadratureError> {
        Ok(Self {
            radial: RadialRules::build(&counts.radial, cusps, scales)?,
            axis: counts.angular.axis,
            partner: GaussRule::legendre(counts.angular.partner)?,
            r23: GaussRule::legendre(counts.angular.r23)?,
            dihedral: GaussRule::legendre(counts.angular.dihedral)?.mapped(0.0, 2.0 * PI),
        })
    }
}

impl Mesh for R23Mesh {
    fn batch_count(&self) -> usize {
        self.radial.r1.len()
    }

    fn chunk_count(&self) -> usize {
        self.radial.rule_for(self.axis).0.len()
    }

    fn chunk(&self, batch: usize, chunk: usize) -> Vec<MeshPoint> {
        let r1 = self.radial.r1.nodes()[batch];
        let w1 = self.radial.r1.weights()[batch];
        let (axis_rule, other_rule) = self.radial.rule_for(self.axis);
        let ra = axis_rule.nodes()[chunk];
        let wa = axis_rule.weights()[chunk];
        let mut points = Vec::new();

        for ((re, we), (t1a, u1a), (t23, u23), (phi, w_phi)) in iproduct!(
            other_rule.points(),
            self.partner.points(),
            self.r23.points(),
            self.dihedral.points()
        ) {
            let (r1a, w1a) = triangle_node(r1, ra, t1a, u1a);
            let (r23, w23) = triangle_node(re, ra, t23, u23);
            let r1e = dihedral_distance(ra, r1, r1a, re, r23, phi);
            let weight = EULER_PREFACTOR * w1 * wa * we * w1a * w23 * w_phi * r1 * r1a * re * r23;

            let coords = match self.axis {
                ElectronAxis::Electron2 => Coordinates {
                    r1,
                    r2: ra,
                    r3: re,
                    r12: r1a,
                    r13: r1e,
                    r23,
                },
                ElectronAxis::Electron3 => Coordinates {
                    r1,
                    r2: re,
                    r3: ra,
                    r12: r1e,
                    r13: r1a,
                    r23,
                },
            };
            points.push(MeshPoint { weight, coords });
        }
        points
    }

    fn resolves_r23(&self) -> bool {
        true
    }
}
