use serde::{Deserialize, Serialize};
use std::fmt;

/// Radii separating the Gauss-Legendre head of the `r2`/`r3` rules from their Laguerre tail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CuspRadii {
    pub r2: f64,
    pub r3: f64,
}

/// Node counts of the radial rules shared by every mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RadialCounts {
    pub r1: usize,
    pub r2_legendre: usize,
    pub r2_laguerre: usize,
    pub r3_legendre: usize,
    pub r3_laguerre: usize,
}

impl RadialCounts {
    pub fn as_row(&self) -> [usize; 5] {
        [
            self.r1,
            self.r2_legendre,
            self.r2_laguerre,
            self.r3_legendre,
            self.r3_laguerre,
        ]
    }

    pub fn from_row(row: [usize; 5]) -> Self {
        Self {
            r1: row[0],
            r2_legendre: row[1],
            r2_laguerre: row[2],
            r3_legendre: row[3],
            r3_laguerre: row[4],
        }
    }
}

/// Angular counts of a mesh written in the fixed column order of the parameter file.
pub trait AngularCounts: Copy {
    fn file_order(&self) -> [usize; 3];
}

/// Interparticle counts for meshes built around the `r2`/`r3` radii and the dihedral `φ23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Phi23Counts {
    pub r12: usize,
    pub r13: usize,
    pub phi23: usize,
}

impl AngularCounts for Phi23Counts {
    fn file_order(&self) -> [usize; 3] {
        [self.r12, self.r13, self.phi23]
    }
}

impl Phi23Counts {
    pub fn from_file_order(row: [usize; 3]) -> Self {
        Self {
            r12: row[0],
            r13: row[1],
            phi23: row[2],
        }
    }
}

/// The electron used as polar axis of an `r23` mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectronAxis {
    Electron2,
    Electron3,
}

/// Counts for meshes that integrate `r23` explicitly around one electron axis.
///
/// `partner` is the positron-to-axis distance, `dihedral` the angle between the positron
/// and the remaining electron around the axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct R23Counts {
    pub axis: ElectronAxis,
    pub partner: usize,
    pub dihedral: usize,
    pub r23: usize,
}

impl AngularCounts for R23Counts {
    fn file_order(&self) -> [usize; 3] {
        match self.axis {
            ElectronAxis::Electron2 => [self.partner, self.dihedral, self.r23],
            ElectronAxis::Electron3 => [self.dihedral, self.partner, self.r23],
        }
    }
}

impl R23Counts {
    pub fn from_file_order(axis: ElectronAxis, row: [usize; 3]) -> Self {
        let (partner, dihedral) = match axis {
            ElectronAxis::Electron2 => (row[0], row[1]),
            ElectronAxis::Electron3 => (row[1], row[0]),
        };
        Self {
            axis,
            partner,
            dihedral,
            r23: row[2],
        }
    }
}

/// Node counts of one integral class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshCounts<A> {
    pub radial: RadialCounts,
    pub angular: A,
}

impl<A: AngularCounts> MeshCounts<A> {
    /// The eight counts in parameter-file column order.
    pub fn as_row(&self) -> [usize; 8] {
        let radial = self.radial.as_row();
        let angular = self.angular.file_order();
        [
            radial[0], radial[1], radial[2], radial[3], radial[4], angular[0], angular[1],
            angular[2],
        ]
    }

    pub fn total_points(&self) -> usize {
        let radial = self.radial;
        let angular: usize = self.angular.file_order().iter().product();
        radial.r1
            * (radial.r2_legendre + radial.r2_laguerre)
            * (radial.r3_legendre + radial.r3_laguerre)
            * angular
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegralClass {
    LongLong,
    LongLongR23,
    ShortLong,
    ShortLongR23,
    ShortLongFull,
}

impl IntegralClass {
    pub const ALL: [IntegralClass; 5] = [
        IntegralClass::LongLong,
        IntegralClass::LongLongR23,
        IntegralClass::ShortLong,
        IntegralClass::ShortLongR23,
        IntegralClass::ShortLongFull,
    ];

    /// Row label used when echoing quadrature counts in the run report.
    pub fn label(&self) -> &'static str {
        match self {
            IntegralClass::LongLong => "Long-long:                     ",
            IntegralClass::LongLongR23 => "Long-long 2/r23 term:          ",
            IntegralClass::ShortLong => "Short-long with qi = 0:        ",
            IntegralClass::ShortLongR23 => "Short-long 2/r23 with qi = 0:  ",
            IntegralClass::ShortLongFull => "Short-long (full) with qi > 0: ",
        }
    }
}

impl fmt::Display for IntegralClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntegralClass::LongLong => "long-long",
            IntegralClass::LongLongR23 => "long-long r23",
            IntegralClass::ShortLong => "short-long",
            IntegralClass::ShortLongR23 => "short-long r23",
            IntegralClass::ShortLongFull => "short-long full",
        };
        f.write_str(name)
    }
}

/// Node counts for all five integral classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuadratureSpec {
    pub long_long: MeshCounts<Phi23Counts>,
    pub long_long_r23: MeshCounts<R23Counts>,
    pub short_long: MeshCounts<Phi23Counts>,
    pub short_long_r23: MeshCounts<R23Counts>,
    pub short_long_full: MeshCounts<Phi23Counts>,
}

impl QuadratureSpec {
    /// Builds the spec from the five eight-column rows of the parameter file.
    pub fn from_rows(rows: [[usize; 8]; 5]) -> Self {
        let radial = |row: &[usize; 8]| RadialCounts::from_row([row[0], row[1], row[2], row[3], row[4]]);
        let angular = |row: &[usize; 8]| [row[5], row[6], row[7]];

        Self {
            long_long: MeshCounts {
                radial: radial(&rows[0]),
                angular: Phi23Counts::from_file_order(angular(&rows[0])),
            },
            long_long_r23: MeshCounts {
                radial: radial(&rows[1]),
                angular: R23Counts::from_file_order(ElectronAxis::Electron3, angular(&rows[1])),
            },
            short_long: MeshCounts {
                radial: radial(&rows[2]),
                angular: Phi23Counts::from_file_order(angular(&rows[2])),
            },
            short_long_r23: MeshCounts {
                radial: radial(&rows[3]),
                angular: R23Counts::from_file_order(ElectronAxis::Electron2, angular(&rows[3])),
            },
            short_long_full: MeshCounts {
                radial: radial(&rows[4]),
                angular: Phi23Counts::from_file_order(angular(&rows[4])),
            },
        }
    }

    /// Every class paired with its counts in file order.
    pub fn rows(&self) -> [(IntegralClass, [usize; 8]); 5] {
        [
            (IntegralClass::LongLong, self.long_long.as_row()),
            (IntegralClass::LongLongR23, self.long_long_r23.as_row()),
            (IntegralClass::ShortLong, self.short_long.as_row()),
            (IntegralClass::ShortLongR23, self.short_long_r23.as_row()),
            (IntegralClass::ShortLongFull, self.short_long_full.as_row()),
        ]
    }

    /// The same count on every axis of every class.
    pub fn uniform(count: usize) -> Self {
        Self::from_rows([[count; 8]; 5])
    }
}
