//! Line-oriented parameter file holding quadrature counts and channel settings.
//!
//! Label lines and data lines alternate in a fixed layout; label lines are skipped by
//! position, so the file must keep exactly the expected number of them.

use crate::core::quadrature::{CuspRadii, QuadratureSpec};
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamFileError {
    #[error("failed to read parameter file")]
    Io(#[from] io::Error),
    #[error("line {line}: file ended before the {expected}")]
    UnexpectedEof { line: usize, expected: &'static str },
    #[error("line {line}: expected {count} values for the {expected}, found {found}")]
    MissingValue {
        line: usize,
        expected: &'static str,
        count: usize,
        found: usize,
    },
    #[error("line {line}: '{token}' is not a valid value for the {expected}")]
    InvalidValue {
        line: usize,
        token: String,
        expected: &'static str,
    },
}

/// Contents of a parameter file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterFile {
    pub quadrature: QuadratureSpec,
    pub cusps: CuspRadii,
    pub mu: f64,
    pub shielding_power: i32,
    pub lambda: [f64; 3],
}

const QUADRATURE_ROWS: [(usize, &str); 5] = [
    (1, "long-long quadrature counts"),
    (1, "long-long r23 quadrature counts"),
    (2, "short-long quadrature counts"),
    (1, "short-long r23 quadrature counts"),
    (1, "short-long full quadrature counts"),
];

struct LineCursor<R> {
    reader: R,
    line: usize,
    buffer: String,
}

impl<R: BufRead> LineCursor<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buffer: String::new(),
        }
    }

    fn next_line(&mut self, expected: &'static str) -> Result<&str, ParamFileError> {
        self.buffer.clear();
        if self.reader.read_line(&mut self.buffer)? == 0 {
            return Err(ParamFileError::UnexpectedEof {
                line: self.line + 1,
                expected,
            });
        }
        self.line += 1;
        Ok(&self.buffer)
    }

    fn skip(&mut self, count: usize, expected: &'static str) -> Result<(), ParamFileError> {
        for _ in 0..count {
            self.next_line(expected)?;
        }
        Ok(())
    }

    fn values<T: FromStr>(
        &mut self,
        count: usize,
        expected: &'static str,
    ) -> Result<Vec<T>, ParamFileError> {
        let text = self.next_line(expected)?.to_owned();
        let line = self.line;
        let tokens: Vec<&str> = text.split_whitespace().take(count).collect();
        if tokens.len() < count {
            return Err(ParamFileError::MissingValue {
                line,
                expected,
                count,
                found: tokens.len(),
            });
        }
        tokens
            .into_iter()
            .map(|token| {
                token.parse().map_err(|_| ParamFileError::InvalidValue {
                    line,
                    token: token.to_owned(),
                    expected,
                })
            })
            .collect()
    }
}

impl ParameterFile {
    pub fn read_from(reader: &mut impl BufRead) -> Result<Self, ParamFileError> {
        let mut cursor = LineCursor::new(reader);
        cursor.skip(2, "file description")?;

        let mut rows = [[0usize; 8]; 5];
        for (row, (skip, expected)) in rows.iter_mut().zip(QUADRATURE_ROWS) {
            cursor.skip(skip, expected)?;
            let values = cursor.values::<usize>(8, expected)?;
            row.copy_from_slice(&values);
        }

        cursor.skip(2, "cusp radii")?;
        let cusps = cursor.values::<f64>(2, "cusp radii")?;
        cursor.skip(1, "shielding parameter mu")?;
        let mu = cursor.values::<f64>(1, "shielding parameter mu")?;
        cursor.skip(1, "shielding power")?;
        let shielding_power = cursor.values::<i32>(1, "shielding power")?;
        cursor.skip(1, "lambda values")?;
        let lambda = cursor.values::<f64>(3, "lambda values")?;

        Ok(Self {
            quadrature: QuadratureSpec::from_rows(rows),
            cusps: CuspRadii {
                r2: cusps[0],
                r3: cusps[1],
            },
            mu: mu[0],
            shielding_power: shielding_power[0],
            lambda: [lambda[0], lambda[1], lambda[2]],
        })
    }

    /// Writes the file in the layout `read_from` expects, with descriptive label lines.
    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        writeln!(writer, "Ps-H long-range parameter file")?;
        writeln!(writer, "Columns: r1 r2Leg r2Lag r3Leg r3Lag and three interparticle axes")?;

        let rows = self.quadrature.rows();
        for ((_, row), (skip, label)) in rows.iter().zip(QUADRATURE_ROWS) {
            if skip == 2 {
                writeln!(writer)?;
            }
            writeln!(writer, "{label}")?;
            let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(writer, "{}", line.join(" "))?;
        }

        writeln!(writer)?;
        writeln!(writer, "Cusp radii r2 r3")?;
        writeln!(writer, "{} {}", self.cusps.r2, self.cusps.r3)?;
        writeln!(writer, "Mu")?;
        writeln!(writer, "{}", self.mu)?;
        writeln!(writer, "Shielding power")?;
        writeln!(writer, "{}", self.shielding_power)?;
        writeln!(writer, "Lambda 1-3")?;
        writeln!(
            writer,
            "{} {} {}",
            self.lambda[0], self.lambda[1], self.lambda[2]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const KNOWN_FILE: &str = "\
Parameter file for Ps-H scattering
r1 r2Leg r2Lag r3Leg r3Lag r12 r13 phi23
Long-long
40 20 40 20 40 10 10 1   # rest of line ignored
Long-long r23: r1 r2Leg r2Lag r3Leg r3Lag phi12 r13 r23
30 15 30 15 30 12 10 10

Short-long qi = 0
35 18 35 18 35 9 9 1
Short-long r23: r1 r2Leg r2Lag r3Leg r3Lag r12 phi13 r23
25 12 25 12 25 8 12 8
Short-long full qi > 0
20 10 20 10 20 8 8 16

Cusp radii
3.5 4.25
Mu
0.85
Shielding power
3
Lambda
0.75 1.25 -1
";

    #[test]
    fn known_file_is_parsed_field_by_field() {
        let params = ParameterFile::read_from(&mut Cursor::new(KNOWN_FILE)).unwrap();
        assert_eq!(params.quadrature.long_long.as_row(), [40, 20, 40, 20, 40, 10, 10, 1]);
        assert_eq!(params.quadrature.long_long_r23.angular.dihedral, 12);
        assert_eq!(params.quadrature.long_long_r23.angular.partner, 10);
        assert_eq!(params.quadrature.short_long.radial.r1, 35);
        assert_eq!(params.quadrature.short_long_r23.angular.dihedral, 12);
        assert_eq!(params.quadrature.short_long_full.angular.phi23, 16);
        assert_eq!(params.cusps, CuspRadii { r2: 3.5, r3: 4.25 });
        assert_eq!(params.mu, 0.85);
        assert_eq!(params.shielding_power, 3);
        assert_eq!(params.lambda, [0.75, 1.25, -1.0]);
    }

    #[test]
    fn written_file_reads_back_identically() {
        let params = ParameterFile::read_from(&mut Cursor::new(KNOWN_FILE)).unwrap();
        let mut bytes = Vec::new();
        params.write_to(&mut bytes).unwrap();
        let reread = ParameterFile::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(reread, params);
    }

    #[test]
    fn malformed_value_reports_its_line() {
        let broken = KNOWN_FILE.replace("0.85", "abc");
        let err = ParameterFile::read_from(&mut Cursor::new(broken)).unwrap_err();
        match err {
            ParamFileError::InvalidValue { line, token, .. } => {
                assert_eq!(line, 18);
                assert_eq!(token, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_data_line_is_reported() {
        let broken = KNOWN_FILE.replace("3.5 4.25", "3.5");
        let err = ParameterFile::read_from(&mut Cursor::new(broken)).unwrap_err();
        assert!(matches!(
            err,
            ParamFileError::MissingValue { line: 16, count: 2, found: 1, .. }
        ));
    }

    #[test]
    fn truncated_file_is_reported() {
        let truncated: String = KNOWN_FILE.lines().take(10).map(|l| format!("{l}\n")).collect();
        let err = ParameterFile::read_from(&mut Cursor::new(truncated)).unwrap_err();
        assert!(matches!(err, ParamFileError::UnexpectedEof { line: 11, .. }));
    }
}
