//! Human-readable run report written to the output file and echoed to the console.

use crate::core::basis::{NonlinearParams, TermOrdering};
use crate::core::kohn::{CrossSections, LongRangeScalars, PhaseShifts};
use crate::core::quadrature::{CuspRadii, IntegralClass};
use crate::core::wavefunction::SpinState;
use std::io::{self, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const WAVE_LETTERS: [char; 9] = ['S', 'P', 'D', 'F', 'G', 'H', 'I', 'K', 'L'];
const WEEKDAYS: [&str; 7] = [
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
];
const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Calendar time in UTC, precise to the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub year: i64,
    pub month: u32,
    pub day: u32,
    weekday: usize,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl Timestamp {
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self::from_unix_seconds(since_epoch.as_secs() as i64)
    }

    pub fn from_unix_seconds(seconds: i64) -> Self {
        let days = seconds.div_euclid(86_400);
        let of_day = seconds.rem_euclid(86_400);

        // Civil date from day count, with eras of 400 years starting on March 1st.
        let z = days + 719_468;
        let era = z.div_euclid(146_097);
        let doe = z.rem_euclid(146_097);
        let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
        let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
        let year = yoe + era * 400 + i64::from(month <= 2);

        Self {
            year,
            month,
            day,
            weekday: days.rem_euclid(7) as usize,
            hour: (of_day / 3_600) as u32,
            minute: (of_day % 3_600 / 60) as u32,
            second: (of_day % 60) as u32,
        }
    }

    pub fn weekday_name(&self) -> &'static str {
        WEEKDAYS[self.weekday]
    }

    pub fn month_name(&self) -> &'static str {
        MONTHS[(self.month - 1) as usize]
    }

    pub fn clock(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// `S-Wave Singlet Ps-H`, with the formalism noted for P and D waves.
pub fn wave_header(l_value: u32, spin: SpinState) -> String {
    let letter = WAVE_LETTERS
        .get(l_value as usize)
        .copied()
        .unwrap_or('?');
    let formalism = if matches!(l_value, 1 | 2) {
        ": 1st formalism"
    } else {
        ""
    };
    format!("{letter}-Wave {} Ps-H{formalism}", spin.label())
}

/// Everything a finished run reports.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatteringReport {
    pub started: Timestamp,
    pub l_value: u32,
    pub spin: SpinState,
    pub ordering: TermOrdering,
    pub omega: i32,
    pub num_short_terms: usize,
    pub nonlinear: NonlinearParams,
    pub mu: f64,
    pub shielding_power: i32,
    pub kappa: f64,
    pub lambda: [f64; 3],
    pub quadrature_rows: [(IntegralClass, [usize; 8]); 5],
    pub cusps: CuspRadii,
    pub a_row: Vec<f64>,
    pub b: Vec<f64>,
    pub scalars: LongRangeScalars,
    pub phase_shifts: PhaseShifts,
    pub cross_sections: CrossSections,
    pub elapsed: Duration,
}

/// How much of the report to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportDetail {
    /// Everything but the coupling listings.
    Summary,
    Full,
}

impl ScatteringReport {
    pub fn render(&self, out: &mut impl Write, detail: ReportDetail) -> io::Result<()> {
        let started = &self.started;
        writeln!(
            out,
            "Program started on {}, {} {:02} {} at {} UTC",
            started.weekday_name(),
            started.month_name(),
            started.day,
            started.year,
            started.clock()
        )?;
        writeln!(out)?;
        writeln!(out, "{}", wave_header(self.l_value, self.spin))?;
        writeln!(out, "{}", self.ordering.label())?;

        writeln!(out, "Omega: {}", self.omega)?;
        writeln!(out, "Number of terms: {}", self.num_short_terms)?;
        let NonlinearParams { alpha, beta, gamma } = self.nonlinear;
        writeln!(out, "Alpha: {alpha}  Beta: {beta}  Gamma: {gamma}")?;
        writeln!(out, "Mu: {}", self.mu)?;
        writeln!(out, "Shielding power: {}", self.shielding_power)?;
        writeln!(out, "Kappa: {}", self.kappa)?;
        let [l1, l2, l3] = self.lambda;
        writeln!(out, "Lambda: {l1} {l2} {l3}")?;

        writeln!(out)?;
        writeln!(out, "Number of quadrature points")?;
        for (class, row) in &self.quadrature_rows {
            let counts: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            writeln!(out, "{}{}", class.label(), counts.join(" "))?;
        }
        writeln!(out)?;
        writeln!(out, "Cusp parameters")?;
        writeln!(out, "{} {}", self.cusps.r2, self.cusps.r3)?;
        writeln!(out)?;

        if detail == ReportDetail::Full {
            writeln!(out, "A matrix row")?;
            for (i, value) in self.a_row.iter().enumerate() {
                writeln!(out, "{i} {value}")?;
            }
            writeln!(out)?;
            writeln!(out, "B vector")?;
            for (i, value) in self.b.iter().enumerate() {
                writeln!(out, "{i} {value}")?;
            }
        }

        writeln!(out)?;
        writeln!(out, "SLS Term")?;
        writeln!(out, "{}", self.scalars.sls)?;
        writeln!(out)?;
        writeln!(out, "SLC Term")?;
        writeln!(out, "{}", self.scalars.slc)?;
        writeln!(out)?;
        writeln!(out, "CLS Term")?;
        writeln!(out, "{}", self.scalars.cls)?;
        writeln!(out)?;
        writeln!(out, "CLC Term")?;
        writeln!(out, "{}", self.scalars.clc)?;
        writeln!(out)?;
        writeln!(out, "SLC - CLS: {}", self.scalars.wronskian_estimate())?;
        writeln!(out)?;

        let shifts = &self.phase_shifts;
        writeln!(out, "Kohn phase shift: {}", shifts.kohn)?;
        writeln!(out, "Inverse Kohn phase shift: {}", shifts.inverse_kohn)?;
        writeln!(out, "Complex (T-matrix) Kohn phase shift: {}", shifts.complex_kohn)?;
        writeln!(out)?;

        let sections = &self.cross_sections;
        writeln!(out, "Kohn partial wave cross section: {}", sections.kohn)?;
        writeln!(out, "Inverse Kohn partial wave cross section: {}", sections.inverse_kohn)?;
        writeln!(
            out,
            "Complex (T-matrix) Kohn partial wave cross section: {}",
            sections.complex_kohn
        )?;
        writeln!(out)?;
        writeln!(out, "Time elapsed: {}", self.elapsed.as_secs_f64())
    }
}
