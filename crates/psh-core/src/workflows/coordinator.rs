//! The rank-0 role: every file handle of a run is owned here.

use crate::core::constants::PhysicalConstants;
use crate::core::io::short_range::{read_block, read_header};
use crate::core::io::{
    InputError, ParameterFile, ReportDetail, ScatteringReport, ShortRangeBlock, Timestamp,
};
use crate::core::kohn::AugmentedSystem;
use crate::engine::config::{RunParameters, RunParametersBuilder};
use crate::engine::error::EngineError;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use super::scatter::Couplings;

/// The three files of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub parameter_file: PathBuf,
    pub short_range_file: PathBuf,
    pub output_file: PathBuf,
}

pub struct Coordinator {
    paths: RunPaths,
    output: BufWriter<File>,
    params: Arc<RunParameters>,
    block: ShortRangeBlock,
    constants: PhysicalConstants,
    started: Timestamp,
    clock: Instant,
}

impl Coordinator {
    /// Opens and validates every input. Files are opened in the order parameter file,
    /// output file, short-range file, so the first failure decides the exit code.
    #[instrument(skip_all, name = "load_inputs")]
    pub fn load_inputs(kappa: f64, paths: RunPaths) -> Result<Self, EngineError> {
        let started = Timestamp::now();
        let clock = Instant::now();

        let parameter_handle =
            File::open(&paths.parameter_file).map_err(|source| InputError::ParamFileOpen {
                path: paths.parameter_file.clone(),
                source,
            })?;
        let output = File::create(&paths.output_file).map_err(|source| InputError::OutputOpen {
            path: paths.output_file.clone(),
            source,
        })?;
        let parameter_file = ParameterFile::read_from(&mut BufReader::new(parameter_handle))
            .map_err(|source| InputError::ParamFile {
                path: paths.parameter_file.clone(),
                source,
            })?;

        let short_range =
            File::open(&paths.short_range_file).map_err(|source| InputError::ShortRangeOpen {
                path: paths.short_range_file.clone(),
                source,
            })?;
        let mut reader = BufReader::new(short_range);
        let short_range_error = |source| InputError::ShortRange {
            path: paths.short_range_file.clone(),
            source,
        };
        let header = read_header(&mut reader).map_err(short_range_error)?;
        let block = read_block(&mut reader, &header).map_err(short_range_error)?;

        let params = RunParametersBuilder::new()
            .kappa(kappa)
            .header(&header)
            .parameter_file(&parameter_file)
            .build()?;
        info!(
            kappa,
            omega = params.omega,
            terms = params.num_short_terms,
            l_value = params.l_value,
            spin = params.spin.label(),
            ordering = %params.ordering,
            "Inputs loaded."
        );

        Ok(Self {
            paths,
            output: BufWriter::new(output),
            params: Arc::new(params),
            block,
            constants: PhysicalConstants::new(),
            started,
            clock,
        })
    }

    pub fn params(&self) -> Arc<RunParameters> {
        Arc::clone(&self.params)
    }

    /// Builds the augmented system from gathered couplings.
    pub fn assemble(&self, couplings: &Couplings) -> Result<AugmentedSystem, EngineError> {
        let params = &self.params;
        Ok(AugmentedSystem::assemble(
            &couplings.a_terms,
            &couplings.b_terms,
            couplings.scalars,
            &self.block,
            params.kappa,
            params.l_value,
            &self.constants,
        )?)
    }

    /// Extracts the phase shifts, writes the full report to the output file and returns it.
    #[instrument(skip_all, name = "report_results")]
    pub fn report_results(mut self, couplings: &Couplings) -> Result<ScatteringReport, EngineError> {
        let system = self.assemble(couplings)?;
        let phase_shifts = system.phase_shifts()?;
        let cross_sections = phase_shifts.cross_sections(&self.constants, self.params.l_value);
        info!(
            kohn = phase_shifts.kohn,
            inverse_kohn = phase_shifts.inverse_kohn,
            complex_kohn = phase_shifts.complex_kohn,
            "Phase shifts extracted."
        );

        let params = &self.params;
        let report = ScatteringReport {
            started: self.started,
            l_value: params.l_value,
            spin: params.spin,
            ordering: params.ordering,
            omega: params.omega,
            num_short_terms: params.num_short_terms,
            nonlinear: params.nonlinear,
            mu: params.mu,
            shielding_power: params.shielding_power,
            kappa: params.kappa,
            lambda: params.lambda,
            quadrature_rows: params.quadrature.rows(),
            cusps: params.cusps,
            a_row: system.active_a_row().to_vec(),
            b: system.active_b().to_vec(),
            scalars: couplings.scalars,
            phase_shifts,
            cross_sections,
            elapsed: self.clock.elapsed(),
        };

        let path = self.paths.output_file.clone();
        report
            .render(&mut self.output, ReportDetail::Full)
            .and_then(|()| self.output.flush())
            .map_err(|source| InputError::ReportWrite { path, source })?;
        Ok(report)
    }
}
