//! Integral evaluator tasks.
//!
//! Each task walks one coordinate mesh batch by batch (one batch per `r1` node) and folds
//! the weighted channel values into its outputs. `long_long` produces the four root-only
//! scalars, `short_long` the qi = 0 couplings and `short_long_full` the qi > 0 couplings.
//! Every output slot is a sequential sum in mesh order, so results do not depend on how
//! many threads or ranks take part.

pub mod long_long;
pub mod short_long;
pub mod short_long_full;

use super::aggregate::SubsetResults;
use super::config::RunParameters;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use crate::core::basis::PowerTable;
use crate::core::quadrature::{Coordinates, Mesh};
use crate::core::wavefunction::{Interaction, LongRangeChannel, hylleraas_factor};
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Shared inputs of every evaluator task on one rank.
pub struct TaskContext<'a> {
    pub params: &'a RunParameters,
    pub channel: LongRangeChannel,
    pub reporter: &'a ProgressReporter<'a>,
}

impl<'a> TaskContext<'a> {
    pub fn new(params: &'a RunParameters, reporter: &'a ProgressReporter<'a>) -> Self {
        Self {
            params,
            channel: LongRangeChannel::new(params.channel_params()),
            reporter,
        }
    }
}

/// Channel ket values at one mesh point, with the term decay folded into the weight.
struct CouplingSample {
    weight: f64,
    coords: Coordinates,
    ket_l_sine: f64,
    ket_l_cosine: f64,
}

/// Adds `<φ_i|L|(1 + sf P23) C̄>` to `results.a` and `<φ_i|L|(1 + sf P23) S̄>` to
/// `results.b` for every term of `table`, partners included.
pub(crate) fn accumulate_couplings(
    context: &TaskContext<'_>,
    mesh: &dyn Mesh,
    interaction: Interaction,
    table: &PowerTable,
    results: &mut SubsetResults,
    phase: &'static str,
) -> Result<(), EngineError> {
    let terms = table.all();
    if results.a.len() != terms.len() || results.b.len() != terms.len() {
        return Err(EngineError::Internal(format!(
            "{phase}: result vectors of length {} cannot hold {} terms",
            results.a.len(),
            terms.len()
        )));
    }
    if terms.is_empty() {
        debug!(phase, "No terms in slice; skipping.");
        return Ok(());
    }
    let needs_r23 = interaction != Interaction::Base || terms.iter().any(|t| t.q != 0);
    if needs_r23 && !mesh.resolves_r23() {
        return Err(EngineError::Internal(format!(
            "{phase}: integrand depends on r23 but the mesh collapses it"
        )));
    }

    let nonlinear = context.params.nonlinear;
    let reporter = context.reporter;
    reporter.phase(phase, || {
        reporter.report(Progress::TaskStart {
            total_steps: mesh.batch_count() as u64,
        });

        for batch in 0..mesh.batch_count() {
            for chunk_index in 0..mesh.chunk_count() {
                let chunk = mesh.chunk(batch, chunk_index);

                #[cfg(not(feature = "parallel"))]
                let points = chunk.iter();
                #[cfg(feature = "parallel")]
                let points = chunk.par_iter();

                let samples: Vec<CouplingSample> = points
                    .map(|point| {
                        let c = &point.coords;
                        let channel = context.channel.evaluate(c, interaction);
                        CouplingSample {
                            weight: point.weight * nonlinear.decay(c.r1, c.r2, c.r3),
                            coords: *c,
                            ket_l_sine: channel.ket_l_sine,
                            ket_l_cosine: channel.ket_l_cosine,
                        }
                    })
                    .collect();

                #[cfg(not(feature = "parallel"))]
                let slots = results.a.iter_mut().zip(results.b.iter_mut()).zip(terms.iter());
                #[cfg(feature = "parallel")]
                let slots = results
                    .a
                    .par_iter_mut()
                    .zip(results.b.par_iter_mut())
                    .zip(terms.par_iter());

                slots.for_each(|((a, b), term)| {
                    for sample in &samples {
                        let f = sample.weight * hylleraas_factor(term, &sample.coords);
                        *a += f * sample.ket_l_cosine;
                        *b += f * sample.ket_l_sine;
                    }
                });
            }
            reporter.report(Progress::TaskIncrement);
        }

        reporter.report(Progress::TaskFinish);
    });
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::params;
    use super::*;
    use crate::core::basis::{BasisTerm, QiClass, leading_range};
    use crate::core::quadrature::{DihedralMode, Phi23Mesh, QuadratureSpec};
    use crate::engine::config::SpinState;
    use std::sync::Mutex;

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() <= TOLERANCE * a.abs().max(b.abs()).max(1.0)
    }

    fn qi0_table(params: &RunParameters) -> PowerTable {
        PowerTable::generate(
            params.enumerator(),
            params.omega,
            params.l_value,
            Some(QiClass::Zero),
            leading_range(params.num_short_terms),
        )
    }

    fn mesh(params: &RunParameters) -> Phi23Mesh {
        Phi23Mesh::new(
            &params.quadrature.short_long,
            params.cusps,
            params.short_long_scales(),
            DihedralMode::Collapsed,
        )
        .unwrap()
    }

    #[test]
    fn couplings_match_a_direct_mesh_sum() {
        let params = params(1, SpinState::Singlet, QuadratureSpec::uniform(2));
        let reporter = ProgressReporter::new();
        let context = TaskContext::new(&params, &reporter);
        let table = qi0_table(&params);
        let mesh = mesh(&params);
        let mut results = SubsetResults::zeros(table.primary_len());
        accumulate_couplings(&context, &mesh, Interaction::Base, &table, &mut results, "test")
            .unwrap();

        let term_index = table.primary_len() + 3;
        let term: BasisTerm = table.all()[term_index];
        let (mut a, mut b) = (0.0, 0.0);
        for batch in 0..mesh.batch_count() {
            for point in mesh.batch(batch) {
                let c = point.coords;
                let value = context.channel.evaluate(&c, Interaction::Base);
                let f = point.weight
                    * params.nonlinear.decay(c.r1, c.r2, c.r3)
                    * hylleraas_factor(&term, &c);
                a += f * value.ket_l_cosine;
                b += f * value.ket_l_sine;
            }
        }
        assert!(f64_approx_equal(results.a[term_index], a));
        assert!(f64_approx_equal(results.b[term_index], b));
    }

    #[test]
    fn repeated_accumulation_adds_onto_existing_entries() {
        let params = params(0, SpinState::Triplet, QuadratureSpec::uniform(2));
        let reporter = ProgressReporter::new();
        let context = TaskContext::new(&params, &reporter);
        let table = qi0_table(&params);
        let mesh = mesh(&params);

        let mut once = SubsetResults::zeros(table.primary_len());
        accumulate_couplings(&context, &mesh, Interaction::Base, &table, &mut once, "once")
            .unwrap();
        let mut twice = once.clone();
        accumulate_couplings(&context, &mesh, Interaction::Base, &table, &mut twice, "twice")
            .unwrap();

        for (x, y) in once.a.iter().zip(&twice.a).chain(once.b.iter().zip(&twice.b)) {
            assert!(f64_approx_equal(2.0 * x, *y), "{x} doubled is not {y}");
        }
    }

    #[test]
    fn one_increment_is_reported_per_r1_node() {
        let params = params(0, SpinState::Singlet, QuadratureSpec::uniform(3));
        let increments = Mutex::new(0u64);
        let announced = Mutex::new(0u64);
        let reporter = ProgressReporter::with_callback(Box::new(|event| match event {
            Progress::TaskIncrement => *increments.lock().unwrap() += 1,
            Progress::TaskStart { total_steps } => *announced.lock().unwrap() = total_steps,
            _ => {}
        }));
        let context = TaskContext::new(&params, &reporter);
        let table = qi0_table(&params);
        let mut results = SubsetResults::zeros(table.primary_len());
        accumulate_couplings(
            &context,
            &mesh(&params),
            Interaction::Base,
            &table,
            &mut results,
            "progress",
        )
        .unwrap();
        drop(context);
        drop(reporter);
        assert_eq!(increments.into_inner().unwrap(), 3);
        assert_eq!(announced.into_inner().unwrap(), 3);
    }

    #[test]
    fn empty_tables_are_skipped_and_inconsistent_inputs_rejected() {
        let params = params(0, SpinState::Singlet, QuadratureSpec::uniform(1));
        let reporter = ProgressReporter::new();
        let context = TaskContext::new(&params, &reporter);
        let mesh = mesh(&params);

        let mut empty = SubsetResults::zeros(0);
        accumulate_couplings(
            &context,
            &mesh,
            Interaction::Base,
            &PowerTable::empty(0),
            &mut empty,
            "empty",
        )
        .unwrap();
        assert!(empty.a.is_empty());

        let table = qi0_table(&params);
        let mut results = SubsetResults::zeros(table.primary_len());
        let err = accumulate_couplings(
            &context,
            &mesh,
            Interaction::ElectronRepulsion,
            &table,
            &mut results,
            "collapsed",
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Internal(_)));

        let mut wrong = SubsetResults::zeros(1);
        let err = accumulate_couplings(&context, &mesh, Interaction::Base, &table, &mut wrong, "x")
            .unwrap_err();
        assert!(matches!(err, EngineError::Internal(_)));
    }
}
