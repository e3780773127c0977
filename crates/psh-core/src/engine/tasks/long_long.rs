use super::TaskContext;
use crate::core::kohn::LongRangeScalars;
use crate::core::quadrature::{DihedralMode, Mesh, Phi23Mesh, R23Mesh};
use crate::core::wavefunction::Interaction;
use crate::engine::error::EngineError;
use crate::engine::progress::Progress;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The four long-range scalars: the base operator on the collapsed `φ23` mesh plus the
/// electron repulsion on the `r23` mesh around electron 3.
#[instrument(skip_all, name = "long_long_task")]
pub fn run(context: &TaskContext<'_>) -> Result<LongRangeScalars, EngineError> {
    let params = context.params;
    let scales = params.long_long_scales();
    info!(
        points = params.quadrature.long_long.total_points(),
        r23_points = params.quadrature.long_long_r23.total_points(),
        "Starting long-long integration."
    );

    let base_mesh = Phi23Mesh::new(
        &params.quadrature.long_long,
        params.cusps,
        scales,
        DihedralMode::Collapsed,
    )?;
    let mut scalars = integrate(context, &base_mesh, Interaction::Base, "Long-long");

    let r23_mesh = R23Mesh::new(&params.quadrature.long_long_r23, params.cusps, scales)?;
    scalars += integrate(
        context,
        &r23_mesh,
        Interaction::ElectronRepulsion,
        "Long-long 2/r23",
    );

    info!(
        sls = scalars.sls,
        slc = scalars.slc,
        cls = scalars.cls,
        clc = scalars.clc,
        wronskian = scalars.wronskian_estimate(),
        "Long-long integration finished."
    );
    Ok(scalars)
}

fn integrate(
    context: &TaskContext<'_>,
    mesh: &dyn Mesh,
    interaction: Interaction,
    phase: &'static str,
) -> LongRangeScalars {
    let reporter = context.reporter;
    reporter.phase(phase, || {
        reporter.report(Progress::TaskStart {
            total_steps: mesh.batch_count() as u64,
        });
        let batches: Vec<usize> = (0..mesh.batch_count()).collect();

        #[cfg(not(feature = "parallel"))]
        let iterator = batches.iter();
        #[cfg(feature = "parallel")]
        let iterator = batches.par_iter();

        let partials: Vec<LongRangeScalars> = iterator
            .map(|&batch| {
                let partial = integrate_batch(context, mesh, interaction, batch);
                reporter.report(Progress::TaskIncrement);
                partial
            })
            .collect();
        reporter.report(Progress::TaskFinish);

        let mut total = LongRangeScalars::default();
        for partial in partials {
            total += partial;
        }
        total
    })
}

fn integrate_batch(
    context: &TaskContext<'_>,
    mesh: &dyn Mesh,
    interaction: Interaction,
    batch: usize,
) -> LongRangeScalars {
    let mut scalars = LongRangeScalars::default();
    for chunk in 0..mesh.chunk_count() {
        for point in mesh.chunk(batch, chunk) {
            let value = context.channel.evaluate(&point.coords, interaction);
            let w = point.weight;
            scalars.sls += w * value.bra.sine * value.ket_l_sine;
            scalars.slc += w * value.bra.sine * value.ket_l_cosine;
            scalars.cls += w * value.bra.cosine * value.ket_l_sine;
            scalars.clc += w * value.bra.cosine * value.ket_l_cosine;
        }
    }
    scalars
}
