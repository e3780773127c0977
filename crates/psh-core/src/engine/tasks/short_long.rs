use super::{TaskContext, accumulate_couplings};
use crate::core::basis::PowerTable;
use crate::core::quadrature::{DihedralMode, Phi23Mesh, R23Mesh};
use crate::core::wavefunction::Interaction;
use crate::engine::aggregate::SubsetResults;
use crate::engine::error::EngineError;
use tracing::{info, instrument};

/// Couplings of the qi = 0 terms: the base operator on the collapsed `φ23` mesh, then the
/// electron repulsion on the `r23` mesh around electron 2, added into the same slots.
#[instrument(skip_all, name = "short_long_task", fields(terms = table.primary_len()))]
pub fn run(
    context: &TaskContext<'_>,
    table: &PowerTable,
    results: &mut SubsetResults,
) -> Result<(), EngineError> {
    if table.is_empty() {
        info!("Empty qi = 0 slice; nothing to integrate.");
        return Ok(());
    }
    run_base(context, table, results)?;
    run_r23(context, table, results)?;
    info!("Short-long qi = 0 integration finished.");
    Ok(())
}

pub fn run_base(
    context: &TaskContext<'_>,
    table: &PowerTable,
    results: &mut SubsetResults,
) -> Result<(), EngineError> {
    let params = context.params;
    let mesh = Phi23Mesh::new(
        &params.quadrature.short_long,
        params.cusps,
        params.short_long_scales(),
        DihedralMode::Collapsed,
    )?;
    accumulate_couplings(context, &mesh, Interaction::Base, table, results, "Short-long")
}

pub fn run_r23(
    context: &TaskContext<'_>,
    table: &PowerTable,
    results: &mut SubsetResults,
) -> Result<(), EngineError> {
    let params = context.params;
    let mesh = R23Mesh::new(
        &params.quadrature.short_long_r23,
        params.cusps,
        params.short_long_scales(),
    )?;
    accumulate_couplings(
        context,
        &mesh,
        Interaction::ElectronRepulsion,
        table,
        results,
        "Short-long 2/r23",
    )
}
