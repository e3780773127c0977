use super::{TaskContext, accumulate_couplings};
use crate::core::basis::PowerTable;
use crate::core::quadrature::{DihedralMode, Phi23Mesh};
use crate::core::wavefunction::Interaction;
use crate::engine::aggregate::SubsetResults;
use crate::engine::error::EngineError;
use tracing::{info, instrument};

/// Couplings of the qi > 0 terms. Their `r23` powers need the dihedral resolved, so the
/// whole operator is applied in one pass over the full `φ23` mesh.
#[instrument(skip_all, name = "short_long_full_task", fields(terms = table.primary_len()))]
pub fn run(
    context: &TaskContext<'_>,
    table: &PowerTable,
    results: &mut SubsetResults,
) -> Result<(), EngineError> {
    if table.is_empty() {
        info!("Empty qi > 0 slice; nothing to integrate.");
        return Ok(());
    }
    let params = context.params;
    let mesh = Phi23Mesh::new(
        &params.quadrature.short_long_full,
        params.cusps,
        params.short_long_scales(),
        DihedralMode::Resolved,
    )?;
    accumulate_couplings(
        context,
        &mesh,
        Interaction::Full,
        table,
        results,
        "Short-long full",
    )?;
    info!("Short-long qi > 0 integration finished.");
    Ok(())
}
