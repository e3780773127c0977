use crate::engine::aggregate::SubsetResults;
use crate::engine::config::RunParameters;
use crate::engine::error::EngineError;
use crate::engine::partition::WorkSlice;
use crate::engine::progress::ProgressReporter;
use crate::engine::tasks::{TaskContext, short_long, short_long_full};
use tracing::{info, instrument};

/// The evaluation role every rank plays on its own slice.
pub struct Worker<'a> {
    rank: usize,
    context: TaskContext<'a>,
}

impl<'a> Worker<'a> {
    pub fn new(rank: usize, params: &'a RunParameters, reporter: &'a ProgressReporter<'a>) -> Self {
        Self {
            rank,
            context: TaskContext::new(params, reporter),
        }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn context(&self) -> &TaskContext<'a> {
        &self.context
    }

    /// Integrates the qi = 0 and qi > 0 couplings of `slice`, partners included.
    #[instrument(skip_all, name = "evaluate_slice", fields(rank = self.rank))]
    pub fn evaluate_slice(
        &self,
        slice: &WorkSlice,
    ) -> Result<(SubsetResults, SubsetResults), EngineError> {
        let (qi0_table, qi_gt0_table) = slice.tables(self.context.params.l_value);
        info!(
            qi0_offset = slice.qi0.offset,
            qi0_terms = slice.qi0.count,
            qi_gt0_offset = slice.qi_gt0.offset,
            qi_gt0_terms = slice.qi_gt0.count,
            "Evaluating slice."
        );

        let mut qi0 = SubsetResults::zeros(qi0_table.primary_len());
        short_long::run(&self.context, &qi0_table, &mut qi0)?;

        let mut qi_gt0 = SubsetResults::zeros(qi_gt0_table.primary_len());
        short_long_full::run(&self.context, &qi_gt0_table, &mut qi_gt0)?;

        Ok((qi0, qi_gt0))
    }
}
