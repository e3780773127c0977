//! Reassembly of per-rank partial results into whole-system coupling vectors.

use super::comm::{PartialBlock, ResultHalf};
use super::error::EngineError;
use super::partition::SplitPartition;
use crate::core::basis::{QiClass, TermEnumerator};
use std::ops::RangeInclusive;

/// A and B couplings of one subset. Each vector holds the primary half followed by the
/// partner half, so entry `i` has its partner at `i + count()`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubsetResults {
    pub a: Vec<f64>,
    pub b: Vec<f64>,
}

impl SubsetResults {
    pub fn zeros(count: usize) -> Self {
        Self {
            a: vec![0.0; 2 * count],
            b: vec![0.0; 2 * count],
        }
    }

    /// Number of primary terms.
    pub fn count(&self) -> usize {
        self.a.len() / 2
    }

    pub fn half(&self, half: ResultHalf) -> (&[f64], &[f64]) {
        let count = self.count();
        let range = match half {
            ResultHalf::Primary => 0..count,
            ResultHalf::Partner => count..2 * count,
        };
        (&self.a[range.clone()], &self.b[range])
    }

    /// Splits into the primary and partner blocks sent to the coordinator.
    pub fn into_blocks(self, rank: usize, class: QiClass) -> [PartialBlock; 2] {
        let count = self.count();
        let (mut a, mut b) = (self.a, self.b);
        let partner_a = a.split_off(count);
        let partner_b = b.split_off(count);
        [
            PartialBlock {
                rank,
                class,
                half: ResultHalf::Primary,
                a,
                b,
            },
            PartialBlock {
                rank,
                class,
                half: ResultHalf::Partner,
                a: partner_a,
                b: partner_b,
            },
        ]
    }
}

/// Root-owned result vectors that partial blocks are written into.
pub struct Gatherer {
    partition: SplitPartition,
    qi0: SubsetResults,
    qi_gt0: SubsetResults,
}

impl Gatherer {
    pub fn new(partition: SplitPartition) -> Self {
        let qi0 = SubsetResults::zeros(partition.qi0.total());
        let qi_gt0 = SubsetResults::zeros(partition.qi_gt0.total());
        Self {
            partition,
            qi0,
            qi_gt0,
        }
    }

    /// Writes a block at its rank's offset, or at `total + offset` for a partner block.
    pub fn insert(&mut self, block: PartialBlock) -> Result<(), EngineError> {
        let (partition, target, what) = match block.class {
            QiClass::Zero => (&self.partition.qi0, &mut self.qi0, "qi = 0"),
            QiClass::Positive => (&self.partition.qi_gt0, &mut self.qi_gt0, "qi > 0"),
        };
        let bounds = partition.bounds(block.rank);
        for found in [block.a.len(), block.b.len()] {
            if found != bounds.count {
                return Err(EngineError::BlockShape {
                    rank: block.rank,
                    what,
                    expected: bounds.count,
                    found,
                });
            }
        }

        let start = match block.half {
            ResultHalf::Primary => bounds.offset,
            ResultHalf::Partner => partition.total() + bounds.offset,
        };
        target.a[start..start + bounds.count].copy_from_slice(&block.a);
        target.b[start..start + bounds.count].copy_from_slice(&block.b);
        Ok(())
    }

    /// Inserts the coordinator's own results without going through a channel.
    pub fn insert_local(
        &mut self,
        rank: usize,
        qi0: SubsetResults,
        qi_gt0: SubsetResults,
    ) -> Result<(), EngineError> {
        let [qi0_primary, qi0_partner] = qi0.into_blocks(rank, QiClass::Zero);
        let [gt0_primary, gt0_partner] = qi_gt0.into_blocks(rank, QiClass::Positive);
        for block in [qi0_primary, qi0_partner, gt0_primary, gt0_partner] {
            self.insert(block)?;
        }
        Ok(())
    }

    pub fn finish(self) -> (SubsetResults, SubsetResults) {
        (self.qi0, self.qi_gt0)
    }
}

/// Merges the qi = 0 and qi > 0 results back into canonical order over `range`.
///
/// The enumeration is walked once; each tuple consumes the next entry of the stream its
/// class selects. Both streams must be consumed exactly.
pub fn combine(
    enumerator: &dyn TermEnumerator,
    omega: i32,
    qi0: &SubsetResults,
    qi_gt0: &SubsetResults,
    range: RangeInclusive<usize>,
) -> Result<SubsetResults, EngineError> {
    let total = qi0.count() + qi_gt0.count();
    let mut merged = SubsetResults::zeros(total);
    let mut cursors = [0usize; 2];
    let mut position = 0usize;
    let mut overflow = false;

    enumerator.walk(omega, None, range, &mut |_, term| {
        let (stream, source) = match enumerator.classify(&term) {
            QiClass::Zero => (0, qi0),
            QiClass::Positive => (1, qi_gt0),
        };
        let i = cursors[stream];
        if i >= source.count() || position >= total {
            overflow = true;
            return;
        }
        let count = source.count();
        merged.a[position] = source.a[i];
        merged.b[position] = source.b[i];
        merged.a[total + position] = source.a[count + i];
        merged.b[total + position] = source.b[count + i];
        cursors[stream] += 1;
        position += 1;
    });

    if overflow || cursors != [qi0.count(), qi_gt0.count()] {
        return Err(EngineError::Internal(format!(
            "qi streams of {} and {} terms do not match the enumerated range",
            qi0.count(),
            qi_gt0.count()
        )));
    }
    Ok(merged)
}
