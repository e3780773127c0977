//! Deterministic contiguous slicing of the power tables across ranks.
//!
//! Rank `r` of `W` receives `floor(N(r+1)/W) - floor(Nr/W)` terms. Slices are contiguous
//! in canonical order, cover every term exactly once and differ in length by at most one.

use crate::core::basis::{BasisTerm, PowerTable, SplitTables};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Number of terms rank `rank` of `workers` receives out of `total`.
pub fn slice_count(total: usize, workers: usize, rank: usize) -> usize {
    slice_start(total, workers, rank + 1) - slice_start(total, workers, rank)
}

fn slice_start(total: usize, workers: usize, rank: usize) -> usize {
    ((total as u128 * rank as u128) / workers as u128) as usize
}

/// Position of one rank's slice inside a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SliceBounds {
    pub offset: usize,
    pub count: usize,
}

impl SliceBounds {
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    total: usize,
    bounds: Vec<SliceBounds>,
}

impl Partition {
    pub fn new(total: usize, workers: usize) -> Self {
        let bounds = (0..workers)
            .map(|rank| SliceBounds {
                offset: slice_start(total, workers, rank),
                count: slice_count(total, workers, rank),
            })
            .collect();
        Self { total, bounds }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn workers(&self) -> usize {
        self.bounds.len()
    }

    pub fn bounds(&self, rank: usize) -> SliceBounds {
        self.bounds.get(rank).copied().unwrap_or(SliceBounds {
            offset: self.total,
            count: 0,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = SliceBounds> + '_ {
        self.bounds.iter().copied()
    }
}

/// The primary terms one rank evaluates. Symmetry partners are rebuilt by the receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkSlice {
    pub rank: usize,
    pub qi0: SliceBounds,
    pub qi_gt0: SliceBounds,
    pub qi0_terms: Vec<BasisTerm>,
    pub qi_gt0_terms: Vec<BasisTerm>,
}

impl WorkSlice {
    /// Rebuilds the qi = 0 and qi > 0 tables, partners included, for partial wave `l_value`.
    pub fn tables(&self, l_value: u32) -> (PowerTable, PowerTable) {
        (
            PowerTable::from_primary(self.qi0_terms.clone(), l_value),
            PowerTable::from_primary(self.qi_gt0_terms.clone(), l_value),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.qi0.is_empty() && self.qi_gt0.is_empty()
    }
}

/// Both subset partitions for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPartition {
    pub qi0: Partition,
    pub qi_gt0: Partition,
}

impl SplitPartition {
    pub fn new(tables: &SplitTables, workers: usize) -> Self {
        Self {
            qi0: Partition::new(tables.qi0.primary_len(), workers),
            qi_gt0: Partition::new(tables.qi_gt0.primary_len(), workers),
        }
    }

    /// Cuts the primary halves of both tables into one [`WorkSlice`] per rank.
    pub fn slices(&self, tables: &SplitTables) -> Vec<WorkSlice> {
        self.qi0
            .iter()
            .zip(self.qi_gt0.iter())
            .enumerate()
            .map(|(rank, (qi0, qi_gt0))| WorkSlice {
                rank,
                qi0,
                qi_gt0,
                qi0_terms: tables.qi0.primary()[qi0.range()].to_vec(),
                qi_gt0_terms: tables.qi_gt0.primary()[qi_gt0.range()].to_vec(),
            })
            .collect()
    }
}
