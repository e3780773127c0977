use super::enumerator::TermEnumerator;
use super::term::{BasisTerm, NonlinearParams, QiClass};
use std::ops::RangeInclusive;

/// Number of exponent tuples with total power in `0..=omega`, i.e. `C(omega + 6, 6)`.
///
/// `omega = -1` describes an empty table. Sizes past `usize::MAX` saturate.
pub fn table_size(omega: i32) -> usize {
    if omega < 0 {
        return 0;
    }
    let omega = omega as u128;
    let mut size = 1u128;
    for i in 1..=6u128 {
        // Each step is exactly C(omega + i, i).
        size = match size.checked_mul(omega + i) {
            Some(product) => product / i,
            None => return usize::MAX,
        };
    }
    usize::try_from(size).unwrap_or(usize::MAX)
}

/// The inclusive range covering the first `count` canonical indices.
#[allow(clippy::reversed_empty_ranges)]
pub fn leading_range(count: usize) -> RangeInclusive<usize> {
    if count == 0 { 1..=0 } else { 0..=count - 1 }
}

/// An ordered run of basis terms followed by their symmetry partners.
///
/// Entry `i` of the primary half has its partner at `i + primary_len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerTable {
    terms: Vec<BasisTerm>,
    primary_len: usize,
    l_value: u32,
}

impl PowerTable {
    /// Builds a table from primary terms, appending the partner of each.
    pub fn from_primary(primary: Vec<BasisTerm>, l_value: u32) -> Self {
        let primary_len = primary.len();
        let mut terms = primary;
        terms.reserve(primary_len);
        for i in 0..primary_len {
            let partner = terms[i].partner(l_value);
            terms.push(partner);
        }
        Self {
            terms,
            primary_len,
            l_value,
        }
    }

    /// Enumerates `range` of the canonical order, keeping only `class` when given.
    pub fn generate(
        enumerator: &dyn TermEnumerator,
        omega: i32,
        l_value: u32,
        class: Option<QiClass>,
        range: RangeInclusive<usize>,
    ) -> Self {
        Self::from_primary(enumerator.generate(omega, class, range), l_value)
    }

    pub fn empty(l_value: u32) -> Self {
        Self::from_primary(Vec::new(), l_value)
    }

    pub fn primary(&self) -> &[BasisTerm] {
        &self.terms[..self.primary_len]
    }

    pub fn partners(&self) -> &[BasisTerm] {
        &self.terms[self.primary_len..]
    }

    /// Both halves, primary first.
    pub fn all(&self) -> &[BasisTerm] {
        &self.terms
    }

    pub fn primary_len(&self) -> usize {
        self.primary_len
    }

    pub fn l_value(&self) -> u32 {
        self.l_value
    }

    pub fn is_empty(&self) -> bool {
        self.primary_len == 0
    }
}

/// The canonical table split into its two integral families.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitTables {
    pub qi0: PowerTable,
    pub qi_gt0: PowerTable,
    pub nonlinear: NonlinearParams,
}

impl SplitTables {
    pub fn generate(
        enumerator: &dyn TermEnumerator,
        omega: i32,
        l_value: u32,
        num_terms: usize,
        nonlinear: NonlinearParams,
    ) -> Self {
        let range = leading_range(num_terms);
        Self {
            qi0: PowerTable::generate(enumerator, omega, l_value, Some(QiClass::Zero), range.clone()),
            qi_gt0: PowerTable::generate(enumerator, omega, l_value, Some(QiClass::Positive), range),
            nonlinear,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::basis::enumerator::TermOrdering;

    #[test]
    fn table_size_matches_binomial_values() {
        assert_eq!(table_size(-1), 0);
        assert_eq!(table_size(0), 1);
        assert_eq!(table_size(1), 7);
        assert_eq!(table_size(2), 28);
        assert_eq!(table_size(3), 84);
        assert_eq!(table_size(6), 924);
    }

    #[test]
    fn table_size_stays_exact_for_large_omega_and_saturates_beyond() {
        assert_eq!(table_size(100), 1_705_904_746);
        assert_eq!(table_size(1000), 1_418_299_634_202_451);
        assert_eq!(table_size(i32::MAX), usize::MAX);
    }

    #[test]
    fn leading_range_is_empty_for_zero_terms() {
        assert!(leading_range(0).is_empty());
        assert_eq!(leading_range(3), 0..=2);
    }

    #[test]
    fn partners_sit_at_mirrored_index() {
        for ordering in [TermOrdering::Nested, TermOrdering::Shell] {
            for l_value in 0..=3 {
                let table = PowerTable::generate(
                    ordering.enumerator(),
                    2,
                    l_value,
                    None,
                    leading_range(table_size(2)),
                );
                let n = table.primary_len();
                assert_eq!(table.all().len(), 2 * n);
                for (i, term) in table.primary().iter().enumerate() {
                    let partner = table.all()[i + n];
                    let l = l_value as i32;
                    assert_eq!(
                        partner,
                        BasisTerm::new(term.k - l, term.l + l, term.m, term.n, term.p, term.q)
                    );
                }
            }
        }
    }

    #[test]
    fn split_tables_partition_the_leading_terms() {
        let params = NonlinearParams::new(0.5, 0.6, 0.7);
        let split = SplitTables::generate(TermOrdering::Shell.enumerator(), 3, 1, 40, params);
        assert_eq!(split.qi0.primary_len() + split.qi_gt0.primary_len(), 40);
        assert!(split.qi0.primary().iter().all(|t| t.q == 0));
        assert!(split.qi_gt0.primary().iter().all(|t| t.q > 0));
    }

    #[test]
    fn empty_table_has_no_partners() {
        let table = PowerTable::empty(2);
        assert!(table.is_empty());
        assert!(table.partners().is_empty());
    }
}
