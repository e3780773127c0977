use super::term::{BasisTerm, QiClass};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{ControlFlow, RangeInclusive};

/// The two supported canonical orderings of the exponent tuples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermOrdering {
    /// Lexicographic over `(omega, k, l, m, n, p, q)`.
    Nested,
    /// Shells of equal total power, ordered by the `r23`, `r12`, `r2`, `r13`, `r3` powers.
    Shell,
}

impl TermOrdering {
    pub fn tag(self) -> i32 {
        match self {
            TermOrdering::Nested => 0,
            TermOrdering::Shell => 1,
        }
    }

    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(TermOrdering::Nested),
            1 => Some(TermOrdering::Shell),
            _ => None,
        }
    }

    pub fn enumerator(self) -> &'static dyn TermEnumerator {
        match self {
            TermOrdering::Nested => &NestedEnumerator,
            TermOrdering::Shell => &ShellEnumerator,
        }
    }

    /// Report label used in the run summary.
    pub fn label(self) -> &'static str {
        match self {
            TermOrdering::Nested => "Using Denton's ordering",
            TermOrdering::Shell => "Using Peter Van Reeth's ordering",
        }
    }
}

impl fmt::Display for TermOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermOrdering::Nested => write!(f, "nested"),
            TermOrdering::Shell => write!(f, "shell"),
        }
    }
}

/// A canonical enumeration of the exponent tuples with total power `0..=omega`.
///
/// Implementations only provide [`visit`](TermEnumerator::visit); counting, ranged
/// generation and the qi-class filters are derived from it so every consumer walks
/// exactly the same sequence.
pub trait TermEnumerator: Send + Sync {
    fn ordering(&self) -> TermOrdering;

    /// Calls `visit` for each tuple in canonical order until it breaks.
    fn visit(
        &self,
        omega: i32,
        visit: &mut dyn FnMut(BasisTerm) -> ControlFlow<()>,
    ) -> ControlFlow<()>;

    /// Splits tuples into the two integral families by their designated `r23` exponent.
    fn classify(&self, term: &BasisTerm) -> QiClass {
        term.qi_class()
    }

    /// Number of tuples with canonical index in `range` that belong to `class`
    /// (all tuples when `class` is `None`).
    fn count(&self, omega: i32, class: Option<QiClass>, range: RangeInclusive<usize>) -> usize {
        let mut total = 0;
        self.walk(omega, class, range, &mut |_, _| total += 1);
        total
    }

    /// Tuples with canonical index in `range` that belong to `class`, in canonical order.
    fn generate(
        &self,
        omega: i32,
        class: Option<QiClass>,
        range: RangeInclusive<usize>,
    ) -> Vec<BasisTerm> {
        let mut terms = Vec::new();
        self.walk(omega, class, range, &mut |_, term| terms.push(term));
        terms
    }

    /// Visits `(canonical_index, term)` pairs inside `range` that belong to `class`.
    fn walk(
        &self,
        omega: i32,
        class: Option<QiClass>,
        range: RangeInclusive<usize>,
        sink: &mut dyn FnMut(usize, BasisTerm),
    ) {
        if range.is_empty() {
            return;
        }
        let (start, end) = (*range.start(), *range.end());
        let mut index = 0usize;
        let _ = self.visit(omega, &mut |term| {
            if index > end {
                return ControlFlow::Break(());
            }
            if index >= start && class.is_none_or(|c| self.classify(&term) == c) {
                sink(index, term);
            }
            index += 1;
            ControlFlow::Continue(())
        });
    }
}

/// Seven nested ascending loops over `(omega, k, l, m, n, p)` with `q` fixed by the sum.
#[derive(Debug, Clone, Copy, Default)]
pub struct NestedEnumerator;

impl TermEnumerator for NestedEnumerator {
    fn ordering(&self) -> TermOrdering {
        TermOrdering::Nested
    }

    fn visit(
        &self,
        omega: i32,
        visit: &mut dyn FnMut(BasisTerm) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        for om in 0..=omega {
            for k in 0..=om {
                for l in 0..=(om - k) {
                    for m in 0..=(om - k - l) {
                        for n in 0..=(om - k - l - m) {
                            for p in 0..=(om - k - l - m - n) {
                                let q = om - k - l - m - n - p;
                                visit(BasisTerm::new(k, l, m, n, p, q))?;
                            }
                        }
                    }
                }
            }
        }
        ControlFlow::Continue(())
    }
}

/// Shells of fixed total power `I - 1`, each walked by the `r23`, `r12`, `r2`, `r13`
/// and `r3` powers with the `r1` power taking the remainder.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellEnumerator;

impl TermEnumerator for ShellEnumerator {
    fn ordering(&self) -> TermOrdering {
        TermOrdering::Shell
    }

    fn visit(
        &self,
        omega: i32,
        visit: &mut dyn FnMut(BasisTerm) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        for shell in 1..=(omega + 1) {
            let total = shell - 1;
            for i23 in 0..=total {
                let left12 = total - i23;
                for i12 in 0..=left12 {
                    let left2 = left12 - i12;
                    for i2 in 0..=left2 {
                        let left13 = left2 - i2;
                        for i13 in 0..=left13 {
                            let left3 = left13 - i13;
                            for i3 in 0..=left3 {
                                let i1 = left3 - i3;
                                visit(BasisTerm::new(i1, i2, i12, i3, i13, i23))?;
                            }
                        }
                    }
                }
            }
        }
        ControlFlow::Continue(())
    }
}
