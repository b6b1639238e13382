//! Result grouper — coalesces contiguous rows sharing an identity column
//! into per-entity value sets.
//!
//! Lazy, forward-only, non-restartable: one lookahead row is buffered and
//! nothing beyond the current group is held. Correctness depends entirely
//! on the precondition that rows for one identity arrive contiguously
//! (guaranteed upstream by an order-by-identity clause or the store's
//! natural grouping). A violation silently fragments one logical entity
//! into several value sets — a documented caller obligation, not detected
//! here.

use tracing::warn;

use crate::term::{BindingRow, Term};

/// Per-entity identity plus the group's rows, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSet {
    pub identity: Term,
    rows: Vec<BindingRow>,
}

impl ValueSet {
    pub fn rows(&self) -> &[BindingRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Values bound to `var` across the group, in row order, one entry per
    /// row that binds it. No deduplication.
    pub fn column(&self, var: &str) -> Vec<&Term> {
        self.rows.iter().filter_map(|r| r.get(var)).collect()
    }
}

/// Iterator adapter over an ordered row stream yielding one ValueSet per
/// maximal contiguous identity run. Never restart an exhausted instance.
pub struct GroupedRows<I> {
    rows: I,
    identity_var: String,
    lookahead: Option<BindingRow>,
    primed: bool,
}

impl<I: Iterator<Item = BindingRow>> GroupedRows<I> {
    pub fn new(rows: I, identity_var: impl Into<String>) -> Self {
        GroupedRows {
            rows,
            identity_var: identity_var.into(),
            lookahead: None,
            primed: false,
        }
    }

    // Next row that binds the identity column; rows without it are skipped.
    fn pull(&mut self) -> Option<BindingRow> {
        loop {
            let row = self.rows.next()?;
            if row.get(&self.identity_var).is_some() {
                return Some(row);
            }
            warn!(identity_var = %self.identity_var, "row without identity binding skipped");
        }
    }
}

impl<I: Iterator<Item = BindingRow>> Iterator for GroupedRows<I> {
    type Item = ValueSet;

    fn next(&mut self) -> Option<ValueSet> {
        if !self.primed {
            self.lookahead = self.pull();
            self.primed = true;
        }
        let first = self.lookahead.take()?;
        let identity = first.get(&self.identity_var)?.clone();
        let mut rows = vec![first];
        loop {
            match self.pull() {
                None => break,
                Some(row) => {
                    if row.get(&self.identity_var) == Some(&identity) {
                        rows.push(row);
                    } else {
                        self.lookahead = Some(row);
                        break;
                    }
                }
            }
        }
        Some(ValueSet { identity, rows })
    }
}
