//! Label algebra: per-dimension operation table and symbolic set operators.
//!
//! Every label dimension is governed by a triple of expressions:
//!
//! - **support**: combines the premises and the rule into a derived fact's label
//! - **aggregation**: merges duplicate derivations of the same logical fact
//! - **conflict**: weakens the labels of a fact and its negation
//!
//! Each expression is either a two-variable (`X`, `Y`) numeric formula handed
//! to the [`eval`] module, or one of the literal symbolic operators `Union`
//! (support/aggregation) and `Intersection` (conflict) over space-separated
//! token sets.

pub mod eval;

use serde::{Deserialize, Serialize};

use crate::error::{LafResult, ProgramError};

/// Symbolic operator keyword for ordered-distinct set union.
pub const UNION: &str = "Union";
/// Symbolic operator keyword for ordered-distinct set intersection.
pub const INTERSECTION: &str = "Intersection";

// ---------------------------------------------------------------------------
// OperationSet / OperationTable
// ---------------------------------------------------------------------------

/// The (support, aggregation, conflict) expressions for one label dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSet {
    pub support: String,
    pub aggregation: String,
    pub conflict: String,
}

impl OperationSet {
    pub fn new(
        support: impl Into<String>,
        aggregation: impl Into<String>,
        conflict: impl Into<String>,
    ) -> Self {
        Self {
            support: support.into(),
            aggregation: aggregation.into(),
            conflict: conflict.into(),
        }
    }
}

/// Ordered label algebra: one [`OperationSet`] per label dimension.
///
/// The table size fixes the label-vector length every fact and rule must
/// carry. An empty table is a configuration error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationTable {
    operations: Vec<OperationSet>,
}

impl OperationTable {
    /// Build a table, rejecting an empty operation list up front.
    pub fn new(operations: Vec<OperationSet>) -> LafResult<Self> {
        if operations.is_empty() {
            return Err(ProgramError::EmptyOperationTable.into());
        }
        Ok(Self { operations })
    }

    /// Number of label dimensions.
    pub fn dimensions(&self) -> usize {
        self.operations.len()
    }

    pub fn support(&self, dimension: usize) -> &str {
        &self.operations[dimension].support
    }

    pub fn aggregation(&self, dimension: usize) -> &str {
        &self.operations[dimension].aggregation
    }

    pub fn conflict(&self, dimension: usize) -> &str {
        &self.operations[dimension].conflict
    }
}

// ---------------------------------------------------------------------------
// Numeric clamping
// ---------------------------------------------------------------------------

/// Clamp a numeric label result into `[0.0, 1.0]` and render it as a label
/// value. Out-of-range results snap to the interval bounds.
pub fn clamp_label(value: f64) -> String {
    if value > 1.0 {
        "1.0".to_string()
    } else if value < 0.0 || value.is_nan() {
        "0.0".to_string()
    } else {
        format!("{value}")
    }
}

/// Parse a label value as a number, if it is one.
pub fn parse_numeric(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

// ---------------------------------------------------------------------------
// Symbolic set operators
// ---------------------------------------------------------------------------

/// Ordered-distinct union of the token sets of all inputs, space-joined.
/// Tokens keep their first-seen order.
pub fn union(values: &[&str]) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for value in values {
        for token in value.split_whitespace() {
            if !seen.contains(&token) {
                seen.push(token);
            }
        }
    }
    seen.join(" ")
}

/// Ordered-distinct tokens common to both sides, in `left`'s token order,
/// space-joined.
pub fn intersection(left: &str, right: &str) -> String {
    let right_tokens: Vec<&str> = right.split_whitespace().collect();
    let mut seen: Vec<&str> = Vec::new();
    for token in left.split_whitespace() {
        if right_tokens.contains(&token) && !seen.contains(&token) {
            seen.push(token);
        }
    }
    seen.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_rejected() {
        let result = OperationTable::new(vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn table_exposes_expressions_per_dimension() {
        let table = OperationTable::new(vec![
            OperationSet::new("min(X,Y)", "max(X,Y)", "X-Y"),
            OperationSet::new("Union", "Union", "Intersection"),
        ])
        .unwrap();
        assert_eq!(table.dimensions(), 2);
        assert_eq!(table.support(0), "min(X,Y)");
        assert_eq!(table.aggregation(1), "Union");
        assert_eq!(table.conflict(0), "X-Y");
    }

    #[test]
    fn clamp_label_snaps_out_of_range() {
        assert_eq!(clamp_label(1.5), "1.0");
        assert_eq!(clamp_label(-0.4), "0.0");
        assert_eq!(clamp_label(0.6), "0.6");
    }

    #[test]
    fn parse_numeric_accepts_floats_and_rejects_words() {
        assert_eq!(parse_numeric("0.8"), Some(0.8));
        assert_eq!(parse_numeric(" 1 "), Some(1.0));
        assert_eq!(parse_numeric("red"), None);
        assert_eq!(parse_numeric("red blue"), None);
    }

    #[test]
    fn union_preserves_first_seen_order() {
        assert_eq!(union(&["red", "blue"]), "red blue");
        assert_eq!(union(&["red blue", "blue green"]), "red blue green");
    }

    #[test]
    fn union_is_commutative_and_associative_over_token_sets() {
        let ab = union(&["red blue", "green"]);
        let ba = union(&["green", "red blue"]);
        let mut ab_tokens: Vec<&str> = ab.split_whitespace().collect();
        let mut ba_tokens: Vec<&str> = ba.split_whitespace().collect();
        ab_tokens.sort_unstable();
        ba_tokens.sort_unstable();
        assert_eq!(ab_tokens, ba_tokens);

        let left = union(&[&union(&["a", "b"]), "c"]);
        let right = union(&["a", &union(&["b", "c"])]);
        assert_eq!(left, right);
    }

    #[test]
    fn intersection_keeps_left_order_and_is_subset_of_both() {
        let result = intersection("blue red green", "green blue");
        assert_eq!(result, "blue green");
        for token in result.split_whitespace() {
            assert!("blue red green".split_whitespace().any(|t| t == token));
            assert!("green blue".split_whitespace().any(|t| t == token));
        }
    }

    #[test]
    fn intersection_is_commutative_over_token_sets() {
        let ab = intersection("a b c", "c b");
        let ba = intersection("c b", "a b c");
        let mut ab_tokens: Vec<&str> = ab.split_whitespace().collect();
        let mut ba_tokens: Vec<&str> = ba.split_whitespace().collect();
        ab_tokens.sort_unstable();
        ba_tokens.sort_unstable();
        assert_eq!(ab_tokens, ba_tokens);
    }

    #[test]
    fn intersection_of_disjoint_sets_is_empty() {
        assert_eq!(intersection("a b", "c d"), "");
    }
}
