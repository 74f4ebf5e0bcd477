//! Rich diagnostic error types for the laf engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so users know exactly what went wrong in
//! their program or algebra and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the laf engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum LafError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Program(#[from] ProgramError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Algebra(#[from] AlgebraError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

// ---------------------------------------------------------------------------
// Program errors
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating a knowledge program, before any
/// inference runs. These are configuration errors: the engine never starts
/// when one is present.
#[derive(Debug, Error, Diagnostic)]
pub enum ProgramError {
    #[error("empty operation table: no label algebra configured")]
    #[diagnostic(
        code(laf::program::empty_operation_table),
        help(
            "Every program needs at least one label dimension with its \
             (support, aggregation, conflict) expressions. Add a `labels` \
             entry to the program."
        )
    )]
    EmptyOperationTable,

    #[error("label vector of {piece} \"{name}\" has {actual} value(s), operation table has {expected} dimension(s)")]
    #[diagnostic(
        code(laf::program::label_arity_mismatch),
        help(
            "Every fact and rule must carry exactly one label value per \
             configured label dimension. Fix the attributes of the offending \
             piece, or add/remove entries in the operation table."
        )
    )]
    LabelArityMismatch {
        /// Either "fact" or "rule".
        piece: &'static str,
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("rule \"{head}\" has an empty body")]
    #[diagnostic(
        code(laf::program::empty_rule_body),
        help(
            "A rule with no body literals would fire unconditionally with no \
             premises to compute support from. Give the rule at least one \
             body predicate."
        )
    )]
    EmptyRuleBody { head: String },

    #[error("I/O error reading program file: {source}")]
    #[diagnostic(
        code(laf::program::io),
        help("Check that the program file exists and is readable.")
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse program: {message}")]
    #[diagnostic(
        code(laf::program::parse),
        help(
            "The program file is not valid JSON/TOML for the expected shape \
             (facts, rules, labels). Check field names and value types."
        )
    )]
    Parse { message: String },

    #[error("unrecognized program format: {path}")]
    #[diagnostic(
        code(laf::program::unknown_format),
        help("Program files must use a `.json` or `.toml` extension.")
    )]
    UnknownFormat { path: String },
}

// ---------------------------------------------------------------------------
// Algebra errors
// ---------------------------------------------------------------------------

/// Errors raised while applying the label algebra during inference.
#[derive(Debug, Error, Diagnostic)]
pub enum AlgebraError {
    #[error("unsupported symbolic operator \"{operator}\" for {role} on label dimension {dimension}")]
    #[diagnostic(
        code(laf::algebra::unsupported_operator),
        help(
            "When a label dimension holds non-numeric values, only the \
             symbolic operators `Union` (support/aggregation) and \
             `Intersection` (conflict) are available. Either use one of \
             those, or make the label values numeric so the expression can \
             be evaluated."
        )
    )]
    UnsupportedOperator {
        operator: String,
        /// Zero-based label dimension index.
        dimension: usize,
        /// Which operation referenced the operator: "support", "aggregation"
        /// or "conflict".
        role: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Expression evaluation errors
// ---------------------------------------------------------------------------

/// Errors from the two-variable numeric expression evaluator.
///
/// `NotNumeric` is not fatal inside the engine: it is the designed trigger
/// for the symbolic fallback path. It only surfaces to callers who use the
/// evaluator directly.
#[derive(Debug, Error, Diagnostic)]
pub enum EvalError {
    #[error("expression is not a numeric formula: \"{expr}\" ({message})")]
    #[diagnostic(
        code(laf::eval::not_numeric),
        help(
            "The expression could not be parsed as arithmetic over X and Y. \
             Inside the engine this switches the label dimension to symbolic \
             set semantics; as a direct caller, check the expression syntax."
        )
    )]
    NotNumeric { expr: String, message: String },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

/// Errors from the fixed-point inference loop itself.
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("inference did not converge within {passes} passes")]
    #[diagnostic(
        code(laf::engine::no_convergence),
        help(
            "The fixed-point loop hit the configured pass cap. Either the \
             rule set keeps invalidating and re-deriving the same facts, or \
             the cap is too low for the program size. Raise `max_passes` or \
             review the rules."
        )
    )]
    NoConvergence { passes: usize },
}

/// Convenience alias for functions returning laf results.
pub type LafResult<T> = std::result::Result<T, LafError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_error_converts_to_laf_error() {
        let err = ProgramError::EmptyOperationTable;
        let laf: LafError = err.into();
        assert!(matches!(
            laf,
            LafError::Program(ProgramError::EmptyOperationTable)
        ));
    }

    #[test]
    fn algebra_error_converts_to_laf_error() {
        let err = AlgebraError::UnsupportedOperator {
            operator: "Join".into(),
            dimension: 2,
            role: "support",
        };
        let laf: LafError = err.into();
        assert!(matches!(laf, LafError::Algebra(_)));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = ProgramError::LabelArityMismatch {
            piece: "fact",
            name: "cheap".into(),
            expected: 2,
            actual: 1,
        };
        let msg = format!("{err}");
        assert!(msg.contains("cheap"));
        assert!(msg.contains('2'));
        assert!(msg.contains('1'));
    }
}
