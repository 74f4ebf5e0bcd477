//! Knowledge model: facts, rules and their label vectors.
//!
//! A [`Fact`] is an atomic statement `name(argument)` carrying one textual
//! label value per configured label dimension. A [`Rule`] is a definite
//! clause `head(X) :- body1(X), body2(X), ...` whose literals all share one
//! argument variable, with its own label vector acting as the rule weight.
//!
//! Two facts are the *same logical statement* iff their [`Statement`] keys
//! (predicate name + argument) match, regardless of label values. Instance
//! identity is a separate notion tracked by the engine's arena (see
//! [`crate::graph::NodeId`]).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Marker character denoting predicate negation: `~p` is the negation of `p`.
pub const NEGATION_MARKER: char = '~';

// ---------------------------------------------------------------------------
// Statement
// ---------------------------------------------------------------------------

/// Logical identity of a fact: predicate name plus argument, labels excluded.
///
/// Used as the lookup key for the already-fired guard and for aggregation
/// decisions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    pub name: String,
    pub argument: String,
}

impl Statement {
    pub fn new(name: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            argument: argument.into(),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.argument)
    }
}

// ---------------------------------------------------------------------------
// Fact
// ---------------------------------------------------------------------------

/// An atomic statement with a label vector.
///
/// `attributes` holds the labels as produced (by input or by support/
/// aggregation); `delta_attributes` holds the labels after conflict
/// weakening and equals `attributes` until conflict resolution touches the
/// fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub name: String,
    pub argument: String,
    pub attributes: Vec<String>,
    pub delta_attributes: Vec<String>,
}

impl Fact {
    /// Create a fact; `delta_attributes` starts equal to `attributes`.
    pub fn new(
        name: impl Into<String>,
        argument: impl Into<String>,
        attributes: Vec<String>,
    ) -> Self {
        let delta_attributes = attributes.clone();
        Self {
            name: name.into(),
            argument: argument.into(),
            attributes,
            delta_attributes,
        }
    }

    /// The logical identity key of this fact.
    pub fn statement(&self) -> Statement {
        Statement::new(self.name.clone(), self.argument.clone())
    }

    /// Whether this fact states the same logical statement, ignoring labels.
    pub fn matches(&self, stmt: &Statement) -> bool {
        self.name == stmt.name && self.argument == stmt.argument
    }

    /// Whether the predicate carries the negation marker.
    pub fn is_negated(&self) -> bool {
        self.name.contains(NEGATION_MARKER)
    }

    /// The predicate name with every negation marker stripped.
    pub fn positive_name(&self) -> String {
        self.name.replace(NEGATION_MARKER, "")
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.argument)
    }
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// A forward-chaining rule with its own label vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub head: String,
    pub body: Vec<String>,
    pub attributes: Vec<String>,
    pub delta_attributes: Vec<String>,
}

impl Rule {
    pub fn new(
        head: impl Into<String>,
        body: Vec<String>,
        attributes: Vec<String>,
    ) -> Self {
        let delta_attributes = attributes.clone();
        Self {
            head: head.into(),
            body,
            attributes,
            delta_attributes,
        }
    }
}

impl fmt::Display for Rule {
    /// Renders the clause form: `head(X) :- body1(X), body2(X)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(X) :- ", self.head)?;
        for (i, literal) in self.body.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{literal}(X)")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// KnowledgePiece
// ---------------------------------------------------------------------------

/// A node of the argumentation graph: either a fact or a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KnowledgePiece {
    Fact(Fact),
    Rule(Rule),
}

impl KnowledgePiece {
    pub fn is_fact(&self) -> bool {
        matches!(self, KnowledgePiece::Fact(_))
    }

    pub fn as_fact(&self) -> Option<&Fact> {
        match self {
            KnowledgePiece::Fact(f) => Some(f),
            KnowledgePiece::Rule(_) => None,
        }
    }

    pub fn as_rule(&self) -> Option<&Rule> {
        match self {
            KnowledgePiece::Rule(r) => Some(r),
            KnowledgePiece::Fact(_) => None,
        }
    }

    /// Original label values, shared by both variants.
    pub fn attributes(&self) -> &[String] {
        match self {
            KnowledgePiece::Fact(f) => &f.attributes,
            KnowledgePiece::Rule(r) => &r.attributes,
        }
    }

    /// Label values after conflict weakening.
    pub fn delta_attributes(&self) -> &[String] {
        match self {
            KnowledgePiece::Fact(f) => &f.delta_attributes,
            KnowledgePiece::Rule(r) => &r.delta_attributes,
        }
    }
}

impl fmt::Display for KnowledgePiece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnowledgePiece::Fact(fact) => fact.fmt(f),
            KnowledgePiece::Rule(rule) => rule.fmt(f),
        }
    }
}
