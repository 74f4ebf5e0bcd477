//! Program definition and loading.
//!
//! A program is the complete input to one inference run: the base facts, the
//! rules, and the per-dimension label algebra. Programs deserialize from JSON
//! or TOML with `serde`, are validated up front (so inference never trips
//! over a malformed label vector mid-run), and build straight into an
//! exportable graph.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::algebra::eval::{ExprEval, NumericEval};
use crate::algebra::{OperationSet, OperationTable};
use crate::engine::InferenceEngine;
use crate::error::{LafResult, ProgramError};
use crate::graph::GraphExport;
use crate::knowledge::{Fact, Rule};

// ---------------------------------------------------------------------------
// Input shapes
// ---------------------------------------------------------------------------

/// A base fact as it appears in a program file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactInput {
    pub name: String,
    pub argument: String,
    pub attributes: Vec<String>,
}

/// A rule as it appears in a program file. `body` lists the predicate names
/// the rule requires, all over the rule's single shared argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleInput {
    pub head: String,
    pub body: Vec<String>,
    pub attributes: Vec<String>,
}

/// One label dimension with its three operation expressions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelInput {
    pub label_name: String,
    pub support_function: String,
    pub aggregation_function: String,
    pub conflict_function: String,
}

/// A complete inference program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub facts: Vec<FactInput>,
    #[serde(default)]
    pub rules: Vec<RuleInput>,
    pub labels: Vec<LabelInput>,
}

impl Program {
    // -------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------

    pub fn from_json_str(text: &str) -> LafResult<Self> {
        serde_json::from_str(text).map_err(|e| {
            ProgramError::Parse {
                message: e.to_string(),
            }
            .into()
        })
    }

    pub fn from_toml_str(text: &str) -> LafResult<Self> {
        toml::from_str(text).map_err(|e| {
            ProgramError::Parse {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Load a program file, dispatching on the `.json` / `.toml` extension.
    pub fn from_path(path: &Path) -> LafResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ProgramError::Io { source })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("toml") => Self::from_toml_str(&text),
            _ => Err(ProgramError::UnknownFormat {
                path: path.display().to_string(),
            }
            .into()),
        }
    }

    // -------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------

    /// Reject malformed programs before inference starts: an empty operation
    /// table, label vectors whose arity disagrees with the table, and rules
    /// with empty bodies are all fatal.
    pub fn validate(&self) -> LafResult<()> {
        if self.labels.is_empty() {
            return Err(ProgramError::EmptyOperationTable.into());
        }
        let dims = self.labels.len();
        for fact in &self.facts {
            if fact.attributes.len() != dims {
                return Err(ProgramError::LabelArityMismatch {
                    piece: "fact",
                    name: fact.name.clone(),
                    expected: dims,
                    actual: fact.attributes.len(),
                }
                .into());
            }
        }
        for rule in &self.rules {
            if rule.body.is_empty() {
                return Err(ProgramError::EmptyRuleBody {
                    head: rule.head.clone(),
                }
                .into());
            }
            if rule.attributes.len() != dims {
                return Err(ProgramError::LabelArityMismatch {
                    piece: "rule",
                    name: rule.head.clone(),
                    expected: dims,
                    actual: rule.attributes.len(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// The operation table configured by this program's label dimensions.
    pub fn operation_table(&self) -> LafResult<OperationTable> {
        OperationTable::new(
            self.labels
                .iter()
                .map(|l| {
                    OperationSet::new(
                        l.support_function.clone(),
                        l.aggregation_function.clone(),
                        l.conflict_function.clone(),
                    )
                })
                .collect(),
        )
    }

    // -------------------------------------------------------------------
    // Building
    // -------------------------------------------------------------------

    /// Validate, run the inference engine, and export the resulting graph.
    pub fn build(&self) -> LafResult<GraphExport> {
        self.build_with(&ExprEval, None)
    }

    /// As [`Program::build`], with a caller-supplied expression evaluator
    /// and an optional cap on fixed-point passes.
    pub fn build_with(
        &self,
        eval: &dyn NumericEval,
        max_passes: Option<usize>,
    ) -> LafResult<GraphExport> {
        self.validate()?;
        let table = self.operation_table()?;
        let facts = self
            .facts
            .iter()
            .map(|f| Fact::new(f.name.clone(), f.argument.clone(), f.attributes.clone()))
            .collect();
        let rules = self
            .rules
            .iter()
            .map(|r| Rule::new(r.head.clone(), r.body.clone(), r.attributes.clone()))
            .collect();
        let mut engine = InferenceEngine::new(facts, rules, table, eval)?;
        if let Some(cap) = max_passes {
            engine = engine.with_max_passes(cap);
        }
        Ok(engine.build()?.export())
    }
}
