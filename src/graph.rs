//! Argumentation graph: internal arena representation and typed export.
//!
//! The engine produces an [`ArgumentGraph`]: an arena of knowledge pieces
//! addressed by [`NodeId`], an insertion-ordered edge map from parents to the
//! facts they produced or fed into, and the list of conflicting fact pairs.
//!
//! [`ArgumentGraph::export`] converts that into a [`GraphExport`] suitable
//! for JSON serialization: nodes get stable `F#`/`R#` identifiers (all edge
//! keys numbered before any child, each group in edge-map order), and every
//! derivation edge is classified as `SUPPORT` or `AGGREGATION` from the full
//! parent set of its target.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::knowledge::KnowledgePiece;

// ---------------------------------------------------------------------------
// NodeId
// ---------------------------------------------------------------------------

/// Arena index of a knowledge piece. Two facts stating the same logical
/// statement still have distinct ids; ids are never reused within a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ArgumentGraph
// ---------------------------------------------------------------------------

/// The engine's output: arena, derivation edges and conflict pairs.
///
/// The edge map is an insertion-ordered list of `(parent, children)` entries;
/// children are always facts. Conflict pairs store the negated fact first.
#[derive(Debug, Clone)]
pub struct ArgumentGraph {
    pub(crate) arena: Vec<KnowledgePiece>,
    pub(crate) edges: Vec<(NodeId, Vec<NodeId>)>,
    pub(crate) conflicts: Vec<(NodeId, NodeId)>,
}

impl ArgumentGraph {
    /// Look up a node in the arena.
    pub fn node(&self, id: NodeId) -> &KnowledgePiece {
        &self.arena[id.0]
    }

    /// The ordered `(parent, children)` edge entries.
    pub fn edges(&self) -> &[(NodeId, Vec<NodeId>)] {
        &self.edges
    }

    /// The conflict pairs, negated fact first.
    pub fn conflicts(&self) -> &[(NodeId, NodeId)] {
        &self.conflicts
    }

    /// Convert to the exportable typed node/edge representation.
    pub fn export(&self) -> GraphExport {
        Exporter::new(self).run()
    }
}

// ---------------------------------------------------------------------------
// Export types
// ---------------------------------------------------------------------------

/// Node kind in the exported graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Fact,
    Rule,
}

/// Edge kind in the exported graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    Support,
    Aggregation,
    Conflict,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Support => write!(f, "SUPPORT"),
            EdgeKind::Aggregation => write!(f, "AGGREGATION"),
            EdgeKind::Conflict => write!(f, "CONFLICT"),
        }
    }
}

/// Exported node: identifier, rendered label and label vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeExport {
    /// `F1, F2, ...` for facts; `R1, R2, ...` for rules.
    pub id: String,
    /// `name(argument)` for facts; the clause form for rules.
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub attributes: Vec<String>,
    #[serde(rename = "deltaAttributes")]
    pub delta_attributes: Vec<String>,
}

/// Exported directed edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeExport {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

/// The exportable graph: typed nodes plus kinded edges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<EdgeExport>,
}

// ---------------------------------------------------------------------------
// Exporter
// ---------------------------------------------------------------------------

struct Exporter<'g> {
    graph: &'g ArgumentGraph,
    ids: HashMap<NodeId, String>,
    order: Vec<NodeId>,
    fact_counter: usize,
    rule_counter: usize,
}

impl<'g> Exporter<'g> {
    fn new(graph: &'g ArgumentGraph) -> Self {
        Self {
            graph,
            ids: HashMap::new(),
            order: Vec::new(),
            fact_counter: 0,
            rule_counter: 0,
        }
    }

    /// Register a node on first encounter, assigning its identifier.
    fn visit(&mut self, id: NodeId) {
        if self.ids.contains_key(&id) {
            return;
        }
        let assigned = match self.graph.node(id) {
            KnowledgePiece::Fact(_) => {
                self.fact_counter += 1;
                format!("F{}", self.fact_counter)
            }
            KnowledgePiece::Rule(_) => {
                self.rule_counter += 1;
                format!("R{}", self.rule_counter)
            }
        };
        self.ids.insert(id, assigned);
        self.order.push(id);
    }

    fn run(mut self) -> GraphExport {
        // Node set: all edge-map keys first, then all children in edge-map
        // order, then conflict pairs.
        for (parent, _) in &self.graph.edges {
            self.visit(*parent);
        }
        for (_, children) in &self.graph.edges {
            for child in children {
                self.visit(*child);
            }
        }
        for (nf, f) in &self.graph.conflicts {
            self.visit(*nf);
            self.visit(*f);
        }

        let nodes = self
            .order
            .iter()
            .map(|&id| {
                let piece = self.graph.node(id);
                NodeExport {
                    id: self.ids[&id].clone(),
                    label: piece.to_string(),
                    kind: if piece.is_fact() {
                        NodeKind::Fact
                    } else {
                        NodeKind::Rule
                    },
                    attributes: piece.attributes().to_vec(),
                    delta_attributes: piece.delta_attributes().to_vec(),
                }
            })
            .collect();

        // Full parent set per child: the edge kind depends on all parents of
        // the target, not just the parent of the edge at hand.
        let mut parents: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for (parent, children) in &self.graph.edges {
            for child in children {
                parents.entry(*child).or_default().push(*parent);
            }
        }

        let mut edges = Vec::new();
        for (parent, children) in &self.graph.edges {
            let Some(from) = self.ids.get(parent) else {
                continue; // defensive: unidentified node, skip silently
            };
            for child in children {
                let Some(to) = self.ids.get(child) else {
                    continue;
                };
                let child_parents = parents.get(child).map(Vec::as_slice).unwrap_or(&[]);
                let has_rule_parent = child_parents
                    .iter()
                    .any(|p| !self.graph.node(*p).is_fact());
                let all_fact_parents = !child_parents.is_empty()
                    && child_parents.iter().all(|p| self.graph.node(*p).is_fact());
                let kind = if has_rule_parent {
                    EdgeKind::Support
                } else if all_fact_parents {
                    EdgeKind::Aggregation
                } else {
                    EdgeKind::Support
                };
                edges.push(EdgeExport {
                    from: from.clone(),
                    to: to.clone(),
                    kind,
                });
            }
        }

        for (nf, f) in &self.graph.conflicts {
            let (Some(a), Some(b)) = (self.ids.get(nf), self.ids.get(f)) else {
                continue;
            };
            edges.push(EdgeExport {
                from: a.clone(),
                to: b.clone(),
                kind: EdgeKind::Conflict,
            });
            edges.push(EdgeExport {
                from: b.clone(),
                to: a.clone(),
                kind: EdgeKind::Conflict,
            });
        }

        GraphExport { nodes, edges }
    }
}
