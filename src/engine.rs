//! Inference engine: fixed-point rule firing with label propagation.
//!
//! The engine owns an arena of knowledge pieces and drives the inferential
//! cycle over a knowledge program:
//!
//! 1. Fire every rule whose body predicates are all present for an argument
//! 2. Compute the derived fact's labels via the **support** operation
//! 3. **Aggregate** when a derivation duplicates an existing logical fact,
//!    rebuilding the graph around one canonical node
//! 4. Repeat until a full pass produces no change
//! 5. Detect **conflicts** between each fact and its explicit negation and
//!    weaken both sides' labels
//!
//! Instance identity is the arena [`NodeId`]; derivation and merge decisions
//! use logical [`Statement`] equality. Termination rests on the bounded set
//! of `(rule, statement)` firings, tracked by an explicit guard set, so label
//! values can never keep the loop alive on their own. Re-firing is allowed
//! only when an aggregation detaches a rule's earlier derivation.

use std::collections::HashSet;

use crate::algebra::{self, INTERSECTION, OperationTable, UNION, clamp_label, parse_numeric};
use crate::algebra::eval::NumericEval;
use crate::error::{AlgebraError, EngineError, EvalError, LafResult, ProgramError};
use crate::graph::{ArgumentGraph, NodeId};
use crate::knowledge::{Fact, KnowledgePiece, Rule, Statement};

/// The fixed-point inference engine.
///
/// Mutates its own private fact list; callers embedding it in a concurrent
/// service must give each invocation its own engine.
pub struct InferenceEngine<'e> {
    arena: Vec<KnowledgePiece>,
    /// Working fact list: the facts currently considered live.
    live: Vec<NodeId>,
    /// Fixed rule list, never mutated after construction.
    rules: Vec<NodeId>,
    table: OperationTable,
    eval: &'e dyn NumericEval,
    /// Insertion-ordered edge map: parent piece to the facts it produced or
    /// fed into. Children are always facts.
    edges: Vec<(NodeId, Vec<NodeId>)>,
    conflicts: Vec<(NodeId, NodeId)>,
    /// Already-fired guard: one firing per (rule instance, logical statement).
    fired: HashSet<(NodeId, Statement)>,
    /// Optional cap on fixed-point passes for runaway rule sets.
    max_passes: Option<usize>,
}

impl<'e> InferenceEngine<'e> {
    /// Create an engine over a private copy of the program's facts and rules.
    ///
    /// Every label vector must carry exactly one value per operation-table
    /// dimension; a mismatch is rejected here so inference never indexes
    /// past the end of a label vector.
    pub fn new(
        facts: Vec<Fact>,
        rules: Vec<Rule>,
        table: OperationTable,
        eval: &'e dyn NumericEval,
    ) -> LafResult<Self> {
        let dims = table.dimensions();
        for fact in &facts {
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
        for rule in &rules {
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

        let mut arena = Vec::with_capacity(facts.len() + rules.len());
        let mut live = Vec::with_capacity(facts.len());
        for fact in facts {
            arena.push(KnowledgePiece::Fact(fact));
            live.push(NodeId(arena.len() - 1));
        }
        let mut rule_ids = Vec::with_capacity(rules.len());
        for rule in rules {
            arena.push(KnowledgePiece::Rule(rule));
            rule_ids.push(NodeId(arena.len() - 1));
        }
        Ok(Self {
            arena,
            live,
            rules: rule_ids,
            table,
            eval,
            edges: Vec::new(),
            conflicts: Vec::new(),
            fired: HashSet::new(),
            max_passes: None,
        })
    }

    /// Abort with [`EngineError::NoConvergence`] if the fixed point is not
    /// reached within `cap` passes.
    pub fn with_max_passes(mut self, cap: usize) -> Self {
        self.max_passes = Some(cap);
        self
    }

    /// Run the complete inference cycle and return the argumentation graph.
    pub fn build(mut self) -> LafResult<ArgumentGraph> {
        // Distinct arguments across the initial facts, insertion order.
        let mut arguments: Vec<String> = Vec::new();
        for &id in &self.live {
            let argument = &self.fact(id).argument;
            if !arguments.contains(argument) {
                arguments.push(argument.clone());
            }
        }

        let mut passes = 0usize;
        loop {
            if let Some(cap) = self.max_passes {
                if passes >= cap {
                    return Err(EngineError::NoConvergence { passes: cap }.into());
                }
            }
            passes += 1;

            let mut changed = false;
            for argument in &arguments {
                for rule_pos in 0..self.rules.len() {
                    let rule_id = self.rules[rule_pos];
                    let Some(premises) = self.match_premises(rule_id, argument) else {
                        continue;
                    };
                    let key = (
                        rule_id,
                        Statement::new(self.rule(rule_id).head.clone(), argument.clone()),
                    );
                    if self.fired.contains(&key) {
                        continue;
                    }
                    if self.exists_in_graph(&key.1) {
                        self.aggregate(&premises, rule_id, &key.1)?;
                    } else {
                        self.derive(&premises, rule_id, &key.1)?;
                    }
                    self.fired.insert(key);
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }

        tracing::info!(
            passes,
            facts = self.live.len(),
            parents = self.edges.len(),
            "inference reached fixed point"
        );

        self.resolve_conflicts()?;

        Ok(ArgumentGraph {
            arena: self.arena,
            edges: self.edges,
            conflicts: self.conflicts,
        })
    }

    // -----------------------------------------------------------------------
    // Arena helpers
    // -----------------------------------------------------------------------

    fn fact(&self, id: NodeId) -> &Fact {
        match &self.arena[id.0] {
            KnowledgePiece::Fact(f) => f,
            KnowledgePiece::Rule(_) => unreachable!("node {id} is not a fact"),
        }
    }

    fn fact_mut(&mut self, id: NodeId) -> &mut Fact {
        match &mut self.arena[id.0] {
            KnowledgePiece::Fact(f) => f,
            KnowledgePiece::Rule(_) => unreachable!("node {id} is not a fact"),
        }
    }

    fn rule(&self, id: NodeId) -> &Rule {
        match &self.arena[id.0] {
            KnowledgePiece::Rule(r) => r,
            KnowledgePiece::Fact(_) => unreachable!("node {id} is not a rule"),
        }
    }

    fn alloc_fact(&mut self, fact: Fact) -> NodeId {
        self.arena.push(KnowledgePiece::Fact(fact));
        NodeId(self.arena.len() - 1)
    }

    fn add_edge(&mut self, parent: NodeId, child: NodeId) {
        if let Some((_, children)) = self.edges.iter_mut().find(|(p, _)| *p == parent) {
            children.push(child);
        } else {
            self.edges.push((parent, vec![child]));
        }
    }

    fn children_of(&self, parent: NodeId) -> Option<&[NodeId]> {
        self.edges
            .iter()
            .find(|(p, _)| *p == parent)
            .map(|(_, children)| children.as_slice())
    }

    // -----------------------------------------------------------------------
    // Rule matching
    // -----------------------------------------------------------------------

    /// Collect the live facts satisfying every body literal of `rule_id` for
    /// `argument`. Returns `None` unless each literal has at least one match;
    /// a literal matched by several facts contributes every match.
    fn match_premises(&self, rule_id: NodeId, argument: &str) -> Option<Vec<NodeId>> {
        let rule = self.rule(rule_id);
        let mut premises = Vec::new();
        for literal in &rule.body {
            let mut found = false;
            for &fid in &self.live {
                let fact = self.fact(fid);
                if fact.name == *literal && fact.argument == argument {
                    premises.push(fid);
                    found = true;
                }
            }
            if !found {
                return None;
            }
        }
        Some(premises)
    }

    /// Whether a logically-equal fact exists anywhere in the graph, as an
    /// edge key or as any child.
    fn exists_in_graph(&self, stmt: &Statement) -> bool {
        self.edges.iter().any(|(parent, children)| {
            self.arena[parent.0]
                .as_fact()
                .is_some_and(|f| f.matches(stmt))
                || children.iter().any(|c| self.fact(*c).matches(stmt))
        })
    }

    // -----------------------------------------------------------------------
    // Derivation
    // -----------------------------------------------------------------------

    /// Register a freshly derived fact: compute support labels, grow the fact
    /// list, and wire SUPPORT edges from the rule and every premise.
    fn derive(
        &mut self,
        premises: &[NodeId],
        rule_id: NodeId,
        stmt: &Statement,
    ) -> LafResult<()> {
        let labels = self.support(premises, rule_id)?;
        let fact = Fact::new(stmt.name.clone(), stmt.argument.clone(), labels);
        tracing::debug!(fact = %fact, rule = %self.rule(rule_id), "derived fact");
        let id = self.alloc_fact(fact);
        self.live.push(id);
        self.add_edge(rule_id, id);
        for &premise in premises {
            self.add_edge(premise, id);
        }
        Ok(())
    }

    /// Support labels for a derivation: per dimension, the accumulator is
    /// seeded from the first premise, folded through the remaining premises
    /// in order and then through the rule's own value, clamped at the end.
    /// Non-numeric dimensions fall back to symbolic `Union`.
    fn support(&self, premises: &[NodeId], rule_id: NodeId) -> LafResult<Vec<String>> {
        let dims = self.table.dimensions();
        let mut labels = Vec::with_capacity(dims);
        for i in 0..dims {
            let mut values: Vec<&str> = premises
                .iter()
                .map(|&p| self.fact(p).attributes[i].as_str())
                .collect();
            values.push(self.rule(rule_id).attributes[i].as_str());
            labels.push(self.fold_dimension(self.table.support(i), &values, i, "support")?);
        }
        Ok(labels)
    }

    // -----------------------------------------------------------------------
    // Aggregation
    // -----------------------------------------------------------------------

    /// Merge a duplicate derivation into one canonical fact.
    ///
    /// The new derivation still produces its own candidate fact with full
    /// SUPPORT wiring; the candidate is then merged with the pre-existing
    /// instance(s) via the aggregation operation, and the graph is rebuilt so
    /// only the canonical node remains for this statement.
    fn aggregate(
        &mut self,
        premises: &[NodeId],
        rule_id: NodeId,
        stmt: &Statement,
    ) -> LafResult<()> {
        // Locate the instance to supersede: prefer the live fact list; when
        // the statement only survives inside the graph, gather every
        // occurrence there instead.
        let prior: Vec<NodeId> = match self
            .live
            .iter()
            .position(|&id| self.fact(id).matches(stmt))
        {
            Some(pos) => vec![self.live.remove(pos)],
            None => self.occurrences(stmt),
        };

        // The about-to-be-aggregated candidate, wired like any derivation.
        let labels = self.support(premises, rule_id)?;
        let candidate = self.alloc_fact(Fact::new(stmt.name.clone(), stmt.argument.clone(), labels));
        self.add_edge(rule_id, candidate);
        for &premise in premises {
            self.add_edge(premise, candidate);
        }

        let merged = self.aggregate_labels(candidate, &prior)?;
        let canonical = self.alloc_fact(Fact::new(stmt.name.clone(), stmt.argument.clone(), merged));
        self.live.push(canonical);
        tracing::debug!(
            fact = %self.fact(canonical),
            merged_instances = prior.len() + 1,
            "aggregated duplicate derivation"
        );

        self.rebuild(stmt, canonical);
        Ok(())
    }

    /// Every distinct occurrence of `stmt` in the graph, keys and children,
    /// in first-encounter order.
    fn occurrences(&self, stmt: &Statement) -> Vec<NodeId> {
        let mut found: Vec<NodeId> = Vec::new();
        for (parent, children) in &self.edges {
            if self.arena[parent.0]
                .as_fact()
                .is_some_and(|f| f.matches(stmt))
                && !found.contains(parent)
            {
                found.push(*parent);
            }
            for &child in children {
                if self.fact(child).matches(stmt) && !found.contains(&child) {
                    found.push(child);
                }
            }
        }
        found
    }

    /// Merged label vector: per dimension, fold the aggregation expression
    /// over the candidate's value followed by every prior instance's value.
    /// Non-numeric dimensions fall back to symbolic `Union` across all
    /// merged instances.
    fn aggregate_labels(&self, candidate: NodeId, prior: &[NodeId]) -> LafResult<Vec<String>> {
        let dims = self.table.dimensions();
        let mut labels = Vec::with_capacity(dims);
        for i in 0..dims {
            let mut values: Vec<&str> = vec![self.fact(candidate).attributes[i].as_str()];
            for &id in prior {
                values.push(self.fact(id).attributes[i].as_str());
            }
            labels.push(self.fold_dimension(
                self.table.aggregation(i),
                &values,
                i,
                "aggregation",
            )?);
        }
        Ok(labels)
    }

    /// Rebuild the graph around `canonical` after an aggregation.
    ///
    /// Every superseded instance of the statement disappears: edges into it
    /// are redirected to `canonical`, entries keyed by it are dropped, and
    /// derivations that existed solely on top of a dropped key are detached
    /// (worklist walk over the stale subgraph, removing each reached node and
    /// every parent entry pointing at it). Statements of detached facts are
    /// un-fired so the fixed point can re-derive them from the canonical
    /// ancestor.
    fn rebuild(&mut self, stmt: &Statement, canonical: NodeId) {
        let superseded: HashSet<NodeId> = self
            .occurrences(stmt)
            .into_iter()
            .filter(|&id| id != canonical)
            .collect();

        // Walk the subgraphs hanging off superseded keys.
        let mut removal: HashSet<NodeId> = HashSet::new();
        let mut stack: Vec<NodeId> = Vec::new();
        for &s in &superseded {
            if let Some(children) = self.children_of(s) {
                stack.extend_from_slice(children);
            }
        }
        while let Some(node) = stack.pop() {
            if node == canonical || superseded.contains(&node) {
                continue;
            }
            if !removal.insert(node) {
                continue;
            }
            // Entries that fed this stale node are detached as well.
            for (parent, children) in &self.edges {
                if *parent != canonical
                    && !superseded.contains(parent)
                    && children.contains(&node)
                {
                    removal.insert(*parent);
                }
            }
            if let Some(children) = self.children_of(node) {
                stack.extend_from_slice(children);
            }
        }

        // Drop entries keyed by superseded or removed nodes.
        self.edges
            .retain(|(parent, _)| !superseded.contains(parent) && !removal.contains(parent));

        // Redirect surviving edges: superseded children become the canonical
        // fact (once per parent), removed children are dropped.
        for (_, children) in &mut self.edges {
            let mut redirected = Vec::with_capacity(children.len());
            for &child in children.iter() {
                if superseded.contains(&child) {
                    if !redirected.contains(&canonical) {
                        redirected.push(canonical);
                    }
                } else if !removal.contains(&child) {
                    redirected.push(child);
                }
            }
            *children = redirected;
        }
        self.edges.retain(|(_, children)| !children.is_empty());

        // Detached facts leave the live list; their statements are un-fired.
        let detached_stmts: HashSet<Statement> = removal
            .iter()
            .filter_map(|&id| self.arena[id.0].as_fact().map(Fact::statement))
            .collect();
        self.live
            .retain(|id| !removal.contains(id) && !superseded.contains(id));
        self.fired.retain(|(_, s)| !detached_stmts.contains(s));
    }

    // -----------------------------------------------------------------------
    // Conflict resolution
    // -----------------------------------------------------------------------

    /// Detect every `p(a)` / `~p(a)` pair among live facts, weaken both
    /// sides' `delta_attributes` via the conflict operation, and record the
    /// pair (negated fact first).
    fn resolve_conflicts(&mut self) -> LafResult<()> {
        let live = self.live.clone();
        let negated: Vec<NodeId> = live
            .iter()
            .copied()
            .filter(|&id| self.fact(id).is_negated())
            .collect();

        for &nf_id in &negated {
            for &f_id in &live {
                if f_id == nf_id {
                    continue;
                }
                let opposed = {
                    let nf = self.fact(nf_id);
                    let f = self.fact(f_id);
                    nf.positive_name() == f.name && nf.argument == f.argument
                };
                if !opposed {
                    continue;
                }

                let weakened_nf = self.attack(nf_id, f_id)?;
                let weakened_f = self.attack(f_id, nf_id)?;
                self.fact_mut(nf_id).delta_attributes = weakened_nf;
                self.fact_mut(f_id).delta_attributes = weakened_f;
                self.conflicts.push((nf_id, f_id));
                tracing::debug!(
                    negated = %self.fact(nf_id),
                    fact = %self.fact(f_id),
                    "conflict detected"
                );
            }
        }
        Ok(())
    }

    /// Weakened labels of `f1` after being attacked by `f2`: per dimension,
    /// one evaluation of the conflict expression with `X` from `f1` and `Y`
    /// from `f2`, clamped. Non-numeric dimensions fall back to symbolic
    /// `Intersection` in `f1`'s token order.
    fn attack(&self, f1: NodeId, f2: NodeId) -> LafResult<Vec<String>> {
        let dims = self.table.dimensions();
        let mut labels = Vec::with_capacity(dims);
        for i in 0..dims {
            let left = self.fact(f1).attributes[i].as_str();
            let right = self.fact(f2).attributes[i].as_str();
            let expr = self.table.conflict(i);
            match self.numeric_fold(expr, &[left, right]) {
                Some(value) => labels.push(clamp_label(value)),
                None => match expr {
                    INTERSECTION => labels.push(algebra::intersection(left, right)),
                    other => {
                        return Err(AlgebraError::UnsupportedOperator {
                            operator: other.to_string(),
                            dimension: i,
                            role: "conflict",
                        }
                        .into());
                    }
                },
            }
        }
        Ok(labels)
    }

    // -----------------------------------------------------------------------
    // Label folding
    // -----------------------------------------------------------------------

    /// Numeric fold seeded from the first value: `acc = expr(acc, next)` for
    /// each remaining value. `None` when any value is non-numeric or the
    /// expression is not a numeric formula.
    fn numeric_fold(&self, expr: &str, values: &[&str]) -> Option<f64> {
        let mut acc = parse_numeric(values[0])?;
        for value in &values[1..] {
            let y = parse_numeric(value)?;
            match self.eval.evaluate(expr, acc, y) {
                Ok(result) => acc = result,
                Err(EvalError::NotNumeric { .. }) => return None,
            }
        }
        Some(acc)
    }

    /// One label dimension: numeric fold with final clamp, or symbolic
    /// `Union`; any other symbolic operator is a fatal configuration error.
    fn fold_dimension(
        &self,
        expr: &str,
        values: &[&str],
        dimension: usize,
        role: &'static str,
    ) -> LafResult<String> {
        if let Some(value) = self.numeric_fold(expr, values) {
            return Ok(clamp_label(value));
        }
        match expr {
            UNION => Ok(algebra::union(values)),
            other => Err(AlgebraError::UnsupportedOperator {
                operator: other.to_string(),
                dimension,
                role,
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::OperationSet;
    use crate::algebra::eval::ExprEval;
    use crate::error::LafError;
    use crate::graph::{EdgeKind, GraphExport};

    fn fact(name: &str, arg: &str, labels: &[&str]) -> Fact {
        Fact::new(name, arg, labels.iter().map(|s| s.to_string()).collect())
    }

    fn rule(head: &str, body: &[&str], labels: &[&str]) -> Rule {
        Rule::new(
            head,
            body.iter().map(|s| s.to_string()).collect(),
            labels.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn table(support: &str, aggregation: &str, conflict: &str) -> OperationTable {
        OperationTable::new(vec![OperationSet::new(support, aggregation, conflict)]).unwrap()
    }

    fn build(facts: Vec<Fact>, rules: Vec<Rule>, table: OperationTable) -> GraphExport {
        InferenceEngine::new(facts, rules, table, &ExprEval)
            .unwrap()
            .build()
            .unwrap()
            .export()
    }

    fn node<'a>(export: &'a GraphExport, label: &str) -> &'a crate::graph::NodeExport {
        export
            .nodes
            .iter()
            .find(|n| n.label == label)
            .unwrap_or_else(|| panic!("no node labeled {label}"))
    }

    #[test]
    fn min_support_propagates_weakest_premise() {
        let export = build(
            vec![
                fact("goodArea", "houseA", &["0.8"]),
                fact("cheap", "houseA", &["0.6"]),
            ],
            vec![rule("buy", &["goodArea", "cheap"], &["1.0"])],
            table("min(X,Y)", "max(X,Y)", "X-Y"),
        );
        let buy = node(&export, "buy(houseA)");
        assert_eq!(buy.attributes, ["0.6"]);
    }

    #[test]
    fn rule_weight_participates_last_in_support() {
        let export = build(
            vec![fact("p", "a", &["0.9"])],
            vec![rule("q", &["p"], &["0.5"])],
            table("min(X,Y)", "max(X,Y)", "X-Y"),
        );
        assert_eq!(node(&export, "q(a)").attributes, ["0.5"]);
    }

    #[test]
    fn support_result_clamped_to_unit_interval() {
        let export = build(
            vec![fact("p", "a", &["0.8"]), fact("q", "a", &["0.7"])],
            vec![rule("r", &["p", "q"], &["0.9"])],
            table("X+Y", "max(X,Y)", "X-Y"),
        );
        assert_eq!(node(&export, "r(a)").attributes, ["1.0"]);
    }

    #[test]
    fn rule_fires_once_per_statement() {
        let export = build(
            vec![fact("p", "a", &["0.5"])],
            vec![rule("q", &["p"], &["1.0"])],
            table("min(X,Y)", "max(X,Y)", "X-Y"),
        );
        // One rule node, one premise, one derived fact, two support edges.
        assert_eq!(export.nodes.len(), 3);
        assert_eq!(export.edges.len(), 2);
    }

    #[test]
    fn chained_rules_reach_fixed_point() {
        let export = build(
            vec![fact("a", "x", &["0.9"])],
            vec![
                rule("b", &["a"], &["0.8"]),
                rule("c", &["b"], &["0.7"]),
                rule("d", &["c"], &["0.6"]),
            ],
            table("min(X,Y)", "max(X,Y)", "X-Y"),
        );
        assert_eq!(node(&export, "b(x)").attributes, ["0.8"]);
        assert_eq!(node(&export, "c(x)").attributes, ["0.7"]);
        assert_eq!(node(&export, "d(x)").attributes, ["0.6"]);
    }

    #[test]
    fn arguments_are_tracked_independently() {
        let export = build(
            vec![
                fact("p", "a", &["0.4"]),
                fact("p", "b", &["0.9"]),
            ],
            vec![rule("q", &["p"], &["1.0"])],
            table("min(X,Y)", "max(X,Y)", "X-Y"),
        );
        assert_eq!(node(&export, "q(a)").attributes, ["0.4"]);
        assert_eq!(node(&export, "q(b)").attributes, ["0.9"]);
    }

    #[test]
    fn duplicate_derivations_merge_into_one_canonical_node() {
        let export = build(
            vec![
                fact("goodArea", "houseA", &["0.6"]),
                fact("cheap", "houseA", &["0.4"]),
            ],
            vec![
                rule("buy", &["goodArea"], &["1.0"]),
                rule("buy", &["cheap"], &["1.0"]),
            ],
            table("min(X,Y)", "max(X,Y)", "X-Y"),
        );
        let buys: Vec<_> = export
            .nodes
            .iter()
            .filter(|n| n.label == "buy(houseA)")
            .collect();
        assert_eq!(buys.len(), 1, "duplicates must be merged");
        assert_eq!(buys[0].attributes, ["0.6"]);
    }

    #[test]
    fn aggregation_detaches_downstream_derivations_and_rederives_them() {
        // t(a) is first derived from the weak s(a)=0.5 instance. Aggregating
        // s through the second rule supersedes that instance, so the rebuild
        // must detach t(a), un-fire its rule, and let the next pass
        // re-derive it from the canonical s(a)=0.9 node.
        let export = build(
            vec![fact("p", "a", &["0.5"]), fact("q", "a", &["0.9"])],
            vec![
                rule("s", &["p"], &["1.0"]),
                rule("t", &["s"], &["1.0"]),
                rule("s", &["q"], &["1.0"]),
            ],
            table("min(X,Y)", "max(X,Y)", "X-Y"),
        );

        let s_nodes: Vec<_> = export.nodes.iter().filter(|n| n.label == "s(a)").collect();
        let t_nodes: Vec<_> = export.nodes.iter().filter(|n| n.label == "t(a)").collect();
        assert_eq!(s_nodes.len(), 1);
        assert_eq!(t_nodes.len(), 1);
        assert_eq!(s_nodes[0].attributes, ["0.9"]);
        assert_eq!(t_nodes[0].attributes, ["0.9"]);

        // The re-derivation restores full SUPPORT wiring from the rule and
        // the canonical premise.
        let t_rule = &node(&export, "t(X) :- s(X)").id;
        assert!(export.edges.iter().any(|e| {
            e.from == *t_rule && e.to == t_nodes[0].id && e.kind == EdgeKind::Support
        }));
        assert!(export.edges.iter().any(|e| {
            e.from == s_nodes[0].id && e.to == t_nodes[0].id && e.kind == EdgeKind::Support
        }));
        // No edge still points at a detached instance.
        let ids: Vec<&str> = export.nodes.iter().map(|n| n.id.as_str()).collect();
        assert!(export
            .edges
            .iter()
            .all(|e| ids.contains(&e.from.as_str()) && ids.contains(&e.to.as_str())));
    }

    #[test]
    fn constructor_rejects_label_arity_mismatch() {
        let result = InferenceEngine::new(
            vec![fact("p", "a", &["0.5", "extra"])],
            vec![],
            table("min(X,Y)", "max(X,Y)", "X-Y"),
            &ExprEval,
        );
        assert!(matches!(
            result,
            Err(LafError::Program(ProgramError::LabelArityMismatch {
                piece: "fact",
                ..
            }))
        ));
    }

    #[test]
    fn symbolic_union_support_merges_tokens_in_first_seen_order() {
        let export = build(
            vec![
                fact("color", "car", &["red"]),
                fact("trim", "car", &["blue"]),
            ],
            vec![rule("paint", &["color", "trim"], &["metallic"])],
            table("Union", "Union", "Intersection"),
        );
        assert_eq!(node(&export, "paint(car)").attributes, ["red blue metallic"]);
    }

    #[test]
    fn unsupported_symbolic_operator_aborts_build() {
        let result = InferenceEngine::new(
            vec![fact("p", "a", &["red"])],
            vec![rule("q", &["p"], &["blue"])],
            table("Join", "Union", "Intersection"),
            &ExprEval,
        )
        .unwrap()
        .build();
        assert!(matches!(result, Err(LafError::Algebra(_))));
    }

    #[test]
    fn conflict_weakens_delta_attributes_only() {
        let export = build(
            vec![fact("p", "a", &["0.7"]), fact("~p", "a", &["0.3"])],
            vec![],
            table("min(X,Y)", "max(X,Y)", "X-Y"),
        );
        let p = node(&export, "p(a)");
        let np = node(&export, "~p(a)");
        assert_eq!(p.attributes, ["0.7"]);
        assert_eq!(np.attributes, ["0.3"]);
        let p_delta: f64 = p.delta_attributes[0].parse().unwrap();
        assert!((p_delta - 0.4).abs() < 1e-9);
        assert_eq!(np.delta_attributes, ["0.0"]); // 0.3 - 0.7 clamps to 0
    }

    #[test]
    fn symbolic_conflict_intersects_token_sets() {
        let export = build(
            vec![
                fact("p", "a", &["red blue green"]),
                fact("~p", "a", &["green red"]),
            ],
            vec![],
            table("Union", "Union", "Intersection"),
        );
        assert_eq!(node(&export, "~p(a)").delta_attributes, ["green red"]);
        assert_eq!(node(&export, "p(a)").delta_attributes, ["red green"]);
    }

    #[test]
    fn pass_cap_aborts_nonconverging_builds() {
        // A big chain cannot finish in one pass.
        let result = InferenceEngine::new(
            vec![fact("a", "x", &["0.9"])],
            vec![
                rule("b", &["a"], &["0.9"]),
                rule("c", &["b"], &["0.9"]),
            ],
            table("min(X,Y)", "max(X,Y)", "X-Y"),
            &ExprEval,
        )
        .unwrap()
        .with_max_passes(1)
        .build();
        assert!(matches!(
            result,
            Err(LafError::Engine(EngineError::NoConvergence { .. }))
        ));
    }

    #[test]
    fn multi_label_dimensions_computed_independently() {
        let table = OperationTable::new(vec![
            OperationSet::new("min(X,Y)", "max(X,Y)", "X-Y"),
            OperationSet::new("Union", "Union", "Intersection"),
        ])
        .unwrap();
        let export = build(
            vec![
                fact("p", "a", &["0.8", "red"]),
                fact("q", "a", &["0.5", "blue"]),
            ],
            vec![rule("r", &["p", "q"], &["1.0", "shiny"])],
            table,
        );
        let r = node(&export, "r(a)");
        assert_eq!(r.attributes, ["0.5", "red blue shiny"]);
    }
}
