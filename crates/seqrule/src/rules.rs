//! The rule table: a name-to-definition map holding every registered
//! [`RuleDef`], looked up by name each time a [`RuleExpr::Call`] is matched.

use std::collections::HashMap;

use crate::expr::RuleExpr;
use crate::form::Form;
use crate::pipeline::PipelineStep;

/// A registered rule: its formal parameters, body, bindings, and
/// result-processing pipeline.
#[derive(Clone)]
pub struct RuleDef {
    /// The rule's name, as looked up by [`RuleExpr::Call`].
    pub name: String,
    /// Formal parameters bound at call time to caller-supplied arguments.
    pub params: Vec<String>,
    /// The expression matched against the input when this rule is invoked.
    pub body: RuleExpr,
    /// Name/initial-value pairs created fresh on each entry to the rule.
    pub lexical_bindings: Vec<(String, Form)>,
    /// Names the body may read/write that must be introduced by some
    /// caller on the dynamic call stack (dynamic-scope semantics).
    pub inherited_bindings: Vec<String>,
    /// The ordered transforms applied to a successful match.
    pub pipeline: Vec<PipelineStep>,
}

impl RuleDef {
    /// A rule with no parameters, no bindings, and no pipeline — the common
    /// case for rules that exist purely to name a sub-expression.
    #[must_use]
    pub fn new(name: impl Into<String>, body: RuleExpr) -> Self {
        RuleDef {
            name: name.into(),
            params: Vec::new(),
            body,
            lexical_bindings: Vec::new(),
            inherited_bindings: Vec::new(),
            pipeline: Vec::new(),
        }
    }

    /// Attaches formal parameters.
    #[must_use]
    pub fn with_params(mut self, params: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches lexical bindings.
    #[must_use]
    pub fn with_lexical_bindings(mut self, bindings: Vec<(String, Form)>) -> Self {
        self.lexical_bindings = bindings;
        self
    }

    /// Attaches inherited-binding names.
    #[must_use]
    pub fn with_inherited_bindings(
        mut self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.inherited_bindings = names.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches a result-processing pipeline.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: Vec<PipelineStep>) -> Self {
        self.pipeline = pipeline;
        self
    }
}

/// A name-to-definition map. The active table is process-wide by default
/// but can be shadowed for a scoped region (see
/// [`crate::control::Engine::with_local_rules`]).
#[derive(Clone, Default)]
pub struct RuleTable {
    rules: HashMap<String, RuleDef>,
}

impl RuleTable {
    /// An empty rule table.
    #[must_use]
    pub fn new() -> Self {
        RuleTable::default()
    }

    /// Registers `rule`, replacing any prior definition of the same name.
    pub fn define(&mut self, rule: RuleDef) {
        self.rules.insert(rule.name.clone(), rule);
    }

    /// Looks up a rule by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RuleDef> {
        self.rules.get(name)
    }

    /// `true` if `name` has a registered definition.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Iterates over every registered rule name.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Iterates over every registered rule.
    pub fn iter(&self) -> impl Iterator<Item = &RuleDef> {
        self.rules.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_then_lookup() {
        let mut table = RuleTable::new();
        table.define(RuleDef::new("a", RuleExpr::char('a')));
        assert!(table.contains("a"));
        assert!(table.get("a").is_some());
        assert!(table.get("b").is_none());
    }

    #[test]
    fn redefining_replaces_the_prior_body() {
        let mut table = RuleTable::new();
        table.define(RuleDef::new("a", RuleExpr::char('a')));
        table.define(RuleDef::new("a", RuleExpr::char('b')));
        assert_eq!(table.get("a").unwrap().body, RuleExpr::char('b'));
    }
}
