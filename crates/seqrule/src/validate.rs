//! Static validation of a rule table.
//!
//! These checks are advisory: they exist to catch authoring mistakes before
//! a parse ever runs, not to enforce anything the engine itself depends on.
//! A rule-expression referencing an undefined rule is only a fatal
//! [`crate::error::EngineError`] at the moment the reference is actually
//! reached during a parse; [`check`] lets a host catch it ahead of time by
//! walking every rule body up front.

use std::collections::HashSet;

use crate::expr::RuleExpr;
use crate::rules::RuleTable;

/// One issue found while validating a [`RuleTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A rule body (or one of its argument expressions) references a rule
    /// name absent from the table.
    UndefinedRule {
        /// The rule containing the reference.
        referencing_rule: String,
        /// The undefined name referenced.
        undefined: String,
    },
    /// A defined rule is never reached from `entry`.
    UnreachableRule {
        /// The name of the unreachable rule.
        name: String,
    },
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationIssue::UndefinedRule {
                referencing_rule,
                undefined,
            } => write!(
                f,
                "undefined rule '{undefined}' referenced in rule '{referencing_rule}'"
            ),
            ValidationIssue::UnreachableRule { name } => {
                write!(f, "rule '{name}' is unreachable from the entry rule")
            }
        }
    }
}

/// Walks every rule in `table`, reporting references to undefined rules and
/// rules unreachable from `entry`. Returns the issues in the order they were
/// found; an empty vector means the table is clean.
#[must_use]
pub fn check(table: &RuleTable, entry: &str) -> Vec<ValidationIssue> {
    let mut issues = check_undefined_rules(table);
    issues.extend(check_unreachable_rules(table, entry));
    for issue in &issues {
        log::warn!("{issue}");
    }
    issues
}

fn check_undefined_rules(table: &RuleTable) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for rule in table.iter() {
        collect_undefined_refs(&rule.body, table, &rule.name, &mut issues);
    }
    issues
}

fn collect_undefined_refs(
    expr: &RuleExpr,
    table: &RuleTable,
    context: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    if let RuleExpr::Call(name, _args) = expr {
        if !table.contains(name) {
            issues.push(ValidationIssue::UndefinedRule {
                referencing_rule: context.to_string(),
                undefined: name.clone(),
            });
        }
    }
    for child in children(expr) {
        collect_undefined_refs(child, table, context, issues);
    }
}

/// The immediate sub-expressions of `expr`, for generic recursive walks.
fn children(expr: &RuleExpr) -> Vec<&RuleExpr> {
    match expr {
        RuleExpr::Literal(_)
        | RuleExpr::Wildcard(_)
        | RuleExpr::Param(_)
        | RuleExpr::Binding(_)
        | RuleExpr::Call(..) => Vec::new(),
        RuleExpr::Or(exprs) | RuleExpr::And(exprs) | RuleExpr::AndUnordered(exprs) => {
            exprs.iter().collect()
        }
        RuleExpr::Not(e)
        | RuleExpr::ZeroOrMore(e)
        | RuleExpr::OneOrMore(e)
        | RuleExpr::Rep(_, e)
        | RuleExpr::Optional(e)
        | RuleExpr::Lookahead(e)
        | RuleExpr::LookbehindNot(e)
        | RuleExpr::DescendList(e)
        | RuleExpr::DescendString(e)
        | RuleExpr::DescendVector(e) => vec![e],
    }
}

fn referenced_rule_names(expr: &RuleExpr, out: &mut Vec<String>) {
    if let RuleExpr::Call(name, _) = expr {
        out.push(name.clone());
    }
    for child in children(expr) {
        referenced_rule_names(child, out);
    }
}

fn check_unreachable_rules(table: &RuleTable, entry: &str) -> Vec<ValidationIssue> {
    let mut reachable = HashSet::new();
    let mut to_visit = vec![entry.to_string()];

    while let Some(name) = to_visit.pop() {
        if !reachable.insert(name.clone()) {
            continue;
        }
        if let Some(rule) = table.get(&name) {
            let mut refs = Vec::new();
            referenced_rule_names(&rule.body, &mut refs);
            to_visit.extend(refs);
        }
    }

    table
        .names()
        .filter(|name| !reachable.contains(*name))
        .map(|name| ValidationIssue::UnreachableRule {
            name: name.to_string(),
        })
        .collect()
}
