//! The atom matcher and combinator interpreter, plus rule invocation.
//!
//! This is the largest component: a recursive function that matches on the
//! expression's kind and dispatches to a sibling function per variant. Every
//! arm threads a cursor through the input and returns a result value rather
//! than a bare success/failure flag.

use std::collections::HashMap;

use crate::control::Engine;
use crate::cursor::Cursor;
use crate::error::EngineError;
use crate::expr::{ArgExpr, Literal, RepBound, RuleExpr, Wildcard};
use crate::form::Form;
use crate::pipeline;
use crate::value::Value;

/// The result of a successful match: the value it produced, and the
/// cursor positioned just past the matched input.
#[derive(Debug, Clone, PartialEq)]
pub struct Matched {
    /// The value produced by the match (before any enclosing rule's
    /// pipeline runs over it).
    pub value: Value,
    /// The cursor just past the matched input.
    pub cursor: Cursor,
}

/// `None` represents match failure as a value; it carries no cursor, so the
/// caller's own cursor is structurally unchanged by discarding it.
pub type MatchOutcome = Option<Matched>;

/// Matches `expr` against `input` at `cursor`, threading `engine` for rule
/// lookups, bindings, left-recursion tracking, and tracing.
///
/// # Errors
///
/// Returns [`EngineError`] for an unknown rule reference, a malformed
/// expression, an illegal repetition bound, or detected left recursion.
pub fn match_expr(
    engine: &mut Engine,
    expr: &RuleExpr,
    input: &Form,
    cursor: &Cursor,
) -> Result<MatchOutcome, EngineError> {
    match expr {
        RuleExpr::Literal(lit) => Ok(match_literal(lit, input, cursor)),
        RuleExpr::Wildcard(w) => Ok(match_wildcard(*w, input, cursor)),
        RuleExpr::Param(name) => match_param(engine, name, input, cursor),
        RuleExpr::Binding(name) => Ok(match_binding(engine, name, input, cursor)),
        RuleExpr::Call(name, args) => eval_call(engine, name, args, input, cursor),
        RuleExpr::Or(exprs) => match_or(engine, exprs, input, cursor),
        RuleExpr::And(exprs) => match_and(engine, exprs, input, cursor),
        RuleExpr::AndUnordered(exprs) => match_and_unordered(engine, exprs, input, cursor),
        RuleExpr::Not(e) => match_not(engine, e, input, cursor),
        RuleExpr::ZeroOrMore(e) => match_zero_or_more(engine, e, input, cursor).map(Some),
        RuleExpr::OneOrMore(e) => match_one_or_more(engine, e, input, cursor),
        RuleExpr::Rep(bound, e) => match_rep(engine, *bound, e, input, cursor),
        RuleExpr::Optional(e) => match_optional(engine, e, input, cursor).map(Some),
        RuleExpr::Lookahead(e) => match_lookahead(engine, e, input, cursor),
        RuleExpr::LookbehindNot(e) => match_lookbehind_not(engine, e, input, cursor),
        RuleExpr::DescendList(e) => match_descend(engine, e, input, cursor, Form::is_list),
        RuleExpr::DescendString(e) => match_descend(engine, e, input, cursor, Form::is_str),
        RuleExpr::DescendVector(e) => match_descend(engine, e, input, cursor, Form::is_vector),
    }
}

/// One consumed position, carrying `item` as the matched value.
fn consume_one(item: Form, cursor: &Cursor) -> Matched {
    Matched {
        cursor: cursor.step(1),
        value: Value::from_form(item),
    }
}

/// A static rule literal dispatches by the [`Form`] it denotes; lists are
/// excluded at the type level, so every arm here is one the grammar author
/// could actually write.
fn match_literal(lit: &Literal, input: &Form, cursor: &Cursor) -> MatchOutcome {
    match_form_literal(&lit.to_form(), input, cursor)
}

/// Matches an arbitrary [`Form`] value against the cursor as if it were a
/// literal. Used both by [`match_literal`] and by the runtime dispatch of a
/// formal parameter or dynamic binding, which may hold any `Form` —
/// including a list, which can never appear in a static [`RuleExpr::Literal`]
/// but can certainly be bound to one at runtime.
fn match_form_literal(lit: &Form, input: &Form, cursor: &Cursor) -> MatchOutcome {
    match lit {
        Form::Symbol(_) | Form::Char(_) | Form::Number(_) => {
            let item = cursor.item(input)?;
            (&item == lit).then(|| consume_one(item, cursor))
        }
        Form::Str(chars) => match cursor.str_tail(input) {
            Some(tail) if tail.len() >= chars.len() && tail[..chars.len()] == chars[..] => {
                Some(Matched {
                    value: Value::Str(chars.iter().collect()),
                    cursor: cursor.step(chars.len()),
                })
            }
            Some(_) => None,
            None => {
                let item = cursor.item(input)?;
                (&item == lit).then(|| consume_one(item, cursor))
            }
        },
        Form::Vector(nums) => match cursor.vector_tail(input) {
            Some(tail) if tail.len() >= nums.len() && tail[..nums.len()] == nums[..] => {
                Some(Matched {
                    value: Value::Vector(nums.clone()),
                    cursor: cursor.step(nums.len()),
                })
            }
            Some(_) => None,
            None => {
                let item = cursor.item(input)?;
                (&item == lit).then(|| consume_one(item, cursor))
            }
        },
        Form::List(_) => {
            let item = cursor.item(input)?;
            (&item == lit).then(|| consume_one(item, cursor))
        }
    }
}

fn match_wildcard(wildcard: Wildcard, input: &Form, cursor: &Cursor) -> MatchOutcome {
    let item = cursor.item(input)?;
    let accepted = match wildcard {
        Wildcard::Char => item.is_char(),
        Wildcard::Byte => item.is_byte(),
        Wildcard::Symbol => item.is_symbol(),
        Wildcard::List => item.is_list(),
        Wildcard::Vector => item.is_vector(),
        Wildcard::Number => item.is_number(),
        Wildcard::String => item.is_str(),
        Wildcard::AnyForm => true,
    };
    accepted.then(|| consume_one(item, cursor))
}

/// A formal-parameter reference dispatches at match time by treating the
/// parameter's bound value as a literal. An unbound parameter name is an
/// authoring error, not a recoverable match failure.
fn match_param(
    engine: &mut Engine,
    name: &str,
    input: &Form,
    cursor: &Cursor,
) -> Result<MatchOutcome, EngineError> {
    let bound = engine.param(name).ok_or_else(|| {
        EngineError::MalformedExpression(format!("reference to unbound parameter '{name}'"))
    })?;
    Ok(match_form_literal(&bound, input, cursor))
}

/// A dynamic-binding reference dispatches at match time by treating the
/// binding's current value as a literal. Unlike [`match_param`], a name with
/// no binding in any enclosing call frame is simply a match failure: the
/// caller never established that binding, which is an expected possibility
/// for an inherited binding rather than a wiring bug.
fn match_binding(engine: &Engine, name: &str, input: &Form, cursor: &Cursor) -> MatchOutcome {
    let bound = engine.bindings().get(name)?;
    match_form_literal(&bound, input, cursor)
}

fn match_or(
    engine: &mut Engine,
    exprs: &[RuleExpr],
    input: &Form,
    cursor: &Cursor,
) -> Result<MatchOutcome, EngineError> {
    for expr in exprs {
        if let Some(m) = match_expr(engine, expr, input, cursor)? {
            return Ok(Some(m));
        }
    }
    Ok(None)
}

fn match_and(
    engine: &mut Engine,
    exprs: &[RuleExpr],
    input: &Form,
    cursor: &Cursor,
) -> Result<MatchOutcome, EngineError> {
    let mut cur = cursor.clone();
    let mut values = Vec::with_capacity(exprs.len());
    for expr in exprs {
        match match_expr(engine, expr, input, &cur)? {
            Some(m) => {
                values.push(m.value);
                cur = m.cursor;
            }
            None => return Ok(None),
        }
    }
    Ok(Some(Matched {
        value: Value::List(values),
        cursor: cur,
    }))
}

/// Every alternative must succeed exactly once, in any order; results are
/// returned index-aligned with the original rule order.
fn match_and_unordered(
    engine: &mut Engine,
    exprs: &[RuleExpr],
    input: &Form,
    cursor: &Cursor,
) -> Result<MatchOutcome, EngineError> {
    let mut results: Vec<Option<Value>> = vec![None; exprs.len()];
    let mut done = vec![false; exprs.len()];
    let mut cur = cursor.clone();

    for _ in 0..exprs.len() {
        let mut accepted = false;
        for (i, expr) in exprs.iter().enumerate() {
            if done[i] {
                continue;
            }
            if let Some(m) = match_expr(engine, expr, input, &cur)? {
                results[i] = Some(m.value);
                done[i] = true;
                cur = m.cursor;
                accepted = true;
                break;
            }
        }
        if !accepted {
            return Ok(None);
        }
    }

    let values = results
        .into_iter()
        .map(|v| v.expect("every alternative accepted exactly once"))
        .collect();
    Ok(Some(Matched {
        value: Value::List(values),
        cursor: cur,
    }))
}

fn match_not(
    engine: &mut Engine,
    expr: &RuleExpr,
    input: &Form,
    cursor: &Cursor,
) -> Result<MatchOutcome, EngineError> {
    if match_expr(engine, expr, input, cursor)?.is_some() {
        return Ok(None);
    }
    if !cursor.is_valid(input) {
        return Ok(None);
    }
    Ok(cursor.item(input).map(|item| consume_one(item, cursor)))
}

/// Applies `expr` greedily from `start`, stopping when it fails or when a
/// success fails to advance the cursor (the mandatory-advance guard that
/// keeps `*`/`+` from looping forever over a zero-consumption inner rule).
fn repeat_greedy(
    engine: &mut Engine,
    expr: &RuleExpr,
    input: &Form,
    start: &Cursor,
) -> Result<(Vec<Value>, Cursor), EngineError> {
    let mut cur = start.clone();
    let mut values = Vec::new();
    loop {
        match match_expr(engine, expr, input, &cur)? {
            Some(m) if m.cursor != cur => {
                values.push(m.value);
                cur = m.cursor;
            }
            _ => break,
        }
    }
    Ok((values, cur))
}

fn match_zero_or_more(
    engine: &mut Engine,
    expr: &RuleExpr,
    input: &Form,
    cursor: &Cursor,
) -> Result<Matched, EngineError> {
    let (values, cur) = repeat_greedy(engine, expr, input, cursor)?;
    Ok(Matched {
        value: Value::List(values),
        cursor: cur,
    })
}

fn match_one_or_more(
    engine: &mut Engine,
    expr: &RuleExpr,
    input: &Form,
    cursor: &Cursor,
) -> Result<MatchOutcome, EngineError> {
    let Some(first) = match_expr(engine, expr, input, cursor)? else {
        return Ok(None);
    };
    let mut values = vec![first.value];
    let mut cur = first.cursor;
    if cur != *cursor {
        let (more, cur2) = repeat_greedy(engine, expr, input, &cur)?;
        values.extend(more);
        cur = cur2;
    }
    Ok(Some(Matched {
        value: Value::List(values),
        cursor: cur,
    }))
}

fn match_rep(
    engine: &mut Engine,
    bound: RepBound,
    expr: &RuleExpr,
    input: &Form,
    cursor: &Cursor,
) -> Result<MatchOutcome, EngineError> {
    if bound.min > bound.max {
        return Err(EngineError::IllegalRepetitionRange(format!(
            "minimum {} exceeds maximum {}",
            bound.min, bound.max
        )));
    }
    let mut cur = cursor.clone();
    let mut values = Vec::new();
    while values.len() < bound.max {
        match match_expr(engine, expr, input, &cur)? {
            Some(m) if m.cursor != cur => {
                values.push(m.value);
                cur = m.cursor;
            }
            _ => break,
        }
    }
    if values.len() >= bound.min {
        Ok(Some(Matched {
            value: Value::List(values),
            cursor: cur,
        }))
    } else {
        Ok(None)
    }
}

fn match_optional(
    engine: &mut Engine,
    expr: &RuleExpr,
    input: &Form,
    cursor: &Cursor,
) -> Result<Matched, EngineError> {
    match match_expr(engine, expr, input, cursor)? {
        Some(m) => Ok(m),
        None => Ok(Matched {
            value: Value::Null,
            cursor: cursor.clone(),
        }),
    }
}

fn match_lookahead(
    engine: &mut Engine,
    expr: &RuleExpr,
    input: &Form,
    cursor: &Cursor,
) -> Result<MatchOutcome, EngineError> {
    Ok(match_expr(engine, expr, input, cursor)?.map(|m| Matched {
        value: m.value,
        cursor: cursor.clone(),
    }))
}

fn match_lookbehind_not(
    engine: &mut Engine,
    expr: &RuleExpr,
    input: &Form,
    cursor: &Cursor,
) -> Result<MatchOutcome, EngineError> {
    if match_expr(engine, expr, input, cursor)?.is_some() {
        return Ok(None);
    }
    if !cursor.is_valid(input) {
        return Ok(None);
    }
    Ok(cursor.item(input).map(|item| Matched {
        value: Value::from_form(item),
        cursor: cursor.clone(),
    }))
}

/// Typed descent: the current item must be a sub-sequence passing
/// `is_kind`, and `expr` must match its *entire* contents.
fn match_descend(
    engine: &mut Engine,
    expr: &RuleExpr,
    input: &Form,
    cursor: &Cursor,
    is_kind: fn(&Form) -> bool,
) -> Result<MatchOutcome, EngineError> {
    let Some(item) = cursor.item(input) else {
        return Ok(None);
    };
    if !is_kind(&item) {
        return Ok(None);
    }
    let inner_start = cursor.descend();
    let inner_len = inner_start.length_at(input);
    match match_expr(engine, expr, input, &inner_start)? {
        Some(m) if m.cursor.offset() == inner_len => Ok(Some(Matched {
            value: m.value,
            cursor: cursor.step(1),
        })),
        _ => Ok(None),
    }
}

/// Resolves an argument expression at a call site to the `Form` value the
/// callee's parameter should be bound to: a literal is passed through
/// as-is, and a forwarded name is resolved against the *caller's* current
/// parameter frame.
fn resolve_arg(engine: &Engine, arg: &ArgExpr) -> Result<Form, EngineError> {
    match arg {
        ArgExpr::Literal(form) => Ok(form.clone()),
        ArgExpr::Forward(name) => engine.param(name).ok_or_else(|| {
            EngineError::MalformedExpression(format!(
                "argument '{name}' is not a bound parameter at the call site"
            ))
        }),
    }
}

/// Rule invocation: look up the rule, engage the left-recursion guard and
/// trace hook, run the body under fresh lexical bindings and the
/// caller-forwarded formal parameters, then run the result-processing
/// pipeline — with access to those same bindings — over a successful match.
fn eval_call(
    engine: &mut Engine,
    name: &str,
    args: &[ArgExpr],
    input: &Form,
    cursor: &Cursor,
) -> Result<MatchOutcome, EngineError> {
    let rule = engine
        .rule_table()
        .get(name)
        .cloned()
        .ok_or_else(|| EngineError::UnknownRule(name.to_string()))?;

    if args.len() > rule.params.len() {
        return Err(EngineError::MalformedExpression(format!(
            "rule '{name}' called with {} argument(s) but declares {} parameter(s)",
            args.len(),
            rule.params.len()
        )));
    }

    let mut params = HashMap::with_capacity(rule.params.len());
    for (param_name, arg) in rule.params.iter().zip(args) {
        params.insert(param_name.clone(), resolve_arg(engine, arg)?);
    }

    let mut scope = engine.enter_call(name, cursor, &rule.lexical_bindings, params)?;
    match match_expr(scope.engine(), &rule.body, input, cursor) {
        Ok(Some(m)) => match pipeline::run(&rule.pipeline, m.value, scope.engine().bindings()) {
            Some(value) => {
                scope.exit_success(&m.cursor, &value);
                Ok(Some(Matched {
                    value,
                    cursor: m.cursor,
                }))
            }
            None => {
                scope.exit_failure();
                Ok(None)
            }
        },
        Ok(None) => {
            scope.exit_failure();
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleDef;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn list(items: Vec<Form>) -> Form {
        Form::List(items)
    }

    fn sym(s: &str) -> Form {
        Form::symbol(s)
    }

    #[test]
    fn literal_symbol_matches_and_advances() {
        let mut engine = Engine::new();
        let input = list(vec![sym("a")]);
        let out = match_expr(&mut engine, &RuleExpr::symbol("a"), &input, &Cursor::at(0))
            .unwrap();
        assert_eq!(out.unwrap().cursor, Cursor::at(1));

        let out = match_expr(&mut engine, &RuleExpr::symbol("b"), &input, &Cursor::at(0))
            .unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn and_sequence_threads_the_cursor() {
        let mut engine = Engine::new();
        let input = list(vec![sym("a"), sym("b"), sym("c")]);
        let expr = RuleExpr::and([
            RuleExpr::symbol("a"),
            RuleExpr::symbol("b"),
            RuleExpr::symbol("c"),
        ]);
        let out = match_expr(&mut engine, &expr, &input, &Cursor::at(0)).unwrap();
        assert_eq!(out.unwrap().cursor, Cursor::at(3));

        let short = list(vec![sym("a"), sym("b")]);
        let out = match_expr(&mut engine, &expr, &short, &Cursor::at(0)).unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn or_choice_never_probes_past_the_first_success() {
        let mut engine = Engine::new();
        let input = list(vec![sym("a")]);
        let expr = RuleExpr::or([
            RuleExpr::symbol("a"),
            RuleExpr::symbol("b"),
        ]);
        let out = match_expr(&mut engine, &expr, &input, &Cursor::at(0)).unwrap();
        assert_eq!(out.unwrap().value, Value::Atom(sym("a")));
    }

    #[test]
    fn zero_or_more_over_empty_input_succeeds_with_no_values() {
        let mut engine = Engine::new();
        let input = list(vec![]);
        let expr = RuleExpr::ZeroOrMore(Box::new(RuleExpr::symbol("a")));
        let out = match_expr(&mut engine, &expr, &input, &Cursor::at(0)).unwrap();
        assert_eq!(out.unwrap().value, Value::List(vec![]));
    }

    #[test]
    fn one_or_more_fails_on_empty_input() {
        let mut engine = Engine::new();
        let input = list(vec![]);
        let expr = RuleExpr::OneOrMore(Box::new(RuleExpr::symbol("a")));
        let out = match_expr(&mut engine, &expr, &input, &Cursor::at(0)).unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn and_unordered_returns_values_in_original_order() {
        let mut engine = Engine::new();
        let input = list(vec![sym("b"), sym("a")]);
        let expr = RuleExpr::and_unordered([
            RuleExpr::symbol("a"),
            RuleExpr::symbol("b"),
        ]);
        let out = match_expr(&mut engine, &expr, &input, &Cursor::at(0))
            .unwrap()
            .unwrap();
        assert_eq!(
            out.value,
            Value::List(vec![Value::Atom(sym("a")), Value::Atom(sym("b"))])
        );
        assert_eq!(out.cursor, Cursor::at(2));
    }

    #[test]
    fn rep_bounds_succeed_within_range_and_fail_outside_it() {
        let mut engine = Engine::new();
        let input = list(vec![sym("a"), sym("a"), sym("a")]);
        let expr = RuleExpr::Rep(
            RepBound::range(1, 2),
            Box::new(RuleExpr::symbol("a")),
        );
        let out = match_expr(&mut engine, &expr, &input, &Cursor::at(0))
            .unwrap()
            .unwrap();
        assert_eq!(out.cursor, Cursor::at(2));

        let too_few = RuleExpr::Rep(
            RepBound::range(5, 5),
            Box::new(RuleExpr::symbol("a")),
        );
        let out = match_expr(&mut engine, &too_few, &input, &Cursor::at(0)).unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn illegal_rep_bound_is_a_fatal_error() {
        let mut engine = Engine::new();
        let input = list(vec![]);
        let expr = RuleExpr::Rep(RepBound::range(3, 1), Box::new(RuleExpr::symbol("a")));
        let err = match_expr(&mut engine, &expr, &input, &Cursor::at(0));
        assert!(matches!(err, Err(EngineError::IllegalRepetitionRange(_))));
    }

    #[test]
    fn lookahead_and_lookbehind_do_not_advance() {
        let mut engine = Engine::new();
        let input = list(vec![sym("a")]);
        let la = RuleExpr::Lookahead(Box::new(RuleExpr::symbol("a")));
        let out = match_expr(&mut engine, &la, &input, &Cursor::at(0)).unwrap().unwrap();
        assert_eq!(out.cursor, Cursor::at(0));

        let lb = RuleExpr::LookbehindNot(Box::new(RuleExpr::symbol("b")));
        let out = match_expr(&mut engine, &lb, &input, &Cursor::at(0)).unwrap().unwrap();
        assert_eq!(out.cursor, Cursor::at(0));
    }

    #[test]
    fn negation_consumes_one_and_fails_at_end() {
        let mut engine = Engine::new();
        let input = list(vec![sym("a")]);
        let not_b = RuleExpr::Not(Box::new(RuleExpr::symbol("b")));
        let out = match_expr(&mut engine, &not_b, &input, &Cursor::at(0)).unwrap().unwrap();
        assert_eq!(out.cursor, Cursor::at(1));

        let out = match_expr(&mut engine, &not_b, &input, &Cursor::at(1)).unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn typed_descent_requires_the_whole_sub_sequence_to_match() {
        let mut engine = Engine::new();
        let input = list(vec![list(vec![sym("a"), sym("b")])]);
        let expr = RuleExpr::DescendList(Box::new(RuleExpr::and([
            RuleExpr::symbol("a"),
            RuleExpr::symbol("b"),
        ])));
        let out = match_expr(&mut engine, &expr, &input, &Cursor::at(0)).unwrap();
        assert_eq!(out.unwrap().cursor, Cursor::at(1));

        let partial = RuleExpr::DescendList(Box::new(RuleExpr::symbol("a")));
        let out = match_expr(&mut engine, &partial, &input, &Cursor::at(0)).unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn string_literal_matches_contiguously_inside_a_string() {
        let mut engine = Engine::new();
        let input = Form::string("hello world");
        let expr = RuleExpr::string("hello");
        let out = match_expr(&mut engine, &expr, &input, &Cursor::at(0))
            .unwrap()
            .unwrap();
        assert_eq!(out.cursor, Cursor::at(5));
        assert_eq!(out.value, Value::Str("hello".into()));
    }

    #[test]
    fn unknown_rule_reference_is_fatal() {
        let mut engine = Engine::new();
        let input = list(vec![]);
        let expr = RuleExpr::call("missing");
        let err = match_expr(&mut engine, &expr, &input, &Cursor::at(0));
        assert!(matches!(err, Err(EngineError::UnknownRule(name)) if name == "missing"));
    }

    #[test]
    fn rule_call_runs_its_pipeline() {
        let mut engine = Engine::new();
        engine.define_rule(
            RuleDef::new("greeting", RuleExpr::symbol("hey"))
                .with_pipeline(vec![crate::pipeline::PipelineStep::Constant(Value::Atom(
                    Form::Number(1),
                ))]),
        );
        let input = list(vec![sym("hey")]);
        let out = match_expr(&mut engine, &RuleExpr::call("greeting"), &input, &Cursor::at(0))
            .unwrap()
            .unwrap();
        assert_eq!(out.value, Value::Atom(Form::Number(1)));
    }

    #[test]
    fn parametric_rule_dispatches_against_the_bound_argument() {
        let mut engine = Engine::new();
        engine.define_rule(
            RuleDef::new(
                "greet",
                RuleExpr::and([RuleExpr::symbol("hey"), RuleExpr::Param("x".into())]),
            )
            .with_params(["x"]),
        );
        let call = RuleExpr::call_with("greet", [ArgExpr::Literal(sym("you"))]);

        let ok = list(vec![sym("hey"), sym("you")]);
        assert!(match_expr(&mut engine, &call, &ok, &Cursor::at(0)).unwrap().is_some());

        let bad = list(vec![sym("hey"), sym("me")]);
        assert!(match_expr(&mut engine, &call, &bad, &Cursor::at(0)).unwrap().is_none());
    }

    #[test]
    fn test_pipeline_step_vetoes_the_call() {
        let mut engine = Engine::new();
        engine.define_rule(
            RuleDef::new("r", RuleExpr::symbol("a")).with_pipeline(vec![
                crate::pipeline::PipelineStep::Test(Rc::new(|_: &[Value], _: &crate::control::Bindings| false)),
            ]),
        );
        let input = list(vec![sym("a")]);
        let out = match_expr(&mut engine, &RuleExpr::call("r"), &input, &Cursor::at(0)).unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn binding_set_in_one_call_is_read_by_a_sibling_call() {
        let mut engine = Engine::new();
        engine.define_rule(
            RuleDef::new("setter", RuleExpr::symbol("set")).with_pipeline(vec![
                crate::pipeline::PipelineStep::Function(Rc::new(
                    |elems: &[Value], bindings: &crate::control::Bindings| {
                        bindings.set("flag", Form::Number(42));
                        elems.first().cloned().unwrap_or(Value::Null)
                    },
                )),
            ]),
        );
        engine.define_rule(
            RuleDef::new("reader", RuleExpr::Binding("flag".into()))
                .with_inherited_bindings(["flag"]),
        );
        engine.define_rule(
            RuleDef::new(
                "outer",
                RuleExpr::and([RuleExpr::call("setter"), RuleExpr::call("reader")]),
            )
            .with_lexical_bindings(vec![("flag".to_string(), Form::Number(0))]),
        );

        let input = list(vec![sym("set"), Form::Number(42)]);
        let out = match_expr(&mut engine, &RuleExpr::call("outer"), &input, &Cursor::at(0))
            .unwrap()
            .unwrap();
        assert_eq!(out.cursor, Cursor::at(2));
    }

    #[test]
    fn unbound_binding_reference_fails_gracefully() {
        let mut engine = Engine::new();
        let input = list(vec![Form::Number(1)]);
        let out = match_expr(
            &mut engine,
            &RuleExpr::Binding("flag".into()),
            &input,
            &Cursor::at(0),
        )
        .unwrap();
        assert_eq!(out, None);
    }
}
