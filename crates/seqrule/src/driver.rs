//! The top-level driver: seeds the cursor, invokes the start expression, and
//! decides whether the input was consumed as required.

use crate::control::Engine;
use crate::cursor::Cursor;
use crate::error::EngineError;
use crate::expr::RuleExpr;
use crate::form::Form;
use crate::matcher::match_expr;
use crate::value::Value;

/// Options accepted by [`parse`] as its third argument.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// The index the cursor starts at. Defaults to `0`.
    pub start: usize,
    /// The offset the final cursor must reach for an exact match. Defaults
    /// to the length of the top-level input.
    pub end: Option<usize>,
    /// When true, a match that stops short of `end` still succeeds as long
    /// as it does not overrun it.
    pub junk_allowed: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            start: 0,
            end: None,
            junk_allowed: false,
        }
    }
}

/// The result of a top-level [`parse`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    /// The matched value, present only when `success` is `true`.
    pub value: Option<Value>,
    /// Whether the parse succeeded: the start expression matched, and the
    /// final cursor satisfied the `end`/`junk_allowed` acceptance rule.
    pub success: bool,
}

impl ParseOutcome {
    fn failure() -> Self {
        ParseOutcome {
            value: None,
            success: false,
        }
    }
}

/// Runs `start_expr` against `input` under `engine`'s active rule table.
///
/// # Errors
///
/// Returns [`EngineError`] for any fatal condition raised while evaluating
/// `start_expr` — an unmatched call never reaches here as an error, it
/// surfaces as `ParseOutcome { success: false, .. }`.
pub fn parse(
    engine: &mut Engine,
    start_expr: &RuleExpr,
    input: &Form,
    options: ParseOptions,
) -> Result<ParseOutcome, EngineError> {
    let cursor = Cursor::at(options.start);
    let Some(matched) = match_expr(engine, start_expr, input, &cursor)? else {
        return Ok(ParseOutcome::failure());
    };

    let top_level_len = input.len().unwrap_or(0);
    let final_offset = matched.cursor.offset();

    let accepted = match options.end {
        Some(end) => final_offset == end || (options.junk_allowed && final_offset < end),
        None => final_offset == top_level_len || options.junk_allowed,
    };

    if accepted {
        Ok(ParseOutcome {
            value: Some(matched.value),
            success: true,
        })
    } else {
        Ok(ParseOutcome::failure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Form;
    use crate::rules::RuleDef;
    use pretty_assertions::assert_eq;

    fn list(items: Vec<Form>) -> Form {
        Form::List(items)
    }

    #[test]
    fn literal_match_over_whole_input_succeeds() {
        let mut engine = Engine::new();
        let input = list(vec![Form::symbol("a")]);
        let out = parse(
            &mut engine,
            &RuleExpr::symbol("a"),
            &input,
            ParseOptions::default(),
        )
        .unwrap();
        assert!(out.success);
        assert_eq!(out.value, Some(Value::Atom(Form::symbol("a"))));
    }

    #[test]
    fn leftover_input_fails_without_junk_allowed() {
        let mut engine = Engine::new();
        let input = list(vec![Form::symbol("a"), Form::symbol("b")]);
        let out = parse(
            &mut engine,
            &RuleExpr::symbol("a"),
            &input,
            ParseOptions::default(),
        )
        .unwrap();
        assert!(!out.success);
    }

    #[test]
    fn leftover_input_succeeds_with_junk_allowed() {
        let mut engine = Engine::new();
        let input = Form::string("123abc");
        engine.define_rule(
            RuleDef::new("digits", RuleExpr::string("123"))
                .with_pipeline(vec![crate::pipeline::PipelineStep::ToString]),
        );
        let out = parse(
            &mut engine,
            &RuleExpr::call("digits"),
            &input,
            ParseOptions {
                junk_allowed: true,
                ..ParseOptions::default()
            },
        )
        .unwrap();
        assert!(out.success);
        assert_eq!(out.value, Some(Value::Str("123".into())));
    }

    #[test]
    fn unmatched_start_expr_is_a_failure_not_an_error() {
        let mut engine = Engine::new();
        let input = list(vec![Form::symbol("b")]);
        let out = parse(
            &mut engine,
            &RuleExpr::symbol("a"),
            &input,
            ParseOptions::default(),
        )
        .unwrap();
        assert_eq!(out, ParseOutcome::failure());
    }

    #[test]
    fn explicit_end_offset_is_honored() {
        let mut engine = Engine::new();
        let input = list(vec![Form::symbol("a"), Form::symbol("b"), Form::symbol("c")]);
        let out = parse(
            &mut engine,
            &RuleExpr::symbol("a"),
            &input,
            ParseOptions {
                end: Some(1),
                ..ParseOptions::default()
            },
        )
        .unwrap();
        assert!(out.success);
    }

    #[test]
    fn fatal_errors_propagate_out_of_parse() {
        let mut engine = Engine::new();
        let input = list(vec![]);
        let err = parse(
            &mut engine,
            &RuleExpr::call("missing"),
            &input,
            ParseOptions::default(),
        );
        assert!(matches!(err, Err(EngineError::UnknownRule(_))));
    }
}
