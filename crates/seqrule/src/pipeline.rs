//! The result-processing pipeline attached to each rule.
//!
//! Each rule carries an ordered list of [`PipelineStep`]s, run in
//! declaration order against a running [`Value`] seeded with the rule
//! body's match result. A grammar author does not write step bodies as
//! interpreted rule expressions; they supply plain Rust closures through
//! the builder API, which also gives each step read/write access to the
//! active [`Bindings`] for the call.

use std::fmt;
use std::rc::Rc;

use crate::control::Bindings;
use crate::value::Value;

/// A closure that computes a new [`Value`] from the destructured elements
/// of the running value and the bindings active in the current call.
pub type TransformFn = Rc<dyn Fn(&[Value], &Bindings) -> Value>;

/// A closure that tests the destructured elements of the running value
/// against the bindings active in the current call.
pub type PredicateFn = Rc<dyn Fn(&[Value], &Bindings) -> bool>;

/// One step of a rule's result-processing pipeline.
#[derive(Clone)]
pub enum PipelineStep {
    /// `constant c` — replace the value with `c`, ignoring the input.
    Constant(Value),
    /// `lambda (params) body` — destructure the value and rebind it to the
    /// closure's result.
    Lambda(TransformFn),
    /// `destructure (params) body` — alias of `lambda`, kept as a distinct
    /// variant because the surface syntax names both.
    Destructure(TransformFn),
    /// `function f` — call `f` positionally with the value's elements.
    Function(TransformFn),
    /// `identity expr` — when `expr` is false, replace the value with
    /// [`Value::Null`].
    Identity(PredicateFn),
    /// `flatten` — deeply flatten the value into one list.
    Flatten,
    /// `string` — flatten, then concatenate into one string.
    ToString,
    /// `vector` — flatten, then collect into one vector.
    ToVector,
    /// `test (params) body` — veto the match if `body` is false.
    Test(PredicateFn),
    /// `not (params) body` — veto the match if `body` is true.
    TestNot(PredicateFn),
}

impl fmt::Debug for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStep::Constant(v) => return write!(f, "Constant({v:?})"),
            PipelineStep::Lambda(_) => "Lambda(..)",
            PipelineStep::Destructure(_) => "Destructure(..)",
            PipelineStep::Function(_) => "Function(..)",
            PipelineStep::Identity(_) => "Identity(..)",
            PipelineStep::Flatten => "Flatten",
            PipelineStep::ToString => "ToString",
            PipelineStep::ToVector => "ToVector",
            PipelineStep::Test(_) => "Test(..)",
            PipelineStep::TestNot(_) => "TestNot(..)",
        };
        f.write_str(name)
    }
}

/// Runs `pipeline` over `value` in order, giving each step access to
/// `bindings`. Returns `None` if a `test` or `not` step vetoes the match —
/// the caller must then fail at the entry cursor.
#[must_use]
pub fn run(pipeline: &[PipelineStep], mut value: Value, bindings: &Bindings) -> Option<Value> {
    for step in pipeline {
        value = match step {
            PipelineStep::Constant(c) => c.clone(),
            PipelineStep::Lambda(f) | PipelineStep::Destructure(f) | PipelineStep::Function(f) => {
                f(&value.destructured(), bindings)
            }
            PipelineStep::Identity(test) => {
                if test(&value.destructured(), bindings) {
                    value
                } else {
                    Value::Null
                }
            }
            PipelineStep::Flatten => value.flatten(),
            PipelineStep::ToString => Value::Str(value.into_string()),
            PipelineStep::ToVector => Value::Vector(value.into_vector()),
            PipelineStep::Test(test) => {
                if test(&value.destructured(), bindings) {
                    value
                } else {
                    return None;
                }
            }
            PipelineStep::TestNot(test) => {
                if test(&value.destructured(), bindings) {
                    return None;
                }
                value
            }
        };
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Form;
    use pretty_assertions::assert_eq;

    #[test]
    fn constant_replaces_the_value() {
        let bindings = Bindings::default();
        let steps = vec![PipelineStep::Constant(Value::Null)];
        assert_eq!(
            run(&steps, Value::Atom(Form::Char('a')), &bindings),
            Some(Value::Null)
        );
    }

    #[test]
    fn test_step_vetoes_on_false() {
        let bindings = Bindings::default();
        let steps = vec![PipelineStep::Test(Rc::new(|_: &[Value], _: &Bindings| false))];
        assert_eq!(run(&steps, Value::Null, &bindings), None);
    }

    #[test]
    fn not_step_vetoes_on_true() {
        let bindings = Bindings::default();
        let steps = vec![PipelineStep::TestNot(Rc::new(|_: &[Value], _: &Bindings| true))];
        assert_eq!(run(&steps, Value::Null, &bindings), None);
    }

    #[test]
    fn string_step_flattens_and_concatenates() {
        let bindings = Bindings::default();
        let value = Value::List(vec![
            Value::Atom(Form::Char('h')),
            Value::Atom(Form::Char('i')),
        ]);
        let steps = vec![PipelineStep::ToString];
        assert_eq!(run(&steps, value, &bindings), Some(Value::Str("hi".into())));
    }

    #[test]
    fn identity_nulls_out_on_false() {
        let bindings = Bindings::default();
        let steps = vec![PipelineStep::Identity(Rc::new(|_: &[Value], _: &Bindings| false))];
        assert_eq!(
            run(&steps, Value::Atom(Form::Char('a')), &bindings),
            Some(Value::Null)
        );
    }

    #[test]
    fn function_step_sees_destructured_elements() {
        let bindings = Bindings::default();
        let steps = vec![PipelineStep::Function(Rc::new(|elems: &[Value], _: &Bindings| {
            Value::Atom(Form::Number(elems.len() as i64))
        }))];
        let value = Value::List(vec![Value::Null, Value::Null, Value::Null]);
        assert_eq!(
            run(&steps, value, &bindings),
            Some(Value::Atom(Form::Number(3)))
        );
    }

    #[test]
    fn function_step_reads_a_binding() {
        let mut bindings = Bindings::default();
        bindings.push_frame(&[("flag".to_string(), Form::Number(7))]);
        let steps = vec![PipelineStep::Function(Rc::new(|_: &[Value], b: &Bindings| {
            Value::Atom(b.get("flag").unwrap_or(Form::Number(-1)))
        }))];
        assert_eq!(
            run(&steps, Value::Null, &bindings),
            Some(Value::Atom(Form::Number(7)))
        );
    }
}
