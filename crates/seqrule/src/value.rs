//! The result value: a tagged variant shared by every pipeline step.
//!
//! A successful match produces a [`Value`], shaped by the rule's
//! [result-processing pipeline](crate::pipeline). Per the design notes,
//! heterogeneous match results (atoms, lists of atoms, lists of lists,
//! strings, vectors) are modeled as one tagged type rather than a family of
//! unrelated Rust types, so every pipeline step can operate on it uniformly.

use crate::form::Form;

/// The value produced by a successful match, before or after pipeline
/// processing.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A single matched atom (symbol, character, or number).
    Atom(Form),
    /// A list of child values, in match order.
    List(Vec<Value>),
    /// A string built by the `string` pipeline step, or captured whole from
    /// a string literal/typed-descent match.
    Str(String),
    /// A vector built by the `vector` pipeline step, or captured whole from
    /// a vector literal/typed-descent match.
    Vector(Vec<i64>),
    /// The absence of a value — produced by an unmatched `(? r)`, or by the
    /// `identity` pipeline step when its test is false.
    Null,
}

impl Value {
    /// Wraps a whole matched [`Form`] (including nested lists/strings/
    /// vectors) as a value, recursively converting sequences into the
    /// corresponding [`Value`] shape.
    #[must_use]
    pub fn from_form(form: Form) -> Self {
        match form {
            Form::List(items) => Value::List(items.into_iter().map(Value::from_form).collect()),
            Form::Str(chars) => Value::Str(chars.into_iter().collect()),
            Form::Vector(nums) => Value::Vector(nums),
            atom @ (Form::Symbol(_) | Form::Char(_) | Form::Number(_)) => Value::Atom(atom),
        }
    }

    /// The elements of this value for destructuring by a pipeline step: the
    /// list's own elements if this is already a [`Value::List`], otherwise
    /// a one-element slice holding the value itself ("wrapped as a
    /// one-element list if not already a list").
    #[must_use]
    pub fn destructured(&self) -> Vec<Value> {
        match self {
            Value::List(items) => items.clone(),
            other => vec![other.clone()],
        }
    }

    /// Deeply flattens nested lists into one flat list of non-list values.
    /// Non-list values flatten to a single-element list containing
    /// themselves.
    #[must_use]
    pub fn flatten(&self) -> Value {
        fn go(value: &Value, out: &mut Vec<Value>) {
            match value {
                Value::List(items) => {
                    for item in items {
                        go(item, out);
                    }
                }
                Value::Null => {}
                other => out.push(other.clone()),
            }
        }
        let mut out = Vec::new();
        go(self, &mut out);
        Value::List(out)
    }

    /// Flattens this value, then concatenates the character/string content
    /// of every leaf into one string. Numbers are rendered as characters
    /// when they fall in the Unicode scalar range, otherwise skipped.
    #[must_use]
    pub fn into_string(&self) -> String {
        let Value::List(leaves) = self.flatten() else {
            unreachable!("flatten always returns a Value::List")
        };
        let mut out = String::new();
        for leaf in leaves {
            match leaf {
                Value::Atom(Form::Char(c)) => out.push(c),
                Value::Atom(Form::Symbol(s)) => out.push_str(&s),
                Value::Str(s) => out.push_str(&s),
                Value::Atom(Form::Number(n)) => {
                    if let Ok(u) = u32::try_from(n) {
                        if let Some(c) = char::from_u32(u) {
                            out.push(c);
                        }
                    }
                }
                Value::Vector(_) | Value::List(_) | Value::Null => {}
            }
        }
        out
    }

    /// Flattens this value, then collects the numeric content of every leaf
    /// into one vector.
    #[must_use]
    pub fn into_vector(&self) -> Vec<i64> {
        let Value::List(leaves) = self.flatten() else {
            unreachable!("flatten always returns a Value::List")
        };
        let mut out = Vec::new();
        for leaf in leaves {
            match leaf {
                Value::Atom(Form::Number(n)) => out.push(n),
                Value::Atom(Form::Char(c)) => out.push(c as i64),
                Value::Vector(nums) => out.extend(nums),
                Value::Atom(Form::Symbol(_)) | Value::Str(_) | Value::List(_) | Value::Null => {}
            }
        }
        out
    }
}
