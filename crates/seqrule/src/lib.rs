//! A parsing-expression engine over nested sequences of atoms, strings, and
//! vectors.
//!
//! A grammar is a [`rules::RuleTable`] of named [`expr::RuleExpr`] bodies,
//! evaluated by [`matcher::match_expr`] against an input [`form::Form`]
//! under a [`control::Engine`] that tracks left recursion, tracing, and
//! dynamic bindings. [`driver::parse`] is the top-level entry point.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::multiple_crate_versions)]

/// The input data model: nested sequences of atoms, strings, and vectors.
pub mod form;

/// The tree cursor: an immutable-value position into a nested input.
pub mod cursor;

/// The tagged result value shared by every pipeline step.
pub mod value;

/// The rule-expression algebra: literals, wildcards, references, and
/// combinators.
pub mod expr;

/// Fatal errors that abort a parse outright.
pub mod error;

/// The per-rule result-processing pipeline.
pub mod pipeline;

/// The rule table: name-to-definition map.
pub mod rules;

/// Control services: left-recursion guard, tracing, dynamic bindings, and
/// the scoped rule table facility.
pub mod control;

/// The atom matcher and combinator interpreter, plus rule invocation.
pub mod matcher;

/// The top-level driver: seeds the cursor, invokes the start expression,
/// and decides whether the input was consumed as required.
pub mod driver;

/// Static validation of a rule table ahead of a parse.
pub mod validate;

pub use control::{Bindings, CallScope, Engine, StdoutTracer, Tracer};
pub use cursor::Cursor;
pub use driver::{parse, ParseOptions, ParseOutcome};
pub use error::EngineError;
pub use expr::{ArgExpr, Literal, RepBound, RuleExpr, Wildcard};
pub use form::Form;
pub use pipeline::PipelineStep;
pub use rules::{RuleDef, RuleTable};
pub use validate::{check, ValidationIssue};
pub use value::Value;
