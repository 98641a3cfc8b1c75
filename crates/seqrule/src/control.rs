//! Control services: the left-recursion guard, rule tracing, dynamically
//! scoped bindings, and the scoped rule table facility.
//!
//! These are bundled into one [`Engine`] type that [`crate::matcher`] and
//! [`crate::driver`] thread through a parse, carrying the mutable runtime
//! state a rule invocation needs beyond the static rule table itself.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::cursor::Cursor;
use crate::error::EngineError;
use crate::form::Form;
use crate::rules::{RuleDef, RuleTable};
use crate::value::Value;

/// A sink for rule-trace output. The default, [`StdoutTracer`], prints
/// directly; a host embedding the engine can substitute its own to capture
/// or redirect trace text.
pub trait Tracer {
    /// Called on entry to a traced rule, before its body runs.
    fn on_enter(&mut self, depth: usize, name: &str, cursor: &Cursor);
    /// Called after a traced rule's body succeeds.
    fn on_exit_success(&mut self, depth: usize, name: &str, entry: &Cursor, exit: &Cursor, value: &Value);
    /// Called after a traced rule's body fails.
    fn on_exit_failure(&mut self, depth: usize, name: &str);
}

/// The default [`Tracer`]: writes one line per event to stdout, indented by
/// call depth.
#[derive(Debug, Default)]
pub struct StdoutTracer;

impl Tracer for StdoutTracer {
    fn on_enter(&mut self, depth: usize, name: &str, cursor: &Cursor) {
        println!("{depth}: {name} {cursor:?}?");
    }

    fn on_exit_success(&mut self, depth: usize, name: &str, entry: &Cursor, exit: &Cursor, value: &Value) {
        println!("{depth}: {name} {entry:?}\u{2192}{exit:?} \u{2192} {value:?}");
    }

    fn on_exit_failure(&mut self, depth: usize, name: &str) {
        println!("{depth}: {name} -|");
    }
}

/// A stack of dynamic-binding frames. Each rule call pushes one frame
/// holding fresh cells for its lexical bindings; a rule's inherited
/// bindings are read/written by searching outward through enclosing frames
/// for a cell of the same name, giving dynamic rather than lexical scoping.
#[derive(Debug, Default)]
pub struct Bindings {
    frames: Vec<HashMap<String, Rc<RefCell<Form>>>>,
}

impl Bindings {
    pub(crate) fn push_frame(&mut self, lexical: &[(String, Form)]) {
        let mut frame = HashMap::with_capacity(lexical.len());
        for (name, init) in lexical {
            frame.insert(name.clone(), Rc::new(RefCell::new(init.clone())));
        }
        self.frames.push(frame);
    }

    pub(crate) fn pop_frame(&mut self) {
        self.frames.pop();
    }

    fn cell(&self, name: &str) -> Option<&Rc<RefCell<Form>>> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Reads the current value of binding `name`, searching outward from
    /// the innermost active frame. `None` if no enclosing frame defines it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Form> {
        self.cell(name).map(|cell| cell.borrow().clone())
    }

    /// Writes `value` into the nearest enclosing frame defining `name`.
    /// Returns `false` (a no-op) if no enclosing frame defines it — an
    /// inherited binding with no defining caller.
    pub fn set(&self, name: &str, value: Form) -> bool {
        match self.cell(name) {
            Some(cell) => {
                *cell.borrow_mut() = value;
                true
            }
            None => false,
        }
    }
}

/// Per-rule call-position stack used by the left-recursion guard: a rule
/// re-entering itself while the top of its stack still equals the entry
/// cursor has looped without consuming input.
type CallStack = HashMap<String, Vec<Cursor>>;

/// The mutable state threaded through one parse: the active rule table,
/// the left-recursion guard, the trace table and depth, and the dynamic
/// bindings stack.
pub struct Engine {
    rules: RuleTable,
    trace_levels: HashMap<String, u8>,
    active_calls: CallStack,
    bindings: Bindings,
    param_frames: Vec<HashMap<String, Form>>,
    trace_depth: usize,
    recursive_trace: bool,
    tracer: Box<dyn Tracer>,
}

impl Engine {
    /// A fresh engine over an empty rule table, tracing to stdout.
    #[must_use]
    pub fn new() -> Self {
        Engine {
            rules: RuleTable::new(),
            trace_levels: HashMap::new(),
            active_calls: HashMap::new(),
            bindings: Bindings::default(),
            param_frames: Vec::new(),
            trace_depth: 0,
            recursive_trace: false,
            tracer: Box::new(StdoutTracer),
        }
    }

    /// An engine over an empty rule table, tracing through a custom sink.
    #[must_use]
    pub fn with_tracer(tracer: Box<dyn Tracer>) -> Self {
        Engine {
            tracer,
            ..Engine::new()
        }
    }

    /// The active rule table.
    #[must_use]
    pub fn rule_table(&self) -> &RuleTable {
        &self.rules
    }

    /// The dynamic bindings stack, for use by pipeline closures that read
    /// or write inherited bindings.
    #[must_use]
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Registers `rule` in the active rule table.
    pub fn define_rule(&mut self, rule: RuleDef) {
        log::debug!("defining rule {}", rule.name);
        self.rules.define(rule);
    }

    /// Sets the trace level for `name`: `1` traces only this rule, `2`
    /// traces this rule and every rule reached while it is active.
    pub fn trace_rule(&mut self, name: impl Into<String>, recursive: bool) {
        self.trace_levels
            .insert(name.into(), if recursive { 2 } else { 1 });
    }

    /// Clears tracing for `name`.
    pub fn untrace_rule(&mut self, name: &str) {
        self.trace_levels.remove(name);
    }

    /// Executes `body` with fresh, empty rule and trace tables, restoring
    /// the prior ones afterward — so grammar definitions inside `body`
    /// never pollute the enclosing scope.
    pub fn with_local_rules<R>(&mut self, body: impl FnOnce(&mut Engine) -> R) -> R {
        let saved_rules = std::mem::take(&mut self.rules);
        let saved_trace = std::mem::take(&mut self.trace_levels);
        log::debug!("entering scoped rule table");
        let result = body(self);
        self.rules = saved_rules;
        self.trace_levels = saved_trace;
        log::debug!("restored enclosing rule table");
        result
    }

    /// `true` if tracing is currently active for `name`: either it has its
    /// own trace level, or an enclosing level-2 trace has propagated down.
    fn should_trace(&self, name: &str) -> bool {
        self.recursive_trace || self.trace_levels.get(name).copied().unwrap_or(0) > 0
    }

    /// Pushes a fresh frame of lexical bindings and a formal-parameter
    /// frame, engages the left-recursion guard and trace hooks, and
    /// returns a [`CallScope`] that undoes all of it on drop.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LeftRecursion`] if `name` is already active
    /// at `cursor`.
    pub fn enter_call<'e>(
        &'e mut self,
        name: &str,
        cursor: &Cursor,
        lexical_bindings: &[(String, Form)],
        params: HashMap<String, Form>,
    ) -> Result<CallScope<'e>, EngineError> {
        {
            let stack = self.active_calls.entry(name.to_string()).or_default();
            if stack.last() == Some(cursor) {
                return Err(EngineError::LeftRecursion(name.to_string()));
            }
            stack.push(cursor.clone());
        }

        let traced = self.should_trace(name);
        if traced {
            self.tracer.on_enter(self.trace_depth, name, cursor);
        }

        let prev_recursive_trace = self.recursive_trace;
        if self.trace_levels.get(name).copied() == Some(2) {
            self.recursive_trace = true;
        }
        self.trace_depth += 1;
        self.bindings.push_frame(lexical_bindings);
        self.param_frames.push(params);

        Ok(CallScope {
            engine: self,
            name: name.to_string(),
            entry_cursor: cursor.clone(),
            prev_recursive_trace,
            traced,
        })
    }

    /// The value bound to formal parameter `name` in the currently
    /// executing rule's call frame, if any.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<Form> {
        self.param_frames.last().and_then(|frame| frame.get(name)).cloned()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

/// An in-progress rule call, opened by [`Engine::enter_call`]. Exactly one
/// of [`CallScope::exit_success`] or [`CallScope::exit_failure`] must be
/// called to report the outcome for tracing; either way, the left-recursion
/// stack entry, binding frame, parameter frame, and dynamic trace state are
/// released on drop regardless of which exit path is taken (including an
/// early return via `?`).
pub struct CallScope<'e> {
    engine: &'e mut Engine,
    name: String,
    entry_cursor: Cursor,
    prev_recursive_trace: bool,
    traced: bool,
}

impl<'e> CallScope<'e> {
    /// The engine, reborrowed for use while this call is open.
    pub fn engine(&mut self) -> &mut Engine {
        &mut *self.engine
    }

    /// Reports a successful exit at `exit_cursor` with result `value`.
    pub fn exit_success(mut self, exit_cursor: &Cursor, value: &Value) {
        if self.traced {
            self.engine.tracer.on_exit_success(
                self.engine.trace_depth - 1,
                &self.name,
                &self.entry_cursor,
                exit_cursor,
                value,
            );
        }
    }

    /// Reports a failed exit.
    pub fn exit_failure(mut self) {
        if self.traced {
            self.engine
                .tracer
                .on_exit_failure(self.engine.trace_depth - 1, &self.name);
        }
    }
}

impl<'e> Drop for CallScope<'e> {
    fn drop(&mut self) {
        if let Some(stack) = self.engine.active_calls.get_mut(&self.name) {
            stack.pop();
        }
        self.engine.trace_depth -= 1;
        self.engine.recursive_trace = self.prev_recursive_trace;
        self.engine.bindings.pop_frame();
        self.engine.param_frames.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::RuleExpr;

    #[test]
    fn left_recursion_at_unchanged_cursor_is_rejected() {
        let mut engine = Engine::new();
        let cursor = Cursor::at(0);
        let scope = engine
            .enter_call("r", &cursor, &[], HashMap::new())
            .unwrap();
        let err = scope.engine().enter_call("r", &cursor, &[], HashMap::new());
        assert!(matches!(err, Err(EngineError::LeftRecursion(_))));
        scope.exit_failure();
    }

    #[test]
    fn advancing_the_cursor_permits_reentry() {
        let mut engine = Engine::new();
        let cursor = Cursor::at(0);
        let scope = engine
            .enter_call("r", &cursor, &[], HashMap::new())
            .unwrap();
        let advanced = cursor.step(1);
        let nested = scope
            .engine()
            .enter_call("r", &advanced, &[], HashMap::new());
        assert!(nested.is_ok());
        nested.unwrap().exit_success(&advanced, &Value::Null);
        scope.exit_success(&advanced, &Value::Null);
    }

    #[test]
    fn lexical_bindings_are_fresh_per_call() {
        let mut engine = Engine::new();
        let cursor = Cursor::at(0);
        let mut scope = engine
            .enter_call(
                "r",
                &cursor,
                &[("count".to_string(), Form::Number(0))],
                HashMap::new(),
            )
            .unwrap();
        assert_eq!(scope.engine().bindings().get("count"), Some(Form::Number(0)));
        scope.engine().bindings().set("count", Form::Number(1));
        assert_eq!(scope.engine().bindings().get("count"), Some(Form::Number(1)));
        scope.exit_success(&cursor, &Value::Null);
        assert_eq!(engine.bindings().get("count"), None);
    }

    #[test]
    fn scoped_rule_table_does_not_leak() {
        let mut engine = Engine::new();
        engine.define_rule(RuleDef::new("global", RuleExpr::char('a')));
        engine.with_local_rules(|inner| {
            assert!(!inner.rule_table().contains("global"));
            inner.define_rule(RuleDef::new("local", RuleExpr::char('b')));
        });
        assert!(engine.rule_table().contains("global"));
        assert!(!engine.rule_table().contains("local"));
    }
}
