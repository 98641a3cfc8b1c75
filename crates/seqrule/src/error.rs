//! Fatal errors that abort a parse outright.
//!
//! Match failure is not represented here at all — it is a value
//! (`Ok(None)`), never an error. Only the conditions a parse cannot recover
//! from live in [`EngineError`]: a plain enum with hand-written `Display`
//! and `std::error::Error` impls rather than a derive.

/// A fatal error that aborts the whole parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A rule reference named a rule absent from the active rule table.
    UnknownRule(String),
    /// A rule-expression value was not a recognized atom, combinator, or
    /// reference (e.g. a call argument that is neither a literal nor a
    /// forwarded parameter).
    MalformedExpression(String),
    /// A `(rep k e)` bound was neither a single count, a 1-element max, nor
    /// a 2-element `(min max)` — or `min > max`.
    IllegalRepetitionRange(String),
    /// A rule called itself at the same cursor without an intervening
    /// advance.
    LeftRecursion(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::UnknownRule(name) => write!(f, "unknown rule: {name}"),
            EngineError::MalformedExpression(msg) => {
                write!(f, "malformed rule expression: {msg}")
            }
            EngineError::IllegalRepetitionRange(msg) => {
                write!(f, "illegal repetition range: {msg}")
            }
            EngineError::LeftRecursion(name) => {
                write!(f, "left recursion detected in rule: {name}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_are_human_readable() {
        assert_eq!(
            EngineError::UnknownRule("foo".into()).to_string(),
            "unknown rule: foo"
        );
        assert_eq!(
            EngineError::LeftRecursion("expr".into()).to_string(),
            "left recursion detected in rule: expr"
        );
    }
}
