//! The rule-expression algebra.
//!
//! A [`RuleExpr`] is the recursive value every rule body, every combinator
//! argument, and every sub-rule is built from: a self-describing syntax
//! graph whose leaves are terminals matched against a live
//! [`crate::form::Form`] input.

use crate::form::Form;

/// A terminal kind test that is not tied to one literal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wildcard {
    /// A single character.
    Char,
    /// An unsigned integer in `0..=255`.
    Byte,
    /// A quoted symbol, of any name.
    Symbol,
    /// A sub-sequence of kind [`Form::List`].
    List,
    /// A sub-sequence of kind [`Form::Vector`].
    Vector,
    /// A [`Form::Number`], of any value.
    Number,
    /// A sub-sequence of kind [`Form::Str`].
    String,
    /// Any item at all.
    AnyForm,
}

/// The bound on a `(rep k e)` combinator, derived from the surface `k`:
/// a bare number (exactly `n`), a one-element list (`0..=max`), or a
/// two-element list (`min..=max`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepBound {
    /// The minimum number of successful applications required.
    pub min: usize,
    /// The maximum number of successful applications allowed.
    pub max: usize,
}

impl RepBound {
    /// The bound for a bare count `n`: exactly `n` repetitions.
    #[must_use]
    pub fn exactly(n: usize) -> Self {
        RepBound { min: n, max: n }
    }

    /// The bound for a one-element list `(max)`: `0..=max` repetitions.
    #[must_use]
    pub fn up_to(max: usize) -> Self {
        RepBound { min: 0, max }
    }

    /// The bound for a two-element list `(min max)`.
    #[must_use]
    pub fn range(min: usize, max: usize) -> Self {
        RepBound { min, max }
    }
}

/// A value valid in rule-literal position: a character, a number, a
/// string, a vector, or a quoted symbol. Unlike [`Form`], this has no
/// variant for a nested list — a list is never itself a literal to match
/// verbatim, only something a combinator can descend into.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// A quoted symbol.
    Symbol(String),
    /// A single character.
    Char(char),
    /// A signed integer.
    Number(i64),
    /// A string, matched either whole or as a contiguous sub-sequence.
    Str(Vec<char>),
    /// A vector of numbers, matched either whole or as a contiguous
    /// sub-sequence.
    Vector(Vec<i64>),
}

impl Literal {
    /// Builds a symbol literal from anything that can be borrowed as `str`.
    #[must_use]
    pub fn symbol(s: impl AsRef<str>) -> Self {
        Literal::Symbol(s.as_ref().to_string())
    }

    /// Builds a string literal from anything that can be borrowed as `str`.
    #[must_use]
    pub fn string(s: impl AsRef<str>) -> Self {
        Literal::Str(s.as_ref().chars().collect())
    }

    /// The [`Form`] this literal denotes, for comparison against an item
    /// read from the input.
    #[must_use]
    pub fn to_form(&self) -> Form {
        match self {
            Literal::Symbol(s) => Form::Symbol(s.clone()),
            Literal::Char(c) => Form::Char(*c),
            Literal::Number(n) => Form::Number(*n),
            Literal::Str(chars) => Form::Str(chars.clone()),
            Literal::Vector(nums) => Form::Vector(nums.clone()),
        }
    }
}

impl From<char> for Literal {
    fn from(c: char) -> Self {
        Literal::Char(c)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Number(n)
    }
}

/// An argument expression in a rule call `(rule-name arg...)`.
///
/// Call arguments are restricted to what can be forwarded without
/// evaluation: a literal (quoted for primitives) or a bare reference to a
/// formal parameter already in scope at the call site.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgExpr {
    /// A literal value, passed through as-is.
    Literal(Form),
    /// A formal parameter name, forwarded to the callee with whatever value
    /// it is currently bound to.
    Forward(String),
}

/// A node in the rule-expression algebra.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleExpr {
    /// A literal atom, string, or vector to match verbatim.
    Literal(Literal),
    /// A typed wildcard.
    Wildcard(Wildcard),
    /// A reference to one of the enclosing rule's formal parameters;
    /// dispatches at match time by treating the parameter's bound value as
    /// a literal.
    Param(String),
    /// A reference to a dynamically-scoped binding (lexical or inherited);
    /// dispatches at match time by treating the binding's current value as
    /// a literal. Fails (does not match) if the name has no binding in any
    /// enclosing call frame.
    Binding(String),
    /// A reference to another rule, with argument expressions forwarded at
    /// call time.
    Call(String, Vec<ArgExpr>),
    /// Ordered choice `(or e...)`: first success wins.
    Or(Vec<RuleExpr>),
    /// Ordered sequence `(and e...)`: all must succeed in order.
    And(Vec<RuleExpr>),
    /// Unordered sequence `(and~ e...)`: all must succeed, in any order,
    /// each exactly once.
    AndUnordered(Vec<RuleExpr>),
    /// Negation `(not e)`: succeeds iff `e` fails; consumes one position.
    Not(Box<RuleExpr>),
    /// Zero-or-more `(* e)`.
    ZeroOrMore(Box<RuleExpr>),
    /// One-or-more `(+ e)`.
    OneOrMore(Box<RuleExpr>),
    /// Bounded repetition `(rep k e)`.
    Rep(RepBound, Box<RuleExpr>),
    /// Option `(? e)`: always succeeds.
    Optional(Box<RuleExpr>),
    /// Look-ahead predicate `(& e)`: non-consuming.
    Lookahead(Box<RuleExpr>),
    /// Look-behind-negation predicate `(! e)`: non-consuming.
    LookbehindNot(Box<RuleExpr>),
    /// Typed descent `(list e)`: the current item must be a `Form::List`
    /// whose whole contents match `e`.
    DescendList(Box<RuleExpr>),
    /// Typed descent `(string e)`: the current item must be a `Form::Str`
    /// whose whole contents match `e`.
    DescendString(Box<RuleExpr>),
    /// Typed descent `(vector e)`: the current item must be a
    /// `Form::Vector` whose whole contents match `e`.
    DescendVector(Box<RuleExpr>),
}

impl RuleExpr {
    /// A convenience constructor for a symbol literal.
    #[must_use]
    pub fn symbol(s: impl AsRef<str>) -> Self {
        RuleExpr::Literal(Literal::symbol(s))
    }

    /// A convenience constructor for a character literal.
    #[must_use]
    pub fn char(c: char) -> Self {
        RuleExpr::Literal(Literal::Char(c))
    }

    /// A convenience constructor for a number literal.
    #[must_use]
    pub fn number(n: i64) -> Self {
        RuleExpr::Literal(Literal::Number(n))
    }

    /// A convenience constructor for a string literal.
    #[must_use]
    pub fn string(s: impl AsRef<str>) -> Self {
        RuleExpr::Literal(Literal::string(s))
    }

    /// A convenience constructor for a vector literal.
    #[must_use]
    pub fn vector(nums: impl Into<Vec<i64>>) -> Self {
        RuleExpr::Literal(Literal::Vector(nums.into()))
    }

    /// A convenience constructor for `(or e...)`.
    #[must_use]
    pub fn or(exprs: impl IntoIterator<Item = RuleExpr>) -> Self {
        RuleExpr::Or(exprs.into_iter().collect())
    }

    /// A convenience constructor for `(and e...)`.
    #[must_use]
    pub fn and(exprs: impl IntoIterator<Item = RuleExpr>) -> Self {
        RuleExpr::And(exprs.into_iter().collect())
    }

    /// A convenience constructor for `(and~ e...)`.
    #[must_use]
    pub fn and_unordered(exprs: impl IntoIterator<Item = RuleExpr>) -> Self {
        RuleExpr::AndUnordered(exprs.into_iter().collect())
    }

    /// A convenience constructor for a zero-argument rule reference.
    #[must_use]
    pub fn call(name: impl Into<String>) -> Self {
        RuleExpr::Call(name.into(), Vec::new())
    }

    /// A convenience constructor for a rule reference with arguments.
    #[must_use]
    pub fn call_with(name: impl Into<String>, args: impl IntoIterator<Item = ArgExpr>) -> Self {
        RuleExpr::Call(name.into(), args.into_iter().collect())
    }

    /// Returns the canonical name of this expression's combinator kind, for
    /// trace output and diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            RuleExpr::Literal(_) => "literal",
            RuleExpr::Wildcard(_) => "wildcard",
            RuleExpr::Param(_) => "param",
            RuleExpr::Binding(_) => "binding",
            RuleExpr::Call(..) => "call",
            RuleExpr::Or(_) => "or",
            RuleExpr::And(_) => "and",
            RuleExpr::AndUnordered(_) => "and~",
            RuleExpr::Not(_) => "not",
            RuleExpr::ZeroOrMore(_) => "*",
            RuleExpr::OneOrMore(_) => "+",
            RuleExpr::Rep(..) => "rep",
            RuleExpr::Optional(_) => "?",
            RuleExpr::Lookahead(_) => "&",
            RuleExpr::LookbehindNot(_) => "!",
            RuleExpr::DescendList(_) => "list",
            RuleExpr::DescendString(_) => "string",
            RuleExpr::DescendVector(_) => "vector",
        }
    }
}
