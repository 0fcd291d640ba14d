//! The three-outcome build monad (§4.2): a computation that either produces
//! an expression, is known to be irrelevant, or does not apply and should
//! let another strategy try.

use crate::intermediate_representation::Expr;

/// The outcome of one build strategy.
#[derive(Debug, Clone)]
pub enum Build {
    /// An expression was produced.
    Just(Expr),
    /// The result is known to be irrelevant; callers must propagate, not
    /// retry an alternative strategy.
    Irrelevant,
    /// This strategy does not apply; the caller should try an alternative.
    Err(String),
}

impl Build {
    /// The ordered-alternative combinator: `self`'s result if it is `Just`
    /// or `Irrelevant`, otherwise `other`'s result. `Just` beats
    /// `Irrelevant`; the first error survives if both fail.
    pub fn or_else(self, other: impl FnOnce() -> Build) -> Build {
        match self {
            Build::Err(first_err) => match other() {
                Build::Err(_) => Build::Err(first_err),
                resolved => resolved,
            },
            resolved => resolved,
        }
    }

    /// Transform a produced expression, leaving `Irrelevant`/`Err` untouched.
    pub fn map(self, f: impl FnOnce(Expr) -> Expr) -> Build {
        match self {
            Build::Just(expr) => Build::Just(f(expr)),
            other => other,
        }
    }

    /// Chain a dependent build, leaving `Irrelevant`/`Err` untouched.
    pub fn and_then(self, f: impl FnOnce(Expr) -> Build) -> Build {
        match self {
            Build::Just(expr) => f(expr),
            other => other,
        }
    }

    pub fn into_option(self) -> Option<Expr> {
        match self {
            Build::Just(expr) => Some(expr),
            Build::Irrelevant => Some(Expr::Irrelevant),
            Build::Err(_) => None,
        }
    }
}
