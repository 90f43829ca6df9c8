//! BNF expressions and the combinators that build them.

use super::TermID;

/// A position marker that steers conflict resolution.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Hint {
    /// Shift at this position when a shift-reduce conflict arises.
    PreferShift,
    /// Prefer the production this hint completes.
    PreferReduce,
}

/// Make a hint operand that prefers shifting at its position.
pub fn prefer_shift() -> Hint {
    Hint::PreferShift
}

/// Make a hint operand that prefers reducing by the enclosing production.
pub fn prefer_reduce() -> Hint {
    Hint::PreferReduce
}

/// An element of a sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Term(TermID),
    Hint(Hint),
    /// A nested expression, lifted into an anonymous nonterminal on build.
    Expr(Box<Expr>),
}

impl From<TermID> for Operand {
    fn from(id: TermID) -> Self {
        Self::Term(id)
    }
}

impl From<Hint> for Operand {
    fn from(hint: Hint) -> Self {
        Self::Hint(hint)
    }
}

impl From<Expr> for Operand {
    fn from(mut expr: Expr) -> Self {
        if expr.alternatives.len() == 1 && expr.alternatives[0].len() == 1 {
            if let Some(operand) = expr.alternatives[0].pop() {
                return operand;
            }
        }
        Self::Expr(Box::new(expr))
    }
}

/// A BNF expression: a list of alternatives, each one a sequence of operands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expr {
    pub(crate) alternatives: Vec<Vec<Operand>>,
}

impl From<TermID> for Expr {
    fn from(id: TermID) -> Self {
        Self::from(Operand::Term(id))
    }
}

impl From<Hint> for Expr {
    fn from(hint: Hint) -> Self {
        Self::from(Operand::Hint(hint))
    }
}

impl From<Operand> for Expr {
    fn from(operand: Operand) -> Self {
        match operand {
            Operand::Expr(expr) => *expr,
            operand => Self {
                alternatives: vec![vec![operand]],
            },
        }
    }
}

impl Expr {
    /// Build a single sequence from the given operands.
    pub fn seq<I>(operands: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        Self {
            alternatives: vec![operands.into_iter().map(Into::into).collect()],
        }
    }

    /// Concatenation.
    ///
    /// A single-sequence expression is extended in place, so chains of
    /// `then` stay flat. Expressions with several alternatives are nested.
    pub fn then(mut self, next: impl Into<Operand>) -> Self {
        if self.alternatives.len() == 1 {
            self.alternatives[0].push(next.into());
            self
        } else {
            Self {
                alternatives: vec![vec![Operand::Expr(Box::new(self)), next.into()]],
            }
        }
    }

    /// Alternation.
    ///
    /// A single-sequence right operand contributes its sequence directly as
    /// a new alternative; anything else becomes one nested alternative.
    pub fn or(mut self, other: impl Into<Expr>) -> Self {
        let mut other = other.into();
        if other.alternatives.len() == 1 {
            self.alternatives.append(&mut other.alternatives);
        } else {
            self.alternatives.push(vec![Operand::Expr(Box::new(other))]);
        }
        self
    }

    pub fn alternatives(&self) -> &[Vec<Operand>] {
        &self.alternatives[..]
    }

    pub(crate) fn operands(&self) -> impl Iterator<Item = &Operand> + '_ {
        self.alternatives.iter().flatten()
    }
}

impl TermID {
    /// Start a sequence with this term. See [`Expr::then`].
    pub fn then(self, next: impl Into<Operand>) -> Expr {
        Expr::from(self).then(next)
    }

    /// Start an alternation with this term. See [`Expr::or`].
    pub fn or(self, other: impl Into<Expr>) -> Expr {
        Expr::from(self).or(other)
    }
}
