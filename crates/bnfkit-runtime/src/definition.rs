//! Parse table definition.

use std::fmt;

/// The trait for abstracting a generated LALR(1) parse table.
pub trait ParseTable {
    /// The number to identify the state of the automaton.
    type State: Copy;

    /// The number to identify the terminal/nonterminal symbols.
    type Symbol: Copy;

    /// The context value corresponding to the matched production rule.
    type Reduce: Copy;

    /// Return the initial state number.
    fn initial_state(&self) -> Self::State;

    /// Return the action corresponding to the specified state number and
    /// input symbol.
    ///
    /// A `None` is passed as the end of input.
    fn action(
        &self,
        current: Self::State,
        lookahead: Option<Self::Symbol>,
    ) -> ParseAction<Self::State, Self::Symbol, Self::Reduce>;

    /// Return the precedence of the specified symbol if it has been
    /// registered as an operator.
    fn precedence(&self, symbol: Self::Symbol) -> Option<Precedence>;
}

impl<T: ?Sized> ParseTable for &T
where
    T: ParseTable,
{
    type State = T::State;
    type Symbol = T::Symbol;
    type Reduce = T::Reduce;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn action(
        &self,
        current: Self::State,
        lookahead: Option<Self::Symbol>,
    ) -> ParseAction<Self::State, Self::Symbol, Self::Reduce> {
        (**self).action(current, lookahead)
    }

    fn precedence(&self, symbol: Self::Symbol) -> Option<Precedence> {
        (**self).precedence(symbol)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
#[non_exhaustive]
pub enum ParseAction<TState, TSymbol, TReduce> {
    /// Read the lookahead symbol and transition to the specified state.
    Shift(TState),

    /// Reduce by a production, popping `arity` symbols and pushing its left-hand side.
    Reduce(TReduce, TSymbol, usize),

    /// Either shift or reduce, decided at parse time by comparing the precedence
    /// of the lookahead operator with the nearest operator on the stack.
    Operator {
        shift: TState,
        reduce: TReduce,
        left: TSymbol,
        arity: usize,
    },

    Accept,

    Error(ParseActionError),
}

#[derive(Debug, Copy, Clone, PartialEq, thiserror::Error)]
pub enum ParseActionError {
    #[error("incorrect state")]
    IncorrectState,

    #[error("incorrect symbol")]
    IncorrectSymbol,

    #[error("non-associative operators cannot be chained")]
    NonAssociative,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct Precedence {
    pub priority: u16,
    pub assoc: Assoc,
}

impl Precedence {
    pub const fn new(priority: u16, assoc: Assoc) -> Self {
        Self { priority, assoc }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Assoc {
    Left,
    Right,
    Nonassoc,
}

impl fmt::Display for Assoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Nonassoc => write!(f, "nonassoc"),
        }
    }
}
