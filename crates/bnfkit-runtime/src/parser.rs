//! Parser.

use crate::definition::{Assoc, ParseAction, ParseActionError, ParseTable, Precedence};
use std::{cmp::Ordering, fmt, mem};

/// A trait for abstracting token symbols.
pub trait Token<TSym> {
    fn as_symbol(&self) -> TSym;
}

/// The shift/reduce parser driven by a parse table.
#[derive(Debug)]
pub struct Parser<TDef, TTok>
where
    TDef: ParseTable,
    TTok: Token<TDef::Symbol>,
{
    definition: TDef,
    state_stack: Vec<TDef::State>,
    item_stack: Vec<ParseItem<TTok, TDef::Symbol>>,
    parser_state: ParserState,
    peeked_token: Option<TTok>,
}

#[derive(Debug)]
enum ParserState {
    Reading,
    PendingGoto,
    Accepted,
}

enum Step<TState, TSymbol, TReduce> {
    Shift(TState),
    Reduce(TReduce, TSymbol, usize),
    Accept,
}

impl<TDef, TTok> Parser<TDef, TTok>
where
    TDef: ParseTable,
    TTok: Token<TDef::Symbol>,
{
    /// Create an instance of `Parser` using the specified parse table.
    pub fn new(definition: TDef) -> Self {
        let initial_state = definition.initial_state();
        Self {
            definition,
            state_stack: vec![initial_state],
            item_stack: vec![],
            parser_state: ParserState::Reading,
            peeked_token: None,
        }
    }

    /// Consume some tokens and drive the state machine
    /// until it matches a certain production rule.
    ///
    /// On `Reduce`, `args` holds the popped right-hand side items.
    pub fn next_event<I, E>(
        &mut self,
        tokens: &mut I,
        args: &mut Vec<ParseItem<TTok, TDef::Symbol>>,
    ) -> Result<ParseEvent<TDef>, ParseError<E>>
    where
        I: Iterator<Item = Result<TTok, E>>,
        E: fmt::Display,
    {
        if matches!(self.parser_state, ParserState::Accepted) {
            return Err(ParseError::AlreadyAccepted);
        }

        loop {
            let current = *self
                .state_stack
                .last()
                .ok_or_else(|| ParseError::EmptyNodeStack)?;

            let input = match self.parser_state {
                ParserState::PendingGoto => match self
                    .item_stack
                    .last()
                    .ok_or_else(|| ParseError::EmptyItemStack)?
                {
                    ParseItem::N(s) => Some(*s),
                    ParseItem::T(t) => Some(t.as_symbol()),
                    ParseItem::__Empty => return Err(ParseError::EmptyItemStack),
                },
                _ => {
                    if self.peeked_token.is_none() {
                        self.peeked_token = tokens.next().transpose().map_err(ParseError::Lexer)?;
                    }
                    self.peeked_token.as_ref().map(|t| t.as_symbol())
                }
            };

            let step = match self.definition.action(current, input) {
                ParseAction::Shift(n) => Step::Shift(n),
                ParseAction::Reduce(reduce, lhs, n) => Step::Reduce(reduce, lhs, n),
                ParseAction::Operator {
                    shift,
                    reduce,
                    left,
                    arity,
                } => {
                    let incoming = input.and_then(|s| self.definition.precedence(s));
                    match resolve_operator(self.previous_operator(), incoming) {
                        Ok(true) => Step::Shift(shift),
                        Ok(false) => Step::Reduce(reduce, left, arity),
                        Err(err) => return Err(ParseError::Rejected(err)),
                    }
                }
                ParseAction::Accept => Step::Accept,
                ParseAction::Error(err) => return Err(ParseError::Rejected(err)),
            };

            match step {
                Step::Shift(n) => {
                    if !matches!(self.parser_state, ParserState::PendingGoto) {
                        let t = self
                            .peeked_token
                            .take()
                            .ok_or_else(|| ParseError::UnexpectedEOI)?;
                        self.item_stack.push(ParseItem::T(t));
                    }

                    self.parser_state = ParserState::Reading;
                    self.state_stack.push(n);
                    continue;
                }

                Step::Reduce(reduce, lhs, n) => {
                    if self.state_stack.len() <= n {
                        return Err(ParseError::EmptyNodeStack);
                    }
                    args.resize_with(n, Default::default);
                    for i in 0..n {
                        self.state_stack.pop();
                        let arg = self
                            .item_stack
                            .pop()
                            .ok_or_else(|| ParseError::EmptyItemStack)?;
                        args[n - i - 1] = arg;
                    }

                    self.item_stack.push(ParseItem::N(lhs));
                    self.parser_state = ParserState::PendingGoto;

                    return Ok(ParseEvent::Reduce(reduce));
                }

                Step::Accept => {
                    let arg = self
                        .item_stack
                        .pop()
                        .ok_or_else(|| ParseError::EmptyItemStack)?;
                    args.clear();
                    args.push(arg);

                    self.parser_state = ParserState::Accepted;
                    return Ok(ParseEvent::Accept);
                }
            }
        }
    }

    /// The precedence of the operator nearest to the top of the stack.
    fn previous_operator(&self) -> Option<Precedence> {
        self.item_stack.iter().rev().find_map(|item| match item {
            ParseItem::T(t) => self.definition.precedence(t.as_symbol()),
            _ => None,
        })
    }
}

/// Returns `true` when the incoming operator should be shifted.
fn resolve_operator(
    previous: Option<Precedence>,
    incoming: Option<Precedence>,
) -> Result<bool, ParseActionError> {
    match (previous, incoming) {
        (None, _) => Ok(true),
        (Some(_), None) => Ok(false),
        (Some(prev), Some(curr)) => match Ord::cmp(&curr.priority, &prev.priority) {
            Ordering::Greater => Ok(true),
            Ordering::Less => Ok(false),
            Ordering::Equal => match curr.assoc {
                Assoc::Right => Ok(true),
                Assoc::Left => Ok(false),
                Assoc::Nonassoc => Err(ParseActionError::NonAssociative),
            },
        },
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum ParseItem<TTok, TSym> {
    T(TTok),
    N(TSym),

    #[doc(hidden)]
    __Empty,
}

impl<TTok, TSym> Default for ParseItem<TTok, TSym> {
    fn default() -> Self {
        Self::__Empty
    }
}

impl<TTok, TSym> ParseItem<TTok, TSym> {
    pub fn take(&mut self) -> Option<Self> {
        match mem::replace(self, Self::__Empty) {
            Self::__Empty => None,
            me => Some(me),
        }
    }
}

#[derive(Debug)]
pub enum ParseEvent<TDef>
where
    TDef: ParseTable,
{
    Reduce(TDef::Reduce),
    Accept,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError<L: fmt::Display> {
    #[error("from lexer: {}", _0)]
    Lexer(L),

    #[error("input rejected: {}", _0)]
    Rejected(ParseActionError),

    #[error("unexpected EOI")]
    UnexpectedEOI,

    #[error("empty node stack")]
    EmptyNodeStack,

    #[error("empty item stack")]
    EmptyItemStack,

    #[error("already accepted")]
    AlreadyAccepted,
}
