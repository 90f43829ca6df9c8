//! Parser states, LR items and action records of the LALR(1) automaton.

use crate::{
    data::{GrammarData, LR0ItemID, ProductionID},
    grammar::TermID,
    types::{Map, TerminalSet},
    util::display_fn,
};
use bnfkit_runtime::{ParseAction, ParseActionError, ParseTable, Precedence};
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateID(u32);
impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}
impl StateID {
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct LrItemID(u32);
impl fmt::Debug for LrItemID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L#{:03}", self.0)
    }
}
impl LrItemID {
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// An LR(0) item placed in a state, with its lookaheads.
#[derive(Debug)]
pub struct LrItem {
    pub(crate) id: LrItemID,
    pub(crate) state: StateID,
    pub(crate) core: LR0ItemID,
    pub(crate) lookaheads: TerminalSet,
}

impl LrItem {
    pub fn id(&self) -> LrItemID {
        self.id
    }

    pub fn state(&self) -> StateID {
        self.state
    }

    pub fn core(&self) -> LR0ItemID {
        self.core
    }

    pub fn lookaheads(&self) -> &TerminalSet {
        &self.lookaheads
    }
}

/// Edges along which lookaheads are copied, indexed by source item.
#[derive(Debug, Default)]
pub struct PropagationGraph {
    targets: Vec<Vec<LrItemID>>,
}

impl PropagationGraph {
    pub(crate) fn add(&mut self, from: LrItemID, to: LrItemID) {
        if self.targets.len() <= from.index() {
            self.targets.resize_with(from.index() + 1, Vec::new);
        }
        let targets = &mut self.targets[from.index()];
        if !targets.contains(&to) {
            targets.push(to);
        }
    }

    pub fn targets(&self, from: LrItemID) -> &[LrItemID] {
        self.targets
            .get(from.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.targets.iter().map(Vec::len).sum()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Shift,
    Reduce,
    /// Shift or reduce, decided at parse time by operator precedence.
    Operator,
    Accept,
}

/// The action taken in a state for one input key.
#[derive(Debug, Clone)]
pub struct ActionRecord {
    pub(crate) kind: ActionKind,
    pub(crate) target: Option<StateID>,
    pub(crate) reduces: Vec<ProductionID>,
}

impl ActionRecord {
    pub(crate) fn shift(target: StateID) -> Self {
        Self {
            kind: ActionKind::Shift,
            target: Some(target),
            reduces: vec![],
        }
    }

    pub(crate) fn reduce() -> Self {
        Self {
            kind: ActionKind::Reduce,
            target: None,
            reduces: vec![],
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn target(&self) -> Option<StateID> {
        self.target
    }

    /// Reduce candidates, the chosen one first.
    pub fn reduces(&self) -> &[ProductionID] {
        &self.reduces[..]
    }
}

/// A set of LR items sharing one kernel.
#[derive(Debug)]
pub struct ParserState {
    pub(crate) id: StateID,
    pub(crate) kernel: Vec<LR0ItemID>,
    pub(crate) items: Vec<LrItemID>,
    pub(crate) actions: Map<TermID, ActionRecord>,
}

impl ParserState {
    pub fn id(&self) -> StateID {
        self.id
    }

    /// The sorted kernel item IDs identifying this state.
    pub fn kernel(&self) -> &[LR0ItemID] {
        &self.kernel[..]
    }

    pub fn items(&self) -> &[LrItemID] {
        &self.items[..]
    }

    pub fn actions(&self) -> impl Iterator<Item = (TermID, &ActionRecord)> + '_ {
        self.actions.iter().map(|(key, record)| (*key, record))
    }

    pub fn action(&self, key: TermID) -> Option<&ActionRecord> {
        self.actions.get(&key)
    }

    pub fn display<'g>(&'g self, g: &'g GrammarData) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            writeln!(f, "## {:?}", self.id)?;
            for item in &self.items {
                let item = g.lr_item(*item);
                writeln!(
                    f,
                    "- {} [{}]",
                    g.lr0_item(item.core).display(g),
                    g.keys(&item.lookaheads).join(" ")
                )?;
            }
            for (key, record) in &self.actions {
                write!(f, "  {} => {:?}", g.term(*key).key(), record.kind)?;
                if let Some(target) = record.target {
                    write!(f, " {:?}", target)?;
                }
                for reduce in &record.reduces {
                    write!(f, " {:?}", reduce)?;
                }
                writeln!(f)?;
            }
            Ok(())
        })
    }
}

impl ParseTable for GrammarData {
    type State = StateID;
    type Symbol = TermID;
    type Reduce = ProductionID;

    fn initial_state(&self) -> Self::State {
        self.initial_state
    }

    fn action(
        &self,
        current: Self::State,
        lookahead: Option<Self::Symbol>,
    ) -> ParseAction<Self::State, Self::Symbol, Self::Reduce> {
        let state = match self.states.get(current.index()) {
            Some(state) => state,
            None => return ParseAction::Error(ParseActionError::IncorrectState),
        };
        let record = match state.actions.get(&lookahead.unwrap_or(TermID::EOF)) {
            Some(record) => record,
            None => return ParseAction::Error(ParseActionError::IncorrectSymbol),
        };

        let reduce = record
            .reduces
            .first()
            .map(|id| self.production(*id))
            .map(|p| (p.id, p.lhs, p.rhs.len()));

        match (record.kind, record.target, reduce) {
            (ActionKind::Accept, ..) => ParseAction::Accept,
            (ActionKind::Shift, Some(target), _) => ParseAction::Shift(target),
            (ActionKind::Reduce, _, Some((production, lhs, arity))) => {
                ParseAction::Reduce(production, lhs, arity)
            }
            (ActionKind::Operator, Some(shift), Some((reduce, left, arity))) => {
                ParseAction::Operator {
                    shift,
                    reduce,
                    left,
                    arity,
                }
            }
            _ => ParseAction::Error(ParseActionError::IncorrectState),
        }
    }

    fn precedence(&self, symbol: Self::Symbol) -> Option<Precedence> {
        self.terms.get(symbol.index())?.precedence
    }
}
