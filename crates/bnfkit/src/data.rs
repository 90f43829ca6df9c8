//! The analysis workspace shared by every build stage.

use crate::{
    automaton::{LrItem, LrItemID, ParserState, PropagationGraph, StateID},
    grammar::{Grammar, Hint, Term, TermID},
    scan::ScannerLookup,
    types::{Map, TerminalSet},
    util::display_fn,
};
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProductionID(u32);
impl ProductionID {
    /// The production of the augmented root, `$root -> root`.
    pub const ROOT: Self = Self(0);

    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
impl fmt::Debug for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P#{:03}", self.0)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct LR0ItemID(u32);
impl LR0ItemID {
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
impl fmt::Debug for LR0ItemID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I#{:03}", self.0)
    }
}

/// One alternative of a nonterminal's rule.
#[derive(Debug)]
pub struct Production {
    pub(crate) id: ProductionID,
    pub(crate) lhs: TermID,
    pub(crate) rhs: Vec<TermID>,
    pub(crate) has_terminals: bool,
    pub(crate) items: Vec<LR0ItemID>,
}

impl Production {
    pub fn id(&self) -> ProductionID {
        self.id
    }

    /// Return the left-hand side of this production.
    pub fn lhs(&self) -> TermID {
        self.lhs
    }

    /// Return the right-hand side of this production.
    pub fn rhs(&self) -> &[TermID] {
        &self.rhs[..]
    }

    pub fn has_terminals(&self) -> bool {
        self.has_terminals
    }

    /// The LR(0) items of this production, one per dot position.
    pub fn items(&self) -> &[LR0ItemID] {
        &self.items[..]
    }

    // `"LHS -> R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g GrammarData) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{} ->", g.term(self.lhs))?;
            if self.rhs.is_empty() {
                return write!(f, " (empty)");
            }
            for term in &self.rhs {
                write!(f, " {}", g.term(*term))?;
            }
            Ok(())
        })
    }
}

/// A production paired with a dot position.
#[derive(Debug)]
pub struct LR0Item {
    pub(crate) id: LR0ItemID,
    pub(crate) production: ProductionID,
    pub(crate) position: usize,
    pub(crate) next: Option<TermID>,
    pub(crate) hints: Vec<Hint>,
    pub(crate) tail_firsts: TerminalSet,
    pub(crate) tail_nullable: bool,
}

impl LR0Item {
    pub fn id(&self) -> LR0ItemID {
        self.id
    }

    pub fn production(&self) -> ProductionID {
        self.production
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// The term right after the dot, if any.
    pub fn next(&self) -> Option<TermID> {
        self.next
    }

    pub fn is_completed(&self) -> bool {
        self.next.is_none()
    }

    pub fn is_kernel(&self) -> bool {
        self.position > 0 || self.production == ProductionID::ROOT
    }

    pub fn has_hint(&self, hint: Hint) -> bool {
        self.hints.contains(&hint)
    }

    /// FIRST set of the symbols after the next term.
    pub fn tail_firsts(&self) -> &TerminalSet {
        &self.tail_firsts
    }

    pub fn tail_nullable(&self) -> bool {
        self.tail_nullable
    }

    // `"LHS -> R1 . R2"`
    pub fn display<'g>(&'g self, g: &'g GrammarData) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let production = g.production(self.production);
            write!(f, "{} ->", g.term(production.lhs))?;
            for (i, term) in production.rhs.iter().enumerate() {
                if i == self.position() {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.term(*term))?;
            }
            if self.is_completed() {
                f.write_str(" .")?;
            }
            Ok(())
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GrammarErrorLevel {
    Warning,
    Conflict,
    Error,
}

impl fmt::Display for GrammarErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Conflict => f.write_str("conflict"),
            Self::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct GrammarError {
    pub level: GrammarErrorLevel,
    pub state: Option<StateID>,
    pub message: String,
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)
    }
}

/// The ordered list of problems found while building.
#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    entries: Vec<GrammarError>,
}

impl ErrorLog {
    pub(crate) fn add(&mut self, level: GrammarErrorLevel, state: Option<StateID>, message: String) {
        match level {
            GrammarErrorLevel::Warning | GrammarErrorLevel::Conflict => {
                tracing::debug!(%level, "{}", message)
            }
            GrammarErrorLevel::Error => tracing::warn!(%level, "{}", message),
        }
        self.entries.push(GrammarError {
            level,
            state,
            message,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &GrammarError> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.level == GrammarErrorLevel::Error)
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &GrammarError> + '_ {
        self.entries
            .iter()
            .filter(|e| e.level == GrammarErrorLevel::Conflict)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &GrammarError> + '_ {
        self.entries
            .iter()
            .filter(|e| e.level == GrammarErrorLevel::Warning)
    }
}

impl fmt::Display for ErrorLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

/// The analysed grammar together with its LALR(1) automaton.
///
/// Every build stage annotates this value in place. Once `build` returns
/// it is never mutated again.
#[derive(Debug)]
#[non_exhaustive]
pub struct GrammarData {
    pub(crate) case_insensitive: bool,
    pub(crate) terms: Vec<Term>,
    pub(crate) keys: Map<String, TermID>,
    pub(crate) literals: Map<String, TermID>,
    pub(crate) root: Option<TermID>,
    pub(crate) terminals: Vec<TermID>,
    pub(crate) nonterminals: Vec<TermID>,
    pub(crate) productions: Vec<Production>,
    pub(crate) lr0_items: Vec<LR0Item>,
    pub(crate) states: Vec<ParserState>,
    pub(crate) lr_items: Vec<LrItem>,
    pub(crate) propagation: PropagationGraph,
    pub(crate) initial_state: StateID,
    pub(crate) final_state: StateID,
    pub(crate) scanner_lookup: ScannerLookup,
    pub(crate) log: ErrorLog,
}

impl GrammarData {
    pub(crate) fn new(grammar: Grammar) -> Self {
        Self {
            case_insensitive: grammar.case_insensitive,
            terms: grammar.terms,
            keys: Map::default(),
            literals: Map::default(),
            root: grammar.root,
            terminals: vec![],
            nonterminals: vec![],
            productions: vec![],
            lr0_items: vec![],
            states: vec![],
            lr_items: vec![],
            propagation: PropagationGraph::default(),
            initial_state: StateID::from_index(0),
            final_state: StateID::from_index(0),
            scanner_lookup: ScannerLookup::default(),
            log: ErrorLog::default(),
        }
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn term(&self, id: TermID) -> &Term {
        &self.terms[id.index()]
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms[..]
    }

    /// Resolve a key, trying symbol names before literal texts.
    pub fn term_by_key(&self, key: &str) -> Option<&Term> {
        self.keys
            .get(key)
            .or_else(|| self.literals.get(key))
            .map(|id| self.term(*id))
    }

    /// The literal terminal spelled `text`, folding case if the grammar
    /// is case-insensitive.
    pub fn literal(&self, text: &str) -> Option<&Term> {
        let id = if self.case_insensitive {
            self.literals.get(&text.to_lowercase())
        } else {
            self.literals.get(text)
        };
        id.map(|id| self.term(*id))
    }

    /// The root symbol given by the grammar author.
    pub fn root(&self) -> Option<TermID> {
        self.root
    }

    pub fn augmented_root(&self) -> TermID {
        TermID::ROOT
    }

    /// Terminals reachable from the root, starting with `$eof`.
    pub fn terminals(&self) -> impl Iterator<Item = &Term> + '_ {
        self.terminals.iter().map(|id| self.term(*id))
    }

    /// Nonterminals reachable from the root, starting with the augmented root.
    pub fn nonterminals(&self) -> impl Iterator<Item = &Term> + '_ {
        self.nonterminals.iter().map(|id| self.term(*id))
    }

    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[id.index()]
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions[..]
    }

    pub fn lr0_item(&self, id: LR0ItemID) -> &LR0Item {
        &self.lr0_items[id.index()]
    }

    pub fn lr0_items(&self) -> &[LR0Item] {
        &self.lr0_items[..]
    }

    pub fn state(&self, id: StateID) -> &ParserState {
        &self.states[id.index()]
    }

    pub fn states(&self) -> &[ParserState] {
        &self.states[..]
    }

    pub fn lr_item(&self, id: LrItemID) -> &LrItem {
        &self.lr_items[id.index()]
    }

    pub fn propagation(&self) -> &PropagationGraph {
        &self.propagation
    }

    pub fn initial_state(&self) -> StateID {
        self.initial_state
    }

    pub fn final_state(&self) -> StateID {
        self.final_state
    }

    pub fn scanner_lookup(&self) -> &ScannerLookup {
        &self.scanner_lookup
    }

    pub fn log(&self) -> &ErrorLog {
        &self.log
    }

    /// Render a terminal set as its keys, in term order.
    pub fn keys<'g>(&'g self, set: &TerminalSet) -> Vec<&'g str> {
        set.iter().map(|id| self.term(id).key()).collect()
    }
}
