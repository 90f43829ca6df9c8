//! Grammar types.

mod expr;

pub use self::expr::{prefer_reduce, prefer_shift, Expr, Hint, Operand};
pub use bnfkit_runtime::{Assoc, Precedence};

use crate::{
    data::ProductionID,
    scan::{LiteralMatcher, Matcher},
    types::{Map, TerminalSet},
};
use std::{borrow::Cow, fmt, marker::PhantomData};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TermID(u32);
impl TermID {
    /// Reserved terminal that means the end of input.
    pub const EOF: Self = Self(0);

    /// Reserved pseudo-terminal that denotes an explicitly empty alternative.
    pub const EMPTY: Self = Self(1);

    /// The augmented root, wrapping the user's root symbol.
    pub(crate) const ROOT: Self = Self(2);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u32 {
        self.0
    }

    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
impl fmt::Debug for TermID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::EOF => write!(f, "T#EOF"),
            Self::EMPTY => write!(f, "T#Empty"),
            Self::ROOT => write!(f, "N#Root"),
            _ => write!(f, "T#{:03}", self.0),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TermKind {
    /// A terminal matched by an external matcher.
    Terminal,
    /// A terminal whose input text is fixed.
    Literal,
    Nonterminal,
}

/// A grammar symbol.
#[derive(Debug)]
pub struct Term {
    pub(crate) id: TermID,
    pub(crate) kind: TermKind,
    pub(crate) name: String,
    pub(crate) key: String,
    pub(crate) alias: Option<String>,
    pub(crate) priority: i32,
    pub(crate) precedence: Option<Precedence>,
    pub(crate) matcher: Option<Box<dyn Matcher>>,
    pub(crate) rule: Option<Expr>,
    pub(crate) productions: Vec<ProductionID>,
    pub(crate) nullable: bool,
    pub(crate) firsts: TerminalSet,
}

impl Term {
    pub(crate) fn new(id: TermID, kind: TermKind, name: String, key: String) -> Self {
        Self {
            id,
            kind,
            name,
            key,
            alias: None,
            priority: 0,
            precedence: None,
            matcher: None,
            rule: None,
            productions: vec![],
            nullable: false,
            firsts: TerminalSet::default(),
        }
    }

    pub fn id(&self) -> TermID {
        self.id
    }

    pub fn kind(&self) -> TermKind {
        self.kind
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.kind, TermKind::Nonterminal)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The string used to look this term up in action tables.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The name shown to users in messages, preferring the alias.
    pub fn display_name(&self) -> &str {
        self.alias().unwrap_or(&self.name)
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn precedence(&self) -> Option<Precedence> {
        self.precedence
    }

    pub fn is_operator(&self) -> bool {
        self.precedence.is_some()
    }

    pub fn matcher(&self) -> Option<&dyn Matcher> {
        self.matcher.as_deref()
    }

    pub fn rule(&self) -> Option<&Expr> {
        self.rule.as_ref()
    }

    pub fn productions(&self) -> &[ProductionID] {
        &self.productions[..]
    }

    /// Whether this term derives the empty string. Computed on build.
    pub fn nullable(&self) -> bool {
        self.nullable
    }

    /// The terminals that may begin a derivation of this term. Computed on build.
    pub fn firsts(&self) -> &TerminalSet {
        &self.firsts
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Options applied while a grammar is defined and built.
#[derive(Debug, Clone, Default)]
pub struct Config {
    case_insensitive: bool,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            case_insensitive: false,
        }
    }

    /// Match literals regardless of letter case.
    pub fn case_insensitive(&mut self) -> &mut Self {
        self.case_insensitive = true;
        self
    }

    pub fn case_sensitive(&mut self) -> &mut Self {
        self.case_insensitive = false;
        self
    }

    /// Define a grammar with this configuration.
    pub fn define<F>(&self, f: F) -> Result<Grammar, GrammarDefError>
    where
        F: FnOnce(&mut GrammarDef<'_>) -> Result<(), GrammarDefError>,
    {
        let mut def = GrammarDef::new(self.case_insensitive);
        f(&mut def)?;
        Ok(def.end())
    }
}

/// A grammar definition, ready to be built into a parse automaton.
#[derive(Debug)]
#[non_exhaustive]
pub struct Grammar {
    pub(crate) case_insensitive: bool,
    pub(crate) terms: Vec<Term>,
    pub(crate) root: Option<TermID>,
}

impl Grammar {
    /// Define a grammar with the default configuration.
    pub fn define<F>(f: F) -> Result<Self, GrammarDefError>
    where
        F: FnOnce(&mut GrammarDef<'_>) -> Result<(), GrammarDefError>,
    {
        Config::new().define(f)
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms[..]
    }

    pub fn root(&self) -> Option<TermID> {
        self.root
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum Repetition {
    Optional,
    OneOrMore,
    ZeroOrMore,
}

/// The contextual values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef<'def> {
    case_insensitive: bool,
    terms: Vec<Term>,
    keys: Map<String, TermID>,
    literals: Map<String, TermID>,
    root: Option<TermID>,
    repetitions: Map<(Repetition, TermID, Option<TermID>), TermID>,
    _marker: PhantomData<&'def mut ()>,
}

impl<'def> GrammarDef<'def> {
    fn new(case_insensitive: bool) -> Self {
        let mut def = Self {
            case_insensitive,
            terms: vec![],
            keys: Map::default(),
            literals: Map::default(),
            root: None,
            repetitions: Map::default(),
            _marker: PhantomData,
        };
        for (kind, name) in [
            (TermKind::Terminal, "$eof"),
            (TermKind::Terminal, "$empty"),
            (TermKind::Nonterminal, "$root"),
        ] {
            let id = TermID::from_index(def.terms.len());
            def.keys.insert(name.to_owned(), id);
            def.terms
                .push(Term::new(id, kind, name.to_owned(), name.to_owned()));
        }
        def
    }

    fn normalize_key<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.case_insensitive {
            Cow::Owned(text.to_lowercase())
        } else {
            Cow::Borrowed(text)
        }
    }

    // Names and literal texts are looked up in separate namespaces.
    fn push(&mut self, kind: TermKind, name: String) -> Result<TermID, GrammarDefError> {
        if self.keys.contains_key(&name) {
            return Err(GrammarDefError::Duplicate { key: name });
        }
        let id = TermID::from_index(self.terms.len());
        self.keys.insert(name.clone(), id);
        self.terms.push(Term::new(id, kind, name.clone(), name));
        Ok(id)
    }

    fn term_mut(&mut self, id: TermID) -> Result<&mut Term, GrammarDefError> {
        self.terms
            .get_mut(id.index())
            .ok_or(GrammarDefError::UnknownTerm(id))
    }

    fn user_nonterminal(&mut self, id: TermID) -> Result<&mut Term, GrammarDefError> {
        let term = self.term_mut(id)?;
        if term.kind != TermKind::Nonterminal || id == TermID::ROOT {
            return Err(GrammarDefError::NotNonterminal {
                name: term.name.clone(),
            });
        }
        Ok(term)
    }

    fn user_terminal(&mut self, id: TermID) -> Result<&mut Term, GrammarDefError> {
        let term = self.term_mut(id)?;
        if !term.is_terminal() || id == TermID::EOF || id == TermID::EMPTY {
            return Err(GrammarDefError::NotTerminal {
                name: term.name.clone(),
            });
        }
        Ok(term)
    }

    /// Declare a terminal whose input text is fixed.
    ///
    /// Literals are deduplicated by text, so declaring the same text twice
    /// yields the same term. Literal texts live apart from symbol names, so
    /// a keyword may share its spelling with a nonterminal. The match priority defaults to the number of
    /// characters, giving longer literals precedence.
    pub fn literal(&mut self, text: &str) -> Result<TermID, GrammarDefError> {
        if text.is_empty() {
            return Err(GrammarDefError::EmptyLiteral);
        }

        let lookup_key = self.normalize_key(text).into_owned();
        if let Some(&id) = self.literals.get(&lookup_key) {
            return Ok(id);
        }

        let id = TermID::from_index(self.terms.len());
        self.literals.insert(lookup_key, id);
        let mut term = Term::new(id, TermKind::Literal, format!("'{}'", text), text.to_owned());
        term.priority = i32::try_from(text.chars().count()).unwrap_or(i32::MAX);
        term.matcher = Some(Box::new(LiteralMatcher::new(text)));
        self.terms.push(term);
        Ok(id)
    }

    /// Declare a named terminal matched by the given matcher.
    pub fn terminal<M>(&mut self, name: &str, matcher: M) -> Result<TermID, GrammarDefError>
    where
        M: Matcher + 'static,
    {
        if !verify_ident(name) {
            return Err(GrammarDefError::InvalidName { name: name.into() });
        }
        let id = self.push(TermKind::Terminal, name.into())?;
        self.terms[id.index()].matcher = Some(Box::new(matcher));
        Ok(id)
    }

    /// Declare a nonterminal symbol used in this grammar.
    pub fn nonterminal(&mut self, name: &str) -> Result<TermID, GrammarDefError> {
        if !verify_ident(name) {
            return Err(GrammarDefError::InvalidName { name: name.into() });
        }
        self.push(TermKind::Nonterminal, name.into())
    }

    /// Assign the rule of a nonterminal.
    ///
    /// Calling this again for the same nonterminal adds the alternatives
    /// of `expr` to the existing rule.
    pub fn rule(&mut self, nonterminal: TermID, expr: impl Into<Expr>) -> Result<(), GrammarDefError> {
        let expr = expr.into();
        self.verify_expr(&expr)?;
        let term = self.user_nonterminal(nonterminal)?;
        match &mut term.rule {
            Some(rule) => rule.alternatives.extend(expr.alternatives),
            None => term.rule = Some(expr),
        }
        Ok(())
    }

    fn verify_expr(&self, expr: &Expr) -> Result<(), GrammarDefError> {
        let mut stack = vec![expr];
        while let Some(expr) = stack.pop() {
            for operand in expr.operands() {
                match operand {
                    Operand::Term(id) if id.index() >= self.terms.len() || *id == TermID::ROOT => {
                        return Err(GrammarDefError::UnknownTerm(*id));
                    }
                    Operand::Expr(nested) => stack.push(nested),
                    _ => (),
                }
            }
        }
        Ok(())
    }

    /// Specify the root symbol of this grammar.
    pub fn root(&mut self, nonterminal: TermID) -> Result<(), GrammarDefError> {
        self.user_nonterminal(nonterminal)?;
        self.root.replace(nonterminal);
        Ok(())
    }

    /// Register terminals as operators sharing a precedence level.
    pub fn operators<I>(&mut self, priority: u16, assoc: Assoc, terms: I) -> Result<(), GrammarDefError>
    where
        I: IntoIterator<Item = TermID>,
    {
        for id in terms {
            self.user_terminal(id)?.precedence = Some(Precedence::new(priority, assoc));
        }
        Ok(())
    }

    /// Override the match priority of a terminal.
    pub fn priority(&mut self, terminal: TermID, priority: i32) -> Result<(), GrammarDefError> {
        self.user_terminal(terminal)?.priority = priority;
        Ok(())
    }

    /// Set the name shown for a term in messages.
    pub fn alias(&mut self, id: TermID, alias: &str) -> Result<(), GrammarDefError> {
        self.term_mut(id)?.alias = Some(alias.into());
        Ok(())
    }

    /// `elem?`
    pub fn optional(&mut self, elem: TermID) -> Result<TermID, GrammarDefError> {
        self.repetition(Repetition::Optional, elem, None)
    }

    /// `elem+`
    pub fn one_or_more(&mut self, elem: TermID) -> Result<TermID, GrammarDefError> {
        self.repetition(Repetition::OneOrMore, elem, None)
    }

    /// `elem*`
    pub fn zero_or_more(&mut self, elem: TermID) -> Result<TermID, GrammarDefError> {
        self.repetition(Repetition::ZeroOrMore, elem, None)
    }

    /// `elem (sep elem)*`
    pub fn one_or_more_sep(&mut self, elem: TermID, sep: TermID) -> Result<TermID, GrammarDefError> {
        self.repetition(Repetition::OneOrMore, elem, Some(sep))
    }

    /// `(elem (sep elem)*)?`
    pub fn zero_or_more_sep(&mut self, elem: TermID, sep: TermID) -> Result<TermID, GrammarDefError> {
        self.repetition(Repetition::ZeroOrMore, elem, Some(sep))
    }

    fn repetition(
        &mut self,
        kind: Repetition,
        elem: TermID,
        sep: Option<TermID>,
    ) -> Result<TermID, GrammarDefError> {
        if let Some(&id) = self.repetitions.get(&(kind, elem, sep)) {
            return Ok(id);
        }
        self.verify_expr(&Expr::seq(Some(elem).into_iter().chain(sep)))?;

        let elem_name = &self.terms[elem.index()].name;
        let name = match (kind, sep) {
            (Repetition::Optional, _) => format!("{}?", elem_name),
            (Repetition::OneOrMore, None) => format!("{}+", elem_name),
            (Repetition::ZeroOrMore, None) => format!("{}*", elem_name),
            (Repetition::OneOrMore, Some(sep)) => {
                format!("{}+[{}]", elem_name, self.terms[sep.index()].name)
            }
            (Repetition::ZeroOrMore, Some(sep)) => {
                format!("{}*[{}]", elem_name, self.terms[sep.index()].name)
            }
        };

        let plus = match (kind, sep) {
            (Repetition::ZeroOrMore, Some(sep)) => {
                Some(self.repetition(Repetition::OneOrMore, elem, Some(sep))?)
            }
            _ => None,
        };
        let id = self.push(TermKind::Nonterminal, name)?;
        let rule = match (kind, sep, plus) {
            (_, _, Some(plus)) => TermID::EMPTY.or(plus),
            (Repetition::Optional, _, _) => elem.or(TermID::EMPTY),
            (Repetition::OneOrMore, None, _) => id.then(elem).or(elem),
            (Repetition::OneOrMore, Some(sep), _) => id.then(sep).then(elem).or(elem),
            (Repetition::ZeroOrMore, _, None) => TermID::EMPTY.or(id.then(elem)),
        };
        self.terms[id.index()].rule = Some(rule);
        self.repetitions.insert((kind, elem, sep), id);
        Ok(id)
    }

    fn end(self) -> Grammar {
        Grammar {
            case_insensitive: self.case_insensitive,
            terms: self.terms,
            root: self.root,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarDefError {
    #[error("invalid name: `{}'", name)]
    InvalidName { name: String },

    #[error("literal text must not be empty")]
    EmptyLiteral,

    #[error("the key `{}' has already been used", key)]
    Duplicate { key: String },

    #[error("unknown term: {:?}", _0)]
    UnknownTerm(TermID),

    #[error("`{}' is not a nonterminal", name)]
    NotNonterminal { name: String },

    #[error("`{}' is not a terminal", name)]
    NotTerminal { name: String },
}

fn verify_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if is_ident_start(first) => chars.all(is_ident_continue),
        _ => false,
    }
}

pub(crate) fn is_ident_start(ch: char) -> bool {
    ch == '_' || unicode_ident::is_xid_start(ch)
}

pub(crate) fn is_ident_continue(ch: char) -> bool {
    unicode_ident::is_xid_continue(ch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::IdentifierMatcher;

    #[test]
    fn literals_are_deduplicated() {
        let grammar = Grammar::define(|g| {
            let a = g.literal("if")?;
            let b = g.literal("if")?;
            assert_eq!(a, b);
            assert_ne!(a, g.literal("IF")?);
            Ok(())
        })
        .unwrap();
        let term = &grammar.terms()[4];
        assert_eq!(term.name(), "'IF'");
        assert_eq!(term.key(), "IF");
        assert_eq!(term.priority(), 2);
    }

    #[test]
    fn case_insensitive_literals_share_a_term() {
        Config::new()
            .case_insensitive()
            .define(|g| {
                let a = g.literal("Begin")?;
                assert_eq!(a, g.literal("BEGIN")?);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Grammar::define(|g| {
            g.nonterminal("expr")?;
            g.nonterminal("expr")?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarDefError::Duplicate { key } if key == "expr"));

        let err = Grammar::define(|g| {
            g.terminal("ident", IdentifierMatcher::new())?;
            g.nonterminal("ident")?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarDefError::Duplicate { .. }));

        let err = Grammar::define(|g| {
            g.nonterminal("$eof")?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarDefError::InvalidName { .. }));
    }

    #[test]
    fn literals_do_not_clash_with_names() {
        let grammar = Grammar::define(|g| {
            let select = g.nonterminal("select")?;
            let kw_select = g.literal("select")?;
            assert_ne!(select, kw_select);
            assert_eq!(kw_select, g.literal("select")?);

            let ident = g.terminal("ident", IdentifierMatcher::new())?;
            let kw_ident = g.literal("ident")?;
            assert_ne!(ident, kw_ident);

            let kw_eof = g.literal("$eof")?;
            assert_ne!(kw_eof, TermID::EOF);
            Ok(())
        })
        .unwrap();
        assert!(grammar
            .terms()
            .iter()
            .filter(|t| t.key() == "select")
            .map(|t| t.kind())
            .eq([TermKind::Nonterminal, TermKind::Literal]));
    }

    #[test]
    fn names_must_be_identifiers() {
        for name in ["", "1st", "a-b", "x y"] {
            let err = Grammar::define(|g| {
                g.nonterminal(name)?;
                Ok(())
            })
            .unwrap_err();
            assert!(matches!(err, GrammarDefError::InvalidName { .. }), "{}", name);
        }
        Grammar::define(|g| {
            g.nonterminal("_private")?;
            g.nonterminal("式")?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn repetitions_are_cached() {
        Grammar::define(|g| {
            let x = g.literal("x")?;
            let comma = g.literal(",")?;

            let opt = g.optional(x)?;
            assert_eq!(opt, g.optional(x)?);
            let plus = g.one_or_more(x)?;
            assert_eq!(plus, g.one_or_more(x)?);
            assert_ne!(opt, plus);

            let list = g.zero_or_more_sep(x, comma)?;
            assert_eq!(list, g.zero_or_more_sep(x, comma)?);
            let sep_plus = g.one_or_more_sep(x, comma)?;
            assert_ne!(sep_plus, plus);

            let list_rule = g.terms[list.index()].rule().unwrap();
            assert_eq!(
                list_rule.alternatives(),
                &[vec![Operand::Term(TermID::EMPTY)], vec![Operand::Term(sep_plus)]]
            );
            assert_eq!(g.terms[sep_plus.index()].name(), "'x'+[',']");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn rule_targets_user_nonterminals_only() {
        let err = Grammar::define(|g| {
            let x = g.literal("x")?;
            g.rule(x, x)?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarDefError::NotNonterminal { .. }));

        let err = Grammar::define(|g| {
            let s = g.nonterminal("s")?;
            g.rule(s, TermID::from_raw(999))?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarDefError::UnknownTerm(..)));
    }

    #[test]
    fn repeated_rule_adds_alternatives() {
        let grammar = Grammar::define(|g| {
            let a = g.literal("a")?;
            let b = g.literal("b")?;
            let s = g.nonterminal("s")?;
            g.rule(s, a)?;
            g.rule(s, b.then(a))?;
            g.root(s)?;
            Ok(())
        })
        .unwrap();
        let s = grammar.root().unwrap();
        assert_eq!(grammar.terms()[s.index()].rule().unwrap().alternatives().len(), 2);
    }

    #[test]
    fn operators_require_terminals() {
        let err = Grammar::define(|g| {
            let e = g.nonterminal("e")?;
            g.operators(1, Assoc::Left, [e])?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarDefError::NotTerminal { .. }));
    }
}
