//! Grammar definitions shared by the integration tests.

#![allow(dead_code)]

use bnfkit::{
    grammar::{prefer_shift, Assoc, GrammarDef, GrammarDefError, TermID},
    runtime::{ParseEvent, ParseItem, Parser, Token},
    scan::{self, IdentifierMatcher, Matcher},
    GrammarData,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Decimal integer literals.
#[derive(Debug, Default)]
pub struct NumberMatcher;

impl Matcher for NumberMatcher {
    fn try_match(&self, input: &str, position: usize) -> Option<scan::Token> {
        let rest = input.get(position..)?;
        let end = rest
            .find(|ch: char| !ch.is_ascii_digit())
            .unwrap_or(rest.len());
        (end > 0).then(|| scan::Token::new(&rest[..end]).with_value(&rest[..end]))
    }

    fn start_symbols(&self) -> Option<Vec<String>> {
        Some(('0'..='9').map(String::from).collect())
    }
}

// E -> E op E | '(' E ')' | num, with operator precedence.
pub fn arithmetic(g: &mut GrammarDef<'_>) -> Result<(), GrammarDefError> {
    let lt = g.literal("<")?;
    let plus = g.literal("+")?;
    let minus = g.literal("-")?;
    let star = g.literal("*")?;
    let slash = g.literal("/")?;
    let caret = g.literal("^")?;
    let lparen = g.literal("(")?;
    let rparen = g.literal(")")?;
    let num = g.terminal("num", NumberMatcher)?;

    g.operators(0, Assoc::Nonassoc, [lt])?;
    g.operators(1, Assoc::Left, [plus, minus])?;
    g.operators(2, Assoc::Left, [star, slash])?;
    g.operators(3, Assoc::Right, [caret])?;

    let expr = g.nonterminal("expr")?;
    g.root(expr)?;
    g.rule(
        expr,
        expr.then(lt)
            .then(expr)
            .or(expr.then(plus).then(expr))
            .or(expr.then(minus).then(expr))
            .or(expr.then(star).then(expr))
            .or(expr.then(slash).then(expr))
            .or(expr.then(caret).then(expr))
            .or(lparen.then(expr).then(rparen))
            .or(num),
    )?;
    Ok(())
}

// The same language as `arithmetic` without `<` and `^`, layered by hand.
pub fn layered_expression(g: &mut GrammarDef<'_>) -> Result<(), GrammarDefError> {
    let plus = g.literal("+")?;
    let minus = g.literal("-")?;
    let star = g.literal("*")?;
    let slash = g.literal("/")?;
    let lparen = g.literal("(")?;
    let rparen = g.literal(")")?;
    let num = g.terminal("num", NumberMatcher)?;

    let expr = g.nonterminal("EXPR")?;
    let factor = g.nonterminal("FACTOR")?;
    let term = g.nonterminal("TERM")?;
    g.root(expr)?;

    g.rule(
        expr,
        expr.then(plus)
            .then(factor) // expr '+' factor
            .or(expr.then(minus).then(factor)) // expr '-' factor
            .or(factor), // factor
    )?;
    g.rule(
        factor,
        factor
            .then(star)
            .then(term) // factor '*' term
            .or(factor.then(slash).then(term)) // factor '/' term
            .or(term), // term
    )?;
    g.rule(
        term,
        num // num
            .or(lparen.then(expr).then(rparen)), // '(' expr ')'
    )?;
    Ok(())
}

// S -> '(' S ')' | ε
pub fn parens(g: &mut GrammarDef<'_>) -> Result<(), GrammarDefError> {
    let lparen = g.literal("(")?;
    let rparen = g.literal(")")?;
    let s = g.nonterminal("S")?;
    g.root(s)?;
    g.rule(s, lparen.then(s).then(rparen).or(TermID::EMPTY))?;
    Ok(())
}

fn dangling_else_with(g: &mut GrammarDef<'_>, hint: bool) -> Result<(), GrammarDefError> {
    let kw_if = g.literal("if")?;
    let kw_then = g.literal("then")?;
    let kw_else = g.literal("else")?;
    let x = g.literal("x")?;
    let c = g.literal("c")?;
    let stmt = g.nonterminal("S")?;
    let cond = g.nonterminal("E")?;
    g.root(stmt)?;

    let if_then = kw_if.then(cond).then(kw_then).then(stmt);
    let mut if_then_else = if_then.clone();
    if hint {
        if_then_else = if_then_else.then(prefer_shift());
    }
    let if_then_else = if_then_else.then(kw_else).then(stmt);

    g.rule(stmt, if_then.or(if_then_else).or(x))?;
    g.rule(cond, c)?;
    Ok(())
}

// S -> 'if' E 'then' S | 'if' E 'then' S 'else' S | 'x' ; E -> 'c'
pub fn dangling_else(g: &mut GrammarDef<'_>) -> Result<(), GrammarDefError> {
    dangling_else_with(g, false)
}

// `dangling_else` with a shift preference in front of 'else'.
pub fn dangling_else_preferring_shift(g: &mut GrammarDef<'_>) -> Result<(), GrammarDefError> {
    dangling_else_with(g, true)
}

// S -> A 'z' | B 'z' ; A -> 'x' ; B -> 'x'
pub fn reduce_reduce(g: &mut GrammarDef<'_>) -> Result<(), GrammarDefError> {
    let x = g.literal("x")?;
    let z = g.literal("z")?;
    let s = g.nonterminal("S")?;
    let a = g.nonterminal("A")?;
    let b = g.nonterminal("B")?;
    g.root(s)?;
    g.rule(s, a.then(z).or(b.then(z)))?;
    g.rule(a, x)?;
    g.rule(b, x)?;
    Ok(())
}

// A small statement language exercising keywords and repetitions.
//
// program -> stmt*
// stmt    -> ident '=' value ';' | 'print' value*[','] ';'
// value   -> ident | num
pub fn statements(g: &mut GrammarDef<'_>) -> Result<(), GrammarDefError> {
    let assign = g.literal("=")?;
    let semi = g.literal(";")?;
    let comma = g.literal(",")?;
    let print = g.literal("print")?;
    let ident = g.terminal("ident", IdentifierMatcher::new())?;
    let num = g.terminal("num", NumberMatcher)?;
    g.alias(ident, "identifier")?;

    let program = g.nonterminal("program")?;
    let stmt = g.nonterminal("stmt")?;
    let value = g.nonterminal("value")?;
    g.root(program)?;

    let stmts = g.zero_or_more(stmt)?;
    let values = g.zero_or_more_sep(value, comma)?;
    g.rule(program, stmts)?;
    g.rule(
        stmt,
        ident
            .then(assign)
            .then(value)
            .then(semi)
            .or(print.then(values).then(semi)),
    )?;
    g.rule(value, ident.or(num))?;
    Ok(())
}

// A keyword spelled like the nonterminal it introduces.
//
// query  -> select | query ';' select
// select -> 'select' ident
pub fn select_queries(g: &mut GrammarDef<'_>) -> Result<(), GrammarDefError> {
    let select = g.nonterminal("select")?;
    let kw_select = g.literal("select")?;
    let semi = g.literal(";")?;
    let ident = g.terminal("ident", IdentifierMatcher::new())?;
    let query = g.nonterminal("query")?;
    g.root(query)?;

    g.rule(query, select.or(query.then(semi).then(select)))?;
    g.rule(select, kw_select.then(ident))?;
    Ok(())
}

/// A token produced by [`tokenize`].
#[derive(Debug)]
pub struct Lexeme {
    pub term: TermID,
    pub text: String,
}

impl Token<TermID> for Lexeme {
    fn as_symbol(&self) -> TermID {
        self.term
    }
}

/// Split `input` into tokens using the grammar's scanner lookup.
pub fn tokenize(data: &GrammarData, input: &str) -> Vec<Result<Lexeme, String>> {
    let mut tokens = vec![];
    let mut position = 0;
    while let Some(ch) = input[position..].chars().next() {
        if ch.is_whitespace() {
            position += ch.len_utf8();
            continue;
        }
        let matched = data
            .scanner_lookup()
            .candidates(ch)
            .iter()
            .find_map(|id| {
                let token = data.term(*id).matcher()?.try_match(input, position)?;
                (!token.lexeme.is_empty()).then_some((*id, token))
            });
        match matched {
            Some((term, token)) => {
                position += token.lexeme.len();
                tokens.push(Ok(Lexeme {
                    term,
                    text: token.lexeme,
                }));
            }
            None => {
                tokens.push(Err(format!("unexpected character {:?} at {}", ch, position)));
                break;
            }
        }
    }
    tokens
}

/// Parse `input` and render the reductions as a bracketed tree.
///
/// Productions with a single symbol are passed through unchanged.
pub fn parse(data: &GrammarData, input: &str) -> Result<String, String> {
    let mut tokens = tokenize(data, input).into_iter();
    let mut parser = Parser::new(data);
    let mut args = vec![];
    let mut nodes: Vec<String> = vec![];
    loop {
        match parser.next_event(&mut tokens, &mut args).map_err(|e| e.to_string())? {
            ParseEvent::Reduce(_production) => {
                let children = args
                    .iter()
                    .filter(|arg| matches!(arg, ParseItem::N(..)))
                    .count();
                let mut children = nodes.split_off(nodes.len() - children).into_iter();
                let parts: Vec<String> = args
                    .iter_mut()
                    .filter_map(|arg| match arg.take()? {
                        ParseItem::T(token) => Some(token.text),
                        ParseItem::N(..) => children.next(),
                        _ => None,
                    })
                    .filter(|part| !part.is_empty())
                    .collect();
                nodes.push(match &parts[..] {
                    [single] => single.clone(),
                    _ if parts.is_empty() => String::new(),
                    _ => format!("({})", parts.join(" ")),
                });
            }
            ParseEvent::Accept => return Ok(nodes.pop().unwrap_or_default()),
        }
    }
}
