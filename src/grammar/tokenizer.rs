use std::fmt::Display;

use itertools::{Itertools, PeekingNext};

use super::Symbol;

/// How terminal material outside `<...>` spans is split into symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Every terminal character is its own symbol (bottom-up matching).
    Char,
    /// A maximal run of terminal characters is one symbol (top-down matching).
    Run,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    // A `<` with no closing `>` before the next `<` or the end of the text.
    // The position is the byte offset of the `<`.
    MalformedNonterminal { position: usize },
}

impl Display for TokenizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenizeError::MalformedNonterminal { position } => write!(f, "Unclosed `<` at column {}", position + 1),
        }
    }
}

fn lex_nonterminal(text: &mut impl PeekingNext<Item = (usize, char)>, position: usize) -> Result<Symbol, TokenizeError> {
    text.next(); // Consume `<`
    let name: String = text.peeking_take_while(|&(_, c)| c != '>' && c != '<')
        .map(|(_, c)| c)
        .collect();

    match text.next() {
        Some((_, '>')) => Ok(Symbol::Nonterminal(format!("<{}>", name))),
        _ => Err(TokenizeError::MalformedNonterminal { position }),
    }
}

fn lex_terminals(text: &mut impl PeekingNext<Item = (usize, char)>, granularity: Granularity, symbols: &mut Vec<Symbol>) {
    let run = text.peeking_take_while(|&(_, c)| c != '<').map(|(_, c)| c);

    match granularity {
        Granularity::Char => symbols.extend(run.map(|c| Symbol::Terminal(c.to_string()))),
        Granularity::Run => symbols.push(Symbol::Terminal(run.collect())),
    }
}

pub fn tokenize(text: &str, granularity: Granularity) -> Result<Vec<Symbol>, TokenizeError> {
    let mut symbols = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        if c == '<' {
            symbols.push(lex_nonterminal(&mut chars, position)?);
        } else {
            lex_terminals(&mut chars, granularity, &mut symbols);
        }
    }

    return Ok(symbols);
}

pub fn symbols_to_string(symbols: &[Symbol]) -> String {
    symbols.iter().map(Symbol::text).collect()
}
