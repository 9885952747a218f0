/*
    This module parses grammar files of `<Rule> := alt | alt` lines
*/

mod lexer;
mod verifier;

use std::fmt::Display;
use std::fs::File;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::grammar::*;
use crate::error_handling::*;
use itertools::{Either, Itertools};
use lexer::*;
use verifier::verify_rules;
use verifier::IntermediateRuleset;

#[derive(Debug)]
pub enum CompileErrorType {
    // A line which should contain a rule does not
    MissingDefines,
    // A rule has multiple `:=` signs
    UnexpectedDefines,
    // The user starts a rule line with something other than one nonterminal
    MissingNonterminal,
    // There is a `<` without its `>`
    MalformedNonterminal(String),
    // An undefined nonterminal was used
    UndefinedNonterminal(String),
    // The file contains no rules at all
    EmptyGrammar,
    // Somehow a full rewrite was parsed as a single alternative
    // This is a problem with derivator, not the grammar
    UnsplitRewrite,
    // A blank line got too deep into the parser
    // This is a problem with derivator, not the grammar
    UnexpectedBlankLine,
    // There was an issue with reading a file
    FileError(std::io::Error),
}

impl ErrorType for CompileErrorType {}

impl PartialEq for CompileErrorType {
    fn eq(&self, other: &Self) -> bool {
        use CompileErrorType::*;

        match (self, other) {
            (FileError(a), FileError(b)) => a.kind() == b.kind(),
            (MalformedNonterminal(a), MalformedNonterminal(b)) => a == b,
            (UndefinedNonterminal(a), UndefinedNonterminal(b)) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl Display for CompileErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileErrorType::MissingDefines => write!(f, "Expected `:=` after nonterminal"),
            CompileErrorType::UnexpectedDefines => write!(f, "Unexpected `:=` encountered"),
            CompileErrorType::MissingNonterminal => write!(f, "Tried to define something other than a single nonterminal"),
            CompileErrorType::MalformedNonterminal(text) => write!(f, "Unclosed `<` in `{}`", text),
            CompileErrorType::UndefinedNonterminal(nonterminal) => write!(f, "Could not find definition for `{}`", nonterminal),
            CompileErrorType::EmptyGrammar => write!(f, "The grammar has no rules"),
            CompileErrorType::UnsplitRewrite => write!(f, "Rewrite was not fully split (this is a problem with derivator, not the grammar)"),
            CompileErrorType::UnexpectedBlankLine => write!(f, "Blank line encountered in rule parser (this is a problem with derivator, not the grammar)"),
            CompileErrorType::FileError(e) => write!(f, "File error: {}", e),
        }
    }
}

pub type CompileError = Error<CompileErrorType>;
pub type CompileErrors = Errors<CompileErrorType>;

fn io_error(error: std::io::Error, file: PathBuf) -> CompileError {
    CompileError {
        location: Location::file(file),
        error: CompileErrorType::FileError(error)
    }
}

pub type Result<T> = std::result::Result<T, CompileErrorType>;
pub type LineResult<T> = std::result::Result<T, CompileError>;
pub type FileResult<T> = std::result::Result<T, CompileErrors>;

#[derive(PartialEq, Debug)]
struct Rule {
    symbol: String,
    rewrite: Rewrite,
    location: Location
}

/// A parsed grammar along with the diagnostics that do not stop matching.
#[derive(Debug)]
pub struct Parsed {
    pub grammar: Grammar,
    pub warnings: CompileErrors,
}

impl Parsed {
    // Treats every warning as an error
    pub fn strict(self) -> FileResult<Grammar> {
        if self.warnings.is_empty() {
            Ok(self.grammar)
        } else {
            Err(self.warnings)
        }
    }
}

fn parse_alternative(tokens: &[Token]) -> Result<Production> {
    let text = match tokens {
        [] => "",
        [Token::Text(text)] => text.as_str(),
        _ if tokens.contains(&Token::Defines) => return Err(CompileErrorType::UnexpectedDefines),
        _ => return Err(CompileErrorType::UnsplitRewrite),
    };

    Production::parse(text).map_err(|_| CompileErrorType::MalformedNonterminal(text.to_string()))
}

fn parse_rewrite(tokens: &[Token]) -> Result<Rewrite> {
    tokens.split(|t| *t == Token::Or).map(parse_alternative).collect()
}

fn parse_head(tokens: &[Token]) -> Result<String> {
    let text = match tokens {
        [] => return Err(CompileErrorType::UnexpectedBlankLine),
        [Token::Text(text)] => text,
        _ => return Err(CompileErrorType::MissingNonterminal),
    };

    match tokenize(text, Granularity::Run) {
        Ok(symbols) => match symbols.as_slice() {
            [Symbol::Nonterminal(name)] => Ok(name.clone()),
            _ => Err(CompileErrorType::MissingNonterminal),
        },
        Err(_) => Err(CompileErrorType::MalformedNonterminal(text.clone())),
    }
}

fn parse_line(tokens: &[Token], location: Location) -> Result<Rule> {
    if tokens.is_empty() {
        return Err(CompileErrorType::UnexpectedBlankLine);
    }

    // The rule must be split into exactly a head and a rewrite
    let (head, rewrite) = match tokens.split(|t| *t == Token::Defines).collect_vec().as_slice() {
        [head, rewrite] => (*head, *rewrite),
        [_] => return Err(CompileErrorType::MissingDefines),
        _ => return Err(CompileErrorType::UnexpectedDefines),
    };

    let symbol = parse_head(head)?;
    let rewrite = parse_rewrite(rewrite)?;

    return Ok(Rule {
        symbol,
        rewrite,
        location
    });
}

fn parse_lex_line(line: &str, location: Location) -> LineResult<Rule> {
    parse_line(&lexer::lex_line(line), location.clone())
        .map_err(|error| CompileError { location, error })
}

fn is_rule_line(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.starts_with(';')
}

// Returns an iterator over the lines of a file, with the io errors wrapped
// in CompileError and enumerated
fn file_line_nums<'a>(file: File, path: &'a Path) -> impl Iterator<Item = (usize, LineResult<String>)> + 'a {
    std::io::BufReader::new(file)
        .lines()
        .map(move |line| line.map_err(|e| io_error(e, path.to_path_buf())))
        .enumerate()
        .filter(|(_, line)| line.as_ref().is_ok_and(|line| is_rule_line(line)) || line.is_err())
        .map(|(num, line)| (num + 1, line))
}

fn source_line_nums(source: &str) -> impl Iterator<Item = (usize, LineResult<String>)> + '_ {
    source.lines()
        .enumerate()
        .filter(|(_, line)| is_rule_line(line))
        .map(|(num, line)| (num + 1, Ok(line.to_string())))
}

// Generates the ordered rule map from a list of rules. A rule defined twice
// keeps its first position but takes the later alternatives.
fn ruleset_from_rules(rules: Vec<Rule>) -> IntermediateRuleset {
    let mut ruleset = IntermediateRuleset::with_capacity(rules.len());
    for rule in rules {
        ruleset.insert(rule.symbol, (rule.rewrite, rule.location));
    }

    return ruleset;
}

fn grammar_from_rules(rule_list: Vec<Rule>, path: &Path) -> FileResult<Parsed> {
    if rule_list.is_empty() {
        return Err(vec![CompileError {
            location: Location::file(path.to_path_buf()),
            error: CompileErrorType::EmptyGrammar
        }]);
    }

    let ruleset = ruleset_from_rules(rule_list);
    let warnings = verify_rules(&ruleset);

    let rules = ruleset.into_iter()
        .map(|(symbol, (rewrite, _))| (symbol, rewrite))
        .collect();

    return Ok(Parsed {
        grammar: Grammar::new(rules),
        warnings
    });
}

fn parse_lines(lines: impl Iterator<Item = (usize, LineResult<String>)>, path: &Path) -> FileResult<Parsed> {
    let parsed_lines = lines.map(|(num, line_res)| {
        line_res.and_then(|line| parse_lex_line(&line, Location {
            file: path.to_path_buf(),
            line: num
        }))
    });

    let (rules, errors): (Vec<_>, Vec<_>) = parsed_lines.partition_map(|line| match line {
        Ok(rule) => Either::Left(rule),
        Err(error) => Either::Right(error),
    });
    if !errors.is_empty() {
        return Err(errors);
    }

    return grammar_from_rules(rules, path);
}

pub fn parse_file(path: &Path) -> FileResult<Parsed> {
    let file = File::open(path).map_err(|e| vec![io_error(e, path.to_path_buf())])?;
    parse_lines(file_line_nums(file, path), path)
}

pub fn parse_source(source: &str, path: &Path) -> FileResult<Parsed> {
    parse_lines(source_line_nums(source), path)
}

// Parses grammar text that did not come from a file, ignoring warnings
pub fn parse_str(source: &str) -> FileResult<Grammar> {
    parse_source(source, Path::new("")).map(|parsed| parsed.grammar)
}
