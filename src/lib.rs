//! Step-by-step membership checking of strings against context-free
//! grammars written as `<Rule> := alt | alt` lines.
//!
//! Two backtracking strategies share one trace model: [`match_top_down`]
//! expands the start symbol leftmost-first, [`match_bottom_up`] reduces the
//! input leftmost-first. Both return the full [`Trace`] of the run, dead
//! ends included, so a caller can replay every decision.

pub mod cli;
pub mod error_handling;
pub mod generator;
pub mod grammar;
pub mod matcher;
pub mod parser;
pub mod render;
pub mod trace;

pub use grammar::{Grammar, Granularity, Production, Symbol};
pub use matcher::{match_bottom_up, match_top_down, MatchConfig, Strategy};
pub use trace::{Action, Candidate, Step, Trace, Verdict};
