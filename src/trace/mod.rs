/*
    This module records the replayable history of a match run
*/

use std::fmt::Display;
use std::ops::Range;

use serde::Serialize;

use crate::grammar::{symbols_to_string, Symbol};

/// What the engine did to get from the previous step to this one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    // Bottom-up: the tokenized input before any work
    Start,
    // Top-down
    Expand { nonterminal: String, production: String },
    Consume { terminal: String },
    // Bottom-up
    Normalize { terminal: String, nonterminal: String },
    Reduce { nonterminal: String, production: String },
    // Resumption at a backtrack point with its next untried alternative
    Retry { nonterminal: String, production: String },
    AbandonExpansion { nonterminal: String },
    AbandonReduction { form: String },
    // Terminal steps
    Success,
    UndefinedNonterminal { nonterminal: String },
    UnexpectedEnd { expected: String },
    Mismatch { expected: String, found: char },
    LeftoverInput { remaining: String },
    NoReductions,
    AlternativesExhausted,
    // Bottom-up ran out of reductions in a grammar with empty productions
    Inconclusive,
    MalformedInput { position: usize },
    StepLimit { limit: usize },
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Start => write!(f, "Start of parsing"),
            Action::Expand { nonterminal, production } => write!(f, "Replace {} with \"{}\"", nonterminal, production),
            Action::Consume { terminal } => write!(f, "Recognized \"{}\"", terminal),
            Action::Normalize { terminal, nonterminal } => write!(f, "Replace terminal '{}' with {}", terminal, nonterminal),
            Action::Reduce { nonterminal, production } => write!(f, "Reduce \"{}\" to {}", production, nonterminal),
            Action::Retry { nonterminal, production } => write!(f, "Backtrack: try \"{}\" for {}", production, nonterminal),
            Action::AbandonExpansion { nonterminal } => write!(f, "Backtrack: every rule for {} is exhausted, backtracking further", nonterminal),
            Action::AbandonReduction { form } => write!(f, "Backtrack: every reduction of \"{}\" is exhausted, backtracking further", form),
            Action::Success => write!(f, "Parsing finished, the string belongs to the grammar"),
            Action::UndefinedNonterminal { nonterminal } => write!(f, "Error: nonterminal {} is not defined in the grammar", nonterminal),
            Action::UnexpectedEnd { expected } => write!(f, "Error: input ended while expecting \"{}\"", expected),
            Action::Mismatch { expected, found } => write!(f, "Error: expected \"{}\" but found \"{}\"", expected, found),
            Action::LeftoverInput { remaining } => write!(f, "Error: derivation finished with \"{}\" left unread", remaining),
            Action::NoReductions => write!(f, "Error: no reductions and nothing left to backtrack to"),
            Action::AlternativesExhausted => write!(f, "Error: every alternative is exhausted, the string cannot be parsed"),
            Action::Inconclusive => write!(f, "Stopped: no reduction left, but empty productions might still derive the string"),
            Action::MalformedInput { position } => write!(f, "Error: unclosed `<` in the input at column {}", position + 1),
            Action::StepLimit { limit } => write!(f, "Stopped after {} steps without a verdict", limit),
        }
    }
}

/// One alternative considered at a step: an expansion for the top-down
/// matcher, or a reduction (with the span of the form it covers) for the
/// bottom-up matcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub nonterminal: String,
    pub production: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Range<usize>>,
}

impl Candidate {
    pub fn expansion(nonterminal: &str, production: &str) -> Self {
        Candidate { nonterminal: nonterminal.to_string(), production: production.to_string(), span: None }
    }

    pub fn reduction(nonterminal: &str, production: &str, span: Range<usize>) -> Self {
        Candidate { nonterminal: nonterminal.to_string(), production: production.to_string(), span: Some(span) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub id: usize,
    pub action: Action,
    pub form: Vec<Symbol>,
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_input: Option<String>,
    pub candidates: Vec<Candidate>,
    pub selected: Option<Candidate>,
    pub backtrack_to: Option<usize>,
    pub success: Option<bool>,
}

impl Step {
    pub fn builder(action: Action, form: &[Symbol]) -> StepBuilder {
        StepBuilder {
            action,
            form: form.to_vec(),
            remaining_input: None,
            candidates: Vec::new(),
            selected: None,
            backtrack_to: None,
            success: None,
        }
    }

    pub fn is_backtrack(&self) -> bool {
        self.backtrack_to.is_some()
    }
}

// A step that has not been given its id yet
#[derive(Debug, Clone)]
pub struct StepBuilder {
    action: Action,
    form: Vec<Symbol>,
    remaining_input: Option<String>,
    candidates: Vec<Candidate>,
    selected: Option<Candidate>,
    backtrack_to: Option<usize>,
    success: Option<bool>,
}

impl StepBuilder {
    pub fn remaining(mut self, input: &str) -> Self {
        self.remaining_input = Some(input.to_string());
        self
    }

    pub fn candidates(mut self, candidates: Vec<Candidate>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn selected(mut self, candidate: Candidate) -> Self {
        self.selected = Some(candidate);
        self
    }

    pub fn backtrack_to(mut self, step: usize) -> Self {
        self.backtrack_to = Some(step);
        self
    }

    pub fn success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    Rejected,
    // The run stopped at its step bound
    Unresolved,
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Accepted => write!(f, "accepted"),
            Verdict::Rejected => write!(f, "rejected"),
            Verdict::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// Append-only sequence of steps. A step's id is its position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Trace {
    steps: Vec<Step>,
}

impl Trace {
    pub fn new() -> Self {
        Trace::default()
    }

    /// The id the next recorded step will get.
    pub fn next_id(&self) -> usize {
        self.steps.len()
    }

    pub fn push(&mut self, builder: StepBuilder) -> usize {
        let id = self.next_id();
        let display = symbols_to_string(&builder.form);

        self.steps.push(Step {
            id,
            action: builder.action,
            form: builder.form,
            display,
            remaining_input: builder.remaining_input,
            candidates: builder.candidates,
            selected: builder.selected,
            backtrack_to: builder.backtrack_to,
            success: builder.success,
        });

        return id;
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn get(&self, id: usize) -> Option<&Step> {
        self.steps.get(id)
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    pub fn verdict(&self) -> Verdict {
        match self.last().and_then(|step| step.success) {
            Some(true) => Verdict::Accepted,
            Some(false) => Verdict::Rejected,
            None => Verdict::Unresolved,
        }
    }

    pub fn backtrack_count(&self) -> usize {
        self.steps.iter().filter(|step| step.is_backtrack()).count()
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(text: &str) -> Vec<Symbol> {
        crate::grammar::tokenize(text, crate::grammar::Granularity::Run).unwrap()
    }

    #[test]
    fn ids_follow_positions() {
        let mut trace = Trace::new();
        assert_eq!(trace.next_id(), 0);
        assert_eq!(trace.push(Step::builder(Action::Start, &form("ab"))), 0);
        assert_eq!(trace.push(Step::builder(Action::Consume { terminal: "ab".to_string() }, &[])), 1);
        assert_eq!(trace.iter().map(|step| step.id).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(trace.get(0).unwrap().display, "ab");
    }

    #[test]
    fn verdict_comes_from_last_step() {
        let mut trace = Trace::new();
        assert_eq!(trace.verdict(), Verdict::Unresolved);

        trace.push(Step::builder(Action::Start, &form("<S>")));
        assert_eq!(trace.verdict(), Verdict::Unresolved);

        trace.push(Step::builder(Action::Success, &form("<S>")).success(true));
        assert_eq!(trace.verdict(), Verdict::Accepted);

        let mut failed = Trace::new();
        failed.push(Step::builder(Action::NoReductions, &form("ab")).success(false));
        assert_eq!(failed.verdict(), Verdict::Rejected);
    }

    #[test]
    fn builder_fields_are_kept() {
        let mut trace = Trace::new();
        let candidates = vec![Candidate::expansion("<S>", "a"), Candidate::expansion("<S>", "b")];
        trace.push(Step::builder(Action::Expand { nonterminal: "<S>".to_string(), production: "a".to_string() }, &form("a"))
            .remaining("b")
            .candidates(candidates.clone())
            .selected(candidates[0].clone()));
        trace.push(Step::builder(Action::Retry { nonterminal: "<S>".to_string(), production: "b".to_string() }, &form("b"))
            .remaining("b")
            .candidates(candidates.clone())
            .selected(candidates[1].clone())
            .backtrack_to(0));

        let retry = trace.get(1).unwrap();
        assert_eq!(retry.backtrack_to, Some(0));
        assert_eq!(retry.remaining_input.as_deref(), Some("b"));
        assert_eq!(retry.selected.as_ref(), Some(&candidates[1]));
        assert_eq!(trace.backtrack_count(), 1);
    }

    #[test]
    fn actions_serialize_with_kind_tag() {
        let json = serde_json::to_value(Action::Mismatch { expected: "a".to_string(), found: 'b' }).unwrap();
        assert_eq!(json["kind"], "mismatch");
        assert_eq!(json["found"], "b");
        assert_eq!(serde_json::to_value(Action::Success).unwrap()["kind"], "success");
    }
}
