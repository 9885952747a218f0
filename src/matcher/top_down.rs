use crate::grammar::{Grammar, Granularity, Production, Symbol};
use crate::trace::{Action, Candidate, Step, StepBuilder, Trace};

use super::backtrack::{BacktrackPoint, BacktrackStack};
use super::MatchConfig;

// The state saved when a nonterminal with several productions is expanded.
// `form` still starts with that nonterminal.
#[derive(Debug, Clone)]
struct Choice {
    nonterminal: String,
    form: Vec<Symbol>,
    position: usize,
}

/// Leftmost-derivation matcher. Expands the first symbol of the sentential
/// form with productions in declaration order and matches terminal runs
/// against the front of the remaining input.
pub struct TopDownMatcher<'g> {
    grammar: &'g Grammar,
    config: MatchConfig,
}

impl<'g> TopDownMatcher<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self::with_config(grammar, MatchConfig::top_down())
    }

    pub fn with_config(grammar: &'g Grammar, config: MatchConfig) -> Self {
        TopDownMatcher { grammar, config }
    }

    pub fn run(&self, input: &str) -> Trace {
        let mut run = Run {
            grammar: self.grammar,
            input,
            max_steps: self.config.max_steps,
            form: vec![self.grammar.start()],
            position: 0,
            stack: BacktrackStack::new(),
            trace: Trace::new(),
        };

        run.derive();
        run.trace
    }
}

struct Run<'g, 'i> {
    grammar: &'g Grammar,
    input: &'i str,
    max_steps: usize,
    form: Vec<Symbol>,
    // Byte offset of the unread input
    position: usize,
    stack: BacktrackStack<Choice, &'g Production>,
    trace: Trace,
}

fn expansion_candidates<'p>(nonterminal: &str, productions: impl IntoIterator<Item = &'p Production>) -> Vec<Candidate> {
    productions.into_iter()
        .map(|production| Candidate::expansion(nonterminal, production.text()))
        .collect()
}

impl<'g, 'i> Run<'g, 'i> {
    fn remaining(&self) -> &'i str {
        &self.input[self.position..]
    }

    fn step(&self, action: Action) -> StepBuilder {
        Step::builder(action, &self.form).remaining(self.remaining())
    }

    fn record(&mut self, step: StepBuilder) {
        self.trace.push(step);
    }

    fn fail(&mut self, action: Action) -> bool {
        let step = self.step(action).success(false);
        self.record(step);
        false
    }

    fn derive(&mut self) {
        loop {
            if self.form.is_empty() && self.remaining().is_empty() {
                let step = self.step(Action::Success).success(true);
                self.record(step);
                return;
            }

            if self.trace.len() >= self.max_steps {
                let step = self.step(Action::StepLimit { limit: self.max_steps });
                self.record(step);
                return;
            }

            let progressing = match self.form.first().cloned() {
                None => {
                    let remaining = self.remaining().to_string();
                    self.backtrack(Action::LeftoverInput { remaining })
                }
                Some(Symbol::Nonterminal(name)) => self.expand(&name),
                Some(Symbol::Terminal(text)) => self.consume(&text),
            };

            if !progressing {
                return;
            }
        }
    }

    fn expand(&mut self, nonterminal: &str) -> bool {
        let grammar = self.grammar;
        let Some(rewrite) = grammar.rewrite(nonterminal) else {
            return self.fail(Action::UndefinedNonterminal { nonterminal: nonterminal.to_string() });
        };
        let Some(first) = rewrite.first() else {
            return self.backtrack(Action::AlternativesExhausted);
        };

        if rewrite.len() > 1 {
            let choice = Choice {
                nonterminal: nonterminal.to_string(),
                form: self.form.clone(),
                position: self.position,
            };
            self.stack.push(BacktrackPoint::new(choice, rewrite.iter().collect(), self.trace.next_id()));
        }

        self.form.splice(0..1, first.symbols(Granularity::Run));

        let candidates = expansion_candidates(nonterminal, rewrite);
        let selected = candidates[0].clone();
        let step = self.step(Action::Expand {
                nonterminal: nonterminal.to_string(),
                production: first.text().to_string(),
            })
            .candidates(candidates)
            .selected(selected);
        self.record(step);
        true
    }

    fn consume(&mut self, terminal: &str) -> bool {
        let remaining = self.remaining();

        if remaining.starts_with(terminal) {
            self.position += terminal.len();
            self.form.remove(0);

            let step = self.step(Action::Consume { terminal: terminal.to_string() });
            self.record(step);
            return true;
        }

        let expected = terminal.to_string();
        let reason = match remaining.chars().next() {
            None => Action::UnexpectedEnd { expected },
            Some(found) => Action::Mismatch { expected, found },
        };
        self.backtrack(reason)
    }

    // Resumes at the most recent choice with an untried production. `reason`
    // becomes the failing step when there was never anything to go back to.
    fn backtrack(&mut self, reason: Action) -> bool {
        if self.stack.is_empty() {
            return self.fail(reason);
        }

        let input = self.input;
        let (stack, trace) = (&mut self.stack, &mut self.trace);
        let resumption = stack.resume(|point| {
            let choice = &point.snapshot;
            trace.push(Step::builder(Action::AbandonExpansion { nonterminal: choice.nonterminal.clone() }, &choice.form)
                .remaining(&input[choice.position..])
                .backtrack_to(point.step));
        });

        let Some(resumption) = resumption else {
            return self.fail(Action::AlternativesExhausted);
        };

        let choice = &resumption.snapshot;
        let production = *resumption.alternative();

        self.form = production.symbols(Granularity::Run);
        self.form.extend_from_slice(&choice.form[1..]);
        self.position = choice.position;

        let candidates = expansion_candidates(&choice.nonterminal, resumption.alternatives.iter().copied());
        let selected = candidates[resumption.chosen].clone();
        let step = self.step(Action::Retry {
                nonterminal: choice.nonterminal.clone(),
                production: production.text().to_string(),
            })
            .candidates(candidates)
            .selected(selected)
            .backtrack_to(resumption.step);
        self.record(step);
        true
    }
}
