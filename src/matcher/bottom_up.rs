use std::iter::once;
use std::ops::Range;

use crate::grammar::{symbols_to_string, tokenize, Grammar, Granularity, Production, Symbol, TokenizeError};
use crate::trace::{Action, Candidate, Step, StepBuilder, Trace};

use super::backtrack::{BacktrackPoint, BacktrackStack};
use super::MatchConfig;

// An occurrence of a production's symbols inside the current form
#[derive(Debug, Clone)]
struct Reduction<'g> {
    span: Range<usize>,
    nonterminal: &'g str,
    production: &'g Production,
}

impl Reduction<'_> {
    fn candidate(&self) -> Candidate {
        Candidate::reduction(self.nonterminal, self.production.text(), self.span.clone())
    }
}

/// Leftmost-reduction matcher. Classifies terminal characters through the
/// grammar's lexical classes, then keeps replacing the leftmost matching
/// production occurrence by its nonterminal until only the start symbol
/// remains.
pub struct BottomUpMatcher<'g> {
    grammar: &'g Grammar,
    config: MatchConfig,
}

impl<'g> BottomUpMatcher<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self::with_config(grammar, MatchConfig::bottom_up())
    }

    pub fn with_config(grammar: &'g Grammar, config: MatchConfig) -> Self {
        BottomUpMatcher { grammar, config }
    }

    pub fn run(&self, input: &str) -> Trace {
        let mut trace = Trace::new();

        let tokens = match tokenize(input, Granularity::Char) {
            Ok(tokens) => tokens,
            Err(TokenizeError::MalformedNonterminal { position }) => {
                trace.push(Step::builder(Action::MalformedInput { position }, &[]).success(false));
                return trace;
            }
        };

        let grammar = self.grammar;

        // Empty productions would match between every pair of symbols, so
        // they only reduce an empty form
        let productions = grammar.rules.iter()
            .flat_map(|(nonterminal, rewrite)| rewrite.iter()
                .filter(|production| !production.is_empty())
                .map(move |production| (nonterminal.as_str(), production, production.symbols(Granularity::Char))))
            .collect();

        let empty_productions = grammar.rules.iter()
            .flat_map(|(nonterminal, rewrite)| rewrite.iter()
                .filter(|production| production.is_empty())
                .map(move |production| (nonterminal.as_str(), production)))
            .collect();

        let lexical_classes = grammar.rules.keys()
            .filter(|nonterminal| grammar.is_lexical_class(nonterminal))
            .map(String::as_str)
            .collect();

        let mut run = Run {
            grammar,
            productions,
            empty_productions,
            lexical_classes,
            max_steps: self.config.max_steps,
            tokens,
            stack: BacktrackStack::new(),
            trace,
        };

        run.record(Action::Start);
        if run.normalize() {
            run.reduce();
        }
        run.trace
    }
}

struct Run<'g> {
    grammar: &'g Grammar,
    // Every non-empty production with its char-granular symbols, rules in
    // declaration order
    productions: Vec<(&'g str, &'g Production, Vec<Symbol>)>,
    empty_productions: Vec<(&'g str, &'g Production)>,
    lexical_classes: Vec<&'g str>,
    max_steps: usize,
    tokens: Vec<Symbol>,
    stack: BacktrackStack<Vec<Symbol>, Reduction<'g>>,
    trace: Trace,
}

impl<'g> Run<'g> {
    fn step(&self, action: Action) -> StepBuilder {
        Step::builder(action, &self.tokens)
    }

    fn record(&mut self, action: Action) {
        let step = self.step(action);
        self.trace.push(step);
    }

    fn fail(&mut self, action: Action) -> bool {
        let step = self.step(action).success(false);
        self.trace.push(step);
        false
    }

    // Running out of reductions only rejects the input when no empty
    // production could have been skipped along the way
    fn give_up(&mut self, action: Action) -> bool {
        if self.empty_productions.is_empty() {
            return self.fail(action);
        }
        self.record(Action::Inconclusive);
        false
    }

    fn at_limit(&mut self) -> bool {
        if self.trace.len() < self.max_steps {
            return false;
        }
        self.record(Action::StepLimit { limit: self.max_steps });
        true
    }

    // The first lexical class, in declaration order, with `terminal` as one
    // of its alternatives
    fn classify(&self, terminal: &str) -> Option<&'g str> {
        let grammar = self.grammar;
        self.lexical_classes.iter()
            .copied()
            .find(|nonterminal| grammar.rewrite(nonterminal)
                .is_some_and(|rewrite| rewrite.iter().any(|production| production.text() == terminal)))
    }

    // Replaces terminals by their lexical class one at a time. Every
    // replacement removes a terminal, so this runs at most once per token.
    // Returns false when the step limit stopped the run.
    fn normalize(&mut self) -> bool {
        loop {
            let found = self.tokens.iter()
                .enumerate()
                .find_map(|(index, token)| match token {
                    Symbol::Terminal(text) => self.classify(text).map(|class| (index, text.clone(), class)),
                    Symbol::Nonterminal(_) => None,
                });

            let Some((index, terminal, nonterminal)) = found else {
                return true;
            };

            if self.at_limit() {
                return false;
            }

            self.tokens[index] = Symbol::Nonterminal(nonterminal.to_string());
            self.record(Action::Normalize { terminal, nonterminal: nonterminal.to_string() });
        }
    }

    // Rule declaration order first, then production order, then position
    fn reductions(&self) -> Vec<Reduction<'g>> {
        if self.tokens.is_empty() {
            return self.empty_productions.iter()
                .map(|&(nonterminal, production)| Reduction { span: 0..0, nonterminal, production })
                .collect();
        }

        let mut reductions = Vec::new();

        for (nonterminal, production, symbols) in &self.productions {
            for (start, window) in self.tokens.windows(symbols.len()).enumerate() {
                if window == symbols.as_slice() {
                    reductions.push(Reduction {
                        span: start..start + symbols.len(),
                        nonterminal: *nonterminal,
                        production: *production,
                    });
                }
            }
        }

        return reductions;
    }

    fn is_start_symbol(&self) -> bool {
        matches!(self.tokens.as_slice(), [only] if only.is_nonterminal() && only.text() == self.grammar.start_symbol)
    }

    fn apply(&mut self, reduction: &Reduction) {
        self.tokens.splice(reduction.span.clone(), once(Symbol::Nonterminal(reduction.nonterminal.to_string())));
    }

    fn reduce(&mut self) {
        loop {
            let reductions = self.reductions();
            let candidates: Vec<Candidate> = reductions.iter().map(Reduction::candidate).collect();

            if self.is_start_symbol() {
                let step = self.step(Action::Success).candidates(candidates).success(true);
                self.trace.push(step);
                return;
            }

            if self.at_limit() {
                return;
            }

            let Some(selected) = reductions.first().cloned() else {
                if self.backtrack() {
                    continue;
                }
                return;
            };

            if reductions.len() > 1 {
                self.stack.push(BacktrackPoint::new(self.tokens.clone(), reductions, self.trace.next_id()));
            }

            self.apply(&selected);
            let step = self.step(Action::Reduce {
                    nonterminal: selected.nonterminal.to_string(),
                    production: selected.production.text().to_string(),
                })
                .candidates(candidates)
                .selected(selected.candidate());
            self.trace.push(step);
        }
    }

    fn backtrack(&mut self) -> bool {
        if self.stack.is_empty() {
            return self.give_up(Action::NoReductions);
        }

        let (stack, trace) = (&mut self.stack, &mut self.trace);
        let resumption = stack.resume(|point| {
            trace.push(Step::builder(Action::AbandonReduction { form: symbols_to_string(&point.snapshot) }, &point.snapshot)
                .backtrack_to(point.step));
        });

        let Some(resumption) = resumption else {
            return self.give_up(Action::AlternativesExhausted);
        };

        let reduction = resumption.alternative().clone();
        self.tokens = resumption.snapshot;
        self.apply(&reduction);

        let step = self.step(Action::Retry {
                nonterminal: reduction.nonterminal.to_string(),
                production: reduction.production.text().to_string(),
            })
            .candidates(resumption.alternatives.iter().map(Reduction::candidate).collect())
            .selected(reduction.candidate())
            .backtrack_to(resumption.step);
        self.trace.push(step);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::iter::zip;

    use super::*;
    use crate::matcher::match_top_down;
    use crate::parser::parse_str;
    use crate::trace::Verdict;

    fn run(grammar: &str, input: &str) -> Trace {
        BottomUpMatcher::new(&parse_str(grammar).unwrap()).run(input)
    }

    fn assert_back_references(trace: &Trace) {
        for step in trace {
            if let Some(target) = step.backtrack_to {
                assert!(target < step.id);
                assert!(trace.get(target).unwrap().candidates.len() > 1);
            }
        }
    }

    const INTEGER: &str = "<Integer> := <Sign><Digits> | <Digits>\n\
                           <Digits> := <Digit><Digits> | <Digit>\n\
                           <Digit> := 0|1|2|3|4|5|6|7|8|9\n\
                           <Sign> := +|-";

    // Only lexical classes normalize. Classifying `a` and `b` through
    // `<A> := a<A> | a` and `<B> := b<B> | b` would leave `<A><A><B><B>`,
    // which never reduces to `<S>`, and this sentence would be rejected.
    #[test]
    fn reduces_through_backtracking() {
        let trace = run("<S> := <A><B>\n<A> := a<A> | a\n<B> := b<B> | b", "aabb");

        assert_eq!(trace.verdict(), Verdict::Accepted);
        assert_eq!(trace.last().unwrap().display, "<S>");
        assert_eq!(trace.len(), 54);
        assert!(trace.backtrack_count() > 0);
        assert!(!trace.iter().any(|step| matches!(step.action, Action::Normalize { .. })));
        assert_back_references(&trace);
    }

    #[test]
    fn normalizes_lexical_classes_first() {
        let trace = run(INTEGER, "+12");

        let displays: Vec<_> = trace.iter().take(4).map(|step| step.display.as_str()).collect();
        assert_eq!(displays, vec!["+12", "<Sign>12", "<Sign><Digit>2", "<Sign><Digit><Digit>"]);
        assert_eq!(trace.get(1).unwrap().action, Action::Normalize {
            terminal: "+".to_string(),
            nonterminal: "<Sign>".to_string(),
        });

        assert_eq!(trace.len(), 31);
        assert_eq!(trace.verdict(), Verdict::Accepted);
        assert_back_references(&trace);
    }

    #[test]
    fn reduction_candidates_are_ordered() {
        let trace = run(INTEGER, "+12");
        let first_reduction = trace.get(4).unwrap();

        assert_eq!(first_reduction.candidates, vec![
            Candidate::reduction("<Digits>", "<Digit>", 1..2),
            Candidate::reduction("<Digits>", "<Digit>", 2..3),
        ]);
        assert_eq!(first_reduction.selected, Some(Candidate::reduction("<Digits>", "<Digit>", 1..2)));
        assert_eq!(first_reduction.display, "<Sign><Digits><Digit>");
    }

    #[test]
    fn no_reductions() {
        let trace = run("<S> := a", "b");

        assert_eq!(trace.len(), 2);
        assert_eq!(trace.last().unwrap().action, Action::NoReductions);
        assert_eq!(trace.verdict(), Verdict::Rejected);
    }

    #[test]
    fn undefined_nonterminal_never_reduces() {
        let trace = run("<S> := <A>b", "ab");
        assert_eq!(trace.last().unwrap().action, Action::NoReductions);
    }

    #[test]
    fn input_already_start_symbol() {
        let trace = run("<S> := ab", "<S>");

        assert_eq!(trace.len(), 2);
        assert_eq!(trace.verdict(), Verdict::Accepted);
    }

    #[test]
    fn malformed_input() {
        let trace = run("<S> := ab", "a<b");

        assert_eq!(trace.len(), 1);
        assert_eq!(trace.last().unwrap().action, Action::MalformedInput { position: 1 });
        assert_eq!(trace.verdict(), Verdict::Rejected);
    }

    #[test]
    fn unit_cycle_hits_the_step_limit() {
        let grammar = parse_str("<S> := <A>b\n<A> := <B>\n<B> := <A>").unwrap();
        let trace = BottomUpMatcher::with_config(&grammar, MatchConfig { max_steps: 10 }).run("<A>");

        assert_eq!(trace.len(), 11);
        assert_eq!(trace.last().unwrap().action, Action::StepLimit { limit: 10 });
        assert_eq!(trace.verdict(), Verdict::Unresolved);
    }

    #[test]
    fn exhausted_reductions() {
        let trace = run("<S> := <A><A>\n<A> := x | y", "xyx");

        assert_eq!(trace.verdict(), Verdict::Rejected);
        assert_back_references(&trace);
    }

    #[test]
    fn abandons_exhausted_reductions() {
        let trace = run("<S> := <A>x<A>z\n<A> := x | <A>y", "xyxxz");

        let abandon = trace.get(7).unwrap();
        assert_eq!(abandon.action, Action::AbandonReduction { form: "<A>y<A>xz".to_string() });
        assert_eq!(abandon.backtrack_to, Some(3));

        let retry = trace.get(8).unwrap();
        assert_eq!(retry.action, Action::Retry { nonterminal: "<A>".to_string(), production: "x".to_string() });
        assert_eq!(retry.backtrack_to, Some(2));
        assert_eq!(retry.display, "<A>yx<A>z");

        assert_eq!(trace.len(), 14);
        assert_eq!(trace.verdict(), Verdict::Accepted);
        assert_back_references(&trace);
    }

    #[test]
    fn empty_productions() {
        let grammars = vec!["<S> :=", "<S> := <A>\n<A> :=", "<S> := a<S> |", "<S> := <A>b\n<A> := a |"];
        let inputs = vec!["", "", "a", "b"];
        let answers = vec![
            (Verdict::Accepted, 3),
            (Verdict::Accepted, 4),
            (Verdict::Unresolved, 2),
            (Verdict::Unresolved, 2),
        ];

        for ((grammar, input), answer) in zip(zip(grammars, inputs), answers) {
            let top_down = match_top_down(&parse_str(grammar).unwrap(), input);
            assert_eq!(top_down.verdict(), Verdict::Accepted, "{:?}", grammar);

            let trace = run(grammar, input);
            assert_eq!((trace.verdict(), trace.len()), answer, "{:?}", grammar);
            if answer.0 == Verdict::Unresolved {
                assert_eq!(trace.last().unwrap().action, Action::Inconclusive);
            }
        }
    }

    #[test]
    fn empty_form_reduces_through_empty_production() {
        let trace = run("<S> := <A>\n<A> :=", "");

        assert_eq!(trace.get(1).unwrap().selected, Some(Candidate::reduction("<A>", "", 0..0)));
        assert_eq!(trace.get(1).unwrap().display, "<A>");
        assert_eq!(trace.last().unwrap().display, "<S>");
    }
}
