/// A saved choice: the state at the moment of choosing, every alternative
/// that was available, and how many of them have been tried.
#[derive(Debug, Clone)]
pub struct BacktrackPoint<S, A> {
    pub snapshot: S,
    pub alternatives: Vec<A>,
    pub cursor: usize,
    // Id of the step that made the choice
    pub step: usize,
}

impl<S, A> BacktrackPoint<S, A> {
    /// A point whose first alternative is already applied.
    pub fn new(snapshot: S, alternatives: Vec<A>, step: usize) -> Self {
        BacktrackPoint { snapshot, alternatives, cursor: 1, step }
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.alternatives.len()
    }
}

/// The next untried alternative of a backtrack point, handed back to the
/// matcher together with a copy of the state it applies to.
#[derive(Debug, Clone)]
pub struct Resumption<S, A> {
    pub snapshot: S,
    pub alternatives: Vec<A>,
    pub chosen: usize,
    pub step: usize,
}

impl<S, A> Resumption<S, A> {
    pub fn alternative(&self) -> &A {
        &self.alternatives[self.chosen]
    }
}

#[derive(Debug)]
pub struct BacktrackStack<S, A> {
    points: Vec<BacktrackPoint<S, A>>,
}

impl<S, A> Default for BacktrackStack<S, A> {
    fn default() -> Self {
        BacktrackStack { points: Vec::new() }
    }
}

impl<S: Clone, A: Clone> BacktrackStack<S, A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: BacktrackPoint<S, A>) {
        self.points.push(point);
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.points.len()
    }

    /// Pops points until one still has an untried alternative. That
    /// alternative is claimed and the point goes back on the stack with its
    /// cursor advanced. Exhausted points are discarded; `abandon` sees each
    /// one that is dropped while older points remain below it.
    pub fn resume(&mut self, mut abandon: impl FnMut(&BacktrackPoint<S, A>)) -> Option<Resumption<S, A>> {
        while let Some(mut point) = self.points.pop() {
            if !point.is_exhausted() {
                let resumption = Resumption {
                    snapshot: point.snapshot.clone(),
                    alternatives: point.alternatives.clone(),
                    chosen: point.cursor,
                    step: point.step,
                };
                point.cursor += 1;
                self.points.push(point);
                return Some(resumption);
            }

            if !self.points.is_empty() {
                abandon(&point);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_walks_alternatives_in_order() {
        let mut stack = BacktrackStack::new();
        stack.push(BacktrackPoint::new("form", vec!['a', 'b', 'c'], 3));

        let first = stack.resume(|_| panic!("nothing to abandon")).unwrap();
        assert_eq!(*first.alternative(), 'b');
        assert_eq!(first.step, 3);
        assert_eq!(first.snapshot, "form");

        let second = stack.resume(|_| panic!("nothing to abandon")).unwrap();
        assert_eq!(*second.alternative(), 'c');
        assert_eq!(stack.depth(), 1);

        assert!(stack.resume(|_| panic!("last point is not reported")).is_none());
        assert!(stack.is_empty());
    }

    #[test]
    fn resume_cascades_through_exhausted_points() {
        let mut stack = BacktrackStack::new();
        stack.push(BacktrackPoint::new(0, vec!["x", "y"], 0));
        stack.push(BacktrackPoint::new(1, vec!["p"], 4));
        stack.push(BacktrackPoint::new(2, vec!["q", "r"], 7));
        stack.resume(|_| ()).unwrap();

        let mut abandoned = Vec::new();
        let resumption = stack.resume(|point| abandoned.push(point.step)).unwrap();

        assert_eq!(abandoned, vec![7, 4]);
        assert_eq!(resumption.step, 0);
        assert_eq!(*resumption.alternative(), "y");
        assert_eq!(stack.depth(), 1);
    }
}
