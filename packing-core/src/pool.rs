use crate::objective::{compare, SolutionAggregates};

/// Bounded set of the best-so-far solutions ordered by the objective
/// comparator (spec §4.2). Used both as the global result store of
/// `optimize` and as the pricing-oracle output container of column
/// generation.
///
/// Kept sorted best-first on every insertion so `best`/`worst` are O(1).
pub struct SolutionPool<S> {
    capacity: usize,
    // Sorted best-first.
    solutions: Vec<S>,
}

impl<S: SolutionAggregates + Clone> SolutionPool<S> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "a solution pool must hold at least one solution");
        SolutionPool {
            capacity,
            solutions: Vec::new(),
        }
    }

    /// Inserts `solution` in sorted position, dropping the worst element if
    /// the pool is now over capacity. Returns `true` iff `solution` became
    /// (tied for) the new best, i.e. the pool strictly improved or this is
    /// the first solution inserted.
    pub fn add(&mut self, solution: S) -> bool {
        let previous_best_better_than_new = self
            .solutions
            .first()
            .map(|best| compare(best, &solution).is_gt())
            .unwrap_or(false);

        let pos = self
            .solutions
            .iter()
            .position(|existing| compare(&solution, existing).is_ge())
            .unwrap_or(self.solutions.len());
        self.solutions.insert(pos, solution);

        if self.solutions.len() > self.capacity {
            self.solutions.pop();
        }

        let is_new_best = !previous_best_better_than_new;
        if is_new_best {
            tracing::trace!(pool_size = self.solutions.len(), "pool best improved");
        }
        is_new_best
    }

    pub fn best(&self) -> Option<&S> {
        self.solutions.first()
    }

    pub fn worst(&self) -> Option<&S> {
        self.solutions.last()
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.solutions.iter()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
