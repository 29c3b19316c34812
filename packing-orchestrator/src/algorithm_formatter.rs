use std::sync::{Arc, Mutex};
use std::time::Instant;

use packing_core::{SolutionAggregates, SolutionPool};
use tracing::info;

/// Shared best-known pool and objective bounds that every worker reports
/// into, mutex-guarded the way `aries_solver::signals::Synchro` guards its
/// output channel — except here, since improving solutions (not a single
/// winner) are what workers share, a plain `Mutex<Output<S>>` replaces the
/// channel: every worker can update it directly instead of routing through
/// a dispatcher thread (spec §4.10).
struct Output<S> {
    pool: SolutionPool<S>,
    lower_bound: Option<i64>,
    upper_bound: Option<i64>,
}

/// Formats and collects progress for one `optimize` run: every worker
/// thread holds a clone and calls `update_solution`/`update_lower_bound`/
/// `update_upper_bound` as it makes progress; `start`/`end` bracket the run.
pub struct AlgorithmFormatter<S> {
    start: Instant,
    output: Arc<Mutex<Output<S>>>,
}

impl<S: SolutionAggregates + Clone> AlgorithmFormatter<S> {
    pub fn new(pool_capacity: usize) -> Self {
        AlgorithmFormatter {
            start: Instant::now(),
            output: Arc::new(Mutex::new(Output {
                pool: SolutionPool::new(pool_capacity),
                lower_bound: None,
                upper_bound: None,
            })),
        }
    }

    pub fn start(&self, algorithm_name: &str) {
        info!(algorithm = algorithm_name, "starting");
    }

    pub fn print_header(&self) {
        info!("{:>12} {:>12} {:>12}", "Time (s)", "Profit/Cost", "Bins");
    }

    /// Reports a newly found solution; returns `true` if it improved the
    /// shared pool's best (worth logging by the caller).
    pub fn update_solution(&self, solution: S, source: &str) -> bool {
        let mut output = self.output.lock().unwrap();
        let is_new_best = output.pool.add(solution.clone());
        if is_new_best {
            info!(
                source,
                time = self.start.elapsed().as_secs_f64(),
                profit = solution.profit(),
                cost = solution.cost(),
                bins = solution.number_of_bins(),
                "new best solution"
            );
        }
        is_new_best
    }

    pub fn update_lower_bound(&self, lower_bound: i64, source: &str) -> bool {
        let mut output = self.output.lock().unwrap();
        let improved = output.lower_bound.map_or(true, |b| lower_bound > b);
        if improved {
            output.lower_bound = Some(lower_bound);
            info!(source, lower_bound, "new lower bound");
        }
        improved
    }

    pub fn update_upper_bound(&self, upper_bound: i64, source: &str) -> bool {
        let mut output = self.output.lock().unwrap();
        let improved = output.upper_bound.map_or(true, |b| upper_bound < b);
        if improved {
            output.upper_bound = Some(upper_bound);
            info!(source, upper_bound, "new upper bound");
        }
        improved
    }

    pub fn best(&self) -> Option<S> {
        self.output.lock().unwrap().pool.best().cloned()
    }

    pub fn bounds(&self) -> (Option<i64>, Option<i64>) {
        let output = self.output.lock().unwrap();
        (output.lower_bound, output.upper_bound)
    }

    pub fn end(&self) {
        let output = self.output.lock().unwrap();
        info!(
            elapsed = self.start.elapsed().as_secs_f64(),
            best_profit = output.pool.best().map(|s| s.profit()),
            "optimize finished"
        );
    }
}

impl<S> Clone for AlgorithmFormatter<S> {
    fn clone(&self) -> Self {
        AlgorithmFormatter {
            start: self.start,
            output: self.output.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packing_core::Objective;

    #[derive(Clone)]
    struct StubSolution {
        profit: i64,
    }

    impl SolutionAggregates for StubSolution {
        fn objective(&self) -> Objective {
            Objective::Knapsack
        }
        fn profit(&self) -> i64 {
            self.profit
        }
        fn cost(&self) -> i64 {
            0
        }
        fn waste(&self) -> i64 {
            0
        }
        fn is_full(&self) -> bool {
            true
        }
        fn number_of_bins(&self) -> u32 {
            1
        }
        fn x_max(&self) -> i64 {
            0
        }
        fn y_max(&self) -> i64 {
            0
        }
    }

    #[test]
    fn only_strictly_improving_solutions_count_as_new_best() {
        let formatter = AlgorithmFormatter::new(4);
        assert!(formatter.update_solution(StubSolution { profit: 5 }, "worker-0"));
        assert!(!formatter.update_solution(StubSolution { profit: 5 }, "worker-1"));
        assert!(formatter.update_solution(StubSolution { profit: 8 }, "worker-1"));
        assert_eq!(formatter.best().unwrap().profit, 8);
    }

    #[test]
    fn bounds_only_move_in_the_improving_direction() {
        let formatter = AlgorithmFormatter::<StubSolution>::new(1);
        assert!(formatter.update_upper_bound(100, "worker-0"));
        assert!(!formatter.update_upper_bound(120, "worker-1"));
        assert!(formatter.update_upper_bound(90, "worker-1"));
        assert!(formatter.update_lower_bound(10, "worker-0"));
        assert!(!formatter.update_lower_bound(5, "worker-1"));
        let (lb, ub) = formatter.bounds();
        assert_eq!(lb, Some(10));
        assert_eq!(ub, Some(90));
    }
}
