use std::time::Duration;

use crossbeam_channel::select;
use packing_core::{Objective, SolutionAggregates, Timer};
use packing_heuristics::{
    column_generation, dichotomic_search, sequential_value_correction, vbpp_to_bpp_warm_start, ColumnGenerationParams,
    DichotomicSearchParams, PackingProblem, SvcParams,
};
use tracing::info;

use crate::algorithm_formatter::AlgorithmFormatter;

/// How much a worker's incumbent is shared with the others while the run is
/// in progress (spec §5):
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedResourcePolicy {
    /// Workers run concurrently and immediately publish every improving
    /// solution/bound into the shared pool (default).
    Anytime,
    /// Workers run concurrently but only publish their own final result,
    /// not intermediate improvements.
    NotAnytime,
    /// Workers run one after another, not concurrently at all — used when
    /// the underlying solvers are not safely re-entrant in parallel.
    NotAnytimeSequential,
}

pub struct OptimizeParams {
    pub shared_resource_policy: SharedResourcePolicy,
    pub pool_capacity: usize,
}

impl Default for OptimizeParams {
    fn default() -> Self {
        OptimizeParams {
            shared_resource_policy: SharedResourcePolicy::Anytime,
            pool_capacity: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Algorithm {
    TreeSearch,
    SequentialValueCorrection,
    DichotomicSearch,
    ColumnGeneration,
}

impl Algorithm {
    fn name(self) -> &'static str {
        match self {
            Algorithm::TreeSearch => "tree_search",
            Algorithm::SequentialValueCorrection => "sequential_value_correction",
            Algorithm::DichotomicSearch => "dichotomic_search",
            Algorithm::ColumnGeneration => "column_generation",
        }
    }
}

/// Picks which algorithms to race, based on the objective and a few
/// instance statistics (spec §4.9's dispatch table):
///  - single-bin Knapsack (one bin type, `copies <= 1`): tree search alone
///    is exact and fast enough, no need for a meta-heuristic.
///  - multi-bin Knapsack with high average item density (total item space
///    close to total bin space): column generation finds near-optimal
///    covers faster than growing a single beam search over many bins.
///  - BinPacking: a single bin type reduces straight to tree search;
///    several bin types and many items per bin favor SVC's greedy covers.
///  - VariableSizedBinPacking: dichotomic search when there are few bin
///    types (cheap to bisect over), column generation otherwise.
fn select_algorithms<P: PackingProblem>(problem: &P) -> Vec<Algorithm> {
    let objective = problem.empty_solution().objective();
    let number_of_bin_types = problem.number_of_bin_types();
    let total_item_space = problem.total_item_space();
    let total_bin_space: i64 = (0..number_of_bin_types).map(|i| problem.bin_space(i) * problem.bin_copies(i) as i64).sum();
    let density = if total_bin_space > 0 {
        total_item_space as f64 / total_bin_space as f64
    } else {
        0.0
    };

    match objective {
        Objective::Knapsack => {
            if number_of_bin_types == 1 && problem.bin_copies(0) <= 1 {
                vec![Algorithm::TreeSearch]
            } else if density > 0.8 {
                vec![Algorithm::ColumnGeneration, Algorithm::TreeSearch]
            } else {
                vec![Algorithm::TreeSearch, Algorithm::SequentialValueCorrection]
            }
        }
        Objective::BinPacking | Objective::BinPackingWithLeftovers => {
            if number_of_bin_types == 1 {
                vec![Algorithm::TreeSearch]
            } else {
                vec![Algorithm::ColumnGeneration, Algorithm::SequentialValueCorrection]
            }
        }
        Objective::VariableSizedBinPacking => {
            if number_of_bin_types <= 4 {
                vec![Algorithm::DichotomicSearch, Algorithm::ColumnGeneration]
            } else {
                vec![Algorithm::ColumnGeneration, Algorithm::SequentialValueCorrection]
            }
        }
        _ => vec![Algorithm::TreeSearch, Algorithm::SequentialValueCorrection],
    }
}

fn run_algorithm<P: PackingProblem>(
    problem: &P,
    algorithm: Algorithm,
    timer: &Timer,
    formatter: &AlgorithmFormatter<P::Solution>,
) {
    formatter.start(algorithm.name());
    let solution = match algorithm {
        Algorithm::TreeSearch => problem.solve_tree_search(timer),
        Algorithm::SequentialValueCorrection => {
            Some(sequential_value_correction(problem, &SvcParams::default(), timer))
        }
        Algorithm::DichotomicSearch => {
            let warm_start = vbpp_to_bpp_warm_start(problem, timer);
            if let Some(warm_start) = warm_start {
                formatter.update_solution(warm_start, algorithm.name());
            }
            dichotomic_search(problem, &DichotomicSearchParams::default(), timer)
        }
        Algorithm::ColumnGeneration => Some(column_generation(problem, &ColumnGenerationParams::default(), timer)),
    };

    if let Some(solution) = solution {
        formatter.update_solution(solution, algorithm.name());
    }
}

/// Runs every algorithm `select_algorithms` picks for `problem`'s objective
/// and instance statistics, racing them under `timer` and collecting every
/// improving solution into one shared pool (spec §4.9). Grounded on
/// `aries_solver::parallel_solver::ParSolver::race_solvers`, generalized
/// from "first solver to finish wins" (SAT) to "every worker keeps
/// reporting improving solutions until the timer ends" (optimization).
pub fn optimize<P>(problem: &P, params: &OptimizeParams, timer: &Timer) -> AlgorithmFormatter<P::Solution>
where
    P: PackingProblem + Sync,
    P::Solution: Send,
{
    let formatter = AlgorithmFormatter::new(params.pool_capacity);
    formatter.start("optimize");
    formatter.print_header();

    let algorithms = select_algorithms(problem);
    info!(algorithms = ?algorithms.iter().map(|a| a.name()).collect::<Vec<_>>(), "dispatching");

    match params.shared_resource_policy {
        SharedResourcePolicy::NotAnytimeSequential => {
            for algorithm in algorithms {
                if timer.needs_to_end() {
                    break;
                }
                run_algorithm(problem, algorithm, timer, &formatter);
            }
        }
        SharedResourcePolicy::Anytime | SharedResourcePolicy::NotAnytime => {
            let (done_tx, done_rx) = crossbeam_channel::unbounded();
            let mut remaining = algorithms.len();
            std::thread::scope(|scope| {
                for algorithm in algorithms {
                    let done_tx = done_tx.clone();
                    scope.spawn(|| {
                        run_algorithm(problem, algorithm, timer, &formatter);
                        // ignore delivery failure: the wait loop below may
                        // have already stopped polling once the timer ended.
                        let _ = done_tx.send(());
                    });
                }
                drop(done_tx);

                // Mirrors `aries_solver::parallel_solver::ParSolver::race_solvers`'s
                // `select!` loop: wait on worker completions with a
                // deadline-timeout branch, instead of blocking purely on
                // thread join. Each algorithm still polls `timer` itself to
                // wind down; this loop just stops waiting once nothing more
                // can be learned either way.
                while remaining > 0 {
                    let time_left = timer.remaining().unwrap_or(Duration::MAX);
                    select! {
                        recv(done_rx) -> _ => remaining -= 1,
                        default(time_left) => {
                            if timer.needs_to_end() {
                                break;
                            }
                        }
                    }
                }
            });
        }
    }

    formatter.end();
    formatter
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal stand-in for a variant's `Instance`, just rich enough to
    /// drive `select_algorithms`'s dispatch logic; the subproblem solvers
    /// are never called by these tests, so they are left unimplemented.
    struct DispatchOnlyProblem {
        objective: Objective,
        bin_spaces: Vec<i64>,
        bin_copies: Vec<u32>,
        total_item_space: i64,
    }

    #[derive(Clone)]
    struct UnusedSolution(Objective);

    impl SolutionAggregates for UnusedSolution {
        fn objective(&self) -> Objective {
            self.0
        }
        fn profit(&self) -> i64 {
            0
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
            0
        }
        fn x_max(&self) -> i64 {
            0
        }
        fn y_max(&self) -> i64 {
            0
        }
    }

    impl PackingProblem for DispatchOnlyProblem {
        type Solution = UnusedSolution;

        fn number_of_item_types(&self) -> usize {
            0
        }
        fn number_of_bin_types(&self) -> usize {
            self.bin_spaces.len()
        }
        fn item_profit(&self, _: usize) -> i64 {
            0
        }
        fn item_space(&self, _: usize) -> i64 {
            0
        }
        fn item_demand(&self, _: usize) -> u32 {
            0
        }
        fn bin_cost(&self, _: usize) -> i64 {
            0
        }
        fn bin_space(&self, bin_type_id: usize) -> i64 {
            self.bin_spaces[bin_type_id]
        }
        fn bin_copies(&self, bin_type_id: usize) -> u32 {
            self.bin_copies[bin_type_id]
        }
        fn bin_copies_min(&self, _: usize) -> u32 {
            0
        }
        fn empty_solution(&self) -> UnusedSolution {
            UnusedSolution(self.objective)
        }
        fn solve_single_bin_knapsack(&self, _: usize, _: &[f64], _: &[u32], _: &Timer) -> UnusedSolution {
            unimplemented!("dispatch-only stub")
        }
        fn solve_bin_packing(&self, _: &[u32], _: &Timer) -> Option<UnusedSolution> {
            unimplemented!("dispatch-only stub")
        }
        fn solution_item_counts(&self, _: &UnusedSolution) -> Vec<u32> {
            unimplemented!("dispatch-only stub")
        }
        fn append_pattern(&self, _: &mut UnusedSolution, _: &UnusedSolution, _: usize, _: u32) {
            unimplemented!("dispatch-only stub")
        }
        fn total_item_space(&self) -> i64 {
            self.total_item_space
        }
    }

    #[test]
    fn single_bin_type_bin_packing_uses_tree_search_only() {
        let problem = DispatchOnlyProblem {
            objective: Objective::BinPacking,
            bin_spaces: vec![10],
            bin_copies: vec![10],
            total_item_space: 12,
        };
        assert_eq!(select_algorithms(&problem), vec![Algorithm::TreeSearch]);
    }

    #[test]
    fn many_bin_types_bin_packing_uses_column_generation_and_svc() {
        let problem = DispatchOnlyProblem {
            objective: Objective::BinPacking,
            bin_spaces: vec![10, 6],
            bin_copies: vec![10, 10],
            total_item_space: 12,
        };
        assert_eq!(
            select_algorithms(&problem),
            vec![Algorithm::ColumnGeneration, Algorithm::SequentialValueCorrection]
        );
    }

    #[test]
    fn few_bin_types_variable_sized_bin_packing_uses_dichotomic_search() {
        let problem = DispatchOnlyProblem {
            objective: Objective::VariableSizedBinPacking,
            bin_spaces: vec![10, 6],
            bin_copies: vec![10, 10],
            total_item_space: 12,
        };
        assert_eq!(
            select_algorithms(&problem),
            vec![Algorithm::DichotomicSearch, Algorithm::ColumnGeneration]
        );
    }
}
