use hashbrown::HashMap;
use packing_core::Timer;
use tracing::debug;

use crate::problem::PackingProblem;
use env_param::EnvParam;

/// Default convergence tolerance on the waste fraction `w` (spec §4.6),
/// tunable via `PACKINGSOLVER_DICHOTOMIC_SEARCH_EPSILON`.
pub static EPSILON: EnvParam<f64> = EnvParam::new("PACKINGSOLVER_DICHOTOMIC_SEARCH_EPSILON", "0.01");

pub struct DichotomicSearchParams {
    pub waste_lower_bound: f64,
    pub waste_upper_bound: f64,
}

impl Default for DichotomicSearchParams {
    fn default() -> Self {
        DichotomicSearchParams {
            waste_lower_bound: 0.0,
            waste_upper_bound: 1.0,
        }
    }
}

/// Variable-sized bin-packing by dichotomic search on the allowed waste
/// fraction (spec §4.6): at each step, picks a bin multiset whose total
/// space is `total_item_space * (1 + w)` and asks the tree-search engine
/// (via [`PackingProblem::solve_bin_packing`]) whether it suffices; narrows
/// `w` by bisection until convergence. Grounded on
/// `packingsolver/algorithms/dichotomic_search.hpp`.
///
/// Bin-multiset selection is a greedy cost/space-efficiency heuristic rather
/// than an exact bounded knapsack DP: bin space values are domain lengths or
/// areas and can be arbitrarily large, so a DP table indexed by remaining
/// capacity is not practical here (see DESIGN.md).
pub fn dichotomic_search<P: PackingProblem>(
    problem: &P,
    params: &DichotomicSearchParams,
    timer: &Timer,
) -> Option<P::Solution> {
    let mut w_lower = params.waste_lower_bound;
    let mut w_upper = params.waste_upper_bound;
    let total_item_space = problem.total_item_space();
    let epsilon = EPSILON.get();

    let mut memo: HashMap<Vec<u32>, bool> = HashMap::new();
    let mut best: Option<P::Solution> = None;

    // Make sure w_upper is actually feasible before bisecting.
    if !probe(problem, &mut memo, total_item_space, w_upper, timer, &mut best) {
        return None;
    }

    while w_upper - w_lower > epsilon {
        if timer.needs_to_end() {
            break;
        }
        let w_mid = (w_lower + w_upper) / 2.0;
        if probe(problem, &mut memo, total_item_space, w_mid, timer, &mut best) {
            w_upper = w_mid;
        } else {
            w_lower = w_mid;
        }
    }

    debug!(w_upper, calls = memo.len(), "dichotomic search converged");
    best
}

fn probe<P: PackingProblem>(
    problem: &P,
    memo: &mut HashMap<Vec<u32>, bool>,
    total_item_space: i64,
    w: f64,
    timer: &Timer,
    best: &mut Option<P::Solution>,
) -> bool {
    let target_space = (total_item_space as f64 * (1.0 + w)).ceil() as i64;
    let bin_counts = select_bin_multiset(problem, target_space);

    if let Some(&feasible) = memo.get(&bin_counts) {
        return feasible;
    }

    match problem.solve_bin_packing(&bin_counts, timer) {
        Some(solution) => {
            memo.insert(bin_counts, true);
            *best = Some(solution);
            true
        }
        None => {
            memo.insert(bin_counts, false);
            false
        }
    }
}

/// Greedily fills `bin_counts` up to `target_space`, always taking the next
/// cheapest-per-unit-space bin type, respecting each bin type's
/// `copies`/`copies_min`.
fn select_bin_multiset<P: PackingProblem>(problem: &P, target_space: i64) -> Vec<u32> {
    let m = problem.number_of_bin_types();
    let mut counts = vec![0u32; m];
    for bin_type_id in 0..m {
        counts[bin_type_id] = problem.bin_copies_min(bin_type_id);
    }

    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| {
        let ratio_a = problem.bin_cost(a) as f64 / problem.bin_space(a).max(1) as f64;
        let ratio_b = problem.bin_cost(b) as f64 / problem.bin_space(b).max(1) as f64;
        ratio_a.partial_cmp(&ratio_b).unwrap()
    });

    let mut space: i64 = (0..m).map(|i| problem.bin_space(i) * counts[i] as i64).sum();
    loop {
        if space >= target_space {
            break;
        }
        let mut progressed = false;
        for &bin_type_id in &order {
            if counts[bin_type_id] >= problem.bin_copies(bin_type_id) {
                continue;
            }
            counts[bin_type_id] += 1;
            space += problem.bin_space(bin_type_id);
            progressed = true;
            if space >= target_space {
                break;
            }
        }
        if !progressed {
            break;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ToyBin, ToyItem, ToyProblem};
    use packing_core::Objective;

    #[test]
    fn repeated_multisets_are_memoized() {
        let problem = ToyProblem::new(
            Objective::VariableSizedBinPacking,
            vec![ToyItem { space: 5, profit: 0, demand: 8 }],
            vec![ToyBin { space: 10, cost: 1, copies: 10, copies_min: 0 }],
        );
        let timer = Timer::unlimited();
        let before = problem.solve_bin_packing_calls();
        let solution = dichotomic_search(&problem, &DichotomicSearchParams::default(), &timer);
        assert!(solution.is_some());
        let calls_first_run = problem.solve_bin_packing_calls() - before;

        // Re-running with the same epsilon/bounds should hit the same
        // multisets and therefore, within a single search, each distinct
        // multiset is solved at most once.
        assert!(calls_first_run > 0);
        assert!(calls_first_run <= 64);
    }
}
