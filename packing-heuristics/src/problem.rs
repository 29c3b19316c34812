use packing_core::{SolutionAggregates, Timer};

/// Variant-agnostic view a meta-heuristic needs of a multi-bin-type packing
/// problem: per-item-type demand/space/profit, per-bin-type cost/copies, and
/// a way to delegate a single-bin subproblem to the tree-search engine
/// (spec §2 "each reduces its problem to a sequence of subproblems,
/// delegating each to the tree-search engine via a callback").
///
/// A variant crate implements this once (see
/// `packing_onedimensional::heuristics::OneDimensionalProblem`) so that
/// `sequential_value_correction`, `dichotomic_search`,
/// `column_generation` and `vbpp_to_bpp` stay variant-agnostic, the same way
/// `packing_search::BranchingScheme` keeps the tree-search engine
/// variant-agnostic.
pub trait PackingProblem {
    type Solution: SolutionAggregates + Clone;

    fn number_of_item_types(&self) -> usize;
    fn number_of_bin_types(&self) -> usize;

    fn item_profit(&self, item_type_id: usize) -> i64;
    fn item_space(&self, item_type_id: usize) -> i64;
    fn item_demand(&self, item_type_id: usize) -> u32;

    fn bin_cost(&self, bin_type_id: usize) -> i64;
    fn bin_space(&self, bin_type_id: usize) -> i64;
    fn bin_copies(&self, bin_type_id: usize) -> u32;
    fn bin_copies_min(&self, bin_type_id: usize) -> u32;

    /// An empty solution of the full (multi-bin) problem, to accumulate
    /// chosen patterns into.
    fn empty_solution(&self) -> Self::Solution;

    /// Solves a single-bin Knapsack subproblem for `bin_type_id` via tree
    /// search, with per-item-type profits overridden by `profits` and
    /// copies capped by `demand_cap`. Returns a solution with at most one
    /// bin; profit is 0 and no items are placed if nothing fits.
    fn solve_single_bin_knapsack(
        &self,
        bin_type_id: usize,
        profits: &[f64],
        demand_cap: &[u32],
        timer: &Timer,
    ) -> Self::Solution;

    /// Solves a BinPacking subproblem restricted to exactly `bin_counts`
    /// copies of each bin type. Returns `Some(solution)` with every item
    /// placed if the multiset suffices, `None` otherwise.
    fn solve_bin_packing(&self, bin_counts: &[u32], timer: &Timer) -> Option<Self::Solution>;

    /// Per-item-type copies placed in a single-bin `solution`.
    fn solution_item_counts(&self, solution: &Self::Solution) -> Vec<u32>;

    /// Appends `copies` copies of single-bin `pattern` (packed for
    /// `bin_type_id`) into `solution` — the universal `append` glue
    /// operation of spec §4.1.
    fn append_pattern(&self, solution: &mut Self::Solution, pattern: &Self::Solution, bin_type_id: usize, copies: u32);

    /// Solves the full multi-bin problem directly via the tree-search
    /// engine, when the instance is small enough for that (spec §4.9's
    /// direct-tree-search branch — e.g. a single-bin Knapsack, or a
    /// BinPacking instance with a single bin type). A variant crate
    /// overrides this to call its own `solve()` wrapping beam search;
    /// the default says "decompose with a meta-heuristic instead".
    fn solve_tree_search(&self, _timer: &Timer) -> Option<Self::Solution> {
        None
    }

    fn total_item_space(&self) -> i64 {
        (0..self.number_of_item_types())
            .map(|i| self.item_space(i) * self.item_demand(i) as i64)
            .sum()
    }
}
