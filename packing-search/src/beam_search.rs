use crate::branching_scheme::BranchingScheme;
use packing_core::{SolutionPool, Timer};

/// Parameters of one `beam_search` run (spec §4.4).
#[derive(Debug, Clone)]
pub struct BeamSearchParams {
    /// Initial queue size.
    pub q_min: usize,
    /// Queue size ceiling; the search stops escalating past this.
    pub q_max: usize,
    /// Multiplicative growth applied to `q` between escalations.
    pub growth_factor: f64,
    /// Capacity of the returned solution pool.
    pub pool_capacity: usize,
}

impl Default for BeamSearchParams {
    fn default() -> Self {
        BeamSearchParams {
            q_min: 1,
            q_max: 1,
            growth_factor: 1.0,
            pool_capacity: 1,
        }
    }
}

impl BeamSearchParams {
    /// A single fixed-size pass, no escalation — the "not-anytime" shared
    /// resource policy of spec §5.
    pub fn fixed(q: usize) -> Self {
        BeamSearchParams {
            q_min: q,
            q_max: q,
            growth_factor: 1.0,
            pool_capacity: 1,
        }
    }

    /// An escalating "anytime" schedule.
    pub fn escalating(q_min: usize, q_max: usize, growth_factor: f64) -> Self {
        BeamSearchParams {
            q_min,
            q_max,
            growth_factor,
            pool_capacity: 1,
        }
    }

    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }
}

/// Runs iterative beam search v2 (spec §4.4) for `scheme` under `params`,
/// returning the pool of best solutions found. `new_solution_callback` fires
/// every time the pool's best solution improves — it receives the new best,
/// never stored state, so a caller may wire it to logging, testing oracles,
/// or a parent meta-heuristic without coupling (spec §9 "Callbacks").
///
/// The engine accesses `scheme` only through the `BranchingScheme`
/// operations; it never introspects `Node`.
pub fn beam_search<B: BranchingScheme>(
    scheme: &B,
    params: &BeamSearchParams,
    timer: &Timer,
    mut new_solution_callback: impl FnMut(&B::Solution),
) -> SolutionPool<B::Solution> {
    let mut pool = SolutionPool::new(params.pool_capacity);
    let mut q = params.q_min.max(1);

    loop {
        let mut level_beam = vec![scheme.root()];

        loop {
            if timer.needs_to_end() {
                break;
            }

            let mut children: Vec<B::Node> = level_beam
                .iter()
                .flat_map(|n| scheme.children(n))
                .collect();

            if children.is_empty() {
                break;
            }

            children.retain(|c| !scheme.bound(c, pool.worst()));

            for c in &children {
                if scheme.leaf(c) {
                    let solution = scheme.to_solution(c);
                    if pool.add(solution) {
                        if let Some(best) = pool.best() {
                            new_solution_callback(best);
                        }
                    }
                }
            }

            // Sort by guide order (low-first), ties broken by node id so
            // that expansion order is deterministic (spec §4.4).
            children.sort_by(|a, b| {
                scheme
                    .guide(a)
                    .partial_cmp(&scheme.guide(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| scheme.node_id(a).cmp(&scheme.node_id(b)))
            });

            // Prune nodes dominated by an earlier (better-or-equal-guide)
            // surviving node before truncating to the queue size.
            let mut kept: Vec<B::Node> = Vec::with_capacity(q.min(children.len()));
            for c in children.into_iter() {
                if kept.len() >= q {
                    break;
                }
                if kept.iter().any(|k| scheme.dominates(k, &c)) {
                    continue;
                }
                kept.push(c);
            }

            if kept.is_empty() {
                break;
            }
            level_beam = kept;
        }

        let next_q = (q + 1).max((q as f64 * params.growth_factor).ceil() as usize);
        if timer.needs_to_end() || next_q > params.q_max {
            break;
        }
        tracing::debug!(from = q, to = next_q, "escalating beam width");
        q = next_q;
    }

    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use packing_core::{Objective, SolutionAggregates};

    /// Trivial scheme: build up a sum of `1..=target` picking one unit item
    /// per step, profit increases by one per item, the goal being reached at
    /// `number_of_items == target`. Used only to exercise the engine's
    /// control flow, not a realistic packing variant.
    #[derive(Clone)]
    struct CounterNode {
        id: u64,
        count: u32,
    }

    #[derive(Clone)]
    struct CounterSolution {
        count: u32,
    }

    impl SolutionAggregates for CounterSolution {
        fn objective(&self) -> Objective {
            Objective::Knapsack
        }
        fn profit(&self) -> i64 {
            self.count as i64
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

    struct CounterScheme {
        target: u32,
        ids: crate::node_id::NodeIdGenerator,
    }

    impl BranchingScheme for CounterScheme {
        type Node = CounterNode;
        type Solution = CounterSolution;

        fn root(&self) -> Self::Node {
            CounterNode {
                id: self.ids.next(),
                count: 0,
            }
        }

        fn children(&self, parent: &Self::Node) -> Vec<Self::Node> {
            if parent.count >= self.target {
                vec![]
            } else {
                vec![CounterNode {
                    id: self.ids.next(),
                    count: parent.count + 1,
                }]
            }
        }

        fn better(&self, a: &Self::Node, b: &Self::Node) -> bool {
            a.count > b.count
        }

        fn bound(&self, _node: &Self::Node, _worst_in_pool: Option<&Self::Solution>) -> bool {
            false
        }

        fn leaf(&self, node: &Self::Node) -> bool {
            node.count == self.target
        }

        fn dominates(&self, _a: &Self::Node, _b: &Self::Node) -> bool {
            false
        }

        fn guide(&self, node: &Self::Node) -> f64 {
            -(node.count as f64)
        }

        fn node_id(&self, node: &Self::Node) -> u64 {
            node.id
        }

        fn to_solution(&self, node: &Self::Node) -> Self::Solution {
            CounterSolution { count: node.count }
        }
    }

    #[test]
    fn reaches_the_leaf_and_reports_it() {
        let scheme = CounterScheme {
            target: 5,
            ids: crate::node_id::NodeIdGenerator::new(),
        };
        let timer = Timer::unlimited();
        let mut reports = Vec::new();
        let pool = beam_search(
            &scheme,
            &BeamSearchParams::fixed(2),
            &timer,
            |s: &CounterSolution| reports.push(s.count),
        );
        assert_eq!(pool.best().map(|s| s.count), Some(5));
        assert_eq!(reports, vec![5]);
    }

    #[test]
    fn reports_are_monotonically_improving() {
        // A scheme reporting multiple distinct leaves of increasing count.
        #[derive(Clone)]
        struct MultiLeafNode {
            id: u64,
            count: u32,
        }
        struct MultiLeafScheme {
            max: u32,
            ids: crate::node_id::NodeIdGenerator,
        }
        impl BranchingScheme for MultiLeafScheme {
            type Node = MultiLeafNode;
            type Solution = CounterSolution;
            fn root(&self) -> Self::Node {
                MultiLeafNode {
                    id: self.ids.next(),
                    count: 0,
                }
            }
            fn children(&self, parent: &Self::Node) -> Vec<Self::Node> {
                if parent.count >= self.max {
                    vec![]
                } else {
                    vec![MultiLeafNode {
                        id: self.ids.next(),
                        count: parent.count + 1,
                    }]
                }
            }
            fn better(&self, a: &Self::Node, b: &Self::Node) -> bool {
                a.count > b.count
            }
            fn bound(&self, _node: &Self::Node, _worst_in_pool: Option<&Self::Solution>) -> bool {
                false
            }
            fn leaf(&self, node: &Self::Node) -> bool {
                node.count >= 1
            }
            fn dominates(&self, _a: &Self::Node, _b: &Self::Node) -> bool {
                false
            }
            fn guide(&self, node: &Self::Node) -> f64 {
                -(node.count as f64)
            }
            fn node_id(&self, node: &Self::Node) -> u64 {
                node.id
            }
            fn to_solution(&self, node: &Self::Node) -> Self::Solution {
                CounterSolution { count: node.count }
            }
        }

        let scheme = MultiLeafScheme {
            max: 4,
            ids: crate::node_id::NodeIdGenerator::new(),
        };
        let timer = Timer::unlimited();
        let mut reports = Vec::new();
        let _ = beam_search(
            &scheme,
            &BeamSearchParams::fixed(4),
            &timer,
            |s: &CounterSolution| reports.push(s.count),
        );
        for w in reports.windows(2) {
            assert!(w[1] > w[0], "reports must strictly improve: {:?}", reports);
        }
    }
}
