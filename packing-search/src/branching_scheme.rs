use packing_core::SolutionAggregates;

/// The scalar combining function used to order the beam at each tree level
/// (spec §4.3, §9 "Dynamic guide dispatch"). Encoded as a tagged enum
/// evaluated inline rather than through virtual dispatch, matching how
/// `aries_solver::solver::search::Decision` keeps its payload a plain enum.
///
/// Guide families 0..8 follow the combinations enumerated in the original
/// solver: ratio of used volume to item volume, optionally normalized by the
/// mean item volume, and optionally weighted by axle-weight surplus or
/// per-layer length expectations. Each variant's `BranchingScheme`
/// implementation decides which of these its node state supports; unused
/// components are treated as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuideKind {
    /// `used_volume / item_volume`.
    FillRatio,
    /// `FillRatio`, normalized by the mean item volume.
    FillRatioNormalized,
    /// `FillRatio` weighted with waste.
    WasteWeighted,
    /// `FillRatio` weighted with waste, normalized.
    WasteWeightedNormalized,
    /// `FillRatio` weighted with axle-weight surplus (boxstacks).
    AxleWeightWeighted,
    /// `AxleWeightWeighted`, normalized.
    AxleWeightWeightedNormalized,
    /// `FillRatio` weighted with per-layer expected remaining length.
    LayerLengthWeighted,
    /// `LayerLengthWeighted`, normalized.
    LayerLengthWeightedNormalized,
    /// Pure number-of-items count (coarsest, cheapest guide).
    ItemCount,
}

impl GuideKind {
    pub const ALL: [GuideKind; 9] = [
        GuideKind::FillRatio,
        GuideKind::FillRatioNormalized,
        GuideKind::WasteWeighted,
        GuideKind::WasteWeightedNormalized,
        GuideKind::AxleWeightWeighted,
        GuideKind::AxleWeightWeightedNormalized,
        GuideKind::LayerLengthWeighted,
        GuideKind::LayerLengthWeightedNormalized,
        GuideKind::ItemCount,
    ];
}

/// The variant-specific search-tree shape (spec §4.3).
///
/// All operations are queried through this trait; the tree-search engine
/// (`crate::beam_search`) never introspects `Node` directly. A
/// `BranchingScheme` is typically a thin wrapper around a shared
/// `Rc<Instance>` plus the chosen [`GuideKind`] pair.
pub trait BranchingScheme {
    /// Opaque partial-placement state. Cheap to clone (normally an
    /// `Rc`-based parent-pointer tree node).
    type Node: Clone;
    /// The variant's solution type, returned by `to_solution`.
    type Solution: SolutionAggregates + Clone;

    /// The empty partial placement.
    fn root(&self) -> Self::Node;

    /// All insertions legal from `parent`. Order is not required.
    fn children(&self, parent: &Self::Node) -> Vec<Self::Node>;

    /// Dominance in the meta-objective: `true` iff `a` beats `b`.
    fn better(&self, a: &Self::Node, b: &Self::Node) -> bool;

    /// Pruning predicate: `true` iff `node` cannot improve on
    /// `worst_in_pool` (`None` when the pool is still empty, in which case
    /// nothing should be pruned on this basis).
    fn bound(&self, node: &Self::Node, worst_in_pool: Option<&Self::Solution>) -> bool;

    /// `true` iff no more items can be added to `node`.
    fn leaf(&self, node: &Self::Node) -> bool;

    /// Local dominance used to prune the beam: `true` iff any descendant of
    /// `b` is also reachable (no worse) from `a`.
    fn dominates(&self, a: &Self::Node, b: &Self::Node) -> bool;

    /// The guide value ordering the beam at a given level; lower is better.
    fn guide(&self, node: &Self::Node) -> f64;

    /// Deterministic tie-break id, monotonically increasing in creation
    /// order (spec §4.4 "Ordering guarantee").
    fn node_id(&self, node: &Self::Node) -> u64;

    fn to_solution(&self, node: &Self::Node) -> Self::Solution;
}
