use std::rc::Rc;
use std::sync::Arc;

use packing_core::{BinPos, BinTypeId, ItemTypeId, Objective, SolutionAggregates};
use packing_search::{BranchingScheme, GuideKind, NodeIdGenerator};

use crate::instance::Instance;
use crate::solution::Solution;

struct NodeInner {
    id: u64,
    parent: Option<Node>,
    /// Item type inserted by the move from `parent` to this node; `None` at
    /// the root.
    inserted_item_type_id: Option<ItemTypeId>,
    /// `Some(bin_type_id)` iff this move closed the previous bin (if any)
    /// and opened a new one of this type.
    opened_bin_type_id: Option<BinTypeId>,
    item_counts: Rc<Vec<u32>>,
    bin_counts: Rc<Vec<u32>>,
    /// Bin type of the currently open bin, `None` before the first insertion.
    current_bin_type_id: Option<BinTypeId>,
    length_used_in_bin: i64,
    weight_in_bin: f64,
    number_of_items: u32,
    number_of_bins: u32,
    profit: i64,
    item_length: i64,
    waste: i64,
}

/// Ref-counted partial-placement node with a parent pointer (spec §3
/// `BranchingSchemeNode`, §9 "Node ownership graphs"). Cheap to clone: a
/// beam entry is just an `Rc` to shared, immutable state.
#[derive(Clone)]
pub struct Node(Rc<NodeInner>);

impl Node {
    pub fn number_of_items(&self) -> u32 {
        self.0.number_of_items
    }
}

/// The skyline-style branching scheme for one-dimensional bin packing (spec
/// §4.3): at each step, either another item is appended to the currently
/// open bin, or the current bin is closed and a new one of some bin type is
/// opened with one item placed in it.
pub struct OneDimensionalBranchingScheme {
    instance: Arc<Instance>,
    guide_kind: GuideKind,
    ids: NodeIdGenerator,
}

impl OneDimensionalBranchingScheme {
    pub fn new(instance: Arc<Instance>, guide_kind: GuideKind) -> Self {
        OneDimensionalBranchingScheme {
            instance,
            guide_kind,
            ids: NodeIdGenerator::new(),
        }
    }

    fn remaining_demand(&self, node: &Node, item_type_id: ItemTypeId) -> u32 {
        let total = self.instance.item_type(item_type_id).copies;
        total.saturating_sub(node.0.item_counts[item_type_id.index()])
    }

    fn remaining_bin_copies(&self, node: &Node, bin_type_id: BinTypeId) -> u32 {
        let total = self.instance.bin_type(bin_type_id).copies;
        total.saturating_sub(node.0.bin_counts[bin_type_id.index()])
    }

    fn child_same_bin(&self, parent: &Node, item_type_id: ItemTypeId) -> Node {
        let mut item_counts = (*parent.0.item_counts).clone();
        item_counts[item_type_id.index()] += 1;
        let item = self.instance.item_type(item_type_id);
        Node(Rc::new(NodeInner {
            id: self.ids.next(),
            parent: Some(parent.clone()),
            inserted_item_type_id: Some(item_type_id),
            opened_bin_type_id: None,
            item_counts: Rc::new(item_counts),
            bin_counts: parent.0.bin_counts.clone(),
            current_bin_type_id: parent.0.current_bin_type_id,
            length_used_in_bin: parent.0.length_used_in_bin + item.length,
            weight_in_bin: parent.0.weight_in_bin + item.weight,
            number_of_items: parent.0.number_of_items + 1,
            number_of_bins: parent.0.number_of_bins,
            profit: parent.0.profit + item.profit,
            item_length: parent.0.item_length + item.length,
            waste: parent.0.waste,
        }))
    }

    fn child_new_bin(&self, parent: &Node, bin_type_id: BinTypeId, item_type_id: ItemTypeId) -> Node {
        let mut item_counts = (*parent.0.item_counts).clone();
        item_counts[item_type_id.index()] += 1;
        let mut bin_counts = (*parent.0.bin_counts).clone();
        bin_counts[bin_type_id.index()] += 1;
        let item = self.instance.item_type(item_type_id);
        let closed_waste = match parent.0.current_bin_type_id {
            Some(prev_bin) => self.instance.bin_type(prev_bin).length - parent.0.length_used_in_bin,
            None => 0,
        };
        Node(Rc::new(NodeInner {
            id: self.ids.next(),
            parent: Some(parent.clone()),
            inserted_item_type_id: Some(item_type_id),
            opened_bin_type_id: Some(bin_type_id),
            item_counts: Rc::new(item_counts),
            bin_counts: Rc::new(bin_counts),
            current_bin_type_id: Some(bin_type_id),
            length_used_in_bin: item.length,
            weight_in_bin: item.weight,
            number_of_items: parent.0.number_of_items + 1,
            number_of_bins: parent.0.number_of_bins + 1,
            profit: parent.0.profit + item.profit,
            item_length: parent.0.item_length + item.length,
            waste: parent.0.waste + closed_waste,
        }))
    }

    /// Final waste of a node once its currently open bin is closed too.
    fn waste_including_open_bin(&self, node: &Node) -> i64 {
        match node.0.current_bin_type_id {
            Some(bin) => node.0.waste + (self.instance.bin_type(bin).length - node.0.length_used_in_bin),
            None => node.0.waste,
        }
    }

    /// Remaining achievable profit assuming every remaining item copy of
    /// every eligible type could still be packed, ignoring bin capacity
    /// (spec §4.3 "Bound"): a loose but admissible upper bound for
    /// maximization objectives.
    fn remaining_profit_bound(&self, node: &Node) -> i64 {
        let mut bound = node.0.profit;
        for (id, item) in self.instance.item_types() {
            let remaining = self.remaining_demand(node, id);
            bound += remaining as i64 * item.profit;
        }
        bound
    }
}

impl BranchingScheme for OneDimensionalBranchingScheme {
    type Node = Node;
    type Solution = Solution;

    fn root(&self) -> Node {
        Node(Rc::new(NodeInner {
            id: self.ids.next(),
            parent: None,
            inserted_item_type_id: None,
            opened_bin_type_id: None,
            item_counts: Rc::new(vec![0; self.instance.number_of_item_types()]),
            bin_counts: Rc::new(vec![0; self.instance.number_of_bin_types()]),
            current_bin_type_id: None,
            length_used_in_bin: 0,
            weight_in_bin: 0.0,
            number_of_items: 0,
            number_of_bins: 0,
            profit: 0,
            item_length: 0,
            waste: 0,
        }))
    }

    fn children(&self, parent: &Node) -> Vec<Node> {
        let mut children = Vec::new();

        if let Some(bin_type_id) = parent.0.current_bin_type_id {
            let bin = self.instance.bin_type(bin_type_id);
            for (item_type_id, item) in self.instance.item_types() {
                if self.remaining_demand(parent, item_type_id) == 0 {
                    continue;
                }
                if !self.instance.bin_accepts(bin_type_id, item_type_id) {
                    continue;
                }
                let fits_length = parent.0.length_used_in_bin + item.length <= bin.length;
                let fits_weight = parent.0.weight_in_bin + item.weight <= bin.maximum_weight;
                if fits_length && fits_weight {
                    children.push(self.child_same_bin(parent, item_type_id));
                }
            }
        }

        for (bin_type_id, bin) in self.instance.bin_types() {
            if self.remaining_bin_copies(parent, bin_type_id) == 0 {
                continue;
            }
            for (item_type_id, item) in self.instance.item_types() {
                if self.remaining_demand(parent, item_type_id) == 0 {
                    continue;
                }
                if !self.instance.bin_accepts(bin_type_id, item_type_id) {
                    continue;
                }
                if item.length <= bin.length && item.weight <= bin.maximum_weight {
                    children.push(self.child_new_bin(parent, bin_type_id, item_type_id));
                }
            }
        }

        children
    }

    fn better(&self, a: &Node, b: &Node) -> bool {
        packing_core::better(&self.to_solution(a), &self.to_solution(b))
    }

    fn bound(&self, node: &Node, worst_in_pool: Option<&Solution>) -> bool {
        let worst = match worst_in_pool {
            Some(w) => w,
            None => return false,
        };
        match self.instance.objective() {
            Objective::Knapsack | Objective::Default => {
                self.remaining_profit_bound(node) <= worst.profit()
            }
            _ => false,
        }
    }

    fn leaf(&self, node: &Node) -> bool {
        self.children(node).is_empty()
    }

    fn dominates(&self, a: &Node, b: &Node) -> bool {
        if a.0.current_bin_type_id != b.0.current_bin_type_id {
            return false;
        }
        if a.0.number_of_bins > b.0.number_of_bins {
            return false;
        }
        if a.0.profit < b.0.profit {
            return false;
        }
        if a.0.length_used_in_bin > b.0.length_used_in_bin {
            return false;
        }
        if a.0.weight_in_bin > b.0.weight_in_bin {
            return false;
        }
        a.0.item_counts
            .iter()
            .zip(b.0.item_counts.iter())
            .all(|(ca, cb)| ca <= cb)
    }

    fn guide(&self, node: &Node) -> f64 {
        let waste = self.waste_including_open_bin(node) as f64;
        let item_volume = node.0.item_length as f64;
        match self.guide_kind {
            GuideKind::ItemCount => -(node.0.number_of_items as f64),
            _ if item_volume <= 0.0 => 0.0,
            _ => waste / item_volume,
        }
    }

    fn node_id(&self, node: &Node) -> u64 {
        node.0.id
    }

    fn to_solution(&self, node: &Node) -> Solution {
        let mut moves = Vec::new();
        let mut cursor = Some(node.clone());
        while let Some(n) = cursor {
            if let Some(item_type_id) = n.0.inserted_item_type_id {
                moves.push((n.0.opened_bin_type_id, item_type_id));
            }
            cursor = n.0.parent.clone();
        }
        moves.reverse();

        let mut solution = Solution::new(self.instance.clone());
        let mut current_bin_pos: Option<BinPos> = None;
        for (opened_bin_type_id, item_type_id) in moves {
            let bin_pos = match opened_bin_type_id {
                Some(bin_type_id) => {
                    let pos = solution.add_bin(bin_type_id, 1).expect("bin copies >= 1");
                    current_bin_pos = Some(pos);
                    pos
                }
                None => current_bin_pos.expect("same-bin move requires an open bin"),
            };
            solution
                .add_item(bin_pos, item_type_id)
                .expect("item fits by construction of `children`");
        }
        solution
    }
}
