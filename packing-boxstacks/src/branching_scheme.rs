use std::rc::Rc;
use std::sync::Arc;

use packing_core::{BinPos, BinTypeId, ItemTypeId, Objective};
use packing_search::{BranchingScheme, GuideKind, NodeIdGenerator};

use crate::instance::Instance;
use crate::solution::Solution;

/// Incremental state of one open stack (spec GLOSSARY "Stackability id"),
/// tracked without an ownership edge to the items inside it — only the
/// derived quantities branching needs.
#[derive(Clone)]
struct StackState {
    x0: i64,
    x1: i64,
    y0: i64,
    y1: i64,
    height_used: i64,
    items_count: u32,
    stackability_id: u32,
    /// Smallest `maximum_weight_above` slack still available across every
    /// item already in the stack (a simplification of the original's
    /// per-item weight-above bookkeeping; Non-goal excludes full axle
    /// modelling, see DESIGN.md).
    weight_above_budget: f64,
}

struct NodeInner {
    id: u64,
    parent: Option<Node>,
    inserted_item_type_id: Option<ItemTypeId>,
    inserted_rotation: u8,
    /// `Some(bin_type_id)` iff this move opened a new bin.
    opened_bin_type_id: Option<BinTypeId>,
    /// `Some(footprint)` iff this move opened a new stack (possibly along
    /// with a new bin); `None` continues the top of the last stack.
    opened_stack_footprint: Option<(i64, i64, i64, i64)>,
    item_counts: Rc<Vec<u32>>,
    bin_counts: Rc<Vec<u32>>,
    current_bin_type_id: Option<BinTypeId>,
    /// Stacks placed so far in the currently open bin, shelf-packed along x
    /// (spec §4.3 "skyline model" restricted to a single row — see
    /// DESIGN.md for why full 2D footprint placement is left to the
    /// rectangle variant).
    stacks: Rc<Vec<StackState>>,
    x_cursor: i64,
    number_of_items: u32,
    number_of_bins: u32,
    profit: i64,
    item_volume: i64,
    waste: i64,
}

/// Ref-counted partial-placement node with a parent pointer (spec §3
/// `BranchingSchemeNode`).
#[derive(Clone)]
pub struct Node(Rc<NodeInner>);

impl Node {
    pub fn number_of_items(&self) -> u32 {
        self.0.number_of_items
    }
}

/// Shelf-style branching scheme for box-stacks (spec §4.3): each bin is
/// filled with single-row stacks side by side along x; each stack grows
/// upward as long as weight, height and stackability allow.
pub struct BoxStacksBranchingScheme {
    instance: Arc<Instance>,
    guide_kind: GuideKind,
    ids: NodeIdGenerator,
}

impl BoxStacksBranchingScheme {
    pub fn new(instance: Arc<Instance>, guide_kind: GuideKind) -> Self {
        BoxStacksBranchingScheme {
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

    fn continue_stack_child(&self, parent: &Node, item_type_id: ItemTypeId) -> Option<Node> {
        let bin_type_id = parent.0.current_bin_type_id?;
        let bin = self.instance.bin_type(bin_type_id);
        let top = parent.0.stacks.last()?;
        let item = self.instance.item_type(item_type_id);
        if item.stackability_id != top.stackability_id {
            return None;
        }
        if top.height_used + item.shape.z > bin.shape.z {
            return None;
        }
        if item.shape.x != top.x1 - top.x0 || item.shape.y != top.y1 - top.y0 {
            return None;
        }
        if top.items_count >= item.maximum_stackability {
            return None;
        }
        if item.weight > top.weight_above_budget {
            return None;
        }

        let mut item_counts = (*parent.0.item_counts).clone();
        item_counts[item_type_id.index()] += 1;
        let mut stacks = (*parent.0.stacks).clone();
        let last = stacks.last_mut().unwrap();
        last.height_used += item.shape.z;
        last.items_count += 1;
        last.weight_above_budget = (last.weight_above_budget - item.weight).min(item.maximum_weight_above);

        Some(Node(Rc::new(NodeInner {
            id: self.ids.next(),
            parent: Some(parent.clone()),
            inserted_item_type_id: Some(item_type_id),
            inserted_rotation: 0,
            opened_bin_type_id: None,
            opened_stack_footprint: None,
            item_counts: Rc::new(item_counts),
            bin_counts: parent.0.bin_counts.clone(),
            current_bin_type_id: Some(bin_type_id),
            stacks: Rc::new(stacks),
            x_cursor: parent.0.x_cursor,
            number_of_items: parent.0.number_of_items + 1,
            number_of_bins: parent.0.number_of_bins,
            profit: parent.0.profit + item.profit,
            item_volume: parent.0.item_volume + item.space(),
            waste: parent.0.waste,
        })))
    }

    fn new_stack_child(
        &self,
        parent: &Node,
        bin_type_id: BinTypeId,
        item_type_id: ItemTypeId,
        rotation: u8,
        opens_new_bin: bool,
    ) -> Option<Node> {
        let item = self.instance.item_type(item_type_id);
        if !item.can_rotate(rotation) {
            return None;
        }
        let bin = self.instance.bin_type(bin_type_id);
        let oriented = item.oriented(rotation);
        if oriented.z > bin.shape.z || oriented.y > bin.shape.y {
            return None;
        }

        let x_cursor = if opens_new_bin { 0 } else { parent.0.x_cursor };
        if x_cursor + oriented.x > bin.shape.x {
            return None;
        }

        let footprint = (x_cursor, x_cursor + oriented.x, 0, oriented.y);
        let new_stack = StackState {
            x0: footprint.0,
            x1: footprint.1,
            y0: footprint.2,
            y1: footprint.3,
            height_used: oriented.z,
            items_count: 1,
            stackability_id: item.stackability_id,
            weight_above_budget: item.maximum_weight_above - item.weight,
        };

        let mut item_counts = (*parent.0.item_counts).clone();
        item_counts[item_type_id.index()] += 1;

        let (bin_counts, stacks, closed_waste, number_of_bins) = if opens_new_bin {
            let mut bin_counts = (*parent.0.bin_counts).clone();
            bin_counts[bin_type_id.index()] += 1;
            let closed_waste = self.closing_waste(parent);
            (Rc::new(bin_counts), vec![new_stack], closed_waste, parent.0.number_of_bins + 1)
        } else {
            let mut stacks = (*parent.0.stacks).clone();
            stacks.push(new_stack);
            (parent.0.bin_counts.clone(), stacks, 0, parent.0.number_of_bins)
        };

        Some(Node(Rc::new(NodeInner {
            id: self.ids.next(),
            parent: Some(parent.clone()),
            inserted_item_type_id: Some(item_type_id),
            inserted_rotation: rotation,
            opened_bin_type_id: if opens_new_bin { Some(bin_type_id) } else { None },
            opened_stack_footprint: Some(footprint),
            item_counts: Rc::new(item_counts),
            bin_counts,
            current_bin_type_id: Some(bin_type_id),
            stacks: Rc::new(stacks),
            x_cursor: footprint.1,
            number_of_items: parent.0.number_of_items + 1,
            number_of_bins,
            profit: parent.0.profit + item.profit,
            item_volume: parent.0.item_volume + item.space(),
            waste: parent.0.waste + closed_waste,
        })))
    }

    fn closing_waste(&self, node: &Node) -> i64 {
        match node.0.current_bin_type_id {
            Some(bin_type_id) => {
                let bin = self.instance.bin_type(bin_type_id);
                let used: i64 = node.0.stacks.iter().map(|s| (s.x1 - s.x0) * (s.y1 - s.y0) * s.height_used).sum();
                bin.volume() - used
            }
            None => 0,
        }
    }

    fn remaining_profit_bound(&self, node: &Node) -> i64 {
        let mut bound = node.0.profit;
        for (id, item) in self.instance.item_types() {
            bound += self.remaining_demand(node, id) as i64 * item.profit;
        }
        bound
    }
}

impl BranchingScheme for BoxStacksBranchingScheme {
    type Node = Node;
    type Solution = Solution;

    fn root(&self) -> Node {
        Node(Rc::new(NodeInner {
            id: self.ids.next(),
            parent: None,
            inserted_item_type_id: None,
            inserted_rotation: 0,
            opened_bin_type_id: None,
            opened_stack_footprint: None,
            item_counts: Rc::new(vec![0; self.instance.number_of_item_types()]),
            bin_counts: Rc::new(vec![0; self.instance.number_of_bin_types()]),
            current_bin_type_id: None,
            stacks: Rc::new(Vec::new()),
            x_cursor: 0,
            number_of_items: 0,
            number_of_bins: 0,
            profit: 0,
            item_volume: 0,
            waste: 0,
        }))
    }

    fn children(&self, parent: &Node) -> Vec<Node> {
        let mut children = Vec::new();

        for (item_type_id, _) in self.instance.item_types() {
            if self.remaining_demand(parent, item_type_id) == 0 {
                continue;
            }
            if let Some(child) = self.continue_stack_child(parent, item_type_id) {
                children.push(child);
            }
        }

        if let Some(bin_type_id) = parent.0.current_bin_type_id {
            for (item_type_id, _) in self.instance.item_types() {
                if self.remaining_demand(parent, item_type_id) == 0 {
                    continue;
                }
                for rotation in 0..2u8 {
                    if let Some(child) = self.new_stack_child(parent, bin_type_id, item_type_id, rotation, false) {
                        children.push(child);
                    }
                }
            }
        }

        for (bin_type_id, _) in self.instance.bin_types() {
            if self.remaining_bin_copies(parent, bin_type_id) == 0 {
                continue;
            }
            for (item_type_id, _) in self.instance.item_types() {
                if self.remaining_demand(parent, item_type_id) == 0 {
                    continue;
                }
                for rotation in 0..2u8 {
                    if let Some(child) = self.new_stack_child(parent, bin_type_id, item_type_id, rotation, true) {
                        children.push(child);
                    }
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
            Objective::Knapsack | Objective::Default => self.remaining_profit_bound(node) <= worst.profit(),
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
        if a.0.x_cursor > b.0.x_cursor {
            return false;
        }
        a.0.item_counts.iter().zip(b.0.item_counts.iter()).all(|(ca, cb)| ca <= cb)
    }

    fn guide(&self, node: &Node) -> f64 {
        let waste = (node.0.waste + self.closing_waste(node)) as f64;
        let volume = node.0.item_volume as f64;
        match self.guide_kind {
            GuideKind::ItemCount => -(node.0.number_of_items as f64),
            _ if volume <= 0.0 => 0.0,
            _ => waste / volume,
        }
    }

    fn node_id(&self, node: &Node) -> u64 {
        node.0.id
    }

    fn to_solution(&self, node: &Node) -> Solution {
        struct Move {
            opened_bin_type_id: Option<BinTypeId>,
            opened_stack_footprint: Option<(i64, i64, i64, i64)>,
            item_type_id: ItemTypeId,
            rotation: u8,
        }

        let mut moves = Vec::new();
        let mut cursor = Some(node.clone());
        while let Some(n) = cursor {
            if let Some(item_type_id) = n.0.inserted_item_type_id {
                moves.push(Move {
                    opened_bin_type_id: n.0.opened_bin_type_id,
                    opened_stack_footprint: n.0.opened_stack_footprint,
                    item_type_id,
                    rotation: n.0.inserted_rotation,
                });
            }
            cursor = n.0.parent.clone();
        }
        moves.reverse();

        let mut solution = Solution::new(self.instance.clone());
        let mut current_bin_pos: Option<BinPos> = None;
        let mut current_stack_id = None;
        for mv in moves {
            if let Some(bin_type_id) = mv.opened_bin_type_id {
                current_bin_pos = Some(solution.add_bin(bin_type_id, 1).expect("bin copies >= 1"));
            }
            let bin_pos = current_bin_pos.expect("at least one bin opened before any item");
            if let Some((x0, x1, y0, y1)) = mv.opened_stack_footprint {
                current_stack_id = Some(
                    solution
                        .add_stack(bin_pos, x0, x1, y0, y1)
                        .expect("footprint legal by construction of `children`"),
                );
            }
            let stack_id = current_stack_id.expect("at least one stack opened before any item");
            solution
                .add_item(bin_pos, stack_id, mv.item_type_id, mv.rotation)
                .expect("item fits by construction of `children`");
        }
        solution
    }
}
