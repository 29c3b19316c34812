use std::rc::Rc;
use std::sync::Arc;

use packing_core::{BinPos, BinTypeId, ItemTypeId, Objective};
use packing_search::{BranchingScheme, GuideKind, NodeIdGenerator};

use crate::instance::{rect_intersection, Instance};
use crate::solution::Solution;

/// One shelf: a horizontal strip of the bin floor, items packed left to
/// right within it (spec §4.3 "skyline model" restricted to shelves — see
/// DESIGN.md).
#[derive(Clone)]
struct ShelfState {
    y0: i64,
    y1: i64,
    x_cursor: i64,
}

struct NodeInner {
    id: u64,
    parent: Option<Node>,
    inserted_item_type_id: Option<ItemTypeId>,
    inserted_rotated: bool,
    inserted_x: i64,
    inserted_y: i64,
    opened_bin_type_id: Option<BinTypeId>,
    item_counts: Rc<Vec<u32>>,
    bin_counts: Rc<Vec<u32>>,
    current_bin_type_id: Option<BinTypeId>,
    shelves: Rc<Vec<ShelfState>>,
    y_cursor: i64,
    number_of_items: u32,
    number_of_bins: u32,
    profit: i64,
    item_area: i64,
    waste: i64,
}

#[derive(Clone)]
pub struct Node(Rc<NodeInner>);

impl Node {
    pub fn number_of_items(&self) -> u32 {
        self.0.number_of_items
    }
}

/// Shelf-style branching scheme for axis-aligned rectangle packing (spec
/// §4.3): items are packed into horizontal shelves, optionally rotated,
/// skipping positions that would overlap a defect.
pub struct RectangleBranchingScheme {
    instance: Arc<Instance>,
    guide_kind: GuideKind,
    ids: NodeIdGenerator,
}

impl RectangleBranchingScheme {
    pub fn new(instance: Arc<Instance>, guide_kind: GuideKind) -> Self {
        RectangleBranchingScheme {
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

    fn overlaps_defect(&self, bin_type_id: BinTypeId, x0: i64, x1: i64, y0: i64, y1: i64) -> bool {
        self.instance
            .defects_in_bin(bin_type_id)
            .any(|(_, d)| rect_intersection(x0, x1, y0, y1, d.x, d.x + d.rect.x, d.y, d.y + d.rect.y))
    }

    fn continue_shelf_child(&self, parent: &Node, item_type_id: ItemTypeId, rotated: bool) -> Option<Node> {
        let bin_type_id = parent.0.current_bin_type_id?;
        let bin = self.instance.bin_type(bin_type_id);
        let shelf = parent.0.shelves.last()?;
        let item = self.instance.item_type(item_type_id);
        if rotated && item.oriented {
            return None;
        }
        let rect = item.oriented_rect(rotated);
        if shelf.x_cursor + rect.x > bin.rect.x {
            return None;
        }
        if rect.y > shelf.y1 - shelf.y0 {
            return None;
        }
        let (x0, y0) = (shelf.x_cursor, shelf.y0);
        if self.overlaps_defect(bin_type_id, x0, x0 + rect.x, y0, y0 + rect.y) {
            return None;
        }

        let mut item_counts = (*parent.0.item_counts).clone();
        item_counts[item_type_id.index()] += 1;
        let mut shelves = (*parent.0.shelves).clone();
        shelves.last_mut().unwrap().x_cursor += rect.x;

        Some(Node(Rc::new(NodeInner {
            id: self.ids.next(),
            parent: Some(parent.clone()),
            inserted_item_type_id: Some(item_type_id),
            inserted_rotated: rotated,
            inserted_x: x0,
            inserted_y: y0,
            opened_bin_type_id: None,
            item_counts: Rc::new(item_counts),
            bin_counts: parent.0.bin_counts.clone(),
            current_bin_type_id: Some(bin_type_id),
            shelves: Rc::new(shelves),
            y_cursor: parent.0.y_cursor,
            number_of_items: parent.0.number_of_items + 1,
            number_of_bins: parent.0.number_of_bins,
            profit: parent.0.profit + item.profit,
            item_area: parent.0.item_area + item.space(),
            waste: parent.0.waste,
        })))
    }

    fn new_shelf_child(
        &self,
        parent: &Node,
        bin_type_id: BinTypeId,
        item_type_id: ItemTypeId,
        rotated: bool,
        opens_new_bin: bool,
    ) -> Option<Node> {
        let item = self.instance.item_type(item_type_id);
        if rotated && item.oriented {
            return None;
        }
        let bin = self.instance.bin_type(bin_type_id);
        let rect = item.oriented_rect(rotated);
        if rect.x > bin.rect.x {
            return None;
        }

        let y_cursor = if opens_new_bin { 0 } else { parent.0.y_cursor };
        if y_cursor + rect.y > bin.rect.y {
            return None;
        }
        if self.overlaps_defect(bin_type_id, 0, rect.x, y_cursor, y_cursor + rect.y) {
            return None;
        }

        let new_shelf = ShelfState {
            y0: y_cursor,
            y1: y_cursor + rect.y,
            x_cursor: rect.x,
        };

        let mut item_counts = (*parent.0.item_counts).clone();
        item_counts[item_type_id.index()] += 1;

        let (bin_counts, shelves, closed_waste, number_of_bins) = if opens_new_bin {
            let mut bin_counts = (*parent.0.bin_counts).clone();
            bin_counts[bin_type_id.index()] += 1;
            let closed_waste = self.closing_waste(parent);
            (Rc::new(bin_counts), vec![new_shelf], closed_waste, parent.0.number_of_bins + 1)
        } else {
            let mut shelves = (*parent.0.shelves).clone();
            shelves.push(new_shelf);
            (parent.0.bin_counts.clone(), shelves, 0, parent.0.number_of_bins)
        };

        Some(Node(Rc::new(NodeInner {
            id: self.ids.next(),
            parent: Some(parent.clone()),
            inserted_item_type_id: Some(item_type_id),
            inserted_rotated: rotated,
            inserted_x: 0,
            inserted_y: y_cursor,
            opened_bin_type_id: if opens_new_bin { Some(bin_type_id) } else { None },
            item_counts: Rc::new(item_counts),
            bin_counts,
            current_bin_type_id: Some(bin_type_id),
            shelves: Rc::new(shelves),
            y_cursor: y_cursor + rect.y,
            number_of_items: parent.0.number_of_items + 1,
            number_of_bins,
            profit: parent.0.profit + item.profit,
            item_area: parent.0.item_area + item.space(),
            waste: parent.0.waste + closed_waste,
        })))
    }

    fn closing_waste(&self, node: &Node) -> i64 {
        match node.0.current_bin_type_id {
            Some(bin_type_id) => {
                let bin = self.instance.bin_type(bin_type_id);
                let used: i64 = node.0.shelves.iter().map(|s| (s.y1 - s.y0) * s.x_cursor).sum();
                bin.area() - used
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

impl BranchingScheme for RectangleBranchingScheme {
    type Node = Node;
    type Solution = Solution;

    fn root(&self) -> Node {
        Node(Rc::new(NodeInner {
            id: self.ids.next(),
            parent: None,
            inserted_item_type_id: None,
            inserted_rotated: false,
            inserted_x: 0,
            inserted_y: 0,
            opened_bin_type_id: None,
            item_counts: Rc::new(vec![0; self.instance.number_of_item_types()]),
            bin_counts: Rc::new(vec![0; self.instance.number_of_bin_types()]),
            current_bin_type_id: None,
            shelves: Rc::new(Vec::new()),
            y_cursor: 0,
            number_of_items: 0,
            number_of_bins: 0,
            profit: 0,
            item_area: 0,
            waste: 0,
        }))
    }

    fn children(&self, parent: &Node) -> Vec<Node> {
        let mut children = Vec::new();

        for (item_type_id, _) in self.instance.item_types() {
            if self.remaining_demand(parent, item_type_id) == 0 {
                continue;
            }
            for rotated in [false, true] {
                if let Some(child) = self.continue_shelf_child(parent, item_type_id, rotated) {
                    children.push(child);
                }
            }
        }

        if let Some(bin_type_id) = parent.0.current_bin_type_id {
            for (item_type_id, _) in self.instance.item_types() {
                if self.remaining_demand(parent, item_type_id) == 0 {
                    continue;
                }
                for rotated in [false, true] {
                    if let Some(child) = self.new_shelf_child(parent, bin_type_id, item_type_id, rotated, false) {
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
                for rotated in [false, true] {
                    if let Some(child) = self.new_shelf_child(parent, bin_type_id, item_type_id, rotated, true) {
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
        if a.0.y_cursor > b.0.y_cursor {
            return false;
        }
        a.0.item_counts.iter().zip(b.0.item_counts.iter()).all(|(ca, cb)| ca <= cb)
    }

    fn guide(&self, node: &Node) -> f64 {
        let waste = (node.0.waste + self.closing_waste(node)) as f64;
        let area = node.0.item_area as f64;
        match self.guide_kind {
            GuideKind::ItemCount => -(node.0.number_of_items as f64),
            _ if area <= 0.0 => 0.0,
            _ => waste / area,
        }
    }

    fn node_id(&self, node: &Node) -> u64 {
        node.0.id
    }

    fn to_solution(&self, node: &Node) -> Solution {
        struct Move {
            opened_bin_type_id: Option<BinTypeId>,
            item_type_id: ItemTypeId,
            x: i64,
            y: i64,
            rotated: bool,
        }

        let mut moves = Vec::new();
        let mut cursor = Some(node.clone());
        while let Some(n) = cursor {
            if let Some(item_type_id) = n.0.inserted_item_type_id {
                moves.push(Move {
                    opened_bin_type_id: n.0.opened_bin_type_id,
                    item_type_id,
                    x: n.0.inserted_x,
                    y: n.0.inserted_y,
                    rotated: n.0.inserted_rotated,
                });
            }
            cursor = n.0.parent.clone();
        }
        moves.reverse();

        let mut solution = Solution::new(self.instance.clone());
        let mut current_bin_pos: Option<BinPos> = None;
        for mv in moves {
            if let Some(bin_type_id) = mv.opened_bin_type_id {
                current_bin_pos = Some(solution.add_bin(bin_type_id, 1).expect("bin copies >= 1"));
            }
            let bin_pos = current_bin_pos.expect("at least one bin opened before any item");
            solution
                .add_item(bin_pos, mv.item_type_id, mv.x, mv.y, mv.rotated)
                .expect("item fits by construction of `children`");
        }
        solution
    }
}
