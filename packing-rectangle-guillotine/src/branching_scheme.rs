use std::rc::Rc;
use std::sync::Arc;

use packing_core::{BinPos, BinTypeId, ItemTypeId, Objective};
use packing_search::{BranchingScheme, GuideKind, NodeIdGenerator};

use crate::instance::{CutOrientation, Instance};
use crate::solution::Solution;

/// One second-stage shelf within a strip: a band along the strip's
/// secondary axis, holding one or more items placed side by side along the
/// primary axis and separated by third-stage cuts (spec §4.3's full 3-stage
/// guillotine model).
#[derive(Clone)]
struct ShelfState {
    secondary0: i64,
    secondary1: i64,
    /// Offset from the strip's `primary0`, where the next third-stage cut
    /// may start.
    primary_cursor: i64,
}

/// One first-stage strip: a band of the bin cut by the first guillotine
/// pass, subdivided into shelves by the second pass.
#[derive(Clone)]
struct StripState {
    primary0: i64,
    primary1: i64,
    /// Offset along the secondary axis where the next second-stage cut may
    /// start.
    secondary_cursor: i64,
    shelves: Vec<ShelfState>,
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
    strips: Rc<Vec<StripState>>,
    primary_cursor: i64,
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

/// 3-stage guillotine branching scheme (spec §4.3): the bin is first cut
/// into strips along `first_stage_orientation`, each strip is cut into
/// shelves perpendicular to the first cut, and each shelf is cut again
/// parallel to the first cut to free individual items.
pub struct RectangleGuillotineBranchingScheme {
    instance: Arc<Instance>,
    guide_kind: GuideKind,
    ids: NodeIdGenerator,
}

impl RectangleGuillotineBranchingScheme {
    pub fn new(instance: Arc<Instance>, guide_kind: GuideKind) -> Self {
        RectangleGuillotineBranchingScheme {
            instance,
            guide_kind,
            ids: NodeIdGenerator::new(),
        }
    }

    fn orientation(&self) -> CutOrientation {
        self.instance.parameters().first_stage_orientation
    }

    fn cut_thickness(&self) -> i64 {
        self.instance.parameters().cut_thickness
    }

    /// (primary_extent, secondary_extent, bin_primary_limit, bin_secondary_limit)
    /// for an item's oriented rectangle, given the current cut orientation.
    /// Vertical first-stage cuts run along x, so the strip's "primary" axis
    /// (its width) is x and shelves stack along y inside it; horizontal
    /// first-stage cuts swap the two.
    fn axes(&self, bin: &crate::instance::BinType, rect_x: i64, rect_y: i64) -> (i64, i64, i64, i64) {
        match self.orientation() {
            CutOrientation::Vertical => (rect_x, rect_y, bin.rect.x, bin.rect.y),
            CutOrientation::Horizontal => (rect_y, rect_x, bin.rect.y, bin.rect.x),
        }
    }

    fn to_xy(&self, primary: i64, secondary: i64) -> (i64, i64) {
        match self.orientation() {
            CutOrientation::Vertical => (primary, secondary),
            CutOrientation::Horizontal => (secondary, primary),
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

    /// Third-stage cut: places another item beside the last one in the
    /// currently open shelf, widening the open strip (whose first-stage cut
    /// is only finalized once it closes) if the shelf needs more room.
    fn continue_shelf_child(&self, parent: &Node, item_type_id: ItemTypeId, rotated: bool) -> Option<Node> {
        let bin_type_id = parent.0.current_bin_type_id?;
        let bin = self.instance.bin_type(bin_type_id);
        let strip = parent.0.strips.last()?;
        let shelf = strip.shelves.last()?;
        let item = self.instance.item_type(item_type_id);
        if rotated && item.oriented {
            return None;
        }
        let rect = item.oriented_rect(rotated);
        let (item_primary, item_secondary, bin_primary, _bin_secondary) = self.axes(bin, rect.x, rect.y);
        if item_secondary > shelf.secondary1 - shelf.secondary0 {
            return None;
        }
        let gap = if shelf.primary_cursor > 0 { self.cut_thickness() } else { 0 };
        let needed_shelf_width = shelf.primary_cursor + gap + item_primary;
        let strip_width = strip.primary1 - strip.primary0;
        let new_primary1 = strip.primary1 + (needed_shelf_width - strip_width).max(0);
        if new_primary1 > bin_primary {
            return None;
        }
        let (x, y) = self.to_xy(strip.primary0 + shelf.primary_cursor + gap, shelf.secondary0);

        let mut item_counts = (*parent.0.item_counts).clone();
        item_counts[item_type_id.index()] += 1;
        let mut strips = (*parent.0.strips).clone();
        let open_strip = strips.last_mut().unwrap();
        open_strip.primary1 = new_primary1;
        open_strip.shelves.last_mut().unwrap().primary_cursor += gap + item_primary;

        Some(Node(Rc::new(NodeInner {
            id: self.ids.next(),
            parent: Some(parent.clone()),
            inserted_item_type_id: Some(item_type_id),
            inserted_rotated: rotated,
            inserted_x: x,
            inserted_y: y,
            opened_bin_type_id: None,
            item_counts: Rc::new(item_counts),
            bin_counts: parent.0.bin_counts.clone(),
            current_bin_type_id: Some(bin_type_id),
            strips: Rc::new(strips),
            primary_cursor: new_primary1,
            number_of_items: parent.0.number_of_items + 1,
            number_of_bins: parent.0.number_of_bins,
            profit: parent.0.profit + item.profit,
            item_area: parent.0.item_area + item.space(),
            waste: parent.0.waste,
        })))
    }

    /// Second-stage cut: opens a new shelf within the currently open strip,
    /// seeded with one item, widening the strip if the item is wider than
    /// what it currently holds.
    fn new_shelf_child(&self, parent: &Node, item_type_id: ItemTypeId, rotated: bool) -> Option<Node> {
        let bin_type_id = parent.0.current_bin_type_id?;
        let bin = self.instance.bin_type(bin_type_id);
        let strip = parent.0.strips.last()?;
        let item = self.instance.item_type(item_type_id);
        if rotated && item.oriented {
            return None;
        }
        let rect = item.oriented_rect(rotated);
        let (item_primary, item_secondary, bin_primary, bin_secondary) = self.axes(bin, rect.x, rect.y);
        let strip_width = strip.primary1 - strip.primary0;
        let new_primary1 = strip.primary1 + (item_primary - strip_width).max(0);
        if new_primary1 > bin_primary {
            return None;
        }
        let secondary0 = strip.secondary_cursor;
        let gap = if secondary0 > 0 { self.cut_thickness() } else { 0 };
        if secondary0 + gap + item_secondary > bin_secondary {
            return None;
        }
        let (x, y) = self.to_xy(strip.primary0, secondary0 + gap);

        let new_shelf = ShelfState {
            secondary0: secondary0 + gap,
            secondary1: secondary0 + gap + item_secondary,
            primary_cursor: item_primary,
        };

        let mut item_counts = (*parent.0.item_counts).clone();
        item_counts[item_type_id.index()] += 1;
        let mut strips = (*parent.0.strips).clone();
        let open_strip = strips.last_mut().unwrap();
        open_strip.primary1 = new_primary1;
        open_strip.secondary_cursor = secondary0 + gap + item_secondary;
        open_strip.shelves.push(new_shelf);

        Some(Node(Rc::new(NodeInner {
            id: self.ids.next(),
            parent: Some(parent.clone()),
            inserted_item_type_id: Some(item_type_id),
            inserted_rotated: rotated,
            inserted_x: x,
            inserted_y: y,
            opened_bin_type_id: None,
            item_counts: Rc::new(item_counts),
            bin_counts: parent.0.bin_counts.clone(),
            current_bin_type_id: Some(bin_type_id),
            strips: Rc::new(strips),
            primary_cursor: new_primary1,
            number_of_items: parent.0.number_of_items + 1,
            number_of_bins: parent.0.number_of_bins,
            profit: parent.0.profit + item.profit,
            item_area: parent.0.item_area + item.space(),
            waste: parent.0.waste,
        })))
    }

    /// First-stage cut: opens a new strip (in the current bin, or in a
    /// freshly opened one), seeded with a single shelf holding one item.
    fn new_strip_child(
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
        let (item_primary, item_secondary, bin_primary, bin_secondary) = self.axes(bin, rect.x, rect.y);
        if item_secondary > bin_secondary {
            return None;
        }

        let primary_cursor = if opens_new_bin { 0 } else { parent.0.primary_cursor };
        let gap = if primary_cursor > 0 { self.cut_thickness() } else { 0 };
        if primary_cursor + gap + item_primary > bin_primary {
            return None;
        }

        let new_shelf = ShelfState {
            secondary0: 0,
            secondary1: item_secondary,
            primary_cursor: item_primary,
        };
        let new_strip = StripState {
            primary0: primary_cursor + gap,
            primary1: primary_cursor + gap + item_primary,
            secondary_cursor: item_secondary,
            shelves: vec![new_shelf],
        };
        let (x, y) = self.to_xy(primary_cursor + gap, 0);

        let mut item_counts = (*parent.0.item_counts).clone();
        item_counts[item_type_id.index()] += 1;

        let (bin_counts, strips, closed_waste, number_of_bins) = if opens_new_bin {
            let mut bin_counts = (*parent.0.bin_counts).clone();
            bin_counts[bin_type_id.index()] += 1;
            let closed_waste = self.closing_waste(parent);
            (Rc::new(bin_counts), vec![new_strip], closed_waste, parent.0.number_of_bins + 1)
        } else {
            let mut strips = (*parent.0.strips).clone();
            strips.push(new_strip);
            (parent.0.bin_counts.clone(), strips, 0, parent.0.number_of_bins)
        };

        Some(Node(Rc::new(NodeInner {
            id: self.ids.next(),
            parent: Some(parent.clone()),
            inserted_item_type_id: Some(item_type_id),
            inserted_rotated: rotated,
            inserted_x: x,
            inserted_y: y,
            opened_bin_type_id: if opens_new_bin { Some(bin_type_id) } else { None },
            item_counts: Rc::new(item_counts),
            bin_counts,
            current_bin_type_id: Some(bin_type_id),
            strips: Rc::new(strips),
            primary_cursor: primary_cursor + gap + item_primary,
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
                let used: i64 = node
                    .0
                    .strips
                    .iter()
                    .map(|s| (s.primary1 - s.primary0) * s.secondary_cursor)
                    .sum();
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

impl BranchingScheme for RectangleGuillotineBranchingScheme {
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
            strips: Rc::new(Vec::new()),
            primary_cursor: 0,
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

        for (item_type_id, _) in self.instance.item_types() {
            if self.remaining_demand(parent, item_type_id) == 0 {
                continue;
            }
            for rotated in [false, true] {
                if let Some(child) = self.new_shelf_child(parent, item_type_id, rotated) {
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
                    if let Some(child) = self.new_strip_child(parent, bin_type_id, item_type_id, rotated, false) {
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
                    if let Some(child) = self.new_strip_child(parent, bin_type_id, item_type_id, rotated, true) {
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
        if a.0.primary_cursor > b.0.primary_cursor {
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
