use packing_core::{BinTypeId, Error, ItemTypeId, Objective, Result};

/// A vertex of an item or bin polygon (spec §3 "geometry (rectangle or
/// polygon)").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub width: i64,
    pub height: i64,
}

impl BoundingBox {
    pub fn area(&self) -> i64 {
        self.width * self.height
    }
}

/// One segment of a polygon's boundary, ending at `to` (spec §3 "arbitrary
/// polygons and circular arcs"). `Arc`'s `bulge` is the DXF-style tangent of
/// a quarter of the arc's included angle: positive bulges to the left of
/// travel from the edge's start point to `to`, negative to the right, and
/// `0.0` degenerates to a straight line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge {
    Line { to: Point },
    Arc { to: Point, bulge: f64 },
}

impl Edge {
    fn to(&self) -> Point {
        match *self {
            Edge::Line { to } | Edge::Arc { to, .. } => to,
        }
    }
}

/// Center, radius and angular span (in radians, `end` reachable from
/// `start` by sweeping in the bulge's direction) of the circle an `Edge::Arc`
/// rides on.
struct ArcGeometry {
    center: Point,
    radius: f64,
    start_angle: f64,
    end_angle: f64,
}

/// Converts a chord `(from, to)` and DXF-style `bulge` into the circle it
/// rides on. Returns `None` for a degenerate (zero-length or unbulged) edge.
fn arc_geometry(from: Point, to: Point, bulge: f64) -> Option<ArcGeometry> {
    if bulge == 0.0 {
        return None;
    }
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let chord = (dx * dx + dy * dy).sqrt();
    if chord <= 0.0 {
        return None;
    }
    let sagitta = bulge * chord / 2.0;
    let radius = (chord * chord / 4.0 + sagitta * sagitta) / (2.0 * sagitta.abs());
    let (mx, my) = ((from.x + to.x) / 2.0, (from.y + to.y) / 2.0);
    let (ux, uy) = (-dy / chord, dx / chord);
    let offset = radius - sagitta.abs();
    let center = if sagitta >= 0.0 {
        Point { x: mx - ux * offset, y: my - uy * offset }
    } else {
        Point { x: mx + ux * offset, y: my + uy * offset }
    };

    let start_angle = (from.y - center.y).atan2(from.x - center.x);
    let mut end_angle = (to.y - center.y).atan2(to.x - center.x);
    if bulge > 0.0 {
        while end_angle < start_angle {
            end_angle += std::f64::consts::TAU;
        }
    } else {
        while end_angle > start_angle {
            end_angle -= std::f64::consts::TAU;
        }
    }
    Some(ArcGeometry { center, radius, start_angle, end_angle })
}

/// Samples taken along an arc to approximate its bounding box (see
/// `Polygon::bounding_box`).
const ARC_BOUNDING_BOX_SAMPLES: usize = 16;

/// An arbitrary simple polygon, stored as a sequence of `Edge`s (straight or
/// circular-arc) from a starting point, plus a bounding box computed over
/// its vertices and (for arcs) sampled points along the arc (spec §3
/// "arbitrary polygons and circular arcs"). Placement legality is decided on
/// this bounding box rather than the exact boundary — a deliberate
/// simplification, documented in DESIGN.md, that covers the full shape
/// vocabulary the spec names but not per-edge intersection tests (spec §1
/// Non-goals "per-variant geometric intersection primitives").
#[derive(Debug, Clone)]
pub struct Polygon {
    pub start: Point,
    pub edges: Vec<Edge>,
}

impl Polygon {
    /// Builds a polygon whose boundary is straight line segments through
    /// `points`, implicitly closed back to the first point.
    pub fn from_points(points: Vec<Point>) -> Self {
        let start = points[0];
        let edges = points.into_iter().skip(1).map(|to| Edge::Line { to }).collect();
        Polygon { start, edges }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (self.start.x, self.start.x, self.start.y, self.start.y);
        let mut extend = |p: Point| {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        };

        let mut cursor = self.start;
        for edge in &self.edges {
            extend(edge.to());
            if let Edge::Arc { to, bulge } = *edge {
                if let Some(arc) = arc_geometry(cursor, to, bulge) {
                    for i in 0..=ARC_BOUNDING_BOX_SAMPLES {
                        let t = arc.start_angle
                            + (arc.end_angle - arc.start_angle) * i as f64 / ARC_BOUNDING_BOX_SAMPLES as f64;
                        extend(Point {
                            x: arc.center.x + arc.radius * t.cos(),
                            y: arc.center.y + arc.radius * t.sin(),
                        });
                    }
                }
            }
            cursor = edge.to();
        }

        BoundingBox {
            width: (max_x - min_x).ceil() as i64,
            height: (max_y - min_y).ceil() as i64,
        }
    }
}

/// Rotation angle in degrees, one of the four axis-aligned orientations
/// the bounding-box simplification can represent exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::Deg0, Rotation::Deg90, Rotation::Deg180, Rotation::Deg270];

    fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

#[derive(Debug, Clone)]
pub struct ItemType {
    pub shape: Polygon,
    pub profit: i64,
    pub copies: u32,
    pub group_id: u32,
    /// Rotations allowed for this item type (spec §3 "allowed-orientation mask").
    pub allowed_rotations: Vec<Rotation>,
    pub weight: f64,
}

impl ItemType {
    pub fn space(&self) -> i64 {
        self.shape.bounding_box().area()
    }

    pub fn can_rotate(&self, rotation: Rotation) -> bool {
        self.allowed_rotations.contains(&rotation)
    }

    pub fn oriented_box(&self, rotation: Rotation) -> BoundingBox {
        let bbox = self.shape.bounding_box();
        if rotation.swaps_axes() {
            BoundingBox { width: bbox.height, height: bbox.width }
        } else {
            bbox
        }
    }
}

#[derive(Debug, Clone)]
pub struct BinType {
    pub shape: Polygon,
    pub cost: i64,
    pub copies: u32,
    pub copies_min: u32,
    pub maximum_weight: f64,
}

impl BinType {
    pub fn bounding_box(&self) -> BoundingBox {
        self.shape.bounding_box()
    }

    pub fn area(&self) -> i64 {
        self.bounding_box().area()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Parameters {}

/// Immutable container of irregular-shape item/bin types and precomputed
/// aggregates (spec §3, §4.1).
#[derive(Debug, Clone)]
pub struct Instance {
    objective: Objective,
    parameters: Parameters,
    item_types: Vec<ItemType>,
    bin_types: Vec<BinType>,

    number_of_items: u32,
    item_area: i64,
    item_profit: i64,
    max_efficiency_item_type_id: Option<ItemTypeId>,
    maximum_item_copies: u32,
    all_item_types_infinite_copies: bool,
    maximum_bin_cost: i64,
}

pub const INFINITE_COPIES: u32 = u32::MAX;

impl Instance {
    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn number_of_item_types(&self) -> usize {
        self.item_types.len()
    }

    pub fn item_type(&self, id: ItemTypeId) -> &ItemType {
        &self.item_types[id.index()]
    }

    pub fn item_types(&self) -> impl Iterator<Item = (ItemTypeId, &ItemType)> {
        self.item_types.iter().enumerate().map(|(i, t)| (ItemTypeId::from(i), t))
    }

    pub fn number_of_bin_types(&self) -> usize {
        self.bin_types.len()
    }

    pub fn bin_type(&self, id: BinTypeId) -> &BinType {
        &self.bin_types[id.index()]
    }

    pub fn bin_types(&self) -> impl Iterator<Item = (BinTypeId, &BinType)> {
        self.bin_types.iter().enumerate().map(|(i, t)| (BinTypeId::from(i), t))
    }

    pub fn number_of_items(&self) -> u32 {
        self.number_of_items
    }

    pub fn item_area(&self) -> i64 {
        self.item_area
    }

    pub fn item_profit(&self) -> i64 {
        self.item_profit
    }

    pub fn max_efficiency_item_type_id(&self) -> Option<ItemTypeId> {
        self.max_efficiency_item_type_id
    }

    pub fn maximum_item_copies(&self) -> u32 {
        self.maximum_item_copies
    }

    pub fn unbounded_knapsack(&self) -> bool {
        self.all_item_types_infinite_copies
    }

    pub fn maximum_bin_cost(&self) -> i64 {
        self.maximum_bin_cost
    }
}

#[derive(Debug, Default)]
pub struct InstanceBuilder {
    objective: Objective,
    parameters: Parameters,
    item_types: Vec<ItemType>,
    bin_types: Vec<BinType>,
}

impl InstanceBuilder {
    pub fn new(objective: Objective) -> Self {
        InstanceBuilder {
            objective,
            parameters: Parameters::default(),
            item_types: Vec::new(),
            bin_types: Vec::new(),
        }
    }

    pub fn add_item_type(&mut self, item_type: ItemType) -> Result<ItemTypeId> {
        let bbox = item_type.shape.bounding_box();
        if bbox.width <= 0 || bbox.height <= 0 {
            return Err(Error::InvalidInput(format!(
                "item bounding box must be positive, got {:?}",
                bbox
            )));
        }
        if item_type.copies == 0 {
            return Err(Error::InvalidInput("item copies must be positive or infinite".into()));
        }
        let id = ItemTypeId::from(self.item_types.len());
        self.item_types.push(item_type);
        Ok(id)
    }

    pub fn add_bin_type(&mut self, bin_type: BinType) -> Result<BinTypeId> {
        let bbox = bin_type.shape.bounding_box();
        if bbox.width <= 0 || bbox.height <= 0 {
            return Err(Error::InvalidInput(format!(
                "bin bounding box must be positive, got {:?}",
                bbox
            )));
        }
        if bin_type.copies_min > bin_type.copies {
            return Err(Error::InvalidInput(format!(
                "copies_min ({}) > copies ({})",
                bin_type.copies_min, bin_type.copies
            )));
        }
        let id = BinTypeId::from(self.bin_types.len());
        self.bin_types.push(bin_type);
        Ok(id)
    }

    pub fn build(mut self) -> Result<Instance> {
        if self.bin_types.is_empty() {
            return Err(Error::InvalidInput("instance has no bin types".into()));
        }

        let max_bin_area = self.bin_types.iter().map(|b| b.area()).max().unwrap_or(0);
        for item in &mut self.item_types {
            if item.copies == INFINITE_COPIES {
                let a = item.space();
                item.copies = if a > 0 { (max_bin_area / a).max(1) as u32 } else { 1 };
            }
        }

        let number_of_items: u32 = self.item_types.iter().map(|t| t.copies).sum();
        let item_area: i64 = self.item_types.iter().map(|t| t.space() * t.copies as i64).sum();
        let item_profit: i64 = self.item_types.iter().map(|t| t.profit * t.copies as i64).sum();
        let max_efficiency_item_type_id = self
            .item_types
            .iter()
            .enumerate()
            .filter(|(_, t)| t.space() > 0)
            .max_by(|(_, a), (_, b)| {
                let ea = a.profit as f64 / a.space() as f64;
                let eb = b.profit as f64 / b.space() as f64;
                ea.partial_cmp(&eb).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| ItemTypeId::from(i));
        let maximum_item_copies = self.item_types.iter().map(|t| t.copies).max().unwrap_or(0);
        let all_item_types_infinite_copies = !self.item_types.is_empty()
            && self
                .item_types
                .iter()
                .all(|t| t.space() > 0 && (t.copies as i64) * t.space() >= max_bin_area);
        let maximum_bin_cost = self.bin_types.iter().map(|b| b.cost).max().unwrap_or(0);

        Ok(Instance {
            objective: self.objective,
            parameters: self.parameters,
            item_types: self.item_types,
            bin_types: self.bin_types,
            number_of_items,
            item_area,
            item_profit,
            max_efficiency_item_type_id,
            maximum_item_copies,
            all_item_types_infinite_copies,
            maximum_bin_cost,
        })
    }
}
