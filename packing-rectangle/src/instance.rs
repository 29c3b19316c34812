use packing_core::{BinTypeId, DefectId, Error, ItemTypeId, Objective, Result};

/// An axis-aligned rectangle (spec §3 `ItemType.shape`). Grounded on
/// `packingsolver/include/packingsolver/rectangle/instance.hpp::Rectangle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rectangle {
    pub x: i64,
    pub y: i64,
}

impl Rectangle {
    pub fn area(&self) -> i64 {
        self.x * self.y
    }
}

/// Returns `true` iff the two axis-aligned rectangles, positioned at
/// `(x1,y1)` and `(x2,y2)` with the given extents, overlap with non-zero
/// area. Grounded on `packingsolver/rectangle/instance.cpp::rect_intersection`.
pub fn rect_intersection(x1: i64, x1e: i64, y1: i64, y1e: i64, x2: i64, x2e: i64, y2: i64, y2e: i64) -> bool {
    x1 < x2e && x2 < x1e && y1 < y2e && y2 < y1e
}

/// Item type for the rectangle variant.
#[derive(Debug, Clone)]
pub struct ItemType {
    pub rect: Rectangle,
    pub profit: i64,
    pub copies: u32,
    pub group_id: u32,
    /// `true` iff the item cannot be rotated 90°.
    pub oriented: bool,
    pub weight: f64,
}

impl ItemType {
    pub fn space(&self) -> i64 {
        self.rect.area()
    }

    /// The rectangle's extent under `rotated` (a no-op when `oriented`).
    pub fn oriented_rect(&self, rotated: bool) -> Rectangle {
        if rotated && !self.oriented {
            Rectangle { x: self.rect.y, y: self.rect.x }
        } else {
            self.rect
        }
    }
}

/// A forbidden sub-region of a bin (spec GLOSSARY "Defect").
#[derive(Debug, Clone)]
pub struct Defect {
    pub bin_type_id: BinTypeId,
    pub x: i64,
    pub y: i64,
    pub rect: Rectangle,
}

/// Bin type for the rectangle variant.
#[derive(Debug, Clone)]
pub struct BinType {
    pub rect: Rectangle,
    pub cost: i64,
    pub copies: u32,
    pub copies_min: u32,
    pub maximum_weight: f64,
}

impl BinType {
    pub fn area(&self) -> i64 {
        self.rect.area()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Parameters {}

/// Immutable container of rectangle item/bin types, defects, and precomputed
/// aggregates (spec §3, §4.1).
#[derive(Debug, Clone)]
pub struct Instance {
    objective: Objective,
    parameters: Parameters,
    item_types: Vec<ItemType>,
    bin_types: Vec<BinType>,
    defects: Vec<Defect>,

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

    pub fn defects_in_bin(&self, bin_type_id: BinTypeId) -> impl Iterator<Item = (DefectId, &Defect)> {
        self.defects
            .iter()
            .enumerate()
            .filter(move |(_, d)| d.bin_type_id == bin_type_id)
            .map(|(i, d)| (DefectId::from(i), d))
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
    defects: Vec<Defect>,
}

impl InstanceBuilder {
    pub fn new(objective: Objective) -> Self {
        InstanceBuilder {
            objective,
            parameters: Parameters::default(),
            item_types: Vec::new(),
            bin_types: Vec::new(),
            defects: Vec::new(),
        }
    }

    pub fn set_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn add_item_type(&mut self, item_type: ItemType) -> Result<ItemTypeId> {
        if item_type.rect.x <= 0 || item_type.rect.y <= 0 {
            return Err(Error::InvalidInput(format!(
                "item dimensions must be positive, got {:?}",
                item_type.rect
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
        if bin_type.rect.x <= 0 || bin_type.rect.y <= 0 {
            return Err(Error::InvalidInput(format!(
                "bin dimensions must be positive, got {:?}",
                bin_type.rect
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

    pub fn add_defect(&mut self, defect: Defect) -> Result<DefectId> {
        let bin = &self.bin_types[defect.bin_type_id.index()];
        if defect.x < 0
            || defect.y < 0
            || defect.x + defect.rect.x > bin.rect.x
            || defect.y + defect.rect.y > bin.rect.y
        {
            return Err(Error::InvalidInput("defect does not lie inside its bin".into()));
        }
        let id = DefectId::from(self.defects.len());
        self.defects.push(defect);
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
            defects: self.defects,
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

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(side: i64, copies: u32) -> ItemType {
        ItemType {
            rect: Rectangle { x: side, y: side },
            profit: side * side,
            copies,
            group_id: 0,
            oriented: false,
            weight: 0.0,
        }
    }

    fn bin(w: i64, h: i64, cost: i64, copies: u32) -> BinType {
        BinType {
            rect: Rectangle { x: w, y: h },
            cost,
            copies,
            copies_min: 0,
            maximum_weight: f64::INFINITY,
        }
    }

    #[test]
    fn rect_intersection_detects_overlap_and_touching() {
        assert!(rect_intersection(0, 2, 0, 2, 1, 3, 1, 3));
        assert!(!rect_intersection(0, 2, 0, 2, 2, 4, 0, 2));
    }

    #[test]
    fn rejects_defect_outside_bin() {
        let mut b = InstanceBuilder::new(Objective::BinPacking);
        let bin_id = b.add_bin_type(bin(10, 10, 1, 1)).unwrap();
        let err = b
            .add_defect(Defect {
                bin_type_id: bin_id,
                x: 9,
                y: 9,
                rect: Rectangle { x: 5, y: 5 },
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn aggregates_are_consistent() {
        let mut b = InstanceBuilder::new(Objective::Knapsack);
        b.add_item_type(sq(3, 4)).unwrap();
        b.add_bin_type(bin(10, 10, 0, 1)).unwrap();
        let instance = b.build().unwrap();
        assert_eq!(instance.number_of_items(), 4);
        assert_eq!(instance.item_area(), 9 * 4);
    }
}
