use packing_core::{BinTypeId, Error, ItemTypeId, Objective, Result};

/// Orientation of the first-stage cuts (spec §6.1 `first_stage_orientation`).
/// Grounded on
/// `packingsolver/include/packingsolver/rectangleguillotine/instance.hpp::CutOrientation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutOrientation {
    Horizontal,
    Vertical,
}

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

#[derive(Debug, Clone)]
pub struct ItemType {
    pub rect: Rectangle,
    pub profit: i64,
    pub copies: u32,
    pub group_id: u32,
    pub oriented: bool,
    pub weight: f64,
}

impl ItemType {
    pub fn space(&self) -> i64 {
        self.rect.area()
    }

    pub fn oriented_rect(&self, rotated: bool) -> Rectangle {
        if rotated && !self.oriented {
            Rectangle { x: self.rect.y, y: self.rect.x }
        } else {
            self.rect
        }
    }
}

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

/// Guillotine-cutting-specific parameters (spec §6.1). Only the parameters
/// that affect the branching scheme's legality checks are modelled; the full
/// `CutType`/`TrimType` vocabulary is left to the CLI layer, out of scope
/// here (spec §1).
#[derive(Debug, Clone)]
pub struct Parameters {
    pub first_stage_orientation: CutOrientation,
    /// Minimum width a first-stage waste strip must have to not be
    /// re-cut further (spec §6.1 `minimum_waste_length`).
    pub minimum_waste_length: i64,
    /// Width consumed by the physical saw at each cut (spec §6.1
    /// `cut_thickness`).
    pub cut_thickness: i64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            first_stage_orientation: CutOrientation::Vertical,
            minimum_waste_length: 0,
            cut_thickness: 0,
        }
    }
}

/// Immutable container of guillotine item/bin types and precomputed
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
    fn rejects_non_positive_dimensions() {
        let mut b = InstanceBuilder::new(Objective::BinPacking);
        assert!(b.add_item_type(sq(0, 1)).is_err());
    }

    #[test]
    fn aggregates_are_consistent() {
        let mut b = InstanceBuilder::new(Objective::Knapsack);
        b.add_item_type(sq(3, 4)).unwrap();
        b.add_bin_type(bin(10, 10, 0, 1)).unwrap();
        let instance = b.build().unwrap();
        assert_eq!(instance.number_of_items(), 4);
        assert_eq!(instance.item_area(), 36);
    }
}
