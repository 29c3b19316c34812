use packing_core::{BinTypeId, Error, ItemTypeId, Objective, Result};

/// An axis-aligned box, `x`/`y` the footprint and `z` the height (spec §3
/// `ItemType.shape`). Grounded on
/// `packingsolver/include/packingsolver/boxstacks/instance.hpp::Box`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Box3 {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Box3 {
    pub fn volume(&self) -> i64 {
        self.x * self.y * self.z
    }

    pub fn footprint_area(&self) -> i64 {
        self.x * self.y
    }
}

/// Item type for the box-stacks variant.
#[derive(Debug, Clone)]
pub struct ItemType {
    pub shape: Box3,
    pub profit: i64,
    pub copies: u32,
    pub group_id: u32,
    /// Bitmask over the six axis permutations; bit 0 is always "no rotation".
    pub rotations: u8,
    pub weight: f64,
    /// Items can stack on one another only when they share `stackability_id`
    /// and footprint.
    pub stackability_id: u32,
    pub nesting_height: i64,
    pub maximum_stackability: u32,
    pub maximum_weight_above: f64,
}

impl ItemType {
    pub fn space(&self) -> i64 {
        self.shape.volume()
    }

    pub fn can_rotate(&self, rotation: u8) -> bool {
        (self.rotations >> rotation) & 1 == 1
    }

    /// The box oriented under `rotation` (spec's six-way rotation table;
    /// only the identity and the x/y swap are meaningful once a stack's
    /// footprint is fixed, so only rotations 0 and 1 are materialized).
    pub fn oriented(&self, rotation: u8) -> Box3 {
        match rotation {
            1 => Box3 {
                x: self.shape.y,
                y: self.shape.x,
                z: self.shape.z,
            },
            _ => self.shape,
        }
    }
}

/// Bin type for the box-stacks variant.
#[derive(Debug, Clone)]
pub struct BinType {
    pub shape: Box3,
    pub cost: i64,
    pub copies: u32,
    pub copies_min: u32,
    pub maximum_weight: f64,
    /// Weight / footprint-area ceiling anywhere in the bin (spec §6.1
    /// `maximum_stack_density`).
    pub maximum_stack_density: f64,
}

impl BinType {
    pub fn volume(&self) -> i64 {
        self.shape.volume()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Parameters {}

/// Immutable container of box-stacks item/bin types plus precomputed
/// aggregates (spec §3, §4.1).
#[derive(Debug, Clone)]
pub struct Instance {
    objective: Objective,
    parameters: Parameters,
    item_types: Vec<ItemType>,
    bin_types: Vec<BinType>,

    number_of_items: u32,
    item_volume: i64,
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

    pub fn item_volume(&self) -> i64 {
        self.item_volume
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
        if item_type.shape.x <= 0 || item_type.shape.y <= 0 || item_type.shape.z <= 0 {
            return Err(Error::InvalidInput(format!(
                "item box dimensions must be positive, got {:?}",
                item_type.shape
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
        if bin_type.shape.x <= 0 || bin_type.shape.y <= 0 || bin_type.shape.z <= 0 {
            return Err(Error::InvalidInput(format!(
                "bin box dimensions must be positive, got {:?}",
                bin_type.shape
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

        let max_bin_volume = self.bin_types.iter().map(|b| b.volume()).max().unwrap_or(0);
        for item in &mut self.item_types {
            if item.copies == INFINITE_COPIES {
                let v = item.space();
                item.copies = if v > 0 { (max_bin_volume / v).max(1) as u32 } else { 1 };
            }
        }

        let number_of_items: u32 = self.item_types.iter().map(|t| t.copies).sum();
        let item_volume: i64 = self.item_types.iter().map(|t| t.space() * t.copies as i64).sum();
        let item_profit: i64 = self
            .item_types
            .iter()
            .map(|t| t.profit * t.copies as i64)
            .sum();
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
                .all(|t| t.space() > 0 && (t.copies as i64) * t.space() >= max_bin_volume);
        let maximum_bin_cost = self.bin_types.iter().map(|b| b.cost).max().unwrap_or(0);

        Ok(Instance {
            objective: self.objective,
            parameters: self.parameters,
            item_types: self.item_types,
            bin_types: self.bin_types,
            number_of_items,
            item_volume,
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

    fn cube(side: i64, copies: u32) -> ItemType {
        ItemType {
            shape: Box3 { x: side, y: side, z: side },
            profit: side * side * side,
            copies,
            group_id: 0,
            rotations: 1,
            weight: 0.0,
            stackability_id: 0,
            nesting_height: 0,
            maximum_stackability: u32::MAX,
            maximum_weight_above: f64::INFINITY,
        }
    }

    fn bin(side: i64, cost: i64, copies: u32) -> BinType {
        BinType {
            shape: Box3 { x: side, y: side, z: side },
            cost,
            copies,
            copies_min: 0,
            maximum_weight: f64::INFINITY,
            maximum_stack_density: f64::INFINITY,
        }
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        let mut b = InstanceBuilder::new(Objective::VariableSizedBinPacking);
        let mut it = cube(1, 1);
        it.shape.z = 0;
        assert!(b.add_item_type(it).is_err());
    }

    #[test]
    fn aggregates_match_volume_and_profit() {
        let mut b = InstanceBuilder::new(Objective::VariableSizedBinPacking);
        b.add_item_type(cube(1, 10)).unwrap();
        b.add_bin_type(bin(10, 1, 10)).unwrap();
        let instance = b.build().unwrap();
        assert_eq!(instance.number_of_items(), 10);
        assert_eq!(instance.item_volume(), 10);
        assert_eq!(instance.item_profit(), 10);
    }
}
