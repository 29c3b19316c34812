use packing_core::{BinTypeId, Error, ItemTypeId, Objective, Result};

/// Item type for the one-dimensional variant (lengths only).
///
/// Grounded on `packingsolver/include/packingsolver/onedimensional/instance.hpp`'s
/// `ItemType`.
#[derive(Debug, Clone)]
pub struct ItemType {
    pub length: i64,
    pub profit: i64,
    pub copies: u32,
    pub weight: f64,
    /// Length to remove when this item is packed directly after another item
    /// of the same type in the same bin.
    pub nesting_length: i64,
    pub maximum_stackability: u32,
    pub maximum_weight_after: f64,
    /// `None` means the item type can be packed in any bin type.
    pub eligibility_id: Option<u32>,
}

impl ItemType {
    pub fn space(&self) -> i64 {
        self.length
    }
}

/// Bin type for the one-dimensional variant.
#[derive(Debug, Clone)]
pub struct BinType {
    pub length: i64,
    pub cost: i64,
    pub copies: u32,
    pub copies_min: u32,
    pub maximum_weight: f64,
    pub eligibility_ids: Vec<u32>,
}

impl BinType {
    pub fn space(&self) -> i64 {
        self.length
    }

    fn accepts(&self, item: &ItemType) -> bool {
        match item.eligibility_id {
            None => true,
            Some(id) => self.eligibility_ids.is_empty() || self.eligibility_ids.contains(&id),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Parameters {}

/// Immutable container of item types, bin types, the declared objective, and
/// precomputed aggregates (spec §3, §4.1). Built once by [`InstanceBuilder`]
/// and shared read-only by all workers.
#[derive(Debug, Clone)]
pub struct Instance {
    objective: Objective,
    parameters: Parameters,
    item_types: Vec<ItemType>,
    bin_types: Vec<BinType>,

    number_of_items: u32,
    item_length: i64,
    item_profit: i64,
    max_efficiency_item_type_id: Option<ItemTypeId>,
    maximum_item_copies: u32,
    all_item_types_infinite_copies: bool,
    maximum_bin_cost: i64,
}

/// Sentinel copies value meaning "effectively infinite" (spec §6.1:
/// `COPIES = -1`).
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
        self.item_types
            .iter()
            .enumerate()
            .map(|(i, t)| (ItemTypeId::from(i), t))
    }

    pub fn number_of_bin_types(&self) -> usize {
        self.bin_types.len()
    }

    pub fn bin_type(&self, id: BinTypeId) -> &BinType {
        &self.bin_types[id.index()]
    }

    pub fn bin_types(&self) -> impl Iterator<Item = (BinTypeId, &BinType)> {
        self.bin_types
            .iter()
            .enumerate()
            .map(|(i, t)| (BinTypeId::from(i), t))
    }

    pub fn bin_accepts(&self, bin_type_id: BinTypeId, item_type_id: ItemTypeId) -> bool {
        self.bin_type(bin_type_id).accepts(self.item_type(item_type_id))
    }

    pub fn number_of_items(&self) -> u32 {
        self.number_of_items
    }

    pub fn item_length(&self) -> i64 {
        self.item_length
    }

    pub fn mean_item_length(&self) -> f64 {
        if self.number_of_items == 0 {
            0.0
        } else {
            self.item_length as f64 / self.number_of_items as f64
        }
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

    /// `true` iff every item type has effectively infinite copies (spec §8
    /// boundary case): packing then terminates at bin capacity, not demand.
    pub fn unbounded_knapsack(&self) -> bool {
        self.all_item_types_infinite_copies
    }

    pub fn maximum_bin_cost(&self) -> i64 {
        self.maximum_bin_cost
    }
}

/// Builder assembling an [`Instance`]. Only read access is exposed once
/// built (spec §3 "Ownership").
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

    /// Adds an item type. `copies == -1` (represented here as `None`) means
    /// effectively infinite; resolved to `ceil(max_bin_area / item_area)` at
    /// `build()` time once the largest bin is known (spec §8 boundary case).
    pub fn add_item_type(&mut self, item_type: ItemType) -> Result<ItemTypeId> {
        if item_type.length <= 0 {
            return Err(Error::InvalidInput(format!(
                "item length must be positive, got {}",
                item_type.length
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
        if bin_type.length <= 0 {
            return Err(Error::InvalidInput(format!(
                "bin length must be positive, got {}",
                bin_type.length
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

        let max_bin_length = self.bin_types.iter().map(|b| b.length).max().unwrap_or(0);
        for item in &mut self.item_types {
            if item.copies == INFINITE_COPIES {
                let copies = if item.length > 0 {
                    (max_bin_length / item.length).max(1) as u32
                } else {
                    1
                };
                item.copies = copies;
            }
        }

        let number_of_items: u32 = self.item_types.iter().map(|t| t.copies).sum();
        let item_length: i64 = self
            .item_types
            .iter()
            .map(|t| t.length * t.copies as i64)
            .sum();
        let item_profit: i64 = self
            .item_types
            .iter()
            .map(|t| t.profit * t.copies as i64)
            .sum();
        let max_efficiency_item_type_id = self
            .item_types
            .iter()
            .enumerate()
            .filter(|(_, t)| t.length > 0)
            .max_by(|(_, a), (_, b)| {
                let ea = a.profit as f64 / a.length as f64;
                let eb = b.profit as f64 / b.length as f64;
                ea.partial_cmp(&eb).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| ItemTypeId::from(i));
        let maximum_item_copies = self.item_types.iter().map(|t| t.copies).max().unwrap_or(0);
        // An item type counts as "infinite" here iff its resolved copies
        // alone already fill the largest bin to capacity.
        let all_item_types_infinite_copies = !self.item_types.is_empty()
            && self
                .item_types
                .iter()
                .all(|t| t.length > 0 && (t.copies as i64) * t.length >= max_bin_length);
        let maximum_bin_cost = self.bin_types.iter().map(|b| b.cost).max().unwrap_or(0);

        Ok(Instance {
            objective: self.objective,
            parameters: self.parameters,
            item_types: self.item_types,
            bin_types: self.bin_types,
            number_of_items,
            item_length,
            item_profit,
            max_efficiency_item_type_id,
            maximum_item_copies,
            all_item_types_infinite_copies,
            maximum_bin_cost,
        })
    }
}
