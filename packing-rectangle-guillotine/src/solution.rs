use std::sync::Arc;

use packing_core::{BinPos, BinTypeId, Error, ItemTypeId, Objective, Result, SolutionAggregates};

use crate::instance::Instance;

#[derive(Debug, Clone)]
pub struct SolutionItem {
    pub item_type_id: ItemTypeId,
    pub x: i64,
    pub y: i64,
    pub rotated: bool,
}

#[derive(Debug, Clone)]
pub struct SolutionBin {
    pub bin_type_id: BinTypeId,
    pub copies: u32,
    pub items: Vec<SolutionItem>,
    pub area_used: i64,
    pub weight: f64,
    pub profit: i64,
}

/// Mutable assignment for the 3-stage guillotine variant (spec §3, §4.1).
/// Items are recorded with their absolute placement; the strip/shelf
/// structure that produced the placement lives only in the branching
/// scheme, same as the `rectangle` variant's shelves.
#[derive(Debug, Clone)]
pub struct Solution {
    instance: Arc<Instance>,
    bins: Vec<SolutionBin>,
    item_copies: Vec<u32>,
    bin_copies: Vec<u32>,
    profit: i64,
    cost: i64,
    item_area: i64,
    number_of_bins: u32,
}

impl Solution {
    pub fn new(instance: Arc<Instance>) -> Self {
        let item_copies = vec![0; instance.number_of_item_types()];
        let bin_copies = vec![0; instance.number_of_bin_types()];
        Solution {
            instance,
            bins: Vec::new(),
            item_copies,
            bin_copies,
            profit: 0,
            cost: 0,
            item_area: 0,
            number_of_bins: 0,
        }
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn add_bin(&mut self, bin_type_id: BinTypeId, copies: u32) -> Result<BinPos> {
        if copies == 0 {
            return Err(Error::InvalidInput("bin copies must be >= 1".into()));
        }
        let bin_type = self.instance.bin_type(bin_type_id);
        self.bins.push(SolutionBin {
            bin_type_id,
            copies,
            items: Vec::new(),
            area_used: 0,
            weight: 0.0,
            profit: 0,
        });
        self.bin_copies[bin_type_id.index()] += copies;
        self.cost += bin_type.cost * copies as i64;
        self.number_of_bins += copies;
        Ok((self.bins.len() - 1) as BinPos)
    }

    /// Places an item at `(x, y)` in the last added bin (spec §4.1
    /// `add_item`). The guillotine-cut legality (the item's footprint must
    /// line up with a strip/shelf boundary reachable by straight cuts) is
    /// the branching scheme's responsibility; this only enforces the
    /// state-machine invariant and the `oriented` constraint.
    pub fn add_item(&mut self, bin_pos: BinPos, item_type_id: ItemTypeId, x: i64, y: i64, rotated: bool) -> Result<()> {
        if self.bins.is_empty() || bin_pos as usize != self.bins.len() - 1 {
            return Err(Error::IllegalStateTransition(
                "add_item must target the last added bin".into(),
            ));
        }
        let item_type = self.instance.item_type(item_type_id).clone();
        if rotated && item_type.oriented {
            return Err(Error::IllegalStateTransition(
                "item type cannot be rotated".into(),
            ));
        }
        let bin = self.bins.last_mut().unwrap();
        let bin_copies = bin.copies as f64;
        bin.items.push(SolutionItem { item_type_id, x, y, rotated });
        bin.area_used += item_type.space();
        bin.weight += item_type.weight * bin_copies;
        bin.profit += item_type.profit;

        self.item_copies[item_type_id.index()] += 1;
        self.profit += item_type.profit;
        self.item_area += item_type.space();
        Ok(())
    }

    pub fn append(
        &mut self,
        other: &Solution,
        bin_pos: BinPos,
        copies: u32,
        bin_map: &[BinTypeId],
        item_map: &[ItemTypeId],
    ) -> Result<()> {
        let source = &other.bins[bin_pos as usize];
        let mapped_bin_type = bin_map[source.bin_type_id.index()];
        let new_pos = self.add_bin(mapped_bin_type, copies)?;
        for item in &source.items {
            let mapped_item_type = item_map[item.item_type_id.index()];
            self.add_item(new_pos, mapped_item_type, item.x, item.y, item.rotated)?;
        }
        Ok(())
    }

    pub fn number_of_bins(&self) -> u32 {
        self.number_of_bins
    }

    pub fn bin_copies(&self, bin_type_id: BinTypeId) -> u32 {
        self.bin_copies[bin_type_id.index()]
    }

    pub fn item_copies(&self, item_type_id: ItemTypeId) -> u32 {
        self.item_copies[item_type_id.index()]
    }

    pub fn bins(&self) -> &[SolutionBin] {
        &self.bins
    }

    pub fn profit(&self) -> i64 {
        self.profit
    }

    pub fn cost(&self) -> i64 {
        self.cost
    }

    pub fn item_area(&self) -> i64 {
        self.item_area
    }

    pub fn waste(&self) -> i64 {
        self.bins
            .iter()
            .map(|b| (self.instance.bin_type(b.bin_type_id).area() - b.area_used) * b.copies as i64)
            .sum()
    }

    pub fn full(&self) -> bool {
        (0..self.instance.number_of_item_types()).all(|i| {
            let id = ItemTypeId::from(i);
            self.item_copies[i] >= self.instance.item_type(id).copies
        })
    }

    pub fn feasible_total_weight(&self) -> bool {
        self.bins
            .iter()
            .all(|b| b.weight <= self.instance.bin_type(b.bin_type_id).maximum_weight * b.copies as f64 + 1e-9)
    }

    pub fn feasible(&self) -> bool {
        self.feasible_total_weight()
    }

    pub fn compute_weight_constraints_violation(&self) -> f64 {
        self.bins
            .iter()
            .map(|b| {
                let max = self.instance.bin_type(b.bin_type_id).maximum_weight * b.copies as f64;
                (b.weight - max).max(0.0)
            })
            .sum()
    }

    pub fn x_max(&self) -> i64 {
        self.bins.iter().flat_map(|b| b.items.iter()).map(|it| it.x + self.item_extent(it).0).max().unwrap_or(0)
    }

    pub fn y_max(&self) -> i64 {
        self.bins.iter().flat_map(|b| b.items.iter()).map(|it| it.y + self.item_extent(it).1).max().unwrap_or(0)
    }

    fn item_extent(&self, item: &SolutionItem) -> (i64, i64) {
        let rect = self.instance.item_type(item.item_type_id).oriented_rect(item.rotated);
        (rect.x, rect.y)
    }
}

impl SolutionAggregates for Solution {
    fn objective(&self) -> Objective {
        self.instance.objective()
    }
    fn profit(&self) -> i64 {
        self.profit
    }
    fn cost(&self) -> i64 {
        self.cost
    }
    fn waste(&self) -> i64 {
        Solution::waste(self)
    }
    fn is_full(&self) -> bool {
        self.full()
    }
    fn number_of_bins(&self) -> u32 {
        self.number_of_bins
    }
    fn x_max(&self) -> i64 {
        Solution::x_max(self)
    }
    fn y_max(&self) -> i64 {
        Solution::y_max(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{BinType, InstanceBuilder, ItemType, Rectangle};

    fn build_instance() -> Arc<Instance> {
        let mut b = InstanceBuilder::new(Objective::Knapsack);
        b.add_item_type(ItemType {
            rect: Rectangle { x: 3, y: 2 },
            profit: 6,
            copies: 5,
            group_id: 0,
            oriented: false,
            weight: 0.0,
        })
        .unwrap();
        b.add_bin_type(BinType {
            rect: Rectangle { x: 10, y: 10 },
            cost: 1,
            copies: 3,
            copies_min: 0,
            maximum_weight: f64::INFINITY,
        })
        .unwrap();
        Arc::new(b.build().unwrap())
    }

    #[test]
    fn add_item_accumulates_profit_and_area() {
        let instance = build_instance();
        let mut solution = Solution::new(instance);
        let pos = solution.add_bin(BinTypeId::from(0usize), 1).unwrap();
        solution.add_item(pos, ItemTypeId::from(0usize), 0, 0, false).unwrap();
        solution.add_item(pos, ItemTypeId::from(0usize), 3, 0, false).unwrap();
        assert_eq!(solution.profit(), 12);
        assert_eq!(solution.item_area(), 12);
        assert_eq!(solution.x_max(), 6);
    }

    #[test]
    fn rotated_item_on_oriented_type_is_illegal() {
        let mut builder = InstanceBuilder::new(Objective::Knapsack);
        builder
            .add_item_type(ItemType {
                rect: Rectangle { x: 3, y: 2 },
                profit: 6,
                copies: 5,
                group_id: 0,
                oriented: true,
                weight: 0.0,
            })
            .unwrap();
        builder
            .add_bin_type(BinType {
                rect: Rectangle { x: 10, y: 10 },
                cost: 1,
                copies: 3,
                copies_min: 0,
                maximum_weight: f64::INFINITY,
            })
            .unwrap();
        let instance = Arc::new(builder.build().unwrap());
        let mut solution = Solution::new(instance);
        let pos = solution.add_bin(BinTypeId::from(0usize), 1).unwrap();
        let err = solution.add_item(pos, ItemTypeId::from(0usize), 0, 0, true).unwrap_err();
        assert!(matches!(err, Error::IllegalStateTransition(_)));
    }
}
