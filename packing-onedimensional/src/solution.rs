use std::sync::Arc;

use packing_core::{BinPos, BinTypeId, Error, ItemTypeId, Objective, Result, SolutionAggregates};

use crate::instance::Instance;

#[derive(Debug, Clone)]
pub struct SolutionItem {
    pub item_type_id: ItemTypeId,
}

/// One bin in a [`Solution`]'s sequence (spec §3 `SolutionBin`).
#[derive(Debug, Clone)]
pub struct SolutionBin {
    pub bin_type_id: BinTypeId,
    pub copies: u32,
    pub items: Vec<SolutionItem>,
    pub length_used: i64,
    pub weight: f64,
    pub profit: i64,
}

/// Mutable assignment incrementally constructed by solvers (spec §4.1).
///
/// Bins are appended only (`add_bin`) and items can only be placed in the
/// last added bin (`add_item`); this mirrors the original's invariant that a
/// `Solution` is built by a single forward-moving cursor.
#[derive(Debug, Clone)]
pub struct Solution {
    instance: Arc<Instance>,
    bins: Vec<SolutionBin>,
    item_copies: Vec<u32>,
    bin_copies: Vec<u32>,
    profit: i64,
    cost: i64,
    item_length: i64,
    number_of_bins: u32,
    weight: f64,
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
            item_length: 0,
            number_of_bins: 0,
            weight: 0.0,
        }
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Appends a bin with multiplicity `copies >= 1`, returning its position.
    pub fn add_bin(&mut self, bin_type_id: BinTypeId, copies: u32) -> Result<BinPos> {
        if copies == 0 {
            return Err(Error::InvalidInput("bin copies must be >= 1".into()));
        }
        let bin_type = self.instance.bin_type(bin_type_id);
        self.bins.push(SolutionBin {
            bin_type_id,
            copies,
            items: Vec::new(),
            length_used: 0,
            weight: 0.0,
            profit: 0,
        });
        self.bin_copies[bin_type_id.index()] += copies;
        self.cost += bin_type.cost * copies as i64;
        self.number_of_bins += copies;
        Ok((self.bins.len() - 1) as BinPos)
    }

    /// Places one item into the bin at position `bin_pos`, which must be the
    /// last added bin (spec §7 `IllegalStateTransition`).
    pub fn add_item(&mut self, bin_pos: BinPos, item_type_id: ItemTypeId) -> Result<()> {
        if self.bins.is_empty() || bin_pos as usize != self.bins.len() - 1 {
            return Err(Error::IllegalStateTransition(
                "add_item must target the last added bin".into(),
            ));
        }
        let item_type = self.instance.item_type(item_type_id).clone();
        let bin = self.bins.last_mut().unwrap();
        bin.items.push(SolutionItem { item_type_id });
        bin.length_used += item_type.length;
        bin.weight += item_type.weight * bin.copies as f64;
        bin.profit += item_type.profit;

        self.item_copies[item_type_id.index()] += 1;
        self.profit += item_type.profit;
        self.item_length += item_type.length;
        self.weight += item_type.weight * bin.copies as f64;
        Ok(())
    }

    /// Copies one bin of `other` (renumbered through `bin_map`/`item_map`)
    /// into `self`, `copies` times — the universal glue between
    /// meta-heuristic subproblems and the parent solution (spec §4.1).
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
            self.add_item(new_pos, mapped_item_type)?;
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

    pub fn item_length(&self) -> i64 {
        self.item_length
    }

    pub fn waste(&self) -> i64 {
        let used: i64 = self
            .bins
            .iter()
            .map(|b| (self.instance.bin_type(b.bin_type_id).length - b.length_used) * b.copies as i64)
            .sum();
        used
    }

    /// `true` iff every demanded item copy has been placed (spec §3, §4.1).
    pub fn full(&self) -> bool {
        (0..self.instance.number_of_item_types()).all(|i| {
            let id = ItemTypeId::from(i);
            self.item_copies[i] >= self.instance.item_type(id).copies
        })
    }

    pub fn feasible_total_weight(&self) -> bool {
        self.bins.iter().all(|b| {
            b.weight <= self.instance.bin_type(b.bin_type_id).maximum_weight * b.copies as f64 + 1e-9
        })
    }

    pub fn feasible(&self) -> bool {
        self.feasible_total_weight()
            && (0..self.instance.number_of_item_types()).all(|i| {
                let id = ItemTypeId::from(i);
                self.item_copies[i] <= self.instance.item_type(id).copies
            })
            && (0..self.instance.number_of_bin_types()).all(|i| {
                let id = BinTypeId::from(i);
                self.bin_copies[i] <= self.instance.bin_type(id).copies
            })
    }

    /// Non-negative quantity the repair step (SVC) uses to measure how far
    /// from feasible an overweight solution is (spec §4.1, §7).
    pub fn compute_weight_constraints_violation(&self) -> f64 {
        self.bins
            .iter()
            .map(|b| {
                let max = self.instance.bin_type(b.bin_type_id).maximum_weight * b.copies as f64;
                (b.weight - max).max(0.0)
            })
            .sum()
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
        self.item_length
    }
    fn y_max(&self) -> i64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{BinType, InstanceBuilder, ItemType};

    fn build_vbpp_instance() -> Arc<Instance> {
        let mut b = InstanceBuilder::new(Objective::VariableSizedBinPacking);
        b.add_item_type(ItemType {
            length: 1,
            profit: 1,
            copies: 10,
            weight: 0.0,
            nesting_length: 0,
            maximum_stackability: u32::MAX,
            maximum_weight_after: f64::INFINITY,
            eligibility_id: None,
        })
        .unwrap();
        b.add_bin_type(BinType {
            length: 10,
            cost: 1,
            copies: 10,
            copies_min: 0,
            maximum_weight: f64::INFINITY,
            eligibility_ids: Vec::new(),
        })
        .unwrap();
        Arc::new(b.build().unwrap())
    }

    /// Concrete scenario 1 of spec §8: one item type (length=1, copies=10),
    /// one bin type (length=10, copies=10), objective VBPP.
    #[test]
    fn scenario_one_dimensional_bin_copies() {
        let instance = build_vbpp_instance();
        let mut solution = Solution::new(instance.clone());
        let bin_pos = solution.add_bin(BinTypeId::from(0usize), 2).unwrap();
        assert_eq!(bin_pos, 0);
        assert_eq!(solution.number_of_bins(), 2);
        assert_eq!(solution.bin_copies(BinTypeId::from(0usize)), 2);
    }

    #[test]
    fn add_item_outside_last_bin_is_illegal() {
        let instance = build_vbpp_instance();
        let mut solution = Solution::new(instance);
        solution.add_bin(BinTypeId::from(0usize), 1).unwrap();
        solution.add_bin(BinTypeId::from(0usize), 1).unwrap();
        let err = solution.add_item(0, ItemTypeId::from(0usize)).unwrap_err();
        assert!(matches!(err, Error::IllegalStateTransition(_)));
    }

    #[test]
    fn profit_and_item_volume_invariants_hold() {
        let instance = build_vbpp_instance();
        let mut solution = Solution::new(instance.clone());
        let pos = solution.add_bin(BinTypeId::from(0usize), 1).unwrap();
        for _ in 0..5 {
            solution.add_item(pos, ItemTypeId::from(0usize)).unwrap();
        }
        assert_eq!(solution.profit(), 5);
        assert_eq!(solution.item_length(), 5);
        assert_eq!(solution.item_copies(ItemTypeId::from(0usize)), 5);
        assert!(solution.item_copies(ItemTypeId::from(0usize)) <= instance.item_type(ItemTypeId::from(0usize)).copies);
    }
}
