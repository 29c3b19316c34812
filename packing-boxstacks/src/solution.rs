use std::sync::Arc;

use packing_core::{BinPos, BinTypeId, Error, ItemTypeId, Objective, Result, SolutionAggregates, StackId};

use crate::instance::Instance;

#[derive(Debug, Clone)]
pub struct SolutionItem {
    pub item_type_id: ItemTypeId,
    pub rotation: u8,
}

/// A vertical column of items sharing a footprint (spec §4.1 `add_stack`,
/// GLOSSARY "Stackability id").
#[derive(Debug, Clone)]
pub struct SolutionStack {
    pub x0: i64,
    pub x1: i64,
    pub y0: i64,
    pub y1: i64,
    pub items: Vec<SolutionItem>,
    pub height_used: i64,
    pub weight: f64,
}

impl SolutionStack {
    fn area(&self) -> i64 {
        (self.x1 - self.x0) * (self.y1 - self.y0)
    }

    fn overlaps(&self, other: &SolutionStack) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }
}

#[derive(Debug, Clone)]
pub struct SolutionBin {
    pub bin_type_id: BinTypeId,
    pub copies: u32,
    pub stacks: Vec<SolutionStack>,
    pub profit: i64,
    pub weight: f64,
}

/// Mutable assignment for the box-stacks variant (spec §3, §4.1).
#[derive(Debug, Clone)]
pub struct Solution {
    instance: Arc<Instance>,
    bins: Vec<SolutionBin>,
    item_copies: Vec<u32>,
    bin_copies: Vec<u32>,
    profit: i64,
    cost: i64,
    item_volume: i64,
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
            item_volume: 0,
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
            stacks: Vec::new(),
            profit: 0,
            weight: 0.0,
        });
        self.bin_copies[bin_type_id.index()] += copies;
        self.cost += bin_type.cost * copies as i64;
        self.number_of_bins += copies;
        Ok((self.bins.len() - 1) as BinPos)
    }

    /// Carves a vertical column footprint `[x0,x1) x [y0,y1)` inside the last
    /// added bin (spec §4.1 `add_stack`). Errors if it overlaps an existing
    /// stack or falls outside the bin's floor.
    pub fn add_stack(&mut self, bin_pos: BinPos, x0: i64, x1: i64, y0: i64, y1: i64) -> Result<StackId> {
        if self.bins.is_empty() || bin_pos as usize != self.bins.len() - 1 {
            return Err(Error::IllegalStateTransition(
                "add_stack must target the last added bin".into(),
            ));
        }
        if x1 <= x0 || y1 <= y0 {
            return Err(Error::InvalidInput("stack footprint must have positive area".into()));
        }
        let bin = &self.bins[bin_pos as usize];
        let bin_type = self.instance.bin_type(bin.bin_type_id);
        if x1 > bin_type.shape.x || y1 > bin_type.shape.y || x0 < 0 || y0 < 0 {
            return Err(Error::IllegalStateTransition(
                "stack footprint falls outside the bin floor".into(),
            ));
        }
        let candidate = SolutionStack {
            x0,
            x1,
            y0,
            y1,
            items: Vec::new(),
            height_used: 0,
            weight: 0.0,
        };
        let bin = self.bins.last().unwrap();
        if bin.stacks.iter().any(|s| s.overlaps(&candidate)) {
            return Err(Error::IllegalStateTransition(
                "stack footprint overlaps an existing stack".into(),
            ));
        }
        let bin = self.bins.last_mut().unwrap();
        bin.stacks.push(candidate);
        Ok(StackId::from(bin.stacks.len() - 1))
    }

    /// Places one item, oriented under `rotation`, on top of the stack at
    /// `stack_id` inside the bin at `bin_pos` (which must be the last added
    /// bin).
    pub fn add_item(
        &mut self,
        bin_pos: BinPos,
        stack_id: StackId,
        item_type_id: ItemTypeId,
        rotation: u8,
    ) -> Result<()> {
        if self.bins.is_empty() || bin_pos as usize != self.bins.len() - 1 {
            return Err(Error::IllegalStateTransition(
                "add_item must target the last added bin".into(),
            ));
        }
        let item_type = self.instance.item_type(item_type_id).clone();
        if !item_type.can_rotate(rotation) {
            return Err(Error::IllegalStateTransition(format!(
                "rotation {rotation} not allowed for this item type"
            )));
        }
        let oriented = item_type.oriented(rotation);

        let bin = self.bins.last_mut().unwrap();
        let bin_copies = bin.copies as f64;
        let stack = &mut bin.stacks[stack_id.index()];
        if oriented.x != stack.x1 - stack.x0 || oriented.y != stack.y1 - stack.y0 {
            return Err(Error::IllegalStateTransition(
                "item footprint does not match its stack".into(),
            ));
        }
        if stack.items.len() as u32 >= item_type.maximum_stackability {
            return Err(Error::IllegalStateTransition(
                "stack exceeds this item type's maximum stackability".into(),
            ));
        }

        stack.items.push(SolutionItem { item_type_id, rotation });
        stack.height_used += oriented.z;
        stack.weight += item_type.weight * bin_copies;

        bin.profit += item_type.profit;
        bin.weight += item_type.weight * bin_copies;

        self.item_copies[item_type_id.index()] += 1;
        self.profit += item_type.profit;
        self.item_volume += item_type.space();
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
        for stack in &source.stacks {
            let stack_id = self.add_stack(new_pos, stack.x0, stack.x1, stack.y0, stack.y1)?;
            for item in &stack.items {
                let mapped_item_type = item_map[item.item_type_id.index()];
                self.add_item(new_pos, stack_id, mapped_item_type, item.rotation)?;
            }
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

    pub fn item_volume(&self) -> i64 {
        self.item_volume
    }

    pub fn waste(&self) -> i64 {
        self.bins
            .iter()
            .map(|b| {
                let bin_type = self.instance.bin_type(b.bin_type_id);
                let used: i64 = b
                    .stacks
                    .iter()
                    .map(|s| s.area() * s.height_used)
                    .sum();
                (bin_type.volume() - used) * b.copies as i64
            })
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

    /// Per-stack density check against the bin type's `maximum_stack_density`
    /// (spec §3 BinType, §6.1 `maximum_stack_density`); a simplification of
    /// the original's full axle-weight model (Non-goal: no truck/axle
    /// subsystem), kept as the variant's weight-distribution predicate.
    pub fn feasible_axle_weights(&self) -> bool {
        self.bins.iter().all(|b| {
            let bin_type = self.instance.bin_type(b.bin_type_id);
            b.stacks.iter().all(|s| {
                let area = s.area() as f64;
                area <= 0.0 || s.weight / area <= bin_type.maximum_stack_density + 1e-9
            })
        })
    }

    pub fn feasible(&self) -> bool {
        self.feasible_total_weight() && self.feasible_axle_weights()
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
        self.bins
            .iter()
            .flat_map(|b| b.stacks.iter())
            .map(|s| s.x1)
            .max()
            .unwrap_or(0)
    }
    fn y_max(&self) -> i64 {
        self.bins
            .iter()
            .flat_map(|b| b.stacks.iter())
            .map(|s| s.y1)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{BinType, Box3, InstanceBuilder, ItemType};

    fn build_vbpp_instance() -> Arc<Instance> {
        let mut b = InstanceBuilder::new(Objective::VariableSizedBinPacking);
        b.add_item_type(ItemType {
            shape: Box3 { x: 1, y: 1, z: 1 },
            profit: 1,
            copies: 10,
            group_id: 0,
            rotations: 1,
            weight: 0.0,
            stackability_id: 0,
            nesting_height: 0,
            maximum_stackability: u32::MAX,
            maximum_weight_above: f64::INFINITY,
        })
        .unwrap();
        b.add_bin_type(BinType {
            shape: Box3 { x: 10, y: 10, z: 10 },
            cost: 1,
            copies: 10,
            copies_min: 0,
            maximum_weight: f64::INFINITY,
            maximum_stack_density: f64::INFINITY,
        })
        .unwrap();
        Arc::new(b.build().unwrap())
    }

    /// Concrete scenario 2 of spec §8: item `{1x1x1, copies=10}`, bin
    /// `{10x10x10, copies=10}`, objective VBPP: packs 10 items in one bin,
    /// cost 1.
    #[test]
    fn scenario_box_stacks_bin_copies() {
        let instance = build_vbpp_instance();
        let mut solution = Solution::new(instance.clone());
        let bin_pos = solution.add_bin(BinTypeId::from(0usize), 1).unwrap();
        let stack_id = solution.add_stack(bin_pos, 0, 1, 0, 1).unwrap();
        for _ in 0..10 {
            solution
                .add_item(bin_pos, stack_id, ItemTypeId::from(0usize), 0)
                .unwrap();
        }
        assert_eq!(solution.number_of_bins(), 1);
        assert_eq!(solution.cost(), 1);
        assert_eq!(solution.item_copies(ItemTypeId::from(0usize)), 10);
        assert!(solution.full());
    }

    #[test]
    fn overlapping_stacks_are_rejected() {
        let instance = build_vbpp_instance();
        let mut solution = Solution::new(instance);
        let bin_pos = solution.add_bin(BinTypeId::from(0usize), 1).unwrap();
        solution.add_stack(bin_pos, 0, 2, 0, 2).unwrap();
        assert!(solution.add_stack(bin_pos, 1, 3, 1, 3).is_err());
    }

    #[test]
    fn add_item_outside_last_bin_is_illegal() {
        let instance = build_vbpp_instance();
        let mut solution = Solution::new(instance);
        let bin_pos = solution.add_bin(BinTypeId::from(0usize), 1).unwrap();
        let stack_id = solution.add_stack(bin_pos, 0, 1, 0, 1).unwrap();
        solution.add_bin(BinTypeId::from(0usize), 1).unwrap();
        let err = solution
            .add_item(bin_pos, stack_id, ItemTypeId::from(0usize), 0)
            .unwrap_err();
        assert!(matches!(err, Error::IllegalStateTransition(_)));
    }
}
