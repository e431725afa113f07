//! Memoized reachability queries over a region partition. Two cells can reach
//! each other exactly when their regions share a room, so a query is two
//! partition lookups and a handle comparison, memoized per cell pair.
//!
//! The cache is only correct for the partition it was filled against, owners
//! clear it whenever their regions are dirtied.
//!

use std::collections::HashMap;

use crate::prelude::*;

/// Memoized cell-pair reachability for one movement category
#[derive(Default)]
pub struct ReachabilityCache {
	/// Answers keyed by normalized cell pair
	cache: HashMap<(Cell, Cell), bool>,
}

impl ReachabilityCache {
	/// Create a new instance of [ReachabilityCache]
	pub fn new() -> Self {
		ReachabilityCache {
			cache: HashMap::new(),
		}
	}
	/// Whether `from` can reach `to` over the partition in `grid`. The grid
	/// must be rebuilt before querying, an unanswered dirty set would make the
	/// memoized answers stale
	pub fn can_reach(&mut self, grid: &RegionGrid, from: Cell, to: Cell) -> bool {
		let key = Self::pair_key(from, to);
		if let Some(answer) = self.cache.get(&key) {
			return *answer;
		}
		let answer = match (
			Self::room_at(grid, from),
			Self::room_at(grid, to),
		) {
			(Some(a), Some(b)) => a == b,
			_ => false,
		};
		self.cache.insert(key, answer);
		answer
	}
	/// Number of memoized answers
	pub fn len(&self) -> usize {
		self.cache.len()
	}
	/// Whether no answer is memoized
	pub fn is_empty(&self) -> bool {
		self.cache.is_empty()
	}
	/// Discard every memoized answer, required whenever the partition changes
	pub fn clear_cache(&mut self) {
		self.cache.clear();
	}
	/// Reachability is symmetric so both query directions share a key
	fn pair_key(from: Cell, to: Cell) -> (Cell, Cell) {
		if from <= to {
			(from, to)
		} else {
			(to, from)
		}
	}
	/// The room of the valid region at `cell`, if any
	fn room_at(grid: &RegionGrid, cell: Cell) -> Option<RoomId> {
		grid.valid_region_at_no_rebuild(cell)
			.and_then(|id| grid.region(id))
			.and_then(|region| region.get_room())
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	/// 10x10 partition split by an impassable wall at `x == 4`
	fn walled_grid() -> RegionGrid {
		let dimensions = MapDimensions::new(10, 10);
		let mut cost = PathCostGrid::new(dimensions);
		for z in 0..10 {
			cost.set_cost(Cell::new(4, z), IMPASSABLE_COST);
		}
		let mut grid = RegionGrid::new(dimensions);
		let cells: Vec<Cell> = dimensions.all_cells().collect();
		grid.rebuild(&cost, &cells);
		grid
	}
	#[test]
	fn same_room_is_reachable() {
		let grid = walled_grid();
		let mut cache = ReachabilityCache::new();
		assert!(cache.can_reach(&grid, Cell::new(0, 0), Cell::new(3, 9)));
	}
	#[test]
	fn separated_rooms_are_unreachable() {
		let grid = walled_grid();
		let mut cache = ReachabilityCache::new();
		assert!(!cache.can_reach(&grid, Cell::new(0, 0), Cell::new(9, 9)));
	}
	#[test]
	fn impassable_cell_is_unreachable() {
		let grid = walled_grid();
		let mut cache = ReachabilityCache::new();
		assert!(!cache.can_reach(&grid, Cell::new(0, 0), Cell::new(4, 5)));
	}
	#[test]
	fn answers_are_memoized_symmetrically() {
		let grid = walled_grid();
		let mut cache = ReachabilityCache::new();
		cache.can_reach(&grid, Cell::new(0, 0), Cell::new(9, 9));
		cache.can_reach(&grid, Cell::new(9, 9), Cell::new(0, 0));
		assert_eq!(1, cache.len());
		cache.clear_cache();
		assert!(cache.is_empty());
	}
}
