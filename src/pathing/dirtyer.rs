//! The region dirtyer reacts to world changes for one movement category by
//! invalidating the regions a change touches and accumulating the affected
//! cells into a dirty set. Nothing is rebuilt here - the dirty set is drained
//! by the next partition rebuild, so bursts of changes collapse into a single
//! reassignment.
//!
//! Every invalidated region contributes its member cells to the dirty set,
//! which is what makes the deferred rebuild sound: flood fills seeded from the
//! dirty cells can always re-cover the ground the invalid regions gave up.
//!

use std::cell::RefCell;
use std::collections::HashSet;

use bevy::log::error;

use crate::prelude::*;

thread_local! {
	/// Reusable buffer for the distinct regions touched by one notification
	static SCRATCH_REGIONS: RefCell<Vec<RegionId>> = const { RefCell::new(Vec::new()) };
}

/// Accumulates the dirty cells of one movement category and invalidates the
/// regions that world changes touch
pub struct RegionDirtyer {
	/// Cells whose region assignment must be recomputed on the next rebuild
	dirty_cells: HashSet<Cell>,
	/// Margin in cells around a despawned object's footprint to dirty, covers
	/// ground the object blocked beyond its own cells
	size_padding: u32,
}

impl RegionDirtyer {
	/// Create a new instance of [RegionDirtyer] with an empty dirty set
	pub fn new(size_padding: u32) -> Self {
		RegionDirtyer {
			dirty_cells: HashSet::new(),
			size_padding,
		}
	}
	/// Whether any cell is waiting for a rebuild
	pub fn any_dirty(&self) -> bool {
		!self.dirty_cells.is_empty()
	}
	/// The cells waiting for a rebuild
	pub fn get_dirty_cells(&self) -> &HashSet<Cell> {
		&self.dirty_cells
	}
	/// Discard the dirty set without rebuilding, used once a rebuild has
	/// consumed it
	pub fn set_all_clean(&mut self) {
		self.dirty_cells.clear();
	}
	/// Take the dirty set for a rebuild, leaving it clean
	pub fn drain_dirty(&mut self) -> Vec<Cell> {
		self.dirty_cells.drain().collect()
	}
	/// Mark the whole map dirty: every cell enters the dirty set and every
	/// region is invalidated. Used when a category is first activated and when
	/// all path costs are recomputed wholesale
	pub fn set_all_dirty(&mut self, grid: &mut RegionGrid) -> Result<(), RegionCorruption> {
		self.dirty_cells.extend(grid.get_dimensions().all_cells());
		for id in grid.all_regions_no_rebuild_invalid_allowed() {
			// member cells are already covered by the blanket insert
			self.set_region_dirty(grid, id, false)?;
		}
		Ok(())
	}
	/// React to a single cell flipping between passable and impassable. Every
	/// valid region in the 3x3 neighbourhood around the cell is invalidated,
	/// since a flip at a region boundary can change the connectivity of all of
	/// its neighbours
	pub fn notify_walkability_changed(
		&mut self,
		grid: &mut RegionGrid,
		cell: Cell,
		now_passable: bool,
	) -> Result<(), RegionCorruption> {
		let dimensions = grid.get_dimensions();
		let result = SCRATCH_REGIONS.with(|scratch| {
			let mut touched = scratch.borrow_mut();
			touched.clear();
			for neighbour in cell.adjacent_cells_and_inside() {
				if !dimensions.in_bounds(neighbour) {
					continue;
				}
				if let Some(id) = grid.valid_region_at_no_rebuild(neighbour) {
					if !touched.contains(&id) {
						touched.push(id);
					}
				}
			}
			for id in touched.iter() {
				self.set_region_dirty(grid, *id, true)?;
			}
			Ok(())
		});
		result?;
		if !now_passable && dimensions.in_bounds(cell) {
			self.dirty_cells.insert(cell);
		}
		Ok(())
	}
	/// React to an object being placed on the map. Regions under and one cell
	/// around the footprint are invalidated and the footprint's own cells are
	/// dirtied so the rebuild re-derives their assignment
	pub fn notify_thing_spawned(
		&mut self,
		grid: &mut RegionGrid,
		rect: &CellRect,
	) -> Result<(), RegionCorruption> {
		self.dirty_region_rect(grid, rect, 1)
	}
	/// React to an object being removed from the map. The invalidated area is
	/// padded further than on spawn, ground the object blocked around itself
	/// may reconnect beyond the immediate footprint
	pub fn notify_thing_despawned(
		&mut self,
		grid: &mut RegionGrid,
		rect: &CellRect,
	) -> Result<(), RegionCorruption> {
		self.dirty_region_rect(grid, rect, self.size_padding)
	}
	/// Invalidate every distinct valid region under `rect` expanded by
	/// `margin`, then dirty the footprint's own cells
	fn dirty_region_rect(
		&mut self,
		grid: &mut RegionGrid,
		rect: &CellRect,
		margin: u32,
	) -> Result<(), RegionCorruption> {
		let dimensions = grid.get_dimensions();
		let expanded = rect.expanded_by(margin).clip_inside(&dimensions);
		let result = SCRATCH_REGIONS.with(|scratch| {
			let mut touched = scratch.borrow_mut();
			touched.clear();
			for cell in expanded.iter() {
				if let Some(id) = grid.valid_region_at_no_rebuild(cell) {
					if !touched.contains(&id) {
						touched.push(id);
					}
				}
			}
			for id in touched.iter() {
				self.set_region_dirty(grid, *id, true)?;
			}
			Ok(())
		});
		result?;
		for cell in rect.clip_inside(&dimensions).iter() {
			self.dirty_cells.insert(cell);
		}
		Ok(())
	}
	/// Invalidate one region, logging full diagnostics before propagating a
	/// corruption failure. With `add_cells` the region's member cells enter
	/// the dirty set, callers that blanket-dirty the map skip the insert
	fn set_region_dirty(
		&mut self,
		grid: &mut RegionGrid,
		id: RegionId,
		add_cells: bool,
	) -> Result<(), RegionCorruption> {
		match grid.invalidate_region(id) {
			Ok(Some(cells)) => {
				if add_cells {
					self.dirty_cells.extend(cells);
				}
				Ok(())
			}
			Ok(None) => Ok(()),
			Err(err) => {
				match grid.region(id) {
					Some(region) => error!(
						"Failed to dirty region {:?} (room: {:?}, links: {}, weights: {}): {}",
						id,
						region.get_room(),
						region.get_links().len(),
						region.get_weights().len(),
						err
					),
					None => error!("Failed to dirty region {:?} (missing from arena): {}", id, err),
				}
				Err(err)
			}
		}
	}
}
