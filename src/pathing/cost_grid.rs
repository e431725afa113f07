//! The path cost grid stores an integer traversal cost for every cell of a
//! map, maintained separately for each movement category. A value of
//! [IMPASSABLE_COST] is a special case marking the cell as strictly forbidden
//! for that category. Any other value indicates a harder cost of movement,
//! `1` being the easiest.
//!
//! Recomputation derives a cell's cost from the terrain beneath it (category
//! overrides first, base terrain cost otherwise) and the objects occupying it
//! (an impassable override short-circuits, otherwise the largest obstruction
//! is added on top). Rect recomputation consumes pre-snapshotted per-cell
//! inputs so a background worker never reads live map state mid-mutation.
//!

use crate::prelude::*;

/// Sentinel cost marking a cell as forbidden for a category, used both as an
/// override input and as recomputed output when traversal is blocked
pub const IMPASSABLE_COST: u32 = u32::MAX;

/// Integer traversal cost of every cell of a map for one movement category
#[derive(Clone)]
pub struct PathCostGrid {
	/// Bounds of the map the grid covers
	dimensions: MapDimensions,
	/// Row-major cell costs
	costs: Vec<u32>,
}

impl PathCostGrid {
	/// Create a new instance of [PathCostGrid] with every cell at the default
	/// cost of `1`
	pub fn new(dimensions: MapDimensions) -> Self {
		PathCostGrid {
			dimensions,
			costs: vec![1; dimensions.cell_count()],
		}
	}
	/// Bounds of the map the grid covers
	pub fn get_dimensions(&self) -> MapDimensions {
		self.dimensions
	}
	/// Retrieve the cost of a cell
	pub fn get_cost(&self, cell: Cell) -> u32 {
		self.costs[self.dimensions.cell_index(cell)]
	}
	/// Set the cost of a cell
	pub fn set_cost(&mut self, cell: Cell, value: u32) {
		let index = self.dimensions.cell_index(cell);
		self.costs[index] = value;
	}
	/// Whether a cell can be traversed at all by the owning category
	pub fn is_passable(&self, cell: Cell) -> bool {
		self.dimensions.in_bounds(cell) && self.get_cost(cell) != IMPASSABLE_COST
	}
	/// Recompute the cost of a single cell from the terrain beneath it and a
	/// snapshot of the objects occupying it
	pub fn recompute_cost_at(
		&mut self,
		registry: &PathingRegistry,
		category: CategoryId,
		cell: Cell,
		terrain: TerrainId,
		things: &[ThingKindId],
	) {
		let cost = calculate_path_cost(registry, category, terrain, things);
		self.set_cost(cell, cost);
	}
	/// Recompute the cost of every cell under `rect` from snapshots taken
	/// before dispatch. `terrains` and `thing_lists` hold one entry per cell
	/// of `rect` in its row-order iteration
	pub fn recompute_under_rect(
		&mut self,
		registry: &PathingRegistry,
		category: CategoryId,
		rect: &CellRect,
		terrains: &[TerrainId],
		thing_lists: &[Vec<ThingKindId>],
	) {
		if rect.cell_count() != terrains.len() || rect.cell_count() != thing_lists.len() {
			panic!(
				"Snapshot length mismatch, rect covers {} cells but {} terrain and {} thing entries were supplied",
				rect.cell_count(),
				terrains.len(),
				thing_lists.len()
			);
		}
		for (i, cell) in rect.iter().enumerate() {
			self.recompute_cost_at(registry, category, cell, terrains[i], &thing_lists[i]);
		}
	}
}

/// Derive the traversal cost of a cell for `category`. Terrain contributes the
/// category override if one exists, the base terrain cost otherwise (sentinel
/// if the terrain is impassable for the category). Object overrides are
/// lookups rather than combined arithmetic: any impassable object
/// short-circuits, otherwise the largest obstruction is added to the terrain
/// cost
pub fn calculate_path_cost(
	registry: &PathingRegistry,
	category: CategoryId,
	terrain: TerrainId,
	things: &[ThingKindId],
) -> u32 {
	let category_def = registry.category(category);
	let terrain_cost = match category_def.custom_terrain_costs.get(&terrain) {
		Some(&cost) => cost,
		None => match registry.terrain(terrain) {
			Some(terrain_def) => {
				if terrain_def.passable && !category_def.default_terrain_impassable {
					terrain_def.path_cost
				} else {
					IMPASSABLE_COST
				}
			}
			// an unregistered terrain affects nothing
			None => {
				if category_def.default_terrain_impassable {
					IMPASSABLE_COST
				} else {
					1
				}
			}
		},
	};
	if terrain_cost == IMPASSABLE_COST {
		return IMPASSABLE_COST;
	}
	let mut obstruction = 0;
	for kind in things.iter() {
		let cost = match category_def.custom_thing_costs.get(kind) {
			Some(&cost) => cost,
			None => match registry.thing_kind(*kind) {
				Some(kind_def) => kind_def.path_cost,
				// an unregistered kind affects nothing
				None => continue,
			},
		};
		if cost == IMPASSABLE_COST {
			return IMPASSABLE_COST;
		}
		obstruction = obstruction.max(cost);
	}
	terrain_cost.saturating_add(obstruction)
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	/// Registry with one passable terrain, one impassable terrain, a blocking
	/// kind and a slowing kind
	fn fixture() -> (PathingRegistry, CategoryId, TerrainId, TerrainId, ThingKindId, ThingKindId) {
		let mut builder = PathingRegistryBuilder::new();
		let ground = builder.add_terrain(TerrainDef {
			name: "ground".to_string(),
			path_cost: 1,
			passable: true,
			tags: vec![],
		});
		let marsh = builder.add_terrain(TerrainDef {
			name: "marsh".to_string(),
			path_cost: 14,
			passable: false,
			tags: vec![],
		});
		let wall = builder.add_thing_kind(ThingKindDef {
			name: "wall".to_string(),
			path_cost: IMPASSABLE_COST,
			affects_regions: true,
		});
		let debris = builder.add_thing_kind(ThingKindDef {
			name: "debris".to_string(),
			path_cost: 6,
			affects_regions: false,
		});
		let mut category_def = CategoryDef::new("walker");
		category_def.custom_terrain_costs.insert(marsh, 20);
		let category = builder.add_category(category_def);
		(builder.build(), category, ground, marsh, wall, debris)
	}
	#[test]
	fn default_grid_cost() {
		let grid = PathCostGrid::new(MapDimensions::new(10, 10));
		assert_eq!(1, grid.get_cost(Cell::new(5, 5)));
	}
	#[test]
	fn terrain_override_beats_base_passability() {
		let (registry, category, _ground, marsh, _wall, _debris) = fixture();
		// marsh is impassable by default but the category overrides it
		let result = calculate_path_cost(&registry, category, marsh, &[]);
		assert_eq!(20, result);
	}
	#[test]
	fn impassable_thing_short_circuits() {
		let (registry, category, ground, _marsh, wall, debris) = fixture();
		let result = calculate_path_cost(&registry, category, ground, &[debris, wall, debris]);
		assert_eq!(IMPASSABLE_COST, result);
	}
	#[test]
	fn largest_obstruction_added_to_terrain() {
		let (registry, category, ground, _marsh, _wall, debris) = fixture();
		let result = calculate_path_cost(&registry, category, ground, &[debris, debris]);
		// obstructions are not summed, two debris cost the same as one
		assert_eq!(7, result);
	}
	#[test]
	fn recompute_under_rect_from_snapshots() {
		let (registry, category, ground, _marsh, wall, _debris) = fixture();
		let mut grid = PathCostGrid::new(MapDimensions::new(10, 10));
		let rect = CellRect::new(Cell::new(4, 4), Cell::new(5, 5));
		let terrains = vec![ground; 4];
		let thing_lists = vec![vec![wall], vec![wall], vec![wall], vec![wall]];
		grid.recompute_under_rect(&registry, category, &rect, &terrains, &thing_lists);
		for cell in rect.iter() {
			assert_eq!(IMPASSABLE_COST, grid.get_cost(cell));
			assert!(!grid.is_passable(cell));
		}
		assert_eq!(1, grid.get_cost(Cell::new(3, 4)));
	}
	#[test]
	#[should_panic]
	fn snapshot_length_mismatch() {
		let (registry, category, ground, _marsh, _wall, _debris) = fixture();
		let mut grid = PathCostGrid::new(MapDimensions::new(10, 10));
		let rect = CellRect::new(Cell::new(0, 0), Cell::new(1, 1));
		grid.recompute_under_rect(&registry, category, &rect, &[ground], &[vec![]]);
	}
}
