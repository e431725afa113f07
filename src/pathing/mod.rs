//! Incremental spatial-reachability caches layered over a shared grid map.
//!
//! A map is a grid of [Cell]s. For every movement [crate::prelude::CategoryId]
//! the map maintains a stack of caches: a path-cost grid, a partition of the
//! passable cells into regions, a dirty-tracker which invalidates regions when
//! the world changes and a memoized reachability cache. Categories are
//! isolated from one another - dirtying one category's regions never touches
//! another's.
//!
//! Cells are addressed by `(x, z)` with the origin in the top-left corner of
//! the map:
//!
//! ```text
//!  __________________________
//! |0,0|___|___|___|___|___|__|
//! |___|___|___|___|___|___|__|
//! |___|___|___|___|___|___|__|
//! |___|___|___|___|___|__|x,z|
//! ```
//!

pub mod cost_grid;
pub mod dirtyer;
pub mod mapping;
pub mod pool;
pub mod reachability;
pub mod region;
pub mod region_grid;
pub mod registry;
pub mod worker;

use bevy::prelude::*;

/// A single grid location of a map expressed as `(x, z)` coordinates
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct Cell((i32, i32));

impl Cell {
	/// Create a new instance of [Cell]
	pub fn new(x: i32, z: i32) -> Self {
		Cell((x, z))
	}
	/// Get the `(x, z)` tuple
	pub fn get(&self) -> (i32, i32) {
		self.0
	}
	/// Get the `x` coordinate
	pub fn get_x(&self) -> i32 {
		self.0 .0
	}
	/// Get the `z` coordinate
	pub fn get_z(&self) -> i32 {
		self.0 .1
	}
	/// The cell itself plus its 8 surrounding neighbours, unclipped. Callers
	/// filter the result against [MapDimensions::in_bounds]
	pub fn adjacent_cells_and_inside(&self) -> [Cell; 9] {
		let (x, z) = self.0;
		[
			Cell::new(x, z),
			Cell::new(x, z - 1),
			Cell::new(x + 1, z - 1),
			Cell::new(x + 1, z),
			Cell::new(x + 1, z + 1),
			Cell::new(x, z + 1),
			Cell::new(x - 1, z + 1),
			Cell::new(x - 1, z),
			Cell::new(x - 1, z - 1),
		]
	}
	/// The 4 orthogonal neighbours of the cell, unclipped
	pub fn orthogonal_neighbours(&self) -> [Cell; 4] {
		let (x, z) = self.0;
		[
			Cell::new(x, z - 1),
			Cell::new(x + 1, z),
			Cell::new(x, z + 1),
			Cell::new(x - 1, z),
		]
	}
}

/// The length `x` and depth `z` of a map measured in cells
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Component, Default, Clone, Copy, Debug, PartialEq, Eq, Reflect)]
pub struct MapDimensions(u32, u32);

impl MapDimensions {
	/// Create a new instance of [MapDimensions]
	pub fn new(length: u32, depth: u32) -> Self {
		if length == 0 || depth == 0 {
			panic!(
				"Map dimensions `({}, {})` are invalid, a map must be at least one cell in each axis",
				length, depth
			);
		}
		MapDimensions(length, depth)
	}
	/// Number of `x` cells
	pub fn get_length(&self) -> u32 {
		self.0
	}
	/// Number of `z` cells
	pub fn get_depth(&self) -> u32 {
		self.1
	}
	/// Total number of cells in the map
	pub fn cell_count(&self) -> usize {
		self.0 as usize * self.1 as usize
	}
	/// Whether `cell` sits within the map
	pub fn in_bounds(&self, cell: Cell) -> bool {
		cell.get_x() >= 0
			&& cell.get_z() >= 0
			&& (cell.get_x() as u32) < self.0
			&& (cell.get_z() as u32) < self.1
	}
	/// Row-major index of `cell` into a flat grid array
	pub fn cell_index(&self, cell: Cell) -> usize {
		if !self.in_bounds(cell) {
			panic!(
				"Cell ({}, {}) is out of bounds of map ({}, {})",
				cell.get_x(),
				cell.get_z(),
				self.0,
				self.1
			);
		}
		cell.get_z() as usize * self.0 as usize + cell.get_x() as usize
	}
	/// Iterate over every cell of the map in row order
	pub fn all_cells(&self) -> impl Iterator<Item = Cell> {
		let length = self.0 as i32;
		let depth = self.1 as i32;
		(0..depth).flat_map(move |z| (0..length).map(move |x| Cell::new(x, z)))
	}
	/// A [CellRect] spanning the whole map
	pub fn whole_map(&self) -> CellRect {
		CellRect::new(
			Cell::new(0, 0),
			Cell::new(self.0 as i32 - 1, self.1 as i32 - 1),
		)
	}
}

/// An inclusive rectangle of cells, typically the footprint of an object
/// placed on the map
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash, Reflect)]
pub struct CellRect {
	/// Top-left corner of the rectangle
	min: Cell,
	/// Bottom-right corner of the rectangle, inclusive
	max: Cell,
}

impl CellRect {
	/// Create a new instance of [CellRect] from inclusive corners
	pub fn new(min: Cell, max: Cell) -> Self {
		if min.get_x() > max.get_x() || min.get_z() > max.get_z() {
			panic!(
				"CellRect min ({}, {}) exceeds max ({}, {})",
				min.get_x(),
				min.get_z(),
				max.get_x(),
				max.get_z()
			);
		}
		CellRect { min, max }
	}
	/// A rectangle covering a single cell
	pub fn single_cell(cell: Cell) -> Self {
		CellRect {
			min: cell,
			max: cell,
		}
	}
	/// Top-left corner
	pub fn get_min(&self) -> Cell {
		self.min
	}
	/// Bottom-right corner, inclusive
	pub fn get_max(&self) -> Cell {
		self.max
	}
	/// Grow the rectangle by `margin` cells in every direction
	pub fn expanded_by(&self, margin: u32) -> CellRect {
		let margin = margin as i32;
		CellRect {
			min: Cell::new(self.min.get_x() - margin, self.min.get_z() - margin),
			max: Cell::new(self.max.get_x() + margin, self.max.get_z() + margin),
		}
	}
	/// Clamp the rectangle to the bounds of the map
	pub fn clip_inside(&self, dimensions: &MapDimensions) -> CellRect {
		let limit_x = dimensions.get_length() as i32 - 1;
		let limit_z = dimensions.get_depth() as i32 - 1;
		CellRect {
			min: Cell::new(
				self.min.get_x().clamp(0, limit_x),
				self.min.get_z().clamp(0, limit_z),
			),
			max: Cell::new(
				self.max.get_x().clamp(0, limit_x),
				self.max.get_z().clamp(0, limit_z),
			),
		}
	}
	/// Whether `cell` sits within the rectangle
	pub fn contains(&self, cell: Cell) -> bool {
		cell.get_x() >= self.min.get_x()
			&& cell.get_x() <= self.max.get_x()
			&& cell.get_z() >= self.min.get_z()
			&& cell.get_z() <= self.max.get_z()
	}
	/// Number of cells covered by the rectangle
	pub fn cell_count(&self) -> usize {
		let length = (self.max.get_x() - self.min.get_x() + 1) as usize;
		let depth = (self.max.get_z() - self.min.get_z() + 1) as usize;
		length * depth
	}
	/// Iterate over every cell of the rectangle in row order
	pub fn iter(&self) -> impl Iterator<Item = Cell> {
		let min = self.min;
		let max = self.max;
		(min.get_z()..=max.get_z())
			.flat_map(move |z| (min.get_x()..=max.get_x()).map(move |x| Cell::new(x, z)))
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn cell_adjacency_includes_self() {
		let cell = Cell::new(3, 3);
		let result = cell.adjacent_cells_and_inside();
		assert_eq!(9, result.len());
		assert!(result.contains(&cell));
	}
	#[test]
	fn cell_orthogonal_neighbours() {
		let cell = Cell::new(0, 0);
		let result = cell.orthogonal_neighbours();
		let actual = [
			Cell::new(0, -1),
			Cell::new(1, 0),
			Cell::new(0, 1),
			Cell::new(-1, 0),
		];
		assert_eq!(actual, result);
	}
	#[test]
	fn dimensions_bounds() {
		let dimensions = MapDimensions::new(10, 10);
		assert!(dimensions.in_bounds(Cell::new(0, 0)));
		assert!(dimensions.in_bounds(Cell::new(9, 9)));
		assert!(!dimensions.in_bounds(Cell::new(10, 9)));
		assert!(!dimensions.in_bounds(Cell::new(-1, 0)));
	}
	#[test]
	#[should_panic]
	fn invalid_dimensions() {
		MapDimensions::new(0, 4);
	}
	#[test]
	fn cell_indexing() {
		let dimensions = MapDimensions::new(10, 5);
		assert_eq!(0, dimensions.cell_index(Cell::new(0, 0)));
		assert_eq!(10, dimensions.cell_index(Cell::new(0, 1)));
		assert_eq!(49, dimensions.cell_index(Cell::new(9, 4)));
	}
	#[test]
	fn all_cells_count() {
		let dimensions = MapDimensions::new(4, 3);
		assert_eq!(12, dimensions.all_cells().count());
	}
	#[test]
	fn rect_expand_and_clip() {
		let dimensions = MapDimensions::new(10, 10);
		let rect = CellRect::new(Cell::new(0, 0), Cell::new(1, 1));
		let result = rect.expanded_by(2).clip_inside(&dimensions);
		let actual = CellRect::new(Cell::new(0, 0), Cell::new(3, 3));
		assert_eq!(actual, result);
	}
	#[test]
	fn rect_iteration_row_order() {
		let rect = CellRect::new(Cell::new(4, 4), Cell::new(5, 5));
		let result: Vec<Cell> = rect.iter().collect();
		let actual = vec![
			Cell::new(4, 4),
			Cell::new(5, 4),
			Cell::new(4, 5),
			Cell::new(5, 5),
		];
		assert_eq!(actual, result);
	}
	#[test]
	fn rect_contains() {
		let rect = CellRect::new(Cell::new(2, 2), Cell::new(4, 4));
		assert!(rect.contains(Cell::new(3, 2)));
		assert!(!rect.contains(Cell::new(5, 2)));
	}
	#[test]
	#[should_panic]
	fn invalid_rect() {
		CellRect::new(Cell::new(5, 5), Cell::new(4, 4));
	}
}
