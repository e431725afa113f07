//! The region grid partitions the passable cells of a map into [Region]s for
//! one movement category and owns the arenas the regions and their links live
//! in.
//!
//! The partition is rebuilt lazily: invalidation only marks regions and
//! collects dirty cells, the flood fill that reassigns them runs when a
//! consumer next asks for a valid region. "No-rebuild" lookups read the
//! current partition without ever forcing that work.
//!
//! ```text
//!  _________________________
//! |A |A |A |x |B |B |B |B |B|
//! |A |A |A |x |B |B |B |B |B|
//! |A |A |A |x |x |x |B |B |B|
//! |A |A |A |A'|B |B |B |B |B|   A'- link between regions A and B
//! |A |A |A |x |B |B |B |B |B|
//! ```
//!

use std::collections::{HashMap, VecDeque};

use crate::prelude::*;

/// Partition of one map's cells into regions for one movement category, plus
/// the arenas owning the [Region] and [RegionLink] objects
pub struct RegionGrid {
	/// Bounds of the map the partition covers
	dimensions: MapDimensions,
	/// Region arena, freed slots are [None]
	regions: Vec<Option<Region>>,
	/// Reusable slots of the region arena
	free_regions: Vec<u32>,
	/// Link arena, freed slots are [None]
	links: Vec<Option<RegionLink>>,
	/// Reusable slots of the link arena
	free_links: Vec<u32>,
	/// Link deduplication table
	links_by_key: HashMap<LinkKey, LinkId>,
	/// Region handle of every cell, [None] for impassable cells
	cell_regions: Vec<Option<RegionId>>,
	/// Source of fresh room handles
	next_room: u32,
}

impl RegionGrid {
	/// Create a new instance of [RegionGrid] with no partition yet
	pub fn new(dimensions: MapDimensions) -> Self {
		RegionGrid {
			dimensions,
			regions: Vec::new(),
			free_regions: Vec::new(),
			links: Vec::new(),
			free_links: Vec::new(),
			links_by_key: HashMap::new(),
			cell_regions: vec![None; dimensions.cell_count()],
			next_room: 0,
		}
	}
	/// Bounds of the map the partition covers
	pub fn get_dimensions(&self) -> MapDimensions {
		self.dimensions
	}
	/// Resolve a region handle
	pub fn region(&self, id: RegionId) -> Option<&Region> {
		self.regions.get(id.index()).and_then(|slot| slot.as_ref())
	}
	/// Resolve a region handle mutably, test and crate-internal use only
	pub(crate) fn region_mut(&mut self, id: RegionId) -> Option<&mut Region> {
		self.regions
			.get_mut(id.index())
			.and_then(|slot| slot.as_mut())
	}
	/// Resolve a link handle
	pub fn link(&self, id: LinkId) -> Option<&RegionLink> {
		self.links.get(id.index()).and_then(|slot| slot.as_ref())
	}
	/// The region currently recorded at `cell`, whether valid or not, without
	/// forcing a rebuild
	pub fn region_at_no_rebuild_invalid_allowed(&self, cell: Cell) -> Option<RegionId> {
		if !self.dimensions.in_bounds(cell) {
			return None;
		}
		self.cell_regions[self.dimensions.cell_index(cell)]
	}
	/// The valid region at `cell` if the recorded one is still valid, without
	/// forcing a rebuild
	pub fn valid_region_at_no_rebuild(&self, cell: Cell) -> Option<RegionId> {
		self.region_at_no_rebuild_invalid_allowed(cell)
			.filter(|id| self.region(*id).map(|region| region.valid).unwrap_or(false))
	}
	/// Every region currently in the arena, invalid ones included
	pub fn all_regions_no_rebuild_invalid_allowed(&self) -> Vec<RegionId> {
		self.regions
			.iter()
			.enumerate()
			.filter(|(_, slot)| slot.is_some())
			.map(|(i, _)| RegionId::new(i as u32))
			.collect()
	}
	/// Number of valid regions in the partition
	pub fn valid_region_count(&self) -> usize {
		self.regions
			.iter()
			.flatten()
			.filter(|region| region.valid)
			.count()
	}
	/// Mark a region invalid and tear down its connectivity: clear its room,
	/// deregister and free every link along its boundary (removing it from
	/// the far endpoint as well) and drop its memoized weights. Returns the
	/// member cells so the caller can dirty them, or [None] when the region
	/// was already invalid.
	///
	/// The region is marked invalid before any link is touched so that a
	/// corruption failure part way through can never leave it marked valid
	pub(crate) fn invalidate_region(
		&mut self,
		id: RegionId,
	) -> Result<Option<Vec<Cell>>, RegionCorruption> {
		let region = self
			.regions
			.get_mut(id.index())
			.and_then(|slot| slot.as_mut())
			.ok_or(RegionCorruption::MissingRegion { region: id })?;
		if !region.valid {
			return Ok(None);
		}
		region.valid = false;
		region.room = None;
		region.weights.clear();
		let links = std::mem::take(&mut region.links);
		let cells = region.cells.clone();
		for link_id in links {
			let link = self
				.links
				.get_mut(link_id.index())
				.and_then(|slot| slot.as_mut())
				.ok_or(RegionCorruption::DanglingLink {
					region: id,
					link: link_id,
				})?;
			let target = link
				.other(id)
				.ok_or(RegionCorruption::UnregisteredEndpoint {
					region: id,
					link: link_id,
				})?;
			let key = link.key;
			link.deregister(id);
			self.links_by_key.remove(&key);
			if let LinkTarget::Region(other) = target {
				if let Some(other_region) = self
					.regions
					.get_mut(other.index())
					.and_then(|slot| slot.as_mut())
				{
					other_region.links.retain(|l| *l != link_id);
					other_region.weights.remove(&id);
				}
			}
			self.links[link_id.index()] = None;
			self.free_links.push(link_id.index() as u32);
		}
		Ok(Some(cells))
	}
	/// Reassign the partition under the drained dirty cells: impassable dirty
	/// cells lose their region assignment, passable dirty cells without a
	/// valid region seed flood fills that become fresh regions, links and
	/// weights are derived along the new boundaries, rooms are reassigned and
	/// the slots of invalidated regions are reclaimed
	pub fn rebuild(&mut self, cost: &PathCostGrid, dirty_cells: &[Cell]) {
		let mut cells: Vec<Cell> = dirty_cells
			.iter()
			.copied()
			.filter(|cell| self.dimensions.in_bounds(*cell))
			.collect();
		cells.sort_by_key(|cell| self.dimensions.cell_index(*cell));
		cells.dedup();
		for cell in cells.iter() {
			if !cost.is_passable(*cell) {
				let index = self.dimensions.cell_index(*cell);
				self.cell_regions[index] = None;
			}
		}
		let mut created = Vec::new();
		for cell in cells.iter() {
			if cost.is_passable(*cell) && self.valid_region_at_no_rebuild(*cell).is_none() {
				created.push(self.flood_fill_region(cost, *cell));
			}
		}
		for id in created {
			self.build_links_for(cost, id);
		}
		self.assign_rooms();
		self.reclaim_invalid_regions();
	}
	/// Grow a new region outwards from `seed` over every connected passable
	/// cell not already covered by a valid region
	fn flood_fill_region(&mut self, cost: &PathCostGrid, seed: Cell) -> RegionId {
		let id = self.alloc_region();
		let mut members = Vec::new();
		let mut queue = VecDeque::new();
		let seed_index = self.dimensions.cell_index(seed);
		self.cell_regions[seed_index] = Some(id);
		queue.push_back(seed);
		while let Some(cell) = queue.pop_front() {
			members.push(cell);
			for neighbour in cell.orthogonal_neighbours() {
				if !self.dimensions.in_bounds(neighbour) || !cost.is_passable(neighbour) {
					continue;
				}
				let index = self.dimensions.cell_index(neighbour);
				// stop at cells already claimed by this fill or by a
				// surviving valid region, the boundary becomes a link
				if self.cell_regions[index] == Some(id)
					|| self.valid_region_at_no_rebuild(neighbour).is_some()
				{
					continue;
				}
				self.cell_regions[index] = Some(id);
				queue.push_back(neighbour);
			}
		}
		self.regions[id.index()] = Some(Region::new(members));
		id
	}
	/// Walk the boundary of a freshly created region deriving deduplicated
	/// links to neighbouring regions and the map edge, with the cheapest
	/// adjoining cell pair as the link weight
	fn build_links_for(&mut self, cost: &PathCostGrid, id: RegionId) {
		let cells = match self.region(id) {
			Some(region) => region.cells.clone(),
			None => return,
		};
		for cell in cells {
			for (side, neighbour) in cell.orthogonal_neighbours().into_iter().enumerate() {
				if !self.dimensions.in_bounds(neighbour) {
					self.ensure_edge_link(id, side as u8, cost.get_cost(cell));
					continue;
				}
				if let Some(other) = self.valid_region_at_no_rebuild(neighbour) {
					if other != id {
						let weight = cost.get_cost(cell).saturating_add(cost.get_cost(neighbour));
						self.ensure_pair_link(id, other, weight);
					}
				}
			}
		}
	}
	/// Create or cheapen the link between a region and one side of the map
	fn ensure_edge_link(&mut self, id: RegionId, side: u8, weight: u32) {
		let key = LinkKey::Edge(id, side);
		if let Some(existing) = self.links_by_key.get(&key) {
			let link_id = *existing;
			if let Some(link) = self.links.get_mut(link_id.index()).and_then(|l| l.as_mut()) {
				link.weight = link.weight.min(weight);
			}
			return;
		}
		let link_id = self.alloc_link(RegionLink {
			endpoints: [Some(id), None],
			key,
			weight,
		});
		self.links_by_key.insert(key, link_id);
		if let Some(region) = self.region_mut(id) {
			region.links.push(link_id);
		}
	}
	/// Create or cheapen the link between two regions, mirroring the weight
	/// into both endpoints' memoized weight maps
	fn ensure_pair_link(&mut self, a: RegionId, b: RegionId, weight: u32) {
		let key = LinkKey::pair(a, b);
		if let Some(existing) = self.links_by_key.get(&key) {
			let link_id = *existing;
			if let Some(link) = self.links.get_mut(link_id.index()).and_then(|l| l.as_mut()) {
				if weight < link.weight {
					link.weight = weight;
				} else {
					return;
				}
			}
		} else {
			let link_id = self.alloc_link(RegionLink {
				endpoints: [Some(a), Some(b)],
				key,
				weight,
			});
			self.links_by_key.insert(key, link_id);
			if let Some(region) = self.region_mut(a) {
				region.links.push(link_id);
			}
			if let Some(region) = self.region_mut(b) {
				region.links.push(link_id);
			}
		}
		if let Some(region) = self.region_mut(a) {
			region.weights.insert(b, weight);
		}
		if let Some(region) = self.region_mut(b) {
			region.weights.insert(a, weight);
		}
	}
	/// Group valid regions into rooms by flooding the link graph, regions
	/// joined by any chain of links share a room
	fn assign_rooms(&mut self) {
		let ids = self.all_regions_no_rebuild_invalid_allowed();
		for id in ids.iter() {
			if let Some(region) = self.region_mut(*id) {
				if region.valid {
					region.room = None;
				}
			}
		}
		for id in ids {
			let needs_room = self
				.region(id)
				.map(|region| region.valid && region.room.is_none())
				.unwrap_or(false);
			if !needs_room {
				continue;
			}
			let room = RoomId(self.next_room);
			self.next_room += 1;
			let mut queue = VecDeque::new();
			queue.push_back(id);
			while let Some(current) = queue.pop_front() {
				let neighbours: Vec<RegionId> = match self.region_mut(current) {
					Some(region) if region.valid && region.room.is_none() => {
						region.room = Some(room);
						region.weights.keys().copied().collect()
					}
					_ => continue,
				};
				for neighbour in neighbours {
					queue.push_back(neighbour);
				}
			}
		}
	}
	/// Release the arena slots of invalidated regions, clearing any cell
	/// assignment still pointing at a freed slot so a recycled handle can
	/// never resolve stale cells to the wrong region
	fn reclaim_invalid_regions(&mut self) {
		for i in 0..self.regions.len() {
			let stale = self.regions[i]
				.as_ref()
				.map(|region| !region.valid)
				.unwrap_or(false);
			if !stale {
				continue;
			}
			if let Some(region) = self.regions[i].take() {
				let id = RegionId::new(i as u32);
				for cell in region.cells {
					let index = self.dimensions.cell_index(cell);
					if self.cell_regions[index] == Some(id) {
						self.cell_regions[index] = None;
					}
				}
				self.free_regions.push(i as u32);
			}
		}
	}
	/// Claim a region arena slot
	fn alloc_region(&mut self) -> RegionId {
		if let Some(slot) = self.free_regions.pop() {
			RegionId::new(slot)
		} else {
			self.regions.push(None);
			RegionId::new(self.regions.len() as u32 - 1)
		}
	}
	/// Claim a link arena slot
	fn alloc_link(&mut self, link: RegionLink) -> LinkId {
		if let Some(slot) = self.free_links.pop() {
			self.links[slot as usize] = Some(link);
			LinkId::new(slot)
		} else {
			self.links.push(Some(link));
			LinkId::new(self.links.len() as u32 - 1)
		}
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	/// Registry with a single category over uniform passable terrain
	fn fixture() -> (PathingRegistry, CategoryId, TerrainId) {
		let mut builder = PathingRegistryBuilder::new();
		let ground = builder.add_terrain(TerrainDef {
			name: "ground".to_string(),
			path_cost: 1,
			passable: true,
			tags: vec![],
		});
		let category = builder.add_category(CategoryDef::new("walker"));
		(builder.build(), category, ground)
	}
	/// Flat cost grid with every cell at cost `1`
	fn open_grid(dimensions: MapDimensions) -> PathCostGrid {
		PathCostGrid::new(dimensions)
	}
	/// Every cell of the map as a dirty list
	fn all_cells(dimensions: MapDimensions) -> Vec<Cell> {
		dimensions.all_cells().collect()
	}
	#[test]
	fn open_map_builds_one_region() {
		let dimensions = MapDimensions::new(10, 10);
		let cost = open_grid(dimensions);
		let mut grid = RegionGrid::new(dimensions);
		grid.rebuild(&cost, &all_cells(dimensions));
		assert_eq!(1, grid.valid_region_count());
		let id = grid.valid_region_at_no_rebuild(Cell::new(0, 0)).unwrap();
		let region = grid.region(id).unwrap();
		assert_eq!(100, region.get_cells().len());
		// boundary links on all four map edges
		assert_eq!(4, region.get_links().len());
		assert!(region.get_room().is_some());
	}
	#[test]
	fn wall_splits_partition_into_two_rooms() {
		//  _____________________
		// |__|__|__|__|x_|__|__|...
		// |__|__|__|__|x_|__|__|...
		// |__|__|__|__|x_|__|__|...
		let dimensions = MapDimensions::new(10, 10);
		let mut cost = open_grid(dimensions);
		for z in 0..10 {
			cost.set_cost(Cell::new(4, z), IMPASSABLE_COST);
		}
		let mut grid = RegionGrid::new(dimensions);
		grid.rebuild(&cost, &all_cells(dimensions));
		assert_eq!(2, grid.valid_region_count());
		let left = grid.valid_region_at_no_rebuild(Cell::new(0, 0)).unwrap();
		let right = grid.valid_region_at_no_rebuild(Cell::new(9, 9)).unwrap();
		assert_ne!(left, right);
		let left_room = grid.region(left).unwrap().get_room();
		let right_room = grid.region(right).unwrap().get_room();
		assert_ne!(left_room, right_room);
		// the wall cells belong to no region
		assert!(grid
			.region_at_no_rebuild_invalid_allowed(Cell::new(4, 5))
			.is_none());
	}
	#[test]
	fn gap_in_wall_keeps_one_region() {
		let dimensions = MapDimensions::new(10, 10);
		let mut cost = open_grid(dimensions);
		for z in 0..10 {
			if z != 5 {
				cost.set_cost(Cell::new(4, z), IMPASSABLE_COST);
			}
		}
		let mut grid = RegionGrid::new(dimensions);
		grid.rebuild(&cost, &all_cells(dimensions));
		assert_eq!(1, grid.valid_region_count());
	}
	#[test]
	fn invalidation_is_noop_when_already_invalid() {
		let dimensions = MapDimensions::new(10, 10);
		let cost = open_grid(dimensions);
		let mut grid = RegionGrid::new(dimensions);
		grid.rebuild(&cost, &all_cells(dimensions));
		let id = grid.valid_region_at_no_rebuild(Cell::new(0, 0)).unwrap();
		let first = grid.invalidate_region(id).unwrap();
		assert!(first.is_some());
		let second = grid.invalidate_region(id).unwrap();
		assert!(second.is_none());
		let region = grid.region(id).unwrap();
		assert!(!region.is_valid());
		assert!(region.get_links().is_empty());
		assert!(region.get_weights().is_empty());
		assert!(region.get_room().is_none());
	}
	#[test]
	fn seam_rebuild_links_new_region_to_survivor() {
		// build a walled map, punch a hole through the wall and only
		// invalidate the left side - the fill stops at the surviving right
		// region leaving a seam bridged by a link
		let dimensions = MapDimensions::new(10, 10);
		let mut cost = open_grid(dimensions);
		for z in 0..10 {
			cost.set_cost(Cell::new(4, z), IMPASSABLE_COST);
		}
		let mut grid = RegionGrid::new(dimensions);
		grid.rebuild(&cost, &all_cells(dimensions));
		let left = grid.valid_region_at_no_rebuild(Cell::new(0, 0)).unwrap();
		let right = grid.valid_region_at_no_rebuild(Cell::new(9, 9)).unwrap();
		cost.set_cost(Cell::new(4, 5), 1);
		let mut dirty = grid.invalidate_region(left).unwrap().unwrap();
		dirty.push(Cell::new(4, 5));
		grid.rebuild(&cost, &dirty);
		assert_eq!(2, grid.valid_region_count());
		let rebuilt = grid.valid_region_at_no_rebuild(Cell::new(0, 0)).unwrap();
		assert_eq!(
			rebuilt,
			grid.valid_region_at_no_rebuild(Cell::new(4, 5)).unwrap()
		);
		// seam link mirrored into both endpoints with the cheapest pair cost
		let rebuilt_region = grid.region(rebuilt).unwrap();
		assert_eq!(Some(&2), rebuilt_region.get_weights().get(&right));
		let right_region = grid.region(right).unwrap();
		assert_eq!(Some(&2), right_region.get_weights().get(&rebuilt));
		// joined by a link means a shared room
		assert_eq!(rebuilt_region.get_room(), right_region.get_room());
	}
	#[test]
	fn invalid_slots_are_reclaimed_and_reused() {
		let dimensions = MapDimensions::new(4, 4);
		let cost = open_grid(dimensions);
		let mut grid = RegionGrid::new(dimensions);
		grid.rebuild(&cost, &all_cells(dimensions));
		let id = grid.valid_region_at_no_rebuild(Cell::new(0, 0)).unwrap();
		let dirty = grid.invalidate_region(id).unwrap().unwrap();
		grid.rebuild(&cost, &dirty);
		// the freed slot is reused for the replacement region
		assert_eq!(1, grid.all_regions_no_rebuild_invalid_allowed().len());
		assert_eq!(1, grid.valid_region_count());
	}
	#[test]
	fn recycled_slots_never_resolve_stale_cells() {
		// invalidate both halves of a walled map, throw the dirty cells away
		// and rebuild only the right half so its slot gets recycled - cells
		// of the never-rebuilt left half must not resolve to the reused slot
		let dimensions = MapDimensions::new(10, 10);
		let mut cost = PathCostGrid::new(dimensions);
		for z in 0..10 {
			cost.set_cost(Cell::new(4, z), IMPASSABLE_COST);
		}
		let mut grid = RegionGrid::new(dimensions);
		grid.rebuild(&cost, &all_cells(dimensions));
		let left = grid.valid_region_at_no_rebuild(Cell::new(0, 0)).unwrap();
		let right = grid.valid_region_at_no_rebuild(Cell::new(9, 9)).unwrap();
		grid.invalidate_region(left).unwrap();
		grid.invalidate_region(right).unwrap();
		let right_half: Vec<Cell> = dimensions
			.all_cells()
			.filter(|cell| cell.get_x() > 4)
			.collect();
		grid.rebuild(&cost, &right_half);
		assert_eq!(None, grid.valid_region_at_no_rebuild(Cell::new(0, 0)));
		assert_eq!(None, grid.region_at_no_rebuild_invalid_allowed(Cell::new(0, 0)));
		// recycle the slot a second time
		let rebuilt = grid.valid_region_at_no_rebuild(Cell::new(9, 9)).unwrap();
		grid.invalidate_region(rebuilt).unwrap();
		grid.rebuild(&cost, &right_half);
		assert_eq!(None, grid.valid_region_at_no_rebuild(Cell::new(0, 0)));
		assert!(grid.valid_region_at_no_rebuild(Cell::new(9, 9)).is_some());
	}
	#[test]
	fn dangling_link_surfaces_corruption() {
		let dimensions = MapDimensions::new(4, 4);
		let cost = open_grid(dimensions);
		let mut grid = RegionGrid::new(dimensions);
		grid.rebuild(&cost, &all_cells(dimensions));
		let id = grid.valid_region_at_no_rebuild(Cell::new(0, 0)).unwrap();
		grid.region_mut(id).unwrap().links.push(LinkId::new(999));
		let result = grid.invalidate_region(id);
		assert_eq!(
			Err(RegionCorruption::DanglingLink {
				region: id,
				link: LinkId::new(999),
			}),
			result
		);
		// the failed invalidation must not leave the region marked valid
		assert!(!grid.region(id).unwrap().is_valid());
	}
	#[test]
	fn fixture_costs_partition_consistently() {
		let (registry, category, ground) = fixture();
		let dimensions = MapDimensions::new(6, 6);
		let mut cost = PathCostGrid::new(dimensions);
		let rect = dimensions.whole_map();
		let terrains = vec![ground; rect.cell_count()];
		let thing_lists = vec![Vec::new(); rect.cell_count()];
		cost.recompute_under_rect(&registry, category, &rect, &terrains, &thing_lists);
		let mut grid = RegionGrid::new(dimensions);
		grid.rebuild(&cost, &all_cells(dimensions));
		assert_eq!(1, grid.valid_region_count());
	}
}
