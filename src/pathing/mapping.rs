//! Per-map orchestration of the pathing caches. A [PathingMap] owns mirror
//! grids of the terrain and objects on the map, a lazily created cache stack
//! per active movement category and an optional background worker that drains
//! grid work off the main schedule.
//!
//! Mutations follow a snapshot-then-process discipline: the mirrors are
//! updated first on the calling thread, the inputs a recomputation needs are
//! snapshotted into pooled buffers and only then is the grid work queued (or
//! run inline when no worker is available). Queued work never reads live map
//! state mid-mutation.
//!
//! Lock order is fixed to keep the stacks deadlock free: the category table
//! first, an individual category's mutex next, the mirror read locks last.
//! Mirror write locks are never held while another lock is taken.
//!

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use bevy::log::warn;
use bevy::prelude::*;

use crate::prelude::*;

/// Mirror of the terrain beneath every cell of a map
pub struct TerrainGrid {
	/// Bounds of the map the mirror covers
	dimensions: MapDimensions,
	/// Row-major terrain of every cell
	terrain: Vec<TerrainId>,
}

impl TerrainGrid {
	/// Create a new instance of [TerrainGrid] filled with `default` terrain
	pub fn new(dimensions: MapDimensions, default: TerrainId) -> Self {
		TerrainGrid {
			dimensions,
			terrain: vec![default; dimensions.cell_count()],
		}
	}
	/// Terrain beneath `cell`
	pub fn get(&self, cell: Cell) -> TerrainId {
		self.terrain[self.dimensions.cell_index(cell)]
	}
	/// Replace the terrain beneath `cell`, returning what was there
	pub fn set(&mut self, cell: Cell, terrain: TerrainId) -> TerrainId {
		let index = self.dimensions.cell_index(cell);
		std::mem::replace(&mut self.terrain[index], terrain)
	}
	/// Copy the terrain under `rect` into `out` in the rect's row order
	pub fn snapshot_under_rect(&self, rect: &CellRect, out: &mut Vec<TerrainId>) {
		out.clear();
		for cell in rect.iter() {
			out.push(self.get(cell));
		}
	}
}

/// Mirror of the object kinds occupying every cell of a map
pub struct ThingGrid {
	/// Bounds of the map the mirror covers
	dimensions: MapDimensions,
	/// Row-major occupant kinds of every cell
	things: Vec<Vec<ThingKindId>>,
}

impl ThingGrid {
	/// Create a new instance of [ThingGrid] with every cell empty
	pub fn new(dimensions: MapDimensions) -> Self {
		ThingGrid {
			dimensions,
			things: vec![Vec::new(); dimensions.cell_count()],
		}
	}
	/// Kinds occupying `cell`
	pub fn things_at(&self, cell: Cell) -> &[ThingKindId] {
		&self.things[self.dimensions.cell_index(cell)]
	}
	/// Record `kind` over every cell of `rect`
	pub fn insert_under_rect(&mut self, rect: &CellRect, kind: ThingKindId) {
		for cell in rect.iter() {
			let index = self.dimensions.cell_index(cell);
			self.things[index].push(kind);
		}
	}
	/// Remove one occurrence of `kind` from every cell of `rect`, overlapping
	/// objects of the same kind keep their remaining entries
	pub fn remove_under_rect(&mut self, rect: &CellRect, kind: ThingKindId) {
		for cell in rect.iter() {
			let index = self.dimensions.cell_index(cell);
			if let Some(position) = self.things[index].iter().position(|k| *k == kind) {
				self.things[index].remove(position);
			}
		}
	}
	/// Copy the occupant lists under `rect` into `out` in the rect's row order
	pub fn snapshot_under_rect(&self, rect: &CellRect, out: &mut Vec<Vec<ThingKindId>>) {
		out.clear();
		for cell in rect.iter() {
			out.push(self.things_at(cell).to_vec());
		}
	}
}

/// The full cache stack of one movement category on one map: path costs,
/// region partition, dirty tracking and memoized reachability
pub struct CategoryPathing {
	/// The movement category the stack serves
	category: CategoryId,
	/// Traversal cost of every cell
	cost_grid: PathCostGrid,
	/// Partition of the passable cells into regions
	region_grid: RegionGrid,
	/// Dirty tracking and region invalidation
	dirtyer: RegionDirtyer,
	/// Memoized reachability answers
	reachability: ReachabilityCache,
}

impl CategoryPathing {
	/// Create a new instance of [CategoryPathing] with costs derived from the
	/// current mirrors and the whole map dirty
	pub fn new(
		registry: &PathingRegistry,
		category: CategoryId,
		terrain: &TerrainGrid,
		things: &ThingGrid,
	) -> Self {
		let dimensions = terrain.dimensions;
		let mut cost_grid = PathCostGrid::new(dimensions);
		for cell in dimensions.all_cells() {
			cost_grid.recompute_cost_at(registry, category, cell, terrain.get(cell), things.things_at(cell));
		}
		let mut dirtyer = RegionDirtyer::new(registry.category(category).size_padding);
		let mut region_grid = RegionGrid::new(dimensions);
		// fresh grid has no regions to invalidate, the blanket dirty cannot
		// hit corruption
		let _ = dirtyer.set_all_dirty(&mut region_grid);
		CategoryPathing {
			category,
			cost_grid,
			region_grid,
			dirtyer,
			reachability: ReachabilityCache::new(),
		}
	}
	/// The movement category the stack serves
	pub fn get_category(&self) -> CategoryId {
		self.category
	}
	/// Traversal cost of `cell`
	pub fn cost_at(&self, cell: Cell) -> u32 {
		self.cost_grid.get_cost(cell)
	}
	/// Whether `cell` can be traversed at all
	pub fn is_passable(&self, cell: Cell) -> bool {
		self.cost_grid.is_passable(cell)
	}
	/// Whether any cell is waiting for a partition rebuild
	pub fn any_dirty(&self) -> bool {
		self.dirtyer.any_dirty()
	}
	/// Recompute the costs under `rect` from pre-snapshotted inputs
	pub fn recompute_under_rect(
		&mut self,
		registry: &PathingRegistry,
		rect: &CellRect,
		terrains: &[TerrainId],
		thing_lists: &[Vec<ThingKindId>],
	) {
		self.cost_grid
			.recompute_under_rect(registry, self.category, rect, terrains, thing_lists);
	}
	/// React to an object placed over `rect`, costs must already be
	/// recomputed so the invalidation sees the new passability
	pub fn notify_spawned(&mut self, rect: &CellRect) -> Result<(), RegionCorruption> {
		self.dirtyer.notify_thing_spawned(&mut self.region_grid, rect)
	}
	/// React to an object removed from `rect`, costs must already be
	/// recomputed
	pub fn notify_despawned(&mut self, rect: &CellRect) -> Result<(), RegionCorruption> {
		self.dirtyer.notify_thing_despawned(&mut self.region_grid, rect)
	}
	/// Recompute the cost of a single cell from pre-snapshotted inputs
	/// without touching region state, used for stacks without an active owner
	pub fn recompute_cost_at(
		&mut self,
		registry: &PathingRegistry,
		cell: Cell,
		terrain: TerrainId,
		things: &[ThingKindId],
	) {
		self.cost_grid
			.recompute_cost_at(registry, self.category, cell, terrain, things);
	}
	/// Number of memoized reachability answers held by the stack
	pub fn memoized_reachability(&self) -> usize {
		self.reachability.len()
	}
	/// Recompute the cost of a single cell from pre-snapshotted inputs and
	/// dirty the neighbourhood if its passability flipped
	pub fn apply_terrain_change(
		&mut self,
		registry: &PathingRegistry,
		cell: Cell,
		terrain: TerrainId,
		things: &[ThingKindId],
	) -> Result<(), RegionCorruption> {
		let was_passable = self.cost_grid.is_passable(cell);
		self.cost_grid
			.recompute_cost_at(registry, self.category, cell, terrain, things);
		let now_passable = self.cost_grid.is_passable(cell);
		if was_passable != now_passable {
			self.dirtyer
				.notify_walkability_changed(&mut self.region_grid, cell, now_passable)?;
		}
		Ok(())
	}
	/// Mark the whole map dirty, every region gets rebuilt on next demand
	pub fn set_all_dirty(&mut self) -> Result<(), RegionCorruption> {
		self.reachability.clear_cache();
		self.dirtyer.set_all_dirty(&mut self.region_grid)
	}
	/// Drain the dirty set into a partition rebuild if anything is waiting,
	/// discarding memoized reachability built against the old partition
	pub fn rebuild_if_dirty(&mut self) {
		if self.dirtyer.any_dirty() {
			let dirty = self.dirtyer.drain_dirty();
			self.region_grid.rebuild(&self.cost_grid, &dirty);
			self.reachability.clear_cache();
		}
	}
	/// The valid region at `cell`, rebuilding the partition first if dirty
	pub fn valid_region_at(&mut self, cell: Cell) -> Option<RegionId> {
		self.rebuild_if_dirty();
		self.region_grid.valid_region_at_no_rebuild(cell)
	}
	/// The valid region at `cell` without forcing a rebuild
	pub fn valid_region_at_no_rebuild(&self, cell: Cell) -> Option<RegionId> {
		self.region_grid.valid_region_at_no_rebuild(cell)
	}
	/// Whether `from` can reach `to`, rebuilding the partition first if dirty
	pub fn can_reach(&mut self, from: Cell, to: Cell) -> bool {
		self.rebuild_if_dirty();
		self.reachability.can_reach(&self.region_grid, from, to)
	}
	/// Discard memoized reachability without touching the partition
	pub fn clear_reachability(&mut self) {
		self.reachability.clear_cache();
	}
	/// The partition the stack maintains
	pub fn get_region_grid(&self) -> &RegionGrid {
		&self.region_grid
	}
}

/// Shared state behind a [PathingMap] handle
pub struct MapPathingInner {
	/// Bounds of the map
	dimensions: MapDimensions,
	/// Immutable movement definitions
	registry: PathingRegistry,
	/// Generation counter expiring queued work when the map retires
	liveness: MapLiveness,
	/// Mirror of the terrain beneath every cell
	terrain: RwLock<TerrainGrid>,
	/// Mirror of the objects occupying every cell
	things: RwLock<ThingGrid>,
	/// Cache stacks keyed by category, created lazily on activation
	categories: RwLock<HashMap<CategoryId, Arc<Mutex<CategoryPathing>>>>,
	/// Categories currently active on the map
	owners: RwLock<Vec<CategoryId>>,
	/// Background thread for grid work, [None] runs everything inline
	worker: Option<DedicatedWorker>,
	/// Reusable terrain snapshot buffers
	terrain_pool: ScratchPool<Vec<TerrainId>>,
	/// Reusable occupant snapshot buffers
	things_pool: ScratchPool<Vec<Vec<ThingKindId>>>,
}

/// Handle to the pathing caches of one map. Cloning shares the underlying
/// state, attach one to the map entity and clone it into systems freely.
/// Removing the component retires the map so queued background work for it is
/// discarded instead of run
#[derive(Component, Clone)]
#[component(on_remove = retire_on_remove)]
pub struct PathingMap(Arc<MapPathingInner>);

/// Component hook expiring queued work when the map entity loses its caches
fn retire_on_remove(
	world: bevy::ecs::world::DeferredWorld,
	context: bevy::ecs::component::HookContext,
) {
	if let Some(map) = world.get::<PathingMap>(context.entity) {
		map.retire();
	}
}

impl PathingMap {
	/// Create a new instance of [PathingMap] over a map of `dimensions` whose
	/// every cell starts as `default_terrain`. With `with_worker` the grid
	/// work of change notifications runs on a dedicated background thread
	pub fn new(
		dimensions: MapDimensions,
		registry: PathingRegistry,
		default_terrain: TerrainId,
		with_worker: bool,
	) -> Self {
		let worker = with_worker.then(|| DedicatedWorker::new("region-pathing"));
		PathingMap(Arc::new(MapPathingInner {
			dimensions,
			registry,
			liveness: MapLiveness::new(),
			terrain: RwLock::new(TerrainGrid::new(dimensions, default_terrain)),
			things: RwLock::new(ThingGrid::new(dimensions)),
			categories: RwLock::new(HashMap::new()),
			owners: RwLock::new(Vec::new()),
			worker,
			terrain_pool: ScratchPool::new(),
			things_pool: ScratchPool::new(),
		}))
	}
	/// Bounds of the map
	pub fn get_dimensions(&self) -> MapDimensions {
		self.0.dimensions
	}
	/// The movement definitions the map was built against
	pub fn get_registry(&self) -> &PathingRegistry {
		&self.0.registry
	}
	/// Whether the background worker is running. False for inline maps and
	/// for maps whose worker died, either way work runs inline
	pub fn thread_available(&self) -> bool {
		self.0
			.worker
			.as_ref()
			.map(|worker| worker.thread_available())
			.unwrap_or(false)
	}
	/// A token that stays live until the map retires
	pub fn liveness_token(&self) -> LivenessToken {
		self.0.liveness.token()
	}
	/// Expire all queued work for this map, called when the map despawns
	pub fn retire(&self) {
		self.0.liveness.retire();
	}
	/// Run `work` on the background worker, falling back to inline execution
	/// when the worker is unavailable. Work for a retired map is dropped
	pub fn queue(&self, work: impl FnOnce() + Send + 'static) {
		let action = QueuedAction::new(self.liveness_token(), work);
		match &self.0.worker {
			Some(worker) => {
				if let Err(action) = worker.queue(action) {
					if action.is_live() {
						action.run();
					}
				}
			}
			None => {
				if action.is_live() {
					action.run();
				}
			}
		}
	}
	/// Categories currently active on the map
	pub fn owners(&self) -> Vec<CategoryId> {
		self.0
			.owners
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}
	/// Whether `category` is active on the map
	pub fn is_owner(&self, category: CategoryId) -> bool {
		self.0
			.owners
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.contains(&category)
	}
	/// Activate a movement category on the map: its cache stack is created on
	/// first activation and the whole map is marked dirty so the partition is
	/// rebuilt from current state on next demand
	pub fn activate_category(&self, category: CategoryId) -> Result<(), RegionCorruption> {
		if self.0.registry.category(category).movement_permissions == MovementPermissions::NotAllowed
		{
			warn!(
				"Category `{}` does not permit movement, activation ignored",
				self.0.registry.category(category).name
			);
			return Ok(());
		}
		{
			let mut owners = self.0.owners.write().unwrap_or_else(PoisonError::into_inner);
			if owners.contains(&category) {
				return Ok(());
			}
			owners.push(category);
		}
		let stack = self.category_pathing(category);
		let mut pathing = stack.lock().unwrap_or_else(PoisonError::into_inner);
		self.recompute_whole_map(&mut pathing);
		pathing.set_all_dirty()
	}
	/// Deactivate a movement category. Its stack stays in place so a later
	/// reactivation reuses the allocation, but no change notifications reach
	/// it while inactive
	pub fn deactivate_category(&self, category: CategoryId) {
		self.0
			.owners
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.retain(|c| *c != category);
	}
	/// The cache stack of `category`, created from the current mirrors if it
	/// does not exist yet
	pub fn category_pathing(&self, category: CategoryId) -> Arc<Mutex<CategoryPathing>> {
		{
			let categories = self
				.0
				.categories
				.read()
				.unwrap_or_else(PoisonError::into_inner);
			if let Some(stack) = categories.get(&category) {
				return Arc::clone(stack);
			}
		}
		let mut categories = self
			.0
			.categories
			.write()
			.unwrap_or_else(PoisonError::into_inner);
		// a racing creator may have beaten the write lock
		if let Some(stack) = categories.get(&category) {
			return Arc::clone(stack);
		}
		let terrain = self.0.terrain.read().unwrap_or_else(PoisonError::into_inner);
		let things = self.0.things.read().unwrap_or_else(PoisonError::into_inner);
		let stack = Arc::new(Mutex::new(CategoryPathing::new(
			&self.0.registry,
			category,
			&terrain,
			&things,
		)));
		categories.insert(category, Arc::clone(&stack));
		stack
	}
	/// React to an object of `kind` placed over `rect`. The occupant mirror
	/// is updated immediately, cost recomputation and region invalidation run
	/// per active category on the worker
	pub fn thing_spawned(&self, kind: ThingKindId, rect: CellRect) {
		// an unregistered kind affects no category
		if self.0.registry.thing_kind(kind).is_none() {
			return;
		}
		let rect = rect.clip_inside(&self.0.dimensions);
		self.0
			.things
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.insert_under_rect(&rect, kind);
		self.dispatch_footprint_change(kind, rect, false);
	}
	/// React to an object of `kind` removed from `rect`. The occupant mirror
	/// is updated before the snapshot so queued work sees the object gone
	pub fn thing_despawned(&self, kind: ThingKindId, rect: CellRect) {
		// an unregistered kind affects no category
		if self.0.registry.thing_kind(kind).is_none() {
			return;
		}
		let rect = rect.clip_inside(&self.0.dimensions);
		self.0
			.things
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.remove_under_rect(&rect, kind);
		self.dispatch_footprint_change(kind, rect, true);
	}
	/// React to an object of `kind` rotating in place. Costs and regions are
	/// untouched but memoized reachability built around the old footprint is
	/// discarded for every category the kind affects
	pub fn thing_orientation_changed(&self, kind: ThingKindId) {
		let affected = self.0.registry.region_effecters(kind);
		for category in self.owners() {
			if !affected.contains(&category) {
				continue;
			}
			let stack = self.category_pathing(category);
			stack
				.lock()
				.unwrap_or_else(PoisonError::into_inner)
				.clear_reachability();
		}
	}
	/// React to the terrain beneath `cell` changing. The terrain mirror is
	/// updated immediately, each active category recomputes the cell's cost
	/// and dirties the neighbourhood if its passability flipped
	pub fn terrain_changed(&self, cell: Cell, terrain: TerrainId) {
		if !self.0.dimensions.in_bounds(cell) {
			return;
		}
		// an unregistered terrain affects no category
		if self.0.registry.terrain(terrain).is_none() {
			return;
		}
		self.0
			.terrain
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.set(cell, terrain);
		let things_snapshot = self
			.0
			.things
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.things_at(cell)
			.to_vec();
		for category in self.stack_categories() {
			let owned = self.is_owner(category);
			let stack = self.category_pathing(category);
			let registry = self.0.registry.clone();
			let things = things_snapshot.clone();
			self.queue(move || {
				let mut pathing = stack.lock().unwrap_or_else(PoisonError::into_inner);
				let result = if owned {
					pathing.apply_terrain_change(&registry, cell, terrain, &things)
				} else {
					pathing.recompute_cost_at(&registry, cell, terrain, &things);
					Ok(())
				};
				if let Err(err) = result {
					panic!("Terrain change at ({}, {}) hit corrupt regions: {}", cell.get_x(), cell.get_z(), err);
				}
			});
		}
	}
	/// Recompute every cell's cost for every active category and mark their
	/// whole partitions dirty, used after bulk changes that bypass the
	/// per-change notifications
	pub fn recalculate_all_path_costs(&self) {
		let rect = self.0.dimensions.whole_map();
		for category in self.stack_categories() {
			let owned = self.is_owner(category);
			let (terrains, thing_lists) = self.snapshot_under(&rect);
			let stack = self.category_pathing(category);
			let registry = self.0.registry.clone();
			let terrain_pool = self.0.terrain_pool.clone();
			let things_pool = self.0.things_pool.clone();
			self.queue(move || {
				let mut pathing = stack.lock().unwrap_or_else(PoisonError::into_inner);
				pathing.recompute_under_rect(&registry, &rect, &terrains, &thing_lists);
				return_buffers(&terrain_pool, &things_pool, terrains, thing_lists);
				if !owned {
					return;
				}
				if let Err(err) = pathing.set_all_dirty() {
					panic!("Full path cost recalculation hit corrupt regions: {}", err);
				}
			});
		}
	}
	/// Traversal cost of `cell` for `category`, [None] when the category has
	/// no stack yet
	pub fn cost_at(&self, category: CategoryId, cell: Cell) -> Option<u32> {
		let stack = self.existing_stack(category)?;
		let pathing = stack.lock().unwrap_or_else(PoisonError::into_inner);
		Some(pathing.cost_at(cell))
	}
	/// Whether `from` can reach `to` for `category`, rebuilding the partition
	/// first if dirty. An inactive category with no stack reaches nothing
	pub fn can_reach(&self, category: CategoryId, from: Cell, to: Cell) -> bool {
		match self.existing_stack(category) {
			Some(stack) => stack
				.lock()
				.unwrap_or_else(PoisonError::into_inner)
				.can_reach(from, to),
			None => false,
		}
	}
	/// The valid region at `cell` for `category`, rebuilding the partition
	/// first if dirty
	pub fn valid_region_at(&self, category: CategoryId, cell: Cell) -> Option<RegionId> {
		let stack = self.existing_stack(category)?;
		let mut pathing = stack.lock().unwrap_or_else(PoisonError::into_inner);
		pathing.valid_region_at(cell)
	}
	/// The valid region at `cell` for `category` without forcing a rebuild
	pub fn valid_region_at_no_rebuild(&self, category: CategoryId, cell: Cell) -> Option<RegionId> {
		let stack = self.existing_stack(category)?;
		let pathing = stack.lock().unwrap_or_else(PoisonError::into_inner);
		pathing.valid_region_at_no_rebuild(cell)
	}
	/// Whether `category` has cells waiting for a partition rebuild
	pub fn any_dirty(&self, category: CategoryId) -> bool {
		match self.existing_stack(category) {
			Some(stack) => stack
				.lock()
				.unwrap_or_else(PoisonError::into_inner)
				.any_dirty(),
			None => false,
		}
	}
	/// Every category that has a cache stack, active or not. Inactive stacks
	/// keep receiving cost updates, only region maintenance stops
	fn stack_categories(&self) -> Vec<CategoryId> {
		self.0
			.categories
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.keys()
			.copied()
			.collect()
	}
	/// The stack of `category` if one has been created
	fn existing_stack(&self, category: CategoryId) -> Option<Arc<Mutex<CategoryPathing>>> {
		self.0
			.categories
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(&category)
			.cloned()
	}
	/// Queue cost recomputation and region invalidation for every active
	/// category an object footprint change affects
	fn dispatch_footprint_change(&self, kind: ThingKindId, rect: CellRect, despawned: bool) {
		let effecters = self.0.registry.region_effecters(kind);
		// every category with a stack keeps its costs fresh, region
		// maintenance is reserved for active owners
		for category in self.stack_categories() {
			let dirties_regions = self.is_owner(category) && effecters.contains(&category);
			let (terrains, thing_lists) = self.snapshot_under(&rect);
			let stack = self.category_pathing(category);
			let registry = self.0.registry.clone();
			let terrain_pool = self.0.terrain_pool.clone();
			let things_pool = self.0.things_pool.clone();
			self.queue(move || {
				let mut pathing = stack.lock().unwrap_or_else(PoisonError::into_inner);
				pathing.recompute_under_rect(&registry, &rect, &terrains, &thing_lists);
				return_buffers(&terrain_pool, &things_pool, terrains, thing_lists);
				if !dirties_regions {
					return;
				}
				let result = if despawned {
					pathing.notify_despawned(&rect)
				} else {
					pathing.notify_spawned(&rect)
				};
				if let Err(err) = result {
					panic!("Footprint change over ({}, {})..({}, {}) hit corrupt regions: {}",
						rect.get_min().get_x(), rect.get_min().get_z(),
						rect.get_max().get_x(), rect.get_max().get_z(), err);
				}
			});
		}
	}
	/// Snapshot the terrain and occupants under `rect` into pooled buffers
	fn snapshot_under(&self, rect: &CellRect) -> (Vec<TerrainId>, Vec<Vec<ThingKindId>>) {
		let mut terrains = self.0.terrain_pool.get();
		let mut thing_lists = self.0.things_pool.get();
		self.0
			.terrain
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.snapshot_under_rect(rect, &mut terrains);
		self.0
			.things
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.snapshot_under_rect(rect, &mut thing_lists);
		(terrains, thing_lists)
	}
	/// Recompute every cell's cost for one stack from the current mirrors
	fn recompute_whole_map(&self, pathing: &mut CategoryPathing) {
		let rect = self.0.dimensions.whole_map();
		let (terrains, thing_lists) = self.snapshot_under(&rect);
		pathing.recompute_under_rect(&self.0.registry, &rect, &terrains, &thing_lists);
		return_buffers(&self.0.terrain_pool, &self.0.things_pool, terrains, thing_lists);
	}
}

/// Clear snapshot buffers and hand them back to their pools
fn return_buffers(
	terrain_pool: &ScratchPool<Vec<TerrainId>>,
	things_pool: &ScratchPool<Vec<Vec<ThingKindId>>>,
	mut terrains: Vec<TerrainId>,
	mut thing_lists: Vec<Vec<ThingKindId>>,
) {
	terrains.clear();
	thing_lists.clear();
	terrain_pool.put(terrains);
	things_pool.put(thing_lists);
}
