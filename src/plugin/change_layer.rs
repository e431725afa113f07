//! Events announcing world changes and the systems dispatching them onto the
//! pathing caches of the addressed map. Senders fire one event per change and
//! the dispatcher resolves which categories care, snapshots the inputs and
//! hands the grid work to the map's background worker.
//!

use crate::prelude::*;
use bevy::prelude::*;

/// An object has been placed over a footprint of cells
#[derive(Event)]
pub struct EventThingSpawned {
	/// Map entity carrying the [PathingMap] caches
	map: Entity,
	/// Kind of the placed object
	kind: ThingKindId,
	/// Footprint of the placed object
	rect: CellRect,
}

impl EventThingSpawned {
	/// Create a new instance of [EventThingSpawned]
	#[cfg(not(tarpaulin_include))]
	pub fn new(map: Entity, kind: ThingKindId, rect: CellRect) -> Self {
		EventThingSpawned { map, kind, rect }
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_map(&self) -> Entity {
		self.map
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_kind(&self) -> ThingKindId {
		self.kind
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_rect(&self) -> CellRect {
		self.rect
	}
}

/// An object has been removed from a footprint of cells
#[derive(Event)]
pub struct EventThingDespawned {
	/// Map entity carrying the [PathingMap] caches
	map: Entity,
	/// Kind of the removed object
	kind: ThingKindId,
	/// Footprint the object occupied
	rect: CellRect,
}

impl EventThingDespawned {
	/// Create a new instance of [EventThingDespawned]
	#[cfg(not(tarpaulin_include))]
	pub fn new(map: Entity, kind: ThingKindId, rect: CellRect) -> Self {
		EventThingDespawned { map, kind, rect }
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_map(&self) -> Entity {
		self.map
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_kind(&self) -> ThingKindId {
		self.kind
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_rect(&self) -> CellRect {
		self.rect
	}
}

/// An object has rotated in place, its footprint cells are unchanged but
/// reachability memoized around it may be stale
#[derive(Event)]
pub struct EventThingOrientationChanged {
	/// Map entity carrying the [PathingMap] caches
	map: Entity,
	/// Kind of the rotated object
	kind: ThingKindId,
}

impl EventThingOrientationChanged {
	/// Create a new instance of [EventThingOrientationChanged]
	#[cfg(not(tarpaulin_include))]
	pub fn new(map: Entity, kind: ThingKindId) -> Self {
		EventThingOrientationChanged { map, kind }
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_map(&self) -> Entity {
		self.map
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_kind(&self) -> ThingKindId {
		self.kind
	}
}

/// The terrain beneath a cell has changed
#[derive(Event)]
pub struct EventTerrainChanged {
	/// Map entity carrying the [PathingMap] caches
	map: Entity,
	/// Cell whose terrain changed
	cell: Cell,
	/// The terrain now beneath the cell
	terrain: TerrainId,
}

impl EventTerrainChanged {
	/// Create a new instance of [EventTerrainChanged]
	#[cfg(not(tarpaulin_include))]
	pub fn new(map: Entity, cell: Cell, terrain: TerrainId) -> Self {
		EventTerrainChanged { map, cell, terrain }
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_map(&self) -> Entity {
		self.map
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_cell(&self) -> Cell {
		self.cell
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_terrain(&self) -> TerrainId {
		self.terrain
	}
}

/// Recompute every cell's cost for every active category of a map, used after
/// bulk changes that bypass the per-change events
#[derive(Event)]
pub struct EventRecalculateAllPathCosts {
	/// Map entity carrying the [PathingMap] caches
	map: Entity,
}

impl EventRecalculateAllPathCosts {
	/// Create a new instance of [EventRecalculateAllPathCosts]
	#[cfg(not(tarpaulin_include))]
	pub fn new(map: Entity) -> Self {
		EventRecalculateAllPathCosts { map }
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_map(&self) -> Entity {
		self.map
	}
}

/// Activate a movement category on a map, building its cache stack on first
/// use
#[derive(Event)]
pub struct EventCategoryActivated {
	/// Map entity carrying the [PathingMap] caches
	map: Entity,
	/// Category to activate
	category: CategoryId,
}

impl EventCategoryActivated {
	/// Create a new instance of [EventCategoryActivated]
	#[cfg(not(tarpaulin_include))]
	pub fn new(map: Entity, category: CategoryId) -> Self {
		EventCategoryActivated { map, category }
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_map(&self) -> Entity {
		self.map
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_category(&self) -> CategoryId {
		self.category
	}
}

/// Deactivate a movement category on a map, change notifications stop
/// reaching its caches
#[derive(Event)]
pub struct EventCategoryDeactivated {
	/// Map entity carrying the [PathingMap] caches
	map: Entity,
	/// Category to deactivate
	category: CategoryId,
}

impl EventCategoryDeactivated {
	/// Create a new instance of [EventCategoryDeactivated]
	#[cfg(not(tarpaulin_include))]
	pub fn new(map: Entity, category: CategoryId) -> Self {
		EventCategoryDeactivated { map, category }
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_map(&self) -> Entity {
		self.map
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_category(&self) -> CategoryId {
		self.category
	}
}

/// Read [EventCategoryActivated] and [EventCategoryDeactivated] and update
/// which categories own caches on each map
#[cfg(not(tarpaulin_include))]
pub fn process_category_changes(
	mut activations: EventReader<EventCategoryActivated>,
	mut deactivations: EventReader<EventCategoryDeactivated>,
	query: Query<&PathingMap>,
) -> Result {
	for event in activations.read() {
		if let Ok(map) = query.get(event.get_map()) {
			map.activate_category(event.get_category())?;
		} else {
			warn!("Category activation addressed {:?} which has no pathing caches", event.get_map());
		}
	}
	for event in deactivations.read() {
		if let Ok(map) = query.get(event.get_map()) {
			map.deactivate_category(event.get_category());
		}
	}
	Ok(())
}

/// Read [EventThingSpawned] and [EventThingDespawned] and dispatch the
/// footprint changes onto the addressed maps
#[cfg(not(tarpaulin_include))]
pub fn process_thing_changes(
	mut spawns: EventReader<EventThingSpawned>,
	mut despawns: EventReader<EventThingDespawned>,
	query: Query<&PathingMap>,
) {
	for event in spawns.read() {
		if let Ok(map) = query.get(event.get_map()) {
			map.thing_spawned(event.get_kind(), event.get_rect());
		} else {
			warn!("Spawn addressed {:?} which has no pathing caches", event.get_map());
		}
	}
	for event in despawns.read() {
		if let Ok(map) = query.get(event.get_map()) {
			map.thing_despawned(event.get_kind(), event.get_rect());
		} else {
			warn!("Despawn addressed {:?} which has no pathing caches", event.get_map());
		}
	}
}

/// Read [EventThingOrientationChanged] and discard the memoized reachability
/// of affected categories
#[cfg(not(tarpaulin_include))]
pub fn process_orientation_changes(
	mut events: EventReader<EventThingOrientationChanged>,
	query: Query<&PathingMap>,
) {
	for event in events.read() {
		if let Ok(map) = query.get(event.get_map()) {
			map.thing_orientation_changed(event.get_kind());
		}
	}
}

/// Read [EventTerrainChanged] and dispatch per-category cost recomputation of
/// the changed cells
#[cfg(not(tarpaulin_include))]
pub fn process_terrain_changes(
	mut events: EventReader<EventTerrainChanged>,
	query: Query<&PathingMap>,
) {
	for event in events.read() {
		if let Ok(map) = query.get(event.get_map()) {
			map.terrain_changed(event.get_cell(), event.get_terrain());
		} else {
			warn!("Terrain change addressed {:?} which has no pathing caches", event.get_map());
		}
	}
}

/// Read [EventRecalculateAllPathCosts] and rebuild every active category's
/// costs from the map mirrors
#[cfg(not(tarpaulin_include))]
pub fn process_recalculations(
	mut events: EventReader<EventRecalculateAllPathCosts>,
	query: Query<&PathingMap>,
) {
	for event in events.read() {
		if let Ok(map) = query.get(event.get_map()) {
			map.recalculate_all_path_costs();
		}
	}
}
