//! Convenience bundle attaching the pathing caches of a map to an entity
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Everything a map entity needs for region pathing: its dimensions and the
/// shared cache handle the change dispatcher resolves events against
#[derive(Bundle)]
pub struct PathingMapBundle {
	/// Bounds of the map
	map_dimensions: MapDimensions,
	/// Shared handle to the map's pathing caches
	pathing_map: PathingMap,
}

impl PathingMapBundle {
	/// Create a new instance of [PathingMapBundle] over a `map_length` by
	/// `map_depth` map whose every cell starts as `default_terrain`. With
	/// `with_worker` change notifications run their grid work on a dedicated
	/// background thread, without it everything runs inline which keeps
	/// updates deterministic for tests and headless tools
	pub fn new(
		map_length: u32,
		map_depth: u32,
		registry: PathingRegistry,
		default_terrain: TerrainId,
		with_worker: bool,
	) -> Self {
		let map_dimensions = MapDimensions::new(map_length, map_depth);
		let pathing_map = PathingMap::new(map_dimensions, registry, default_terrain, with_worker);
		PathingMapBundle {
			map_dimensions,
			pathing_map,
		}
	}
}
