//! Defines the Bevy [Plugin] wiring the change events to the pathing caches
//!

use crate::prelude::*;
use bevy::prelude::*;

pub mod change_layer;

pub struct RegionPathingPlugin;

impl Plugin for RegionPathingPlugin {
	#[cfg(not(tarpaulin_include))]
	fn build(&self, app: &mut App) {
		app.register_type::<Cell>()
			.register_type::<MapDimensions>()
			.register_type::<CellRect>()
			.register_type::<CategoryId>()
			.register_type::<ThingKindId>()
			.register_type::<TerrainId>()
			.register_type::<RegionId>()
			.register_type::<LinkId>()
			.register_type::<RoomId>()
			.add_event::<change_layer::EventCategoryActivated>()
			.add_event::<change_layer::EventCategoryDeactivated>()
			.add_event::<change_layer::EventThingSpawned>()
			.add_event::<change_layer::EventThingDespawned>()
			.add_event::<change_layer::EventThingOrientationChanged>()
			.add_event::<change_layer::EventTerrainChanged>()
			.add_event::<change_layer::EventRecalculateAllPathCosts>()
			.add_systems(
				Update,
				(
					change_layer::process_category_changes,
					change_layer::process_recalculations,
					change_layer::process_terrain_changes,
					change_layer::process_thing_changes,
					change_layer::process_orientation_changes,
				)
					.chain(),
			);
	}
}
