//! Definitions of movement categories, object kinds and terrain kinds plus the
//! immutable derived lookups the change dispatcher resolves events against.
//!
//! The derived lookups (which categories care about which object kind or
//! terrain kind) are built exactly once by [PathingRegistryBuilder] during an
//! initialisation phase and the resulting [PathingRegistry] is never mutated,
//! making it safe to hand copies to the per-map worker threads without any
//! synchronisation.
//!

use std::collections::HashMap;
use std::sync::Arc;

use bevy::prelude::*;

use crate::pathing::cost_grid::IMPASSABLE_COST;

/// Terrain carrying this tag is assigned a default traversal cost of `1` for
/// every category at registry build
pub const ALLOW_TERRAIN_TAG: &str = "PassableAll";
/// Terrain carrying this tag is assigned the impassable sentinel for every
/// category at registry build
pub const DISALLOW_TERRAIN_TAG: &str = "ImpassableAll";

/// Identity of a movement category. Categories have their own passability
/// rules and cost overrides and never share cached region state
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct CategoryId(u32);

impl CategoryId {
	/// Index into the registry's category table
	pub fn index(&self) -> usize {
		self.0 as usize
	}
}

/// Identity of an object kind that can occupy cells of a map
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct ThingKindId(u32);

impl ThingKindId {
	/// Index into the registry's object-kind table
	pub fn index(&self) -> usize {
		self.0 as usize
	}
}

/// Identity of a terrain kind
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct TerrainId(u32);

impl TerrainId {
	/// Index into the registry's terrain table
	pub fn index(&self) -> usize {
		self.0 as usize
	}
}

/// Whether a category is allowed to move at all. Region graphs are only
/// maintained for categories with movement permission
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub enum MovementPermissions {
	/// The category cannot move, only its cost grid is maintained
	NotAllowed,
	/// The category can move and may own region tracking on a map
	#[default]
	Allowed,
}

/// Definition of a terrain kind
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug)]
pub struct TerrainDef {
	/// Display name, used in logs only
	pub name: String,
	/// Base traversal cost for categories without an override
	pub path_cost: u32,
	/// Whether the terrain can be traversed at all by default
	pub passable: bool,
	/// Free-form tags matched against category tag-cost tables and the
	/// [ALLOW_TERRAIN_TAG]/[DISALLOW_TERRAIN_TAG] defaults
	pub tags: Vec<String>,
}

/// Definition of an object kind that can occupy cells
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug)]
pub struct ThingKindDef {
	/// Display name, used in logs only
	pub name: String,
	/// Traversal cost contributed to a cell occupied by this kind for
	/// categories without an override
	pub path_cost: u32,
	/// Marks the kind as passability-affecting for every category even
	/// without an explicit cost override
	pub affects_regions: bool,
}

/// Definition of a movement category
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug)]
pub struct CategoryDef {
	/// Display name, used in logs only
	pub name: String,
	/// Whether the category may move and so own region tracking
	pub movement_permissions: MovementPermissions,
	/// Treat terrain without an explicit override as impassable
	pub default_terrain_impassable: bool,
	/// Footprint padding of the category in cells, used as the despawn
	/// invalidation margin since a large mover can affect passability
	/// further away when a blocking object disappears
	pub size_padding: u32,
	/// Per object-kind traversal cost overrides
	pub custom_thing_costs: HashMap<ThingKindId, u32>,
	/// Per terrain-kind traversal cost overrides
	pub custom_terrain_costs: HashMap<TerrainId, u32>,
	/// Terrain costs keyed by tag, resolved into [Self::custom_terrain_costs]
	/// at registry build
	pub terrain_costs_by_tag: HashMap<String, u32>,
}

impl CategoryDef {
	/// Create a minimal category definition with the given `name`
	pub fn new(name: &str) -> Self {
		CategoryDef {
			name: name.to_string(),
			movement_permissions: MovementPermissions::Allowed,
			default_terrain_impassable: false,
			size_padding: 1,
			custom_thing_costs: HashMap::new(),
			custom_terrain_costs: HashMap::new(),
			terrain_costs_by_tag: HashMap::new(),
		}
	}
}

/// Raw definition tables collected during initialisation, consumed by
/// [PathingRegistryBuilder::build]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Default)]
pub struct PathingRegistryBuilder {
	/// Terrain definitions in id order
	terrains: Vec<TerrainDef>,
	/// Object-kind definitions in id order
	thing_kinds: Vec<ThingKindDef>,
	/// Category definitions in id order
	categories: Vec<CategoryDef>,
}

impl PathingRegistryBuilder {
	/// Create an empty builder
	pub fn new() -> Self {
		PathingRegistryBuilder::default()
	}
	/// Register a terrain definition and obtain its identity
	pub fn add_terrain(&mut self, def: TerrainDef) -> TerrainId {
		self.terrains.push(def);
		TerrainId(self.terrains.len() as u32 - 1)
	}
	/// Register an object-kind definition and obtain its identity
	pub fn add_thing_kind(&mut self, def: ThingKindDef) -> ThingKindId {
		self.thing_kinds.push(def);
		ThingKindId(self.thing_kinds.len() as u32 - 1)
	}
	/// Register a category definition and obtain its identity
	pub fn add_category(&mut self, def: CategoryDef) -> CategoryId {
		self.categories.push(def);
		CategoryId(self.categories.len() as u32 - 1)
	}
	/// Read a definition set from a `ron` file
	#[cfg(feature = "ron")]
	pub fn from_ron(path: String) -> Self {
		let file = std::fs::File::open(path).expect("Failed opening definitions file");
		let builder: PathingRegistryBuilder = match ron::de::from_reader(file) {
			Ok(builder) => builder,
			Err(e) => panic!("Failed deserializing definitions: {}", e),
		};
		builder
	}
	/// Resolve tag-based terrain costs and derive the effecter lookups,
	/// producing the immutable [PathingRegistry]
	pub fn build(mut self) -> PathingRegistry {
		self.apply_terrain_tag_defaults();
		self.resolve_tag_costs();
		let region_effecters = self.derive_region_effecters();
		let terrain_effecters = self.derive_terrain_effecters();
		let moveable_categories = self
			.categories
			.iter()
			.enumerate()
			.filter(|(_, def)| def.movement_permissions > MovementPermissions::NotAllowed)
			.map(|(i, _)| CategoryId(i as u32))
			.collect();
		PathingRegistry {
			data: Arc::new(RegistryData {
				terrains: self.terrains,
				thing_kinds: self.thing_kinds,
				categories: self.categories,
				region_effecters,
				terrain_effecters,
				moveable_categories,
			}),
		}
	}
	/// Seed per-category terrain costs for terrain carrying the
	/// [ALLOW_TERRAIN_TAG] or [DISALLOW_TERRAIN_TAG] tags
	fn apply_terrain_tag_defaults(&mut self) {
		for (i, terrain) in self.terrains.iter().enumerate() {
			let terrain_id = TerrainId(i as u32);
			if terrain.tags.iter().any(|tag| tag == ALLOW_TERRAIN_TAG) {
				for category in self.categories.iter_mut() {
					category.custom_terrain_costs.insert(terrain_id, 1);
				}
			} else if terrain.tags.iter().any(|tag| tag == DISALLOW_TERRAIN_TAG) {
				for category in self.categories.iter_mut() {
					category
						.custom_terrain_costs
						.insert(terrain_id, IMPASSABLE_COST);
				}
			}
		}
	}
	/// Resolve each category's tag-keyed terrain costs into concrete
	/// [TerrainId] overrides
	fn resolve_tag_costs(&mut self) {
		for category in self.categories.iter_mut() {
			for (tag, path_cost) in category.terrain_costs_by_tag.iter() {
				for (i, terrain) in self.terrains.iter().enumerate() {
					if terrain.tags.iter().any(|t| t == tag) {
						category
							.custom_terrain_costs
							.insert(TerrainId(i as u32), *path_cost);
					}
				}
			}
		}
	}
	/// For each object kind list the categories whose passability it affects:
	/// an explicit impassable-or-worse override, or the kind is flagged as
	/// region-affecting
	fn derive_region_effecters(&self) -> Vec<Vec<CategoryId>> {
		let mut effecters = Vec::with_capacity(self.thing_kinds.len());
		for (i, kind) in self.thing_kinds.iter().enumerate() {
			let kind_id = ThingKindId(i as u32);
			let mut affected = Vec::new();
			for (c, category) in self.categories.iter().enumerate() {
				if category.movement_permissions == MovementPermissions::NotAllowed {
					continue;
				}
				if let Some(value) = category.custom_thing_costs.get(&kind_id) {
					if *value >= IMPASSABLE_COST {
						affected.push(CategoryId(c as u32));
					}
				} else if kind.affects_regions {
					affected.push(CategoryId(c as u32));
				}
			}
			effecters.push(affected);
		}
		effecters
	}
	/// For each terrain kind list the categories for which it is impassable
	/// or overridden to be
	fn derive_terrain_effecters(&self) -> Vec<Vec<CategoryId>> {
		let mut effecters = Vec::with_capacity(self.terrains.len());
		for (i, terrain) in self.terrains.iter().enumerate() {
			let terrain_id = TerrainId(i as u32);
			let mut affected = Vec::new();
			for (c, category) in self.categories.iter().enumerate() {
				if let Some(value) = category.custom_terrain_costs.get(&terrain_id) {
					if *value >= IMPASSABLE_COST {
						affected.push(CategoryId(c as u32));
					}
				} else if !terrain.passable || category.default_terrain_impassable {
					affected.push(CategoryId(c as u32));
				}
			}
			effecters.push(affected);
		}
		effecters
	}
}

/// The built definition tables plus derived effecter lookups
struct RegistryData {
	/// Terrain definitions indexed by [TerrainId]
	terrains: Vec<TerrainDef>,
	/// Object-kind definitions indexed by [ThingKindId]
	thing_kinds: Vec<ThingKindDef>,
	/// Category definitions indexed by [CategoryId]
	categories: Vec<CategoryDef>,
	/// Per object kind, the categories whose regions it can affect
	region_effecters: Vec<Vec<CategoryId>>,
	/// Per terrain kind, the categories whose regions it can affect
	terrain_effecters: Vec<Vec<CategoryId>>,
	/// Categories with movement permission
	moveable_categories: Vec<CategoryId>,
}

/// Immutable registry of definitions and derived effecter lookups. Cheap to
/// clone, safe to share across threads
#[derive(Resource, Clone)]
pub struct PathingRegistry {
	/// Shared registry tables
	data: Arc<RegistryData>,
}

impl PathingRegistry {
	/// Get a category definition
	pub fn category(&self, id: CategoryId) -> &CategoryDef {
		&self.data.categories[id.index()]
	}
	/// Get a terrain definition, [None] for an id the registry never minted
	pub fn terrain(&self, id: TerrainId) -> Option<&TerrainDef> {
		self.data.terrains.get(id.index())
	}
	/// Get an object-kind definition, [None] for an id the registry never
	/// minted
	pub fn thing_kind(&self, id: ThingKindId) -> Option<&ThingKindDef> {
		self.data.thing_kinds.get(id.index())
	}
	/// Categories whose passability is sensitive to the object kind. An
	/// unregistered kind affects no category
	pub fn region_effecters(&self, kind: ThingKindId) -> &[CategoryId] {
		self.data
			.region_effecters
			.get(kind.index())
			.map(|list| list.as_slice())
			.unwrap_or(&[])
	}
	/// Categories whose passability is sensitive to the terrain kind. An
	/// unregistered terrain affects no category
	pub fn terrain_effecters(&self, terrain: TerrainId) -> &[CategoryId] {
		self.data
			.terrain_effecters
			.get(terrain.index())
			.map(|list| list.as_slice())
			.unwrap_or(&[])
	}
	/// Categories with movement permission
	pub fn moveable_categories(&self) -> &[CategoryId] {
		&self.data.moveable_categories
	}
	/// Whether region tracking should ever be created for the category
	pub fn should_create_regions(&self, id: CategoryId) -> bool {
		self.category(id).movement_permissions > MovementPermissions::NotAllowed
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	/// Two-category, two-terrain, two-kind fixture used across the module
	fn fixture() -> (
		PathingRegistry,
		CategoryId,
		CategoryId,
		TerrainId,
		TerrainId,
		ThingKindId,
		ThingKindId,
	) {
		let mut builder = PathingRegistryBuilder::new();
		let ground = builder.add_terrain(TerrainDef {
			name: "ground".to_string(),
			path_cost: 1,
			passable: true,
			tags: vec![],
		});
		let water = builder.add_terrain(TerrainDef {
			name: "water".to_string(),
			path_cost: 4,
			passable: false,
			tags: vec!["Wet".to_string()],
		});
		let wall = builder.add_thing_kind(ThingKindDef {
			name: "wall".to_string(),
			path_cost: IMPASSABLE_COST,
			affects_regions: true,
		});
		let rubble = builder.add_thing_kind(ThingKindDef {
			name: "rubble".to_string(),
			path_cost: 5,
			affects_regions: false,
		});
		let mut land_def = CategoryDef::new("land");
		land_def
			.custom_thing_costs
			.insert(rubble, IMPASSABLE_COST);
		let land = builder.add_category(land_def);
		let mut boat_def = CategoryDef::new("boat");
		boat_def.terrain_costs_by_tag.insert("Wet".to_string(), 1);
		boat_def.default_terrain_impassable = true;
		let boat = builder.add_category(boat_def);
		let registry = builder.build();
		(registry, land, boat, ground, water, wall, rubble)
	}
	#[test]
	fn tag_costs_resolved() {
		let (registry, _land, boat, _ground, water, _wall, _rubble) = fixture();
		assert_eq!(
			Some(&1),
			registry.category(boat).custom_terrain_costs.get(&water)
		);
	}
	#[test]
	fn region_effecters_from_flag_and_override() {
		let (registry, land, boat, _ground, _water, wall, rubble) = fixture();
		// wall affects both via its affects_regions flag
		assert_eq!(vec![land, boat], registry.region_effecters(wall));
		// rubble only blocks land which overrides it to impassable
		assert_eq!(vec![land], registry.region_effecters(rubble));
	}
	#[test]
	fn terrain_effecters_from_passability() {
		let (registry, land, boat, ground, water, _wall, _rubble) = fixture();
		// water is impassable by default which affects land, boat overrides it
		assert_eq!(vec![land], registry.terrain_effecters(water));
		// ground is passable but boat treats unknown terrain as impassable
		assert_eq!(vec![boat], registry.terrain_effecters(ground));
	}
	#[test]
	fn unregistered_kind_is_noop() {
		let (registry, ..) = fixture();
		assert!(registry.region_effecters(ThingKindId(99)).is_empty());
		assert!(registry.terrain_effecters(TerrainId(99)).is_empty());
		assert!(registry.thing_kind(ThingKindId(99)).is_none());
		assert!(registry.terrain(TerrainId(99)).is_none());
	}
	#[test]
	fn allow_tag_seeds_all_categories() {
		let mut builder = PathingRegistryBuilder::new();
		let road = builder.add_terrain(TerrainDef {
			name: "road".to_string(),
			path_cost: 9,
			passable: true,
			tags: vec![ALLOW_TERRAIN_TAG.to_string()],
		});
		let mut category_def = CategoryDef::new("land");
		category_def.default_terrain_impassable = true;
		let category = builder.add_category(category_def);
		let registry = builder.build();
		assert_eq!(
			Some(&1),
			registry.category(category).custom_terrain_costs.get(&road)
		);
		// the seeded override also keeps the terrain out of the effecter list
		assert!(registry.terrain_effecters(road).is_empty());
	}
	#[test]
	fn moveable_categories_respect_permissions() {
		let mut builder = PathingRegistryBuilder::new();
		let mut fixed = CategoryDef::new("turret");
		fixed.movement_permissions = MovementPermissions::NotAllowed;
		builder.add_category(fixed);
		let mobile = builder.add_category(CategoryDef::new("mobile"));
		let registry = builder.build();
		assert_eq!(vec![mobile], registry.moveable_categories());
		assert!(registry.should_create_regions(mobile));
		assert!(!registry.should_create_regions(CategoryId(0)));
	}
	#[test]
	#[cfg(feature = "ron")]
	fn definitions_from_disk() {
		let path = env!("CARGO_MANIFEST_DIR").to_string() + "/assets/pathing_defs.ron";
		let registry = PathingRegistryBuilder::from_ron(path).build();
		let land = CategoryId(0);
		let boat = CategoryId(1);
		assert_eq!("land", registry.category(land).name);
		assert_eq!(vec![land, boat], registry.moveable_categories());
		// the wall kind is flagged as region affecting for both categories
		assert_eq!(vec![land, boat], registry.region_effecters(ThingKindId(0)));
	}
}
