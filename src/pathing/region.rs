//! Regions and the links between them. A region is a maximal connected set of
//! passable cells for one movement category; a link is the boundary shared by
//! two regions, or by a region and the map edge.
//!
//! Regions and links live in arenas owned by the
//! [crate::prelude::RegionGrid] and refer to each other by integer handle
//! rather than by ownership, so "deregister and clear" during invalidation is
//! a handle-table operation with no reference cycles to break.
//!

use std::collections::HashMap;
use std::fmt;

use bevy::prelude::*;

use crate::prelude::*;

/// Handle of a [Region] within its owning grid's arena
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Reflect)]
pub struct RegionId(u32);

impl RegionId {
	/// Create a handle from a raw arena slot
	pub(crate) fn new(slot: u32) -> Self {
		RegionId(slot)
	}
	/// Index into the region arena
	pub fn index(&self) -> usize {
		self.0 as usize
	}
}

/// Handle of a [RegionLink] within its owning grid's arena
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Reflect)]
pub struct LinkId(u32);

impl LinkId {
	/// Create a handle from a raw arena slot
	pub(crate) fn new(slot: u32) -> Self {
		LinkId(slot)
	}
	/// Index into the link arena
	pub fn index(&self) -> usize {
		self.0 as usize
	}
}

/// Handle of the higher-level grouping a region belongs to. Regions connected
/// by links share a room, which makes reachability a room comparison
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Reflect)]
pub struct RoomId(pub(crate) u32);

/// The far side of a [RegionLink] relative to one of its endpoints
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LinkTarget {
	/// The link joins another region
	Region(RegionId),
	/// The link sits on the map boundary
	MapEdge,
}

/// Identity of a link used for deduplication: a normalized region pair, or a
/// region plus the side of the map its boundary sits on
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum LinkKey {
	/// Boundary between two regions, endpoints ordered low to high
	Pair(RegionId, RegionId),
	/// Boundary between a region and the map edge, `0..4` encoding the side
	Edge(RegionId, u8),
}

impl LinkKey {
	/// Normalized key for a region pair boundary
	pub fn pair(a: RegionId, b: RegionId) -> Self {
		if a <= b {
			LinkKey::Pair(a, b)
		} else {
			LinkKey::Pair(b, a)
		}
	}
}

/// A maximal connected set of cells with uniform passability for one
/// category. Invalidated regions stay in the arena until the next partition
/// rebuild reclaims them
pub struct Region {
	/// Whether the region still reflects the current cost grid. An invalid
	/// region has no links, no weights and no room
	pub(crate) valid: bool,
	/// Member cells of the region
	pub(crate) cells: Vec<Cell>,
	/// Handles of the links along the region's boundary
	pub(crate) links: Vec<LinkId>,
	/// Memoized traversal weight towards each neighbouring region
	pub(crate) weights: HashMap<RegionId, u32>,
	/// Higher-level grouping, cleared on invalidation and reassigned on
	/// rebuild
	pub(crate) room: Option<RoomId>,
}

impl Region {
	/// Create a valid region over `cells` with no connectivity yet
	pub(crate) fn new(cells: Vec<Cell>) -> Self {
		Region {
			valid: true,
			cells,
			links: Vec::new(),
			weights: HashMap::new(),
			room: None,
		}
	}
	/// Whether the region still reflects the current cost grid
	pub fn is_valid(&self) -> bool {
		self.valid
	}
	/// Member cells of the region
	pub fn get_cells(&self) -> &[Cell] {
		&self.cells
	}
	/// Handles of the links along the region's boundary
	pub fn get_links(&self) -> &[LinkId] {
		&self.links
	}
	/// Memoized traversal weight towards each neighbouring region
	pub fn get_weights(&self) -> &HashMap<RegionId, u32> {
		&self.weights
	}
	/// Higher-level grouping the region belongs to
	pub fn get_room(&self) -> Option<RoomId> {
		self.room
	}
}

/// A boundary between two regions, or between a region and the map edge. A
/// link must be deregistered from both endpoints before either endpoint is
/// discarded or reused
pub struct RegionLink {
	/// The two endpoints of the link. A map-edge link has one endpoint
	pub(crate) endpoints: [Option<RegionId>; 2],
	/// Identity of the link in the dedup table
	pub(crate) key: LinkKey,
	/// Traversal weight across the boundary, the cheapest adjoining cell pair
	pub(crate) weight: u32,
}

impl RegionLink {
	/// The endpoint on the far side of the link from `region`. [None] when
	/// `region` is not an endpoint at all
	pub fn other(&self, region: RegionId) -> Option<LinkTarget> {
		match self.endpoints {
			[Some(a), Some(b)] if a == region => Some(LinkTarget::Region(b)),
			[Some(a), Some(b)] if b == region => Some(LinkTarget::Region(a)),
			[Some(a), None] if a == region => Some(LinkTarget::MapEdge),
			_ => None,
		}
	}
	/// Remove `region` from the link's endpoints
	pub(crate) fn deregister(&mut self, region: RegionId) {
		for endpoint in self.endpoints.iter_mut() {
			if *endpoint == Some(region) {
				*endpoint = None;
			}
		}
	}
}

/// Corruption encountered while invalidating a region. A half-invalidated
/// region is worse than a hard failure, pathing silently built on corrupt
/// data is the failure mode being avoided, so these are logged with full
/// context and then propagated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionCorruption {
	/// The region handle does not resolve to an arena slot
	MissingRegion {
		/// Handle that failed to resolve
		region: RegionId,
	},
	/// A link handle held by the region resolves to a freed arena slot
	DanglingLink {
		/// Region being invalidated
		region: RegionId,
		/// Handle that failed to resolve
		link: LinkId,
	},
	/// A link resolved but does not list the region as an endpoint
	UnregisteredEndpoint {
		/// Region being invalidated
		region: RegionId,
		/// Offending link
		link: LinkId,
	},
}

impl fmt::Display for RegionCorruption {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RegionCorruption::MissingRegion { region } => {
				write!(f, "region {:?} does not resolve to an arena slot", region)
			}
			RegionCorruption::DanglingLink { region, link } => {
				write!(
					f,
					"region {:?} holds link {:?} which resolves to a freed slot",
					region, link
				)
			}
			RegionCorruption::UnregisteredEndpoint { region, link } => {
				write!(
					f,
					"link {:?} does not list region {:?} as an endpoint",
					link, region
				)
			}
		}
	}
}

impl std::error::Error for RegionCorruption {}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn link_key_normalized() {
		let a = RegionId::new(3);
		let b = RegionId::new(7);
		assert_eq!(LinkKey::pair(a, b), LinkKey::pair(b, a));
	}
	#[test]
	fn link_other_endpoint() {
		let a = RegionId::new(0);
		let b = RegionId::new(1);
		let link = RegionLink {
			endpoints: [Some(a), Some(b)],
			key: LinkKey::pair(a, b),
			weight: 2,
		};
		assert_eq!(Some(LinkTarget::Region(b)), link.other(a));
		assert_eq!(Some(LinkTarget::Region(a)), link.other(b));
		assert_eq!(None, link.other(RegionId::new(9)));
	}
	#[test]
	fn edge_link_other_endpoint() {
		let a = RegionId::new(0);
		let link = RegionLink {
			endpoints: [Some(a), None],
			key: LinkKey::Edge(a, 0),
			weight: 1,
		};
		assert_eq!(Some(LinkTarget::MapEdge), link.other(a));
	}
	#[test]
	fn deregister_clears_endpoint() {
		let a = RegionId::new(0);
		let b = RegionId::new(1);
		let mut link = RegionLink {
			endpoints: [Some(a), Some(b)],
			key: LinkKey::pair(a, b),
			weight: 2,
		};
		link.deregister(a);
		assert_eq!([None, Some(b)], link.endpoints);
	}
}
