//! `use bevy_region_pathing_plugin::prelude::*;` to import common structures and methods
//!

#[doc(hidden)]
pub use crate::pathing::{
	cost_grid::*, dirtyer::*, mapping::*, pool::*, reachability::*, region::*, region_grid::*,
	registry::*, worker::*, *,
};

#[doc(hidden)]
pub use crate::{
	bundle::*,
	plugin::{change_layer::*, *},
};
