//! This is a plugin for Bevy game engine to maintain incremental region-based reachability caches over grid maps
//!

pub mod pathing;
pub mod bundle;
pub mod plugin;

pub mod prelude;
