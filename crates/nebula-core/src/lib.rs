#![forbid(unsafe_code)]

//! Core: render configuration, tile geometry, and logging bootstrap.

pub mod config;
pub mod geometry;
pub mod logging;

pub use config::{Config, ConfigAdjustment, ConfigError, Palette, SchedulePolicy};
pub use geometry::{Tile, TileGrid, tile_size_for_chunk};
