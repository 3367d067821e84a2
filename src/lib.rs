//! World map rendering library
//!
//! Turns a generated field set (elevation, climate, hydrology, biomes) into
//! colour rasters, one per map type.

pub mod fields;
pub mod palette;
pub mod render;
pub mod tilemap;

pub use fields::{Field, FieldSet, FieldSetError};
pub use palette::{Palette, PaletteError, DEFAULT_PALETTE};
pub use render::{MapRenderer, MapType, RenderError};
pub use tilemap::Tilemap;
