//! Field-to-colour mapping engine.
//!
//! A `MapType` selects a rule set; `MapRenderer::layer` resolves it against
//! a `FieldSet` into a `Layer` that borrows exactly the grids that rule set
//! reads. Every rule is a pure per-cell function, so rendering is a single
//! pass in raster order with no coupling between cells.

use std::str::FromStr;

use image::{ImageBuffer, Rgb, RgbImage};
use rayon::prelude::*;

use crate::fields::{Field, FieldSet};
use crate::palette::{grey, scale_channel, Palette, DEFAULT_PALETTE};
use crate::tilemap::Tilemap;

/// Elevation at or above which exposed land is drawn as hills.
pub const HILLS_THRESHOLD: f32 = 0.65;
/// Elevation at or above which exposed land is drawn as snow.
pub const PEAK_THRESHOLD: f32 = 0.95;

/// Which rendering of the field set to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MapType {
    Heightmap,
    SeaLevel,
    Elevation,
    Heatmap,
    RawHeatmap,
    WindMap,
    RainMap,
    WindAndRainMap,
    DrainageMap,
    RiverMap,
    BiomeMap,
    ErosionMap,
    ErosionAppliedMap,
}

impl MapType {
    pub fn all() -> &'static [Self] {
        &[
            Self::Heightmap,
            Self::SeaLevel,
            Self::Elevation,
            Self::Heatmap,
            Self::RawHeatmap,
            Self::WindMap,
            Self::RainMap,
            Self::WindAndRainMap,
            Self::DrainageMap,
            Self::RiverMap,
            Self::BiomeMap,
            Self::ErosionMap,
            Self::ErosionAppliedMap,
        ]
    }

    /// Identifier accepted by `from_str`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Heightmap => "heightmap",
            Self::SeaLevel => "sealevel",
            Self::Elevation => "elevation",
            Self::Heatmap => "heatmap",
            Self::RawHeatmap => "rawheatmap",
            Self::WindMap => "windmap",
            Self::RainMap => "rainmap",
            Self::WindAndRainMap => "windandrainmap",
            Self::DrainageMap => "drainagemap",
            Self::RiverMap => "rivermap",
            Self::BiomeMap => "biomemap",
            Self::ErosionMap => "erosionmap",
            Self::ErosionAppliedMap => "erosionappliedmap",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Heightmap => "Elevation as greyscale",
            Self::SeaLevel => "Greyscale land, blue-scaled water below sea level",
            Self::Elevation => "Banded palette: three sea depths, grassland, hills, peaks",
            Self::Heatmap => "Temperature from blue (cold) to red (hot)",
            Self::RawHeatmap => "Temperature as greyscale",
            Self::WindMap => "Wind strength in the green channel",
            Self::RainMap => "Rainfall in blue tones",
            Self::WindAndRainMap => "Rainfall in green, wind in blue",
            Self::DrainageMap => "Drainage as greyscale",
            Self::RiverMap => "Greyscale land with rivers and lakes highlighted",
            Self::BiomeMap => "Precomputed biome colours",
            Self::ErosionMap => "Erosion as greyscale",
            Self::ErosionAppliedMap => "Elevation minus erosion as greyscale",
        }
    }

    /// True for the modes that split submerged from exposed terrain.
    pub fn needs_sea_level(&self) -> bool {
        matches!(self, Self::SeaLevel | Self::Elevation | Self::RiverMap)
    }

    /// Grids this mode reads.
    pub fn required_fields(&self) -> &'static [Field] {
        match self {
            Self::Heightmap | Self::SeaLevel | Self::Elevation => &[Field::Elevation],
            Self::Heatmap | Self::RawHeatmap => &[Field::Temperature],
            Self::WindMap => &[Field::Wind],
            Self::RainMap => &[Field::Rainfall],
            Self::WindAndRainMap => &[Field::Wind, Field::Rainfall],
            Self::DrainageMap => &[Field::Drainage],
            Self::RiverMap => &[Field::Elevation, Field::Rivers, Field::Lakes],
            Self::BiomeMap => &[Field::BiomeColour],
            Self::ErosionMap => &[Field::Erosion],
            Self::ErosionAppliedMap => &[Field::Elevation, Field::Erosion],
        }
    }
}

impl std::fmt::Display for MapType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for MapType {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .ok_or_else(|| RenderError::UnsupportedMapType(s.to_string()))
    }
}

/// Sea level normalized to [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeaLevel(f32);

impl SeaLevel {
    /// Accepts a percentage in [0, 100].
    pub fn from_percent(percent: f32) -> Result<Self, RenderError> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(RenderError::InvalidSeaLevel(SeaLevelProblem::OutOfRange(percent)));
        }
        Ok(Self(percent / 100.0))
    }

    pub fn fraction(&self) -> f32 {
        self.0
    }
}

/// The six bands of the `elevation` map type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElevationBand {
    DeepSea,
    Sea,
    Shallows,
    Grassland,
    Hills,
    Peak,
}

impl ElevationBand {
    pub fn is_submerged(&self) -> bool {
        matches!(self, Self::DeepSea | Self::Sea | Self::Shallows)
    }

    pub fn colour(&self, palette: &Palette) -> [u8; 3] {
        match self {
            Self::DeepSea => palette.deepsea,
            Self::Sea => palette.sea,
            Self::Shallows => palette.blue,
            Self::Grassland => palette.grassland,
            Self::Hills => palette.hills,
            Self::Peak => palette.white,
        }
    }
}

/// Classify one elevation sample against a normalized sea level.
pub fn elevation_band(elevation: f32, sea_level: f32) -> ElevationBand {
    if elevation <= sea_level {
        if elevation < sea_level / 4.0 {
            ElevationBand::DeepSea
        } else if elevation < sea_level / 2.0 {
            ElevationBand::Sea
        } else {
            ElevationBand::Shallows
        }
    } else if elevation < HILLS_THRESHOLD {
        ElevationBand::Grassland
    } else if elevation < PEAK_THRESHOLD {
        ElevationBand::Hills
    } else {
        ElevationBand::Peak
    }
}

/// Water below sea level keeps its depth in the blue channel.
fn submerged(elevation: f32) -> [u8; 3] {
    [0, 0, scale_channel(elevation, 255.0)]
}

/// A map type bound to the grids it reads. Only built by
/// `MapRenderer::layer`, after every grid has been checked.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Layer<'a> {
    Heightmap { elevation: &'a Tilemap<f32> },
    SeaLevel { elevation: &'a Tilemap<f32>, sea_level: f32 },
    Elevation { elevation: &'a Tilemap<f32>, sea_level: f32 },
    Heatmap { temperature: &'a Tilemap<f32> },
    RawHeatmap { temperature: &'a Tilemap<f32> },
    WindMap { wind: &'a Tilemap<f32> },
    RainMap { rainfall: &'a Tilemap<f32> },
    WindAndRainMap { wind: &'a Tilemap<f32>, rainfall: &'a Tilemap<f32> },
    DrainageMap { drainage: &'a Tilemap<f32> },
    RiverMap {
        elevation: &'a Tilemap<f32>,
        sea_level: f32,
        rivers: &'a Tilemap<f32>,
        lakes: &'a Tilemap<f32>,
    },
    BiomeMap { biome_colour: &'a Tilemap<[u8; 3]> },
    ErosionMap { erosion: &'a Tilemap<f32> },
    ErosionAppliedMap { elevation: &'a Tilemap<f32>, erosion: &'a Tilemap<f32> },
}

impl Layer<'_> {
    /// Colour of cell `(x, y)`.
    pub(crate) fn shade(&self, x: usize, y: usize, palette: &Palette) -> [u8; 3] {
        match *self {
            Layer::Heightmap { elevation } => grey(*elevation.get(x, y)),
            Layer::SeaLevel { elevation, sea_level } => {
                let e = *elevation.get(x, y);
                if e <= sea_level {
                    submerged(e)
                } else {
                    grey(e)
                }
            }
            Layer::Elevation { elevation, sea_level } => {
                elevation_band(*elevation.get(x, y), sea_level).colour(palette)
            }
            Layer::Heatmap { temperature } => {
                let t = *temperature.get(x, y);
                [
                    scale_channel(t, 255.0),
                    scale_channel(t, 128.0),
                    scale_channel(1.0 - t, 255.0),
                ]
            }
            Layer::RawHeatmap { temperature } => grey(*temperature.get(x, y)),
            Layer::WindMap { wind } => [0, scale_channel(*wind.get(x, y), 255.0), 0],
            Layer::RainMap { rainfall } => {
                let r = *rainfall.get(x, y);
                [scale_channel(r, 100.0), scale_channel(r, 100.0), scale_channel(r, 255.0)]
            }
            Layer::WindAndRainMap { wind, rainfall } => {
                // Rainfall lands in green and wind in blue.
                let green = scale_channel(rainfall.get(x, y).min(1.0), 255.0);
                let blue = scale_channel(wind.get(x, y).min(1.0), 255.0);
                [0, green, blue]
            }
            Layer::DrainageMap { drainage } => grey(*drainage.get(x, y)),
            Layer::RiverMap { elevation, sea_level, rivers, lakes } => {
                let e = *elevation.get(x, y);
                if e <= sea_level {
                    submerged(e)
                } else if *lakes.get(x, y) > 0.0 {
                    palette.azure
                } else if *rivers.get(x, y) > 0.0 {
                    palette.cobalt
                } else {
                    grey(e)
                }
            }
            Layer::BiomeMap { biome_colour } => *biome_colour.get(x, y),
            Layer::ErosionMap { erosion } => grey(*erosion.get(x, y)),
            Layer::ErosionAppliedMap { elevation, erosion } => {
                grey(*elevation.get(x, y) - *erosion.get(x, y))
            }
        }
    }
}

/// Renders colour rasters from a borrowed field set.
#[derive(Clone, Copy, Debug)]
pub struct MapRenderer<'a> {
    fields: &'a FieldSet,
    palette: &'a Palette,
}

impl<'a> MapRenderer<'a> {
    pub fn new(fields: &'a FieldSet) -> Self {
        Self::with_palette(fields, &DEFAULT_PALETTE)
    }

    pub fn with_palette(fields: &'a FieldSet, palette: &'a Palette) -> Self {
        Self { fields, palette }
    }

    /// Render by map type name; `sea_level` is a percentage in [0, 100].
    pub fn render(&self, map_type: &str, sea_level: Option<f32>) -> Result<RgbImage, RenderError> {
        self.render_map(map_type.parse()?, sea_level)
    }

    pub fn render_map(&self, map_type: MapType, sea_level: Option<f32>) -> Result<RgbImage, RenderError> {
        let layer = self.resolve(map_type, sea_level)?;
        let (width, height) = self.fields.dimensions();
        tracing::debug!(map = %map_type, width, height, ?sea_level, "render");

        let mut img: RgbImage = ImageBuffer::new(width as u32, height as u32);
        for y in 0..height {
            for x in 0..width {
                img.put_pixel(x as u32, y as u32, Rgb(layer.shade(x, y, self.palette)));
            }
        }
        Ok(img)
    }

    /// Same raster as `render_map`, with rows shaded on the rayon pool.
    pub fn render_par(&self, map_type: MapType, sea_level: Option<f32>) -> Result<RgbImage, RenderError> {
        let layer = self.resolve(map_type, sea_level)?;
        let (width, height) = self.fields.dimensions();
        tracing::debug!(map = %map_type, width, height, ?sea_level, "render_par");

        let mut img: RgbImage = ImageBuffer::new(width as u32, height as u32);
        if width > 0 {
            let palette = self.palette;
            img.par_chunks_mut(width * 3).enumerate().for_each(|(y, row)| {
                for x in 0..width {
                    row[x * 3..x * 3 + 3].copy_from_slice(&layer.shade(x, y, palette));
                }
            });
        }
        Ok(img)
    }

    /// Map types whose required grids are all present with the right size.
    pub fn available_map_types(&self) -> Vec<MapType> {
        MapType::all()
            .iter()
            .copied()
            .filter(|&m| m.required_fields().iter().all(|&f| self.check_field(m, f).is_ok()))
            .collect()
    }

    fn resolve(&self, map_type: MapType, sea_level: Option<f32>) -> Result<Layer<'a>, RenderError> {
        let sea_level = sea_level.map(SeaLevel::from_percent).transpose()?;
        self.layer(map_type, sea_level)
    }

    /// Bind `map_type` to its grids, checking the sea level and every
    /// required field first.
    pub(crate) fn layer(&self, map_type: MapType, sea_level: Option<SeaLevel>) -> Result<Layer<'a>, RenderError> {
        let sea = match (map_type.needs_sea_level(), sea_level) {
            (true, None) => return Err(RenderError::InvalidSeaLevel(SeaLevelProblem::Missing(map_type))),
            (_, level) => level.map(|s| s.fraction()).unwrap_or(0.0),
        };

        let layer = match map_type {
            MapType::Heightmap => Layer::Heightmap {
                elevation: self.scalar(map_type, Field::Elevation)?,
            },
            MapType::SeaLevel => Layer::SeaLevel {
                elevation: self.scalar(map_type, Field::Elevation)?,
                sea_level: sea,
            },
            MapType::Elevation => Layer::Elevation {
                elevation: self.scalar(map_type, Field::Elevation)?,
                sea_level: sea,
            },
            MapType::Heatmap => Layer::Heatmap {
                temperature: self.scalar(map_type, Field::Temperature)?,
            },
            MapType::RawHeatmap => Layer::RawHeatmap {
                temperature: self.scalar(map_type, Field::Temperature)?,
            },
            MapType::WindMap => Layer::WindMap {
                wind: self.scalar(map_type, Field::Wind)?,
            },
            MapType::RainMap => Layer::RainMap {
                rainfall: self.scalar(map_type, Field::Rainfall)?,
            },
            MapType::WindAndRainMap => Layer::WindAndRainMap {
                wind: self.scalar(map_type, Field::Wind)?,
                rainfall: self.scalar(map_type, Field::Rainfall)?,
            },
            MapType::DrainageMap => Layer::DrainageMap {
                drainage: self.scalar(map_type, Field::Drainage)?,
            },
            MapType::RiverMap => Layer::RiverMap {
                elevation: self.scalar(map_type, Field::Elevation)?,
                sea_level: sea,
                rivers: self.scalar(map_type, Field::Rivers)?,
                lakes: self.scalar(map_type, Field::Lakes)?,
            },
            MapType::BiomeMap => {
                self.check_field(map_type, Field::BiomeColour)?;
                let fields: &'a FieldSet = self.fields;
                match &fields.biome_colour {
                    Some(biome_colour) => Layer::BiomeMap { biome_colour },
                    None => return Err(missing(map_type, Field::BiomeColour, FieldProblem::Absent)),
                }
            }
            MapType::ErosionMap => Layer::ErosionMap {
                erosion: self.scalar(map_type, Field::Erosion)?,
            },
            MapType::ErosionAppliedMap => Layer::ErosionAppliedMap {
                elevation: self.scalar(map_type, Field::Elevation)?,
                erosion: self.scalar(map_type, Field::Erosion)?,
            },
        };
        Ok(layer)
    }

    fn scalar(&self, map_type: MapType, field: Field) -> Result<&'a Tilemap<f32>, RenderError> {
        self.check_field(map_type, field)?;
        self.fields
            .scalar(field)
            .ok_or_else(|| missing(map_type, field, FieldProblem::Absent))
    }

    fn check_field(&self, map_type: MapType, field: Field) -> Result<(), RenderError> {
        let expected = self.fields.dimensions();
        let found = self
            .fields
            .field_dimensions(field)
            .ok_or_else(|| missing(map_type, field, FieldProblem::Absent))?;
        let consistent = match field {
            Field::BiomeColour => self.fields.biome_colour.as_ref().is_some_and(Tilemap::is_consistent),
            _ => self.fields.scalar(field).is_some_and(Tilemap::is_consistent),
        };
        if found != expected || !consistent {
            return Err(missing(map_type, field, FieldProblem::Dimensions { expected, found }));
        }
        Ok(())
    }
}

fn missing(map_type: MapType, field: Field, problem: FieldProblem) -> RenderError {
    RenderError::MissingField { map_type, field, problem }
}

/// Why a required field could not be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldProblem {
    Absent,
    Dimensions {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SeaLevelProblem {
    /// The map type needs a sea level and none was given
    Missing(MapType),
    /// Not a percentage in [0, 100]
    OutOfRange(f32),
}

/// Render errors. All are detected before any pixel is written.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderError {
    UnsupportedMapType(String),
    MissingField {
        map_type: MapType,
        field: Field,
        problem: FieldProblem,
    },
    InvalidSeaLevel(SeaLevelProblem),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::UnsupportedMapType(name) => write!(f, "Unsupported map type '{}'", name),
            RenderError::MissingField { map_type, field, problem } => match problem {
                FieldProblem::Absent => {
                    write!(f, "Map type '{}' needs field '{}', which is absent", map_type, field)
                }
                FieldProblem::Dimensions { expected, found } => write!(
                    f,
                    "Map type '{}' needs field '{}' at {}x{}, found {}x{}",
                    map_type, field, expected.0, expected.1, found.0, found.1
                ),
            },
            RenderError::InvalidSeaLevel(SeaLevelProblem::Missing(map_type)) => {
                write!(f, "Map type '{}' needs a sea level", map_type)
            }
            RenderError::InvalidSeaLevel(SeaLevelProblem::OutOfRange(value)) => {
                write!(f, "Sea level {} is outside 0-100", value)
            }
        }
    }
}

impl std::error::Error for RenderError {}
