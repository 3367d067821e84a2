//! The co-registered field set produced by world generation.
//!
//! Every grid shares the dimensions of `elevation`. Fields other than
//! elevation are optional; a map type that needs an absent field is
//! rejected by the renderer before any pixel is written.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::tilemap::Tilemap;

/// Names of the grids a `FieldSet` can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Elevation,
    Temperature,
    Wind,
    Rainfall,
    Drainage,
    Erosion,
    Rivers,
    Lakes,
    BiomeColour,
}

impl Field {
    pub fn all() -> &'static [Self] {
        &[
            Self::Elevation,
            Self::Temperature,
            Self::Wind,
            Self::Rainfall,
            Self::Drainage,
            Self::Erosion,
            Self::Rivers,
            Self::Lakes,
            Self::BiomeColour,
        ]
    }

    /// Key used for this field in field-set files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Elevation => "elevation",
            Self::Temperature => "temperature",
            Self::Wind => "wind",
            Self::Rainfall => "rainfall",
            Self::Drainage => "drainage",
            Self::Erosion => "erosion",
            Self::Rivers => "rivers",
            Self::Lakes => "lakes",
            Self::BiomeColour => "biomeColour",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Read-only inputs to the renderer.
///
/// Scalar samples are normalized to [0, 1] by the generator, except
/// `rivers` and `lakes`, which are non-negative presence magnitudes.
/// `biome_colour` holds already-resolved RGB triples.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSet {
    pub elevation: Tilemap<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Tilemap<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind: Option<Tilemap<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rainfall: Option<Tilemap<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drainage: Option<Tilemap<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub erosion: Option<Tilemap<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rivers: Option<Tilemap<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lakes: Option<Tilemap<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biome_colour: Option<Tilemap<[u8; 3]>>,
}

impl FieldSet {
    /// Start a field set from its elevation grid; everything else is absent.
    pub fn new(elevation: Tilemap<f32>) -> Self {
        Self {
            elevation,
            temperature: None,
            wind: None,
            rainfall: None,
            drainage: None,
            erosion: None,
            rivers: None,
            lakes: None,
            biome_colour: None,
        }
    }

    pub fn with_temperature(mut self, grid: Tilemap<f32>) -> Self {
        self.temperature = Some(grid);
        self
    }

    pub fn with_wind(mut self, grid: Tilemap<f32>) -> Self {
        self.wind = Some(grid);
        self
    }

    pub fn with_rainfall(mut self, grid: Tilemap<f32>) -> Self {
        self.rainfall = Some(grid);
        self
    }

    pub fn with_drainage(mut self, grid: Tilemap<f32>) -> Self {
        self.drainage = Some(grid);
        self
    }

    pub fn with_erosion(mut self, grid: Tilemap<f32>) -> Self {
        self.erosion = Some(grid);
        self
    }

    pub fn with_rivers(mut self, grid: Tilemap<f32>) -> Self {
        self.rivers = Some(grid);
        self
    }

    pub fn with_lakes(mut self, grid: Tilemap<f32>) -> Self {
        self.lakes = Some(grid);
        self
    }

    pub fn with_biome_colour(mut self, grid: Tilemap<[u8; 3]>) -> Self {
        self.biome_colour = Some(grid);
        self
    }

    /// Canonical raster size, taken from `elevation`.
    pub fn dimensions(&self) -> (usize, usize) {
        self.elevation.dimensions()
    }

    /// Look up a scalar grid by name. `BiomeColour` is not scalar and
    /// always yields `None`; use the `biome_colour` field directly.
    pub fn scalar(&self, field: Field) -> Option<&Tilemap<f32>> {
        match field {
            Field::Elevation => Some(&self.elevation),
            Field::Temperature => self.temperature.as_ref(),
            Field::Wind => self.wind.as_ref(),
            Field::Rainfall => self.rainfall.as_ref(),
            Field::Drainage => self.drainage.as_ref(),
            Field::Erosion => self.erosion.as_ref(),
            Field::Rivers => self.rivers.as_ref(),
            Field::Lakes => self.lakes.as_ref(),
            Field::BiomeColour => None,
        }
    }

    /// Size of the named grid, if present.
    pub fn field_dimensions(&self, field: Field) -> Option<(usize, usize)> {
        match field {
            Field::BiomeColour => self.biome_colour.as_ref().map(Tilemap::dimensions),
            _ => self.scalar(field).map(Tilemap::dimensions),
        }
    }

    /// Fields currently carried, in `Field::all()` order.
    pub fn present_fields(&self) -> Vec<Field> {
        Field::all()
            .iter()
            .copied()
            .filter(|&f| self.field_dimensions(f).is_some())
            .collect()
    }

    /// Check that every present grid has a complete buffer and matches the
    /// elevation size.
    pub fn validate(&self) -> Result<(), FieldSetError> {
        let expected = self.dimensions();
        for &field in Field::all() {
            let (consistent, samples, found) = match field {
                Field::BiomeColour => match &self.biome_colour {
                    Some(g) => (g.is_consistent(), g.len(), g.dimensions()),
                    None => continue,
                },
                _ => match self.scalar(field) {
                    Some(g) => (g.is_consistent(), g.len(), g.dimensions()),
                    None => continue,
                },
            };
            if !consistent {
                return Err(FieldSetError::Shape {
                    field,
                    width: found.0,
                    height: found.1,
                    samples,
                });
            }
            if found != expected {
                return Err(FieldSetError::Dimensions { field, expected, found });
            }
        }
        Ok(())
    }

    /// Parse a field set from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, FieldSetError> {
        let fields: FieldSet = serde_json::from_str(json).map_err(FieldSetError::Parse)?;
        fields.validate()?;
        Ok(fields)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, FieldSetError> {
        let contents = fs::read_to_string(path).map_err(FieldSetError::Io)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_string(&self) -> Result<String, FieldSetError> {
        serde_json::to_string(self).map_err(FieldSetError::Parse)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), FieldSetError> {
        let json = self.to_json_string()?;
        fs::write(path, json).map_err(FieldSetError::Io)
    }
}

/// Errors raised while loading or validating a field set file
#[derive(Debug)]
pub enum FieldSetError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    /// Stored sample count does not match the declared size
    Shape {
        field: Field,
        width: usize,
        height: usize,
        samples: usize,
    },
    /// Grid size differs from the elevation grid
    Dimensions {
        field: Field,
        expected: (usize, usize),
        found: (usize, usize),
    },
}

impl std::fmt::Display for FieldSetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldSetError::Io(e) => write!(f, "I/O error: {}", e),
            FieldSetError::Parse(e) => write!(f, "Parse error: {}", e),
            FieldSetError::Shape { field, width, height, samples } => write!(
                f,
                "Field '{}' declares {}x{} but stores {} samples",
                field, width, height, samples
            ),
            FieldSetError::Dimensions { field, expected, found } => write!(
                f,
                "Field '{}' is {}x{}, expected {}x{}",
                field, found.0, found.1, expected.0, expected.1
            ),
        }
    }
}

impl std::error::Error for FieldSetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FieldSetError::Io(e) => Some(e),
            FieldSetError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize) -> Tilemap<f32> {
        Tilemap::from_fn(width, height, |x, y| (x + y) as f32 / (width + height) as f32)
    }

    #[test]
    fn test_scalar_lookup() {
        let fields = FieldSet::new(ramp(4, 2)).with_wind(Tilemap::new_with(4, 2, 0.3));
        assert!(fields.scalar(Field::Elevation).is_some());
        assert_eq!(*fields.scalar(Field::Wind).unwrap().get(3, 1), 0.3);
        assert!(fields.scalar(Field::Rainfall).is_none());
        assert!(fields.scalar(Field::BiomeColour).is_none());
    }

    #[test]
    fn test_present_fields() {
        let fields = FieldSet::new(ramp(2, 2))
            .with_lakes(Tilemap::new(2, 2))
            .with_biome_colour(Tilemap::new_with(2, 2, [1, 2, 3]));
        assert_eq!(
            fields.present_fields(),
            vec![Field::Elevation, Field::Lakes, Field::BiomeColour]
        );
    }

    #[test]
    fn test_validate_rejects_mismatched_grid() {
        let fields = FieldSet::new(ramp(4, 4)).with_rainfall(Tilemap::new(4, 3));
        match fields.validate() {
            Err(FieldSetError::Dimensions { field, expected, found }) => {
                assert_eq!(field, Field::Rainfall);
                assert_eq!(expected, (4, 4));
                assert_eq!(found, (4, 3));
            }
            other => panic!("expected dimension error, got {:?}", other),
        }
    }

    #[test]
    fn test_json_uses_camel_case_keys() {
        let fields = FieldSet::new(ramp(2, 1)).with_biome_colour(Tilemap::new_with(2, 1, [10, 20, 30]));
        let json = fields.to_json_string().unwrap();
        assert!(json.contains("\"biomeColour\""));
        assert!(!json.contains("\"temperature\""));

        let back = FieldSet::from_json_str(&json).unwrap();
        assert_eq!(back, fields);
    }

    #[test]
    fn test_json_missing_optional_fields() {
        let json = r#"{"elevation":{"width":2,"height":1,"data":[0.0,1.0]},"wind":null}"#;
        let fields = FieldSet::from_json_str(json).unwrap();
        assert_eq!(fields.dimensions(), (2, 1));
        assert!(fields.wind.is_none());
    }

    #[test]
    fn test_json_short_buffer_is_rejected() {
        let json = r#"{"elevation":{"width":2,"height":2,"data":[0.0,1.0,0.5]}}"#;
        assert!(matches!(
            FieldSet::from_json_str(json),
            Err(FieldSetError::Shape { field: Field::Elevation, samples: 3, .. })
        ));
    }

    #[test]
    fn test_json_overflowing_size_is_rejected() {
        let json = r#"{"elevation":{"width":9223372036854775808,"height":2,"data":[]}}"#;
        assert!(matches!(
            FieldSet::from_json_str(json),
            Err(FieldSetError::Shape { field: Field::Elevation, samples: 0, .. })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("world_render_fields_{}.json", std::process::id()));
        let fields = FieldSet::new(ramp(3, 3)).with_erosion(Tilemap::new_with(3, 3, 0.1));
        fields.save_json(&path).unwrap();
        let loaded = FieldSet::load_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, fields);
    }
}
