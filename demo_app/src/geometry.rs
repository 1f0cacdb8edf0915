//! Plain-text vertex lists (`.geo`)
//!
//! One vertex per line as `v <x> <y> <z>`. Blank lines and lines starting
//! with `#` are ignored.

use scene_engine::assets::AssetError;
use thiserror::Error;

/// Parsed `.geo` asset
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// Vertex positions
    pub vertices: Vec<[f32; 3]>,
}

impl Geometry {
    /// Distance of the farthest vertex from the origin
    pub fn bounding_radius(&self) -> f32 {
        self.vertices
            .iter()
            .map(|[x, y, z]| (x * x + y * y + z * z).sqrt())
            .fold(0.0, f32::max)
    }
}

/// `.geo` syntax errors
#[derive(Error, Debug, PartialEq)]
pub enum GeoError {
    /// Line is not a vertex
    #[error("line {line}: unknown record \"{record}\"")]
    UnknownRecord {
        /// 1-based line number
        line: usize,
        /// Offending record tag
        record: String,
    },

    /// Vertex without exactly three coordinates
    #[error("line {line}: expected 3 coordinates, found {found}")]
    Arity {
        /// 1-based line number
        line: usize,
        /// Coordinates present
        found: usize,
    },

    /// Coordinate is not a number
    #[error("line {line}: invalid coordinate \"{value}\"")]
    Coordinate {
        /// 1-based line number
        line: usize,
        /// Offending text
        value: String,
    },

    /// File holds no vertices
    #[error("no vertices")]
    Empty,
}

/// Parse `.geo` text
pub fn parse(text: &str) -> Result<Geometry, GeoError> {
    let mut vertices = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let mut fields = raw.split_whitespace();
        match fields.next() {
            None => continue,
            Some(tag) if tag.starts_with('#') => continue,
            Some("v") => {}
            Some(other) => {
                return Err(GeoError::UnknownRecord {
                    line,
                    record: other.to_string(),
                })
            }
        }

        let coords = fields
            .map(|value| {
                value.parse::<f32>().map_err(|_| GeoError::Coordinate {
                    line,
                    value: value.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        match coords[..] {
            [x, y, z] => vertices.push([x, y, z]),
            _ => {
                return Err(GeoError::Arity {
                    line,
                    found: coords.len(),
                })
            }
        }
    }

    if vertices.is_empty() {
        return Err(GeoError::Empty);
    }
    Ok(Geometry { vertices })
}

/// Importer entry point for `geo` assets
pub fn import(uri: &str, payload: &[u8]) -> Result<Geometry, AssetError> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| AssetError::Parse(format!("{uri}: {e}")))?;
    parse(text).map_err(|e| AssetError::Parse(format!("{uri}: {e}")))
}
