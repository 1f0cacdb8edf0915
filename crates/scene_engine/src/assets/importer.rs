//! Importer registry
//!
//! An importer pairs a parser for one content type with the transport
//! parameters that type needs (for example `format=xml`). Registration is
//! keyed by the content-type tag; registering the same tag again replaces
//! the previous importer.

use std::collections::{BTreeMap, HashMap};

use super::AssetError;

/// Parser for one content type
///
/// Receives the URI the payload was fetched from (useful for resolving
/// relative references) and the raw payload.
pub trait AssetParser<T> {
    /// Build an asset from a fetched payload
    fn parse(&self, uri: &str, payload: &[u8]) -> Result<T, AssetError>;
}

impl<T, F> AssetParser<T> for F
where
    F: Fn(&str, &[u8]) -> Result<T, AssetError>,
{
    fn parse(&self, uri: &str, payload: &[u8]) -> Result<T, AssetError> {
        self(uri, payload)
    }
}

/// Parser plus transport parameters for one content type
pub struct Importer<T> {
    kind: String,
    parser: Box<dyn AssetParser<T>>,
    transport_params: BTreeMap<String, String>,
}

impl<T> Importer<T> {
    /// Create an importer for the content type `kind`
    pub fn new(kind: impl Into<String>, parser: impl AssetParser<T> + 'static) -> Self {
        Self {
            kind: kind.into(),
            parser: Box::new(parser),
            transport_params: BTreeMap::new(),
        }
    }

    /// Add a transport parameter sent with every fetch of this type
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.transport_params.insert(key.into(), value.into());
        self
    }

    /// Content-type tag
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Transport parameters
    pub fn transport_params(&self) -> &BTreeMap<String, String> {
        &self.transport_params
    }

    /// Run the parser
    pub fn parse(&self, uri: &str, payload: &[u8]) -> Result<T, AssetError> {
        self.parser.parse(uri, payload)
    }
}

/// Importers keyed by content-type tag
pub struct ImporterRegistry<T> {
    importers: HashMap<String, Importer<T>>,
}

impl<T> ImporterRegistry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            importers: HashMap::new(),
        }
    }

    /// Register an importer, replacing any previous one for the same type
    pub fn register(&mut self, importer: Importer<T>) -> Result<(), AssetError> {
        if importer.kind.is_empty() {
            return Err(AssetError::MissingField("type"));
        }
        if self.importers.contains_key(&importer.kind) {
            log::debug!("Replacing importer for type \"{}\"", importer.kind);
        } else {
            log::debug!("Registered importer for type \"{}\"", importer.kind);
        }
        self.importers.insert(importer.kind.clone(), importer);
        Ok(())
    }

    /// Importer for a content type
    pub fn get(&self, kind: &str) -> Option<&Importer<T>> {
        self.importers.get(kind)
    }

    /// Whether a content type has an importer
    pub fn contains(&self, kind: &str) -> bool {
        self.importers.contains_key(kind)
    }

    /// Number of registered importers
    pub fn len(&self) -> usize {
        self.importers.len()
    }

    /// Whether no importer is registered
    pub fn is_empty(&self) -> bool {
        self.importers.is_empty()
    }

    /// Remove every importer
    pub fn clear(&mut self) {
        self.importers.clear();
    }
}

impl<T> Default for ImporterRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
