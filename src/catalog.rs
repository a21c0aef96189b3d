use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Tag of the catch-all intent every catalog must carry.
pub const FALLBACK_TAG: &str = "fallback";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read intent catalog {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed intent catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("intent catalog is empty")]
    Empty,

    #[error("intent #{index} has an empty tag")]
    EmptyTag { index: usize },

    #[error("duplicate intent tag '{0}'")]
    DuplicateTag(String),

    #[error("intent '{0}' has no responses")]
    NoResponses(String),

    #[error("intent '{0}' has no patterns")]
    NoPatterns(String),

    #[error("intent catalog has no '{FALLBACK_TAG}' intent")]
    MissingFallback,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Intent {
    pub tag: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub responses: Vec<String>,
}

impl Intent {
    pub fn is_fallback(&self) -> bool {
        self.tag == FALLBACK_TAG
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    intents: Vec<Intent>,
}

/// Read-only set of intents, validated once at load time.
#[derive(Debug, Clone)]
pub struct Catalog {
    intents: Vec<Intent>,
    fallback: usize,
}

impl Catalog {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&content)?;
        log::info!("Loaded {} intents from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(content)?;
        Self::new(file.intents)
    }

    /// Validates the intents and fixes the catalog order.
    pub fn new(intents: Vec<Intent>) -> Result<Self, CatalogError> {
        if intents.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for (index, intent) in intents.iter().enumerate() {
            if intent.tag.trim().is_empty() {
                return Err(CatalogError::EmptyTag { index });
            }
            if !seen.insert(intent.tag.as_str()) {
                return Err(CatalogError::DuplicateTag(intent.tag.clone()));
            }
            if intent.responses.is_empty() {
                return Err(CatalogError::NoResponses(intent.tag.clone()));
            }
            if intent.patterns.is_empty() && !intent.is_fallback() {
                return Err(CatalogError::NoPatterns(intent.tag.clone()));
            }
        }

        let fallback = intents
            .iter()
            .position(Intent::is_fallback)
            .ok_or(CatalogError::MissingFallback)?;

        Ok(Self { intents, fallback })
    }

    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    pub fn fallback(&self) -> &Intent {
        &self.intents[self.fallback]
    }

    pub fn get(&self, tag: &str) -> Option<&Intent> {
        self.intents.iter().find(|intent| intent.tag == tag)
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}
