//! Resolution of the configured `scriptOrPath` string into script text.
//!
//! Precedence is fixed: an existing regular file on the filesystem wins,
//! then a `classpath:`-prefixed lookup in the embedded resource bundle,
//! and anything else is taken as the inline script body. The prefix name
//! is kept for compatibility with existing gateway route configurations.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::SourceError;

const EMBEDDED_PREFIX: &str = "classpath:";

/// Lookup of scripts bundled with the deployment.
pub trait ResourceLookup: Send + Sync {
    fn get(&self, path: &str) -> Option<String>;
}

/// In-memory bundle of named embedded scripts.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedScripts {
    entries: HashMap<String, String>,
}

impl EmbeddedScripts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, script: impl Into<String>) {
        self.entries.insert(path.into(), script.into());
    }
}

impl ResourceLookup for EmbeddedScripts {
    fn get(&self, path: &str) -> Option<String> {
        self.entries.get(path).cloned()
    }
}

/// The configured script reference of a filter instance.
#[derive(Debug, Clone)]
pub struct ScriptSource {
    script_or_path: String,
}

impl ScriptSource {
    pub fn new(script_or_path: impl Into<String>) -> Self {
        Self {
            script_or_path: script_or_path.into(),
        }
    }

    /// Resolves the configured string into script text (UTF-8).
    ///
    /// A string that is not a readable path never errors here; it simply
    /// falls through to the next resolution step.
    pub fn read(&self, resources: &dyn ResourceLookup) -> Result<String, SourceError> {
        if Path::new(&self.script_or_path).is_file() {
            return Ok(fs::read_to_string(&self.script_or_path)?);
        }

        if let Some(path) = self.script_or_path.strip_prefix(EMBEDDED_PREFIX) {
            return resources
                .get(path)
                .ok_or_else(|| SourceError::NotFound(path.to_owned()));
        }

        Ok(self.script_or_path.clone())
    }
}
