//! Filter configuration as received from the host gateway.

use serde::{Deserialize, Serialize};

/// Configuration for a scripting filter instance.
///
/// The single field is interpreted by [`crate::source::ScriptSource`]: an
/// existing file path, a `classpath:`-prefixed embedded resource name, or
/// the inline script body itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    /// Path of the script to load, or its content.
    pub script_or_path: String,
}

impl FilterConfig {
    pub fn new(script_or_path: impl Into<String>) -> Self {
        Self {
            script_or_path: script_or_path.into(),
        }
    }
}
