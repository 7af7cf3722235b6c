//! The scripting host abstraction.
//!
//! A [`ScriptHost`] compiles script source once; the resulting
//! [`CompiledScript`] is executed per request with fresh bindings. The host
//! guarantees `run` is synchronous and that per-run state (scope, stack) is
//! isolated per call, so one compiled script can serve concurrent requests.
//!
//! Scripts see three top-level names: `request` (the facade), `response`
//! (the abort signal) and `logger`.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::ScriptError;
use crate::request::RequestFacade;

mod bindings;
mod rhai_host;

pub use rhai_host::RhaiScriptHost;

/// Compiles script source into an executable form.
pub trait ScriptHost: Send + Sync {
    fn compile(&self, source: &str) -> Result<Arc<dyn CompiledScript>, ScriptError>;
}

/// A script compiled once and runnable many times.
pub trait CompiledScript: Send + Sync + std::fmt::Debug {
    /// Executes the script with the given bindings and returns its terminal
    /// value. An abort raised through the response binding surfaces as
    /// [`ScriptError::Abort`]; any other failure as [`ScriptError::Runtime`].
    fn run(&self, bindings: ScriptBindings) -> Result<ScriptValue, ScriptError>;
}

/// The per-request objects bound into a script run.
pub struct ScriptBindings {
    /// Bound as `request`.
    pub request: RequestFacade,
    /// Bound as `response`.
    pub response: AbortSignal,
}

/// The terminal value of a script run, as seen by the filter engine.
#[derive(Debug, Clone)]
pub enum ScriptValue {
    /// The script returned a request facade.
    Request(RequestFacade),
    /// The script returned something else; carries the value's type name
    /// for diagnostics.
    Other(String),
}

/// Script-visible object that short-circuits the pipeline.
///
/// Invoking `consume(code, reason)` from a script raises a typed
/// [`crate::error::AbortFault`] that terminates execution and is preserved
/// verbatim across the host boundary.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal;

impl AbortSignal {
    pub fn new() -> Self {
        Self
    }
}

/// Script-visible logger forwarding to `tracing` under the `script` target.
#[derive(Debug, Clone, Default)]
pub struct ScriptLogger;

impl ScriptLogger {
    pub fn info(&self, message: &str) {
        info!(target: "script", "{message}");
    }

    pub fn debug(&self, message: &str) {
        debug!(target: "script", "{message}");
    }

    pub fn warn(&self, message: &str) {
        warn!(target: "script", "{message}");
    }

    pub fn error(&self, message: &str) {
        error!(target: "script", "{message}");
    }

    pub fn info_with(&self, message: &str, detail: &str) {
        info!(target: "script", detail, "{message}");
    }

    pub fn debug_with(&self, message: &str, detail: &str) {
        debug!(target: "script", detail, "{message}");
    }

    pub fn warn_with(&self, message: &str, detail: &str) {
        warn!(target: "script", detail, "{message}");
    }

    pub fn error_with(&self, message: &str, detail: &str) {
        error!(target: "script", detail, "{message}");
    }
}
