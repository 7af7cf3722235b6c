//! Per-request orchestration of the scripting filter.
//!
//! The engine builds a fresh facade and abort signal for each request,
//! runs the compiled script, validates that the script returned the same
//! facade it was given, and hands the mutated snapshot back to the
//! pipeline. Every failure collapses to an abort outcome; the script's own
//! aborts keep their chosen status and reason, everything else becomes a
//! 500 with a fixed generic reason and the original error as cause for
//! logging only.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use http::StatusCode;
use tracing::{debug, error};

use crate::config::FilterConfig;
use crate::error::{FilterError, ScriptError};
use crate::request::{GatewayRequest, RequestFacade};
use crate::script::{
    AbortSignal, CompiledScript, RhaiScriptHost, ScriptBindings, ScriptHost, ScriptValue,
};
use crate::source::{EmbeddedScripts, ResourceLookup, ScriptSource};

/// Abort reason when the script's terminal value is not the bound facade.
pub const INVALID_RESULT_REASON: &str = "The return object of the script is not valid";
/// Abort reason for any unexpected script failure.
pub const PROCESSING_ERROR_REASON: &str = "Error processing request";
/// Abort reason when the configured script cannot be read or compiled.
pub const SCRIPT_CONFIG_ERROR_REASON: &str = "Error obtaining script from configuration";

/// The single outcome of one filter invocation.
#[derive(Debug)]
pub enum Outcome {
    /// Pass the (possibly mutated) request to the next pipeline stage.
    Forward(GatewayRequest),
    /// Short-circuit the pipeline with an HTTP error. `cause` is for
    /// logging only and never leaks into the response.
    Abort {
        status: StatusCode,
        reason: String,
        cause: Option<Arc<FilterError>>,
    },
}

impl Outcome {
    fn abort(status: StatusCode, reason: impl Into<String>) -> Self {
        Outcome::Abort {
            status,
            reason: reason.into(),
            cause: None,
        }
    }

    fn abort_with_cause(
        status: StatusCode,
        reason: impl Into<String>,
        cause: Arc<FilterError>,
    ) -> Self {
        Outcome::Abort {
            status,
            reason: reason.into(),
            cause: Some(cause),
        }
    }
}

/// The downstream stage a forwarded request continues into.
#[async_trait]
pub trait FilterChain: Send + Sync {
    async fn proceed(&self, request: GatewayRequest) -> Outcome;
}

/// Factory contract the host gateway discovers filters by.
pub trait FilterFactory: Send + Sync {
    /// The filter's registered name.
    fn name(&self) -> &'static str;

    /// Returns a filter instance bound to `config`.
    fn create(&self, config: FilterConfig) -> ScriptingFilter;
}

/// A filter instance bound to one configuration.
///
/// The compiled script is a latched memo: the first request compiles,
/// concurrent first requests block on that single compilation, and the
/// result — success or failure — is sticky for the instance's lifetime.
pub struct ScriptingFilter {
    config: FilterConfig,
    host: Arc<dyn ScriptHost>,
    resources: Arc<dyn ResourceLookup>,
    compiled: OnceLock<std::result::Result<Arc<dyn CompiledScript>, Arc<FilterError>>>,
}

impl ScriptingFilter {
    pub fn new(
        config: FilterConfig,
        host: Arc<dyn ScriptHost>,
        resources: Arc<dyn ResourceLookup>,
    ) -> Self {
        Self {
            config,
            host,
            resources,
            compiled: OnceLock::new(),
        }
    }

    /// Runs the script against `request` and produces the filter outcome.
    pub async fn apply(&self, request: GatewayRequest) -> Outcome {
        let script = match self.compiled_script() {
            Ok(script) => script,
            Err(cause) => {
                error!(error = %cause, "failed to obtain compiled script");
                return Outcome::abort_with_cause(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    SCRIPT_CONFIG_ERROR_REASON,
                    cause,
                );
            }
        };

        let facade = RequestFacade::new(request);
        let bindings = ScriptBindings {
            request: facade.clone(),
            response: AbortSignal::new(),
        };

        match script.run(bindings) {
            Ok(ScriptValue::Request(returned)) if returned.is_same(&facade) => {
                Outcome::Forward(facade.snapshot())
            }
            Ok(ScriptValue::Request(_)) => {
                debug!("script returned a facade other than the bound request");
                Outcome::abort(StatusCode::INTERNAL_SERVER_ERROR, INVALID_RESULT_REASON)
            }
            Ok(ScriptValue::Other(type_name)) => {
                debug!(%type_name, "script returned a non-request value");
                Outcome::abort(StatusCode::INTERNAL_SERVER_ERROR, INVALID_RESULT_REASON)
            }
            Err(ScriptError::Abort(fault)) => {
                debug!(status = %fault.status, reason = %fault.reason, "script aborted request");
                Outcome::Abort {
                    status: fault.status,
                    reason: fault.reason,
                    cause: None,
                }
            }
            Err(err) => {
                error!(error = %err, "script execution failed");
                Outcome::abort_with_cause(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    PROCESSING_ERROR_REASON,
                    Arc::new(FilterError::Script(err)),
                )
            }
        }
    }

    /// Convenience wrapper continuing into `chain` on forward. Aborts
    /// short-circuit without touching the chain.
    pub async fn filter(&self, request: GatewayRequest, chain: &dyn FilterChain) -> Outcome {
        match self.apply(request).await {
            Outcome::Forward(mutated) => chain.proceed(mutated).await,
            abort => abort,
        }
    }

    fn compiled_script(
        &self,
    ) -> std::result::Result<Arc<dyn CompiledScript>, Arc<FilterError>> {
        self.compiled.get_or_init(|| self.compile()).clone()
    }

    fn compile(&self) -> std::result::Result<Arc<dyn CompiledScript>, Arc<FilterError>> {
        let text = ScriptSource::new(&self.config.script_or_path)
            .read(self.resources.as_ref())
            .map_err(|e| Arc::new(FilterError::Source(e)))?;
        self.host
            .compile(&text)
            .map_err(|e| Arc::new(FilterError::Script(e)))
    }
}

/// Factory for Rhai-backed scripting filters, registered as `"RhaiScripting"`.
///
/// One script host (and therefore one engine with all type registrations)
/// is shared by every filter instance the factory creates.
pub struct RhaiScriptingFilterFactory {
    host: Arc<dyn ScriptHost>,
    resources: Arc<dyn ResourceLookup>,
}

impl RhaiScriptingFilterFactory {
    pub fn new() -> Self {
        Self::with_resources(Arc::new(EmbeddedScripts::new()))
    }

    pub fn with_resources(resources: Arc<dyn ResourceLookup>) -> Self {
        Self {
            host: Arc::new(RhaiScriptHost::new()),
            resources,
        }
    }
}

impl Default for RhaiScriptingFilterFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterFactory for RhaiScriptingFilterFactory {
    fn name(&self) -> &'static str {
        "RhaiScripting"
    }

    fn create(&self, config: FilterConfig) -> ScriptingFilter {
        ScriptingFilter::new(
            config,
            Arc::clone(&self.host),
            Arc::clone(&self.resources),
        )
    }
}
