//! [`ScriptHost`] implementation backed by the Rhai engine.
//!
//! One `Engine` carries all type registrations and is shared by every
//! compiled script; each run gets a fresh `Scope`, so per-run state is
//! fully isolated and `run` is safe to call from any worker thread.

use std::sync::Arc;

use rhai::{Dynamic, Engine, EvalAltResult, Scope, AST};

use super::{bindings, CompiledScript, ScriptBindings, ScriptHost, ScriptLogger, ScriptValue};
use crate::error::{AbortFault, ScriptError};
use crate::request::RequestFacade;

pub struct RhaiScriptHost {
    engine: Arc<Engine>,
}

impl RhaiScriptHost {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        bindings::register(&mut engine);
        Self {
            engine: Arc::new(engine),
        }
    }
}

impl Default for RhaiScriptHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptHost for RhaiScriptHost {
    fn compile(&self, source: &str) -> Result<Arc<dyn CompiledScript>, ScriptError> {
        let ast = self
            .engine
            .compile(source)
            .map_err(|e| ScriptError::Compile(e.to_string()))?;
        Ok(Arc::new(CompiledRhaiScript {
            engine: Arc::clone(&self.engine),
            ast,
        }))
    }
}

struct CompiledRhaiScript {
    engine: Arc<Engine>,
    ast: AST,
}

impl std::fmt::Debug for CompiledRhaiScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledRhaiScript").finish_non_exhaustive()
    }
}

impl CompiledScript for CompiledRhaiScript {
    fn run(&self, bindings: ScriptBindings) -> Result<ScriptValue, ScriptError> {
        let mut scope = Scope::new();
        scope.push("request", bindings.request);
        scope.push("response", bindings.response);
        scope.push("logger", ScriptLogger::default());

        match self.engine.eval_ast_with_scope::<Dynamic>(&mut scope, &self.ast) {
            Ok(value) => {
                let type_name = value.type_name();
                match value.try_cast::<RequestFacade>() {
                    Some(facade) => Ok(ScriptValue::Request(facade)),
                    None => Ok(ScriptValue::Other(type_name.to_owned())),
                }
            }
            Err(err) => Err(translate(&err)),
        }
    }
}

fn translate(err: &EvalAltResult) -> ScriptError {
    match extract_abort(err) {
        Some(fault) => ScriptError::Abort(fault),
        None => ScriptError::Runtime(err.to_string()),
    }
}

/// Digs the typed abort payload out of the engine error, if present.
/// Rhai wraps errors raised inside native functions in
/// `ErrorInFunctionCall`, so the chain is walked to the innermost cause.
fn extract_abort(err: &EvalAltResult) -> Option<AbortFault> {
    match err {
        EvalAltResult::ErrorRuntime(payload, _) => payload.clone().try_cast::<AbortFault>(),
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => extract_abort(inner),
        _ => None,
    }
}
