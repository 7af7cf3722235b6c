use http::StatusCode;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Script source error: {0}")]
    Source(#[from] SourceError),

    #[error("Script error: {0}")]
    Script(#[from] ScriptError),
}

/// Failures resolving the configured script text.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Embedded script resource not found: {0}")]
    NotFound(String),

    #[error("Failed to read script file: {0}")]
    Io(#[from] io::Error),
}

/// Failures crossing the script-host boundary.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Compilation failed: {0}")]
    Compile(String),

    /// The script deliberately short-circuited the pipeline.
    #[error(transparent)]
    Abort(#[from] AbortFault),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

#[derive(Error, Debug)]
pub enum ClaimsError {
    #[error("Malformed bearer token: {0}")]
    MalformedToken(String),
}

/// Structured failure raised when a script invokes `response.consume(code, reason)`.
///
/// Cloneable so it can travel through the scripting engine as a typed
/// error payload and be recognized intact at the engine boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Script aborted with status {status}: {reason}")]
pub struct AbortFault {
    pub status: StatusCode,
    pub reason: String,
}

pub type Result<T> = std::result::Result<T, FilterError>;
