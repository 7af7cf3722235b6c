//! Scriptable request-mutation filter for HTTP API gateways.
//!
//! For each inbound request matched by a route, the filter loads a
//! user-supplied Rhai script, executes it with a restricted view of the
//! request, and either forwards a mutated request to the next stage of the
//! pipeline or short-circuits with a script-chosen HTTP error.
//!
//! Scripts receive three bindings: `request` (headers, query parameters and
//! bearer-token claims), `response` (the abort signal) and `logger`. The
//! script must return the `request` binding for the pipeline to continue:
//!
//! ```text
//! if request.get_header("Authorization") == () {
//!     response.consume(401, "Unauthorized");
//! }
//! if request.get_claim("user_context.groups.0") == "admin" {
//!     request.set_header("X-Admin", "true");
//! }
//! request
//! ```
//!
//! # Modules
//!
//! - `claims`: JWT payload decoding and dotted-path claim navigation
//! - `request`: immutable request model and the script-facing facade
//! - `script`: the scripting host contract and its Rhai implementation
//! - `source`: resolution of configured script text (file / embedded / inline)
//! - `filter`: per-request orchestration and the gateway factory contract

pub mod claims;
pub mod config;
pub mod error;
pub mod filter;
pub mod request;
pub mod script;
pub mod source;
