//! The restricted mutable view of a request handed to scripts.

use std::sync::{Arc, Mutex, MutexGuard};

use http::header::AUTHORIZATION;
use serde_json::{Map, Value};
use tracing::debug;

use super::{GatewayRequest, RequestError};
use crate::claims;

/// Mutable, copy-on-write view of an immutable request, exposing only
/// headers, query parameters and bearer-token claims.
///
/// The facade is a cheap cloneable handle: clones share state, and
/// [`RequestFacade::is_same`] compares that shared identity. This is what
/// lets a script receive the facade under a binding name, mutate it, and
/// return it as its terminal value while the engine still recognizes it.
///
/// Each mutation rebuilds the underlying request and swaps the reference;
/// the handle itself is stable for the lifetime of one filter invocation
/// and must not be shared across requests.
#[derive(Debug, Clone)]
pub struct RequestFacade {
    inner: Arc<Mutex<FacadeState>>,
}

#[derive(Debug)]
struct FacadeState {
    request: GatewayRequest,
    /// Claims parsed from the `Authorization` header. `None` until first
    /// read, and reset whenever that header is mutated. Always a JSON
    /// object once populated (empty on parse failure or missing bearer).
    claims: Option<Value>,
}

impl RequestFacade {
    pub fn new(request: GatewayRequest) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FacadeState {
                request,
                claims: None,
            })),
        }
    }

    /// Whether `other` is a handle to this same facade.
    pub fn is_same(&self, other: &RequestFacade) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The facade's current underlying request.
    pub fn snapshot(&self) -> GatewayRequest {
        self.state().request.clone()
    }

    pub fn headers(&self) -> Vec<(String, Vec<String>)> {
        self.state().request.header_multimap()
    }

    pub fn header(&self, name: &str) -> Option<Vec<String>> {
        self.state().request.header(name)
    }

    pub fn first_header(&self, name: &str) -> Option<String> {
        self.state().request.first_header(name)
    }

    /// Replaces all values of `name` with the given ordered list.
    pub fn set_header(&self, name: &str, values: &[String]) -> Result<(), RequestError> {
        if values.is_empty() {
            return Err(RequestError::MissingValues(name.to_owned()));
        }
        let mut state = self.state();
        state.request = state.request.set_header(name, values)?;
        if name.eq_ignore_ascii_case(AUTHORIZATION.as_str()) {
            state.claims = None;
        }
        Ok(())
    }

    pub fn remove_header(&self, name: &str) {
        let mut state = self.state();
        state.request = state.request.remove_header(name);
        if name.eq_ignore_ascii_case(AUTHORIZATION.as_str()) {
            state.claims = None;
        }
    }

    pub fn query_params(&self) -> Vec<(String, Vec<String>)> {
        self.state().request.query_multimap()
    }

    pub fn query_param(&self, name: &str) -> Option<Vec<String>> {
        self.state().request.query_param(name)
    }

    pub fn first_query_param(&self, name: &str) -> Option<String> {
        self.state().request.first_query_param(name)
    }

    /// Replaces all values of the query parameter `name`.
    pub fn set_query_param(&self, name: &str, values: &[String]) -> Result<(), RequestError> {
        if values.is_empty() {
            return Err(RequestError::MissingValues(name.to_owned()));
        }
        let mut state = self.state();
        state.request = state.request.set_query_param(name, values);
        Ok(())
    }

    pub fn remove_query_param(&self, name: &str) {
        let mut state = self.state();
        state.request = state.request.remove_query_param(name);
    }

    /// All claims from the bearer token, parsed lazily on first call and
    /// cached. A missing or non-`Bearer` `Authorization` header and a
    /// malformed token all yield an empty map.
    pub fn claims(&self) -> Map<String, Value> {
        let mut state = self.state();
        state.load_claims();
        state
            .claims
            .as_ref()
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    /// A single claim navigated by dotted path. The empty path returns the
    /// whole claims object.
    pub fn claim(&self, path: &str) -> Option<Value> {
        let mut state = self.state();
        state.load_claims();
        let root = state.claims.as_ref()?;
        claims::resolve(root, path).cloned()
    }

    fn state(&self) -> MutexGuard<'_, FacadeState> {
        self.inner.lock().expect("request facade lock poisoned")
    }
}

impl FacadeState {
    fn load_claims(&mut self) {
        if self.claims.is_some() {
            return;
        }

        let auth = self.request.first_header(AUTHORIZATION.as_str());
        // The scheme is case-sensitive with exactly one space before the token.
        let map = match auth.as_deref().and_then(|v| v.strip_prefix("Bearer ")) {
            Some(token) => match claims::parse_token(token) {
                Ok(map) => map,
                Err(error) => {
                    debug!(%error, "unable to read claims from authorization header");
                    Map::new()
                }
            },
            None => Map::new(),
        };

        self.claims = Some(Value::Object(map));
    }
}
