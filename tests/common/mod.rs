//! Shared fixtures for the end-to-end filter tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use http::header::{HeaderName, HeaderValue};
use http::Method;
use serde_json::{json, Value};
use url::Url;

use rhai_scripting_filter::config::FilterConfig;
use rhai_scripting_filter::filter::{
    FilterChain, FilterFactory, Outcome, RhaiScriptingFilterFactory,
};
use rhai_scripting_filter::request::GatewayRequest;

pub fn get(url: &str) -> GatewayRequest {
    GatewayRequest::new(Method::GET, Url::parse(url).unwrap())
}

pub fn with_header(request: GatewayRequest, name: &str, value: &str) -> GatewayRequest {
    request.with_header(
        HeaderName::from_bytes(name.as_bytes()).unwrap(),
        HeaderValue::from_str(value).unwrap(),
    )
}

/// Mints an unsigned-but-well-formed JWT around the given payload. The
/// filter never verifies signatures, so a fixed dummy segment suffices.
pub fn mint_token(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.c2lnbmF0dXJl")
}

/// The claims fixture shared by the claims scenarios.
pub fn test_token() -> String {
    mint_token(&json!({
        "sub": "test",
        "user_context": {
            "id": "user-123",
            "profile": {"theme": "dark", "language": "es"},
            "groups": ["admin", "editor"]
        },
        "metadata": {"version": "1.0"}
    }))
}

pub async fn run_script(script: &str, request: GatewayRequest) -> Outcome {
    let factory = RhaiScriptingFilterFactory::new();
    let filter = factory.create(FilterConfig::new(script));
    filter.apply(request).await
}

pub fn forwarded(outcome: Outcome) -> GatewayRequest {
    match outcome {
        Outcome::Forward(request) => request,
        other => panic!("expected forward, got {other:?}"),
    }
}

/// Chain spy recording whether and with what it was invoked.
#[derive(Default)]
pub struct RecordingChain {
    invoked: AtomicBool,
    seen: Mutex<Option<GatewayRequest>>,
}

impl RecordingChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn was_invoked(&self) -> bool {
        self.invoked.load(Ordering::SeqCst)
    }

    pub fn seen_request(&self) -> Option<GatewayRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl FilterChain for RecordingChain {
    async fn proceed(&self, request: GatewayRequest) -> Outcome {
        self.invoked.store(true, Ordering::SeqCst);
        *self.seen.lock().unwrap() = Some(request.clone());
        Outcome::Forward(request)
    }
}
