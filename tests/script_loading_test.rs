//! Script resolution through the factory: file, embedded resource, inline.

mod common;

use std::io::Write;
use std::sync::Arc;

use common::{forwarded, get};
use http::StatusCode;
use rhai_scripting_filter::config::FilterConfig;
use rhai_scripting_filter::filter::{
    FilterFactory, Outcome, RhaiScriptingFilterFactory, SCRIPT_CONFIG_ERROR_REASON,
};
use rhai_scripting_filter::source::EmbeddedScripts;

const MARKER_SCRIPT: &str = r#"request.set_header("X-Loaded-From", "script"); request"#;

#[tokio::test]
async fn script_is_loaded_from_an_existing_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".rhai")
        .tempfile()
        .unwrap();
    write!(file, "{MARKER_SCRIPT}").unwrap();

    let factory = RhaiScriptingFilterFactory::new();
    let filter = factory.create(FilterConfig::new(file.path().to_string_lossy()));

    let result = forwarded(filter.apply(get("http://upstream/api/test")).await);
    assert_eq!(result.header("X-Loaded-From"), Some(vec!["script".into()]));
}

#[tokio::test]
async fn script_is_loaded_from_the_embedded_bundle() {
    let mut bundle = EmbeddedScripts::new();
    bundle.insert("filters/mark.rhai", MARKER_SCRIPT);

    let factory = RhaiScriptingFilterFactory::with_resources(Arc::new(bundle));
    let filter = factory.create(FilterConfig::new("classpath:filters/mark.rhai"));

    let result = forwarded(filter.apply(get("http://upstream/api/test")).await);
    assert_eq!(result.header("X-Loaded-From"), Some(vec!["script".into()]));
}

#[tokio::test]
async fn inline_script_body_is_used_as_is() {
    let factory = RhaiScriptingFilterFactory::new();
    let filter = factory.create(FilterConfig::new(MARKER_SCRIPT));

    let result = forwarded(filter.apply(get("http://upstream/api/test")).await);
    assert_eq!(result.header("X-Loaded-From"), Some(vec!["script".into()]));
}

#[tokio::test]
async fn missing_embedded_resource_aborts_every_request() {
    let factory = RhaiScriptingFilterFactory::new();
    let filter = factory.create(FilterConfig::new("classpath:filters/missing.rhai"));

    for _ in 0..2 {
        match filter.apply(get("http://upstream/api/test")).await {
            Outcome::Abort { status, reason, cause } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(reason, SCRIPT_CONFIG_ERROR_REASON);
                assert!(cause.is_some());
            }
            other => panic!("expected abort, got {other:?}"),
        }
    }
}
