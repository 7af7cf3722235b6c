//! End-to-end header mutation scenarios, driven through the filter factory.

mod common;

use common::{forwarded, get, run_script, with_header};

#[tokio::test]
async fn add_header() {
    let script = r#"
        request.set_header("X-TestHeader", "A");
        request
    "#;

    let result = forwarded(run_script(script, get("http://upstream/api/test")).await);

    assert_eq!(result.header("X-TestHeader"), Some(vec!["A".into()]));
}

#[tokio::test]
async fn add_multi_valued_header() {
    let script = r#"
        request.set_header("X-TestHeader", "A", "B", "C");
        request
    "#;

    let result = forwarded(run_script(script, get("http://upstream/api/test")).await);

    assert_eq!(
        result.header("X-TestHeader"),
        Some(vec!["A".into(), "B".into(), "C".into()])
    );
}

#[tokio::test]
async fn set_header_overwrites_existing_value() {
    let script = r#"
        request.set_header("X-TestHeader", "B");
        request
    "#;
    let request = with_header(get("http://upstream/api/test"), "X-TestHeader", "A");

    let result = forwarded(run_script(script, request).await);

    assert_eq!(result.header("X-TestHeader"), Some(vec!["B".into()]));
}

#[tokio::test]
async fn set_multi_valued_header_replaces_all_values_and_keeps_others() {
    let script = r#"
        request.set_header("X-TestHeader", "D", "E", "F");
        request
    "#;
    let mut request = with_header(get("http://upstream/api/test"), "X-TestHeader", "A");
    request = with_header(request, "X-OldHeader-A", "A");
    request = with_header(request, "X-OldHeader-B", "A");
    request = with_header(request, "X-OldHeader-B", "B");
    request = with_header(request, "X-OldHeader-B", "C");

    let result = forwarded(run_script(script, request).await);

    assert_eq!(
        result.header("X-TestHeader"),
        Some(vec!["D".into(), "E".into(), "F".into()])
    );
    assert_eq!(result.header("X-OldHeader-A"), Some(vec!["A".into()]));
    assert_eq!(
        result.header("X-OldHeader-B"),
        Some(vec!["A".into(), "B".into(), "C".into()])
    );
}

#[tokio::test]
async fn set_header_accepts_an_array_of_values() {
    let script = r#"
        request.set_header("X-TestHeader", ["D", "E", "F"]);
        request
    "#;

    let result = forwarded(run_script(script, get("http://upstream/api/test")).await);

    assert_eq!(
        result.header("X-TestHeader"),
        Some(vec!["D".into(), "E".into(), "F".into()])
    );
}

#[tokio::test]
async fn remove_header() {
    let script = r#"
        request.remove_header("X-TestHeader");
        request
    "#;
    let mut request = with_header(get("http://upstream/api/test"), "X-TestHeader", "A");
    request = with_header(request, "X-KeptHeader", "B");

    let result = forwarded(run_script(script, request).await);

    assert_eq!(result.header("X-TestHeader"), None);
    assert_eq!(result.header("X-KeptHeader"), Some(vec!["B".into()]));
}

#[tokio::test]
async fn scripts_observe_previous_mutations() {
    let script = r#"
        request.set_header("X-TestHeader", "A");
        if request.get_first_header("X-TestHeader") == "A" {
            request.set_header("X-Result", "OK");
        }
        request
    "#;

    let result = forwarded(run_script(script, get("http://upstream/api/test")).await);

    assert_eq!(result.header("X-Result"), Some(vec!["OK".into()]));
}

#[tokio::test]
async fn full_header_view_is_exposed() {
    let script = r#"
        let headers = request.get_headers();
        if headers["x-testheader"] == ["A", "B"] {
            request.set_header("X-Result", "OK");
        }
        request
    "#;
    let mut request = with_header(get("http://upstream/api/test"), "X-TestHeader", "A");
    request = with_header(request, "X-TestHeader", "B");

    let result = forwarded(run_script(script, request).await);

    assert_eq!(result.header("X-Result"), Some(vec!["OK".into()]));
}
