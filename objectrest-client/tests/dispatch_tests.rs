//! Synchronous dispatch: URL derivation, headers, body envelope, faults and
//! pagination state, all through the public client surface.

mod common;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use common::*;
use http::Method;
use objectrest_client::{ApiClient, Credentials, Error, FaultKind, Poly, ResultLimit};
use serde_json::json;

#[test]
fn test_instance_required_method_fails_before_any_network_attempt() {
    let mock = MockTransport::new(200, "\"ok\"");
    let client = client_with(&mock);
    let handle = client.service(&WIDGET_SERVICE, None);

    let err = handle.invoke::<String>(&GET_OBJECT, vec![]).unwrap_err();
    assert!(matches!(err, Error::State(_)));
    assert_eq!(mock.call_count(), 0);
}

#[test]
fn test_get_object_on_bound_handle() {
    let mock = MockTransport::new(200, "\"some response\"");
    let client = client_with(&mock);
    let handle = client.service(&WIDGET_SERVICE, Some("7".to_owned()));

    let result: String = handle.invoke(&GET_OBJECT, vec![]).unwrap();
    assert_eq!(result, "some response");

    let request = mock.last_request();
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.url, "http://example.com/Test_Widget/7.json");
    assert!(request.body.is_none());
    assert!(request.headers.get("content-type").is_none());
}

#[test]
fn test_delete_object_uses_delete_verb() {
    let mock = MockTransport::new(200, "true");
    let client = client_with(&mock);
    let handle = client.service(&WIDGET_SERVICE, Some("9".to_owned()));

    let deleted: bool = handle.invoke(&DELETE_OBJECT, vec![]).unwrap();
    assert!(deleted);

    let request = mock.last_request();
    assert_eq!(request.method, Method::DELETE);
    assert_eq!(request.url, "http://example.com/Test_Widget/9.json");
}

#[test]
fn test_request_headers_and_parameter_envelope() {
    let mock = MockTransport::new(200, "\"ok\"");
    let client = ApiClient::builder("http://example.com/")
        .transport(Arc::new(mock.clone()))
        .credentials(Credentials::basic("user", "key"))
        .build()
        .unwrap();
    let handle = client.service(&WIDGET_SERVICE, None);

    let _: String = handle
        .invoke(&DO_SOMETHING, vec![json!(123), json!("abc")])
        .unwrap();

    let request = mock.last_request();
    assert_eq!(request.url, "http://example.com/Test_Widget/doSomething.json");
    assert_eq!(request.headers.get("x-include-types").unwrap(), "true");
    assert_eq!(
        request.headers.get("authorization").unwrap(),
        "Basic dXNlcjprZXk="
    );
    assert_eq!(
        request.headers.get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(
        request.body.as_deref(),
        Some(br#"{"parameters":[123,"abc"]}"#.as_slice())
    );
}

#[test]
fn test_bearer_credentials_header() {
    let mock = MockTransport::new(200, "\"ok\"");
    let client = ApiClient::builder("http://example.com/")
        .transport(Arc::new(mock.clone()))
        .bearer_token("abc123")
        .build()
        .unwrap();
    let handle = client.service(&WIDGET_SERVICE, None);

    let _: String = handle.invoke(&DO_SOMETHING, vec![]).unwrap();
    assert_eq!(
        mock.last_request().headers.get("authorization").unwrap(),
        "Bearer abc123"
    );
}

#[test]
fn test_tree_mask_renders_into_the_query() {
    let mock = MockTransport::new(200, "\"ok\"");
    let client = client_with(&mock);
    let mut handle = client.service(&WIDGET_SERVICE, None);

    // Two call sites composing through the same relation share one branch.
    handle.with_mask().property("foo").relation("child").property("date");
    handle.with_mask().relation("child").property("baz");

    let _: String = handle.invoke(&DO_SOMETHING, vec![]).unwrap();
    assert_eq!(
        mock.last_request().url,
        "http://example.com/Test_Widget/doSomething.json\
         ?objectMask=mask%5Bfoo%2Cchild%5Bdate%2Cbaz%5D%5D"
    );
}

#[test]
fn test_raw_mask_is_used_verbatim() {
    let mock = MockTransport::new(200, "\"ok\"");
    let client = client_with(&mock);
    let mut handle = client.service(&WIDGET_SERVICE, None);

    handle.set_mask_str("yay-a-mask");
    let _: String = handle.invoke(&DO_SOMETHING, vec![]).unwrap();
    assert_eq!(
        mock.last_request().url,
        "http://example.com/Test_Widget/doSomething.json?objectMask=yay-a-mask"
    );
}

#[test]
fn test_mask_substitution_is_last_write_wins() {
    let mock = MockTransport::new(200, "\"ok\"");
    let client = client_with(&mock);
    let mut handle = client.service(&WIDGET_SERVICE, None);

    handle.set_mask_str("raw-mask");
    handle.with_new_mask().property("id");
    let _: String = handle.invoke(&DO_SOMETHING, vec![]).unwrap();
    assert!(mock.last_request().url.ends_with("?objectMask=mask%5Bid%5D"));

    handle.set_mask_str("raw-mask");
    let _: String = handle.invoke(&DO_SOMETHING, vec![]).unwrap();
    assert!(mock.last_request().url.ends_with("?objectMask=raw-mask"));

    handle.clear_mask();
    let _: String = handle.invoke(&DO_SOMETHING, vec![]).unwrap();
    assert!(!mock.last_request().url.contains("objectMask"));
}

#[test]
fn test_result_limit_query() {
    let mock = MockTransport::new(200, "[]");
    let client = client_with(&mock);
    let mut handle = client.service(&WIDGET_SERVICE, None);

    handle.set_result_limit(Some(ResultLimit::with_offset(5, 6)));
    let _: Vec<i64> = handle.invoke(&GET_WIDGETS, vec![]).unwrap();
    assert_eq!(
        mock.last_request().url,
        "http://example.com/Test_Widget/Widgets.json?resultLimit=5,6"
    );
}

#[test]
fn test_total_count_updates_then_clears() {
    let mock = MockTransport::new(200, "[]");
    mock.push_response(CannedResponse::new(200, "[]").with_header("x-total-items", "250"));
    let client = client_with(&mock);
    let handle = client.service(&WIDGET_SERVICE, None);

    assert_eq!(handle.last_total_items(), None);

    let _: Vec<i64> = handle.invoke(&GET_WIDGETS, vec![]).unwrap();
    assert_eq!(handle.last_total_items(), Some(250));

    // The default response has no header: the count clears to absent.
    let _: Vec<i64> = handle.invoke(&GET_WIDGETS, vec![]).unwrap();
    assert_eq!(handle.last_total_items(), None);
}

#[test]
fn test_failed_call_leaves_total_count_unchanged() {
    let mock = MockTransport::new(200, "[]");
    mock.push_response(CannedResponse::new(200, "[]").with_header("x-total-items", "250"));
    mock.push_response(CannedResponse::new(404, r#"{"error":"gone","code":"GONE"}"#));
    let client = client_with(&mock);
    let handle = client.service(&WIDGET_SERVICE, None);

    let _: Vec<i64> = handle.invoke(&GET_WIDGETS, vec![]).unwrap();
    assert_eq!(handle.last_total_items(), Some(250));

    handle.invoke::<Vec<i64>>(&GET_WIDGETS, vec![]).unwrap_err();
    assert_eq!(handle.last_total_items(), Some(250));
}

#[test]
fn test_malformed_total_count_degrades_to_absent() {
    let mock = MockTransport::new(200, "[]");
    mock.push_response(
        CannedResponse::new(200, "[]").with_header("x-total-items", "not-a-number"),
    );
    let client = client_with(&mock);
    let handle = client.service(&WIDGET_SERVICE, None);

    let _: Vec<i64> = handle.invoke(&GET_WIDGETS, vec![]).unwrap();
    assert_eq!(handle.last_total_items(), None);
}

#[test]
fn test_fault_categorization_by_status() {
    let cases = [
        (400, FaultKind::BadRequest),
        (401, FaultKind::Unauthorized),
        (404, FaultKind::NotFound),
        (500, FaultKind::Internal),
        (503, FaultKind::Other),
        (418, FaultKind::Other),
    ];
    let mock = MockTransport::new(200, "\"unused\"");
    let client = client_with(&mock);
    let handle = client.service(&WIDGET_SERVICE, None);

    for (status, kind) in cases {
        mock.push_response(CannedResponse::new(
            status,
            r#"{"error":"Nope","code":"NOPE"}"#,
        ));
        let err = handle.invoke::<String>(&DO_SOMETHING, vec![]).unwrap_err();
        let fault = err.fault().expect("expected a fault");
        assert_eq!(fault.kind, kind, "status {status}");
        assert_eq!(fault.message, "Nope");
        assert_eq!(fault.code, "NOPE");
        assert_eq!(fault.status, status);
    }
}

#[test]
fn test_unreadable_fault_envelope_degrades_to_unknown_error() {
    let mock = MockTransport::new(500, "<html>oops</html>");
    let client = client_with(&mock);
    let handle = client.service(&WIDGET_SERVICE, None);

    let err = handle.invoke::<String>(&DO_SOMETHING, vec![]).unwrap_err();
    let fault = err.fault().unwrap();
    assert_eq!(fault.kind, FaultKind::Internal);
    assert_eq!(fault.message, "Unknown error");
    assert_eq!(fault.status, 500);
}

#[test]
fn test_malformed_success_body_is_a_codec_error() {
    let mock = MockTransport::new(200, "{not json");
    let client = client_with(&mock);
    let handle = client.service(&WIDGET_SERVICE, None);

    let err = handle.invoke::<String>(&DO_SOMETHING, vec![]).unwrap_err();
    assert!(matches!(err, Error::Codec(_)));
}

#[test]
fn test_polymorphic_entity_return_through_the_dispatcher() {
    let mock = MockTransport::new(
        200,
        r#"{"complexType":"Test_Widget_Special","name":"w","power":9}"#,
    );
    let client = client_with(&mock);
    let handle = client.service(&WIDGET_SERVICE, Some("1".to_owned()));

    let result: Poly<Widget> = handle.invoke(&GET_OBJECT, vec![]).unwrap();
    assert_eq!(result.tag(), "Test_Widget_Special");
    let special = result.downcast_ref::<SpecialWidget>().unwrap();
    assert_eq!(special.power, Some(9));
    assert_eq!(special.base.name.as_deref(), Some("w"));
}

#[test]
fn test_entity_parameter_is_encoded_with_its_tag_first() {
    let mock = MockTransport::new(200, "\"ok\"");
    let client = client_with(&mock);
    let handle = client.service(&WIDGET_SERVICE, None);

    let widget = Widget {
        name: Some("blah".to_owned()),
        ..Widget::default()
    };
    let _: String = handle
        .invoke(
            &DO_SOMETHING,
            vec![objectrest_core::codec::ToWire::to_wire(&widget).unwrap()],
        )
        .unwrap();

    let body = mock.last_request().body.unwrap();
    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        r#"{"parameters":[{"complexType":"Test_Widget","name":"blah"}]}"#
    );
}

#[test]
fn test_handle_equality_and_hashing() {
    let mock = MockTransport::new(200, "\"ok\"");
    let client = client_with(&mock);

    let unbound_a = client.service(&WIDGET_SERVICE, None);
    let unbound_b = client.service(&WIDGET_SERVICE, None);
    assert_eq!(unbound_a, unbound_b);

    let bound_a = client.service(&WIDGET_SERVICE, Some("7".to_owned()));
    let bound_b = client.service(&WIDGET_SERVICE, Some("7".to_owned()));
    assert_eq!(bound_a, bound_b);
    assert_ne!(unbound_a, bound_a);

    let hash = |handle: &objectrest_client::ServiceHandle| {
        let mut hasher = DefaultHasher::new();
        handle.hash(&mut hasher);
        hasher.finish()
    };
    assert_eq!(hash(&unbound_a), hash(&unbound_b));
    assert_eq!(hash(&bound_a), hash(&bound_b));
}

#[test]
fn test_handle_display_names_the_binding() {
    let mock = MockTransport::new(200, "\"ok\"");
    let client = client_with(&mock);

    let unbound = client.service(&WIDGET_SERVICE, None);
    assert_eq!(unbound.to_string(), "Service: Test_Widget");

    let bound = client.service(&WIDGET_SERVICE, Some("7".to_owned()));
    assert_eq!(bound.to_string(), "Service: Test_Widget with ID 7");
}
