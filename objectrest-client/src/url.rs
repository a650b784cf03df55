//! Verb and URL derivation.
//!
//! The peer maps remote method names onto REST verbs and path segments by
//! convention: a handful of canonical lifecycle names ride on the service
//! path itself, `getXxx` accessors contribute their property name, and
//! everything else contributes the method name verbatim.

use http::Method;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::pagination::ResultLimit;

/// Query-component encoding: RFC 3986 unreserved characters stay literal,
/// everything else is percent-escaped.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Canonical lifecycle methods that add no path segment of their own.
const IMPLICIT_METHODS: [&str; 6] = [
    "getObject",
    "deleteObject",
    "createObject",
    "createObjects",
    "editObject",
    "editObjects",
];

/// The canonical self-getter, excluded from `getXxx` stripping.
const SELF_GETTER: &str = "getObject";

/// Derive the HTTP verb from the remote method name.
pub(crate) fn http_method_for(method_name: &str) -> Method {
    match method_name {
        "deleteObject" => Method::DELETE,
        "createObject" | "createObjects" => Method::POST,
        "editObject" | "editObjects" => Method::PUT,
        _ => Method::GET,
    }
}

pub(crate) struct UrlParts<'a> {
    pub service: &'a str,
    pub method: &'a str,
    pub id: Option<&'a str>,
    pub result_limit: Option<ResultLimit>,
    pub mask: Option<&'a str>,
    pub filter: Option<&'a str>,
}

/// Build the full request URL.
///
/// `base_url` must end with a slash. Shape:
/// `<base><Service>[/<id>][/<segment>].json[?resultLimit=O,L][&objectMask=…][&objectFilter=…]`
pub(crate) fn build_url(base_url: &str, parts: &UrlParts<'_>) -> String {
    let mut url = String::with_capacity(base_url.len() + 64);
    url.push_str(base_url);
    url.push_str(parts.service);
    if let Some(id) = parts.id {
        url.push('/');
        url.push_str(id);
    }
    if let Some(property) = parts.method.strip_prefix("get")
        && parts.method != SELF_GETTER
    {
        url.push('/');
        url.push_str(property);
    } else if !IMPLICIT_METHODS.contains(&parts.method) {
        url.push('/');
        url.push_str(parts.method);
    }
    url.push_str(".json");

    let mut separator = '?';
    if let Some(limit) = parts.result_limit {
        url.push(separator);
        url.push_str(&format!("resultLimit={},{}", limit.offset, limit.limit));
        separator = '&';
    }
    if let Some(mask) = parts.mask
        && !mask.is_empty()
    {
        url.push(separator);
        url.push_str("objectMask=");
        url.extend(utf8_percent_encode(mask, QUERY_COMPONENT));
        separator = '&';
    }
    if let Some(filter) = parts.filter
        && !filter.is_empty()
    {
        url.push(separator);
        url.push_str("objectFilter=");
        url.extend(utf8_percent_encode(filter, QUERY_COMPONENT));
    }
    url
}
