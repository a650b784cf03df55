//! Shared test support: a recording transport and generated-shaped fixtures.

#![allow(dead_code)]

use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::FutureExt;
use futures::future::BoxFuture;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use objectrest_client::{
    ApiClient, Error, Transport, TransportRequest, TransportResponse,
};
use objectrest_core::codec::{self, FromWire, ToWire};
use objectrest_core::{
    ApiType, CodecError, JsonMap, MethodSpec, NullableOption, ServiceSpec, TypeRegistry, TypeSpec,
    TypedEntity, UnknownFields,
};
use serde_json::Value;

/// One canned HTTP response.
#[derive(Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

impl CannedResponse {
    pub fn new(status: u16, body: &str) -> Self {
        CannedResponse {
            status,
            headers: Vec::new(),
            body: body.to_owned(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

/// Records every request and answers from a queue, falling back to a default
/// response once the queue drains.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

struct MockInner {
    default_response: CannedResponse,
    queue: Mutex<VecDeque<CannedResponse>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    pub fn new(status: u16, body: &str) -> Self {
        Self::with_response(CannedResponse::new(status, body))
    }

    pub fn with_response(default_response: CannedResponse) -> Self {
        MockTransport {
            inner: Arc::new(MockInner {
                default_response,
                queue: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn push_response(&self, response: CannedResponse) {
        self.inner.queue.lock().unwrap().push_back(response);
    }

    pub fn call_count(&self) -> usize {
        self.inner.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.inner.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> TransportRequest {
        self.inner
            .requests
            .lock()
            .unwrap()
            .last()
            .expect("no request was made")
            .clone()
    }
}

impl Transport for MockTransport {
    fn round_trip(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'static, Result<TransportResponse, Error>> {
        self.inner.requests.lock().unwrap().push(request);
        let canned = self
            .inner
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.inner.default_response.clone());

        let mut headers = HeaderMap::new();
        for &(name, ref value) in &canned.headers {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        let response = TransportResponse {
            status: StatusCode::from_u16(canned.status).unwrap(),
            headers,
            body: Bytes::from(canned.body),
        };
        futures::future::ready(Ok(response)).boxed()
    }
}

/// Wraps a [`MockTransport`] and delays every response.
#[derive(Clone)]
pub struct SlowTransport {
    pub delay: std::time::Duration,
    pub inner: MockTransport,
}

impl Transport for SlowTransport {
    fn round_trip(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'static, Result<TransportResponse, Error>> {
        let delay = self.delay;
        let response = self.inner.round_trip(request);
        async move {
            tokio::time::sleep(delay).await;
            response.await
        }
        .boxed()
    }
}

// --- generated-shaped fixtures --------------------------------------------

pub static WIDGET_SERVICE: ServiceSpec = ServiceSpec {
    name: "Test_Widget",
};

pub static GET_OBJECT: MethodSpec = MethodSpec {
    name: "getObject",
    instance_required: true,
};

pub static DELETE_OBJECT: MethodSpec = MethodSpec {
    name: "deleteObject",
    instance_required: true,
};

pub static DO_SOMETHING: MethodSpec = MethodSpec {
    name: "doSomething",
    instance_required: false,
};

pub static GET_WIDGETS: MethodSpec = MethodSpec {
    name: "getWidgets",
    instance_required: false,
};

#[derive(Debug, Default)]
pub struct Widget {
    pub id: NullableOption<i64>,
    pub name: Option<String>,
    pub unknown: UnknownFields,
}

pub static WIDGET_SPEC: TypeSpec = TypeSpec {
    tag: "Test_Widget",
    parent: None,
    construct: || Box::new(Widget::default()),
};

impl ApiType for Widget {
    fn type_spec(&self) -> &'static TypeSpec {
        &WIDGET_SPEC
    }

    fn encode_fields(&self, out: &mut JsonMap) -> Result<(), CodecError> {
        codec::write_nullable(out, "id", &self.id)?;
        codec::write_field(out, "name", &self.name)?;
        Ok(())
    }

    fn decode_field(
        &mut self,
        name: &str,
        value: Value,
        registry: &TypeRegistry,
    ) -> Result<Option<Value>, CodecError> {
        match name {
            "id" => self.id = FromWire::from_wire(value, registry)?,
            "name" => self.name = FromWire::from_wire(value, registry)?,
            _ => return Ok(Some(value)),
        }
        Ok(None)
    }

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }

    fn unknown_fields_mut(&mut self) -> &mut UnknownFields {
        &mut self.unknown
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl TypedEntity for Widget {
    fn spec() -> &'static TypeSpec {
        &WIDGET_SPEC
    }
}

impl FromWire for Widget {
    fn from_wire(value: Value, registry: &TypeRegistry) -> Result<Self, CodecError> {
        codec::decode_exact(value, registry)
    }
}

impl ToWire for Widget {
    fn to_wire(&self) -> Result<Value, CodecError> {
        codec::encode_entity(self)
    }
}

/// Subtype of [`Widget`].
#[derive(Debug, Default)]
pub struct SpecialWidget {
    pub base: Widget,
    pub power: Option<i64>,
}

pub static SPECIAL_WIDGET_SPEC: TypeSpec = TypeSpec {
    tag: "Test_Widget_Special",
    parent: Some(&WIDGET_SPEC),
    construct: || Box::new(SpecialWidget::default()),
};

impl ApiType for SpecialWidget {
    fn type_spec(&self) -> &'static TypeSpec {
        &SPECIAL_WIDGET_SPEC
    }

    fn encode_fields(&self, out: &mut JsonMap) -> Result<(), CodecError> {
        self.base.encode_fields(out)?;
        codec::write_field(out, "power", &self.power)?;
        Ok(())
    }

    fn decode_field(
        &mut self,
        name: &str,
        value: Value,
        registry: &TypeRegistry,
    ) -> Result<Option<Value>, CodecError> {
        match name {
            "power" => {
                self.power = FromWire::from_wire(value, registry)?;
                Ok(None)
            }
            _ => self.base.decode_field(name, value, registry),
        }
    }

    fn unknown_fields(&self) -> &UnknownFields {
        self.base.unknown_fields()
    }

    fn unknown_fields_mut(&mut self) -> &mut UnknownFields {
        self.base.unknown_fields_mut()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl TypedEntity for SpecialWidget {
    fn spec() -> &'static TypeSpec {
        &SPECIAL_WIDGET_SPEC
    }
}

/// A client wired to the given mock, with the widget types registered.
pub fn client_with(mock: &MockTransport) -> ApiClient {
    ApiClient::builder("http://example.com/")
        .transport(Arc::new(mock.clone()))
        .types(&[&WIDGET_SPEC, &SPECIAL_WIDGET_SPEC])
        .build()
        .expect("client should build")
}
