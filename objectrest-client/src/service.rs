//! The service dispatcher handle.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, header};
use objectrest_core::codec::{self, FromWire};
use objectrest_core::{CodecError, Mask, MaskRef, MethodSpec, ServiceSpec};
use serde_json::Value;
use tracing::debug;

use crate::INCLUDE_TYPES_HEADER;
use crate::client::ClientInner;
use crate::dispatch::{self, AsyncServiceHandle};
use crate::error::Error;
use crate::pagination::ResultLimit;
use crate::transport::TransportRequest;
use crate::url::{self, UrlParts};

/// The current mask, tree or raw string — last write wins.
#[derive(Clone, Debug, Default)]
pub(crate) enum MaskState {
    #[default]
    None,
    Tree(Mask),
    Raw(String),
}

/// A dispatcher bound to a service type and an optional instance id.
///
/// Carries the per-call state every dispatch reads: mask, filter and
/// pagination window, plus the total-item count observed on the most
/// recently completed response.
///
/// A handle is not meant for concurrent calls: the pagination window and the
/// observed total are handle state, so concurrent paging takes one handle
/// per page (`clone` gives an independent handle with a fresh total).
/// When a handle is shared across concurrent calls anyway, whichever call
/// completes last overwrites the total; calls are not serialized.
pub struct ServiceHandle {
    pub(crate) client: Arc<ClientInner>,
    pub(crate) spec: &'static ServiceSpec,
    pub(crate) id: Option<String>,
    pub(crate) mask: MaskState,
    pub(crate) filter: Option<String>,
    pub(crate) result_limit: Option<ResultLimit>,
    pub(crate) last_total: Arc<Mutex<Option<u64>>>,
}

impl ServiceHandle {
    pub(crate) fn new(
        client: Arc<ClientInner>,
        spec: &'static ServiceSpec,
        id: Option<String>,
    ) -> Self {
        ServiceHandle {
            client,
            spec,
            id,
            mask: MaskState::None,
            filter: None,
            result_limit: None,
            last_total: Arc::new(Mutex::new(None)),
        }
    }

    /// The service descriptor this handle dispatches for.
    pub fn service_spec(&self) -> &'static ServiceSpec {
        self.spec
    }

    /// The bound instance id, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    // --- mask state -------------------------------------------------------

    /// Replace any existing mask with a fresh tree and return its root.
    pub fn with_new_mask(&mut self) -> MaskRef<'_> {
        self.mask = MaskState::Tree(Mask::new());
        self.tree_root()
    }

    /// Return the existing tree mask's root, creating the tree if the handle
    /// has no mask or carries a raw string.
    pub fn with_mask(&mut self) -> MaskRef<'_> {
        if !matches!(self.mask, MaskState::Tree(_)) {
            self.mask = MaskState::Tree(Mask::new());
        }
        self.tree_root()
    }

    fn tree_root(&mut self) -> MaskRef<'_> {
        match &mut self.mask {
            MaskState::Tree(mask) => mask.root(),
            _ => unreachable!("mask state was just set to a tree"),
        }
    }

    /// Substitute an externally built mask tree.
    pub fn set_mask(&mut self, mask: Mask) {
        self.mask = MaskState::Tree(mask);
    }

    /// Substitute a raw selector string, used verbatim as the query value.
    pub fn set_mask_str(&mut self, mask: impl Into<String>) {
        self.mask = MaskState::Raw(mask.into());
    }

    /// The current tree mask, if one is set.
    pub fn mask(&self) -> Option<&Mask> {
        match &self.mask {
            MaskState::Tree(mask) => Some(mask),
            _ => None,
        }
    }

    /// Remove the mask entirely.
    pub fn clear_mask(&mut self) {
        self.mask = MaskState::None;
    }

    // --- filter state -----------------------------------------------------

    /// Set the object filter, a peer-format JSON selector string.
    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = Some(filter.into());
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
    }

    // --- pagination state -------------------------------------------------

    /// Set the result window for subsequent calls.
    pub fn set_result_limit(&mut self, limit: Option<ResultLimit>) {
        self.result_limit = limit;
    }

    pub fn result_limit(&self) -> Option<ResultLimit> {
        self.result_limit
    }

    /// The peer's non-paginated total item count from the most recently
    /// completed response, absent when the peer did not report one.
    pub fn last_total_items(&self) -> Option<u64> {
        *dispatch::lock_total(&self.last_total)
    }

    // --- dispatch ---------------------------------------------------------

    /// Derive an async handle from this one.
    ///
    /// The derived handle is a snapshot: mask, filter and result limit are
    /// copied at derivation time, and it starts with no observed total.
    /// Later mutation of either handle does not affect the other.
    pub fn as_async(&self) -> AsyncServiceHandle {
        AsyncServiceHandle::new(self.clone())
    }

    /// Invoke a remote method synchronously, on the caller's thread.
    ///
    /// `params` are the already-encoded arguments in declaration order;
    /// generated code produces them with [`codec::ToWire`]. Exactly one
    /// HTTP round trip is performed.
    pub fn invoke<R: FromWire>(
        &self,
        method: &MethodSpec,
        params: Vec<Value>,
    ) -> Result<R, Error> {
        let request = self.prepare(method, params)?;
        self.client.runtime.block_on(dispatch::execute_call::<R>(
            Arc::clone(&self.client.transport),
            Arc::clone(&self.client.registry),
            request,
            Arc::clone(&self.last_total),
        ))
    }

    /// Validate preconditions and build the transport request. No I/O.
    pub(crate) fn prepare(
        &self,
        method: &MethodSpec,
        params: Vec<Value>,
    ) -> Result<TransportRequest, Error> {
        if method.instance_required && self.id.is_none() {
            return Err(Error::State(format!(
                "an instance id is required to invoke {}.{}",
                self.spec.name, method.name
            )));
        }

        let verb = url::http_method_for(method.name);
        let mask = self.mask_value();
        let request_url = url::build_url(
            &self.client.base_url,
            &UrlParts {
                service: self.spec.name,
                method: method.name,
                id: if method.instance_required {
                    self.id.as_deref()
                } else {
                    None
                },
                result_limit: self.result_limit,
                mask: mask.as_deref(),
                filter: self.filter.as_deref(),
            },
        );

        let body = if params.is_empty() {
            None
        } else {
            let envelope = codec::encode_request(params);
            let bytes = serde_json::to_vec(&envelope)
                .map_err(|e| CodecError::Encode(e.to_string()))?;
            Some(Bytes::from(bytes))
        };

        let mut headers = HeaderMap::new();
        headers.insert(INCLUDE_TYPES_HEADER, HeaderValue::from_static("true"));
        if let Some(credentials) = &self.client.credentials {
            let mut value = HeaderValue::from_str(&credentials.authorization())
                .map_err(|_| Error::State("credentials contain invalid header characters".into()))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        if body.is_some() {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        debug!(
            method = %verb,
            url = %request_url,
            has_body = body.is_some(),
            "sending api request"
        );

        Ok(TransportRequest {
            method: verb,
            url: request_url,
            headers,
            body,
        })
    }

    fn mask_value(&self) -> Option<String> {
        match &self.mask {
            MaskState::None => None,
            MaskState::Tree(mask) => Some(mask.to_query_value()),
            MaskState::Raw(raw) => Some(raw.clone()),
        }
    }
}

/// Clones carry the same binding and a copy of the mask/filter/pagination
/// state, but start with a fresh (absent) observed total: each handle's
/// total belongs to its own calls.
impl Clone for ServiceHandle {
    fn clone(&self) -> Self {
        ServiceHandle {
            client: Arc::clone(&self.client),
            spec: self.spec,
            id: self.id.clone(),
            mask: self.mask.clone(),
            filter: self.filter.clone(),
            result_limit: self.result_limit,
            last_total: Arc::new(Mutex::new(None)),
        }
    }
}

/// Two handles are equal when they dispatch for the same service type with
/// the same (possibly absent) instance id, regardless of mask or pagination
/// state.
impl PartialEq for ServiceHandle {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.spec, other.spec) && self.id == other.id
    }
}

impl Eq for ServiceHandle {}

impl Hash for ServiceHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.spec.name.hash(state);
        self.id.hash(state);
    }
}

impl fmt::Display for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "Service: {} with ID {}", self.spec.name, id),
            None => write!(f, "Service: {}", self.spec.name),
        }
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("service", &self.spec.name)
            .field("id", &self.id)
            .field("mask", &self.mask)
            .field("filter", &self.filter)
            .field("result_limit", &self.result_limit)
            .finish_non_exhaustive()
    }
}
