//! Shared execution core and the async invocation shapes.
//!
//! All three invocation shapes — sync, future, callback — run the same
//! [`execute_call`] future: one transport round trip, total-count capture,
//! fault classification, body decode. The shapes differ only in where that
//! future is driven and how its outcome is delivered.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use objectrest_core::codec::FromWire;
use objectrest_core::{CodecError, Fault, Mask, MaskRef, MethodSpec, TypeRegistry};
use serde::Deserialize;
use serde_json::Value;
use tokio::task::{JoinError, JoinHandle};
use tracing::debug;

use crate::TOTAL_ITEMS_HEADER;
use crate::client::ClientInner;
use crate::error::Error;
use crate::pagination::ResultLimit;
use crate::service::ServiceHandle;
use crate::transport::{Transport, TransportRequest, TransportResponse};

/// Lock a total-count cell, recovering from a poisoned lock: the cell holds
/// a plain integer, so a panicked writer cannot leave it inconsistent.
pub(crate) fn lock_total(cell: &Mutex<Option<u64>>) -> MutexGuard<'_, Option<u64>> {
    cell.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Execute one prepared exchange and interpret the response.
///
/// Takes the transport and registry rather than the whole client so a
/// spawned call never keeps the runtime it is executing on alive.
pub(crate) async fn execute_call<R: FromWire>(
    transport: Arc<dyn Transport>,
    registry: Arc<TypeRegistry>,
    request: TransportRequest,
    total: Arc<Mutex<Option<u64>>>,
) -> Result<R, Error> {
    let url = request.url.clone();
    let response = transport.round_trip(request).await?;
    interpret_response(&registry, &url, response, &total)
}

fn interpret_response<R: FromWire>(
    registry: &TypeRegistry,
    url: &str,
    response: TransportResponse,
    total: &Mutex<Option<u64>>,
) -> Result<R, Error> {
    debug!(status = response.status.as_u16(), url, "received api response");

    if !response.status.is_success() {
        return Err(parse_fault(&response).into());
    }

    // The total-count header degrades gracefully: absent or malformed means
    // "unknown", clearing any previously observed value. A failed call above
    // leaves the previous value in place.
    let observed = response
        .headers
        .get(TOTAL_ITEMS_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    *lock_total(total) = observed;

    let value: Value = if response.body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&response.body)
            .map_err(|e| CodecError::Malformed(format!("response is not valid JSON: {e}")))?
    };
    Ok(R::from_wire(value, registry)?)
}

/// The peer's error envelope.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
    code: Option<String>,
}

fn parse_fault(response: &TransportResponse) -> Fault {
    let status = response.status.as_u16();
    match serde_json::from_slice::<ErrorEnvelope>(&response.body) {
        Ok(envelope) => Fault::from_error(
            envelope.error.unwrap_or_else(|| "Unknown error".to_owned()),
            envelope.code.unwrap_or_default(),
            status,
        ),
        Err(_) => Fault::from_error("Unknown error", "", status),
    }
}

/// An immutable snapshot of a [`ServiceHandle`] dispatching asynchronously.
///
/// Derived via [`ServiceHandle::as_async`]. State mutators exist here too so
/// a snapshot can be adjusted before use; they never affect the handle it
/// was derived from.
pub struct AsyncServiceHandle {
    inner: ServiceHandle,
}

impl AsyncServiceHandle {
    pub(crate) fn new(inner: ServiceHandle) -> Self {
        AsyncServiceHandle { inner }
    }

    /// Invoke a remote method, eagerly, on the client's worker pool.
    ///
    /// Precondition failures (missing instance id) are raised here, before
    /// any network attempt; everything later surfaces on result retrieval.
    pub fn invoke<R: FromWire>(
        &self,
        method: &MethodSpec,
        params: Vec<Value>,
    ) -> Result<ApiFuture<R>, Error> {
        let request = self.inner.prepare(method, params)?;
        let client = &self.inner.client;
        let join = client.runtime.spawn(execute_call::<R>(
            Arc::clone(&client.transport),
            Arc::clone(&client.registry),
            request,
            Arc::clone(&self.inner.last_total),
        ));
        Ok(ApiFuture {
            client: Arc::clone(client),
            join: Some(join),
            result: None,
        })
    }

    /// Invoke a remote method and deliver the outcome to `handler` on a
    /// worker thread.
    ///
    /// Exactly one of `on_success` / `on_error` fires per call;
    /// [`ResponseHandler::on_total_items`] fires with the observed
    /// pagination count immediately before `on_success`.
    pub fn invoke_with<R, H>(
        &self,
        method: &MethodSpec,
        params: Vec<Value>,
        handler: H,
    ) -> Result<CallHandle, Error>
    where
        R: FromWire,
        H: ResponseHandler<R>,
    {
        let request = self.inner.prepare(method, params)?;
        let client = &self.inner.client;
        let transport = Arc::clone(&client.transport);
        let registry = Arc::clone(&client.registry);
        let total = Arc::clone(&self.inner.last_total);
        let join = client.runtime.spawn(async move {
            let mut handler = handler;
            match execute_call::<R>(transport, registry, request, Arc::clone(&total)).await {
                Ok(value) => {
                    handler.on_total_items(*lock_total(&total));
                    handler.on_success(value);
                }
                Err(error) => handler.on_error(error),
            }
        });
        Ok(CallHandle { join })
    }

    // --- state delegates --------------------------------------------------

    pub fn with_new_mask(&mut self) -> MaskRef<'_> {
        self.inner.with_new_mask()
    }

    pub fn with_mask(&mut self) -> MaskRef<'_> {
        self.inner.with_mask()
    }

    pub fn set_mask(&mut self, mask: Mask) {
        self.inner.set_mask(mask);
    }

    pub fn set_mask_str(&mut self, mask: impl Into<String>) {
        self.inner.set_mask_str(mask);
    }

    pub fn clear_mask(&mut self) {
        self.inner.clear_mask();
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.inner.set_filter(filter);
    }

    pub fn filter(&self) -> Option<&str> {
        self.inner.filter()
    }

    pub fn clear_filter(&mut self) {
        self.inner.clear_filter();
    }

    pub fn set_result_limit(&mut self, limit: Option<ResultLimit>) {
        self.inner.set_result_limit(limit);
    }

    pub fn result_limit(&self) -> Option<ResultLimit> {
        self.inner.result_limit()
    }

    pub fn last_total_items(&self) -> Option<u64> {
        self.inner.last_total_items()
    }
}

impl std::fmt::Debug for AsyncServiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AsyncServiceHandle").field(&self.inner).finish()
    }
}

/// A pending call dispatched with [`AsyncServiceHandle::invoke`].
///
/// Execution is already running; the caller suspends only at retrieval time.
/// The interpreted outcome is cached after the first retrieval, so repeated
/// `get` calls observe the same result without re-executing anything.
pub struct ApiFuture<R> {
    client: Arc<ClientInner>,
    join: Option<JoinHandle<Result<R, Error>>>,
    result: Option<Result<R, Error>>,
}

impl<R: Send + 'static> ApiFuture<R> {
    /// Block until the call completes and return the outcome.
    ///
    /// Must not be called from a worker thread (i.e. from inside a
    /// [`ResponseHandler`]); block from application threads only.
    pub fn get(&mut self) -> Result<&R, Error> {
        if let Some(join) = self.join.take() {
            let outcome = self.client.runtime.block_on(join);
            self.result = Some(flatten_join(outcome));
        }
        self.cached()
    }

    /// Block until the call completes or `timeout` elapses.
    ///
    /// Elapsing does not consume the call: a later `get` can still succeed.
    pub fn get_timeout(&mut self, timeout: Duration) -> Result<&R, Error> {
        if let Some(mut join) = self.join.take() {
            let outcome = self
                .client
                .runtime
                .block_on(async { tokio::time::timeout(timeout, &mut join).await });
            match outcome {
                Ok(outcome) => self.result = Some(flatten_join(outcome)),
                Err(_elapsed) => {
                    self.join = Some(join);
                    return Err(Error::Timeout);
                }
            }
        }
        self.cached()
    }

    /// Block, then take ownership of the outcome.
    pub fn into_result(mut self) -> Result<R, Error> {
        self.get().map(drop)?;
        match self.result {
            Some(result) => result,
            None => Err(Error::Canceled),
        }
    }

    /// Abort the call if it has not completed. A subsequent retrieval
    /// reports [`Error::Canceled`].
    pub fn cancel(&self) {
        if let Some(join) = &self.join {
            join.abort();
        }
    }

    /// Whether the call has completed (successfully or not).
    pub fn is_done(&self) -> bool {
        self.result.is_some() || self.join.as_ref().is_some_and(JoinHandle::is_finished)
    }

    fn cached(&self) -> Result<&R, Error> {
        match &self.result {
            Some(Ok(value)) => Ok(value),
            Some(Err(error)) => Err(error.clone()),
            None => Err(Error::Canceled),
        }
    }
}

impl<R> std::fmt::Debug for ApiFuture<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiFuture")
            .field("pending", &self.join.is_some())
            .field("retrieved", &self.result.is_some())
            .finish()
    }
}

fn flatten_join<R>(outcome: Result<Result<R, Error>, JoinError>) -> Result<R, Error> {
    match outcome {
        Ok(result) => result,
        Err(join_error) if join_error.is_cancelled() => Err(Error::Canceled),
        Err(join_error) => Err(Error::Transport(format!("worker task failed: {join_error}"))),
    }
}

/// A pending call dispatched with [`AsyncServiceHandle::invoke_with`].
///
/// The outcome goes to the handler; this handle only offers cancellation. A
/// handler already running is not interrupted.
#[derive(Debug)]
pub struct CallHandle {
    join: JoinHandle<()>,
}

impl CallHandle {
    /// Abort the call if it has not completed. A canceled call fires
    /// neither callback.
    pub fn cancel(&self) {
        self.join.abort();
    }

    pub fn is_done(&self) -> bool {
        self.join.is_finished()
    }
}

/// Receives the outcome of a callback-shaped call on a worker thread.
pub trait ResponseHandler<T>: Send + 'static {
    /// Called once with the decoded result. Errors thrown by the peer or the
    /// codec never reach this method.
    fn on_success(&mut self, value: T);

    /// Called once with the failure. Not called when `on_success` panics.
    fn on_error(&mut self, error: Error);

    /// Called with the observed total-item count immediately before
    /// `on_success`. Default: ignored.
    fn on_total_items(&mut self, total: Option<u64>) {
        let _ = total;
    }
}

/// Adapter turning a pair of closures into a [`ResponseHandler`].
pub struct Callbacks<S, E> {
    on_success: S,
    on_error: E,
}

impl<S, E> Callbacks<S, E> {
    pub fn new(on_success: S, on_error: E) -> Self {
        Callbacks {
            on_success,
            on_error,
        }
    }
}

impl<T, S, E> ResponseHandler<T> for Callbacks<S, E>
where
    T: Send + 'static,
    S: FnMut(T) + Send + 'static,
    E: FnMut(Error) + Send + 'static,
{
    fn on_success(&mut self, value: T) {
        (self.on_success)(value);
    }

    fn on_error(&mut self, error: Error) {
        (self.on_error)(error);
    }
}
