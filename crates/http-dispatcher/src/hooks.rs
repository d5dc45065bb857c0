//! Injection points: transport, request transform, response handler
//!
//! Each hook is an object-safe async trait so a [`crate::Fetcher`] can hold
//! it behind an `Arc`. The `*_fn` adapters turn plain async closures into
//! hook implementations.

use std::fmt::Debug;
use std::future::Future;

use async_trait::async_trait;

use crate::request::{RequestDescriptor, RequestInit};
use crate::response::{RawResponse, Reply, Response};

/// Request-issuing primitive the dispatcher delegates all I/O to
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one request and buffer its response
    ///
    /// Errors are returned to the caller unchanged.
    async fn send(&self, url: String, init: RequestInit) -> Response<RawResponse>;
}

/// Rewrites the assembled request before it is sent
#[async_trait]
pub trait RequestTransform: Send + Sync {
    /// Return the descriptor to send
    async fn transform(&self, request: RequestDescriptor) -> Response<RequestDescriptor>;
}

/// Replaces the default response interpretation
#[async_trait]
pub trait ResponseHandler: Send + Sync {
    /// Produce the outcome of the call from the raw response
    async fn handle(&self, response: RawResponse) -> Response<Reply>;
}

/// Closure-backed [`Transport`]
#[derive(Clone)]
pub struct FnTransport<F>(F);

/// Closure-backed [`RequestTransform`]
#[derive(Clone)]
pub struct FnRequestTransform<F>(F);

/// Closure-backed [`ResponseHandler`]
#[derive(Clone)]
pub struct FnResponseHandler<F>(F);

macro_rules! opaque_debug {
    ($($name:ident),*) => {
        $(
            impl<F> Debug for $name<F> {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.debug_struct(stringify!($name)).finish_non_exhaustive()
                }
            }
        )*
    };
}

opaque_debug!(FnTransport, FnRequestTransform, FnResponseHandler);

/// Build a transport from an async closure
///
/// ```no_run
/// use http_dispatcher::{transport_fn, Fetcher, RawResponse};
///
/// let echo = Fetcher::builder()
///     .transport(transport_fn(|url, _init| async move {
///         Ok(RawResponse::new(200, url))
///     }))
///     .build()
///     .expect("transport is set");
/// # drop(echo);
/// ```
pub fn transport_fn<F, Fut>(f: F) -> FnTransport<F>
where
    F: Fn(String, RequestInit) -> Fut + Send + Sync,
    Fut: Future<Output = Response<RawResponse>> + Send + 'static,
{
    FnTransport(f)
}

/// Build a request transform from an async closure
pub fn transform_fn<F, Fut>(f: F) -> FnRequestTransform<F>
where
    F: Fn(RequestDescriptor) -> Fut + Send + Sync,
    Fut: Future<Output = Response<RequestDescriptor>> + Send + 'static,
{
    FnRequestTransform(f)
}

/// Build a response handler from an async closure
pub fn response_fn<F, Fut>(f: F) -> FnResponseHandler<F>
where
    F: Fn(RawResponse) -> Fut + Send + Sync,
    Fut: Future<Output = Response<Reply>> + Send + 'static,
{
    FnResponseHandler(f)
}

#[async_trait]
impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(String, RequestInit) -> Fut + Send + Sync,
    Fut: Future<Output = Response<RawResponse>> + Send + 'static,
{
    async fn send(&self, url: String, init: RequestInit) -> Response<RawResponse> {
        (self.0)(url, init).await
    }
}

#[async_trait]
impl<F, Fut> RequestTransform for FnRequestTransform<F>
where
    F: Fn(RequestDescriptor) -> Fut + Send + Sync,
    Fut: Future<Output = Response<RequestDescriptor>> + Send + 'static,
{
    async fn transform(&self, request: RequestDescriptor) -> Response<RequestDescriptor> {
        (self.0)(request).await
    }
}

#[async_trait]
impl<F, Fut> ResponseHandler for FnResponseHandler<F>
where
    F: Fn(RawResponse) -> Fut + Send + Sync,
    Fut: Future<Output = Response<Reply>> + Send + 'static,
{
    async fn handle(&self, response: RawResponse) -> Response<Reply> {
        (self.0)(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::Headers;

    #[tokio::test]
    async fn test_transport_fn_forwards_arguments() {
        let transport = transport_fn(|url, init: RequestInit| async move {
            Ok(RawResponse::new(200, format!("{} {}", init.method, url)))
        });

        let init = RequestInit {
            method: "GET".to_string(),
            headers: Headers::new(),
            body: None,
            signal: None,
        };
        let response = transport
            .send("https://foo.bar".to_string(), init)
            .await
            .expect("Closure transport succeeds");

        assert_eq!(response.text().expect("utf-8"), "GET https://foo.bar");
    }

    #[tokio::test]
    async fn test_response_fn_result_is_returned() {
        let handler = response_fn(|response: RawResponse| async move {
            Ok(Reply::Text(format!("status {}", response.status())))
        });

        let reply = handler
            .handle(RawResponse::new(404, ""))
            .await
            .expect("Handler succeeds");
        assert_eq!(reply.as_text(), Some("status 404"));
    }
}
