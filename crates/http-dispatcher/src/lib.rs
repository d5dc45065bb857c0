//! Verb-dispatching HTTP client
//!
//! A [`Fetcher`] wraps an injectable [`Transport`] (reqwest by default) and
//! turns any verb into a request. Structured payloads are sent as JSON, GET
//! payloads become query parameters, and successful responses are parsed by
//! content type. Non-2xx responses surface as [`HttpError::Status`].
//!
//! # Example
//!
//! ```no_run
//! use http_dispatcher::{Fetcher, Response};
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Deserialize)]
//! struct Todo {
//!     id: u64,
//!     title: String,
//! }
//!
//! async fn example() -> Response<()> {
//!     let api = Fetcher::builder()
//!         .base("https://api.example.com/")
//!         .header("authorization", "Bearer token")
//!         .build()?;
//!
//!     // GET https://api.example.com/todos?done=false
//!     let todos: Vec<Todo> = api
//!         .get("todos")
//!         .json(&json!({ "done": false }))
//!         .send_json()
//!         .await?;
//!
//!     // Any verb works, not only the common ones
//!     api.verb("purge").request("cache").send().await?;
//!
//!     let created: Todo = api
//!         .post("todos")
//!         .json(&json!({ "title": "write docs" }))
//!         .send_json()
//!         .await?;
//!     println!("{} todos, created #{} {}", todos.len(), created.id, created.title);
//!     Ok(())
//! }
//! ```

mod backends;
mod client;
mod error;
mod headers;
mod hooks;
mod payload;
mod query;
mod request;
mod response;

#[cfg(feature = "reqwest")]
pub use backends::ReqwestTransport;
pub use client::{Fetcher, FetcherBuilder, FetcherConfig, Property, RequestBuilder, Verb};
pub use error::HttpError;
pub use headers::{Headers, APPLICATION_JSON, CONTENT_TYPE};
pub use hooks::{
    response_fn, transform_fn, transport_fn, FnRequestTransform, FnResponseHandler, FnTransport,
    RequestTransform, ResponseHandler, Transport,
};
pub use payload::{Blob, Body, FormData, FormPart, Payload};
pub use query::QueryParams;
pub use request::{RequestDescriptor, RequestInit, RequestOptions};
pub use response::{RawResponse, Reply, Response};
pub use tokio_util::sync::CancellationToken;
