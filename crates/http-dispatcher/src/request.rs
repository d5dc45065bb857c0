//! Request descriptors and their construction

use http::HeaderValue;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::HttpError;
use crate::headers::{Headers, APPLICATION_JSON};
use crate::payload::{classify, Body, Payload};
use crate::query::{split_query, QueryParams};
use crate::response::Response;

/// Per-call overrides, merged over the computed request
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Headers applied on top of the dispatcher headers
    pub headers: Headers,
    /// Body that replaces the one computed from the payload
    pub body: Option<Body>,
    /// Method that replaces the verb after query promotion
    pub method: Option<String>,
    /// Cancellation token handed to the transport unmodified
    pub signal: Option<CancellationToken>,
    invalid_header: Option<String>,
}

impl RequestOptions {
    /// Empty overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header
    ///
    /// An invalid name or value fails the call it is used for.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let Err(HttpError::InvalidHeader(message)) = self.headers.insert(name, value) {
            self.invalid_header.get_or_insert(message);
        }
        self
    }

    /// Add several headers
    pub fn headers(mut self, headers: &Headers) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Force the request body
    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Force the request method
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Attach a cancellation token
    pub fn signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// Fully assembled request, as seen by the transform hook
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// Final URL
    pub url: String,
    /// Upper-case method
    pub method: String,
    /// Merged headers
    pub headers: Headers,
    /// Request body
    pub body: Option<Body>,
    /// Cancellation token
    pub signal: Option<CancellationToken>,
}

impl RequestDescriptor {
    /// Split into the URL and the remaining init handed to the transport
    pub fn into_parts(self) -> (String, RequestInit) {
        (
            self.url,
            RequestInit {
                method: self.method,
                headers: self.headers,
                body: self.body,
                signal: self.signal,
            },
        )
    }
}

/// Everything but the URL, as handed to [`crate::Transport::send`]
#[derive(Debug, Clone)]
pub struct RequestInit {
    /// Upper-case method
    pub method: String,
    /// Request headers
    pub headers: Headers,
    /// Request body
    pub body: Option<Body>,
    /// Cancellation token
    pub signal: Option<CancellationToken>,
}

/// Assemble the descriptor for one call
pub(crate) fn build_descriptor(
    base: &str,
    default_headers: &Headers,
    verb: &str,
    url_or_path: &str,
    payload: Option<Payload>,
    options: RequestOptions,
) -> Response<RequestDescriptor> {
    if let Some(message) = options.invalid_header {
        return Err(HttpError::InvalidHeader(message));
    }

    let method = verb.to_ascii_uppercase();
    let (path, existing_query) = split_query(url_or_path);

    let (promoted, payload) = match payload {
        Some(Payload::Query(params)) if method == "GET" => (Some(params), None),
        Some(Payload::Json(Value::Object(object))) if method == "GET" => {
            (Some(QueryParams::from_json_object(&object)), None)
        }
        other => (None, other),
    };

    let query = match &promoted {
        Some(params) => {
            let mut merged = QueryParams::parse(existing_query);
            merged.extend(params.clone());
            merged.to_query_string()
        }
        None => existing_query.to_string(),
    };

    let url = if query.is_empty() {
        format!("{base}{path}")
    } else {
        format!("{base}{path}?{query}")
    };

    let classified = match promoted {
        Some(_) => None,
        None => Some(classify(payload)?),
    };

    let mut headers = Headers::new();
    if classified.as_ref().is_some_and(|c| c.is_structured()) {
        headers.header_map_mut().insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_JSON),
        );
    }
    headers.extend(default_headers);
    headers.extend(&options.headers);

    tracing::trace!(
        method = %method,
        promoted = classified.is_none(),
        structured = classified.as_ref().is_some_and(|c| c.is_structured()),
        "Assembled request"
    );

    let body = options
        .body
        .or_else(|| classified.and_then(|c| c.into_body()));

    Ok(RequestDescriptor {
        url,
        method: options
            .method
            .map(|m| m.to_ascii_uppercase())
            .unwrap_or(method),
        headers,
        body,
        signal: options.signal,
    })
}
