//! Verb-dispatching HTTP client

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::HttpError;
use crate::headers::Headers;
use crate::hooks::{RequestTransform, ResponseHandler, Transport};
use crate::payload::{Blob, Body, FormData, Payload};
use crate::query::QueryParams;
use crate::request::{build_descriptor, RequestOptions};
use crate::response::{interpret, Reply, Response};

/// Serializable part of the dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Prefix prepended to every request path
    pub base: String,
    /// Parse successful bodies and surface status errors
    #[serde(alias = "autoParse")]
    pub auto_parse: bool,
    /// Headers merged into every request
    pub headers: Headers,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base: String::new(),
            auto_parse: true,
            headers: Headers::new(),
        }
    }
}

struct Inner {
    config: FetcherConfig,
    transform_request: Option<Arc<dyn RequestTransform>>,
    handle_response: Option<Arc<dyn ResponseHandler>>,
    transport: Arc<dyn Transport>,
}

/// HTTP client that turns any verb into a request
///
/// Cloning is cheap; clones share the same immutable configuration.
#[derive(Clone)]
pub struct Fetcher {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("base", &self.inner.config.base)
            .field("auto_parse", &self.inner.config.auto_parse)
            .field("headers", &self.inner.config.headers)
            .field("transform_request", &self.inner.transform_request.is_some())
            .field("handle_response", &self.inner.handle_response.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "reqwest")]
impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    /// Create a fetcher with default settings over the reqwest transport
    #[cfg(feature = "reqwest")]
    pub fn new() -> Self {
        Self::with_transport(crate::backends::ReqwestTransport::new())
    }

    /// Create a fetcher with default settings over the given transport
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                config: FetcherConfig::default(),
                transform_request: None,
                handle_response: None,
                transport: Arc::new(transport),
            }),
        }
    }

    /// Create a new fetcher builder
    pub fn builder() -> FetcherBuilder {
        FetcherBuilder::default()
    }

    /// Base URL prefix
    pub fn base(&self) -> &str {
        &self.inner.config.base
    }

    /// Whether bodies are parsed automatically
    pub fn auto_parse(&self) -> bool {
        self.inner.config.auto_parse
    }

    /// Headers merged into every request
    pub fn headers(&self) -> &Headers {
        &self.inner.config.headers
    }

    /// Resolved configuration
    pub fn config(&self) -> &FetcherConfig {
        &self.inner.config
    }

    /// Resolve a name the way property access on the dispatcher does
    ///
    /// Configuration keys return their value; every other name yields a
    /// bound issuing function for that verb.
    pub fn property(&self, name: &str) -> Property<'_> {
        match name {
            "base" => Property::Base(self.base()),
            "autoParse" | "auto_parse" => Property::AutoParse(self.auto_parse()),
            "headers" => Property::Headers(self.headers()),
            verb => Property::Verb(self.verb(verb)),
        }
    }

    /// Issuing function bound to `verb`
    pub fn verb(&self, verb: impl Into<String>) -> Verb {
        Verb {
            fetcher: self.clone(),
            method: verb.into(),
        }
    }

    /// Issue a request
    ///
    /// This is the primitive every other entry point goes through.
    pub async fn call(
        &self,
        verb: &str,
        url_or_path: &str,
        payload: Option<Payload>,
        options: RequestOptions,
    ) -> Response<Reply> {
        let inner = &self.inner;

        let mut request = build_descriptor(
            &inner.config.base,
            &inner.config.headers,
            verb,
            url_or_path,
            payload,
            options,
        )?;

        if let Some(transform) = &inner.transform_request {
            tracing::trace!(url = %request.url, "Applying request transform");
            request = transform.transform(request).await?;
        }

        let (url, init) = request.into_parts();
        tracing::debug!(method = %init.method, url = %url, "Dispatching request");

        let response = inner.transport.send(url, init).await?;

        match &inner.handle_response {
            Some(handler) => handler.handle(response).await,
            None => interpret(response, inner.config.auto_parse),
        }
    }

    /// Request builder for any verb
    pub fn request(&self, verb: &str, url_or_path: &str) -> RequestBuilder {
        RequestBuilder::new(self.clone(), verb, url_or_path)
    }

    /// GET request builder
    pub fn get(&self, url_or_path: &str) -> RequestBuilder {
        self.request("GET", url_or_path)
    }

    /// POST request builder
    pub fn post(&self, url_or_path: &str) -> RequestBuilder {
        self.request("POST", url_or_path)
    }

    /// PUT request builder
    pub fn put(&self, url_or_path: &str) -> RequestBuilder {
        self.request("PUT", url_or_path)
    }

    /// PATCH request builder
    pub fn patch(&self, url_or_path: &str) -> RequestBuilder {
        self.request("PATCH", url_or_path)
    }

    /// DELETE request builder
    pub fn delete(&self, url_or_path: &str) -> RequestBuilder {
        self.request("DELETE", url_or_path)
    }

    /// HEAD request builder
    pub fn head(&self, url_or_path: &str) -> RequestBuilder {
        self.request("HEAD", url_or_path)
    }

    /// OPTIONS request builder
    pub fn options(&self, url_or_path: &str) -> RequestBuilder {
        self.request("OPTIONS", url_or_path)
    }

    /// GET request, returns JSON deserialized to R
    pub async fn fetch<R: DeserializeOwned>(&self, url_or_path: &str) -> Response<R> {
        self.get(url_or_path).send_json().await
    }
}

/// Result of [`Fetcher::property`]
#[derive(Debug, Clone)]
pub enum Property<'a> {
    /// The `base` setting
    Base(&'a str),
    /// The `autoParse` setting
    AutoParse(bool),
    /// The `headers` setting
    Headers(&'a Headers),
    /// Any other name: a bound issuing function
    Verb(Verb),
}

impl Property<'_> {
    /// The bound verb, if this property is not a setting
    pub fn into_verb(self) -> Option<Verb> {
        match self {
            Property::Verb(verb) => Some(verb),
            _ => None,
        }
    }
}

/// Issuing function bound to one verb
#[derive(Debug, Clone)]
pub struct Verb {
    fetcher: Fetcher,
    method: String,
}

impl Verb {
    /// Verb as given (not yet upper-cased)
    pub fn name(&self) -> &str {
        &self.method
    }

    /// Issue a request with this verb
    pub async fn call(
        &self,
        url_or_path: &str,
        payload: Option<Payload>,
        options: RequestOptions,
    ) -> Response<Reply> {
        self.fetcher
            .call(&self.method, url_or_path, payload, options)
            .await
    }

    /// Request builder for this verb
    pub fn request(&self, url_or_path: &str) -> RequestBuilder {
        self.fetcher.request(&self.method, url_or_path)
    }
}

/// Builder for a single call
#[derive(Debug)]
pub struct RequestBuilder {
    fetcher: Fetcher,
    method: String,
    url: String,
    payload: Option<Payload>,
    options: RequestOptions,
    error: Option<HttpError>,
}

impl RequestBuilder {
    fn new(fetcher: Fetcher, method: &str, url: &str) -> Self {
        Self {
            fetcher,
            method: method.to_string(),
            url: url.to_string(),
            payload: None,
            options: RequestOptions::default(),
            error: None,
        }
    }

    /// Set the payload
    pub fn payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Set a structured payload from any serializable value
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match Payload::json(body) {
            Ok(payload) => self.payload = Some(payload),
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Set query parameters (request body for verbs other than GET)
    pub fn query<K, V, I>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.payload(pairs.into_iter().collect::<QueryParams>())
    }

    /// Set a multipart form payload
    pub fn form(self, form: FormData) -> Self {
        self.payload(form)
    }

    /// Set a raw byte payload
    pub fn bytes(self, bytes: impl Into<Bytes>) -> Self {
        self.payload(Payload::Bytes(bytes.into()))
    }

    /// Set a blob payload
    pub fn blob(self, blob: Blob) -> Self {
        self.payload(blob)
    }

    /// Add a header to the request
    pub fn header(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let Err(e) = self.options.headers.insert(key, value) {
            self.error.get_or_insert(e);
        }
        self
    }

    /// Add several headers to the request
    pub fn headers(mut self, headers: &Headers) -> Self {
        self.options.headers.extend(headers);
        self
    }

    /// Override the computed body
    pub fn body(mut self, body: Body) -> Self {
        self.options.body = Some(body);
        self
    }

    /// Attach a cancellation token
    pub fn signal(mut self, signal: CancellationToken) -> Self {
        self.options.signal = Some(signal);
        self
    }

    /// Replace all per-call overrides
    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Send the request
    pub async fn send(self) -> Response<Reply> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.fetcher
            .call(&self.method, &self.url, self.payload, self.options)
            .await
    }

    /// Send the request and deserialize the reply as JSON
    pub async fn send_json<R: DeserializeOwned>(self) -> Response<R> {
        self.send().await?.deserialize()
    }
}

/// Builder for [`Fetcher`]
#[derive(Default)]
pub struct FetcherBuilder {
    config: FetcherConfig,
    transform_request: Option<Arc<dyn RequestTransform>>,
    handle_response: Option<Arc<dyn ResponseHandler>>,
    transport: Option<Arc<dyn Transport>>,
    error: Option<HttpError>,
}

impl std::fmt::Debug for FetcherBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetcherBuilder")
            .field("config", &self.config)
            .field("transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}

impl FetcherBuilder {
    /// Apply a loaded configuration, replacing base, auto-parse and headers
    pub fn config(mut self, config: FetcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the base URL prefix
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.config.base = base.into();
        self
    }

    /// Enable or disable automatic body parsing
    pub fn auto_parse(mut self, auto_parse: bool) -> Self {
        self.config.auto_parse = auto_parse;
        self
    }

    /// Add a header sent with every request
    ///
    /// An invalid name or value makes [`FetcherBuilder::build`] fail.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let Err(e) = self.config.headers.insert(name, value) {
            self.error.get_or_insert(e);
        }
        self
    }

    /// Add several headers sent with every request
    pub fn headers(mut self, headers: &Headers) -> Self {
        self.config.headers.extend(headers);
        self
    }

    /// Rewrite every assembled request before it is sent
    pub fn transform_request(mut self, transform: impl RequestTransform + 'static) -> Self {
        self.transform_request = Some(Arc::new(transform));
        self
    }

    /// Replace the default response interpretation
    pub fn handle_response(mut self, handler: impl ResponseHandler + 'static) -> Self {
        self.handle_response = Some(Arc::new(handler));
        self
    }

    /// Use a custom transport instead of the default one
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Build the fetcher
    pub fn build(self) -> Response<Fetcher> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };

        Ok(Fetcher {
            inner: Arc::new(Inner {
                config: self.config,
                transform_request: self.transform_request,
                handle_response: self.handle_response,
                transport,
            }),
        })
    }
}

#[cfg(feature = "reqwest")]
fn default_transport() -> Response<Arc<dyn Transport>> {
    Ok(Arc::new(crate::backends::ReqwestTransport::new()))
}

#[cfg(not(feature = "reqwest"))]
fn default_transport() -> Response<Arc<dyn Transport>> {
    Err(HttpError::Build(
        "No transport configured and the default backend is disabled".to_string(),
    ))
}
