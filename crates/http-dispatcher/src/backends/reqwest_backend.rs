//! reqwest-based Transport implementation

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart;

use crate::error::HttpError;
use crate::headers::Headers;
use crate::hooks::Transport;
use crate::payload::{Body, FormData, FormPart};
use crate::request::RequestInit;
use crate::response::{RawResponse, Response};

/// Default transport, backed by a `reqwest::Client`
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Transport over a default reqwest client
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport over an existing reqwest client
    pub fn from_reqwest(client: reqwest::Client) -> Self {
        Self { inner: client }
    }

    fn build(&self, url: &str, init: RequestInit) -> Response<reqwest::RequestBuilder> {
        let method = reqwest::Method::from_bytes(init.method.as_bytes())
            .map_err(|e| HttpError::Build(format!("Invalid method '{}': {}", init.method, e)))?;

        let has_content_type = init.headers.as_header_map().contains_key(CONTENT_TYPE);
        let mut builder = self
            .inner
            .request(method, url)
            .headers(init.headers.into());

        builder = match init.body {
            None => builder,
            Some(Body::Json(text)) | Some(Body::Text(text)) => builder.body(text),
            Some(Body::Bytes(bytes)) => builder.body(bytes),
            Some(Body::Blob(blob)) => {
                let builder = match blob.mime_type() {
                    Some(mime) if !has_content_type => builder.header(CONTENT_TYPE, mime),
                    _ => builder,
                };
                builder.body(blob.data().clone())
            }
            Some(Body::UrlEncoded(params)) => {
                let builder = if has_content_type {
                    builder
                } else {
                    builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                };
                builder.body(params.to_query_string())
            }
            Some(Body::Form(form)) => builder.multipart(multipart_form(form)?),
        };

        Ok(builder)
    }

    async fn execute(&self, url: String, init: RequestInit) -> Response<RawResponse> {
        let response = self
            .build(&url, init)?
            .send()
            .await
            .map_err(HttpError::from)?;

        let status = response.status();
        let headers = Headers::from(response.headers().clone());
        let body = response.bytes().await.map_err(HttpError::from)?;

        let raw = RawResponse::new(status.as_u16(), body).with_headers(headers);
        Ok(match status.canonical_reason() {
            Some(reason) => raw.with_status_text(reason),
            None => raw,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, url: String, mut init: RequestInit) -> Response<RawResponse> {
        match init.signal.take() {
            Some(signal) => tokio::select! {
                biased;
                _ = signal.cancelled() => Err(HttpError::Aborted),
                result = self.execute(url, init) => result,
            },
            None => self.execute(url, init).await,
        }
    }
}

fn multipart_form(form: FormData) -> Response<multipart::Form> {
    let mut out = multipart::Form::new();
    for (name, part) in form.parts() {
        out = match part {
            FormPart::Text(value) => out.text(name.to_string(), value.clone()),
            FormPart::File { blob, file_name } => {
                let mut part = multipart::Part::bytes(blob.data().to_vec());
                if let Some(file_name) = file_name {
                    part = part.file_name(file_name.clone());
                }
                if let Some(mime) = blob.mime_type() {
                    part = part
                        .mime_str(mime)
                        .map_err(|e| HttpError::InvalidHeader(format!("'{}': {}", mime, e)))?;
                }
                out.part(name.to_string(), part)
            }
        };
    }
    Ok(out)
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout
        } else if err.is_builder() {
            HttpError::Build(err.to_string())
        } else if err.is_connect() {
            HttpError::Connection(err.to_string())
        } else {
            HttpError::Other(err.to_string())
        }
    }
}
