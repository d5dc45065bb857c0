//! HTTP response types and interpretation

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::HttpError;
use crate::headers::{Headers, CONTENT_TYPE};

/// HTTP Response type - generic over the body type R and error type E
/// This is the primary return type for all HTTP operations
pub type Response<R, E = HttpError> = Result<R, E>;

/// Fully buffered HTTP response as returned by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    status: u16,
    status_text: Option<String>,
    headers: Headers,
    body: Bytes,
}

impl RawResponse {
    /// Response with a status and body and no headers
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: None,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    /// Add a header value, keeping earlier values for the same name
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Response<Self> {
        self.headers.append(name, value)?;
        Ok(self)
    }

    /// Replace all headers
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Set the reason phrase sent by the server
    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = Some(status_text.into());
        self
    }

    /// Get the HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Reason phrase, falling back to the canonical one for the status
    pub fn status_text(&self) -> String {
        self.status_text
            .clone()
            .filter(|text| !text.is_empty())
            .or_else(|| {
                http::StatusCode::from_u16(self.status)
                    .ok()
                    .and_then(|code| code.canonical_reason())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("HTTP {}", self.status))
    }

    /// Response headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Single response header
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Content type header
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }

    /// Whether the content type mentions JSON (`application/json`,
    /// `application/problem+json; charset=utf-8`, ...)
    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
    }

    /// Check if the response status is a success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response status is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the response status is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Get the response body as bytes
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Get the response body as text, failing on invalid UTF-8
    pub fn text(&self) -> Response<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| HttpError::Serialization(format!("Invalid UTF-8 body: {e}")))
    }

    /// Get the response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Response<T> {
        serde_json::from_slice(&self.body).map_err(HttpError::from)
    }
}

/// Outcome of a successful call
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Body parsed as JSON
    Json(Value),
    /// Body decoded as text
    Text(String),
    /// Unparsed response, when auto-parse is off
    Raw(RawResponse),
}

impl Reply {
    /// Whether the reply is parsed JSON
    pub fn is_json(&self) -> bool {
        matches!(self, Reply::Json(_))
    }

    /// Whether the reply is text
    pub fn is_text(&self) -> bool {
        matches!(self, Reply::Text(_))
    }

    /// Whether the reply is an unparsed response
    pub fn is_raw(&self) -> bool {
        matches!(self, Reply::Raw(_))
    }

    /// Parsed JSON value
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Reply::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Text body
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Unparsed response
    pub fn into_raw(self) -> Option<RawResponse> {
        match self {
            Reply::Raw(raw) => Some(raw),
            _ => None,
        }
    }

    /// Deserialize the reply into `R`
    ///
    /// Text and raw replies are parsed from their body text.
    pub fn deserialize<R: DeserializeOwned>(self) -> Response<R> {
        match self {
            Reply::Json(value) => serde_json::from_value(value).map_err(HttpError::from),
            Reply::Text(text) => serde_json::from_str(&text).map_err(HttpError::from),
            Reply::Raw(raw) => raw.json(),
        }
    }
}

/// Decode a body by content type: JSON when it mentions "json", text otherwise
fn parse_body(response: &RawResponse) -> Response<Reply> {
    if response.is_json() {
        if response.bytes().iter().all(u8::is_ascii_whitespace) {
            return Ok(Reply::Json(Value::Null));
        }
        return response.json().map(Reply::Json);
    }
    Ok(Reply::Text(String::from_utf8_lossy(response.bytes()).into_owned()))
}

/// Build the status error for a non-2xx response
pub(crate) fn status_error(response: &RawResponse) -> HttpError {
    let content = match parse_body(response) {
        Ok(reply) => reply,
        Err(_) => Reply::Text(String::from_utf8_lossy(response.bytes()).into_owned()),
    };

    let (message, body) = match content {
        Reply::Json(Value::Object(object)) => {
            let message = match object.get("message") {
                None | Some(Value::Null) => None,
                Some(Value::String(text)) => Some(text.clone()),
                Some(other) => Some(other.to_string()),
            };
            (message, Some(Value::Object(object)))
        }
        Reply::Json(Value::String(text)) => {
            let message = Some(text.clone()).filter(|t| !t.is_empty());
            (message, Some(Value::String(text)))
        }
        Reply::Json(value) => (None, Some(value)),
        Reply::Text(text) => (Some(text).filter(|t| !t.is_empty()), None),
        Reply::Raw(_) => (None, None),
    };

    HttpError::Status {
        status: response.status(),
        message: message.unwrap_or_else(|| response.status_text()),
        body,
    }
}

/// Default response interpretation
pub(crate) fn interpret(response: RawResponse, auto_parse: bool) -> Response<Reply> {
    if !auto_parse {
        return Ok(Reply::Raw(response));
    }

    if !response.is_success() {
        let error = status_error(&response);
        tracing::debug!(status = response.status(), "Request failed: {}", error);
        return Err(error);
    }

    parse_body(&response)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    fn json_response(status: u16, body: &str) -> RawResponse {
        RawResponse::new(status, body.to_string())
            .with_header("Content-Type", "application/json")
            .expect("Valid header")
    }

    fn typed_response(status: u16, body: &'static [u8], content_type: &str) -> RawResponse {
        RawResponse::new(status, body)
            .with_header("content-type", content_type)
            .expect("Valid header")
    }

    #[test]
    fn test_response_type_is_result() {
        let success: Response<i32> = Ok(42);
        assert!(matches!(success, Ok(42)));

        let error: Response<i32> = Err(HttpError::Timeout);
        assert!(matches!(error, Err(HttpError::Timeout)));
    }

    #[test]
    fn test_status_ranges() {
        assert!(RawResponse::new(200, "").is_success());
        assert!(RawResponse::new(299, "").is_success());
        assert!(!RawResponse::new(300, "").is_success());
        assert!(RawResponse::new(404, "").is_client_error());
        assert!(RawResponse::new(503, "").is_server_error());
    }

    #[test]
    fn test_json_detection_is_substring_and_case_insensitive() {
        let charset = typed_response(200, b"{}", "application/json; charset=utf-8");
        let problem = typed_response(200, b"{}", "application/problem+JSON");
        let text = typed_response(200, b"{}", "text/plain");
        let missing = RawResponse::new(200, "{}");

        assert!(charset.is_json());
        assert!(problem.is_json());
        assert!(!text.is_json());
        assert!(!missing.is_json());
    }

    #[test]
    fn test_interpret_json_success() {
        let reply = interpret(json_response(200, r#"["apple","bat","cat"]"#), true)
            .expect("Should parse");
        assert_eq!(reply, Reply::Json(json!(["apple", "bat", "cat"])));
    }

    #[test]
    fn test_interpret_text_success() {
        let reply = interpret(RawResponse::new(200, "https://foo.bar/string"), true)
            .expect("Should parse");
        assert_eq!(reply.as_text(), Some("https://foo.bar/string"));
    }

    #[test]
    fn test_interpret_text_success_replaces_invalid_utf8() {
        let response = typed_response(200, b"caf\xE9", "text/plain; charset=iso-8859-1");
        let reply = interpret(response, true).expect("Text bodies always decode");
        assert_eq!(reply.as_text(), Some("caf\u{FFFD}"));
    }

    #[test]
    fn test_raw_text_rejects_invalid_utf8() {
        let response = RawResponse::new(200, &b"caf\xE9"[..]);
        assert!(matches!(response.text(), Err(HttpError::Serialization(_))));
    }

    #[test]
    fn test_with_header_keeps_repeated_values() {
        let response = RawResponse::new(200, "")
            .with_header("set-cookie", "a=1")
            .and_then(|r| r.with_header("Set-Cookie", "b=2"))
            .expect("Valid headers");

        assert_eq!(response.header("set-cookie"), Some("a=1"));
        assert_eq!(response.headers().get_all("set-cookie"), vec!["a=1", "b=2"]);
    }

    #[test]
    fn test_interpret_empty_json_body_is_null() {
        let reply = interpret(json_response(204, ""), true).expect("Should parse");
        assert_eq!(reply, Reply::Json(Value::Null));
    }

    #[test]
    fn test_interpret_invalid_json_success_fails() {
        let result = interpret(json_response(200, "not json"), true);
        assert!(matches!(result, Err(HttpError::Serialization(_))));
    }

    #[test]
    fn test_interpret_raw_when_auto_parse_disabled() {
        let response = json_response(500, r#"{"message":"boom"}"#);
        let reply = interpret(response.clone(), false).expect("Raw responses never fail");
        assert_eq!(reply.into_raw(), Some(response));
    }

    #[test]
    fn test_status_error_prefers_json_message() {
        let err = interpret(json_response(400, r#"{"message":"Bad thing","code":12}"#), true)
            .expect_err("400 should fail");

        match err {
            HttpError::Status {
                status,
                message,
                body,
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Bad thing");
                assert_eq!(body, Some(json!({ "message": "Bad thing", "code": 12 })));
            }
            other => panic!("Expected HttpError::Status, got {:?}", other),
        }
    }

    #[test]
    fn test_status_error_uses_non_string_json_message() {
        let err = interpret(json_response(422, r#"{"message":42}"#), true).expect_err("422");
        assert_eq!(err.message(), "42");

        let err = interpret(json_response(409, r#"{"message":{"field":"name"}}"#), true)
            .expect_err("409");
        assert_eq!(err.message(), r#"{"field":"name"}"#);

        let err = interpret(json_response(400, r#"{"message":null}"#), true).expect_err("400");
        assert_eq!(err.message(), "Bad Request");
    }

    #[test]
    fn test_status_error_uses_text_body() {
        let err = interpret(RawResponse::new(404, "Nothing here"), true).expect_err("404");
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.message(), "Nothing here");
        assert!(err.body().is_none());
    }

    #[test]
    fn test_status_error_falls_back_to_reason_phrase() {
        let err = interpret(RawResponse::new(400, ""), true).expect_err("400");
        assert_eq!(err.message(), "Bad Request");

        let err = interpret(
            json_response(418, r#"{"code":1}"#).with_status_text("Short and stout"),
            true,
        )
        .expect_err("418");
        assert_eq!(err.message(), "Short and stout");

        let err = interpret(RawResponse::new(599, ""), true).expect_err("599");
        assert_eq!(err.message(), "HTTP 599");
    }

    #[test]
    fn test_status_error_with_broken_json_uses_text() {
        let err = interpret(json_response(502, "upstream down"), true).expect_err("502");
        assert_eq!(err.message(), "upstream down");
    }

    #[test]
    fn test_reply_deserialize() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Item {
            id: u32,
        }

        let item: Item = Reply::Json(json!({ "id": 3 }))
            .deserialize()
            .expect("Valid item");
        assert_eq!(item, Item { id: 3 });

        let item: Item = Reply::Text(r#"{"id":4}"#.to_string())
            .deserialize()
            .expect("Valid item");
        assert_eq!(item, Item { id: 4 });
    }
}
