//! Request payloads and wire bodies
//!
//! A [`Payload`] is what the caller hands to a verb call. Form data, blobs,
//! byte buffers, and query maps outside of GET are forwarded untouched.
//! JSON values (and the absent payload) are structured and become JSON text.

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::query::QueryParams;
use crate::response::Response;

/// Caller-supplied request payload
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Structured value, serialized as JSON
    Json(Value),
    /// Query parameters; promoted to the URL on GET
    Query(QueryParams),
    /// Multipart form data
    Form(FormData),
    /// Binary blob with an optional mime type
    Blob(Blob),
    /// Raw byte buffer
    Bytes(Bytes),
}

impl Payload {
    /// Structured payload from any serializable value
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Response<Self> {
        Ok(Payload::Json(serde_json::to_value(value)?))
    }

    /// Whether the payload is forwarded to the transport without serialization
    pub fn is_pass_through(&self) -> bool {
        matches!(
            self,
            Payload::Form(_) | Payload::Blob(_) | Payload::Bytes(_) | Payload::Query(_)
        )
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Json(Value::String(value.to_string()))
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Json(Value::String(value))
    }
}

impl From<i64> for Payload {
    fn from(value: i64) -> Self {
        Payload::Json(Value::from(value))
    }
}

impl From<f64> for Payload {
    fn from(value: f64) -> Self {
        Payload::Json(Value::from(value))
    }
}

impl From<bool> for Payload {
    fn from(value: bool) -> Self {
        Payload::Json(Value::Bool(value))
    }
}

impl From<QueryParams> for Payload {
    fn from(value: QueryParams) -> Self {
        Payload::Query(value)
    }
}

impl From<FormData> for Payload {
    fn from(value: FormData) -> Self {
        Payload::Form(value)
    }
}

impl From<Blob> for Payload {
    fn from(value: Blob) -> Self {
        Payload::Blob(value)
    }
}

impl From<Bytes> for Payload {
    fn from(value: Bytes) -> Self {
        Payload::Bytes(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(value))
    }
}

/// Binary blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Bytes,
    mime_type: Option<String>,
}

impl Blob {
    /// Blob without a mime type
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            mime_type: None,
        }
    }

    /// Set the mime type
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Blob contents
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Mime type, if any
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }
}

/// One field of a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// Plain text field
    Text(String),
    /// File field
    File {
        /// File contents
        blob: Blob,
        /// File name sent in the content disposition
        file_name: Option<String>,
    },
}

/// Multipart form data, fields kept in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    parts: Vec<(String, FormPart)>,
}

impl FormData {
    /// Empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((name.into(), FormPart::Text(value.into())));
        self
    }

    /// Add a file field
    pub fn file(mut self, name: impl Into<String>, blob: Blob, file_name: Option<String>) -> Self {
        self.parts
            .push((name.into(), FormPart::File { blob, file_name }));
        self
    }

    /// Iterate over fields
    pub fn parts(&self) -> impl Iterator<Item = (&str, &FormPart)> {
        self.parts.iter().map(|(name, part)| (name.as_str(), part))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the form has no fields
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Request body as handed to the transport
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Serialized JSON text
    Json(String),
    /// Plain text set by the caller
    Text(String),
    /// Raw byte buffer
    Bytes(Bytes),
    /// Binary blob
    Blob(Blob),
    /// Multipart form; the transport picks the boundary
    Form(FormData),
    /// `application/x-www-form-urlencoded` pairs
    UrlEncoded(QueryParams),
}

impl Body {
    /// Textual body content, for JSON and text bodies
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Json(text) | Body::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<Payload> for Body {
    fn from(payload: Payload) -> Self {
        match payload {
            Payload::Json(value) => Body::Json(value.to_string()),
            Payload::Query(params) => Body::UrlEncoded(params),
            Payload::Form(form) => Body::Form(form),
            Payload::Blob(blob) => Body::Blob(blob),
            Payload::Bytes(bytes) => Body::Bytes(bytes),
        }
    }
}

/// Result of classifying a payload that was not promoted to the URL
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Classified {
    /// JSON body (absent when no payload was given)
    Structured(Option<Body>),
    /// Body forwarded as-is
    PassThrough(Body),
}

impl Classified {
    pub(crate) fn is_structured(&self) -> bool {
        matches!(self, Classified::Structured(_))
    }

    pub(crate) fn into_body(self) -> Option<Body> {
        match self {
            Classified::Structured(body) => body,
            Classified::PassThrough(body) => Some(body),
        }
    }
}

/// Classify a payload that was not promoted to the query string
pub(crate) fn classify(payload: Option<Payload>) -> Response<Classified> {
    Ok(match payload {
        None => Classified::Structured(None),
        Some(Payload::Json(value)) => {
            Classified::Structured(Some(Body::Json(serde_json::to_string(&value)?)))
        }
        Some(pass_through) => Classified::PassThrough(pass_through.into()),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_structured_payloads_serialize_to_json() {
        let cases = [
            (Payload::from(json!({ "a": 1 })), r#"{"a":1}"#),
            (Payload::from(json!([1, 2])), "[1,2]"),
            (Payload::from("text"), r#""text""#),
            (Payload::from(42_i64), "42"),
            (Payload::from(true), "true"),
        ];

        for (payload, expected) in cases {
            let classified = classify(Some(payload)).expect("Classification succeeds");
            assert!(classified.is_structured());
            assert_eq!(classified.into_body(), Some(Body::Json(expected.to_string())));
        }
    }

    #[test]
    fn test_absent_payload_is_structured_without_body() {
        let classified = classify(None).expect("Classification succeeds");
        assert_eq!(classified, Classified::Structured(None));
    }

    #[test]
    fn test_pass_through_payloads_are_untouched() {
        let bytes = Bytes::from_static(b"\x00\x01binary");
        let classified = classify(Some(Payload::Bytes(bytes.clone()))).expect("ok");
        match classified {
            Classified::PassThrough(Body::Bytes(out)) => {
                assert_eq!(out.as_ptr(), bytes.as_ptr());
            }
            other => panic!("Expected pass-through bytes, got {:?}", other),
        }

        let form = FormData::new().text("name", "value");
        let classified = classify(Some(Payload::Form(form.clone()))).expect("ok");
        assert_eq!(classified, Classified::PassThrough(Body::Form(form)));

        let blob = Blob::new(vec![1, 2, 3]).with_mime_type("image/png");
        let classified = classify(Some(Payload::Blob(blob.clone()))).expect("ok");
        assert_eq!(classified, Classified::PassThrough(Body::Blob(blob)));
    }

    #[test]
    fn test_query_outside_get_is_url_encoded_body() {
        let params = QueryParams::from([("a", "1")]);
        let classified = classify(Some(Payload::Query(params.clone()))).expect("ok");
        assert_eq!(classified, Classified::PassThrough(Body::UrlEncoded(params)));
    }

    #[test]
    fn test_payload_json_from_serialize() {
        #[derive(Serialize)]
        struct Todo {
            title: &'static str,
            done: bool,
        }

        let payload = Payload::json(&Todo {
            title: "write tests",
            done: false,
        })
        .expect("Serializable");
        assert_eq!(payload, Payload::Json(json!({ "title": "write tests", "done": false })));
    }

    #[test]
    fn test_form_data_keeps_order() {
        let form = FormData::new()
            .text("first", "1")
            .file("upload", Blob::new(b"abc".to_vec()), Some("a.txt".to_string()))
            .text("last", "2");

        let names: Vec<_> = form.parts().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["first", "upload", "last"]);
        assert_eq!(form.len(), 3);
    }
}
