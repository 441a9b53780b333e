//! Description of a single API operation
//!
//! An [`ApiRequest`] is plain data: it can be sent any number of times, so
//! the same value is reused verbatim when an operation is resent after a
//! token refresh.

use assetdesk_domain::ClientError;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_json::Value;

/// Request payload
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Serialized as JSON with `Content-Type: application/json`
    Json(Value),
    /// URL-encoded form fields
    Form(Vec<(String, String)>),
    /// Multipart form; the transport chooses the boundary and content-type
    Multipart(MultipartPayload),
    /// Raw bytes sent untouched; only a caller-supplied content-type is used
    Binary(Vec<u8>),
}

/// Multipart fields, kept as owned data so the form can be rebuilt per send
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartPayload {
    parts: Vec<MultipartField>,
}

#[derive(Debug, Clone, PartialEq)]
enum MultipartField {
    Text { name: String, value: String },
    File { name: String, file_name: String, bytes: Vec<u8>, mime: Option<String> },
}

impl MultipartPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartField::Text { name: name.into(), value: value.into() });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        mime: Option<String>,
    ) -> Self {
        self.parts.push(MultipartField::File {
            name: name.into(),
            file_name: file_name.into(),
            bytes,
            mime,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Build a fresh `reqwest` form.
    ///
    /// # Errors
    /// Returns `ClientError::Config` if a part carries an invalid MIME type.
    pub fn to_form(&self) -> Result<Form, ClientError> {
        let mut form = Form::new();
        for field in &self.parts {
            form = match field {
                MultipartField::Text { name, value } => form.text(name.clone(), value.clone()),
                MultipartField::File { name, file_name, bytes, mime } => {
                    let mut part = Part::bytes(bytes.clone()).file_name(file_name.clone());
                    if let Some(mime) = mime {
                        part = part.mime_str(mime).map_err(|e| {
                            ClientError::Config(format!("Invalid MIME type {mime}: {e}"))
                        })?;
                    }
                    form.part(name.clone(), part)
                }
            };
        }
        Ok(form)
    }
}

/// A single operation against the API
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: RequestBody,
    attach_token: bool,
    allow_refresh: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            attach_token: true,
            allow_refresh: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body =
            RequestBody::Form(fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    pub fn multipart(mut self, payload: MultipartPayload) -> Self {
        self.body = RequestBody::Multipart(payload);
        self
    }

    pub fn binary(mut self, bytes: Vec<u8>) -> Self {
        self.body = RequestBody::Binary(bytes);
        self
    }

    /// Never answer a 401 on this request with a token refresh.
    pub fn without_refresh(mut self) -> Self {
        self.allow_refresh = false;
        self
    }

    /// Send without credentials and without refresh handling (login, refresh).
    pub fn public(mut self) -> Self {
        self.attach_token = false;
        self.allow_refresh = false;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn attaches_token(&self) -> bool {
        self.attach_token
    }

    pub fn allows_refresh(&self) -> bool {
        self.allow_refresh
    }
}
