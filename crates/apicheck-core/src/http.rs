//! Read-only views of one HTTP exchange
//!
//! Host adapters implement [`HttpRequest`] and [`HttpResponse`] over their own
//! client or server types. [`SimpleRequest`] and [`SimpleResponse`] are plain
//! owned implementations for tests and for hosts that already hold the data.

use crate::values::Values;

/// The request side of an exchange
pub trait HttpRequest {
    /// HTTP method, any case
    fn method(&self) -> &str;

    /// Full request URL including query string, or an origin-form path such
    /// as `/users?page=2`
    fn request_url(&self) -> &str;

    fn header_values(&self) -> &Values;

    fn query_values(&self) -> &Values;

    /// Decoded form fields of a form-encoded or multipart body
    fn form_values(&self) -> &Values;

    fn content_type(&self) -> Option<&str>;

    fn content(&self) -> &[u8];
}

/// The response side of an exchange
pub trait HttpResponse {
    fn status(&self) -> u16;

    fn header_values(&self) -> &Values;

    fn content_type(&self) -> Option<&str>;

    fn content(&self) -> &[u8];
}

/// Owned [`HttpRequest`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleRequest {
    method: String,
    url: String,
    headers: Values,
    query: Values,
    form: Values,
    content_type: Option<String>,
    content: Vec<u8>,
}

impl SimpleRequest {
    /// Query values are taken from the query string of `url`
    pub fn new<M: Into<String>, U: Into<String>>(method: M, url: U) -> Self {
        let url = url.into();
        let query = url
            .split_once('?')
            .map(|(_, q)| Values::from_query(q.split('#').next().unwrap_or_default()))
            .unwrap_or_default();
        Self {
            method: method.into(),
            url,
            query,
            ..Self::default()
        }
    }

    pub fn get<U: Into<String>>(url: U) -> Self {
        Self::new("GET", url)
    }

    pub fn with_header<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.headers.add_value(name, value);
        self
    }

    pub fn with_form_value<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.form.add_value(name, value);
        self
    }

    pub fn with_content_type<C: Into<String>>(mut self, content_type: C) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_content<B: Into<Vec<u8>>>(mut self, content: B) -> Self {
        self.content = content.into();
        self
    }
}

impl HttpRequest for SimpleRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn request_url(&self) -> &str {
        &self.url
    }

    fn header_values(&self) -> &Values {
        &self.headers
    }

    fn query_values(&self) -> &Values {
        &self.query
    }

    fn form_values(&self) -> &Values {
        &self.form
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn content(&self) -> &[u8] {
        &self.content
    }
}

/// Owned [`HttpResponse`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleResponse {
    status: u16,
    headers: Values,
    content_type: Option<String>,
    content: Vec<u8>,
}

impl SimpleResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_header<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.headers.add_value(name, value);
        self
    }

    pub fn with_content_type<C: Into<String>>(mut self, content_type: C) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_content<B: Into<Vec<u8>>>(mut self, content: B) -> Self {
        self.content = content.into();
        self
    }
}

impl HttpResponse for SimpleResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn header_values(&self) -> &Values {
        &self.headers
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn content(&self) -> &[u8] {
        &self.content
    }
}
