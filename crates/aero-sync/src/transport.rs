//! Request/response seam between the bridge and the backend.
//!
//! The bridge builds [`Request`]s from path segments and hands them to a
//! [`Transport`]. [`crate::http::HttpTransport`] speaks HTTP; the
//! in-memory backend (feature `test-helpers`) answers the same requests
//! without a network.

use std::rc::Rc;

use serde_json::Value;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
        }
    }
}

/// One backend request, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Bridge operation that issued the request (for errors and logs).
    pub operation: &'static str,
    pub method: Method,
    /// Path segments, unescaped (`["teams", "team001", "battery"]`).
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Request {
    fn new<S: Into<String>>(
        operation: &'static str,
        method: Method,
        segments: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            operation,
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get<S: Into<String>>(operation: &'static str, segments: impl IntoIterator<Item = S>) -> Self {
        Self::new(operation, Method::Get, segments)
    }

    pub fn post<S: Into<String>>(operation: &'static str, segments: impl IntoIterator<Item = S>) -> Self {
        Self::new(operation, Method::Post, segments)
    }

    pub fn put<S: Into<String>>(operation: &'static str, segments: impl IntoIterator<Item = S>) -> Self {
        Self::new(operation, Method::Put, segments)
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// `/seg/seg` form, for logs.
    #[must_use]
    pub fn path(&self) -> String {
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            path.push_str(segment);
        }
        path
    }

    /// Value of query parameter `key`.
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A decoded backend reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests to the backend.
///
/// Implementations run on a single-threaded executor; returned futures
/// need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Perform `request`. Transport failures are errors; non-success
    /// statuses are returned as responses.
    async fn send(&self, request: Request) -> Result<Response>;
}

impl<T: Transport> Transport for Rc<T> {
    async fn send(&self, request: Request) -> Result<Response> {
        (**self).send(request).await
    }
}
