//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::Extensions;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::method::Method;

/// An incoming HTTP request with its body fully buffered.
///
/// Path parameters and query-string values are percent-decoded on access.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    pub(crate) extensions: Extensions,
}

impl Request {
    /// Builds a request for `target` (`/path?query`). Used by the server after
    /// reading a request off the wire, and by tests driving a [`Router`]
    /// in-process.
    ///
    /// [`Router`]: crate::Router
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_owned(), Some(query.to_owned())),
            None => (target.to_owned(), None),
        };
        Self {
            method,
            path,
            query,
            headers: Vec::new(),
            body: Bytes::new(),
            params: HashMap::new(),
            extensions: Extensions::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub(crate) fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/books/{isbn}/reviews`, `req.param("isbn")` on
    /// `/books/X1/reviews` returns `Some("X1")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns the first value of a query-string parameter, decoded.
    ///
    /// `+` is treated as a space, as HTML forms encode it.
    pub fn query(&self, key: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        query
            .split('&')
            .filter_map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_form(k) == key).then(|| decode_form(v))
            })
            .next()
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.body.is_empty() {
            return Err(Error::Validation("request body is required".to_owned()));
        }
        serde_json::from_slice(&self.body)
            .map_err(|e| Error::Validation(format!("invalid JSON body: {e}")))
    }

    /// Typed per-request values inserted by middleware (e.g. token claims).
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

/// Percent-decodes a path segment. `+` is a literal character in paths.
pub(crate) fn decode_path(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_owned(),
    }
}

fn decode_form(raw: &str) -> String {
    decode_path(&raw.replace('+', " "))
}
