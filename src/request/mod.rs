//! Immutable HTTP request model with copy-on-write mutation.
//!
//! A [`GatewayRequest`] is the (method, url, headers) tuple the host
//! gateway hands the filter. Mutating operations never touch the original:
//! each one rebuilds the request and returns a new value, which is what the
//! facade swaps in behind its handle.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use thiserror::Error;
use url::Url;

pub mod facade;

pub use facade::RequestFacade;

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(String),

    #[error("Invalid value for header {0}")]
    InvalidHeaderValue(String),

    #[error("At least one value is required for {0}")]
    MissingValues(String),
}

/// An immutable snapshot of an inbound HTTP request.
///
/// Headers are a case-insensitive ordered multimap; query parameters are
/// case-sensitive and keep the order they appear in the URL.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
}

impl GatewayRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
        }
    }

    /// Appends a header, keeping any existing values for the same name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// All values of a header, in insertion order. Absent when the header
    /// does not exist. Values that are not valid UTF-8 are skipped.
    pub fn header(&self, name: &str) -> Option<Vec<String>> {
        if !self.headers.contains_key(name) {
            return None;
        }
        Some(
            self.headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok().map(str::to_owned))
                .collect(),
        )
    }

    pub fn first_header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    }

    /// Full header view as (name, values) pairs, one entry per distinct name.
    pub fn header_multimap(&self) -> Vec<(String, Vec<String>)> {
        self.headers
            .keys()
            .map(|name| {
                (
                    name.as_str().to_owned(),
                    self.headers
                        .get_all(name)
                        .iter()
                        .filter_map(|v| v.to_str().ok().map(str::to_owned))
                        .collect(),
                )
            })
            .collect()
    }

    /// Query parameters as decoded (key, value) pairs in URL order.
    pub fn query_params(&self) -> Vec<(String, String)> {
        self.url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// All values of a query parameter, in URL order. Keys are
    /// case-sensitive. Absent when the parameter does not exist.
    pub fn query_param(&self, name: &str) -> Option<Vec<String>> {
        let values: Vec<String> = self
            .url
            .query_pairs()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values)
        }
    }

    pub fn first_query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// Query view as (key, values) pairs, one entry per distinct key in
    /// first-seen order.
    pub fn query_multimap(&self) -> Vec<(String, Vec<String>)> {
        let mut entries: Vec<(String, Vec<String>)> = Vec::new();
        for (key, value) in self.url.query_pairs() {
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some((_, values)) => values.push(value.into_owned()),
                None => entries.push((key.into_owned(), vec![value.into_owned()])),
            }
        }
        entries
    }

    /// Returns a new request with all values of `name` replaced by the
    /// given ordered list. Other headers are untouched.
    pub fn set_header(&self, name: &str, values: &[String]) -> Result<Self, RequestError> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| RequestError::InvalidHeaderName(name.to_owned()))?;

        let mut headers = self.headers.clone();
        headers.remove(&header_name);
        for value in values {
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| RequestError::InvalidHeaderValue(name.to_owned()))?;
            headers.append(header_name.clone(), header_value);
        }

        Ok(Self {
            method: self.method.clone(),
            url: self.url.clone(),
            headers,
        })
    }

    /// Returns a new request without any value for `name`.
    pub fn remove_header(&self, name: &str) -> Self {
        let mut headers = self.headers.clone();
        headers.remove(name);
        Self {
            method: self.method.clone(),
            url: self.url.clone(),
            headers,
        }
    }

    /// Returns a new request with all values of the query parameter `name`
    /// replaced. The URL is rebuilt preserving scheme, authority, path and
    /// fragment; other parameters keep their relative order.
    pub fn set_query_param(&self, name: &str, values: &[String]) -> Self {
        let mut pairs: Vec<(String, String)> = self
            .query_params()
            .into_iter()
            .filter(|(k, _)| k != name)
            .collect();
        pairs.extend(values.iter().map(|v| (name.to_owned(), v.clone())));
        self.with_query(pairs)
    }

    /// Returns a new request without the query parameter `name`.
    pub fn remove_query_param(&self, name: &str) -> Self {
        let pairs: Vec<(String, String)> = self
            .query_params()
            .into_iter()
            .filter(|(k, _)| k != name)
            .collect();
        self.with_query(pairs)
    }

    fn with_query(&self, pairs: Vec<(String, String)>) -> Self {
        let mut url = self.url.clone();
        if pairs.is_empty() {
            url.set_query(None);
        } else {
            let mut serializer = url.query_pairs_mut();
            serializer.clear();
            serializer.extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Self {
            method: self.method.clone(),
            url,
            headers: self.headers.clone(),
        }
    }
}
