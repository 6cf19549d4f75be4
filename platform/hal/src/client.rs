//! REST transport returning `{entity, headers, status}` responses.

use async_trait::async_trait;
use reqwest::{
    Method, StatusCode,
    header::{ACCEPT, CONTENT_TYPE, ETAG, HeaderMap, HeaderValue, IF_MATCH},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{Span, debug, instrument};
use url::Url;
use uuid::Uuid;

use crate::error::{HalError, HalResult};
use crate::links::Links;

pub const HAL_JSON: &str = "application/hal+json";
pub const SCHEMA_JSON: &str = "application/schema+json";
pub const REQUEST_ID: &str = "x-request-id";

#[derive(Clone, Debug)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub entity: Option<Value>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            headers: HeaderMap::new(),
            entity: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, entity: Value) -> Self {
        Self::new(Method::POST, path).with_entity(entity)
    }

    pub fn put(path: impl Into<String>, entity: Value) -> Self {
        Self::new(Method::PUT, path).with_entity(entity)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_entity(mut self, entity: Value) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.entity = Some(entity);
        self
    }

    pub fn with_params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn accept(mut self, mime: &'static str) -> Self {
        self.headers.insert(ACCEPT, HeaderValue::from_static(mime));
        self
    }

    pub fn if_match(mut self, etag: &str) -> HalResult<Self> {
        let value = HeaderValue::from_str(etag).map_err(|_| HalError::InvalidHeader("If-Match"))?;
        self.headers.insert(IF_MATCH, value);
        Ok(self)
    }
}

#[derive(Clone, Debug)]
pub struct Response {
    pub url: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub entity: Value,
}

impl Response {
    pub fn links(&self) -> HalResult<Links> {
        Links::from_entity(&self.entity)
    }

    pub fn etag(&self) -> Option<&str> {
        self.headers.get(ETAG).and_then(|value| value.to_str().ok())
    }

    pub fn decode<T: DeserializeOwned>(&self) -> HalResult<T> {
        Ok(serde_json::from_value(self.entity.clone())?)
    }
}

/// Transport seam used by the follower and the view layer.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Sends a request. Statuses >= 400 come back as [`HalError::Status`].
    async fn send(&self, request: Request) -> HalResult<Response>;
}

/// Resolves a request path against `base` and appends its params as query
/// pairs.
pub fn resolve(base: &Url, request: &Request) -> HalResult<Url> {
    let mut url = base.join(&request.path).map_err(|source| HalError::InvalidUri {
        uri: request.path.clone(),
        source,
    })?;
    if !request.params.is_empty() {
        let mut query = url.query_pairs_mut();
        for (key, value) in &request.params {
            query.append_pair(key, value);
        }
    }
    Ok(url)
}

/// Builds the error for a rejected response.
pub fn status_error(method: Method, response: Response) -> HalError {
    HalError::Status {
        method,
        url: response.url.clone(),
        status: response.status,
        response: Box::new(response),
    }
}

#[derive(Clone, Debug)]
pub struct HttpRestClient {
    http: reqwest::Client,
    base: Url,
}

impl HttpRestClient {
    pub fn new(base_url: &str) -> HalResult<Self> {
        let base = Url::parse(base_url).map_err(|source| HalError::InvalidUri {
            uri: base_url.to_string(),
            source,
        })?;
        Ok(Self::with_client(reqwest::Client::new(), base))
    }

    pub fn with_client(http: reqwest::Client, base: Url) -> Self {
        Self { http, base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

#[async_trait]
impl RestClient for HttpRestClient {
    #[instrument(name = "hal.request", skip_all, fields(method = %request.method, url = tracing::field::Empty))]
    async fn send(&self, request: Request) -> HalResult<Response> {
        let url = resolve(&self.base, &request)?;
        Span::current().record("url", url.as_str());

        let mut headers = request.headers;
        if !headers.contains_key(ACCEPT) {
            headers.insert(ACCEPT, HeaderValue::from_static(HAL_JSON));
        }
        let mut builder = self
            .http
            .request(request.method.clone(), url.clone())
            .header(REQUEST_ID, Uuid::new_v4().to_string())
            .headers(headers);
        if let Some(entity) = &request.entity {
            builder = builder.body(serde_json::to_vec(entity)?);
        }

        let reply = builder.send().await?;
        let status = reply.status();
        let headers = reply.headers().clone();
        let body = reply.bytes().await?;
        let entity = match serde_json::from_slice::<Value>(&body) {
            Ok(entity) => entity,
            Err(_) if body.is_empty() || !status.is_success() => Value::Null,
            Err(err) => return Err(err.into()),
        };
        debug!(%status, "response received");

        let response = Response {
            url: url.to_string(),
            status,
            headers,
            entity,
        };
        if status.is_client_error() || status.is_server_error() {
            return Err(status_error(request.method, response));
        }
        Ok(response)
    }
}
