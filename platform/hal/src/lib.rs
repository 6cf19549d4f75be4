//! Hypermedia (HAL) client primitives shared by product slices.

pub mod client;
pub mod error;
pub mod follow;
pub mod links;
pub mod schema;
pub mod uri_template;

pub use client::{HAL_JSON, HttpRestClient, Request, Response, RestClient, SCHEMA_JSON};
pub use error::{HalError, HalResult};
pub use follow::{Step, follow};
pub use links::{CollectionPage, Link, Links, PageMetadata};
pub use schema::{FieldDescriptor, FieldKind, JsonSchema};

pub use reqwest::{Method, StatusCode, header};
