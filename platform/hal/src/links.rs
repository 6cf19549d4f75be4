//! HAL `_links` and paged-collection model.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{HalError, HalResult};
use crate::uri_template;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub templated: bool,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            templated: false,
        }
    }

    /// The href with any template expressions removed.
    pub fn uri(&self) -> String {
        if self.templated {
            uri_template::expand(&self.href, &[]).uri
        } else {
            self.href.clone()
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LinkEntry {
    One(Link),
    Many(Vec<Link>),
}

/// Relation name to link. Link arrays collapse to their first entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Links(BTreeMap<String, Link>);

impl<'de> Deserialize<'de> for Links {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, LinkEntry>::deserialize(deserializer)?;
        let links = raw
            .into_iter()
            .filter_map(|(rel, entry)| match entry {
                LinkEntry::One(link) => Some((rel, link)),
                LinkEntry::Many(list) => list.into_iter().next().map(|link| (rel, link)),
            })
            .collect();
        Ok(Self(links))
    }
}

impl Links {
    /// Reads `_links` from a HAL document. A document without links yields
    /// an empty set.
    pub fn from_entity(entity: &Value) -> HalResult<Self> {
        match entity.get("_links") {
            Some(raw) => Ok(serde_json::from_value(raw.clone())?),
            None => Ok(Self::default()),
        }
    }

    pub fn get(&self, rel: &str) -> Option<&Link> {
        self.0.get(rel)
    }

    pub fn require(&self, rel: &str, resource: &str) -> HalResult<&Link> {
        self.0
            .get(rel)
            .ok_or_else(|| HalError::missing_relation(rel, resource))
    }

    pub fn contains(&self, rel: &str) -> bool {
        self.0.contains_key(rel)
    }

    pub fn insert(&mut self, rel: impl Into<String>, link: Link) {
        self.0.insert(rel.into(), link);
    }

    pub fn rels(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u64,
    #[serde(default)]
    pub number: u64,
}

/// One page of a HAL collection: its links, page descriptor and the raw
/// embedded items under a given relation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollectionPage {
    pub links: Links,
    pub page: PageMetadata,
    pub items: Vec<Value>,
}

impl CollectionPage {
    pub fn from_entity(entity: &Value, rel: &str) -> HalResult<Self> {
        let links = Links::from_entity(entity)?;
        let page = match entity.get("page") {
            Some(raw) => serde_json::from_value(raw.clone())?,
            None => PageMetadata::default(),
        };
        let items = match entity.get("_embedded") {
            None => Vec::new(),
            Some(embedded) => match embedded.get(rel) {
                Some(Value::Array(items)) => items.clone(),
                Some(single @ Value::Object(_)) => vec![single.clone()],
                _ => return Err(HalError::MissingEmbedded(rel.to_string())),
            },
        };
        Ok(Self { links, page, items })
    }
}
