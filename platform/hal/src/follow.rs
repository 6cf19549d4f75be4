use tracing::{instrument, trace};

use crate::client::{Request, Response, RestClient};
use crate::error::HalResult;
use crate::uri_template;

/// One hop of a traversal: a relation name plus optional template params.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub rel: String,
    pub params: Vec<(String, String)>,
}

impl Step {
    pub fn rel(rel: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }
}

impl From<&str> for Step {
    fn from(rel: &str) -> Self {
        Step::rel(rel)
    }
}

/// Walks `steps` from `root`, resolving each relation against the `_links` of
/// the previous response.
///
/// Params named by the link's URI template are expanded into it; the rest are
/// appended as query parameters. Fails with
/// [`HalError::MissingRelation`](crate::HalError::MissingRelation) when a
/// relation is absent.
#[instrument(name = "hal.follow", skip(client, steps), fields(steps = steps.len()))]
pub async fn follow<C>(client: &C, root: &str, steps: &[Step]) -> HalResult<Response>
where
    C: RestClient + ?Sized,
{
    let mut current = client.send(Request::get(root)).await?;
    for step in steps {
        let links = current.links()?;
        let link = links.require(&step.rel, &current.url)?;
        let expanded = uri_template::expand(&link.href, &step.params);
        trace!(rel = %step.rel, uri = %expanded.uri, "following relation");
        current = client
            .send(Request::get(expanded.uri).with_params(expanded.unused))
            .await?;
    }
    Ok(current)
}
