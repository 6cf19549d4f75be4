//! The employee view component.
//!
//! Holds the view state in a `watch` channel and exposes the lifecycle
//! operations the front-end and the push channel drive. State is written
//! only by whole-value replacement once a fetch has fully completed.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use futures::future::try_join_all;
use platform_hal::{
    CollectionPage, HalResult, JsonSchema, Links, Request, RestClient, SCHEMA_JSON, StatusCode,
    Step, follow,
};
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::notice::{Action, MutationOutcome, Notice, Notifier};
use crate::push::PushAction;
use crate::record::EmployeeResource;
use crate::state::{LoadPhase, ViewState};

pub const EMPLOYEES_REL: &str = "employees";

pub struct EmployeeConsole {
    client: Arc<dyn RestClient>,
    root: String,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<ViewState>,
    generation: AtomicU64,
}

/// Result of one completed fetch, applied in a single state write.
struct Replacement {
    page: CollectionPage,
    employees: Vec<EmployeeResource>,
    /// `None` keeps the current attributes.
    attributes: Option<Vec<platform_hal::FieldDescriptor>>,
    /// `None` keeps the current page size.
    page_size: Option<u64>,
}

impl EmployeeConsole {
    pub fn new(
        client: Arc<dyn RestClient>,
        root: impl Into<String>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self {
            client,
            root: root.into(),
            notifier,
            state,
            generation: AtomicU64::new(0),
        }
    }

    /// Page size used by [`mount`](Self::mount).
    pub fn with_page_size(self, page_size: u64) -> Self {
        self.state.send_modify(|state| state.page_size = page_size);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Initial load at the configured page size.
    pub async fn mount(&self) -> HalResult<()> {
        let page_size = self.state.borrow().page_size;
        self.load_from_server(page_size).await
    }

    #[instrument(skip(self))]
    pub async fn load_from_server(&self, page_size: u64) -> HalResult<()> {
        let ticket = self.begin_load();
        let collection = follow(
            self.client.as_ref(),
            &self.root,
            &[Step::rel(EMPLOYEES_REL).param("size", page_size)],
        )
        .await?;
        let page = CollectionPage::from_entity(&collection.entity, EMPLOYEES_REL)?;

        let profile = page.links.require("profile", &collection.url)?.uri();
        let schema = self
            .client
            .send(Request::get(profile).accept(SCHEMA_JSON))
            .await?;
        let mut schema = JsonSchema::from_entity(&schema.entity)?;
        schema.retain_editable();

        let employees = self.fetch_employees(&page.items).await?;
        self.commit(
            ticket,
            Replacement {
                page,
                employees,
                attributes: Some(schema.fields()),
                page_size: Some(page_size),
            },
        );
        Ok(())
    }

    /// Posts a new record to the collection. State is left alone; the
    /// `newEmployee` broadcast triggers the refresh.
    #[instrument(skip_all)]
    pub async fn on_create(&self, record: Map<String, Value>) -> HalResult<()> {
        let collection = follow(self.client.as_ref(), &self.root, &[Step::rel(EMPLOYEES_REL)]).await?;
        let target = collection.links()?.require("self", &collection.url)?.uri();
        self.client
            .send(Request::post(target, Value::Object(record)))
            .await?;
        info!("employee submitted");
        Ok(())
    }

    /// PUTs `updated` guarded by the existing record's entity tag.
    #[instrument(skip_all)]
    pub async fn on_update(
        &self,
        existing: &EmployeeResource,
        updated: Map<String, Value>,
    ) -> HalResult<MutationOutcome> {
        let href = existing.self_uri()?;
        let mut request = Request::put(href.clone(), Value::Object(updated));
        if let Some(etag) = &existing.etag {
            request = request.if_match(etag)?;
        }
        match self.client.send(request).await {
            Ok(_) => Ok(MutationOutcome::Submitted),
            Err(err) => match err.status() {
                Some(StatusCode::FORBIDDEN) => Ok(self.deny(Notice::AccessDenied {
                    action: Action::Update,
                    href,
                })),
                Some(StatusCode::PRECONDITION_FAILED) => Ok(self.deny(Notice::StaleCopy { href })),
                _ => Err(err),
            },
        }
    }

    #[instrument(skip_all)]
    pub async fn on_delete(&self, existing: &EmployeeResource) -> HalResult<MutationOutcome> {
        let href = existing.self_uri()?;
        match self.client.send(Request::delete(href.clone())).await {
            Ok(_) => Ok(MutationOutcome::Submitted),
            Err(err) if err.status() == Some(StatusCode::FORBIDDEN) => {
                Ok(self.deny(Notice::AccessDenied {
                    action: Action::Delete,
                    href,
                }))
            }
            Err(err) => Err(err),
        }
    }

    /// Loads an arbitrary collection link, keeping page size and attributes.
    pub async fn on_navigate(&self, uri: &str) -> HalResult<()> {
        let ticket = self.begin_load();
        self.navigate(ticket, uri).await
    }

    /// Reloads at `page_size` when it differs from the current size.
    /// Returns whether a reload happened.
    pub async fn update_page_size(&self, page_size: u64) -> HalResult<bool> {
        if page_size == self.state.borrow().page_size {
            return Ok(false);
        }
        self.load_from_server(page_size).await?;
        Ok(true)
    }

    /// Handler for `newEmployee`: jump to the last page, where the new record
    /// lands.
    #[instrument(skip(self))]
    pub async fn refresh_and_go_to_last_page(&self) -> HalResult<()> {
        let ticket = self.begin_load();
        let page_size = self.state.borrow().page_size;
        let collection = follow(
            self.client.as_ref(),
            &self.root,
            &[Step::rel(EMPLOYEES_REL).param("size", page_size)],
        )
        .await?;
        let last = collection.links()?.require("last", &collection.url)?.uri();
        self.navigate(ticket, &last).await
    }

    /// Handler for `updateEmployee` and `deleteEmployee`.
    #[instrument(skip(self))]
    pub async fn refresh_current_page(&self) -> HalResult<()> {
        let ticket = self.begin_load();
        let (page_size, number) = {
            let state = self.state.borrow();
            (state.page_size, state.page.number)
        };
        let collection = follow(
            self.client.as_ref(),
            &self.root,
            &[Step::rel(EMPLOYEES_REL)
                .param("size", page_size)
                .param("page", number)],
        )
        .await?;
        let page = CollectionPage::from_entity(&collection.entity, EMPLOYEES_REL)?;
        let employees = self.fetch_employees(&page.items).await?;
        self.commit(
            ticket,
            Replacement {
                page,
                employees,
                attributes: None,
                page_size: None,
            },
        );
        Ok(())
    }

    pub async fn handle_push(&self, action: PushAction) -> HalResult<()> {
        match action {
            PushAction::RefreshAndGoToLastPage => self.refresh_and_go_to_last_page().await,
            PushAction::RefreshCurrentPage => self.refresh_current_page().await,
        }
    }

    async fn navigate(&self, ticket: u64, uri: &str) -> HalResult<()> {
        let collection = self.client.send(Request::get(uri)).await?;
        let page = CollectionPage::from_entity(&collection.entity, EMPLOYEES_REL)?;
        let employees = self.fetch_employees(&page.items).await?;
        self.commit(
            ticket,
            Replacement {
                page,
                employees,
                attributes: None,
                page_size: None,
            },
        );
        Ok(())
    }

    /// Fetches every embedded employee by its self link concurrently; one
    /// failure fails the whole page.
    async fn fetch_employees(&self, items: &[Value]) -> HalResult<Vec<EmployeeResource>> {
        let fetches = items.iter().map(|item| async move {
            let href = Links::from_entity(item)?
                .require("self", "embedded employee")?
                .uri();
            let response = self.client.send(Request::get(href)).await?;
            EmployeeResource::from_response(response)
        });
        try_join_all(fetches).await
    }

    fn begin_load(&self) -> u64 {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_if_modified(|state| {
            if state.phase == LoadPhase::Loading {
                return false;
            }
            state.phase = LoadPhase::Loading;
            true
        });
        ticket
    }

    fn commit(&self, ticket: u64, next: Replacement) -> bool {
        let applied = self.state.send_if_modified(|state| {
            if ticket < self.generation.load(Ordering::SeqCst) {
                return false;
            }
            *state = ViewState {
                phase: LoadPhase::Loaded,
                page: next.page.page,
                employees: next.employees,
                attributes: next
                    .attributes
                    .unwrap_or_else(|| std::mem::take(&mut state.attributes)),
                page_size: next.page_size.unwrap_or(state.page_size),
                links: next.page.links,
                generation: ticket,
            };
            true
        });
        if applied {
            let state = self.state.borrow();
            debug!(
                ticket,
                page = state.page.number,
                employees = state.employees.len(),
                "view state replaced"
            );
        } else {
            debug!(ticket, "discarding superseded load");
        }
        applied
    }

    fn deny(&self, notice: Notice) -> MutationOutcome {
        self.notifier.notify(&notice);
        MutationOutcome::Denied(notice)
    }
}
