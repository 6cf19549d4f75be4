use std::sync::Arc;

use anyhow::{Context, Result};
use platform_hal::HttpRestClient;
use products_hr::{
    Action, EmployeeConsole, LoadPhase, MutationOutcome, Notice, NoticeLog, build_record,
    merge_record,
};
use serde_json::{Value, json};
use suite_tests::{LOCKED_MANAGER, TestServer};

fn staff(count: usize) -> Vec<Value> {
    (1..=count)
        .map(|n| json!({"firstName": format!("First{n}"), "lastName": format!("Last{n}"), "description": "staff"}))
        .collect()
}

fn console(server: &TestServer) -> Result<(EmployeeConsole, Arc<NoticeLog>)> {
    let client = HttpRestClient::new(&server.base_url)?;
    let notices = Arc::new(NoticeLog::default());
    let console = EmployeeConsole::new(Arc::new(client), "/api", notices.clone());
    Ok((console, notices))
}

#[tokio::test]
async fn mount_loads_first_page_with_editable_attributes() -> Result<()> {
    let server = TestServer::spawn(staff(5)).await?;
    let (console, _) = console(&server)?;

    console.mount().await?;

    let state = console.snapshot();
    assert_eq!(state.phase, LoadPhase::Loaded);
    assert_eq!(state.attribute_names(), ["firstName", "lastName", "description"]);
    assert_eq!(state.page.number, 0);
    assert_eq!(state.page.total_elements, 5);
    assert_eq!(state.employees.len(), 2);
    assert_eq!(state.employees[1].display_field("lastName"), "Last2");
    assert_eq!(state.employees[0].etag.as_deref(), Some("\"0\""));
    assert_eq!(server.count("GET /api/employees/1"), 1);
    assert_eq!(server.count("GET /api/employees/2"), 1);

    let seen = server.seen();
    let profile = seen
        .iter()
        .find(|request| request.line == "GET /api/profile/employees")
        .context("profile request")?;
    assert_eq!(profile.accept.as_deref(), Some("application/schema+json"));
    for request in seen.iter().filter(|request| request.line != profile.line) {
        assert_eq!(request.accept.as_deref(), Some("application/hal+json"), "{}", request.line);
    }
    assert!(seen.iter().all(|request| request.request_id.is_some()));
    Ok(())
}

#[tokio::test]
async fn paging_and_page_size_changes() -> Result<()> {
    let server = TestServer::spawn(staff(5)).await?;
    let (console, _) = console(&server)?;
    console.mount().await?;

    let last = console.snapshot().links.get("last").context("last link")?.uri();
    console.on_navigate(&last).await?;
    let state = console.snapshot();
    assert_eq!(state.page.number, 2);
    assert_eq!(state.employees.len(), 1);
    assert_eq!(state.employees[0].display_field("firstName"), "First5");
    assert!(state.links.contains("prev"));
    assert!(!state.links.contains("next"));

    server.clear_requests();
    assert!(!console.update_page_size(2).await?);
    assert!(server.requests().is_empty());

    assert!(console.update_page_size(4).await?);
    let state = console.snapshot();
    assert_eq!(state.page_size, 4);
    assert_eq!(state.page.number, 0);
    assert_eq!(state.employees.len(), 4);
    assert_eq!(server.count("GET /api/employees?size=4"), 1);
    Ok(())
}

#[tokio::test]
async fn update_with_current_tag_is_accepted() -> Result<()> {
    let server = TestServer::spawn(staff(2)).await?;
    let (console, notices) = console(&server)?;
    console.mount().await?;

    let state = console.snapshot();
    let existing = &state.employees[0];
    let record = merge_record(existing, &state.attributes, &[("description".into(), "lead".into())])?;
    let outcome = console.on_update(existing, record).await?;

    assert_eq!(outcome, MutationOutcome::Submitted);
    assert!(notices.notices().is_empty());
    let stored = server.employee(1).context("employee 1")?;
    assert_eq!(stored["description"], "lead");
    assert_eq!(stored["firstName"], "First1");
    Ok(())
}

#[tokio::test]
async fn stale_copy_is_refused_and_state_kept() -> Result<()> {
    let server = TestServer::spawn(staff(2)).await?;
    let (console, notices) = console(&server)?;
    console.mount().await?;
    server.touch(1, "description", json!("edited elsewhere"))?;

    let before = console.snapshot();
    let existing = &before.employees[0];
    let record = merge_record(existing, &before.attributes, &[("lastName".into(), "Gamgee".into())])?;
    let outcome = console.on_update(existing, record).await?;

    let href = format!("{}/api/employees/1", server.base_url);
    assert_eq!(outcome, MutationOutcome::Denied(Notice::StaleCopy { href: href.clone() }));
    assert_eq!(
        notices.notices()[0].to_string(),
        format!("DENIED: Unable to update {href}. Your copy is stale.")
    );
    assert_eq!(console.snapshot(), before);
    assert_eq!(server.employee(1).context("employee 1")?["lastName"], "Last1");
    Ok(())
}

#[tokio::test]
async fn locked_records_are_access_denied() -> Result<()> {
    let mut seed = staff(2);
    seed[1]["manager"] = json!(LOCKED_MANAGER);
    let server = TestServer::spawn(seed).await?;
    let (console, notices) = console(&server)?;
    console.mount().await?;

    let state = console.snapshot();
    let locked = &state.employees[1];
    console.on_update(locked, locked.record.clone()).await?;
    console.on_delete(locked).await?;

    let href = format!("{}/api/employees/2", server.base_url);
    assert_eq!(
        notices.notices(),
        [
            Notice::AccessDenied {
                action: Action::Update,
                href: href.clone()
            },
            Notice::AccessDenied {
                action: Action::Delete,
                href: href.clone()
            },
        ]
    );
    assert_eq!(
        notices.notices()[1].to_string(),
        format!("ACCESS DENIED: You are not authorized to delete {href}")
    );
    assert_eq!(server.len(), 2);
    Ok(())
}

#[tokio::test]
async fn create_and_delete_reach_the_server() -> Result<()> {
    let server = TestServer::spawn(staff(1)).await?;
    let (console, _) = console(&server)?;
    console.mount().await?;

    let attributes = console.snapshot().attributes;
    let record = build_record(
        &attributes,
        &[
            ("firstName".into(), "Samwise".into()),
            ("lastName".into(), "Gamgee".into()),
        ],
    )?;
    console.on_create(record).await?;
    assert_eq!(server.len(), 2);
    assert_eq!(server.count("POST /api/employees"), 1);

    let first = console.snapshot().employees[0].clone();
    assert_eq!(console.on_delete(&first).await?, MutationOutcome::Submitted);
    assert_eq!(server.len(), 1);
    assert!(server.employee(1).is_none());
    Ok(())
}
