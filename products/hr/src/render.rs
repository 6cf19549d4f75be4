use std::fmt::Write;

use crate::state::{LoadPhase, ViewState};

const NAV_RELS: [&str; 4] = ["first", "prev", "next", "last"];

/// Plain-text rendering of the view: page header, employee table, the
/// navigation controls on offer, and the fields a create form asks for.
pub fn render(state: &ViewState) -> String {
    let mut out = String::new();
    match state.phase {
        LoadPhase::Idle => {
            out.push_str("(not loaded)\n");
            return out;
        }
        LoadPhase::Loading if state.generation == 0 => {
            out.push_str("loading...\n");
            return out;
        }
        LoadPhase::Loading => out.push_str("refreshing...\n"),
        LoadPhase::Loaded => {}
    }

    let _ = writeln!(
        out,
        "Employees  page {} of {}  ({} total, {} per page)",
        state.page.number + 1,
        state.page.total_pages.max(1),
        state.page.total_elements,
        state.page_size
    );

    let mut widths: Vec<usize> = state
        .attributes
        .iter()
        .map(|field| field.title.chars().count())
        .collect();
    let rows: Vec<Vec<String>> = state
        .employees
        .iter()
        .map(|employee| {
            state
                .attributes
                .iter()
                .map(|field| employee.display_field(&field.name))
                .collect()
        })
        .collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    out.push_str("  # ");
    for (field, width) in state.attributes.iter().zip(&widths) {
        let _ = write!(out, " {:<width$}", field.title, width = *width);
    }
    out.push('\n');
    for (index, row) in rows.iter().enumerate() {
        let _ = write!(out, "{index:>3} ");
        for (cell, width) in row.iter().zip(&widths) {
            let _ = write!(out, " {cell:<width$}", width = *width);
        }
        out.push('\n');
    }
    if rows.is_empty() {
        out.push_str("  (no employees)\n");
    }

    let nav: Vec<&str> = NAV_RELS
        .into_iter()
        .filter(|rel| state.links.contains(rel))
        .collect();
    if !nav.is_empty() {
        let _ = writeln!(out, "navigate: {}", nav.join(" "));
    }
    if !state.attributes.is_empty() {
        let _ = writeln!(out, "fields: {}", state.attribute_names().join(" "));
    }
    out
}

#[cfg(test)]
mod tests {
    use platform_hal::{FieldDescriptor, FieldKind, Link, Links, PageMetadata, Response, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::record::EmployeeResource;

    fn loaded() -> ViewState {
        let employee = EmployeeResource::from_response(Response {
            url: "http://localhost:8080/api/employees/1".into(),
            status: StatusCode::OK,
            headers: Default::default(),
            entity: json!({"firstName": "Frodo", "lastName": "Baggins"}),
        })
        .unwrap();
        let mut links = Links::default();
        links.insert("next", Link::new("http://localhost:8080/api/employees?page=1&size=1"));
        links.insert("last", Link::new("http://localhost:8080/api/employees?page=2&size=1"));
        links.insert("profile", Link::new("http://localhost:8080/api/profile/employees"));
        ViewState {
            phase: LoadPhase::Loaded,
            page: PageMetadata {
                size: 1,
                total_elements: 3,
                total_pages: 3,
                number: 0,
            },
            employees: vec![employee],
            attributes: vec![
                FieldDescriptor {
                    name: "firstName".into(),
                    title: "First name".into(),
                    kind: FieldKind::Text,
                },
                FieldDescriptor {
                    name: "lastName".into(),
                    title: "Last name".into(),
                    kind: FieldKind::Text,
                },
            ],
            page_size: 1,
            links,
            generation: 1,
        }
    }

    #[test]
    fn renders_table_and_offered_controls() {
        let text = render(&loaded());
        assert!(text.starts_with("Employees  page 1 of 3  (3 total, 1 per page)\n"));
        assert!(text.contains("First name"));
        assert!(text.contains("  0  Frodo"));
        assert!(text.contains("navigate: next last\n"));
        assert!(!text.contains("profile"));
        assert!(text.ends_with("fields: firstName lastName\n"));
    }

    #[test]
    fn first_load_shows_only_progress() {
        let state = ViewState {
            phase: LoadPhase::Loading,
            ..ViewState::default()
        };
        assert_eq!(render(&state), "loading...\n");
    }

    #[test]
    fn refresh_keeps_showing_the_last_page() {
        let mut state = loaded();
        state.phase = LoadPhase::Loading;
        let text = render(&state);
        assert!(text.starts_with("refreshing...\n"));
        assert!(text.contains("Frodo"));
    }
}
