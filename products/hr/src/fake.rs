//! In-memory HAL API for component tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use platform_hal::{
    HalResult, Method, Request, Response, RestClient, StatusCode,
    client::{resolve, status_error},
    header::{ACCEPT, ETAG, HeaderMap, HeaderName, HeaderValue, IF_MATCH},
};
use serde_json::{Value, json};
use url::Url;

const API: &str = "http://localhost:8080/api";

#[derive(Clone, Debug)]
struct Route {
    status: StatusCode,
    entity: Value,
    etag: Option<String>,
    delay: Option<Duration>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Logged {
    pub method: Method,
    pub url: String,
    pub if_match: Option<String>,
    pub accept: Option<String>,
    pub entity: Option<Value>,
}

pub(crate) struct FakeApi {
    base: Url,
    routes: Mutex<HashMap<(Method, String), Route>>,
    log: Mutex<Vec<Logged>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            base: Url::parse("http://localhost:8080").unwrap(),
            routes: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn on(&self, method: Method, url: &str, status: StatusCode, entity: Value) {
        self.insert(method, url, status, entity, None);
    }

    fn insert(&self, method: Method, url: &str, status: StatusCode, entity: Value, etag: Option<&str>) {
        self.routes.lock().unwrap().insert(
            (method, url.to_string()),
            Route {
                status,
                entity,
                etag: etag.map(str::to_string),
                delay: None,
            },
        );
    }

    pub fn delay(&self, url: &str, delay: Duration) {
        if let Some(route) = self
            .routes
            .lock()
            .unwrap()
            .get_mut(&(Method::GET, url.to_string()))
        {
            route.delay = Some(delay);
        }
    }

    pub fn requests(&self) -> Vec<Logged> {
        self.log.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<Logged> {
        self.log.lock().unwrap().last().cloned()
    }

    pub fn clear_requests(&self) {
        self.log.lock().unwrap().clear();
    }

    /// Number of logged requests matching `"METHOD url"`.
    pub fn count(&self, needle: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|logged| format!("{} {}", logged.method, logged.url) == needle)
            .count()
    }
}

#[async_trait]
impl RestClient for FakeApi {
    async fn send(&self, request: Request) -> HalResult<Response> {
        let url = resolve(&self.base, &request)?.to_string();
        self.log.lock().unwrap().push(Logged {
            method: request.method.clone(),
            url: url.clone(),
            if_match: header_text(&request.headers, IF_MATCH),
            accept: header_text(&request.headers, ACCEPT),
            entity: request.entity.clone(),
        });

        let route = self
            .routes
            .lock()
            .unwrap()
            .get(&(request.method.clone(), url.clone()))
            .cloned();
        let Some(route) = route else {
            let response = Response {
                url,
                status: StatusCode::NOT_FOUND,
                headers: HeaderMap::new(),
                entity: Value::Null,
            };
            return Err(status_error(request.method, response));
        };
        if let Some(delay) = route.delay {
            tokio::time::sleep(delay).await;
        }

        let mut headers = HeaderMap::new();
        if let Some(etag) = &route.etag {
            headers.insert(ETAG, HeaderValue::from_str(etag).unwrap());
        }
        let response = Response {
            url,
            status: route.status,
            headers,
            entity: route.entity,
        };
        if route.status.is_client_error() || route.status.is_server_error() {
            return Err(status_error(request.method, response));
        }
        Ok(response)
    }
}

fn header_text(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn page_url(size: u64, number: u64) -> String {
    format!("{API}/employees?page={number}&size={size}")
}

fn employee_url(id: u64) -> String {
    format!("{API}/employees/{id}")
}

fn employee(id: u64) -> Value {
    json!({
        "firstName": format!("First{id}"),
        "lastName": format!("Last{id}"),
        "description": format!("Employee {id}"),
        "_links": {
            "self": {"href": employee_url(id)},
            "employee": {"href": employee_url(id)},
            "manager": {"href": format!("{}/manager", employee_url(id))}
        }
    })
}

fn collection(total: u64, size: u64, number: u64, pages: u64) -> Value {
    let first_id = number * size + 1;
    let last_id = ((number + 1) * size).min(total);
    let items: Vec<Value> = (first_id..=last_id).map(employee).collect();

    let mut links = json!({
        "self": {"href": format!("{API}/employees{{?page,size,sort}}"), "templated": true},
        "profile": {"href": format!("{API}/profile/employees")},
        "first": {"href": page_url(size, 0)},
        "last": {"href": page_url(size, pages - 1)}
    });
    if number + 1 < pages {
        links["next"] = json!({"href": page_url(size, number + 1)});
    }
    if number > 0 {
        links["prev"] = json!({"href": page_url(size, number - 1)});
    }

    json!({
        "_embedded": {"employees": items},
        "_links": links,
        "page": {"size": size, "totalElements": total, "totalPages": pages, "number": number}
    })
}

/// Registers root, profile, every page at `size`, and every employee.
pub(crate) fn seed_directory(api: &FakeApi, total: u64, size: u64) {
    api.on(
        Method::GET,
        API,
        StatusCode::OK,
        json!({"_links": {
            "employees": {"href": format!("{API}/employees{{?page,size,sort}}"), "templated": true},
            "profile": {"href": format!("{API}/profile")}
        }}),
    );
    api.on(
        Method::GET,
        &format!("{API}/profile/employees"),
        StatusCode::OK,
        json!({
            "title": "Employee",
            "properties": {
                "firstName": {"title": "First name", "type": "string"},
                "lastName": {"title": "Last name", "type": "string"},
                "description": {"title": "Description", "type": "string"},
                "manager": {"title": "Manager", "type": "string", "format": "uri"},
                "address": {"$ref": "#/definitions/address"}
            }
        }),
    );

    let pages = total.div_ceil(size).max(1);
    for number in 0..pages {
        let doc = collection(total, size, number, pages);
        if number == 0 {
            api.on(Method::GET, &format!("{API}/employees?size={size}"), StatusCode::OK, doc.clone());
            api.on(Method::GET, &format!("{API}/employees"), StatusCode::OK, doc.clone());
        }
        api.on(Method::GET, &page_url(size, number), StatusCode::OK, doc);
    }
    for id in 1..=total {
        api.insert(Method::GET, &employee_url(id), StatusCode::OK, employee(id), Some("\"0\""));
    }
}
