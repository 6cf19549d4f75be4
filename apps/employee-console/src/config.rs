use anyhow::{Context, Result, anyhow};
use products_hr::DEFAULT_PAGE_SIZE;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub api_root: String,
    pub push_url: String,
    pub page_size: u64,
}

impl ConsoleConfig {
    pub fn load() -> Result<Self> {
        let api_base_url =
            std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".into());
        let api_root = std::env::var("API_ROOT").unwrap_or_else(|_| "/api".into());
        let push_url = std::env::var("PUSH_URL")
            .unwrap_or_else(|_| "ws://localhost:8080/payroll/websocket".into());
        let page_size = match std::env::var("PAGE_SIZE") {
            Ok(raw) => parse_page_size(&raw).context("invalid PAGE_SIZE")?,
            Err(_) => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            api_base_url,
            api_root,
            push_url,
            page_size,
        })
    }

    /// Applies command-line overrides on top of the environment.
    pub fn with_overrides(
        mut self,
        api_base_url: Option<String>,
        api_root: Option<String>,
        push_url: Option<String>,
        page_size: Option<u64>,
    ) -> Result<Self> {
        if let Some(url) = api_base_url {
            self.api_base_url = url;
        }
        if let Some(root) = api_root {
            self.api_root = root;
        }
        if let Some(url) = push_url {
            self.push_url = url;
        }
        if let Some(size) = page_size {
            if size == 0 {
                return Err(anyhow!("page size must be at least 1"));
            }
            self.page_size = size;
        }
        Ok(self)
    }
}

pub fn parse_page_size(raw: &str) -> Result<u64> {
    let size: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("`{raw}` is not a number"))?;
    if size == 0 {
        return Err(anyhow!("page size must be at least 1"));
    }
    Ok(size)
}
