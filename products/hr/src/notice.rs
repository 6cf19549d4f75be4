use std::fmt;
use std::sync::Mutex;

use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Update,
    Delete,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// User-facing rejection of a mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    AccessDenied { action: Action, href: String },
    StaleCopy { href: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::AccessDenied { action, href } => write!(
                f,
                "ACCESS DENIED: You are not authorized to {} {}",
                action.as_str(),
                href
            ),
            Notice::StaleCopy { href } => {
                write!(f, "DENIED: Unable to update {href}. Your copy is stale.")
            }
        }
    }
}

/// Where notices are presented.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Logs notices at `warn`.
#[derive(Default, Debug)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        warn!(%notice, "mutation rejected");
    }
}

/// Keeps every notice it receives.
#[derive(Default, Debug)]
pub struct NoticeLog {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeLog {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, notice: &Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice.clone());
        }
    }
}

/// Result of a mutation the server may refuse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Accepted; the push channel drives the refresh.
    Submitted,
    Denied(Notice),
}
