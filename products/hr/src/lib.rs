//! HR vertical slice: the paged employee directory view.

pub mod console;
pub mod notice;
pub mod push;
pub mod record;
pub mod render;
pub mod state;

#[cfg(test)]
mod fake;

pub use console::{EMPLOYEES_REL, EmployeeConsole};
pub use notice::{Action, MutationOutcome, Notice, NoticeLog, Notifier, TracingNotifier};
pub use push::{PushAction, registrations};
pub use record::{EmployeeResource, RecordError, build_record, merge_record, parse_assignments};
pub use render::render;
pub use state::{DEFAULT_PAGE_SIZE, LoadPhase, ViewState};
