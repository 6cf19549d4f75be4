use platform_push::Registration;
use tokio::sync::mpsc;

pub const NEW_EMPLOYEE_TOPIC: &str = "/topic/newEmployee";
pub const UPDATE_EMPLOYEE_TOPIC: &str = "/topic/updateEmployee";
pub const DELETE_EMPLOYEE_TOPIC: &str = "/topic/deleteEmployee";

/// Refresh the view performs for a broadcast. Message payloads are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushAction {
    RefreshAndGoToLastPage,
    RefreshCurrentPage,
}

impl PushAction {
    pub fn for_topic(topic: &str) -> Option<Self> {
        match topic {
            NEW_EMPLOYEE_TOPIC => Some(PushAction::RefreshAndGoToLastPage),
            UPDATE_EMPLOYEE_TOPIC | DELETE_EMPLOYEE_TOPIC => Some(PushAction::RefreshCurrentPage),
            _ => None,
        }
    }
}

/// Listener registrations for the employee topics. Each callback queues
/// its action on `events`, so handlers run on the owner's loop one at a time.
pub fn registrations(events: mpsc::UnboundedSender<PushAction>) -> Vec<Registration> {
    [
        NEW_EMPLOYEE_TOPIC,
        UPDATE_EMPLOYEE_TOPIC,
        DELETE_EMPLOYEE_TOPIC,
    ]
    .into_iter()
    .filter_map(|topic| PushAction::for_topic(topic).map(|action| (topic, action)))
    .map(|(topic, action)| {
        let events = events.clone();
        Registration::new(topic, move |_message| {
            let _ = events.send(action);
        })
    })
    .collect()
}
