//! Topic-based push notifications over STOMP on a websocket.

pub mod error;
pub mod frame;
pub mod listener;

pub use error::{PushError, PushResult};
pub use frame::{Command, Frame};
pub use listener::{Callback, PushConfig, PushListener, PushMessage, Registration, register};
