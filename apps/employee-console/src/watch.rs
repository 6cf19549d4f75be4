use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use platform_push::{PushConfig, PushListener, PushResult, register};
use products_hr::{EmployeeConsole, Notice, Notifier, ViewState, registrations, render};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::commands::{Command, HELP};

/// Prints each notice once on its own line, to stderr by default.
#[derive(Debug)]
pub struct TerminalNotifier<W = io::Stderr> {
    out: Mutex<W>,
}

impl Default for TerminalNotifier {
    fn default() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> TerminalNotifier<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

impl<W: Write + Send> Notifier for TerminalNotifier<W> {
    fn notify(&self, notice: &Notice) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{notice}");
        }
        debug!(%notice, "mutation rejected");
    }
}

const PUSH_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Takes the listener out of `slot` once its session has ended and returns
/// how it ended.
async fn reap_ended(slot: &mut Option<PushListener>) -> Option<PushResult<()>> {
    let ended = slot.take_if(|listener| listener.is_finished())?;
    Some(ended.closed().await)
}

fn show(state: &ViewState) {
    print!("{}", render(state));
}

/// Interactive loop: view changes, push events and stdin lines are handled
/// one at a time until `quit`, end of input, or ctrl+c.
pub async fn run(console: &EmployeeConsole, push_url: &str) -> Result<()> {
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let mut listener = match register(&PushConfig::new(push_url), registrations(events_tx)).await {
        Ok(listener) => Some(listener),
        Err(err) => {
            warn!(error = %err, url = push_url, "push channel unavailable, live updates disabled");
            None
        }
    };

    let mut view = console.subscribe();
    if let Err(err) = console.mount().await {
        warn!(error = %err, "initial load failed");
    }
    show(&view.borrow_and_update());
    println!("{HELP}");

    let mut push_check = tokio::time::interval(PUSH_CHECK_INTERVAL);
    push_check.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                show(&view.borrow_and_update());
            }
            Some(action) = events.recv() => {
                if let Err(err) = console.handle_push(action).await {
                    warn!(error = %err, ?action, "push refresh failed");
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match Command::parse(&line) {
                    Ok(command) => match command.execute(console).await {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(err) => {
                            println!("error: {err:#}");
                            warn!(error = %err, "command failed");
                        }
                    },
                    Err(err) => println!("{err}\n{HELP}"),
                }
            }
            _ = push_check.tick(), if listener.is_some() => {
                match reap_ended(&mut listener).await {
                    Some(Ok(())) => warn!("push channel closed by broker, live updates stopped"),
                    Some(Err(err)) => warn!(error = %err, "push channel failed, live updates stopped"),
                    None => {}
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    if let Some(listener) = listener {
        match listener.disconnect().await {
            Ok(()) => info!("push channel closed"),
            Err(err) => warn!(error = %err, "push channel ended with an error"),
        }
    }
    Ok(())
}
