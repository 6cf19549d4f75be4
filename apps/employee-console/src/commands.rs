use anyhow::{Context, Result, anyhow, bail};
use products_hr::{
    EmployeeConsole, MutationOutcome, build_record, merge_record, parse_assignments,
};

use crate::config::parse_page_size;

/// A line typed into the watch loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Navigate(&'static str),
    Size(u64),
    Create(Vec<(String, String)>),
    Update(usize, Vec<(String, String)>),
    Delete(usize),
    Reload,
    Quit,
}

pub const HELP: &str =
    "commands: next | prev | first | last | size N | create k=v.. | update ROW k=v.. | delete ROW | reload | quit";

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            bail!("empty command");
        };
        let rest: Vec<&str> = words.collect();
        let command = match head {
            "next" => Command::Navigate("next"),
            "prev" => Command::Navigate("prev"),
            "first" => Command::Navigate("first"),
            "last" => Command::Navigate("last"),
            "size" => {
                let raw = rest.first().ok_or_else(|| anyhow!("usage: size N"))?;
                Command::Size(parse_page_size(raw)?)
            }
            "create" => Command::Create(parse_assignments(&rest)?),
            "update" => {
                let (row, fields) = rest
                    .split_first()
                    .ok_or_else(|| anyhow!("usage: update ROW k=v.."))?;
                Command::Update(parse_row(row)?, parse_assignments(fields)?)
            }
            "delete" => {
                let row = rest.first().ok_or_else(|| anyhow!("usage: delete ROW"))?;
                Command::Delete(parse_row(row)?)
            }
            "reload" => Command::Reload,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command `{other}`"),
        };
        Ok(command)
    }

    /// Runs the command against the view. Returns `false` on quit.
    pub async fn execute(self, console: &EmployeeConsole) -> Result<bool> {
        match self {
            Command::Navigate(rel) => {
                let href = console
                    .snapshot()
                    .links
                    .get(rel)
                    .map(|link| link.uri())
                    .ok_or_else(|| anyhow!("no `{rel}` page"))?;
                console.on_navigate(&href).await?;
            }
            Command::Size(size) => {
                console.update_page_size(size).await?;
            }
            Command::Create(assignments) => {
                let record = build_record(&console.snapshot().attributes, &assignments)?;
                console.on_create(record).await?;
            }
            Command::Update(row, assignments) => {
                let state = console.snapshot();
                let existing = state
                    .employee(row)
                    .with_context(|| format!("no employee in row {row}"))?;
                let record = merge_record(existing, &state.attributes, &assignments)?;
                report(console.on_update(existing, record).await?);
            }
            Command::Delete(row) => {
                let state = console.snapshot();
                let existing = state
                    .employee(row)
                    .with_context(|| format!("no employee in row {row}"))?;
                report(console.on_delete(existing).await?);
            }
            Command::Reload => {
                let size = console.snapshot().page_size;
                console.load_from_server(size).await?;
            }
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }
}

fn parse_row(raw: &str) -> Result<usize> {
    raw.parse()
        .with_context(|| format!("`{raw}` is not a row number"))
}

fn report(outcome: MutationOutcome) {
    if let MutationOutcome::Denied(notice) = outcome {
        tracing::debug!(%notice, "mutation denied");
    }
}
