use std::fmt::Write as _;
use std::io::Write;
use std::str::FromStr;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::dashboard::{Dashboard, DashboardView, Panel};
use crate::models::filter::{HoursOld, JobType};
use crate::models::site::{JobSite, UnknownSite};
use crate::routes::dashboard_href;
use crate::store::UrlState;

const HELP: &str = "\
Commands:
  search <text>       filter by keywords (empty clears)
  location <text>     filter by location (empty clears)
  type <type>         all, fulltime, parttime, internship, contract
  posted <hours>      24, 72, 168, 720 or 8760
  remote on|off       include remote jobs
  site <id>           toggle a job site (indeed, linkedin, google, ...)
  page <n>            jump to a page
  next / prev         move one page
  clear               reset all filters
  retry               drop cached results and search again
  url                 print the current search URL
  help                show this help
  quit                exit";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command `{0}`; type `help` for a list")]
    Unknown(String),

    #[error("`{command}`: {reason}")]
    Invalid {
        command: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Site(#[from] UnknownSite),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Search(String),
    Location(String),
    JobType(JobType),
    Posted(HoursOld),
    Remote(bool),
    Site(JobSite),
    Page(u32),
    Next,
    Prev,
    Clear,
    Retry,
    Url,
    Help,
    Quit,
}

impl FromStr for BrowseCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let invalid = |command, reason: String| CommandError::Invalid { command, reason };

        let command = match word.to_lowercase().as_str() {
            "search" | "s" => BrowseCommand::Search(rest.to_string()),
            "location" | "loc" => BrowseCommand::Location(rest.to_string()),
            "type" => BrowseCommand::JobType(rest.parse().map_err(|e| invalid("type", e))?),
            "posted" => BrowseCommand::Posted(rest.parse().map_err(|e| invalid("posted", e))?),
            "remote" => match rest {
                "on" | "yes" | "true" => BrowseCommand::Remote(true),
                "off" | "no" | "false" => BrowseCommand::Remote(false),
                other => return Err(invalid("remote", format!("expected on or off, got `{other}`"))),
            },
            "site" => BrowseCommand::Site(rest.parse()?),
            "page" | "p" => BrowseCommand::Page(
                rest.parse()
                    .map_err(|_| invalid("page", format!("not a page number: `{rest}`")))?,
            ),
            "next" | "n" => BrowseCommand::Next,
            "prev" | "previous" => BrowseCommand::Prev,
            "clear" => BrowseCommand::Clear,
            "retry" => BrowseCommand::Retry,
            "url" => BrowseCommand::Url,
            "help" | "?" => BrowseCommand::Help,
            "quit" | "exit" | "q" => BrowseCommand::Quit,
            _ => return Err(CommandError::Unknown(word.to_string())),
        };
        Ok(command)
    }
}

/// What the loop should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Print(String),
    Quit,
}

pub fn execute<L: UrlState>(dashboard: &mut Dashboard<L>, command: BrowseCommand) -> Flow {
    match command {
        BrowseCommand::Search(text) => dashboard.set_search_query(&text),
        BrowseCommand::Location(text) => dashboard.set_location(&text),
        BrowseCommand::JobType(job_type) => dashboard.set_job_type(job_type),
        BrowseCommand::Posted(hours_old) => dashboard.set_hours_old(hours_old),
        BrowseCommand::Remote(on) => dashboard.set_include_remote(on),
        BrowseCommand::Site(site) => {
            if !dashboard.toggle_job_site(site) {
                return Flow::Print("At least one job site must stay selected".to_string());
            }
        }
        BrowseCommand::Page(page) => {
            if !dashboard.go_to_page(page) {
                return Flow::Print("Page unchanged".to_string());
            }
        }
        BrowseCommand::Next => {
            if !dashboard.next_page() {
                return Flow::Print("Already on the last page".to_string());
            }
        }
        BrowseCommand::Prev => {
            if !dashboard.previous_page() {
                return Flow::Print("Already on the first page".to_string());
            }
        }
        BrowseCommand::Clear => dashboard.clear_all_filters(),
        BrowseCommand::Retry => dashboard.try_again(),
        BrowseCommand::Url => return Flow::Print(dashboard_href(&dashboard.query())),
        BrowseCommand::Help => return Flow::Print(HELP.to_string()),
        BrowseCommand::Quit => return Flow::Quit,
    }
    Flow::Continue
}

/// Text rendering of one dashboard frame.
pub fn render_frame(view: &DashboardView) -> String {
    let mut out = String::new();
    let _ = write!(out, "{}", view.summary);
    if view.refreshing {
        out.push_str(" (refreshing)");
    }
    out.push('\n');
    if view.paging_mismatch {
        out.push_str("! The job service sent more than one page; showing the first page only\n");
    }

    match &view.panel {
        Panel::Loading => {}
        Panel::Error { message } => {
            let _ = writeln!(out, "Error loading jobs: {message}");
            out.push_str("Type `retry` to try again\n");
        }
        Panel::Empty => {
            out.push_str("Try adjusting your search criteria, or `clear` to reset all filters\n");
        }
        Panel::Results { jobs } => {
            let start = view
                .pagination
                .map(|p| p.start_index())
                .unwrap_or_default();
            for (i, job) in jobs.iter().enumerate() {
                let _ = writeln!(out, "{:>3}. {}", start + i as u64 + 1, job.title);
                let _ = writeln!(
                    out,
                    "     {} | {}",
                    job.company_name(),
                    job.location_text()
                );
                let _ = writeln!(
                    out,
                    "     {} | Posted {} | {}",
                    job.salary_text(),
                    job.posted_text(),
                    job.site_name()
                );
                if let Some(url) = &job.job_url {
                    let _ = writeln!(out, "     {url}");
                }
            }
        }
    }

    if let Some(p) = view.pagination {
        let _ = writeln!(out, "Page {} of {}", p.current_page, p.total_pages());
    }
    out
}

/// Drive a session from line-oriented input until `quit` or end of input.
pub async fn run<L, R, W>(mut dashboard: Dashboard<L>, input: R, out: &mut W) -> anyhow::Result<()>
where
    L: UrlState,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    enum Event {
        Line(Option<String>),
        Changed,
    }

    let mut lines = input.lines();
    let mut last_frame = String::new();
    writeln!(out, "Type `help` for commands")?;

    loop {
        let view = dashboard.render();
        let frame = render_frame(&view);
        if view.scroll_to_top {
            writeln!(out, "==== Page {} ====", view.key.current_page)?;
        }
        if frame != last_frame {
            write!(out, "{frame}")?;
            out.flush()?;
            last_frame = frame;
        }

        let event = tokio::select! {
            line = lines.next_line() => Event::Line(line?),
            _ = dashboard.changed() => Event::Changed,
        };

        let line = match event {
            Event::Changed => continue,
            Event::Line(None) => break,
            Event::Line(Some(line)) => line,
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<BrowseCommand>() {
            Ok(command) => match execute(&mut dashboard, command) {
                Flow::Continue => {
                    if dashboard.is_settling() {
                        tracing::debug!("Waiting for typing to settle");
                    }
                }
                Flow::Print(text) => writeln!(out, "{text}")?,
                Flow::Quit => break,
            },
            Err(e) => writeln!(out, "{e}")?,
        }
    }

    tracing::debug!("Browse session ended at {}", dashboard_href(&dashboard.query()));
    Ok(())
}
