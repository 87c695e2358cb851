use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::cache::CacheSettings;
use crate::debounce::DEFAULT_DEBOUNCE;
use crate::query::PAGE_SIZE;

#[derive(Parser, Debug, Clone)]
#[command(name = "jobfinder", about = "Job search dashboard over a job aggregation API")]
pub struct Config {
    /// Base URL of the job aggregation API
    #[arg(long, env = "JOBS_API_URL", default_value = "http://127.0.0.1:8000")]
    pub api_url: String,

    /// Seconds before cached results are revalidated
    #[arg(long, env = "STALE_SECS", default_value = "300")]
    pub stale_secs: u64,

    /// Seconds an unused cache entry is kept
    #[arg(long, env = "GC_SECS", default_value = "600")]
    pub gc_secs: u64,

    /// Timeout for a single job API request
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the web dashboard (default when no subcommand given)
    Serve {
        /// Listen address
        #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
        listen_addr: String,
    },
    /// Run one search and print the results
    Search {
        /// Filters in dashboard query form, e.g. "searchQuery=rust&currentPage=2"
        #[arg(long, default_value = "")]
        filters: String,

        /// Print the raw page as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive terminal dashboard
    Browse {
        /// Initial filters in dashboard query form
        #[arg(long, default_value = "")]
        filters: String,

        /// File the filter query is persisted to between sessions
        #[arg(long, env = "JOBFINDER_STATE_FILE")]
        state_file: Option<PathBuf>,

        /// Quiet period before typed text triggers a search
        #[arg(long, default_value_t = DEFAULT_DEBOUNCE.as_millis() as u64)]
        debounce_ms: u64,
    },
}

impl Config {
    /// Resolve the command, defaulting to Serve if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        })
    }

    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            stale_time: Duration::from_secs(self.stale_secs),
            gc_time: Duration::from_secs(self.gc_secs),
            page_size: PAGE_SIZE,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
