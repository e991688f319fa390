//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod feedback;
pub mod page_tools;

use std::error::Error;
use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::cli::feedback::run_feedback;
use crate::cli::page_tools::{query_page, reset_default, show_section, ViewToggles};
use crate::core::config::Config;
use crate::utils::logging::{init_tracing, TranscriptLog};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ngit: ",
    env!("VERGEN_GIT_DESCRIBE"),
    "\nbuilt: ",
    env!("VERGEN_BUILD_TIMESTAMP"),
);

#[derive(Parser)]
#[command(name = "configure-feedback")]
#[command(about = "Drive the configure screen's feedback exchange from the terminal")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    long_about = "configure-feedback loads a description of the configure screen (forms, \
status elements, default links, section tabs) from a TOML file, sends feedback requests \
for a control the way the screen does, and applies the server's reply to the page.\n\n\
Environment Variables:\n\
  RUST_LOG          Diagnostic output on stderr (e.g. RUST_LOG=debug)\n\n\
Configuration keys (set with 'configure-feedback set <key> <value>'):\n\
  endpoint          Feedback URL used instead of the form action\n\
  path-info         Path fragment appended to the feedback URL\n\
  working-label     Label shown while a request is in flight\n\
  transcript-log    File that records every exchange\n\
  user-agent        User-Agent header for feedback requests"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Record exchanges in the specified transcript file
    #[arg(short = 'l', long, global = true)]
    pub log: Option<String>,

    /// Use this configuration file instead of the default location
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct FeedbackArgs {
    /// Page description (TOML)
    #[arg(short = 'p', long, value_name = "FILE")]
    pub page: PathBuf,
    /// Id of the feedback control that was clicked
    #[arg(long, value_name = "ID")]
    pub control: String,
    /// Value of the clicked control; defaults to the control's own value
    #[arg(long)]
    pub value: Option<String>,
    /// Post to this URL instead of the form action
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,
    /// Path fragment appended to the feedback URL
    #[arg(long)]
    pub path_info: Option<String>,
    /// Save the updated page back to its file
    #[arg(short = 'w', long)]
    pub write: bool,
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a feedback request for a control and apply the reply
    Feedback(FeedbackArgs),
    /// Toggle a "use default" link: apply the default value, or undo it
    ResetDefault {
        /// Page description (TOML)
        #[arg(short = 'p', long, value_name = "FILE")]
        page: PathBuf,
        /// Field name of the link (plain or #dd-encoded)
        #[arg(long)]
        link: String,
        /// Tooltip template; VALUE and TYPE are filled in
        #[arg(long)]
        tooltip: Option<String>,
        /// Save the updated page back to its file
        #[arg(short = 'w', long)]
        write: bool,
    },
    /// Show which sections are visible after navigating to an anchor
    ShowSection {
        /// Page description (TOML)
        #[arg(short = 'p', long, value_name = "FILE")]
        page: PathBuf,
        /// Anchor such as #Security or #Passwords$Security; omit for the landing section
        anchor: Option<String>,
        /// Expand every section
        #[arg(long)]
        expand_all: bool,
        /// Show the expert settings
        #[arg(long)]
        experts: bool,
        /// Show the info texts
        #[arg(long)]
        info: bool,
        /// Unfold the info block with this id (repeatable)
        #[arg(long = "open-info", value_name = "ID")]
        open_info: Vec<String>,
    },
    /// Look up status elements or controls by selector (#id or [name="..."])
    Query {
        /// Page description (TOML)
        #[arg(short = 'p', long, value_name = "FILE")]
        page: PathBuf,
        /// Selector to resolve
        selector: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Option<Vec<String>>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

fn config_location(args: &Args) -> Result<PathBuf, Box<dyn Error>> {
    match &args.config {
        Some(path) => Ok(path.clone()),
        None => Ok(Config::get_config_path()?),
    }
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config_path = config_location(&args)?;
    let mut config = Config::load_from_path(&config_path)?;

    match args.command {
        Commands::Feedback(feedback_args) => {
            let transcript = TranscriptLog::new(args.log.or_else(|| config.transcript_log.clone()))?;
            let succeeded = run_feedback(feedback_args, &config, &transcript).await?;
            if !succeeded {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::ResetDefault {
            page,
            link,
            tooltip,
            write,
        } => reset_default(&page, &link, tooltip.as_deref(), write),
        Commands::ShowSection {
            page,
            anchor,
            expand_all,
            experts,
            info,
            open_info,
        } => {
            let toggles = ViewToggles {
                expand_all,
                experts,
                info,
                open_info,
            };
            show_section(&page, anchor.as_deref(), &toggles)
        }
        Commands::Query {
            page,
            selector,
            json,
        } => query_page(&page, &selector, json),
        Commands::Set { key, value } => {
            let value = value.map(|parts| parts.join(" ")).filter(|value| !value.is_empty());
            let Some(value) = value else {
                config.print_all();
                return Ok(());
            };
            if !config.set_value(&key, Some(value.clone())) {
                eprintln!("❌ Unknown config key: {key}");
                std::process::exit(1);
            }
            config.save_to_path(&config_path)?;
            println!("✅ Set {key} to: {value}");
            Ok(())
        }
        Commands::Unset { key } => {
            if !config.set_value(&key, None) {
                eprintln!("❌ Unknown config key: {key}");
                std::process::exit(1);
            }
            config.save_to_path(&config_path)?;
            println!("✅ Unset {key}");
            Ok(())
        }
    }
}
