// jobfeed command-line entry point.
// Parses arguments, sets up tracing, and runs one command against the app context.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use jobfeed::cache::LogKind;
use jobfeed::schedule::Recurrence;
use jobfeed::settings::SettingsGroup;
use jobfeed::{App, Config, Notice};

/// Fetch, cache and render a remote JSON job feed
#[derive(Parser)]
#[command(name = "jobfeed")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Static config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the feed cache, logs and stored settings
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "jobfeed=trace"
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the rendered feed HTML
    Render {
        /// Prepend the stylesheet in a <style> tag
        #[arg(long)]
        css: bool,
    },

    /// Fetch the feed now
    #[command(alias = "refresh")]
    Fetch,

    /// Keep refreshing on the configured schedule until interrupted
    Daemon,

    /// Show recent log lines, newest first
    Logs {
        /// "feed" or "error"
        kind: LogKind,
    },

    /// Empty a log file
    ClearLogs {
        /// "feed" or "error"
        kind: LogKind,
    },

    /// Inspect or change stored settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// List available refresh intervals
    Schedules,

    /// Schedule the default refresh and keep running
    Activate,

    /// Delete stored settings and cached files
    Deactivate,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print resolved settings of a group as JSON
    Show { group: SettingsGroup },

    /// Store one value and apply its side effects
    Set {
        group: SettingsGroup,
        key: String,
        value: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = Some(data_dir);
    }
    let app = App::from_config(config).context("Failed to initialize")?;

    match cli.command {
        Commands::Render { css } => {
            if css {
                let stylesheet = app.stylesheet();
                if !stylesheet.is_empty() {
                    println!("<style>\n{}\n</style>", stylesheet);
                }
            }
            print!("{}", app.display_feed().await);
        }
        Commands::Fetch => report(&app.refresh().await)?,
        Commands::Daemon => {
            app.update_cron_interval(None)?;
            run_until_interrupted(&app).await?;
        }
        Commands::Logs { kind } => {
            for line in app.logs(kind)? {
                println!("{}", line);
            }
        }
        Commands::ClearLogs { kind } => app.clear_logs(kind)?,
        Commands::Settings { action } => match action {
            SettingsAction::Show { group } => {
                let values = app.group_settings(group)?;
                println!("{}", serde_json::to_string_pretty(&values)?);
            }
            SettingsAction::Set { group, key, value } => {
                let notices = app
                    .update_setting(group, &key, Value::String(value))
                    .await?;
                report(&notices)?;
                if group == SettingsGroup::Advanced && key == "cron_interval" {
                    info!("Run `jobfeed daemon` to refresh on the new schedule");
                }
            }
        },
        Commands::Schedules => {
            for recurrence in Recurrence::ALL {
                println!("{:<16}{}", recurrence.name(), recurrence.label());
            }
        }
        Commands::Activate => {
            app.activate()?;
            run_until_interrupted(&app).await?;
        }
        Commands::Deactivate => app.deactivate()?,
    }

    Ok(())
}

async fn run_until_interrupted(app: &App) -> anyhow::Result<()> {
    match app.scheduler().current() {
        Some(recurrence) => info!(
            "Refreshing {} ({}), press Ctrl-C to stop",
            recurrence.label().to_lowercase(),
            app.scheduler().hook()
        ),
        None => bail!("No refresh interval configured"),
    }
    tokio::signal::ctrl_c().await?;
    app.scheduler().clear();
    Ok(())
}

fn report(notices: &[Notice]) -> anyhow::Result<()> {
    for notice in notices {
        match notice {
            Notice::Updated(_) => println!("{}", notice),
            Notice::Error(_) => eprintln!("{}", notice),
        }
    }
    if notices.iter().any(Notice::is_error) {
        bail!("Feed update failed");
    }
    Ok(())
}
