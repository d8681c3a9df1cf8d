use anyhow::{Context, Result, bail};
use apptrack_core::{Engine, EngineConfig, Recomputation, RiskReport, Snapshot, risk_escalations};
use apptrack_ingest::{load_report_json, load_snapshot, save_json};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

mod config;
mod logging;
mod render;
mod state;

#[derive(Parser, Debug)]
#[command(
    name = "apptrack",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("APPTRACK_BUILD_SHA"), ")"),
    about = "Deadline feasibility and task dependencies for college applications"
)]
struct Cli {
    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct SnapshotArgs {
    /// Snapshot JSON file or directory of CSV exports
    snapshot: PathBuf,

    /// Owner id for CSV directories (default: `default_user` from config).
    /// Must match the `user_id` inside a JSON snapshot.
    #[arg(long)]
    user: Option<String>,

    /// Evaluate as of this instant (RFC 3339, default: now)
    #[arg(long, value_parser = parse_now)]
    now: Option<DateTime<Utc>>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full command center: priorities, bottlenecks, infeasible deadlines, progress
    Analyze {
        #[command(flatten)]
        input: SnapshotArgs,
        #[arg(long)]
        json: bool,
    },

    /// Per-deadline risk assessments
    Risk {
        #[command(flatten)]
        input: SnapshotArgs,
        #[arg(long)]
        json: bool,
    },

    /// Tasks gating the most at-risk deadlines
    Bottlenecks {
        #[command(flatten)]
        input: SnapshotArgs,
        /// Number of bottlenecks to show (default: from config)
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },

    /// Dependency graph in topological order with actionable flags
    Graph {
        #[command(flatten)]
        input: SnapshotArgs,
        #[arg(long)]
        json: bool,
    },

    /// Deadlines that escalated to critical or impossible since a saved report
    Alerts {
        #[command(flatten)]
        input: SnapshotArgs,
        /// Report saved by an earlier run (default: the user's last saved report)
        #[arg(long)]
        previous: Option<PathBuf>,
        /// Write the current report here for the next comparison
        #[arg(long)]
        save: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },

    /// Manage ~/.apptrack/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
    /// Print the config file path
    Path,
}

fn parse_now(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected RFC 3339 timestamp: {}", e))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match cli.command {
        Command::Analyze { input, json } => {
            let run = recompute(&input, None)?;
            if json {
                print_json(&run.command_center)?;
            } else {
                print!("{}", render::command_center(&run.command_center));
            }
        }

        Command::Risk { input, json } => {
            let run = recompute(&input, None)?;
            if json {
                print_json(&run.report)?;
            } else {
                let mut rows: Vec<_> = run.report.iter().collect();
                rows.sort_by(|a, b| {
                    a.deadline_date
                        .cmp(&b.deadline_date)
                        .then_with(|| a.deadline_id.cmp(&b.deadline_id))
                });
                if rows.is_empty() {
                    println!("No open deadlines.");
                }
                for a in rows {
                    println!("{}", render::assessment_line(a));
                }
            }
        }

        Command::Bottlenecks { input, limit, json } => {
            let run = recompute(&input, limit)?;
            if json {
                print_json(&run.bottlenecks)?;
            } else if run.bottlenecks.is_empty() {
                println!("No bottlenecks: every open deadline is safe.");
            } else {
                for b in &run.bottlenecks {
                    println!("{}", render::bottleneck_line(b));
                }
            }
        }

        Command::Graph { input, json } => {
            let run = recompute(&input, None)?;
            if json {
                print_json(&run.graph.nodes())?;
            } else {
                print!("{}", render::graph(&run));
            }
        }

        Command::Alerts {
            input,
            previous,
            save,
            json,
        } => {
            let (snapshot, run) = recompute_snapshot(&input, None)?;
            let previous = match previous {
                Some(p) => p,
                None => state::last_report_path(&snapshot.user_id)?,
            };
            let before = if previous.exists() {
                load_report_json(&previous)?
            } else {
                info!(path = %previous.display(), "no previous report, treating every deadline as new");
                RiskReport::default()
            };
            let alerts = risk_escalations(&before, &run.report);

            if json {
                print_json(&alerts)?;
            } else if alerts.is_empty() {
                println!("No new escalations.");
            } else {
                for a in &alerts {
                    println!("{}", render::alert_line(a));
                }
            }

            let path = match save {
                Some(p) => p,
                None => state::last_report_path(&snapshot.user_id)?,
            };
            save_json(&path, &run.report)?;
            info!(path = %path.display(), "saved report");
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
            ConfigCommand::Path => println!("{}", config::config_path()?.display()),
        },
    }

    Ok(())
}

/// Load the snapshot named on the command line and run one engine pass.
fn recompute(input: &SnapshotArgs, limit: Option<usize>) -> Result<Recomputation> {
    recompute_snapshot(input, limit).map(|(_, run)| run)
}

fn recompute_snapshot(input: &SnapshotArgs, limit: Option<usize>) -> Result<(Snapshot, Recomputation)> {
    let cfg = config::load_config()?;
    let user = input.user.clone().unwrap_or(cfg.default_user);
    let snapshot = load_snapshot(&input.snapshot, &user)?;
    check_user(input.user.as_deref(), &snapshot)
        .with_context(|| format!("loading {}", input.snapshot.display()))?;

    let mut engine_cfg: EngineConfig = cfg.engine;
    if let Some(n) = limit {
        engine_cfg.bottleneck.top_n = n;
    }
    let engine = Engine::new(engine_cfg).context("invalid engine config")?;
    let now = input.now.unwrap_or_else(Utc::now);

    let run = engine
        .recompute(&snapshot, now)
        .with_context(|| format!("analyzing {}", input.snapshot.display()))?;
    Ok((snapshot, run))
}

/// JSON snapshots name their own owner, so `--user` can only confirm it.
fn check_user(requested: Option<&str>, snapshot: &Snapshot) -> Result<()> {
    match requested {
        Some(user) if user != snapshot.user_id => bail!(
            "--user '{}' does not match snapshot owner '{}'",
            user,
            snapshot.user_id
        ),
        _ => Ok(()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_flag_must_match_json_owner() {
        let snapshot = Snapshot::new("student-1");
        assert!(check_user(None, &snapshot).is_ok());
        assert!(check_user(Some("student-1"), &snapshot).is_ok());

        let err = check_user(Some("student-2"), &snapshot).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("student-2"));
        assert!(msg.contains("student-1"));
    }

    #[test]
    fn test_user_flag_rejected_for_foreign_json_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("snap.json");
        save_json(&path, &Snapshot::new("student-1")).unwrap();

        let loaded = load_snapshot(&path, "student-2").unwrap();
        assert_eq!(loaded.user_id, "student-1");
        let err = check_user(Some("student-2"), &loaded).unwrap_err();
        assert!(format!("{:#}", err).contains("does not match"));
    }
}
