mod changes_cmd;
mod folders_cmd;
mod ingest_cmd;
mod logs_cmd;
mod output;
mod stats_cmd;

use clap::{Parser, Subcommand};

use tracer::ingest;
use tracer::query::{ChangeQuery, LogQuery};
use tracer::store;

#[derive(Parser)]
#[command(
    name = "tracer",
    version,
    about = "Track and analyze shell command logs and file changes"
)]
struct Cli {
    /// Emit results as JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load command history lines from a file into the store
    Ingest {
        /// History file (JSON lines or plain text, one entry per line)
        file: String,
        /// Records per transactional batch
        #[arg(long, default_value_t = ingest::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
    /// List command logs, newest first
    Logs {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,
        /// End date (YYYY-MM-DD), inclusive
        #[arg(long)]
        end_date: Option<String>,
        /// Exact user
        #[arg(long)]
        user: Option<String>,
        /// Substring of the command text (case-sensitive)
        #[arg(long)]
        search: Option<String>,
        /// Substring of the directory (case-sensitive)
        #[arg(long)]
        directory: Option<String>,
        /// Show every log of one day (YYYY-MM-DD), oldest first
        #[arg(long, conflicts_with_all = ["start_date", "end_date", "limit", "offset"])]
        date: Option<String>,
        #[arg(long, default_value_t = 100)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// List file changes, newest first
    Changes {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,
        /// End date (YYYY-MM-DD), inclusive
        #[arg(long)]
        end_date: Option<String>,
        /// Exact event type (created, deleted, modified, moved)
        #[arg(long)]
        event_type: Option<String>,
        /// Exact file extension
        #[arg(long)]
        extension: Option<String>,
        /// Show every change of one day (YYYY-MM-DD), oldest first
        #[arg(long, conflicts_with_all = ["start_date", "end_date", "limit", "offset"])]
        date: Option<String>,
        /// Delete one change record by id instead of listing
        #[arg(long, conflicts_with_all = [
            "start_date", "end_date", "event_type", "extension", "date", "limit", "offset"
        ])]
        delete: Option<i64>,
        #[arg(long, default_value_t = 100)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Aggregate statistics
    Stats {
        #[command(subcommand)]
        target: StatsTarget,
    },
    /// List distinct users and directories (filter discovery)
    Options,
    /// Manage watched folders
    Folders {
        #[command(subcommand)]
        action: FoldersAction,
    },
}

#[derive(Subcommand)]
enum StatsTarget {
    /// Command log statistics
    Logs {
        /// Per-date counts instead of the summary
        #[arg(long, conflicts_with = "by_user")]
        daily: bool,
        /// Per-user counts instead of the summary
        #[arg(long)]
        by_user: bool,
        /// Size of the top-command ranking
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// File change statistics
    Changes {
        /// Per-date counts instead of the summary
        #[arg(long)]
        daily: bool,
        /// Size of the top-extension/top-directory rankings
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[derive(Subcommand)]
enum FoldersAction {
    /// List registered folders
    Ls,
    /// Register a folder to watch
    Add {
        path: String,
        /// Comma-separated file patterns (e.g. "*.yml,*.conf")
        #[arg(long)]
        patterns: Option<String>,
        /// Do not watch subdirectories
        #[arg(long)]
        no_recursive: bool,
    },
    /// Remove a folder by id
    Rm { id: i64 },
    /// Flip a folder's active flag
    Toggle { id: i64 },
}

fn open_conn() -> Option<rusqlite::Connection> {
    let Some(path) = store::db_path() else {
        eprintln!("[tracer] error: cannot determine DB path");
        return None;
    };
    if std::env::var("TRACER_DEBUG").is_ok() {
        eprintln!("[tracer] using DB at {}", path.display());
    }
    match store::open_db(&path) {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("[tracer] error opening DB: {e}");
            None
        }
    }
}

#[allow(clippy::too_many_lines)]
fn main() {
    let cli = Cli::parse();
    let Some(mut conn) = open_conn() else {
        std::process::exit(1);
    };

    let exit_code = match &cli.command {
        Commands::Ingest { file, batch_size } => {
            ingest_cmd::cmd_ingest(&mut conn, file, *batch_size)
        }
        Commands::Logs {
            start_date,
            end_date,
            user,
            search,
            directory,
            date,
            limit,
            offset,
        } => {
            if let Some(date) = date {
                logs_cmd::cmd_logs_for_date(&conn, date, cli.json)
            } else {
                let q = LogQuery {
                    start_date: start_date.clone(),
                    end_date: end_date.clone(),
                    user: user.clone(),
                    search: search.clone(),
                    directory: directory.clone(),
                    limit: *limit,
                    offset: *offset,
                };
                logs_cmd::cmd_logs(&conn, &q, cli.json)
            }
        }
        Commands::Changes {
            start_date,
            end_date,
            event_type,
            extension,
            date,
            delete,
            limit,
            offset,
        } => {
            if let Some(id) = delete {
                changes_cmd::cmd_delete_change(&conn, *id)
            } else if let Some(date) = date {
                changes_cmd::cmd_changes_for_date(&conn, date, cli.json)
            } else {
                let q = ChangeQuery {
                    start_date: start_date.clone(),
                    end_date: end_date.clone(),
                    event_type: event_type.clone(),
                    file_extension: extension.clone(),
                    limit: *limit,
                    offset: *offset,
                };
                changes_cmd::cmd_changes(&conn, &q, cli.json)
            }
        }
        Commands::Stats { target } => match target {
            StatsTarget::Logs { daily, by_user, top } => {
                if *daily {
                    stats_cmd::cmd_logs_daily(&conn, cli.json)
                } else if *by_user {
                    stats_cmd::cmd_logs_by_user(&conn, cli.json)
                } else {
                    stats_cmd::cmd_log_stats(&conn, *top, cli.json)
                }
            }
            StatsTarget::Changes { daily, top } => {
                if *daily {
                    stats_cmd::cmd_changes_daily(&conn, cli.json)
                } else {
                    stats_cmd::cmd_change_stats(&conn, *top, cli.json)
                }
            }
        },
        Commands::Options => logs_cmd::cmd_options(&conn, cli.json),
        Commands::Folders { action } => match action {
            FoldersAction::Ls => folders_cmd::cmd_folders_ls(&conn, cli.json),
            FoldersAction::Add {
                path,
                patterns,
                no_recursive,
            } => folders_cmd::cmd_folders_add(
                &conn,
                path,
                patterns.as_deref(),
                !no_recursive,
                cli.json,
            ),
            FoldersAction::Rm { id } => folders_cmd::cmd_folders_rm(&conn, *id),
            FoldersAction::Toggle { id } => folders_cmd::cmd_folders_toggle(&conn, *id),
        },
    };
    std::process::exit(exit_code);
}
