use chrono::{Local, NaiveDate, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, WrapErr};
use std::io::{self, Write};
use std::path::PathBuf;
use todostore::{
    Config, DueState, NewTask, Outcome, Query, SaveStatus, SortBy, SqliteKv, Status, StatusCounts,
    StatusFilter, Task, TaskPatch, TaskRepository, TaskStore, count_by_status, export, parse_tags,
};
use tracing::Level;

const MIN_ID_DISPLAY_LEN: usize = 8;

#[derive(Parser)]
#[command(name = "todostore")]
#[command(about = "TodoStore CLI - Single-user task list with filtering, sorting and CSV export")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to a YAML config file (default: <config dir>/todostore/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the task database (overrides the config)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct QueryArgs {
    /// Substring of the title or of any tag (case-sensitive)
    #[arg(short, long, default_value = "")]
    keyword: String,

    /// all, todo, doing or done
    #[arg(short, long, default_value = "all")]
    status: StatusFilter,

    /// Exact tag
    #[arg(short, long, default_value = "")]
    tag: String,

    /// created_at_desc, created_at_asc, due_asc or title_asc (default from config)
    #[arg(long)]
    sort: Option<SortBy>,
}

impl QueryArgs {
    fn into_query(self, default_sort: SortBy) -> Query {
        Query {
            keyword: self.keyword,
            status: self.status,
            tag: self.tag,
            sort_by: self.sort.unwrap_or(default_sort),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task
    Add {
        title: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,

        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,

        #[arg(long)]
        status: Option<Status>,
    },

    /// List tasks matching the filters
    List {
        #[command(flatten)]
        query: QueryArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Set the status of a task
    Status { id: String, status: Status },

    /// Flip a task between done and todo
    Toggle { id: String },

    /// Change fields of a task
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        /// New due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,

        /// Replacement comma-separated tags
        #[arg(long)]
        tags: Option<String>,

        #[arg(long)]
        status: Option<Status>,
    },

    /// Delete a task
    Rm {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show task counts per status
    Summary {
        #[arg(long)]
        json: bool,
    },

    /// Write tasks to todo-tasks-<date>.csv
    Export {
        /// Output directory (default from config)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Export the filtered and sorted view instead of every task
        #[arg(long)]
        view: bool,

        #[command(flatten)]
        query: QueryArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let kv = SqliteKv::open(&config.data_dir)
        .wrap_err_with(|| format!("Failed to open task database in {}", config.data_dir.display()))?
        .with_quota(config.quota_bytes);
    let mut store = TaskStore::open(TaskRepository::new(kv));

    match cli.command {
        Commands::Add {
            title,
            due,
            tags,
            status,
        } => {
            let new = NewTask {
                title,
                due,
                tags: tags.as_deref().map(parse_tags).unwrap_or_default(),
                status,
            };
            let outcome = store.add(new)?;
            report_save(&outcome);
            println!("Added {}", outcome.value.id);
        }
        Commands::List { query, json } => {
            let query = query.into_query(config.default_sort);
            let view = query.apply(store.tasks());
            let counts = count_by_status(store.tasks());
            if json {
                let output = serde_json::json!({ "tasks": view, "counts": counts });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_view(&view, store.tasks());
                print_counts(&counts);
            }
        }
        Commands::Status { id, status } => {
            let id = store.resolve(&id)?.id.clone();
            let outcome = store.set_status(&id, status);
            report_save(&outcome);
            println!("{} is now {}", id, status_label(status));
        }
        Commands::Toggle { id } => {
            let id = store.resolve(&id)?.id.clone();
            let outcome = store.toggle(&id);
            report_save(&outcome);
            if let Some(status) = outcome.value {
                println!("{} is now {}", id, status_label(status));
            }
        }
        Commands::Edit {
            id,
            title,
            due,
            clear_due,
            tags,
            status,
        } => {
            let id = store.resolve(&id)?.id.clone();
            let patch = TaskPatch {
                title,
                due: if clear_due { Some(None) } else { due.map(Some) },
                tags: tags.as_deref().map(parse_tags),
                status,
            };
            if patch.is_empty() {
                println!("Nothing to change");
                return Ok(());
            }
            let outcome = store.update(&id, patch)?;
            report_save(&outcome);
            println!("Updated {}", outcome.value.id);
        }
        Commands::Rm { id, yes } => {
            let task = store.resolve(&id)?;
            let id = task.id.clone();
            if !yes && !confirm(&format!("Delete \"{}\"?", task.title))? {
                println!("Cancelled");
                return Ok(());
            }
            let outcome = store.remove(&id);
            report_save(&outcome);
            println!("Deleted {}", id);
        }
        Commands::Summary { json } => {
            let counts = count_by_status(store.tasks());
            if json {
                println!("{}", serde_json::to_string_pretty(&counts)?);
            } else {
                print_counts(&counts);
            }
        }
        Commands::Export { out, view, query } => {
            let dir = out.unwrap_or_else(|| config.export_dir.clone());
            let today = Utc::now().date_naive();
            let path = if view {
                let query = query.into_query(config.default_sort);
                export::write_export(&dir, today, query.apply(store.tasks()))
            } else {
                export::write_export(&dir, today, store.tasks())
            }
            .wrap_err_with(|| format!("Failed to write export to {}", dir.display()))?;
            println!("Exported to {} ({})", path.display(), export::MIME_TYPE);
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn report_save<T>(outcome: &Outcome<T>) {
    if let SaveStatus::Failed(e) = &outcome.save {
        eprintln!("{} change kept in memory but not saved: {}", "warning:".yellow().bold(), e);
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_view(view: &[&Task], all: &[Task]) {
    if view.is_empty() {
        println!("{}", "No tasks to show.".dimmed());
        return;
    }

    let today = Local::now().date_naive();
    let id_len = id_display_len(all);
    for task in view {
        println!("{}", format_task(task, today, id_len));
    }
}

fn format_task(task: &Task, today: NaiveDate, id_len: usize) -> String {
    let check = if task.status == Status::Done { "[x]" } else { "[ ]" };
    let id: String = task.id.chars().take(id_len).collect();
    let title = if task.status == Status::Done {
        task.title.dimmed().to_string()
    } else {
        task.title.bold().to_string()
    };

    let due = match (task.due, task.due_state(today)) {
        (Some(date), DueState::Overdue) => format!("{} {}", date, "overdue".red()),
        (Some(date), DueState::Today) => format!("{} {}", date, "today".yellow()),
        (Some(date), _) => date.to_string(),
        (None, _) => "-".dimmed().to_string(),
    };

    let tags = if task.tags.is_empty() {
        String::new()
    } else {
        task.tags.join(", ").cyan().to_string()
    };

    format!("{} {} {:<7} {} {} {}", check, id.dimmed(), status_label(task.status), title, due, tags)
        .trim_end()
        .to_string()
}

fn status_label(status: Status) -> String {
    match status {
        Status::Todo => status.as_str().normal().to_string(),
        Status::Doing => status.as_str().blue().to_string(),
        Status::Done => status.as_str().green().to_string(),
    }
}

fn print_counts(counts: &StatusCounts) {
    println!(
        "todo: {}  doing: {}  done: {}  (total {})",
        counts.todo, counts.doing, counts.done, counts.total()
    );
}

/// Shortest prefix length (at least MIN_ID_DISPLAY_LEN) that keeps every id distinct
fn id_display_len(tasks: &[Task]) -> usize {
    let longest = tasks.iter().map(|t| t.id.len()).max().unwrap_or(0);
    (MIN_ID_DISPLAY_LEN..longest)
        .find(|&len| {
            let mut prefixes: Vec<&str> = tasks.iter().map(|t| t.id.get(..len).unwrap_or(&t.id)).collect();
            prefixes.sort_unstable();
            prefixes.windows(2).all(|pair| pair[0] != pair[1])
        })
        .unwrap_or(longest)
}
