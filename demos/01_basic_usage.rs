//! Demo 01: Basic usage
//!
//! Adds a few tasks, changes their status, queries a view, prints the
//! counts and exports everything to CSV.
//!
//! Run with: cargo run --example 01_basic_usage

use chrono::{NaiveDate, Utc};
use eyre::Result;
use todostore::{
    NewTask, Query, SortBy, SqliteKv, Status, StatusFilter, TaskRepository, TaskStore, count_by_status, export,
    parse_tags,
};

fn main() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let data_dir = temp_dir.path().join("data");

    println!("TodoStore Basic Usage Demo");
    println!("==========================\n");

    let repo = TaskRepository::new(SqliteKv::open(&data_dir)?);
    let mut store = TaskStore::open(repo);
    println!("Opened store with {} tasks.\n", store.len());

    println!("1. ADD - Creating tasks...");
    let milk = store.add(NewTask::new("Buy milk").tags(parse_tags("home, errand")))?.into_result()?;
    let report = store
        .add(
            NewTask::new("Write \"quarterly\" report")
                .due(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default())
                .tags(["work"])
                .status(Status::Doing),
        )?
        .into_result()?;
    store.add(NewTask::new("Book flights").due(Utc::now().date_naive()))?.into_result()?;
    for task in store.tasks() {
        println!("   - {} [{}] {}", task.id, task.status, task.title);
    }
    println!();

    println!("2. STATUS - Completing and toggling...");
    store.set_status(&milk.id, Status::Done).into_result()?;
    store.toggle(&report.id).into_result()?;
    println!("   {} -> {}", milk.title, Status::Done);
    println!("   {} -> {}\n", report.title, Status::Done);

    println!("3. QUERY - Open tasks by due date...");
    let query = Query {
        status: StatusFilter::Only(Status::Todo),
        sort_by: SortBy::DueAsc,
        ..Query::default()
    };
    for task in query.apply(store.tasks()) {
        let due = task.due.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
        println!("   - {} (due {})", task.title, due);
    }
    println!();

    let counts = count_by_status(store.tasks());
    println!("4. SUMMARY - todo: {}, doing: {}, done: {}\n", counts.todo, counts.doing, counts.done);

    println!("5. EXPORT - Writing CSV...");
    let path = export::write_export(temp_dir.path(), Utc::now().date_naive(), store.tasks())?;
    println!("   Wrote {}", path.display());
    println!("{}\n", export::encode(store.tasks()));

    println!("Demo complete!");
    Ok(())
}
