// CSV export of the task collection
//
// Every present value is quoted with inner quotes doubled. Tags are joined
// with the delimiter before quoting, so a tag that itself contains a comma
// cannot be told apart from two tags.

use crate::models::Task;
use chrono::NaiveDate;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

pub const HEADER: &str = "id,title,due,tags,status,created_at,updated_at";
pub const DELIMITER: char = ',';
pub const MIME_TYPE: &str = "text/csv; charset=utf-8";
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Encode tasks as CSV text: header line plus one line per task, `\n` separated
pub fn encode<'a, I>(tasks: I) -> String
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut out = String::from(HEADER);
    for task in tasks {
        out.push('\n');
        out.push_str(&encode_row(task));
    }
    out
}

fn encode_row(task: &Task) -> String {
    let due = task.due.map(|d| quote(&d.format("%Y-%m-%d").to_string())).unwrap_or_default();
    let fields = [
        quote(&task.id),
        quote(&task.title),
        due,
        quote(&task.tags.join(",")),
        quote(task.status.as_str()),
        quote(&task.created_at.to_string()),
        quote(&task.updated_at.to_string()),
    ];
    fields.join(DELIMITER.to_string().as_str())
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Prefix the UTF-8 byte-order mark so spreadsheet tools detect the encoding
pub fn to_bytes(csv: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(UTF8_BOM.len() + csv.len());
    bytes.extend_from_slice(&UTF8_BOM);
    bytes.extend_from_slice(csv.as_bytes());
    bytes
}

/// `todo-tasks-YYYY-MM-DD.csv`
pub fn file_name(date: NaiveDate) -> String {
    format!("todo-tasks-{}.csv", date.format("%Y-%m-%d"))
}

/// Write the encoded tasks into `dir`, returning the file path
pub fn write_export<'a, I>(dir: &Path, date: NaiveDate, tasks: I) -> io::Result<PathBuf>
where
    I: IntoIterator<Item = &'a Task>,
{
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name(date));
    let csv = encode(tasks);
    fs::write(&path, to_bytes(&csv))?;

    info!(path = ?path, bytes = csv.len(), "Exported tasks");
    Ok(path)
}
