//! Statistics over the work item store

use crate::state::{Status, WorkItem};
use crate::storage::{StorageResult, Store};
use std::collections::HashMap;

/// Summary of everything in the store
#[derive(Debug, Clone, Default)]
pub struct AnalysisStatistics {
    /// Total number of work items
    pub total_items: u64,

    /// Count of items by status
    pub items_by_status: HashMap<Status, u64>,

    /// Failed items grouped by error code
    pub error_summary: HashMap<i64, u64>,

    /// Items whose page carries a password input
    pub login_pages: u64,
}

impl AnalysisStatistics {
    pub fn count(&self, status: Status) -> u64 {
        self.items_by_status.get(&status).copied().unwrap_or(0)
    }

    /// Percentage of items that finished successfully
    pub fn success_rate(&self) -> f64 {
        percentage(self.count(Status::Done), self.total_items)
    }
}

/// Loads statistics from storage
pub fn load_statistics(store: &dyn Store) -> StorageResult<AnalysisStatistics> {
    let mut items_by_status = HashMap::new();
    let mut total_items = 0;

    for status in Status::all() {
        let count = store.count_by_status(status)?;
        total_items += count;
        if count > 0 {
            items_by_status.insert(status, count);
        }
    }

    let failed = store.query_by_status(Status::Error)?;
    let mut error_summary = HashMap::new();
    for item in &failed {
        *error_summary.entry(item.error_code).or_insert(0) += 1;
    }

    let login_pages = store
        .query_by_status(Status::Done)?
        .iter()
        .filter(|item| item.result.has_login_form)
        .count() as u64;

    Ok(AnalysisStatistics {
        total_items,
        items_by_status,
        error_summary,
        login_pages,
    })
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &AnalysisStatistics) {
    println!("=== Analysis Statistics ===\n");

    println!("Items by Status:");
    for status in Status::all() {
        let count = stats.count(status);
        println!(
            "  {}: {} ({:.1}%)",
            status,
            count,
            percentage(count, stats.total_items)
        );
    }
    println!();

    if !stats.error_summary.is_empty() {
        println!("Error Summary:");
        let mut error_counts: Vec<_> = stats.error_summary.iter().collect();
        error_counts.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

        for (code, count) in error_counts {
            println!("  code {}: {}", code, count);
        }
        println!();
    }

    println!("Pages with login forms: {}", stats.login_pages);
    println!(
        "Success Rate: {:.1}% ({} / {} items analyzed successfully)",
        stats.success_rate(),
        stats.count(Status::Done),
        stats.total_items
    );
}

/// One-line listing of an item
pub fn summary_line(item: &WorkItem) -> String {
    let detail = match item.status {
        Status::Done => format!("\"{}\"", item.result.page_title),
        Status::Error => item.error_reason.clone(),
        _ => String::new(),
    };
    format!(
        "{}  {:<7}  {}  {}",
        item.id,
        item.status.to_db_string(),
        item.normalized_url,
        detail
    )
    .trim_end()
    .to_string()
}

fn percentage(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}
