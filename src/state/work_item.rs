use crate::state::Status;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Heading counts for levels 1 through 6
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeadingCounts {
    pub h1: u32,
    pub h2: u32,
    pub h3: u32,
    pub h4: u32,
    pub h5: u32,
    pub h6: u32,
}

impl HeadingCounts {
    /// Increments the counter for a heading level; levels outside 1..=6 are ignored
    pub fn increment(&mut self, level: u8) {
        match level {
            1 => self.h1 += 1,
            2 => self.h2 += 1,
            3 => self.h3 += 1,
            4 => self.h4 += 1,
            5 => self.h5 += 1,
            6 => self.h6 += 1,
            _ => {}
        }
    }
}

/// Metrics extracted from one analyzed page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// First non-empty `<title>` text
    pub page_title: String,

    /// Placeholder label derived from the HTTP protocol version
    pub html_version: String,

    #[serde(flatten)]
    pub headings: HeadingCounts,

    pub internal_links: u32,

    pub external_links: u32,

    /// Declared but never computed; always zero
    pub inaccessible_links: u32,

    pub has_login_form: bool,
}

/// A submitted URL plus its analysis lifecycle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    /// Opaque unique ID, assigned by the store on creation when empty
    pub id: String,

    /// URL exactly as submitted; this is what gets fetched
    pub url: String,

    #[serde(rename = "normalizedURL")]
    pub normalized_url: String,

    pub status: Status,

    #[serde(flatten)]
    pub result: AnalysisResult,

    pub error_reason: String,

    pub error_code: i64,

    pub created_at: DateTime<Utc>,

    /// Attempt sequence number, bumped on every pickup and every reset
    pub attempt: u64,
}

impl WorkItem {
    /// Creates a queued item that has not been stored yet
    pub fn new(url: impl Into<String>, normalized_url: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            url: url.into(),
            normalized_url: normalized_url.into(),
            status: Status::Queued,
            result: AnalysisResult::default(),
            error_reason: String::new(),
            error_code: 0,
            created_at: Utc::now(),
            attempt: 0,
        }
    }

    /// Clears every result and error field and requeues the item
    ///
    /// The attempt number moves forward so that writes from any attempt still
    /// in flight are rejected by the store.
    pub fn reset(&mut self) {
        self.status = Status::Queued;
        self.result = AnalysisResult::default();
        self.error_reason.clear();
        self.error_code = 0;
        self.attempt += 1;
    }

    /// Marks the item as picked up for a new attempt
    pub fn begin_attempt(&mut self) {
        self.status = Status::Running;
        self.attempt += 1;
    }

    /// Records a successful analysis
    pub fn record_success(&mut self, result: AnalysisResult) {
        self.status = Status::Done;
        self.result = result;
        self.error_reason.clear();
        self.error_code = 0;
    }

    /// Records a failed analysis
    pub fn record_failure(&mut self, reason: impl Into<String>, code: i64) {
        self.status = Status::Error;
        self.error_reason = reason.into();
        self.error_code = code;
    }
}
