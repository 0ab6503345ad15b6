//! Status event payloads published through the hub
//!
//! Events are snapshots keyed by item ID, not deltas. There is no sequence
//! number; consumers keep the latest event per ID.

use crate::state::{HeadingCounts, Status, WorkItem};
use serde::Serialize;

/// Status values that can appear in an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Queued,
    Running,
    Done,
    Error,
    Deleted,
}

impl From<Status> for EventStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Queued => Self::Queued,
            Status::Running => Self::Running,
            Status::Done => Self::Done,
            Status::Error => Self::Error,
        }
    }
}

/// Published when an item is first submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedEvent {
    pub id: String,
    pub url: String,
    #[serde(rename = "normalizedURL")]
    pub normalized_url: String,
    pub status: EventStatus,
}

/// Minimal `{id, status}` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionEvent {
    pub id: String,
    pub status: EventStatus,
}

/// Published when an attempt ends, with the full result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalEvent {
    pub id: String,
    pub status: EventStatus,
    pub page_title: String,
    pub html_version: String,
    #[serde(flatten)]
    pub headings: HeadingCounts,
    pub internal_links: u32,
    pub external_links: u32,
    pub inaccessible_links: u32,
    pub has_login_form: bool,
    pub error_code: i64,
    pub error_reason: String,
}

/// Any event the hub can publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StatusEvent {
    Created(CreatedEvent),
    Transition(TransitionEvent),
    Terminal(TerminalEvent),
}

impl StatusEvent {
    /// A newly submitted item
    pub fn created(item: &WorkItem) -> Self {
        Self::Created(CreatedEvent {
            id: item.id.clone(),
            url: item.url.clone(),
            normalized_url: item.normalized_url.clone(),
            status: item.status.into(),
        })
    }

    /// `{id, status}` for the item's current status (queued or running)
    pub fn transition(item: &WorkItem) -> Self {
        Self::Transition(TransitionEvent {
            id: item.id.clone(),
            status: item.status.into(),
        })
    }

    /// A deleted item
    pub fn deleted(id: impl Into<String>) -> Self {
        Self::Transition(TransitionEvent {
            id: id.into(),
            status: EventStatus::Deleted,
        })
    }

    /// The recorded outcome of an attempt
    pub fn terminal(item: &WorkItem) -> Self {
        let result = &item.result;
        Self::Terminal(TerminalEvent {
            id: item.id.clone(),
            status: item.status.into(),
            page_title: result.page_title.clone(),
            html_version: result.html_version.clone(),
            headings: result.headings,
            internal_links: result.internal_links,
            external_links: result.external_links,
            inaccessible_links: result.inaccessible_links,
            has_login_form: result.has_login_form,
            error_code: item.error_code,
            error_reason: item.error_reason.clone(),
        })
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Created(e) => &e.id,
            Self::Transition(e) => &e.id,
            Self::Terminal(e) => &e.id,
        }
    }

    pub fn status(&self) -> EventStatus {
        match self {
            Self::Created(e) => e.status,
            Self::Transition(e) => e.status,
            Self::Terminal(e) => e.status,
        }
    }
}
