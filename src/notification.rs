//! Diagnostic Notices
//!
//! Conditions that are recovered locally (a delete that finds nothing to
//! delete) are not errors, but callers still get told about them through a
//! pluggable [`NoticeSink`].

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Maximum notices kept by [`NoticeLog`]
pub const MAX_HISTORY: usize = 50;

/// What a notice is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Delete target was already absent
    NotFoundOnDelete,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFoundOnDelete => "not_found_on_delete",
        }
    }
}

/// A single diagnostic notice
#[derive(Debug, Clone)]
pub struct Notice {
    pub id: Uuid,
    pub kind: NoticeKind,
    /// Name of the resource group the notice refers to
    pub resource: String,
    pub message: String,
    pub created_at: Instant,
}

impl Notice {
    pub fn new(kind: NoticeKind, resource: &str, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            resource: resource.to_string(),
            message,
            created_at: Instant::now(),
        }
    }

    /// Notice for a delete whose target did not exist
    pub fn not_found_on_delete(name: &str) -> Self {
        Self::new(
            NoticeKind::NotFoundOnDelete,
            name,
            format!("Resource group {} not found.", name),
        )
    }
}

/// Output collaborator for diagnostic notices
pub trait NoticeSink: Send + Sync {
    fn notice(&self, notice: Notice);
}

/// Emits notices as `tracing` warnings
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNoticeSink;

impl NoticeSink for TracingNoticeSink {
    fn notice(&self, notice: Notice) {
        tracing::warn!(
            id = %notice.id,
            kind = notice.kind.as_str(),
            resource = %notice.resource,
            "{}",
            notice.message
        );
    }
}

/// Writes notices to stderr, keeping stdout clean for command output
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNoticeSink;

impl NoticeSink for ConsoleNoticeSink {
    fn notice(&self, notice: Notice) {
        tracing::debug!(id = %notice.id, "notice {}: {}", notice.kind.as_str(), notice.resource);
        eprintln!("{}", notice.message);
    }
}

/// Bounded in-memory notice history (most recent first)
#[derive(Debug)]
pub struct NoticeLog {
    notices: Mutex<VecDeque<Notice>>,
    max_history: usize,
}

impl Default for NoticeLog {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    pub fn with_capacity(max_history: usize) -> Self {
        Self {
            notices: Mutex::new(VecDeque::new()),
            max_history: max_history.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of all notices, most recent first
    pub fn notices(&self) -> Vec<Notice> {
        self.lock().iter().cloned().collect()
    }

    /// Notices created within the given window
    pub fn recent(&self, window: Duration) -> Vec<Notice> {
        self.lock()
            .iter()
            .filter(|n| n.created_at.elapsed() < window)
            .cloned()
            .collect()
    }

    /// Look up a notice by id
    pub fn get(&self, id: Uuid) -> Option<Notice> {
        self.lock().iter().find(|n| n.id == id).cloned()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Notice>> {
        // A poisoned log still holds valid notices
        self.notices.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl NoticeSink for NoticeLog {
    fn notice(&self, notice: Notice) {
        let mut notices = self.lock();
        notices.push_front(notice);
        while notices.len() > self.max_history {
            notices.pop_back();
        }
    }
}
