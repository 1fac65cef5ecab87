//! Session document caching
//!
//! The document is read on every poll cycle but changes rarely, so parsing is
//! skipped while the raw text is unchanged.

use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

use super::SessionDocument;
use crate::Result;

/// Cached parse of the last session document seen
#[derive(Debug, Clone)]
struct CacheEntry {
    raw: String,
    document: Arc<SessionDocument>,
    parsed_at: SystemTime,
}

/// Parses session documents, reusing the previous result while the text is unchanged.
#[derive(Debug, Default)]
pub struct SessionDocumentCache {
    entry: Option<CacheEntry>,
    parse_count: u64,
}

impl SessionDocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `raw`, or return the cached document if `raw` matches the last one.
    ///
    /// Failed parses are not cached; the next call with the same text retries.
    pub fn parse(&mut self, raw: &str) -> Result<Arc<SessionDocument>> {
        if let Some(entry) = &self.entry {
            if entry.raw == raw {
                return Ok(Arc::clone(&entry.document));
            }
        }

        let document = Arc::new(SessionDocument::parse(raw)?);
        self.parse_count += 1;
        debug!(
            bytes = raw.len(),
            track = %document.weekend_info.track_name,
            sessions = document.session_info.sessions.len(),
            "Parsed new session document"
        );

        self.entry = Some(CacheEntry {
            raw: raw.to_string(),
            document: Arc::clone(&document),
            parsed_at: SystemTime::now(),
        });
        Ok(document)
    }

    /// Number of documents actually parsed (cache misses that succeeded)
    pub fn parse_count(&self) -> u64 {
        self.parse_count
    }

    /// When the cached document was parsed
    pub fn parsed_at(&self) -> Option<SystemTime> {
        self.entry.as_ref().map(|entry| entry.parsed_at)
    }

    /// Drop the cached document
    pub fn clear(&mut self) {
        self.entry = None;
    }
}
