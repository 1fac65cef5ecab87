//! # Session Information Parsing
//!
//! iRacing publishes session metadata as a YAML document that changes only when
//! the session does (new session, driver joins, results posted). The overlays
//! need three things from it: the track name, the list of sessions and which of
//! them is running.
//!
//! Only that subset is modelled. Every field is defaulted, so a document that
//! omits a key parses to an empty value rather than failing, and keys the
//! model does not know are ignored.
//!
//! ```text
//! WeekendInfo:
//!   TrackName: watkinsglen 2021 fullcourse
//!   TrackDisplayName: Watkins Glen International
//! SessionInfo:
//!   CurrentSessionNum: 2
//!   Sessions:
//!   - SessionNum: 0
//!     SessionType: Practice
//!   ...
//! ```

use serde::{Deserialize, Serialize};

pub mod cache;

pub use cache::SessionDocumentCache;

use crate::yaml_utils;

/// Session information document as published by iRacing
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct SessionDocument {
    /// Weekend and track information
    pub weekend_info: WeekendInfo,
    /// Session list
    pub session_info: SessionList,
}

/// Weekend and track information
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct WeekendInfo {
    /// Internal track name
    pub track_name: String,
    /// Track display name
    pub track_display_name: String,
    /// Track configuration name
    pub track_config_name: Option<String>,
    /// Track ID
    #[serde(rename = "TrackID")]
    pub track_id: Option<i32>,
}

/// Session list and the index of the running session
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct SessionList {
    pub current_session_num: Option<i32>,
    pub sessions: Vec<Session>,
}

/// Individual session entry
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct Session {
    pub session_num: i32,
    /// "Practice", "Lone Qualify", "Race", ...
    pub session_type: String,
    pub session_name: Option<String>,
    /// "unlimited" or a lap count
    pub session_laps: String,
    /// "unlimited" or a duration such as "1800.0000 sec"
    pub session_time: String,
}

impl SessionDocument {
    /// Preprocess and parse a raw session document.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let cleaned = yaml_utils::preprocess_iracing_yaml(raw);
        let parsed: Option<SessionDocument> =
            serde_yaml_ng::from_str(&cleaned).map_err(|e| crate::TelemetryError::Parse {
                context: "Session document deserialization".to_string(),
                details: e.to_string(),
            })?;
        // A document holding only comments or `---` deserializes to null
        Ok(parsed.unwrap_or_default())
    }

    /// Session type at `index`, or an empty string when no such session exists.
    pub fn session_type(&self, index: i32) -> &str {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.session_info.sessions.get(i))
            .map(|session| session.session_type.as_str())
            .unwrap_or("")
    }
}
