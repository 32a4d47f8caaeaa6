use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A contiguous span of active usage attributed to one (app, window title)
/// pair. While open, `end_time` and `duration_seconds` advance together;
/// once finalized the record is immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub app_name: String,
    pub window_title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: i64,
}

impl Session {
    pub fn open(app_name: String, window_title: String, now: DateTime<Utc>) -> Self {
        Self {
            app_name,
            window_title,
            start_time: now,
            end_time: now,
            duration_seconds: 0,
        }
    }

    pub fn same_target(&self, app_name: &str, window_title: &str) -> bool {
        self.app_name == app_name && self.window_title == window_title
    }

    /// Calendar date the session is attributed to, in local time.
    pub fn local_date(&self) -> NaiveDate {
        self.start_time.with_timezone(&Local).date_naive()
    }
}

/// A session as stored, with its row id and insertion timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: i64,
    #[serde(flatten)]
    pub session: Session,
    pub created_at: DateTime<Utc>,
}
