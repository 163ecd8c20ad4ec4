// Data model for schedule records and execution outcomes

use crate::errors::ScheduleError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

/// Minimum cadence: one minute, expressed in hours.
pub const MIN_PERIOD_HOURS: f64 = 1.0 / 60.0;

/// Default cadence when the caller does not provide one.
pub const DEFAULT_PERIOD_HOURS: f64 = 48.0;

/// Maximum cadence: ten years, expressed in hours.
pub const MAX_PERIOD_HOURS: f64 = 87_600.0;

/// Default jitter window when the caller does not provide one.
pub const DEFAULT_JITTER_MINUTES: i64 = 7;

/// Maximum jitter window: one year, expressed in minutes.
pub const MAX_JITTER_MINUTES: i64 = 525_600;

fn listing_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^https://www\.leboncoin\.fr/").expect("valid regex"))
}

/// Returns true if the URL points at a Leboncoin listing.
pub fn is_listing_url(url: &str) -> bool {
    listing_url_regex().is_match(url)
}

/// One recurring repost job.
///
/// The store owns the durable copy; the runner only holds a transient
/// snapshot while processing a single execution. `last_result` and
/// `next_run` are mutated by the runner, `active` by the toggle endpoint,
/// everything else is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub url: String,
    pub period_hours: f64,
    pub jitter_minutes: i64,
    pub next_run: Option<DateTime<Utc>>,
    pub last_result: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Schedule {
    /// Build a new schedule record, validating the listing URL and clamping
    /// the timing parameters: period between one hour and ten years
    /// (default 48 hours), jitter between zero and one year of minutes
    /// (default 7). The upper bounds keep the jitter arithmetic inside the
    /// representable time range.
    ///
    /// `next_run` starts unset, which means immediately due; creators that
    /// want the first run a full period out plan it through the jitter
    /// policy and set it before persisting.
    pub fn new(
        url: impl Into<String>,
        period_hours: Option<f64>,
        jitter_minutes: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Self, ScheduleError> {
        let url = url.into();
        if !is_listing_url(&url) {
            return Err(ScheduleError::InvalidListingUrl(url));
        }

        let period_hours = period_hours
            .unwrap_or(DEFAULT_PERIOD_HOURS)
            .max(1.0)
            .min(MAX_PERIOD_HOURS);
        let jitter_minutes = jitter_minutes
            .unwrap_or(DEFAULT_JITTER_MINUTES)
            .clamp(0, MAX_JITTER_MINUTES);

        Ok(Self {
            id: Uuid::new_v4(),
            url,
            period_hours,
            jitter_minutes,
            next_run: None,
            last_result: None,
            active: true,
            created_at: now,
        })
    }

    /// A schedule is due when it is active and its next run time is unset
    /// or has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.active && self.next_run.map_or(true, |next| next <= now)
    }
}

/// Result of one repost attempt, as reported by the action executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub ok: bool,
    pub detail: String,
}

impl Outcome {
    pub fn success(detail: impl Into<String>) -> Self {
        Self {
            ok: true,
            detail: detail.into(),
        }
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: detail.into(),
        }
    }

    /// Format for the `last_result` column: `OK: <detail>` or
    /// `ERR: <detail>`, detail verbatim and untruncated.
    pub fn as_last_result(&self) -> String {
        if self.ok {
            format!("OK: {}", self.detail)
        } else {
            format!("ERR: {}", self.detail)
        }
    }
}
