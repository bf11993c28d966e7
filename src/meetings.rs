//! Client for the meetings backend.
//!
//! Every call goes to the remote service when one is configured. When it is
//! not configured or the call fails, the client answers from the local
//! `livemeet-requests` collection instead.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveTime, TimeZone, Utc};
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::store::{get_as, list_as, Collection, RecordStore, StoreResult};

/// Start hours of the canned suggestion slots, in UTC.
const SUGGESTED_START_HOURS: [u32; 3] = [10, 14, 16];
const DEFAULT_DURATION_MINUTES: i64 = 60;
/// Longest slot a suggestion may ask for.
pub const MAX_DURATION_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Completed,
}

impl MeetingStatus {
    /// Meetings in these states no longer block anyone's calendar.
    pub fn is_closed(self) -> bool {
        matches!(
            self,
            MeetingStatus::Rejected | MeetingStatus::Cancelled | MeetingStatus::Completed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Remote,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub organizer: String,
    pub attendees: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub status: MeetingStatus,
    pub created_at: DateTime<Utc>,
}

impl Meeting {
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && start < self.end_time
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMeeting {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub attendees: Vec<String>,
    #[serde(default)]
    pub document_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictQuery {
    pub attendees: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub has_conflicts: bool,
    pub conflicts: Vec<Meeting>,
    pub source: DataSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionQuery {
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub preferred_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestions {
    pub slots: Vec<TimeSlot>,
    pub source: DataSource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteConflicts {
    #[serde(default)]
    conflicts: Vec<Meeting>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteSuggestions {
    #[serde(default)]
    suggestions: Vec<TimeSlot>,
}

#[derive(Clone)]
pub struct MeetingsClient {
    client: Client,
    base_url: Option<String>,
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl MeetingsClient {
    pub fn new(
        base_url: Option<String>,
        timeout: Duration,
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build meetings client")?;
        Ok(Self {
            client,
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
            store,
            clock,
        })
    }

    pub fn is_remote(&self) -> bool {
        self.base_url.is_some()
    }

    async fn call<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let Some(base_url) = self.base_url.as_deref() else {
            bail!("meetings backend not configured");
        };
        let mut request = self.client.request(method, format!("{base_url}{path}"));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.context("meetings request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("meetings backend returned {status}: {body}");
        }
        response
            .json()
            .await
            .context("meetings response was not valid JSON")
    }

    fn fallback_warning(&self, operation: &str, err: &anyhow::Error) {
        if self.is_remote() {
            warn!(operation, error = %err, "meetings backend call failed; using local data");
        }
    }

    pub async fn create(&self, organizer: &str, request: NewMeeting) -> StoreResult<Meeting> {
        let body = json!({
            "title": &request.title,
            "description": &request.description,
            "organizer": organizer,
            "attendees": &request.attendees,
            "documentId": &request.document_id,
            "startTime": request.start_time,
            "endTime": request.end_time,
            "platform": &request.platform,
        });
        match self.call::<_, Meeting>(Method::POST, "/meetings", Some(&body)).await {
            Ok(meeting) => return Ok(meeting),
            Err(err) => self.fallback_warning("create", &err),
        }

        let meeting = Meeting {
            id: format!("meeting-{}", Uuid::new_v4()),
            title: request.title,
            description: request.description,
            organizer: organizer.to_string(),
            attendees: request.attendees,
            document_id: request.document_id,
            start_time: request.start_time,
            end_time: request.end_time,
            platform: request.platform,
            status: MeetingStatus::Pending,
            created_at: self.clock.now(),
        };
        self.store
            .put(
                Collection::MeetingRequests,
                &meeting.id,
                serde_json::to_value(&meeting)?,
            )
            .await?;
        info!(meeting_id = %meeting.id, attendees = meeting.attendees.len(), "meeting stored locally");
        Ok(meeting)
    }

    pub async fn list(&self) -> StoreResult<Vec<Meeting>> {
        match self.call::<(), Vec<Meeting>>(Method::GET, "/meetings", None).await {
            Ok(meetings) => return Ok(meetings),
            Err(err) => self.fallback_warning("list", &err),
        }
        list_as(self.store.as_ref(), Collection::MeetingRequests).await
    }

    pub async fn check_conflicts(&self, query: &ConflictQuery) -> StoreResult<ConflictReport> {
        match self
            .call::<_, RemoteConflicts>(Method::POST, "/meetings/conflicts", Some(query))
            .await
        {
            Ok(remote) => {
                return Ok(ConflictReport {
                    has_conflicts: !remote.conflicts.is_empty(),
                    conflicts: remote.conflicts,
                    source: DataSource::Remote,
                })
            }
            Err(err) => self.fallback_warning("conflicts", &err),
        }

        let meetings: Vec<Meeting> = list_as(self.store.as_ref(), Collection::MeetingRequests).await?;
        let conflicts = local_conflicts(&meetings, query);
        Ok(ConflictReport {
            has_conflicts: !conflicts.is_empty(),
            conflicts,
            source: DataSource::Local,
        })
    }

    pub async fn suggest(&self, query: &SuggestionQuery) -> Suggestions {
        match self
            .call::<_, RemoteSuggestions>(Method::POST, "/meetings/ai-suggestions", Some(query))
            .await
        {
            Ok(remote) => Suggestions {
                slots: remote.suggestions,
                source: DataSource::Remote,
            },
            Err(err) => {
                self.fallback_warning("suggestions", &err);
                Suggestions {
                    slots: canned_slots(query, self.clock.now()),
                    source: DataSource::Local,
                }
            }
        }
    }

    /// Returns `None` when the meeting is unknown locally and the backend is
    /// unavailable.
    pub async fn update_status(
        &self,
        id: &str,
        status: MeetingStatus,
    ) -> StoreResult<Option<Meeting>> {
        let path = format!("/meetings/{id}/status");
        match self
            .call::<_, Meeting>(Method::PATCH, &path, Some(&json!({ "status": status })))
            .await
        {
            Ok(meeting) => return Ok(Some(meeting)),
            Err(err) => self.fallback_warning("update_status", &err),
        }

        let Some(mut meeting) =
            get_as::<Meeting>(self.store.as_ref(), Collection::MeetingRequests, id).await?
        else {
            return Ok(None);
        };
        meeting.status = status;
        self.store
            .put(
                Collection::MeetingRequests,
                &meeting.id,
                serde_json::to_value(&meeting)?,
            )
            .await?;
        info!(meeting_id = %meeting.id, status = ?status, "meeting status updated locally");
        Ok(Some(meeting))
    }
}

/// Open meetings sharing an attendee with the query and overlapping its
/// time range.
pub fn local_conflicts(meetings: &[Meeting], query: &ConflictQuery) -> Vec<Meeting> {
    meetings
        .iter()
        .filter(|meeting| !meeting.status.is_closed())
        .filter(|meeting| meeting.overlaps(query.start_time, query.end_time))
        .filter(|meeting| {
            meeting
                .attendees
                .iter()
                .chain(std::iter::once(&meeting.organizer))
                .any(|person| query.attendees.contains(person))
        })
        .cloned()
        .collect()
}

pub fn canned_slots(query: &SuggestionQuery, now: DateTime<Utc>) -> Vec<TimeSlot> {
    let duration = ChronoDuration::minutes(
        query
            .duration_minutes
            .filter(|minutes| *minutes > 0)
            .unwrap_or(DEFAULT_DURATION_MINUTES)
            .min(MAX_DURATION_MINUTES),
    );
    let date = query
        .preferred_date
        .unwrap_or_else(|| (now + ChronoDuration::days(1)).date_naive());

    SUGGESTED_START_HOURS
        .iter()
        .filter_map(|hour| NaiveTime::from_hms_opt(*hour, 0, 0))
        .map(|time| {
            let start = Utc.from_utc_datetime(&date.and_time(time));
            TimeSlot {
                start_time: start,
                end_time: start + duration,
                reason: "Common availability window".to_string(),
            }
        })
        .collect()
}
