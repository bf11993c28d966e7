//! Emergency notifications: recipient preferences, dispatch policies and the
//! per-channel delivery scheduler.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod push;
pub mod scheduler;

pub use push::{PushGateway, TracingPushGateway, WebhookPushGateway};
pub use scheduler::{EmergencyScheduler, ScheduleHandle, ScheduleKey, ScheduleState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Medium,
    High,
    Urgent,
    Critical,
}

impl Urgency {
    pub const fn as_str(self) -> &'static str {
        match self {
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Urgent => "urgent",
            Urgency::Critical => "critical",
        }
    }

    pub const fn default_interval(self) -> Duration {
        match self {
            Urgency::Medium => Duration::from_secs(60 * 60),
            Urgency::High => Duration::from_secs(30 * 60),
            Urgency::Urgent => Duration::from_secs(15 * 60),
            Urgency::Critical => Duration::from_secs(5 * 60),
        }
    }

    /// Critical notifications go out immediately; everything else waits one
    /// interval first.
    pub fn initial_delay(self, interval: Duration) -> Duration {
        match self {
            Urgency::Critical => Duration::ZERO,
            _ => interval,
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Email,
    Sms,
    Push,
    Whatsapp,
}

impl NotificationChannel {
    pub const ALL: [NotificationChannel; 4] = [
        NotificationChannel::Email,
        NotificationChannel::Sms,
        NotificationChannel::Push,
        NotificationChannel::Whatsapp,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            NotificationChannel::Email => "email",
            NotificationChannel::Sms => "sms",
            NotificationChannel::Push => "push",
            NotificationChannel::Whatsapp => "whatsapp",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationChannel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        NotificationChannel::ALL
            .into_iter()
            .find(|channel| channel.as_str() == value.trim())
            .ok_or_else(|| format!("unknown notification channel {value:?}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelToggles {
    pub email: bool,
    pub sms: bool,
    pub push: bool,
    pub whatsapp: bool,
}

impl Default for ChannelToggles {
    fn default() -> Self {
        Self {
            email: true,
            sms: false,
            push: true,
            whatsapp: false,
        }
    }
}

impl ChannelToggles {
    pub fn enabled(&self) -> Vec<NotificationChannel> {
        NotificationChannel::ALL
            .into_iter()
            .filter(|channel| match channel {
                NotificationChannel::Email => self.email,
                NotificationChannel::Sms => self.sms,
                NotificationChannel::Push => self.push,
                NotificationChannel::Whatsapp => self.whatsapp,
            })
            .collect()
    }
}

/// Profile preferences of one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub recipient_id: String,
    #[serde(default)]
    pub channels: ChannelToggles,
    /// Whether the recipient granted push delivery.
    #[serde(default)]
    pub push_permission: bool,
}

impl UserPreferences {
    pub fn defaults_for(recipient_id: &str) -> Self {
        Self {
            recipient_id: recipient_id.to_string(),
            channels: ChannelToggles::default(),
            push_permission: false,
        }
    }
}

/// Emergency channel override stored for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientOverride {
    pub recipient_id: String,
    pub channels: Vec<NotificationChannel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverrideStrategy {
    DocumentBased,
    RecipientBased,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum DispatchPolicy {
    /// Each recipient's enabled profile channels fire independently.
    #[default]
    ProfileDefaults,
    EmergencyOverride {
        strategy: OverrideStrategy,
        channels: Vec<NotificationChannel>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryOutcome {
    Pushed,
    Logged,
    PermissionDenied,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationLogEntry {
    pub id: String,
    pub document_id: String,
    pub recipient_id: String,
    pub channel: NotificationChannel,
    pub urgency: Urgency,
    pub title: String,
    pub message: String,
    pub outcome: DeliveryOutcome,
    pub delivered_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencySubmission {
    pub id: String,
    pub document_id: String,
    pub title: String,
    pub description: String,
    pub urgency: Urgency,
    pub recipients: Vec<String>,
    pub policy: DispatchPolicy,
    pub interval_seconds: u64,
    pub submitted_by: String,
    pub submitted_at: String,
}

/// Persisted description of one live schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    pub id: String,
    pub document_id: String,
    pub recipient_id: String,
    pub channel: NotificationChannel,
    pub urgency: Urgency,
    pub interval_seconds: u64,
    pub initial_delay_seconds: u64,
    pub scheduled_at: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
}

impl ScheduleRecord {
    pub fn notification(&self) -> Notification {
        Notification {
            title: self.title.clone(),
            message: self.message.clone(),
            urgency: self.urgency,
        }
    }
}

/// What gets delivered on every tick of a schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub urgency: Urgency,
}
