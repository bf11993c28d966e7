use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{
    DeliveryOutcome, DispatchPolicy, EmergencySubmission, Notification, NotificationChannel,
    NotificationLogEntry, OverrideStrategy, PushGateway, RecipientOverride, ScheduleRecord,
    UserPreferences,
};
use crate::clock::{Clock, Timer};
use crate::store::{get_as, list_as, Collection, RecordStore, StoreResult, WriteBatch};

const MIN_INTERVAL: Duration = Duration::from_secs(1);

const STATE_ARMED: u8 = 1;
const STATE_DELIVERING: u8 = 2;
const STATE_STOPPED: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    Idle,
    Armed,
    Delivering,
    Stopped,
}

/// One schedule per document, recipient and channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScheduleKey {
    pub document_id: String,
    pub recipient_id: String,
    pub channel: NotificationChannel,
}

impl ScheduleKey {
    pub fn new(
        document_id: impl Into<String>,
        recipient_id: impl Into<String>,
        channel: NotificationChannel,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            recipient_id: recipient_id.into(),
            channel,
        }
    }

    pub fn record_id(&self) -> String {
        format!("{}:{}:{}", self.document_id, self.recipient_id, self.channel)
    }
}

/// Revocable handle to a running schedule.
#[derive(Debug, Clone)]
pub struct ScheduleHandle {
    state: Arc<AtomicU8>,
    abort: AbortHandle,
}

impl ScheduleHandle {
    pub fn state(&self) -> ScheduleState {
        match self.state.load(Ordering::SeqCst) {
            STATE_ARMED => ScheduleState::Armed,
            STATE_DELIVERING => ScheduleState::Delivering,
            STATE_STOPPED => ScheduleState::Stopped,
            _ => ScheduleState::Idle,
        }
    }

    pub fn cancel(&self) {
        self.state.store(STATE_STOPPED, Ordering::SeqCst);
        self.abort.abort();
    }
}

struct Delivery {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    push: Arc<dyn PushGateway>,
    log_capacity: usize,
}

impl Delivery {
    async fn deliver(&self, key: &ScheduleKey, notification: &Notification) -> StoreResult<()> {
        let outcome = match key.channel {
            NotificationChannel::Push => self.push_outcome(key, notification).await?,
            _ => DeliveryOutcome::Logged,
        };

        let entry = NotificationLogEntry {
            id: Uuid::new_v4().to_string(),
            document_id: key.document_id.clone(),
            recipient_id: key.recipient_id.clone(),
            channel: key.channel,
            urgency: notification.urgency,
            title: notification.title.clone(),
            message: notification.message.clone(),
            outcome,
            delivered_at: self.clock.now().to_rfc3339(),
        };

        let mut batch = WriteBatch::new();
        batch
            .prepend(Collection::NotificationLogs, entry.id.as_str(), &entry)?
            .retain_latest(Collection::NotificationLogs, self.log_capacity);
        self.store.apply(batch).await?;

        debug!(
            document_id = %key.document_id,
            recipient_id = %key.recipient_id,
            channel = %key.channel,
            outcome = ?outcome,
            "notification delivered"
        );
        Ok(())
    }

    async fn push_outcome(
        &self,
        key: &ScheduleKey,
        notification: &Notification,
    ) -> StoreResult<DeliveryOutcome> {
        let preferences: Option<UserPreferences> = get_as(
            self.store.as_ref(),
            Collection::UserPreferences,
            &key.recipient_id,
        )
        .await?;
        if !preferences.map(|p| p.push_permission).unwrap_or(false) {
            return Ok(DeliveryOutcome::PermissionDenied);
        }

        match self
            .push
            .push(&key.recipient_id, &notification.title, &notification.message)
            .await
        {
            Ok(()) => Ok(DeliveryOutcome::Pushed),
            Err(err) => {
                warn!(
                    recipient_id = %key.recipient_id,
                    document_id = %key.document_id,
                    error = %err,
                    "push delivery failed"
                );
                Ok(DeliveryOutcome::Failed)
            }
        }
    }
}

/// Owns every live notification timer. Scheduling a key that is already
/// live cancels the previous timer first.
pub struct EmergencyScheduler {
    delivery: Arc<Delivery>,
    timer: Arc<dyn Timer>,
    submission_capacity: usize,
    handles: Mutex<HashMap<ScheduleKey, ScheduleHandle>>,
}

impl EmergencyScheduler {
    pub fn new(
        store: Arc<dyn RecordStore>,
        timer: Arc<dyn Timer>,
        clock: Arc<dyn Clock>,
        push: Arc<dyn PushGateway>,
        log_capacity: usize,
        submission_capacity: usize,
    ) -> Self {
        Self {
            delivery: Arc::new(Delivery {
                store,
                clock,
                push,
                log_capacity: log_capacity.max(1),
            }),
            timer,
            submission_capacity: submission_capacity.max(1),
            handles: Mutex::new(HashMap::new()),
        }
    }

    fn handles(&self) -> MutexGuard<'_, HashMap<ScheduleKey, ScheduleHandle>> {
        self.handles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Starts recurring delivery for `key`. Must be called inside a tokio
    /// runtime.
    pub fn schedule(
        &self,
        key: ScheduleKey,
        notification: Notification,
        interval: Duration,
    ) -> ScheduleHandle {
        let interval = interval.max(MIN_INTERVAL);
        let initial_delay = notification.urgency.initial_delay(interval);
        let state = Arc::new(AtomicU8::new(STATE_ARMED));

        let task_state = state.clone();
        let task_key = key.clone();
        let delivery = self.delivery.clone();
        let timer = self.timer.clone();
        let join = tokio::spawn(async move {
            if !initial_delay.is_zero() {
                timer.sleep(initial_delay).await;
            }
            loop {
                let _ = task_state.compare_exchange(
                    STATE_ARMED,
                    STATE_DELIVERING,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                );
                if task_state.load(Ordering::SeqCst) == STATE_STOPPED {
                    break;
                }
                if let Err(err) = delivery.deliver(&task_key, &notification).await {
                    error!(
                        document_id = %task_key.document_id,
                        recipient_id = %task_key.recipient_id,
                        channel = %task_key.channel,
                        error = %err,
                        "failed to record notification delivery"
                    );
                }
                timer.sleep(interval).await;
            }
        });

        let handle = ScheduleHandle {
            state,
            abort: join.abort_handle(),
        };

        if let Some(previous) = self.handles().insert(key.clone(), handle.clone()) {
            previous.cancel();
            debug!(
                document_id = %key.document_id,
                recipient_id = %key.recipient_id,
                channel = %key.channel,
                "replaced existing notification schedule"
            );
        }

        handle
    }

    pub fn state(&self, key: &ScheduleKey) -> ScheduleState {
        self.handles()
            .get(key)
            .map(ScheduleHandle::state)
            .unwrap_or(ScheduleState::Idle)
    }

    pub fn live_schedules(&self, document_id: &str) -> Vec<ScheduleKey> {
        let mut keys: Vec<ScheduleKey> = self
            .handles()
            .keys()
            .filter(|key| key.document_id == document_id)
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Stops every schedule of the document and forgets its schedule
    /// records. Returns how many timers were stopped.
    pub async fn cancel_document(&self, document_id: &str) -> StoreResult<usize> {
        let cancelled: Vec<ScheduleKey> = {
            let mut handles = self.handles();
            let keys: Vec<ScheduleKey> = handles
                .keys()
                .filter(|key| key.document_id == document_id)
                .cloned()
                .collect();
            for key in &keys {
                if let Some(handle) = handles.remove(key) {
                    handle.cancel();
                }
            }
            keys
        };

        let records: Vec<ScheduleRecord> = list_as(
            self.delivery.store.as_ref(),
            Collection::NotificationIntervals,
        )
        .await?;
        let mut batch = WriteBatch::new();
        for record in records.iter().filter(|r| r.document_id == document_id) {
            batch.delete(Collection::NotificationIntervals, record.id.as_str());
        }
        self.delivery.store.apply(batch).await?;

        info!(document_id, cancelled = cancelled.len(), "cancelled notification schedules");
        Ok(cancelled.len())
    }

    /// Channels each recipient should be notified on under `policy`.
    pub async fn resolve_channels(
        &self,
        policy: &DispatchPolicy,
        recipients: &[String],
    ) -> StoreResult<Vec<(String, Vec<NotificationChannel>)>> {
        let store = self.delivery.store.as_ref();
        let mut resolved = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let channels = match policy {
                DispatchPolicy::ProfileDefaults => {
                    let preferences: Option<UserPreferences> =
                        get_as(store, Collection::UserPreferences, recipient).await?;
                    preferences
                        .unwrap_or_else(|| UserPreferences::defaults_for(recipient))
                        .channels
                        .enabled()
                }
                DispatchPolicy::EmergencyOverride {
                    strategy: OverrideStrategy::DocumentBased,
                    channels,
                } => channels.clone(),
                DispatchPolicy::EmergencyOverride {
                    strategy: OverrideStrategy::RecipientBased,
                    channels,
                } => {
                    let stored: Option<RecipientOverride> =
                        get_as(store, Collection::EmergencyRecipientSettings, recipient).await?;
                    match stored {
                        Some(stored) if !stored.channels.is_empty() => stored.channels,
                        _ => channels.clone(),
                    }
                }
            };
            let unique: BTreeSet<NotificationChannel> = channels.into_iter().collect();
            resolved.push((recipient.clone(), unique.into_iter().collect()));
        }
        Ok(resolved)
    }

    /// Records the emergency submission and arms one schedule per recipient
    /// and resolved channel.
    pub async fn dispatch(&self, submission: &EmergencySubmission) -> StoreResult<Vec<ScheduleKey>> {
        let plan = self
            .resolve_channels(&submission.policy, &submission.recipients)
            .await?;
        let interval = Duration::from_secs(submission.interval_seconds).max(MIN_INTERVAL);
        let initial_delay = submission.urgency.initial_delay(interval);
        let scheduled_at = self.delivery.clock.now().to_rfc3339();
        let notification = Notification {
            title: format!("Emergency: {}", submission.title),
            message: submission.description.clone(),
            urgency: submission.urgency,
        };

        let mut keys = Vec::new();
        let mut batch = WriteBatch::new();
        batch
            .prepend(
                Collection::EmergencySubmissions,
                submission.id.as_str(),
                submission,
            )?
            .retain_latest(Collection::EmergencySubmissions, self.submission_capacity);
        for (recipient, channels) in &plan {
            for channel in channels {
                let key = ScheduleKey::new(&submission.document_id, recipient, *channel);
                let record = ScheduleRecord {
                    id: key.record_id(),
                    document_id: key.document_id.clone(),
                    recipient_id: key.recipient_id.clone(),
                    channel: *channel,
                    urgency: submission.urgency,
                    interval_seconds: interval.as_secs(),
                    initial_delay_seconds: initial_delay.as_secs(),
                    scheduled_at: scheduled_at.clone(),
                    title: notification.title.clone(),
                    message: notification.message.clone(),
                };
                batch.put(Collection::NotificationIntervals, record.id.as_str(), &record)?;
                keys.push(key);
            }
        }
        self.delivery.store.apply(batch).await?;

        for key in &keys {
            self.schedule(key.clone(), notification.clone(), interval);
        }

        info!(
            document_id = %submission.document_id,
            urgency = %submission.urgency,
            schedules = keys.len(),
            "emergency notifications dispatched"
        );
        Ok(keys)
    }

    /// Re-arms every stored schedule record. Meant for startup; the first
    /// delay follows the record's urgency again.
    pub async fn restore(&self) -> StoreResult<usize> {
        let records: Vec<ScheduleRecord> = list_as(
            self.delivery.store.as_ref(),
            Collection::NotificationIntervals,
        )
        .await?;
        for record in &records {
            let key = ScheduleKey::new(&record.document_id, &record.recipient_id, record.channel);
            self.schedule(
                key,
                record.notification(),
                Duration::from_secs(record.interval_seconds),
            );
        }
        if !records.is_empty() {
            info!(schedules = records.len(), "restored notification schedules");
        }
        Ok(records.len())
    }

    pub async fn schedule_records(&self, document_id: &str) -> StoreResult<Vec<ScheduleRecord>> {
        let records: Vec<ScheduleRecord> = list_as(
            self.delivery.store.as_ref(),
            Collection::NotificationIntervals,
        )
        .await?;
        Ok(records
            .into_iter()
            .filter(|record| record.document_id == document_id)
            .collect())
    }

    pub async fn logs(&self, document_id: Option<&str>) -> StoreResult<Vec<NotificationLogEntry>> {
        let entries: Vec<NotificationLogEntry> =
            list_as(self.delivery.store.as_ref(), Collection::NotificationLogs).await?;
        Ok(match document_id {
            Some(document_id) => entries
                .into_iter()
                .filter(|entry| entry.document_id == document_id)
                .collect(),
            None => entries,
        })
    }

    pub async fn submissions(&self) -> StoreResult<Vec<EmergencySubmission>> {
        list_as(self.delivery.store.as_ref(), Collection::EmergencySubmissions).await
    }
}

impl Drop for EmergencyScheduler {
    fn drop(&mut self) {
        for handle in self.handles().values() {
            handle.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, TokioTimer};
    use crate::notifications::{ChannelToggles, Urgency};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Default)]
    struct RecordingPush {
        sent: AsyncMutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl PushGateway for RecordingPush {
        async fn push(&self, recipient_id: &str, title: &str, _body: &str) -> anyhow::Result<()> {
            self.sent
                .lock()
                .await
                .push((recipient_id.to_string(), title.to_string()));
            Ok(())
        }
    }

    struct Harness {
        store: Arc<MemoryStore>,
        push: Arc<RecordingPush>,
        scheduler: EmergencyScheduler,
    }

    fn harness(log_capacity: usize) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let push = Arc::new(RecordingPush::default());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
        ));
        let scheduler = EmergencyScheduler::new(
            store.clone(),
            Arc::new(TokioTimer),
            clock,
            push.clone(),
            log_capacity,
            100,
        );
        Harness {
            store,
            push,
            scheduler,
        }
    }

    fn notification(urgency: Urgency) -> Notification {
        Notification {
            title: "Emergency: Fire drill".to_string(),
            message: "Assemble at the main gate".to_string(),
            urgency,
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn critical_delivers_immediately() {
        let h = harness(1000);
        let key = ScheduleKey::new("DOC-1", "hod-cse", NotificationChannel::Email);
        h.scheduler
            .schedule(key.clone(), notification(Urgency::Critical), Duration::from_secs(300));
        settle().await;

        assert_eq!(h.scheduler.logs(None).await.unwrap().len(), 1);
        assert_eq!(h.scheduler.state(&key), ScheduleState::Delivering);
    }

    #[tokio::test(start_paused = true)]
    async fn medium_waits_for_interval_then_recurs() {
        let h = harness(1000);
        let key = ScheduleKey::new("DOC-1", "hod-cse", NotificationChannel::Sms);
        let interval = Duration::from_secs(3600);
        h.scheduler
            .schedule(key.clone(), notification(Urgency::Medium), interval);
        settle().await;
        assert!(h.scheduler.logs(None).await.unwrap().is_empty());
        assert_eq!(h.scheduler.state(&key), ScheduleState::Armed);

        tokio::time::sleep(interval).await;
        assert_eq!(h.scheduler.logs(None).await.unwrap().len(), 1);

        tokio::time::sleep(interval).await;
        assert_eq!(h.scheduler.logs(None).await.unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_previous_timer() {
        let h = harness(1000);
        let key = ScheduleKey::new("DOC-1", "hod-cse", NotificationChannel::Email);
        let first = h
            .scheduler
            .schedule(key.clone(), notification(Urgency::Critical), Duration::from_secs(60));
        let second = h
            .scheduler
            .schedule(key.clone(), notification(Urgency::Critical), Duration::from_secs(60));
        settle().await;

        assert_eq!(first.state(), ScheduleState::Stopped);
        assert_eq!(h.scheduler.logs(None).await.unwrap().len(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(h.scheduler.logs(None).await.unwrap().len(), 2);
        assert_eq!(second.state(), ScheduleState::Delivering);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_document_stops_delivery() {
        let h = harness(1000);
        for recipient in ["hod-cse", "dean-dr-maria-dean"] {
            h.scheduler.schedule(
                ScheduleKey::new("DOC-1", recipient, NotificationChannel::Email),
                notification(Urgency::Critical),
                Duration::from_secs(60),
            );
        }
        let other = ScheduleKey::new("DOC-2", "hod-cse", NotificationChannel::Email);
        h.scheduler
            .schedule(other.clone(), notification(Urgency::Critical), Duration::from_secs(60));
        settle().await;

        assert_eq!(h.scheduler.cancel_document("DOC-1").await.unwrap(), 2);
        assert!(h.scheduler.live_schedules("DOC-1").is_empty());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(h.scheduler.logs(Some("DOC-1")).await.unwrap().len(), 2);
        assert_eq!(h.scheduler.logs(Some("DOC-2")).await.unwrap().len(), 3);
        assert_eq!(h.scheduler.state(&other), ScheduleState::Delivering);
    }

    #[tokio::test(start_paused = true)]
    async fn log_is_capped() {
        let h = harness(5);
        h.scheduler.schedule(
            ScheduleKey::new("DOC-1", "hod-cse", NotificationChannel::Email),
            notification(Urgency::Critical),
            Duration::from_secs(1),
        );
        tokio::time::sleep(Duration::from_millis(9_500)).await;

        assert_eq!(h.store.len(Collection::NotificationLogs).await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn push_requires_granted_permission() {
        let h = harness(1000);
        h.store
            .put(
                Collection::UserPreferences,
                "hod-cse",
                serde_json::to_value(UserPreferences {
                    recipient_id: "hod-cse".to_string(),
                    channels: ChannelToggles::default(),
                    push_permission: true,
                })
                .unwrap(),
            )
            .await
            .unwrap();

        for recipient in ["hod-cse", "hod-eee"] {
            h.scheduler.schedule(
                ScheduleKey::new("DOC-1", recipient, NotificationChannel::Push),
                notification(Urgency::Critical),
                Duration::from_secs(60),
            );
        }
        settle().await;

        let sent = h.push.sent.lock().await.clone();
        assert_eq!(sent, vec![("hod-cse".to_string(), "Emergency: Fire drill".to_string())]);

        let logs = h.scheduler.logs(None).await.unwrap();
        let denied = logs.iter().find(|e| e.recipient_id == "hod-eee").unwrap();
        assert_eq!(denied.outcome, DeliveryOutcome::PermissionDenied);
    }

    #[tokio::test]
    async fn resolves_channels_per_policy() {
        let h = harness(1000);
        h.store
            .put(
                Collection::UserPreferences,
                "hod-cse",
                serde_json::to_value(UserPreferences {
                    recipient_id: "hod-cse".to_string(),
                    channels: ChannelToggles {
                        email: false,
                        sms: true,
                        push: false,
                        whatsapp: true,
                    },
                    push_permission: false,
                })
                .unwrap(),
            )
            .await
            .unwrap();
        h.store
            .put(
                Collection::EmergencyRecipientSettings,
                "hod-cse",
                serde_json::to_value(RecipientOverride {
                    recipient_id: "hod-cse".to_string(),
                    channels: vec![NotificationChannel::Whatsapp],
                })
                .unwrap(),
            )
            .await
            .unwrap();
        let recipients = vec!["hod-cse".to_string(), "hod-eee".to_string()];

        let profile = h
            .scheduler
            .resolve_channels(&DispatchPolicy::ProfileDefaults, &recipients)
            .await
            .unwrap();
        assert_eq!(
            profile[0].1,
            vec![NotificationChannel::Sms, NotificationChannel::Whatsapp]
        );
        assert_eq!(
            profile[1].1,
            vec![NotificationChannel::Email, NotificationChannel::Push]
        );

        let document_based = h
            .scheduler
            .resolve_channels(
                &DispatchPolicy::EmergencyOverride {
                    strategy: OverrideStrategy::DocumentBased,
                    channels: vec![NotificationChannel::Sms],
                },
                &recipients,
            )
            .await
            .unwrap();
        assert!(document_based
            .iter()
            .all(|(_, channels)| channels == &vec![NotificationChannel::Sms]));

        let recipient_based = h
            .scheduler
            .resolve_channels(
                &DispatchPolicy::EmergencyOverride {
                    strategy: OverrideStrategy::RecipientBased,
                    channels: vec![NotificationChannel::Email],
                },
                &recipients,
            )
            .await
            .unwrap();
        assert_eq!(recipient_based[0].1, vec![NotificationChannel::Whatsapp]);
        assert_eq!(recipient_based[1].1, vec![NotificationChannel::Email]);
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_records_submission_and_schedules() {
        let h = harness(1000);
        let submission = EmergencySubmission {
            id: "EMG-1".to_string(),
            document_id: "DOC-9".to_string(),
            title: "Campus closure".to_string(),
            description: "Heavy rain".to_string(),
            urgency: Urgency::Critical,
            recipients: vec!["hod-cse".to_string(), "hod-eee".to_string()],
            policy: DispatchPolicy::EmergencyOverride {
                strategy: OverrideStrategy::DocumentBased,
                channels: vec![NotificationChannel::Email, NotificationChannel::Sms],
            },
            interval_seconds: 300,
            submitted_by: "Dr. Robert Smith".to_string(),
            submitted_at: "2026-03-02T09:00:00+00:00".to_string(),
        };

        let keys = h.scheduler.dispatch(&submission).await.unwrap();
        assert_eq!(keys.len(), 4);
        settle().await;

        assert_eq!(h.scheduler.submissions().await.unwrap().len(), 1);
        assert_eq!(h.scheduler.schedule_records("DOC-9").await.unwrap().len(), 4);
        assert_eq!(h.scheduler.logs(Some("DOC-9")).await.unwrap().len(), 4);

        h.scheduler.cancel_document("DOC-9").await.unwrap();
        assert!(h.scheduler.schedule_records("DOC-9").await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restore_rearms_stored_schedules() {
        let h = harness(1000);
        let submission = EmergencySubmission {
            id: "EMG-2".to_string(),
            document_id: "DOC-3".to_string(),
            title: "Gas leak".to_string(),
            description: "Evacuate the chemistry lab".to_string(),
            urgency: Urgency::Medium,
            recipients: vec!["hod-cse".to_string()],
            policy: DispatchPolicy::EmergencyOverride {
                strategy: OverrideStrategy::DocumentBased,
                channels: vec![NotificationChannel::Email],
            },
            interval_seconds: 600,
            submitted_by: "Dr. Robert Smith".to_string(),
            submitted_at: "2026-03-02T09:00:00+00:00".to_string(),
        };
        h.scheduler.dispatch(&submission).await.unwrap();
        let store = h.store.clone();
        drop(h.scheduler);

        let restarted = EmergencyScheduler::new(
            store.clone(),
            Arc::new(TokioTimer),
            Arc::new(ManualClock::new(
                Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap(),
            )),
            h.push.clone(),
            1000,
            100,
        );
        assert_eq!(restarted.restore().await.unwrap(), 1);
        assert_eq!(restarted.live_schedules("DOC-3").len(), 1);

        tokio::time::sleep(Duration::from_secs(600)).await;
        settle().await;
        let logs = restarted.logs(Some("DOC-3")).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].title, "Emergency: Gas leak");
        assert_eq!(logs[0].message, "Evacuate the chemistry lab");

        assert_eq!(restarted.cancel_document("DOC-3").await.unwrap(), 1);
        assert!(restarted.schedule_records("DOC-3").await.unwrap().is_empty());
    }
}
