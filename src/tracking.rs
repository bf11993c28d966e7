use std::sync::Arc;

use tracing::info;

use crate::records::{ApprovalDecision, ApprovalRecord, ChannelRecord, DocumentRecord};
use crate::store::{
    get_as, list_as, Collection, RecordStore, StoreError, StoreResult, WriteBatch,
};
use crate::submission::Submission;

/// Typed front over the documents, approvals and channels collections.
#[derive(Clone)]
pub struct TrackingStore {
    store: Arc<dyn RecordStore>,
}

impl TrackingStore {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Writes all three projections of a submission in one batch.
    pub async fn record_submission(&self, submission: &Submission) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch
            .prepend(
                Collection::Documents,
                submission.document.id.as_str(),
                &submission.document,
            )?
            .prepend(
                Collection::Approvals,
                submission.approval.id.as_str(),
                &submission.approval,
            )?
            .prepend(
                Collection::Channels,
                submission.channel.id.as_str(),
                &submission.channel,
            )?;
        self.store.apply(batch).await?;

        info!(
            document_id = %submission.document.id,
            recipients = submission.approval.recipients.len(),
            "submission recorded"
        );
        Ok(())
    }

    pub async fn append_document(&self, document: &DocumentRecord) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.prepend(Collection::Documents, document.id.as_str(), document)?;
        self.store.apply(batch).await
    }

    pub async fn append_approval(&self, approval: &ApprovalRecord) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.prepend(Collection::Approvals, approval.id.as_str(), approval)?;
        self.store.apply(batch).await
    }

    pub async fn append_channel(&self, channel: &ChannelRecord) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.prepend(Collection::Channels, channel.id.as_str(), channel)?;
        self.store.apply(batch).await
    }

    pub async fn documents(&self) -> StoreResult<Vec<DocumentRecord>> {
        list_as(self.store.as_ref(), Collection::Documents).await
    }

    pub async fn document(&self, id: &str) -> StoreResult<Option<DocumentRecord>> {
        get_as(self.store.as_ref(), Collection::Documents, id).await
    }

    pub async fn approvals(&self) -> StoreResult<Vec<ApprovalRecord>> {
        list_as(self.store.as_ref(), Collection::Approvals).await
    }

    pub async fn approval(&self, id: &str) -> StoreResult<Option<ApprovalRecord>> {
        get_as(self.store.as_ref(), Collection::Approvals, id).await
    }

    /// Filters the pending approvals by id equality.
    pub async fn remove_approval(&self, id: &str) -> StoreResult<()> {
        self.store.delete(Collection::Approvals, id).await
    }

    pub async fn channels(&self, member: Option<&str>) -> StoreResult<Vec<ChannelRecord>> {
        let channels: Vec<ChannelRecord> = list_as(self.store.as_ref(), Collection::Channels).await?;
        Ok(match member {
            Some(member) => channels
                .into_iter()
                .filter(|channel| channel.members.iter().any(|m| m == member))
                .collect(),
            None => channels,
        })
    }

    /// Stores the decision and drops the approval from the pending queue.
    /// Document and channel records are left in place. Returns `false`, and
    /// writes nothing, when the approval is no longer pending, so of two
    /// racing decisions only the first is kept.
    pub async fn finalize_approval(&self, decision: &ApprovalDecision) -> StoreResult<bool> {
        let mut batch = WriteBatch::new();
        batch
            .put(
                Collection::ApprovalDecisions,
                decision.document_id.as_str(),
                decision,
            )?
            .take(Collection::Approvals, decision.document_id.as_str());
        match self.store.apply(batch).await {
            Ok(()) => {}
            Err(StoreError::Missing { .. }) => return Ok(false),
            Err(err) => return Err(err),
        }

        info!(
            document_id = %decision.document_id,
            decision = ?decision.decision,
            approver = %decision.approver,
            "approval finalized"
        );
        Ok(true)
    }

    pub async fn decision(&self, document_id: &str) -> StoreResult<Option<ApprovalDecision>> {
        get_as(self.store.as_ref(), Collection::ApprovalDecisions, document_id).await
    }
}
