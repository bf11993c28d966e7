//! Persisted record shapes. Field names follow the camelCase keys the web
//! client already reads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::workflow::Workflow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Base64 (standard alphabet) file contents.
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerRecord {
    pub name: String,
    pub role: String,
    pub signed_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub author: String,
    pub message: String,
    pub created_at: String,
}

/// Submitter-facing tracking view of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub document_type: String,
    pub submitted_by: String,
    pub submitted_by_department: String,
    pub submitted_by_role: String,
    pub submitted_date: String,
    pub priority: String,
    pub workflow: Workflow,
    pub requires_signature: bool,
    pub signed_by: Vec<SignerRecord>,
    pub description: String,
    pub files: Vec<Attachment>,
    pub comments: Vec<CommentRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<Value>,
}

/// Reviewer-facing view of a pending document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRecord {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub document_type: String,
    pub submitter: String,
    pub submitted_date: String,
    pub status: String,
    /// Raw priority as submitted (`normal`, `high`, ...), not the display label.
    pub priority: String,
    pub description: String,
    pub recipients: Vec<String>,
    #[serde(default)]
    pub recipient_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRecord {
    pub id: String,
    pub name: String,
    pub members: Vec<String>,
    pub is_private: bool,
    pub created_by: String,
    pub created_at: String,
    pub document_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalDecision {
    pub id: String,
    pub document_id: String,
    pub decision: Decision,
    pub approver: String,
    pub approver_role: String,
    #[serde(default)]
    pub comment: Option<String>,
    pub signed: bool,
    pub decided_at: String,
}
