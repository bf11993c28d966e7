use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::directory::RecipientDirectory;
use crate::records::{ApprovalRecord, Attachment, ChannelRecord, DocumentRecord};
use crate::workflow::{build_workflow_steps, Priority, Workflow};

pub const CHANNEL_NAME_LIMIT: usize = 30;
pub const APPROVAL_STATUS_PENDING: &str = "pending";

/// Who is submitting. Taken from the caller's verified token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submitter {
    pub id: String,
    pub name: String,
    pub department: String,
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub document_types: Vec<String>,
    pub recipients: Vec<String>,
    pub files: Vec<FileUpload>,
    pub assignment: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub document: DocumentRecord,
    pub approval: ApprovalRecord,
    pub channel: ChannelRecord,
}

pub fn document_id_at(at: DateTime<Utc>) -> String {
    format!("DOC-{}", at.timestamp_millis())
}

pub fn channel_id_for(document_id: &str) -> String {
    format!("channel-{document_id}")
}

pub fn channel_name_for(title: &str) -> String {
    if title.chars().count() > CHANNEL_NAME_LIMIT {
        let truncated: String = title.chars().take(CHANNEL_NAME_LIMIT).collect();
        format!("{truncated}...")
    } else {
        title.to_string()
    }
}

pub fn encode_attachment(file: FileUpload) -> Attachment {
    let mime_type = file
        .mime_type
        .filter(|mime| !mime.trim().is_empty())
        .unwrap_or_else(|| {
            mime_guess::from_path(&file.name)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });
    Attachment {
        size: file.bytes.len() as u64,
        data: STANDARD.encode(&file.bytes),
        name: file.name,
        mime_type,
    }
}

/// Derives the three projections of one submission. All share the same
/// document id.
pub fn build_submission(
    request: SubmissionRequest,
    submitter: &Submitter,
    at: DateTime<Utc>,
    directory: &RecipientDirectory,
) -> Submission {
    let id = document_id_at(at);
    let submitted_date = at.format("%Y-%m-%d").to_string();
    let document_type = request.document_types.join(", ");
    let title = request.title.trim().to_string();

    let steps = build_workflow_steps(
        &submitter.name,
        &submitted_date,
        &request.recipients,
        directory,
    );
    let workflow = Workflow::new(steps, request.recipients.clone());

    let document = DocumentRecord {
        id: id.clone(),
        title: title.clone(),
        document_type: document_type.clone(),
        submitted_by: submitter.name.clone(),
        submitted_by_department: submitter.department.clone(),
        submitted_by_role: submitter.role.clone(),
        submitted_date: submitted_date.clone(),
        priority: request.priority.display_label().to_string(),
        workflow,
        requires_signature: true,
        signed_by: Vec::new(),
        description: request.description.clone(),
        files: request.files.into_iter().map(encode_attachment).collect(),
        comments: Vec::new(),
        assignment: request.assignment,
    };

    let approval = ApprovalRecord {
        id: id.clone(),
        title: title.clone(),
        document_type,
        submitter: submitter.name.clone(),
        submitted_date,
        status: APPROVAL_STATUS_PENDING.to_string(),
        priority: request.priority.as_str().to_string(),
        description: request.description,
        recipients: directory.display_names(&request.recipients),
        recipient_ids: request.recipients.clone(),
    };

    let mut members = Vec::with_capacity(request.recipients.len() + 1);
    members.push(submitter.id.clone());
    members.extend(request.recipients);

    let channel = ChannelRecord {
        id: channel_id_for(&id),
        name: channel_name_for(&title),
        members,
        is_private: true,
        created_by: submitter.id.clone(),
        created_at: at.to_rfc3339(),
        document_id: id,
    };

    Submission {
        document,
        approval,
        channel,
    }
}
