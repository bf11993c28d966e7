use axum::extract::{FromRequest, Json, Multipart, Path, Request, State};
use axum::http::{header::CONTENT_TYPE, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::records::DocumentRecord;
use crate::state::AppState;
use crate::submission::{build_submission, FileUpload, Submission, SubmissionRequest};
use crate::summary::DocumentSummary;
use crate::workflow::Priority;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: String,
    #[serde(default)]
    pub document_types: Vec<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub files: Vec<InlineFile>,
    #[serde(default)]
    pub assignment: Option<Value>,
}

/// File carried inside a JSON submission.
#[derive(Debug, Deserialize)]
pub struct InlineFile {
    pub name: String,
    #[serde(default, rename = "type")]
    pub mime_type: Option<String>,
    /// Base64 (standard alphabet) contents.
    pub data: String,
}

impl InlineFile {
    fn decode(self) -> AppResult<FileUpload> {
        let bytes = STANDARD.decode(self.data.trim()).map_err(|err| {
            AppError::bad_request(format!("file {:?} is not valid base64: {err}", self.name))
        })?;
        Ok(FileUpload {
            name: self.name,
            mime_type: self.mime_type,
            bytes,
        })
    }
}

fn into_submission_request(
    payload: CreateDocumentRequest,
    mut uploads: Vec<FileUpload>,
) -> AppResult<SubmissionRequest> {
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }
    let priority: Priority = payload.priority.parse().map_err(AppError::bad_request)?;

    let mut files = payload
        .files
        .into_iter()
        .map(InlineFile::decode)
        .collect::<AppResult<Vec<_>>>()?;
    files.append(&mut uploads);

    Ok(SubmissionRequest {
        title,
        description: payload.description,
        priority,
        document_types: payload.document_types,
        recipients: payload.recipients,
        files,
        assignment: payload.assignment,
    })
}

async fn read_multipart(mut multipart: Multipart) -> AppResult<SubmissionRequest> {
    let mut payload: Option<CreateDocumentRequest> = None;
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        error!(error = %err, "invalid multipart data");
        AppError::bad_request(format!("invalid multipart data: {err}"))
    })? {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("payload") => {
                let value = field.text().await.map_err(|err| {
                    error!(error = %err, "invalid submission payload");
                    AppError::bad_request(format!("invalid payload: {err}"))
                })?;
                payload = Some(serde_json::from_str(&value)?);
            }
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "upload".to_string());
                let content_type = field.content_type().map(|mime| mime.to_string());
                let data = field.bytes().await.map_err(|err| {
                    error!(error = %err, file_name = %file_name, "failed to read file bytes");
                    AppError::bad_request(format!("failed to read file {file_name:?}: {err}"))
                })?;
                uploads.push(FileUpload {
                    name: file_name,
                    mime_type: content_type,
                    bytes: data.to_vec(),
                });
            }
            _ => {}
        }
    }

    let payload = payload.ok_or_else(|| AppError::bad_request("payload field is required"))?;
    into_submission_request(payload, uploads)
}

pub async fn create_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    request: Request,
) -> AppResult<(StatusCode, Json<Submission>)> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("multipart/form-data"))
        .unwrap_or(false);

    let submission_request = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|err| AppError::bad_request(err.body_text()))?;
        read_multipart(multipart).await?
    } else {
        let Json(payload) = Json::<CreateDocumentRequest>::from_request(request, &state)
            .await
            .map_err(|err| AppError::bad_request(err.body_text()))?;
        into_submission_request(payload, Vec::new())?
    };

    let submission = build_submission(
        submission_request,
        &user.submitter(),
        state.clock.now(),
        &state.directory,
    );
    state.tracking.record_submission(&submission).await?;

    info!(
        document_id = %submission.document.id,
        submitted_by = %user.user_id,
        files = submission.document.files.len(),
        "document submitted"
    );
    Ok((StatusCode::CREATED, Json(submission)))
}

pub async fn list_documents(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<Vec<DocumentRecord>>> {
    Ok(Json(state.tracking.documents().await?))
}

pub async fn get_document(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<DocumentRecord>> {
    let document = state
        .tracking
        .document(&id)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(document))
}

pub async fn summarize_document(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<DocumentSummary>> {
    let document = state
        .tracking
        .document(&id)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(state.summarizer.summarize(&document).await))
}
