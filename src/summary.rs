use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::records::DocumentRecord;

const DESCRIPTION_EXCERPT_LIMIT: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarySource {
    Ai,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub document_id: String,
    pub summary: String,
    pub source: SummarySource,
}

/// Client for the generative text endpoint. Never fails: anything that goes
/// wrong yields the canned summary instead.
#[derive(Clone)]
pub struct DocumentSummarizer {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl DocumentSummarizer {
    pub fn new(
        api_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build summary client")?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key,
            model: model.into(),
        })
    }

    pub async fn summarize(&self, document: &DocumentRecord) -> DocumentSummary {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!(document_id = %document.id, "ai api key not configured; using fallback summary");
            return fallback_summary(document);
        };

        match self.request_summary(api_key, document).await {
            Ok(summary) => {
                info!(document_id = %document.id, model = %self.model, "document summarized");
                DocumentSummary {
                    document_id: document.id.clone(),
                    summary,
                    source: SummarySource::Ai,
                }
            }
            Err(err) => {
                warn!(document_id = %document.id, error = %err, "summary request failed; using fallback");
                fallback_summary(document)
            }
        }
    }

    async fn request_summary(&self, api_key: &str, document: &DocumentRecord) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        );
        let payload = json!({
            "contents": [{
                "parts": [{ "text": summary_prompt(document) }]
            }]
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&payload)
            .send()
            .await
            .context("summary request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("summary endpoint returned {status}: {body}");
        }

        let body: Value = response
            .json()
            .await
            .context("summary response was not JSON")?;
        extract_text(&body).context("summary response had no text candidate")
    }
}

fn summary_prompt(document: &DocumentRecord) -> String {
    format!(
        "Summarize the following institutional document in three to four sentences \
         for an approver.\nTitle: {}\nType: {}\nDescription: {}",
        document.title, document.document_type, document.description
    )
}

/// First non-empty text part of the first candidate.
pub fn extract_text(body: &Value) -> Option<String> {
    body.get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

pub fn fallback_summary(document: &DocumentRecord) -> DocumentSummary {
    let description = document.description.trim();
    let excerpt = if description.is_empty() {
        "No description was provided.".to_string()
    } else if description.chars().count() > DESCRIPTION_EXCERPT_LIMIT {
        let cut: String = description.chars().take(DESCRIPTION_EXCERPT_LIMIT).collect();
        format!("{cut}...")
    } else {
        description.to_string()
    };

    let summary = format!(
        "{} \"{}\" submitted by {} ({}) on {} with {}. {}",
        if document.document_type.is_empty() {
            "Document"
        } else {
            document.document_type.as_str()
        },
        document.title,
        document.submitted_by,
        document.submitted_by_department,
        document.submitted_date,
        document.priority.to_lowercase(),
        excerpt
    );

    DocumentSummary {
        document_id: document.id.clone(),
        summary,
        source: SummarySource::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::RecipientDirectory;
    use crate::submission::{build_submission, SubmissionRequest, Submitter};
    use crate::workflow::Priority;
    use chrono::{TimeZone, Utc};

    fn document(description: &str) -> DocumentRecord {
        build_submission(
            SubmissionRequest {
                title: "Lab Equipment Purchase".to_string(),
                description: description.to_string(),
                priority: Priority::Urgent,
                document_types: vec!["Proposal".to_string()],
                recipients: vec!["hod-cse".to_string()],
                files: Vec::new(),
                assignment: None,
            },
            &Submitter {
                id: "emp-3".to_string(),
                name: "Dr. Ada Lovelace".to_string(),
                department: "CSE".to_string(),
                role: "faculty".to_string(),
            },
            Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap(),
            &RecipientDirectory::institutional_defaults(),
        )
        .document
    }

    #[test]
    fn extracts_first_candidate_text() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "  " }, { "text": " Short summary. " }] }
            }]
        });
        assert_eq!(extract_text(&body).as_deref(), Some("Short summary."));
        assert_eq!(extract_text(&json!({ "candidates": [] })), None);
        assert_eq!(extract_text(&json!({ "error": { "code": 400 } })), None);
    }

    #[test]
    fn fallback_mentions_document_fields() {
        let summary = fallback_summary(&document("Two oscilloscopes for the signals lab"));
        assert_eq!(summary.source, SummarySource::Fallback);
        assert!(summary.summary.contains("Lab Equipment Purchase"));
        assert!(summary.summary.contains("Dr. Ada Lovelace"));
        assert!(summary.summary.contains("urgent priority"));
        assert!(summary.summary.contains("Two oscilloscopes"));
    }

    #[test]
    fn fallback_truncates_long_descriptions() {
        let summary = fallback_summary(&document(&"x".repeat(500)));
        assert!(summary.summary.ends_with("..."));
        assert!(!summary.summary.contains(&"x".repeat(201)));
    }

    #[tokio::test]
    async fn missing_key_uses_fallback() {
        let summarizer = DocumentSummarizer::new(
            "http://127.0.0.1:9",
            None,
            "gemini-1.5-flash",
            Duration::from_secs(1),
        )
        .unwrap();
        let summary = summarizer.summarize(&document("")).await;
        assert_eq!(summary.source, SummarySource::Fallback);
        assert!(summary.summary.contains("No description was provided."));
    }

    #[tokio::test]
    async fn unreachable_endpoint_uses_fallback() {
        let summarizer = DocumentSummarizer::new(
            "http://127.0.0.1:9",
            Some("test-key".to_string()),
            "gemini-1.5-flash",
            Duration::from_secs(1),
        )
        .unwrap();
        let summary = summarizer.summarize(&document("Quarterly report")).await;
        assert_eq!(summary.source, SummarySource::Fallback);
    }
}
