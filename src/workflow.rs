//! Approval workflow sequencing.
//!
//! A workflow always opens with a completed "Submission" step owned by the
//! submitter, followed by one step per recipient in the order they were
//! chosen. The first recipient step is the current one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::directory::RecipientDirectory;

pub const SUBMISSION_STEP: &str = "Submission";
pub const COMPLETE_STEP: &str = "Complete";

/// Recipient-id fragments and the step they produce, checked in order.
const STEP_NAMES: &[(&str, &str)] = &[
    ("hod", "HOD Review"),
    ("principal", "Principal Approval"),
    ("registrar", "Registrar Review"),
    ("dean", "Dean Review"),
    ("controller", "Controller Review"),
];
const FALLBACK_STEP_NAME: &str = "Department Review";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Normal,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub const fn display_label(self) -> &'static str {
        match self {
            Priority::Normal => "Normal Priority",
            Priority::Medium => "Medium Priority",
            Priority::High => "High Priority",
            Priority::Urgent => "Urgent Priority",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "normal" => Ok(Priority::Normal),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(format!(
                "priority must be one of normal, medium, high, urgent (got {other:?})"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Current,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub name: String,
    pub status: StepStatus,
    pub assignee: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub current_step: String,
    pub progress: u32,
    pub steps: Vec<WorkflowStep>,
    pub recipients: Vec<String>,
}

impl Workflow {
    pub fn new(steps: Vec<WorkflowStep>, recipients: Vec<String>) -> Self {
        let current_step = steps
            .iter()
            .find(|step| step.name != SUBMISSION_STEP)
            .map(|step| step.name.clone())
            .unwrap_or_else(|| COMPLETE_STEP.to_string());
        Self {
            current_step,
            progress: 0,
            steps,
            recipients,
        }
    }
}

/// Step name for a recipient id. Matching is a case-sensitive substring test
/// on the id, never on the display name.
pub fn step_name_for(recipient_id: &str) -> &'static str {
    STEP_NAMES
        .iter()
        .find(|(fragment, _)| recipient_id.contains(fragment))
        .map(|(_, name)| *name)
        .unwrap_or(FALLBACK_STEP_NAME)
}

/// Builds `recipients.len() + 1` steps. Recipient order is preserved and
/// repeated ids yield repeated steps.
pub fn build_workflow_steps(
    submitter: &str,
    submitted_date: &str,
    recipients: &[String],
    directory: &RecipientDirectory,
) -> Vec<WorkflowStep> {
    let mut steps = Vec::with_capacity(recipients.len() + 1);
    steps.push(WorkflowStep {
        name: SUBMISSION_STEP.to_string(),
        status: StepStatus::Completed,
        assignee: submitter.to_string(),
        recipient_id: None,
        completed_date: Some(submitted_date.to_string()),
    });

    for (index, recipient_id) in recipients.iter().enumerate() {
        steps.push(WorkflowStep {
            name: step_name_for(recipient_id).to_string(),
            status: if index == 0 {
                StepStatus::Current
            } else {
                StepStatus::Pending
            },
            assignee: directory.display_name(recipient_id),
            recipient_id: Some(recipient_id.clone()),
            completed_date: None,
        });
    }

    steps
}
