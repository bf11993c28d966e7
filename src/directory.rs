use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub department: Option<String>,
}

const DEFAULT_ROSTER: &[(&str, &str, &str, Option<&str>)] = &[
    ("principal-dr-robert-principal", "Dr. Robert Smith", "Principal", None),
    ("registrar-prof-sarah-registrar", "Prof. Sarah Johnson", "Registrar", None),
    ("dean-dr-maria-dean", "Dr. Maria Garcia", "Dean", None),
    (
        "controller-prof-david-controller",
        "Prof. David Brown",
        "Controller of Examinations",
        None,
    ),
    ("hod-cse", "Dr. Michael Chen", "HOD", Some("CSE")),
    ("hod-eee", "Dr. Emily Davis", "HOD", Some("EEE")),
    ("hod-ece", "Dr. James Wilson", "HOD", Some("ECE")),
    ("hod-mech", "Dr. Linda Martinez", "HOD", Some("MECH")),
    ("hod-csm", "Dr. Kevin Lee", "HOD", Some("CSM")),
    ("program-head-cse", "Prof. Anita Rao", "Program Department Head", Some("CSE")),
];

/// Resolves recipient ids to the people behind them.
#[derive(Debug, Clone, Default)]
pub struct RecipientDirectory {
    entries: HashMap<String, Recipient>,
}

impl RecipientDirectory {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn institutional_defaults() -> Self {
        let mut directory = Self::empty();
        for (id, name, role, department) in DEFAULT_ROSTER {
            directory.insert(Recipient {
                id: (*id).to_string(),
                name: (*name).to_string(),
                role: (*role).to_string(),
                department: department.map(str::to_string),
            });
        }
        directory
    }

    /// Defaults overlaid with the JSON array of recipients stored at `path`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut directory = Self::institutional_defaults();
        if let Some(path) = path {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read recipient directory {}", path.display()))?;
            let extra: Vec<Recipient> = serde_json::from_str(&raw)
                .with_context(|| format!("invalid recipient directory {}", path.display()))?;
            for recipient in extra {
                directory.insert(recipient);
            }
        }
        Ok(directory)
    }

    pub fn insert(&mut self, recipient: Recipient) {
        self.entries.insert(recipient.id.clone(), recipient);
    }

    pub fn get(&self, id: &str) -> Option<&Recipient> {
        self.entries.get(id)
    }

    /// Display name for `id`, or the id itself when unknown.
    pub fn display_name(&self, id: &str) -> String {
        self.get(id)
            .map(|recipient| recipient.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn display_names(&self, ids: &[String]) -> Vec<String> {
        ids.iter().map(|id| self.display_name(id)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
