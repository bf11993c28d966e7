use serde::{Deserialize, Serialize};

use crate::store::{get_as, Collection, RecordStore, StoreResult};

/// Which approval routing configuration a user is looking at. Switching it
/// changes what is reported, never how documents are routed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    #[default]
    Normal,
    Bypass,
}

impl RoutingMode {
    pub fn description(self) -> &'static str {
        match self {
            RoutingMode::Normal => "Documents follow the full recipient chain in order",
            RoutingMode::Bypass => "Documents go straight to the selected final approver",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingSetting {
    pub user_id: String,
    pub mode: RoutingMode,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl RoutingSetting {
    pub fn new(user_id: &str, mode: RoutingMode, updated_at: Option<String>) -> Self {
        Self {
            user_id: user_id.to_string(),
            mode,
            description: mode.description().to_string(),
            updated_at,
        }
    }
}

pub async fn load_routing(store: &dyn RecordStore, user_id: &str) -> StoreResult<RoutingSetting> {
    let stored: Option<RoutingSetting> = get_as(store, Collection::RoutingModes, user_id).await?;
    Ok(stored.unwrap_or_else(|| RoutingSetting::new(user_id, RoutingMode::default(), None)))
}

pub async fn save_routing(store: &dyn RecordStore, setting: &RoutingSetting) -> StoreResult<()> {
    store
        .put(
            Collection::RoutingModes,
            &setting.user_id,
            serde_json::to_value(setting)?,
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn defaults_to_normal_and_persists_per_user() {
        let store = MemoryStore::new();
        assert_eq!(load_routing(&store, "emp-1").await.unwrap().mode, RoutingMode::Normal);

        save_routing(&store, &RoutingSetting::new("emp-1", RoutingMode::Bypass, None))
            .await
            .unwrap();

        assert_eq!(load_routing(&store, "emp-1").await.unwrap().mode, RoutingMode::Bypass);
        assert_eq!(load_routing(&store, "emp-2").await.unwrap().mode, RoutingMode::Normal);
    }
}
