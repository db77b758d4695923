use std::collections::BTreeMap;
use serde::Serialize;

/// Liveness classification for one monitored service. `Unknown` is the
/// placeholder before a query has run; a completed query always resolves to
/// `Active` or `Inactive`.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Active,
    Inactive,
    Unknown,
}

impl ServiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceState::Active => "active",
            ServiceState::Inactive => "inactive",
            ServiceState::Unknown => "unknown",
        }
    }
}

/// Point-in-time aggregate of service liveness and user count. Recomputed on
/// every request, never cached or persisted. The service map is flattened so
/// the JSON shape is `{"proxy": "active", ..., "user_count": 3, "timestamp": ...}`.
#[derive(Debug, Serialize, Clone)]
pub struct StatusSnapshot {
    #[serde(flatten)]
    pub services: BTreeMap<String, ServiceState>,
    pub user_count: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<String>,
}
