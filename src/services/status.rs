//! Service liveness reporting and restarts through the service manager.

use std::collections::BTreeMap;
use chrono::Local;
use tracing;

use crate::config::CommandConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{ServiceState, StatusSnapshot};
use crate::services::credential_store::CredentialStore;
use crate::services::invoker::CommandInvoker;

/// One monitored service: a logical name exposed to the dashboard and the
/// unit it maps to. Restartable is the allow-list for the restart endpoint.
struct ServiceDescriptor {
    name: &'static str,
    unit: &'static str,
    restartable: bool,
}

// Fixed, compiled-in table. Deliberately not configurable: the web surface
// must never gain control over arbitrary units.
const SERVICES: &[ServiceDescriptor] = &[
    ServiceDescriptor { name: "proxy", unit: "squid", restartable: true },
    ServiceDescriptor { name: "anonymity-network", unit: "tor@default", restartable: true },
    ServiceDescriptor { name: "intrusion-prevention", unit: "fail2ban", restartable: true },
    ServiceDescriptor { name: "firewall", unit: "ufw", restartable: false },
];

#[derive(Clone)]
pub struct StatusMonitor {
    invoker: CommandInvoker,
    systemctl_bin: String,
    store: CredentialStore,
}

impl StatusMonitor {
    pub fn new(command: &CommandConfig, store: CredentialStore) -> Self {
        Self {
            invoker: CommandInvoker::new(std::time::Duration::from_secs(command.timeout_secs)),
            systemctl_bin: command.systemctl_bin.clone(),
            store,
        }
    }

    /// Recompute the full snapshot. A service counts as active only when the
    /// query succeeds and reports the literal token; every failure mode
    /// (non-zero exit, timeout, missing tool) degrades to inactive rather
    /// than failing the dashboard.
    pub async fn get_status(&self) -> StatusSnapshot {
        let mut services: BTreeMap<String, ServiceState> = SERVICES
            .iter()
            .map(|s| (s.name.to_string(), ServiceState::Unknown))
            .collect();

        for service in SERVICES {
            let result = self
                .invoker
                .run(&self.systemctl_bin, &["is-active", service.unit])
                .await;
            let state = if result.success && result.stdout.contains("active") {
                ServiceState::Active
            } else {
                ServiceState::Inactive
            };
            services.insert(service.name.to_string(), state);
        }

        let user_count = match self.store.list_users().await {
            Ok(users) => users.len(),
            Err(e) => {
                tracing::warn!("User count unavailable for status snapshot: {}", e);
                0
            }
        };

        StatusSnapshot {
            services,
            user_count,
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Restart a service by its logical name. Only restartable table entries
    /// are accepted; anything else is rejected before the service manager is
    /// ever invoked.
    pub async fn restart_service(&self, name: &str) -> AppResult<String> {
        let service = SERVICES
            .iter()
            .find(|s| s.name == name && s.restartable)
            .ok_or_else(|| AppError::ServiceNotAllowed(name.to_string()))?;

        let result = self
            .invoker
            .run(&self.systemctl_bin, &["restart", service.unit])
            .await;
        if !result.success {
            if result.timed_out() {
                return Err(AppError::Timeout(self.invoker.timeout_secs()));
            }
            return Err(AppError::ToolFailure(result.stderr.trim().to_string()));
        }

        tracing::info!("Restarted {} ({})", service.name, service.unit);
        Ok(format!("Service {} restarted successfully", service.name))
    }
}
