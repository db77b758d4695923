//! Credential store backed by the proxy's flat password file.
//!
//! The file itself is owned by `htpasswd`; this module never writes it
//! directly, it only reads the `username:hash` lines and funnels every
//! mutation through the external tool. An unguarded read-check-invoke flow
//! has a check-then-act race between the duplicate check and the tool
//! invocation, so all mutations serialize behind a single async mutex and
//! concurrent requests for the same username resolve to exactly one winner.

use std::io::ErrorKind;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing;

use crate::config::{CommandConfig, ProxyConfig};
use crate::errors::{AppError, AppResult};
use crate::services::invoker::{CommandInvoker, CommandResult};

#[derive(Clone)]
pub struct CredentialStore {
    invoker: CommandInvoker,
    passwords_file: String,
    htpasswd_bin: String,
    systemctl_bin: String,
    reload_unit: String,
    write_lock: Arc<Mutex<()>>,
}

impl CredentialStore {
    pub fn new(proxy: &ProxyConfig, command: &CommandConfig) -> Self {
        Self {
            invoker: CommandInvoker::new(std::time::Duration::from_secs(command.timeout_secs)),
            passwords_file: proxy.passwords_file.clone(),
            htpasswd_bin: command.htpasswd_bin.clone(),
            systemctl_bin: command.systemctl_bin.clone(),
            reload_unit: proxy.reload_unit.clone(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Read the current usernames from the password file, ascending lexical
    /// order. A missing file is a fresh install and reads as an empty store;
    /// any other read failure is `StoreUnavailable`.
    pub async fn list_users(&self) -> AppResult<Vec<String>> {
        let contents = match tokio::fs::read_to_string(&self.passwords_file).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                tracing::error!("Failed to read {}: {}", self.passwords_file, e);
                return Err(AppError::StoreUnavailable(e.to_string()));
            }
        };

        let mut users: Vec<String> = contents
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                // Lines without a colon are not records
                line.split_once(':').map(|(username, _)| username.to_string())
            })
            .collect();
        users.sort();
        Ok(users)
    }

    pub async fn add_user(&self, username: &str, password: &str) -> AppResult<String> {
        if !valid_username(username) {
            return Err(AppError::InvalidUsername(username.to_string()));
        }

        let _guard = self.write_lock.lock().await;

        // Re-read under the lock so two concurrent adds cannot both pass
        let users = self.list_users().await?;
        if users.iter().any(|u| u == username) {
            return Err(AppError::DuplicateUser(username.to_string()));
        }

        let result = self
            .invoker
            .run(
                &self.htpasswd_bin,
                &["-b", &self.passwords_file, username, password],
            )
            .await;
        if !result.success {
            return Err(self.tool_error(result));
        }

        tracing::info!("Added proxy user '{}'", username);
        self.reload_proxy().await;
        Ok(format!("User '{}' added successfully", username))
    }

    pub async fn remove_user(&self, username: &str) -> AppResult<String> {
        let _guard = self.write_lock.lock().await;

        let users = self.list_users().await?;
        if !users.iter().any(|u| u == username) {
            return Err(AppError::UserNotFound(username.to_string()));
        }

        let result = self
            .invoker
            .run(&self.htpasswd_bin, &["-D", &self.passwords_file, username])
            .await;
        if !result.success {
            return Err(self.tool_error(result));
        }

        tracing::info!("Removed proxy user '{}'", username);
        self.reload_proxy().await;
        Ok(format!("User '{}' removed successfully", username))
    }

    pub async fn change_password(&self, username: &str, new_password: &str) -> AppResult<String> {
        let _guard = self.write_lock.lock().await;

        let users = self.list_users().await?;
        if !users.iter().any(|u| u == username) {
            return Err(AppError::UserNotFound(username.to_string()));
        }

        // htpasswd -b is add-or-update, so changing a password is the same
        // invocation as creating the user
        let result = self
            .invoker
            .run(
                &self.htpasswd_bin,
                &["-b", &self.passwords_file, username, new_password],
            )
            .await;
        if !result.success {
            return Err(self.tool_error(result));
        }

        tracing::info!("Changed password for proxy user '{}'", username);
        self.reload_proxy().await;
        Ok(format!("Password for '{}' changed successfully", username))
    }

    /// Best-effort reload of the consuming proxy so it picks up the new
    /// credentials. The credential change has already happened; a reload
    /// failure is logged and deliberately not surfaced to the caller.
    async fn reload_proxy(&self) {
        let result = self
            .invoker
            .run(&self.systemctl_bin, &["reload", &self.reload_unit])
            .await;
        if !result.success {
            tracing::warn!(
                "Reload of {} failed after credential change: {}",
                self.reload_unit,
                result.stderr.trim()
            );
        }
    }

    fn tool_error(&self, result: CommandResult) -> AppError {
        if result.timed_out() {
            AppError::Timeout(self.invoker.timeout_secs())
        } else {
            let detail = if result.stderr.trim().is_empty() {
                result.stdout.trim().to_string()
            } else {
                result.stderr.trim().to_string()
            };
            AppError::ToolFailure(detail)
        }
    }
}

/// Usernames are restricted to letters, digits, and underscores so they can
/// never carry htpasswd option syntax or record separators.
pub fn valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::TempDir;

    // Stub that emulates the htpasswd -b / -D contract against a plain file.
    const HTPASSWD_STUB: &str = r#"#!/bin/sh
if [ "$1" = "-D" ]; then
  file="$2"; user="$3"
  grep -v "^$user:" "$file" > "$file.tmp"
  mv "$file.tmp" "$file"
else
  file="$2"; user="$3"; pass="$4"
  touch "$file"
  grep -v "^$user:" "$file" > "$file.tmp"
  mv "$file.tmp" "$file"
  echo "$user:$pass" >> "$file"
fi
"#;

    fn write_stub(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path.to_str().unwrap().to_string()
    }

    fn make_store(htpasswd_bin: &str, passwords_file: &Path) -> CredentialStore {
        CredentialStore::new(
            &ProxyConfig {
                passwords_file: passwords_file.to_str().unwrap().to_string(),
                reload_unit: "squid".to_string(),
            },
            &CommandConfig {
                timeout_secs: 5,
                htpasswd_bin: htpasswd_bin.to_string(),
                // reload is best-effort; a no-op binary keeps it quiet
                systemctl_bin: "true".to_string(),
            },
        )
    }

    #[test]
    fn test_valid_username() {
        assert!(valid_username("alice"));
        assert!(valid_username("bob_2"));
        assert!(valid_username("X"));
        assert!(!valid_username(""));
        assert!(!valid_username("bad user"));
        assert!(!valid_username("semi;colon"));
        assert!(!valid_username("dash-ed"));
        assert!(!valid_username("колобок"));
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = make_store("true", &dir.path().join("passwords"));
        assert_eq!(store.list_users().await.unwrap(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_unreadable_path_is_store_unavailable() {
        let dir = TempDir::new().unwrap();
        // A directory opens but cannot be read as a file
        let store = make_store("true", dir.path());
        match store.list_users().await {
            Err(AppError::StoreUnavailable(_)) => {}
            other => panic!("expected StoreUnavailable, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_lines_without_colon_are_ignored() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("passwords");
        fs::write(&file, "alice:h1\ngarbage line\n\nbob:h2\n").unwrap();
        let store = make_store("true", &file);
        assert_eq!(store.list_users().await.unwrap(), vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_add_then_list_contains_user_once() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("passwords");
        let htpasswd = write_stub(dir.path(), "htpasswd", HTPASSWD_STUB);
        let store = make_store(&htpasswd, &file);

        let msg = store.add_user("dave", "p@ss").await.unwrap();
        assert!(msg.contains("dave"));
        let users = store.list_users().await.unwrap();
        assert_eq!(users.iter().filter(|u| *u == "dave").count(), 1);
    }

    #[tokio::test]
    async fn test_add_preserves_lexical_order() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("passwords");
        fs::write(&file, "alice:h1\n").unwrap();
        let htpasswd = write_stub(dir.path(), "htpasswd", HTPASSWD_STUB);
        let store = make_store(&htpasswd, &file);

        store.add_user("bob", "p@ss").await.unwrap();
        assert_eq!(store.list_users().await.unwrap(), vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_duplicate_add_fails_and_count_unchanged() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("passwords");
        fs::write(&file, "alice:h1\n").unwrap();
        let htpasswd = write_stub(dir.path(), "htpasswd", HTPASSWD_STUB);
        let store = make_store(&htpasswd, &file);

        match store.add_user("alice", "again").await {
            Err(AppError::DuplicateUser(name)) => assert_eq!(name, "alice"),
            other => panic!("expected DuplicateUser, got {:?}", other),
        }
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_username_rejected_without_invocation() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("passwords");
        let sentinel = dir.path().join("invoked");
        let stub = format!("#!/bin/sh\ntouch {}\n", sentinel.display());
        let htpasswd = write_stub(dir.path(), "htpasswd", &stub);
        let store = make_store(&htpasswd, &file);

        match store.add_user("rm -rf /", "pw").await {
            Err(AppError::InvalidUsername(_)) => {}
            other => panic!("expected InvalidUsername, got {:?}", other),
        }
        assert!(!sentinel.exists());
    }

    #[tokio::test]
    async fn test_remove_missing_user_performs_no_invocation() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("passwords");
        let sentinel = dir.path().join("invoked");
        let stub = format!("#!/bin/sh\ntouch {}\n", sentinel.display());
        let htpasswd = write_stub(dir.path(), "htpasswd", &stub);
        let store = make_store(&htpasswd, &file);

        match store.remove_user("carol").await {
            Err(AppError::UserNotFound(name)) => assert_eq!(name, "carol"),
            other => panic!("expected UserNotFound, got {:?}", other),
        }
        assert!(!sentinel.exists());
        assert_eq!(store.list_users().await.unwrap(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_remove_existing_user() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("passwords");
        fs::write(&file, "alice:h1\nbob:h2\n").unwrap();
        let htpasswd = write_stub(dir.path(), "htpasswd", HTPASSWD_STUB);
        let store = make_store(&htpasswd, &file);

        store.remove_user("alice").await.unwrap();
        assert_eq!(store.list_users().await.unwrap(), vec!["bob"]);
    }

    #[tokio::test]
    async fn test_change_password_requires_existing_user() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("passwords");
        let htpasswd = write_stub(dir.path(), "htpasswd", HTPASSWD_STUB);
        let store = make_store(&htpasswd, &file);

        match store.change_password("ghost", "newpw").await {
            Err(AppError::UserNotFound(_)) => {}
            other => panic!("expected UserNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_change_password_replaces_hash() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("passwords");
        fs::write(&file, "alice:oldhash\n").unwrap();
        let htpasswd = write_stub(dir.path(), "htpasswd", HTPASSWD_STUB);
        let store = make_store(&htpasswd, &file);

        store.change_password("alice", "newpw").await.unwrap();
        let contents = fs::read_to_string(&file).unwrap();
        assert!(contents.contains("alice:newpw"));
        assert!(!contents.contains("oldhash"));
        assert_eq!(store.list_users().await.unwrap(), vec!["alice"]);
    }

    #[tokio::test]
    async fn test_tool_failure_surfaces_stderr() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("passwords");
        let htpasswd = write_stub(dir.path(), "htpasswd", "#!/bin/sh\necho boom >&2\nexit 1\n");
        let store = make_store(&htpasswd, &file);

        match store.add_user("dave", "pw").await {
            Err(AppError::ToolFailure(stderr)) => assert!(stderr.contains("boom")),
            other => panic!("expected ToolFailure, got {:?}", other),
        }
        // The file was never touched, so the store is still empty
        assert_eq!(store.list_users().await.unwrap(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_concurrent_adds_for_same_name_yield_one_winner() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("passwords");
        let htpasswd = write_stub(dir.path(), "htpasswd", HTPASSWD_STUB);
        let store = make_store(&htpasswd, &file);

        let (a, b) = tokio::join!(store.add_user("dave", "p1"), store.add_user("dave", "p2"));
        let failures = [&a, &b]
            .iter()
            .filter(|r| matches!(r, Err(AppError::DuplicateUser(_))))
            .count();
        assert_eq!(failures, 1, "exactly one add must lose: {:?} / {:?}", a, b);
        assert_eq!(store.list_users().await.unwrap(), vec!["dave"]);
    }
}
