//! The remote sync protocol: connect/disconnect, repository selection,
//! import-on-select, and conflict-aware upload of the snapshot to the
//! fixed `Task_details.json` path.
//!
//! Every failure is converted to a user-facing message at this boundary
//! and recorded in `SyncStatus`; nothing from here ever corrupts the
//! task/project state or panics through the command layer. The store
//! mutex is never held across an await.

use crate::application::reducer::Action;
use crate::application::store::Store;
use crate::domain::models::{GitHubRepo, SyncStatusPatch};
use crate::infrastructure::error::GitHubApiError;
use crate::infrastructure::github_client::{GitHubClient, PutFile, PutOutcome};
use crate::infrastructure::snapshot_store::parse_import;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Well-known snapshot path inside the selected repository.
pub const REMOTE_SNAPSHOT_PATH: &str = "Task_details.json";

/// Anything shorter cannot be a GitHub personal access token.
const MIN_TOKEN_LENGTH: usize = 10;

const MSG_CONNECT_FIRST: &str = "Connect to GitHub and select a repository first.";
const MSG_SYNC_IN_PROGRESS: &str = "Sync already in progress.";
const MSG_TOKEN_TOO_SHORT: &str =
    "That token looks too short to be a GitHub personal access token.";
const MSG_INVALID_TOKEN: &str =
    "GitHub token is invalid or expired. Generate a new personal access token and reconnect.";
const MSG_RATE_LIMITED: &str =
    "GitHub denied the request (rate limit or missing repository permission). Wait before retrying.";
const MSG_CONFLICT: &str =
    "Sync conflict: the remote snapshot changed since the last sync. Local data is preserved.";

/// A sync failure; the message is already user-facing.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct SyncError {
    pub message: String,
}

impl SyncError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectSummary {
    pub username: String,
    pub repositories: Vec<GitHubRepo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    /// Version token of the newly written remote content.
    pub sha: String,
}

/// Result of an import-check. Failures are carried as data, not `Err`:
/// a broken remote snapshot must never unwind into the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportCheckOutcome {
    /// Remote data was found, validated and merged in.
    Imported,
    /// 404 on the snapshot path: normal for a fresh repository.
    NoRemoteData,
    /// No token in state; nothing was attempted.
    NotConnected,
    Failed(String),
}

fn api_error_message(context: &str, error: &GitHubApiError) -> String {
    match error {
        GitHubApiError::Unauthorized => MSG_INVALID_TOKEN.to_string(),
        GitHubApiError::Forbidden => MSG_RATE_LIMITED.to_string(),
        GitHubApiError::Conflict => MSG_CONFLICT.to_string(),
        GitHubApiError::Timeout => {
            format!("{context} timed out. Check your connection and try again.")
        }
        GitHubApiError::Status { status, .. } => {
            format!("{context} failed with GitHub API status {status}.")
        }
        GitHubApiError::Network(detail) => format!("{context} failed: {detail}"),
        GitHubApiError::Payload(detail) => {
            format!("{context} returned an unexpected payload: {detail}")
        }
    }
}

pub struct GitHubSyncService<C: GitHubClient> {
    client: Arc<C>,
    store: Arc<Mutex<Store>>,
}

impl<C: GitHubClient> GitHubSyncService<C> {
    pub fn new(client: Arc<C>, store: Arc<Mutex<Store>>) -> Self {
        Self { client, store }
    }

    /// Validates the token, resolves the user and their repositories,
    /// and commits the connection. The repository selection is always
    /// left empty; the user picks one explicitly afterwards.
    pub async fn connect(&self, token: &str) -> Result<ConnectSummary, SyncError> {
        let token = token.trim();
        if token.len() < MIN_TOKEN_LENGTH {
            return Err(SyncError::new(MSG_TOKEN_TOO_SHORT));
        }

        let user = self
            .client
            .current_user(token)
            .await
            .map_err(|error| SyncError::new(api_error_message("GitHub user lookup", &error)))?;
        let repositories = self
            .client
            .list_repositories(token)
            .await
            .map_err(|error| {
                SyncError::new(api_error_message("GitHub repository listing", &error))
            })?;

        let mut store = self.lock_store()?;
        store.dispatch(Action::SetGitHubConnection {
            token: token.to_string(),
            username: user.login.clone(),
            repositories: repositories.clone(),
        });
        Ok(ConnectSummary {
            username: user.login,
            repositories,
        })
    }

    pub fn disconnect(&self) -> Result<(), SyncError> {
        let mut store = self.lock_store()?;
        store.dispatch(Action::DisconnectGitHub);
        Ok(())
    }

    /// Records the selection, then immediately looks for existing remote
    /// data to pull in.
    pub async fn select_repository(
        &self,
        repo_full_name: &str,
    ) -> Result<ImportCheckOutcome, SyncError> {
        let token = {
            let mut store = self.lock_store()?;
            store.dispatch(Action::SelectGitHubRepo(repo_full_name.to_string()));
            store.state().github.token.clone()
        };
        let Some(token) = token else {
            return Ok(ImportCheckOutcome::NotConnected);
        };
        Ok(self.import_check(&token, repo_full_name).await)
    }

    /// Runs one import-check for a restored session that is already
    /// connected with a selected repository.
    pub async fn import_on_startup(&self) -> Result<Option<ImportCheckOutcome>, SyncError> {
        let credentials = {
            let store = self.lock_store()?;
            let github = &store.state().github;
            match (&github.token, &github.selected_repo) {
                (Some(token), Some(repo)) if github.is_connected => {
                    Some((token.clone(), repo.clone()))
                }
                _ => None,
            }
        };
        match credentials {
            Some((token, repo)) => Ok(Some(self.import_check(&token, &repo).await)),
            None => Ok(None),
        }
    }

    /// Fetches the remote snapshot and merges it in. 404 is success with
    /// no data and clears any stale error; every other failure lands in
    /// `SyncStatus.error` and the returned outcome, never in `Err`.
    pub async fn import_check(&self, token: &str, repo_full_name: &str) -> ImportCheckOutcome {
        match self
            .client
            .fetch_file(token, repo_full_name, REMOTE_SNAPSHOT_PATH)
            .await
        {
            Ok(None) => {
                if let Ok(mut store) = self.store.lock() {
                    store.dispatch(Action::SetSyncStatus(SyncStatusPatch::clear_error()));
                }
                ImportCheckOutcome::NoRemoteData
            }
            Ok(Some(file)) => match parse_import(&file.content) {
                Ok(payload) => {
                    if let Ok(mut store) = self.store.lock() {
                        store.dispatch(Action::ImportData {
                            tasks: payload.tasks,
                            projects: payload.projects,
                        });
                        store.dispatch(Action::SetSyncStatus(SyncStatusPatch::clear_error()));
                    }
                    ImportCheckOutcome::Imported
                }
                Err(error) => {
                    let message =
                        format!("Remote snapshot is not a valid TaskFlow export: {error}");
                    self.record_failure(&message, false);
                    ImportCheckOutcome::Failed(message)
                }
            },
            Err(error) => {
                let message = api_error_message("Remote snapshot check", &error);
                self.record_failure(&message, matches!(error, GitHubApiError::Unauthorized));
                ImportCheckOutcome::Failed(message)
            }
        }
    }

    /// Uploads the current state. Explicit commands surface the returned
    /// message to the user; the background scheduler discards it.
    ///
    /// Not connected / no repository: no network call, `SyncStatus`
    /// untouched. A second call while one is in flight is rejected via
    /// the loading flag (checked-and-set under one lock), not queued.
    pub async fn upload(&self) -> Result<UploadSummary, SyncError> {
        let (token, repo, payload, commit_message) = {
            let mut store = self.lock_store()?;
            let github = &store.state().github;
            if !github.is_connected {
                return Err(SyncError::new(MSG_CONNECT_FIRST));
            }
            let (Some(token), Some(repo)) = (github.token.clone(), github.selected_repo.clone())
            else {
                return Err(SyncError::new(MSG_CONNECT_FIRST));
            };
            if github.sync_status.is_loading {
                return Err(SyncError::new(MSG_SYNC_IN_PROGRESS));
            }

            // The credential never reaches the remote store.
            let mut snapshot = store.state().clone();
            snapshot.github.token = None;
            let payload = serde_json::to_string_pretty(&snapshot).map_err(|error| {
                SyncError::new(format!("Could not serialize state for sync: {error}"))
            })?;
            let commit_message = format!(
                "Update TaskFlow data - {}",
                store.now().format("%Y-%m-%d %H:%M:%S")
            );

            store.dispatch(Action::SetSyncStatus(SyncStatusPatch::loading()));
            (token, repo, payload, commit_message)
        };

        match self
            .perform_upload(&token, &repo, payload, commit_message)
            .await
        {
            Ok(sha) => {
                let mut store = self.lock_store()?;
                let now = store.now();
                store.dispatch(Action::SetSyncStatus(SyncStatusPatch::success(now)));
                Ok(UploadSummary { sha })
            }
            Err(error) => {
                let message = api_error_message("Sync to GitHub", &error);
                self.record_failure(&message, matches!(error, GitHubApiError::Unauthorized));
                Err(SyncError::new(message))
            }
        }
    }

    async fn perform_upload(
        &self,
        token: &str,
        repo: &str,
        payload: String,
        commit_message: String,
    ) -> Result<String, GitHubApiError> {
        // Read the current version token; absence (or a failed read) is
        // tolerated and the write proceeds without one.
        let sha = self
            .client
            .fetch_file(token, repo, REMOTE_SNAPSHOT_PATH)
            .await
            .ok()
            .flatten()
            .map(|file| file.sha);

        match self
            .client
            .put_file(
                token,
                repo,
                REMOTE_SNAPSHOT_PATH,
                PutFile {
                    message: commit_message,
                    content: payload,
                    sha,
                },
            )
            .await?
        {
            PutOutcome::Committed { sha } => Ok(sha),
            PutOutcome::Conflict => Err(GitHubApiError::Conflict),
        }
    }

    fn record_failure(&self, message: &str, reset_connection: bool) {
        let Ok(mut store) = self.store.lock() else {
            return;
        };
        if reset_connection {
            // No partial connected state survives an auth failure.
            store.dispatch(Action::DisconnectGitHub);
        }
        store.dispatch(Action::SetSyncStatus(SyncStatusPatch::failure(message)));
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, Store>, SyncError> {
        self.store
            .lock()
            .map_err(|error| SyncError::new(format!("state lock poisoned: {error}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::store::test_support::{fixed_time, FakeClock};
    use crate::application::store::{NewTask, Store};
    use crate::domain::models::{Priority, TaskStatus};
    use crate::infrastructure::github_client::{GitHubUser, RemoteFile};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct FakeGitHubClient {
        user_responses: Mutex<VecDeque<Result<GitHubUser, GitHubApiError>>>,
        repo_responses: Mutex<VecDeque<Result<Vec<GitHubRepo>, GitHubApiError>>>,
        fetch_responses: Mutex<VecDeque<Result<Option<RemoteFile>, GitHubApiError>>>,
        put_responses: Mutex<VecDeque<Result<PutOutcome, GitHubApiError>>>,
        user_calls: AtomicUsize,
        fetch_calls: AtomicUsize,
        put_calls: AtomicUsize,
        recorded_puts: Mutex<Vec<PutFile>>,
        put_gate: Option<Arc<Notify>>,
    }

    impl FakeGitHubClient {
        fn queue_user(&self, response: Result<GitHubUser, GitHubApiError>) {
            self.user_responses
                .lock()
                .expect("user queue lock poisoned")
                .push_back(response);
        }

        fn queue_repos(&self, response: Result<Vec<GitHubRepo>, GitHubApiError>) {
            self.repo_responses
                .lock()
                .expect("repo queue lock poisoned")
                .push_back(response);
        }

        fn queue_fetch(&self, response: Result<Option<RemoteFile>, GitHubApiError>) {
            self.fetch_responses
                .lock()
                .expect("fetch queue lock poisoned")
                .push_back(response);
        }

        fn queue_put(&self, response: Result<PutOutcome, GitHubApiError>) {
            self.put_responses
                .lock()
                .expect("put queue lock poisoned")
                .push_back(response);
        }

        fn recorded_puts(&self) -> Vec<PutFile> {
            self.recorded_puts
                .lock()
                .expect("recorded puts lock poisoned")
                .clone()
        }
    }

    #[async_trait::async_trait]
    impl GitHubClient for FakeGitHubClient {
        async fn current_user(&self, _access_token: &str) -> Result<GitHubUser, GitHubApiError> {
            self.user_calls.fetch_add(1, Ordering::SeqCst);
            self.user_responses
                .lock()
                .expect("user queue lock poisoned")
                .pop_front()
                .unwrap_or_else(|| {
                    Ok(GitHubUser {
                        login: "octocat".to_string(),
                    })
                })
        }

        async fn list_repositories(
            &self,
            _access_token: &str,
        ) -> Result<Vec<GitHubRepo>, GitHubApiError> {
            self.repo_responses
                .lock()
                .expect("repo queue lock poisoned")
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn fetch_file(
            &self,
            _access_token: &str,
            _repo_full_name: &str,
            _path: &str,
        ) -> Result<Option<RemoteFile>, GitHubApiError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            self.fetch_responses
                .lock()
                .expect("fetch queue lock poisoned")
                .pop_front()
                .unwrap_or(Ok(None))
        }

        async fn put_file(
            &self,
            _access_token: &str,
            _repo_full_name: &str,
            _path: &str,
            request: PutFile,
        ) -> Result<PutOutcome, GitHubApiError> {
            if let Some(gate) = &self.put_gate {
                gate.notified().await;
            }
            self.put_calls.fetch_add(1, Ordering::SeqCst);
            self.recorded_puts
                .lock()
                .expect("recorded puts lock poisoned")
                .push(request);
            self.put_responses
                .lock()
                .expect("put queue lock poisoned")
                .pop_front()
                .unwrap_or_else(|| {
                    Ok(PutOutcome::Committed {
                        sha: "sha-new".to_string(),
                    })
                })
        }
    }

    fn sample_repo() -> GitHubRepo {
        GitHubRepo {
            id: 1,
            name: "notes".to_string(),
            full_name: "octocat/notes".to_string(),
            private: true,
        }
    }

    fn service_with_store(
        client: FakeGitHubClient,
    ) -> (
        Arc<GitHubSyncService<FakeGitHubClient>>,
        Arc<Mutex<Store>>,
        FakeClock,
    ) {
        let clock = FakeClock::at(fixed_time("2026-08-01T08:00:00Z"));
        let store = Arc::new(Mutex::new(Store::bootstrapped(clock.provider())));
        let service = Arc::new(GitHubSyncService::new(Arc::new(client), Arc::clone(&store)));
        (service, store, clock)
    }

    fn seed_connected(store: &Arc<Mutex<Store>>) {
        let mut store = store.lock().expect("store lock");
        store.dispatch(Action::SetGitHubConnection {
            token: "ghp_0123456789abcdef".to_string(),
            username: "octocat".to_string(),
            repositories: vec![sample_repo()],
        });
        store.dispatch(Action::SelectGitHubRepo("octocat/notes".to_string()));
    }

    fn sync_status(store: &Arc<Mutex<Store>>) -> crate::domain::models::SyncStatus {
        store
            .lock()
            .expect("store lock")
            .state()
            .github
            .sync_status
            .clone()
    }

    #[tokio::test]
    async fn connect_stores_identity_without_selecting_repo() {
        let client = FakeGitHubClient::default();
        client.queue_repos(Ok(vec![sample_repo()]));
        let (service, store, _clock) = service_with_store(client);

        let summary = service
            .connect("ghp_0123456789abcdef")
            .await
            .expect("connect succeeds");
        assert_eq!(summary.username, "octocat");
        assert_eq!(summary.repositories.len(), 1);

        let store = store.lock().expect("store lock");
        let github = &store.state().github;
        assert!(github.is_connected);
        assert_eq!(github.username.as_deref(), Some("octocat"));
        assert_eq!(github.selected_repo, None);
        assert_eq!(github.token.as_deref(), Some("ghp_0123456789abcdef"));
    }

    #[tokio::test]
    async fn connect_rejects_short_token_without_network_calls() {
        let (service, store, _clock) = service_with_store(FakeGitHubClient::default());

        let error = service.connect("short").await.expect_err("too short");
        assert!(error.message.contains("too short"));
        assert_eq!(service.client.user_calls.load(Ordering::SeqCst), 0);
        assert!(!store.lock().expect("store lock").state().github.is_connected);
    }

    #[tokio::test]
    async fn connect_maps_each_failure_class_to_its_own_message() {
        let client = FakeGitHubClient::default();
        client.queue_user(Err(GitHubApiError::Unauthorized));
        client.queue_user(Err(GitHubApiError::Forbidden));
        client.queue_user(Err(GitHubApiError::Timeout));
        client.queue_user(Err(GitHubApiError::Status {
            status: 502,
            body: String::new(),
        }));
        let (service, store, _clock) = service_with_store(client);

        let unauthorized = service.connect("ghp_0123456789abcdef").await.expect_err("401");
        assert!(unauthorized.message.contains("invalid or expired"));

        let forbidden = service.connect("ghp_0123456789abcdef").await.expect_err("403");
        assert!(forbidden.message.contains("rate limit"));
        assert_ne!(forbidden.message, unauthorized.message);

        let timeout = service.connect("ghp_0123456789abcdef").await.expect_err("timeout");
        assert!(timeout.message.contains("Check your connection"));

        let generic = service.connect("ghp_0123456789abcdef").await.expect_err("502");
        assert!(generic.message.contains("502"));

        assert!(!store.lock().expect("store lock").state().github.is_connected);
    }

    #[tokio::test]
    async fn import_check_treats_missing_file_as_no_data_and_clears_error() {
        let (service, store, _clock) = service_with_store(FakeGitHubClient::default());
        seed_connected(&store);
        store
            .lock()
            .expect("store lock")
            .dispatch(Action::SetSyncStatus(SyncStatusPatch::failure("stale")));

        let before_tasks = store.lock().expect("store lock").state().tasks.clone();
        let outcome = service
            .import_check("ghp_0123456789abcdef", "octocat/notes")
            .await;

        assert_eq!(outcome, ImportCheckOutcome::NoRemoteData);
        assert_eq!(sync_status(&store).error, None);
        assert_eq!(store.lock().expect("store lock").state().tasks, before_tasks);
    }

    #[tokio::test]
    async fn import_check_applies_remote_export() {
        let remote_state = {
            let clock = FakeClock::at(fixed_time("2026-07-01T00:00:00Z"));
            let mut remote_store = Store::bootstrapped(clock.provider());
            remote_store.create_task(NewTask {
                title: "From remote".to_string(),
                description: String::new(),
                project_id: "miscellaneous".to_string(),
                priority: Priority::Low,
                due_date: None,
                estimated_time: 10,
                tags: Vec::new(),
            });
            remote_store.state().clone()
        };
        let client = FakeGitHubClient::default();
        client.queue_fetch(Ok(Some(RemoteFile {
            content: serde_json::to_string(&remote_state).expect("serialize remote"),
            sha: "sha-remote".to_string(),
        })));
        let (service, store, _clock) = service_with_store(client);
        seed_connected(&store);

        let outcome = service
            .import_check("ghp_0123456789abcdef", "octocat/notes")
            .await;
        assert_eq!(outcome, ImportCheckOutcome::Imported);

        let store = store.lock().expect("store lock");
        assert_eq!(store.state().tasks.len(), 1);
        assert_eq!(store.state().tasks[0].title, "From remote");
    }

    #[tokio::test]
    async fn import_check_failure_is_reported_not_thrown() {
        let client = FakeGitHubClient::default();
        client.queue_fetch(Err(GitHubApiError::Status {
            status: 500,
            body: String::new(),
        }));
        let (service, store, _clock) = service_with_store(client);
        seed_connected(&store);

        let outcome = service
            .import_check("ghp_0123456789abcdef", "octocat/notes")
            .await;
        let ImportCheckOutcome::Failed(message) = outcome else {
            panic!("expected failure outcome");
        };
        assert!(message.contains("500"));
        assert_eq!(sync_status(&store).error.as_deref(), Some(message.as_str()));
    }

    #[tokio::test]
    async fn select_repository_records_selection_then_import_checks() {
        let (service, store, _clock) = service_with_store(FakeGitHubClient::default());
        seed_connected(&store);

        let outcome = service
            .select_repository("octocat/notes")
            .await
            .expect("select succeeds");
        assert_eq!(outcome, ImportCheckOutcome::NoRemoteData);
        assert_eq!(
            store
                .lock()
                .expect("store lock")
                .state()
                .github
                .selected_repo
                .as_deref(),
            Some("octocat/notes")
        );
        assert_eq!(service.client.fetch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn upload_requires_connection_and_leaves_status_untouched() {
        let (service, store, _clock) = service_with_store(FakeGitHubClient::default());

        let error = service.upload().await.expect_err("not connected");
        assert_eq!(error.message, MSG_CONNECT_FIRST);
        assert_eq!(service.client.put_calls.load(Ordering::SeqCst), 0);
        assert_eq!(sync_status(&store), Default::default());
    }

    #[tokio::test]
    async fn upload_success_reads_sha_then_commits_and_records_last_sync() {
        let client = FakeGitHubClient::default();
        client.queue_fetch(Ok(Some(RemoteFile {
            content: "{}".to_string(),
            sha: "sha-old".to_string(),
        })));
        client.queue_put(Ok(PutOutcome::Committed {
            sha: "sha-new".to_string(),
        }));
        let (service, store, clock) = service_with_store(client);
        seed_connected(&store);

        let summary = service.upload().await.expect("upload succeeds");
        assert_eq!(summary.sha, "sha-new");

        let puts = service.client.recorded_puts();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].sha.as_deref(), Some("sha-old"));
        assert!(puts[0].message.starts_with("Update TaskFlow data - "));

        let status = sync_status(&store);
        assert!(!status.is_loading);
        assert_eq!(status.last_sync, Some(clock.now()));
        assert_eq!(status.error, None);
    }

    #[tokio::test]
    async fn upload_redacts_token_from_payload() {
        let (service, store, _clock) = service_with_store(FakeGitHubClient::default());
        seed_connected(&store);

        service.upload().await.expect("upload succeeds");

        let puts = service.client.recorded_puts();
        let payload: serde_json::Value =
            serde_json::from_str(&puts[0].content).expect("payload is JSON");
        assert_eq!(payload["github"]["token"], serde_json::Value::Null);
        // The token is still live in memory for subsequent calls.
        assert!(store
            .lock()
            .expect("store lock")
            .state()
            .github
            .token
            .is_some());
    }

    #[tokio::test]
    async fn upload_without_known_sha_proceeds_after_failed_read() {
        let client = FakeGitHubClient::default();
        client.queue_fetch(Err(GitHubApiError::Status {
            status: 500,
            body: String::new(),
        }));
        let (service, store, _clock) = service_with_store(client);
        seed_connected(&store);

        service.upload().await.expect("upload succeeds");
        let puts = service.client.recorded_puts();
        assert_eq!(puts[0].sha, None);
    }

    #[tokio::test]
    async fn upload_conflict_preserves_local_state_without_retry() {
        let client = FakeGitHubClient::default();
        client.queue_put(Ok(PutOutcome::Conflict));
        let (service, store, _clock) = service_with_store(client);
        seed_connected(&store);
        let before_tasks = store.lock().expect("store lock").state().tasks.clone();

        let error = service.upload().await.expect_err("conflict");
        assert!(error.message.contains("conflict"));

        let status = sync_status(&store);
        assert!(!status.is_loading);
        assert_eq!(status.last_sync, None);
        assert!(status.error.is_some());
        assert_eq!(store.lock().expect("store lock").state().tasks, before_tasks);
        assert_eq!(service.client.put_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn upload_unauthorized_resets_the_connection() {
        let client = FakeGitHubClient::default();
        client.queue_put(Err(GitHubApiError::Unauthorized));
        let (service, store, _clock) = service_with_store(client);
        seed_connected(&store);

        let error = service.upload().await.expect_err("401");
        assert!(error.message.contains("invalid or expired"));

        let store = store.lock().expect("store lock");
        assert!(!store.state().github.is_connected);
        assert_eq!(store.state().github.token, None);
        assert!(store.state().github.sync_status.error.is_some());
    }

    #[tokio::test]
    async fn upload_timeout_never_leaves_loading_stuck() {
        let client = FakeGitHubClient::default();
        client.queue_put(Err(GitHubApiError::Timeout));
        let (service, store, _clock) = service_with_store(client);
        seed_connected(&store);

        let error = service.upload().await.expect_err("timeout");
        assert!(error.message.contains("Check your connection"));

        let status = sync_status(&store);
        assert!(!status.is_loading);
        assert!(status.error.is_some());
    }

    #[tokio::test]
    async fn second_upload_while_first_in_flight_is_rejected() {
        let gate = Arc::new(Notify::new());
        let client = FakeGitHubClient {
            put_gate: Some(Arc::clone(&gate)),
            ..FakeGitHubClient::default()
        };
        let (service, store, _clock) = service_with_store(client);
        seed_connected(&store);

        let first = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.upload().await }
        });

        // Wait for the first upload to claim the loading flag.
        for _ in 0..100 {
            if sync_status(&store).is_loading {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert!(sync_status(&store).is_loading);

        let second = service.upload().await.expect_err("busy");
        assert_eq!(second.message, MSG_SYNC_IN_PROGRESS);

        gate.notify_one();
        first
            .await
            .expect("first upload task")
            .expect("first upload succeeds");
        assert_eq!(service.client.put_calls.load(Ordering::SeqCst), 1);
        assert!(!sync_status(&store).is_loading);
    }

    #[tokio::test]
    async fn import_check_rejects_malformed_remote_snapshot() {
        let client = FakeGitHubClient::default();
        client.queue_fetch(Ok(Some(RemoteFile {
            content: "{\"tasks\": 42}".to_string(),
            sha: "sha-bad".to_string(),
        })));
        let (service, store, _clock) = service_with_store(client);
        seed_connected(&store);
        let before_tasks = store.lock().expect("store lock").state().tasks.clone();

        let outcome = service
            .import_check("ghp_0123456789abcdef", "octocat/notes")
            .await;
        assert!(matches!(outcome, ImportCheckOutcome::Failed(_)));
        assert_eq!(store.lock().expect("store lock").state().tasks, before_tasks);
    }

    // Regression guard: make sure the timer state machine is untouched by
    // sync activity.
    #[tokio::test]
    async fn upload_does_not_disturb_timer_state() {
        let (service, store, _clock) = service_with_store(FakeGitHubClient::default());
        seed_connected(&store);
        let task_id = {
            let mut store = store.lock().expect("store lock");
            let task = store.create_task(NewTask {
                title: "Focus".to_string(),
                description: String::new(),
                project_id: "miscellaneous".to_string(),
                priority: Priority::High,
                due_date: None,
                estimated_time: 30,
                tags: Vec::new(),
            });
            store.start_timer(&task.id);
            task.id
        };

        service.upload().await.expect("upload succeeds");

        let store = store.lock().expect("store lock");
        assert!(store.state().timer.is_running);
        assert_eq!(store.state().timer.current_task_id.as_deref(), Some(task_id.as_str()));
        assert_eq!(
            crate::domain::task_tree::find_task_by_id(&store.state().tasks, &task_id)
                .expect("task exists")
                .status,
            TaskStatus::Active
        );
    }
}
