//! Workspace lifecycle: isolated checkouts and their teardown.
//!
//! Workspaces live under a fixed root, one directory per
//! `<repoName>-<requestId>`, so concurrent requests with different ids
//! never collide. Expected failures (bad input, failed git commands)
//! come back as booleans for the pipeline to branch on.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::exec::CommandRunner;

/// Default root directory for workspaces.
pub const DEFAULT_WORKSPACE_ROOT: &str = "cloned_repo";

/// Default host repositories must be served from.
pub const DEFAULT_HOST: &str = "https://github.com";

const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Creates, refreshes, and reclaims repository workspaces.
pub struct WorkspaceManager {
    runner: Arc<dyn CommandRunner>,
    root: PathBuf,
    host: String,
    git_timeout: Duration,
}

impl WorkspaceManager {
    /// Create a manager with the default root, host, and git timeout.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        WorkspaceManager {
            runner,
            root: PathBuf::from(DEFAULT_WORKSPACE_ROOT),
            host: DEFAULT_HOST.to_string(),
            git_timeout: DEFAULT_GIT_TIMEOUT,
        }
    }

    /// Put workspaces under a different root directory.
    pub fn with_root(mut self, root: &Path) -> Self {
        self.root = root.to_path_buf();
        self
    }

    /// Accept repositories from a different host.
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    /// Change the per-command git timeout.
    pub fn with_git_timeout(mut self, timeout: Duration) -> Self {
        self.git_timeout = timeout;
        self
    }

    /// Derive the workspace name `<repoName>-<requestId>` from a
    /// repository URL. `None` if no repository name can be extracted.
    pub fn workspace_name(&self, url: &str, request_id: &str) -> Option<String> {
        let last = url.rsplit('/').next()?;
        let repo = last.split('.').next().unwrap_or(last);
        if repo.is_empty() {
            return None;
        }
        Some(format!("{repo}-{request_id}"))
    }

    /// On-disk path of a named workspace.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Create an isolated, up-to-date checkout of `branch`.
    ///
    /// Rejects URLs not on the expected host without spawning any
    /// process. After the single-branch clone, forces the checkout to
    /// the tip of the remote branch (fetch all refs, hard-reset to
    /// `origin/<branch>`, pull) in case the clone raced with new
    /// pushes. Returns `false` on any invalid input or failed command.
    pub async fn clone_repo(&self, url: &str, request_id: &str, branch: &str) -> bool {
        if !url.contains(&self.host) {
            warn!(url, host = %self.host, "rejecting clone: url is not on the expected host");
            return false;
        }

        let Some(name) = self.workspace_name(url, request_id) else {
            warn!(url, "rejecting clone: cannot derive repository name");
            return false;
        };
        let path = self.path(&name);
        let path_str = path.to_string_lossy().to_string();

        if !self
            .git(
                &["clone", "--branch", branch, "--single-branch", url, &path_str],
                None,
            )
            .await
        {
            return false;
        }

        let populated = std::fs::read_dir(&path)
            .map(|mut dir| dir.next().is_some())
            .unwrap_or(false);
        if !populated {
            warn!(workspace = %name, "cloning produced an empty directory");
            return false;
        }

        let origin_branch = format!("origin/{branch}");
        let refresh: [&[&str]; 3] = [
            &["fetch", "--all"],
            &["reset", "--hard", &origin_branch],
            &["pull"],
        ];
        for args in refresh {
            if !self.git(args, Some(&path)).await {
                return false;
            }
        }

        info!(workspace = %name, branch, "workspace cloned and updated");
        true
    }

    /// Capture the commit the workspace is checked out at.
    pub async fn head_sha(&self, name: &str) -> Option<String> {
        let path = self.path(name);
        match self
            .runner
            .run("git", &["rev-parse", "HEAD"], Some(&path), self.git_timeout)
            .await
        {
            Ok(out) if out.success() => {
                let sha = out.stdout.trim().to_string();
                if sha.is_empty() {
                    warn!(workspace = name, "git rev-parse HEAD returned empty output");
                    None
                } else {
                    Some(sha)
                }
            }
            Ok(out) => {
                warn!(workspace = name, stderr = %out.stderr, "git rev-parse HEAD failed");
                None
            }
            Err(e) => {
                warn!(workspace = name, error = %e, "failed to run git rev-parse");
                None
            }
        }
    }

    /// Best-effort, idempotent teardown of a workspace.
    ///
    /// A nonexistent path is a no-op outcome (`false`), not a fault.
    /// Otherwise every file and directory underneath is granted full
    /// owner access first, so trees left read-only by tooling still
    /// come off, then the tree is removed. `true` only on confirmed
    /// removal.
    pub fn delete(&self, name: &str) -> bool {
        let path = self.path(name);
        if !path.exists() {
            warn!(workspace = name, "workspace does not exist");
            return false;
        }

        if let Err(e) = grant_owner_access(&path) {
            warn!(workspace = name, error = %e, "failed to normalize workspace permissions");
            return false;
        }

        match std::fs::remove_dir_all(&path) {
            Ok(()) => {
                info!(workspace = name, "workspace removed");
                true
            }
            Err(e) => {
                warn!(workspace = name, error = %e, "failed to remove workspace");
                false
            }
        }
    }

    async fn git(&self, args: &[&str], cwd: Option<&Path>) -> bool {
        match self.runner.run("git", args, cwd, self.git_timeout).await {
            Ok(out) if out.success() => true,
            Ok(out) => {
                warn!(?args, exit_code = out.exit_code, stderr = %out.stderr, "git command failed");
                false
            }
            Err(e) => {
                warn!(?args, error = %e, "failed to run git");
                false
            }
        }
    }
}

/// Recursively grant full owner access to a path and everything under
/// it. Directories are opened up before recursing so unreadable trees
/// can still be traversed.
fn grant_owner_access(path: &Path) -> std::io::Result<()> {
    let metadata = path.symlink_metadata()?;
    let mut permissions = metadata.permissions();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(0o700);
    }
    #[cfg(not(unix))]
    {
        permissions.set_readonly(false);
    }
    std::fs::set_permissions(path, permissions)?;

    if metadata.is_dir() {
        for entry in std::fs::read_dir(path)? {
            grant_owner_access(&entry?.path())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedRunner;

    fn manager_with(runner: Arc<ScriptedRunner>, root: &Path) -> WorkspaceManager {
        WorkspaceManager::new(runner).with_root(root)
    }

    #[test]
    fn workspace_name_strips_git_suffix() {
        let runner = Arc::new(ScriptedRunner::new());
        let manager = WorkspaceManager::new(runner);
        assert_eq!(
            manager.workspace_name("https://github.com/octo/widget.git", "42"),
            Some("widget-42".to_string())
        );
        assert_eq!(
            manager.workspace_name("https://github.com/octo/widget", "req-7"),
            Some("widget-req-7".to_string())
        );
    }

    #[test]
    fn workspace_name_rejects_empty_repo() {
        let runner = Arc::new(ScriptedRunner::new());
        let manager = WorkspaceManager::new(runner);
        assert_eq!(manager.workspace_name("https://github.com/octo/", "42"), None);
    }

    #[tokio::test]
    async fn clone_rejects_foreign_host_without_spawning() {
        let runner = Arc::new(ScriptedRunner::new());
        let root = tempfile::tempdir().unwrap();
        let manager = manager_with(runner.clone(), root.path());

        let cloned = manager
            .clone_repo("https://gitlab.com/octo/widget.git", "1", "main")
            .await;

        assert!(!cloned);
        assert_eq!(runner.invocation_count(), 0, "no process may be spawned");
    }

    #[tokio::test]
    async fn clone_runs_single_branch_clone_then_refresh() {
        let runner = Arc::new(ScriptedRunner::new().materializing_clone_targets());
        let root = tempfile::tempdir().unwrap();
        let manager = manager_with(runner.clone(), root.path());

        let cloned = manager
            .clone_repo("https://github.com/octo/widget.git", "1", "main")
            .await;
        assert!(cloned);

        let invocations = runner.invocations();
        assert_eq!(invocations.len(), 4);
        assert_eq!(invocations[0].args[0], "clone");
        assert!(invocations[0].args.contains(&"--single-branch".to_string()));
        assert_eq!(invocations[1].args, vec!["fetch", "--all"]);
        assert_eq!(invocations[2].args, vec!["reset", "--hard", "origin/main"]);
        assert_eq!(invocations[3].args, vec!["pull"]);

        // Refresh commands run inside the workspace
        let expected_cwd = root.path().join("widget-1");
        assert_eq!(invocations[1].cwd.as_deref(), Some(expected_cwd.as_path()));
    }

    #[tokio::test]
    async fn clone_fails_when_git_fails() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_response(crate::fakes::CannedOutput::exits_with(128));
        let root = tempfile::tempdir().unwrap();
        let manager = manager_with(runner.clone(), root.path());

        let cloned = manager
            .clone_repo("https://github.com/octo/widget.git", "1", "main")
            .await;
        assert!(!cloned);
        assert_eq!(runner.invocation_count(), 1, "refresh must not run");
    }

    #[tokio::test]
    async fn clone_fails_on_empty_checkout() {
        // Without materialization the target directory never appears.
        let runner = Arc::new(ScriptedRunner::new());
        let root = tempfile::tempdir().unwrap();
        let manager = manager_with(runner.clone(), root.path());

        let cloned = manager
            .clone_repo("https://github.com/octo/widget.git", "1", "main")
            .await;
        assert!(!cloned);
    }

    #[tokio::test]
    async fn head_sha_trims_output() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_response(crate::fakes::CannedOutput::ok_with_stdout("abc123\n"));
        let root = tempfile::tempdir().unwrap();
        let manager = manager_with(runner.clone(), root.path());

        assert_eq!(manager.head_sha("widget-1").await, Some("abc123".to_string()));
    }

    #[test]
    fn delete_of_missing_workspace_is_false_not_a_fault() {
        let runner = Arc::new(ScriptedRunner::new());
        let root = tempfile::tempdir().unwrap();
        let manager = manager_with(runner, root.path());

        assert!(!manager.delete("never-created-9"));
    }

    #[test]
    fn delete_removes_workspace_tree() {
        let runner = Arc::new(ScriptedRunner::new());
        let root = tempfile::tempdir().unwrap();
        let manager = manager_with(runner, root.path());

        let ws = root.path().join("widget-1");
        std::fs::create_dir_all(ws.join("sub")).unwrap();
        std::fs::write(ws.join("sub").join("file.txt"), "x").unwrap();

        assert!(manager.delete("widget-1"));
        assert!(!ws.exists());
    }

    #[cfg(unix)]
    #[test]
    fn delete_handles_read_only_files() {
        use std::os::unix::fs::PermissionsExt;

        let runner = Arc::new(ScriptedRunner::new());
        let root = tempfile::tempdir().unwrap();
        let manager = manager_with(runner, root.path());

        let ws = root.path().join("widget-1");
        let sub = ws.join("locked");
        std::fs::create_dir_all(&sub).unwrap();
        let file = sub.join("readonly.txt");
        std::fs::write(&file, "x").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o400)).unwrap();
        std::fs::set_permissions(&sub, std::fs::Permissions::from_mode(0o500)).unwrap();

        assert!(manager.delete("widget-1"));
        assert!(!ws.exists());
    }
}
