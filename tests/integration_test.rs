use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Helper to run git commands in a directory
fn git_command(dir: &Path, args: &[&str]) -> Output {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .expect("Failed to run git command");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn rev_parse(dir: &Path, rev: &str) -> String {
    let output = git_command(dir, &["rev-parse", rev]);
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Repository with branches main and dev, an annotated tag v1 and a lightweight tag v0
fn create_test_repo(dir: &Path) -> PathBuf {
    let repo_dir = dir.join("test-repo");
    fs::create_dir(&repo_dir).expect("Failed to create repo dir");

    git_command(&repo_dir, &["init"]);
    git_command(&repo_dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git_command(&repo_dir, &["config", "user.name", "Test User"]);
    git_command(&repo_dir, &["config", "user.email", "test@example.com"]);
    git_command(&repo_dir, &["config", "commit.gpgsign", "false"]);
    git_command(&repo_dir, &["config", "tag.gpgsign", "false"]);

    fs::write(repo_dir.join("file1.txt"), "content 1").unwrap();
    git_command(&repo_dir, &["add", "."]);
    git_command(&repo_dir, &["commit", "-m", "Initial commit"]);

    git_command(&repo_dir, &["branch", "dev"]);
    git_command(&repo_dir, &["tag", "v0"]);
    git_command(&repo_dir, &["tag", "-a", "v1", "-m", "Release v1"]);

    repo_dir
}

/// Run the binary with a config file that does not exist
fn ls_remote(temp: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_git-ls-remote"))
        .env("GIT_LS_REMOTE_CONFIG", temp.path().join("no-config.yaml"))
        .env_remove("GIT_LS_REMOTE_TIMEOUT")
        .env_remove("GIT_LS_REMOTE_UPLOAD_PACK")
        .arg("--upload-pack")
        .arg("git upload-pack")
        .args(args)
        .output()
        .expect("Failed to run git-ls-remote")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "git-ls-remote failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn test_lists_all_refs() {
    let temp = TempDir::new().unwrap();
    let repo = create_test_repo(temp.path());

    let commit = rev_parse(&repo, "HEAD");
    let tag = rev_parse(&repo, "v1");
    assert_ne!(commit, tag);

    let output = ls_remote(&temp, &[repo.to_str().unwrap()]);
    let expected = format!(
        "{c}\tHEAD\n\
         {c}\trefs/heads/dev\n\
         {c}\trefs/heads/main\n\
         {c}\trefs/tags/v0\n\
         {t}\trefs/tags/v1\n\
         {c}\trefs/tags/v1^{{}}\n",
        c = commit,
        t = tag
    );
    assert_eq!(stdout_of(&output), expected);
}

#[test]
fn test_filters_by_pattern() {
    let temp = TempDir::new().unwrap();
    let repo = create_test_repo(temp.path());
    let commit = rev_parse(&repo, "HEAD");

    let output = ls_remote(&temp, &[repo.to_str().unwrap(), "heads/*"]);
    assert_eq!(
        stdout_of(&output),
        format!("{c}\trefs/heads/dev\n{c}\trefs/heads/main\n", c = commit)
    );

    let output = ls_remote(&temp, &[repo.to_str().unwrap(), "v1", "main"]);
    assert_eq!(
        stdout_of(&output),
        format!(
            "{c}\trefs/heads/main\n{t}\trefs/tags/v1\n{c}\trefs/tags/v1^{{}}\n",
            c = commit,
            t = rev_parse(&repo, "v1")
        )
    );

    let output = ls_remote(&temp, &[repo.to_str().unwrap(), "ain"]);
    assert_eq!(stdout_of(&output), "");
}

#[test]
fn test_file_url_and_timeout() {
    let temp = TempDir::new().unwrap();
    let repo = create_test_repo(temp.path());
    let commit = rev_parse(&repo, "HEAD");

    let url = format!("file://{}", repo.display());
    let output = ls_remote(&temp, &["--timeout", "-1", url.as_str(), "HEAD"]);
    assert_eq!(stdout_of(&output), format!("{}\tHEAD\n", commit));

    let output = ls_remote(&temp, &["--timeout", "30", url.as_str(), "HEAD"]);
    assert_eq!(stdout_of(&output), format!("{}\tHEAD\n", commit));
}

#[test]
fn test_missing_repository_fails() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing");

    let output = ls_remote(&temp, &[missing.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}
