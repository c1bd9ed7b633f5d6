mod common;

use common::{org_with, Call, RecordingGit};
use gstore::{RemoteConfig, RemoteProtocol, SyncEngine, SyncOptions};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn options(jobs: usize) -> SyncOptions {
    SyncOptions {
        quiet: true,
        jobs: Some(jobs),
        ..Default::default()
    }
}

fn base(temp: &TempDir) -> String {
    temp.path().to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_first_run_clones_every_repository() {
    let temp = TempDir::new().unwrap();
    let (org, repos) = org_with("Acme", &["alpha", "beta"]);
    let git = Arc::new(RecordingGit::new());

    SyncEngine::from_shared(Arc::clone(&git))
        .sync(&org, &repos, &base(&temp), &options(2))
        .await
        .unwrap();

    assert!(temp.path().join("Acme/alpha/.git").is_dir());
    assert!(temp.path().join("Acme/beta/.git").is_dir());

    let mut urls = git.clone_urls();
    urls.sort();
    assert_eq!(
        urls,
        ["git@github.com:Acme/alpha.git", "git@github.com:Acme/beta.git"]
    );
}

#[tokio::test]
async fn test_second_run_only_updates() {
    let temp = TempDir::new().unwrap();
    let (org, repos) = org_with("Acme", &["alpha", "beta"]);
    let git = Arc::new(RecordingGit::new());
    let engine = SyncEngine::from_shared(Arc::clone(&git));

    engine.sync(&org, &repos, &base(&temp), &options(2)).await.unwrap();
    engine.sync(&org, &repos, &base(&temp), &options(2)).await.unwrap();

    assert_eq!(git.count(|c| matches!(c, Call::Clone { .. })), 2);
    assert_eq!(git.count(|c| matches!(c, Call::Fetch(_))), 2);
    assert_eq!(git.count(|c| matches!(c, Call::Pull(_))), 2);

    let alpha = temp.path().join("Acme").join("alpha");
    let alpha_calls: Vec<Call> = git
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Fetch(p) | Call::Pull(p) if *p == alpha))
        .collect();
    assert_eq!(alpha_calls, [Call::Fetch(alpha.clone()), Call::Pull(alpha)]);
}

#[tokio::test]
async fn test_https_remote() {
    let temp = TempDir::new().unwrap();
    let (org, repos) = org_with("Acme", &["alpha"]);
    let git = Arc::new(RecordingGit::new());

    let options = SyncOptions {
        remote: RemoteConfig {
            protocol: RemoteProtocol::Https,
            git_host: "git.example.com".to_string(),
        },
        ..options(1)
    };

    SyncEngine::from_shared(Arc::clone(&git))
        .sync(&org, &repos, &base(&temp), &options)
        .await
        .unwrap();

    assert_eq!(git.clone_urls(), ["https://git.example.com/Acme/alpha.git"]);
}

#[tokio::test]
async fn test_single_worker_keeps_input_order() {
    let temp = TempDir::new().unwrap();
    let (org, repos) = org_with("Acme", &["gamma", "alpha", "beta"]);
    let git = Arc::new(RecordingGit::new());

    SyncEngine::from_shared(Arc::clone(&git))
        .sync(&org, &repos, &base(&temp), &options(1))
        .await
        .unwrap();

    assert_eq!(
        git.clone_urls(),
        [
            "git@github.com:Acme/gamma.git",
            "git@github.com:Acme/alpha.git",
            "git@github.com:Acme/beta.git",
        ]
    );
}

#[tokio::test]
async fn test_regular_file_is_left_alone() {
    let temp = TempDir::new().unwrap();
    let (org, repos) = org_with("Acme", &["alpha", "beta"]);
    fs::create_dir_all(temp.path().join("Acme")).unwrap();
    fs::write(temp.path().join("Acme/beta"), "keep me").unwrap();
    let git = Arc::new(RecordingGit::new());

    SyncEngine::from_shared(Arc::clone(&git))
        .sync(&org, &repos, &base(&temp), &options(2))
        .await
        .unwrap();

    assert!(temp.path().join("Acme/alpha/.git").is_dir());
    assert_eq!(
        fs::read_to_string(temp.path().join("Acme/beta")).unwrap(),
        "keep me"
    );
    assert_eq!(git.clone_urls(), ["git@github.com:Acme/alpha.git"]);
}

#[tokio::test]
async fn test_garbage_directory_is_replaced_by_clone() {
    let temp = TempDir::new().unwrap();
    let (org, repos) = org_with("Acme", &["alpha"]);
    let leftover = temp.path().join("Acme/alpha/partial");
    fs::create_dir_all(&leftover).unwrap();
    let git = Arc::new(RecordingGit::new());

    SyncEngine::from_shared(Arc::clone(&git))
        .sync(&org, &repos, &base(&temp), &options(1))
        .await
        .unwrap();

    assert!(!leftover.exists());
    assert!(temp.path().join("Acme/alpha/.git").is_dir());
}

#[tokio::test]
async fn test_failed_clone_does_not_stop_the_run() {
    let temp = TempDir::new().unwrap();
    let (org, repos) = org_with("Acme", &["alpha", "beta", "gamma", "delta"]);
    let git = Arc::new(RecordingGit::failing_on(&["beta"]));

    SyncEngine::from_shared(Arc::clone(&git))
        .sync(&org, &repos, &base(&temp), &options(2))
        .await
        .unwrap();

    assert_eq!(git.count(|c| matches!(c, Call::Clone { .. })), 4);
    assert!(!temp.path().join("Acme/beta").exists());
    for name in ["alpha", "gamma", "delta"] {
        assert!(temp.path().join("Acme").join(name).join(".git").is_dir());
    }
}

#[tokio::test]
async fn test_trailing_separators_in_base_path() {
    let temp = TempDir::new().unwrap();
    let (org, repos) = org_with("Acme", &["alpha"]);
    let git = Arc::new(RecordingGit::new());
    let base_path = format!("{}/mirror//", base(&temp));

    SyncEngine::from_shared(Arc::clone(&git))
        .sync(&org, &repos, &base_path, &options(1))
        .await
        .unwrap();

    assert!(temp.path().join("mirror/Acme/alpha/.git").is_dir());
}

#[tokio::test]
async fn test_empty_repository_list_touches_nothing() {
    let temp = TempDir::new().unwrap();
    let (org, repos) = org_with("Acme", &[]);
    let git = Arc::new(RecordingGit::new());

    SyncEngine::from_shared(Arc::clone(&git))
        .sync(&org, &repos, &base(&temp), &options(4))
        .await
        .unwrap();

    assert!(git.calls().is_empty());
    assert!(!temp.path().join("Acme").exists());
}
