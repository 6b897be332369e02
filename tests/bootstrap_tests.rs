use fold_repo::config::{Config, REPO_TYPE_MEM};
use fold_repo::repo::{
    BootstrapOptions, BootstrapState, InitOutcome, RepositoryBootstrapper, StorageError,
    MARKER_FILE,
};
use fold_repo::RepoError;
use std::fs;
use tempfile::tempdir;

fn persistent(path: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.repo.path = Some(path.to_path_buf());
    config
}

#[test]
fn repository_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("repo");
    let config = persistent(&path);
    let init = BootstrapOptions { init_if_absent: true };

    let (peer_id, key) = {
        let mut bootstrapper = RepositoryBootstrapper::new();
        let repo = bootstrapper.bootstrap(&config, &init).unwrap();
        let key = repo.store().put(b"block").unwrap();
        (repo.profile().peer_id.clone(), key)
    };
    let marker = fs::read(path.join(MARKER_FILE)).unwrap();

    let mut bootstrapper = RepositoryBootstrapper::new();
    let repo = bootstrapper.bootstrap(&config, &init).unwrap();
    assert_eq!(repo.profile().peer_id, peer_id);
    assert_eq!(repo.store().get(&key).unwrap(), Some(b"block".to_vec()));
    assert_eq!(fs::read(path.join(MARKER_FILE)).unwrap(), marker);
}

#[test]
fn init_if_absent_is_idempotent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("repo");
    let store = Config::default().store;

    let mut first = RepositoryBootstrapper::new();
    assert_eq!(first.init_if_absent(&path, &store).unwrap(), InitOutcome::Initialized);
    let marker = fs::read(path.join(MARKER_FILE)).unwrap();

    for _ in 0..3 {
        let mut again = RepositoryBootstrapper::new();
        assert_eq!(again.init_if_absent(&path, &store).unwrap(), InitOutcome::AlreadyPresent);
    }
    assert_eq!(fs::read(path.join(MARKER_FILE)).unwrap(), marker);
}

#[test]
fn memory_mode_ignores_unusable_path() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("plain_file");
    fs::write(&file, b"x").unwrap();

    let mut config = persistent(&file.join("repo"));
    config.repo.kind = REPO_TYPE_MEM.into();

    let mut bootstrapper = RepositoryBootstrapper::new();
    let repo = bootstrapper
        .bootstrap(&config, &BootstrapOptions { init_if_absent: true })
        .unwrap();

    assert!(repo.backend().is_memory());
    assert_eq!(repo.profile().username, "mem user");
    assert_eq!(bootstrapper.state(), BootstrapState::Bound);
    assert_eq!(fs::read(&file).unwrap(), b"x");
}

#[test]
fn initialization_failure_is_fatal() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("plain_file");
    fs::write(&file, b"x").unwrap();

    let mut bootstrapper = RepositoryBootstrapper::new();
    let err = bootstrapper
        .bootstrap(&persistent(&file.join("repo")), &BootstrapOptions { init_if_absent: true })
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Storage(StorageError::MarkerUnreadable { .. })
            | RepoError::Storage(StorageError::Initialization { .. })
    ));
}
