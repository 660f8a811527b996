use devbox_bootstrap::tools::{GitCloner, GitManager, RepositoryCloner};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Commit `files` to the repository at `path`, creating it if needed.
fn commit(path: &Path, files: &[(&str, &str)], message: &str) -> git2::Oid {
    let repo = match git2::Repository::open(path) {
        Ok(repo) => repo,
        Err(_) => git2::Repository::init(path).expect("Failed to init source repo"),
    };

    let mut index = repo.index().expect("Failed to get index");
    for (name, content) in files {
        fs::write(path.join(name), content).expect("Failed to write file");
        index.add_path(Path::new(name)).expect("Failed to add file");
    }
    index.write().expect("Failed to write index");
    let tree_id = index.write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_id).expect("Failed to find tree");
    let sig = git2::Signature::now("Test User", "test@example.com")
        .expect("Failed to create signature");

    let parents: Vec<git2::Commit> = repo
        .head()
        .ok()
        .and_then(|h| h.peel_to_commit().ok())
        .into_iter()
        .collect();
    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .expect("Failed to commit")
}

fn tag(path: &Path, name: &str, oid: git2::Oid) {
    let repo = git2::Repository::open(path).unwrap();
    let object = repo.find_object(oid, None).unwrap();
    repo.tag_lightweight(name, &object, false).unwrap();
}

#[test]
fn test_git_manager_clone_and_head() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let source_path = temp_dir.path().join("source");
    let clone_path = temp_dir.path().join("clone");
    fs::create_dir_all(&source_path).unwrap();

    let oid = commit(&source_path, &[("bosh.yml", "name: bosh\n")], "Initial commit");

    let url = source_path.to_str().unwrap();
    let manager = GitManager::clone(url, &clone_path).expect("Failed to clone repository");

    assert!(clone_path.join(".git").exists());
    assert!(clone_path.join("bosh.yml").exists());

    let head = manager.get_head_commit().expect("Failed to get HEAD commit");
    assert_eq!(head, oid.to_string());
    assert_eq!(manager.repo_path(), clone_path);
}

#[test]
fn test_git_manager_invalid_url() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let missing = temp_dir.path().join("no-such-repo");
    let clone_path = temp_dir.path().join("clone");

    let result = GitManager::clone(missing.to_str().unwrap(), &clone_path);
    assert!(result.is_err());
}

#[tokio::test]
async fn test_cloner_checks_out_tag() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let source_path = temp_dir.path().join("source");
    let clone_path = temp_dir.path().join("lib/bosh-deployment");
    fs::create_dir_all(&source_path).unwrap();

    let first = commit(&source_path, &[("bosh.yml", "version: 1\n")], "v1");
    tag(&source_path, "v1", first);
    commit(&source_path, &[("bosh.yml", "version: 2\n")], "v2");

    let head = GitCloner::new()
        .clone_repo(source_path.to_str().unwrap(), Some("v1"), &clone_path)
        .await
        .expect("clone with reference failed");
    assert_eq!(head, first.to_string());

    let content = fs::read_to_string(clone_path.join("bosh.yml")).unwrap();
    assert_eq!(content, "version: 1\n");

    let manager = GitManager::new(&clone_path).unwrap();
    assert_eq!(manager.get_head_commit().unwrap(), first.to_string());
}

#[tokio::test]
async fn test_cloner_without_reference_uses_default_head() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let source_path = temp_dir.path().join("source");
    let clone_path = temp_dir.path().join("clone");
    fs::create_dir_all(&source_path).unwrap();

    commit(&source_path, &[("bosh.yml", "version: 1\n")], "v1");
    let latest = commit(&source_path, &[("bosh.yml", "version: 2\n")], "v2");

    let head = GitCloner::new()
        .clone_repo(source_path.to_str().unwrap(), None, &clone_path)
        .await
        .unwrap();
    assert_eq!(head, latest.to_string());

    let manager = GitManager::new(&clone_path).unwrap();
    assert_eq!(manager.get_head_commit().unwrap(), latest.to_string());
}

#[tokio::test]
async fn test_cloner_unknown_reference_fails() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let source_path = temp_dir.path().join("source");
    fs::create_dir_all(&source_path).unwrap();
    commit(&source_path, &[("bosh.yml", "x\n")], "init");

    let result = GitCloner::new()
        .clone_repo(
            source_path.to_str().unwrap(),
            Some("no-such-ref"),
            &temp_dir.path().join("clone"),
        )
        .await;
    assert!(result.is_err());
}
