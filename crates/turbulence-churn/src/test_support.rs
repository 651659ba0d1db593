use std::fs;
use std::path::Path;

use git2::{Repository, Signature, Time};
use tempfile::TempDir;

/// A scratch repository with one author and explicit commit times.
pub(crate) struct TestRepo {
    dir: TempDir,
    repo: Repository,
}

impl TestRepo {
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Self { dir, repo }
    }

    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn commit(&self, path: &str, content: &str, time: i64) {
        self.commit_bytes(path, content.as_bytes(), time);
    }

    pub(crate) fn commit_bytes(&self, path: &str, content: &[u8], time: i64) {
        let full = self.dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full, content).unwrap();

        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(path)).unwrap();
        index.write().unwrap();
        self.commit_index(&mut index, time);
    }

    pub(crate) fn remove(&self, path: &str, time: i64) {
        fs::remove_file(self.dir.path().join(path)).unwrap();

        let mut index = self.repo.index().unwrap();
        index.remove_path(Path::new(path)).unwrap();
        index.write().unwrap();
        self.commit_index(&mut index, time);
    }

    fn commit_index(&self, index: &mut git2::Index, time: i64) {
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let sig = Signature::new("alice", "alice@example.com", &Time::new(time, 0)).unwrap();

        let parent = self.repo.head().ok().map(|h| h.peel_to_commit().unwrap());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, "change", &tree, &parents)
            .unwrap();
    }
}
