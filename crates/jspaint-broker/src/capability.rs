use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Paths the UI process may read and write.
///
/// Grant-only: nothing is ever removed for the life of the process. Lookups
/// are exact; granting a directory does not grant its contents.
#[derive(Debug, Default)]
pub struct CapabilityStore {
    granted: RwLock<HashSet<PathBuf>>,
}

impl CapabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut granted = self.granted.write().unwrap_or_else(PoisonError::into_inner);
        if granted.insert(path.clone()) {
            tracing::debug!("Granted access to {}", path.display());
        }
    }

    pub fn grant_all<I, P>(&self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            self.grant(path);
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.granted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path)
    }

    pub fn len(&self) -> usize {
        self.granted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let store = CapabilityStore::new();
        assert!(store.is_empty());
        assert!(!store.contains(Path::new("/tmp/a.png")));
    }

    #[test]
    fn grants_are_exact() {
        let store = CapabilityStore::new();
        store.grant("/home/user/pics");
        assert!(store.contains(Path::new("/home/user/pics")));
        assert!(!store.contains(Path::new("/home/user/pics/a.png")));
        assert!(!store.contains(Path::new("/home/user")));
    }

    #[test]
    fn grants_are_monotonic() {
        let store = CapabilityStore::new();
        store.grant("/a.png");
        store.grant_all(["/b.png", "/c.png"]);
        store.grant("/a.png");
        assert_eq!(store.len(), 3);
        for p in ["/a.png", "/b.png", "/c.png"] {
            assert!(store.contains(Path::new(p)));
        }
    }

    #[test]
    fn concurrent_grants_are_all_recorded() {
        let store = std::sync::Arc::new(CapabilityStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        store.grant(format!("/t{i}/f{j}.png"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 400);
    }
}
