//! Recently viewed reconciler.
//!
//! Two states: anonymous browsing keeps the list in client storage; once an
//! identity is known the local list is merged into the server list a single
//! time, local storage is cleared, and every later view writes through to
//! the server before re-reading the authoritative list.

mod local;

use std::sync::Arc;

use tokio::sync::Mutex;

use affinity_core::ApiError;
use affinity_core::domain::{RecentlyViewedEntry, Session, UserId};
use affinity_core::ports::{KeyValueStore, RecentlyViewedRemote, StorageError};

pub use local::{LocalRecentlyViewed, RECENTLY_VIEWED_KEY};

#[derive(Debug, thiserror::Error)]
pub enum RecentlyViewedError {
    #[error("Client storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Remote(#[from] ApiError),
}

/// What an identity change does to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to do.
    Stay,
    /// Merge the local list into this user's server list.
    Merge(UserId),
    /// Drop back to anonymous browsing.
    SignOut,
}

/// Transition function of the two-state machine.
pub fn transition(current: &Session, identity: Option<&UserId>) -> Transition {
    match (current, identity) {
        (Session::Anonymous, None) => Transition::Stay,
        (Session::Authenticated(_), None) => Transition::SignOut,
        (Session::Authenticated(user), Some(next)) if user == next => Transition::Stay,
        (_, Some(next)) => Transition::Merge(next.clone()),
    }
}

struct State {
    session: Session,
    entries: Vec<RecentlyViewedEntry>,
}

/// Recently viewed list for one browsing session.
///
/// Operations are serialized; a failed call leaves session and list as they were.
pub struct RecentlyViewed {
    local: LocalRecentlyViewed,
    remote: Arc<dyn RecentlyViewedRemote>,
    state: Mutex<State>,
}

impl RecentlyViewed {
    pub fn new(store: Arc<dyn KeyValueStore>, remote: Arc<dyn RecentlyViewedRemote>) -> Self {
        Self {
            local: LocalRecentlyViewed::new(store),
            remote,
            state: Mutex::new(State {
                session: Session::Anonymous,
                entries: Vec::new(),
            }),
        }
    }

    /// Read the anonymous list from client storage.
    pub async fn load(&self) -> Result<Vec<RecentlyViewedEntry>, RecentlyViewedError> {
        let mut state = self.state.lock().await;
        if !state.session.is_authenticated() {
            state.entries = self.local.load().await?;
        }
        Ok(state.entries.clone())
    }

    pub async fn session(&self) -> Session {
        self.state.lock().await.session.clone()
    }

    pub async fn entries(&self) -> Vec<RecentlyViewedEntry> {
        self.state.lock().await.entries.clone()
    }

    /// Record a view and return the current list.
    pub async fn add(
        &self,
        entry: RecentlyViewedEntry,
    ) -> Result<Vec<RecentlyViewedEntry>, RecentlyViewedError> {
        let mut state = self.state.lock().await;

        let entries = match &state.session {
            Session::Anonymous => self.local.add(entry).await?,
            Session::Authenticated(user) => {
                self.remote.add(user, &entry).await?;
                self.remote.fetch(user).await?
            }
        };

        state.entries = entries;
        Ok(state.entries.clone())
    }

    /// Apply an identity change (login, account switch, logout).
    pub async fn set_identity(
        &self,
        identity: Option<UserId>,
    ) -> Result<Vec<RecentlyViewedEntry>, RecentlyViewedError> {
        let mut state = self.state.lock().await;

        match transition(&state.session, identity.as_ref()) {
            Transition::Stay => {}
            Transition::Merge(user) => {
                let local = self.local.load().await?;
                let merged = self.remote.merge(&user, &local).await?;

                // The server owns these entries now.
                if let Err(e) = self.local.clear().await {
                    tracing::warn!(error = %e, "Failed to clear merged local list");
                }

                tracing::info!(
                    user = %user,
                    local = local.len(),
                    merged = merged.len(),
                    "Merged recently viewed list"
                );
                state.session = Session::Authenticated(user);
                state.entries = merged;
            }
            Transition::SignOut => {
                // Server entries are not copied back into client storage.
                state.session = Session::Anonymous;
                state.entries = self.local.load().await.unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Failed to read local list after sign out");
                    Vec::new()
                });
                tracing::info!("Recently viewed list back to anonymous mode");
            }
        }

        Ok(state.entries.clone())
    }

    pub async fn sign_in(
        &self,
        user: UserId,
    ) -> Result<Vec<RecentlyViewedEntry>, RecentlyViewedError> {
        self.set_identity(Some(user)).await
    }

    pub async fn sign_out(&self) -> Vec<RecentlyViewedEntry> {
        // Signing out performs no remote or fallible storage call.
        self.set_identity(None).await.unwrap_or_default()
    }

    /// Forget the local list. In authenticated mode the server list is kept.
    pub async fn clear(&self) -> Result<(), RecentlyViewedError> {
        let mut state = self.state.lock().await;
        self.local.clear().await?;
        if !state.session.is_authenticated() {
            state.entries.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use affinity_core::ErrorKind;
    use affinity_core::domain::{merge_lists, record_view};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    /// Server double applying the same list rules as the API.
    #[derive(Default)]
    struct FakeRemote {
        lists: std::sync::Mutex<HashMap<UserId, Vec<RecentlyViewedEntry>>>,
        merges: AtomicU32,
        adds: AtomicU32,
        offline: AtomicBool,
    }

    impl FakeRemote {
        fn with_list(user: &str, ids: &[&str]) -> Self {
            let remote = Self::default();
            remote.lists.lock().unwrap().insert(
                UserId::new(user),
                ids.iter().map(|id| RecentlyViewedEntry::new(*id)).collect(),
            );
            remote
        }

        fn check_online(&self) -> Result<(), ApiError> {
            if self.offline.load(Ordering::SeqCst) {
                Err(ApiError::new(ErrorKind::Network, "offline").with_status(0))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl RecentlyViewedRemote for FakeRemote {
        async fn fetch(&self, user: &UserId) -> Result<Vec<RecentlyViewedEntry>, ApiError> {
            self.check_online()?;
            Ok(self.lists.lock().unwrap().get(user).cloned().unwrap_or_default())
        }

        async fn add(&self, user: &UserId, entry: &RecentlyViewedEntry) -> Result<(), ApiError> {
            self.check_online()?;
            self.adds.fetch_add(1, Ordering::SeqCst);
            let mut lists = self.lists.lock().unwrap();
            record_view(lists.entry(user.clone()).or_default(), entry.clone());
            Ok(())
        }

        async fn merge(
            &self,
            user: &UserId,
            local: &[RecentlyViewedEntry],
        ) -> Result<Vec<RecentlyViewedEntry>, ApiError> {
            self.check_online()?;
            self.merges.fetch_add(1, Ordering::SeqCst);
            let mut lists = self.lists.lock().unwrap();
            let remote = lists.remove(user).unwrap_or_default();
            let merged = merge_lists(local.to_vec(), remote);
            lists.insert(user.clone(), merged.clone());
            Ok(merged)
        }
    }

    fn ids(list: &[RecentlyViewedEntry]) -> Vec<&str> {
        list.iter().map(|e| e.id.as_str()).collect()
    }

    fn setup(remote: FakeRemote) -> (Arc<MemoryStore>, Arc<FakeRemote>, RecentlyViewed) {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(remote);
        let rv = RecentlyViewed::new(store.clone(), remote.clone());
        (store, remote, rv)
    }

    #[test]
    fn test_transition_table() {
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");
        let signed_in = Session::Authenticated(alice.clone());

        assert_eq!(transition(&Session::Anonymous, None), Transition::Stay);
        assert_eq!(
            transition(&Session::Anonymous, Some(&alice)),
            Transition::Merge(alice.clone())
        );
        assert_eq!(transition(&signed_in, Some(&alice)), Transition::Stay);
        assert_eq!(transition(&signed_in, Some(&bob)), Transition::Merge(bob.clone()));
        assert_eq!(transition(&signed_in, None), Transition::SignOut);
    }

    #[tokio::test]
    async fn test_anonymous_adds_are_deduped_and_capped() {
        let (_, _, rv) = setup(FakeRemote::default());

        for n in 1..=10 {
            rv.add(RecentlyViewedEntry::new(n.to_string())).await.unwrap();
        }
        rv.add(RecentlyViewedEntry::new("11")).await.unwrap();
        let list = rv.add(RecentlyViewedEntry::new("2")).await.unwrap();

        assert_eq!(list.len(), 10);
        assert_eq!(list[0].id.as_str(), "aff2");
        assert_eq!(list.iter().filter(|e| e.id.as_str() == "aff2").count(), 1);
        assert!(!list.iter().any(|e| e.id.as_str() == "aff1"));
    }

    #[tokio::test]
    async fn test_anonymous_list_survives_reload() {
        let (store, remote, rv) = setup(FakeRemote::default());
        rv.add(RecentlyViewedEntry::new("1")).await.unwrap();
        rv.add(RecentlyViewedEntry::new("2")).await.unwrap();

        let reloaded = RecentlyViewed::new(store, remote);
        let list = reloaded.load().await.unwrap();
        assert_eq!(ids(&list), vec!["aff2", "aff1"]);
    }

    #[tokio::test]
    async fn test_corrupt_local_list_reads_empty() {
        let (store, _, rv) = setup(FakeRemote::default());
        store.set_item(RECENTLY_VIEWED_KEY, "not json").await.unwrap();

        assert!(rv.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_merges_and_consumes_local_list() {
        let (store, remote, rv) = setup(FakeRemote::with_list("u1", &["affB", "affC"]));
        rv.add(RecentlyViewedEntry::new("affB")).await.unwrap();
        rv.add(RecentlyViewedEntry::new("affA")).await.unwrap();

        let list = rv.sign_in(UserId::new("u1")).await.unwrap();

        assert_eq!(ids(&list), vec!["affA", "affB", "affC"]);
        assert_eq!(rv.session().await, Session::Authenticated(UserId::new("u1")));
        assert_eq!(store.get_item(RECENTLY_VIEWED_KEY).await.unwrap(), None);
        assert_eq!(remote.merges.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sign_in_twice_merges_once() {
        let (_, remote, rv) = setup(FakeRemote::default());
        rv.sign_in(UserId::new("u1")).await.unwrap();
        rv.sign_in(UserId::new("u1")).await.unwrap();
        assert_eq!(remote.merges.load(Ordering::SeqCst), 1);

        rv.sign_in(UserId::new("u2")).await.unwrap();
        assert_eq!(remote.merges.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_authenticated_add_writes_through() {
        let (store, remote, rv) = setup(FakeRemote::with_list("u1", &["affC"]));
        rv.sign_in(UserId::new("u1")).await.unwrap();

        let list = rv.add(RecentlyViewedEntry::new("7")).await.unwrap();

        assert_eq!(ids(&list), vec!["aff7", "affC"]);
        assert_eq!(remote.adds.load(Ordering::SeqCst), 1);
        assert_eq!(store.get_item(RECENTLY_VIEWED_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_remote_add_keeps_list() {
        let (_, remote, rv) = setup(FakeRemote::with_list("u1", &["affC"]));
        rv.sign_in(UserId::new("u1")).await.unwrap();
        remote.offline.store(true, Ordering::SeqCst);

        let err = rv.add(RecentlyViewedEntry::new("7")).await.unwrap_err();

        assert!(matches!(err, RecentlyViewedError::Remote(ref e) if e.kind == ErrorKind::Network));
        assert_eq!(ids(&rv.entries().await), vec!["affC"]);
    }

    #[tokio::test]
    async fn test_failed_merge_keeps_local_list_and_session() {
        let (store, remote, rv) = setup(FakeRemote::default());
        rv.add(RecentlyViewedEntry::new("A")).await.unwrap();
        remote.offline.store(true, Ordering::SeqCst);

        assert!(rv.sign_in(UserId::new("u1")).await.is_err());
        assert_eq!(rv.session().await, Session::Anonymous);
        assert!(store.get_item(RECENTLY_VIEWED_KEY).await.unwrap().is_some());

        remote.offline.store(false, Ordering::SeqCst);
        let list = rv.sign_in(UserId::new("u1")).await.unwrap();
        assert_eq!(ids(&list), vec!["affA"]);
    }

    #[tokio::test]
    async fn test_sign_out_returns_to_local_list() {
        let (_, _, rv) = setup(FakeRemote::with_list("u1", &["affC"]));
        rv.sign_in(UserId::new("u1")).await.unwrap();

        let list = rv.sign_out().await;
        assert!(list.is_empty());
        assert_eq!(rv.session().await, Session::Anonymous);

        let list = rv.add(RecentlyViewedEntry::new("9")).await.unwrap();
        assert_eq!(ids(&list), vec!["aff9"]);
    }

    #[tokio::test]
    async fn test_clear_only_touches_local_state_when_signed_in() {
        let (_, _, rv) = setup(FakeRemote::with_list("u1", &["affC"]));
        rv.add(RecentlyViewedEntry::new("1")).await.unwrap();
        rv.clear().await.unwrap();
        assert!(rv.entries().await.is_empty());

        rv.sign_in(UserId::new("u1")).await.unwrap();
        rv.clear().await.unwrap();
        assert_eq!(ids(&rv.entries().await), vec!["affC"]);
    }
}
