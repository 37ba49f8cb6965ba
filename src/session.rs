//! The reconciliation engine: committed state vs. working draft.
//!
//! A session holds two plans at once. `committed` is the last record the
//! store durably has; `draft` is what the user is editing. The draft is
//! created by copying committed, moves away from it one selection at a
//! time, and snaps back to it when a save lands or the user walks away
//! with nothing changed. There is no cross-session locking: concurrent
//! sessions race on last-write-wins, and each observes the other's
//! write on its next clean sync.

use jiff::{SignedDuration, Timestamp};

use crate::model::{LogEntry, SailPlan, Selection};
use crate::store::{CURRENT_LOOKBACK, DELETE_WINDOW, PlanStore, Result};
use crate::trim;

/// How long a committed read stays fresh before the store is asked again.
const COMMITTED_TTL: SignedDuration = SignedDuration::from_secs(30);

/// A value with a fetch time, stale after a TTL.
///
/// Invalidated by time comparison or explicitly after writes and
/// deletes, so the read that follows a mutation is always fresh.
#[derive(Debug)]
pub struct Cached<T> {
    slot: Option<(T, Timestamp)>,
    ttl: SignedDuration,
}

impl<T: Clone> Cached<T> {
    pub fn new(ttl: SignedDuration) -> Self {
        Self { slot: None, ttl }
    }

    /// The cached value, if fetched within the TTL of `now`.
    pub fn get(&self, now: Timestamp) -> Option<T> {
        let (value, fetched_at) = self.slot.as_ref()?;
        let age = now.duration_since(*fetched_at);
        if age >= SignedDuration::ZERO && age < self.ttl {
            Some(value.clone())
        } else {
            None
        }
    }

    pub fn put(&mut self, value: T, now: Timestamp) {
        self.slot = Some((value, now));
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }
}

/// One user's editing session against the store.
pub struct Session<S> {
    store: S,
    committed: SailPlan,
    draft: SailPlan,
    pending: bool,
    committed_cache: Cached<SailPlan>,
}

impl<S: PlanStore> Session<S> {
    /// Opens a session: fetches committed state and seats the draft.
    ///
    /// A saved draft (from a previous invocation) is adopted if it still
    /// differs from committed; a saved draft that matches committed is
    /// clean, and the session starts synced.
    pub fn open(store: S, saved_draft: Option<SailPlan>) -> Self {
        let mut session = Self {
            store,
            committed: SailPlan::default(),
            draft: SailPlan::default(),
            pending: false,
            committed_cache: Cached::new(COMMITTED_TTL),
        };
        session.refresh_committed();
        match saved_draft {
            Some(draft) => {
                session.draft = draft;
                session.pending = draft != session.committed;
            }
            None => session.draft = session.committed,
        }
        session.sync_if_clean();
        session
    }

    pub fn committed(&self) -> SailPlan {
        self.committed
    }

    pub fn draft(&self) -> SailPlan {
        self.draft
    }

    /// Whether the draft differs from committed state.
    pub fn pending(&self) -> bool {
        self.pending
    }

    /// Re-reads the most recent record from the store.
    ///
    /// Absence and store failure both degrade to the default plan — a
    /// boat with no recent log has everything down. Never touches the
    /// draft. Reads are cached for a short TTL so repeated calls within
    /// one interaction cycle hit the store once.
    pub fn refresh_committed(&mut self) -> SailPlan {
        let now = Timestamp::now();
        if let Some(plan) = self.committed_cache.get(now) {
            self.committed = plan;
            return plan;
        }
        let plan = self
            .store
            .latest(CURRENT_LOOKBACK)
            .ok()
            .flatten()
            .map(|entry| entry.plan)
            .unwrap_or_default();
        self.committed_cache.put(plan, now);
        self.committed = plan;
        plan
    }

    /// Copies committed into the draft when there are no unsaved edits.
    ///
    /// Called at the start of every interaction cycle so a concurrent
    /// session's write is picked up whenever this one has nothing local
    /// to lose. Idempotent.
    pub fn sync_if_clean(&mut self) {
        if !self.pending {
            self.draft = self.committed;
        }
    }

    /// Runs one selection through the trim rules against the draft.
    pub fn apply(&mut self, selection: Selection) {
        self.draft = trim::apply(&self.draft, selection);
        self.pending = self.draft != self.committed;
    }

    /// Drops the draft and resyncs from committed.
    pub fn discard_draft(&mut self) {
        self.pending = false;
        self.draft = self.committed;
    }

    /// Writes the draft as a new record and adopts it as committed.
    ///
    /// The timestamp defaults to now; a backdated instant is the
    /// caller's choice. On failure nothing in memory moves — the draft
    /// is preserved and the same commit can simply be retried.
    pub fn commit(&mut self, comment: &str, at: Option<Timestamp>) -> Result<LogEntry> {
        let at = at.unwrap_or_else(Timestamp::now);
        let entry = LogEntry::new(self.draft, comment, at);
        self.store.write(&entry)?;
        self.committed = entry.plan;
        self.draft = entry.plan;
        self.pending = false;
        self.committed_cache.invalidate();
        Ok(entry)
    }

    /// Deletes the persisted record(s) within half a second of `at`.
    ///
    /// The window accommodates a store without exact-key deletion and
    /// sub-second clock rounding; it is never wide enough to reach a
    /// record a full second away.
    pub fn discard_entry(&mut self, at: Timestamp) -> Result<()> {
        self.store.delete_range(at - DELETE_WINDOW, at + DELETE_WINDOW)?;
        self.committed_cache.invalidate();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::model::{Headsail, MainSail};
    use crate::store::StoreError;

    /// In-memory store double with call counting and failure injection.
    #[derive(Clone, Default)]
    struct FakeStore {
        entries: Rc<RefCell<Vec<LogEntry>>>,
        reads: Rc<Cell<usize>>,
        fail_writes: Rc<Cell<bool>>,
    }

    impl FakeStore {
        fn seed(&self, entry: LogEntry) {
            self.entries.borrow_mut().push(entry);
        }

        fn sorted_recent(&self) -> Vec<LogEntry> {
            let mut all = self.entries.borrow().clone();
            all.sort_by(|a, b| b.at.cmp(&a.at));
            all
        }
    }

    impl PlanStore for FakeStore {
        fn latest(&self, lookback: SignedDuration) -> Result<Option<LogEntry>> {
            Ok(self.recent(lookback, 1)?.into_iter().next())
        }

        fn recent(&self, lookback: SignedDuration, limit: usize) -> Result<Vec<LogEntry>> {
            self.reads.set(self.reads.get() + 1);
            let cutoff = Timestamp::now() - lookback;
            Ok(self
                .sorted_recent()
                .into_iter()
                .filter(|e| e.at >= cutoff)
                .take(limit)
                .collect())
        }

        fn write(&self, entry: &LogEntry) -> Result<()> {
            if self.fail_writes.get() {
                return Err(StoreError::Unavailable("injected".into()));
            }
            self.entries.borrow_mut().push(entry.clone());
            Ok(())
        }

        fn delete_range(&self, start: Timestamp, stop: Timestamp) -> Result<()> {
            self.entries
                .borrow_mut()
                .retain(|e| e.at < start || e.at >= stop);
            Ok(())
        }
    }

    fn reefed() -> SailPlan {
        SailPlan {
            main: MainSail::R2,
            headsail: Headsail::Storm,
            ..SailPlan::default()
        }
    }

    #[test]
    fn empty_store_committed_defaults_to_all_down() {
        let session = Session::open(FakeStore::default(), None);
        assert!(session.committed().is_all_down());
        assert!(session.draft().is_all_down());
        assert!(!session.pending());
    }

    #[test]
    fn committed_comes_from_latest_record() {
        let store = FakeStore::default();
        store.seed(LogEntry::new(reefed(), "", Timestamp::now()));
        let session = Session::open(store, None);
        assert_eq!(session.committed(), reefed());
        assert_eq!(session.draft(), reefed());
    }

    #[test]
    fn edit_marks_pending_and_commit_clears_it() {
        let store = FakeStore::default();
        let mut session = Session::open(store.clone(), None);

        session.apply(Selection::Main {
            state: MainSail::Full,
        });
        assert!(session.pending());

        session.commit("", None).unwrap();
        assert!(!session.pending());
        assert_eq!(session.committed(), session.draft());
        assert_eq!(store.sorted_recent().len(), 1);
    }

    #[test]
    fn edit_back_to_committed_is_clean() {
        let mut session = Session::open(FakeStore::default(), None);
        session.apply(Selection::Main {
            state: MainSail::Full,
        });
        session.apply(Selection::Main {
            state: MainSail::Down,
        });
        assert!(!session.pending());
    }

    #[test]
    fn commit_round_trips_through_the_store() {
        let store = FakeStore::default();
        let mut session = Session::open(store.clone(), None);
        session.apply(Selection::Main {
            state: MainSail::R2,
        });
        session.apply(Selection::Headsail {
            sail: Headsail::Storm,
        });
        let saved = session.commit("reefed for gust", None).unwrap();

        let fetched = store.latest(CURRENT_LOOKBACK).unwrap().unwrap();
        assert_eq!(fetched.plan, saved.plan);
        assert_eq!(fetched.comment, "reefed for gust");
        assert_eq!(fetched.at, saved.at);
    }

    #[test]
    fn failed_commit_preserves_the_draft() {
        let store = FakeStore::default();
        store.fail_writes.set(true);
        let mut session = Session::open(store.clone(), None);
        session.apply(Selection::Headsail {
            sail: Headsail::Jib,
        });
        let draft = session.draft();

        let err = session.commit("note", None).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(session.pending());
        assert_eq!(session.draft(), draft);
        assert!(store.sorted_recent().is_empty());

        // Retry is the same call again.
        store.fail_writes.set(false);
        session.commit("note", None).unwrap();
        assert!(!session.pending());
    }

    #[test]
    fn saved_draft_matching_committed_opens_clean() {
        let store = FakeStore::default();
        store.seed(LogEntry::new(reefed(), "", Timestamp::now()));
        let session = Session::open(store, Some(reefed()));
        assert!(!session.pending());
    }

    #[test]
    fn saved_draft_differing_from_committed_opens_pending() {
        let store = FakeStore::default();
        store.seed(LogEntry::new(reefed(), "", Timestamp::now()));
        let session = Session::open(store, Some(SailPlan::default()));
        assert!(session.pending());
        assert_eq!(session.draft(), SailPlan::default());
    }

    #[test]
    fn sync_if_clean_is_idempotent_and_cached() {
        let store = FakeStore::default();
        let mut session = Session::open(store.clone(), None);
        let reads_after_open = store.reads.get();

        session.refresh_committed();
        session.sync_if_clean();
        session.refresh_committed();
        session.sync_if_clean();

        assert_eq!(store.reads.get(), reads_after_open);
        assert!(session.draft().is_all_down());
    }

    #[test]
    fn sync_does_not_clobber_a_pending_draft() {
        let store = FakeStore::default();
        let mut session = Session::open(store.clone(), None);
        session.apply(Selection::Headsail {
            sail: Headsail::Jib,
        });

        // Another session writes meanwhile.
        store.seed(LogEntry::new(reefed(), "", Timestamp::now()));

        session.sync_if_clean();
        assert_eq!(session.draft().headsail, Headsail::Jib);
    }

    #[test]
    fn discard_draft_resyncs_from_committed() {
        let store = FakeStore::default();
        store.seed(LogEntry::new(reefed(), "", Timestamp::now()));
        let mut session = Session::open(store, None);
        session.apply(Selection::AllDown);
        assert!(session.pending());

        session.discard_draft();
        assert!(!session.pending());
        assert_eq!(session.draft(), reefed());
    }

    #[test]
    fn commit_invalidates_the_committed_cache() {
        let store = FakeStore::default();
        let mut session = Session::open(store.clone(), None);
        let reads_after_open = store.reads.get();

        session.apply(Selection::Main {
            state: MainSail::Full,
        });
        session.commit("", None).unwrap();

        session.refresh_committed();
        assert_eq!(store.reads.get(), reads_after_open + 1);
        assert_eq!(session.committed().main, MainSail::Full);
    }

    #[test]
    fn delete_window_takes_the_exact_record_and_spares_its_neighbor() {
        let store = FakeStore::default();
        let at = Timestamp::new(Timestamp::now().as_second(), 0).unwrap();
        store.seed(LogEntry::new(reefed(), "first", at));
        store.seed(LogEntry::new(SailPlan::default(), "second", at + SignedDuration::from_secs(1)));

        let mut session = Session::open(store.clone(), None);
        session.discard_entry(at).unwrap();

        let remaining = store.sorted_recent();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].comment, "second");
    }

    #[test]
    fn cached_value_expires_and_invalidates() {
        let mut cache = Cached::new(SignedDuration::from_secs(30));
        let t0 = Timestamp::UNIX_EPOCH;
        cache.put(7_u32, t0);

        assert_eq!(cache.get(t0 + SignedDuration::from_secs(29)), Some(7));
        assert_eq!(cache.get(t0 + SignedDuration::from_secs(30)), None);
        // A clock that moved backwards is stale, not fresh.
        assert_eq!(cache.get(t0 - SignedDuration::from_secs(1)), None);

        cache.put(7, t0);
        cache.invalidate();
        assert_eq!(cache.get(t0), None);
    }
}
