//! Session store: bounded conversation history per (customer, session).
//!
//! Data lives only for the lifetime of the process. The map itself sits
//! behind a short-lived `std::sync::RwLock`. Each session has two locks:
//! a `tokio::sync::Mutex<()>` gate held for a whole turn, and a
//! `std::sync::RwLock<History>` held only while copying or appending.
//! Reads never wait on a turn in flight, and different keys never wait on
//! each other.

use brewline_core::message::{History, Message, SessionKey};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

#[derive(Default)]
struct SessionSlot {
    gate: Arc<Mutex<()>>,
    history: RwLock<History>,
}

impl SessionSlot {
    fn snapshot(&self) -> History {
        self.history.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn push(&self, turn: Message, cap: usize) {
        self.history
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push_bounded(turn, cap);
    }
}

type Slot = Arc<SessionSlot>;

/// Concurrency-safe store of session histories.
pub struct SessionStore {
    cap: usize,
    sessions: RwLock<HashMap<SessionKey, Slot>>,
}

impl SessionStore {
    /// Create a store whose histories hold at most `cap` turns.
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Maximum number of turns kept per session.
    pub fn cap(&self) -> usize {
        self.cap
    }

    fn existing(&self, key: &SessionKey) -> Option<Slot> {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    /// Fetch the slot for `key`, inserting an empty history if absent.
    ///
    /// Insertion happens under the write lock, so two callers racing on a
    /// new key always end up sharing one history.
    fn slot(&self, key: &SessionKey) -> Slot {
        if let Some(slot) = self.existing(key) {
            return slot;
        }

        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions
            .entry(key.clone())
            .or_insert_with(|| {
                debug!(session = %key, "Creating session history");
                Arc::new(SessionSlot::default())
            })
            .clone()
    }

    /// Snapshot of the history for `key`, if the session exists.
    pub async fn get(&self, key: &SessionKey) -> Option<History> {
        self.existing(key).map(|slot| slot.snapshot())
    }

    /// Snapshot of the history for `key`, creating an empty one if needed.
    pub async fn get_or_create(&self, key: &SessionKey) -> History {
        self.slot(key).snapshot()
    }

    /// Append one turn, evicting the oldest turns beyond the cap.
    ///
    /// Waits for any turn in flight on the same key.
    pub async fn append(&self, key: &SessionKey, turn: Message) {
        let slot = self.slot(key);
        let _turn = slot.gate.lock().await;
        slot.push(turn, self.cap);
    }

    /// Take exclusive turn access to one session.
    ///
    /// Other turns for the same key wait until the guard is dropped. Reads
    /// through [`get`](Self::get) and [`list`](Self::list) do not.
    pub async fn lock(&self, key: &SessionKey) -> SessionGuard {
        let slot = self.slot(key);
        let gate = slot.gate.clone().lock_owned().await;
        SessionGuard {
            _gate: gate,
            slot,
            cap: self.cap,
        }
    }

    /// Remove the history for `key`. Returns whether one existed.
    pub fn clear(&self, key: &SessionKey) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key)
            .is_some();
        debug!(session = %key, removed, "Cleared session history");
        removed
    }

    /// Read-only snapshot of every session.
    pub async fn list(&self) -> BTreeMap<SessionKey, History> {
        let slots: Vec<(SessionKey, Slot)> = self
            .sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        slots
            .into_iter()
            .map(|(key, slot)| (key, slot.snapshot()))
            .collect()
    }

    /// Number of sessions currently held.
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive turn handle on one session.
pub struct SessionGuard {
    _gate: OwnedMutexGuard<()>,
    slot: Slot,
    cap: usize,
}

impl SessionGuard {
    /// Copy of the history as it stands now.
    pub fn history(&self) -> History {
        self.slot.snapshot()
    }

    /// Append a turn, keeping the history within the store's cap.
    pub fn append(&mut self, turn: Message) {
        self.slot.push(turn, self.cap);
    }
}
