//! Temporary identities for items created before the server confirms them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

const TEMP_PREFIX: &str = "temp_";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A client-generated placeholder id.
///
/// Combines wall-clock millis, a process-wide sequence number and random
/// bits, so two generations in one process never collide. The model tracks
/// issued ids in a set; the prefix is for humans reading the data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TempId(String);

impl TempId {
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let random = Uuid::new_v4().simple().to_string();
        TempId(format!(
            "{}{}_{}_{}",
            TEMP_PREFIX,
            millis,
            sequence,
            &random[..8]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TempId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Links one payload item of a create call to the identity it was given locally.
#[derive(Debug, Clone)]
pub(crate) struct PendingCreate {
    /// Position of the payload item in the create call.
    pub index: usize,
    /// Set when the item had no identity and one was generated.
    pub temp_id: Option<TempId>,
    /// The identity the optimistic item carries (temporary or original).
    pub identity: String,
}

/// Side table built while applying a create optimistically and consumed once
/// the requests settle.
#[derive(Debug, Clone, Default)]
pub(crate) struct PendingCreates {
    entries: Vec<PendingCreate>,
}

impl PendingCreates {
    pub fn push_original(&mut self, index: usize, identity: String) {
        self.entries.push(PendingCreate {
            index,
            temp_id: None,
            identity,
        });
    }

    pub fn push_temporary(&mut self, index: usize, temp_id: TempId) {
        let identity = temp_id.as_str().to_string();
        self.entries.push(PendingCreate {
            index,
            temp_id: Some(temp_id),
            identity,
        });
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.entries.iter().any(|entry| entry.identity == identity)
    }

    pub fn temp_ids(&self) -> impl Iterator<Item = &TempId> {
        self.entries.iter().filter_map(|entry| entry.temp_id.as_ref())
    }

    /// Entry for the payload item at `index`.
    pub fn for_index(&self, index: usize) -> Option<&PendingCreate> {
        self.entries.iter().find(|entry| entry.index == index)
    }
}
