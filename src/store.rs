//! In-process record store with change notification and a load-generation
//! guard so an older in-flight load can never clobber a newer one.

use log::debug;

use crate::record::TransitRecord;

/// Handle returned by [`RecordStore::subscribe`].
pub type SubscriptionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Replace,
    Append,
}

/// Summary delivered to listeners after a committed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChange {
    pub mode: ImportMode,
    pub added: usize,
    pub total: usize,
}

/// Token tying a prepared load to the store generation it started under.
/// A ticket issued before a newer `begin_load` no longer commits.
#[derive(Debug, Clone, Copy)]
pub struct LoadTicket {
    generation: u64,
    mode: ImportMode,
}

type Listener = Box<dyn FnMut(&StoreChange) + Send>;

#[derive(Default)]
pub struct RecordStore {
    records: Vec<TransitRecord>,
    generation: u64,
    next_subscription: SubscriptionId,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl RecordStore {
    pub fn new() -> RecordStore {
        RecordStore::default()
    }

    pub fn records(&self) -> &[TransitRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Registers a listener invoked after every committed load.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&StoreChange) + Send + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false when the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Starts a load and invalidates every ticket issued earlier.
    pub fn begin_load(&mut self, mode: ImportMode) -> LoadTicket {
        self.generation += 1;
        LoadTicket {
            generation: self.generation,
            mode,
        }
    }

    /// Commits a prepared load. A stale ticket is dropped without touching
    /// the store and the call reports false.
    pub fn commit(&mut self, ticket: LoadTicket, records: Vec<TransitRecord>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "dropping stale load (ticket generation {}, store at {})",
                ticket.generation, self.generation
            );
            return false;
        }
        let added = records.len();
        match ticket.mode {
            ImportMode::Replace => self.records = records,
            ImportMode::Append => self.records.extend(records),
        }
        let change = StoreChange {
            mode: ticket.mode,
            added,
            total: self.records.len(),
        };
        self.notify(&change);
        true
    }

    /// Replaces the whole record set in one step.
    pub fn replace(&mut self, records: Vec<TransitRecord>) {
        let ticket = self.begin_load(ImportMode::Replace);
        self.commit(ticket, records);
    }

    /// Appends records to the existing set in one step.
    pub fn append(&mut self, records: Vec<TransitRecord>) {
        let ticket = self.begin_load(ImportMode::Append);
        self.commit(ticket, records);
    }

    fn notify(&mut self, change: &StoreChange) {
        for (_, listener) in &mut self.listeners {
            listener(change);
        }
    }
}
