//! Debounced auto-save of the malla being edited.
//!
//! There is no timer thread: the caller passes the current [`Instant`] on
//! every change and on every poll, which keeps the whole thing
//! single-threaded and deterministic.

use std::time::{Duration, Instant};

use crate::config::EditorConfig;
use crate::document::{export_malla, import_malla};
use crate::error::{DocumentError, StoreError};
use crate::malla::Malla;
use crate::store::KeyValueStore;

#[derive(Clone, Debug, PartialEq)]
struct Pending<T> {
    due: Instant,
    payload: T,
}

/// At most one scheduled payload; scheduling again cancels the previous one.
#[derive(Clone, Debug, PartialEq)]
pub struct Debouncer<T> {
    pending: Option<Pending<T>>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Debouncer { pending: None }
    }
}

impl<T> Debouncer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` for `now + delay`. Returns whether a pending
    /// payload was cancelled.
    pub fn schedule(&mut self, now: Instant, delay: Duration, payload: T) -> bool {
        self.pending
            .replace(Pending {
                due: now + delay,
                payload,
            })
            .is_some()
    }

    pub fn cancel_pending(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.payload)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn due_at(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    /// Hand out the payload once its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        if self.pending.as_ref().is_some_and(|p| now >= p.due) {
            self.cancel_pending()
        } else {
            None
        }
    }
}

/// Writes the latest malla document to a single draft slot, coalescing
/// rapid edits into one write.
#[derive(Debug)]
pub struct AutoSaver<S> {
    store: S,
    key: String,
    delay: Duration,
    debouncer: Debouncer<String>,
}

impl<S: KeyValueStore> AutoSaver<S> {
    pub fn new(store: S, config: &EditorConfig) -> Self {
        AutoSaver {
            store,
            key: config.autosave_key.clone(),
            delay: config.autosave_delay(),
            debouncer: Debouncer::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Record a change; the draft is written `delay` after the last change.
    pub fn note_change(&mut self, now: Instant, malla: &Malla) {
        match export_malla(malla) {
            Ok(json) => {
                if self.debouncer.schedule(now, self.delay, json) {
                    log::debug!("auto-save rescheduled");
                }
            }
            Err(e) => log::warn!("auto-save skipped: {e}"),
        }
    }

    /// Write the draft if it is due. Best effort: failures are logged and
    /// dropped. Returns whether a draft was written.
    pub fn flush_due(&mut self, now: Instant) -> bool {
        let Some(json) = self.debouncer.take_due(now) else {
            return false;
        };
        match self.store.set(&self.key, json) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("auto-save failed: {e}");
                false
            }
        }
    }

    /// Write any pending draft immediately, reporting store failures.
    pub fn flush_now(&mut self) -> Result<bool, StoreError> {
        match self.debouncer.cancel_pending() {
            Some(json) => {
                self.store.set(&self.key, json)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The last written draft, if any.
    pub fn restore_draft(&self) -> Result<Option<Malla>, DocumentError> {
        let raw = match self.store.get(&self.key) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("cannot read draft: {e}");
                None
            }
        };
        raw.map(|json| import_malla(&json).map(|doc| doc.into_malla()))
            .transpose()
    }

    pub fn discard_draft(&mut self) -> Result<(), StoreError> {
        self.debouncer.cancel_pending();
        self.store.remove(&self.key)
    }
}
