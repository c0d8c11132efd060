//! Background re-parsing for large streamed documents.
//!
//! Every request takes a new version number. A finished parse is published
//! only while its version is still the latest requested one, so a slow
//! parse of older text never overwrites a newer result.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::models::Document;
use crate::parsing::ParseOptions;

/// Input size in bytes from which parsing moves to a worker thread.
pub const DEFAULT_ASYNC_THRESHOLD: usize = 16 * 1024;

/// A parsed document together with the request version that produced it.
#[derive(Debug, Clone)]
pub struct Published {
    pub version: u64,
    pub document: Document,
}

/// Handle for one update request.
#[derive(Debug)]
pub struct UpdateTicket {
    pub version: u64,
    handle: Option<JoinHandle<bool>>,
}

impl UpdateTicket {
    /// True when the work ran on a worker thread.
    pub fn is_async(&self) -> bool {
        self.handle.is_some()
    }

    /// Blocks until the parse finished. Returns whether its result was
    /// published (false when superseded).
    pub fn wait(self) -> bool {
        match self.handle {
            Some(handle) => handle.join().unwrap_or(false),
            None => true,
        }
    }
}

/// Thread-safe updater shared between the producer of streamed text and the
/// UI context that takes finished documents.
#[derive(Clone)]
pub struct DocumentUpdater {
    latest: Arc<AtomicU64>,
    slot: Arc<Mutex<Option<Published>>>,
    async_threshold: usize,
    coalesce: bool,
}

impl Default for DocumentUpdater {
    fn default() -> Self {
        Self::new(DEFAULT_ASYNC_THRESHOLD)
    }
}

impl DocumentUpdater {
    pub fn new(async_threshold: usize) -> Self {
        Self {
            latest: Arc::new(AtomicU64::new(0)),
            slot: Arc::new(Mutex::new(None)),
            async_threshold,
            coalesce: false,
        }
    }

    /// Publish coalesced documents instead of raw normalizer output.
    pub fn with_coalesce(mut self, coalesce: bool) -> Self {
        self.coalesce = coalesce;
        self
    }

    pub fn latest_version(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Parses `text`, inline below the async threshold, otherwise on a
    /// worker thread.
    pub fn request(&self, text: impl Into<String>, options: ParseOptions) -> UpdateTicket {
        let text = text.into();
        let version = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        if text.len() < self.async_threshold {
            self.run(version, &text, &options);
            return UpdateTicket {
                version,
                handle: None,
            };
        }

        let updater = self.clone();
        let handle = std::thread::spawn(move || updater.run(version, &text, &options));
        UpdateTicket {
            version,
            handle: Some(handle),
        }
    }

    fn run(&self, version: u64, text: &str, options: &ParseOptions) -> bool {
        let document = Document::parse(text, options);
        let document = if self.coalesce {
            document.coalesce().into_owned()
        } else {
            document
        };
        self.publish(version, document)
    }

    /// Stores `document` unless a newer request has been made since
    /// `version` was handed out.
    pub(crate) fn publish(&self, version: u64, document: Document) -> bool {
        let mut slot = self.slot.lock();
        let latest = self.latest.load(Ordering::SeqCst);
        if version < latest {
            log::debug!("discarding stale parse v{version} (latest v{latest})");
            return false;
        }
        *slot = Some(Published { version, document });
        true
    }

    /// Takes the most recently published document, if any is waiting.
    pub fn take(&self) -> Option<Published> {
        self.slot.lock().take()
    }
}
