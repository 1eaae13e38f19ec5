//! Draft persistence on a small key-value store.
//!
//! Keys: `pdfForm` holds `{"content": ...}`, `pdfForm:resetAt` the
//! millisecond timestamp of the last reset, `app:lang` the UI language.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::i18n::Lang;

pub const DRAFT_KEY: &str = "pdfForm";
pub const RESET_MARKER_KEY: &str = "pdfForm:resetAt";
pub const LANG_KEY: &str = "app:lang";

/// Hydration is skipped for this long after a reset.
pub const RESET_SUPPRESSION_MS: i64 = 1000;

/// String key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by one JSON object file. A missing file is an empty store;
/// every write rewrites the whole file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| Error::Storage(format!("{}: {e}", self.path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(Error::Storage(format!("{}: {e}", self.path.display()))),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let text = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, text)
            .map_err(|e| Error::Storage(format!("{}: {e}", self.path.display())))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

/// Wall-clock time in Unix milliseconds.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Settable clock for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<i64>,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self { now: Cell::new(now_ms) }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, ms: i64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}

// ---------------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub content: String,
}

/// Draft save/restore with reset suppression.
pub struct DraftStore<S, C> {
    store: S,
    clock: C,
}

impl<S: KeyValueStore, C: Clock> DraftStore<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn save(&mut self, content: &str) -> Result<()> {
        let json = serde_json::to_string(&Draft {
            content: content.to_string(),
        })?;
        self.store.set(DRAFT_KEY, &json)
    }

    /// The stored draft content, unless a reset happened within the last
    /// second, nothing is stored, or the stored value is unreadable.
    pub fn load(&self) -> Option<String> {
        if let Some(reset_at) = self.reset_marker() {
            let age = self.clock.now_ms() - reset_at;
            if age < RESET_SUPPRESSION_MS {
                log::debug!("Skipping hydration, reset {age}ms ago");
                return None;
            }
        }
        let raw = match self.store.get(DRAFT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Could not read draft: {e}");
                return None;
            }
        };
        match serde_json::from_str::<Draft>(&raw) {
            Ok(draft) if !draft.content.is_empty() => Some(draft.content),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Ignoring unreadable draft: {e}");
                None
            }
        }
    }

    fn reset_marker(&self) -> Option<i64> {
        self.store
            .get(RESET_MARKER_KEY)
            .ok()
            .flatten()
            .and_then(|v| v.trim().parse().ok())
    }

    /// Record that a reset is happening now.
    pub fn mark_reset(&mut self) -> Result<()> {
        let now = self.clock.now_ms();
        self.store.set(RESET_MARKER_KEY, &now.to_string())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(DRAFT_KEY)
    }

    pub fn load_lang(&self) -> Option<Lang> {
        self.store
            .get(LANG_KEY)
            .ok()
            .flatten()
            .and_then(|code| code.parse().ok())
    }

    pub fn save_lang(&mut self, lang: Lang) -> Result<()> {
        self.store.set(LANG_KEY, lang.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drafts() -> DraftStore<MemoryStore, ManualClock> {
        DraftStore::new(MemoryStore::new(), ManualClock::new(1_000_000))
    }

    #[test]
    fn save_then_load() {
        let mut d = drafts();
        d.save("<p>hi</p>").unwrap();
        assert_eq!(d.load().as_deref(), Some("<p>hi</p>"));
        assert_eq!(
            d.store().get(DRAFT_KEY).unwrap().as_deref(),
            Some(r#"{"content":"<p>hi</p>"}"#)
        );
    }

    #[test]
    fn recent_reset_suppresses_hydration() {
        let mut d = drafts();
        d.save("<p>hi</p>").unwrap();
        d.mark_reset().unwrap();
        d.clock().advance(999);
        assert_eq!(d.load(), None);
        d.clock().advance(1);
        assert_eq!(d.load().as_deref(), Some("<p>hi</p>"));
    }

    #[test]
    fn unreadable_draft_is_ignored() {
        let mut store = MemoryStore::new();
        store.set(DRAFT_KEY, "{not json").unwrap();
        let d = DraftStore::new(store, ManualClock::new(0));
        assert_eq!(d.load(), None);
    }

    #[test]
    fn clear_removes_draft() {
        let mut d = drafts();
        d.save("<p>hi</p>").unwrap();
        d.clear().unwrap();
        assert_eq!(d.load(), None);
    }

    #[test]
    fn language_round_trip() {
        let mut d = drafts();
        assert_eq!(d.load_lang(), None);
        d.save_lang(Lang::Ja).unwrap();
        assert_eq!(d.load_lang(), Some(Lang::Ja));
        assert_eq!(d.store().get(LANG_KEY).unwrap().as_deref(), Some("ja"));
    }

    #[test]
    fn file_store_persists() {
        let path = std::env::temp_dir().join(format!("a4draft-store-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let mut store = FileStore::new(&path);
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(FileStore::new(&path).get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        let _ = std::fs::remove_file(&path);
    }
}
