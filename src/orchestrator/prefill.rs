//! One-shot recipient/amount prefill from URL query parameters.

use parking_lot::Mutex;
use tracing::debug;
use url::Url;

use crate::blockchain::traits::QueryParamStore;
use crate::core::errors::BridgeError;
use crate::orchestrator::validate::{FormField, TouchedFields};

pub const RECIPIENT_PARAM: &str = "recipient";
pub const AMOUNT_PARAM: &str = "amount";

/// Values to write into the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefillValues {
    pub recipient: Option<String>,
    pub amount: Option<String>,
}

/// Query parameters captured when the form mounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPrefill {
    init_recipient: Option<String>,
    init_amount: Option<String>,
    applied: bool,
    stripped: bool,
}

impl QueryPrefill {
    pub fn capture(store: &dyn QueryParamStore) -> Self {
        let read = |key: &str| store.get(key).filter(|v| !v.trim().is_empty());
        Self {
            init_recipient: read(RECIPIENT_PARAM),
            init_amount: read(AMOUNT_PARAM),
            applied: false,
            stripped: false,
        }
    }

    pub fn init_recipient(&self) -> Option<&str> {
        self.init_recipient.as_deref()
    }

    pub fn init_amount(&self) -> Option<&str> {
        self.init_amount.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.init_recipient.is_none() && self.init_amount.is_none()
    }

    pub fn is_applied(&self) -> bool {
        self.applied
    }

    pub fn is_stripped(&self) -> bool {
        self.stripped
    }

    /// Captured values, the first time only.
    pub fn apply_once(&mut self) -> Option<PrefillValues> {
        if self.applied {
            return None;
        }
        self.applied = true;
        if self.is_empty() {
            return None;
        }
        Some(PrefillValues { recipient: self.init_recipient.clone(), amount: self.init_amount.clone() })
    }

    /// Prefilled fields count as touched.
    pub fn initial_touched(&self) -> TouchedFields {
        let mut touched = TouchedFields::new();
        if self.init_recipient.is_some() {
            touched.insert(FormField::Recipient);
        }
        if self.init_amount.is_some() {
            touched.insert(FormField::BridgeInInputAmount);
        }
        touched
    }

    /// Remove both parameters from the location without pushing a history
    /// entry. Returns whether anything was removed.
    pub fn strip(&mut self, store: &dyn QueryParamStore) -> bool {
        let present = store.get(RECIPIENT_PARAM).is_some() || store.get(AMOUNT_PARAM).is_some();
        if !present {
            return false;
        }
        store.delete(RECIPIENT_PARAM);
        store.delete(AMOUNT_PARAM);
        store.replace();
        self.stripped = true;
        debug!("stripped prefill parameters from location");
        true
    }
}

#[derive(Debug)]
struct Location {
    pending: Url,
    history: Vec<Url>,
}

/// [`QueryParamStore`] over a browser-style history of URLs.
///
/// Deletes are staged until [`QueryParamStore::replace`] rewrites the current
/// history entry.
#[derive(Debug)]
pub struct UrlQueryStore {
    location: Mutex<Location>,
}

impl UrlQueryStore {
    pub fn new(url: &str) -> Result<Self, BridgeError> {
        let parsed = parse(url)?;
        Ok(Self { location: Mutex::new(Location { pending: parsed.clone(), history: vec![parsed] }) })
    }

    /// Navigate to `url`, adding a history entry.
    pub fn push(&self, url: &str) -> Result<(), BridgeError> {
        let parsed = parse(url)?;
        let mut location = self.location.lock();
        location.pending = parsed.clone();
        location.history.push(parsed);
        Ok(())
    }

    pub fn current(&self) -> String {
        let location = self.location.lock();
        location.history.last().map(Url::to_string).unwrap_or_default()
    }

    pub fn history_len(&self) -> usize {
        self.location.lock().history.len()
    }
}

fn parse(url: &str) -> Result<Url, BridgeError> {
    Url::parse(url).map_err(|e| BridgeError::Config(format!("invalid location {}: {}", url, e)))
}

impl QueryParamStore for UrlQueryStore {
    fn get(&self, key: &str) -> Option<String> {
        let location = self.location.lock();
        let value = location.pending.query_pairs().find(|(k, _)| k == key).map(|(_, v)| v.into_owned());
        value
    }

    fn delete(&self, key: &str) {
        let mut location = self.location.lock();
        let kept: Vec<(String, String)> = location
            .pending
            .query_pairs()
            .filter(|(k, _)| k != key)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if kept.is_empty() {
            location.pending.set_query(None);
        } else {
            location.pending.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    fn replace(&self) {
        let mut location = self.location.lock();
        let committed = location.pending.clone();
        if let Some(last) = location.history.last_mut() {
            *last = committed;
        }
    }
}
