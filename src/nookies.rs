//! Nookies: persistent, processor-scoped named values, the DSL's only
//! durable state across sessions. See spec.md §4.2.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::error::NiplError;

/// `get`/`set` contract for a nookie backend. Implementations must
/// serialize mutations (one writer at a time) and give readers a
/// consistent snapshot per operation; the process-global default
/// ([`InMemoryNookieStore`]) does this with a single mutex.
pub trait NookieStore: Send + Sync {
    fn get(&self, name: &str) -> String;
    fn set(&self, name: &str, value: &str, expiry: Option<&str>) -> Result<(), NiplError>;
}

/// Parses a nookie expiry suffix: `h`/`m`/`d` for hours/minutes/days, or
/// no suffix at all for "never expires". Any other suffix is an error.
fn parse_expiry(raw: &str) -> Result<Option<Duration>, NiplError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let (digits, unit) = raw.split_at(raw.len() - 1);
    let amount: i64 = digits
        .parse()
        .map_err(|_| NiplError::InvalidExpiry(raw.to_string()))?;
    match unit {
        "h" => Ok(Some(Duration::hours(amount))),
        "m" => Ok(Some(Duration::minutes(amount))),
        "d" => Ok(Some(Duration::days(amount))),
        _ => Err(NiplError::InvalidExpiry(raw.to_string())),
    }
}

struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Process-global, in-memory nookie backend. Expired entries are removed
/// lazily on read, matching spec.md §4.2 exactly.
#[derive(Default)]
pub struct InMemoryNookieStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryNookieStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NookieStore for InMemoryNookieStore {
    fn get(&self, name: &str) -> String {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(name) {
            Some(entry) => {
                if entry.expires_at.is_some_and(|exp| exp < Utc::now()) {
                    entries.remove(name);
                    String::new()
                } else {
                    entry.value.clone()
                }
            }
            None => String::new(),
        }
    }

    fn set(&self, name: &str, value: &str, expiry: Option<&str>) -> Result<(), NiplError> {
        let duration = match expiry {
            Some(raw) => parse_expiry(raw)?,
            None => None,
        };
        let expires_at = duration.map(|d| Utc::now() + d);
        self.entries.lock().unwrap().insert(
            name.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }
}
