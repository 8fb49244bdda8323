//! Request signing.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Sign a request: lowercase hex MD5 of `app_id || text || salt || secret_key`.
///
/// The concatenation order is fixed by the provider; any other order is
/// rejected with error 54001.
pub fn sign(app_id: &str, text: &str, salt: u64, secret_key: &str) -> String {
    let digest = md5::compute(format!("{app_id}{text}{salt}{secret_key}"));
    format!("{digest:x}")
}

/// Produces per-request salts from the wall clock in milliseconds.
///
/// Salts from one generator strictly increase, even when two requests land
/// in the same millisecond or the clock steps backwards.
#[derive(Debug, Default)]
pub struct SaltGenerator {
    last: AtomicU64,
}

impl SaltGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_salt(&self) -> u64 {
        let now = now_millis();
        let previous = match self.last.fetch_update(Ordering::AcqRel, Ordering::Acquire, |prev| {
            Some(now.max(prev.saturating_add(1)))
        }) {
            Ok(prev) | Err(prev) => prev,
        };
        now.max(previous.saturating_add(1))
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
