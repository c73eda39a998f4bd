//! Production randomness: host selection and session tokens.

use rand::Rng;
use uuid::Uuid;

use crate::application::ports::{HostSelector, TokenSource};
use crate::domain::host::Host;

/// Uniform random host selection via the thread-local RNG.
pub struct RandHostSelector;

impl HostSelector for RandHostSelector {
    fn pick<'a>(&self, candidates: &'a [Host]) -> Option<&'a Host> {
        if candidates.is_empty() {
            return None;
        }
        let idx = rand::thread_rng().gen_range(0..candidates.len());
        candidates.get(idx)
    }
}

/// Session tokens from v4 UUIDs (OS entropy), rendered as 32 hex
/// characters.
pub struct UuidTokenSource;

impl TokenSource for UuidTokenSource {
    fn issue(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
