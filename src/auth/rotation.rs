//! Per-subject generation counter for refresh token rotation.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Tracks the live refresh generation of each subject. A refresh token is
/// valid only while its generation matches the subject's counter.
#[derive(Debug, Default)]
pub struct RefreshGenerations {
    counters: Mutex<HashMap<String, u64>>,
}

impl RefreshGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self, subject: &str) -> u64 {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters.get(subject).copied().unwrap_or(0)
    }

    /// Move `subject` from `expected` to the next generation.
    /// Returns `None` if the counter no longer equals `expected`.
    pub fn advance(&self, subject: &str, expected: u64) -> Option<u64> {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let counter = counters.entry(subject.to_string()).or_insert(0);
        if *counter != expected {
            return None;
        }
        *counter += 1;
        Some(*counter)
    }
}
