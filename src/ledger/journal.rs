/// Bounded record of committed instructions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

use super::Transfer;
use crate::address::Address;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub slot: u64,
    pub timestamp: DateTime<Utc>,
    pub instruction: String,
    pub signers: Vec<Address>,
    pub transfers: Vec<Transfer>,
}

impl LedgerEntry {
    pub fn new(
        slot: u64,
        instruction: &str,
        signers: &[Address],
        transfers: Vec<Transfer>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            slot,
            timestamp: Utc::now(),
            instruction: instruction.to_string(),
            signers: signers.to_vec(),
            transfers,
        }
    }

    /// True if `address` signed the instruction or one of its transfers touched it
    pub fn involves(&self, address: &Address) -> bool {
        self.signers.contains(address)
            || self
                .transfers
                .iter()
                .any(|t| t.to == *address || t.from.as_ref() == Some(address))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journal {
    capacity: usize,
    entries: VecDeque<LedgerEntry>,
}

impl Journal {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, entries: VecDeque::new() }
    }

    pub fn record(&mut self, entry: LedgerEntry) {
        self.entries.push_back(entry);
        self.evict();
    }

    /// Rebound the journal, dropping the oldest entries that no longer fit
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.evict();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Newest first
    pub fn recent(&self, limit: usize) -> Vec<&LedgerEntry> {
        self.entries.iter().rev().take(limit).collect()
    }

    pub fn for_address(&self, address: &Address) -> Vec<&LedgerEntry> {
        self.entries.iter().filter(|entry| entry.involves(address)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
