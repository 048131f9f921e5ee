//! In-process account table
//!
//! Stands in for the OS database in tests and when embedding the
//! filesystem without touching real accounts. Records keep insertion order.

use parking_lot::RwLock;

use super::{AccountDatabase, AccountRecord};
use crate::error::Result;

#[derive(Debug, Default)]
pub struct MemoryAccounts {
    records: RwLock<Vec<AccountRecord>>,
}

impl MemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = AccountRecord>) -> Self {
        let table = Self::new();
        for record in records {
            table.insert(record);
        }
        table
    }

    /// Insert or replace the account with the record's name
    pub fn insert(&self, record: AccountRecord) {
        let mut records = self.records.write();
        match records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    /// Remove an account, returning whether it existed
    pub fn remove(&self, name: &str) -> bool {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.name != name);
        records.len() != before
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl AccountDatabase for MemoryAccounts {
    fn lookup(&self, name: &str) -> Result<Option<AccountRecord>> {
        Ok(self.records.read().iter().find(|r| r.name == name).cloned())
    }

    fn for_each(&self, visit: &mut dyn FnMut(&AccountRecord)) -> Result<()> {
        // Snapshot so a visitor may touch the table without deadlocking
        let snapshot = self.records.read().clone();
        for record in &snapshot {
            visit(record);
        }
        Ok(())
    }
}
