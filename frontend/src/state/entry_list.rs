//! # Entry List Module
//!
//! The records table: entries ordered most recent first, the rows the user
//! has ticked, and the income/expense totals shown underneath.
//!
//! Each list owns its selection. Two tables on screen never share ticked rows.

use chrono::Datelike;
use log::{debug, warn};
use std::collections::BTreeSet;

use shared::{Entry, EntryId, MoneyValue};

/// A change reported by the entry dialog or the data service
#[derive(Debug, Clone, PartialEq)]
pub enum EntryChange {
    Inserted(Entry),
    Updated(Entry),
    Deleted(EntryId),
}

/// Income and expense sums of a set of entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryTotals {
    pub income: MoneyValue,
    pub expense: MoneyValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryList {
    entries: Vec<Entry>,
    selected: BTreeSet<EntryId>,
    currency_code: String,
}

impl EntryList {
    pub fn new(currency_code: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            selected: BTreeSet::new(),
            currency_code: currency_code.into(),
        }
    }

    /// Build from fetched entries in any order
    pub fn from_entries(mut entries: Vec<Entry>, currency_code: impl Into<String>) -> Self {
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Self {
            entries,
            selected: BTreeSet::new(),
            currency_code: currency_code.into(),
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Apply a change, keeping the date order. Returns `false` when nothing changed.
    pub fn apply(&mut self, change: EntryChange) -> bool {
        match change {
            EntryChange::Inserted(entry) | EntryChange::Updated(entry) => {
                if let Some(existing) = self.get(entry.id) {
                    if *existing == entry {
                        return false;
                    }
                    self.remove(entry.id);
                }
                self.insert_sorted(entry);
                true
            }
            EntryChange::Deleted(id) => {
                if self.remove(id) {
                    self.selected.remove(&id);
                    true
                } else {
                    debug!("Delete for unknown entry {} ignored", id);
                    false
                }
            }
        }
    }

    fn insert_sorted(&mut self, entry: Entry) {
        let position = self
            .entries
            .iter()
            .position(|e| e.date <= entry.date)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, entry);
    }

    fn remove(&mut self, id: EntryId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Tick a row. Unknown ids are refused.
    pub fn select(&mut self, id: EntryId) -> bool {
        if self.get(id).is_none() {
            warn!("Cannot select unknown entry {}", id);
            return false;
        }
        self.selected.insert(id)
    }

    pub fn deselect(&mut self, id: EntryId) -> bool {
        self.selected.remove(&id)
    }

    pub fn toggle_selection(&mut self, id: EntryId) -> bool {
        if self.selected.contains(&id) {
            self.deselect(id)
        } else {
            self.select(id)
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self.entries.iter().map(|e| e.id).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, id: EntryId) -> bool {
        self.selected.contains(&id)
    }

    /// Ticked entries in display order
    pub fn selected_entries(&self) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| self.selected.contains(&e.id))
            .collect()
    }

    pub fn totals(&self) -> EntryTotals {
        Self::totals_of(self.entries.iter(), &self.currency_code)
    }

    /// Totals over the ticked rows only
    pub fn selected_totals(&self) -> EntryTotals {
        Self::totals_of(
            self.entries.iter().filter(|e| self.selected.contains(&e.id)),
            &self.currency_code,
        )
    }

    fn totals_of<'a>(entries: impl Iterator<Item = &'a Entry> + Clone, currency_code: &str) -> EntryTotals {
        EntryTotals {
            income: MoneyValue::sum(
                entries.clone().filter(|e| e.is_positive).map(|e| &e.amount),
                currency_code,
            ),
            expense: MoneyValue::sum(entries.filter(|e| !e.is_positive).map(|e| &e.amount), currency_code),
        }
    }

    /// Entries whose detail or note contains `query`, ignoring case
    pub fn search(&self, query: &str) -> Vec<&Entry> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.entries.iter().collect();
        }
        self.entries
            .iter()
            .filter(|e| {
                e.detail.to_lowercase().contains(&query)
                    || e.note
                        .as_deref()
                        .map_or(false, |note| note.to_lowercase().contains(&query))
            })
            .collect()
    }

    pub fn in_month(&self, year: i32, month: u32) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| e.date.year() == year && e.date.month() == month)
            .collect()
    }

    /// The `limit` most recent entries
    pub fn recent(&self, limit: usize) -> &[Entry] {
        &self.entries[..limit.min(self.entries.len())]
    }
}
