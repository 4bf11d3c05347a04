//! The navigation stack.

use crate::error::{NavigationError, Result};
use crate::record::{ScreenKey, ScreenRecord};
use crate::screen::ScreenType;
use core::future::Future;
use std::sync::Arc;

/// An ordered list of screen records with a cursor pointing at the current one.
///
/// Entries before the cursor make up the back stack, entries after it the forward stack.
#[derive(Debug, Default)]
pub struct NavigationStack {
    entries: Vec<Arc<ScreenRecord>>,
    /// `None` iff the stack is empty.
    current: Option<usize>,
    automatic_back_button: bool,
    /// The back-button visibility last handed out by `back_button_change`.
    back_button_visible: Option<bool>,
}

/// A record that has been taken out of the stack by [`NavigationStack::take_for_relocation`].
///
/// Dropping it makes the removal permanent; [`Relocation::rollback`] undoes it.
#[derive(Debug)]
#[must_use = "dropping a relocation makes the removal permanent"]
pub struct Relocation {
    record: Arc<ScreenRecord>,
    index: usize,
    current: Option<usize>,
}

impl Relocation {
    pub fn record(&self) -> &Arc<ScreenRecord> {
        &self.record
    }

    /// Puts the record back where it was and restores the cursor.
    pub fn rollback(self, stack: &mut NavigationStack) {
        let index = self.index.min(stack.entries.len());
        stack.entries.insert(index, self.record);
        stack.current = self.current;
    }
}

impl NavigationStack {
    pub fn new() -> NavigationStack {
        NavigationStack::default()
    }

    /// If enabled, [`back_button_change`](Self::back_button_change) reports changes of
    /// `can_go_back`.
    pub fn set_automatic_back_button(&mut self, enabled: bool) {
        self.automatic_back_button = enabled;
        if !enabled {
            self.back_button_visible = None;
        }
    }

    pub fn automatic_back_button(&self) -> bool {
        self.automatic_back_button
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Arc<ScreenRecord>] {
        &self.entries
    }

    pub fn keys(&self) -> Vec<ScreenKey> {
        self.entries.iter().map(|record| record.key()).collect()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<ScreenRecord>> {
        self.entries.get(index)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&Arc<ScreenRecord>> {
        self.current.and_then(|index| self.entries.get(index))
    }

    pub fn previous(&self) -> Option<&Arc<ScreenRecord>> {
        match self.current {
            Some(index) if index > 0 => self.entries.get(index - 1),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<&Arc<ScreenRecord>> {
        self.current.and_then(|index| self.entries.get(index + 1))
    }

    pub fn can_go_back(&self) -> bool {
        self.current.map_or(false, |index| index > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        self.current.map_or(false, |index| index + 1 < self.entries.len())
    }

    pub fn is_first(&self) -> bool {
        self.current == Some(0)
    }

    /// The number of entries up to and including the current one.
    pub fn back_stack_depth(&self) -> usize {
        self.current.map_or(0, |index| index + 1)
    }

    pub fn index_of(&self, key: ScreenKey) -> Option<usize> {
        self.entries.iter().position(|record| record.key() == key)
    }

    /// Returns the closest entry of the given type, scanning from the current entry towards the
    /// bottom of the stack.
    pub fn find_nearest(&self, screen_type: &ScreenType) -> Option<&Arc<ScreenRecord>> {
        let current = self.current?;
        self.entries[..=current]
            .iter()
            .rev()
            .find(|record| record.screen_type() == screen_type)
    }

    /// Makes the entry at `index` current.
    ///
    /// If `index` is one past the end, `record` is appended; otherwise the entry at `index` must
    /// already be `record`. Returns false and leaves the stack untouched if neither holds.
    pub fn change_current(&mut self, record: Arc<ScreenRecord>, index: usize) -> bool {
        if index == self.entries.len() {
            self.entries.push(record);
        } else if self.entries.get(index) != Some(&record) {
            return false;
        }
        self.current = Some(index);
        true
    }

    /// Swaps a non-current entry for another record, e.g. to replace a released record with a
    /// fresh one.
    ///
    /// Returns false if `index` is out of range or the current entry.
    pub(crate) fn replace_at(&mut self, index: usize, record: Arc<ScreenRecord>) -> bool {
        if Some(index) == self.current || index >= self.entries.len() {
            return false;
        }
        self.entries[index] = record;
        true
    }

    /// True iff `index` lies strictly below the current entry.
    pub fn can_go_back_to(&self, index: usize) -> bool {
        self.current.map_or(false, |current| index < current)
    }

    /// Removes a non-current entry.
    ///
    /// Returns `Ok(false)` if the index is out of range. The cursor keeps pointing at the same
    /// entry.
    pub fn remove_at(&mut self, index: usize) -> Result<bool> {
        if self.current == Some(index) {
            return Err(NavigationError::RemoveCurrent { index });
        }
        if index >= self.entries.len() {
            return Ok(false);
        }

        self.entries.remove(index);
        if let Some(current) = self.current {
            if index < current {
                self.current = Some(current - 1);
            }
        }
        Ok(true)
    }

    /// Removes an entry by key.
    ///
    /// Returns `Ok(false)` if there is no such entry.
    pub fn remove(&mut self, key: ScreenKey) -> Result<bool> {
        match self.index_of(key) {
            Some(index) => self.remove_at(index),
            None => Ok(false),
        }
    }

    /// Removes every entry after the current one; returns them in removal order (topmost first).
    pub fn clear_forward_stack(&mut self) -> Vec<Arc<ScreenRecord>> {
        let keep = self.back_stack_depth();
        let mut removed = Vec::with_capacity(self.entries.len().saturating_sub(keep));
        while self.entries.len() > keep {
            // popping from the tail never shifts the cursor
            if let Some(record) = self.entries.pop() {
                removed.push(record);
            }
        }
        removed
    }

    /// Removes every entry before the current one; returns them in removal order (closest to the
    /// current entry first).
    pub fn clear_back_stack(&mut self) -> Vec<Arc<ScreenRecord>> {
        let mut removed = Vec::new();
        // the entry right below the cursor, until there is none; each removal moves the cursor
        while let Some(current) = self.current.filter(|&index| index > 0) {
            removed.push(self.entries.remove(current - 1));
            self.current = Some(current - 1);
        }
        removed
    }

    /// Takes a non-current entry out of the stack, remembering where it was.
    ///
    /// Returns `None` if there is no such entry or it is the current one.
    pub fn take_for_relocation(&mut self, key: ScreenKey) -> Option<Relocation> {
        let index = self.index_of(key)?;
        if self.current == Some(index) {
            return None;
        }
        let current = self.current;
        let record = self.entries.remove(index);
        if let Some(cursor) = self.current {
            if index < cursor {
                self.current = Some(cursor - 1);
            }
        }
        Some(Relocation {
            record,
            index,
            current,
        })
    }

    /// Optimistically moves an entry out of its position and asks `relocate` to place it.
    ///
    /// If `relocate` reports failure, the entry goes back to exactly where it was and the stack is
    /// left as it was before the call. Moving the current entry succeeds without doing anything.
    /// Returns false if there is no such entry.
    pub async fn move_to_top<F, Fut>(&mut self, key: ScreenKey, relocate: F) -> bool
    where
        F: FnOnce(Arc<ScreenRecord>) -> Fut,
        Fut: Future<Output = bool>,
    {
        if self.current().map(|record| record.key()) == Some(key) {
            return true;
        }
        let relocation = match self.take_for_relocation(key) {
            Some(relocation) => relocation,
            None => return false,
        };

        if relocate(Arc::clone(relocation.record())).await {
            true
        } else {
            relocation.rollback(self);
            false
        }
    }

    /// Returns the new back-button visibility if it changed since the last call.
    ///
    /// Always `None` unless automatic back-button handling is enabled.
    pub fn back_button_change(&mut self) -> Option<bool> {
        if !self.automatic_back_button {
            return None;
        }
        let visible = self.can_go_back();
        if self.back_button_visible == Some(visible) {
            None
        } else {
            self.back_button_visible = Some(visible);
            Some(visible)
        }
    }
}
