//! Double-banked PEC table
//!
//! Playback reads the active bank while a recording fills the other one;
//! committing a recording flips the banks. All slots are atomics so the
//! control context can copy the table out for saving without a lock.
//! Copies check the commit generation and retry if a commit raced them.

use portable_atomic::{AtomicBool, AtomicI8, AtomicU32, AtomicU8, Ordering};

use crate::config::MAX_PEC_SLOTS;

/// Shared PEC correction table
pub struct PecBuffer {
    banks: [[AtomicI8; MAX_PEC_SLOTS]; 2],
    active: AtomicU8,
    valid: AtomicBool,
    generation: AtomicU32,
}

impl Default for PecBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PecBuffer {
    /// Empty, invalid table (usable in a `static`)
    pub const fn new() -> Self {
        Self {
            banks: [const { [const { AtomicI8::new(0) }; MAX_PEC_SLOTS] }; 2],
            active: AtomicU8::new(0),
            valid: AtomicBool::new(false),
            generation: AtomicU32::new(0),
        }
    }

    /// True once a recording has been committed or a table loaded
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Incremented on every commit, load or clear
    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    fn active_bank(&self) -> usize {
        (self.active.load(Ordering::Acquire) & 1) as usize
    }

    /// Read a slot of the active table
    pub fn read(&self, slot: usize) -> i8 {
        match self.banks[self.active_bank()].get(slot) {
            Some(value) => value.load(Ordering::Relaxed),
            None => 0,
        }
    }

    /// Read a slot of the staging table
    pub fn staged(&self, slot: usize) -> i8 {
        match self.banks[self.active_bank() ^ 1].get(slot) {
            Some(value) => value.load(Ordering::Relaxed),
            None => 0,
        }
    }

    /// Write a slot of the staging table
    pub fn stage(&self, slot: usize, value: i8) {
        if let Some(cell) = self.banks[self.active_bank() ^ 1].get(slot) {
            cell.store(value, Ordering::Relaxed);
        }
    }

    /// Make the staging table active and mark it valid
    pub fn commit(&self) {
        let next = (self.active_bank() ^ 1) as u8;
        self.active.store(next, Ordering::Release);
        self.valid.store(true, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Replace the table with saved values
    ///
    /// Must not race a recording; the control context only loads while
    /// PEC is idle.
    pub fn load(&self, values: &[i8]) {
        for (slot, value) in values.iter().take(MAX_PEC_SLOTS).enumerate() {
            self.stage(slot, *value);
        }
        for slot in values.len().min(MAX_PEC_SLOTS)..MAX_PEC_SLOTS {
            self.stage(slot, 0);
        }
        self.commit();
    }

    /// Copy the first `out.len()` slots of the active table
    ///
    /// Returns `false` when no valid table exists.
    pub fn snapshot(&self, out: &mut [i8]) -> bool {
        loop {
            let generation = self.generation();
            if !self.is_valid() {
                return false;
            }
            for (slot, value) in out.iter_mut().enumerate() {
                *value = self.read(slot);
            }
            if self.generation() == generation {
                return true;
            }
        }
    }

    /// Invalidate the table
    pub fn clear(&self) {
        self.valid.store(false, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_invalid() {
        let buffer = PecBuffer::new();
        assert!(!buffer.is_valid());
        let mut out = [0i8; 4];
        assert!(!buffer.snapshot(&mut out));
    }

    #[test]
    fn test_stage_is_invisible_until_commit() {
        let buffer = PecBuffer::new();
        buffer.stage(3, 7);
        assert_eq!(buffer.read(3), 0);
        assert_eq!(buffer.staged(3), 7);

        buffer.commit();
        assert!(buffer.is_valid());
        assert_eq!(buffer.read(3), 7);
        assert_eq!(buffer.generation(), 1);
    }

    #[test]
    fn test_load_and_snapshot() {
        let buffer = PecBuffer::new();
        buffer.load(&[1, -2, 3]);
        let mut out = [9i8; 5];
        assert!(buffer.snapshot(&mut out));
        assert_eq!(out, [1, -2, 3, 0, 0]);
    }

    #[test]
    fn test_clear_invalidates() {
        let buffer = PecBuffer::new();
        buffer.load(&[1]);
        buffer.clear();
        assert!(!buffer.is_valid());
        assert_eq!(buffer.generation(), 2);
    }

    #[test]
    fn test_out_of_range_slots_are_ignored() {
        let buffer = PecBuffer::new();
        buffer.stage(MAX_PEC_SLOTS, 5);
        assert_eq!(buffer.read(MAX_PEC_SLOTS + 10), 0);
    }
}
