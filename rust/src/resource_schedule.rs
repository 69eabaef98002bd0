//! Per-resource slot bookings over the scoreboard.

use std::ops::Range;

use crate::models::TaskId;

/// One scoreboard slot of a resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Slot {
    /// Working seconds the resource offers in this slot.
    pub capacity: i64,
    pub booked: Option<TaskId>,
}

/// Tracks which task holds each slot of a resource.
///
/// Sized to the scoreboard; slot `i` covers `[start + i*g, start + (i+1)*g)`.
#[derive(Clone, Debug, Default)]
pub struct ResourceSchedule {
    slots: Vec<Slot>,
}

impl ResourceSchedule {
    /// Build a schedule from per-slot working capacity.
    pub fn new(capacities: impl IntoIterator<Item = i64>) -> Self {
        Self {
            slots: capacities
                .into_iter()
                .map(|capacity| Slot {
                    capacity,
                    booked: None,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, idx: usize) -> Option<&Slot> {
        self.slots.get(idx)
    }

    /// Working seconds available in `idx` if the slot is free, else 0.
    pub fn available(&self, idx: usize) -> i64 {
        match self.slots.get(idx) {
            Some(slot) if slot.booked.is_none() => slot.capacity,
            _ => 0,
        }
    }

    /// Book a slot for a task. Fails on busy or off-duty slots.
    pub fn book(&mut self, idx: usize, task: TaskId) -> bool {
        match self.slots.get_mut(idx) {
            Some(slot) if slot.booked.is_none() && slot.capacity > 0 => {
                slot.booked = Some(task);
                true
            }
            _ => false,
        }
    }

    /// Total unbooked working seconds.
    pub fn free_capacity(&self) -> i64 {
        self.slots
            .iter()
            .filter(|slot| slot.booked.is_none())
            .map(|slot| slot.capacity)
            .sum()
    }

    /// Working seconds already booked in `range`, clamped to the schedule.
    pub fn booked_seconds(&self, range: Range<usize>) -> i64 {
        let end = range.end.min(self.slots.len());
        self.slots
            .get(range.start.min(end)..end)
            .unwrap_or_default()
            .iter()
            .filter(|slot| slot.booked.is_some())
            .map(|slot| slot.capacity)
            .sum()
    }
}
