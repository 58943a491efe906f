// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::VecDeque;

use crate::SyncTask;

/// fifo of pending tasks plus the flag that keeps a second drain from starting.
///
/// both live under one lock so that enqueueing and claiming the drain are atomic.
#[derive(Debug, Default)]
pub(crate) struct TaskQueue {
    tasks: VecDeque<SyncTask>,
    draining: bool,
}

impl TaskQueue {
    pub(crate) fn push(&mut self, task: SyncTask) {
        self.tasks.push_back(task);
    }

    pub(crate) fn front(&self) -> Option<&SyncTask> {
        self.tasks.front()
    }

    pub(crate) fn pop_front(&mut self) -> Option<SyncTask> {
        self.tasks.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    pub(crate) fn is_draining(&self) -> bool {
        self.draining
    }

    /// marks the queue as draining; false when a drain is already running.
    pub(crate) fn begin_drain(&mut self) -> bool {
        !std::mem::replace(&mut self.draining, true)
    }

    pub(crate) fn end_drain(&mut self) {
        self.draining = false;
    }

    /// removes the first queued task that would undo `task`.
    pub(crate) fn take_opposite(&mut self, task: &SyncTask) -> Option<SyncTask> {
        let index = self.tasks.iter().position(|queued| queued.is_opposite_of(task))?;
        self.tasks.remove(index)
    }
}
