//! Deferred and repeating tasks on the audio clock.
//!
//! Time is measured in context frames. Tasks are plain data; the owner pops
//! whatever is due and executes it. Handles are unique for the lifetime of
//! the scheduler, so cancelling a stale handle never touches a newer task.

use crate::dsp::voice::VoiceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Stop and detach a faded-out voice.
    Teardown(VoiceId),
    /// Pick a new random gain/cutoff point for a voice.
    Drift(VoiceId),
}

#[derive(Debug, Clone)]
struct Entry {
    handle: TaskHandle,
    due: u64,
    every: Option<u64>,
    task: Task,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
    next_handle: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> TaskHandle {
        self.next_handle += 1;
        TaskHandle(self.next_handle)
    }

    /// Run `task` once at frame `due`.
    pub fn defer(&mut self, due: u64, task: Task) -> TaskHandle {
        let handle = self.allocate();
        self.entries.push(Entry {
            handle,
            due,
            every: None,
            task,
        });
        handle
    }

    /// Run `task` at `first`, then every `every` frames until cancelled.
    pub fn repeat(&mut self, first: u64, every: u64, task: Task) -> TaskHandle {
        let handle = self.allocate();
        self.entries.push(Entry {
            handle,
            due: first,
            every: Some(every.max(1)),
            task,
        });
        handle
    }

    /// Returns false if the task already ran (one-shot) or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest frame at which something is due.
    pub fn next_due(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.due).min()
    }

    /// Pop every task due at or before `now`, in due order.
    ///
    /// A repeating task fires at most once per call; missed periods are
    /// skipped rather than replayed.
    pub fn due(&mut self, now: u64) -> Vec<Task> {
        let mut fired: Vec<(u64, TaskHandle, Task)> = Vec::new();
        self.entries.retain_mut(|e| {
            if e.due > now {
                return true;
            }
            fired.push((e.due, e.handle, e.task));
            match e.every {
                Some(every) => {
                    while e.due <= now {
                        e.due += every;
                    }
                    true
                }
                None => false,
            }
        });
        fired.sort_by_key(|&(due, handle, _)| (due, handle));
        fired.into_iter().map(|(_, _, task)| task).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deferred_task_fires_once() {
        let mut s = Scheduler::new();
        let h = s.defer(100, Task::Teardown(VoiceId(1)));
        assert!(s.due(99).is_empty());
        assert_eq!(s.due(100), vec![Task::Teardown(VoiceId(1))]);
        assert!(s.due(1000).is_empty());
        assert!(!s.is_pending(h));
        assert!(!s.cancel(h));
    }

    #[test]
    fn repeating_task_reschedules() {
        let mut s = Scheduler::new();
        s.repeat(10, 10, Task::Drift(VoiceId(3)));
        assert_eq!(s.due(10).len(), 1);
        assert_eq!(s.next_due(), Some(20));
        // Missed periods collapse into a single firing.
        assert_eq!(s.due(55).len(), 1);
        assert_eq!(s.next_due(), Some(60));
    }

    #[test]
    fn cancelled_task_never_fires() {
        let mut s = Scheduler::new();
        let drift = s.repeat(10, 10, Task::Drift(VoiceId(1)));
        let teardown = s.defer(15, Task::Teardown(VoiceId(1)));
        assert!(s.cancel(drift));
        assert!(s.is_pending(teardown));
        assert_eq!(s.due(100), vec![Task::Teardown(VoiceId(1))]);
        assert!(s.is_empty());
    }

    #[test]
    fn tasks_fire_in_due_order() {
        let mut s = Scheduler::new();
        s.defer(30, Task::Teardown(VoiceId(3)));
        s.defer(10, Task::Teardown(VoiceId(1)));
        s.defer(20, Task::Teardown(VoiceId(2)));
        assert_eq!(
            s.due(30),
            vec![
                Task::Teardown(VoiceId(1)),
                Task::Teardown(VoiceId(2)),
                Task::Teardown(VoiceId(3)),
            ]
        );
    }

    #[test]
    fn handles_are_unique() {
        let mut s = Scheduler::new();
        let a = s.defer(1, Task::Teardown(VoiceId(1)));
        s.due(1);
        let b = s.defer(1, Task::Teardown(VoiceId(1)));
        assert_ne!(a, b);
        s.cancel_all();
        assert_eq!(s.len(), 0);
    }
}
