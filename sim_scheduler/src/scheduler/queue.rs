//! Ready queue
//!
//! Membership only. Ordering is imposed by the active policy at selection
//! time, so the set is keyed by id to keep iteration deterministic.

use std::collections::BTreeSet;
use village_types::TaskId;

#[derive(Debug, Default)]
pub(crate) struct ReadyQueue {
    ids: BTreeSet<TaskId>,
}

impl ReadyQueue {
    pub(crate) fn new() -> Self {
        Self {
            ids: BTreeSet::new(),
        }
    }

    /// Returns false if the task was already queued
    pub(crate) fn insert(&mut self, task_id: TaskId) -> bool {
        self.ids.insert(task_id)
    }

    pub(crate) fn remove(&mut self, task_id: TaskId) -> bool {
        self.ids.remove(&task_id)
    }

    pub(crate) fn contains(&self, task_id: TaskId) -> bool {
        self.ids.contains(&task_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.ids.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_never_duplicated() {
        let mut queue = ReadyQueue::new();
        assert!(queue.insert(TaskId::from_raw(1)));
        assert!(!queue.insert(TaskId::from_raw(1)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_iteration_is_in_id_order() {
        let mut queue = ReadyQueue::new();
        queue.insert(TaskId::from_raw(3));
        queue.insert(TaskId::from_raw(1));
        queue.insert(TaskId::from_raw(2));
        let ids: Vec<u64> = queue.iter().map(|id| id.as_u64()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_remove() {
        let mut queue = ReadyQueue::new();
        queue.insert(TaskId::from_raw(5));
        assert!(queue.contains(TaskId::from_raw(5)));
        assert!(queue.remove(TaskId::from_raw(5)));
        assert!(!queue.remove(TaskId::from_raw(5)));
        assert!(queue.is_empty());
    }
}
