/// Callbacks deferred while a panel is locked, keyed by a caller-chosen id.
///
/// Queuing an id that is already pending replaces its callback but keeps the
/// slot it was first queued in, so flush order is stable.
pub struct LockQueue<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for LockQueue<T> {
    fn default() -> Self { Self { entries: Vec::new() } }
}

impl<T> LockQueue<T> {
    pub fn new() -> Self { Self::default() }

    /// Returns true if an earlier callback with the same id was replaced.
    pub fn push(&mut self, queue_id: impl Into<String>, item: T) -> bool {
        let queue_id = queue_id.into();
        match self.entries.iter_mut().find(|(id, _)| *id == queue_id) {
            Some(slot) => {
                slot.1 = item;
                true
            }
            None => {
                self.entries.push((queue_id, item));
                false
            }
        }
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn pending_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn drain(&mut self) -> impl Iterator<Item = (String, T)> + '_ { self.entries.drain(..) }
}

impl<T> std::fmt::Debug for LockQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.pending_ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_ids_collapse_to_latest_in_first_slot() {
        let mut queue = LockQueue::new();
        assert!(!queue.push("render", 1));
        assert!(!queue.push("scroll", 2));
        assert!(queue.push("render", 3));
        assert_eq!(queue.len(), 2);
        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(drained, vec![("render".to_string(), 3), ("scroll".to_string(), 2)]);
        assert!(queue.is_empty());
    }
}
