//! Fixed-capacity message history.

use std::num::NonZeroUsize;

/// Default number of messages retained per room.
pub const DEFAULT_HISTORY_CAPACITY: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

/// Ring buffer that keeps the most recent `capacity` items.
///
/// Adding to a full history overwrites the oldest item. Items come back out
/// oldest first.
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    slots: Vec<T>,
    start: usize,
    capacity: NonZeroUsize,
}

impl<T> BoundedHistory<T> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity.get()),
            start: 0,
            capacity,
        }
    }

    /// Append an item, evicting the oldest one when full.
    pub fn add(&mut self, item: T) {
        if self.slots.len() < self.capacity.get() {
            self.slots.push(item);
            return;
        }
        self.slots[self.start] = item;
        self.start = (self.start + 1) % self.capacity.get();
    }

    /// Iterate over retained items, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (wrapped, head) = self.slots.split_at(self.start);
        head.iter().chain(wrapped.iter())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }
}

impl<T: Clone> BoundedHistory<T> {
    /// Snapshot of retained items, oldest first.
    pub fn get_all(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(capacity: usize) -> BoundedHistory<String> {
        BoundedHistory::new(NonZeroUsize::new(capacity).unwrap())
    }

    fn fill(history: &mut BoundedHistory<String>, count: usize) {
        for i in 1..=count {
            history.add(format!("m{i}"));
        }
    }

    #[test]
    fn test_empty_history() {
        // テスト項目: 追加前は空の履歴が返される
        let history = history(3);
        assert!(history.is_empty());
        assert_eq!(history.get_all(), Vec::<String>::new());
    }

    #[test]
    fn test_history_below_capacity_keeps_insertion_order() {
        // テスト項目: 容量未満では全件が追加順に返される
        // given (前提条件):
        let mut history = history(3);

        // when (操作):
        fill(&mut history, 2);

        // then (期待する結果):
        assert_eq!(history.get_all(), vec!["m1", "m2"]);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_history_evicts_oldest_when_full() {
        // テスト項目: 容量 3 に m1..m5 を追加すると [m3, m4, m5] が残る
        // given (前提条件):
        let mut history = history(3);

        // when (操作):
        fill(&mut history, 5);

        // then (期待する結果):
        assert_eq!(history.get_all(), vec!["m3", "m4", "m5"]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_history_keeps_most_recent_items_for_any_count() {
        // テスト項目: N 件追加後は直近 min(N, C) 件が古い順に返される
        for capacity in 1..=5 {
            for count in 0..=12 {
                // given (前提条件):
                let mut history = history(capacity);

                // when (操作):
                fill(&mut history, count);

                // then (期待する結果):
                let kept = count.min(capacity);
                let expected: Vec<String> =
                    ((count - kept + 1)..=count).map(|i| format!("m{i}")).collect();
                assert_eq!(history.get_all(), expected, "C={capacity} N={count}");
            }
        }
    }

    #[test]
    fn test_get_all_is_repeatable() {
        // テスト項目: 追加を挟まなければ get_all は同じ結果を返す
        // given (前提条件):
        let mut history = history(4);
        fill(&mut history, 7);

        // when (操作):
        let first = history.get_all();
        let second = history.get_all();

        // then (期待する結果):
        assert_eq!(first, second);
    }

    #[test]
    fn test_capacity_one_keeps_latest() {
        // テスト項目: 容量 1 では最新の 1 件のみ保持される
        let mut history = history(1);
        fill(&mut history, 3);
        assert_eq!(history.get_all(), vec!["m3"]);
    }

    #[test]
    fn test_default_capacity() {
        // テスト項目: デフォルト容量は 100
        assert_eq!(DEFAULT_HISTORY_CAPACITY.get(), 100);
    }
}
