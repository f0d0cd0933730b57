use foundation::time::Time;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Key {
    due: Time,
    id: TimerId,
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        // Total ordering: (due, id)
        self.due.cmp(&other.due).then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug)]
struct Item<T> {
    key: Key,
    payload: T,
}

/// Deterministic queue of cancellable timers.
///
/// Key properties:
/// - Total ordering on `(due, id)`.
/// - Timers due at the same instant fire in insertion order.
/// - Cancellation does not perturb the order of remaining timers.
///
/// Vec-backed: the UI never holds more than a few hundred dwell timers.
#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    items: Vec<Item<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            items: Vec::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn schedule(&mut self, due: Time, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.items.push(Item {
            key: Key { due, id },
            payload,
        });
        id
    }

    /// Returns `true` if the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let Some(idx) = self.items.iter().position(|i| i.key.id == id) else {
            return false;
        };
        self.items.swap_remove(idx);
        true
    }

    pub fn contains(&self, id: TimerId) -> bool {
        self.items.iter().any(|i| i.key.id == id)
    }

    /// Cancels everything. Returns how many timers were dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.items.len();
        self.items.clear();
        n
    }

    fn next_index(&self) -> Option<usize> {
        let mut best_idx: Option<usize> = None;
        for (idx, item) in self.items.iter().enumerate() {
            match best_idx {
                None => best_idx = Some(idx),
                Some(best) => {
                    if item.key < self.items[best].key {
                        best_idx = Some(idx);
                    }
                }
            }
        }
        best_idx
    }

    pub fn next_due(&self) -> Option<Time> {
        self.next_index().map(|idx| self.items[idx].key.due)
    }

    /// Pops the earliest timer if it is due at or before `now`.
    pub fn pop_due(&mut self, now: Time) -> Option<(TimerId, Time, T)> {
        let idx = self.next_index()?;
        if self.items[idx].key.due > now {
            return None;
        }
        let item = self.items.swap_remove(idx);
        Some((item.key.id, item.key.due, item.payload))
    }
}
