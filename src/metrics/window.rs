use std::collections::VecDeque;
use std::time::Duration;

/// One interval bucket. `start` is the arrival time of the first item.
#[derive(Debug, Clone, PartialEq)]
pub struct Window<T> {
    pub start: i64,
    pub items: Vec<T>,
}

/// Arrival-ordered interval buckets. Items land in the open (newest)
/// window while it is younger than the interval; otherwise a new window
/// opens. Only `drain` may remove the open window.
#[derive(Debug)]
pub struct WindowBuffer<T> {
    interval_secs: i64,
    windows: VecDeque<Window<T>>,
}

impl<T> WindowBuffer<T> {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval_secs: (interval.as_secs() as i64).max(1),
            windows: VecDeque::new(),
        }
    }

    pub fn push(&mut self, item: T, now: i64) {
        match self.windows.back_mut() {
            Some(open) if now.saturating_sub(open.start) < self.interval_secs => {
                open.items.push(item);
            }
            Some(_) | None => {
                self.windows.push_back(Window {
                    start: now,
                    items: vec![item],
                });
            }
        }
    }

    /// Removes and returns the oldest window, but only while a newer
    /// window exists behind it. The still-open window is never returned.
    pub fn pop_closed(&mut self) -> Option<Window<T>> {
        if self.windows.len() > 1 {
            self.windows.pop_front()
        } else {
            None
        }
    }

    /// Removes every window, open one included. Shutdown path only.
    pub fn drain(&mut self) -> Vec<Window<T>> {
        self.windows.drain(..).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
