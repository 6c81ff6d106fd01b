use std::collections::VecDeque;

/// Fixed-capacity ring of recent request outcomes (`true` = upstream error).
///
/// The rate is only defined once the window has filled up; before that
/// `error_rate` returns `None`, so a cold start can never alert.
#[derive(Debug, Clone)]
pub struct ErrorRateWindow {
    outcomes: VecDeque<bool>,
    capacity: usize,
    errors: usize,
}

impl ErrorRateWindow {
    /// `capacity` must be at least 1; the config layer rejects anything smaller.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
            errors: 0,
        }
    }

    pub fn push(&mut self, is_error: bool) {
        if self.outcomes.len() == self.capacity {
            if let Some(true) = self.outcomes.pop_front() {
                self.errors -= 1;
            }
        }
        self.outcomes.push_back(is_error);
        if is_error {
            self.errors += 1;
        }
    }

    pub fn is_full(&self) -> bool {
        self.outcomes.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Percentage of errors in a full window.
    pub fn error_rate(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        Some(self.errors as f64 * 100.0 / self.capacity as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rate_until_full() {
        let mut window = ErrorRateWindow::new(3);
        assert_eq!(window.error_rate(), None);
        window.push(true);
        window.push(true);
        assert!(!window.is_full());
        assert_eq!(window.error_rate(), None);
        window.push(false);
        assert!(window.is_full());
        assert!(window.error_rate().is_some());
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut window = ErrorRateWindow::new(5);
        for i in 0..23 {
            window.push(i % 3 == 0);
            assert!(window.len() <= window.capacity());
        }
        assert_eq!(window.len(), 5);
    }

    #[test]
    fn rate_is_exact_percentage_of_full_window() {
        let mut window = ErrorRateWindow::new(200);
        for i in 0..200 {
            window.push(i < 3);
        }
        assert_eq!(window.error_rate(), Some(1.5));

        let mut window = ErrorRateWindow::new(10);
        for i in 0..10 {
            window.push(i < 2);
        }
        assert_eq!(window.error_rate(), Some(20.0));
    }

    #[test]
    fn oldest_outcomes_are_evicted_first() {
        let mut window = ErrorRateWindow::new(4);
        for outcome in [true, true, false, false] {
            window.push(outcome);
        }
        assert_eq!(window.error_rate(), Some(50.0));

        window.push(false);
        assert_eq!(window.error_count(), 1);
        assert_eq!(window.error_rate(), Some(25.0));

        window.push(false);
        assert_eq!(window.error_rate(), Some(0.0));

        window.push(true);
        assert_eq!(window.error_count(), 1);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut window = ErrorRateWindow::new(0);
        assert_eq!(window.capacity(), 1);
        window.push(true);
        assert_eq!(window.error_rate(), Some(100.0));
    }
}
