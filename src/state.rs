pub const PRIMARY_POOL: &str = "blue";
pub const BACKUP_POOL: &str = "green";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PoolState {
    // No request with a pool has been seen yet
    #[default]
    Unknown,
    // Pool that served the most recent request
    Active(String),
}

/// What a single observation did to the tracked pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// First pool ever seen; establishes the baseline without alerting.
    Baseline(String),
    Unchanged,
    /// Traffic moved onto the backup pool.
    Failover { from: String, to: String },
    /// Traffic moved back onto the primary pool.
    Recovery { from: String, to: String },
    /// Moved to a pool that has no alerting meaning.
    Switched { from: String, to: String },
}

#[derive(Debug, Default)]
pub struct PoolStateTracker {
    state: PoolState,
}

impl PoolStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PoolState {
        &self.state
    }

    pub fn active_pool(&self) -> Option<&str> {
        match &self.state {
            PoolState::Unknown => None,
            PoolState::Active(pool) => Some(pool),
        }
    }

    pub fn observe(&mut self, pool: &str) -> Transition {
        let prev = match &self.state {
            PoolState::Unknown => {
                self.state = PoolState::Active(pool.to_string());
                return Transition::Baseline(pool.to_string());
            }
            PoolState::Active(prev) if prev == pool => return Transition::Unchanged,
            PoolState::Active(prev) => prev.clone(),
        };
        self.state = PoolState::Active(pool.to_string());

        let (from, to) = (prev, pool.to_string());
        match pool {
            BACKUP_POOL => Transition::Failover { from, to },
            PRIMARY_POOL => Transition::Recovery { from, to },
            _ => Transition::Switched { from, to },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_pool_is_a_silent_baseline() {
        let mut tracker = PoolStateTracker::new();
        assert_eq!(tracker.state(), &PoolState::Unknown);
        assert_eq!(tracker.observe("green"), Transition::Baseline("green".into()));
        assert_eq!(tracker.active_pool(), Some("green"));
        assert_eq!(tracker.observe("green"), Transition::Unchanged);
    }

    #[test]
    fn failover_then_recovery_round_trip() {
        let mut tracker = PoolStateTracker::new();
        tracker.observe("blue");
        assert_eq!(
            tracker.observe("green"),
            Transition::Failover { from: "blue".into(), to: "green".into() }
        );
        assert_eq!(
            tracker.observe("blue"),
            Transition::Recovery { from: "green".into(), to: "blue".into() }
        );
        assert_eq!(tracker.observe("blue"), Transition::Unchanged);
    }

    #[test]
    fn classification_depends_only_on_new_pool() {
        let mut tracker = PoolStateTracker::new();
        tracker.observe("canary");
        assert_eq!(
            tracker.observe("green"),
            Transition::Failover { from: "canary".into(), to: "green".into() }
        );
        tracker.observe("canary");
        assert_eq!(
            tracker.observe("blue"),
            Transition::Recovery { from: "canary".into(), to: "blue".into() }
        );
    }

    #[test]
    fn unrecognized_pools_switch_silently() {
        let mut tracker = PoolStateTracker::new();
        tracker.observe("blue");
        assert_eq!(
            tracker.observe("canary"),
            Transition::Switched { from: "blue".into(), to: "canary".into() }
        );
        assert_eq!(tracker.active_pool(), Some("canary"));
    }
}
