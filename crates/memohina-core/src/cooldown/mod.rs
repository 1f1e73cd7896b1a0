//! Per-user, per-command cooldowns
//!
//! Each (user, command) pair keeps the time of its last admitted invocation.
//! A denied invocation changes nothing and is never logged, so spamming a
//! command neither extends the wait nor floods the logs.

use crate::commands::CommandKind;
use crate::config::ConfigHandle;
use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// Result of a cooldown check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied { remaining: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

type Slot = (String, CommandKind);

/// Bounded map of last admitted invocations
pub struct CooldownGuard {
    last: Mutex<LruCache<Slot, DateTime<Utc>>>,
    config: ConfigHandle,
}

impl CooldownGuard {
    pub fn new(config: ConfigHandle) -> Self {
        let capacity = config.snapshot().cooldown.capacity;
        Self {
            last: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            config,
        }
    }

    /// Admit `command` for `user_id` at `now`, recording the time when allowed.
    ///
    /// A clock that moved backwards reads as "too soon" until it catches up.
    pub fn allow(&self, user_id: &str, command: CommandKind, now: DateTime<Utc>) -> Admission {
        let config = self.config.snapshot();
        let cooldown_config = &config.cooldown;
        let cooldown = Duration::seconds(cooldown_config.seconds_for(command) as i64);

        let mut last = self.last.lock();
        if let Some(capacity) = NonZeroUsize::new(cooldown_config.capacity) {
            if last.cap() != capacity {
                last.resize(capacity);
            }
        }

        let slot = (user_id.to_string(), command);
        if let Some(previous) = last.get(&slot) {
            let elapsed = now - *previous;
            if elapsed < cooldown {
                return Admission::Denied {
                    remaining: cooldown - elapsed,
                };
            }
        }
        last.put(slot, now);
        Admission::Allowed
    }

    /// Forget every recorded invocation of a user
    pub fn reset(&self, user_id: &str) {
        let mut last = self.last.lock();
        for command in CommandKind::ALL {
            last.pop(&(user_id.to_string(), command));
        }
    }

    pub fn len(&self) -> usize {
        self.last.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArchiveConfig;
    use chrono::TimeZone;

    fn guard() -> CooldownGuard {
        CooldownGuard::new(ConfigHandle::default())
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn test_memohina_cooldown_window() {
        let guard = guard();
        assert!(guard.allow("u", CommandKind::Memohina, at(0)).is_allowed());
        assert_eq!(
            guard.allow("u", CommandKind::Memohina, at(500)),
            Admission::Denied {
                remaining: Duration::seconds(100)
            }
        );
        assert!(guard.allow("u", CommandKind::Memohina, at(601)).is_allowed());
    }

    #[test]
    fn test_denial_does_not_extend_window() {
        let guard = guard();
        guard.allow("u", CommandKind::Think, at(0));
        assert!(!guard.allow("u", CommandKind::Think, at(9)).is_allowed());
        assert!(guard.allow("u", CommandKind::Think, at(10)).is_allowed());
    }

    #[test]
    fn test_commands_and_users_are_independent() {
        let guard = guard();
        assert!(guard.allow("u", CommandKind::Memohina, at(0)).is_allowed());
        assert!(guard.allow("u", CommandKind::Think, at(1)).is_allowed());
        assert!(guard.allow("v", CommandKind::Memohina, at(1)).is_allowed());
    }

    #[test]
    fn test_clock_going_backwards_is_denied() {
        let guard = guard();
        guard.allow("u", CommandKind::Think, at(100));
        assert!(!guard.allow("u", CommandKind::Think, at(50)).is_allowed());
    }

    #[test]
    fn test_capacity_bounds_entries() {
        let mut config = ArchiveConfig::default();
        config.cooldown.capacity = 2;
        let guard = CooldownGuard::new(ConfigHandle::new(config));

        guard.allow("a", CommandKind::Think, at(0));
        guard.allow("b", CommandKind::Think, at(0));
        guard.allow("c", CommandKind::Think, at(0));
        assert_eq!(guard.len(), 2);
        // The oldest entry was forgotten, so "a" is admitted again.
        assert!(guard.allow("a", CommandKind::Think, at(1)).is_allowed());
    }

    #[test]
    fn test_reset_clears_user() {
        let guard = guard();
        guard.allow("u", CommandKind::Think, at(0));
        guard.reset("u");
        assert!(guard.allow("u", CommandKind::Think, at(1)).is_allowed());
    }
}
