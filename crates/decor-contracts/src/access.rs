use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time view of whether the caller may spend a generation credit.
/// Owned by the subscription backend; this crate only reads snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementStatus {
    Entitled,
    NotEntitled,
}

impl EntitlementStatus {
    pub fn is_entitled(self) -> bool {
        matches!(self, EntitlementStatus::Entitled)
    }
}

impl From<bool> for EntitlementStatus {
    fn from(entitled: bool) -> Self {
        if entitled {
            EntitlementStatus::Entitled
        } else {
            EntitlementStatus::NotEntitled
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("an active subscription is required to generate designs; subscribe to continue")]
pub struct AccessDenied;

pub fn ensure_entitled(status: EntitlementStatus) -> Result<(), AccessDenied> {
    if status.is_entitled() {
        Ok(())
    } else {
        Err(AccessDenied)
    }
}

/// Live entitlement state. Every call returns a fresh snapshot.
pub trait EntitlementSource: Send + Sync {
    fn snapshot(&self) -> EntitlementStatus;
}

impl EntitlementSource for EntitlementStatus {
    fn snapshot(&self) -> EntitlementStatus {
        *self
    }
}

impl<F> EntitlementSource for F
where
    F: Fn() -> EntitlementStatus + Send + Sync,
{
    fn snapshot(&self) -> EntitlementStatus {
        self()
    }
}

impl EntitlementSource for AtomicBool {
    fn snapshot(&self) -> EntitlementStatus {
        EntitlementStatus::from(self.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn not_entitled_is_denied() {
        assert_eq!(ensure_entitled(EntitlementStatus::NotEntitled), Err(AccessDenied));
        assert!(AccessDenied.to_string().contains("subscribe"));
    }

    #[test]
    fn entitled_passes() {
        assert_eq!(ensure_entitled(EntitlementStatus::Entitled), Ok(()));
    }

    #[test]
    fn atomic_source_reflects_latest_value() {
        let flag = AtomicBool::new(true);
        assert_eq!(flag.snapshot(), EntitlementStatus::Entitled);
        flag.store(false, Ordering::Release);
        assert_eq!(flag.snapshot(), EntitlementStatus::NotEntitled);
    }

    #[test]
    fn closure_source_is_called_for_every_snapshot() {
        let calls = AtomicUsize::new(0);
        let source = || {
            let seen = calls.fetch_add(1, Ordering::SeqCst);
            EntitlementStatus::from(seen < 1)
        };
        let dynamic: &dyn EntitlementSource = &source;
        assert_eq!(dynamic.snapshot(), EntitlementStatus::Entitled);
        assert_eq!(dynamic.snapshot(), EntitlementStatus::NotEntitled);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
