//! Process-wide limiter for outbound link requests

use crate::ChanfindError;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting limiter capping concurrent outbound link-issuing calls
///
/// Cloning shares the same underlying budget.
#[derive(Debug, Clone)]
pub struct RateBudget {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// One acquired slot; released when dropped
#[derive(Debug)]
pub struct BudgetPermit {
    _permit: OwnedSemaphorePermit,
}

impl RateBudget {
    /// Creates a budget with `capacity` slots (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits until a slot is free and takes it
    pub async fn acquire(&self) -> Result<BudgetPermit, ChanfindError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ChanfindError::BudgetClosed)?;
        Ok(BudgetPermit { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        assert_eq!(RateBudget::new(0).capacity(), 1);
    }

    #[tokio::test]
    async fn test_permit_released_on_drop() {
        let budget = RateBudget::new(2);
        let first = budget.acquire().await.unwrap();
        let _second = budget.acquire().await.unwrap();
        assert_eq!(budget.available(), 0);

        drop(first);
        assert_eq!(budget.available(), 1);
    }

    #[tokio::test]
    async fn test_acquire_waits_for_free_slot() {
        let budget = RateBudget::new(1);
        let held = budget.acquire().await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), budget.acquire()).await;
        assert!(blocked.is_err(), "acquire should wait while the slot is held");

        drop(held);
        let granted = tokio::time::timeout(Duration::from_millis(50), budget.acquire()).await;
        assert!(granted.is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_slots() {
        let budget = RateBudget::new(3);
        let other = budget.clone();
        let _permit = other.acquire().await.unwrap();
        assert_eq!(budget.available(), 2);
    }
}
