//! Outbound API calls under the rate budget
//!
//! Every attempt holds one budget slot for the duration of the call only.
//! Throttle signals are waited out (`wait + margin`) and retried without
//! limit; any other failure comes back already classified, so throttling
//! never reaches the pruner.

use crate::clock::Clock;
use crate::links::{classify, ApiResult, Disposition, RateBudget, Signal};
use crate::ChanfindError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Runs external calls with a budget slot each and throttle back-off
#[derive(Clone)]
pub struct ThrottledCaller {
    budget: RateBudget,
    clock: Arc<dyn Clock>,
    margin: Duration,
}

impl ThrottledCaller {
    /// `margin` is added on top of every throttle wait
    pub fn new(budget: RateBudget, clock: Arc<dyn Clock>, margin: Duration) -> Self {
        Self {
            budget,
            clock,
            margin,
        }
    }

    pub fn budget(&self) -> &RateBudget {
        &self.budget
    }

    /// Calls `op` until it succeeds or fails with something other than throttling
    ///
    /// # Returns
    ///
    /// * `Ok(Ok(value))` - The call succeeded
    /// * `Ok(Err(disposition))` - The call failed; the failure is classified
    /// * `Err(ChanfindError::BudgetClosed)` - No slot can ever be acquired
    pub async fn call<T, F, Fut>(
        &self,
        operation: &str,
        resource_id: &str,
        mut op: F,
    ) -> Result<Result<T, Disposition>, ChanfindError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        loop {
            let result = {
                let _permit = self.budget.acquire().await?;
                op().await
            };

            let error = match result {
                Ok(value) => return Ok(Ok(value)),
                Err(e) => e,
            };

            match classify(&error) {
                Signal::Throttled { wait } => {
                    let backoff = wait + self.margin;
                    tracing::warn!(
                        "Throttled during {} for {}; retrying in {:?}",
                        operation,
                        resource_id,
                        backoff
                    );
                    self.clock.sleep(backoff).await;
                }
                Signal::Settled(disposition) => {
                    tracing::debug!("{} for {} failed: {}", operation, resource_id, error);
                    return Ok(Err(disposition));
                }
            }
        }
    }
}
