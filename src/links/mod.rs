//! Link provisioning module
//!
//! This module handles everything between a resource id and its access link:
//! - The external link-issuing API contract and its HTTP adapter
//! - The process-wide rate budget and throttle back-off for outbound calls
//! - The TTL-backed link cache
//! - Classification of API failures and pruning of dead resources
//! - The provisioning flow tying these together

mod api;
mod budget;
mod cache;
mod classifier;
mod http;
mod provisioner;
mod throttle;

pub use api::{ApiError, ApiResult, ExternalApi};
pub use budget::{BudgetPermit, RateBudget};
pub use cache::LinkCache;
pub use classifier::{classify, Disposition, PruneReason, Pruner, Signal};
pub use http::{HttpApi, DEFAULT_THROTTLE_WAIT};
pub use provisioner::{LinkProvisioner, ProvisionOutcome};
pub use throttle::ThrottledCaller;
