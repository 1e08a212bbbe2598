//! Strata async operation worker
//!
//! Owns the operation state machine. A submitted request becomes a tracked,
//! resumable, timeout-bounded unit of work:
//!
//! ```text
//! Accepted ──► Updating ──► Succeeded
//!                  │  └────► Failed
//!                  └───────► Canceled (timeout)
//! ```
//!
//! Each operation runs on its own task; nothing serializes operations against
//! the same resource except the store's entity-tag check at Save time. The
//! flagship business controller is [`CreateOrUpdateResource`], which drives
//! the deployment processor through Render → Deploy → Delete and persists the
//! result.

pub mod controller;
pub mod create_or_update;
pub mod error;
pub mod record;
pub mod request;
pub mod status;
pub mod worker;

pub use controller::{Controller, ControllerRegistry, ControllerResult};
pub use create_or_update::CreateOrUpdateResource;
pub use error::{Result, WorkerError};
pub use record::ResourceRecord;
pub use request::{OperationMethod, OperationType, Request, DEFAULT_OPERATION_TIMEOUT};
pub use status::{codes, AsyncOperationStatus, ErrorDetails, ProvisioningState};
pub use worker::{AsyncOperationWorker, WorkerOptions};
