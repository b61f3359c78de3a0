//! Work source: where capture triggers come from.
//!
//! A [`WorkSource`] hands out batches of pending [`Trigger`]s and removes them
//! once the capture they asked for has been delivered. [`SqsWorkSource`] backs
//! it with an Amazon SQS queue using long polling.

mod error;
mod sqs;
mod traits;
mod types;

pub use error::WorkSourceError;
pub use sqs::SqsWorkSource;
pub use traits::WorkSource;
pub use types::{Batch, Trigger};
