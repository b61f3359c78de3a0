//! Amazon SQS work source implementation.

use async_trait::async_trait;
use aws_config::{retry::RetryConfig, BehaviorVersion};
use aws_sdk_sqs::config::Region;
use aws_sdk_sqs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sqs::Client;
use chrono::Utc;
use tracing::{debug, warn};

use crate::config::QueueConfig;

use super::{Batch, Trigger, WorkSource, WorkSourceError};

/// Service error codes that no amount of waiting will fix.
const PERMANENT_ERROR_CODES: &[&str] = &[
    "AWS.SimpleQueueService.NonExistentQueue",
    "QueueDoesNotExist",
    "AccessDenied",
    "AccessDeniedException",
    "InvalidAddress",
    "InvalidClientTokenId",
    "InvalidSecurity",
    "UnrecognizedClientException",
    "SignatureDoesNotMatch",
    "IncompleteSignature",
    "MissingParameter",
    "InvalidParameterValue",
    "KmsAccessDenied",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorClass {
    Transient,
    Permanent,
}

/// Work source backed by an SQS queue with long polling.
pub struct SqsWorkSource {
    client: Client,
    config: QueueConfig,
}

impl SqsWorkSource {
    /// Create a work source from an existing SQS client.
    pub fn new(client: Client, config: QueueConfig) -> Self {
        Self { client, config }
    }

    /// Create a work source, resolving credentials and region from the config.
    pub async fn from_config(config: QueueConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(RetryConfig::standard().with_max_attempts(config.sdk_max_attempts));

        if !config.profile.is_empty() {
            loader = loader.profile_name(&config.profile);
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let shared = loader.load().await;
        Self::new(Client::new(&shared), config)
    }

    pub fn queue_url(&self) -> &str {
        &self.config.url
    }
}

#[async_trait]
impl WorkSource for SqsWorkSource {
    fn name(&self) -> &str {
        "sqs"
    }

    async fn poll(&self) -> Result<Batch, WorkSourceError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.config.url)
            .max_number_of_messages(self.config.max_messages)
            .wait_time_seconds(self.config.wait_time_secs)
            .send()
            .await
            .map_err(|e| {
                let reason = DisplayErrorContext(&e).to_string();
                match classify(&e, &reason) {
                    ErrorClass::Transient => WorkSourceError::transient(reason),
                    ErrorClass::Permanent => WorkSourceError::permanent(reason),
                }
            })?;

        let received_at = Utc::now();
        let batch: Batch = output
            .messages()
            .iter()
            .filter_map(|message| {
                let Some(receipt) = message.receipt_handle() else {
                    warn!(
                        message_id = ?message.message_id(),
                        "Skipping SQS message without receipt handle"
                    );
                    return None;
                };
                Some(Trigger {
                    id: message.message_id().unwrap_or(receipt).to_string(),
                    receipt: receipt.to_string(),
                    body: message.body().map(str::to_string),
                    received_at,
                })
            })
            .collect();

        if !batch.is_empty() {
            debug!(count = batch.len(), ids = ?batch.ids(), "Received triggers from SQS");
        }

        Ok(batch)
    }

    async fn acknowledge(&self, trigger: &Trigger) -> Result<(), WorkSourceError> {
        self.client
            .delete_message()
            .queue_url(&self.config.url)
            .receipt_handle(&trigger.receipt)
            .send()
            .await
            .map_err(|e| {
                WorkSourceError::acknowledge_failed(&trigger.id, DisplayErrorContext(&e).to_string())
            })?;

        debug!(trigger_id = %trigger.id, "Deleted SQS message");
        Ok(())
    }
}

fn classify<E, R>(err: &SdkError<E, R>, message: &str) -> ErrorClass
where
    E: ProvideErrorMetadata,
{
    if is_connection_reset(message) {
        return ErrorClass::Transient;
    }

    match err {
        SdkError::ConstructionFailure(_) => ErrorClass::Permanent,
        SdkError::ServiceError(context) => classify_service_code(context.err().code()),
        _ => ErrorClass::Transient,
    }
}

fn classify_service_code(code: Option<&str>) -> ErrorClass {
    match code {
        Some(code) if PERMANENT_ERROR_CODES.contains(&code) => ErrorClass::Permanent,
        _ => ErrorClass::Transient,
    }
}

fn is_connection_reset(message: &str) -> bool {
    message.to_ascii_lowercase().contains("connection reset")
}
