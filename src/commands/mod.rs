use crate::{
    db::DbPool, errors::ServiceError, events::EventSender, retry::RetryConfig,
    services::settings::InventorySettingsService,
};
use async_trait::async_trait;
use sea_orm::TransactionError;
use std::sync::Arc;

pub mod inventory;

/// Dependencies handed to every command execution.
#[derive(Clone)]
pub struct CommandContext {
    pub db: Arc<DbPool>,
    pub event_sender: EventSender,
    pub settings: Arc<InventorySettingsService>,
    pub retry: RetryConfig,
}

/// Command trait for implementing the Command Pattern.
///
/// Encapsulates the logic of one business operation into an object that can
/// be validated, executed, and produce events.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    /// Execute the command with the given dependencies
    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError>;
}

/// Flattens sea-orm's transaction error wrapper back into `ServiceError`.
pub(crate) fn unwrap_transaction_error(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}

/// Label used for failure counters, keyed by error variant.
pub(crate) fn error_label(err: &ServiceError) -> &'static str {
    match err {
        ServiceError::NotFound(_) | ServiceError::OrganizationMismatch(_) => "not_found",
        ServiceError::InvalidInput(_) | ServiceError::ValidationError(_) => "validation_error",
        ServiceError::InvalidMovementType(_) => "invalid_movement_type",
        ServiceError::InsufficientStock(_) => "insufficient_stock",
        ServiceError::Conflict(_) => "conflict",
        ServiceError::DatabaseError(_) => "database_error",
        ServiceError::EventError(_) => "event_error",
        ServiceError::InternalError(_) => "internal_error",
    }
}
