//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use guildtune_core::error::AppError;
use guildtune_core::port::LocateError;
use jsonrpsee::types::ErrorObjectOwned;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const THROTTLED: i32 = 4003;
    pub const QUEUE_FULL: i32 = 4004;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SYSTEM_ERROR: i32 = 5002;
}

/// Error returned when the rate limiter refuses a call
pub fn throttled() -> ErrorObjectOwned {
    ErrorObjectOwned::owned(
        code::THROTTLED,
        "Rate limit exceeded. Please slow down.",
        None::<()>,
    )
}

/// Convert AppError to JSON-RPC ErrorObject
///
/// The message is the same text the requester's channel receives.
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let message = err.user_message();
    let code = match &err {
        AppError::Validation(_) | AppError::Domain(_) => code::VALIDATION_ERROR,
        AppError::QueueFull(_) => code::QUEUE_FULL,
        AppError::Locate(LocateError::NotFound) => code::NOT_FOUND,
        AppError::Locate(_)
        | AppError::Resolve(_)
        | AppError::Convert(_)
        | AppError::Asset(_)
        | AppError::Setup(_)
        | AppError::Io(_) => code::SYSTEM_ERROR,
        AppError::Config(_) | AppError::Internal(_) => code::INTERNAL_ERROR,
    };
    ErrorObjectOwned::owned(code, message, None::<()>)
}
