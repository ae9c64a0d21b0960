//! Errors at the tool dispatch boundary and their wire representation

use serde_json::json;
use thiserror::Error;

use crate::capture::{CaptureError, DeviceClass};
use crate::input::InputError;
use crate::protocol::{ErrorCode, ErrorObject};
use crate::screen::ScreenError;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid arguments: {0}")]
    InvalidParams(String),
    #[error("{device} monitoring unavailable: {source}")]
    PermissionDenied {
        device: DeviceClass,
        #[source]
        source: CaptureError,
    },
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Screen(#[from] ScreenError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ToolError::UnknownTool(_) => ErrorCode::MethodNotFound,
            ToolError::InvalidParams(_) => ErrorCode::InvalidParams,
            ToolError::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            ToolError::Input(InputError::Unencodable { .. } | InputError::UnknownKey(_)) => {
                ErrorCode::InvalidParams
            }
            ToolError::Input(_) | ToolError::Screen(_) => ErrorCode::OperationFailed,
            ToolError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub fn to_error_object(&self) -> ErrorObject {
        let error = ErrorObject::new(self.code(), self.to_string());
        match self {
            ToolError::PermissionDenied { device, .. } => {
                error.with_data(json!({ "device": device }))
            }
            ToolError::Input(InputError::Unencodable { character, index }) => {
                error.with_data(json!({ "character": character.to_string(), "index": index }))
            }
            _ => error,
        }
    }
}
