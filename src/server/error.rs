// API 错误响应

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::{error, warn};

use crate::filesystem::{FsError, FsErrorCode};

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    /// 与 HTTP 状态码一致
    pub code: u16,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            code: status.as_u16(),
        }
    }
}

/// 错误码 -> HTTP 状态码
pub fn status_for(code: FsErrorCode) -> StatusCode {
    match code {
        FsErrorCode::InvalidPath => StatusCode::BAD_REQUEST,
        FsErrorCode::MissingParameter => StatusCode::BAD_REQUEST,
        FsErrorCode::NotADirectory => StatusCode::BAD_REQUEST,
        FsErrorCode::IsADirectory => StatusCode::BAD_REQUEST,
        FsErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
        FsErrorCode::NotFound => StatusCode::NOT_FOUND,
        FsErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        FsErrorCode::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        FsErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for FsError {
    fn into_response(self) -> axum::response::Response {
        let status = status_for(self.code);

        // 内部错误不向客户端暴露细节
        let message = if status.is_server_error() {
            error!("请求处理失败: {}", self);
            self.code.message().to_string()
        } else {
            warn!("请求被拒绝 ({}): {}", status.as_u16(), self);
            self.message
        };

        (status, Json(ErrorBody::new(status, message))).into_response()
    }
}
