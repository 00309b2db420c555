// ==========================================
// 提货单流转系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，渲染为结构化错误响应
// 约束: 所有错误都可序列化返回，调用方据 code 分支
// ==========================================

use crate::engine::error::WorkflowError;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("未认证: {0}")]
    Unauthenticated(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        ApiError::Workflow(WorkflowError::from(err))
    }
}

/// 错误响应结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,

    /// 详细信息（可选）
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::InvalidInput(_) => "VALIDATION_ERROR",
            ApiError::Workflow(err) => err.kind().code(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Workflow(err) if err.is_retryable())
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    /// 转换为JSON字符串
    pub fn to_json(&self) -> String {
        let response = self.to_response();
        serde_json::to_string(&response).unwrap_or_else(|_| {
            format!(r#"{{"code":"{}","message":"错误序列化失败","details":null}}"#, response.code)
        })
    }

    fn details(&self) -> Option<serde_json::Value> {
        let ApiError::Workflow(err) = self else {
            return None;
        };
        let details = match err {
            WorkflowError::Unauthorized { role, operation } => {
                json!({ "role": role, "operation": operation })
            }
            WorkflowError::NotFound { entity, id } => json!({ "entity": entity, "id": id }),
            WorkflowError::InvalidTransition { from, to } => json!({ "from": from, "to": to }),
            WorkflowError::IssuesOpen { do_id, open_count } => {
                json!({ "do_id": do_id, "open_count": open_count })
            }
            WorkflowError::ApprovalIncomplete {
                project_approved,
                cisf_approved,
            } => json!({
                "project_approved": project_approved,
                "cisf_approved": cisf_approved,
            }),
            WorkflowError::InvalidState { status, .. } => json!({ "status": status }),
            WorkflowError::HasHistory { do_id, entries } => {
                json!({ "do_id": do_id, "history_entries": entries })
            }
            WorkflowError::TransientError(_) => json!({ "retryable": true }),
            _ => return None,
        };
        Some(details)
    }
}

/// Result类型别名
pub type ApiResult<T> = Result<T, ApiError>;
