// ==========================================
// 提货单流转系统 - 工作流引擎错误类型
// ==========================================
// 所有错误在引擎边界本地恢复，以结构化错误返回调用方
// 仅 TransientError 可由调用方直接重试
// ==========================================

use crate::domain::types::{DoStatus, Operation, Role};
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 工作流错误
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("无权限: 角色 {role} 不能执行 {operation}")]
    Unauthorized { role: Role, operation: Operation },

    #[error("操作人已停用: {user_id}")]
    InactiveActor { user_id: String },

    #[error("资源未找到: {entity}(id={id})")]
    NotFound { entity: String, id: String },

    #[error("非法状态流转: from={from} to={to}")]
    InvalidTransition { from: DoStatus, to: DoStatus },

    #[error("存在未解决问题，禁止流转: do_id={do_id}, open_issues={open_count}")]
    IssuesOpen { do_id: String, open_count: i64 },

    #[error("双审批未完成: project_approved={project_approved}, cisf_approved={cisf_approved}")]
    ApprovalIncomplete {
        project_approved: bool,
        cisf_approved: bool,
    },

    #[error("提货单号已存在: {0}")]
    DuplicateNumber(String),

    #[error("状态不允许该操作: status={status}, {message}")]
    InvalidState { status: DoStatus, message: String },

    #[error("提货单已有流转历史，不能删除: do_id={do_id}, history_entries={entries}")]
    HasHistory { do_id: String, entries: i64 },

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("存储暂时不可用，可重试: {0}")]
    TransientError(String),

    #[error("存储错误: {0}")]
    Storage(String),
}

/// 错误类别（对外稳定的错误码）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    InvalidTransition,
    IssuesOpen,
    ApprovalIncomplete,
    DuplicateNumber,
    InvalidState,
    HasHistory,
    ValidationError,
    TransientError,
    StorageError,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InvalidTransition => "INVALID_TRANSITION",
            ErrorKind::IssuesOpen => "ISSUES_OPEN",
            ErrorKind::ApprovalIncomplete => "APPROVAL_INCOMPLETE",
            ErrorKind::DuplicateNumber => "DUPLICATE_NUMBER",
            ErrorKind::InvalidState => "INVALID_STATE",
            ErrorKind::HasHistory => "HAS_HISTORY",
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::TransientError => "TRANSIENT_ERROR",
            ErrorKind::StorageError => "STORAGE_ERROR",
        }
    }
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::Unauthorized { .. } | WorkflowError::InactiveActor { .. } => {
                ErrorKind::Unauthorized
            }
            WorkflowError::NotFound { .. } => ErrorKind::NotFound,
            WorkflowError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            WorkflowError::IssuesOpen { .. } => ErrorKind::IssuesOpen,
            WorkflowError::ApprovalIncomplete { .. } => ErrorKind::ApprovalIncomplete,
            WorkflowError::DuplicateNumber(_) => ErrorKind::DuplicateNumber,
            WorkflowError::InvalidState { .. } => ErrorKind::InvalidState,
            WorkflowError::HasHistory { .. } => ErrorKind::HasHistory,
            WorkflowError::ValidationError(_) => ErrorKind::ValidationError,
            WorkflowError::TransientError(_) => ErrorKind::TransientError,
            WorkflowError::Storage(_) => ErrorKind::StorageError,
        }
    }

    /// 调用方可直接重试（输入不变）
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkflowError::TransientError(_))
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        WorkflowError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for WorkflowError {
    fn from(err: RepositoryError) -> Self {
        if err.is_transient() {
            return WorkflowError::TransientError(err.to_string());
        }
        match err {
            RepositoryError::NotFound { entity, id } => WorkflowError::NotFound { entity, id },
            // 业务表上唯一约束只有 do_number
            RepositoryError::UniqueConstraintViolation(msg) => WorkflowError::DuplicateNumber(msg),
            RepositoryError::ForeignKeyViolation(msg) => {
                WorkflowError::ValidationError(format!("引用的记录不存在: {}", msg))
            }
            other => WorkflowError::Storage(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let err: WorkflowError = RepositoryError::Busy("database is locked".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::TransientError);
        assert!(err.is_retryable());

        let err: WorkflowError = RepositoryError::OptimisticLockFailure {
            entity: "DeliveryOrder".to_string(),
            id: "d1".to_string(),
            expected: 1,
            actual: 2,
        }
        .into();
        assert!(err.is_retryable());

        let err: WorkflowError = RepositoryError::not_found("Party", "p9").into();
        match err {
            WorkflowError::NotFound { entity, id } => {
                assert_eq!(entity, "Party");
                assert_eq!(id, "p9");
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }

        let err: WorkflowError =
            RepositoryError::UniqueConstraintViolation("delivery_order.do_number".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::DuplicateNumber);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_inactive_actor_is_unauthorized_kind() {
        let err = WorkflowError::InactiveActor {
            user_id: "u1".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.kind().code(), "UNAUTHORIZED");
    }
}
