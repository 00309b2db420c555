// ==========================================
// 提货单流转系统 - 操作人解析
// ==========================================
// 认证由外部完成；此处只把请求凭据解析为操作人上下文
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::db::SharedConnection;
use crate::domain::user::Actor;
use crate::repository::error::RepositoryError;
use crate::repository::user_repo::UserRepository;
use serde::{Deserialize, Serialize};

/// 请求凭据
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// 已由网关验证的用户 ID
    pub bearer: Option<String>,
}

impl Credentials {
    pub fn bearer(user_id: impl Into<String>) -> Self {
        Self {
            bearer: Some(user_id.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { bearer: None }
    }
}

/// 操作人解析接口
pub trait ActorResolver: Send + Sync {
    fn resolve_actor(&self, credentials: &Credentials) -> ApiResult<Actor>;
}

/// 基于 app_user 表的解析器
pub struct UserTableResolver {
    conn: SharedConnection,
}

impl UserTableResolver {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

impl ActorResolver for UserTableResolver {
    fn resolve_actor(&self, credentials: &Credentials) -> ApiResult<Actor> {
        let user_id = credentials
            .bearer
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::Unauthenticated("缺少凭据".to_string()))?;

        let user = {
            let conn = self
                .conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            UserRepository::new(&conn).find_by_id(user_id)?
        };

        match user {
            Some(user) if user.is_active => Ok(Actor::from(&user)),
            Some(_) => {
                tracing::warn!(user_id, "停用用户尝试访问");
                Err(ApiError::Unauthenticated(format!("用户已停用: {}", user_id)))
            }
            None => Err(ApiError::Unauthenticated(format!("未知用户: {}", user_id))),
        }
    }
}
