// ==========================================
// 提货单流转系统 - 用户与操作人
// ==========================================
// 工作流引擎不做认证，只按角色授权
// ==========================================

use crate::domain::types::Role;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 用户（由外部管理模块维护）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

/// 已认证的操作人上下文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
    pub is_active: bool,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            is_active: true,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.clone(),
            role: user.role,
            is_active: user.is_active,
        }
    }
}
