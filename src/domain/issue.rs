// ==========================================
// 提货单流转系统 - 问题领域模型
// ==========================================
// 对齐: issue 表
// 红线: RESOLVED 之后不可再修改
// ==========================================

use crate::domain::types::{IssueCategory, IssueStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub issue_id: String,
    pub do_id: String,
    pub category: IssueCategory,
    pub description: String,
    pub status: IssueStatus,
    pub reported_by: String,
    pub resolution: Option<String>,
    pub resolved_by: Option<String>,
    pub created_at: NaiveDateTime,
    pub resolved_at: Option<NaiveDateTime>,
}

impl Issue {
    pub fn is_open(&self) -> bool {
        self.status == IssueStatus::Open
    }
}
