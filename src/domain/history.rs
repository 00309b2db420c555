// ==========================================
// 提货单流转系统 - 流转历史领域模型
// ==========================================
// 对齐: workflow_history 表
// 红线: 只追加，除随早期提货单一并删除外不可更新/删除
// ==========================================

use crate::domain::types::{DoStatus, Operation};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowHistoryEntry {
    pub history_id: String,
    pub do_id: String,
    pub from_status: DoStatus,
    pub to_status: DoStatus,
    pub action: Operation,
    pub actor_id: String,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
}

impl WorkflowHistoryEntry {
    /// 状态未变化的记录（重复审批）
    pub fn is_status_unchanged(&self) -> bool {
        self.from_status == self.to_status
    }
}
