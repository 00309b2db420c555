// ==========================================
// 提货单流转系统 - 问题闸门
// ==========================================
// 存在 OPEN 问题时，所有推进类操作一律拒绝
// 必须在写事务内调用，读写同一快照
// ==========================================

use crate::engine::error::{WorkflowError, WorkflowResult};
use crate::repository::issue_repo::IssueRepository;
use rusqlite::Connection;

/// 按未解决问题数判断
pub fn check(do_id: &str, open_count: i64) -> WorkflowResult<()> {
    if open_count > 0 {
        return Err(WorkflowError::IssuesOpen {
            do_id: do_id.to_string(),
            open_count,
        });
    }
    Ok(())
}

/// 读取未解决问题数并判断
pub fn ensure_no_open_issues(conn: &Connection, do_id: &str) -> WorkflowResult<()> {
    let open_count = IssueRepository::new(conn).count_open(do_id)?;
    check(do_id, open_count)
}
