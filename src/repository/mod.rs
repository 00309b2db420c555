// ==========================================
// 提货单流转系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 事务: 仓储绑定到 &Connection，由引擎在同一事务中组合使用
// ==========================================

pub mod delivery_order_repo;
pub mod error;
pub mod history_repo;
pub mod issue_repo;
pub mod notification_repo;
pub mod party_repo;
pub mod user_repo;

// 重导出核心仓储
pub use delivery_order_repo::{DeliveryOrderFilter, DeliveryOrderRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use history_repo::WorkflowHistoryRepository;
pub use issue_repo::IssueRepository;
pub use notification_repo::{NotificationOutboxRepository, OutboxCounts, OutboxRecord, OutboxStatus};
pub use party_repo::{PartyDirectory, PartyRepository};
pub use user_repo::UserRepository;

/// 行映射用：把字符串列解析为封闭枚举
pub(crate) fn enum_column<T>(
    idx: usize,
    raw: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    parse(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("未知枚举值: {}", raw).into(),
        )
    })
}
