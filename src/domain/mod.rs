// ==========================================
// 提货单流转系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod delivery_order;
pub mod history;
pub mod issue;
pub mod party;
pub mod types;
pub mod user;

// 重导出核心类型
pub use delivery_order::{ApprovalState, DeliveryOrder, NewDeliveryOrder};
pub use history::WorkflowHistoryEntry;
pub use issue::Issue;
pub use party::Party;
pub use types::{ApprovalParty, DoStatus, IssueCategory, IssueStatus, Operation, Role};
pub use user::{Actor, User};
