// ==========================================
// 提货单流转系统 - 应用层
// ==========================================
// 职责: 组件装配
// ==========================================

pub mod state;

// 重导出
pub use state::AppState;
