// ==========================================
// 提货单流转系统 - 读侧视图
// ==========================================
// 显式的读侧组装：提货单 + 收货单位 + 问题 + 历史
// 写路径不依赖这些视图
// ==========================================

use crate::domain::delivery_order::{ApprovalState, DeliveryOrder};
use crate::domain::history::WorkflowHistoryEntry;
use crate::domain::issue::Issue;
use crate::domain::party::Party;
use crate::repository::error::RepositoryResult;
use crate::repository::history_repo::WorkflowHistoryRepository;
use crate::repository::issue_repo::IssueRepository;
use crate::repository::party_repo::PartyRepository;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 提货单完整视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOrderView {
    pub order: DeliveryOrder,
    pub party: Option<Party>,
    pub issues: Vec<Issue>,             // 最新在前
    pub history: Vec<WorkflowHistoryEntry>, // 最新在前
    pub approval: ApprovalState,
    pub open_issue_count: i64,
}

impl DeliveryOrderView {
    pub fn has_open_issues(&self) -> bool {
        self.open_issue_count > 0
    }
}

/// 列表行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOrderSummary {
    pub order: DeliveryOrder,
    pub party_name: Option<String>,
    pub open_issue_count: i64,
}

/// 组装单条视图
pub fn assemble_view(conn: &Connection, order: DeliveryOrder) -> RepositoryResult<DeliveryOrderView> {
    let party = PartyRepository::new(conn).find_by_id(&order.party_id)?;
    let issues = IssueRepository::new(conn).list_by_do(&order.do_id, false)?;
    let history = WorkflowHistoryRepository::new(conn).list_by_do(&order.do_id)?;
    let open_issue_count = issues.iter().filter(|i| i.is_open()).count() as i64;

    Ok(DeliveryOrderView {
        approval: order.approval(),
        order,
        party,
        issues,
        history,
        open_issue_count,
    })
}

/// 组装列表行（收货单位按 id 缓存）
pub fn assemble_summaries(
    conn: &Connection,
    orders: Vec<DeliveryOrder>,
) -> RepositoryResult<Vec<DeliveryOrderSummary>> {
    let parties = PartyRepository::new(conn);
    let issues = IssueRepository::new(conn);
    let mut party_names: HashMap<String, Option<String>> = HashMap::new();
    let mut summaries = Vec::with_capacity(orders.len());

    for order in orders {
        let party_name = match party_names.get(&order.party_id) {
            Some(name) => name.clone(),
            None => {
                let name = parties.find_by_id(&order.party_id)?.map(|p| p.name);
                party_names.insert(order.party_id.clone(), name.clone());
                name
            }
        };
        let open_issue_count = issues.count_open(&order.do_id)?;
        summaries.push(DeliveryOrderSummary {
            order,
            party_name,
            open_issue_count,
        });
    }
    Ok(summaries)
}
