// ==========================================
// 提货单流转系统 - 提货单 API
// ==========================================
// 职责: 解析凭据与请求参数 → 调用引擎/查询 → 返回视图或结构化错误
// 说明: 写操作成功后返回最新的完整视图（历史最新在前）
// ==========================================

use crate::api::auth::{ActorResolver, Credentials};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::delivery_order::NewDeliveryOrder;
use crate::domain::history::WorkflowHistoryEntry;
use crate::domain::issue::Issue;
use crate::domain::types::{ApprovalParty, DoStatus, IssueCategory, Role};
use crate::engine::workflow::WorkflowEngine;
use crate::query::{DeliveryOrderQuery, DeliveryOrderSummary, DeliveryOrderView, ListFilter};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 创建请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateDeliveryOrderRequest {
    pub do_number: String,
    pub party_id: String,
    pub authorized_person: String,
    /// "YYYY-MM-DD"、"YYYY-MM-DD HH:MM:SS" 或 "YYYY-MM-DDTHH:MM:SS"
    pub valid_to: Option<String>,
    pub notes: Option<String>,
}

/// 列表请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListDeliveryOrdersRequest {
    pub statuses: Option<Vec<String>>,
    pub number_contains: Option<String>,
    pub limit: Option<u32>,
}

// ==========================================
// DeliveryOrderApi - 提货单API
// ==========================================
pub struct DeliveryOrderApi {
    engine: Arc<WorkflowEngine>,
    query: Arc<DeliveryOrderQuery>,
    resolver: Arc<dyn ActorResolver>,
}

impl DeliveryOrderApi {
    pub fn new(
        engine: Arc<WorkflowEngine>,
        query: Arc<DeliveryOrderQuery>,
        resolver: Arc<dyn ActorResolver>,
    ) -> Self {
        Self {
            engine,
            query,
            resolver,
        }
    }

    pub fn create(
        &self,
        credentials: &Credentials,
        request: CreateDeliveryOrderRequest,
    ) -> ApiResult<DeliveryOrderView> {
        let actor = self.resolver.resolve_actor(credentials)?;
        let valid_to = request
            .valid_to
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_valid_to)
            .transpose()?;

        let order = self.engine.create(
            &actor,
            NewDeliveryOrder {
                do_number: request.do_number,
                party_id: request.party_id,
                authorized_person: request.authorized_person,
                valid_to,
                notes: request.notes,
            },
        )?;
        Ok(self.query.get(&actor, &order.do_id)?)
    }

    pub fn forward(
        &self,
        credentials: &Credentials,
        do_id: &str,
        to_status: &str,
        notes: Option<String>,
    ) -> ApiResult<DeliveryOrderView> {
        let actor = self.resolver.resolve_actor(credentials)?;
        let to = parse_status(to_status)?;
        self.engine.forward(&actor, do_id, to, notes)?;
        Ok(self.query.get(&actor, do_id)?)
    }

    pub fn receive(&self, credentials: &Credentials, do_id: &str) -> ApiResult<DeliveryOrderView> {
        let actor = self.resolver.resolve_actor(credentials)?;
        self.engine.receive(&actor, do_id)?;
        Ok(self.query.get(&actor, do_id)?)
    }

    /// 审批；`party` 为 "PROJECT_OFFICE" 或 "CISF"
    pub fn approve(
        &self,
        credentials: &Credentials,
        do_id: &str,
        party: &str,
        notes: Option<String>,
    ) -> ApiResult<DeliveryOrderView> {
        let actor = self.resolver.resolve_actor(credentials)?;
        let party = Role::parse(party)
            .and_then(ApprovalParty::from_role)
            .ok_or_else(|| ApiError::InvalidInput(format!("未知审批方: {}", party)))?;
        self.engine.approve(&actor, do_id, party, notes)?;
        Ok(self.query.get(&actor, do_id)?)
    }

    pub fn forward_to_road_sale(
        &self,
        credentials: &Credentials,
        do_id: &str,
        notes: Option<String>,
    ) -> ApiResult<DeliveryOrderView> {
        let actor = self.resolver.resolve_actor(credentials)?;
        self.engine.forward_to_road_sale(&actor, do_id, notes)?;
        Ok(self.query.get(&actor, do_id)?)
    }

    pub fn report_issue(
        &self,
        credentials: &Credentials,
        do_id: &str,
        category: &str,
        description: &str,
    ) -> ApiResult<DeliveryOrderView> {
        let actor = self.resolver.resolve_actor(credentials)?;
        let category = IssueCategory::parse(category)
            .ok_or_else(|| ApiError::InvalidInput(format!("未知问题类别: {}", category)))?;
        self.engine.report_issue(&actor, do_id, category, description)?;
        Ok(self.query.get(&actor, do_id)?)
    }

    pub fn resolve_issue(
        &self,
        credentials: &Credentials,
        issue_id: &str,
        resolution: &str,
    ) -> ApiResult<DeliveryOrderView> {
        let actor = self.resolver.resolve_actor(credentials)?;
        let issue = self.engine.resolve_issue(&actor, issue_id, resolution)?;
        Ok(self.query.get(&actor, &issue.do_id)?)
    }

    pub fn delete(&self, credentials: &Credentials, do_id: &str) -> ApiResult<()> {
        let actor = self.resolver.resolve_actor(credentials)?;
        Ok(self.engine.delete(&actor, do_id)?)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get(&self, credentials: &Credentials, do_id: &str) -> ApiResult<DeliveryOrderView> {
        let actor = self.resolver.resolve_actor(credentials)?;
        Ok(self.query.get(&actor, do_id)?)
    }

    pub fn list(
        &self,
        credentials: &Credentials,
        request: &ListDeliveryOrdersRequest,
    ) -> ApiResult<Vec<DeliveryOrderSummary>> {
        let actor = self.resolver.resolve_actor(credentials)?;
        let statuses = match &request.statuses {
            Some(raw) => Some(raw.iter().map(|s| parse_status(s)).collect::<ApiResult<Vec<_>>>()?),
            None => None,
        };
        let filter = ListFilter {
            statuses,
            number_contains: request.number_contains.clone(),
            limit: request.limit,
        };
        Ok(self.query.list(&actor, &filter)?)
    }

    pub fn history(&self, credentials: &Credentials, do_id: &str) -> ApiResult<Vec<WorkflowHistoryEntry>> {
        let actor = self.resolver.resolve_actor(credentials)?;
        Ok(self.query.history(&actor, do_id)?)
    }

    pub fn issues(
        &self,
        credentials: &Credentials,
        do_id: &str,
        only_open: bool,
    ) -> ApiResult<Vec<Issue>> {
        let actor = self.resolver.resolve_actor(credentials)?;
        Ok(self.query.issues(&actor, do_id, only_open)?)
    }
}

fn parse_status(raw: &str) -> ApiResult<DoStatus> {
    DoStatus::parse(&raw.trim().to_lowercase())
        .ok_or_else(|| ApiError::InvalidInput(format!("未知状态: {}", raw)))
}

/// 解析有效期截止时间；仅日期时取当天 23:59:59
fn parse_valid_to(raw: &str) -> ApiResult<NaiveDateTime> {
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .ok_or_else(|| ApiError::InvalidInput(format!("valid_to 格式无效: {}", raw)))
}
