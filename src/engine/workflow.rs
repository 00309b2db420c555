// ==========================================
// 提货单流转系统 - 工作流引擎
// ==========================================
// 职责: 编排权限表、问题闸门、双审批闸门与流转白名单
// 事务: 每个写操作在单个 BEGIN IMMEDIATE 事务内完成
//       读当前状态 → 校验 → 写状态(乐观锁) + 追加历史 → 提交
// 通知: 事务提交并释放连接后才发布事件
// ==========================================

use crate::config::WorkflowSettings;
use crate::db::SharedConnection;
use crate::domain::delivery_order::{DeliveryOrder, NewDeliveryOrder};
use crate::domain::history::WorkflowHistoryEntry;
use crate::domain::issue::Issue;
use crate::domain::types::{ApprovalParty, DoStatus, IssueCategory, IssueStatus, Operation};
use crate::domain::user::Actor;
use crate::engine::approval_gate;
use crate::engine::capability;
use crate::engine::error::{WorkflowError, WorkflowResult};
use crate::engine::events::{
    NotificationEvent, NotificationEventType, NotificationPublisher, OptionalPublisher,
};
use crate::engine::issue_gate;
use crate::engine::transition;
use crate::query::role_scope;
use crate::repository::delivery_order_repo::DeliveryOrderRepository;
use crate::repository::error::RepositoryError;
use crate::repository::history_repo::WorkflowHistoryRepository;
use crate::repository::issue_repo::IssueRepository;
use crate::repository::party_repo::{PartyDirectory, PartyRepository};
use chrono::{Duration, NaiveDateTime};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// 问题描述/处理结果的最大长度（字符）
const MAX_TEXT_LEN: usize = 2000;

// ==========================================
// WorkflowEngine - 工作流引擎
// ==========================================
pub struct WorkflowEngine {
    conn: SharedConnection,
    settings: WorkflowSettings,
    publisher: OptionalPublisher,
}

/// 校验后的创建参数
struct ValidatedOrder {
    do_number: String,
    party_id: String,
    authorized_person: String,
    valid_to: NaiveDateTime,
    notes: Option<String>,
}

impl WorkflowEngine {
    pub fn new(conn: SharedConnection, settings: WorkflowSettings) -> Self {
        Self {
            conn,
            settings,
            publisher: OptionalPublisher::none(),
        }
    }

    /// 配置通知事件发布者
    pub fn with_publisher(mut self, publisher: Arc<dyn NotificationPublisher>) -> Self {
        self.publisher = OptionalPublisher::with_publisher(publisher);
        self
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    // ==========================================
    // 创建
    // ==========================================

    /// 创建提货单，初始状态 at_area_office
    ///
    /// # 错误
    /// - `Unauthorized`: 非区域办/管理员
    /// - `ValidationError`: 必填字段缺失或有效期非法
    /// - `NotFound`: 收货单位不存在
    /// - `DuplicateNumber`: 提货单号已被占用（不产生任何写入）
    pub fn create(&self, actor: &Actor, input: NewDeliveryOrder) -> WorkflowResult<DeliveryOrder> {
        let op = Operation::Create;
        let result = capability::authorize(actor, op).and_then(|_| {
            let now = now();
            let draft = self.validate_new_order(input, now)?;

            self.in_write_tx(|tx| {
                PartyRepository::new(tx).get_party(&draft.party_id)?;

                let orders = DeliveryOrderRepository::new(tx);
                if orders.number_exists(&draft.do_number)? {
                    return Err(WorkflowError::DuplicateNumber(draft.do_number.clone()));
                }

                let (from, to) = (DoStatus::Created, DoStatus::AtAreaOffice);
                transition::validate(from, to, op)?;

                let order = DeliveryOrder {
                    do_id: Uuid::new_v4().to_string(),
                    do_number: draft.do_number.clone(),
                    party_id: draft.party_id.clone(),
                    authorized_person: draft.authorized_person.clone(),
                    valid_from: now,
                    valid_to: draft.valid_to,
                    status: to,
                    project_approved: false,
                    cisf_approved: false,
                    notes: draft.notes.clone(),
                    created_by: actor.user_id.clone(),
                    created_at: now,
                    updated_at: now,
                    revision: 0,
                };
                orders.insert(&order)?;

                WorkflowHistoryRepository::new(tx).append(&history_entry(
                    &order.do_id,
                    from,
                    to,
                    op,
                    actor,
                    Some("创建提货单".to_string()),
                    now,
                ))?;

                Ok(order)
            })
        });

        let order = result.map_err(|e| log_rejection(e, actor, op, "-"))?;

        tracing::info!(
            do_id = %order.do_id,
            do_number = %order.do_number,
            actor = %actor.user_id,
            "提货单已创建"
        );
        self.publisher.publish_logged(
            &NotificationEvent::new(
                NotificationEventType::DeliveryOrderCreated,
                &order.do_id,
                &order.do_number,
                &actor.user_id,
                order.created_at,
            )
            .with_transition(DoStatus::Created, order.status)
            .with_note(order.notes.clone()),
        );
        Ok(order)
    }

    // ==========================================
    // 推进类操作
    // ==========================================

    /// 通用推进（仅非审批边）
    ///
    /// 审批状态必须通过 `approve` 进入：先按进入该状态的操作校验权限，再报 InvalidTransition。
    pub fn forward(
        &self,
        actor: &Actor,
        do_id: &str,
        to: DoStatus,
        notes: Option<String>,
    ) -> WorkflowResult<DeliveryOrder> {
        match transition::forward_operation_for(to) {
            Some(op) => self.advance(actor, do_id, op, to, notes),
            None => {
                let from = capability::authorize_any(actor, &transition::operations_into(to))
                    .and_then(|_| {
                        let conn = self.lock_conn()?;
                        Ok(load_visible(&conn, actor, do_id)?.status)
                    });
                let err = match from {
                    Ok(from) => WorkflowError::InvalidTransition { from, to },
                    Err(e) => e,
                };
                Err(log_rejection(err, actor, "FORWARD", do_id))
            }
        }
    }

    /// 项目办接收
    pub fn receive(&self, actor: &Actor, do_id: &str) -> WorkflowResult<DeliveryOrder> {
        self.advance(
            actor,
            do_id,
            Operation::Receive,
            DoStatus::ReceivedAtProjectOffice,
            None,
        )
    }

    /// 转入路销（需双审批完成）
    pub fn forward_to_road_sale(
        &self,
        actor: &Actor,
        do_id: &str,
        notes: Option<String>,
    ) -> WorkflowResult<DeliveryOrder> {
        self.advance(
            actor,
            do_id,
            Operation::ForwardToRoadSale,
            DoStatus::AtRoadSale,
            notes,
        )
    }

    /// 推进到目标状态
    ///
    /// 校验顺序: 权限 → 可见性 → 终态 → 问题闸门 → 双审批(仅路销) → 白名单
    fn advance(
        &self,
        actor: &Actor,
        do_id: &str,
        op: Operation,
        to: DoStatus,
        notes: Option<String>,
    ) -> WorkflowResult<DeliveryOrder> {
        let notes = normalize_optional(notes);
        let now = now();

        let result = capability::authorize(actor, op).and_then(|_| {
            self.in_write_tx(|tx| {
                let mut order = load_visible(tx, actor, do_id)?;
                let from = order.status;

                if from.is_terminal() {
                    return Err(WorkflowError::InvalidState {
                        status: from,
                        message: "提货单已转入路销（终态）".to_string(),
                    });
                }
                issue_gate::ensure_no_open_issues(tx, do_id)?;
                if op == Operation::ForwardToRoadSale {
                    approval_gate::ensure_both_approved(order.approval())?;
                }
                transition::validate(from, to, op)?;

                order.status = to;
                order.revision = DeliveryOrderRepository::new(tx).update_state(&order, now)?;
                order.updated_at = now;

                WorkflowHistoryRepository::new(tx).append(&history_entry(
                    do_id,
                    from,
                    to,
                    op,
                    actor,
                    notes.clone(),
                    now,
                ))?;

                Ok((order, from))
            })
        });

        let (order, from) = result.map_err(|e| log_rejection(e, actor, op, do_id))?;

        tracing::info!(
            do_id = %order.do_id,
            actor = %actor.user_id,
            from = %from,
            to = %order.status,
            operation = %op,
            "提货单状态已推进"
        );

        let event_type = match op {
            Operation::Receive => NotificationEventType::Received,
            Operation::ForwardToRoadSale => NotificationEventType::ForwardedToRoadSale,
            _ => NotificationEventType::Forwarded,
        };
        self.publisher.publish_logged(
            &NotificationEvent::new(event_type, &order.do_id, &order.do_number, &actor.user_id, now)
                .with_transition(from, order.status)
                .with_note(notes),
        );
        Ok(order)
    }

    /// 审批
    ///
    /// 同一方重复审批不报错：状态与标志不变，仍追加一条 from == to 的历史记录。
    /// 审批从不自动转入路销。
    pub fn approve(
        &self,
        actor: &Actor,
        do_id: &str,
        party: ApprovalParty,
        notes: Option<String>,
    ) -> WorkflowResult<DeliveryOrder> {
        let op = Operation::approval(party);
        let notes = normalize_optional(notes);
        let now = now();

        let result = capability::authorize(actor, op).and_then(|_| {
            self.in_write_tx(|tx| {
                let mut order = load_visible(tx, actor, do_id)?;
                let from = order.status;

                if from.is_terminal() {
                    return Err(WorkflowError::InvalidState {
                        status: from,
                        message: "提货单已转入路销（终态）".to_string(),
                    });
                }
                issue_gate::ensure_no_open_issues(tx, do_id)?;

                let decision = approval_gate::apply(from, order.approval(), party)?;
                if decision.changed {
                    transition::validate(from, decision.next_status, op)?;
                    order.set_approval(decision.approval);
                    order.status = decision.next_status;
                    order.revision = DeliveryOrderRepository::new(tx).update_state(&order, now)?;
                    order.updated_at = now;
                }

                let note = if decision.changed {
                    notes.clone()
                } else {
                    Some(notes.clone().unwrap_or_else(|| "重复审批，状态不变".to_string()))
                };
                WorkflowHistoryRepository::new(tx).append(&history_entry(
                    do_id,
                    from,
                    order.status,
                    op,
                    actor,
                    note,
                    now,
                ))?;

                Ok((order, from, decision.changed))
            })
        });

        let (order, from, changed) = result.map_err(|e| log_rejection(e, actor, op, do_id))?;

        if changed {
            tracing::info!(
                do_id = %order.do_id,
                actor = %actor.user_id,
                party = %party,
                from = %from,
                to = %order.status,
                "审批已记录"
            );
            self.publisher.publish_logged(
                &NotificationEvent::new(
                    NotificationEventType::Approved,
                    &order.do_id,
                    &order.do_number,
                    &actor.user_id,
                    now,
                )
                .with_transition(from, order.status)
                .with_note(notes),
            );
        } else {
            tracing::info!(
                do_id = %order.do_id,
                actor = %actor.user_id,
                party = %party,
                "重复审批，无状态变化"
            );
        }
        Ok(order)
    }

    // ==========================================
    // 问题
    // ==========================================

    /// 登记问题（不改变提货单状态，不写流转历史）
    pub fn report_issue(
        &self,
        actor: &Actor,
        do_id: &str,
        category: IssueCategory,
        description: &str,
    ) -> WorkflowResult<Issue> {
        let op = Operation::ReportIssue;
        let now = now();

        let result = capability::authorize(actor, op).and_then(|_| {
            let description = required_text("description", description)?;
            self.in_write_tx(|tx| {
                let order = load_visible(tx, actor, do_id)?;
                if order.status.is_terminal() {
                    return Err(WorkflowError::InvalidState {
                        status: order.status,
                        message: "终态提货单不能登记问题".to_string(),
                    });
                }

                let issue = Issue {
                    issue_id: Uuid::new_v4().to_string(),
                    do_id: order.do_id.clone(),
                    category,
                    description: description.clone(),
                    status: IssueStatus::Open,
                    reported_by: actor.user_id.clone(),
                    resolution: None,
                    resolved_by: None,
                    created_at: now,
                    resolved_at: None,
                };
                IssueRepository::new(tx).insert(&issue)?;
                Ok((issue, order.do_number))
            })
        });

        let (issue, do_number) = result.map_err(|e| log_rejection(e, actor, op, do_id))?;

        tracing::info!(
            do_id = %issue.do_id,
            issue_id = %issue.issue_id,
            category = %issue.category,
            actor = %actor.user_id,
            "问题已登记"
        );
        self.publisher.publish_logged(
            &NotificationEvent::new(
                NotificationEventType::IssueReported,
                &issue.do_id,
                &do_number,
                &actor.user_id,
                now,
            )
            .with_issue(&issue.issue_id)
            .with_note(Some(issue.description.clone())),
        );
        Ok(issue)
    }

    /// 解决问题（不会自动推进提货单）
    pub fn resolve_issue(
        &self,
        actor: &Actor,
        issue_id: &str,
        resolution: &str,
    ) -> WorkflowResult<Issue> {
        let op = Operation::ResolveIssue;
        let now = now();

        let result = capability::authorize(actor, op).and_then(|_| {
            let resolution = required_text("resolution", resolution)?;
            self.in_write_tx(|tx| {
                let issues = IssueRepository::new(tx);
                let mut issue = issues
                    .find_by_id(issue_id)?
                    .ok_or_else(|| WorkflowError::not_found("Issue", issue_id))?;
                let order = load_visible(tx, actor, &issue.do_id)?;

                if !issue.is_open() || issues.resolve(issue_id, &resolution, &actor.user_id, now)? == 0 {
                    return Err(WorkflowError::InvalidState {
                        status: order.status,
                        message: format!("问题已解决: {}", issue_id),
                    });
                }

                issue.status = IssueStatus::Resolved;
                issue.resolution = Some(resolution.clone());
                issue.resolved_by = Some(actor.user_id.clone());
                issue.resolved_at = Some(now);
                Ok((issue, order.do_number))
            })
        });

        let (issue, do_number) = result.map_err(|e| log_rejection(e, actor, op, issue_id))?;

        tracing::info!(
            do_id = %issue.do_id,
            issue_id = %issue.issue_id,
            actor = %actor.user_id,
            "问题已解决"
        );
        self.publisher.publish_logged(
            &NotificationEvent::new(
                NotificationEventType::IssueResolved,
                &issue.do_id,
                &do_number,
                &actor.user_id,
                now,
            )
            .with_issue(&issue.issue_id)
            .with_note(issue.resolution.clone()),
        );
        Ok(issue)
    }

    // ==========================================
    // 删除
    // ==========================================

    /// 删除早期提货单（级联删除问题与历史）
    ///
    /// # 错误
    /// - `InvalidState`: 状态不在 {created, at_area_office}
    /// - `HasHistory`: 历史记录超过 1 条
    pub fn delete(&self, actor: &Actor, do_id: &str) -> WorkflowResult<()> {
        let op = Operation::Delete;

        let result = capability::authorize(actor, op).and_then(|_| {
            self.in_write_tx(|tx| {
                let order = load_visible(tx, actor, do_id)?;
                if !order.status.is_deletable() {
                    return Err(WorkflowError::InvalidState {
                        status: order.status,
                        message: "仅创建/区域办阶段的提货单可删除".to_string(),
                    });
                }

                let history = WorkflowHistoryRepository::new(tx);
                let entries = history.count_by_do(do_id)?;
                if entries > 1 {
                    return Err(WorkflowError::HasHistory {
                        do_id: do_id.to_string(),
                        entries,
                    });
                }

                let removed_issues = IssueRepository::new(tx).delete_by_do(do_id)?;
                history.delete_by_do(do_id)?;
                DeliveryOrderRepository::new(tx).delete(do_id)?;
                Ok((order, removed_issues))
            })
        });

        let (order, removed_issues) = result.map_err(|e| log_rejection(e, actor, op, do_id))?;

        tracing::info!(
            do_id = %order.do_id,
            do_number = %order.do_number,
            actor = %actor.user_id,
            removed_issues,
            "提货单已删除"
        );
        self.publisher.publish_logged(&NotificationEvent::new(
            NotificationEventType::Deleted,
            &order.do_id,
            &order.do_number,
            &actor.user_id,
            now(),
        ));
        Ok(())
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn lock_conn(&self) -> WorkflowResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| WorkflowError::from(RepositoryError::LockError(e.to_string())))
    }

    /// 在 IMMEDIATE 事务内执行；闭包返回错误时回滚
    fn in_write_tx<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> WorkflowResult<T>,
    ) -> WorkflowResult<T> {
        let mut conn = self.lock_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(RepositoryError::from)?;
        let value = f(&tx)?;
        tx.commit().map_err(RepositoryError::from)?;
        Ok(value)
    }

    fn validate_new_order(
        &self,
        input: NewDeliveryOrder,
        now: NaiveDateTime,
    ) -> WorkflowResult<ValidatedOrder> {
        let do_number = required_text("do_number", &input.do_number)?;
        if do_number.chars().count() > self.settings.number_max_len {
            return Err(WorkflowError::ValidationError(format!(
                "do_number 长度超过 {}",
                self.settings.number_max_len
            )));
        }
        let party_id = required_text("party_id", &input.party_id)?;
        let authorized_person = required_text("authorized_person", &input.authorized_person)?;

        let valid_to = match input.valid_to {
            Some(valid_to) if valid_to <= now => {
                return Err(WorkflowError::ValidationError(
                    "valid_to 必须晚于当前时间".to_string(),
                ));
            }
            Some(valid_to) => valid_to,
            None => Duration::try_days(self.settings.default_validity_days)
                .filter(|days| *days > Duration::zero())
                .and_then(|days| now.checked_add_signed(days))
                .ok_or_else(|| {
                    WorkflowError::ValidationError(format!(
                        "默认有效天数非法: {}",
                        self.settings.default_validity_days
                    ))
                })?,
        };

        Ok(ValidatedOrder {
            do_number,
            party_id,
            authorized_person,
            valid_to,
            notes: normalize_optional(input.notes),
        })
    }
}

/// 读取并校验可见性；不可见按不存在处理
fn load_visible(conn: &Connection, actor: &Actor, do_id: &str) -> WorkflowResult<DeliveryOrder> {
    let order = DeliveryOrderRepository::new(conn)
        .find_by_id(do_id)?
        .ok_or_else(|| WorkflowError::not_found("DeliveryOrder", do_id))?;

    if !role_scope::can_view(actor, &order) {
        tracing::debug!(do_id, role = %actor.role, "提货单不在角色可见范围内");
        return Err(WorkflowError::not_found("DeliveryOrder", do_id));
    }
    Ok(order)
}

fn history_entry(
    do_id: &str,
    from: DoStatus,
    to: DoStatus,
    action: Operation,
    actor: &Actor,
    note: Option<String>,
    now: NaiveDateTime,
) -> WorkflowHistoryEntry {
    WorkflowHistoryEntry {
        history_id: Uuid::new_v4().to_string(),
        do_id: do_id.to_string(),
        from_status: from,
        to_status: to,
        action,
        actor_id: actor.user_id.clone(),
        note,
        created_at: now,
    }
}

fn log_rejection(
    err: WorkflowError,
    actor: &Actor,
    op: impl fmt::Display,
    target: &str,
) -> WorkflowError {
    tracing::warn!(
        actor = %actor.user_id,
        role = %actor.role,
        operation = %op,
        object_id = target,
        kind = err.kind().code(),
        error = %err,
        "工作流操作被拒绝"
    );
    err
}

fn required_text(field: &str, value: &str) -> WorkflowResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(WorkflowError::ValidationError(format!("{} 不能为空", field)));
    }
    if trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(WorkflowError::ValidationError(format!(
            "{} 长度超过 {}",
            field, MAX_TEXT_LEN
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
