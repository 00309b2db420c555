// ==========================================
// 提货单删除测试
// ==========================================
// 职责: 仅早期且无流转历史的提货单可删除，删除级联问题与历史
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod delete_test {
    use chrono::Local;
    use do_workflow::query::DeliveryOrderQuery;
    use do_workflow::repository::{DeliveryOrderRepository, IssueRepository, WorkflowHistoryRepository};
    use do_workflow::{DoStatus, IssueCategory, Operation, WorkflowError, WorkflowHistoryEntry};

    use crate::test_helpers::*;

    #[test]
    fn test_scenario_delete_right_after_create() {
        let (conn, engine) = memory_engine();
        let order = at_area_office(&engine, "DO-D");

        engine.delete(&area(), &order.do_id).unwrap();

        {
            let guard = conn.lock().unwrap();
            assert!(DeliveryOrderRepository::new(&guard)
                .find_by_id(&order.do_id)
                .unwrap()
                .is_none());
            assert_eq!(
                WorkflowHistoryRepository::new(&guard).count_by_do(&order.do_id).unwrap(),
                0
            );
            assert!(IssueRepository::new(&guard)
                .list_by_do(&order.do_id, false)
                .unwrap()
                .is_empty());
        }

        assert!(matches!(
            DeliveryOrderQuery::new(conn).get(&admin(), &order.do_id),
            Err(WorkflowError::NotFound { .. })
        ));

        // 单号释放后可再次使用
        assert!(engine.create(&area(), new_order("DO-D")).is_ok());
    }

    #[test]
    fn test_delete_cascades_issues() {
        let (conn, engine) = memory_engine();
        let order = at_area_office(&engine, "DO-D-ISSUES");
        engine
            .report_issue(&area(), &order.do_id, IssueCategory::Documentation, "单据有误")
            .unwrap();
        let resolved = engine
            .report_issue(&area(), &order.do_id, IssueCategory::Other, "已处理的问题")
            .unwrap();
        engine.resolve_issue(&area(), &resolved.issue_id, "ok").unwrap();

        engine.delete(&admin(), &order.do_id).unwrap();

        let guard = conn.lock().unwrap();
        assert!(IssueRepository::new(&guard)
            .list_by_do(&order.do_id, false)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_delete_after_forward_is_invalid_state() {
        let (conn, engine) = memory_engine();
        let order = at_project_office(&engine, "DO-D-LATE");

        match engine.delete(&area(), &order.do_id) {
            Err(WorkflowError::InvalidState { status, .. }) => {
                assert_eq!(status, DoStatus::AtProjectOffice)
            }
            other => panic!("expected InvalidState, got {:?}", other),
        }

        let guard = conn.lock().unwrap();
        let stored = DeliveryOrderRepository::new(&guard)
            .find_by_id(&order.do_id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, order.status);
        assert_eq!(stored.revision, order.revision);
        assert_eq!(
            WorkflowHistoryRepository::new(&guard).count_by_do(&order.do_id).unwrap(),
            2
        );
    }

    #[test]
    fn test_delete_with_extra_history_is_rejected() {
        let (conn, engine) = memory_engine();
        let order = at_area_office(&engine, "DO-D-HIST");

        {
            let guard = conn.lock().unwrap();
            WorkflowHistoryRepository::new(&guard)
                .append(&WorkflowHistoryEntry {
                    history_id: "h-extra".to_string(),
                    do_id: order.do_id.clone(),
                    from_status: DoStatus::AtAreaOffice,
                    to_status: DoStatus::AtAreaOffice,
                    action: Operation::ForwardToProjectOffice,
                    actor_id: ADMIN_ID.to_string(),
                    note: Some("迁移补录".to_string()),
                    created_at: Local::now().naive_local(),
                })
                .unwrap();
        }

        match engine.delete(&admin(), &order.do_id) {
            Err(WorkflowError::HasHistory { entries, .. }) => assert_eq!(entries, 2),
            other => panic!("expected HasHistory, got {:?}", other),
        }

        let guard = conn.lock().unwrap();
        assert!(DeliveryOrderRepository::new(&guard)
            .find_by_id(&order.do_id)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_delete_role_and_missing_record() {
        let (_conn, engine) = memory_engine();
        let order = at_area_office(&engine, "DO-D-ROLE");

        for actor in [project(), cisf(), road_sale()] {
            assert!(matches!(
                engine.delete(&actor, &order.do_id),
                Err(WorkflowError::Unauthorized { .. })
            ));
        }
        assert!(matches!(
            engine.delete(&admin(), "does-not-exist"),
            Err(WorkflowError::NotFound { .. })
        ));
    }
}
