// ==========================================
// 提货单流转端到端测试
// ==========================================
// 职责: 验证创建 → 转项目办 → 接收 → 双审批 → 转路销 的完整流程
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod workflow_e2e_test {
    use do_workflow::engine::transition;
    use do_workflow::query::{DeliveryOrderQuery, ListFilter};
    use do_workflow::repository::{DeliveryOrderRepository, WorkflowHistoryRepository};
    use do_workflow::{ApprovalParty, DoStatus, Operation, WorkflowError};

    use crate::test_helpers::*;

    #[test]
    fn test_scenario_create_forward_receive() {
        let (conn, engine) = memory_engine();
        let query = DeliveryOrderQuery::new(conn.clone());

        let order = engine.create(&area(), new_order("DO-1")).unwrap();
        assert_eq!(order.status, DoStatus::AtAreaOffice);
        assert_eq!(order.party_id, PARTY_ID);
        assert!(!order.project_approved && !order.cisf_approved);

        let order = engine
            .forward(&area(), &order.do_id, DoStatus::AtProjectOffice, None)
            .unwrap();
        assert_eq!(order.status, DoStatus::AtProjectOffice);
        assert_eq!(query.history(&admin(), &order.do_id).unwrap().len(), 2);

        let order = engine.receive(&project(), &order.do_id).unwrap();
        assert_eq!(order.status, DoStatus::ReceivedAtProjectOffice);

        let view = query.get(&project(), &order.do_id).unwrap();
        assert_eq!(view.history.len(), 3);
        // 最新在前
        assert_eq!(view.history[0].action, Operation::Receive);
        assert_eq!(view.history[2].action, Operation::Create);
        assert_eq!(view.party.as_ref().unwrap().name, "Party X 钢材贸易");
    }

    #[test]
    fn test_full_path_to_road_sale_keeps_legal_history() {
        let (conn, engine) = memory_engine();
        let order = at_road_sale(&engine, "DO-FULL");
        assert_eq!(order.status, DoStatus::AtRoadSale);
        assert!(order.project_approved && order.cisf_approved);

        let guard = conn.lock().unwrap();
        let mut history = WorkflowHistoryRepository::new(&guard)
            .list_by_do(&order.do_id)
            .unwrap();
        history.reverse();

        let pairs: Vec<_> = history.iter().map(|h| (h.from_status, h.to_status)).collect();
        assert!(transition::is_legal_sequence(&pairs));
        assert_eq!(
            pairs,
            vec![
                (DoStatus::Created, DoStatus::AtAreaOffice),
                (DoStatus::AtAreaOffice, DoStatus::AtProjectOffice),
                (DoStatus::AtProjectOffice, DoStatus::ReceivedAtProjectOffice),
                (DoStatus::ReceivedAtProjectOffice, DoStatus::ProjectApproved),
                (DoStatus::ProjectApproved, DoStatus::BothApproved),
                (DoStatus::BothApproved, DoStatus::AtRoadSale),
            ]
        );
        for h in &history {
            assert!(h.to_status.rank() >= h.from_status.rank());
        }
    }

    #[test]
    fn test_terminal_record_rejects_further_moves() {
        let (_conn, engine) = memory_engine();
        let order = at_road_sale(&engine, "DO-END");

        assert!(matches!(
            engine.forward_to_road_sale(&admin(), &order.do_id, None),
            Err(WorkflowError::InvalidState { .. })
        ));
        assert!(matches!(
            engine.approve(&cisf(), &order.do_id, ApprovalParty::Cisf, None),
            Err(WorkflowError::InvalidState { .. })
        ));
        assert!(matches!(
            engine.forward(&admin(), &order.do_id, DoStatus::AtProjectOffice, None),
            Err(WorkflowError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_duplicate_number_performs_no_mutation() {
        let (conn, engine) = memory_engine();
        let first = engine.create(&area(), new_order("DO-DUP")).unwrap();

        // 相同单号的重试（含首尾空白）
        let err = engine.create(&area(), new_order(" DO-DUP ")).unwrap_err();
        assert!(matches!(err, WorkflowError::DuplicateNumber(_)));
        assert!(!err.is_retryable());

        let err = engine.create(&admin(), new_order("DO-DUP")).unwrap_err();
        assert!(matches!(err, WorkflowError::DuplicateNumber(_)));

        let guard = conn.lock().unwrap();
        let all = DeliveryOrderRepository::new(&guard)
            .list(&Default::default())
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].do_id, first.do_id);
        assert_eq!(
            WorkflowHistoryRepository::new(&guard).count_by_do(&first.do_id).unwrap(),
            1
        );
    }

    #[test]
    fn test_back_edges_and_skips_are_rejected() {
        let (_conn, engine) = memory_engine();
        let order = received(&engine, "DO-BACK");

        for target in [DoStatus::AtProjectOffice, DoStatus::AtAreaOffice, DoStatus::Created] {
            let result = engine.forward(&admin(), &order.do_id, target, None);
            assert!(
                matches!(result, Err(WorkflowError::InvalidTransition { .. })),
                "target {} should be rejected, got {:?}",
                target,
                result
            );
        }

        // received 状态不能再次接收
        assert!(matches!(
            engine.receive(&project(), &order.do_id),
            Err(WorkflowError::InvalidTransition { .. })
        ));

        let skip = at_area_office(&engine, "DO-SKIP");
        assert!(matches!(
            engine.receive(&admin(), &skip.do_id),
            Err(WorkflowError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_wrong_role_is_unauthorized() {
        let (_conn, engine) = memory_engine();
        let order = at_area_office(&engine, "DO-ROLE");

        assert!(matches!(
            engine.create(&project(), new_order("DO-ROLE-2")),
            Err(WorkflowError::Unauthorized { .. })
        ));
        assert!(matches!(
            engine.forward(&cisf(), &order.do_id, DoStatus::AtProjectOffice, None),
            Err(WorkflowError::Unauthorized { .. })
        ));
        assert!(matches!(
            engine.forward(&road_sale(), &order.do_id, DoStatus::AtProjectOffice, None),
            Err(WorkflowError::Unauthorized { .. })
        ));

        let order = engine
            .forward(&area(), &order.do_id, DoStatus::AtProjectOffice, None)
            .unwrap();
        assert!(matches!(
            engine.receive(&area(), &order.do_id),
            Err(WorkflowError::Unauthorized { .. })
        ));
        assert!(matches!(
            engine.receive(&cisf(), &order.do_id),
            Err(WorkflowError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_inactive_actor_rejected_everywhere() {
        let (conn, engine) = memory_engine();
        let order = at_project_office(&engine, "DO-INACTIVE");

        let mut actor = cisf();
        actor.is_active = false;
        let err = engine
            .approve(&actor, &order.do_id, ApprovalParty::Cisf, None)
            .unwrap_err();
        assert_eq!(err.kind().code(), "UNAUTHORIZED");

        let query = DeliveryOrderQuery::new(conn);
        assert!(query.list(&actor, &ListFilter::default()).is_err());
    }

    #[test]
    fn test_notes_are_written_to_history() {
        let (conn, engine) = memory_engine();
        let order = at_area_office(&engine, "DO-NOTE");
        engine
            .forward(
                &area(),
                &order.do_id,
                DoStatus::AtProjectOffice,
                Some("  请项目办尽快处理  ".to_string()),
            )
            .unwrap();

        let history = DeliveryOrderQuery::new(conn).history(&area(), &order.do_id).unwrap();
        assert_eq!(history[0].note.as_deref(), Some("请项目办尽快处理"));
        assert_eq!(history[0].actor_id, AREA_ID);
        assert_eq!(history[0].action, Operation::ForwardToProjectOffice);
    }
}
