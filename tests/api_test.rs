// ==========================================
// API 层集成测试
// ==========================================
// 职责: 凭据解析、参数解析、结构化错误码，以及经 API 的完整流转
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod api_test {
    use do_workflow::api::{CreateDeliveryOrderRequest, ListDeliveryOrdersRequest};
    use do_workflow::app::AppState;
    use do_workflow::notification::LoggingNotifier;
    use do_workflow::{ApiError, Credentials, DoStatus, IssueStatus};
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    use crate::test_helpers::*;

    fn file_state() -> (NamedTempFile, AppState) {
        let (temp, db_path) = create_test_db().unwrap();
        let state = AppState::new(&db_path, Arc::new(LoggingNotifier)).unwrap();
        (temp, state)
    }

    fn create_request(do_number: &str) -> CreateDeliveryOrderRequest {
        CreateDeliveryOrderRequest {
            do_number: do_number.to_string(),
            party_id: PARTY_ID.to_string(),
            authorized_person: "王五".to_string(),
            valid_to: Some("2099-12-31".to_string()),
            notes: Some("API 创建".to_string()),
        }
    }

    #[test]
    fn test_full_flow_through_api() {
        let (_temp, state) = file_state();
        let api = &state.delivery_order_api;
        let (area, project, cisf, road) = (
            Credentials::bearer(AREA_ID),
            Credentials::bearer(PROJECT_ID),
            Credentials::bearer(CISF_ID),
            Credentials::bearer(ROAD_SALE_ID),
        );

        let view = api.create(&area, create_request("DO-API-1")).unwrap();
        assert_eq!(view.order.status, DoStatus::AtAreaOffice);
        assert_eq!(view.order.valid_to.to_string(), "2099-12-31 23:59:59");
        assert_eq!(view.history.len(), 1);
        let do_id = view.order.do_id.clone();

        let view = api.forward(&area, &do_id, "at_project_office", None).unwrap();
        assert_eq!(view.order.status, DoStatus::AtProjectOffice);

        let view = api.report_issue(&project, &do_id, "documentation", "缺少磅单").unwrap();
        assert!(view.has_open_issues());
        let issue_id = view.issues[0].issue_id.clone();

        let err = api.receive(&project, &do_id).unwrap_err();
        assert_eq!(err.code(), "ISSUES_OPEN");
        let response = err.to_response();
        assert_eq!(response.details.unwrap()["open_count"], 1);

        let view = api.resolve_issue(&project, &issue_id, "磅单已补").unwrap();
        assert_eq!(view.issues[0].status, IssueStatus::Resolved);

        let view = api.receive(&project, &do_id).unwrap();
        assert_eq!(view.order.status, DoStatus::ReceivedAtProjectOffice);

        let view = api.approve(&project, &do_id, "PROJECT_OFFICE", None).unwrap();
        assert_eq!(view.order.status, DoStatus::ProjectApproved);

        let err = api.forward_to_road_sale(&project, &do_id, None).unwrap_err();
        assert_eq!(err.code(), "APPROVAL_INCOMPLETE");

        let view = api.approve(&cisf, &do_id, "cisf", Some("安检通过".to_string())).unwrap();
        assert_eq!(view.order.status, DoStatus::BothApproved);

        let view = api.forward_to_road_sale(&cisf, &do_id, None).unwrap();
        assert_eq!(view.order.status, DoStatus::AtRoadSale);
        assert_eq!(view.history.len(), 6);

        let listed = api.list(&road, &ListDeliveryOrdersRequest::default()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(api.history(&road, &do_id).unwrap().len(), 6);
        assert_eq!(api.issues(&road, &do_id, false).unwrap().len(), 1);
        assert!(api.issues(&road, &do_id, true).unwrap().is_empty());
    }

    #[test]
    fn test_credentials_are_resolved_against_user_table() {
        let (_temp, state) = file_state();
        let api = &state.delivery_order_api;

        for creds in [
            Credentials::anonymous(),
            Credentials::bearer("   "),
            Credentials::bearer("u-nobody"),
            Credentials::bearer(INACTIVE_ID),
        ] {
            let err = api
                .list(&creds, &ListDeliveryOrdersRequest::default())
                .unwrap_err();
            assert!(matches!(err, ApiError::Unauthenticated(_)), "{:?}", creds);
            assert_eq!(err.to_response().code, "UNAUTHENTICATED");
        }
    }

    #[test]
    fn test_error_codes_are_stable() {
        let (_temp, state) = file_state();
        let api = &state.delivery_order_api;
        let area = Credentials::bearer(AREA_ID);
        let project = Credentials::bearer(PROJECT_ID);

        let do_id = api.create(&area, create_request("DO-API-ERR")).unwrap().order.do_id;

        let err = api.create(&area, create_request("DO-API-ERR")).unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_NUMBER");
        assert!(!err.is_retryable());

        let err = api.create(&project, create_request("DO-API-ERR-2")).unwrap_err();
        assert_eq!(err.code(), "UNAUTHORIZED");
        assert_eq!(err.to_response().details.unwrap()["operation"], "CREATE");

        let err = api.receive(&project, &do_id).unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");

        let err = api.forward(&area, &do_id, "both_approved", None).unwrap_err();
        assert_eq!(err.code(), "UNAUTHORIZED");

        let admin = Credentials::bearer(ADMIN_ID);
        let err = api.forward(&admin, &do_id, "both_approved", None).unwrap_err();
        assert_eq!(err.code(), "INVALID_TRANSITION");

        let err = api.forward(&area, &do_id, "shipped", None).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let err = api.approve(&area, &do_id, "ROAD_SALE", None).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let err = api.report_issue(&area, &do_id, "weather", "x").unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let mut bad_date = create_request("DO-API-ERR-3");
        bad_date.valid_to = Some("31/12/2099".to_string());
        assert_eq!(api.create(&area, bad_date).unwrap_err().code(), "VALIDATION_ERROR");

        let mut past = create_request("DO-API-ERR-4");
        past.valid_to = Some("2001-01-01".to_string());
        assert_eq!(api.create(&area, past).unwrap_err().code(), "VALIDATION_ERROR");

        let mut unknown_party = create_request("DO-API-ERR-5");
        unknown_party.party_id = "party-unknown".to_string();
        assert_eq!(api.create(&area, unknown_party).unwrap_err().code(), "NOT_FOUND");

        api.forward(&area, &do_id, "at_project_office", None).unwrap();
        let err = api.delete(&area, &do_id).unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");

        let json = err.to_json();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["code"], "INVALID_STATE");
    }

    #[test]
    fn test_list_status_filter_parsing() {
        let (_temp, state) = file_state();
        let api = &state.delivery_order_api;
        let admin = Credentials::bearer(ADMIN_ID);
        let area = Credentials::bearer(AREA_ID);

        api.create(&area, create_request("DO-API-L1")).unwrap();
        let second = api.create(&area, create_request("DO-API-L2")).unwrap();
        api.forward(&area, &second.order.do_id, "AT_PROJECT_OFFICE", None)
            .unwrap();

        let request = ListDeliveryOrdersRequest {
            statuses: Some(vec!["at_project_office".to_string()]),
            ..ListDeliveryOrdersRequest::default()
        };
        let listed = api.list(&admin, &request).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].order.do_number, "DO-API-L2");

        let bad = ListDeliveryOrdersRequest {
            statuses: Some(vec!["archived".to_string()]),
            ..ListDeliveryOrdersRequest::default()
        };
        assert_eq!(api.list(&admin, &bad).unwrap_err().code(), "VALIDATION_ERROR");

        // 最新在前
        let all = api.list(&admin, &ListDeliveryOrdersRequest::default()).unwrap();
        assert_eq!(all[0].order.do_number, "DO-API-L2");
    }

    #[test]
    fn test_state_survives_reopen() {
        let (temp, db_path) = create_test_db().unwrap();
        let do_id = {
            let state = AppState::new(&db_path, Arc::new(LoggingNotifier)).unwrap();
            state
                .delivery_order_api
                .create(&Credentials::bearer(AREA_ID), create_request("DO-API-REOPEN"))
                .unwrap()
                .order
                .do_id
        };

        let state = AppState::new(&db_path, Arc::new(LoggingNotifier)).unwrap();
        let view = state
            .delivery_order_api
            .get(&Credentials::bearer(ADMIN_ID), &do_id)
            .unwrap();
        assert_eq!(view.order.do_number, "DO-API-REOPEN");
        drop(temp);
    }
}
