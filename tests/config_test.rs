// ==========================================
// 运行期配置测试
// ==========================================
// 职责: 验证 config_kv 中的覆盖值被引擎与投递器采用
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod config_test {
    use do_workflow::app::AppState;
    use do_workflow::config::{
        config_keys, ConfigManager, NotificationSettings, WorkflowSettings, MAX_VALIDITY_DAYS,
    };
    use do_workflow::db;
    use do_workflow::notification::LoggingNotifier;
    use do_workflow::repository::NotificationOutboxRepository;
    use do_workflow::WorkflowError;
    use std::sync::Arc;

    use crate::test_helpers::*;

    #[test]
    fn test_defaults_without_overrides() {
        let (_temp, db_path) = create_test_db().unwrap();
        let manager = ConfigManager::new(&db_path).unwrap();

        assert_eq!(manager.workflow_settings().unwrap(), WorkflowSettings::default());
        assert_eq!(
            manager.notification_settings().unwrap(),
            NotificationSettings::default()
        );
    }

    #[test]
    fn test_number_length_override_applies_to_engine() {
        let (_temp, db_path) = create_test_db().unwrap();
        {
            let manager = ConfigManager::new(&db_path).unwrap();
            manager
                .set_global_config_value(config_keys::DO_NUMBER_MAX_LEN, "5")
                .unwrap();
        }

        let state = AppState::new(&db_path, Arc::new(LoggingNotifier)).unwrap();
        assert_eq!(state.engine.settings().number_max_len, 5);

        assert!(matches!(
            state.engine.create(&area(), new_order("DO-123456")),
            Err(WorkflowError::ValidationError(_))
        ));
        assert!(state.engine.create(&area(), new_order("DO-12")).is_ok());
    }

    #[test]
    fn test_validity_days_override_sets_default_valid_to() {
        let (_temp, db_path) = create_test_db().unwrap();
        {
            let manager = ConfigManager::new(&db_path).unwrap();
            manager
                .set_global_config_value(config_keys::DO_DEFAULT_VALIDITY_DAYS, "7")
                .unwrap();
        }

        let state = AppState::new(&db_path, Arc::new(LoggingNotifier)).unwrap();
        let order = state.engine.create(&area(), new_order("DO-VALID")).unwrap();
        let days = (order.valid_to - order.valid_from).num_days();
        assert_eq!(days, 7);
    }

    #[test]
    fn test_out_of_range_overrides_fall_back_to_default() {
        let (_temp, db_path) = create_test_db().unwrap();
        let manager = ConfigManager::new(&db_path).unwrap();
        let defaults = WorkflowSettings::default();

        for days in ["0", "-5", "9000000000000"] {
            manager
                .set_global_config_value(config_keys::DO_DEFAULT_VALIDITY_DAYS, days)
                .unwrap();
            assert_eq!(
                manager.workflow_settings().unwrap().default_validity_days,
                defaults.default_validity_days,
                "validity days {}",
                days
            );
        }
        manager
            .set_global_config_value(config_keys::DO_NUMBER_MAX_LEN, "0")
            .unwrap();
        assert_eq!(
            manager.workflow_settings().unwrap().number_max_len,
            defaults.number_max_len
        );

        // 回退后创建的提货单仍在有效期内
        let state = AppState::new(&db_path, Arc::new(LoggingNotifier)).unwrap();
        let order = state.engine.create(&area(), new_order("DO-RANGE")).unwrap();
        assert!(order.valid_to > order.valid_from);
        assert_eq!(
            (order.valid_to - order.valid_from).num_days(),
            defaults.default_validity_days
        );
    }

    #[test]
    fn test_upper_bound_validity_is_accepted() {
        let (_temp, db_path) = create_test_db().unwrap();
        {
            let manager = ConfigManager::new(&db_path).unwrap();
            manager
                .set_global_config_value(
                    config_keys::DO_DEFAULT_VALIDITY_DAYS,
                    &MAX_VALIDITY_DAYS.to_string(),
                )
                .unwrap();
        }

        let state = AppState::new(&db_path, Arc::new(LoggingNotifier)).unwrap();
        assert_eq!(state.engine.settings().default_validity_days, MAX_VALIDITY_DAYS);
        let order = state.engine.create(&area(), new_order("DO-LONG")).unwrap();
        assert_eq!((order.valid_to - order.valid_from).num_days(), MAX_VALIDITY_DAYS);
    }

    #[test]
    fn test_disabled_notifications_skip_outbox() {
        let (_temp, db_path) = create_test_db().unwrap();
        {
            let manager = ConfigManager::new(&db_path).unwrap();
            manager
                .set_global_config_value(config_keys::NOTIFICATION_ENABLED, "false")
                .unwrap();
        }

        let state = AppState::new(&db_path, Arc::new(LoggingNotifier)).unwrap();
        let order = state.engine.create(&area(), new_order("DO-QUIET")).unwrap();

        let conn = db::open_sqlite_connection(&db_path).unwrap();
        assert!(NotificationOutboxRepository::new(&conn)
            .list_by_do(&order.do_id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_malformed_override_falls_back_to_default() {
        let (_temp, db_path) = create_test_db().unwrap();
        let manager = ConfigManager::new(&db_path).unwrap();
        manager
            .set_global_config_value(config_keys::NOTIFICATION_MAX_RETRIES, "many")
            .unwrap();

        assert_eq!(
            manager.notification_settings().unwrap().max_retries,
            NotificationSettings::default().max_retries
        );
        assert!(AppState::new(&db_path, Arc::new(LoggingNotifier)).is_ok());
    }
}
