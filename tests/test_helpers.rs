// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、基础数据（收货单位/用户）与常用流转步骤
// ==========================================

#![allow(dead_code)]

use chrono::NaiveDate;
use do_workflow::config::WorkflowSettings;
use do_workflow::db::{self, SharedConnection};
use do_workflow::domain::{Actor, DeliveryOrder, NewDeliveryOrder, Party, Role, User};
use do_workflow::engine::WorkflowEngine;
use do_workflow::repository::{PartyRepository, UserRepository};
use do_workflow::ApprovalParty;
use std::error::Error;
use tempfile::NamedTempFile;

pub const PARTY_ID: &str = "party-x";

pub const ADMIN_ID: &str = "u-admin";
pub const AREA_ID: &str = "u-area";
pub const AREA2_ID: &str = "u-area-2";
pub const PROJECT_ID: &str = "u-project";
pub const CISF_ID: &str = "u-cisf";
pub const ROAD_SALE_ID: &str = "u-road";
pub const INACTIVE_ID: &str = "u-inactive";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    do_workflow::logging::init_test();
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;
    seed_reference_data(&conn)?;

    Ok((temp_file, db_path))
}

/// 写入收货单位与各角色用户
pub fn seed_reference_data(conn: &rusqlite::Connection) -> Result<(), Box<dyn Error>> {
    let ts = NaiveDate::from_ymd_opt(2026, 1, 5)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .ok_or("非法日期")?;

    PartyRepository::new(conn).insert(&Party {
        party_id: PARTY_ID.to_string(),
        name: "Party X 钢材贸易".to_string(),
        contact_person: Some("李四".to_string()),
        phone: Some("13800000000".to_string()),
        email: Some("party-x@example.com".to_string()),
        address: None,
        created_at: ts,
    })?;

    let users = UserRepository::new(conn);
    for (user_id, role, is_active) in [
        (ADMIN_ID, Role::Admin, true),
        (AREA_ID, Role::AreaOffice, true),
        (AREA2_ID, Role::AreaOffice, true),
        (PROJECT_ID, Role::ProjectOffice, true),
        (CISF_ID, Role::Cisf, true),
        (ROAD_SALE_ID, Role::RoadSale, true),
        (INACTIVE_ID, Role::Cisf, false),
    ] {
        users.insert(&User {
            user_id: user_id.to_string(),
            username: user_id.trim_start_matches("u-").to_string(),
            display_name: None,
            role,
            is_active,
            created_at: ts,
        })?;
    }
    Ok(())
}

/// 内存库工作流引擎（已写入基础数据）
pub fn memory_engine() -> (SharedConnection, WorkflowEngine) {
    do_workflow::logging::init_test();
    let conn = db::open_in_memory().unwrap();
    seed_reference_data(&conn.lock().unwrap()).unwrap();
    let engine = WorkflowEngine::new(conn.clone(), WorkflowSettings::default());
    (conn, engine)
}

pub fn admin() -> Actor {
    Actor::new(ADMIN_ID, Role::Admin)
}

pub fn area() -> Actor {
    Actor::new(AREA_ID, Role::AreaOffice)
}

pub fn area2() -> Actor {
    Actor::new(AREA2_ID, Role::AreaOffice)
}

pub fn project() -> Actor {
    Actor::new(PROJECT_ID, Role::ProjectOffice)
}

pub fn cisf() -> Actor {
    Actor::new(CISF_ID, Role::Cisf)
}

pub fn road_sale() -> Actor {
    Actor::new(ROAD_SALE_ID, Role::RoadSale)
}

pub fn new_order(do_number: &str) -> NewDeliveryOrder {
    NewDeliveryOrder {
        do_number: do_number.to_string(),
        party_id: PARTY_ID.to_string(),
        authorized_person: "王五".to_string(),
        valid_to: None,
        notes: None,
    }
}

// ==========================================
// 常用流转步骤（区域办创建）
// ==========================================

pub fn at_area_office(engine: &WorkflowEngine, do_number: &str) -> DeliveryOrder {
    engine.create(&area(), new_order(do_number)).unwrap()
}

pub fn at_project_office(engine: &WorkflowEngine, do_number: &str) -> DeliveryOrder {
    let order = at_area_office(engine, do_number);
    engine
        .forward(&area(), &order.do_id, do_workflow::DoStatus::AtProjectOffice, None)
        .unwrap()
}

pub fn received(engine: &WorkflowEngine, do_number: &str) -> DeliveryOrder {
    let order = at_project_office(engine, do_number);
    engine.receive(&project(), &order.do_id).unwrap()
}

pub fn project_approved(engine: &WorkflowEngine, do_number: &str) -> DeliveryOrder {
    let order = received(engine, do_number);
    engine
        .approve(&project(), &order.do_id, ApprovalParty::ProjectOffice, None)
        .unwrap()
}

pub fn cisf_approved(engine: &WorkflowEngine, do_number: &str) -> DeliveryOrder {
    let order = at_project_office(engine, do_number);
    engine
        .approve(&cisf(), &order.do_id, ApprovalParty::Cisf, None)
        .unwrap()
}

pub fn both_approved(engine: &WorkflowEngine, do_number: &str) -> DeliveryOrder {
    let order = project_approved(engine, do_number);
    engine
        .approve(&cisf(), &order.do_id, ApprovalParty::Cisf, None)
        .unwrap()
}

pub fn at_road_sale(engine: &WorkflowEngine, do_number: &str) -> DeliveryOrder {
    let order = both_approved(engine, do_number);
    engine
        .forward_to_road_sale(&project(), &order.do_id, None)
        .unwrap()
}
