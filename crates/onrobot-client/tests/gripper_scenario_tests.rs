//! 夹爪类设备的命令确认场景

mod common;

use common::{Rig, bool_from};
use onrobot_client::devices::{
    MG_FAMILY, Mg, RG_FAMILY, Rg, SG_FAMILY, Sg, SgTool, THREE_FG_FAMILY, TWO_FG_FAMILY, ThreeFg,
    TwoFg,
};
use onrobot_client::{CommandError, CommandOutcome, PhaseId, PhaseKind};
use onrobot_protocol::{DeviceIdentity, ToolSlot, Value};
use std::time::Duration;

fn two_fg(rig: &Rig) -> TwoFg {
    rig.link.returns("twofg_get_min_external_width", 1.0);
    rig.link.returns("twofg_get_max_external_width", 100.0);
    TwoFg::from_handle(rig.handle(&TWO_FG_FAMILY, ToolSlot::Single))
}

fn rg(rig: &Rig) -> Rg {
    rig.link.returns("rg_grip", Value::Nil);
    Rg::from_handle(rig.handle(&RG_FAMILY, ToolSlot::Single))
}

// ==================== 前置检查 ====================

#[test]
fn test_two_fg_width_out_of_range_sends_no_grip() {
    let rig = Rig::with_device(DeviceIdentity::TwoFg);
    let gripper = two_fg(&rig);

    let err = gripper.grip_external(200.0, 50, 50, true).unwrap_err();

    assert_eq!(
        err,
        CommandError::invalid_parameter("width", 200.0, "1..=100")
    );
    assert!(err.is_rejected_before_dispatch());
    assert_eq!(err.outcome(), Some(CommandOutcome::InvalidParameter));
    assert_eq!(rig.link.call_count("twofg_grip_external"), 0);
    assert_eq!(rig.link.call_count("twofg_get_busy"), 0);
}

#[test]
fn test_two_fg_finger_orientation_sent_as_double() {
    let rig = Rig::with_device(DeviceIdentity::TwoFg);
    rig.link.returns("twofg_set_finger_orientation", Value::Nil);
    let gripper = two_fg(&rig);

    gripper.set_finger_orientation(true).unwrap();
    gripper.set_finger_orientation(false).unwrap();

    assert_eq!(
        rig.link.calls_to("twofg_set_finger_orientation"),
        vec![
            vec![Value::Int(0), Value::Double(1.0)],
            vec![Value::Int(0), Value::Double(0.0)],
        ]
    );
}

#[test]
fn test_not_connected_reported_before_validation() {
    let rig = Rig::new();
    rig.detach();
    let gripper = two_fg(&rig);

    // 宽度同样越界，但连接检查在前
    let err = gripper.grip_external(200.0, 50, 50, true).unwrap_err();

    assert!(matches!(
        err,
        CommandError::NotConnected { family: "2FG", .. }
    ));
    assert_eq!(err.outcome(), Some(CommandOutcome::NotConnected));
    assert!(rig.commands().is_empty());
}

#[test]
fn test_wrong_device_in_slot_is_not_connected() {
    // 槽位上是 RG2，不是 2FG
    let rig = Rig::with_device(DeviceIdentity::Rg2);
    let gripper = two_fg(&rig);
    assert!(matches!(
        gripper.move_to(50.0, true),
        Err(CommandError::NotConnected { .. })
    ));
}

#[test]
fn test_rg_limits_follow_detected_model() {
    let rig = Rig::with_device(DeviceIdentity::Rg2);
    rig.link.returns("rg_get_busy", false);
    rig.link.returns("rg_get_grip_detected", true);
    let gripper = rg(&rig);

    // RG2 最大 40 N
    assert!(matches!(
        gripper.grip(50.0, 100.0, true),
        Err(CommandError::InvalidParameter { param: "force", .. })
    ));

    rig.attach(DeviceIdentity::Rg6);
    gripper.grip(150.0, 100.0, true).unwrap();
    assert_eq!(
        rig.link.calls_to("rg_grip"),
        vec![vec![Value::Int(0), Value::Double(150.0), Value::Double(100.0)]]
    );
}

// ==================== 确认阶段 ====================

#[test]
fn test_rg_grip_detect_timeout() {
    let rig = Rig::with_device(DeviceIdentity::Rg2);
    rig.link.sequence("rg_get_busy", bool_from(5, false));
    rig.link.returns("rg_get_grip_detected", false);
    let gripper = rg(&rig);

    let err = gripper.grip(40.0, 20.0, true).unwrap_err();

    assert_eq!(
        err,
        CommandError::TimedOut {
            family: "RG",
            phase: PhaseId::new(1, PhaseKind::GripDetected),
        }
    );
    assert!(err.is_timeout());
    assert_eq!(rig.link.call_count("rg_get_busy"), 5);
    assert_eq!(rig.link.call_count("rg_get_grip_detected"), 20);
    // 25 次轮询之间共 23 个 100ms 间隔（4 + 19）
    assert_eq!(rig.elapsed(), Duration::from_millis(2300));
}

#[test]
fn test_rg_move_without_wait_does_not_poll() {
    let rig = Rig::with_device(DeviceIdentity::Rg2);
    let gripper = rg(&rig);

    gripper.move_to(80.0, 20.0, false).unwrap();

    assert_eq!(rig.commands(), vec!["rg_grip".to_string()]);
    assert_eq!(rig.elapsed(), Duration::ZERO);
}

#[test]
fn test_three_fg_grip_runs_all_phases_in_order() {
    let rig = Rig::with_device(DeviceIdentity::ThreeFg);
    rig.link.returns("tfg_get_max_diameter", 150.0);
    rig.link.returns("tfg_get_min_diameter", 10.0);
    rig.link.returns("tfg_grip", Value::Nil);
    rig.link.sequence("tfg_get_busy", bool_from(3, false));
    rig.link.returns("tfg_get_grip_detected", true);
    rig.link.sequence("tfg_get_force_grip_detected", bool_from(2, true));
    let gripper = ThreeFg::from_handle(rig.handle(&THREE_FG_FAMILY, ToolSlot::DualPrimary));

    gripper.grip_external(50.0, 30.0, true).unwrap();

    assert_eq!(
        rig.link.calls_to("tfg_grip"),
        vec![vec![
            Value::Int(1),
            Value::Double(50.0),
            Value::Double(30.0),
            Value::Bool(false),
        ]]
    );
    let mut expected = vec!["tfg_get_max_diameter", "tfg_get_min_diameter", "tfg_grip"];
    expected.extend(["tfg_get_busy"; 3]);
    expected.push("tfg_get_grip_detected");
    expected.extend(["tfg_get_force_grip_detected"; 2]);
    assert_eq!(rig.commands(), expected);
    assert_eq!(rig.elapsed(), Duration::from_millis(300));
}

// ==================== SG ====================

fn sg(rig: &Rig) -> Sg {
    rig.link.returns(
        "sg_get_all_variables",
        Value::structure([("busy", Value::Bool(false))]),
    );
    rig.link.returns(
        "sg_get_min_max",
        Value::structure([
            ("min_open", Value::Double(11.0)),
            ("max_open", Value::Double(75.0)),
        ]),
    );
    Sg::from_handle(rig.handle(&SG_FAMILY, ToolSlot::Single))
}

#[test]
fn test_sg_requires_initialization() {
    let rig = Rig::with_device(DeviceIdentity::Sg);
    rig.link.returns("sg_get_initialized", false);
    let gripper = sg(&rig);

    assert!(matches!(
        gripper.grip(40, true),
        Err(CommandError::Usage(_))
    ));
    assert_eq!(rig.link.call_count("sg_grip"), 0);
}

#[test]
fn test_sg_is_initialized_requires_device() {
    let rig = Rig::new();
    rig.detach();
    rig.link.returns("sg_get_initialized", true);
    let gripper = sg(&rig);

    assert!(matches!(
        gripper.is_initialized(),
        Err(CommandError::NotConnected { family: "SG", .. })
    ));
    assert_eq!(rig.link.call_count("sg_get_initialized"), 0);
}

#[test]
fn test_sg_initialize_settles_after_busy() {
    let rig = Rig::with_device(DeviceIdentity::Sg);
    rig.link.returns("sg_initialize", 0i64);
    let gripper = sg(&rig);

    gripper.initialize(SgTool::SgB).unwrap();

    assert_eq!(
        rig.link.calls_to("sg_initialize"),
        vec![vec![Value::Int(0), Value::Int(2)]]
    );
    assert_eq!(rig.elapsed(), Duration::from_secs(2));
}

#[test]
fn test_sg_initialize_failure_code_is_fault() {
    let rig = Rig::with_device(DeviceIdentity::Sg);
    rig.link.returns("sg_initialize", -1i64);
    let gripper = sg(&rig);

    assert!(matches!(
        gripper.initialize(SgTool::SgA),
        Err(CommandError::DeviceFault { family: "SG", .. })
    ));
    // 失败时不做稳定等待
    assert_eq!(rig.elapsed(), Duration::ZERO);
    assert!(matches!(
        gripper.initialize_id(4),
        Err(CommandError::InvalidParameter { param: "tool_id", .. })
    ));
}

#[test]
fn test_sg_width_checked_against_open_limits() {
    let rig = Rig::with_device(DeviceIdentity::Sg);
    rig.link.returns("sg_get_initialized", true);
    rig.link.returns("sg_grip", Value::Nil);
    let gripper = sg(&rig);

    assert!(gripper.grip(80, true).is_err());
    gripper.gentle_grip(40, true).unwrap();
    assert_eq!(
        rig.link.calls_to("sg_grip"),
        vec![vec![
            Value::Int(0),
            Value::Int(40),
            Value::Bool(true),
            Value::Bool(true),
        ]]
    );
}

// ==================== MG ====================

#[test]
fn test_mg_smart_grip_unavailable() {
    let rig = Rig::with_device(DeviceIdentity::Mg);
    rig.link.returns("mg_smart_grip_available", false);
    let gripper = Mg::from_handle(rig.handle(&MG_FAMILY, ToolSlot::Single));

    assert!(matches!(
        gripper.smart_grip(50, true),
        Err(CommandError::Usage(_))
    ));
    assert_eq!(rig.link.call_count("mg_grip"), 0);
}

#[test]
fn test_mg_grip_strength_not_reached_times_out_after_one_poll() {
    let rig = Rig::with_device(DeviceIdentity::Mg);
    rig.link.returns("mg_grip", Value::Nil);
    rig.link.returns("mg_get_busy", false);
    rig.link.returns("mg_get_magnet_strength_not_reached", true);
    let gripper = Mg::from_handle(rig.handle(&MG_FAMILY, ToolSlot::Single));

    let err = gripper.grip(80, true).unwrap_err();
    assert_eq!(
        err.outcome(),
        Some(CommandOutcome::TimedOut(PhaseId::new(
            1,
            PhaseKind::StrengthReached
        )))
    );
    assert_eq!(rig.link.call_count("mg_get_magnet_strength_not_reached"), 1);
}

#[test]
fn test_mg_auto_calibrate_continues_after_failed_release() {
    let rig = Rig::with_device(DeviceIdentity::Mg);
    rig.link.returns("mg_release", Value::Nil);
    rig.link.returns("mg_auto_calibrate", Value::Nil);
    rig.link.returns("mg_get_busy", false);
    // 第一次释放后仍有磁力，之后归零
    rig.link.sequence(
        "mg_get_magnet_strength_percent",
        vec![Value::Double(40.0), Value::Double(0.0)],
    );
    let gripper = Mg::from_handle(rig.handle(&MG_FAMILY, ToolSlot::Single));

    gripper.auto_calibrate().unwrap();

    assert_eq!(rig.link.call_count("mg_auto_calibrate"), 1);
    assert_eq!(rig.link.call_count("mg_release"), 2);
}

#[test]
fn test_mg_auto_calibrate_sequence() {
    let rig = Rig::with_device(DeviceIdentity::Mg);
    rig.link.returns("mg_release", Value::Nil);
    rig.link.returns("mg_auto_calibrate", Value::Nil);
    rig.link.returns("mg_get_magnet_strength_percent", 0.0);
    // 第一次释放立即空闲，标定忙碌 9 次后清除
    let mut busy = vec![Value::Bool(false)];
    busy.extend(bool_from(10, false));
    rig.link.sequence("mg_get_busy", busy);
    let gripper = Mg::from_handle(rig.handle(&MG_FAMILY, ToolSlot::Single));

    gripper.auto_calibrate().unwrap();

    let mut expected = vec![
        "mg_release",
        "mg_get_busy",
        "mg_get_magnet_strength_percent",
        "mg_auto_calibrate",
    ];
    expected.extend(["mg_get_busy"; 10]);
    expected.extend(["mg_release", "mg_get_busy", "mg_get_magnet_strength_percent"]);
    assert_eq!(rig.commands(), expected);
    assert_eq!(rig.elapsed(), Duration::from_millis(900));
}
