//! 真空类设备的确认与补偿场景

mod common;

use common::Rig;
use onrobot_client::devices::{FGP_FAMILY, Fgp, VG_FAMILY, VGP_FAMILY, Vg, Vgp};
use onrobot_client::{ChannelMask, CommandError, CommandOutcome, PhaseId, PhaseKind};
use onrobot_protocol::{DeviceIdentity, ToolSlot, Value};
use std::time::Duration;

fn levels(a: f64, b: f64) -> Value {
    Value::Array(vec![Value::Double(a), Value::Double(b)])
}

fn vg(rig: &Rig) -> Vg {
    rig.link.returns("vg10_grip", Value::Nil);
    rig.link.returns("vg10_release", Value::Nil);
    Vg::from_handle(rig.handle(&VG_FAMILY, ToolSlot::Single))
}

// ==================== VG ====================

#[test]
fn test_vg_releases_only_channel_below_target() {
    let rig = Rig::with_device(DeviceIdentity::Vgc10);
    rig.link.returns("vg10_get_all_double_variables", levels(45.0, 12.0));
    let gripper = vg(&rig);

    let err = gripper.grip(40.0, 40.0, true).unwrap_err();

    assert_eq!(
        err,
        CommandError::VacuumNotReached {
            channels: ChannelMask::B
        }
    );
    assert_eq!(
        err.outcome(),
        Some(CommandOutcome::TimedOut(PhaseId::VACUUM))
    );
    assert_eq!(
        rig.link.calls_to("vg10_grip"),
        vec![
            vec![Value::Int(0), Value::Int(0), Value::Double(40.0)],
            vec![Value::Int(0), Value::Int(1), Value::Double(40.0)],
        ]
    );
    // A 保持吸附，只关闭 B
    assert_eq!(
        rig.link.calls_to("vg10_release"),
        vec![vec![Value::Int(0), Value::Bool(false), Value::Bool(true)]]
    );
    assert_eq!(rig.link.call_count("vg10_get_all_double_variables"), 40);
    assert_eq!(rig.elapsed(), Duration::from_millis(3900));
}

#[test]
fn test_vg_zero_target_channel_is_not_monitored() {
    let rig = Rig::with_device(DeviceIdentity::Vg10);
    rig.link.sequence(
        "vg10_get_all_double_variables",
        vec![levels(10.0, 0.0), levels(31.0, 0.0)],
    );
    let gripper = vg(&rig);

    gripper.grip(30.0, 0.0, true).unwrap();

    assert_eq!(rig.link.call_count("vg10_release"), 0);
    assert_eq!(rig.elapsed(), Duration::from_millis(100));
}

#[test]
fn test_vg_target_above_max_is_rejected() {
    let rig = Rig::with_device(DeviceIdentity::Vg10);
    let gripper = vg(&rig);
    assert!(matches!(
        gripper.grip(20.0, 81.0, true),
        Err(CommandError::InvalidParameter { param: "vacuum_b", .. })
    ));
    assert_eq!(rig.link.call_count("vg10_grip"), 0);
}

#[test]
fn test_vg_release_waits_for_selected_channel() {
    let rig = Rig::with_device(DeviceIdentity::Vg10);
    // B 仍有真空但未被选中
    rig.link.sequence(
        "vg10_get_all_double_variables",
        vec![levels(20.0, 50.0), levels(3.0, 50.0), levels(0.05, 50.0)],
    );
    let gripper = vg(&rig);

    gripper.release(true, false, true).unwrap();

    assert_eq!(
        rig.link.calls_to("vg10_release"),
        vec![vec![Value::Int(0), Value::Bool(true), Value::Bool(false)]]
    );
    assert_eq!(rig.link.call_count("vg10_get_all_double_variables"), 3);
}

// ==================== VGP ====================

fn vgp(rig: &Rig) -> Vgp {
    rig.link.returns("vgp_grip", Value::Nil);
    rig.link.returns("vgp_release", Value::Nil);
    rig.link.returns("vgp_get_busy", false);
    Vgp::from_handle(rig.handle(&VGP_FAMILY, ToolSlot::Single))
}

#[test]
fn test_vgp_grip_without_channels_is_usage_error() {
    let rig = Rig::with_device(DeviceIdentity::Vgp);
    let gripper = vgp(&rig);

    let err = gripper.grip(40, true).unwrap_err();

    assert!(matches!(err, CommandError::Usage(_)));
    assert!(err.is_rejected_before_dispatch());
    assert_eq!(rig.link.call_count("vgp_grip"), 0);
}

#[test]
fn test_vgp_grip_sends_accumulated_masks() {
    let rig = Rig::with_device(DeviceIdentity::Vgp);
    let gripper = vgp(&rig);

    assert_eq!(gripper.set_grip_channels(&[ChannelMask::A]).unwrap(), ChannelMask::A);
    assert_eq!(
        gripper
            .set_grip_channels(&[ChannelMask::B, ChannelMask::C])
            .unwrap(),
        ChannelMask::A | ChannelMask::B | ChannelMask::C
    );
    gripper.set_timeout_channels(&[ChannelMask::A]).unwrap();

    gripper.grip(40, true).unwrap();

    assert_eq!(
        rig.link.calls_to("vgp_grip"),
        vec![vec![Value::Int(0), Value::Int(0x07), Value::Int(0x01), Value::Int(40)]]
    );
}

#[test]
fn test_vgp_masks_are_per_slot_and_shared() {
    let rig = Rig::with_device(DeviceIdentity::Vgp);
    let primary = vgp(&rig);
    primary.set_grip_channels(&[ChannelMask::ALL]).unwrap();

    let secondary = primary.for_slot(ToolSlot::DualSecondary);
    assert_eq!(secondary.grip_channels(), ChannelMask::EMPTY);
    secondary.set_grip_channels(&[ChannelMask::D]).unwrap();

    assert_eq!(primary.grip_channels(), ChannelMask::ALL);
    assert_eq!(
        primary.for_slot(ToolSlot::DualSecondary).grip_channels(),
        ChannelMask::D
    );
    assert_eq!(primary.clone().grip_channels(), ChannelMask::ALL);
}

#[test]
fn test_vgp_release_channel_arity() {
    let rig = Rig::with_device(DeviceIdentity::Vgp);
    let gripper = vgp(&rig);

    assert!(matches!(
        gripper.release(true, &[]),
        Err(CommandError::Usage(_))
    ));
    assert!(matches!(
        gripper.release(true, &[ChannelMask::A; 5]),
        Err(CommandError::Usage(_))
    ));
    // 合并后为空的掩码同样视为用法错误
    assert!(matches!(
        gripper.release(true, &[ChannelMask::EMPTY]),
        Err(CommandError::Usage(_))
    ));
    assert!(matches!(
        gripper.release(false, &[ChannelMask::EMPTY, ChannelMask::EMPTY]),
        Err(CommandError::Usage(_))
    ));
    assert_eq!(rig.link.call_count("vgp_release"), 0);

    gripper
        .release(true, &[ChannelMask::A, ChannelMask::D])
        .unwrap();
    assert_eq!(
        rig.link.calls_to("vgp_release"),
        vec![vec![Value::Int(0), Value::Int(0x09)]]
    );
}

// ==================== 2FGP20 ====================

#[test]
fn test_fgp_vacuum_grip_waits_for_grip_status() {
    let rig = Rig::with_device(DeviceIdentity::TwoFgp20);
    rig.link.returns("fgp_vg_grip", Value::Nil);
    rig.link.returns("fgp_get_busy", false);
    rig.link.sequence(
        "fgp_get_vg_grip_status",
        vec![Value::Int(0), Value::Int(0), Value::Int(1)],
    );
    let gripper = Fgp::from_handle(rig.handle(&FGP_FAMILY, ToolSlot::Single));

    gripper.vacuum_grip(40, true).unwrap();

    assert_eq!(
        rig.link.calls_to("fgp_vg_grip"),
        vec![vec![Value::Int(0), Value::Bool(true), Value::Int(40)]]
    );
    assert_eq!(rig.elapsed(), Duration::from_millis(200));
}

#[test]
fn test_fgp_vacuum_grip_timeout_phase() {
    let rig = Rig::with_device(DeviceIdentity::TwoFgp20);
    rig.link.returns("fgp_vg_grip", Value::Nil);
    rig.link.returns("fgp_get_busy", false);
    rig.link.returns("fgp_get_vg_grip_status", 0i64);
    let gripper = Fgp::from_handle(rig.handle(&FGP_FAMILY, ToolSlot::Single));

    assert_eq!(
        gripper.vacuum_grip(40, true).unwrap_err(),
        CommandError::TimedOut {
            family: FGP_FAMILY.name,
            phase: PhaseId::new(1, PhaseKind::VacuumGripped),
        }
    );
}
