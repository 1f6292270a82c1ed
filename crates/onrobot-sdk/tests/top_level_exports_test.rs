//! 顶层导出测试
//!
//! 验证核心类型可以从 `onrobot_sdk` 直接导入。

use onrobot_sdk::{
    ChannelMask, CommandError, CommandOutcome, DeviceIdentity, DriverError, OnRobot, Pose,
    ProtocolError, SessionBuilder, SessionConfig, ToolSlot, Value,
};

#[test]
fn test_top_level_exports() {
    let _builder: SessionBuilder = SessionBuilder::new();
    let _tools: OnRobot = OnRobot::new(SessionConfig::default());
    let _error: DriverError = DriverError::Timeout;
    let _protocol_error: ProtocolError = ProtocolError::UnknownIdentity(0x99);
    let _command_error: CommandError = CommandError::Usage("test".to_string());
    let _outcome = CommandOutcome::Confirmed;
    let _mask = ChannelMask::A | ChannelMask::B;
    let _value = Value::Int(1);

    assert_eq!(DeviceIdentity::TwoFg.code(), 0xC0);
    assert!(Pose::ZERO.is_zero());
    assert_eq!(ToolSlot::default(), ToolSlot::Single);
}

#[test]
fn test_layer_modules_reachable() {
    use onrobot_sdk::client::devices::RG_FAMILY;
    use onrobot_sdk::driver::UnusableLink;
    use onrobot_sdk::protocol::DEFAULT_PORT;

    assert_eq!(RG_FAMILY.name, "RG");
    assert_eq!(UnusableLink::new("down").reason(), "down");
    assert_eq!(DEFAULT_PORT, 41414);
}

#[test]
fn test_prelude() {
    use onrobot_sdk::prelude::*;

    let _direction = GripDirection::External;
    let _tool = SgTool::SgA;
    let _phase = PhaseId::new(0, PhaseKind::Busy);
    let _channel = Channel::C;
}
