//! 工具箱：一个会话上的所有设备句柄
//!
//! [`OnRobot`] 持有会话与轮询睡眠实现，按设备族创建句柄。所有句柄共用
//! 同一条链路；机器人类型只在链路首次建立时上报一次。

use onrobot_client::devices::{
    COMPUTE_BOX_FAMILY, ComputeBox, EYES_FAMILY, Eyes, FGP_FAMILY, Fgp, HEX_FAMILY, Hex,
    LIFT_FAMILY, Lift, MG_FAMILY, Mg, RG_FAMILY, RG2FT_FAMILY, Rg, Rg2Ft, SANDER_FAMILY, SG_FAMILY,
    SCREWDRIVER_FAMILY, Sander, Screwdriver, Sg, THREE_FG_FAMILY, TWO_FG_FAMILY, ThreeFg, TwoFg,
    VG_FAMILY, VGP_FAMILY, Vg, Vgp, WEBLYTICS_FAMILY, Weblytics,
};
use onrobot_client::{ActuatorHandle, CommandResult, FamilyDescriptor, Sleeper, ThreadSleeper};
use onrobot_driver::{DeviceSession, DriverError, RemoteLink, SessionBuilder, SessionConfig};
use onrobot_protocol::ToolSlot;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// OnRobot 工具箱
///
/// # Example
///
/// ```no_run
/// use onrobot_sdk::{OnRobot, ToolSlot};
///
/// let tools = OnRobot::builder().controller_ip("192.168.1.1").build()?;
/// let vg = tools.vg(ToolSlot::DualPrimary);
/// let rg = tools.rg(ToolSlot::DualSecondary);
/// # Ok::<(), onrobot_sdk::DriverError>(())
/// ```
pub struct OnRobot {
    session: DeviceSession,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for OnRobot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnRobot")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl OnRobot {
    /// 使用 XML-RPC over HTTP 链路（首次使用时连接）
    pub fn new(config: SessionConfig) -> Self {
        Self::from_session(DeviceSession::new(config))
    }

    pub fn from_session(session: DeviceSession) -> Self {
        Self {
            session,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// 会话构建器
    pub fn builder() -> OnRobotBuilder {
        OnRobotBuilder::default()
    }

    /// 从 TOML 配置文件创建
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self, DriverError> {
        Ok(Self::new(SessionConfig::load_from_file(path)?))
    }

    /// 替换所有后续句柄的轮询睡眠实现（仿真 / 测试）
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn session(&self) -> &DeviceSession {
        &self.session
    }

    /// 立即建立链路
    pub fn connect(&self) -> Result<(), DriverError> {
        self.session.connect()
    }

    fn handle(&self, family: &'static FamilyDescriptor, slot: ToolSlot) -> ActuatorHandle {
        ActuatorHandle::new(&self.session, family, slot).with_sleeper(self.sleeper.clone())
    }

    // ==================== 按槽位寻址的设备 ====================

    pub fn vg(&self, slot: ToolSlot) -> Vg {
        Vg::from_handle(self.handle(&VG_FAMILY, slot))
    }

    pub fn rg(&self, slot: ToolSlot) -> Rg {
        Rg::from_handle(self.handle(&RG_FAMILY, slot))
    }

    pub fn three_fg(&self, slot: ToolSlot) -> ThreeFg {
        ThreeFg::from_handle(self.handle(&THREE_FG_FAMILY, slot))
    }

    pub fn two_fg(&self, slot: ToolSlot) -> TwoFg {
        TwoFg::from_handle(self.handle(&TWO_FG_FAMILY, slot))
    }

    pub fn fgp(&self, slot: ToolSlot) -> Fgp {
        Fgp::from_handle(self.handle(&FGP_FAMILY, slot))
    }

    pub fn sg(&self, slot: ToolSlot) -> Sg {
        Sg::from_handle(self.handle(&SG_FAMILY, slot))
    }

    pub fn mg(&self, slot: ToolSlot) -> Mg {
        Mg::from_handle(self.handle(&MG_FAMILY, slot))
    }

    /// VGP 句柄；不同槽位请用 [`Vgp::for_slot`] 派生以共享通道掩码
    pub fn vgp(&self, slot: ToolSlot) -> Vgp {
        Vgp::from_handle(self.handle(&VGP_FAMILY, slot))
    }

    pub fn screwdriver(&self, slot: ToolSlot) -> Screwdriver {
        Screwdriver::from_handle(self.handle(&SCREWDRIVER_FAMILY, slot))
    }

    // ==================== 固定索引设备 ====================

    pub fn sander(&self) -> Sander {
        Sander::from_handle(self.handle(&SANDER_FAMILY, ToolSlot::default()))
    }

    pub fn hex(&self) -> Hex {
        Hex::from_handle(self.handle(&HEX_FAMILY, ToolSlot::default()))
    }

    pub fn rg2ft(&self) -> Rg2Ft {
        Rg2Ft::from_handle(self.handle(&RG2FT_FAMILY, ToolSlot::default()))
    }

    pub fn lift(&self) -> Lift {
        Lift::from_handle(self.handle(&LIFT_FAMILY, ToolSlot::default()))
    }

    // ==================== 控制器级功能 ====================

    /// Eyes 句柄，机器人类型取自会话配置
    pub fn eyes(&self) -> Eyes {
        Eyes::from_handle(self.handle(&EYES_FAMILY, ToolSlot::default()))
            .with_robot_type(self.session.config().robot_type)
    }

    pub fn compute_box(&self) -> ComputeBox {
        ComputeBox::from_handle(self.handle(&COMPUTE_BOX_FAMILY, ToolSlot::default()))
    }

    /// WebLytics 句柄（创建时清零所有用户变量）
    pub fn weblytics(&self) -> CommandResult<Weblytics> {
        Weblytics::from_handle(self.handle(&WEBLYTICS_FAMILY, ToolSlot::default()))
    }
}

/// [`OnRobot`] 构建器，转发到 [`SessionBuilder`]
#[derive(Default)]
pub struct OnRobotBuilder {
    session: SessionBuilder,
    sleeper: Option<Arc<dyn Sleeper>>,
}

impl OnRobotBuilder {
    pub fn controller_ip(mut self, ip: impl Into<String>) -> Self {
        self.session = self.session.controller_ip(ip);
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.session = self.session.port(port);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.session = self.session.request_timeout(timeout);
        self
    }

    pub fn robot_type(mut self, robot_type: i64) -> Self {
        self.session = self.session.robot_type(robot_type);
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.session = self.session.config(config);
        self
    }

    pub fn link(mut self, link: Arc<dyn RemoteLink>) -> Self {
        self.session = self.session.link(link);
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    pub fn build(self) -> Result<OnRobot, DriverError> {
        let tools = OnRobot::from_session(self.session.build()?);
        Ok(match self.sleeper {
            Some(sleeper) => tools.with_sleeper(sleeper),
            None => tools,
        })
    }
}
