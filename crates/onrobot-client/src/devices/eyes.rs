//! Eyes 视觉系统
//!
//! 控制器级功能，通过 `eye_is_connected` 检查连接。机器人当前位姿由调用方
//! 提供；控制器返回全零位姿表示没有有效位置，此时返回 `InvalidPose`。

use crate::engine::Sleeper;
use crate::error::{CommandError, CommandResult};
use crate::handle::{ActuatorHandle, Addressing, FamilyDescriptor, Presence};
use onrobot_driver::DeviceSession;
use onrobot_protocol::{Pose, ROBOT_TYPE_DOOSAN, ToolSlot, Value};
use std::sync::Arc;

pub static EYES_FAMILY: FamilyDescriptor = FamilyDescriptor {
    name: "Eyes",
    identities: &[],
    addressing: Addressing::Controller,
    presence: Presence::Method("eye_is_connected"),
};

/// 检测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectionResult {
    Invalid,
    Pass,
    Fail,
    Error,
    Unknown(i64),
}

impl From<i64> for InspectionResult {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::Invalid,
            1 => Self::Pass,
            2 => Self::Fail,
            -1 => Self::Error,
            other => Self::Unknown(other),
        }
    }
}

/// Eyes 句柄
#[derive(Debug, Clone)]
pub struct Eyes {
    handle: ActuatorHandle,
    robot_type: i64,
}

impl Eyes {
    /// 使用会话配置中的机器人类型
    pub fn new(session: &DeviceSession) -> Self {
        Self::from_handle(ActuatorHandle::new(
            session,
            &EYES_FAMILY,
            ToolSlot::default(),
        ))
        .with_robot_type(session.config().robot_type)
    }

    pub fn from_handle(handle: ActuatorHandle) -> Self {
        Self {
            handle,
            robot_type: ROBOT_TYPE_DOOSAN,
        }
    }

    pub fn with_robot_type(mut self, robot_type: i64) -> Self {
        self.robot_type = robot_type;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.handle = self.handle.with_sleeper(sleeper);
        self
    }

    pub fn handle(&self) -> &ActuatorHandle {
        &self.handle
    }

    pub fn is_connected(&self) -> CommandResult<bool> {
        Ok(self.handle.raw_call("eye_is_connected", &[])?.as_bool()?)
    }

    // ==================== 任务 ====================

    /// 运行定位任务，返回找到的工件数
    ///
    /// 控制器以 -1 表示未找到，这里统一为 0。
    pub fn locate(&self, task_id: i64, current_pose: &Pose) -> CommandResult<u32> {
        self.handle.ensure_connected()?;
        let found = self
            .handle
            .raw_call(
                "eye_run_process",
                &[
                    Value::Int(task_id),
                    current_pose.to_value(),
                    Value::Int(self.robot_type),
                ],
            )?
            .as_i64()?;
        Ok(u32::try_from(found).unwrap_or(0))
    }

    /// 运行检测任务（与定位使用同一远程方法）
    pub fn inspect(&self, task_id: i64, current_pose: &Pose) -> CommandResult<u32> {
        self.locate(task_id, current_pose)
    }

    /// 从队列取下一个工件的抓取位姿
    ///
    /// # 错误
    ///
    /// - `gripper` 不在 {0, 1, 2}：`InvalidParameter`
    /// - 返回全零位姿：`InvalidPose`
    pub fn next_object(&self, gripper: i64, model: i64) -> CommandResult<Pose> {
        self.handle.ensure_connected()?;
        self.handle.check_one_of("gripper", gripper, &[0, 1, 2])?;
        let pose = self.handle.raw_call(
            "eye_get_valid_object",
            &[Value::Int(gripper), Value::Int(model)],
        )?;
        self.valid_pose(&pose, "object position")
    }

    /// 外部安装相机标定：上报当前位姿
    pub fn external_calibrate(&self, current_pose: &Pose) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        self.handle
            .raw_call(
                "eye_calibrate",
                &[current_pose.to_value(), Value::Int(self.robot_type)],
            )
            .map(|_| ())
    }

    // ==================== 工件 ====================

    /// 队列中剩余工件数
    pub fn workpiece_count(&self) -> CommandResult<i64> {
        self.handle.ensure_connected()?;
        Ok(self.handle.raw_call("eye_get_workpiece_count", &[])?.as_i64()?)
    }

    pub fn workpiece_type(&self) -> CommandResult<i64> {
        self.handle.ensure_connected()?;
        Ok(self.handle.raw_call("eye_get_workpiece_type", &[])?.as_i64()?)
    }

    pub fn inspection_result(&self) -> CommandResult<InspectionResult> {
        self.handle.ensure_connected()?;
        let code = self
            .handle
            .raw_call("eye_get_workpiece_inspection_eval", &[])?
            .as_i64()?;
        Ok(code.into())
    }

    /// 检测匹配度（0..=100 %，-1 表示检测出错）
    pub fn inspection_match(&self) -> CommandResult<f64> {
        self.handle.ensure_connected()?;
        Ok(self
            .handle
            .raw_call("eye_get_workpiece_inspection_match_percentage", &[])?
            .as_f64()?)
    }

    // ==================== 位姿 ====================

    /// 地标在机器人坐标系下的位姿
    pub fn landmark(&self, current_pose: &Pose) -> CommandResult<Pose> {
        self.handle.ensure_connected()?;
        let pose = self.handle.raw_call(
            "eye_landmark_orig",
            &[current_pose.to_value(), Value::Int(self.robot_type)],
        )?;
        self.valid_pose(&pose, "landmark position")
    }

    /// 把当前位姿保存为相机视角位姿
    pub fn save_camera_pose(&self, current_pose: &Pose) -> CommandResult<()> {
        self.handle.ensure_connected()?;
        let saved = self
            .handle
            .raw_call(
                "eye_set_cameraview_pose",
                &[current_pose.to_value(), Value::Int(self.robot_type)],
            )?
            .as_bool()?;
        if saved {
            Ok(())
        } else {
            Err(self.handle.fail(CommandError::device_fault(
                EYES_FAMILY.name,
                "failed to save camera view pose",
            )))
        }
    }

    /// 任务对应的相机视角位姿
    pub fn camera_pose(&self, task_id: i64) -> CommandResult<Pose> {
        self.handle.ensure_connected()?;
        let pose = self.handle.raw_call(
            "eye_get_cameraview_pose",
            &[Value::Int(task_id), Value::Int(self.robot_type)],
        )?;
        self.valid_pose(&pose, "camera pose")
    }

    fn valid_pose(&self, value: &Value, what: &str) -> CommandResult<Pose> {
        let pose = Pose::from_value(value)?;
        if pose.is_zero() {
            return Err(self
                .handle
                .fail(CommandError::InvalidPose(format!("no valid {what}"))));
        }
        Ok(pose)
    }
}
