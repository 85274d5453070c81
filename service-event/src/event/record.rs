//! 事件记录（ServiceEvent）
//!
//! 定义事件在捕获、持久化与总线投递之间流转的标准形态：
//! 拦截器在业务操作执行前创建并填充记录，发布结果与补偿任务只改写状态字段。
//!
use crate::error::EventError;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 事件投递状态
///
/// 状态迁移单调：`Created -> {Sent | SendError}`，`SendError` 经补偿可到 `Sent`；
/// 任何写入都不得把记录退回 `Created`，`Sent` 为不可覆盖的终态。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// 已随业务事务落库，尚未尝试（或尚未成功确认）投递
    #[default]
    Created,
    /// 已成功送达总线（终态）
    Sent,
    /// 投递失败，等待补偿重试
    SendError,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Created => "CREATED",
            EventStatus::Sent => "SENT",
            EventStatus::SendError => "SEND_ERROR",
        }
    }

    /// `Sent` 是终态：后到的过期写入不得覆盖
    pub fn is_terminal(self) -> bool {
        matches!(self, EventStatus::Sent)
    }

    /// 并发写合并规则：`Sent` 恒胜，且不允许回到 `Created`
    pub fn merge(current: EventStatus, requested: EventStatus) -> EventStatus {
        match (current, requested) {
            (EventStatus::Sent, _) => EventStatus::Sent,
            (current, EventStatus::Created) => current,
            (_, requested) => requested,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(EventStatus::Created),
            "SENT" => Ok(EventStatus::Sent),
            "SEND_ERROR" => Ok(EventStatus::SendError),
            other => Err(EventError::Parse {
                reason: format!("unknown event status: {other}"),
            }),
        }
    }
}

/// 服务事件记录
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
pub struct ServiceEvent {
    /// 事件唯一标识符，创建时分配且不可变
    id: String,
    /// 上下文 ID：同一嵌套调用树内的所有事件共享，由最外层作用域分配
    context_id: String,
    /// 事件发生时间
    timestamp: DateTime<Utc>,
    /// 触发操作的用户 ID
    user_id: String,
    /// 租户作用域 ID（可能被参数中的实体作用域覆盖）
    scope_id: String,
    /// 逻辑服务名（服务接口名）
    service: String,
    /// 实体类型；无法确定时为空，投递不受影响
    entity_type: Option<String>,
    /// 实体 ID；非实体操作为空
    entity_id: Option<String>,
    /// 操作（方法/动作）名
    operation: String,
    /// 调用参数的人类可读渲染，尽力而为
    #[builder(default)]
    inputs: String,
    /// 来自静态元数据的自由文本注记
    note: Option<String>,
    /// 投递状态
    #[builder(default)]
    status: EventStatus,
}

impl ServiceEvent {
    /// 创建一条空白记录：分配新的 `id` 与 `context_id`，状态为 `Created`
    pub fn new() -> Self {
        ServiceEvent {
            id: Uuid::new_v4().to_string(),
            context_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            user_id: String::new(),
            scope_id: String::new(),
            service: String::new(),
            entity_type: None,
            entity_id: None,
            operation: String::new(),
            inputs: String::new(),
            note: None,
            status: EventStatus::Created,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn scope_id(&self) -> &str {
        &self.scope_id
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn entity_type(&self) -> Option<&str> {
        self.entity_type.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn inputs(&self) -> &str {
        &self.inputs
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }

    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = timestamp;
    }

    pub fn set_user_id(&mut self, user_id: impl Into<String>) {
        self.user_id = user_id.into();
    }

    pub fn set_scope_id(&mut self, scope_id: impl Into<String>) {
        self.scope_id = scope_id.into();
    }

    pub fn set_service(&mut self, service: impl Into<String>) {
        self.service = service.into();
    }

    pub fn set_entity_type(&mut self, entity_type: Option<String>) {
        self.entity_type = entity_type;
    }

    pub fn set_entity_id(&mut self, entity_id: Option<String>) {
        self.entity_id = entity_id;
    }

    pub fn set_operation(&mut self, operation: impl Into<String>) {
        self.operation = operation.into();
    }

    pub fn set_inputs(&mut self, inputs: impl Into<String>) {
        self.inputs = inputs.into();
    }

    pub fn set_note(&mut self, note: Option<String>) {
        self.note = note;
    }

    pub fn set_status(&mut self, status: EventStatus) {
        self.status = status;
    }
}

impl Default for ServiceEvent {
    fn default() -> Self {
        ServiceEvent::new()
    }
}
