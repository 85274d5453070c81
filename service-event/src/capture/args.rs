//! 调用参数与服务能力元数据
//!
//! 服务与实体的判定不依赖运行时反射，全部来自编译期已知的显式声明：
//! 服务实现 `EventAwareService` 暴露逻辑服务名与其管理的实体类型，
//! 调用参数以 `EventArg` 的形态交给拦截器按序扫描。
//!
use bon::Builder;
use std::fmt::Display;

/// 领域实体的事件视角：类型名、标识与所属租户作用域
pub trait TrackedEntity: Send + Sync {
    fn entity_type(&self) -> &'static str;
    fn entity_id(&self) -> String;
    fn scope_id(&self) -> String;
}

/// 实体服务形态的能力元数据
///
/// `service_name` 是写入事件记录并用于地址路由的逻辑服务接口名；
/// `entity_type` 是该服务管理的实体类型，未绑定实体时为 `None`。
pub trait EventAwareService: Send + Sync {
    fn service_name(&self) -> &'static str;
    fn entity_type(&self) -> Option<&'static str>;
}

/// 一次调用的单个参数
///
/// 扫描规则依赖参数顺序（遗留约定，下游消费方可能依赖），见拦截器实现。
pub enum EventArg<'a> {
    /// 领域实体实例：其类型/标识/作用域直接胜出
    Entity(&'a dyn TrackedEntity),
    /// 标识符参数：按“先 scope 后 entity”的顺序约定参与判定
    Id(&'a str),
    /// 其他参数：仅参与 `inputs` 渲染
    Value(&'a (dyn Display + Sync)),
}

impl EventArg<'_> {
    /// 渲染为人类可读片段（用于 `inputs` 字段，尽力而为）
    pub fn render(&self) -> String {
        match self {
            EventArg::Entity(entity) => {
                format!("{}:{}", entity.entity_type(), entity.entity_id())
            }
            EventArg::Id(id) => (*id).to_string(),
            EventArg::Value(value) => value.to_string(),
        }
    }
}

/// 将参数列表渲染为 `inputs` 字段：`", "` 连接，无多余的尾分隔符
pub fn render_inputs(args: &[EventArg<'_>]) -> String {
    args.iter()
        .map(EventArg::render)
        .collect::<Vec<_>>()
        .join(", ")
}

/// 非实体服务形态下随操作声明的静态元数据（逐字写入事件记录）
#[derive(Builder, Debug, Clone)]
pub struct RaiseEvent {
    /// 逻辑服务名
    service: String,
    /// 实体类型（可缺省）
    entity_type: Option<String>,
    /// 操作名
    operation: String,
    /// 自由文本注记
    note: Option<String>,
}

impl RaiseEvent {
    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn entity_type(&self) -> Option<&str> {
        self.entity_type.as_deref()
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
}
