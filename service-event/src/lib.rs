//! 服务事件子系统（service-event）
//!
//! 以“事务性发件箱（Transactional Outbox）”方式在服务实例之间传播实体生命周期事件：
//! - 事件模型（`event`）：`ServiceEvent` 记录与调用栈作用域 `EventScope`
//! - 捕获（`capture`）：拦截业务操作、提取元数据并合成事件记录
//! - 存储（`store`）：作为预写日志/Outbox 的事件存储协议与内存实现
//! - 投递（`eventing`）：总线发布协议、服务地址路由与后台补偿任务（Housekeeper）
//! - 会话（`session`）：提供调用方 `(user_id, scope_id)` 的安全上下文边界
//!
//! 本 crate 尽量保持与持久化与传输实现解耦，仅定义协议与最小必要的错误类型，
//! 以便在不同基础设施（例如 Postgres、消息中间件等）上进行适配实现。
//!
//! 典型用法：
//! 1. 为业务服务实现 `EventAwareService`（或为操作声明 `RaiseEvent` 静态元数据）；
//! 2. 通过 `RaiseEventInterceptor` 包裹事件触发型操作；
//! 3. 提供 `EventStore` 与 `EventBusPublisher` 的具体实现并注入；
//! 4. 启动 `Housekeeper` 周期补偿未送达的事件记录。
//!
pub mod capture;
pub mod error;
pub mod event;
pub mod eventing;
pub mod session;
pub mod store;
