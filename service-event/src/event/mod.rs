//! 事件模型（event）
//!
//! - `ServiceEvent`：描述“发生了什么、作用于哪个实体、在哪个租户作用域、由谁触发”的规范记录；
//! - `EventStatus`：记录投递状态（`CREATED`/`SENT`/`SEND_ERROR`），`SENT` 为终态；
//! - `EventScope`：调用栈作用域，保证一次业务调用树只产生一条逻辑事件。
//!
mod record;
mod scope;

pub use record::{EventStatus, ServiceEvent};
pub use scope::EventScope;
