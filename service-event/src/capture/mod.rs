//! 事件捕获（capture）
//!
//! 把“对业务操作的一次调用”透明地合成为一条 `ServiceEvent`：
//! - `EventArg`/`TrackedEntity`/`EventAwareService`：以显式声明代替运行时反射的
//!   参数与服务能力元数据；
//! - `RaiseEvent`：非实体服务形态下随操作声明的静态元数据；
//! - `RaiseEventInterceptor`：包裹操作调用，落库、执行、成功后发布。
//!
mod args;
mod interceptor;

pub use args::{EventArg, EventAwareService, RaiseEvent, TrackedEntity, render_inputs};
pub use interceptor::RaiseEventInterceptor;
