//! 事件总线发布协议（EventBusPublisher）
//!
//! 本核心只依赖“把一条事件送达某个地址”的最小契约；
//! 主题寻址与线格式序列化对本子系统不可见，由传输实现自理。
//!
use crate::{error::EventResult as Result, event::ServiceEvent};
use async_trait::async_trait;

/// 总线发布者：将事件投递到目标地址，允许瞬时失败
#[async_trait]
pub trait EventBusPublisher: Send + Sync {
    async fn publish(&self, address: &str, event: &ServiceEvent) -> Result<()>;
}
