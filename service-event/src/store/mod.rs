//! 事件存储（store）
//!
//! 以 `id` 寻址的持久化事件日志，充当预写日志/Outbox：
//! - `EventStore`：插入、按 ID 查找、条件状态更新与待投递列表查询的协议；
//! - `InMemoryEventStore`：测试与示例用的内存实现。
//!
//! 该模块聚焦协议与并发合并语义，具体存储后端由上层提供实现并注入。
//!
mod event_store;
mod store_inmemory;

pub use event_store::EventStore;
pub use store_inmemory::InMemoryEventStore;
