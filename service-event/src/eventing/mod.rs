//! 事件投递（eventing）
//!
//! 提供事件从 Outbox 到消息总线的投递侧构件：
//! - `EventBusPublisher`：把序列化后的事件送达目标地址的最小协议；
//! - `ServiceRoutes`：启动时装载一次的 `服务名 -> 总线地址` 静态映射；
//! - `Housekeeper`：周期补偿卡在非终态的记录，与拦截器并发收敛到 `SENT`；
//! - `InMemoryEventBus`：测试与本地开发用的内存实现。
//!
//! 该模块仅定义协议与调度，不绑定具体传输实现，可对接任意消息系统。
//!
pub mod bus;
pub mod bus_inmemory;
pub mod housekeeper;
pub mod routes;

pub use bus::EventBusPublisher;
pub use bus_inmemory::InMemoryEventBus;
pub use housekeeper::{Housekeeper, HousekeeperConfig, HousekeeperHandle};
pub use routes::ServiceRoutes;

use crate::event::{EventStatus, ServiceEvent};
use crate::store::EventStore;
use tracing::{debug, info, warn};

/// 发布步骤：解析地址、发布、按并发合并规则改写状态。
///
/// 总线不可用不会向上冒泡——业务操作不得因消息系统故障而失败；
/// 状态写入败给并发写方（拦截器与 Housekeeper 互为对方）同样只记录日志。
pub(crate) async fn publish_and_mark(
    store: &dyn EventStore,
    bus: &dyn EventBusPublisher,
    routes: &ServiceRoutes,
    event: &ServiceEvent,
) {
    let outcome = match routes.address_of(event.service()) {
        Ok(address) => match bus.publish(address, event).await {
            Ok(()) => {
                info!(
                    service = event.service(),
                    address,
                    entity_type = ?event.entity_type(),
                    entity_id = ?event.entity_id(),
                    context_id = event.context_id(),
                    "SENT event"
                );
                EventStatus::Sent
            }
            Err(err) => {
                warn!(event_id = event.id(), error = %err, "error sending event");
                EventStatus::SendError
            }
        },
        Err(err) => {
            warn!(
                service = event.service(),
                error = %err,
                "cannot resolve bus address for event"
            );
            EventStatus::SendError
        }
    };

    // 状态更新可能与对侧（拦截器或 Housekeeper）的独立重试竞争，
    // 合并规则保证 SENT 不被过期写覆盖，这里失败只记日志
    match store.update_status(event.id(), outcome).await {
        Ok(persisted) if persisted != outcome => {
            debug!(
                event_id = event.id(),
                requested = %outcome,
                persisted = %persisted,
                "status update superseded by concurrent writer"
            );
        }
        Ok(_) => {}
        Err(err) => {
            warn!(event_id = event.id(), error = %err, "error updating event status");
        }
    }
}
