//! 操作拦截器（RaiseEventInterceptor）
//!
//! 包裹事件触发型操作的一次调用：打开/复用 `EventScope`，提取元数据，
//! 先以 `Created` 状态落库（预写），再执行业务逻辑；仅在业务成功后
//! 解析地址并发布，业务结果/错误原样透传给调用方。
//!
//! 失败语义：元数据提取、落库与发布的任何失败都只记录日志并就地恢复，
//! 事件捕获永不阻断业务操作；只有业务操作自身的错误才会冒泡。
//!
use crate::capture::args::{EventArg, EventAwareService, RaiseEvent, TrackedEntity, render_inputs};
use crate::event::{EventScope, ServiceEvent};
use crate::eventing::{EventBusPublisher, ServiceRoutes, publish_and_mark};
use crate::session::SessionProvider;
use crate::store::EventStore;
use bon::Builder;
use chrono::Utc;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// 事件拦截器：每次最外层调用恰好合成一条 `ServiceEvent`
#[derive(Builder)]
pub struct RaiseEventInterceptor {
    store: Arc<dyn EventStore>,
    bus: Arc<dyn EventBusPublisher>,
    routes: Arc<ServiceRoutes>,
    sessions: Arc<dyn SessionProvider>,
}

impl RaiseEventInterceptor {
    /// 实体服务策略：服务名与实体类型来自 `EventAwareService` 声明，
    /// 实体/标识信息按参数顺序扫描推断。
    pub async fn invoke<T, E, F>(
        &self,
        service: &dyn EventAwareService,
        operation: &str,
        args: &[EventArg<'_>],
        op: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        if EventScope::active() {
            // 嵌套进入：复用既有记录，零新增、零发布
            return EventScope::nested(op).await;
        }

        let mut record = self.open_record(args);
        self.fill_entity_event(&mut record, service, operation, args);
        self.run_scoped(record, op).await
    }

    /// 注解策略：服务不具备实体服务形态时，逐字采用操作上声明的静态元数据。
    pub async fn invoke_annotated<T, E, F>(
        &self,
        metadata: &RaiseEvent,
        args: &[EventArg<'_>],
        op: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        if EventScope::active() {
            return EventScope::nested(op).await;
        }

        let mut record = self.open_record(args);
        record.set_service(metadata.service());
        record.set_entity_type(metadata.entity_type().map(str::to_string));
        record.set_operation(metadata.operation());
        record.set_note(metadata.note().map(str::to_string));
        self.run_scoped(record, op).await
    }

    /// 创建最外层记录：新的 `id`/`context_id`，时间戳与会话身份，渲染 `inputs`
    fn open_record(&self, args: &[EventArg<'_>]) -> ServiceEvent {
        let session = self.sessions.session();
        let mut record = ServiceEvent::new();
        record.set_timestamp(Utc::now());
        record.set_user_id(session.user_id());
        record.set_scope_id(session.scope_id());
        record.set_inputs(render_inputs(args));
        record
    }

    /// 实体服务策略的元数据提取。
    ///
    /// 参数扫描保持遗留的顺序约定（下游消费方可能依赖）：
    /// - 首个实体参数直接胜出，其类型/标识/作用域覆盖一切；
    /// - 否则首个标识符暂定为 entity id；出现第二个时，第一个改判为
    ///   scope id、第二个为 entity id，扫描即止；
    /// - 未发现实体实例时，实体类型回落到服务声明的实体泛型。
    ///
    /// 提取不到的字段保持为空并记录日志，投递照常进行。
    fn fill_entity_event(
        &self,
        record: &mut ServiceEvent,
        service: &dyn EventAwareService,
        operation: &str,
        args: &[EventArg<'_>],
    ) {
        record.set_operation(operation);
        record.set_service(service.service_name());

        let mut entity: Option<&dyn TrackedEntity> = None;
        let mut scope_id: Option<&str> = None;
        let mut entity_id: Option<&str> = None;
        for arg in args {
            match arg {
                EventArg::Entity(found) => {
                    entity = Some(*found);
                    break;
                }
                EventArg::Id(id) => {
                    if let Some(first) = entity_id {
                        scope_id = Some(first);
                        entity_id = Some(id);
                        break;
                    }
                    entity_id = Some(id);
                }
                EventArg::Value(_) => {}
            }
        }

        if let Some(entity) = entity {
            debug!(
                entity_type = entity.entity_type(),
                entity_id = %entity.entity_id(),
                "entity argument found"
            );
            record.set_entity_type(Some(entity.entity_type().to_string()));
            record.set_entity_id(Some(entity.entity_id()));
            record.set_scope_id(entity.scope_id());
        } else {
            // 参数中未检出 scope 时保留会话作用域
            if let Some(scope_id) = scope_id {
                record.set_scope_id(scope_id);
            }
            record.set_entity_id(entity_id.map(str::to_string));
            match service.entity_type() {
                Some(entity_type) => record.set_entity_type(Some(entity_type.to_string())),
                None => warn!(
                    service = service.service_name(),
                    "service declares no entity type, event recorded without one"
                ),
            }
        }
    }

    /// 预写落库，在作用域内执行业务操作，成功后发布。
    async fn run_scoped<T, E, F>(&self, record: ServiceEvent, op: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        // 预写插入是唯一必须先于业务逻辑的同步步骤；失败不阻断业务，
        // 后续状态更新会以 NotFound 暴露这次缺口
        if let Err(err) = self.store.insert(&record).await {
            warn!(event_id = record.id(), error = %err, "error inserting outbox record");
        }

        let cell = Arc::new(Mutex::new(record));
        let shared = cell.clone();
        EventScope::enter(cell, async move {
            let result = op.await;
            if result.is_ok() {
                let snapshot = shared
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .clone();
                publish_and_mark(
                    self.store.as_ref(),
                    self.bus.as_ref(),
                    &self.routes,
                    &snapshot,
                )
                .await;
            }
            result
        })
        .await
    }
}
