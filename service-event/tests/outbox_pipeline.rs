use async_trait::async_trait;
use service_event::capture::{
    EventArg, EventAwareService, RaiseEvent, RaiseEventInterceptor, TrackedEntity,
};
use service_event::error::{EventError, EventResult};
use service_event::event::{EventStatus, ServiceEvent};
use service_event::eventing::{
    EventBusPublisher, Housekeeper, HousekeeperConfig, ServiceRoutes,
};
use service_event::session::{Session, StaticSessionProvider};
use service_event::store::{EventStore, InMemoryEventStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct SpyBus {
    published: Arc<Mutex<Vec<(String, ServiceEvent)>>>,
    failures_left: Arc<AtomicUsize>,
}

impl SpyBus {
    fn fail_next(&self, times: usize) {
        self.failures_left.store(times, Ordering::Relaxed);
    }

    fn published(&self) -> Vec<(String, ServiceEvent)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventBusPublisher for SpyBus {
    async fn publish(&self, address: &str, event: &ServiceEvent) -> EventResult<()> {
        if self.failures_left.load(Ordering::Relaxed) > 0 {
            self.failures_left.fetch_sub(1, Ordering::Relaxed);
            return Err(EventError::bus("bus unreachable"));
        }
        self.published
            .lock()
            .unwrap()
            .push((address.to_string(), event.clone()));
        Ok(())
    }
}

struct DeviceService;

impl EventAwareService for DeviceService {
    fn service_name(&self) -> &'static str {
        "DeviceService"
    }
    fn entity_type(&self) -> Option<&'static str> {
        Some("device")
    }
}

struct BareService;

impl EventAwareService for BareService {
    fn service_name(&self) -> &'static str {
        "BareService"
    }
    fn entity_type(&self) -> Option<&'static str> {
        None
    }
}

struct UnroutedService;

impl EventAwareService for UnroutedService {
    fn service_name(&self) -> &'static str {
        "UnroutedService"
    }
    fn entity_type(&self) -> Option<&'static str> {
        None
    }
}

struct Device {
    id: String,
    scope_id: String,
}

impl TrackedEntity for Device {
    fn entity_type(&self) -> &'static str {
        "device"
    }
    fn entity_id(&self) -> String {
        self.id.clone()
    }
    fn scope_id(&self) -> String {
        self.scope_id.clone()
    }
}

fn routes() -> ServiceRoutes {
    [
        ("DeviceService", "events.device"),
        ("BareService", "events.bare"),
        ("MailService", "events.mail"),
    ]
    .into_iter()
    .collect()
}

fn interceptor(store: &InMemoryEventStore, bus: &SpyBus) -> RaiseEventInterceptor {
    RaiseEventInterceptor::builder()
        .store(Arc::new(store.clone()))
        .bus(Arc::new(bus.clone()))
        .routes(Arc::new(routes()))
        .sessions(Arc::new(StaticSessionProvider::new(Session::new(
            "u-100",
            "scope-session",
        ))))
        .build()
}

#[tokio::test]
async fn successful_delete_transitions_created_to_sent() -> anyhow::Result<()> {
    let store = InMemoryEventStore::new();
    let bus = SpyBus::default();
    let itx = interceptor(&store, &bus);

    let result: Result<(), String> = itx
        .invoke(
            &DeviceService,
            "delete",
            &[EventArg::Id("S1"), EventArg::Id("E1")],
            async { Ok(()) },
        )
        .await;
    assert!(result.is_ok());

    let published = bus.published();
    assert_eq!(published.len(), 1);
    let (address, event) = &published[0];
    assert_eq!(address, "events.device");
    assert_eq!(event.service(), "DeviceService");
    assert_eq!(event.operation(), "delete");
    assert_eq!(event.scope_id(), "S1");
    assert_eq!(event.entity_id(), Some("E1"));
    assert_eq!(event.entity_type(), Some("device"));
    assert_eq!(event.inputs(), "S1, E1");
    assert_eq!(event.user_id(), "u-100");

    assert_eq!(store.len(), 1);
    let persisted = store.find(event.id()).await?.unwrap();
    assert_eq!(persisted.status(), EventStatus::Sent);
    Ok(())
}

#[tokio::test]
async fn single_identifier_becomes_entity_id_with_session_scope() {
    let store = InMemoryEventStore::new();
    let bus = SpyBus::default();
    let itx = interceptor(&store, &bus);

    let result: Result<(), String> = itx
        .invoke(&DeviceService, "find", &[EventArg::Id("E9")], async {
            Ok(())
        })
        .await;
    assert!(result.is_ok());

    let (_, event) = &bus.published()[0];
    assert_eq!(event.entity_id(), Some("E9"));
    assert_eq!(event.scope_id(), "scope-session");
}

#[tokio::test]
async fn entity_argument_overrides_identifiers() {
    let store = InMemoryEventStore::new();
    let bus = SpyBus::default();
    let itx = interceptor(&store, &bus);

    let device = Device {
        id: "d-7".into(),
        scope_id: "scope-entity".into(),
    };
    let result: Result<(), String> = itx
        .invoke(
            &DeviceService,
            "update",
            &[EventArg::Id("ignored"), EventArg::Entity(&device)],
            async { Ok(()) },
        )
        .await;
    assert!(result.is_ok());

    let (_, event) = &bus.published()[0];
    assert_eq!(event.entity_type(), Some("device"));
    assert_eq!(event.entity_id(), Some("d-7"));
    assert_eq!(event.scope_id(), "scope-entity");
}

#[tokio::test]
async fn nested_invocations_yield_a_single_record() {
    let store = InMemoryEventStore::new();
    let bus = SpyBus::default();
    let itx = interceptor(&store, &bus);

    let result: Result<(), String> = itx
        .invoke(
            &DeviceService,
            "outer",
            &[EventArg::Id("E1")],
            async {
                itx.invoke(&DeviceService, "inner", &[EventArg::Id("E2")], async {
                    Ok(())
                })
                .await
            },
        )
        .await;
    assert!(result.is_ok());

    assert_eq!(store.len(), 1);
    let published = bus.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].1.operation(), "outer");
    assert_eq!(published[0].1.entity_id(), Some("E1"));
}

#[tokio::test]
async fn each_outer_call_gets_a_fresh_context() {
    let store = InMemoryEventStore::new();
    let bus = SpyBus::default();
    let itx = interceptor(&store, &bus);

    for _ in 0..2 {
        let result: Result<(), String> = itx
            .invoke(&DeviceService, "create", &[], async { Ok(()) })
            .await;
        assert!(result.is_ok());
    }

    let published = bus.published();
    assert_eq!(published.len(), 2);
    assert_ne!(published[0].1.id(), published[1].1.id());
    assert_ne!(published[0].1.context_id(), published[1].1.context_id());
}

#[tokio::test]
async fn failed_operation_propagates_and_skips_publish() {
    let store = InMemoryEventStore::new();
    let bus = SpyBus::default();
    let itx = interceptor(&store, &bus);

    let result: Result<(), String> = itx
        .invoke(&DeviceService, "delete", &[EventArg::Id("E1")], async {
            Err("boom".to_string())
        })
        .await;
    assert_eq!(result, Err("boom".to_string()));

    // 业务失败：不发布，记录停留在 CREATED 供巡检/补偿
    assert!(bus.published().is_empty());
    assert_eq!(store.len(), 1);
    let pending = store.list_pending(chrono::Utc::now()).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].status(), EventStatus::Created);
}

#[tokio::test]
async fn bus_outage_marks_send_error_then_housekeeper_converges() -> anyhow::Result<()> {
    let store = InMemoryEventStore::new();
    let bus = SpyBus::default();
    let itx = interceptor(&store, &bus);

    bus.fail_next(1);
    let result: Result<(), String> = itx
        .invoke(&DeviceService, "create", &[EventArg::Id("E1")], async {
            Ok(())
        })
        .await;
    // 总线不可用不得让业务操作失败
    assert!(result.is_ok());
    assert!(bus.published().is_empty());

    let pending = store.list_pending(chrono::Utc::now()).await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].status(), EventStatus::SendError);
    let id = pending[0].id().to_string();

    let housekeeper = Arc::new(
        Housekeeper::builder()
            .store(Arc::new(store.clone()))
            .bus(Arc::new(bus.clone()))
            .routes(Arc::new(routes()))
            .config(HousekeeperConfig {
                sweep_interval: Duration::from_secs(30),
                age_threshold: Duration::ZERO,
            })
            .build(),
    );
    housekeeper.sweep().await;

    assert_eq!(bus.published().len(), 1);
    assert_eq!(store.find(&id).await?.unwrap().status(), EventStatus::Sent);
    Ok(())
}

#[tokio::test]
async fn annotated_strategy_records_verbatim_metadata() {
    let store = InMemoryEventStore::new();
    let bus = SpyBus::default();
    let itx = interceptor(&store, &bus);

    let metadata = RaiseEvent::builder()
        .service("MailService".into())
        .operation("sendReport".into())
        .note("weekly digest".into())
        .build();
    let result: Result<(), String> = itx
        .invoke_annotated(&metadata, &[EventArg::Value(&"all-tenants")], async {
            Ok(())
        })
        .await;
    assert!(result.is_ok());

    let (address, event) = &bus.published()[0];
    assert_eq!(address, "events.mail");
    assert_eq!(event.service(), "MailService");
    assert_eq!(event.operation(), "sendReport");
    assert_eq!(event.note(), Some("weekly digest"));
    assert_eq!(event.entity_type(), None);
    assert_eq!(event.scope_id(), "scope-session");
    assert_eq!(event.inputs(), "all-tenants");
}

#[tokio::test]
async fn missing_entity_metadata_still_delivers() {
    let store = InMemoryEventStore::new();
    let bus = SpyBus::default();
    let itx = interceptor(&store, &bus);

    let result: Result<(), String> = itx
        .invoke(&BareService, "rotate", &[], async { Ok(()) })
        .await;
    assert!(result.is_ok());

    let (_, event) = &bus.published()[0];
    assert_eq!(event.entity_type(), None);
    assert_eq!(event.entity_id(), None);
    assert_eq!(
        store.find(event.id()).await.unwrap().unwrap().status(),
        EventStatus::Sent
    );
}

#[tokio::test]
async fn unresolvable_address_marks_send_error() {
    let store = InMemoryEventStore::new();
    let bus = SpyBus::default();
    let itx = interceptor(&store, &bus);

    let result: Result<(), String> = itx
        .invoke(&UnroutedService, "rotate", &[], async { Ok(()) })
        .await;
    assert!(result.is_ok());
    assert!(bus.published().is_empty());

    let pending = store.list_pending(chrono::Utc::now()).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].status(), EventStatus::SendError);
}
