//! 端到端示例：设备注册服务 + 内存存储/总线 + Housekeeper 补偿。
//!
//! 演示三条路径：正常“创建即发布”、嵌套调用只产生一条事件、
//! 总线故障后由 Housekeeper 收敛到 SENT。
//!
use anyhow::{Result, anyhow};
use futures_util::StreamExt;
use service_event::capture::{EventArg, EventAwareService, RaiseEventInterceptor, TrackedEntity};
use service_event::eventing::{Housekeeper, HousekeeperConfig, InMemoryEventBus, ServiceRoutes};
use service_event::session::{Session, StaticSessionProvider};
use service_event::store::{EventStore, InMemoryEventStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug)]
struct Device {
    id: String,
    scope_id: String,
    display_name: String,
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

struct DeviceRegistryService {
    interceptor: Arc<RaiseEventInterceptor>,
    devices: Mutex<HashMap<String, Device>>,
}

impl EventAwareService for DeviceRegistryService {
    fn service_name(&self) -> &'static str {
        "DeviceRegistryService"
    }
    fn entity_type(&self) -> Option<&'static str> {
        Some("device")
    }
}

impl DeviceRegistryService {
    fn new(interceptor: Arc<RaiseEventInterceptor>) -> Self {
        DeviceRegistryService {
            interceptor,
            devices: Mutex::new(HashMap::new()),
        }
    }

    async fn create(&self, scope_id: &str, display_name: &str) -> Result<Device> {
        self.interceptor
            .invoke(
                self,
                "create",
                &[EventArg::Id(scope_id), EventArg::Value(&display_name)],
                async {
                    let device = Device {
                        id: uuid::Uuid::new_v4().to_string(),
                        scope_id: scope_id.to_string(),
                        display_name: display_name.to_string(),
                    };
                    self.devices
                        .lock()
                        .unwrap()
                        .insert(device.id.clone(), device.clone());
                    Ok(device)
                },
            )
            .await
    }

    async fn find(&self, scope_id: &str, device_id: &str) -> Result<Device> {
        self.interceptor
            .invoke(
                self,
                "find",
                &[EventArg::Id(scope_id), EventArg::Id(device_id)],
                async {
                    self.devices
                        .lock()
                        .unwrap()
                        .get(device_id)
                        .cloned()
                        .ok_or_else(|| anyhow!("device not found: {device_id}"))
                },
            )
            .await
    }

    /// 内部调用 `find`：嵌套的事件触发型调用复用最外层记录
    async fn rename(&self, device: &Device, display_name: &str) -> Result<Device> {
        self.interceptor
            .invoke(
                self,
                "rename",
                &[EventArg::Entity(device), EventArg::Value(&display_name)],
                async {
                    let mut current = self.find(&device.scope_id, &device.id).await?;
                    current.display_name = display_name.to_string();
                    self.devices
                        .lock()
                        .unwrap()
                        .insert(current.id.clone(), current.clone());
                    Ok(current)
                },
            )
            .await
    }

    async fn delete(&self, scope_id: &str, device_id: &str) -> Result<()> {
        self.interceptor
            .invoke(
                self,
                "delete",
                &[EventArg::Id(scope_id), EventArg::Id(device_id)],
                async {
                    self.devices
                        .lock()
                        .unwrap()
                        .remove(device_id)
                        .map(|_| ())
                        .ok_or_else(|| anyhow!("device not found: {device_id}"))
                },
            )
            .await
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = InMemoryEventStore::new();
    let bus = InMemoryEventBus::new(64);
    let routes: Arc<ServiceRoutes> = Arc::new(
        [("DeviceRegistryService", "events.device")]
            .into_iter()
            .collect(),
    );

    // 订阅总线：模拟另一个服务实例观察到的事件
    let mut stream = bus.subscribe();
    let observer = tokio::spawn(async move {
        while let Some(Ok((address, event))) = stream.next().await {
            info!(
                %address,
                service = event.service(),
                operation = event.operation(),
                entity_id = ?event.entity_id(),
                scope_id = event.scope_id(),
                "observed event"
            );
        }
    });

    let interceptor = Arc::new(
        RaiseEventInterceptor::builder()
            .store(Arc::new(store.clone()))
            .bus(Arc::new(bus.clone()))
            .routes(routes.clone())
            .sessions(Arc::new(StaticSessionProvider::new(Session::new(
                "u-100", "scope-1",
            ))))
            .build(),
    );
    let registry = DeviceRegistryService::new(interceptor);

    // 正常路径：创建即发布
    let device = registry.create("scope-1", "gateway-01").await?;

    // 嵌套调用：rename 内部调用 find，整棵调用树只产生一条事件
    registry.rename(&device, "gateway-renamed").await?;

    // 总线故障：业务照常成功，记录停在 SEND_ERROR 等待补偿
    bus.set_available(false);
    registry.delete("scope-1", &device.id).await?;
    bus.set_available(true);

    let housekeeper = Arc::new(
        Housekeeper::builder()
            .store(Arc::new(store.clone()))
            .bus(Arc::new(bus.clone()))
            .routes(routes)
            .config(HousekeeperConfig {
                sweep_interval: Duration::from_millis(200),
                age_threshold: Duration::ZERO,
            })
            .build(),
    );
    let handle = housekeeper.start();
    tokio::time::sleep(Duration::from_millis(600)).await;
    handle.shutdown();
    handle.join().await;

    let pending = store.list_pending(chrono::Utc::now()).await?;
    info!(pending = pending.len(), "pending events after housekeeping");

    observer.abort();
    Ok(())
}
