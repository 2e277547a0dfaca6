use chimera_beans::prelude::*;
use chimera_beans::{register_submitted_factory_beans, FactoryBeanSubmission};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

// ==================== 产品类型 ====================

/// 连接池 - 由 ConnectionPoolFactory 延迟创建
#[derive(Debug)]
struct ConnectionPool {
    url: String,
    max_connections: u32,
    closed: AtomicBool,
}

impl ConnectionPool {
    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        tracing::info!("Connection pool '{}' closed", self.url);
    }
}

/// 请求 ID - 每次获取都是新值
#[derive(Debug)]
struct RequestId(u64);

/// 功能开关 - 未配置时工厂返回"没有对象"
#[derive(Debug)]
struct FeatureFlags {
    enabled: Vec<String>,
}

/// 系统时钟 - 通过 inventory 静态注册
#[derive(Debug)]
struct SystemClock {
    zone: &'static str,
}

// ==================== FactoryBean 实现 ====================

struct ConnectionPoolFactory {
    url: String,
    max_connections: u32,
    pool: Mutex<Option<Arc<ConnectionPool>>>,
}

impl ConnectionPoolFactory {
    fn new(url: impl Into<String>, max_connections: u32) -> Self {
        Self {
            url: url.into(),
            max_connections,
            pool: Mutex::new(None),
        }
    }
}

impl FactoryBean for ConnectionPoolFactory {
    type Object = ConnectionPool;

    fn get_object(&self) -> ContainerResult<Option<Arc<ConnectionPool>>> {
        let mut pool = self.pool.lock();

        let pool = pool.get_or_insert_with(|| {
            tracing::info!("Opening connection pool to '{}'", self.url);
            Arc::new(ConnectionPool {
                url: self.url.clone(),
                max_connections: self.max_connections,
                closed: AtomicBool::new(false),
            })
        });
        Ok(Some(Arc::clone(pool)))
    }

    fn object_type(&self) -> Option<ObjectType> {
        Some(ObjectType::of::<ConnectionPool>())
    }
}

impl DisposableBean for ConnectionPoolFactory {
    fn destroy(&self) -> ContainerResult<()> {
        if let Some(pool) = self.pool.lock().as_ref() {
            pool.close();
        }
        Ok(())
    }
}

struct RequestIdFactory {
    next: AtomicU64,
}

impl FactoryBean for RequestIdFactory {
    type Object = RequestId;

    fn get_object(&self) -> ContainerResult<Option<Arc<RequestId>>> {
        Ok(Some(Arc::new(RequestId(self.next.fetch_add(1, Ordering::SeqCst)))))
    }

    fn object_type(&self) -> Option<ObjectType> {
        Some(ObjectType::of::<RequestId>())
    }

    fn is_singleton(&self) -> bool {
        false
    }
}

fn register_system_clock(registry: &FactoryBeanRegistry) -> ContainerResult<()> {
    let factory = FunctionFactoryBean::singleton(|| -> ContainerResult<Option<SystemClock>> {
        Ok(Some(SystemClock { zone: "UTC" }))
    });
    registry.register_factory_bean(BeanDefinition::new("systemClock"), Arc::new(factory))
}

chimera_beans::inventory::submit! {
    FactoryBeanSubmission {
        name: "systemClock",
        registrar: register_system_clock,
    }
}

fn load_registry_config() -> ContainerResult<RegistryConfig> {
    let config_paths = ["demos/factory-demo/registry.toml", "registry.toml"];

    match config_paths
        .iter()
        .find(|path| std::path::Path::new(path).exists())
    {
        Some(path) => {
            tracing::info!("Loading registry configuration from {}", path);
            RegistryConfig::from_toml_file(path)
        }
        None => Ok(RegistryConfig::from_env()),
    }
}

fn main() -> anyhow::Result<()> {
    LoggingConfig::from_env().init()?;

    let registry = FactoryBeanRegistry::with_config(load_registry_config()?);

    registry.register_disposable_factory_bean(
        BeanDefinition::new("connectionPool"),
        Arc::new(ConnectionPoolFactory::new("postgres://localhost/app", 16)),
    )?;
    registry.register_factory_bean(
        BeanDefinition::new("requestId"),
        Arc::new(RequestIdFactory {
            next: AtomicU64::new(1),
        }),
    )?;

    let flags = std::env::var("FEATURE_FLAGS").ok();
    registry.register_factory_bean(
        BeanDefinition::new("featureFlags"),
        Arc::new(FunctionFactoryBean::singleton(move || -> ContainerResult<Option<FeatureFlags>> {
            Ok(flags.as_ref().map(|flags| FeatureFlags {
                enabled: flags.split(',').map(|f| f.trim().to_string()).collect(),
            }))
        })),
    )?;

    // 类型只能在注册记录上声明
    registry.register_factory_bean(
        BeanDefinition::new("auditPool")
            .with_attribute(OBJECT_TYPE_ATTRIBUTE, "ConnectionPool"),
        Arc::new(
            FunctionFactoryBean::singleton(|| -> ContainerResult<Option<ConnectionPool>> {
                Ok(Some(ConnectionPool {
                    url: "postgres://localhost/audit".to_string(),
                    max_connections: 4,
                    closed: AtomicBool::new(false),
                }))
            })
            .with_object_type(None),
        ),
    )?;

    register_submitted_factory_beans(&registry)?;

    {
        let pool = registry
            .get_typed_object::<ConnectionPool>("connectionPool")?
            .context("connection pool factory returned no object")?;
        let again = registry
            .get_typed_object::<ConnectionPool>("connectionPool")?
            .context("connection pool factory returned no object")?;
        tracing::info!(
            "connectionPool: url={}, max_connections={}, shared={}",
            pool.url,
            pool.max_connections,
            Arc::ptr_eq(&pool, &again)
        );

        for _ in 0..2 {
            if let Some(id) = registry.get_typed_object::<RequestId>("requestId")? {
                tracing::info!("requestId: {:?}", id);
            }
        }

        match registry.get_typed_object::<FeatureFlags>("featureFlags")? {
            Some(flags) => tracing::info!("featureFlags: {:?}", flags.enabled),
            None => tracing::info!("featureFlags: no object (FEATURE_FLAGS not set)"),
        }

        let pools = registry.get_bean_names_for::<ConnectionPool>()?;
        tracing::info!("Beans exposing ConnectionPool: {:?}", pools);

        if let Some(clock) = registry.get_typed_object::<SystemClock>("systemClock")? {
            tracing::info!("systemClock zone: {}", clock.zone);
        }

        let factory = registry.get_factory_bean::<ConnectionPoolFactory>("&connectionPool")?;
        tracing::info!("&connectionPool resolves to factory for '{}'", factory.url);

        registry.destroy_singletons()?;
        tracing::info!("Pool closed after shutdown: {}", pool.closed.load(Ordering::SeqCst));
    }

    Ok(())
}
