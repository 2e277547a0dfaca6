use crate::{ContainerResult, FactoryBeanRegistry};

/// FactoryBean 注册函数类型
pub type FactoryBeanRegistrar = fn(&FactoryBeanRegistry) -> ContainerResult<()>;

/// FactoryBean 静态注册项 - 用于 inventory 收集
///
/// # 示例
///
/// ```rust,ignore
/// chimera_beans::inventory::submit! {
///     chimera_beans::FactoryBeanSubmission {
///         name: "connectionPool",
///         registrar: |registry| {
///             registry.register_factory_bean(
///                 BeanDefinition::new("connectionPool"),
///                 Arc::new(ConnectionPoolFactory::default()),
///             )
///         },
///     }
/// }
/// ```
pub struct FactoryBeanSubmission {
    pub name: &'static str,
    pub registrar: FactoryBeanRegistrar,
}

inventory::collect!(FactoryBeanSubmission);

/// 注册所有通过 `inventory::submit!` 提交的 FactoryBean
///
/// 按名称排序后依次执行，遇到第一个失败即返回。返回注册的数量
pub fn register_submitted_factory_beans(registry: &FactoryBeanRegistry) -> ContainerResult<usize> {
    tracing::info!("Starting factory bean scan");

    let mut submissions: Vec<_> = inventory::iter::<FactoryBeanSubmission>().collect();
    submissions.sort_by_key(|submission| submission.name);
    let total = submissions.len();

    if total == 0 {
        tracing::debug!("No submitted factory beans found");
        return Ok(0);
    }

    tracing::info!("Found {} submitted factory bean(s) to register", total);

    for (idx, submission) in submissions.iter().enumerate() {
        tracing::debug!(
            "Registering factory bean [{}/{}]: '{}'",
            idx + 1,
            total,
            submission.name
        );

        (submission.registrar)(registry).map_err(|e| {
            tracing::error!("Failed to register factory bean '{}': {}", submission.name, e);
            e
        })?;
    }

    tracing::info!("Factory bean scan completed, registered {} factory bean(s)", total);
    Ok(total)
}
