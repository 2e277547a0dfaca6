// chimera-beans: FactoryBean 契约及容器侧支持
//
// 注册为组件的 FactoryBean 对外暴露的是它产出的对象：
// - FactoryBean trait（get_object / object_type / is_singleton）
// - 注册记录上的 factoryBeanObjectType 属性
// - 单例产品缓存、按类型查找、&name 解引用
// - 关闭时只通知 FactoryBean 本身

pub mod bean;
pub mod config;
pub mod constants;
pub mod error;
pub mod factory_bean;
pub mod logging;
pub mod object_type;
pub mod registration;
pub mod registry;
pub mod scope;
pub mod utils;

// 重新导出常用类型
pub use bean::{AttributeValue, BeanDefinition, DeclaredObjectType, DestroyCallback};
pub use config::RegistryConfig;
pub use constants::*;
pub use error::{ContainerError, ContainerResult};
pub use factory_bean::{DisposableBean, FactoryBean, FunctionFactoryBean, ObjectFactory};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use object_type::ObjectType;
pub use registration::{register_submitted_factory_beans, FactoryBeanRegistrar, FactoryBeanSubmission};
pub use registry::FactoryBeanRegistry;
pub use scope::Scope;

// 导出 inventory，供静态注册使用
pub use inventory;

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::bean::{AttributeValue, BeanDefinition};
    pub use crate::config::RegistryConfig;
    pub use crate::constants::{FACTORY_BEAN_PREFIX, OBJECT_TYPE_ATTRIBUTE};
    pub use crate::error::{ContainerError, ContainerResult};
    pub use crate::factory_bean::{DisposableBean, FactoryBean, FunctionFactoryBean};
    pub use crate::logging::{LogFormat, LogLevel, LoggingConfig};
    pub use crate::object_type::ObjectType;
    pub use crate::registry::FactoryBeanRegistry;
    pub use crate::scope::Scope;
    pub use std::sync::Arc;
    // Re-export anyhow for convenience
    pub use anyhow::{anyhow, Context};
}
