//! FactoryBean - 产品工厂契约
//!
//! 实现该 trait 的组件注册到容器后，容器对外暴露的是它产出的对象，而不是组件本身

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{error::ContainerResult, object_type::ObjectType};

/// FactoryBean trait
///
/// 容器只负责 FactoryBean 本身的生命周期，不负责它产出对象的生命周期。
/// 产品需要清理时，由 FactoryBean 同时实现 [`DisposableBean`] 并在 `destroy` 中处理。
///
/// 三个方法都可能在引导早期被调用，实现不应依赖容器的其他初始化步骤。
///
/// # 示例
///
/// ```rust,ignore
/// use chimera_beans::prelude::*;
///
/// struct ConnectionPoolFactory {
///     url: String,
///     pool: std::sync::OnceLock<Arc<ConnectionPool>>,
/// }
///
/// impl FactoryBean for ConnectionPoolFactory {
///     type Object = ConnectionPool;
///
///     fn get_object(&self) -> ContainerResult<Option<Arc<ConnectionPool>>> {
///         Ok(Some(self.pool.get_or_init(|| Arc::new(ConnectionPool::new(&self.url))).clone()))
///     }
///
///     fn object_type(&self) -> Option<ObjectType> {
///         Some(ObjectType::of::<ConnectionPool>())
///     }
/// }
/// ```
pub trait FactoryBean: Send + Sync + 'static {
    /// 产品对象的声明类型
    type Object: Any + Send + Sync;

    /// 返回产品对象（可能是共享实例，也可能是新实例）
    ///
    /// `Ok(None)` 是合法结果，调用方必须把它当作正常值处理。
    ///
    /// # Errors
    ///
    /// - 尚未完成初始化时可以返回 `ContainerError::FactoryBeanNotInitialized`，
    ///   也可以直接返回 `Ok(None)`
    /// - 其他创建失败返回 `ContainerError::BeanCreationFailed` 或 `ContainerError::Other`
    fn get_object(&self) -> ContainerResult<Option<Arc<Self::Object>>>;

    /// 产品对象的运行时类型，事先无法确定时返回 `None`
    ///
    /// 必须能在 `get_object` 之前安全调用。单例实现不应为了回答这个问题而创建产品。
    /// 返回 `None` 的 FactoryBean 会被按类型查找直接忽略。
    fn object_type(&self) -> Option<ObjectType>;

    /// `get_object` 是否总是返回同一个对象
    ///
    /// 返回 `true` 时容器可以缓存第一次的结果。返回 `false` 只表示不保证是同一个对象，
    /// 并不保证每次都是独立的新实例。
    fn is_singleton(&self) -> bool {
        true
    }
}

/// 销毁回调 trait
///
/// 容器关闭时只会通知 FactoryBean 本身，产品的清理需要在这里委托完成
pub trait DisposableBean: Send + Sync {
    fn destroy(&self) -> ContainerResult<()>;
}

/// 类型擦除后的 FactoryBean，供容器统一存储不同产品类型的工厂
///
/// 所有 [`FactoryBean`] 自动实现
pub trait ObjectFactory: Send + Sync {
    /// 对应 [`FactoryBean::get_object`]
    fn object(&self) -> ContainerResult<Option<Arc<dyn Any + Send + Sync>>>;

    /// 对应 [`FactoryBean::object_type`]
    fn product_type(&self) -> Option<ObjectType>;

    /// 对应 [`FactoryBean::is_singleton`]
    fn shares_object(&self) -> bool;

    /// 关联类型 `Object`，只有在已经拿到产品之后才作为类型推断依据
    fn declared_type(&self) -> ObjectType;

    /// FactoryBean 自身的类型
    fn factory_type(&self) -> ObjectType;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<F: FactoryBean> ObjectFactory for F {
    fn object(&self) -> ContainerResult<Option<Arc<dyn Any + Send + Sync>>> {
        Ok(FactoryBean::get_object(self)?.map(|object| object as Arc<dyn Any + Send + Sync>))
    }

    fn product_type(&self) -> Option<ObjectType> {
        FactoryBean::object_type(self)
    }

    fn shares_object(&self) -> bool {
        FactoryBean::is_singleton(self)
    }

    fn declared_type(&self) -> ObjectType {
        ObjectType::of::<F::Object>()
    }

    fn factory_type(&self) -> ObjectType {
        ObjectType::of::<F>()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// 由闭包驱动的 FactoryBean
///
/// - `singleton`：第一次成功调用后缓存结果（包括 `None`），之后不再调用闭包
/// - `prototype`：每次调用闭包
pub struct FunctionFactoryBean<T, F>
where
    T: Any + Send + Sync,
    F: Fn() -> ContainerResult<Option<T>> + Send + Sync + 'static,
{
    factory_fn: F,
    singleton: bool,
    object_type: Option<ObjectType>,
    cached: Mutex<Option<Option<Arc<T>>>>,
}

impl<T, F> FunctionFactoryBean<T, F>
where
    T: Any + Send + Sync,
    F: Fn() -> ContainerResult<Option<T>> + Send + Sync + 'static,
{
    pub fn singleton(factory_fn: F) -> Self {
        Self::new(factory_fn, true)
    }

    pub fn prototype(factory_fn: F) -> Self {
        Self::new(factory_fn, false)
    }

    fn new(factory_fn: F, singleton: bool) -> Self {
        Self {
            factory_fn,
            singleton,
            object_type: Some(ObjectType::of::<T>()),
            cached: Mutex::new(None),
        }
    }

    /// 覆盖 `object_type` 的返回值，`None` 表示对外声明类型未知
    pub fn with_object_type(mut self, object_type: Option<ObjectType>) -> Self {
        self.object_type = object_type;
        self
    }

    fn create(&self) -> ContainerResult<Option<Arc<T>>> {
        Ok((self.factory_fn)()?.map(Arc::new))
    }
}

impl<T, F> FactoryBean for FunctionFactoryBean<T, F>
where
    T: Any + Send + Sync,
    F: Fn() -> ContainerResult<Option<T>> + Send + Sync + 'static,
{
    type Object = T;

    fn get_object(&self) -> ContainerResult<Option<Arc<T>>> {
        if !self.singleton {
            return self.create();
        }

        let mut cached = self.cached.lock();
        if let Some(object) = cached.as_ref() {
            return Ok(object.clone());
        }

        let object = self.create()?;
        *cached = Some(object.clone());
        Ok(object)
    }

    fn object_type(&self) -> Option<ObjectType> {
        self.object_type
    }

    fn is_singleton(&self) -> bool {
        self.singleton
    }
}
