//! FactoryBeanRegistry - 容器一侧对 FactoryBean 契约的支持
//!
//! 参考 Spring 的 FactoryBeanRegistrySupport：按名称暴露产品、缓存单例产品、按类型查找

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};

use crate::{
    bean::BeanDefinition,
    config::RegistryConfig,
    error::{ContainerError, ContainerResult},
    factory_bean::{DisposableBean, FactoryBean, ObjectFactory},
    object_type::ObjectType,
    utils::{
        dependency::{CreationGuard, CreationTracker},
        naming::{is_factory_dereference, transformed_bean_name},
    },
    Scope,
};

type SharedObject = Arc<dyn Any + Send + Sync>;

struct Registration {
    definition: BeanDefinition,
    factory: Arc<dyn ObjectFactory>,
}

/// FactoryBean 注册表
///
/// - 按名称获取时暴露产品对象，`&name` 获取 FactoryBean 本身
/// - 单例产品第一次成功获取后被缓存（包括"没有对象"），之后不再调用 `get_object`
/// - 按类型查找时，类型未知的 FactoryBean 被跳过
/// - 关闭时只通知 FactoryBean 本身，从不销毁产品
pub struct FactoryBeanRegistry {
    config: RegistryConfig,

    /// 注册记录与 FactoryBean 实例
    registrations: RwLock<HashMap<String, Registration>>,

    /// 注册顺序，保证列举结果稳定
    registration_order: RwLock<Vec<String>>,

    /// 单例产品缓存，`None` 表示工厂返回了"没有对象"
    object_cache: RwLock<HashMap<String, Option<SharedObject>>>,

    /// 单例产品创建互斥锁，允许同一线程嵌套获取其他产品
    singleton_lock: ReentrantMutex<()>,

    /// 循环引用检测
    creation_tracker: CreationTracker,
}

impl FactoryBeanRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            registrations: RwLock::new(HashMap::new()),
            registration_order: RwLock::new(Vec::new()),
            object_cache: RwLock::new(HashMap::new()),
            singleton_lock: ReentrantMutex::new(()),
            creation_tracker: CreationTracker::new(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// 注册 FactoryBean
    pub fn register_factory_bean<F: FactoryBean>(
        &self,
        definition: BeanDefinition,
        factory: Arc<F>,
    ) -> ContainerResult<()> {
        self.register_object_factory(definition, factory)
    }

    /// 注册同时实现了 [`DisposableBean`] 的 FactoryBean
    ///
    /// 关闭时调用它的 `destroy`，由它负责清理自己的产品
    pub fn register_disposable_factory_bean<F>(
        &self,
        definition: BeanDefinition,
        factory: Arc<F>,
    ) -> ContainerResult<()>
    where
        F: FactoryBean + DisposableBean,
    {
        let disposable = Arc::clone(&factory);
        let definition = definition.with_destroy(move || disposable.destroy());
        self.register_object_factory(definition, factory)
    }

    /// 注册类型擦除后的 FactoryBean
    pub fn register_object_factory(
        &self,
        definition: BeanDefinition,
        factory: Arc<dyn ObjectFactory>,
    ) -> ContainerResult<()> {
        let name = definition.name.clone();

        if name.is_empty() || is_factory_dereference(&name) {
            return Err(ContainerError::Config(format!(
                "Invalid factory bean name '{}'",
                name
            )));
        }

        tracing::trace!(
            "Attempting to register factory bean: name='{}', factory='{}', scope={:?}",
            name,
            factory.factory_type(),
            definition.scope
        );

        let mut registrations = self.registrations.write();

        if registrations.contains_key(&name) {
            if !self.config.allow_bean_definition_overriding {
                tracing::warn!("Bean '{}' already exists, registration failed", name);
                return Err(ContainerError::BeanAlreadyExists(name));
            }
            tracing::info!("Overriding bean definition for bean '{}'", name);
            self.object_cache.write().remove(&name);
        } else {
            self.registration_order.write().push(name.clone());
        }

        registrations.insert(name.clone(), Registration { definition, factory });

        tracing::debug!("Factory bean registered successfully: '{}'", name);
        Ok(())
    }

    /// 移除注册记录，同时丢弃已缓存的产品
    pub fn remove_factory_bean(&self, name: &str) -> ContainerResult<()> {
        let name = transformed_bean_name(name);

        self.registrations
            .write()
            .remove(name)
            .ok_or_else(|| ContainerError::BeanNotFound(name.to_string()))?;
        self.registration_order.write().retain(|n| n != name);
        self.object_cache.write().remove(name);

        tracing::debug!("Factory bean removed: '{}'", name);
        Ok(())
    }

    pub fn contains_bean(&self, name: &str) -> bool {
        self.registrations
            .read()
            .contains_key(transformed_bean_name(name))
    }

    /// 按注册顺序返回所有名称
    pub fn get_bean_names(&self) -> Vec<String> {
        self.registration_order.read().clone()
    }

    pub fn get_bean_definition_count(&self) -> usize {
        self.registrations.read().len()
    }

    /// 按名称获取
    ///
    /// `Ok(None)` 表示 FactoryBean 返回了"没有对象"，这是正常结果
    pub fn get_object(&self, name: &str) -> ContainerResult<Option<SharedObject>> {
        tracing::trace!("Requesting bean: '{}'", name);

        let bean_name = transformed_bean_name(name);
        let (factory, scope) = self.lookup(bean_name)?;

        if is_factory_dereference(name) {
            tracing::trace!("Returning factory bean itself for '{}'", name);
            return Ok(Some(factory.into_any()));
        }

        if scope.is_singleton() && factory.shares_object() {
            self.get_singleton_object(bean_name, factory.as_ref())
        } else {
            tracing::debug!("Obtaining non-shared object from factory bean '{}'", bean_name);
            let _guard = self.enter_creation(bean_name)?;
            self.obtain_object(bean_name, factory.as_ref())
        }
    }

    /// 按名称获取并转换为具体类型
    pub fn get_typed_object<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Option<Arc<T>>> {
        match self.get_object(name)? {
            Some(object) => downcast_object(name, object).map(Some),
            None => Ok(None),
        }
    }

    /// 获取 FactoryBean 本身，名称可以带或不带 `&` 前缀
    pub fn get_factory_bean<F: FactoryBean>(&self, name: &str) -> ContainerResult<Arc<F>> {
        let bean_name = transformed_bean_name(name);
        let (factory, _) = self.lookup(bean_name)?;

        factory
            .into_any()
            .downcast::<F>()
            .map_err(|_| ContainerError::NotAFactoryBean(bean_name.to_string()))
    }

    /// 产品是否为共享单例
    pub fn is_singleton(&self, name: &str) -> ContainerResult<bool> {
        let (factory, scope) = self.lookup(transformed_bean_name(name))?;

        if is_factory_dereference(name) {
            return Ok(true);
        }
        Ok(scope.is_singleton() && factory.shares_object())
    }

    /// 单例产品是否已经被缓存
    pub fn contains_singleton_object(&self, name: &str) -> bool {
        self.object_cache
            .read()
            .contains_key(transformed_bean_name(name))
    }

    /// 解析产品类型，无法确定时返回 `Ok(None)`
    ///
    /// 顺序：注册记录上的 `factoryBeanObjectType` 属性、`object_type()`，
    /// 以及开启 `allow_eager_type_resolution` 时已获取的单例产品
    pub fn get_object_type(&self, name: &str) -> ContainerResult<Option<ObjectType>> {
        let bean_name = transformed_bean_name(name);

        if is_factory_dereference(name) {
            let (factory, _) = self.lookup(bean_name)?;
            return Ok(Some(factory.factory_type()));
        }

        let (factory, scope, declared) = {
            let registrations = self.registrations.read();
            let registration = registrations
                .get(bean_name)
                .ok_or_else(|| ContainerError::BeanNotFound(bean_name.to_string()))?;

            let declared = declared_object_type(bean_name, registration);

            (
                Arc::clone(&registration.factory),
                registration.definition.scope,
                declared,
            )
        };

        if declared.is_some() {
            return Ok(declared);
        }

        if let Some(object_type) = factory.product_type() {
            return Ok(Some(object_type));
        }

        self.resolve_type_eagerly(bean_name, factory.as_ref(), scope)
    }

    /// 判断名称对应的产品是否为目标类型，类型未知时返回 `false`
    pub fn is_type_match(&self, name: &str, target: &ObjectType) -> ContainerResult<bool> {
        if is_factory_dereference(name) {
            let (factory, _) = self.lookup(transformed_bean_name(name))?;
            return Ok(factory.factory_type() == *target);
        }

        Ok(self.match_object_type(transformed_bean_name(name), target)?.unwrap_or(false))
    }

    /// 按类型查找名称（注册顺序）
    ///
    /// 产品类型未知的 FactoryBean 会被跳过，不会报错
    pub fn get_bean_names_for_type(&self, target: &ObjectType) -> ContainerResult<Vec<String>> {
        let mut names = Vec::new();

        for name in self.get_bean_names() {
            match self.match_object_type(&name, target) {
                Ok(Some(true)) => names.push(name),
                Ok(Some(false)) => {}
                Ok(None) => tracing::debug!(
                    "Skipping factory bean '{}' in lookup for type '{}': object type unknown",
                    name,
                    target
                ),
                // 列举期间被移除
                Err(ContainerError::BeanNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        tracing::trace!("Found {} bean(s) for type '{}'", names.len(), target);
        Ok(names)
    }

    pub fn get_bean_names_for<T: Any + ?Sized>(&self) -> ContainerResult<Vec<String>> {
        self.get_bean_names_for_type(&ObjectType::of::<T>())
    }

    /// 获取所有指定类型的产品，返回"没有对象"的工厂不出现在结果中
    pub fn get_objects_of_type<T: Any + Send + Sync>(&self) -> ContainerResult<Vec<(String, Arc<T>)>> {
        let mut objects = Vec::new();

        for name in self.get_bean_names_for::<T>()? {
            match self.get_typed_object::<T>(&name)? {
                Some(object) => objects.push((name, object)),
                None => tracing::debug!("Factory bean '{}' returned no object, skipped", name),
            }
        }

        Ok(objects)
    }

    /// 按类型获取唯一的产品
    pub fn get_object_by_type<T: Any + Send + Sync>(&self) -> ContainerResult<Option<Arc<T>>> {
        let type_name = std::any::type_name::<T>();
        let mut names = self.get_bean_names_for::<T>()?;

        match names.len() {
            0 => Err(ContainerError::BeanNotFound(format!(
                "No bean found for type '{}'",
                type_name
            ))),
            1 => self.get_typed_object::<T>(&names.remove(0)),
            _ => Err(ContainerError::NoUniqueBean {
                type_name: type_name.to_string(),
                candidates: names,
            }),
        }
    }

    /// 丢弃所有缓存的单例产品，并调用 FactoryBean 自身的销毁回调
    ///
    /// 产品本身不会被销毁。所有回调都会执行，返回第一个失败
    pub fn destroy_singletons(&self) -> ContainerResult<()> {
        tracing::info!("Destroying factory beans");

        let dropped = {
            let mut cache = self.object_cache.write();
            let count = cache.len();
            cache.clear();
            count
        };
        tracing::debug!("Released {} cached factory bean object(s)", dropped);

        let callbacks: Vec<_> = {
            let registrations = self.registrations.read();
            self.registration_order
                .read()
                .iter()
                .rev()
                .filter_map(|name| {
                    registrations
                        .get(name)
                        .and_then(|r| r.definition.destroy_callback.clone())
                        .map(|callback| (name.clone(), callback))
                })
                .collect()
        };

        let mut first_error = None;
        for (name, callback) in callbacks {
            match (*callback)() {
                Ok(()) => tracing::debug!("Factory bean '{}' destroyed successfully", name),
                Err(e) => {
                    tracing::warn!("Failed to destroy factory bean '{}': {}", name, e);
                    first_error.get_or_insert(ContainerError::DestroyFailed {
                        bean_name: name,
                        source: Box::new(e),
                    });
                }
            }
        }

        tracing::info!("Factory bean destruction completed");
        first_error.map_or(Ok(()), Err)
    }

    /// 与 [`get_object_type`](Self::get_object_type) 使用同一解析结果
    fn match_object_type(&self, bean_name: &str, target: &ObjectType) -> ContainerResult<Option<bool>> {
        Ok(self
            .get_object_type(bean_name)?
            .map(|object_type| object_type == *target))
    }

    fn lookup(&self, bean_name: &str) -> ContainerResult<(Arc<dyn ObjectFactory>, Scope)> {
        let registrations = self.registrations.read();
        let registration = registrations.get(bean_name).ok_or_else(|| {
            tracing::debug!("Bean '{}' not found in registry", bean_name);
            ContainerError::BeanNotFound(bean_name.to_string())
        })?;
        Ok((Arc::clone(&registration.factory), registration.definition.scope))
    }

    fn get_singleton_object(
        &self,
        name: &str,
        factory: &dyn ObjectFactory,
    ) -> ContainerResult<Option<SharedObject>> {
        if let Some(object) = self.cached_object(name) {
            return Ok(object);
        }

        let _lock = self.singleton_lock.lock();

        if let Some(object) = self.cached_object(name) {
            return Ok(object);
        }

        let _guard = self.enter_creation(name)?;

        tracing::info!("Creating shared object of factory bean '{}'", name);
        let object = self.obtain_object(name, factory)?;

        self.object_cache
            .write()
            .insert(name.to_string(), object.clone());
        tracing::debug!("Object of factory bean '{}' cached", name);

        Ok(object)
    }

    /// 标记当前线程正在创建 `name` 的产品，同一线程上重复进入即为循环引用
    fn enter_creation(&self, name: &str) -> ContainerResult<CreationGuard<'_>> {
        CreationGuard::enter(&self.creation_tracker, name).ok_or_else(|| {
            let chain = self.creation_tracker.current_creating();
            ContainerError::CircularDependency(format!("{} -> {}", chain.join(" -> "), name))
        })
    }

    fn cached_object(&self, name: &str) -> Option<Option<SharedObject>> {
        let cache = self.object_cache.read();
        let object = cache.get(name)?;
        tracing::debug!("Returning cached object of factory bean '{}'", name);
        Some(object.clone())
    }

    fn obtain_object(
        &self,
        name: &str,
        factory: &dyn ObjectFactory,
    ) -> ContainerResult<Option<SharedObject>> {
        let object = factory.object().map_err(|e| match e {
            ContainerError::Other(source) => ContainerError::creation_failed(name, source),
            e => e,
        })?;

        if object.is_none() {
            tracing::debug!("Factory bean '{}' returned no object", name);
        }
        Ok(object)
    }

    fn resolve_type_eagerly(
        &self,
        name: &str,
        factory: &dyn ObjectFactory,
        scope: Scope,
    ) -> ContainerResult<Option<ObjectType>> {
        if !self.config.allow_eager_type_resolution {
            return Ok(None);
        }

        if !(scope.is_singleton() && factory.shares_object()) {
            tracing::trace!(
                "Not resolving object type of non-shared factory bean '{}' eagerly",
                name
            );
            return Ok(None);
        }

        tracing::debug!("Resolving object type of factory bean '{}' eagerly", name);
        Ok(self
            .get_singleton_object(name, factory)?
            .map(|_| factory.declared_type()))
    }
}

impl Default for FactoryBeanRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// 解析注册记录上的 `factoryBeanObjectType` 属性，不调用 FactoryBean 的任何方法
///
/// 名称形式的声明只能指向 FactoryBean 的关联产品类型
fn declared_object_type(bean_name: &str, registration: &Registration) -> Option<ObjectType> {
    let declared = registration.definition.declared_object_type()?;
    let resolved = declared.resolve(registration.factory.declared_type());

    if resolved.is_none() {
        tracing::debug!(
            "Declared object type {:?} of bean '{}' cannot be resolved",
            declared,
            bean_name
        );
    }
    resolved
}

fn downcast_object<T: Any + Send + Sync>(name: &str, object: SharedObject) -> ContainerResult<Arc<T>> {
    object.downcast::<T>().map_err(|_| ContainerError::TypeMismatch {
        expected: std::any::type_name::<T>().to_string(),
        found: format!("object of bean '{}'", name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::OBJECT_TYPE_ATTRIBUTE;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug)]
    struct Widget {
        serial: usize,
    }

    struct Gadget {
        widget: Arc<Widget>,
    }

    mod other {
        /// 与测试中的 `Widget` 同名但无关的类型
        pub struct Widget;
    }

    /// 每次调用都创建新的 Widget，并记录调用次数
    struct WidgetFactory {
        calls: AtomicUsize,
        type_queries: AtomicUsize,
        singleton: bool,
        known_type: bool,
        produce: bool,
        delay: Option<Duration>,
    }

    impl WidgetFactory {
        fn singleton() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                type_queries: AtomicUsize::new(0),
                singleton: true,
                known_type: true,
                produce: true,
                delay: None,
            }
        }

        fn prototype() -> Self {
            Self {
                singleton: false,
                ..Self::singleton()
            }
        }

        fn unknown_type(mut self) -> Self {
            self.known_type = false;
            self
        }

        fn no_object(mut self) -> Self {
            self.produce = false;
            self
        }

        fn slow(mut self) -> Self {
            self.delay = Some(Duration::from_millis(20));
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn type_queries(&self) -> usize {
            self.type_queries.load(Ordering::SeqCst)
        }
    }

    impl FactoryBean for WidgetFactory {
        type Object = Widget;

        fn get_object(&self) -> ContainerResult<Option<Arc<Widget>>> {
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            let serial = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.produce.then(|| Arc::new(Widget { serial })))
        }

        fn object_type(&self) -> Option<ObjectType> {
            self.type_queries.fetch_add(1, Ordering::SeqCst);
            self.known_type.then(ObjectType::of::<Widget>)
        }

        fn is_singleton(&self) -> bool {
            self.singleton
        }
    }

    struct FailingFactory {
        attempts: AtomicUsize,
        not_initialized: bool,
    }

    impl FailingFactory {
        fn new(not_initialized: bool) -> Self {
            Self {
                attempts: AtomicUsize::new(0),
                not_initialized,
            }
        }
    }

    impl FactoryBean for FailingFactory {
        type Object = Widget;

        fn get_object(&self) -> ContainerResult<Option<Arc<Widget>>> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.not_initialized {
                Err(ContainerError::not_initialized())
            } else {
                Err(anyhow::anyhow!("database unreachable").into())
            }
        }

        fn object_type(&self) -> Option<ObjectType> {
            Some(ObjectType::of::<Widget>())
        }
    }

    /// 产品依赖同一注册表中的另一个产品
    struct GadgetFactory {
        registry: Arc<FactoryBeanRegistry>,
        dependency: &'static str,
    }

    impl FactoryBean for GadgetFactory {
        type Object = Gadget;

        fn get_object(&self) -> ContainerResult<Option<Arc<Gadget>>> {
            let widget = self
                .registry
                .get_typed_object::<Widget>(self.dependency)?
                .ok_or_else(ContainerError::not_initialized)?;
            Ok(Some(Arc::new(Gadget { widget })))
        }

        fn object_type(&self) -> Option<ObjectType> {
            Some(ObjectType::of::<Gadget>())
        }
    }

    struct Handle {
        closed: AtomicBool,
    }

    /// 关闭时由工厂自己清理产品
    struct HandleFactory {
        destroyed: AtomicUsize,
        instance: Mutex<Option<Arc<Handle>>>,
        fail_on_destroy: bool,
    }

    impl HandleFactory {
        fn new(fail_on_destroy: bool) -> Self {
            Self {
                destroyed: AtomicUsize::new(0),
                instance: Mutex::new(None),
                fail_on_destroy,
            }
        }
    }

    impl FactoryBean for HandleFactory {
        type Object = Handle;

        fn get_object(&self) -> ContainerResult<Option<Arc<Handle>>> {
            let mut instance = self.instance.lock();
            let handle = instance.get_or_insert_with(|| {
                Arc::new(Handle {
                    closed: AtomicBool::new(false),
                })
            });
            Ok(Some(Arc::clone(handle)))
        }

        fn object_type(&self) -> Option<ObjectType> {
            Some(ObjectType::of::<Handle>())
        }
    }

    impl DisposableBean for HandleFactory {
        fn destroy(&self) -> ContainerResult<()> {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
            if let Some(handle) = self.instance.lock().as_ref() {
                handle.closed.store(true, Ordering::SeqCst);
            }
            if self.fail_on_destroy {
                return Err(anyhow::anyhow!("handle already closed").into());
            }
            Ok(())
        }
    }

    fn registry_with(name: &str, factory: Arc<WidgetFactory>) -> FactoryBeanRegistry {
        let registry = FactoryBeanRegistry::new();
        registry
            .register_factory_bean(BeanDefinition::new(name), factory)
            .unwrap();
        registry
    }

    #[test]
    fn test_singleton_object_is_cached() {
        let factory = Arc::new(WidgetFactory::singleton());
        let registry = registry_with("widget", factory.clone());

        let first = registry.get_typed_object::<Widget>("widget").unwrap().unwrap();
        let second = registry.get_typed_object::<Widget>("widget").unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.calls(), 1);
        assert!(registry.is_singleton("widget").unwrap());
        assert!(registry.contains_singleton_object("widget"));
    }

    #[test]
    fn test_non_singleton_object_is_not_cached() {
        let factory = Arc::new(WidgetFactory::prototype());
        let registry = registry_with("widget", factory.clone());

        let first = registry.get_typed_object::<Widget>("widget").unwrap().unwrap();
        let second = registry.get_typed_object::<Widget>("widget").unwrap().unwrap();

        assert_eq!((first.serial, second.serial), (0, 1));
        assert_eq!(factory.calls(), 2);
        assert!(!registry.is_singleton("widget").unwrap());
        assert!(!registry.contains_singleton_object("widget"));
    }

    #[test]
    fn test_prototype_scope_disables_caching() {
        let factory = Arc::new(WidgetFactory::singleton());
        let registry = FactoryBeanRegistry::new();
        registry
            .register_factory_bean(
                BeanDefinition::new("widget").with_scope(Scope::Prototype),
                factory.clone(),
            )
            .unwrap();

        registry.get_object("widget").unwrap();
        registry.get_object("widget").unwrap();

        assert_eq!(factory.calls(), 2);
        assert!(!registry.is_singleton("widget").unwrap());
    }

    #[test]
    fn test_object_type_without_creating_object() {
        let factory = Arc::new(WidgetFactory::singleton());
        let registry = registry_with("widget", factory.clone());

        assert_eq!(
            registry.get_object_type("widget").unwrap(),
            Some(ObjectType::of::<Widget>())
        );
        assert_eq!(factory.calls(), 0);
        assert!(!registry.contains_singleton_object("widget"));
    }

    #[test]
    fn test_no_object_is_a_valid_cached_result() {
        let factory = Arc::new(WidgetFactory::singleton().no_object());
        let registry = registry_with("widget", factory.clone());

        assert!(registry.get_object("widget").unwrap().is_none());
        assert!(registry.get_typed_object::<Widget>("widget").unwrap().is_none());
        assert_eq!(factory.calls(), 1);
        assert!(registry.contains_singleton_object("widget"));
    }

    #[test]
    fn test_type_lookup_skips_unknown_type() {
        let registry = FactoryBeanRegistry::new();
        registry
            .register_factory_bean(
                BeanDefinition::new("mystery"),
                Arc::new(WidgetFactory::singleton().unknown_type()),
            )
            .unwrap();
        registry
            .register_factory_bean(BeanDefinition::new("widget"), Arc::new(WidgetFactory::singleton()))
            .unwrap();

        assert_eq!(registry.get_bean_names_for::<Widget>().unwrap(), vec!["widget"]);
        assert!(registry.get_object_type("mystery").unwrap().is_none());
        assert!(!registry.is_type_match("mystery", &ObjectType::of::<Widget>()).unwrap());
        assert!(registry.get_object_by_type::<Widget>().unwrap().is_some());
    }

    #[test]
    fn test_only_unknown_type_yields_not_found() {
        let factory = Arc::new(WidgetFactory::singleton().unknown_type());
        let registry = registry_with("mystery", factory.clone());

        assert!(registry.get_bean_names_for::<Widget>().unwrap().is_empty());
        assert!(matches!(
            registry.get_object_by_type::<Widget>(),
            Err(ContainerError::BeanNotFound(_))
        ));
        assert_eq!(factory.calls(), 0);
    }

    #[test]
    fn test_eager_type_resolution() {
        let factory = Arc::new(WidgetFactory::singleton().unknown_type());
        let registry =
            FactoryBeanRegistry::with_config(RegistryConfig::new().allow_eager_type_resolution(true));
        registry
            .register_factory_bean(BeanDefinition::new("mystery"), factory.clone())
            .unwrap();

        assert_eq!(registry.get_bean_names_for::<Widget>().unwrap(), vec!["mystery"]);
        assert_eq!(factory.calls(), 1);
        assert!(registry.contains_singleton_object("mystery"));
    }

    #[test]
    fn test_eager_type_resolution_ignores_non_shared_factories() {
        let factory = Arc::new(WidgetFactory::prototype().unknown_type());
        let registry =
            FactoryBeanRegistry::with_config(RegistryConfig::new().allow_eager_type_resolution(true));
        registry
            .register_factory_bean(BeanDefinition::new("mystery"), factory.clone())
            .unwrap();

        assert!(registry.get_bean_names_for::<Widget>().unwrap().is_empty());
        assert_eq!(factory.calls(), 0);
    }

    #[test]
    fn test_object_type_attribute_takes_precedence() {
        let factory = Arc::new(WidgetFactory::singleton().unknown_type());
        let registry = FactoryBeanRegistry::new();
        registry
            .register_factory_bean(
                BeanDefinition::new("widget").with_object_type(ObjectType::of::<Widget>()),
                factory.clone(),
            )
            .unwrap();

        assert_eq!(registry.get_bean_names_for::<Widget>().unwrap(), vec!["widget"]);
        assert_eq!(
            registry.get_object_type("widget").unwrap(),
            Some(ObjectType::of::<Widget>())
        );
        assert_eq!(factory.type_queries(), 0);
        assert_eq!(factory.calls(), 0);
    }

    #[test]
    fn test_object_type_attribute_by_name() {
        let factory = Arc::new(WidgetFactory::singleton().unknown_type());
        let registry = FactoryBeanRegistry::new();
        registry
            .register_factory_bean(
                BeanDefinition::new("widget").with_attribute(OBJECT_TYPE_ATTRIBUTE, "Widget"),
                factory.clone(),
            )
            .unwrap();

        assert!(registry.is_type_match("widget", &ObjectType::of::<Widget>()).unwrap());
        assert!(!registry.is_type_match("widget", &ObjectType::of::<Gadget>()).unwrap());
        assert_eq!(
            registry.get_object_type("widget").unwrap(),
            Some(ObjectType::of::<Widget>())
        );
        assert_eq!(factory.type_queries(), 0);
    }

    #[test]
    fn test_unresolvable_type_name_falls_back_consistently() {
        let factory = Arc::new(WidgetFactory::singleton());
        let registry = FactoryBeanRegistry::new();
        registry
            .register_factory_bean(
                BeanDefinition::new("widget").with_attribute(OBJECT_TYPE_ATTRIBUTE, "Gizmo"),
                factory.clone(),
            )
            .unwrap();

        assert_eq!(
            registry.get_object_type("widget").unwrap(),
            Some(ObjectType::of::<Widget>())
        );
        assert!(registry.is_type_match("widget", &ObjectType::of::<Widget>()).unwrap());
        assert_eq!(registry.get_bean_names_for::<Widget>().unwrap(), vec!["widget"]);
        assert_eq!(factory.calls(), 0);
    }

    #[test]
    fn test_type_name_does_not_match_unrelated_type() {
        let factory = Arc::new(WidgetFactory::singleton().unknown_type());
        let registry = FactoryBeanRegistry::new();
        registry
            .register_factory_bean(
                BeanDefinition::new("widget").with_attribute(OBJECT_TYPE_ATTRIBUTE, "Widget"),
                factory.clone(),
            )
            .unwrap();

        assert!(!registry
            .is_type_match("widget", &ObjectType::of::<other::Widget>())
            .unwrap());
        assert!(registry.get_bean_names_for::<other::Widget>().unwrap().is_empty());
        assert_eq!(registry.get_bean_names_for::<Widget>().unwrap(), vec!["widget"]);
        assert_eq!(factory.type_queries(), 0);
    }

    #[test]
    fn test_factory_dereference() {
        let factory = Arc::new(WidgetFactory::singleton());
        let registry = registry_with("widget", factory.clone());

        let itself = registry.get_object("&widget").unwrap().unwrap();
        assert!(itself.downcast::<WidgetFactory>().is_ok());

        let typed = registry.get_factory_bean::<WidgetFactory>("&widget").unwrap();
        assert!(Arc::ptr_eq(&typed, &factory));
        assert_eq!(factory.calls(), 0);

        assert!(matches!(
            registry.get_factory_bean::<HandleFactory>("widget"),
            Err(ContainerError::NotAFactoryBean(_))
        ));
        assert!(registry
            .is_type_match("&widget", &ObjectType::of::<WidgetFactory>())
            .unwrap());
        assert_eq!(
            registry.get_object_type("&widget").unwrap(),
            Some(ObjectType::of::<WidgetFactory>())
        );
    }

    #[test]
    fn test_creation_error_is_wrapped_and_not_cached() {
        let factory = Arc::new(FailingFactory::new(false));
        let registry = FactoryBeanRegistry::new();
        registry
            .register_factory_bean(BeanDefinition::new("widget"), factory.clone())
            .unwrap();

        let err = registry.get_object("widget").unwrap_err();
        assert!(matches!(
            &err,
            ContainerError::BeanCreationFailed { bean_name, .. } if bean_name == "widget"
        ));
        assert!(err.to_string().contains("database unreachable"));

        assert!(registry.get_object("widget").is_err());
        assert_eq!(factory.attempts.load(Ordering::SeqCst), 2);
        assert!(!registry.contains_singleton_object("widget"));
    }

    #[test]
    fn test_not_initialized_passes_through() {
        let registry = FactoryBeanRegistry::new();
        registry
            .register_factory_bean(BeanDefinition::new("widget"), Arc::new(FailingFactory::new(true)))
            .unwrap();

        let err = registry.get_object("widget").unwrap_err();
        assert!(matches!(err, ContainerError::FactoryBeanNotInitialized(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_nested_object_lookup() {
        let registry = Arc::new(FactoryBeanRegistry::new());
        registry
            .register_factory_bean(BeanDefinition::new("widget"), Arc::new(WidgetFactory::singleton()))
            .unwrap();
        registry
            .register_factory_bean(
                BeanDefinition::new("gadget"),
                Arc::new(GadgetFactory {
                    registry: Arc::clone(&registry),
                    dependency: "widget",
                }),
            )
            .unwrap();

        let gadget = registry.get_typed_object::<Gadget>("gadget").unwrap().unwrap();
        let widget = registry.get_typed_object::<Widget>("widget").unwrap().unwrap();
        assert!(Arc::ptr_eq(&gadget.widget, &widget));
    }

    #[test]
    fn test_circular_reference_detected() {
        let registry = Arc::new(FactoryBeanRegistry::new());
        registry
            .register_factory_bean(
                BeanDefinition::new("gadget"),
                Arc::new(GadgetFactory {
                    registry: Arc::clone(&registry),
                    dependency: "gadget",
                }),
            )
            .unwrap();

        let err = registry.get_object("gadget").unwrap_err();
        assert!(matches!(err, ContainerError::CircularDependency(_)));
        assert!(!registry.contains_singleton_object("gadget"));
    }

    #[test]
    fn test_non_shared_circular_reference_detected() {
        let registry = Arc::new(FactoryBeanRegistry::new());
        registry
            .register_factory_bean(
                BeanDefinition::new("gadget").with_scope(Scope::Prototype),
                Arc::new(GadgetFactory {
                    registry: Arc::clone(&registry),
                    dependency: "gadget",
                }),
            )
            .unwrap();

        let err = registry.get_object("gadget").unwrap_err();
        assert!(matches!(err, ContainerError::CircularDependency(_)));

        // 失败后标记被清除，再次获取仍然报告循环引用而不是其他错误
        let err = registry.get_object("gadget").unwrap_err();
        assert!(matches!(err, ContainerError::CircularDependency(_)));
    }

    #[test]
    fn test_duplicate_registration() {
        let registry = registry_with("widget", Arc::new(WidgetFactory::singleton()));

        let err = registry
            .register_factory_bean(BeanDefinition::new("widget"), Arc::new(WidgetFactory::singleton()))
            .unwrap_err();
        assert!(matches!(err, ContainerError::BeanAlreadyExists(_)));
        assert_eq!(registry.get_bean_definition_count(), 1);
    }

    #[test]
    fn test_overriding_replaces_cached_object() {
        let registry = FactoryBeanRegistry::with_config(
            RegistryConfig::new().allow_bean_definition_overriding(true),
        );
        let first = Arc::new(WidgetFactory::singleton());
        let second = Arc::new(WidgetFactory::singleton());

        registry
            .register_factory_bean(BeanDefinition::new("widget"), first.clone())
            .unwrap();
        registry.get_object("widget").unwrap();
        registry
            .register_factory_bean(BeanDefinition::new("widget"), second.clone())
            .unwrap();
        registry.get_object("widget").unwrap();

        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
        assert_eq!(registry.get_bean_names(), vec!["widget"]);
    }

    #[test]
    fn test_invalid_names_rejected() {
        let registry = FactoryBeanRegistry::new();
        for name in ["", "&widget"] {
            let err = registry
                .register_factory_bean(BeanDefinition::new(name), Arc::new(WidgetFactory::singleton()))
                .unwrap_err();
            assert!(matches!(err, ContainerError::Config(_)));
        }
    }

    #[test]
    fn test_remove_factory_bean() {
        let registry = registry_with("widget", Arc::new(WidgetFactory::singleton()));
        registry.get_object("widget").unwrap();

        registry.remove_factory_bean("&widget").unwrap();

        assert!(!registry.contains_bean("widget"));
        assert!(!registry.contains_singleton_object("widget"));
        assert!(registry.get_bean_names().is_empty());
        assert!(matches!(
            registry.get_object("widget"),
            Err(ContainerError::BeanNotFound(_))
        ));
    }

    #[test]
    fn test_no_unique_bean() {
        let registry = FactoryBeanRegistry::new();
        for name in ["primary", "secondary"] {
            registry
                .register_factory_bean(BeanDefinition::new(name), Arc::new(WidgetFactory::singleton()))
                .unwrap();
        }

        match registry.get_object_by_type::<Widget>() {
            Err(ContainerError::NoUniqueBean { candidates, .. }) => {
                assert_eq!(candidates, vec!["primary", "secondary"]);
            }
            other => panic!("expected NoUniqueBean, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_objects_of_type_skip_no_object() {
        let registry = FactoryBeanRegistry::new();
        registry
            .register_factory_bean(BeanDefinition::new("empty"), Arc::new(WidgetFactory::singleton().no_object()))
            .unwrap();
        registry
            .register_factory_bean(BeanDefinition::new("widget"), Arc::new(WidgetFactory::singleton()))
            .unwrap();

        let objects = registry.get_objects_of_type::<Widget>().unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].0, "widget");
    }

    #[test]
    fn test_destroy_notifies_factory_only() {
        let factory = Arc::new(HandleFactory::new(false));
        let registry = FactoryBeanRegistry::new();
        registry
            .register_disposable_factory_bean(BeanDefinition::new("handle"), factory.clone())
            .unwrap();

        let handle = registry.get_typed_object::<Handle>("handle").unwrap().unwrap();
        registry.destroy_singletons().unwrap();

        assert_eq!(factory.destroyed.load(Ordering::SeqCst), 1);
        assert!(handle.closed.load(Ordering::SeqCst));
        assert!(!registry.contains_singleton_object("handle"));
        assert!(registry.contains_bean("handle"));
    }

    #[test]
    fn test_destroy_runs_every_callback() {
        let failing = Arc::new(HandleFactory::new(true));
        let healthy = Arc::new(HandleFactory::new(false));
        let registry = FactoryBeanRegistry::new();
        registry
            .register_disposable_factory_bean(BeanDefinition::new("healthy"), healthy.clone())
            .unwrap();
        registry
            .register_disposable_factory_bean(BeanDefinition::new("failing"), failing.clone())
            .unwrap();

        let err = registry.destroy_singletons().unwrap_err();

        assert!(matches!(
            &err,
            ContainerError::DestroyFailed { bean_name, .. } if bean_name == "failing"
        ));
        assert_eq!(failing.destroyed.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.destroyed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_singleton_creation() {
        let factory = Arc::new(WidgetFactory::singleton().slow());
        let registry = Arc::new(registry_with("widget", factory.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::task::spawn_blocking(move || registry.get_typed_object::<Widget>("widget"))
            })
            .collect();

        let mut widgets = Vec::new();
        for handle in handles {
            widgets.push(handle.await.unwrap().unwrap().unwrap());
        }

        assert!(widgets.iter().all(|w| Arc::ptr_eq(w, &widgets[0])));
        assert_eq!(factory.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_non_shared_creation_is_not_circular() {
        let factory = Arc::new(WidgetFactory::prototype().slow());
        let registry = Arc::new(registry_with("widget", factory.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::task::spawn_blocking(move || registry.get_typed_object::<Widget>("widget"))
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_some());
        }
        assert_eq!(factory.calls(), 8);
    }
}
