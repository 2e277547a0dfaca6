//! 容器与 FactoryBean 之间共享的常量
//!
//! 注册方（设置注册记录属性）和容器（读取属性）必须使用同一个标识符

/// 注册记录（`BeanDefinition`）上的属性名
///
/// 当无法从 FactoryBean 的实现类型静态推断产品类型时，
/// 可以在注册记录上以该键声明产品类型，容器读取它而无需调用任何 FactoryBean 方法
pub const OBJECT_TYPE_ATTRIBUTE: &str = "factoryBeanObjectType";

/// 按名称获取时，以该前缀开头表示获取 FactoryBean 本身而不是它的产品
///
/// 例如 `"&connectionPool"` 返回工厂，`"connectionPool"` 返回工厂产出的对象
pub const FACTORY_BEAN_PREFIX: &str = "&";
