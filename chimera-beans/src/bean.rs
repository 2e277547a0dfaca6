use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{constants::OBJECT_TYPE_ATTRIBUTE, object_type::ObjectType, ContainerResult, Scope};

/// 注册记录上的属性值
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    ObjectType(ObjectType),
    /// 类型名称（完整路径或短名称）也可以作为产品类型声明
    String(String),
    Bool(bool),
    Int(i64),
}

impl From<ObjectType> for AttributeValue {
    fn from(value: ObjectType) -> Self {
        AttributeValue::ObjectType(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

/// 注册记录上声明的产品类型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeclaredObjectType<'a> {
    Type(ObjectType),
    Name(&'a str),
}

impl DeclaredObjectType<'_> {
    /// 解析为具体类型
    ///
    /// 名称只能指向 FactoryBean 自己的产品类型 `produced`，无法解析时返回 `None`
    pub fn resolve(&self, produced: ObjectType) -> Option<ObjectType> {
        match self {
            DeclaredObjectType::Type(ty) => Some(*ty),
            DeclaredObjectType::Name(name) => produced.matches_name(name).then_some(produced),
        }
    }
}

/// 销毁回调类型
pub type DestroyCallback = Arc<dyn Fn() -> ContainerResult<()> + Send + Sync>;

/// Bean 定义 - FactoryBean 的注册记录
pub struct BeanDefinition {
    /// Bean 的名称
    pub name: String,

    /// FactoryBean 本身的作用域
    pub scope: Scope,

    /// 附加在记录上的元数据
    pub attributes: HashMap<String, AttributeValue>,

    /// FactoryBean 的销毁回调，容器不会对产品调用任何销毁逻辑
    pub destroy_callback: Option<DestroyCallback>,
}

impl BeanDefinition {
    /// 创建新的 Bean 定义
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: Scope::default(),
            attributes: HashMap::new(),
            destroy_callback: None,
        }
    }

    /// 使用类型名推导的默认名称，例如 `ConnectionPoolFactory` -> `connectionPoolFactory`
    pub fn for_type<T: ?Sized>() -> Self {
        Self::new(crate::utils::naming::default_bean_name::<T>())
    }

    /// 设置作用域
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// 在注册记录上声明产品类型
    pub fn with_object_type(self, object_type: ObjectType) -> Self {
        self.with_attribute(OBJECT_TYPE_ATTRIBUTE, object_type)
    }

    /// 设置销毁回调
    pub fn with_destroy<F>(mut self, destroy_fn: F) -> Self
    where
        F: Fn() -> ContainerResult<()> + Send + Sync + 'static,
    {
        self.destroy_callback = Some(Arc::new(destroy_fn));
        self
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn get_attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<AttributeValue> {
        self.attributes.remove(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// 读取 `factoryBeanObjectType` 属性
    ///
    /// 属性值不是类型或类型名称时视为未声明
    pub fn declared_object_type(&self) -> Option<DeclaredObjectType<'_>> {
        match self.attributes.get(OBJECT_TYPE_ATTRIBUTE)? {
            AttributeValue::ObjectType(ty) => Some(DeclaredObjectType::Type(*ty)),
            AttributeValue::String(name) if !name.trim().is_empty() => {
                Some(DeclaredObjectType::Name(name.trim()))
            }
            other => {
                tracing::warn!(
                    "Ignoring invalid '{}' attribute on bean '{}': {:?}",
                    OBJECT_TYPE_ATTRIBUTE,
                    self.name,
                    other
                );
                None
            }
        }
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("attributes", &self.attributes)
            .field("has_destroy_callback", &self.destroy_callback.is_some())
            .finish()
    }
}
