use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// 运行时类型标识
///
/// 由 `FactoryBean::object_type` 返回，相等性只比较 `TypeId`
#[derive(Clone, Copy)]
pub struct ObjectType {
    type_id: TypeId,
    type_name: &'static str,
}

impl ObjectType {
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// 完整类型路径，例如 `my_app::db::ConnectionPool`
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// 不带模块路径的类型名，例如 `ConnectionPool`
    pub fn short_name(&self) -> &'static str {
        crate::utils::naming::short_type_name(self.type_name)
    }

    pub fn is<T: Any + ?Sized>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// 判断类型名称（完整路径或短名称）是否指向该类型
    ///
    /// 用于注册记录上以字符串形式声明的产品类型
    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.trim();
        !name.is_empty() && (self.type_name == name || self.short_name() == name)
    }
}

impl PartialEq for ObjectType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ObjectType {}

impl Hash for ObjectType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectType").field(&self.type_name).finish()
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}
