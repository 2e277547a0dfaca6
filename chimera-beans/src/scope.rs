/// 已注册的 FactoryBean 自身的作用域
///
/// 只有单例作用域的 FactoryBean 才允许容器缓存它的产品对象
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// 单例模式 - 容器中只有一个实例
    #[default]
    Singleton,

    /// 原型模式 - 产品对象不会被缓存
    Prototype,
}

impl Scope {
    pub fn is_singleton(&self) -> bool {
        matches!(self, Scope::Singleton)
    }
}
