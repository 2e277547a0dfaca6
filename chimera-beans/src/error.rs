use thiserror::Error;

/// 容器统一错误类型
///
/// `FactoryBean::get_object` 返回 `Ok(None)` 表示"没有对象"，这不是错误；
/// `FactoryBean::object_type` 返回 `None` 表示类型未知，同样不是错误。
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Bean not found: {0}")]
    BeanNotFound(String),

    #[error("Bean already exists: {0}")]
    BeanAlreadyExists(String),

    /// FactoryBean 尚未完成初始化（例如仍处于循环引用解析中）
    #[error("FactoryBean is not fully initialized yet: {0}")]
    FactoryBeanNotInitialized(String),

    /// 创建或获取产品对象失败
    #[error("Error creating bean '{bean_name}': {source}")]
    BeanCreationFailed {
        bean_name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Bean '{0}' is not a factory bean of the requested type")]
    NotAFactoryBean(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("No unique bean of type '{type_name}': found {}", .candidates.join(", "))]
    NoUniqueBean {
        type_name: String,
        candidates: Vec<String>,
    },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Failed to destroy bean '{bean_name}': {source}")]
    DestroyFailed {
        bean_name: String,
        #[source]
        source: Box<ContainerError>,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to initialize logging: {0}")]
    LoggingInitFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ContainerError {
    /// 使用默认提示构造 `FactoryBeanNotInitialized`
    pub fn not_initialized() -> Self {
        Self::FactoryBeanNotInitialized(
            "FactoryBean is probably in the middle of a circular reference".to_string(),
        )
    }

    pub fn creation_failed(bean_name: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::BeanCreationFailed {
            bean_name: bean_name.into(),
            source: source.into(),
        }
    }

    /// 调用方稍后重试即可恢复的错误
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::FactoryBeanNotInitialized(_))
    }
}

pub type ContainerResult<T> = std::result::Result<T, ContainerError>;
