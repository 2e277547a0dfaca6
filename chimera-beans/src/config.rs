use serde::Deserialize;

use crate::error::{ContainerError, ContainerResult};

/// FactoryBean 注册表配置
///
/// 可以通过构建器、环境变量或 TOML 片段（`[registry]` 表或顶层键）设置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// 是否允许同名注册覆盖已有定义（默认：false）
    pub allow_bean_definition_overriding: bool,

    /// 类型未知时，是否允许通过获取单例产品来推断类型（默认：false）
    pub allow_eager_type_resolution: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            allow_bean_definition_overriding: false,
            allow_eager_type_resolution: false,
        }
    }
}

#[derive(Deserialize)]
struct RegistryConfigFile {
    registry: Option<RegistryConfig>,
    #[serde(flatten)]
    top_level: RegistryConfig,
}

impl RegistryConfig {
    /// 创建新的配置
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_bean_definition_overriding(mut self, allow: bool) -> Self {
        self.allow_bean_definition_overriding = allow;
        self
    }

    pub fn allow_eager_type_resolution(mut self, allow: bool) -> Self {
        self.allow_eager_type_resolution = allow;
        self
    }

    /// 从环境变量读取配置
    ///
    /// - `CHIMERA_ALLOW_OVERRIDING`
    /// - `CHIMERA_EAGER_TYPE_RESOLUTION`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(allow) = env_flag("CHIMERA_ALLOW_OVERRIDING") {
            config.allow_bean_definition_overriding = allow;
        }

        if let Some(allow) = env_flag("CHIMERA_EAGER_TYPE_RESOLUTION") {
            config.allow_eager_type_resolution = allow;
        }

        config
    }

    /// 从 TOML 文本解析，`[registry]` 表优先于顶层键
    pub fn from_toml_str(content: &str) -> ContainerResult<Self> {
        let file: RegistryConfigFile =
            toml::from_str(content).map_err(|e| ContainerError::Config(e.to_string()))?;
        Ok(file.registry.unwrap_or(file.top_level))
    }

    /// 从 TOML 文件加载
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> ContainerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ContainerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => {
            tracing::warn!("Ignoring invalid boolean value for {}: '{}'", key, value);
            None
        }
    }
}
