use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::PartitioningDescriptor;

/// TOML 形式的描述符定义
///
/// ```toml
/// kind = "hash"
/// partitions = 16
/// expressions = [1, 2]
/// # schema 省略 = 未提供；schema = [] = 提供但为空
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescriptorConfig {
    pub kind: String,
    pub partitions: i32,
    #[serde(default)]
    pub expressions: Option<Vec<u8>>,
    #[serde(default)]
    pub schema: Option<Vec<u8>>,
}

impl DescriptorConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read descriptor config {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("parse descriptor config {}", path.display()))
    }

    pub fn into_descriptor(self) -> PartitioningDescriptor {
        PartitioningDescriptor::new(self.kind, self.partitions, self.expressions, self.schema)
    }
}

/// `$XDG_CONFIG_HOME/native-partitioning/descriptor.toml`（无配置目录时退回当前目录）
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("native-partitioning")
        .join("descriptor.toml")
}
