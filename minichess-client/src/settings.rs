//! 客户端设置
//!
//! 服务器地址、玩家凭据与引擎监听地址持久化为平台配置目录下的
//! JSON 文件。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 客户端设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// IMCS 服务器主机名
    pub server_host: String,
    /// IMCS 服务器端口
    pub server_port: u16,
    pub username: String,
    pub password: String,
    /// 引擎通道监听地址
    pub engine_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_host: "imcs.svcs.cs.pdx.edu".to_string(),
            server_port: 3589,
            username: String::new(),
            password: String::new(),
            engine_addr: "127.0.0.1:5555".to_string(),
        }
    }
}

impl Settings {
    /// 服务器 `host:port` 地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// 设置文件路径
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("无法确定配置目录")?;
        Ok(config_dir.join("minichess-client").join("settings.json"))
    }

    /// 从默认位置加载；文件不存在时返回默认设置
    pub fn load() -> Result<Settings> {
        Self::load_from(&Self::config_path()?)
    }

    /// 从指定路径加载
    pub fn load_from(path: &Path) -> Result<Settings> {
        if !path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取设置文件失败: {:?}", path))?;
        serde_json::from_str(&content).with_context(|| format!("解析设置文件失败: {:?}", path))
    }

    /// 保存到默认位置
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// 保存到指定路径
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("无法创建配置目录: {:?}", parent))?;
        }
        let content = serde_json::to_string_pretty(self).context("序列化设置失败")?;
        fs::write(path, content).with_context(|| format!("写入设置文件失败: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.server_port, 3589);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = Settings {
            server_host: "localhost".to_string(),
            server_port: 4000,
            username: "alice".to_string(),
            password: "secret".to_string(),
            engine_addr: "127.0.0.1:6000".to_string(),
        };
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.server_addr(), "localhost:4000");
    }
}
