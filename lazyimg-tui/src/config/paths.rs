use std::path::PathBuf;

use anyhow::{Context, Result};

pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("无法获取配置目录")?
        .join("lazyimg");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn cache_dir() -> Result<PathBuf> {
    let dir = dirs::cache_dir()
        .context("无法获取缓存目录")?
        .join("lazyimg");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn log_file() -> Result<PathBuf> {
    Ok(cache_dir()?.join("lazyimg.log"))
}
