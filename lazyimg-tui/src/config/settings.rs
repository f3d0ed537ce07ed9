use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use lazyimg_core::LazyImageConfig;
use serde::{Deserialize, Serialize};

use super::paths;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub loader: LoaderSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default = "default_images")]
    pub images: Vec<ImageEntry>,
}

/// 所有图片共用的加载参数，单张图片可在 `[[images]]` 中覆盖
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderSettings {
    /// 视口上下额外预加载的行数
    #[serde(default = "default_offset_rows")]
    pub offset_rows: u16,
    #[serde(default = "default_min_loaded_percent")]
    pub min_loaded_percent: f64,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// 每张图片占用的行数（至少 3 行）
    #[serde(default = "default_row_height")]
    pub row_height: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageEntry {
    pub url: String,
    /// 覆盖项（offset_pixels、min_loaded_percent 等）和透传属性（title 等）
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_offset_rows() -> u16 {
    2
}
fn default_min_loaded_percent() -> f64 {
    50.0
}
fn default_mime_type() -> String {
    "*".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_row_height() -> u16 {
    3
}

fn default_images() -> Vec<ImageEntry> {
    (10..40)
        .map(|id| ImageEntry {
            url: format!("https://picsum.photos/id/{id}/640/480"),
            extra: BTreeMap::from([(
                "title".to_string(),
                serde_json::Value::from(format!("picsum #{id}")),
            )]),
        })
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            loader: LoaderSettings::default(),
            display: DisplaySettings::default(),
            images: default_images(),
        }
    }
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            offset_rows: default_offset_rows(),
            min_loaded_percent: default_min_loaded_percent(),
            mime_type: default_mime_type(),
            placeholder: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            row_height: default_row_height(),
        }
    }
}

impl Settings {
    /// 指定路径时只读取该文件；否则读取默认配置，不存在则写入默认值
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("无法读取配置文件 {}", path.display()))?;
            return Self::parse(&content);
        }

        let path = paths::config_file()?;
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Self::parse(&content)
        } else {
            let settings = Self::default();
            settings.save()?;
            Ok(settings)
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content).context("配置文件格式错误")?;
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        let path = paths::config_file()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn row_height(&self) -> u16 {
        self.display.row_height.max(3)
    }
}

/// 单张图片可覆盖的字段，键名与 `LazyImageConfig` 一致（含驼峰别名）；其余键透传
#[derive(Debug, Default, Deserialize)]
struct ImageOverrides {
    #[serde(default, alias = "defaultImage")]
    default_image: Option<String>,
    #[serde(default, alias = "offset", alias = "offsetPixels")]
    offset_pixels: Option<f64>,
    #[serde(default, alias = "mimeType")]
    mime_type: Option<String>,
    #[serde(default, alias = "minLoadedPercent")]
    min_loaded_percent: Option<f64>,
    #[serde(flatten)]
    passthrough: BTreeMap<String, serde_json::Value>,
}

impl LoaderSettings {
    /// 公共参数打底，单张图片写了的键覆盖其上
    pub fn image_config(&self, entry: &ImageEntry) -> Result<LazyImageConfig> {
        let extra = serde_json::Value::Object(entry.extra.clone().into_iter().collect());
        let overrides: ImageOverrides = serde_json::from_value(extra)
            .with_context(|| format!("图片配置无效：{}", entry.url))?;

        let mut config = LazyImageConfig::new(entry.url.clone())
            .with_default_image(overrides.default_image.unwrap_or_else(|| self.placeholder.clone()))
            .with_offset(overrides.offset_pixels.unwrap_or(f64::from(self.offset_rows)))
            .with_mime_type(overrides.mime_type.unwrap_or_else(|| self.mime_type.clone()))
            .with_min_loaded_percent(overrides.min_loaded_percent.unwrap_or(self.min_loaded_percent));
        for (key, value) in overrides.passthrough {
            config = config.with_attribute(key, value);
        }
        config
            .validate()
            .with_context(|| format!("图片配置无效：{}", entry.url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings.loader.offset_rows, 2);
        assert_eq!(settings.loader.min_loaded_percent, 50.0);
        assert_eq!(settings.row_height(), 3);
        assert_eq!(settings.images.len(), 30);
    }

    #[test]
    fn image_entries_override_and_pass_through() {
        let settings = Settings::parse(
            r#"
            [loader]
            offset_rows = 4
            placeholder = "loading..."

            [display]
            row_height = 1

            [[images]]
            url = "https://example.com/a.png"
            title = "first"

            [[images]]
            url = "https://example.com/b.jpg"
            min_loaded_percent = 90.0
            mime_type = "image/jpeg"
            "#,
        )
        .unwrap();
        assert_eq!(settings.row_height(), 3);
        assert_eq!(settings.images.len(), 2);

        let a = settings.loader.image_config(&settings.images[0]).unwrap();
        assert_eq!(a.source_url, "https://example.com/a.png");
        assert_eq!(a.offset_pixels, 4.0);
        assert_eq!(a.default_image, "loading...");
        assert_eq!(a.attribute("title"), Some("first"));

        let b = settings.loader.image_config(&settings.images[1]).unwrap();
        assert_eq!(b.min_loaded_percent, 90.0);
        assert_eq!(b.mime_type, "image/jpeg");
        assert!(b.passthrough.is_empty());
    }

    #[test]
    fn camel_case_overrides_are_accepted() {
        let settings = Settings::parse(
            r#"
            [[images]]
            url = "https://example.com/a.png"
            minLoadedPercent = 90.0
            mimeType = "image/png"
            defaultImage = "..."
            offset = 1
            alt = "sunset"
            "#,
        )
        .unwrap();
        let config = settings.loader.image_config(&settings.images[0]).unwrap();
        assert_eq!(config.min_loaded_percent, 90.0);
        assert_eq!(config.mime_type, "image/png");
        assert_eq!(config.default_image, "...");
        assert_eq!(config.offset_pixels, 1.0);
        assert_eq!(config.attribute("alt"), Some("sunset"));
        assert_eq!(config.passthrough.len(), 1);
    }

    #[test]
    fn invalid_override_is_reported() {
        let settings = Settings::parse(
            r#"
            [[images]]
            url = "https://example.com/a.png"
            min_loaded_percent = 120.0
            "#,
        )
        .unwrap();
        assert!(settings.loader.image_config(&settings.images[0]).is_err());
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let text = toml::to_string_pretty(&Settings::default()).unwrap();
        let parsed = Settings::parse(&text).unwrap();
        assert_eq!(parsed.images.len(), 30);
        assert_eq!(parsed.images[0].url, "https://picsum.photos/id/10/640/480");
    }
}
