use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 单个懒加载图片的构造参数，构造后不可变。
///
/// 未识别的键原样保存在 `passthrough` 中，交给宿主转发到渲染节点（样式、无障碍属性等）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LazyImageConfig {
    #[serde(alias = "sourceURL", alias = "source")]
    pub source_url: String,
    /// 加载成功前显示的占位图
    #[serde(default, alias = "defaultImage")]
    pub default_image: String,
    /// 视口四周的预加载边距
    #[serde(default, alias = "offset", alias = "offsetPixels")]
    pub offset_pixels: f64,
    #[serde(default = "default_mime_type", alias = "mimeType")]
    pub mime_type: String,
    /// 离开视口时，进度低于该百分比的请求会被中止
    #[serde(default = "default_min_loaded_percent", alias = "minLoadedPercent")]
    pub min_loaded_percent: f64,
    #[serde(flatten)]
    pub passthrough: BTreeMap<String, serde_json::Value>,
}

fn default_mime_type() -> String {
    "*".to_string()
}
fn default_min_loaded_percent() -> f64 {
    50.0
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    MissingSource,
    InvalidOffset(f64),
    InvalidMinLoadedPercent(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingSource => write!(f, "source_url must not be empty"),
            ConfigError::InvalidOffset(v) => {
                write!(f, "offset_pixels must be a finite number >= 0, got {v}")
            }
            ConfigError::InvalidMinLoadedPercent(v) => {
                write!(f, "min_loaded_percent must be within 0..=100, got {v}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl LazyImageConfig {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            default_image: String::new(),
            offset_pixels: 0.0,
            mime_type: default_mime_type(),
            min_loaded_percent: default_min_loaded_percent(),
            passthrough: BTreeMap::new(),
        }
    }

    pub fn with_default_image(mut self, image: impl Into<String>) -> Self {
        self.default_image = image.into();
        self
    }

    pub fn with_offset(mut self, offset_pixels: f64) -> Self {
        self.offset_pixels = offset_pixels;
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_min_loaded_percent(mut self, percent: f64) -> Self {
        self.min_loaded_percent = percent;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.passthrough.insert(key.into(), value.into());
        self
    }

    /// 校验取值范围，通过后原样返回
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.source_url.trim().is_empty() {
            return Err(ConfigError::MissingSource);
        }
        if !self.offset_pixels.is_finite() || self.offset_pixels < 0.0 {
            return Err(ConfigError::InvalidOffset(self.offset_pixels));
        }
        if !(0.0..=100.0).contains(&self.min_loaded_percent) {
            return Err(ConfigError::InvalidMinLoadedPercent(self.min_loaded_percent));
        }
        Ok(self)
    }

    /// 字符串类型的透传属性（如 `title`、`alt`）
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.passthrough.get(key).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let cfg: LazyImageConfig =
            serde_json::from_str(r#"{"source_url": "https://example.com/a.png"}"#).unwrap();
        assert_eq!(cfg.default_image, "");
        assert_eq!(cfg.offset_pixels, 0.0);
        assert_eq!(cfg.mime_type, "*");
        assert_eq!(cfg.min_loaded_percent, 50.0);
        assert!(cfg.passthrough.is_empty());
    }

    #[test]
    fn camel_case_keys_and_passthrough() {
        let cfg: LazyImageConfig = serde_json::from_str(
            r#"{
                "sourceURL": "https://example.com/a.jpg",
                "defaultImage": "placeholder",
                "offset": 120,
                "mimeType": "image/jpeg",
                "minLoadedPercent": 75,
                "accessibilityLabel": "cat",
                "style": {"borderRadius": 4}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.source_url, "https://example.com/a.jpg");
        assert_eq!(cfg.default_image, "placeholder");
        assert_eq!(cfg.offset_pixels, 120.0);
        assert_eq!(cfg.mime_type, "image/jpeg");
        assert_eq!(cfg.min_loaded_percent, 75.0);
        assert_eq!(cfg.attribute("accessibilityLabel"), Some("cat"));
        assert_eq!(cfg.passthrough["style"]["borderRadius"], 4);
        assert_eq!(cfg.passthrough.len(), 2);
    }

    #[test]
    fn toml_tables_deserialize() {
        let cfg: LazyImageConfig = toml::from_str(
            r#"
            source_url = "https://example.com/b.webp"
            offset_pixels = 3.0
            title = "sunset"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.offset_pixels, 3.0);
        assert_eq!(cfg.attribute("title"), Some("sunset"));
    }

    #[test]
    fn missing_source_is_rejected() {
        assert!(serde_json::from_str::<LazyImageConfig>(r#"{"offset": 1}"#).is_err());
        assert_eq!(
            LazyImageConfig::new("  ").validate(),
            Err(ConfigError::MissingSource)
        );
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let base = LazyImageConfig::new("https://example.com/a.png");
        assert_eq!(
            base.clone().with_offset(-1.0).validate(),
            Err(ConfigError::InvalidOffset(-1.0))
        );
        assert!(base.clone().with_offset(f64::INFINITY).validate().is_err());
        assert_eq!(
            base.clone().with_min_loaded_percent(101.0).validate(),
            Err(ConfigError::InvalidMinLoadedPercent(101.0))
        );
        assert!(base.clone().with_min_loaded_percent(f64::NAN).validate().is_err());
        assert!(base.with_min_loaded_percent(100.0).validate().is_ok());
    }
}
