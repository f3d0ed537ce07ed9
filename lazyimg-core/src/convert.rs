//! 字节 → 可显示表示（data URI）的转换

use std::future::Future;
use std::pin::Pin;

use base64::Engine;

use crate::error::ConversionError;

pub type ConvertFuture = Pin<Box<dyn Future<Output = Result<String, ConversionError>> + Send>>;

/// 异步转换器：一次性 future，成功得到可直接渲染的字符串
pub trait Converter: Send + Sync {
    fn convert(&self, bytes: Vec<u8>, mime_type: &str) -> ConvertFuture;
}

/// 生成 `data:<mime>;base64,<payload>`，编码放在阻塞线程池里做
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUriConverter;

impl Converter for DataUriConverter {
    fn convert(&self, bytes: Vec<u8>, mime_type: &str) -> ConvertFuture {
        let mime_type = mime_type.to_string();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || encode_data_uri(&bytes, &mime_type))
                .await
                .map_err(|e| ConversionError::Task(e.to_string()))?
        })
    }
}

pub fn encode_data_uri(bytes: &[u8], mime_type: &str) -> Result<String, ConversionError> {
    if bytes.is_empty() {
        return Err(ConversionError::EmptyPayload);
    }
    let mime = resolve_mime(bytes, mime_type)?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{mime};base64,{encoded}"))
}

/// 通配 mime（`*`、`*/*`、`image/*`、空串）按字节头嗅探，其余照单全收
fn resolve_mime(bytes: &[u8], declared: &str) -> Result<String, ConversionError> {
    let declared = declared.trim();
    let wildcard = declared.is_empty() || declared == "*" || declared.ends_with("/*");
    if !wildcard {
        return Ok(declared.to_string());
    }
    let format = image::guess_format(bytes).map_err(|_| ConversionError::UnrecognizedFormat)?;
    Ok(format.to_mime_type().to_string())
}
