use std::fmt;

/// 通过 `on_error` 回调上报的加载失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    Transport(TransportError),
    Conversion(ConversionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// 传输完成但状态码不在 2xx
    Status(u16),
    /// 连接、读取或超时等传输层失败
    Network(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    EmptyPayload,
    /// 通配 mime 下无法从字节头识别出图片格式
    UnrecognizedFormat,
    /// 转换任务本身失败（panic 或被取消）
    Task(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Transport(e) => write!(f, "transport error: {e}"),
            LoadError::Conversion(e) => write!(f, "conversion error: {e}"),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Status(code) => write!(f, "unexpected status {code}"),
            TransportError::Network(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::EmptyPayload => write!(f, "empty payload"),
            ConversionError::UnrecognizedFormat => write!(f, "unrecognized image format"),
            ConversionError::Task(msg) => write!(f, "conversion task failed: {msg}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Transport(e) => Some(e),
            LoadError::Conversion(e) => Some(e),
        }
    }
}

impl std::error::Error for TransportError {}

impl std::error::Error for ConversionError {}

impl From<TransportError> for LoadError {
    fn from(err: TransportError) -> Self {
        LoadError::Transport(err)
    }
}

impl From<ConversionError> for LoadError {
    fn from(err: ConversionError) -> Self {
        LoadError::Conversion(err)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Network(format!("request timed out: {err}"))
        } else {
            TransportError::Network(err.to_string())
        }
    }
}
