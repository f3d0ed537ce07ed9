//! 单次传输的数据模型，以及传输层与部件之间的消息约定

use tokio::sync::mpsc;

use crate::error::ConversionError;

/// 部件实例 ID，由 [`crate::Loader`] 分配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(pub u64);

/// 请求标识：部件 ID + 代数。
/// 每次 `start` 代数加一，旧代数的消息一律视为过期丢弃。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId {
    pub widget: WidgetId,
    pub generation: u64,
}

/// 字节进度；`total` 为 `None` 表示总大小未知
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub loaded: u64,
    pub total: Option<u64>,
}

impl Progress {
    /// 已加载百分比；总大小未知或为 0 时无定义
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => Some(self.loaded as f64 * 100.0 / total as f64),
            _ => None,
        }
    }
}

/// 单次传输的生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferState {
    #[default]
    Idle,
    Starting,
    InProgress,
    Succeeded,
    Failed,
    Aborted,
}

impl TransferState {
    /// `Starting` / `InProgress` 期间 `is_requesting` 为真
    pub fn is_active(self) -> bool {
        matches!(self, TransferState::Starting | TransferState::InProgress)
    }

    pub fn label(self) -> &'static str {
        match self {
            TransferState::Idle => "idle",
            TransferState::Starting => "starting",
            TransferState::InProgress => "loading",
            TransferState::Succeeded => "loaded",
            TransferState::Failed => "failed",
            TransferState::Aborted => "aborted",
        }
    }
}

/// 传输层按顺序上报的事件
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEventKind {
    LoadStart,
    Progress {
        loaded: u64,
        total: u64,
        length_computable: bool,
    },
    /// 响应完整到达（不论状态码）
    Load { status: u16, body: Vec<u8> },
    /// 传输层失败（连接、读取、超时）
    Error(String),
    /// 每个请求最后一条事件，不论结果
    LoadEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportEvent {
    pub request: RequestId,
    pub kind: TransportEventKind,
}

/// 后台任务发回 UI 任务的消息，宿主按 `widget()` 路由到对应部件
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderMessage {
    Transport(TransportEvent),
    Converted {
        request: RequestId,
        result: Result<String, ConversionError>,
    },
}

impl LoaderMessage {
    pub fn request(&self) -> RequestId {
        match self {
            LoaderMessage::Transport(ev) => ev.request,
            LoaderMessage::Converted { request, .. } => *request,
        }
    }

    pub fn widget(&self) -> WidgetId {
        self.request().widget
    }
}

pub type LoaderSink = mpsc::UnboundedSender<LoaderMessage>;

/// 网络传输抽象。
///
/// 实现方在 `send` 之后通过自己持有的 [`LoaderSink`] 依次发出
/// `LoadStart → Progress* → (Load | Error) → LoadEnd`。
/// `abort` 只是请求停止，不需要再发事件：部件在调用它的同时就地收尾。
pub trait Transport {
    type Handle;

    fn open_request(&mut self, id: RequestId, url: &str) -> Self::Handle;
    fn send(&mut self, handle: &mut Self::Handle);
    fn abort(&mut self, handle: &mut Self::Handle);
}
