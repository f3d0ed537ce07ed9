pub mod broadcast;
pub mod callbacks;
pub mod config;
pub mod convert;
pub mod error;
pub mod http;
pub mod transfer;
pub mod viewport;
pub mod widget;

pub use broadcast::ScrollBroadcast;
pub use callbacks::{AbortReason, LifecycleCallbacks};
pub use config::{ConfigError, LazyImageConfig};
pub use convert::{ConvertFuture, Converter, DataUriConverter};
pub use error::{ConversionError, LoadError, TransportError};
pub use http::HttpTransport;
pub use transfer::{
    LoaderMessage, LoaderSink, Progress, RequestId, TransferState, Transport, TransportEvent,
    TransportEventKind, WidgetId,
};
pub use viewport::{Decision, ElementHandle, GeometryProvider, Rect, ViewportSize};
pub use widget::{LazyImage, Loader};
