use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use tokio::task::JoinHandle;

use crate::error::TransportError;
use crate::transfer::{
    LoaderMessage, LoaderSink, RequestId, Transport, TransportEvent, TransportEventKind,
};

/// 预分配上限，避免按 Content-Length 一次性申请过大缓冲
const MAX_PREALLOC: u64 = 8 * 1024 * 1024;

/// 基于 reqwest 的传输层：每个请求一个 tokio 任务，分块读取响应体并上报进度
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    sink: LoaderSink,
}

/// 一次 HTTP 请求的句柄
pub struct HttpRequest {
    id: RequestId,
    url: String,
    task: Option<JoinHandle<()>>,
}

impl Drop for HttpRequest {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl HttpTransport {
    pub fn new(sink: LoaderSink, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let http = client_builder(timeout).build()?;
        Ok(Self { http, sink })
    }

    /// 使用调用方配置好的 client（代理、证书等）
    pub fn with_client(http: reqwest::Client, sink: LoaderSink) -> Self {
        Self { http, sink }
    }
}

impl Transport for HttpTransport {
    type Handle = HttpRequest;

    fn open_request(&mut self, id: RequestId, url: &str) -> HttpRequest {
        HttpRequest {
            id,
            url: url.to_string(),
            task: None,
        }
    }

    fn send(&mut self, handle: &mut HttpRequest) {
        if handle.task.is_some() {
            log::warn!("request {:?} already sent", handle.id);
            return;
        }
        let task = tokio::spawn(run_request(
            self.http.clone(),
            handle.id,
            handle.url.clone(),
            self.sink.clone(),
        ));
        handle.task = Some(task);
    }

    fn abort(&mut self, handle: &mut HttpRequest) {
        if let Some(task) = handle.task.take() {
            log::debug!("aborting {} ({:?})", handle.url, handle.id);
            task.abort();
        }
    }
}

/// 默认请求头、gzip，以及可选的整体超时（超时作为传输错误上报）
fn client_builder(timeout: Option<Duration>) -> reqwest::ClientBuilder {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("lazyimg/0.1.0"));
    headers.insert(ACCEPT, HeaderValue::from_static("image/*,*/*;q=0.8"));

    let mut builder = reqwest::Client::builder().default_headers(headers).gzip(true);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
}

async fn run_request(http: reqwest::Client, id: RequestId, url: String, sink: LoaderSink) {
    let emit = |kind: TransportEventKind| {
        // 接收端已关闭说明宿主已退出，无需再报
        let _ = sink.send(LoaderMessage::Transport(TransportEvent { request: id, kind }));
    };

    emit(TransportEventKind::LoadStart);
    match fetch(&http, &url, &emit).await {
        Ok((status, body)) => {
            log::debug!("{url}: status {status}, {} bytes", body.len());
            emit(TransportEventKind::Load { status, body });
        }
        Err(e) => {
            log::debug!("{url}: {e}");
            emit(TransportEventKind::Error(e.to_string()));
        }
    }
    emit(TransportEventKind::LoadEnd);
}

async fn fetch(
    http: &reqwest::Client,
    url: &str,
    emit: &impl Fn(TransportEventKind),
) -> Result<(u16, Vec<u8>), TransportError> {
    let mut resp = http.get(url).send().await?;
    let status = resp.status().as_u16();
    let total = resp.content_length();

    let mut body = Vec::with_capacity(total.unwrap_or(0).min(MAX_PREALLOC) as usize);
    while let Some(chunk) = resp.chunk().await? {
        body.extend_from_slice(&chunk);
        emit(TransportEventKind::Progress {
            loaded: body.len() as u64,
            total: total.unwrap_or(0),
            length_computable: total.is_some(),
        });
    }
    Ok((status, body))
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    use super::*;
    use crate::transfer::WidgetId;

    const ID: RequestId = RequestId { widget: WidgetId(1), generation: 1 };

    /// 本地起一个只应答一次的 HTTP 服务
    async fn serve_once(status_line: &str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let head = format!(
            "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nContent-Type: image/png\r\nConnection: close\r\n\r\n",
            body.len()
        );
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = sock.read(&mut buf).await;
            sock.write_all(head.as_bytes()).await.unwrap();
            sock.write_all(body).await.unwrap();
            let _ = sock.shutdown().await;
        });
        format!("http://{addr}/cover.png")
    }

    fn transport() -> (HttpTransport, mpsc::UnboundedReceiver<LoaderMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        (HttpTransport::with_client(http, tx), rx)
    }

    async fn collect_until_load_end(
        rx: &mut mpsc::UnboundedReceiver<LoaderMessage>,
    ) -> Vec<TransportEventKind> {
        let mut kinds = Vec::new();
        while let Some(LoaderMessage::Transport(ev)) = rx.recv().await {
            assert_eq!(ev.request, ID);
            let done = ev.kind == TransportEventKind::LoadEnd;
            kinds.push(ev.kind);
            if done {
                break;
            }
        }
        kinds
    }

    #[tokio::test]
    async fn streams_progress_then_load() {
        let url = serve_once("200 OK", b"\x89PNG\r\n\x1a\nfake").await;
        let (mut transport, mut rx) = transport();
        let mut req = transport.open_request(ID, &url);
        transport.send(&mut req);

        let kinds = collect_until_load_end(&mut rx).await;
        assert_eq!(kinds.first(), Some(&TransportEventKind::LoadStart));
        assert!(kinds.iter().any(|k| matches!(
            k,
            TransportEventKind::Progress { total: 12, length_computable: true, .. }
        )));
        let n = kinds.len();
        assert_eq!(
            kinds[n - 2],
            TransportEventKind::Load { status: 200, body: b"\x89PNG\r\n\x1a\nfake".to_vec() }
        );
        assert_eq!(kinds[n - 1], TransportEventKind::LoadEnd);
    }

    #[tokio::test]
    async fn non_success_status_is_still_a_load() {
        let url = serve_once("404 Not Found", b"missing").await;
        let (mut transport, mut rx) = transport();
        let mut req = transport.open_request(ID, &url);
        transport.send(&mut req);

        let kinds = collect_until_load_end(&mut rx).await;
        assert!(kinds.iter().any(|k| matches!(k, TransportEventKind::Load { status: 404, .. })));
    }

    #[tokio::test]
    async fn connection_failure_reports_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (mut transport, mut rx) = transport();
        let mut req = transport.open_request(ID, &format!("http://{addr}/x.png"));
        transport.send(&mut req);

        let kinds = collect_until_load_end(&mut rx).await;
        assert!(kinds.iter().any(|k| matches!(k, TransportEventKind::Error(_))));
        assert_eq!(kinds.last(), Some(&TransportEventKind::LoadEnd));
    }

    #[tokio::test]
    async fn silent_server_times_out_as_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // 接受连接但从不应答
            let (_sock, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let http = client_builder(Some(Duration::from_millis(100)))
            .no_proxy()
            .build()
            .unwrap();
        let mut transport = HttpTransport::with_client(http, tx);
        let mut req = transport.open_request(ID, &format!("http://{addr}/slow.png"));
        transport.send(&mut req);

        let kinds = tokio::time::timeout(Duration::from_secs(5), collect_until_load_end(&mut rx))
            .await
            .unwrap();
        assert_eq!(kinds.len(), 3, "{kinds:?}");
        assert_eq!(kinds[0], TransportEventKind::LoadStart);
        match &kinds[1] {
            TransportEventKind::Error(msg) => assert!(msg.contains("timed out"), "{msg}"),
            other => panic!("expected timeout error, got {other:?}"),
        }
        assert_eq!(kinds[2], TransportEventKind::LoadEnd);
    }

    #[tokio::test]
    async fn abort_before_first_poll_emits_nothing() {
        let (mut transport, mut rx) = transport();
        let mut req = transport.open_request(ID, "http://127.0.0.1:9/never.png");
        transport.send(&mut req);
        transport.abort(&mut req);

        let next = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(next.is_err(), "unexpected event after abort: {next:?}");
    }
}
