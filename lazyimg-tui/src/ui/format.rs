use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// 按显示宽度截断文本，超出时末尾加 ".."
pub(crate) fn truncate_str(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let content_max = max.saturating_sub(2);
    let mut result = String::new();
    let mut w = 0;
    for c in s.chars() {
        let cw = c.width().unwrap_or(0);
        if w + cw > content_max {
            break;
        }
        result.push(c);
        w += cw;
    }
    result.push_str("..");
    result
}

/// 总量未知时返回空槽
pub(crate) fn build_progress_bar(percent: Option<f64>, width: usize) -> String {
    let Some(percent) = percent else {
        return "⣀".repeat(width);
    };
    let ratio = (percent / 100.0).clamp(0.0, 1.0);
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("{}{}", "⣿".repeat(filled), "⣀".repeat(empty))
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    let b = bytes as f64;
    if b >= MIB {
        format!("{:.1} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// data URI 只显示头部和原始大小，正文太长没有意义
pub(crate) fn summarize_image(image: &str) -> String {
    match image.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
        Some((header, payload)) => {
            // base64 每 4 个字符对应 3 个字节
            let raw = payload.len() as u64 / 4 * 3;
            format!("data:{header} · {}", format_bytes(raw))
        }
        None => image.to_string(),
    }
}
