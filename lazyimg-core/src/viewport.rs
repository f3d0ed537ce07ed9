//! 可见性判定：扩展视口相交测试 + 启动/中止决策

/// 宿主渲染节点的不透明句柄，几何查询和回调都用它标识元素
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(pub u64);

/// 轴对齐矩形，坐标相对视口左上角
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            bottom: top + height,
            right: left + width,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// 宿主提供的几何查询
pub trait GeometryProvider {
    /// 元素尚未布局时返回 `None`
    fn bounding_rect(&self, element: ElementHandle) -> Option<Rect>;
    fn viewport_size(&self) -> ViewportSize;
}

/// 视口四周各扩展 `offset` 后的相交测试。
/// 下/右边界用 `>=`，上/左边界用 `<`，故意在边缘偏向触发以便提前加载。
pub fn is_in_viewport(rect: &Rect, viewport: ViewportSize, offset: f64) -> bool {
    rect.bottom >= -offset
        && rect.right >= -offset
        && rect.top < viewport.height + offset
        && rect.left < viewport.width + offset
}

/// 一次可见性评估的结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// 进入视口且当前无请求：发起加载
    Start,
    /// 离开视口且进度不足（或未知）：中止
    Abort,
    /// 离开视口但进度已达阈值：放任其完成
    Continue,
    /// 其余情况
    Nothing,
}

/// `percent` 为 `None` 表示总大小未知，视为进度不足
pub fn decide(
    in_viewport: bool,
    requesting: bool,
    percent: Option<f64>,
    min_loaded_percent: f64,
) -> Decision {
    match (in_viewport, requesting) {
        (true, false) => Decision::Start,
        (false, true) => match percent {
            Some(p) if p >= min_loaded_percent => Decision::Continue,
            _ => Decision::Abort,
        },
        _ => Decision::Nothing,
    }
}
