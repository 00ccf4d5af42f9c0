use std::cell::Cell;
use std::time::Instant;

thread_local! {
    static PERF_DEPTH: Cell<u32> = Cell::new(0);
    static ACTIVATION_COUNT: Cell<u64> = Cell::new(0);
}

/// 记录一次供应链节点激活 (仅在 PerfGuard 存活期间计数)
pub fn record_activation() {
    let active = PERF_DEPTH.with(|d| d.get() > 0);
    if !active {
        return;
    }
    ACTIVATION_COUNT.with(|c| c.set(c.get().saturating_add(1)));
}

/// 当前线程累计的激活次数
pub fn activation_count() -> u64 {
    ACTIVATION_COUNT.with(|c| c.get())
}

/// 性能统计 Guard：记录 elapsed_ms + 节点激活次数
///
/// 使用方式：
/// ```ignore
/// let _perf = multi_plant_aps::perf::PerfGuard::new("greedy_plan");
/// // do work...
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    activation_start: u64,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        PERF_DEPTH.with(|d| d.set(d.get().saturating_add(1)));
        Self {
            op,
            start: Instant::now(),
            activation_start: activation_count(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        let activations = activation_count().saturating_sub(self.activation_start);

        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms,
            activations,
            "done"
        );

        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}
