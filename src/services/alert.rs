//! 提醒服务 - 业务能力层
//!
//! 只负责"时间到了响一声"

use std::io::Write;

use tracing::{debug, warn};

/// 计时结束提醒
pub trait AlertSink: Send + Sync {
    fn time_up(&self, student_name: &str);
}

/// 终端响铃
pub struct TerminalBell {
    enabled: bool,
}

impl TerminalBell {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Default for TerminalBell {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AlertSink for TerminalBell {
    fn time_up(&self, student_name: &str) {
        warn!("⏰ 时间到！{} 的考试时间已用完", student_name);

        if !self.enabled {
            return;
        }

        let mut stdout = std::io::stdout();
        if let Err(e) = stdout.write_all(b"\x07").and_then(|_| stdout.flush()) {
            debug!("响铃失败: {}", e);
        }
    }
}

/// 不发出任何提醒
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAlert;

impl AlertSink for SilentAlert {
    fn time_up(&self, _student_name: &str) {}
}
