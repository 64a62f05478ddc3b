//! 一秒一次的倒计时节拍
//!
//! 后台任务只负责发送节拍，不修改任何状态；`Countdown` 被 drop 或
//! 调用 `stop()` 时后台任务随之终止，不会在页面关闭后继续触发。

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// 倒计时节拍器
pub struct Countdown {
    ticks: mpsc::Receiver<()>,
    handle: JoinHandle<()>,
}

impl Countdown {
    /// 以一秒为周期启动
    pub fn start() -> Self {
        Self::with_period(Duration::from_secs(1))
    }

    /// 以指定周期启动（第一拍在一个周期之后）
    fn with_period(period: Duration) -> Self {
        let (tx, rx) = mpsc::channel(8);

        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });

        Self { ticks: rx, handle }
    }

    /// 等待下一拍；节拍器已停止时返回 None
    pub async fn tick(&mut self) -> Option<()> {
        self.ticks.recv().await
    }

    /// 停止节拍器
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
