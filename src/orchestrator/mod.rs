//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层持有进程内的页面状态，把用户操作分派到下层。
//!
//! ## 模块划分
//!
//! ### `exam_store` - 考试列表
//! - 唯一的考试列表（仪表盘、历史、成绩单都从这里读）
//! - 先保存后修改：远程调用成功才改本地列表
//! - 失败时只记录错误信息
//!
//! ### `reorder` - 考生排序
//! - 在副本上上移/下移考生
//! - 保存时把位置作为新的 order 发给后端
//!
//! ### `proctor_console` - 监考控制台
//! - 读取监考员命令
//! - 与倒计时节拍交替驱动 `ExamSession`
//!
//! ## 层次关系
//!
//! ```text
//! exam_store / reorder / proctor_console
//!     ↓
//! workflow::ExamSession (一场考试的流程)
//!     ↓
//! services (ExamService / QuestionSource / AlertSink)
//!     ↓
//! clients::ExamBackend → infrastructure::HttpExecutor
//! ```

pub mod exam_store;
pub mod proctor_console;
pub mod reorder;

// 重新导出主要类型
pub use exam_store::ExamStore;
pub use proctor_console::{ConsoleCommand, ConsoleOutcome, ProctorConsole};
pub use reorder::{MoveDirection, StudentReorder};
