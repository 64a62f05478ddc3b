//! # Exam Proctor
//!
//! 口试安排与监考控制台：管理考试和考生，按顺序逐个监考并评分
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有 HTTP 客户端，只暴露能力
//! - `HttpExecutor` - 发送 JSON 请求并统一处理状态码
//!
//! ### ② 接口层（Clients）
//! - `clients/` - 后端的每个 REST 端点
//! - `ExamBackend` - 可替换的后端接口（测试中使用内存实现）
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `ExamService` - 考试/考生的增删改查，级联删除，批量排序
//! - `QuestionSource` - 抽题
//! - `AlertSink` - 计时结束提醒
//! - `history` - 即将进行/已完成的划分，历史筛选和平均成绩
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一场考试"的完整流程
//! - `exam_phase` - 纯状态机（抽题 → 考试 → 评分 → 下一位）
//! - `Countdown` - 一秒一次的倒计时节拍
//! - `ExamSession` - 把状态机、倒计时和后端串起来
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/exam_store` - 进程内唯一的考试列表
//! - `orchestrator/reorder` - 考生排序
//! - `orchestrator/proctor_console` - 监考控制台
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ExamApiClient, ExamBackend};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::HttpExecutor;
pub use models::{Exam, ExamStatus, Grade, NewExam, NewStudent, Student};
pub use orchestrator::{ExamStore, ProctorConsole, StudentReorder};
pub use services::ExamService;
pub use workflow::{ExamPhase, ExamSession};
