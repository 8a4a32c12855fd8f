//! # shuxue-algo - 数学闯关游戏核心算法库
//!
//! 本 crate 提供掌握度追踪与自适应练习选择的纯 Rust 实现:
//!
//! - **Answer Event Recorder** - 提交答案规范化为不可变答题记录
//! - **Mastery Aggregator** - 按知识点滚动正确率、尝试次数与趋势
//! - **Weakness Selector** - 低于熟练阈值 (0.70) 的薄弱知识点
//! - **Practice Question Selector** - 去重、按难度排序的针对性练习题
//! - **Level Completion Evaluator** - 正确率映射为星级并移交记录
//!
//! ## 设计理念
//!
//! - **纯函数** - 无 I/O、无异步，持久化由调用方负责
//! - **按用户隔离** - 所有状态归属于单个用户的 [`UserProgress`]
//! - **原子更新** - 批次要么整体生效，要么完全不生效
//!
//! ## 模块结构
//!
//! - [`types`] - 公共类型和常量
//! - [`catalog`] - 题库索引与校验
//! - [`recorder`] - 答题记录
//! - [`mastery`] - 掌握度聚合
//! - [`weakness`] - 薄弱点筛选
//! - [`practice`] - 练习题选择
//! - [`completion`] - 关卡结算与答题会话状态机
//! - [`progress`] - 用户进度聚合
//! - [`sanitize`] - 数值清洗与诊断
//!
//! ## 使用示例
//!
//! ```rust
//! use chrono::Utc;
//! use shuxue_algo::{fold_answers, weak_topics, MasteryState};
//!
//! let state = fold_answers(&MasteryState::new(), &[], Utc::now());
//! assert!(weak_topics(&state).is_empty());
//! ```

// ============================================================================
// 模块声明
// ============================================================================

pub mod catalog;
pub mod completion;
pub mod error;
pub mod mastery;
pub mod practice;
pub mod progress;
pub mod recorder;
pub mod sanitize;
pub mod types;
pub mod weakness;

// ============================================================================
// 重新导出
// ============================================================================

/// 重新导出所有公共类型
pub use types::*;

pub use catalog::{Catalog, CatalogSource};
pub use completion::{
    evaluate_completion, stars_for_rate, Advance, CompletionOutcome, PlaySession, SessionPhase,
};
pub use error::{AlgoError, AlgoResult, CatalogError, RecordError, SessionError};
pub use mastery::{apply_answers, apply_answers_parallel, fold_answers, UserBatch, UserFoldResult};
pub use practice::{select_practice, select_practice_from};
pub use progress::{HistorySummary, LevelCompletion, LevelRecord, UserProgress};
pub use recorder::{record_answer, AnswerContext, Submission};
pub use weakness::{rank_weak_topics, trend_summary, weak_topics, TrendSummary};
