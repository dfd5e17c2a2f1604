//! Agent 错误类型
//!
//! 只保留会终止本轮 submit/summarize 的致命错误。工具级失败（未知工具、
//! 参数校验、执行失败、超时）不在此列：它们作为 ToolOutcome::Error
//! 以 tool 消息回注给模型，属于对话数据而非错误。

use thiserror::Error;

/// Agent 运行过程中的致命错误（后端通信、循环不收敛、持久化等）
#[derive(Error, Debug)]
pub enum AgentError {
    /// 推理后端通信失败（连接、协议、流中断）；本层不重试，由调用方决定
    #[error("Backend error: {0}")]
    Backend(String),

    /// 模型⇄工具往返轮数超过配置上限，终止本轮
    #[error("tool-call loop did not converge after {0} rounds")]
    LoopNonConvergence(usize),

    #[error("Cancelled")]
    Cancelled,

    /// 注册表中已存在同名工具（启动期校验）
    #[error("Duplicate tool: {0}")]
    DuplicateTool(String),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),
}
