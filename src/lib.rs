//! Foreman - 本地私有对话助理
//!
//! 模块划分：
//! - **agent**: 消息模型、工作区上下文与工具调用编排循环
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **store**: SQLite 工作区与历史持久化
//! - **tools**: 工具箱（数学与文件工具）、注册表与调度器

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod store;
pub mod tools;
