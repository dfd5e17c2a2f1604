//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Mock）实现 ChatClient：complete（非流式、无工具，
//! 用于摘要）、chat_stream（流式，携带工具 schema）。流式分片 StreamChunk
//! 可含增量文本与（流结束时）组装完成的工具调用请求。

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use serde_json::Value;

use crate::agent::Message;
use crate::core::AgentError;

/// 随请求发送给后端的工具 schema
#[derive(Clone, Debug)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema（object / properties / required）
    pub parameters: Value,
}

/// 后端请求的一次工具调用
#[derive(Clone, Debug)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    /// 参数映射；后端给出非法 JSON 时原样保留为字符串，由调度器报错回注
    pub arguments: Value,
}

/// 流式响应分片：增量文本与组装完成的工具调用请求
#[derive(Clone, Debug, Default)]
pub struct StreamChunk {
    pub text: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl StreamChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_call(request: ToolCallRequest) -> Self {
        Self {
            text: String::new(),
            tool_calls: vec![request],
        }
    }
}

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, AgentError>> + Send>>;

/// LLM 客户端 trait：非流式完成与携带工具的流式完成
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// 非流式完成（无工具），用于摘要等单发请求
    async fn complete(&self, messages: &[Message]) -> Result<String, AgentError>;

    /// 流式完成；文本分片随到随发，工具调用在流结束时作为最后分片给出
    async fn chat_stream(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> Result<ChunkStream, AgentError>;
}
