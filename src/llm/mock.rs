//! Mock LLM 客户端（用于测试，无需后端）
//!
//! 按脚本回放多轮流式分片：每次 chat_stream 弹出一轮 Vec<StreamChunk>，
//! complete 返回固定文本；同时记录收到的消息列表，便于断言出站 prompt。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream;

use crate::agent::Message;
use crate::core::AgentError;
use crate::llm::{ChatClient, ChunkStream, StreamChunk, ToolSchema};

/// 脚本化 Mock 客户端
pub struct MockClient {
    rounds: Mutex<VecDeque<Vec<StreamChunk>>>,
    completion: String,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl MockClient {
    pub fn new(rounds: Vec<Vec<StreamChunk>>) -> Self {
        Self {
            rounds: Mutex::new(rounds.into()),
            completion: "Mock summary.".to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 便捷构造：单轮纯文本回复，按给定分片流式给出
    pub fn text_reply(chunks: &[&str]) -> Self {
        Self::new(vec![chunks.iter().map(|c| StreamChunk::text(*c)).collect()])
    }

    /// 设置 complete 的固定返回文本
    pub fn with_completion(mut self, text: impl Into<String>) -> Self {
        self.completion = text.into();
        self
    }

    /// 收到过的全部请求消息列表（complete 与 chat_stream 都记录）
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for MockClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, AgentError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        Ok(self.completion.clone())
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
        _tools: &[ToolSchema],
    ) -> Result<ChunkStream, AgentError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let round = self.rounds.lock().unwrap().pop_front().unwrap_or_default();
        let items: Vec<Result<StreamChunk, AgentError>> = round.into_iter().map(Ok).collect();
        Ok(Box::pin(stream::iter(items)))
    }
}
