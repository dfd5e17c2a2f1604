//! OpenAI 兼容 API 客户端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url），默认指向
//! 本地 Ollama 的兼容端点。chat_stream 驱动 SSE 流：文本增量随到随发，
//! 工具调用的分片增量按 index 组装，流结束时作为最后一个分片整体给出。

use std::collections::BTreeMap;

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionTools,
    CreateChatCompletionRequestArgs, FunctionObjectArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::agent::{Message, Role};
use crate::core::AgentError;
use crate::llm::{ChatClient, ChunkStream, ReceiverStream, StreamChunk, ToolCallRequest, ToolSchema};

/// OpenAI 兼容客户端：持有 Client 与 model 名
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClient {
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }

    fn to_openai_messages(&self, messages: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|m| match m.role {
                Role::System => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .unwrap(),
                ),
                Role::User => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .unwrap(),
                ),
                Role::Assistant => ChatCompletionRequestMessage::Assistant(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .unwrap(),
                ),
                Role::Tool => ChatCompletionRequestMessage::Tool(
                    ChatCompletionRequestToolMessageArgs::default()
                        .content(m.content.clone())
                        .tool_call_id(m.tool_call_id.clone().unwrap_or_default())
                        .build()
                        .unwrap(),
                ),
            })
            .collect()
    }

    fn to_openai_tools(tools: &[ToolSchema]) -> Vec<ChatCompletionTools> {
        tools
            .iter()
            .map(|t| {
                ChatCompletionTools::Function(ChatCompletionTool {
                    function: FunctionObjectArgs::default()
                        .name(t.name.clone())
                        .description(t.description.clone())
                        .parameters(t.parameters.clone())
                        .build()
                        .unwrap(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, AgentError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.to_openai_messages(messages))
            .build()
            .map_err(|e| AgentError::Backend(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AgentError::Backend(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content)
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> Result<ChunkStream, AgentError> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(self.to_openai_messages(messages))
            .stream(true);
        if !tools.is_empty() {
            builder.tools(Self::to_openai_tools(tools));
        }
        let request = builder
            .build()
            .map_err(|e| AgentError::Backend(e.to_string()))?;

        let mut backend = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| AgentError::Backend(e.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel::<Result<StreamChunk, AgentError>>();
        tokio::spawn(async move {
            // 工具调用增量按 index 组装，流结束后整体下发
            let mut pending: BTreeMap<u32, PendingCall> = BTreeMap::new();
            while let Some(item) = backend.next().await {
                let resp = match item {
                    Ok(resp) => resp,
                    Err(e) => {
                        let _ = tx.send(Err(AgentError::Backend(e.to_string())));
                        return;
                    }
                };
                for choice in &resp.choices {
                    if let Some(text) = &choice.delta.content {
                        if !text.is_empty()
                            && tx.send(Ok(StreamChunk::text(text.clone()))).is_err()
                        {
                            return; // 调用方已放弃接收
                        }
                    }
                    if let Some(fragments) = &choice.delta.tool_calls {
                        for frag in fragments {
                            let entry = pending.entry(frag.index).or_default();
                            if let Some(id) = &frag.id {
                                entry.id = id.clone();
                            }
                            if let Some(func) = &frag.function {
                                if let Some(name) = &func.name {
                                    entry.name.push_str(name);
                                }
                                if let Some(arguments) = &func.arguments {
                                    entry.arguments.push_str(arguments);
                                }
                            }
                        }
                    }
                }
            }
            let calls: Vec<ToolCallRequest> =
                pending.into_values().map(PendingCall::into_request).collect();
            if !calls.is_empty() {
                let _ = tx.send(Ok(StreamChunk {
                    text: String::new(),
                    tool_calls: calls,
                }));
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// 流中逐步拼出的一次工具调用（id / name / 参数 JSON 文本）
#[derive(Default)]
struct PendingCall {
    id: String,
    name: String,
    arguments: String,
}

impl PendingCall {
    fn into_request(self) -> ToolCallRequest {
        let id = if self.id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            self.id
        };
        let arguments = if self.arguments.trim().is_empty() {
            Value::Object(serde_json::Map::new())
        } else {
            match serde_json::from_str::<Value>(&self.arguments) {
                Ok(v) => v,
                // 非法 JSON 原样下传，由调度器作为错误结果回注给模型
                Err(_) => Value::String(self.arguments),
            }
        };
        ToolCallRequest {
            id,
            name: self.name,
            arguments,
        }
    }
}
