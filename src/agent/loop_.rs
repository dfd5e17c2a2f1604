//! 工具调用编排循环
//!
//! submit 的核心状态机：构建出站消息 -> 流式请求后端 -> 文本分片随到随发 ->
//! 本轮流中若出现工具调用则按接收顺序派发、结果以 tool 消息写回 transcript
//! 并带完整 transcript 进入下一轮；直到某轮不含任何工具调用（完成），
//! 或达到轮数上限（LoopNonConvergence）。后端流错误对本轮是致命的，
//! 已执行的工具副作用不回滚。

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::agent::context::WorkspaceContext;
use crate::agent::message::Message;
use crate::core::AgentError;
use crate::llm::ChatClient;
use crate::tools::ToolDispatcher;

/// 一次 submit 的结果：最终回复文本与完整 transcript
#[derive(Debug)]
pub struct TurnResult {
    pub response: String,
    pub transcript: Vec<Message>,
}

/// 驱动一轮完整的模型⇄工具循环。
///
/// 文本分片通过 fragment_tx 随到随发（channel 接收端即调用方的惰性输出序列，
/// 调用方 drop 接收端视为放弃本轮，副作用不回滚）；cancel 在轮边界与分片间检查。
#[allow(clippy::too_many_arguments)]
pub async fn chat_turn(
    client: &dyn ChatClient,
    dispatcher: &ToolDispatcher,
    context: &WorkspaceContext,
    system_prompt: &str,
    user_input: &str,
    fragment_tx: Option<&mpsc::UnboundedSender<String>>,
    cancel: CancellationToken,
    max_rounds: usize,
) -> Result<TurnResult, AgentError> {
    let mut transcript = context.outbound_seed(system_prompt, user_input);
    let specs = dispatcher.specs();
    let mut response = String::new();

    for round in 0..max_rounds {
        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }
        tracing::debug!(round, messages = transcript.len(), "requesting completion");

        let mut stream = client.chat_stream(&transcript, &specs).await?;
        let mut calls = Vec::new();
        while let Some(chunk) = stream.next().await {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            let chunk = chunk?;
            if !chunk.text.is_empty() {
                response.push_str(&chunk.text);
                if let Some(tx) = fragment_tx {
                    let _ = tx.send(chunk.text);
                }
            }
            calls.extend(chunk.tool_calls);
        }

        // 本轮流中没有任何工具调用：完成，累计文本作为唯一 assistant 消息入列
        if calls.is_empty() {
            transcript.push(Message::assistant(response.clone()));
            return Ok(TurnResult {
                response,
                transcript,
            });
        }

        // 按接收顺序逐个派发；每个结果一条 tool 消息，结果文本不直接外发
        for call in calls {
            tracing::info!(tool = %call.name, "model requested tool");
            let outcome = dispatcher.execute(&call.name, call.arguments).await;
            transcript.push(Message::tool(outcome.into_text(), call.id));
        }
    }

    Err(AgentError::LoopNonConvergence(max_rounds))
}
