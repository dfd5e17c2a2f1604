//! 对话代理：上下文、消息模型与工具调用编排循环

pub mod context;
pub mod loop_;
pub mod message;

pub use context::{summarize_history, WorkspaceContext};
pub use loop_::{chat_turn, TurnResult};
pub use message::{Message, Role};

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::AgentError;
use crate::llm::ChatClient;
use crate::tools::ToolDispatcher;

/// 面向调用方的对话代理：持有后端客户端、工具调度器与当前工作区上下文
pub struct Agent {
    client: Arc<dyn ChatClient>,
    dispatcher: ToolDispatcher,
    context: WorkspaceContext,
    system_prompt: String,
    max_tool_rounds: usize,
}

impl Agent {
    pub fn new(
        client: Arc<dyn ChatClient>,
        dispatcher: ToolDispatcher,
        system_prompt: impl Into<String>,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            client,
            dispatcher,
            context: WorkspaceContext::new(),
            system_prompt: system_prompt.into(),
            max_tool_rounds,
        }
    }

    pub fn context(&self) -> &WorkspaceContext {
        &self.context
    }

    /// 切换工作区时整体替换上下文（摘要 + 历史）
    pub fn reset_context(&mut self, summary: Option<String>, history: Vec<(String, String)>) {
        self.context.reset(summary, history);
    }

    /// 提交一条用户输入并驱动完整的模型⇄工具循环；
    /// 成功后把 (user, assistant) 对记入内存历史
    pub async fn submit(
        &mut self,
        user_input: &str,
        fragment_tx: Option<&mpsc::UnboundedSender<String>>,
        cancel: CancellationToken,
    ) -> Result<String, AgentError> {
        let turn = chat_turn(
            self.client.as_ref(),
            &self.dispatcher,
            &self.context,
            &self.system_prompt,
            user_input,
            fragment_tx,
            cancel,
            self.max_tool_rounds,
        )
        .await?;

        let mut history = self.context.history().to_vec();
        history.push((user_input.to_string(), turn.response.clone()));
        let summary = self.context.summary().map(str::to_string);
        self.context.reset(summary, history);

        Ok(turn.response)
    }

    /// 压缩当前历史为摘要文本（不修改上下文，持久化由调用方负责）
    pub async fn summarize(&self) -> Result<String, AgentError> {
        summarize_history(self.client.as_ref(), self.context.history()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockClient;
    use crate::tools::builtin_registry;

    fn agent_with(client: MockClient) -> Agent {
        let dispatcher = ToolDispatcher::new(builtin_registry().unwrap(), 5);
        Agent::new(Arc::new(client), dispatcher, "prompt", 8)
    }

    #[tokio::test]
    async fn submit_records_the_exchange_in_history() {
        let client = MockClient::text_reply(&["fine, thanks"]);
        let mut agent = agent_with(client);

        let reply = agent
            .submit("how are you", None, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(reply, "fine, thanks");
        assert_eq!(
            agent.context().history(),
            &[("how are you".to_string(), "fine, thanks".to_string())]
        );
    }

    #[tokio::test]
    async fn summarize_leaves_context_untouched() {
        let client = MockClient::text_reply(&["ok"]).with_completion("they discussed greetings");
        let mut agent = agent_with(client);
        agent.reset_context(None, vec![("hi".to_string(), "hello".to_string())]);

        let summary = agent.summarize().await.unwrap();

        assert_eq!(summary, "they discussed greetings");
        assert!(agent.context().summary().is_none());
        assert_eq!(agent.context().history().len(), 1);
    }

    #[tokio::test]
    async fn summarize_is_idempotent_over_unchanged_history() {
        let client = MockClient::text_reply(&["ok"]).with_completion("greeting exchange");
        let mut agent = agent_with(client);
        agent.reset_context(None, vec![("hi".to_string(), "hello".to_string())]);

        let first = agent.summarize().await.unwrap();
        let second = agent.summarize().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first, "greeting exchange");
    }
}
