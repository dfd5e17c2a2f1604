//! 工作区上下文
//!
//! 保存当前工作区的长期摘要与短期历史，切换工作区时通过 reset 一次性替换；
//! outbound_seed 生成每轮的出站消息列表（system + 历史对 + 新输入），
//! summarize_history 用一次非流式补全把历史压缩为摘要供持久化。

use crate::agent::message::Message;
use crate::core::AgentError;
use crate::llm::ChatClient;

/// 摘要注入 system prompt 时的标签前缀
const CONTEXT_LABEL: &str = "[Context Summary]: ";

const SUMMARIZE_SYSTEM: &str = "You are a helpful assistant that summarizes conversations.";
const SUMMARIZE_INSTRUCTION: &str = "Summarize the following conversation between a user and \
an assistant. Focus on the main topics, decisions, and any important context. \
Be concise and clear.";

/// 当前工作区的上下文：可选的长期摘要 + (user, assistant) 历史对（最旧在前）
#[derive(Clone, Debug, Default)]
pub struct WorkspaceContext {
    summary: Option<String>,
    history: Vec<(String, String)>,
}

impl WorkspaceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 替换摘要与历史（两个字段一起更新）；空白摘要归一为 None，
    /// 保证不会注入空的上下文块
    pub fn reset(&mut self, summary: Option<String>, history: Vec<(String, String)>) {
        self.summary = summary.filter(|s| !s.trim().is_empty());
        self.history = history;
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn history(&self) -> &[(String, String)] {
        &self.history
    }

    /// 构建一轮的出站消息列表：
    /// system（prompt，有摘要时拼接标签块）-> 历史对（user/assistant，最旧在前）-> 新 user 消息
    pub fn outbound_seed(&self, system_prompt: &str, user_input: &str) -> Vec<Message> {
        let system = match &self.summary {
            Some(s) => format!("{system_prompt}\n\n{CONTEXT_LABEL}{s}"),
            None => system_prompt.to_string(),
        };
        let mut messages = Vec::with_capacity(self.history.len() * 2 + 2);
        messages.push(Message::system(system));
        for (user, assistant) in &self.history {
            messages.push(Message::user(user.clone()));
            messages.push(Message::assistant(assistant.clone()));
        }
        messages.push(Message::user(user_input));
        messages
    }
}

/// 将历史压缩为一段摘要文本：单次非流式补全、固定指令、不带工具
pub async fn summarize_history(
    client: &dyn ChatClient,
    history: &[(String, String)],
) -> Result<String, AgentError> {
    let history_text = history
        .iter()
        .map(|(user, assistant)| format!("User: {user}\nAssistant: {assistant}"))
        .collect::<Vec<_>>()
        .join("\n");
    let messages = vec![
        Message::system(SUMMARIZE_SYSTEM),
        Message::user(format!("{SUMMARIZE_INSTRUCTION}\n\n{history_text}")),
    ];
    tracing::info!(pairs = history.len(), "summarizing history");
    let response = client.complete(&messages).await?;
    Ok(response.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::Role;

    #[test]
    fn reset_normalizes_blank_summary() {
        let mut ctx = WorkspaceContext::new();
        ctx.reset(Some("  ".to_string()), vec![]);
        assert!(ctx.summary().is_none());

        ctx.reset(Some("built a shed".to_string()), vec![]);
        assert_eq!(ctx.summary(), Some("built a shed"));
    }

    #[test]
    fn outbound_seed_orders_system_history_user() {
        let mut ctx = WorkspaceContext::new();
        ctx.reset(
            None,
            vec![("hi".to_string(), "hello".to_string())],
        );
        let messages = ctx.outbound_seed("base prompt", "next question");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, "base prompt");
        assert_eq!(messages[1].content, "hi");
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[3].content, "next question");
    }

    #[test]
    fn outbound_seed_injects_summary_verbatim() {
        let mut ctx = WorkspaceContext::new();
        ctx.reset(Some("pouring a slab for the garage".to_string()), vec![]);
        let messages = ctx.outbound_seed("base prompt", "q");
        assert!(messages[0]
            .content
            .contains("[Context Summary]: pouring a slab for the garage"));
    }
}
