//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `FOREMAN__*` 覆盖
//! （双下划线表示嵌套，如 `FOREMAN__LLM__MODEL=qwen3:8b`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 默认 system prompt（终端环境助理，纯文本输出）
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful coding assistant operating in a \
terminal environment. Output only plain text without markdown formatting, as your responses \
appear directly in the terminal. Be concise but thorough, providing clear and practical advice \
with a friendly tone. Don't use any asterisk characters in your responses.";

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSection,
    pub agent: AgentSection,
    pub history: HistorySection,
    pub tools: ToolsSection,
}

/// [llm] 段：本地推理服务地址与模型
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub base_url: String,
    pub model: String,
    /// 本地后端通常不校验；未设置时回退 OPENAI_API_KEY 或占位符
    pub api_key: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "qwen3:4b".to_string(),
            api_key: None,
        }
    }
}

/// [agent] 段：system prompt 与工具循环轮数上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    pub system_prompt: Option<String>,
    pub max_tool_rounds: usize,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            system_prompt: None,
            max_tool_rounds: 8,
        }
    }
}

impl AgentSection {
    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

/// [history] 段：持久化数据库路径
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistorySection {
    pub db_path: PathBuf,
}

impl Default for HistorySection {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("chat_history.sqlite"),
        }
    }
}

/// [tools] 段：单次工具调用超时（秒）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    pub timeout_secs: u64,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// 从 config 目录加载配置，环境变量 FOREMAN__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 FOREMAN__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("FOREMAN")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
