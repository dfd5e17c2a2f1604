//! 工具调度器
//!
//! execute(name, raw_args) 查注册表、按声明校验并强转参数、在超时内调用工具，
//! 把一切失败（未知工具、参数错误、工具执行失败、超时）统一折叠为
//! ToolOutcome::Error 回注给模型——工具失败是对话数据，绝不让本轮崩溃。
//! 每次调用输出一条结构化审计日志（JSON）。

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::time::timeout;

use crate::llm::ToolSchema;
use crate::tools::registry::{ParamKind, ParamSpec, ToolRegistry};

/// 强转后的参数值
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

/// 校验并强转后的参数映射，工具体按名取值
#[derive(Clone, Debug, Default)]
pub struct ToolArgs {
    values: HashMap<String, ArgValue>,
}

impl ToolArgs {
    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.insert(name.into(), value);
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(ArgValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(ArgValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }
}

/// 工具返回的原语值；Display 决定回注给模型的文本（数字用 Rust 默认浮点格式）
#[derive(Clone, Debug, PartialEq)]
pub enum ToolValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl fmt::Display for ToolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolValue::Number(n) => write!(f, "{n}"),
            ToolValue::Text(s) => f.write_str(s),
            ToolValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// 一次工具调用的结果：成功文本或错误文本，二者都会成为一条 tool 消息
#[derive(Clone, Debug, PartialEq)]
pub enum ToolOutcome {
    Ok(String),
    Error(String),
}

impl ToolOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutcome::Error(_))
    }

    /// 回注 transcript 的消息文本
    pub fn into_text(self) -> String {
        match self {
            ToolOutcome::Ok(s) => s,
            ToolOutcome::Error(e) => e,
        }
    }
}

/// 工具调度器：持有注册表与单次调用超时
pub struct ToolDispatcher {
    registry: ToolRegistry,
    timeout: Duration,
}

impl ToolDispatcher {
    pub fn new(registry: ToolRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 当前工具 schema 集合（注册顺序，单轮内稳定）
    pub fn specs(&self) -> Vec<ToolSchema> {
        self.registry.specs()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.registry.tool_names()
    }

    /// 执行指定工具；永不返回 Err，所有失败折叠为 ToolOutcome::Error
    pub async fn execute(&self, name: &str, raw_args: Value) -> ToolOutcome {
        let start = Instant::now();
        let preview = args_preview(&raw_args);
        let outcome = self.execute_inner(name, raw_args).await;

        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": name,
            "ok": !outcome.is_error(),
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": preview,
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        outcome
    }

    async fn execute_inner(&self, name: &str, raw_args: Value) -> ToolOutcome {
        let Some(tool) = self.registry.get(name) else {
            return ToolOutcome::Error(format!("unknown tool: {name}"));
        };
        let args = match coerce_args(&tool.params(), raw_args) {
            Ok(args) => args,
            Err(message) => return ToolOutcome::Error(message),
        };
        match timeout(self.timeout, tool.call(args)).await {
            Ok(Ok(value)) => ToolOutcome::Ok(value.to_string()),
            Ok(Err(e)) => ToolOutcome::Error(e),
            Err(_) => ToolOutcome::Error(format!("tool timed out: {name}")),
        }
    }
}

/// 按声明校验并强转原始参数；键序无关
fn coerce_args(params: &[ParamSpec], raw: Value) -> Result<ToolArgs, String> {
    let map = match raw {
        Value::Null => serde_json::Map::new(),
        Value::Object(map) => map,
        _ => return Err("malformed tool arguments".to_string()),
    };
    for key in map.keys() {
        if !params.iter().any(|p| p.name == key) {
            return Err(format!("unexpected argument: {key}"));
        }
    }
    let mut args = ToolArgs::default();
    for spec in params {
        match map.get(spec.name) {
            Some(value) => {
                let coerced = coerce_value(spec.kind, value)
                    .ok_or_else(|| format!("invalid value for {}", spec.name))?;
                args.insert(spec.name, coerced);
            }
            None if spec.required => return Err(format!("missing argument: {}", spec.name)),
            None => {}
        }
    }
    Ok(args)
}

fn coerce_value(kind: ParamKind, value: &Value) -> Option<ArgValue> {
    match kind {
        ParamKind::Number => match value {
            Value::Number(n) => n.as_f64().map(ArgValue::Number),
            Value::String(s) => s.trim().parse::<f64>().ok().map(ArgValue::Number),
            _ => None,
        },
        ParamKind::Text => match value {
            Value::String(s) => Some(ArgValue::Text(s.clone())),
            _ => None,
        },
        ParamKind::Bool => match value {
            Value::Bool(b) => Some(ArgValue::Bool(*b)),
            Value::String(s) => match s.as_str() {
                "true" => Some(ArgValue::Bool(true)),
                "false" => Some(ArgValue::Bool(false)),
                _ => None,
            },
            _ => None,
        },
    }
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.len() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
