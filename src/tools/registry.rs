//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / params / call），由 ToolRegistry
//! 按注册顺序保存并按名查找；重名注册在启动期即报错。specs() 生成发送给
//! 后端的工具 schema，顺序与注册顺序一致（单轮内稳定，便于缓存与测试）。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::core::AgentError;
use crate::llm::ToolSchema;
use crate::tools::dispatcher::{ToolArgs, ToolValue};

/// 参数原语类型
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Number,
    Text,
    Bool,
}

impl ParamKind {
    /// JSON Schema 中的类型名
    pub fn schema_type(self) -> &'static str {
        match self {
            ParamKind::Number => "number",
            ParamKind::Text => "string",
            ParamKind::Bool => "boolean",
        }
    }
}

/// 单个参数声明
#[derive(Clone, Debug)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: true,
        }
    }

    pub fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: false,
        }
    }
}

/// 工具 trait：名称、描述（供 LLM 理解）、参数声明、异步执行。
/// call 收到的 args 已由调度器按 params 声明校验并强转。
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn params(&self) -> Vec<ParamSpec>;

    async fn call(&self, args: ToolArgs) -> Result<ToolValue, String>;
}

/// 工具注册表：按注册顺序保存 Arc<dyn Tool>，name 索引查找
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个工具；重名返回 DuplicateTool
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), AgentError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(AgentError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(Arc::new(tool));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| self.tools[i].clone())
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// 发送给后端的工具 schema 列表（注册顺序）
    pub fn specs(&self) -> Vec<ToolSchema> {
        self.tools
            .iter()
            .map(|tool| {
                let mut properties = serde_json::Map::new();
                let mut required: Vec<&str> = Vec::new();
                for p in tool.params() {
                    properties.insert(
                        p.name.to_string(),
                        json!({
                            "type": p.kind.schema_type(),
                            "description": p.description,
                        }),
                    );
                    if p.required {
                        required.push(p.name);
                    }
                }
                ToolSchema {
                    name: tool.name().to_string(),
                    description: tool.description().to_string(),
                    parameters: json!({
                        "type": "object",
                        "properties": properties,
                        "required": required,
                    }),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    #[async_trait]
    impl Tool for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "test tool"
        }

        fn params(&self) -> Vec<ParamSpec> {
            vec![]
        }

        async fn call(&self, _args: ToolArgs) -> Result<ToolValue, String> {
            Ok(ToolValue::Text("ok".to_string()))
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(Named("alpha")).unwrap();
        let err = registry.register(Named("alpha")).unwrap_err();
        assert!(matches!(err, AgentError::DuplicateTool(name) if name == "alpha"));
    }

    #[test]
    fn specs_follow_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Named("zeta")).unwrap();
        registry.register(Named("alpha")).unwrap();
        registry.register(Named("mid")).unwrap();
        let names: Vec<String> = registry.specs().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }
}
