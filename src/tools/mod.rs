//! 工具箱：注册表、调度器与内置数学 / 文件工具

pub mod dispatcher;
pub mod filesystem;
pub mod math;
pub mod registry;

pub use dispatcher::{ArgValue, ToolArgs, ToolDispatcher, ToolOutcome, ToolValue};
pub use filesystem::{EditFileTool, ListFilesTool, ReadFileTool};
pub use math::{AddTool, DivideTool, MultiplyTool, PowerTool, SqrtTool, SubtractTool};
pub use registry::{ParamKind, ParamSpec, Tool, ToolRegistry};

use crate::core::AgentError;

/// 注册全部内置工具（数学 + 文件），供 CLI 与测试共用
pub fn builtin_registry() -> Result<ToolRegistry, AgentError> {
    let mut tools = ToolRegistry::new();
    tools.register(AddTool)?;
    tools.register(SubtractTool)?;
    tools.register(MultiplyTool)?;
    tools.register(DivideTool)?;
    tools.register(SqrtTool)?;
    tools.register(PowerTool)?;
    tools.register(ReadFileTool)?;
    tools.register(ListFilesTool)?;
    tools.register(EditFileTool)?;
    Ok(tools)
}
