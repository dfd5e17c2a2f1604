//! 数学工具
//!
//! 六个算术原语（add / subtract / multiply / divide / sqrt / power），
//! 供施工项目估算类对话使用。除零与负数开方返回领域错误而非 panic，
//! 由调度器转为错误结果回注给模型。

use async_trait::async_trait;

use crate::tools::registry::{ParamKind, ParamSpec, Tool};
use crate::tools::{ToolArgs, ToolValue};

fn two_number_params(first: &'static str, second: &'static str) -> Vec<ParamSpec> {
    vec![
        ParamSpec::required("a", ParamKind::Number, first),
        ParamSpec::required("b", ParamKind::Number, second),
    ]
}

pub struct AddTool;

#[async_trait]
impl Tool for AddTool {
    fn name(&self) -> &str {
        "add"
    }

    fn description(&self) -> &str {
        "Add two numbers."
    }

    fn params(&self) -> Vec<ParamSpec> {
        two_number_params("First number", "Second number")
    }

    async fn call(&self, args: ToolArgs) -> Result<ToolValue, String> {
        let a = args.number("a").ok_or("missing argument: a")?;
        let b = args.number("b").ok_or("missing argument: b")?;
        Ok(ToolValue::Number(a + b))
    }
}

pub struct SubtractTool;

#[async_trait]
impl Tool for SubtractTool {
    fn name(&self) -> &str {
        "subtract"
    }

    fn description(&self) -> &str {
        "Subtract second number from first number."
    }

    fn params(&self) -> Vec<ParamSpec> {
        two_number_params("First number", "Second number")
    }

    async fn call(&self, args: ToolArgs) -> Result<ToolValue, String> {
        let a = args.number("a").ok_or("missing argument: a")?;
        let b = args.number("b").ok_or("missing argument: b")?;
        Ok(ToolValue::Number(a - b))
    }
}

pub struct MultiplyTool;

#[async_trait]
impl Tool for MultiplyTool {
    fn name(&self) -> &str {
        "multiply"
    }

    fn description(&self) -> &str {
        "Multiply two numbers."
    }

    fn params(&self) -> Vec<ParamSpec> {
        two_number_params("First number", "Second number")
    }

    async fn call(&self, args: ToolArgs) -> Result<ToolValue, String> {
        let a = args.number("a").ok_or("missing argument: a")?;
        let b = args.number("b").ok_or("missing argument: b")?;
        Ok(ToolValue::Number(a * b))
    }
}

pub struct DivideTool;

#[async_trait]
impl Tool for DivideTool {
    fn name(&self) -> &str {
        "divide"
    }

    fn description(&self) -> &str {
        "Divide first number by second number."
    }

    fn params(&self) -> Vec<ParamSpec> {
        two_number_params("Numerator", "Denominator")
    }

    async fn call(&self, args: ToolArgs) -> Result<ToolValue, String> {
        let a = args.number("a").ok_or("missing argument: a")?;
        let b = args.number("b").ok_or("missing argument: b")?;
        if b == 0.0 {
            return Err("division by zero".to_string());
        }
        Ok(ToolValue::Number(a / b))
    }
}

pub struct SqrtTool;

#[async_trait]
impl Tool for SqrtTool {
    fn name(&self) -> &str {
        "sqrt"
    }

    fn description(&self) -> &str {
        "Calculate the square root of a number."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required(
            "x",
            ParamKind::Number,
            "Number to take square root of",
        )]
    }

    async fn call(&self, args: ToolArgs) -> Result<ToolValue, String> {
        let x = args.number("x").ok_or("missing argument: x")?;
        if x < 0.0 {
            return Err("cannot take square root of a negative number".to_string());
        }
        Ok(ToolValue::Number(x.sqrt()))
    }
}

pub struct PowerTool;

#[async_trait]
impl Tool for PowerTool {
    fn name(&self) -> &str {
        "power"
    }

    fn description(&self) -> &str {
        "Raise a number to a power."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("base", ParamKind::Number, "Base number"),
            ParamSpec::required("exponent", ParamKind::Number, "Exponent"),
        ]
    }

    async fn call(&self, args: ToolArgs) -> Result<ToolValue, String> {
        let base = args.number("base").ok_or("missing argument: base")?;
        let exponent = args.number("exponent").ok_or("missing argument: exponent")?;
        Ok(ToolValue::Number(base.powf(exponent)))
    }
}
