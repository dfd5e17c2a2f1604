//! 文件工具
//!
//! read_file / list_files / edit_file 对调用方给出的路径做真实 IO，
//! 不限制路径范围（产品层面的已知决策，见 DESIGN.md）。
//! IO 失败作为领域错误返回，由调度器折叠为错误结果回注给模型。

use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;

use crate::tools::registry::{ParamKind, ParamSpec, Tool};
use crate::tools::{ToolArgs, ToolValue};

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file at the specified path"
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required(
            "path",
            ParamKind::Text,
            "The path to the file to read",
        )]
    }

    async fn call(&self, args: ToolArgs) -> Result<ToolValue, String> {
        let path = args.text("path").ok_or("missing argument: path")?;
        tracing::info!(path = %path, "read_file tool execute");
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(ToolValue::Text(format!(
                "File contents of {path}:\n{content}"
            ))),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(format!("File not found: {path}")),
            Err(e) => Err(format!("Error reading file: {e}")),
        }
    }
}

pub struct ListFilesTool;

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "List all files and directories in the specified path"
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::optional(
            "path",
            ParamKind::Text,
            "The directory path to list (defaults to current directory)",
        )]
    }

    async fn call(&self, args: ToolArgs) -> Result<ToolValue, String> {
        let path = args.text("path").unwrap_or(".");
        tracing::info!(path = %path, "list_files tool execute");
        if !Path::new(path).exists() {
            return Err(format!("Path not found: {path}"));
        }
        let entries = std::fs::read_dir(path).map_err(|e| format!("Error listing files: {e}"))?;
        let mut items = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| format!("Error listing files: {e}"))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                items.push(format!("[DIR]  {name}/"));
            } else {
                items.push(format!("[FILE] {name}"));
            }
        }
        if items.is_empty() {
            return Ok(ToolValue::Text(format!("Empty directory: {path}")));
        }
        items.sort();
        Ok(ToolValue::Text(format!(
            "Contents of {path}:\n{}",
            items.join("\n")
        )))
    }
}

pub struct EditFileTool;

#[async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn description(&self) -> &str {
        "Edit a file by replacing old_text with new_text. Creates the file if it doesn't exist."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("path", ParamKind::Text, "The path to the file to edit"),
            ParamSpec::optional(
                "old_text",
                ParamKind::Text,
                "The text to search for and replace (leave empty to create new file)",
            ),
            ParamSpec::required(
                "new_text",
                ParamKind::Text,
                "The text to replace old_text with",
            ),
        ]
    }

    async fn call(&self, args: ToolArgs) -> Result<ToolValue, String> {
        let path = args.text("path").ok_or("missing argument: path")?;
        let old_text = args.text("old_text").unwrap_or("");
        let new_text = args.text("new_text").ok_or("missing argument: new_text")?;
        tracing::info!(path = %path, "edit_file tool execute");

        if Path::new(path).exists() && !old_text.is_empty() {
            let content =
                std::fs::read_to_string(path).map_err(|e| format!("Error editing file: {e}"))?;
            if !content.contains(old_text) {
                return Err(format!("Text not found in file: {old_text}"));
            }
            let content = content.replace(old_text, new_text);
            std::fs::write(path, content).map_err(|e| format!("Error editing file: {e}"))?;
            Ok(ToolValue::Text(format!("Successfully edited {path}")))
        } else {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| format!("Error editing file: {e}"))?;
                }
            }
            std::fs::write(path, new_text).map_err(|e| format!("Error editing file: {e}"))?;
            Ok(ToolValue::Text(format!("Successfully created {path}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ArgValue;
    use tempfile::TempDir;

    fn text_args(pairs: &[(&str, &str)]) -> ToolArgs {
        let mut args = ToolArgs::default();
        for (name, value) in pairs {
            args.insert(*name, ArgValue::Text(value.to_string()));
        }
        args
    }

    #[tokio::test]
    async fn read_missing_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.txt");
        let err = ReadFileTool
            .call(text_args(&[("path", path.to_str().unwrap())]))
            .await
            .unwrap_err();
        assert!(err.starts_with("File not found:"));
    }

    #[tokio::test]
    async fn read_returns_labeled_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "rebar spacing 12in").unwrap();
        let value = ReadFileTool
            .call(text_args(&[("path", path.to_str().unwrap())]))
            .await
            .unwrap();
        let text = value.to_string();
        assert!(text.starts_with("File contents of"));
        assert!(text.ends_with("rebar spacing 12in"));
    }

    #[tokio::test]
    async fn list_marks_dirs_and_files() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("plans")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        let value = ListFilesTool
            .call(text_args(&[("path", dir.path().to_str().unwrap())]))
            .await
            .unwrap();
        let text = value.to_string();
        assert!(text.contains("[DIR]  plans/"));
        assert!(text.contains("[FILE] a.txt"));
    }

    #[tokio::test]
    async fn list_empty_directory() {
        let dir = TempDir::new().unwrap();
        let value = ListFilesTool
            .call(text_args(&[("path", dir.path().to_str().unwrap())]))
            .await
            .unwrap();
        assert!(value.to_string().starts_with("Empty directory:"));
    }

    #[tokio::test]
    async fn edit_replaces_and_creates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todo.txt");
        let path_str = path.to_str().unwrap();

        // 不存在时创建
        let created = EditFileTool
            .call(text_args(&[("path", path_str), ("new_text", "pour slab")]))
            .await
            .unwrap();
        assert!(created.to_string().starts_with("Successfully created"));

        // 替换已有文本
        let edited = EditFileTool
            .call(text_args(&[
                ("path", path_str),
                ("old_text", "slab"),
                ("new_text", "footing"),
            ]))
            .await
            .unwrap();
        assert!(edited.to_string().starts_with("Successfully edited"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "pour footing");

        // 找不到待替换文本
        let err = EditFileTool
            .call(text_args(&[
                ("path", path_str),
                ("old_text", "missing"),
                ("new_text", "x"),
            ]))
            .await
            .unwrap_err();
        assert!(err.starts_with("Text not found in file:"));
    }
}
