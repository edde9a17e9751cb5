use serde::{Deserialize, Serialize};

/// Per-tag replacement for parts of a built-in recipe.
///
/// Only the fields that are set replace the built-in values. Command vectors
/// may use the `{source}`, `{artifact}` and `{dir}` placeholders; wrappers use
/// `{code}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ToolchainOverride {
    /// Interpreter invocation for interpreted tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    /// Compiler invocation for compiled tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile: Option<Vec<String>>,
    /// Invocation of the build artifact for compiled tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapper: Option<String>,
    /// Label printed above inert content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ToolchainOverride {
    pub fn interpreter<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: Some(command.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn compiler<I, J, S, T>(compile: I, run: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            compile: Some(compile.into_iter().map(Into::into).collect()),
            run: Some(run.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn with_wrapper(mut self, wrapper: impl Into<String>) -> Self {
        self.wrapper = Some(wrapper.into());
        self
    }
}
