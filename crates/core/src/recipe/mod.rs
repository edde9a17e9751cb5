//! How each tag turns into processes.

mod builtin;
mod registry;

pub use builtin::{STYLING_LABEL, builtin_recipe};
pub use registry::RecipeRegistry;

use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CODE_PLACEHOLDER: &str = "{code}";
pub const SOURCE_PLACEHOLDER: &str = "{source}";
pub const ARTIFACT_PLACEHOLDER: &str = "{artifact}";
pub const DIR_PLACEHOLDER: &str = "{dir}";

/// Build/run strategy for one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Recipe {
    Interpreted(InterpretedRecipe),
    Compiled(CompiledRecipe),
    /// Content is echoed under `label`, never executed
    Inert { label: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretedRecipe {
    pub extension: String,
    pub command: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapper: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledRecipe {
    pub extension: String,
    pub wrapper: String,
    pub compile: Vec<String>,
    pub run: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_extension: Option<String>,
}

impl Recipe {
    pub fn mode_name(&self) -> &'static str {
        match self {
            Recipe::Interpreted(_) => "interpreted",
            Recipe::Compiled(_) => "compiled",
            Recipe::Inert { .. } => "inert",
        }
    }

    /// Programs this recipe launches, in invocation order.
    pub fn programs(&self) -> Vec<&str> {
        match self {
            Recipe::Interpreted(recipe) => recipe.command.first().map(String::as_str).into_iter().collect(),
            Recipe::Compiled(recipe) => [recipe.compile.first(), recipe.run.first()]
                .into_iter()
                .flatten()
                .map(String::as_str)
                .collect(),
            Recipe::Inert { .. } => Vec::new(),
        }
    }
}

impl InterpretedRecipe {
    /// Program text written to the temporary source file.
    pub fn source_text(&self, code: &str) -> String {
        match &self.wrapper {
            Some(wrapper) => wrap(wrapper, code),
            None => code.to_string(),
        }
    }
}

impl CompiledRecipe {
    pub fn source_text(&self, code: &str) -> String {
        wrap(&self.wrapper, code)
    }
}

/// Embed `code` into a program skeleton at every `{code}` placeholder.
pub fn wrap(template: &str, code: &str) -> String {
    template.replace(CODE_PLACEHOLDER, code)
}

/// Substitute `{source}`, `{artifact}` and `{dir}` in an argument vector.
pub fn render_command(
    argv: &[String],
    source: &Path,
    artifact: Option<&Path>,
    dir: &Path,
) -> Vec<String> {
    let source = source.to_string_lossy();
    let artifact = artifact.map(|path| path.to_string_lossy());
    let dir = dir.to_string_lossy();

    argv.iter()
        .map(|arg| {
            let mut arg = arg.replace(SOURCE_PLACEHOLDER, &source);
            if let Some(artifact) = &artifact {
                arg = arg.replace(ARTIFACT_PLACEHOLDER, artifact);
            }
            arg.replace(DIR_PLACEHOLDER, &dir)
        })
        .collect()
}
