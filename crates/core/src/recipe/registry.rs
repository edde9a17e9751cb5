use std::collections::HashMap;

use tracing::debug;

use crate::{
    config::{Config, ToolchainOverride},
    error::{Error, Result},
    types::Tag,
};

use super::{Recipe, builtin::builtin_recipe};

/// Tag → recipe table, fixed for the lifetime of an engine.
#[derive(Debug, Clone)]
pub struct RecipeRegistry {
    recipes: HashMap<Tag, Recipe>,
}

impl RecipeRegistry {
    pub fn builtin() -> Self {
        let recipes = Tag::ALL
            .into_iter()
            .map(|tag| (tag, builtin_recipe(tag)))
            .collect();
        Self { recipes }
    }

    /// Built-in recipes with the config's toolchain overrides applied.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::builtin();
        for (tag, toolchain) in &config.toolchains {
            registry.apply_override(*tag, toolchain)?;
        }
        Ok(registry)
    }

    pub fn recipe_for(&self, tag: Tag) -> &Recipe {
        // every tag is inserted by `builtin`
        &self.recipes[&tag]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tag, &Recipe)> {
        Tag::ALL.into_iter().map(|tag| (tag, self.recipe_for(tag)))
    }

    fn apply_override(&mut self, tag: Tag, toolchain: &ToolchainOverride) -> Result<()> {
        debug!("Applying toolchain override for '{}'", tag);
        let Some(recipe) = self.recipes.get_mut(&tag) else {
            return Err(Error::ConfigError(format!("no recipe for tag '{tag}'")));
        };

        let misplaced = |field: &str| {
            Error::ConfigError(format!(
                "toolchains.{tag}.{field} does not apply to {} recipes",
                recipe_mode(tag)
            ))
        };

        match recipe {
            Recipe::Interpreted(interpreted) => {
                if toolchain.compile.is_some() {
                    return Err(misplaced("compile"));
                }
                if toolchain.run.is_some() {
                    return Err(misplaced("run"));
                }
                if toolchain.label.is_some() {
                    return Err(misplaced("label"));
                }
                if let Some(command) = &toolchain.command {
                    interpreted.command = command.clone();
                }
                if let Some(extension) = &toolchain.extension {
                    interpreted.extension = extension.clone();
                }
                if let Some(wrapper) = &toolchain.wrapper {
                    interpreted.wrapper = Some(wrapper.clone());
                }
            }
            Recipe::Compiled(compiled) => {
                if toolchain.command.is_some() {
                    return Err(misplaced("command"));
                }
                if toolchain.label.is_some() {
                    return Err(misplaced("label"));
                }
                if let Some(compile) = &toolchain.compile {
                    compiled.compile = compile.clone();
                }
                if let Some(run) = &toolchain.run {
                    compiled.run = run.clone();
                }
                if let Some(extension) = &toolchain.extension {
                    compiled.extension = extension.clone();
                }
                if let Some(wrapper) = &toolchain.wrapper {
                    compiled.wrapper = wrapper.clone();
                }
                if let Some(artifact_extension) = &toolchain.artifact_extension {
                    compiled.artifact_extension = Some(artifact_extension.clone());
                }
            }
            Recipe::Inert { label } => {
                if let Some(field) = [
                    ("command", toolchain.command.is_some()),
                    ("compile", toolchain.compile.is_some()),
                    ("run", toolchain.run.is_some()),
                    ("wrapper", toolchain.wrapper.is_some()),
                ]
                .into_iter()
                .find_map(|(field, set)| set.then_some(field))
                {
                    return Err(misplaced(field));
                }
                if let Some(new_label) = &toolchain.label {
                    *label = new_label.clone();
                }
            }
        }
        Ok(())
    }
}

impl Default for RecipeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn recipe_mode(tag: Tag) -> &'static str {
    builtin_recipe(tag).mode_name()
}
