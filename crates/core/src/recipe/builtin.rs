use crate::types::Tag;

use super::{CompiledRecipe, InterpretedRecipe, Recipe};

pub const STYLING_LABEL: &str = "[Styling Loaded]";

const PHP_WRAPPER: &str = "<?php\n{code}\n?>";
const CSHARP_WRAPPER: &str = "using System; class Program { static void Main() { {code} } }";
const CPP_WRAPPER: &str = "#include <iostream>\nusing namespace std;\nint main() { {code} return 0; }";

fn argv(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}

/// The recipe a tag uses when nothing is configured.
pub fn builtin_recipe(tag: Tag) -> Recipe {
    match tag {
        Tag::Python => Recipe::Interpreted(InterpretedRecipe {
            extension: "py".to_string(),
            command: argv(&["python3", "{source}"]),
            wrapper: None,
        }),
        Tag::JavaScript => Recipe::Interpreted(InterpretedRecipe {
            extension: "js".to_string(),
            command: argv(&["node", "{source}"]),
            wrapper: None,
        }),
        Tag::Php => Recipe::Interpreted(InterpretedRecipe {
            extension: "php".to_string(),
            command: argv(&["php", "{source}"]),
            wrapper: Some(PHP_WRAPPER.to_string()),
        }),
        Tag::Css => Recipe::Inert {
            label: STYLING_LABEL.to_string(),
        },
        Tag::CSharp => Recipe::Compiled(CompiledRecipe {
            extension: "cs".to_string(),
            wrapper: CSHARP_WRAPPER.to_string(),
            compile: argv(&["csc", "/nologo", "/out:{artifact}", "{source}"]),
            run: argv(&["{artifact}"]),
            artifact_extension: Some("exe".to_string()),
        }),
        Tag::Cpp => Recipe::Compiled(CompiledRecipe {
            extension: "cpp".to_string(),
            wrapper: CPP_WRAPPER.to_string(),
            compile: argv(&["g++", "{source}", "-o", "{artifact}"]),
            run: argv(&["{artifact}"]),
            artifact_extension: None,
        }),
    }
}
