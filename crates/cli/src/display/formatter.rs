use m5r_core::{Extraction, Recipe, RecipeRegistry, RunOutput};
use std::path::Path;

use crate::utils::path::find_program;

const PREVIEW_WIDTH: usize = 60;

/// First line of a fragment, shortened for listing.
pub fn preview(code: &str) -> String {
    let first_line = code.lines().next().unwrap_or("");
    let more_lines = code.lines().nth(1).is_some();
    let mut preview: String = first_line.chars().take(PREVIEW_WIDTH).collect();
    if more_lines || first_line.chars().count() > PREVIEW_WIDTH {
        preview.push_str(" …");
    }
    preview
}

pub fn print_extraction(path: &Path, extraction: &Extraction, registry: &RecipeRegistry) {
    println!("🔍 Analyzing: {}", path.display());
    println!("{}", "=".repeat(80));

    if extraction.segments.is_empty() {
        println!("\nNo fragments found");
    }

    for (index, segment) in extraction.grouped().iter().enumerate() {
        let recipe = registry.recipe_for(segment.tag);
        println!(
            "\n{}. <?{}  line {}, column {}  ({})",
            index + 1,
            segment.tag,
            segment.position.line,
            segment.position.column,
            recipe.mode_name()
        );
        println!("   {}", preview(&segment.code));
    }

    for fragment in &extraction.unterminated {
        println!(
            "\n⚠️  Unterminated <?{} at line {}, column {} (skipped)",
            fragment.tag, fragment.position.line, fragment.position.column
        );
    }
}

pub fn print_toolchains(registry: &RecipeRegistry) {
    println!("{:<6} {:<12} TOOLCHAIN", "TAG", "MODE");
    for (tag, recipe) in registry.iter() {
        let status = match recipe {
            Recipe::Inert { label } => format!("echoed under {label}"),
            _ => recipe
                .programs()
                .into_iter()
                .filter(|program| !program.contains("{artifact}"))
                .map(|program| match find_program(program) {
                    Some(found) => format!("✅ {program} ({})", found.display()),
                    None => format!("❌ {program} (not found)"),
                })
                .collect::<Vec<_>>()
                .join(", "),
        };
        println!("{:<6} {:<12} {}", tag.marker(), recipe.mode_name(), status);
    }
}

/// Report failed fragments on stderr so stdout keeps only program output.
pub fn print_failure_summary(run: &RunOutput) {
    for result in run.failures() {
        if let Some(failure) = &result.failure {
            eprintln!("⚠️  {}: {}", result.segment.label(), failure);
            let diagnostics = result.stderr.trim();
            if !diagnostics.is_empty() {
                for line in diagnostics.lines() {
                    eprintln!("   {line}");
                }
            }
        }
    }
    for fragment in &run.unterminated {
        eprintln!(
            "⚠️  Unterminated <?{} at line {} was skipped",
            fragment.tag, fragment.position.line
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_single_line() {
        assert_eq!(preview("print(1)"), "print(1)");
    }

    #[test]
    fn test_preview_marks_truncation() {
        assert_eq!(preview("a = 1\nprint(a)"), "a = 1 …");
        let long = "x".repeat(100);
        assert_eq!(preview(&long).chars().count(), PREVIEW_WIDTH + 2);
    }
}
