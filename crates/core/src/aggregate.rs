//! Output Aggregator: folds per-fragment results into the combined output.

use crate::{
    config::{Config, OutputOrdering},
    types::ExecutionResult,
};

pub const FAILURE_MARKER_PREFIX: &str = "[m5r]";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    pub annotate_failures: bool,
    pub ordering: OutputOrdering,
}

impl AggregateOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            annotate_failures: config.annotate_failures,
            ordering: config.ordering,
        }
    }
}

/// Put results into output order.
///
/// `results` arrive in tag-group order; [`OutputOrdering::Document`] re-sorts
/// them by fragment ordinal.
pub fn order_results(results: &mut [ExecutionResult], ordering: OutputOrdering) {
    match ordering {
        OutputOrdering::TagGroup => {
            results.sort_by_key(|r| (r.segment.tag.group_index(), r.segment.ordinal))
        }
        OutputOrdering::Document => results.sort_by_key(|r| r.segment.ordinal),
    }
}

/// Concatenate captured stdout in the order given, adding nothing between
/// fragments. With `annotate_failures`, each failed fragment is preceded by
/// a marker line naming its tag and failure kind.
pub fn aggregate(results: &[ExecutionResult], options: &AggregateOptions) -> String {
    let mut output = String::new();
    for result in results {
        if options.annotate_failures {
            if let Some(failure) = &result.failure {
                output.push_str(&format!(
                    "{FAILURE_MARKER_PREFIX} {} fragment #{} failed: {}\n",
                    result.segment.tag, result.segment.ordinal, failure
                ));
            }
        }
        output.push_str(&result.stdout);
    }
    output
}
