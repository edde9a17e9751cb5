//! The engine facade: document text in, combined output out.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    aggregate::{AggregateOptions, aggregate, order_results},
    config::Config,
    error::{Error, Result},
    extractor::{Extraction, SegmentExtractor},
    recipe::RecipeRegistry,
    runner::ProcessRunner,
    types::{ExecutionResult, RunOutput},
};

/// Runs every fragment of a document through its toolchain.
///
/// Fragments execute on a bounded pool of workers (`max_workers`), but the
/// combined output always follows tag-group order (or document order when
/// configured), never completion order.
///
/// ```no_run
/// # async fn demo() -> m5r_core::Result<()> {
/// let engine = m5r_core::Engine::builtin()?;
/// let output = engine.interpret("<?py print(1+1)?>").await?;
/// assert_eq!(output, "2\n");
/// # Ok(())
/// # }
/// ```
pub struct Engine {
    config: Config,
    extractor: SegmentExtractor,
    registry: RecipeRegistry,
    runner: ProcessRunner,
}

impl Engine {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let registry = RecipeRegistry::from_config(&config)?;
        let runner = ProcessRunner::from_config(&config);
        Ok(Self {
            extractor: SegmentExtractor::new()?,
            registry,
            runner,
            config,
        })
    }

    /// Engine with built-in recipes and default limits.
    pub fn builtin() -> Result<Self> {
        Self::new(Config::default())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &RecipeRegistry {
        &self.registry
    }

    /// Locate fragments without running anything.
    pub fn analyze(&self, document: &str) -> Extraction {
        self.extractor.scan(document)
    }

    /// Run a document and return only the combined output.
    pub async fn interpret(&self, document: &str) -> Result<String> {
        Ok(self.run(document).await?.output)
    }

    pub async fn run(&self, document: &str) -> Result<RunOutput> {
        self.run_with_cancel(document, CancellationToken::new())
            .await
    }

    /// Run a document; cancelling `cancel` kills running fragments and marks
    /// the rest as cancelled.
    ///
    /// Returns `Err` only when a fragment's temporary workspace cannot be
    /// created, or a worker dies. Every other problem stays on the fragment's
    /// result.
    pub async fn run_with_cancel(
        &self,
        document: &str,
        cancel: CancellationToken,
    ) -> Result<RunOutput> {
        let extraction = self.extractor.scan(document);
        for fragment in &extraction.unterminated {
            warn!(
                "Skipping unterminated '{}' fragment at line {}, column {}",
                fragment.tag, fragment.position.line, fragment.position.column
            );
        }

        let segments = extraction.grouped();
        let workers = self.config.max_workers();
        info!(
            "Running {} fragment(s) with up to {} worker(s)",
            segments.len(),
            workers
        );

        let run_token = cancel.child_token();
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();
        let count = segments.len();

        for (index, segment) in segments.into_iter().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::WorkerError(e.to_string()))?;
            let runner = self.runner.clone();
            let recipe = self.registry.recipe_for(segment.tag).clone();
            let token = run_token.clone();

            tasks.spawn(async move {
                let result = runner.run(segment, &recipe, &token).await;
                drop(permit);
                (index, result)
            });
        }

        let mut slots: Vec<Option<ExecutionResult>> = vec![None; count];
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined.map_err(|e| Error::WorkerError(e.to_string()))?;
            match result {
                Ok(result) => slots[index] = Some(result),
                Err(e) => {
                    // kill what is still running; their workspaces drop with them
                    run_token.cancel();
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        let mut results: Vec<ExecutionResult> = slots.into_iter().flatten().collect();
        let options = AggregateOptions::from_config(&self.config);
        order_results(&mut results, options.ordering);
        let output = aggregate(&results, &options);

        debug!(
            "Run finished: {} fragment(s), {} failed",
            results.len(),
            results.iter().filter(|r| !r.succeeded).count()
        );

        Ok(RunOutput {
            output,
            results,
            unterminated: extraction.unterminated,
        })
    }

    /// Synchronous wrapper around [`Engine::run`] for callers without a
    /// runtime.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async context, like any nested Tokio
    /// runtime.
    pub fn run_blocking(&self, document: &str) -> Result<RunOutput> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run(document))
    }
}
