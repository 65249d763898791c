//! Fork-join execution of the bulk operations of materialized graphs.

use std::sync::{Arc, PoisonError, RwLock};

use rayon::prelude::*;

use crate::{config::Config, errors::Result};

struct Executor {
    config: Config,
    pool: Option<Arc<rayon::ThreadPool>>,
}

lazy_static! {
    static ref EXECUTOR: RwLock<Executor> = RwLock::new(Executor {
        config: Config::default(),
        pool: None,
    });
}

/// Install the given configuration for all following bulk operations.
///
/// If the configuration asks for a dedicated number of worker threads, a new
/// pool is created and replaces any pool created by an earlier call.
pub fn configure(config: Config) -> Result<()> {
    config.validate()?;
    let pool = if let Some(threads) = config.worker_threads {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|idx| format!("pgraph-worker-{}", idx))
            .build()?;
        Some(Arc::new(pool))
    } else {
        None
    };
    debug!(
        "configuring bulk executor with parallel threshold {} and {} worker threads",
        config.parallel_threshold,
        config
            .worker_threads
            .map(|t| t.to_string())
            .unwrap_or_else(|| "global".to_string())
    );
    let mut executor = EXECUTOR.write()?;
    executor.config = config;
    executor.pool = pool;
    Ok(())
}

/// The currently installed configuration.
pub fn current_config() -> Config {
    let executor = EXECUTOR.read().unwrap_or_else(PoisonError::into_inner);
    executor.config.clone()
}

/// Fold all `items` into one accumulator.
///
/// Inputs above the configured threshold are split into partitions that are
/// folded in parallel, starting from `identity()` each with `fold_op`, and merged with
/// `combine`. `combine` must be associative. Which partition wins for a key
/// that was written by more than one partition is up to `combine` and not a
/// guarantee callers can rely on.
///
/// A panic in `fold_op` or `combine` is propagated to the caller.
pub(crate) fn fold<T, A, ID, F, C>(items: Vec<T>, identity: ID, fold_op: F, combine: C) -> A
where
    T: Send,
    A: Send,
    ID: Fn() -> A + Send + Sync,
    F: Fn(A, T) -> A + Send + Sync,
    C: Fn(A, A) -> A + Send + Sync,
{
    let (threshold, pool) = {
        // The executor is only replaced as a whole, a poisoned lock still
        // holds a complete value.
        let executor = EXECUTOR.read().unwrap_or_else(PoisonError::into_inner);
        (executor.config.parallel_threshold, executor.pool.clone())
    };

    if items.len() < threshold {
        return items.into_iter().fold(identity(), fold_op);
    }

    trace!("folding {} items in parallel", items.len());
    let run = move || {
        items
            .into_par_iter()
            .fold(&identity, &fold_op)
            .reduce(&identity, &combine)
    };
    match pool {
        Some(pool) => pool.install(run),
        None => run(),
    }
}

#[cfg(test)]
mod tests;
