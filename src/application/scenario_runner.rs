//! Scenario sweeps over independent model instances
//!
//! Each scenario gets a freshly built [`Model`] from the factory, so no
//! scenario can observe another's lever edits. Results come back in input
//! order. The first failing scenario aborts the sweep with its parameters
//! attached.

use std::fmt::Debug;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::domain::projection::Model;
use crate::infrastructure::log_messages::scenarios as log;
use crate::{Error, Result};

/// One evaluated scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome<P, T> {
    pub input: P,
    pub output: T,
}

type ChunkResult<T> = std::result::Result<Vec<T>, (usize, Error)>;

/// Runs scenarios against models produced by `factory`
pub struct ScenarioRunner<F> {
    factory: F,
}

impl<F> ScenarioRunner<F>
where
    F: Fn() -> Result<Model>,
{
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    fn evaluate<P, T, M, Q>(&self, input: &P, mutate: &M, query: &Q) -> Result<T>
    where
        M: Fn(&mut Model, &P) -> Result<()>,
        Q: Fn(&Model) -> Result<T>,
    {
        let mut model = (self.factory)()?;
        mutate(&mut model, input)?;
        query(&model)
    }

    /// Evaluate every scenario in order on the calling thread
    #[instrument(skip_all, fields(scenarios = scenarios.len()))]
    pub fn run<P, T, M, Q>(
        &self,
        scenarios: Vec<P>,
        mutate: M,
        query: Q,
    ) -> Result<Vec<ScenarioOutcome<P, T>>>
    where
        P: Debug,
        M: Fn(&mut Model, &P) -> Result<()>,
        Q: Fn(&Model) -> Result<T>,
    {
        let mut outcomes = Vec::with_capacity(scenarios.len());
        for (index, input) in scenarios.into_iter().enumerate() {
            let output = self
                .evaluate(&input, &mutate, &query)
                .map_err(|err| Error::scenario_failed(index, format!("{input:?}"), err))?;
            debug!(index, ?input, "{}", log::SCENARIO_EVALUATED);
            outcomes.push(ScenarioOutcome { input, output });
        }
        info!(scenarios = outcomes.len(), "{}", log::SWEEP_COMPLETED);
        Ok(outcomes)
    }

    /// Evaluate scenarios on up to `workers` scoped threads.
    ///
    /// The scenario list is split into contiguous chunks, one per worker, and
    /// every worker builds its own models. On failure the error of the
    /// lowest-indexed failing scenario is returned.
    #[instrument(skip_all, fields(scenarios = scenarios.len(), workers = workers.get()))]
    pub fn run_parallel<P, T, M, Q>(
        &self,
        scenarios: Vec<P>,
        mutate: M,
        query: Q,
        workers: NonZeroUsize,
    ) -> Result<Vec<ScenarioOutcome<P, T>>>
    where
        F: Sync,
        P: Debug + Sync,
        T: Send,
        M: Fn(&mut Model, &P) -> Result<()> + Sync,
        Q: Fn(&Model) -> Result<T> + Sync,
    {
        let chunk_size = scenarios.len().div_ceil(workers.get()).max(1);
        let mutate = &mutate;
        let query = &query;

        let chunks = crossbeam::thread::scope(|scope| {
            let handles: Vec<_> = scenarios
                .chunks(chunk_size)
                .enumerate()
                .map(|(chunk_index, chunk)| {
                    let offset = chunk_index * chunk_size;
                    scope.spawn(move |_| -> ChunkResult<T> {
                        chunk
                            .iter()
                            .enumerate()
                            .map(|(position, input)| {
                                self.evaluate(input, mutate, query)
                                    .map_err(|err| (offset + position, err))
                            })
                            .collect()
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join())
                .collect::<std::thread::Result<Vec<ChunkResult<T>>>>()
        })
        .map_err(|_| Error::WorkerPanicked)?
        .map_err(|_| Error::WorkerPanicked)?;

        let mut outputs = Vec::with_capacity(scenarios.len());
        for chunk in chunks {
            match chunk {
                Ok(values) => outputs.extend(values),
                Err((index, err)) => {
                    let parameters = format!("{:?}", scenarios[index]);
                    return Err(Error::scenario_failed(index, parameters, err));
                }
            }
        }

        let outcomes: Vec<_> = scenarios
            .into_iter()
            .zip(outputs)
            .map(|(input, output)| ScenarioOutcome { input, output })
            .collect();
        info!(scenarios = outcomes.len(), "{}", log::SWEEP_COMPLETED);
        Ok(outcomes)
    }
}
