use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;

use crate::bank::{FissionBank, Site, SourceBank};
use crate::config::{FailurePolicy, ProblemType, RunSettings};
use crate::driver::{CycleResult, RunningStatistics};
use crate::error::{HistoryFailure, TransportError, TransportResult};
use crate::geometry::Geometry;
use crate::nuclear_data::NuclearDataStore;
use crate::random::{HistoryRng, RngStream};
use crate::tally::{HistoryTally, Tally};
use crate::transport::Tracker;

// Shared flag asking a running simulation to stop at the next cycle barrier
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// Called at every cycle barrier, e.g. by a reporting layer
pub trait CycleObserver: Send + Sync {
    fn on_cycle(&self, result: &CycleResult);
}

impl<F> CycleObserver for F
where
    F: Fn(&CycleResult) + Send + Sync,
{
    fn on_cycle(&self, result: &CycleResult) {
        self(result)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub cycles: Vec<CycleResult>,
    pub k_mean: Option<f64>,
    // Spread of the active cycle values
    pub k_std: Option<f64>,
    // Uncertainty of `k_mean`
    pub k_std_of_mean: Option<f64>,
    // Entropy of the last cycle's fission source
    pub entropy: Option<f64>,
    // Active cycles only for eigenvalue runs
    pub tally: Tally,
    pub failed_histories: usize,
    pub aborted: bool,
}

// Outcome of running one bank of histories
struct Batch {
    tally: Tally,
    failed: usize,
}

//=====================================================================
// Drives a run: criticality cycles or a single fixed source batch.
//
// Histories of a batch run in parallel against the shared geometry and
// nuclear data. Each history draws from its own stream keyed by its
// global index, fission sites go into a concurrent bank keyed by that
// index, and tallies are folded in index order. Results do not depend
// on the number of threads.
//=====================================================================
pub struct Simulation {
    geometry: Arc<Geometry>,
    data: Arc<NuclearDataStore>,
    settings: RunSettings,
    observers: Vec<Box<dyn CycleObserver>>,
    cancel: CancelToken,
}

impl Simulation {
    pub fn new(geometry: Arc<Geometry>, data: Arc<NuclearDataStore>, settings: RunSettings) -> TransportResult<Self> {
        settings.validate(&geometry, &data)?;
        Ok(Self { geometry, data, settings, observers: Vec::new(), cancel: CancelToken::new() })
    }

    pub fn with_observer<O: CycleObserver + 'static>(mut self, observer: O) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn run(&self) -> TransportResult<RunResult> {
        match self.settings.threads {
            Some(threads) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|err| TransportError::ThreadPool(err.to_string()))?;
                pool.install(|| self.run_problem())
            }
            None => self.run_problem(),
        }
    }

    fn run_problem(&self) -> TransportResult<RunResult> {
        match self.settings.problem {
            ProblemType::Eigenvalue => self.run_eigenvalue(),
            ProblemType::FixedSource => self.run_fixed_source(),
        }
    }

    pub fn run_eigenvalue(&self) -> TransportResult<RunResult> {
        let settings = &self.settings;
        let tracker = Tracker::new(&self.geometry, &self.data, settings.tracking());
        let n_particles = settings.particles;
        info!(
            "Starting eigenvalue run: {} particles, {} cycles ({} inactive), seed {}",
            n_particles, settings.cycles, settings.inactive, settings.seed
        );

        let mut source = settings.source.sample_bank(&self.geometry, self.data.energy_range(), n_particles, settings.seed)?;
        let mut statistics = RunningStatistics::default();
        let mut run_tally = Tally::new(self.geometry.cells().len());
        let mut cycles = Vec::with_capacity(settings.cycles);
        let mut failed_histories = 0;
        let mut aborted = false;

        for cycle in 0..settings.cycles {
            if self.cancel.is_cancelled() {
                info!("Run cancelled before cycle {}", cycle);
                aborted = true;
                break;
            }
            let start = Instant::now();
            let active = cycle >= settings.inactive;

            let mut fission_bank = FissionBank::new();
            let batch = self.run_batch(&tracker, &source, (cycle * n_particles) as u64, Some(&fission_bank))?;
            let sites = fission_bank.drain_ordered();

            let source_weight = batch.tally.balance.source;
            let site_weight: f64 = sites.iter().map(|site| site.weight).sum();
            let k = if source_weight > 0.0 { site_weight / source_weight } else { 0.0 };
            if active {
                statistics.add(k);
                run_tally.merge(&batch.tally);
            }
            failed_histories += batch.failed;

            let result = CycleResult {
                cycle,
                active,
                k,
                k_mean: statistics.mean(),
                k_std: statistics.std(),
                k_std_of_mean: statistics.std_of_mean(),
                entropy: settings.entropy_mesh.map(|mesh| mesh.entropy(&sites)),
                source_weight,
                fission_sites: sites.len(),
                failed_histories: batch.failed,
                balance: batch.tally.balance,
            };
            info!(
                "Cycle {:>4} {:>8}  k = {:.5}  mean = {}  sites = {}  failed = {}",
                cycle,
                if active { "active" } else { "inactive" },
                k,
                result.k_mean.map_or("-".to_string(), |mean| format!("{:.5}", mean)),
                sites.len(),
                batch.failed
            );
            debug!("Cycle {} took {:?}", cycle, start.elapsed());
            for observer in &self.observers {
                observer.on_cycle(&result);
            }
            cycles.push(result);

            if cycle + 1 < settings.cycles {
                let mut rng = HistoryRng::new(settings.seed, RngStream::Bank, cycle as u64);
                source = SourceBank::promote(&sites, n_particles, cycle, &mut rng)?;
            }
        }

        if let (Some(mean), Some(sigma)) = (statistics.mean(), statistics.std_of_mean()) {
            info!("k-effective = {:.5} +/- {:.5} over {} active cycles", mean, sigma, statistics.count());
        }
        Ok(RunResult {
            k_mean: statistics.mean(),
            k_std: statistics.std(),
            k_std_of_mean: statistics.std_of_mean(),
            entropy: cycles.last().and_then(|cycle| cycle.entropy),
            cycles,
            tally: run_tally,
            failed_histories,
            aborted,
        })
    }

    // External source problem: one batch of independent histories, fission
    // ends a history without feeding a next generation.
    pub fn run_fixed_source(&self) -> TransportResult<RunResult> {
        let settings = &self.settings;
        let mut tracking = settings.tracking();
        tracking.bank_fission = false;
        let tracker = Tracker::new(&self.geometry, &self.data, tracking);
        info!("Starting fixed source run: {} particles, seed {}", settings.particles, settings.seed);

        let mut result = RunResult {
            cycles: Vec::new(),
            k_mean: None,
            k_std: None,
            k_std_of_mean: None,
            entropy: None,
            tally: Tally::new(self.geometry.cells().len()),
            failed_histories: 0,
            aborted: false,
        };
        if self.cancel.is_cancelled() {
            result.aborted = true;
            return Ok(result);
        }

        let start = Instant::now();
        let source = settings.source.sample_bank(&self.geometry, self.data.energy_range(), settings.particles, settings.seed)?;
        let batch = self.run_batch(&tracker, &source, 0, None)?;
        debug!("Fixed source batch took {:?}", start.elapsed());
        info!(
            "Fixed source run finished: leaked {:.4}, absorbed {:.4}, failed {}",
            batch.tally.balance.leaked,
            batch.tally.balance.absorbed + batch.tally.balance.fission,
            batch.failed
        );
        result.tally = batch.tally;
        result.failed_histories = batch.failed;
        Ok(result)
    }

    fn run_batch(
        &self,
        tracker: &Tracker,
        source: &[Site],
        first_index: u64,
        fission_bank: Option<&FissionBank>,
    ) -> TransportResult<Batch> {
        let seed = self.settings.seed;
        let outcomes: Vec<Result<HistoryTally, HistoryFailure>> = source
            .par_iter()
            .enumerate()
            .map(|(i, site)| {
                let history = first_index + i as u64;
                let mut rng = HistoryRng::for_history(seed, history);
                let result = tracker.run_history(history, site, &mut rng)?;
                if let Some(bank) = fission_bank {
                    bank.insert(history, result.fission_sites);
                }
                Ok(result.tally)
            })
            .collect();

        let mut batch = Batch { tally: Tally::new(self.geometry.cells().len()), failed: 0 };
        for outcome in outcomes {
            match outcome {
                Ok(tally) => batch.tally.add_history(&tally),
                Err(failure) => match self.settings.failure_policy {
                    FailurePolicy::Fatal => return Err(failure.into()),
                    FailurePolicy::Abandon => {
                        warn!("Abandoned {}", failure);
                        batch.failed += 1;
                    }
                },
            }
        }
        Ok(batch)
    }
}
