use super::coordinator::{Coordinator, RunPaths};
use super::worker::Worker;
use crate::core::basis::{QiClass, SplitTables, leading_range};
use crate::core::io::ScatteringReport;
use crate::core::kohn::LongRangeScalars;
use crate::engine::aggregate::{Gatherer, combine};
use crate::engine::comm::{BLOCK_ORDER, RootEndpoints, Topology, WorkerLink, wire};
use crate::engine::config::{ExecutionConfig, RunParameters};
use crate::engine::error::EngineError;
use crate::engine::partition::SplitPartition;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::tasks::long_long;
use std::sync::Arc;
use std::thread;
use tracing::{info, instrument, warn};

/// Everything the coordinator needs from evaluation to build the augmented system.
#[derive(Debug, Clone, PartialEq)]
pub struct Couplings {
    pub scalars: LongRangeScalars,
    /// Couplings to `C̄` in canonical order, partner half after the primary half.
    pub a_terms: Vec<f64>,
    /// Couplings to `S̄`, laid out like `a_terms`.
    pub b_terms: Vec<f64>,
    pub topologies: Vec<Topology>,
}

/// A complete run: load the inputs, evaluate across ranks, report the phase shifts.
#[instrument(skip_all, name = "scatter_workflow")]
pub fn run(
    kappa: f64,
    paths: RunPaths,
    execution: &ExecutionConfig,
    reporter: &ProgressReporter,
) -> Result<ScatteringReport, EngineError> {
    let coordinator = reporter.phase("Loading inputs", || Coordinator::load_inputs(kappa, paths))?;
    let couplings = evaluate(coordinator.params(), execution, reporter)?;
    let report = reporter.phase("Phase shifts", || coordinator.report_results(&couplings))?;
    info!(
        elapsed_secs = report.elapsed.as_secs_f64(),
        "Scattering run complete."
    );
    Ok(report)
}

/// Evaluates every integral class over `execution.workers` ranks and gathers the
/// couplings in canonical order. Only rank 0 reports progress.
#[instrument(skip_all, name = "evaluate_couplings", fields(ranks = execution.workers))]
pub fn evaluate(
    params: Arc<RunParameters>,
    execution: &ExecutionConfig,
    reporter: &ProgressReporter,
) -> Result<Couplings, EngineError> {
    execution.validate()?;
    let threads = execution.threads_per_worker.or_else(|| {
        thread::available_parallelism()
            .ok()
            .map(|n| (n.get() / execution.workers).max(1))
    });
    let (root, workers) = wire(execution.workers);

    thread::scope(|scope| {
        let handles: Vec<_> = workers
            .into_iter()
            .map(|link| {
                thread::Builder::new()
                    .name(format!("rank-{}", link.rank))
                    .spawn_scoped(scope, move || serve(link, threads))
            })
            .collect();

        let outcome = coordinate(root, params, threads, reporter);

        let mut worker_error = None;
        for handle in handles {
            let result = match handle {
                Ok(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Err(EngineError::Internal("worker rank panicked".into()))),
                Err(e) => Err(EngineError::Internal(format!("could not spawn rank: {e}"))),
            };
            if let Err(e) = result {
                warn!(error = %e, "Worker rank failed.");
                worker_error.get_or_insert(e);
            }
        }

        match (outcome, worker_error) {
            (Ok(couplings), None) => Ok(couplings),
            (Err(EngineError::Transport { .. }), Some(cause)) => Err(cause),
            (Err(e), _) | (Ok(_), Some(e)) => Err(e),
        }
    })
}

/// Rank 0: collects topologies, distributes slices, evaluates its own share plus the
/// long-long scalars and gathers the rest. Dropping `root` on any error releases the
/// workers blocked on it.
fn coordinate(
    root: RootEndpoints,
    params: Arc<RunParameters>,
    threads: Option<usize>,
    reporter: &ProgressReporter,
) -> Result<Couplings, EngineError> {
    let RootEndpoints { links } = root;
    let ranks = links.len() + 1;
    let pool = RankPool::new(0, threads)?;

    let mut topologies = vec![Topology::current(0, ranks, pool.threads())];
    for link in &links {
        topologies.push(link.topology.recv("topology")?);
    }
    for topology in &topologies {
        info!(rank = topology.rank, threads = topology.threads, host = %topology.host, "{topology}");
    }

    let tables = reporter.phase("Generating power tables", || {
        SplitTables::generate(
            params.enumerator(),
            params.omega,
            params.l_value,
            params.num_short_terms,
            params.nonlinear,
        )
    });
    let partition = SplitPartition::new(&tables, ranks);
    info!(
        qi0_terms = partition.qi0.total(),
        qi_gt0_terms = partition.qi_gt0.total(),
        ranks,
        "Power tables partitioned."
    );

    let mut slices = partition.slices(&tables).into_iter();
    let own_slice = slices
        .next()
        .ok_or_else(|| EngineError::Internal("partition produced no slice for rank 0".into()))?;
    for link in &links {
        link.params.send(Arc::clone(&params), "run parameters")?;
    }
    for (link, slice) in links.iter().zip(slices) {
        link.slice.send(slice, "work slice")?;
    }
    for link in &links {
        link.start.send((), "start signal")?;
    }

    let worker = Worker::new(0, &params, reporter);
    let (scalars, qi0, qi_gt0) = pool.install(|| {
        let scalars = long_long::run(worker.context())?;
        let (qi0, qi_gt0) = worker.evaluate_slice(&own_slice)?;
        Ok::<_, EngineError>((scalars, qi0, qi_gt0))
    })?;

    let mut gatherer = Gatherer::new(partition);
    gatherer.insert_local(worker.rank(), qi0, qi_gt0)?;
    reporter.report(Progress::Message(format!(
        "Gathering results from {} rank(s)",
        links.len()
    )));
    for link in &links {
        for _ in BLOCK_ORDER {
            let block = link.results.recv("partial results")?;
            if block.rank != link.rank {
                return Err(EngineError::Internal(format!(
                    "rank {} sent a block labelled rank {}",
                    link.rank, block.rank
                )));
            }
            gatherer.insert(block)?;
        }
    }

    let (qi0, qi_gt0) = gatherer.finish();
    let merged = combine(
        params.enumerator(),
        params.omega,
        &qi0,
        &qi_gt0,
        leading_range(params.num_short_terms),
    )?;

    Ok(Couplings {
        scalars,
        a_terms: merged.a,
        b_terms: merged.b,
        topologies,
    })
}

/// Ranks `1..`: report topology, take the broadcast and a slice, wait for the start
/// signal, evaluate, send back.
fn serve(link: WorkerLink, threads: Option<usize>) -> Result<(), EngineError> {
    let pool = RankPool::new(link.rank, threads)?;
    link.topology.send(
        Topology::current(link.rank, link.ranks, pool.threads()),
        "topology delivery",
    )?;
    let params = link.params.recv("run parameters")?;
    let slice = link.slice.recv("work slice")?;
    link.start.recv("start signal")?;

    let reporter = ProgressReporter::new();
    let worker = Worker::new(link.rank, &params, &reporter);
    let (qi0, qi_gt0) = pool.install(|| worker.evaluate_slice(&slice))?;

    let blocks = qi0
        .into_blocks(link.rank, QiClass::Zero)
        .into_iter()
        .chain(qi_gt0.into_blocks(link.rank, QiClass::Positive));
    for block in blocks {
        link.results.send(block, "result delivery")?;
    }
    Ok(())
}

/// The bounded thread pool each rank runs its inner loops on.
struct RankPool {
    #[cfg(feature = "parallel")]
    pool: rayon::ThreadPool,
}

impl RankPool {
    #[cfg(feature = "parallel")]
    fn new(rank: usize, threads: Option<usize>) -> Result<Self, EngineError> {
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(move |i| format!("rank-{rank}-{i}"));
        if let Some(threads) = threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build().map_err(|e| EngineError::ThreadPool {
            rank,
            message: e.to_string(),
        })?;
        Ok(Self { pool })
    }

    #[cfg(not(feature = "parallel"))]
    fn new(_rank: usize, _threads: Option<usize>) -> Result<Self, EngineError> {
        Ok(Self {})
    }

    #[cfg(feature = "parallel")]
    fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    #[cfg(not(feature = "parallel"))]
    fn threads(&self) -> usize {
        1
    }

    #[cfg(feature = "parallel")]
    fn install<R: Send>(&self, work: impl FnOnce() -> R + Send) -> R {
        self.pool.install(work)
    }

    #[cfg(not(feature = "parallel"))]
    fn install<R: Send>(&self, work: impl FnOnce() -> R + Send) -> R {
        work()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::basis::{NonlinearParams, TermOrdering};
    use crate::core::io::short_range::write_to;
    use crate::core::io::{ParameterFile, ShortRangeBlock, ShortRangeHeader};
    use crate::core::quadrature::{CuspRadii, QuadratureSpec};
    use crate::engine::config::{RunParametersBuilder, SpinState};
    use std::fs::{self, File};
    use std::path::Path;
    use tempfile::TempDir;

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() <= TOLERANCE * a.abs().max(b.abs()).max(f64::MIN_POSITIVE)
    }

    fn params(l_value: u32, ordering: TermOrdering, num_short_terms: usize) -> Arc<RunParameters> {
        Arc::new(
            RunParametersBuilder::new()
                .kappa(0.5)
                .omega(2)
                .num_short_terms(num_short_terms)
                .l_value(l_value)
                .ordering(ordering)
                .spin(SpinState::Singlet)
                .nonlinear(NonlinearParams::new(0.4, 0.5, 0.9))
                .mu(0.6)
                .shielding_power(3)
                .lambda([0.0; 3])
                .cusps(CuspRadii { r2: 2.0, r3: 2.0 })
                .quadrature(QuadratureSpec::uniform(2))
                .build()
                .unwrap(),
        )
    }

    fn execution(workers: usize, threads: usize) -> ExecutionConfig {
        ExecutionConfig {
            workers,
            threads_per_worker: Some(threads),
        }
    }

    fn assert_same_couplings(single: &Couplings, split: &Couplings) {
        assert_eq!(single.scalars, split.scalars);
        assert_eq!(single.a_terms.len(), split.a_terms.len());
        for (x, y) in single
            .a_terms
            .iter()
            .zip(&split.a_terms)
            .chain(single.b_terms.iter().zip(&split.b_terms))
        {
            assert!(f64_approx_equal(*x, *y), "{x} != {y}");
        }
    }

    #[test]
    fn gathered_couplings_do_not_depend_on_rank_count() {
        let reporter = ProgressReporter::new();
        for l_value in [0, 1] {
            for ordering in [TermOrdering::Nested, TermOrdering::Shell] {
                let params = params(l_value, ordering, 28);
                let single = evaluate(Arc::clone(&params), &execution(1, 2), &reporter).unwrap();
                let split = evaluate(Arc::clone(&params), &execution(3, 1), &reporter).unwrap();

                assert_eq!(single.a_terms.len(), 56);
                assert_same_couplings(&single, &split);
                assert_eq!(split.topologies.len(), 3);
                assert_eq!(
                    split.topologies.iter().map(|t| t.rank).collect::<Vec<_>>(),
                    vec![0, 1, 2]
                );
            }
        }
    }

    #[test]
    fn ranks_without_terms_are_skipped() {
        let reporter = ProgressReporter::new();
        let params = params(1, TermOrdering::Nested, 3);
        let single = evaluate(Arc::clone(&params), &execution(1, 1), &reporter).unwrap();
        let split = evaluate(params, &execution(5, 1), &reporter).unwrap();
        assert_eq!(split.a_terms.len(), 6);
        assert_same_couplings(&single, &split);
    }

    #[test]
    fn zero_ranks_are_rejected_before_spawning() {
        let reporter = ProgressReporter::new();
        let err = evaluate(params(0, TermOrdering::Nested, 1), &execution(0, 1), &reporter)
            .unwrap_err();
        assert!(matches!(err, EngineError::Config { .. }));
    }

    #[test]
    fn rank_holding_a_slice_is_released_when_distribution_fails() {
        let params = params(0, TermOrdering::Nested, 6);
        let (root, mut workers) = wire(3);
        // Rank 2 is gone before distribution reaches it.
        drop(workers.pop());
        let rank1 = workers.pop().unwrap();

        let tables = SplitTables::generate(
            params.enumerator(),
            params.omega,
            params.l_value,
            params.num_short_terms,
            params.nonlinear,
        );
        let slice = SplitPartition::new(&tables, 3).slices(&tables).swap_remove(1);

        thread::scope(|scope| {
            let handle = scope.spawn(move || serve(rank1, Some(1)));
            let link = &root.links[0];
            link.topology.recv("topology").unwrap();
            link.params.send(Arc::clone(&params), "run parameters").unwrap();
            link.slice.send(slice, "work slice").unwrap();
            assert!(
                root.links[1]
                    .params
                    .send(Arc::clone(&params), "run parameters")
                    .is_err()
            );

            drop(root);
            let result = handle.join().unwrap();
            assert!(matches!(
                result,
                Err(EngineError::Transport {
                    rank: 0,
                    expected: "start signal"
                })
            ));
        });
    }

    fn header(spin: SpinState) -> ShortRangeHeader {
        ShortRangeHeader {
            version: 1,
            omega: 0,
            num_short_terms: 0,
            num_short_terms_alt: 0,
            l_value: 0,
            spin,
            ordering: TermOrdering::Nested,
            integration_type: 0,
            nonlinear: NonlinearParams::new(0.5, 0.5, 1.0),
            var_len: 0,
        }
    }

    fn write_inputs(dir: &Path) -> RunPaths {
        let paths = RunPaths {
            parameter_file: dir.join("params.txt"),
            short_range_file: dir.join("short.psh"),
            output_file: dir.join("results.txt"),
        };
        let parameter_file = ParameterFile {
            quadrature: QuadratureSpec::uniform(1),
            cusps: CuspRadii { r2: 2.0, r3: 2.0 },
            mu: 0.5,
            shielding_power: 3,
            lambda: [0.0; 3],
        };
        parameter_file
            .write_to(&mut File::create(&paths.parameter_file).unwrap())
            .unwrap();
        write_to(
            &header(SpinState::Singlet),
            &ShortRangeBlock::default(),
            &mut File::create(&paths.short_range_file).unwrap(),
        )
        .unwrap();
        paths
    }

    #[test]
    fn minimal_run_reports_reproducible_finite_phase_shifts() {
        let dir = TempDir::new().unwrap();
        let paths = write_inputs(dir.path());
        let reporter = ProgressReporter::new();

        let first = run(0.3, paths.clone(), &execution(1, 1), &reporter).unwrap();
        let second = run(0.3, paths.clone(), &execution(2, 1), &reporter).unwrap();

        assert_eq!(first.a_row.len(), 1);
        assert_eq!(first.b.len(), 1);
        assert_eq!(first.a_row[0], first.scalars.clc);
        let pairs = [
            (first.phase_shifts.kohn, second.phase_shifts.kohn),
            (first.phase_shifts.inverse_kohn, second.phase_shifts.inverse_kohn),
            (first.phase_shifts.complex_kohn, second.phase_shifts.complex_kohn),
        ];
        for (a, b) in pairs {
            assert!(a.sin().powi(2).is_finite());
            assert_eq!(a.to_bits(), b.to_bits());
        }

        let written = fs::read_to_string(&paths.output_file).unwrap();
        assert!(written.contains("S-Wave Singlet Ps-H"));
        assert!(written.contains("A matrix row\n0 "));
        assert!(written.contains("Kohn phase shift: "));
    }

    #[test]
    fn input_failures_map_to_exit_codes() {
        let dir = TempDir::new().unwrap();
        let paths = write_inputs(dir.path());
        let reporter = ProgressReporter::new();
        let exit_code = |paths: RunPaths| {
            run(0.3, paths, &ExecutionConfig::default(), &reporter)
                .unwrap_err()
                .exit_code()
        };

        let missing_params = RunPaths {
            parameter_file: dir.path().join("absent.txt"),
            output_file: dir.path().join("no/such/dir/out.txt"),
            ..paths.clone()
        };
        assert_eq!(exit_code(missing_params), 3);

        let bad_output = RunPaths {
            output_file: dir.path().join("no/such/dir/out.txt"),
            ..paths.clone()
        };
        assert_eq!(exit_code(bad_output), 4);

        let missing_short_range = RunPaths {
            short_range_file: dir.path().join("absent.psh"),
            ..paths.clone()
        };
        assert_eq!(exit_code(missing_short_range), 2);

        let mut bytes = fs::read(&paths.short_range_file).unwrap();
        bytes[36..40].copy_from_slice(&7i32.to_le_bytes());
        fs::write(&paths.short_range_file, &bytes).unwrap();
        assert_eq!(exit_code(paths.clone()), 6);

        bytes[36..40].copy_from_slice(&0i32.to_le_bytes());
        bytes[8..12].copy_from_slice(&81i32.to_le_bytes());
        fs::write(&paths.short_range_file, &bytes).unwrap();
        assert_eq!(exit_code(paths), 3);
    }
}
