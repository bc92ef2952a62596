use std::path::PathBuf;

use approx::assert_abs_diff_eq;
use env_logger::Builder;
use log::LevelFilter;

use dslab_vmp::core::config::exp_config::ExperimentConfig;
use dslab_vmp::core::config::sim_config::SimulationConfig;
use dslab_vmp::core::physical_machine::PhysicalMachine;
use dslab_vmp::core::placement::Placement;
use dslab_vmp::core::placement_algorithm::HeuristicCode;
use dslab_vmp::core::request::Request;
use dslab_vmp::core::resources::Resources;
use dslab_vmp::core::scalarization::APrioriBounds;
use dslab_vmp::error::VmpError;
use dslab_vmp::experiment::{run_scenario, Experiment};
use dslab_vmp::extensions::host_config_reader::read_hosts;
use dslab_vmp::orchestrator::results::RunResults;
use dslab_vmp::orchestrator::{migration_end_time, AlgorithmKind, Orchestrator, RecoveringMethod};
use dslab_vmp::reconfiguration::Reconfigurator;

fn init_logger() {
    let _ = Builder::new().filter_level(LevelFilter::Debug).is_test(true).try_init();
}

fn name_wrapper(file_name: &str) -> String {
    format!("test-configs/{}", file_name)
}

fn request(time: u32, vm_id: u32, size: f64, util: f64, tinit: u32, tend: u32) -> Request {
    Request {
        time,
        service_id: vm_id,
        datacenter_id: 1,
        vm_id,
        resources: Resources::splat(size),
        utilization: Resources::splat(util),
        revenue: Resources::splat(1.),
        tinit,
        tend,
    }
}

fn hosts(count: u32) -> Vec<PhysicalMachine> {
    (1..=count)
        .map(|id| PhysicalMachine::new(id, Resources::splat(100.), 100.))
        .collect()
}

fn config(algorithm: AlgorithmKind) -> SimulationConfig {
    let mut config = SimulationConfig::new();
    config.algorithm = algorithm;
    config.protection_factor = Resources::zero();
    config.link_capacity = 1000.;
    config.memetic.population_size = 6;
    config.memetic.number_of_generations = 4;
    config.execution_first_time = 2;
    config.execution_interval = 4;
    config.execution_duration = 1;
    config.historical_data_size = 3;
    config.forecast_size = 2;
    config
}

fn fixture_run(config: SimulationConfig) -> RunResults {
    let hosts = read_hosts(name_wrapper("hosts.txt")).unwrap();
    run_scenario("trace", config, hosts, &name_wrapper("trace.txt")).unwrap()
}

#[test]
// One VM of (50, 50, 50) on a host (100, 100, 100) with powerMax 100 draws 80.
fn test_single_vm_power() {
    let requests = vec![request(0, 1, 50., 100., 0, 5), request(1, 1, 50., 100., 0, 5)];
    let results = Orchestrator::new("single", config(AlgorithmKind::Online), hosts(1))
        .run(requests)
        .unwrap();

    assert_eq!(results.counters.served, 1);
    assert_eq!(results.counters.updated, 1);
    assert_eq!(results.series.len(), 2);
    assert_abs_diff_eq!(results.series[0].power, 80., epsilon = 1e-9);
    assert_abs_diff_eq!(results.series[0].revenue, 0.);
}

#[test]
fn test_counters() {
    let requests = vec![
        request(0, 1, 50., 100., 0, 5),
        request(0, 2, 60., 100., 0, 5),
        // time past the end of the VM
        request(7, 3, 10., 100., 0, 5),
        request(1, 2, 60., 50., 0, 5),
        request(1, 9, 10., 50., 0, 5),
    ];
    let results = Orchestrator::new("counters", config(AlgorithmKind::Online), hosts(1))
        .run(requests)
        .unwrap();

    assert_eq!(results.counters.served, 1);
    assert_eq!(results.counters.rejected, 1);
    assert_eq!(results.counters.invalid, 1);
    // update of the derived VM
    assert_eq!(results.counters.updated, 1);
    // update of a VM that was never admitted
    assert_eq!(results.counters.violated, 1);
    // derived VM costs its total revenue every time unit
    assert!(results.leasing_costs >= 180.);
}

#[test]
// An update above the reservation is an SLA violation with a penalty.
fn test_violation_is_charged() {
    let mut config = config(AlgorithmKind::Online);
    config.protection_factor = Resources::splat(0.5);
    let requests = vec![
        request(0, 1, 50., 100., 0, 5),
        request(0, 2, 50., 100., 0, 5),
        request(1, 1, 50., 20., 0, 5),
        request(2, 1, 60., 100., 0, 5),
    ];
    let results = Orchestrator::new("violation", config, hosts(1)).run(requests).unwrap();

    assert_eq!(results.counters.violated, 1);
    // uncovered demand is 30 per resource at revenue 1
    assert_abs_diff_eq!(results.economical_penalties, 90., epsilon = 1e-9);
    assert!(results.series[2].revenue > 0.);
}

#[test]
fn test_score_series_is_padded() {
    let requests = vec![request(3, 1, 10., 100., 3, 8), request(5, 1, 10., 60., 3, 8)];
    let results = Orchestrator::new("padded", config(AlgorithmKind::Online), hosts(2))
        .run(requests)
        .unwrap();

    assert_eq!(results.initial_time, 3);
    assert_eq!(results.scores.len(), 6);
    assert_eq!(&results.scores[..3], &[0., 0., 0.]);
    assert!(results.scores[3] > 0.);
    assert_eq!(results.scores[4], 0.);
    assert_abs_diff_eq!(results.scenario_score, results.scores.iter().sum::<f64>(), epsilon = 1e-12);
}

#[test]
// The host above the overload threshold sheds its largest VM to the other host.
fn test_threshold_relieves_overloaded_host() {
    let mut config = config(AlgorithmKind::ThresholdBased);
    config.overload_threshold = 80.;
    config.underload_threshold = 0.;
    let requests = vec![
        request(0, 1, 50., 100., 0, 10),
        request(0, 2, 40., 100., 0, 10),
        request(1, 1, 50., 100., 0, 10),
        request(1, 2, 40., 100., 0, 10),
        request(2, 1, 50., 100., 0, 10),
    ];
    let results = Orchestrator::new("threshold", config, hosts(2)).run(requests).unwrap();

    assert_eq!(results.migrations, 1);
    assert_eq!(results.counters.updated, 3);
    assert_eq!(results.counters.violated, 0);
    // two hosts at 50% and 40% cpu
    assert_abs_diff_eq!(results.series[2].power, 2. * 60. + 0.4 * 90., epsilon = 1e-9);
}

#[test]
fn test_periodic_launches_optimizer() {
    let results = fixture_run(config(AlgorithmKind::PeriodicMigration));

    assert!(!results.reconfiguration_calls.is_empty());
    assert_eq!(results.reconfiguration_calls[0], 1);
    assert!(results.merges <= results.reconfiguration_calls.len() as u64);
    assert_eq!(results.cancellations, 0);
    assert!(results.counters.served > 0);
}

#[test]
fn test_state_of_art_and_clever_complete() {
    for algorithm in [AlgorithmKind::StateOfArt, AlgorithmKind::CleverReconfiguration] {
        let results = fixture_run(config(algorithm));
        assert_eq!(results.algorithm, Some(algorithm));
        assert_eq!(results.series.len(), 41);
        assert!(results.merges <= results.reconfiguration_calls.len() as u64);
    }
}

/// Moves every VM to host 1.
struct Consolidate;

impl Reconfigurator for Consolidate {
    fn reconfigure(&mut self, placement: &Placement, _bounds: &APrioriBounds) -> Result<Placement, VmpError> {
        let mut result = placement.clone();
        for i in 0..result.vms.len() {
            result.move_vm(i, 1);
        }
        result.update_score(0.);
        Ok(result)
    }
}

struct Failing;

impl Reconfigurator for Failing {
    fn reconfigure(&mut self, _placement: &Placement, _bounds: &APrioriBounds) -> Result<Placement, VmpError> {
        Err(VmpError::Reconfiguration("no feasible placement".to_string()))
    }
}

struct Crashing;

impl Reconfigurator for Crashing {
    fn reconfigure(&mut self, _placement: &Placement, _bounds: &APrioriBounds) -> Result<Placement, VmpError> {
        panic!("optimizer crashed");
    }
}

/// Two VMs spread over two hosts by Worst Fit. VM 1 doubles its load at time 2, while the
/// optimizer launched at time 1 runs, and VM 2 is updated every time unit from 3 to `last`.
fn migration_trace(last: u32) -> Vec<Request> {
    let mut requests = vec![
        request(0, 1, 40., 50., 0, 20),
        request(0, 2, 40., 50., 0, 20),
        request(1, 1, 40., 50., 0, 20),
        request(1, 2, 40., 50., 0, 20),
        request(2, 1, 40., 100., 0, 20),
    ];
    for time in 3..=last {
        requests.push(request(time, 2, 40., 50., 0, 20));
    }
    requests
}

// Periodic runs launch at time 1 and collect the result at time 3.
fn migration_config(link_capacity: f64) -> SimulationConfig {
    let mut config = config(AlgorithmKind::PeriodicMigration);
    config.heuristic = HeuristicCode::WF;
    config.link_capacity = link_capacity;
    config.migration_factor_load = 10.;
    config
}

#[test]
fn test_migration_end_time() {
    let vm = request(0, 1, 40., 100., 0, 10).to_vm();
    // 40 GB over 80 Gbps
    assert_eq!(migration_end_time(&vm, 5, 80.), 9);
    assert_eq!(migration_end_time(&vm, 5, 1000.), 5);
    assert_eq!(migration_end_time(&vm, 5, 0.), u32::MAX);
    assert_eq!(migration_end_time(&vm, u32::MAX - 1, 80.), u32::MAX);
}

#[test]
// The load change of VM 1 missed by the optimizer is replayed onto its result before adoption.
fn test_missed_updates_are_replayed() {
    init_logger();
    let results = Orchestrator::new("replay", migration_config(1000.), hosts(2))
        .with_optimizer_factory(|_, _, _| Box::new(Consolidate))
        .run(migration_trace(4))
        .unwrap();

    assert_eq!(results.reconfiguration_calls, vec![1]);
    assert_eq!(results.migrations, 1);
    assert_eq!(results.merges, 1);
    // VM 1 at 40 and VM 2 at 20 on separate hosts
    assert_abs_diff_eq!(results.series[3].power, 76. + 68., epsilon = 1e-9);
    // both on host 1, 60% cpu
    assert_abs_diff_eq!(results.series[4].power, 84., epsilon = 1e-9);
}

#[test]
// VM 2 migrates from time 3 to 7 and carries 10% of extra cpu while in flight.
fn test_migration_load_surcharge() {
    init_logger();
    let results = Orchestrator::new("migration", migration_config(80.), hosts(2))
        .with_optimizer_factory(|_, _, _| Box::new(Consolidate))
        .run(migration_trace(8))
        .unwrap();

    assert_eq!(results.migrations, 1);
    assert_eq!(results.merges, 1);
    assert_abs_diff_eq!(results.series[3].power, 144., epsilon = 1e-9);
    for time in 4..=7 {
        // host 2 at 24% cpu
        assert_abs_diff_eq!(results.series[time].power, 76. + 69.6, epsilon = 1e-9);
    }
    assert_abs_diff_eq!(results.series[8].power, 84., epsilon = 1e-9);
}

#[test]
fn test_optimizer_failure_aborts_run() {
    init_logger();
    let result = Orchestrator::new("failing", migration_config(1000.), hosts(2))
        .with_optimizer_factory(|_, _, _| Box::new(Failing))
        .run(migration_trace(4));
    assert!(matches!(result, Err(VmpError::Reconfiguration(_))));

    let result = Orchestrator::new("crashing", migration_config(1000.), hosts(2))
        .with_optimizer_factory(|_, _, _| Box::new(Crashing))
        .run(migration_trace(4));
    assert!(matches!(result, Err(VmpError::Reconfiguration(_))));
}

#[test]
// A flat score launches the optimizer at time 3, the arrival at time 4 cancels it.
fn test_arrival_cancels_reconfiguration() {
    init_logger();
    let trace = || {
        let mut requests: Vec<Request> = (0..=6).map(|time| request(time, 1, 40., 50., 0, 20)).collect();
        requests.push(request(4, 2, 10., 50., 4, 20));
        requests
    };
    let mut config = config(AlgorithmKind::CleverReconfiguration);
    config.recovering_method = RecoveringMethod::Cancellation;
    config.execution_duration = 5;

    let results = Orchestrator::new("cancellation", config.clone(), hosts(2))
        .with_optimizer_factory(|_, _, _| Box::new(Consolidate))
        .run(trace())
        .unwrap();
    assert_eq!(results.reconfiguration_calls, vec![3]);
    assert_eq!(results.cancellations, 1);
    assert_eq!(results.merges, 0);
    assert_eq!(results.migrations, 0);

    config.recovering_method = RecoveringMethod::UpdateBased;
    let results = Orchestrator::new("update-based", config, hosts(2))
        .with_optimizer_factory(|_, _, _| Box::new(Consolidate))
        .run(trace())
        .unwrap();
    assert_eq!(results.reconfiguration_calls, vec![3]);
    assert_eq!(results.cancellations, 0);
}

#[test]
fn test_runs_are_reproducible() {
    let first = fixture_run(config(AlgorithmKind::PeriodicMigration));
    let second = fixture_run(config(AlgorithmKind::PeriodicMigration));
    assert_eq!(first.scores, second.scores);
    assert_eq!(first.migrations, second.migrations);
}

#[test]
fn test_experiment_writes_outputs() {
    let mut exp_config = ExperimentConfig::from_file(&name_wrapper("params.txt")).unwrap();
    assert_eq!(exp_config.config.algorithm, AlgorithmKind::PeriodicMigration);
    exp_config.config.input_dir = "test-configs".to_string();

    let output: PathBuf = std::env::temp_dir().join(format!("dslab-vmp-test-{}", std::process::id()));
    let mut experiment = Experiment::new(exp_config, Some(output.to_string_lossy().to_string()));
    let summaries = experiment.run(2).unwrap();

    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].error.is_none());
    assert!(output.join("trace_scores.txt").exists());
    assert!(output.join("trace_metrics.csv").exists());
    assert!(output.join("power.txt").exists());
    assert!(output.join("results.json").exists());
    let _ = std::fs::remove_dir_all(output);
}
