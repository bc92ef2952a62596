use std::time::Duration;

use dslab_vmp::core::constraints::Constraints;
use dslab_vmp::core::forecast::{call_to_reconfiguration, double_exponential_smoothing, ALPHA, BETA};
use dslab_vmp::core::objectives::RevenueModel;
use dslab_vmp::core::physical_machine::PhysicalMachine;
use dslab_vmp::core::placement::Placement;
use dslab_vmp::core::placement_algorithm::place;
use dslab_vmp::core::placement_algorithms::worst_fit::WorstFit;
use dslab_vmp::core::resources::Resources;
use dslab_vmp::core::scalarization::{APrioriBounds, ScalarizationMethod};
use dslab_vmp::core::virtual_machine::VirtualMachine;
use dslab_vmp::reconfiguration::aco::AntColonyOptimizer;
use dslab_vmp::reconfiguration::evaluation::Evaluator;
use dslab_vmp::reconfiguration::memetic::MemeticAlgorithm;
use dslab_vmp::reconfiguration::worker::ReconfigurationWorker;
use dslab_vmp::reconfiguration::{AcoSettings, MemeticSettings, ReconfigurationContext, Reconfigurator};

fn evaluator() -> Evaluator {
    Evaluator::new(
        Constraints::new(Resources::splat(0.5), false),
        RevenueModel::new(Resources::splat(1.), 1.),
        ScalarizationMethod::ED,
    )
}

/// VMs spread over all hosts by Worst Fit, leaving room for consolidation.
fn spread_placement() -> Placement {
    let hosts = (1..=4).map(|id| PhysicalMachine::new(id, Resources::splat(100.), 200.)).collect();
    let mut placement = Placement::new(hosts);
    let constraints = Constraints::new(Resources::splat(0.5), false);
    for id in 1..=8 {
        let vm = VirtualMachine {
            id,
            service_id: id,
            datacenter_id: 1,
            host_id: 0,
            resources: Resources::splat(10. + id as f64),
            utilization: Resources::splat(100.),
            revenue: Resources::splat(1.),
            tinit: 0,
            tend: 100,
        };
        place(&WorstFit::new(), vm, &mut placement, &constraints, false);
    }
    placement
}

fn bounds(placement: &Placement) -> APrioriBounds {
    let revenue: f64 = placement.vms.iter().map(|vm| vm.total_revenue()).sum();
    let memory: f64 = placement.vms.iter().map(|vm| vm.resources.ram).sum();
    APrioriBounds::new(placement.max_power(), revenue, memory)
}

#[test]
fn test_forecast_trigger() {
    assert!(call_to_reconfiguration(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6], 5));
    assert!(!call_to_reconfiguration(&[0.6, 0.5, 0.4, 0.3, 0.2, 0.1], 5));
}

#[test]
fn test_forecast_follows_trend() {
    let forecast = double_exponential_smoothing(&[5., 4., 3., 2.], ALPHA, BETA, 3);
    assert_eq!(forecast.len(), 3);
    assert!(forecast[0] < 2.);
    assert!(forecast[2] < forecast[1]);
}

#[test]
// The best fitness never gets worse from one generation to the next.
fn test_memetic_non_regression() {
    let placement = spread_placement();
    let bounds = bounds(&placement);
    let settings = MemeticSettings {
        population_size: 12,
        number_of_generations: 15,
        crossover_prob: 1.,
    };
    let mut optimizer = MemeticAlgorithm::new(settings, evaluator(), 7, ReconfigurationContext::new("memetic", 0));

    let best = optimizer.evolve(&placement, &bounds).unwrap();

    let history = optimizer.history();
    assert_eq!(history.len(), 16);
    for w in history.windows(2) {
        assert!(w[1] <= w[0] + 1e-12);
    }
    assert!(best.fitness <= history[0] + 1e-12);
    assert_eq!(best.solution.len(), placement.vms.len());
}

#[test]
fn test_memetic_is_deterministic_for_seed() {
    let placement = spread_placement();
    let bounds = bounds(&placement);
    let settings = MemeticSettings {
        population_size: 6,
        number_of_generations: 5,
        crossover_prob: 0.8,
    };
    let mut first = MemeticAlgorithm::new(settings.clone(), evaluator(), 11, ReconfigurationContext::new("a", 0));
    let mut second = MemeticAlgorithm::new(settings, evaluator(), 11, ReconfigurationContext::new("b", 0));
    let a = first.reconfigure(&placement, &bounds).unwrap();
    let b = second.reconfigure(&placement, &bounds).unwrap();
    let hosts_a: Vec<u32> = a.vms.iter().map(|vm| vm.host_id).collect();
    let hosts_b: Vec<u32> = b.vms.iter().map(|vm| vm.host_id).collect();
    assert_eq!(hosts_a, hosts_b);
    assert_eq!(a.score, b.score);
}

#[test]
// The result keeps every VM either placed or derived and carries a score.
fn test_optimizers_keep_vms() {
    let placement = spread_placement();
    let bounds = bounds(&placement);
    let optimizers: Vec<Box<dyn Reconfigurator>> = vec![
        Box::new(MemeticAlgorithm::new(
            MemeticSettings {
                population_size: 8,
                number_of_generations: 5,
                crossover_prob: 1.,
            },
            evaluator(),
            3,
            ReconfigurationContext::new("memetic", 0),
        )),
        Box::new(AntColonyOptimizer::new(
            AcoSettings {
                ants: 5,
                iterations: 5,
                max_pheromone: 1.,
                pheromone_constant: 0.5,
            },
            evaluator(),
            3,
            ReconfigurationContext::new("aco", 0),
        )),
    ];
    for mut optimizer in optimizers {
        let result = optimizer.reconfigure(&placement, &bounds).unwrap();
        assert_eq!(result.vms.len() + result.derived.len(), placement.vms.len());
        assert!(result.score.is_some());
        for host in result.hosts.iter() {
            let expected: f64 = result.vms_on(host.id).map(|vm| vm.load().cpu).sum();
            assert!((host.requested().cpu - expected).abs() < 1e-9);
        }
    }
}

#[test]
fn test_worker_returns_result() {
    let placement = spread_placement();
    let bounds = bounds(&placement);
    let mut worker = ReconfigurationWorker::new();
    assert!(worker.await_result().unwrap().is_none());

    let optimizer = MemeticAlgorithm::new(
        MemeticSettings {
            population_size: 4,
            number_of_generations: 3,
            crossover_prob: 1.,
        },
        evaluator(),
        5,
        ReconfigurationContext::new("memetic", 3),
    );
    worker.submit(Box::new(optimizer), placement.clone(), bounds, 3);
    assert!(worker.is_pending());
    assert_eq!(worker.started_at(), Some(3));

    let result = worker.await_result().unwrap().unwrap();
    assert!(!worker.is_pending());
    assert_eq!(result.vms.len() + result.derived.len(), placement.vms.len());
    assert!(worker.shutdown(Duration::from_secs(1)));
}
