use approx::assert_abs_diff_eq;

use dslab_vmp::core::objectives::{
    max_link_migration, memory_migrated, migration_count, vms_to_migrate, wasted_resources, RevenueModel,
};
use dslab_vmp::core::physical_machine::PhysicalMachine;
use dslab_vmp::core::placement::Placement;
use dslab_vmp::core::resources::Resources;
use dslab_vmp::core::scalarization::{normalize, ScalarizationMethod};
use dslab_vmp::core::violation::Violations;
use dslab_vmp::core::virtual_machine::VirtualMachine;
use dslab_vmp::orchestrator::merge_if_better;

fn vm(id: u32, host_id: u32, ram: f64) -> VirtualMachine {
    VirtualMachine {
        id,
        service_id: id,
        datacenter_id: 1,
        host_id,
        resources: Resources::new(1., ram, 1.),
        utilization: Resources::splat(100.),
        revenue: Resources::splat(1.),
        tinit: 0,
        tend: 10,
    }
}

fn scored(score: f64, vms: Vec<VirtualMachine>) -> Placement {
    let hosts = (1..=3).map(|id| PhysicalMachine::new(id, Resources::splat(100.), 100.)).collect();
    let mut placement = Placement::from_parts(hosts, vms, Vec::new());
    placement.update_score(score);
    placement
}

#[test]
fn test_normalize() {
    assert_eq!(normalize(0., 0., 10.), 0.);
    assert_eq!(normalize(5., 3., 3.), 0.);
    assert_abs_diff_eq!(normalize(5., 0., 10.), 0.5);
    assert_abs_diff_eq!(normalize(10., 0., 10.), 1.);
    for v in [0.1, 2.5, 7., 9.99] {
        let n = normalize(v, 0., 10.);
        assert!((0. ..=1.).contains(&n));
    }
}

#[test]
fn test_scalarization_methods() {
    let values = [0.3, 0.4, 0.];
    assert_abs_diff_eq!(ScalarizationMethod::ED.scalarize(&values, 0.25), 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(ScalarizationMethod::CD.scalarize(&values, 0.25), 0.4);
    assert_abs_diff_eq!(ScalarizationMethod::MD.scalarize(&values, 0.25), 0.7, epsilon = 1e-12);
    assert_abs_diff_eq!(ScalarizationMethod::WS.scalarize(&values, 0.5), 0.35, epsilon = 1e-12);
    assert!("XX".parse::<ScalarizationMethod>().is_err());
}

#[test]
fn test_migration_detection() {
    let old = vec![vm(1, 1, 4.), vm(2, 1, 8.), vm(3, 2, 2.)];
    assert_eq!(migration_count(&old, &old), 0);
    assert_eq!(memory_migrated(&old, &old), 0.);

    // VM 2 moves, VM 3 becomes derived
    let new = vec![vm(1, 1, 4.), vm(2, 3, 8.), vm(3, 0, 2.)];
    assert_eq!(migration_count(&old, &new), 1);
    assert_eq!(memory_migrated(&old, &new), 8.);

    let moved = vms_to_migrate(&old, &new);
    assert_eq!(moved.len(), 1);
    assert_eq!(moved[0].id, 2);
    assert_eq!(moved[0].host_id, 3);
}

#[test]
fn test_migration_detection_by_identity() {
    let old = vec![vm(1, 1, 4.), vm(2, 2, 8.)];
    let new = vec![vm(2, 1, 8.), vm(1, 1, 4.), vm(5, 2, 1.)];
    let moved = vms_to_migrate(&old, &new);
    assert_eq!(moved.len(), 1);
    assert_eq!(moved[0].id, 2);
}

#[test]
fn test_busiest_link() {
    let moves = vec![(1, 2, 3.), (1, 2, 4.), (2, 1, 5.), (3, 3, 100.), (1, 0, 50.)];
    assert_eq!(max_link_migration(moves.into_iter(), 3), 7.);
}

#[test]
fn test_merge_rule() {
    let mut live = scored(10., vec![vm(1, 1, 4.)]);
    assert!(merge_if_better(&mut live, scored(7., vec![vm(1, 2, 4.)])));
    assert_eq!(live.score, Some(7.));
    assert_eq!(live.vms[0].host_id, 2);

    let mut live = scored(5., vec![vm(1, 1, 4.)]);
    assert!(!merge_if_better(&mut live, scored(9., vec![vm(1, 2, 4.)])));
    assert_eq!(live.score, Some(5.));
    assert_eq!(live.vms[0].host_id, 1);

    let mut live = scored(6., vec![vm(1, 1, 4.)]);
    assert!(!merge_if_better(&mut live, scored(6., vec![vm(1, 2, 4.)])));
    assert_eq!(live.vms[0].host_id, 1);
}

#[test]
fn test_revenue_loss() {
    let model = RevenueModel::new(Resources::new(1., 2., 0.), 0.5);
    let placed = vec![vm(1, 1, 4.)];
    let derived = vec![vm(2, 0, 8.)];
    let mut violations = Violations::new();
    violations.record(1, 1, 3, Resources::new(1., 1., 1.));

    // derived: (1 + 8 + 1) * 0.5
    assert_abs_diff_eq!(model.revenue_loss(&placed, &derived, None), 5.);
    // plus 1 * 1 * 1 + 1 * 1 * 2
    assert_abs_diff_eq!(model.revenue_loss(&placed, &derived, Some((&violations, 3))), 8.);
    assert_abs_diff_eq!(model.revenue_loss(&placed, &derived, Some((&violations, 4))), 5.);
}

#[test]
fn test_wasted_resources() {
    let mut hosts = vec![
        PhysicalMachine::new(1, Resources::splat(100.), 100.),
        PhysicalMachine::new(2, Resources::splat(100.), 100.),
    ];
    assert_eq!(wasted_resources(&hosts), 0.);
    hosts[0].apply(&Resources::new(50., 100., 20.));
    assert_abs_diff_eq!(wasted_resources(&hosts), 1.3 / 3., epsilon = 1e-12);
}
