//! Ordering properties over randomly generated descriptor sets.

use folio_core::{Extraction, GeneratedAttribute, ResourceDescriptor, ResourceKind};
use folio_planner::{GraphError, ResourceGraph};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A random DAG: each node may only reference nodes with a lower index, then
/// the declaration order is shuffled so the input is not pre-sorted.
fn random_dag(rng: &mut StdRng, size: usize) -> Vec<ResourceDescriptor> {
    let mut nodes: Vec<ResourceDescriptor> = (0..size)
        .map(|i| {
            let mut d = ResourceDescriptor::new(format!("r{}", i), ResourceKind::Storage);
            for j in 0..i {
                if rng.random_bool(0.3) {
                    d = d.depends_on(format!("r{}", j));
                }
            }
            d
        })
        .collect();

    for i in (1..nodes.len()).rev() {
        let j = rng.random_range(0..=i);
        nodes.swap(i, j);
    }
    nodes
}

fn position(order: &[&ResourceDescriptor], name: &str) -> usize {
    order
        .iter()
        .position(|d| d.name == name)
        .expect("every descriptor appears in the order")
}

#[test]
fn every_reference_precedes_its_source() {
    let mut rng = StdRng::seed_from_u64(7);
    for size in 1..40 {
        let descriptors = random_dag(&mut rng, size);
        let graph = ResourceGraph::build(descriptors).unwrap();
        let order = graph.order().unwrap();
        assert_eq!(order.len(), size);

        for d in &order {
            let source = position(&order, &d.name);
            for reference in d.references() {
                assert!(
                    position(&order, reference) < source,
                    "{} must come before {}",
                    reference,
                    d.name
                );
            }
        }
    }
}

#[test]
fn ordering_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(42);
    for size in [5, 12, 30] {
        let descriptors = random_dag(&mut rng, size);
        let graph = ResourceGraph::build(descriptors.clone()).unwrap();
        let first: Vec<String> = graph.order().unwrap().iter().map(|d| d.name.clone()).collect();

        for _ in 0..5 {
            let again = ResourceGraph::build(descriptors.clone()).unwrap();
            let next: Vec<String> = again.order().unwrap().iter().map(|d| d.name.clone()).collect();
            assert_eq!(first, next);
        }
    }
}

#[test]
fn any_back_edge_is_reported_as_a_cycle() {
    let mut rng = StdRng::seed_from_u64(99);
    for size in 2..25 {
        let mut descriptors: Vec<ResourceDescriptor> = (0..size)
            .map(|i| {
                let d = ResourceDescriptor::new(format!("r{}", i), ResourceKind::Compute);
                if i > 0 { d.depends_on(format!("r{}", i - 1)) } else { d }
            })
            .collect();

        // Close the chain somewhere: r{lo} -> r{hi} makes lo..=hi a cycle.
        let hi = rng.random_range(1..size);
        let lo = rng.random_range(0..hi);
        let closing = descriptors[lo].clone().depends_on(format!("r{}", hi));
        descriptors[lo] = closing;

        match ResourceGraph::build(descriptors) {
            Err(GraphError::CyclicDependency { cycle }) => {
                let members: Vec<String> = (lo..=hi).map(|i| format!("r{}", i)).collect();
                assert!(cycle.len() >= 2);
                assert_eq!(cycle.first(), cycle.last());
                for name in &cycle {
                    assert!(members.contains(name), "{} is not on the cycle {:?}", name, members);
                }
            }
            other => panic!("expected a cycle for size {}, got {:?}", size, other.map(|g| g.len())),
        }
    }
}

#[test]
fn self_references_are_cycles() {
    let explicit = ResourceDescriptor::new("Solo", ResourceKind::Edge).depends_on("Solo");
    assert_eq!(
        ResourceGraph::build(vec![explicit]).unwrap_err(),
        GraphError::CyclicDependency {
            cycle: vec!["Solo".to_string(), "Solo".to_string()]
        }
    );

    let self_derived = ResourceDescriptor::new("Api", ResourceKind::Routing).with_property(
        "self_host",
        GeneratedAttribute::new("Api", "api_endpoint").derive(Extraction::Host),
    );
    let err = ResourceGraph::build(vec![
        ResourceDescriptor::new("Photos", ResourceKind::Storage),
        self_derived,
    ])
    .unwrap_err();
    assert_eq!(
        err,
        GraphError::CyclicDependency {
            cycle: vec!["Api".to_string(), "Api".to_string()]
        }
    );
}
