use test_log::test;

use crate::*;

fn module(graph: &mut Graph, name: &str) -> OpRef {
    graph
        .create(
            None,
            Op::Module {
                sym_name: name.into(),
            },
        )
        .unwrap()
}

fn instance(graph: &mut Graph, parent: &OpRef, name: &str, target: &str) -> OpRef {
    graph
        .create(
            Some(parent),
            Op::Instance {
                sym_name: name.into(),
                module: target.into(),
            },
        )
        .unwrap()
}

#[test]
fn body_preserves_creation_order() {
    let mut graph = Graph::new();
    let top = module(&mut graph, "Top");
    module(&mut graph, "Leaf");
    instance(&mut graph, &top, "b", "Leaf");
    graph
        .create(
            Some(&top),
            Op::Other {
                sym_name: None,
                mnemonic: "hw.constant".into(),
            },
        )
        .unwrap();
    instance(&mut graph, &top, "a", "Leaf");

    let names: Vec<_> = graph
        .named_children(&top)
        .unwrap()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec!["b", "a"]);
    assert_eq!(graph.body(&top).unwrap().len(), 3);
    assert_eq!(graph.top_level().len(), 2);
}

#[test]
fn leaf_records_have_no_body() {
    let mut graph = Graph::new();
    let top = module(&mut graph, "Top");
    let inst = instance(&mut graph, &top, "a", "Top");
    let err = graph
        .create(
            Some(&inst),
            Op::Other {
                sym_name: None,
                mnemonic: "x".into(),
            },
        )
        .unwrap_err();
    assert_eq!(
        err,
        GraphError::NoBody {
            id: inst.id(),
            kind: OpKind::Instance
        }
    );
    assert_eq!(graph.parent(&inst).unwrap(), Some(top));
}

#[test]
fn erase_removes_nested_records() {
    let mut graph = Graph::new();
    let top = module(&mut graph, "Top");
    let hier = graph
        .create(
            None,
            Op::InstanceHierarchy {
                top_module: "Top".into(),
            },
        )
        .unwrap();
    let dyn_inst = graph
        .create(
            Some(&hier),
            Op::DynamicInstance {
                instance_ref: InnerRef::new("Top", "a"),
            },
        )
        .unwrap();
    let loc = graph
        .create(
            Some(&dyn_inst),
            Op::PhysLocation {
                loc: PhysLocation::new(PrimitiveType::M20K, 1, 2, 0),
                sub_path: None,
            },
        )
        .unwrap();
    assert_eq!(graph.descendants(&hier).unwrap(), vec![dyn_inst.clone(), loc.clone()]);

    graph.erase(&dyn_inst).unwrap();
    assert_eq!(graph.op(&loc), Err(GraphError::Erased(loc.id())));
    assert!(graph.body(&hier).unwrap().is_empty());
    assert!(graph.lookup(top.id()).is_some());
    assert_eq!(graph.len(), 2);
}

#[test]
fn clearing_live_handles_counts_and_invalidates() {
    let mut graph = Graph::new();
    let top = module(&mut graph, "Top");
    let other = graph.top_level();
    assert_eq!(graph.live_handles(), 2);

    drop(other);
    assert_eq!(graph.clear_live_handles(), 1);
    assert_eq!(graph.kind(&top), Err(GraphError::StaleHandle(top.id())));

    let fresh = graph.lookup(top.id()).unwrap();
    assert_eq!(graph.kind(&fresh), Ok(OpKind::Module));
    drop(top);
    drop(fresh);
    assert_eq!(graph.clear_live_handles(), 0);
}

#[test]
fn validation_reports_structural_issues() {
    let mut graph = Graph::new();
    let top = module(&mut graph, "Top");
    module(&mut graph, "Top");
    instance(&mut graph, &top, "a", "Missing");
    instance(&mut graph, &top, "a", "Top");
    let hier = graph
        .create(
            None,
            Op::InstanceHierarchy {
                top_module: "Top".into(),
            },
        )
        .unwrap();
    graph
        .create(
            Some(&hier),
            Op::DynamicInstance {
                instance_ref: InnerRef::new("Top", "nope"),
            },
        )
        .unwrap();

    let issues = graph.validate();
    assert!(issues.has_error());
    let causes: Vec<_> = issues.iter().map(|i| i.cause().clone()).collect();
    assert!(causes.contains(&Cause::DuplicateSymbol {
        symbol: "Top".into()
    }));
    assert!(causes.contains(&Cause::DuplicateSiteName {
        module: "Top".into(),
        name: "a".into()
    }));
    assert!(causes.contains(&Cause::UnknownModule {
        parent: "Top".into(),
        instance: "a".into(),
        target: "Missing".into()
    }));
    assert!(causes.contains(&Cause::DanglingDynamicInstance {
        instance_ref: InnerRef::new("Top", "nope")
    }));
}

#[test]
fn location_vectors_match_type_width() {
    let ty = Type::array(Type::Int(2), 2);
    assert_eq!(ty.bitwidth(), 4);
    let vec = LocationVector::new(ty.clone(), [Some((1, 2, 0)), None, None, Some((1, 2, 3))])
        .unwrap();
    assert_eq!(vec.iter().flatten().count(), 2);

    let err = LocationVector::new(Type::alias("word", ty), [None]).unwrap_err();
    assert_eq!(err.expected, 4);
    assert_eq!(err.actual, 1);

    assert_eq!(
        PhysLocation::new(PrimitiveType::Dsp, 39, 25, 0).to_string(),
        "PhysLocation<DSP, x:39, y:25, num:0>"
    );
}
