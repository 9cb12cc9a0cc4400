use dynhier::designir::{PhysLocation, PrimitiveType};
use dynhier::{Config, InstanceKind, PassManager, SubPath, System};
use test_log::test;

#[test]
fn place_and_read_back() {
    let mut sys = System::new(Config::from_toml_str(r#"name = "Placement""#).unwrap());

    let first = sys.define_extern("core");
    let second = sys.define_extern("core");
    let top = sys.define_module("Top", move |m| {
        m.instance("a", first)?;
        m.instance("b", second)?;
        Ok(())
    });
    sys.add_top(top).unwrap();
    sys.generate(None).unwrap();
    assert_eq!(sys.resolve_symbol(first).unwrap().as_str(), "core");
    assert_eq!(sys.resolve_symbol(second).unwrap().as_str(), "core_1");

    let root = sys.get_instance(top).unwrap();
    assert_eq!(sys.get_instance(top).unwrap(), root);
    let a = sys.child(root, "a").unwrap();
    assert_eq!(sys.kind(a).unwrap(), InstanceKind::Module);
    assert_eq!(sys.path_names(a).unwrap(), vec!["a"]);

    sys.create_placement_db(None).unwrap();
    sys.place(a, PrimitiveType::M20K, 3, 4, 0, SubPath::none())
        .unwrap();
    assert_eq!(
        sys.locations(a).unwrap(),
        vec![(PhysLocation::new(PrimitiveType::M20K, 3, 4, 0), None)]
    );

    sys.run_passes(&mut PassManager::new()).unwrap();
    assert!(sys.issues().is_empty());
    let root = sys.get_instance(top).unwrap();
    let a = sys.child(root, "a").unwrap();
    assert_eq!(sys.locations(a).unwrap().len(), 1);
    assert_eq!(
        sys.instance_at(&PhysLocation::new(PrimitiveType::M20K, 3, 4, 0))
            .unwrap(),
        Some((a, None))
    );
}

#[test]
fn walk_counts_every_instance_once() {
    let mut sys = System::default();
    let leaf = sys.define_extern("Leaf");
    let mid = sys.define_module("Mid", move |m| {
        for _ in 0..3 {
            m.instance("leaf", leaf)?;
        }
        Ok(())
    });
    let top = sys.define_module("Top", move |m| {
        m.instance("mid", mid)?;
        m.instance("mid", mid)?;
        Ok(())
    });
    sys.add_top(top).unwrap();
    sys.generate(None).unwrap();

    let root = sys.get_instance(top).unwrap();
    let mut count = 0;
    sys.walk(root, |_, _| {
        count += 1;
        Ok(())
    })
    .unwrap();
    assert_eq!(count, 1 + 2 + 2 * 3);

    let mid_1 = sys.child(root, "mid_1").unwrap();
    let leaf_2 = sys.child(mid_1, "leaf_2").unwrap();
    assert_eq!(
        sys.describe(leaf_2).unwrap(),
        "<instance: [mid_1, leaf_2]>"
    );
}
