mod common;

use std::sync::Barrier;

use common::{as_object, mapper, object, point};
use remap_engine::{FieldKind, Mapper, TypeDefinition, TypeKey, TypeRegistry, Value};

const THREADS: usize = 16;

#[test]
fn test_concurrent_first_use_resolves_once() {
    let mapper = mapper();
    let dest = TypeKey::new("PersonDto");
    let barrier = Barrier::new(THREADS);

    let results: Vec<Value> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let (mapper, dest, barrier) = (&mapper, &dest, &barrier);
                scope.spawn(move || {
                    let source = common::person(mapper, "same", i as i32);
                    barrier.wait();
                    mapper.map(&Value::Object(source), dest).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(mapper.plan_builds(), 1);
    for (i, result) in results.iter().enumerate() {
        let dto = as_object(result);
        assert_eq!(dto.get("Name"), Some(Value::from("same")));
        assert_eq!(dto.get("Age"), Some(Value::I64(i as i64)));
    }
}

#[test]
fn test_concurrent_nested_mapping() {
    let mapper = mapper();
    let dest = TypeKey::new("PairPointTo");
    let barrier = Barrier::new(THREADS);

    std::thread::scope(|scope| {
        for i in 0..THREADS as i32 {
            let (mapper, dest, barrier) = (&mapper, &dest, &barrier);
            scope.spawn(move || {
                let pair = object(
                    mapper,
                    "PairPointFrom",
                    vec![
                        ("L", point(mapper, i, i + 1, 0).into()),
                        ("R", point(mapper, -i, 0, 0).into()),
                    ],
                );
                barrier.wait();
                let mapped = as_object(&mapper.map(&Value::Object(pair), dest).unwrap());
                let left = as_object(&mapped.get("L").unwrap());
                let right = as_object(&mapped.get("R").unwrap());
                assert_eq!(left.get("Y"), Some(Value::I16((i + 1) as i16)));
                assert_eq!(right.get("X"), Some(Value::I16(-i as i16)));
            });
        }
    });

    // one resolution per pair: the pair plan and the nested point plan
    assert_eq!(mapper.plan_builds(), 2);
    mapper.plan(&"PointFrom".into(), &"PointTo".into()).unwrap();
    assert_eq!(mapper.plan_builds(), 2);
}

#[test]
fn test_concurrent_dense_type_graph() {
    const TYPES: usize = 10;
    let registry = TypeRegistry::new();
    for i in 0..TYPES {
        let mut source = TypeDefinition::class(format!("S{i}")).field("Id", FieldKind::I32);
        let mut dest = TypeDefinition::class(format!("D{i}")).field("Id", FieldKind::I64);
        for j in 0..TYPES {
            source = source.field(&format!("F{j}"), FieldKind::nested(format!("S{j}")));
            dest = dest.field(&format!("F{j}"), FieldKind::nested(format!("D{j}")));
        }
        registry.register(source);
        registry.register(dest);
    }
    let mapper = Mapper::new(registry);
    let dest = TypeKey::new("D0");
    let barrier = Barrier::new(THREADS);

    std::thread::scope(|scope| {
        for i in 0..THREADS as i32 {
            let (mapper, dest, barrier) = (&mapper, &dest, &barrier);
            scope.spawn(move || {
                let leaf = mapper.instantiate(&"S3".into()).unwrap();
                leaf.set("Id", i).unwrap();
                let root = mapper.instantiate(&"S0".into()).unwrap();
                root.set("F3", leaf).unwrap();
                barrier.wait();

                let mapped = as_object(&mapper.map(&Value::Object(root), dest).unwrap());
                let leaf = as_object(&mapped.get("F3").unwrap());
                assert_eq!(leaf.type_key().as_str(), "D3");
                assert_eq!(leaf.get("Id"), Some(Value::I64(i64::from(i))));
            });
        }
    });

    assert_eq!(mapper.plan_builds(), TYPES);
}
