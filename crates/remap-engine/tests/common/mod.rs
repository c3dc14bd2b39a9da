//! Shared fixtures for integration tests

#![allow(dead_code)]

use remap_engine::{FieldKind, Mapper, ObjectRef, TypeDefinition, TypeKey, TypeRegistry, Value};

/// Registry with every fixture type
pub fn registry() -> TypeRegistry {
    TypeRegistry::new()
        // points
        .with(
            TypeDefinition::class("PointFrom")
                .field("X", FieldKind::I32)
                .field("Y", FieldKind::I32)
                .field("Z", FieldKind::I32),
        )
        .with(
            TypeDefinition::record("PointTo")
                .field("X", FieldKind::I16)
                .field("Y", FieldKind::I16),
        )
        .with(
            TypeDefinition::class("PairPointFrom")
                .field("L", FieldKind::nested("PointFrom"))
                .field("R", FieldKind::nested("PointFrom")),
        )
        .with(
            TypeDefinition::record("PairPointTo")
                .field("L", FieldKind::nested("PointTo"))
                .field("R", FieldKind::nested("PointTo")),
        )
        // linked nodes
        .with(
            TypeDefinition::class("Node")
                .field("Label", FieldKind::String)
                .field("Next", FieldKind::nested("Node")),
        )
        .with(
            TypeDefinition::class("NodeDto")
                .field("Label", FieldKind::String)
                .field("Next", FieldKind::nested("NodeDto")),
        )
        .with(TypeDefinition::class("NodeLite").field("Label", FieldKind::String))
        .with(
            TypeDefinition::class("Holder")
                .field("A", FieldKind::nested("Node"))
                .field("B", FieldKind::nested("Node")),
        )
        .with(
            TypeDefinition::class("HolderDto")
                .field("A", FieldKind::nested("NodeDto"))
                .field("B", FieldKind::nested("NodeLite")),
        )
        // a tree whose branches may share a leaf
        .with(
            TypeDefinition::class("Fork")
                .field("Left", FieldKind::nested("Node"))
                .field("Right", FieldKind::nested("Node")),
        )
        .with(
            TypeDefinition::class("ForkDto")
                .field("Left", FieldKind::nested("NodeDto"))
                .field("Right", FieldKind::nested("NodeDto")),
        )
        // people and teams
        .with(
            TypeDefinition::class("Person")
                .field("Name", FieldKind::String)
                .field("Age", FieldKind::I32)
                .field("Active", FieldKind::Boolean),
        )
        .with(
            TypeDefinition::class("PersonDto")
                .field("Name", FieldKind::String)
                .field("Age", FieldKind::I64)
                .field("Active", FieldKind::I32),
        )
        .with(
            TypeDefinition::class("Team")
                .field("Title", FieldKind::String)
                .field("Members", FieldKind::collection(FieldKind::nested("Person"))),
        )
        .with(
            TypeDefinition::class("TeamDto")
                .field("Title", FieldKind::String)
                .field("Members", FieldKind::collection(FieldKind::nested("PersonDto"))),
        )
        // shapes behind interfaces
        .with(TypeDefinition::interface("IShape").field("Name", FieldKind::String))
        .with(
            TypeDefinition::interface("IShape2D")
                .field("Area", FieldKind::F64)
                .extends("IShape"),
        )
        .with(
            TypeDefinition::class("Circle")
                .field("Name", FieldKind::String)
                .field("Area", FieldKind::F64)
                .field("Radius", FieldKind::F64),
        )
        .with(
            TypeDefinition::class("ShapeSource")
                .field("Name", FieldKind::String)
                .field("Area", FieldKind::F64)
                .field("Radius", FieldKind::F64),
        )
        .with(TypeDefinition::class("Drawing").field("Shape", FieldKind::nested("ShapeSource")))
        .with(TypeDefinition::class("DrawingDto").field("Shape", FieldKind::polymorphic("IShape2D")))
}

/// Mapper over the fixture registry with default settings
pub fn mapper() -> Mapper {
    Mapper::new(registry())
}

/// Build an object of a fixture type
pub fn object(mapper: &Mapper, key: &str, values: Vec<(&str, Value)>) -> ObjectRef {
    mapper
        .registry()
        .build(&TypeKey::new(key), values)
        .unwrap()
}

/// `PointFrom(x, y, z)`
pub fn point(mapper: &Mapper, x: i32, y: i32, z: i32) -> ObjectRef {
    object(
        mapper,
        "PointFrom",
        vec![("X", x.into()), ("Y", y.into()), ("Z", z.into())],
    )
}

/// `Person(name, age)`
pub fn person(mapper: &Mapper, name: &str, age: i32) -> ObjectRef {
    object(mapper, "Person", vec![("Name", name.into()), ("Age", age.into())])
}

/// Chain of `len` nodes labelled "0", "1", ...
pub fn chain(mapper: &Mapper, len: usize) -> ObjectRef {
    let head = object(mapper, "Node", vec![("Label", "0".into())]);
    let mut tail = head.clone();
    for level in 1..len {
        let next = object(mapper, "Node", vec![("Label", level.to_string().into())]);
        tail.set("Next", next.clone()).unwrap();
        tail = next;
    }
    head
}

/// Labels along a mapped node chain, stopping at the first null link
pub fn labels(head: &ObjectRef) -> Vec<String> {
    let mut labels = Vec::new();
    let mut current = Some(head.clone());
    while let Some(node) = current {
        if let Some(label) = node.get("Label").and_then(|v| v.as_str().map(str::to_string)) {
            labels.push(label);
        }
        current = node.get("Next").and_then(|v| v.as_object().cloned());
    }
    labels
}

/// Unwrap a mapped object value
pub fn as_object(value: &Value) -> ObjectRef {
    value.as_object().cloned().expect("expected an object")
}
