// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::introspect::{ContractFamily, EnumShape};

fn catalog(shapes: Vec<(&str, TypeShape)>) -> Arc<ShapeCatalog> {
    let catalog = Arc::new(ShapeCatalog::new());
    for (key, shape) in shapes {
        catalog.insert(key, shape);
    }
    catalog
}

fn point_shape() -> TypeShape {
    TypeShape::Message(
        MessageShape::contract()
            .field(1, "x", "builtin.i32")
            .field(2, "y", "builtin.i32"),
    )
}

fn key(name: &str) -> TypeKey {
    TypeKey::new(name)
}

#[test]
fn test_add_is_idempotent() {
    let model = TypeModel::new(catalog(vec![("Demo.Point", point_shape())]));
    let first = model.add(&key("Demo.Point"), true).expect("add");
    let second = model.add(&key("Demo.Point"), true).expect("add again");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(model.len(), 1);
    assert_eq!(first.index(), 0);
    assert!(model.get(0).is_some_and(|meta| Arc::ptr_eq(&meta, &first)));
    assert!(model.get(1).is_none());
}

#[test]
fn test_builtin_types_have_no_descriptor() {
    let model = TypeModel::new(catalog(vec![]));
    let int = key("builtin.i32");

    assert!(matches!(model.add(&int, true), Err(Error::InbuiltType(_))));
    assert!(matches!(model.meta(&int), Err(Error::InbuiltType(_))));
    assert!(model
        .find_or_add(&int, FindOptions::lookup())
        .expect("lookup")
        .is_none());

    // Rust spellings are recognised too.
    assert!(matches!(
        model.add(&TypeKey::of::<u64>(), true),
        Err(Error::InbuiltType(_))
    ));
    assert!(model.is_empty());
}

#[test]
fn test_unknown_types_when_auto_add_is_off() {
    let model = TypeModel::builder()
        .catalog(catalog(vec![("Demo.Point", point_shape())]))
        .auto_add_missing_types(false)
        .build();
    let point = key("Demo.Point");

    let err = model.meta(&point).expect_err("not auto-added");
    assert!(matches!(err, Error::UnexpectedType(k) if k == point));
    assert!(model
        .find_or_add(&point, FindOptions::lookup())
        .expect("lookup")
        .is_none());

    let forced = model
        .find_or_add(&point, FindOptions::lookup().force())
        .expect("force");
    assert!(forced.is_some());
    assert_eq!(model.len(), 1);

    // Explicit add does not depend on the option.
    let model = TypeModel::builder()
        .catalog(catalog(vec![("Demo.Point", point_shape())]))
        .auto_add_missing_types(false)
        .build();
    assert!(model.add(&point, true).is_ok());
}

#[test]
fn test_types_without_shape() {
    let model = TypeModel::new(catalog(vec![]));
    let ghost = key("Demo.Ghost");

    assert!(matches!(model.meta(&ghost), Err(Error::UnexpectedType(_))));
    assert!(matches!(
        model.resolve(&ghost),
        Err(Error::NoSerializerAvailable(_))
    ));

    // Explicit add accepts it; the descriptor starts empty.
    let meta = model.add(&ghost, true).expect("add");
    assert!(meta.members().is_empty());
    assert_eq!(meta.family(), ContractFamily::None);
}

#[test]
fn test_contract_only() {
    let shapes = || {
        catalog(vec![
            (
                "Demo.Loose",
                TypeShape::Message(MessageShape::plain().field(1, "a", "builtin.i32")),
            ),
            ("Demo.Point", point_shape()),
        ])
    };
    let loose = key("Demo.Loose");

    let model = TypeModel::new(shapes());
    assert!(model
        .find_or_add(&loose, FindOptions::lookup().contract_only())
        .expect("lookup")
        .is_none());
    assert!(model
        .find_or_add(&loose, FindOptions::lookup())
        .expect("lookup")
        .is_some());

    let strict = TypeModel::builder()
        .catalog(shapes())
        .auto_add_contract_types_only(true)
        .build();
    assert!(matches!(strict.meta(&loose), Err(Error::UnexpectedType(_))));
    assert!(strict.meta(&key("Demo.Point")).is_ok());
}

#[test]
fn test_auto_tuples_are_always_added() {
    let model = TypeModel::builder()
        .catalog(catalog(vec![(
            "Demo.Pair",
            TypeShape::Message(
                MessageShape::auto_tuple()
                    .field(1, "left", "builtin.i32")
                    .field(2, "right", "builtin.i32"),
            ),
        )]))
        .auto_add_missing_types(false)
        .build();
    let meta = model.meta(&key("Demo.Pair")).expect("auto tuple");
    assert!(meta.is_auto_tuple());
}

#[test]
fn test_nullable_resolves_to_inner() {
    let model = TypeModel::new(catalog(vec![
        ("Demo.Point", point_shape()),
        ("Demo.Point?", TypeShape::Nullable(key("Demo.Point"))),
    ]));
    let meta = model.add(&key("Demo.Point?"), true).expect("add");
    assert_eq!(meta.key(), &key("Demo.Point"));
    assert!(model.contains(&key("Demo.Point?")));
    assert_eq!(model.len(), 1);

    let value = Value::Message(MessageValue::new("Demo.Point").with("x", 1));
    assert_eq!(
        model.serialize(&key("Demo.Point?"), &value).expect("serialize"),
        model.serialize(&key("Demo.Point"), &value).expect("serialize")
    );
}

#[test]
fn test_enums_only_register_explicitly() {
    let model = TypeModel::new(catalog(vec![(
        "Demo.Color",
        TypeShape::Enum(EnumShape::new().variant("Red", 0).named("Colour")),
    )]));
    let color = key("Demo.Color");

    model.resolve(&color).expect("resolve");
    assert!(!model.contains(&color));

    let meta = model.meta(&color).expect("meta");
    assert_eq!(meta.kind(), MetaKind::Enum);
    assert_eq!(meta.name().as_deref(), Some("Colour"));
    assert!(meta.enum_shape().is_some());
}

#[test]
fn test_collections_need_force() {
    let model = TypeModel::new(catalog(vec![(
        "Demo.Ints",
        TypeShape::Collection(key("builtin.i32")),
    )]));
    let ints = key("Demo.Ints");

    assert!(model
        .find_or_add(&ints, FindOptions::lookup())
        .expect("lookup")
        .is_none());
    let meta = model
        .find_or_add(&ints, FindOptions::demand().force())
        .expect("force")
        .expect("descriptor");
    assert_eq!(meta.kind(), MetaKind::Collection);
    assert_eq!(meta.collection(), Some(CollectionProvider::repeated(key("builtin.i32"))));
}

#[test]
fn test_frozen_model() {
    let model = TypeModel::new(catalog(vec![
        ("Demo.Point", point_shape()),
        (
            "Demo.Line",
            TypeShape::Message(MessageShape::contract().field(1, "from", "Demo.Point")),
        ),
    ]));
    let point = key("Demo.Point");
    let line = key("Demo.Line");
    model.add(&point, true).expect("add");
    model.freeze().expect("freeze");
    assert!(model.is_frozen());
    model.freeze().expect("freezing twice is harmless");

    assert!(model
        .find_or_add(&line, FindOptions::lookup())
        .expect("lookup")
        .is_none());
    assert!(matches!(model.meta(&line), Err(Error::InvalidOperation(_))));
    assert!(matches!(model.add(&line, true), Err(Error::InvalidOperation(_))));
    assert!(matches!(
        model.set_auto_add_missing_types(false),
        Err(Error::InvalidOperation(_))
    ));
    assert!(matches!(
        model.set_default_factory(|_| None),
        Err(Error::InvalidOperation(_))
    ));

    // Reads of what is already there keep working.
    assert!(model.meta(&point).is_ok());
    let value = Value::Message(MessageValue::new("Demo.Point").with("x", 1));
    assert_eq!(model.serialize(&point, &value).expect("serialize"), [0x08, 0x01]);
    assert_eq!(model.len(), 1);
}

#[test]
fn test_default_compatibility_level() {
    let model = TypeModel::new(catalog(vec![("Demo.Point", point_shape())]));
    model
        .set_default_compatibility_level(CompatibilityLevel::Level300)
        .expect("empty model");
    let meta = model.add(&key("Demo.Point"), true).expect("add");
    assert_eq!(meta.compatibility_level(), CompatibilityLevel::Level300);

    let err = model
        .set_default_compatibility_level(CompatibilityLevel::Level240)
        .expect_err("types already added");
    assert!(matches!(err, Error::InvalidOperation(_)));
    assert_eq!(
        model.options().default_compatibility_level,
        CompatibilityLevel::Level300
    );
}

#[test]
fn test_ambient_level_applies_to_new_descriptors() {
    let model = TypeModel::new(catalog(vec![
        ("Demo.Point", point_shape()),
        (
            "Demo.Stamped",
            TypeShape::Message(
                MessageShape::contract().compatibility(CompatibilityLevel::Level300),
            ),
        ),
    ]));
    model
        .resolve_with(&key("Demo.Point"), CompatibilityLevel::Level240)
        .expect("resolve");
    let point = model.meta(&key("Demo.Point")).expect("meta");
    assert_eq!(point.compatibility_level(), CompatibilityLevel::Level240);

    // A declared level wins over the ambient one.
    model
        .resolve_with(&key("Demo.Stamped"), CompatibilityLevel::Level240)
        .expect("resolve");
    let stamped = model.meta(&key("Demo.Stamped")).expect("meta");
    assert_eq!(stamped.compatibility_level(), CompatibilityLevel::Level300);
}

#[test]
fn test_metadata_timeout_setter() {
    let model = TypeModel::new(catalog(vec![]));
    let err = model
        .set_metadata_timeout(Duration::ZERO)
        .expect_err("zero timeout");
    assert!(matches!(err, Error::InvalidOperation(_)));

    model
        .set_metadata_timeout(Duration::from_millis(250))
        .expect("timeout");
    assert_eq!(model.options().metadata_timeout, Duration::from_millis(250));
}

#[test]
fn test_serializer_cache() {
    let model = TypeModel::new(catalog(vec![("Demo.Point", point_shape())]));
    let point = key("Demo.Point");

    let first = model.resolve(&point).expect("resolve");
    let second = model.resolve(&point).expect("cached");
    assert!(Arc::ptr_eq(&first, &second));

    model.reset_serializer(&point);
    let rebuilt = model.resolve(&point).expect("rebuilt");
    assert!(!Arc::ptr_eq(&first, &rebuilt));
    assert_eq!(model.len(), 1);
}

#[test]
fn test_compile_in_place() {
    let model = TypeModel::new(catalog(vec![
        ("Demo.Point", point_shape()),
        (
            "Demo.Line",
            TypeShape::Message(
                MessageShape::contract()
                    .field(1, "from", "Demo.Point")
                    .field(2, "to", "Demo.Point"),
            ),
        ),
    ]));
    model.add(&key("Demo.Line"), true).expect("line");
    model.add(&key("Demo.Point"), true).expect("point");
    assert_eq!(model.compile_in_place().expect("compile"), 2);
}

#[test]
fn test_compile_registers_member_types() {
    let model = TypeModel::new(catalog(vec![
        ("Demo.Point", point_shape()),
        (
            "Demo.Line",
            TypeShape::Message(
                MessageShape::contract()
                    .field(1, "from", "Demo.Point")
                    .field(2, "to", "Demo.Point"),
            ),
        ),
    ]));
    model.add(&key("Demo.Line"), true).expect("line");
    assert_eq!(model.len(), 1);

    assert_eq!(model.compile_in_place().expect("compile"), 2);
    assert!(model.contains(&key("Demo.Point")));
    assert_eq!(model.len(), 2);
}

#[test]
fn test_cascade_handles_cycles() {
    let model = TypeModel::new(catalog(vec![
        (
            "Demo.Parent",
            TypeShape::Message(MessageShape::contract().field(1, "child", "Demo.Child")),
        ),
        (
            "Demo.Child",
            TypeShape::Message(MessageShape::contract().field(1, "parent", "Demo.Parent")),
        ),
    ]));
    let found = model.cascade(&key("Demo.Parent")).expect("cascade");
    let keys: Vec<&str> = found.iter().map(|meta| meta.key().name()).collect();
    assert_eq!(keys, vec!["Demo.Parent", "Demo.Child"]);
    assert_eq!(model.len(), 2);
}

#[test]
fn test_cascade_follows_inheritance() {
    let model = TypeModel::new(catalog(vec![
        (
            "Demo.Animal",
            TypeShape::Message(MessageShape::contract().subtype(10, "Demo.Dog")),
        ),
        (
            "Demo.Dog",
            TypeShape::Message(
                MessageShape::contract()
                    .base("Demo.Animal")
                    .field(1, "owner", "Demo.Person"),
            ),
        ),
        (
            "Demo.Person",
            TypeShape::Message(MessageShape::contract().field(1, "name", "builtin.string")),
        ),
    ]));

    let from_base = model.cascade(&key("Demo.Animal")).expect("cascade");
    let keys: Vec<&str> = from_base.iter().map(|meta| meta.key().name()).collect();
    assert_eq!(keys, vec!["Demo.Animal", "Demo.Dog", "Demo.Person"]);

    let from_derived = model.cascade(&key("Demo.Dog")).expect("cascade");
    let keys: Vec<&str> = from_derived.iter().map(|meta| meta.key().name()).collect();
    assert_eq!(keys, vec!["Demo.Dog", "Demo.Person", "Demo.Animal"]);
}

#[test]
fn test_map_with_repeated_values_registers_pair() {
    let model = TypeModel::new(catalog(vec![
        ("Demo.Ints", TypeShape::Collection(key("builtin.i32"))),
        (
            "Demo.Index",
            TypeShape::Map(key("builtin.string"), key("Demo.Ints")),
        ),
        (
            "Demo.Holder",
            TypeShape::Message(MessageShape::contract().field(1, "index", "Demo.Index")),
        ),
    ]));
    let found = model.cascade(&key("Demo.Holder")).expect("cascade");
    assert_eq!(found.len(), 2);

    let pair = &found[1];
    assert!(pair.is_auto_tuple());
    assert_eq!(pair.name().as_deref(), Some("KeyValuePair"));
    assert_eq!(pair.key(), &TypeKey::map_entry(&key("builtin.string"), &key("Demo.Ints")));
    let members: Vec<(u32, String)> = pair
        .members()
        .iter()
        .map(|m| (m.number(), m.name().to_string()))
        .collect();
    assert_eq!(members, vec![(1, "key".to_string()), (2, "value".to_string())]);

    // The map still serializes entry by entry.
    let value = Value::Message(MessageValue::new("Demo.Holder").with(
        "index",
        Value::Map(vec![(Value::from("a"), Value::List(vec![Value::I32(1)]))]),
    ));
    let bytes = model.serialize(&key("Demo.Holder"), &value).expect("serialize");
    assert_eq!(bytes, [0x0A, 0x05, 0x0A, 0x01, b'a', 0x10, 0x01]);
    assert_eq!(model.deserialize(&key("Demo.Holder"), &bytes).expect("read"), value);
}

#[test]
fn test_listener_registration() {
    let model = TypeModel::new(catalog(vec![]));
    model.on_lock_contended(|_| {});
    model.add_lock_contention_listener(Arc::new(ClosureListener::new(|_: &LockContention| {})));
    assert_eq!(model.lock_contention_count(), 0);
}
