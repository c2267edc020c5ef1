// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic

//! Serialize/deserialize through the public model API.

use protomodel::wire::{WireError, WireType, WireWriter, MAX_NESTING_DEPTH};
use protomodel::{
    CompatibilityLevel, Error, MessageShape, MessageValue, ShapeCatalog, TypeKey, TypeModel,
    TypeShape, Value,
};
use std::sync::Arc;

fn catalog() -> Arc<ShapeCatalog> {
    let catalog = Arc::new(ShapeCatalog::new());
    catalog.insert(
        "Demo.Point",
        TypeShape::Message(
            MessageShape::contract()
                .field(1, "x", "builtin.i32")
                .field(2, "y", "builtin.i32"),
        ),
    );
    catalog.insert(
        "Demo.Shape",
        TypeShape::Message(
            MessageShape::contract()
                .field(1, "label", "builtin.string")
                .field(2, "points", "Demo.Points")
                .field(3, "meta", "Demo.Meta")
                .field(4, "created", "builtin.datetime")
                .subtype(10, "Demo.Circle"),
        ),
    );
    catalog.insert(
        "Demo.Circle",
        TypeShape::Message(MessageShape::contract().field(1, "radius", "builtin.f64")),
    );
    catalog.insert("Demo.Points", TypeShape::Collection(TypeKey::new("Demo.Point")));
    catalog.insert(
        "Demo.Meta",
        TypeShape::Map(TypeKey::new("builtin.string"), TypeKey::new("builtin.i32")),
    );
    catalog.insert(
        "Demo.Node",
        TypeShape::Message(
            MessageShape::contract()
                .field(1, "value", "builtin.i32")
                .field(2, "next", "Demo.Node"),
        ),
    );
    catalog.insert(
        "Demo.Price",
        TypeShape::Message(MessageShape::contract().field(1, "amount", "builtin.decimal")),
    );
    catalog
}

fn point(x: i32, y: i32) -> Value {
    Value::Message(MessageValue::new("Demo.Point").with("x", x).with("y", y))
}

#[test]
fn test_point_bytes() {
    let model = TypeModel::new(catalog());
    let key = TypeKey::new("Demo.Point");
    let bytes = model.serialize(&key, &point(3, 4)).expect("serialize");
    assert_eq!(bytes, [0x08, 0x03, 0x10, 0x04]);
    assert_eq!(model.deserialize(&key, &bytes).expect("deserialize"), point(3, 4));
}

#[test]
fn test_nested_graph_roundtrip() {
    let model = TypeModel::builder()
        .catalog(catalog())
        .compatibility_level(CompatibilityLevel::Level300)
        .build();
    let key = TypeKey::new("Demo.Shape");
    let value = Value::Message(
        MessageValue::new("Demo.Shape")
            .with("label", "triangle")
            .with("points", Value::List(vec![point(1, 2), point(3, 4), point(5, 6)]))
            .with(
                "meta",
                Value::Map(vec![
                    (Value::from("layer"), Value::I32(2)),
                    (Value::from("z"), Value::I32(9)),
                ]),
            )
            .with(
                "created",
                Value::Timestamp {
                    seconds: 1_700_000_000,
                    nanos: 500,
                },
            ),
    );

    let bytes = model.serialize(&key, &value).expect("serialize");
    assert_eq!(model.deserialize(&key, &bytes).expect("deserialize"), value);
}

#[test]
fn test_subtype_roundtrip_through_base() {
    let model = TypeModel::new(catalog());
    let base = TypeKey::new("Demo.Shape");
    let circle = Value::Message(
        MessageValue::new("Demo.Circle")
            .with("label", "wheel")
            .with("radius", 2.5),
    );

    let bytes = model.serialize(&base, &circle).expect("serialize");
    let back = model.deserialize(&base, &bytes).expect("deserialize");
    assert_eq!(back, circle);

    // The same bytes read through the concrete type.
    let direct = model
        .deserialize(&TypeKey::new("Demo.Circle"), &bytes)
        .expect("deserialize");
    assert_eq!(direct, circle);
}

#[test]
fn test_malformed_input() {
    let model = TypeModel::new(catalog());
    let key = TypeKey::new("Demo.Point");

    // Varint cut short.
    assert!(matches!(
        model.deserialize(&key, &[0x08, 0x96]),
        Err(Error::Wire(_))
    ));
    // Unknown field whose length prefix runs past the end.
    assert!(matches!(
        model.deserialize(&key, &[0x1A, 0x05, 0x01]),
        Err(Error::Wire(_))
    ));
}

/// A `Demo.Node` chain `levels` messages deep, built from the bytes up.
fn node_chain(levels: usize) -> Vec<u8> {
    let mut body = vec![0x08, 0x01];
    for _ in 1..levels {
        let mut w = WireWriter::new();
        w.write_tag(1, WireType::Varint);
        w.write_varint(1);
        w.write_tag(2, WireType::LengthDelimited);
        w.write_bytes(&body);
        body = w.into_bytes();
    }
    body
}

#[test]
fn test_nesting_limit() {
    let model = TypeModel::new(catalog());
    let node = TypeKey::new("Demo.Node");

    let shallow = model.deserialize(&node, &node_chain(50)).expect("50 levels");
    let mut depth = 1;
    let mut current = shallow.as_message().expect("message").clone();
    while let Some(Value::Message(next)) = current.get("next").cloned() {
        depth += 1;
        current = next;
    }
    assert_eq!(depth, 50);

    let deep = node_chain(MAX_NESTING_DEPTH as usize + 10);
    assert!(matches!(
        model.deserialize(&node, &deep),
        Err(Error::Wire(WireError::RecursionLimit(_)))
    ));

    // Start-group tags without end: skipped as unknown fields of a Point.
    assert!(matches!(
        model.deserialize(&TypeKey::new("Demo.Point"), &[0x2B; 500_000]),
        Err(Error::Wire(WireError::RecursionLimit(_)))
    ));
}

#[test]
fn test_decimal_scale_out_of_range() {
    let model = TypeModel::new(catalog());
    let price = TypeKey::new("Demo.Price");

    let bytes = model
        .serialize(
            &price,
            &Value::Message(MessageValue::new("Demo.Price").with("amount", "12.50")),
        )
        .expect("serialize");
    let back = model.deserialize(&price, &bytes).expect("deserialize");
    assert_eq!(
        back.as_message().and_then(|m| m.get("amount")),
        Some(&Value::from("12.50"))
    );

    // amount { signScale = 2_000_000 }
    let bytes = [0x0A, 0x04, 0x18, 0x80, 0x89, 0x7A];
    assert!(matches!(
        model.deserialize(&price, &bytes),
        Err(Error::ValueMismatch { .. })
    ));
}

#[test]
fn test_unknown_type_with_auto_add_disabled() {
    let model = TypeModel::builder()
        .catalog(catalog())
        .auto_add_missing_types(false)
        .build();
    let key = TypeKey::new("Demo.Point");
    assert!(model.serialize(&key, &point(1, 1)).is_err());

    model.add(&key, true).expect("explicit add");
    let bytes = model.serialize(&key, &point(1, 1)).expect("serialize");
    assert_eq!(bytes, [0x08, 0x01, 0x10, 0x01]);
}
