// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic

//! `.proto` export of a small order-management model.

use protomodel::{
    CompatibilityLevel, EnumShape, FieldShape, MessageShape, MessageValue, ProtoSyntax,
    SchemaOptions, ShapeCatalog, TypeKey, TypeModel, TypeShape, Value,
};
use std::sync::Arc;

fn shop_catalog() -> Arc<ShapeCatalog> {
    let catalog = Arc::new(ShapeCatalog::new());
    catalog.insert(
        "Shop.Order",
        TypeShape::Message(
            MessageShape::contract()
                .field(1, "id", "builtin.i64")
                .field(2, "customer", "Shop.Customer")
                .field(3, "lines", "Shop.Lines")
                .field(4, "tags", "Shop.Tags")
                .field(5, "status", "Shop.Status")
                .field(6, "placed_at", "builtin.datetime"),
        ),
    );
    catalog.insert(
        "Shop.Customer",
        TypeShape::Message(
            MessageShape::contract()
                .with_field(FieldShape::new(1, "name", "builtin.string").required())
                .field(2, "last_order", "Shop.Order"),
        ),
    );
    catalog.insert("Shop.Lines", TypeShape::Collection(TypeKey::new("Shop.Line")));
    catalog.insert(
        "Shop.Line",
        TypeShape::Message(
            MessageShape::contract()
                .field(1, "sku", "builtin.string")
                .field(2, "qty", "builtin.u32"),
        ),
    );
    catalog.insert(
        "Shop.Tags",
        TypeShape::Map(TypeKey::new("builtin.string"), TypeKey::new("builtin.i32")),
    );
    catalog.insert(
        "Shop.Status",
        TypeShape::Enum(EnumShape::new().variant("Open", 1).variant("Shipped", 2)),
    );
    catalog
}

fn modern_model() -> TypeModel {
    TypeModel::builder()
        .catalog(shop_catalog())
        .compatibility_level(CompatibilityLevel::Level300)
        .build()
}

fn block_position(text: &str, header: &str) -> usize {
    text.find(header)
        .unwrap_or_else(|| panic!("missing {:?} in:\n{}", header, text))
}

#[test]
fn test_order_graph_proto3() {
    let model = modern_model();
    let text = model
        .get_schema(Some(&TypeKey::new("Shop.Order")), ProtoSyntax::Proto3)
        .expect("schema");

    assert!(text.starts_with("syntax = \"proto3\";\npackage Shop;\n"));
    assert!(text.contains("import \"google/protobuf/timestamp.proto\";\n"));
    assert!(!text.contains("bcl"));

    assert!(text.contains("   int64 id = 1;\n"));
    assert!(text.contains("   Customer customer = 2;\n"));
    assert!(text.contains("   repeated Line lines = 3;\n"));
    assert!(text.contains("   map<string, int32> tags = 4;\n"));
    assert!(text.contains("   Status status = 5;\n"));
    assert!(text.contains("   .google.protobuf.Timestamp placed_at = 6;\n"));
    assert!(text.contains("enum Status {\n   ZERO = 0;\n   Open = 1;\n   Shipped = 2;\n}\n"));
    assert!(text.contains("   Order last_order = 2;\n"));

    // Blocks are ordered by name, collections and maps stay inline.
    let customer = block_position(&text, "message Customer {");
    let line = block_position(&text, "message Line {");
    let order = block_position(&text, "message Order {");
    let status = block_position(&text, "enum Status {");
    assert!(customer < line && line < order && order < status);
    assert!(!text.contains("message Lines"));
    assert!(!text.contains("message Tags"));
}

#[test]
fn test_order_graph_proto2_with_package_override() {
    let model = modern_model();
    let text = model
        .get_schema_with(
            &SchemaOptions::new(ProtoSyntax::Proto2)
                .root("Shop.Order")
                .package("shop.v1"),
        )
        .expect("schema");

    assert!(text.starts_with("syntax = \"proto2\";\npackage shop.v1;\n"));
    assert!(text.contains("   required string name = 1;\n"));
    assert!(text.contains("   optional int64 id = 1;\n"));
    assert!(text.contains("enum Status {\n   Open = 1;\n   Shipped = 2;\n}\n"));
}

#[test]
fn test_export_is_stable_across_use() {
    let model = modern_model();
    let order = TypeKey::new("Shop.Order");
    let before = model
        .get_schema(Some(&order), ProtoSyntax::Proto3)
        .expect("schema");

    let value = Value::Message(
        MessageValue::new("Shop.Order")
            .with("id", 7i64)
            .with("customer", MessageValue::new("Shop.Customer").with("name", "Ada"))
            .with("status", Value::Enum(2)),
    );
    model.serialize(&order, &value).expect("serialize");
    model.compile_in_place().expect("compile");
    model.freeze().expect("freeze");

    let after = model
        .get_schema(Some(&order), ProtoSyntax::Proto3)
        .expect("schema");
    assert_eq!(before, after);
}

#[test]
fn test_whole_model_matches_rooted_export() {
    let model = modern_model();
    model.add(&TypeKey::new("Shop.Order"), true).expect("order");
    model.add(&TypeKey::new("Shop.Customer"), true).expect("customer");
    model.add(&TypeKey::new("Shop.Line"), true).expect("line");
    model.add(&TypeKey::new("Shop.Status"), true).expect("status");

    let whole = model.get_schema(None, ProtoSyntax::Proto3).expect("whole");
    let rooted = model
        .get_schema_with(&SchemaOptions::new(ProtoSyntax::Proto3).root("Shop.Order"))
        .expect("rooted");
    assert_eq!(whole, rooted);
}
