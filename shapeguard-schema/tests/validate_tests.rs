use pretty_assertions::assert_eq;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use shapeguard_model::{FieldDescriptor, PiiAction, PiiPolicy, Shape};
use shapeguard_schema::{
    PiiEnforcement, Schema, SchemaError, SchemaUpgrade, UpgradeError, UpgradeStep,
    ValidationConfig,
};

fn make_minimal() -> Schema {
    Schema::new("X", "1.0.0", Shape::new().with("name", FieldDescriptor::string()))
}

fn make_asset_schema() -> Schema {
    let address = Shape::new()
        .with("city", FieldDescriptor::string())
        .with("zip", FieldDescriptor::string().optional().pattern(Regex::new(r"^\d{5}$").unwrap()));
    let tag = Shape::new()
        .with("label", FieldDescriptor::string())
        .with("weight", FieldDescriptor::number().with_default(1));
    Schema::new(
        "asset",
        "1.0.0",
        Shape::new()
            .with("title", FieldDescriptor::string().min(1.0).max(20.0))
            .with("status", FieldDescriptor::string().one_of(["draft", "live", "archived"]))
            .with("count", FieldDescriptor::number().optional())
            .with("public", FieldDescriptor::boolean().with_default(false))
            .with("address", FieldDescriptor::object(address).optional())
            .with("tags", FieldDescriptor::array(FieldDescriptor::object(tag)).optional())
            .with(
                "colors",
                FieldDescriptor::array(FieldDescriptor::string().one_of(["red", "green", "blue"]))
                    .optional(),
            )
            .with("owner", FieldDescriptor::reference("user").optional())
            .with("items", FieldDescriptor::array(FieldDescriptor::reference("character")).optional()),
    )
}

fn valid_asset() -> Value {
    json!({"title": "Lamp", "status": "draft"})
}

fn errors_of(schema: &Schema, input: Value) -> Vec<String> {
    schema.validate(&input, None).errors
}

// ── Basic scenarios ──────────────────────────────────────────────

#[test]
fn empty_input_reports_missing_field() {
    let result = make_minimal().validate(&json!({}), None);
    assert!(!result.valid);
    assert_eq!(result.errors, vec!["Missing required field: name".to_string()]);
}

#[test]
fn valid_input_is_stamped_with_system_fields() {
    let result = make_minimal().validate(&json!({"name": "Ann"}), None);
    assert!(result.valid);
    assert!(result.errors.is_empty());
    assert_eq!(result.value, Some(json!({"type": "X", "version": "1.0.0", "name": "Ann"})));
}

#[test]
fn non_object_input_is_rejected_outright() {
    for input in [json!(null), json!("x"), json!(3), json!([{"name": "Ann"}])] {
        let result = make_minimal().validate(&input, None);
        assert!(!result.valid);
        assert_eq!(result.value, None);
        assert_eq!(result.errors, vec!["Input must be an object".to_string()]);
    }
}

#[test]
fn input_is_not_mutated() {
    let input = json!({"title": "Lamp", "status": "draft", "extra": 1});
    let before = input.clone();
    make_asset_schema().validate(&input, None);
    assert_eq!(input, before);
}

#[test]
fn unknown_keys_are_dropped() {
    let result = make_minimal().validate(&json!({"name": "Ann", "junk": true}), None);
    assert!(result.valid);
    assert!(result.value.unwrap().get("junk").is_none());
}

#[test]
fn system_fields_come_first() {
    let schema = make_minimal();
    let names: Vec<&str> = schema.shape().names().collect();
    assert_eq!(names, vec!["type", "version", "name"]);
    assert!(schema.shape().get("type").unwrap().is_system());
    assert!(schema.shape().get("version").unwrap().is_immutable());
}

#[test]
fn wrong_entity_type_is_invalid() {
    let errors = errors_of(&make_minimal(), json!({"type": "Y", "name": "Ann"}));
    assert_eq!(errors, vec!["Invalid value for field: type".to_string()]);
}

#[test]
fn newer_version_is_invalid() {
    let errors = errors_of(&make_minimal(), json!({"version": "2.0.0", "name": "Ann"}));
    assert_eq!(errors, vec!["Invalid value for field: version".to_string()]);
}

#[test]
fn non_string_version_is_a_type_error() {
    let errors = errors_of(&make_minimal(), json!({"version": 1, "name": "Ann"}));
    assert_eq!(errors, vec!["Field version must be string".to_string()]);
}

// ── Defaults and optionality ─────────────────────────────────────

#[test]
fn default_fills_absent_and_null() {
    let schema = make_asset_schema();
    for input in [valid_asset(), json!({"title": "Lamp", "status": "draft", "public": null})] {
        let value = schema.validate(&input, None).value.unwrap();
        assert_eq!(value["public"], json!(false));
    }
}

#[test]
fn default_producer_runs_per_validation() {
    let schema = Schema::new(
        "X",
        "1.0.0",
        Shape::new().with("tags", FieldDescriptor::array(FieldDescriptor::string()).with_default_fn(|| json!([]))),
    );
    let value = schema.validate(&json!({}), None).value.unwrap();
    assert_eq!(value["tags"], json!([]));
}

#[test]
fn absent_optional_is_omitted_and_null_is_kept() {
    let schema = make_asset_schema();
    let value = schema.validate(&valid_asset(), None).value.unwrap();
    assert!(value.get("count").is_none());

    let input = json!({"title": "Lamp", "status": "draft", "count": null});
    let result = schema.validate(&input, None);
    assert!(result.valid);
    assert_eq!(result.value.unwrap()["count"], Value::Null);
}

#[test]
fn every_field_is_visited() {
    let errors = errors_of(&make_asset_schema(), json!({"count": "x", "public": 1}));
    assert_eq!(
        errors,
        vec![
            "Missing required field: title".to_string(),
            "Missing required field: status".to_string(),
            "Field count must be number".to_string(),
            "Field public must be boolean".to_string(),
        ]
    );
}

// ── Primitive checks ─────────────────────────────────────────────

#[test]
fn scalar_enum_lists_allowed_values() {
    let errors = errors_of(&make_asset_schema(), json!({"title": "Lamp", "status": "gone"}));
    assert_eq!(errors, vec!["Field status must be one of: draft, live, archived".to_string()]);
}

#[test]
fn number_enum_is_checked() {
    let schema = Schema::new(
        "X",
        "1.0.0",
        Shape::new().with("level", FieldDescriptor::number().one_of([1, 2, 3])),
    );
    assert!(schema.validate(&json!({"level": 2}), None).valid);
    assert_eq!(
        schema.validate(&json!({"level": 4}), None).errors,
        vec!["Field level must be one of: 1, 2, 3".to_string()]
    );
}

#[test]
fn number_enum_ignores_integer_float_representation() {
    let schema = Schema::new(
        "X",
        "1.0.0",
        Shape::new()
            .with("n", FieldDescriptor::number().one_of([1, 2]))
            .with(
                "ns",
                FieldDescriptor::array(FieldDescriptor::number().one_of([1.5, 2.0])).optional(),
            ),
    );
    assert!(schema.validate(&json!({"n": 1.0}), None).valid);
    assert!(schema.validate(&json!({"n": 2, "ns": [2, 1.5]}), None).valid);
    assert_eq!(
        schema.validate(&json!({"n": 1.0, "ns": [3]}), None).errors,
        vec!["Field ns contains invalid values: 3. Allowed: 1.5, 2.0".to_string()]
    );
}

#[test]
fn min_max_on_string_length() {
    let schema = make_asset_schema();
    let errors = errors_of(&schema, json!({"title": "", "status": "draft"}));
    assert_eq!(errors, vec!["Invalid value for field: title".to_string()]);
    let long = "x".repeat(21);
    let errors = errors_of(&schema, json!({"title": long, "status": "draft"}));
    assert_eq!(errors, vec!["Invalid value for field: title".to_string()]);
}

#[test]
fn failed_validator_skips_type_check() {
    let schema = Schema::new(
        "X",
        "1.0.0",
        Shape::new().with("n", FieldDescriptor::number().validate(|v| v.as_f64().is_some_and(|n| n > 0.0))),
    );
    assert_eq!(
        schema.validate(&json!({"n": "text"}), None).errors,
        vec!["Invalid value for field: n".to_string()]
    );
}

// ── Objects ──────────────────────────────────────────────────────

#[test]
fn nested_object_errors_use_dotted_paths() {
    let input = json!({"title": "Lamp", "status": "draft", "address": {"zip": "abc"}});
    let errors = errors_of(&make_asset_schema(), input);
    assert_eq!(
        errors,
        vec![
            "Missing required field: address.city".to_string(),
            "Invalid value for field: address.zip".to_string(),
        ]
    );
}

#[test]
fn object_kind_mismatch() {
    let input = json!({"title": "Lamp", "status": "draft", "address": ["x"]});
    let errors = errors_of(&make_asset_schema(), input);
    assert_eq!(errors, vec!["Field address must be object".to_string()]);
}

#[test]
fn nested_unknown_keys_are_dropped() {
    let input = json!({"title": "Lamp", "status": "draft", "address": {"city": "Oslo", "x": 1}});
    let value = make_asset_schema().validate(&input, None).value.unwrap();
    assert_eq!(value["address"], json!({"city": "Oslo"}));
}

// ── Arrays ───────────────────────────────────────────────────────

#[test]
fn array_of_objects_paths_and_defaults() {
    let input = json!({
        "title": "Lamp",
        "status": "draft",
        "tags": [{"label": "a"}, {"weight": 2}, "bad"]
    });
    let result = make_asset_schema().validate(&input, None);
    assert_eq!(
        result.errors,
        vec![
            "Missing required field: tags[1].label".to_string(),
            "Field tags[2] must be object".to_string(),
        ]
    );
    assert_eq!(result.value.unwrap()["tags"][0], json!({"label": "a", "weight": 1}));
}

#[test]
fn array_enum_lists_only_offending_members() {
    let input = json!({"title": "Lamp", "status": "draft", "colors": ["red", "pink", "blue", "teal"]});
    let errors = errors_of(&make_asset_schema(), input);
    assert_eq!(
        errors,
        vec!["Field colors contains invalid values: pink, teal. Allowed: red, green, blue".to_string()]
    );
}

#[test]
fn array_element_type_errors() {
    let input = json!({"title": "Lamp", "status": "draft", "colors": ["red", 3]});
    let errors = errors_of(&make_asset_schema(), input);
    assert_eq!(errors, vec!["Field colors[1] must be string".to_string()]);
}

#[test]
fn array_kind_mismatch() {
    let input = json!({"title": "Lamp", "status": "draft", "colors": "red"});
    let errors = errors_of(&make_asset_schema(), input);
    assert_eq!(errors, vec!["Field colors must be array".to_string()]);
}

#[test]
fn nested_arrays_are_unsupported() {
    let schema = Schema::new(
        "X",
        "1.0.0",
        Shape::new().with("grid", FieldDescriptor::array(FieldDescriptor::array(FieldDescriptor::number()))),
    );
    assert_eq!(
        schema.validate(&json!({"grid": [[1]]}), None).errors,
        vec!["Field grid has unsupported array item type: array".to_string()]
    );
}

#[test]
fn primitive_item_validator_runs_per_element() {
    let schema = Schema::new(
        "X",
        "1.0.0",
        Shape::new().with("scores", FieldDescriptor::array(FieldDescriptor::number().max(10.0))),
    );
    assert_eq!(
        schema.validate(&json!({"scores": [1, 11, 5]}), None).errors,
        vec!["Invalid value for field: scores[1]".to_string()]
    );
}

// ── References ───────────────────────────────────────────────────

#[test]
fn array_of_refs_names_type_and_index() {
    let input = json!({"title": "Lamp", "status": "draft", "items": [{"type": "wrong", "id": "1"}]});
    let errors = errors_of(&make_asset_schema(), input);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("character"));
    assert!(errors[0].contains("items[0]"));
    assert_eq!(errors[0], "Field items[0] must reference character, got wrong");
}

#[test]
fn malformed_reference() {
    let input = json!({"title": "Lamp", "status": "draft", "owner": {"type": "user", "id": 7}});
    let errors = errors_of(&make_asset_schema(), input);
    assert_eq!(errors, vec!["Field owner must be { type: string; id: string }".to_string()]);
}

#[test]
fn reference_type_mismatch() {
    let schema = Schema::new("X", "1.0.0", Shape::new().with("a", FieldDescriptor::reference("asset")));
    let errors = errors_of(&schema, json!({"a": {"type": "other", "id": "x"}}));
    assert_eq!(errors, vec!["Field a must reference asset, got other".to_string()]);
}

#[test]
fn rich_reference_validates_extra_fields() {
    let relation = Shape::new().with("role", FieldDescriptor::string().one_of(["lead", "member"]));
    let schema = Schema::new(
        "team",
        "1.0.0",
        Shape::new().with("members", FieldDescriptor::array(FieldDescriptor::rich_reference("user", relation))),
    );
    let input = json!({"members": [
        {"type": "user", "id": "u1", "role": "lead", "junk": 1},
        {"type": "user", "id": "u2", "role": "boss"}
    ]});
    let result = schema.validate(&input, None);
    assert_eq!(
        result.errors,
        vec!["Field members[1].role must be one of: lead, member".to_string()]
    );
    assert_eq!(
        result.value.unwrap()["members"][0],
        json!({"type": "user", "id": "u1", "role": "lead"})
    );
}

#[test]
fn any_reference_accepts_every_type() {
    let schema = Schema::new("X", "1.0.0", Shape::new().with("target", FieldDescriptor::any_reference()));
    assert!(schema.validate(&json!({"target": {"type": "whatever", "id": "1"}}), None).valid);
}

// ── Immutability ─────────────────────────────────────────────────

fn make_sku_schema() -> Schema {
    Schema::new(
        "product",
        "1.0.0",
        Shape::new()
            .with("sku", FieldDescriptor::string().immutable())
            .with("name", FieldDescriptor::string()),
    )
}

#[test]
fn immutable_field_cannot_change() {
    let existing = json!({"sku": "A", "name": "old"});
    let result = make_sku_schema().validate(&json!({"sku": "B", "name": "new"}), Some(&existing));
    assert_eq!(result.errors, vec!["Field is immutable: sku".to_string()]);
}

#[test]
fn immutable_field_may_stay_the_same() {
    let existing = json!({"sku": "A", "name": "old"});
    let result = make_sku_schema().validate(&json!({"sku": "A", "name": "new"}), Some(&existing));
    assert!(result.valid);
}

#[test]
fn immutable_numbers_compare_by_value() {
    let schema = Schema::new(
        "X",
        "1.0.0",
        Shape::new()
            .with("n", FieldDescriptor::number().immutable())
            .with(
                "dims",
                FieldDescriptor::object(Shape::new().with("w", FieldDescriptor::number()))
                    .immutable(),
            ),
    );
    let existing = json!({"n": 5, "dims": {"w": 2}});
    assert!(schema.validate(&json!({"n": 5.0, "dims": {"w": 2.0}}), Some(&existing)).valid);
    assert_eq!(
        schema.validate(&json!({"n": 5.5, "dims": {"w": 2}}), Some(&existing)).errors,
        vec!["Field is immutable: n".to_string()]
    );
}

#[test]
fn immutable_ignores_keys_absent_from_existing() {
    let existing = json!({"name": "old"});
    assert!(make_sku_schema().validate(&json!({"sku": "B", "name": "new"}), Some(&existing)).valid);
}

#[test]
fn system_fields_are_exempt_from_immutability() {
    let existing = json!({"type": "product", "version": "0.9.0", "sku": "A", "name": "n"});
    let result = make_sku_schema().validate(&json!({"sku": "A", "name": "n"}), Some(&existing));
    assert!(result.valid);
}

// ── PII enforcement ──────────────────────────────────────────────

fn make_pii_schema(mode: PiiEnforcement) -> Schema {
    Schema::new(
        "user",
        "1.0.0",
        Shape::new().with("ssn", FieldDescriptor::string().pii(PiiPolicy::high(PiiAction::Hash))),
    )
    .with_config(ValidationConfig::default().with_pii_enforcement(mode))
}

#[test]
fn strict_pii_rejects_empty_high_field() {
    let errors = errors_of(&make_pii_schema(PiiEnforcement::Strict), json!({"ssn": ""}));
    assert_eq!(errors, vec!["High PII field must not be empty: ssn".to_string()]);
}

#[test]
fn warn_and_none_accept_empty_high_field() {
    for mode in [PiiEnforcement::Warn, PiiEnforcement::None] {
        assert!(make_pii_schema(mode).validate(&json!({"ssn": ""}), None).valid);
    }
}

#[test]
fn default_enforcement_is_warn() {
    assert_eq!(ValidationConfig::default().pii_enforcement, PiiEnforcement::Warn);
}

#[test]
fn config_parses_from_toml() {
    let config = ValidationConfig::from_toml_str("pii_enforcement = \"strict\"").unwrap();
    assert_eq!(config.pii_enforcement, PiiEnforcement::Strict);
    let config = ValidationConfig::from_toml_str("").unwrap();
    assert_eq!(config, ValidationConfig::default());
    assert!(matches!(
        ValidationConfig::from_toml_str("pii_enforcement = \"loud\""),
        Err(SchemaError::Config(_))
    ));
}

// ── Schema-level validator ───────────────────────────────────────

#[test]
fn schema_validator_runs_after_fields() {
    let schema = Schema::new(
        "range",
        "1.0.0",
        Shape::new()
            .with("lo", FieldDescriptor::number())
            .with("hi", FieldDescriptor::number()),
    )
    .with_validator(|v| v["lo"].as_f64() <= v["hi"].as_f64());

    assert!(schema.validate(&json!({"lo": 1, "hi": 2}), None).valid);
    assert_eq!(
        schema.validate(&json!({"lo": 3, "hi": 2}), None).errors,
        vec!["Schema-level validation failed.".to_string()]
    );
    assert_eq!(
        schema.validate(&json!({"lo": 3}), None).errors,
        vec!["Missing required field: hi".to_string()]
    );
}

// ── Field-level upgrade ──────────────────────────────────────────

fn make_priced_schema() -> Schema {
    Schema::new(
        "item",
        "2.0.0",
        Shape::new().with(
            "price",
            FieldDescriptor::number().since("2.0.0").upgrade(|old, ctx| {
                assert_eq!(ctx.field_name, "price");
                assert_eq!(ctx.field_to_version.to_string(), "2.0.0");
                old.as_str()
                    .and_then(|s| s.trim_start_matches('$').parse::<f64>().ok())
                    .map(|n| json!(n))
                    .ok_or_else(String::new)
            }),
        ),
    )
}

#[test]
fn field_upgrade_repairs_old_entities() {
    let result = make_priced_schema().validate(&json!({"version": "1.0.0", "price": "$5"}), None);
    assert!(result.valid, "{:?}", result.errors);
    assert_eq!(result.value.unwrap()["price"], json!(5.0));
}

#[test]
fn field_upgrade_failure_uses_default_message() {
    let result = make_priced_schema().validate(&json!({"version": "1.0.0", "price": "free"}), None);
    assert_eq!(result.errors, vec!["Field upgrade failed for field: price".to_string()]);
}

#[test]
fn field_upgrade_not_tried_on_current_entities() {
    let result = make_priced_schema().validate(&json!({"price": "$5"}), None);
    assert_eq!(result.errors, vec!["Field price must be number".to_string()]);
}

#[test]
fn field_upgrade_gates_on_recorded_version_after_schema_upgrade() {
    let schema = make_priced_schema().with_upgrade(SchemaUpgrade::transform(|v, _| Ok(v)));
    let result = schema.validate(&json!({"version": "1.0.0", "price": "$7"}), None);
    assert!(result.valid, "{:?}", result.errors);
    assert_eq!(result.value.unwrap()["version"], json!("2.0.0"));
}

// ── Schema-level upgrade during validation ───────────────────────

#[test]
fn schema_upgrade_runs_before_fields() {
    let schema = Schema::new(
        "user",
        "2.0.0",
        Shape::new().with("fullName", FieldDescriptor::string()),
    )
    .with_upgrade(SchemaUpgrade::steps([UpgradeStep::new("2.0.0", |mut v, _| {
        let name = v["name"].take();
        v["fullName"] = name;
        Ok(v)
    })]));
    let result = schema.validate(&json!({"type": "user", "version": "1.0.0", "name": "Ann"}), None);
    assert!(result.valid, "{:?}", result.errors);
    assert_eq!(
        result.value,
        Some(json!({"type": "user", "version": "2.0.0", "fullName": "Ann"}))
    );
}

#[test]
fn failed_schema_upgrade_aborts_validation() {
    let schema = Schema::new("user", "2.0.0", Shape::new().with("x", FieldDescriptor::string()))
        .with_upgrade(SchemaUpgrade::transform(|_, _| Err(UpgradeError::new("cannot migrate"))));
    let result = schema.validate(&json!({"version": "1.0.0"}), None);
    assert!(!result.valid);
    assert_eq!(result.value, None);
    assert_eq!(result.errors, vec!["cannot migrate".to_string()]);
}

// ── Typed view ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, PartialEq)]
struct Named {
    #[serde(rename = "type")]
    entity_type: String,
    version: String,
    name: String,
}

#[test]
fn validate_as_reads_typed_value() {
    let named: Named = make_minimal().validate_as(&json!({"name": "Ann"}), None).unwrap();
    assert_eq!(
        named,
        Named {
            entity_type: "X".into(),
            version: "1.0.0".into(),
            name: "Ann".into(),
        }
    );
}

#[test]
fn validate_as_returns_errors_when_invalid() {
    let err = make_minimal().validate_as::<Named>(&json!({}), None).unwrap_err();
    match err {
        SchemaError::Invalid { errors } => {
            assert_eq!(errors, vec!["Missing required field: name".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}
