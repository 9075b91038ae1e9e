use chrono::TimeZone;
use chrono::Utc;
use serde_json::Value;
use serde_json::json;

use propval::Archive;
use propval::Asset;
use propval::Id;
use propval::PropertyMap;
use propval::PropertyValue;
use propval::ResourceReference;
use propval::SECRET_SIG;
use propval::SIG_KEY;
use propval::Urn;

use crate::*;

fn props(entries: &[(&str, PropertyValue)]) -> PropertyMap {
    entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn bucket() -> State {
    State {
        r#type: "aws:s3/bucket:Bucket".into(),
        urn: Urn::from("urn:pulumi:dev::proj::aws:s3/bucket:Bucket::logs"),
        custom: true,
        id: Some(Id::from("logs-4f1a")),
        inputs: Some(props(&[("acl", "private".into())])),
        outputs: Some(props(&[("arn", "arn:aws:s3:::logs-4f1a".into())])),
        ..State::default()
    }
}

// ============================================================================
//  VALUES
// ============================================================================

#[test]
fn test_object_nulls_dropped_array_nulls_kept() -> Result<()> {
    let bag = props(&[
        ("x", PropertyValue::Null),
        ("y", "v".into()),
        ("z", PropertyValue::Array(vec![1.0.into(), PropertyValue::Null, "x".into()])),
    ]);
    let wire = serialize_properties(&bag)?;
    assert_eq!(Value::Object(wire), json!({ "y": "v", "z": [1.0, null, "x"] }));
    Ok(())
}

#[test]
fn test_computed_is_rejected() {
    let bag = props(&[("nested", PropertyValue::Object(props(&[("later", PropertyValue::Computed)])))]);
    let err = serialize_properties(&bag).unwrap_err();
    assert!(err.is_contract_violation());
    assert!(matches!(err, Error::ComputedValue(path) if path == "nested.later"));
}

#[test]
fn test_assets_and_archives_recovered_by_signature() -> Result<()> {
    let bag = props(&[
        ("code", Asset::from_text("exports.handler = () => {}").into()),
        ("site", Archive::from_path("./www").into()),
    ]);
    let wire = serialize_properties(&bag)?;
    assert_eq!(deserialize_properties(&wire)?, bag);
    Ok(())
}

#[test]
fn test_unsigned_map_is_an_object() -> Result<()> {
    let value = deserialize_property_value(&json!({ "text": "looks like an asset" }))?;
    assert_eq!(value, PropertyValue::Object(props(&[("text", "looks like an asset".into())])));
    Ok(())
}

#[test]
fn test_secret_survives_round_trip() -> Result<()> {
    let secret = PropertyValue::secret(PropertyValue::Object(props(&[("password", "hunter2".into())])));
    let wire = serialize_property_value(&secret)?.unwrap_or_default();
    assert_eq!(wire[SIG_KEY], json!(SECRET_SIG));
    assert_eq!(wire["plaintext"], json!(r#"{"password":"hunter2"}"#));
    assert_eq!(deserialize_property_value(&wire)?, secret);
    Ok(())
}

#[test]
fn test_resource_reference_survives_round_trip() -> Result<()> {
    let reference = PropertyValue::ResourceReference(ResourceReference {
        urn: Urn::from("urn:pulumi:dev::proj::aws:s3/bucket:Bucket::logs"),
        id: Some(Id::from("logs-4f1a")),
        package_version: None,
    });
    let wire = serialize_property_value(&reference)?.unwrap_or_default();
    assert_eq!(deserialize_property_value(&wire)?, reference);
    Ok(())
}

#[test]
fn test_secret_without_plaintext_is_unrecognized() {
    let err = deserialize_property_value(&json!({ SIG_KEY: SECRET_SIG, "ciphertext": "..." })).unwrap_err();
    assert!(err.is_contract_violation());
}

// ============================================================================
//  RESOURCES
// ============================================================================

#[test]
fn test_children_are_sorted() -> Result<()> {
    let state = State {
        children: vec!["b".into(), "a".into(), "c".into()],
        ..bucket()
    };
    let res = serialize_resource(&state)?;
    assert_eq!(res.children, vec![Urn::from("a"), Urn::from("b"), Urn::from("c")]);
    Ok(())
}

#[test]
fn test_empty_urn_is_rejected() {
    let state = State { urn: Urn::default(), ..bucket() };
    let err = serialize_resource(&state).unwrap_err();
    assert!(matches!(err, Error::EmptyUrn(ty) if ty == "aws:s3/bucket:Bucket"));
}

#[test]
fn test_absent_and_empty_bags_stay_distinct() -> Result<()> {
    let state = State { inputs: Some(PropertyMap::new()), outputs: None, ..bucket() };
    let json = serde_json::to_value(serialize_resource(&state)?)?;
    assert_eq!(json["inputs"], json!({}));
    assert!(json.get("outputs").is_none());
    assert!(json.get("defaults").is_none());
    assert!(json.get("delete").is_none());
    assert!(json.get("children").is_none());

    let back = deserialize_resource(&serde_json::from_value(json)?)?;
    assert_eq!(back.inputs, Some(PropertyMap::new()));
    assert_eq!(back.outputs, None);
    Ok(())
}

#[test]
fn test_resource_round_trip() -> Result<()> {
    let state = State {
        delete: true,
        defaults: Some(props(&[("region", "us-west-2".into())])),
        children: vec!["urn:child:2".into(), "urn:child:1".into()],
        ..bucket()
    };
    let back = deserialize_resource(&serialize_resource(&state)?)?;
    let mut expected = state.clone();
    expected.children.sort();
    assert_eq!(back, expected);
    Ok(())
}

// ============================================================================
//  DEPLOYMENTS
// ============================================================================

fn snapshot() -> Snapshot {
    let provider = State {
        r#type: "pulumi:providers:aws".into(),
        urn: Urn::from("urn:pulumi:dev::proj::pulumi:providers:aws::default"),
        custom: true,
        id: Some(Id::from("prov-1")),
        ..State::default()
    };
    let component = State {
        r#type: "my:index:Component".into(),
        urn: Urn::from("urn:pulumi:dev::proj::my:index:Component::comp"),
        children: vec![bucket().urn],
        ..State::default()
    };
    Snapshot {
        time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().unwrap_or_default(),
        info: Some(json!({ "source": "test" })),
        resources: vec![component, provider, bucket()],
    }
}

#[test]
fn test_deployment_keeps_resource_order() -> Result<()> {
    let snap = snapshot();
    let dep = serialize_deployment(&snap)?;
    let urns: Vec<_> = dep.resources.iter().map(|r| r.urn.as_str()).collect();
    assert_eq!(
        urns,
        vec![
            "urn:pulumi:dev::proj::my:index:Component::comp",
            "urn:pulumi:dev::proj::pulumi:providers:aws::default",
            "urn:pulumi:dev::proj::aws:s3/bucket:Bucket::logs",
        ]
    );
    assert_eq!(deserialize_deployment(&dep)?, snap);
    Ok(())
}

#[test]
fn test_empty_deployment_keeps_resources_key() -> Result<()> {
    let snap = Snapshot { time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().unwrap_or_default(), info: None, resources: Vec::new() };
    let dep = serialize_deployment(&snap)?;
    let json = serde_json::to_value(&dep).expect("deployment to json");
    assert_eq!(json.get("resources"), Some(&json!([])));
    assert!(json.get("info").is_none());

    let back: Deployment = serde_json::from_value(json).expect("deployment from json");
    assert_eq!(deserialize_deployment(&back)?, snap);
    Ok(())
}

#[test]
fn test_checkpoint_file_round_trip() -> Result<()> {
    let snap = snapshot();
    let mut config = std::collections::BTreeMap::new();
    config.insert("proj:region".to_string(), "us-west-2".to_string());
    let checkpoint = Checkpoint::new("dev", config, Some(&snap))?;

    let path = std::env::temp_dir().join(format!("snapshot-checkpoint-{}.json", std::process::id()));
    write_checkpoint(&path, &checkpoint)?;
    let back = read_checkpoint(&path)?;
    let _ = std::fs::remove_file(&path);

    assert_eq!(back, checkpoint);
    assert_eq!(back.snapshot()?, Some(snap));
    Ok(())
}

#[test]
fn test_missing_checkpoint_file() {
    let path = std::env::temp_dir().join("snapshot-checkpoint-does-not-exist.json");
    assert!(matches!(read_checkpoint(&path), Err(Error::Io { .. })));
}
