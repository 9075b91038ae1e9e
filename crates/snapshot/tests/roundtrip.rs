//! Property tests: any resource without computed values survives a snapshot
//! round trip, through both the record form and the checkpoint JSON text.

use std::collections::BTreeMap;

use proptest::prelude::*;

use propval::Asset;
use propval::Id;
use propval::PropertyMap;
use propval::PropertyValue;
use propval::ResourceReference;
use propval::Urn;
use snapshot::Resource;
use snapshot::State;
use snapshot::deserialize_resource;
use snapshot::serialize_resource;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Numbers whose decimal text parses back to the same bits.
fn arb_number() -> impl Strategy<Value = f64> {
    (-1_000_000i64..1_000_000).prop_map(|n| n as f64 / 4.0)
}

fn arb_scalar() -> impl Strategy<Value = PropertyValue> {
    prop_oneof![
        any::<bool>().prop_map(PropertyValue::Bool),
        arb_number().prop_map(PropertyValue::Number),
        "[a-z0-9 ]{0,12}".prop_map(PropertyValue::String),
        "[a-z]{1,8}".prop_map(|t| PropertyValue::Asset(Asset::from_text(t))),
        "[a-z]{1,8}".prop_map(|name| PropertyValue::ResourceReference(ResourceReference {
            urn: Urn::new("dev", "proj", None, "test:index:Thing", &name),
            id: Some(Id::from(name)),
            package_version: None,
        })),
    ]
}

/// Values that are never null. Nulls are only generated as array slots,
/// because an object drops its null entries.
fn arb_value() -> impl Strategy<Value = PropertyValue> {
    arb_scalar().prop_recursive(3, 24, 4, |inner| {
        let slot = prop_oneof![Just(PropertyValue::Null), inner.clone()];
        prop_oneof![
            prop::collection::vec(slot, 0..4).prop_map(PropertyValue::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner.clone(), 0..4).prop_map(PropertyValue::Object),
            inner.prop_map(PropertyValue::secret),
        ]
    })
}

fn arb_props() -> impl Strategy<Value = PropertyMap> {
    prop::collection::btree_map("[a-z]{1,6}", arb_value(), 0..5)
}

fn arb_state() -> impl Strategy<Value = State> {
    (
        "[a-z]{1,10}",
        any::<bool>(),
        any::<bool>(),
        proptest::option::of("[a-z0-9-]{1,10}"),
        proptest::option::of(arb_props()),
        proptest::option::of(arb_props()),
        proptest::option::of(arb_props()),
        prop::collection::vec("urn:[a-z]{1,6}", 0..5),
    )
        .prop_map(|(name, custom, delete, id, inputs, defaults, outputs, children)| State {
            r#type: "test:index:Thing".into(),
            urn: Urn::new("dev", "proj", None, "test:index:Thing", &name),
            custom,
            delete,
            id: id.map(Id::from),
            inputs,
            defaults,
            outputs,
            children: children.into_iter().map(Urn::from).collect(),
        })
}

fn sorted_children(mut state: State) -> State {
    state.children.sort();
    state
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn resource_round_trips_through_record(state in arb_state()) {
        let record = serialize_resource(&state).unwrap();
        let back = deserialize_resource(&record).unwrap();
        prop_assert_eq!(back, sorted_children(state));
    }

    #[test]
    fn resource_round_trips_through_json_text(state in arb_state()) {
        let text = serde_json::to_string(&serialize_resource(&state).unwrap()).unwrap();
        let record: Resource = serde_json::from_str(&text).unwrap();
        let back = deserialize_resource(&record).unwrap();
        prop_assert_eq!(back, sorted_children(state));
    }

    #[test]
    fn children_are_always_sorted(children in prop::collection::vec("[a-z]{1,4}", 0..8)) {
        let state = State {
            urn: Urn::from("urn:pulumi:dev::proj::test:index:Thing::t"),
            children: children.into_iter().map(Urn::from).collect(),
            ..State::default()
        };
        let record = serialize_resource(&state).unwrap();
        let mut expected = record.children.clone();
        expected.sort();
        prop_assert_eq!(record.children, expected);
    }
}

#[test]
fn empty_config_is_omitted_from_checkpoint() {
    let checkpoint = snapshot::Checkpoint::new("dev", BTreeMap::new(), None).unwrap();
    let json = checkpoint.to_json().unwrap();
    assert!(!json.contains("config"));
    assert!(!json.contains("latest"));
}
