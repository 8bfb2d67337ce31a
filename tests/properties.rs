mod common;

use common::*;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn attribute_value() -> impl Strategy<Value = AttributeValue> {
    prop_oneof![
        "[a-z]{1,12}".prop_map(AttributeValue::String),
        any::<bool>().prop_map(AttributeValue::Boolean),
        any::<i64>().prop_map(AttributeValue::Integer),
        prop::collection::vec("[a-z]{1,6}", 0..4).prop_map(AttributeValue::StringArray),
    ]
}

fn policy() -> impl Strategy<Value = Policy> {
    (
        prop::collection::btree_map("[a-z][a-z_]{0,10}", attribute_value(), 0..5),
        prop::collection::btree_set("[a-z]{1,8}@example\\.com", 0..3),
    )
        .prop_map(|(attributes, dissem): (BTreeMap<_, _>, _)| {
            Policy::new(POLICY_ID, attributes, dissem.into_iter().collect())
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_roundtrip_any_text(
        text in "\\PC{0,200}",
        segment_size in 1usize..64,
        seed in any::<u64>(),
    ) {
        let engine = local_engine(seed, segment_size);
        let container = engine.encrypt(&text, &public_policy()).unwrap();
        prop_assert_eq!(engine.decrypt(&container).unwrap(), text);
    }

    #[test]
    fn prop_roundtrip_any_bytes(
        data in prop::collection::vec(any::<u8>(), 0..300),
        segment_size in 1usize..128,
    ) {
        let engine = local_engine(7, segment_size);
        let container = engine.encrypt_bytes(&data, &public_policy()).unwrap();
        let manifest = TdfEngine::inspect(&container).unwrap();

        prop_assert_eq!(manifest.payload.plaintext_length, data.len() as u64);
        prop_assert_eq!(
            manifest.integrity().segments.len(),
            data.len().div_ceil(segment_size).max(1)
        );
        prop_assert_eq!(engine.decrypt_bytes(&container).unwrap(), data);
    }

    #[test]
    fn prop_policy_survives_roundtrip(policy in policy()) {
        let engine = local_engine(8, 32);
        let container = engine.encrypt(TEST_PLAINTEXT, &policy).unwrap();
        prop_assert_eq!(TdfEngine::inspect(&container).unwrap().policy().unwrap(), policy);
        prop_assert_eq!(engine.decrypt(&container).unwrap(), TEST_PLAINTEXT);
    }

    #[test]
    fn prop_seeded_engines_are_deterministic(text in "[ -~]{0,80}", seed in any::<u64>()) {
        let first = local_engine(seed, 16).encrypt(&text, &public_policy()).unwrap();
        let second = local_engine(seed, 16).encrypt(&text, &public_policy()).unwrap();
        prop_assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn prop_random_byte_corruption_detected(
        position in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        let engine = local_engine(9, 16);
        let mut bytes = engine
            .encrypt(TEST_PLAINTEXT, &public_policy())
            .unwrap()
            .into_bytes();
        let index = position.index(bytes.len());
        bytes[index] ^= mask;
        prop_assert!(engine.decrypt(&Container::from_bytes(bytes)).is_err());
    }
}
