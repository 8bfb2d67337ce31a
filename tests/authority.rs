mod common;

use common::*;
use std::sync::Arc;
use tdf_engine::protocol::container;

fn clearance_gate(request: &UnwrapRequest<'_>) -> AccessDecision {
    match request.policy.body.data_attributes.get("clearance") {
        Some(AttributeValue::String(level)) if level == "public" => AccessDecision::Permit,
        _ => AccessDecision::Deny,
    }
}

/// Re-encode a container after editing its manifest
fn rewrite(container: &Container, edit: impl FnOnce(&mut Manifest)) -> Container {
    let decoded = container::decode(container.as_bytes()).expect("decode");
    let mut manifest = decoded.manifest;
    edit(&mut manifest);
    Container::from_bytes(container::encode(&manifest, decoded.payload).expect("encode"))
}

#[test]
fn test_denied_despite_valid_binding_and_integrity() {
    init_tracing();
    let gated = rsa_authority().with_access_decision(clearance_gate);
    let authority = Arc::new(CountingAuthority::new(gated));
    let engine = rsa_engine(OaepHash::Sha1, authority.clone());

    let secret = PolicyBuilder::new()
        .id_auto()
        .attribute("clearance", "secret")
        .build()
        .unwrap();
    let container = engine.encrypt(TEST_PLAINTEXT, &secret).unwrap();

    let result = engine.decrypt(&container);
    assert!(matches!(result, Err(TdfError::AccessDenied)));
    assert_eq!(authority.calls(), 1);

    // Same engine, permitted policy
    let container = engine.encrypt(TEST_PLAINTEXT, &public_policy()).unwrap();
    assert_eq!(engine.decrypt(&container).unwrap(), TEST_PLAINTEXT);
    assert_eq!(authority.calls(), 2);
}

#[test]
fn test_tampered_binding_never_reaches_authority() {
    init_tracing();
    let authority = Arc::new(CountingAuthority::new(rsa_authority()));
    let engine = rsa_engine(OaepHash::Sha256, authority.clone());
    let container = engine.encrypt(TEST_PLAINTEXT, &public_policy()).unwrap();

    let tampered = rewrite(&container, |manifest| {
        manifest.encryption_information.key_access.policy_binding.hash[0] ^= 0x01;
    });

    assert!(matches!(
        engine.decrypt(&tampered),
        Err(TdfError::PolicyBindingFailure)
    ));
    assert_eq!(authority.calls(), 0);
}

#[test]
fn test_swapped_policy_never_reaches_authority() {
    init_tracing();
    let gated = rsa_authority().with_access_decision(clearance_gate);
    let authority = Arc::new(CountingAuthority::new(gated));
    let engine = rsa_engine(OaepHash::Sha1, authority.clone());

    let secret = PolicyBuilder::new()
        .id(POLICY_ID)
        .attribute("clearance", "secret")
        .build()
        .unwrap();
    let container = engine.encrypt(TEST_PLAINTEXT, &secret).unwrap();

    // Downgrade the policy so the gate would permit it
    let downgraded = rewrite(&container, |manifest| {
        manifest.encryption_information.policy = public_policy().to_canonical_bytes().unwrap();
    });

    assert!(matches!(
        engine.decrypt(&downgraded),
        Err(TdfError::PolicyBindingFailure)
    ));
    assert_eq!(authority.calls(), 0);
}

#[test]
fn test_wrong_authority_key_is_access_denied() {
    init_tracing();
    let engine = rsa_engine(OaepHash::Sha1, Arc::new(rsa_authority()));
    let container = engine.encrypt(TEST_PLAINTEXT, &public_policy()).unwrap();

    let stranger = RsaKeyPair::generate(2048, &SeededRandom::new(0xBAD)).unwrap();
    let impostor = TdfEngine::builder()
        .recipient(Recipient::rsa(stranger.public_key().clone()))
        .binding_key(binding_key())
        .authority(LocalKeyAuthority::rsa(stranger))
        .build()
        .unwrap();

    assert!(matches!(
        impostor.decrypt(&container),
        Err(TdfError::AccessDenied)
    ));
}

#[test]
fn test_mismatched_wrap_algorithm_is_access_denied() {
    init_tracing();
    let engine = rsa_engine(OaepHash::Sha1, Arc::new(rsa_authority()));
    let container = engine.encrypt(TEST_PLAINTEXT, &public_policy()).unwrap();

    let local = TdfEngine::builder()
        .recipient(Recipient::local(LocalWrapKey::generate(&OsRandom)))
        .binding_key(binding_key())
        .authority(LocalKeyAuthority::local(LocalWrapKey::generate(&OsRandom)))
        .build()
        .unwrap();

    assert!(matches!(
        local.decrypt(&container),
        Err(TdfError::AccessDenied)
    ));
}

#[test]
fn test_request_carries_key_location() {
    init_tracing();
    let settings = EngineSettings {
        key_url: Some("https://kas.example.com".to_string()),
        key_id: Some("r1".to_string()),
        ..EngineSettings::default()
    };
    let gated = rsa_authority().with_access_decision(|request| {
        if request.url == Some("https://kas.example.com") && request.kid == Some("r1") {
            AccessDecision::Permit
        } else {
            AccessDecision::Deny
        }
    });
    let engine = TdfEngine::builder()
        .settings(settings)
        .recipient(Recipient::rsa(AUTHORITY_KEYPAIR.public_key().clone()))
        .binding_key(binding_key())
        .authority(gated)
        .build()
        .unwrap();

    let container = engine.encrypt(TEST_PLAINTEXT, &public_policy()).unwrap();
    let manifest = TdfEngine::inspect(&container).unwrap();
    assert_eq!(manifest.key_access().kid.as_deref(), Some("r1"));
    assert_eq!(engine.decrypt(&container).unwrap(), TEST_PLAINTEXT);
}
