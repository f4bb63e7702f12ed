//! Stress test: every single-character change to an issued token is
//! rejected as a bad signature, for both algorithms.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use agent_gateway::{scope_set, SigningSecret, TokenAlgorithm, TokenCodec, TokenError};

fn codec(algorithm: TokenAlgorithm) -> TokenCodec {
    TokenCodec::new(
        &SigningSecret::from_str_secret("tamper-test-secret").unwrap(),
        algorithm,
    )
    .unwrap()
}

fn issue(codec: &TokenCodec) -> String {
    codec
        .issue(
            "agt_TamperTarget",
            &scope_set(["read", "write"]),
            Duration::from_secs(3600),
        )
        .unwrap()
}

fn mutate_every_position(algorithm: TokenAlgorithm) {
    let codec = codec(algorithm);
    let token = issue(&codec);
    assert!(codec.validate(&token).is_ok());

    let bytes = token.as_bytes();
    for i in 0..bytes.len() {
        let mut tampered = bytes.to_vec();
        tampered[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(tampered).unwrap();

        assert_eq!(
            codec.validate(&tampered).unwrap_err(),
            TokenError::InvalidSignature,
            "{algorithm} token accepted or misclassified after changing byte {i}"
        );
    }
}

#[test]
fn stress_hs256_single_byte_mutations() {
    mutate_every_position(TokenAlgorithm::Hs256);
}

#[test]
fn stress_eddsa_single_byte_mutations() {
    mutate_every_position(TokenAlgorithm::EdDsa);
}

#[test]
fn stress_forged_claims_rejected() {
    let codec = codec(TokenAlgorithm::Hs256);
    let token = issue(&codec);
    let (header, rest) = token.split_once('.').unwrap();
    let (_, signature) = rest.split_once('.').unwrap();

    // Same header and signature, claims granting admin.
    let forged_claims = serde_json::json!({
        "sub": "agt_TamperTarget",
        "scopes": ["admin", "read", "write"],
        "iat": 0,
        "exp": u64::MAX,
    });
    let forged_payload = base64::Engine::encode(
        &URL_SAFE_NO_PAD,
        serde_json::to_vec(&forged_claims).unwrap(),
    );
    let forged = format!("{header}.{forged_payload}.{signature}");

    assert_eq!(
        codec.validate(&forged).unwrap_err(),
        TokenError::InvalidSignature
    );
}

#[test]
fn stress_truncated_and_extended_tokens() {
    let codec = codec(TokenAlgorithm::Hs256);
    let token = issue(&codec);

    for cut in 1..token.len() {
        let truncated = &token[..cut];
        assert!(
            codec.validate(truncated).is_err(),
            "truncated token of length {cut} accepted"
        );
    }

    assert_eq!(
        codec.validate(&format!("{token}A")).unwrap_err(),
        TokenError::InvalidSignature
    );
    assert_eq!(
        codec.validate(&format!("{token}.extra")).unwrap_err(),
        TokenError::InvalidSignature
    );
}

#[test]
fn stress_foreign_secret_rejected() {
    let ours = codec(TokenAlgorithm::Hs256);
    for i in 0..100 {
        let theirs =
            TokenCodec::hs256(&SigningSecret::from_str_secret(&format!("other-{i}")).unwrap())
                .unwrap();
        let token = issue(&theirs);
        assert_eq!(
            ours.validate(&token).unwrap_err(),
            TokenError::InvalidSignature
        );
    }
}
