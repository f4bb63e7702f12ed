//! Edge cases across hashing, tokens, scopes and registration input.

use std::time::Duration;

use agent_gateway::{
    authorize, scope_set, Gateway, GatewayError, HasherParams, MemoryStore, PasswordHasher,
    RegisterRequest, ScopePolicy, ScopeSet, SigningSecret, TokenCodec, TokenError,
};

fn cheap_hasher() -> PasswordHasher {
    PasswordHasher::new(HasherParams {
        m_cost: 256,
        t_cost: 1,
        p_cost: 1,
    })
    .unwrap()
}

fn gateway() -> Gateway<MemoryStore> {
    let codec = TokenCodec::hs256(&SigningSecret::from_str_secret("edge-secret").unwrap()).unwrap();
    Gateway::new(MemoryStore::new(), cheap_hasher(), codec, Duration::from_secs(1800))
}

// ── Hashing ───────────────────────────────────────────────────────────────────

#[test]
fn unicode_and_long_passwords_roundtrip() {
    let hasher = cheap_hasher();
    let passwords = [
        "pässwörd-ünïcödé".to_string(),
        "🔐🔐🔐🔐🔐🔐🔐🔐".to_string(),
        "x".repeat(4096),
        " leading and trailing ".to_string(),
    ];
    for password in &passwords {
        let hash = hasher.hash(password).unwrap();
        assert!(hasher.verify(password, &hash));
        assert!(!hasher.verify(password.trim(), &hash) || password.trim() == password);
    }
}

#[test]
fn same_password_hashes_differ_and_both_verify() {
    let hasher = cheap_hasher();
    let a = hasher.hash("password123").unwrap();
    let b = hasher.hash("password123").unwrap();
    assert_ne!(a, b);
    assert!(hasher.verify("password123", &a));
    assert!(hasher.verify("password123", &b));
    assert!(!hasher.verify("password124", &a));
}

#[test]
fn hashes_from_other_cost_parameters_still_verify() {
    let old = PasswordHasher::new(HasherParams {
        m_cost: 512,
        t_cost: 2,
        p_cost: 1,
    })
    .unwrap();
    let hash = old.hash("carried-over").unwrap();
    assert!(cheap_hasher().verify("carried-over", &hash));
}

#[test]
fn garbage_stored_hashes_verify_false() {
    let hasher = cheap_hasher();
    for stored in ["", "plaintext", "$argon2id$", "$argon2id$v=19$m=256,t=1,p=1$$", "$2b$12$abc"] {
        assert!(!hasher.verify("password123", stored), "{stored:?}");
    }
}

// ── Tokens ────────────────────────────────────────────────────────────────────

#[test]
fn expiry_boundary_is_expired() {
    let codec = TokenCodec::hs256(&SigningSecret::from_str_secret("edge-secret").unwrap()).unwrap();
    let token = codec
        .issue_at("agt_x", &scope_set(["read"]), Duration::from_secs(30), 10_000)
        .unwrap();
    assert!(codec.validate_at(&token, 10_000).is_ok());
    assert!(codec.validate_at(&token, 10_029).is_ok());
    assert_eq!(
        codec.validate_at(&token, 10_030).unwrap_err(),
        TokenError::Expired
    );
    assert_eq!(
        codec.validate_at(&token, u64::MAX).unwrap_err(),
        TokenError::Expired
    );
}

#[test]
fn empty_scope_set_round_trips() {
    let codec = TokenCodec::hs256(&SigningSecret::from_str_secret("edge-secret").unwrap()).unwrap();
    let token = codec
        .issue("agt_x", &ScopeSet::new(), Duration::from_secs(30))
        .unwrap();
    let claims = codec.validate(&token).unwrap();
    assert!(claims.scopes.is_empty());
}

#[test]
fn zero_ttl_rejected_at_issue() {
    let codec = TokenCodec::hs256(&SigningSecret::from_str_secret("edge-secret").unwrap()).unwrap();
    assert!(matches!(
        codec.issue("agt_x", &ScopeSet::new(), Duration::from_millis(500)),
        Err(GatewayError::Validation(_))
    ));
}

#[test]
fn token_without_separator_is_malformed() {
    let codec = TokenCodec::hs256(&SigningSecret::from_str_secret("edge-secret").unwrap()).unwrap();
    assert_eq!(codec.validate("").unwrap_err(), TokenError::Malformed);
    assert_eq!(
        codec.validate("no-dots-at-all").unwrap_err(),
        TokenError::Malformed
    );
}

// ── Scopes ────────────────────────────────────────────────────────────────────

#[test]
fn scope_matching_is_exact() {
    let granted = scope_set(["read", "write"]);
    assert!(authorize(&granted, &ScopeSet::new()));
    assert!(authorize(&granted, &scope_set(["read", "write"])));
    assert!(!authorize(&granted, &scope_set(["READ"])));
    assert!(!authorize(&granted, &scope_set(["read "])));
    assert!(!authorize(&granted, &scope_set(["rea"])));
    assert!(!authorize(&scope_set(["admin"]), &scope_set(["write"])));
    assert!(!authorize(&ScopeSet::new(), &scope_set(["read"])));
}

#[test]
fn policy_names_missing_scope() {
    let policy = ScopePolicy::require(["read", "write", "admin"]);
    let granted = scope_set(["read"]);
    assert_eq!(policy.missing(&granted), vec!["admin", "write"]);
    assert!(matches!(
        policy.check(&granted),
        Err(GatewayError::InsufficientScope { ref missing }) if missing == "admin"
    ));
    assert!(ScopePolicy::authenticated().check(&ScopeSet::new()).is_ok());
}

// ── Registration input ────────────────────────────────────────────────────────

#[test]
fn name_length_bounds() {
    let gw = gateway();
    assert!(gw
        .register(RegisterRequest::new("abc", "password123"))
        .is_ok());
    assert!(gw
        .register(RegisterRequest::new("n".repeat(50), "password123"))
        .is_ok());
    assert!(matches!(
        gw.register(RegisterRequest::new("ab", "password123")),
        Err(GatewayError::Validation(_))
    ));
    assert!(matches!(
        gw.register(RegisterRequest::new("n".repeat(51), "password123")),
        Err(GatewayError::Validation(_))
    ));
}

#[test]
fn multibyte_names_count_characters() {
    let gw = gateway();
    // Three characters, nine bytes.
    assert!(gw
        .register(RegisterRequest::new("ロボト", "password123"))
        .is_ok());
    assert!(gw.login("ロボト", "password123").is_ok());
}

#[test]
fn password_length_bound() {
    let gw = gateway();
    assert!(matches!(
        gw.register(RegisterRequest::new("short-pw", "1234567")),
        Err(GatewayError::Validation(_))
    ));
    assert!(gw
        .register(RegisterRequest::new("exact-pw", "12345678"))
        .is_ok());
}

#[test]
fn explicit_empty_scope_set_is_kept() {
    let gw = gateway();
    let profile = gw
        .register(RegisterRequest::new("no-scopes", "password123").with_scopes(Vec::<String>::new()))
        .unwrap();
    assert!(profile.scopes.is_empty());

    let token = gw.login("no-scopes", "password123").unwrap();
    let agent = gw.resolve_token(&token.access_token).unwrap();
    assert!(gw.authorize(&agent, &ScopePolicy::authenticated()).is_ok());
    assert!(gw
        .authorize(&agent, &ScopePolicy::require(["read"]))
        .is_err());
}

#[test]
fn names_are_case_sensitive() {
    let gw = gateway();
    gw.register(RegisterRequest::new("CaseBot", "password123"))
        .unwrap();
    assert!(matches!(
        gw.login("casebot", "password123"),
        Err(GatewayError::InvalidCredentials)
    ));
    assert!(gw
        .register(RegisterRequest::new("casebot", "password123"))
        .is_ok());
}

#[test]
fn register_request_debug_hides_password() {
    let request = RegisterRequest::new("debug-bot", "super-secret-pw");
    let shown = format!("{request:?}");
    assert!(shown.contains("debug-bot"));
    assert!(!shown.contains("super-secret-pw"));
}
