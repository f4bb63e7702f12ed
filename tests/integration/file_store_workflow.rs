//! Full gateway workflow over the file-backed store, including reopening
//! the store between steps.

use std::time::Duration;

use agent_gateway::{
    scope_set, CredentialStore, FileStore, Gateway, GatewayConfig, GatewayError, HasherParams,
    RegisterRequest, ScopePolicy, TokenAlgorithm,
};

fn config(secret: &str, algorithm: TokenAlgorithm) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.secret_key = secret.to_string();
    config.algorithm = algorithm;
    config.hasher = HasherParams {
        m_cost: 256,
        t_cost: 1,
        p_cost: 1,
    };
    config
}

fn open(dir: &std::path::Path, algorithm: TokenAlgorithm) -> Gateway<FileStore> {
    let store = FileStore::new(dir).expect("store opens");
    Gateway::from_config(&config("file-secret", algorithm), store).expect("gateway builds")
}

#[test]
fn tokens_survive_gateway_restart() {
    let dir = tempfile::tempdir().unwrap();

    let token = {
        let gw = open(dir.path(), TokenAlgorithm::Hs256);
        gw.register(
            RegisterRequest::new("persisted-bot", "password123")
                .with_scopes(["read", "write"])
                .with_description("writes reports"),
        )
        .unwrap();
        gw.login("persisted-bot", "password123").unwrap()
    };

    let gw = open(dir.path(), TokenAlgorithm::Hs256);
    let agent = gw.resolve_token(&token.access_token).unwrap();
    assert_eq!(agent.profile.name, "persisted-bot");
    assert_eq!(agent.profile.description.as_deref(), Some("writes reports"));
    assert!(agent.profile.last_auth_at.is_some());
    assert!(gw
        .authorize(&agent, &ScopePolicy::require(["read", "write"]))
        .is_ok());
}

#[test]
fn eddsa_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let gw = open(dir.path(), TokenAlgorithm::EdDsa);
    gw.register(RegisterRequest::new("signing-bot", "password123"))
        .unwrap();
    let token = gw.login("signing-bot", "password123").unwrap();
    assert_eq!(gw.codec().algorithm(), TokenAlgorithm::EdDsa);

    let agent = gw.resolve_token(&token.access_token).unwrap();
    assert_eq!(agent.scopes, scope_set(["read"]));

    // A gateway on the other algorithm refuses the token.
    let hs = open(dir.path(), TokenAlgorithm::Hs256);
    assert!(matches!(
        hs.resolve_token(&token.access_token),
        Err(GatewayError::InvalidCredential(_))
    ));
}

#[test]
fn deactivation_persists() {
    let dir = tempfile::tempdir().unwrap();
    let id = {
        let gw = open(dir.path(), TokenAlgorithm::Hs256);
        let profile = gw
            .register(RegisterRequest::new("sleepy-bot", "password123"))
            .unwrap();
        gw.deactivate(&profile.id).unwrap();
        profile.id
    };

    let gw = open(dir.path(), TokenAlgorithm::Hs256);
    assert!(matches!(
        gw.login("sleepy-bot", "password123"),
        Err(GatewayError::Deactivated)
    ));
    gw.reactivate(&id).unwrap();
    assert!(gw.login("sleepy-bot", "password123").is_ok());
}

#[test]
fn duplicate_name_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    open(dir.path(), TokenAlgorithm::Hs256)
        .register(RegisterRequest::new("only-one", "password123"))
        .unwrap();

    let gw = open(dir.path(), TokenAlgorithm::Hs256);
    let err = gw
        .register(RegisterRequest::new("only-one", "password456"))
        .unwrap_err();
    assert!(matches!(err, GatewayError::Conflict(_)));
    assert_eq!(gw.store().list().unwrap().len(), 1);
}

#[test]
fn stored_record_never_holds_plaintext() {
    let dir = tempfile::tempdir().unwrap();
    let gw = open(dir.path(), TokenAlgorithm::Hs256);
    let profile = gw
        .register(RegisterRequest::new("secretive", "hunter2-hunter2"))
        .unwrap();

    let raw = std::fs::read_to_string(
        dir.path()
            .join("records")
            .join(format!("{}.json", profile.id)),
    )
    .unwrap();
    assert!(!raw.contains("hunter2-hunter2"));
    assert!(raw.contains("$argon2id$"));
    assert!(raw.contains("\"version\": 1"));
}

#[test]
fn short_ttl_expires() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();
    let mut cfg = config("file-secret", TokenAlgorithm::Hs256);
    cfg.access_token_expire_minutes = 1;
    let gw = Gateway::from_config(&cfg, store).unwrap();
    assert_eq!(gw.token_ttl(), Duration::from_secs(60));

    gw.register(RegisterRequest::new("brief-bot", "password123"))
        .unwrap();
    let token = gw.login("brief-bot", "password123").unwrap();
    assert_eq!(token.expires_in, 60);

    let claims = gw.codec().validate(&token.access_token).unwrap();
    assert!(gw
        .codec()
        .validate_at(&token.access_token, claims.expiry)
        .is_err());
}
