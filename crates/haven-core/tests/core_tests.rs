//! Tests for haven-core: session state wire form, protocol, config, errors

use haven_core::*;

// ===========================================================================
// Mode
// ===========================================================================

#[test]
fn mode_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Mode::Friend).unwrap(), r#""friend""#);
    assert_eq!(serde_json::to_string(&Mode::Romantic).unwrap(), r#""romantic""#);
    assert_eq!(serde_json::to_string(&Mode::Explicit).unwrap(), r#""explicit""#);
}

#[test]
fn mode_accepts_legacy_aliases() {
    let m: Mode = serde_json::from_str(r#""intimate""#).unwrap();
    assert_eq!(m, Mode::Explicit);
    let m: Mode = serde_json::from_str(r#""romance""#).unwrap();
    assert_eq!(m, Mode::Romantic);
}

#[test]
fn mode_parse_is_case_insensitive() {
    assert_eq!(Mode::parse("  Romantic "), Some(Mode::Romantic));
    assert_eq!(Mode::parse("EXPLICIT"), Some(Mode::Explicit));
    assert_eq!(Mode::parse("18+"), Some(Mode::Explicit));
    assert_eq!(Mode::parse("spicy"), None);
    assert!("nope".parse::<Mode>().is_err());
    assert_eq!("friend".parse::<Mode>().unwrap(), Mode::Friend);
}

#[test]
fn mode_rank_orders_tiers() {
    assert!(Mode::Friend.rank() < Mode::Romantic.rank());
    assert!(Mode::Romantic.rank() < Mode::Explicit.rank());
}

#[test]
fn mode_prerequisites() {
    assert!(Mode::Friend.prerequisites().is_empty());
    assert_eq!(Mode::Romantic.prerequisites(), &[ConsentKind::Romance]);
    assert_eq!(
        Mode::Explicit.prerequisites(),
        &[ConsentKind::Adult, ConsentKind::Explicit]
    );
}

#[test]
fn mode_request_hint_mentions_mode() {
    for mode in Mode::ALL {
        let hint = mode.request_hint();
        assert!(hint.to_lowercase().contains(mode.as_str()), "{}", hint);
    }
}

// ===========================================================================
// ConsentKind
// ===========================================================================

#[test]
fn consent_kind_implied_mode() {
    assert_eq!(ConsentKind::Romance.implied_mode(), Mode::Romantic);
    assert_eq!(ConsentKind::Adult.implied_mode(), Mode::Explicit);
    assert_eq!(ConsentKind::Explicit.implied_mode(), Mode::Explicit);
}

#[test]
fn consent_kind_grant_sets_only_its_flag() {
    let mut s = SessionState::new();
    ConsentKind::Adult.grant(&mut s);
    assert!(s.adult_verified);
    assert!(!s.explicit_consented);
    assert!(!s.romance_consented);
    assert!(ConsentKind::Adult.is_granted(&s));
    assert!(!ConsentKind::Explicit.is_granted(&s));
}

// ===========================================================================
// SessionState wire form
// ===========================================================================

#[test]
fn session_state_empty_object_is_fresh_state() {
    let s: SessionState = serde_json::from_str("{}").unwrap();
    assert_eq!(s, SessionState::new());
}

#[test]
fn session_state_nulls_default() {
    let s: SessionState = serde_json::from_str(
        r#"{"mode": null, "adult_verified": null, "romance_consented": null,
            "explicit_consented": null, "pending_consent": null}"#,
    )
    .unwrap();
    assert_eq!(s, SessionState::new());
}

#[test]
fn session_state_pending_none_string() {
    let s: SessionState = serde_json::from_str(r#"{"pending_consent": "none"}"#).unwrap();
    assert!(s.pending_consent.is_none());
}

#[test]
fn session_state_unknown_values_fall_back() {
    let s: SessionState = serde_json::from_str(
        r#"{"mode": "spicy", "pending_consent": "whatever", "plan_name": "gold"}"#,
    )
    .unwrap();
    assert_eq!(s.mode, Mode::Friend);
    assert!(s.pending_consent.is_none());
}

#[test]
fn session_state_full_parse() {
    let s: SessionState = serde_json::from_str(
        r#"{"mode": "intimate", "adult_verified": true, "romance_consented": false,
            "explicit_consented": true, "pending_consent": null,
            "model": "gpt-4o", "companion": "Ava-Female-Latina-Millennial"}"#,
    )
    .unwrap();
    assert_eq!(s.mode, Mode::Explicit);
    assert!(s.adult_verified && s.explicit_consented);
    assert_eq!(s.model.as_deref(), Some("gpt-4o"));
    assert_eq!(s.companion.as_deref(), Some("Ava-Female-Latina-Millennial"));
    assert!(s.is_consistent());
}

#[test]
fn session_state_serializes_flat() {
    let s = SessionState {
        pending_consent: Some(ConsentKind::Romance),
        ..SessionState::new()
    };
    let v = serde_json::to_value(&s).unwrap();
    assert_eq!(v["mode"], "friend");
    assert_eq!(v["adult_verified"], false);
    assert_eq!(v["pending_consent"], "romance");
    assert!(v.get("model").is_none());
    assert!(v.get("companion").is_none());
}

#[test]
fn session_state_pending_null_on_wire() {
    let v = serde_json::to_value(SessionState::new()).unwrap();
    assert!(v["pending_consent"].is_null());
}

#[test]
fn session_state_model_carried_through() {
    let s = SessionState::new().with_model("claude-haiku-4-5");
    let json = serde_json::to_string(&s).unwrap();
    let back: SessionState = serde_json::from_str(&json).unwrap();
    assert_eq!(back.model.as_deref(), Some("claude-haiku-4-5"));
}

// ===========================================================================
// SessionState invariants
// ===========================================================================

#[test]
fn romantic_without_consent_is_inconsistent() {
    let s = SessionState {
        mode: Mode::Romantic,
        ..SessionState::new()
    };
    assert!(!s.is_consistent());
    let h = s.healed();
    assert_eq!(h.mode, Mode::Friend);
    assert!(h.is_consistent());
}

#[test]
fn explicit_needs_adult_verification_too() {
    let s = SessionState {
        mode: Mode::Explicit,
        explicit_consented: true,
        ..SessionState::new()
    };
    assert!(!s.is_consistent());
    assert_eq!(s.healed().mode, Mode::Friend);
}

#[test]
fn healed_keeps_authorized_mode() {
    let s = SessionState {
        mode: Mode::Romantic,
        romance_consented: true,
        ..SessionState::new()
    };
    assert_eq!(s.healed(), s);
}

#[test]
fn healed_clears_pending_whose_flag_is_set() {
    let s = SessionState {
        romance_consented: true,
        pending_consent: Some(ConsentKind::Romance),
        ..SessionState::new()
    };
    let h = s.healed();
    assert!(h.pending_consent.is_none());
    assert!(h.romance_consented);
}

#[test]
fn healed_pending_explicit_without_adult_asks_adult_first() {
    let s = SessionState {
        pending_consent: Some(ConsentKind::Explicit),
        ..SessionState::new()
    };
    assert!(!s.is_consistent());
    assert_eq!(s.healed().pending_consent, Some(ConsentKind::Adult));
}

#[test]
fn healed_never_touches_flags_or_opaque_fields() {
    let s = SessionState {
        mode: Mode::Explicit,
        adult_verified: true,
        romance_consented: true,
        ..SessionState::new()
    }
    .with_model("gpt-4o")
    .with_companion("Haven");
    let h = s.healed();
    assert!(h.adult_verified && h.romance_consented && !h.explicit_consented);
    assert_eq!(h.model, s.model);
    assert_eq!(h.companion, s.companion);
}

// ===========================================================================
// Protocol
// ===========================================================================

#[test]
fn chat_request_minimal_body() {
    let req: ChatRequest = serde_json::from_str(r#"{"text": "hi"}"#).unwrap();
    assert_eq!(req.text, "hi");
    assert_eq!(req.session_state, SessionState::new());
    assert!(req.history.is_empty());
}

#[test]
fn chat_request_missing_text_rejected() {
    assert!(serde_json::from_str::<ChatRequest>(r#"{"history": []}"#).is_err());
}

#[test]
fn chat_request_history_roles() {
    let req: ChatRequest = serde_json::from_str(
        r#"{"text": "and you?", "history": [
            {"role": "user", "content": "hi"},
            {"role": "assistant", "content": "hello"}
        ]}"#,
    )
    .unwrap();
    assert_eq!(req.history, vec![Message::user("hi"), Message::assistant("hello")]);
}

#[test]
fn chat_request_accepts_system_entries() {
    let req: ChatRequest = serde_json::from_str(
        r#"{"text": "hi", "history": [{"role": "system", "content": "be brief"}]}"#,
    )
    .unwrap();
    assert_eq!(req.history[0].role, Role::System);
    assert_eq!(Role::System.as_str(), "system");
}

#[test]
fn chat_response_shape() {
    let resp = ChatResponse {
        reply: "ok".into(),
        session_state: SessionState::new(),
    };
    let v = serde_json::to_value(&resp).unwrap();
    assert_eq!(v["reply"], "ok");
    assert_eq!(v["session_state"]["mode"], "friend");
}

#[test]
fn error_body_shape() {
    let v = serde_json::to_value(ErrorBody::new("boom")).unwrap();
    assert_eq!(v, serde_json::json!({ "error": "boom" }));
}

// ===========================================================================
// Config
// ===========================================================================

#[test]
fn config_defaults() {
    let c = HavenConfig::default();
    assert_eq!(c.gateway.bind, BindMode::Lan);
    assert_eq!(c.llm.default_model, "gpt-4o");
    assert_eq!(c.conversation.history_window, 6);
    assert!(c.consent.affirmative.iter().any(|w| w == "yes"));
    assert!(c.consent.negative.iter().any(|w| w == "no"));
    assert!(c.consent.implicit_escalation);
}

#[test]
fn config_partial_toml() {
    let c: HavenConfig = toml::from_str(
        r#"
        [gateway]
        port = 9000
        bind = "loopback"

        [consent]
        implicit_escalation = false
        "#,
    )
    .unwrap();
    assert_eq!(c.gateway.port, 9000);
    assert_eq!(c.gateway.bind, BindMode::Loopback);
    assert!(!c.consent.implicit_escalation);
    assert!(!c.consent.affirmative.is_empty());
    assert_eq!(c.llm.max_tokens, 400);
}

#[test]
fn config_load_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let c = HavenConfig::load(&dir.path().join("absent.toml"));
    assert_eq!(c.gateway.port, GatewayConfig::default().port);
}

#[test]
fn config_load_garbage_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("haven.toml");
    std::fs::write(&path, "this is [not toml").unwrap();
    let c = HavenConfig::load(&path);
    assert_eq!(c.llm.default_model, "gpt-4o");
}

#[test]
fn config_to_toml_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("haven.toml");
    let mut c = HavenConfig::default();
    c.gateway.port = 4242;
    std::fs::write(&path, c.to_toml()).unwrap();
    assert_eq!(HavenConfig::load(&path).gateway.port, 4242);
}

#[test]
fn bind_mode_parse() {
    assert_eq!(BindMode::parse("localhost"), BindMode::Loopback);
    assert_eq!(BindMode::parse("lan"), BindMode::Lan);
    assert_eq!(BindMode::Loopback.to_addr(), "127.0.0.1");
}

// ===========================================================================
// Error
// ===========================================================================

#[test]
fn error_display() {
    let e = Error::generation("openai", "500: boom");
    assert_eq!(e.to_string(), "reply generation failed: openai - 500: boom");
    assert!(e.is_upstream());
    assert!(!Error::invalid_request("empty").is_upstream());
}

#[test]
fn try_load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = HavenConfig::try_load(&dir.path().join("absent.toml")).unwrap_err();
    match err {
        Error::IoError(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn try_load_reports_malformed_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("haven.toml");
    std::fs::write(&path, "this is [not toml").unwrap();
    let err = HavenConfig::try_load(&path).unwrap_err();
    assert!(matches!(err, Error::ConfigError(_)));
    assert!(err.to_string().contains("haven.toml"));
    assert!(!err.is_upstream());
}
