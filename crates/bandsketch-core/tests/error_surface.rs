use bandsketch_core::errors::{BandError, ErrorInfo};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .for_band(2)
        .at(0.5)
}

#[test]
fn input_error_surface() {
    let err = BandError::Input(sample_info("band-out-of-range", "band index out of range"));
    assert_eq!(err.code(), "band-out-of-range");
    assert_eq!(err.info().context.get("band").map(String::as_str), Some("2"));
}

#[test]
fn domain_error_surface() {
    let err = BandError::domain("outside-domain", "momentum outside sampling interval");
    assert!(matches!(err, BandError::Domain(_)));
    assert!(err.to_string().starts_with("domain error: [outside-domain] momentum outside"));
}

#[test]
fn hint_and_context_render() {
    let err = BandError::Shape(
        sample_info("shape-mismatch", "lengths differ").with_hint("check the evaluator"),
    );
    let rendered = err.to_string();
    assert!(rendered.contains("[shape-mismatch] lengths differ at k=0.5 (band=2)"), "{rendered}");
    assert!(rendered.ends_with("; hint: check the evaluator"));
}

#[test]
fn errors_roundtrip_through_json() {
    let err = BandError::Assignment(sample_info("no-matching", "infeasible"));
    let json = serde_json::to_string(&err).expect("serialize");
    assert!(json.contains("\"family\":\"Assignment\""));
    let back: BandError = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, err);
}
