use super::*;

#[test]
fn string_id_passes_through_untouched() {
    let id: MaskId = serde_json::from_str("\"7\"").expect("parse");
    assert_eq!(id.as_str(), "7");
}

#[test]
fn numeric_id_becomes_its_exact_decimal_string() {
    // 2^53 + 1: silently corrupted by any f64 round-trip.
    let id: MaskId = serde_json::from_str("9007199254740993").expect("parse");
    assert_eq!(id.as_str(), "9007199254740993");
}

#[test]
fn u64_max_survives() {
    let id: UserId = serde_json::from_str("18446744073709551615").expect("parse");
    assert_eq!(id.as_str(), "18446744073709551615");
}

#[test]
fn float_ids_are_refused_not_rounded() {
    assert!(serde_json::from_str::<MaskId>("7.5").is_err());
}

#[test]
fn serializes_back_as_a_string() {
    let id = MaskId("9007199254740993".to_string());
    assert_eq!(
        serde_json::to_string(&id).expect("serialize"),
        "\"9007199254740993\""
    );
}
