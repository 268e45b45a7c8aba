use super::*;
use crate::model::UserId;

#[test]
fn error_detail_unwraps_the_backend_envelope() {
    assert_eq!(error_detail("{\"detail\": \"Mask not found\"}"), "Mask not found");
}

#[test]
fn error_detail_falls_back_to_the_raw_body() {
    assert_eq!(error_detail("  plain text  "), "plain text");
    assert_eq!(error_detail("{\"other\": 1}"), "{\"other\": 1}");
}

#[test]
fn submission_fields_preserve_repeated_field_order() {
    let submission = MaskSubmission {
        mask_name: "Ticker".to_string(),
        title: Some("Ticker".to_string()),
        description: None,
        site_urls: vec!["https://a.test".to_string(), "https://b.test".to_string()],
        api_keys: vec!["k1".to_string()],
    };

    let fields = submission_fields(&submission, Some(&UserId("42".to_string())));
    let pairs: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
    assert_eq!(
        pairs,
        [
            ("mask_name", "Ticker"),
            ("user_id", "42"),
            ("title", "Ticker"),
            ("site_url", "https://a.test"),
            ("site_url", "https://b.test"),
            ("api_keys", "k1"),
        ]
    );
}

#[test]
fn updates_never_carry_a_user_id_field() {
    let submission = MaskSubmission {
        mask_name: "Ticker".to_string(),
        ..MaskSubmission::default()
    };
    let fields = submission_fields(&submission, None);
    assert!(fields.iter().all(|(k, _)| *k != "user_id"));
}
