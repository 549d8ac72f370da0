use super::*;

#[test]
fn record_id_is_short_hex() {
    let id = new_record_id(|_| false);
    assert_eq!(id.len(), RECORD_ID_LEN);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn record_id_avoids_taken_ids() {
    let first = new_record_id(|_| false);
    let second = new_record_id(|candidate| candidate == first);
    assert_ne!(first, second);
}

#[test]
fn non_blank_trims() {
    assert_eq!(non_blank("  Tea "), Some("Tea".to_owned()));
    assert_eq!(non_blank("   "), None);
}

#[test]
fn round_money_to_cents() {
    assert!((round_money(59.699_999_999) - 59.7).abs() < f64::EPSILON);
    assert!((round_money(0.125) - 0.13).abs() < 1e-9);
}
