use super::*;
use crate::model::{OrderItem, OrderStatus};

fn sample() -> Collections {
    Collections {
        products: vec![Product {
            id: "p1".into(),
            name: "Jasmine tea".into(),
            price: 19.9,
            unit: "tin".into(),
            stock: None,
            description: "spring harvest".into(),
            created_at: 1_700_000_000_000,
        }],
        customers: vec![Customer {
            id: "c1".into(),
            name: "Mei".into(),
            phone: "555-0101".into(),
            address: "22 Hill St".into(),
            note: String::new(),
            created_at: 1_700_000_000_000,
        }],
        orders: vec![Order {
            id: "o1".into(),
            customer_id: "c1".into(),
            customer_name: "Mei".into(),
            items: vec![OrderItem { product_id: "p1".into(), product_name: "Jasmine tea".into(), price: 19.9, quantity: 3 }],
            total: 59.7,
            status: OrderStatus::Shipped,
            note: "leave at door".into(),
            created_at: 1_700_000_000_500,
        }],
    }
}

// =============================================================================
// export
// =============================================================================

#[test]
fn capture_contains_all_collections_and_metadata() {
    let backup = Backup::capture(&sample(), 1_700_000_001_000);
    let json: Value = serde_json::from_str(&backup.to_json_pretty().unwrap()).unwrap();
    for key in ["products", "customers", "orders"] {
        assert!(json[key].is_array(), "{key}");
    }
    assert_eq!(json["version"], BACKUP_VERSION);
    assert_eq!(json["timestamp"], 1_700_000_001_000_i64);
}

#[test]
fn capture_of_empty_state_still_has_every_field() {
    let backup = Backup::capture(&Collections::default(), 0);
    let json: Value = serde_json::from_str(&backup.to_json_pretty().unwrap()).unwrap();
    assert_eq!(json["products"], serde_json::json!([]));
    assert_eq!(json["customers"], serde_json::json!([]));
    assert_eq!(json["orders"], serde_json::json!([]));
}

#[test]
fn pretty_output_is_indented() {
    let text = Backup::capture(&Collections::default(), 0).to_json_pretty().unwrap();
    assert!(text.contains("\n  \"products\""));
}

#[test]
fn file_name_is_date_stamped() {
    assert_eq!(backup_file_name("orderdesk_backup", 1_709_251_200_000), "orderdesk_backup_2024-03-01.json");
    assert_eq!(backup_file_name("备份", 0), "备份_1970-01-01.json");
}

#[test]
fn write_backup_creates_directory_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("backups");
    let backup = Backup::capture(&sample(), 1_709_251_200_000);
    let path = write_backup(&target, DEFAULT_BACKUP_PREFIX, &backup).unwrap();

    assert_eq!(path, target.join("orderdesk_backup_2024-03-01.json"));
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(parse_backup(&text).unwrap().collections, sample());
}

// =============================================================================
// restore
// =============================================================================

#[test]
fn export_then_parse_round_trips() {
    let collections = sample();
    let text = Backup::capture(&collections, 42).to_json_pretty().unwrap();
    let plan = parse_backup(&text).unwrap();
    assert_eq!(plan.collections, collections);
    assert_eq!(plan.version.as_deref(), Some(BACKUP_VERSION));
    assert_eq!(plan.timestamp, Some(42));
    assert_eq!(plan.skipped, 0);
}

#[test]
fn parse_non_json_is_malformed() {
    let err = parse_backup("definitely not json").unwrap_err();
    assert!(matches!(err, BackupError::Malformed(_)));
}

#[test]
fn parse_null_document_is_rejected() {
    assert!(matches!(parse_backup("null").unwrap_err(), BackupError::NullDocument));
    assert!(matches!(parse_backup("  null \n").unwrap_err(), BackupError::NullDocument));
}

#[test]
fn parse_non_object_has_no_collections() {
    for text in ["[1,2,3]", "\"text\"", "7", "true"] {
        let plan = parse_backup(text).unwrap();
        assert!(plan.collections.is_empty(), "{text}");
        assert_eq!(plan.skipped, 0, "{text}");
        assert_eq!(plan.version, None, "{text}");
    }
}

#[test]
fn parse_missing_collections_defaults_to_empty() {
    let plan = parse_backup(r#"{"version":"x"}"#).unwrap();
    assert!(plan.collections.is_empty());
    assert_eq!(plan.version.as_deref(), Some("x"));
    assert_eq!(plan.timestamp, None);
    assert_eq!(plan.skipped, 0);
}

#[test]
fn parse_null_collection_is_empty() {
    let plan = parse_backup(r#"{"products":null,"orders":[]}"#).unwrap();
    assert!(plan.collections.is_empty());
    assert_eq!(plan.skipped, 0);
}

#[test]
fn parse_skips_unreadable_records() {
    let text = r#"{
        "products": [{"id":"p1","name":"Tea","price":1.5}, {"id":"p2","price":"free"}, 7],
        "customers": {"not": "a list"},
        "orders": [{"id":"o1","status":"PAID"}]
    }"#;
    let plan = parse_backup(text).unwrap();
    assert_eq!(plan.collections.products.len(), 1);
    assert_eq!(plan.collections.products[0].id, "p1");
    assert!(plan.collections.customers.is_empty());
    assert_eq!(plan.collections.orders.len(), 1);
    assert_eq!(plan.skipped, 3);
}

#[test]
fn parse_accepts_float_timestamp_and_ignores_bad_version() {
    let plan = parse_backup(r#"{"version":3,"timestamp":1700000000000.0}"#).unwrap();
    assert_eq!(plan.version, None);
    assert_eq!(plan.timestamp, Some(1_700_000_000_000));
}

// =============================================================================
// files
// =============================================================================

#[test]
fn only_json_files_are_backups() {
    assert!(is_backup_file(Path::new("b.json")));
    assert!(is_backup_file(Path::new("dir/B.JSON")));
    assert!(!is_backup_file(Path::new("b.txt")));
    assert!(!is_backup_file(Path::new("json")));
}

#[tokio::test]
async fn read_backup_file_rejects_other_extensions() {
    let err = read_backup_file(Path::new("backup.csv")).await.unwrap_err();
    assert!(matches!(err, BackupError::NotJsonFile(_)));
}

#[tokio::test]
async fn read_backup_file_reads_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("b.json");
    std::fs::write(&path, "{}").unwrap();
    assert_eq!(read_backup_file(&path).await.unwrap(), "{}");
}

#[tokio::test]
async fn read_backup_file_missing_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_backup_file(&dir.path().join("gone.json")).await.unwrap_err();
    assert!(matches!(err, BackupError::Io { .. }));
}
