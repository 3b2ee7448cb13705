use std::sync::Arc;

use fkscan::discovery::{
    is_type_compatible, IdentifierPattern, KeyClassifier, NamingConventions, SuffixPattern,
    ASSUMED_CANDIDATE_UNIQUENESS,
};
use fkscan::ignore::{IgnoreDocument, IgnoreRules, NoIgnore};
use fkscan::model::{ColumnInfo, KeyType, TableMetadata};

fn table(name: &str, columns: &[(&str, &str)]) -> TableMetadata {
    TableMetadata {
        schema: "SALES".to_string(),
        name: name.to_string(),
        row_count: 1000,
        columns: columns
            .iter()
            .map(|(n, t)| ColumnInfo::new(*n, *t))
            .collect(),
        ..Default::default()
    }
}

fn key_names(keys: &[fkscan::discovery::ParentKeyCandidate]) -> Vec<(&str, KeyType)> {
    keys.iter()
        .map(|k| (k.column.name.as_str(), k.key_type))
        .collect()
}

#[test]
fn test_primary_key_wins_over_heuristics() {
    let mut customers = table(
        "CUSTOMERS",
        &[("ID", "INTEGER"), ("REGION_ID", "INTEGER"), ("NAME", "VARCHAR")],
    );
    customers.primary_key = vec!["ID".to_string()];

    let naming = NamingConventions::default();
    let keys = KeyClassifier::new(&NoIgnore, &naming).parent_keys(&customers);

    assert_eq!(key_names(&keys), vec![("ID", KeyType::PrimaryKey)]);
    assert_eq!(keys[0].uniqueness_ratio, 1.0);
}

#[test]
fn test_unique_constraints_follow_primary_key() {
    let mut products = table(
        "PRODUCTS",
        &[("ID", "INTEGER"), ("SKU", "VARCHAR"), ("EAN", "VARCHAR")],
    );
    products.primary_key = vec!["ID".to_string()];
    products.unique_keys = vec![vec!["SKU".to_string()], vec!["EAN".to_string()]];

    let naming = NamingConventions::default();
    let keys = KeyClassifier::new(&NoIgnore, &naming).parent_keys(&products);

    assert_eq!(
        key_names(&keys),
        vec![
            ("ID", KeyType::PrimaryKey),
            ("SKU", KeyType::UniqueConstraint),
            ("EAN", KeyType::UniqueConstraint),
        ]
    );
}

#[test]
fn test_heuristic_keys_only_without_declared_keys() {
    let staging = table(
        "STAGING",
        &[("BATCH_ID", "INTEGER"), ("row_id", "INTEGER"), ("PAYLOAD", "VARCHAR")],
    );

    let naming = NamingConventions::default();
    let keys = KeyClassifier::new(&NoIgnore, &naming).parent_keys(&staging);

    assert_eq!(
        key_names(&keys),
        vec![
            ("BATCH_ID", KeyType::CandidateKey),
            ("row_id", KeyType::CandidateKey)
        ]
    );
    assert!(keys
        .iter()
        .all(|k| k.uniqueness_ratio == ASSUMED_CANDIDATE_UNIQUENESS));
}

#[test]
fn test_keyless_table() {
    let audit = table("AUDIT", &[("WHEN", "TIMESTAMP"), ("WHAT", "VARCHAR")]);
    let naming = NamingConventions::default();
    assert!(KeyClassifier::new(&NoIgnore, &naming)
        .parent_keys(&audit)
        .is_empty());
}

#[test]
fn test_child_columns_in_column_order() {
    let orders = table(
        "ORDERS",
        &[
            ("ID", "INTEGER"),
            ("STORE_FK", "INTEGER"),
            ("CUSTOMER_ID", "INTEGER"),
            ("NOTE", "VARCHAR"),
        ],
    );

    let naming = NamingConventions::default();
    let children: Vec<_> = KeyClassifier::new(&NoIgnore, &naming)
        .child_columns(&orders)
        .into_iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(children, vec!["STORE_FK", "CUSTOMER_ID"]);
}

#[test]
fn test_ignored_columns_are_never_classified() {
    let doc: IgnoreDocument = serde_json::from_str(
        r#"{
            "ignoreColumns": [{"schema": "*", "table": "ORDERS", "name": "LEGACY_ID"}],
            "ignoreColumnPatterns": ["^TMP_"]
        }"#,
    )
    .unwrap();
    let rules = IgnoreRules::from_document(&doc).unwrap();

    let orders = table(
        "ORDERS",
        &[
            ("LEGACY_ID", "INTEGER"),
            ("TMP_CUSTOMER_ID", "INTEGER"),
            ("CUSTOMER_ID", "INTEGER"),
        ],
    );

    let naming = NamingConventions::default();
    let classifier = KeyClassifier::new(&rules, &naming);

    let children: Vec<_> = classifier
        .child_columns(&orders)
        .into_iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(children, vec!["CUSTOMER_ID"]);

    let keys = classifier.parent_keys(&orders);
    assert_eq!(key_names(&keys), vec![("CUSTOMER_ID", KeyType::CandidateKey)]);
}

/// Columns named `FK_<table>` reference another table.
struct PrefixPattern(&'static str);

impl IdentifierPattern for PrefixPattern {
    fn matches(&self, column: &str) -> bool {
        column.to_uppercase().starts_with(self.0)
    }
}

#[test]
fn test_custom_naming_convention() {
    let naming = NamingConventions {
        parent_key: Arc::new(SuffixPattern::new(["_KEY"])),
        child_column: Arc::new(PrefixPattern("FK_")),
    };

    let t = table(
        "LINES",
        &[("LINE_KEY", "INTEGER"), ("FK_ORDERS", "INTEGER"), ("ORDER_ID", "INTEGER")],
    );
    let classifier = KeyClassifier::new(&NoIgnore, &naming);

    assert_eq!(
        key_names(&classifier.parent_keys(&t)),
        vec![("LINE_KEY", KeyType::CandidateKey)]
    );
    let children: Vec<_> = classifier
        .child_columns(&t)
        .into_iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(children, vec!["FK_ORDERS"]);
}

#[test]
fn test_type_compatibility_rules() {
    let int = ColumnInfo::new("CUSTOMER_ID", "INTEGER");
    let numeric = ColumnInfo::new("ID", "NUMERIC").with_length(10).with_scale(0);
    let short = ColumnInfo::new("CODE_ID", "VARCHAR").with_length(8);
    let long = ColumnInfo::new("CODE", "VARCHAR").with_length(16);
    let date = ColumnInfo::new("DAY_ID", "DATE");

    assert!(is_type_compatible(&int, &numeric));
    assert!(is_type_compatible(&short, &long));
    assert!(!is_type_compatible(&long, &short));
    assert!(!is_type_compatible(&int, &short));
    assert!(is_type_compatible(&date, &ColumnInfo::new("D", "DATE")));
    assert!(!is_type_compatible(&date, &int));
}
