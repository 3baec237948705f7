//! Property tests for the built-in migration strategies

use cvdata_core::migration::{MigrationRegistry, apply_strategy};
use cvdata_meta::SchemaVersion;
use proptest::prelude::*;
use serde_json::json;

proptest! {
    #[test]
    fn forward_chain_keeps_name_and_lowercases_email(
        name in "[A-Za-z][A-Za-z ]{1,40}",
        user in "[A-Za-z0-9.]{1,12}",
        domain in "[A-Za-z]{1,10}",
    ) {
        let registry = MigrationRegistry::with_builtins();
        let email = format!(" {user}@{domain}.COM ");
        let mut doc = json!({
            "personal_info": {"name": name},
            "contact_info": {"email": email},
            "experience": [],
            "skills": ["Rust"]
        });

        let route = registry
            .calculate_migration_path(&SchemaVersion::oldest(), &SchemaVersion::current())
            .unwrap();
        for step in &route {
            apply_strategy(&mut doc, registry.require(step).unwrap()).unwrap();
        }

        prop_assert_eq!(&doc["profile"]["personal"]["name"], &json!(name));
        let expected = format!("{user}@{domain}.com").to_lowercase();
        prop_assert_eq!(&doc["profile"]["contact"]["email"], &json!(expected));
    }
}
