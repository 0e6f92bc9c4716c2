// Property-based tests for driver invariants

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::StubFactory;
use proptest::prelude::*;
use rdbpipe_core::{ConnectionSettings, Driver, RdbErrorKind};
use serde_json::Value;

fn non_mapping_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        ".*".prop_map(Value::from),
        prop::collection::vec(any::<i64>(), 0..4).prop_map(Value::from),
    ]
}

fn table_name() -> impl Strategy<Value = String> {
    "[a-z_]{1,8}"
}

proptest! {
    #[test]
    fn non_mapping_settings_are_invalid(settings in non_mapping_value()) {
        let factory = StubFactory::default();
        let err = Driver::from_value(factory.clone(), settings).err().unwrap();

        prop_assert_eq!(err.kind(), RdbErrorKind::InvalidArgument);
        prop_assert_eq!(factory.connects(), 0);
    }

    #[test]
    fn table_exists_iff_listed(
        tables in prop::collection::vec(table_name(), 0..6),
        name in table_name(),
    ) {
        let listed: Vec<&str> = tables.iter().map(String::as_str).collect();
        let factory = StubFactory::with_tables(&listed);
        let driver = Driver::new(factory.clone(), ConnectionSettings::new());

        prop_assert_eq!(driver.table_exists(&name).unwrap(), tables.contains(&name));
        prop_assert_eq!(factory.table_list_queries(), 1);
    }

    #[test]
    fn get_table_fails_iff_absent(
        tables in prop::collection::vec(table_name(), 0..6),
        name in table_name(),
    ) {
        let listed: Vec<&str> = tables.iter().map(String::as_str).collect();
        let factory = StubFactory::with_tables(&listed);
        let driver = Driver::new(factory.clone(), ConnectionSettings::new());

        match driver.get_table(&name) {
            Ok(table) => {
                prop_assert!(tables.contains(&name));
                prop_assert_eq!(table.name(), name.as_str());
            }
            Err(err) => {
                prop_assert!(!tables.contains(&name));
                prop_assert_eq!(err.kind(), RdbErrorKind::TableNotFound);
            }
        }
        prop_assert_eq!(factory.table_list_queries(), 1);
    }

    #[test]
    fn factory_runs_once_per_driver(accesses in 1usize..20) {
        let factory = StubFactory::default();
        let driver = Driver::new(factory.clone(), ConnectionSettings::new());

        for _ in 0..accesses {
            driver.connection().unwrap();
        }
        prop_assert_eq!(factory.connects(), 1);
    }
}
