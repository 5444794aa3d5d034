//! The catalog command processor.
//!
//! Single entry point for executing structured statements against the
//! catalog. Every statement is validated end-to-end before any state
//! changes, the mutation is applied atomically under the catalog's lock,
//! and the storage bridge is notified of physically consequential drops
//! only after the catalog change has committed.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use seriesdb_catalog::CatalogError;
use seriesdb_catalog::catalog::Catalog;
use seriesdb_catalog::duration::format_duration;
use seriesdb_catalog::series::MeasurementMatcher;

use crate::bridge::StorageBridge;
use crate::predicate;
use crate::response::{QueryResponse, Row, Series, StatementResult};
use crate::statement::{Expr, Statement};
use crate::{Error, Result};

#[derive(Debug)]
pub struct CommandProcessor {
    catalog: Arc<Catalog>,
    bridge: Arc<dyn StorageBridge>,
}

impl CommandProcessor {
    pub fn new(catalog: Arc<Catalog>, bridge: Arc<dyn StorageBridge>) -> Self {
        Self { catalog, bridge }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Execute a batch of statements, producing one result per statement.
    /// A failing statement is reported in its own result slot and does not
    /// abort its siblings. `database` is the request-level database
    /// context used by series commands.
    pub fn execute(&self, statements: &[Statement], database: Option<&str>) -> QueryResponse {
        QueryResponse {
            results: statements
                .iter()
                .map(|statement| {
                    self.execute_statement(statement, database)
                        .unwrap_or_else(|e| StatementResult::error(e.to_string()))
                })
                .collect(),
        }
    }

    fn execute_statement(
        &self,
        statement: &Statement,
        database: Option<&str>,
    ) -> Result<StatementResult> {
        debug!(?statement, "execute statement");
        match statement {
            Statement::CreateDatabase {
                name,
                if_not_exists,
            } => {
                self.catalog.create_database(name, *if_not_exists)?;
                Ok(StatementResult::ok())
            }
            Statement::DropDatabase { name, if_exists } => {
                if self.catalog.drop_database(name, *if_exists)? {
                    self.bridge.on_database_dropped(name);
                }
                Ok(StatementResult::ok())
            }
            Statement::ShowDatabases => Ok(self.show_databases()),
            Statement::CreateRetentionPolicy {
                name,
                database,
                duration,
                replica_n,
                default,
            } => {
                self.catalog.create_retention_policy(
                    database, name, *duration, *replica_n, *default,
                )?;
                Ok(StatementResult::ok())
            }
            Statement::AlterRetentionPolicy {
                name,
                database,
                update,
            } => {
                self.catalog.alter_retention_policy(database, name, *update)?;
                Ok(StatementResult::ok())
            }
            Statement::DropRetentionPolicy { name, database } => {
                self.catalog.drop_retention_policy(database, name)?;
                Ok(StatementResult::ok())
            }
            Statement::ShowRetentionPolicies { database } => {
                self.show_retention_policies(database)
            }
            Statement::DropSeries { from, condition } => {
                self.drop_series(database, from, condition.as_ref())
            }
            Statement::ShowSeries => self.show_series(database),
        }
    }

    fn show_databases(&self) -> StatementResult {
        let values = self
            .catalog
            .list_databases()
            .into_iter()
            .map(|name| Row(vec![Value::from(name.as_ref())]))
            .collect();
        StatementResult::with_series(vec![Series {
            name: Some("databases".to_string()),
            tags: None,
            columns: vec!["name".to_string()],
            values,
        }])
    }

    fn show_retention_policies(&self, database: &str) -> Result<StatementResult> {
        let policies = self.catalog.retention_policies(database)?;
        let values = policies
            .into_iter()
            .map(|policy| {
                Row(vec![
                    Value::from(policy.name.as_ref()),
                    Value::from(format_duration(policy.duration)),
                    Value::from(policy.replica_n),
                    Value::from(policy.default),
                ])
            })
            .collect();
        Ok(StatementResult::with_series(vec![Series {
            name: None,
            tags: None,
            columns: ["name", "duration", "replicaN", "default"]
                .map(String::from)
                .to_vec(),
            values,
        }]))
    }

    fn drop_series(
        &self,
        database: Option<&str>,
        from: &MeasurementMatcher,
        condition: Option<&Expr>,
    ) -> Result<StatementResult> {
        let database = database.ok_or(Error::DatabaseNameRequired)?;
        let schema = self
            .catalog
            .db_schema(database)
            .ok_or_else(|| CatalogError::DatabaseNotFound(database.to_string()))?;

        // the condition is checked once, command-wide, before any series
        // is touched
        if let Some(condition) = condition {
            predicate::validate_condition(condition, &schema.series.tag_keys())?;
        }

        let dropped = self.catalog.drop_series(database, from, |tags| {
            condition.is_none_or(|condition| predicate::eval_condition(condition, tags))
        })?;
        for entry in &dropped {
            self.bridge
                .on_series_dropped(database, &entry.measurement, &entry.keys);
        }
        Ok(StatementResult::ok())
    }

    fn show_series(&self, database: Option<&str>) -> Result<StatementResult> {
        let database = database.ok_or(Error::DatabaseNameRequired)?;
        let schema = self
            .catalog
            .db_schema(database)
            .ok_or_else(|| CatalogError::DatabaseNotFound(database.to_string()))?;

        let mut blocks = Vec::new();
        for (measurement, series) in schema.series.measurements() {
            let tag_keys: Vec<&str> = series.tag_keys().into_iter().collect();
            let mut columns = vec!["_key".to_string()];
            columns.extend(tag_keys.iter().map(|key| key.to_string()));
            let values = series
                .iter()
                .map(|(key, tags)| {
                    let mut row = vec![Value::from(key.as_ref())];
                    for tag_key in &tag_keys {
                        row.push(Value::from(
                            tags.get(*tag_key).map(String::as_str).unwrap_or(""),
                        ));
                    }
                    Row(row)
                })
                .collect();
            blocks.push(Series {
                name: Some(measurement.to_string()),
                tags: None,
                columns,
                values,
            });
        }

        // no live series renders as an empty result object, not as an
        // empty series array
        if blocks.is_empty() {
            Ok(StatementResult::ok())
        } else {
            Ok(StatementResult::with_series(blocks))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    use seriesdb_catalog::series::TagSet;

    use crate::bridge::NoopStorageBridge;
    use crate::statement::BinaryOp;

    use super::*;

    #[derive(Debug, Default)]
    struct RecordingBridge {
        dropped_databases: Mutex<Vec<String>>,
        dropped_series: Mutex<Vec<(String, String, Vec<String>)>>,
    }

    impl StorageBridge for RecordingBridge {
        fn on_database_dropped(&self, database: &str) {
            self.dropped_databases.lock().push(database.to_string());
        }

        fn on_series_dropped(&self, database: &str, measurement: &str, keys: &[Arc<str>]) {
            self.dropped_series.lock().push((
                database.to_string(),
                measurement.to_string(),
                keys.iter().map(|k| k.to_string()).collect(),
            ));
        }
    }

    fn tags(pairs: &[(&str, &str)]) -> TagSet {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn processor_with_bridge() -> (CommandProcessor, Arc<RecordingBridge>) {
        let bridge = Arc::new(RecordingBridge::default());
        let processor = CommandProcessor::new(
            Arc::new(Catalog::new()),
            Arc::clone(&bridge) as Arc<dyn StorageBridge>,
        );
        (processor, bridge)
    }

    fn processor() -> CommandProcessor {
        CommandProcessor::new(Arc::new(Catalog::new()), Arc::new(NoopStorageBridge))
    }

    #[test_log::test]
    fn bridge_notified_after_database_drop_commits() {
        let (processor, bridge) = processor_with_bridge();
        processor.catalog().create_database("db0", false).unwrap();

        processor.execute(
            &[Statement::DropDatabase {
                name: "db0".to_string(),
                if_exists: false,
            }],
            None,
        );
        assert_eq!(*bridge.dropped_databases.lock(), vec!["db0"]);
        // failed and no-op drops must not notify
        processor.execute(
            &[
                Statement::DropDatabase {
                    name: "db0".to_string(),
                    if_exists: false,
                },
                Statement::DropDatabase {
                    name: "db0".to_string(),
                    if_exists: true,
                },
            ],
            None,
        );
        assert_eq!(bridge.dropped_databases.lock().len(), 1);
    }

    #[test]
    fn bridge_receives_dropped_series_keys() {
        let (processor, bridge) = processor_with_bridge();
        let catalog = Arc::clone(processor.catalog());
        catalog.create_database("db0", false).unwrap();
        catalog
            .record_series("db0", "cpu", tags(&[("host", "serverA"), ("region", "uswest")]))
            .unwrap();

        processor.execute(
            &[Statement::DropSeries {
                from: MeasurementMatcher::Name("cpu".to_string()),
                condition: None,
            }],
            Some("db0"),
        );

        let dropped = bridge.dropped_series.lock();
        assert_eq!(
            *dropped,
            vec![(
                "db0".to_string(),
                "cpu".to_string(),
                vec!["cpu,host=serverA,region=uswest".to_string()],
            )]
        );
    }

    #[test]
    fn invalid_predicate_drops_nothing_anywhere() {
        let (processor, bridge) = processor_with_bridge();
        let catalog = Arc::clone(processor.catalog());
        catalog.create_database("db0", false).unwrap();
        for measurement in ["a", "b", "c"] {
            catalog
                .record_series("db0", measurement, tags(&[("host", "serverA")]))
                .unwrap();
        }

        // a field comparison must reject the command before any of the
        // three measurements loses a series
        let response = processor.execute(
            &[Statement::DropSeries {
                from: MeasurementMatcher::Regex(regex::Regex::new(".*").unwrap()),
                condition: Some(Expr::binary(
                    BinaryOp::Gt,
                    Expr::var("val"),
                    Expr::number(50.0),
                )),
            }],
            Some("db0"),
        );
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"results":[{"error":"DROP SERIES doesn't support fields in WHERE clause"}]}"#
        );
        assert!(bridge.dropped_series.lock().is_empty());
        assert_eq!(
            catalog.db_schema("db0").unwrap().series.series_count(),
            3
        );
    }

    #[test]
    fn drop_series_with_tag_condition_filters_series() {
        let processor = processor();
        let catalog = Arc::clone(processor.catalog());
        catalog.create_database("db0", false).unwrap();
        catalog
            .record_series("db0", "cpu", tags(&[("host", "serverA"), ("region", "uswest")]))
            .unwrap();
        catalog
            .record_series("db0", "cpu", tags(&[("host", "serverB"), ("region", "useast")]))
            .unwrap();

        processor.execute(
            &[Statement::DropSeries {
                from: MeasurementMatcher::Name("cpu".to_string()),
                condition: Some(Expr::binary(
                    BinaryOp::Eq,
                    Expr::var("region"),
                    Expr::string("uswest"),
                )),
            }],
            Some("db0"),
        );

        let schema = catalog.db_schema("db0").unwrap();
        let remaining: Vec<_> = schema
            .series
            .measurement("cpu")
            .unwrap()
            .iter()
            .map(|(key, _)| key.to_string())
            .collect();
        assert_eq!(remaining, vec!["cpu,host=serverB,region=useast"]);
    }

    #[test]
    fn series_commands_require_database_context() {
        let processor = processor();
        let response = processor.execute(
            &[
                Statement::ShowSeries,
                Statement::DropSeries {
                    from: MeasurementMatcher::Name("cpu".to_string()),
                    condition: None,
                },
            ],
            None,
        );
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"results":[{"error":"database name required"},{"error":"database name required"}]}"#
        );
    }

    #[test]
    fn series_commands_require_existing_database() {
        let processor = processor();
        let response = processor.execute(&[Statement::ShowSeries], Some("db0"));
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"results":[{"error":"database not found: db0"}]}"#
        );
    }

    #[test]
    fn failing_statement_does_not_abort_siblings() {
        let processor = processor();
        let response = processor.execute(
            &[
                Statement::CreateDatabase {
                    name: "db0".to_string(),
                    if_not_exists: false,
                },
                Statement::CreateDatabase {
                    name: "db0".to_string(),
                    if_not_exists: false,
                },
                Statement::ShowDatabases,
            ],
            None,
        );
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"results":[{},{"error":"database already exists"},{"series":[{"name":"databases","columns":["name"],"values":[["db0"]]}]}]}"#
        );
    }
}
