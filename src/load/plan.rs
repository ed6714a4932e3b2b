//! Declarative table → bulk-ingest mapping

use serde::Serialize;

use crate::config::{LoadSection, StorageSection};
use crate::database::schema::SCHEMA_NAME;
use crate::database::{DatabaseError, DatabaseResult, quote_ident, quote_literal};
use crate::staging::{object_key, object_uri};
use crate::validation::{PlanValidationError, validate_load_order};

/// Format of the staged source files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Comma-delimited text
    #[default]
    Csv,
}

impl SourceFormat {
    fn clause(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "FORMAT AS CSV",
        }
    }
}

/// Everything needed to bulk-load one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyDescriptor {
    /// Target table name (unqualified)
    pub table: String,
    /// Source object URI, `s3://bucket/prefix/file`
    pub source_uri: String,
    /// Role the warehouse assumes to read the source
    #[serde(skip)]
    pub iam_role: String,
    pub format: SourceFormat,
    /// Header rows to skip
    pub ignore_header: u32,
    /// Tables that must be loaded before this one
    pub references: Vec<String>,
}

impl CopyDescriptor {
    pub fn new(
        table: impl Into<String>,
        source_uri: impl Into<String>,
        iam_role: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            source_uri: source_uri.into(),
            iam_role: iam_role.into(),
            format: SourceFormat::Csv,
            ignore_header: 1,
            references: Vec::new(),
        }
    }

    pub fn with_references(mut self, references: Vec<String>) -> Self {
        self.references = references;
        self
    }

    /// Render the COPY statement against `schema`
    ///
    /// Every name and literal goes through quoting; nothing from the mapping is
    /// spliced in raw.
    pub fn render(&self, schema: &str) -> String {
        let mut sql = format!(
            "COPY {}.{}\nFROM {}\nIAM_ROLE {}\n{}",
            quote_ident(schema),
            quote_ident(&self.table),
            quote_literal(&self.source_uri),
            quote_literal(&self.iam_role),
            self.format.clause()
        );
        if self.ignore_header > 0 {
            sql.push_str(&format!("\nIGNOREHEADER {}", self.ignore_header));
        }
        sql
    }
}

/// Ordered load mapping for one batch
#[derive(Debug, Clone, Serialize)]
pub struct LoadPlan {
    pub schema: String,
    pub descriptors: Vec<CopyDescriptor>,
}

impl LoadPlan {
    /// A plan against the `oecd` schema
    pub fn new(descriptors: Vec<CopyDescriptor>) -> Self {
        Self {
            schema: SCHEMA_NAME.to_string(),
            descriptors,
        }
    }

    /// Build the plan from configuration
    ///
    /// Source URIs use the same key layout as the publisher, so every table
    /// points at `s3://{bucket}/{prefix}/{file}`. A mapping entry with a blank
    /// table or file name is a configuration error.
    pub fn from_config(
        load: &LoadSection,
        storage: &StorageSection,
        iam_role: &str,
    ) -> DatabaseResult<Self> {
        let mut descriptors = Vec::new();

        for (index, entry) in load.table_entries().into_iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(DatabaseError::ConfigError(format!(
                    "load.tables[{}] has an empty table name",
                    index
                )));
            }
            let file_name = entry.file_name();
            if file_name.trim().is_empty() {
                return Err(DatabaseError::ConfigError(format!(
                    "load.tables[{}] ({}) has an empty file name",
                    index, entry.name
                )));
            }

            let key = object_key(&storage.prefix, &file_name);
            let mut descriptor =
                CopyDescriptor::new(&entry.name, object_uri(&storage.bucket, &key), iam_role)
                    .with_references(entry.references);
            descriptor.ignore_header = load.ignore_header;
            descriptors.push(descriptor);
        }

        Ok(Self::new(descriptors))
    }

    pub fn table_names(&self) -> Vec<String> {
        self.descriptors.iter().map(|d| d.table.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Check that referenced tables are loaded before their dependents
    pub fn validate(&self) -> Result<(), PlanValidationError> {
        validate_load_order(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoaderConfig;

    #[test]
    fn test_render_copy_command() {
        let descriptor = CopyDescriptor::new(
            "countries",
            "s3://oecd-countries-data/csv/countries.csv",
            "arn:aws:iam::123:role/copy",
        );
        assert_eq!(
            descriptor.render("oecd"),
            "COPY \"oecd\".\"countries\"\n\
             FROM 's3://oecd-countries-data/csv/countries.csv'\n\
             IAM_ROLE 'arn:aws:iam::123:role/copy'\n\
             FORMAT AS CSV\n\
             IGNOREHEADER 1"
        );
    }

    #[test]
    fn test_render_quotes_hostile_values() {
        let mut descriptor =
            CopyDescriptor::new("x\"; DROP TABLE y; --", "s3://b/it's.csv", "role");
        descriptor.ignore_header = 0;
        let sql = descriptor.render("oecd");
        assert!(sql.contains("\"x\"\"; DROP TABLE y; --\""));
        assert!(sql.contains("'s3://b/it''s.csv'"));
        assert!(!sql.contains("IGNOREHEADER"));
    }

    #[test]
    fn test_from_config_uses_publisher_key_layout() {
        let mut config = LoaderConfig::new();
        config.load.ignore_header = 2;
        let plan = LoadPlan::from_config(&config.load, &config.storage, "role").unwrap();

        assert_eq!(plan.schema, "oecd");
        assert_eq!(plan.len(), 6);
        assert_eq!(
            plan.descriptors[3].source_uri,
            "s3://oecd-countries-data/csv/populations.csv"
        );
        assert!(plan.descriptors.iter().all(|d| d.ignore_header == 2));
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_from_config_rejects_blank_entries() {
        let config = LoaderConfig::parse(
            r#"
[[load.tables]]
name = "countries"

[[load.tables]]
name = "  "
"#,
        )
        .unwrap();
        let result = LoadPlan::from_config(&config.load, &config.storage, "role");
        assert!(matches!(
            result,
            Err(DatabaseError::ConfigError(msg)) if msg.contains("load.tables[1]")
        ));

        let config = LoaderConfig::parse(
            r#"
[[load.tables]]
name = "economies"
file = ""
"#,
        )
        .unwrap();
        let result = LoadPlan::from_config(&config.load, &config.storage, "role");
        assert!(matches!(
            result,
            Err(DatabaseError::ConfigError(msg)) if msg.contains("empty file name")
        ));
    }
}
