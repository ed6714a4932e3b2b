//! Warehouse schema definitions
//!
//! Static Redshift DDL for the `oecd` schema. Every statement uses
//! `IF NOT EXISTS`, so the whole list is safe to re-run against an
//! already-provisioned warehouse.

use serde::Serialize;

use crate::models::Entity;

/// Schema (namespace) holding every table of the dataset
pub const SCHEMA_NAME: &str = "oecd";

/// One DDL statement with a label for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DdlStatement {
    /// Short label, e.g. `schema oecd` or `table countries`
    pub label: String,
    /// Statement text
    pub sql: &'static str,
}

/// Schema helper
pub struct WarehouseSchema;

impl WarehouseSchema {
    /// Create the namespace
    pub fn create_schema_sql() -> &'static str {
        "CREATE SCHEMA IF NOT EXISTS oecd"
    }

    /// Table DDL for one entity
    pub fn create_table_sql(entity: Entity) -> &'static str {
        match entity {
            Entity::Country => {
                r#"
CREATE TABLE IF NOT EXISTS oecd.countries (
    code varchar(3) NOT NULL PRIMARY KEY,
    country_name varchar(255),
    continent varchar(255),
    region varchar(255),
    surface_area float,
    indep_year int,
    local_name varchar(255),
    gov_form varchar(255),
    capital varchar(255),
    cap_long float,
    cap_lat float
)"#
            }
            Entity::Economy => {
                r#"
CREATE TABLE IF NOT EXISTS oecd.economies (
    econ_id int IDENTITY(1,1) NOT NULL,
    code varchar(3) NOT NULL,
    year int NOT NULL,
    income_group varchar(255),
    gdp_percapita float,
    gross_savings float,
    inflation_rate float,
    total_investment float,
    unemployment_rate float,
    exports float,
    imports float,
    PRIMARY KEY (code, year),
    FOREIGN KEY (code) REFERENCES oecd.countries(code)
)"#
            }
            Entity::City => {
                r#"
CREATE TABLE IF NOT EXISTS oecd.cities (
    name varchar(255) NOT NULL,
    country_code varchar(3) NOT NULL,
    city_proper_pop int,
    metroarea_pop float,
    urbanarea_pop int,
    PRIMARY KEY (name, country_code),
    FOREIGN KEY (country_code) REFERENCES oecd.countries(code)
)"#
            }
            Entity::Population => {
                r#"
CREATE TABLE IF NOT EXISTS oecd.population (
    pop_id int IDENTITY(1,1) NOT NULL,
    country_code varchar(3) NOT NULL,
    year int NOT NULL,
    fertility_rate float,
    life_expectancy float,
    size int,
    PRIMARY KEY (country_code, year),
    FOREIGN KEY (country_code) REFERENCES oecd.countries(code)
)"#
            }
            Entity::Language => {
                r#"
CREATE TABLE IF NOT EXISTS oecd.languages (
    lang_id int IDENTITY(1,1) NOT NULL,
    code varchar(3) NOT NULL,
    name varchar(255) NOT NULL,
    language_percent float,
    official boolean,
    PRIMARY KEY (code, name),
    FOREIGN KEY (code) REFERENCES oecd.countries(code)
)"#
            }
            Entity::Currency => {
                r#"
CREATE TABLE IF NOT EXISTS oecd.currencies (
    curr_id int IDENTITY(1,1) NOT NULL,
    code varchar(3) NOT NULL,
    basic_unit varchar(255),
    curr_code varchar(3),
    frac_unit varchar(255),
    frac_perbasic float,
    PRIMARY KEY (code, curr_code),
    FOREIGN KEY (code) REFERENCES oecd.countries(code)
)"#
            }
        }
    }

    /// The full provisioning list: namespace first, then the root table, then
    /// its dependents
    pub fn statements() -> Vec<DdlStatement> {
        let mut statements = vec![DdlStatement {
            label: format!("schema {}", SCHEMA_NAME),
            sql: Self::create_schema_sql(),
        }];
        statements.extend(Entity::ALL.into_iter().map(|entity| DdlStatement {
            label: format!("table {}", entity.table_name()),
            sql: Self::create_table_sql(entity),
        }));
        statements
    }
}
