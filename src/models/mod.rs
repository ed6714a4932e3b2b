//! Warehouse entity catalogue
//!
//! Describes the six tables of the countries/economy dataset: their warehouse
//! table names, keys, the foreign key back to the root `countries` table, and the
//! flat file each one is loaded from.

use serde::{Deserialize, Serialize};

/// Foreign key from a dependent table to the root entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    /// Column on the dependent table
    pub column: &'static str,
    /// Referenced entity
    pub references: Entity,
    /// Referenced column on the root table
    pub referenced_column: &'static str,
}

/// A table of the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    /// Root entity, keyed by the 3-character country code
    Country,
    /// One row per country-year
    Economy,
    City,
    /// One row per country-year, with a surrogate id
    Population,
    Language,
    Currency,
}

impl Entity {
    /// All entities, root first, then dependents
    pub const ALL: [Entity; 6] = [
        Entity::Country,
        Entity::Economy,
        Entity::City,
        Entity::Population,
        Entity::Language,
        Entity::Currency,
    ];

    /// Warehouse table name
    pub fn table_name(&self) -> &'static str {
        match self {
            Entity::Country => "countries",
            Entity::Economy => "economies",
            Entity::City => "cities",
            Entity::Population => "population",
            Entity::Language => "languages",
            Entity::Currency => "currencies",
        }
    }

    /// Name of the flat file the table is loaded from
    pub fn source_file(&self) -> &'static str {
        match self {
            Entity::Country => "countries.csv",
            Entity::Economy => "economies.csv",
            Entity::City => "cities.csv",
            Entity::Population => "populations.csv",
            Entity::Language => "languages.csv",
            Entity::Currency => "currencies.csv",
        }
    }

    /// Primary key columns, in key order
    pub fn primary_key(&self) -> &'static [&'static str] {
        match self {
            Entity::Country => &["code"],
            Entity::Economy => &["code", "year"],
            Entity::City => &["name", "country_code"],
            Entity::Population => &["country_code", "year"],
            Entity::Language => &["code", "name"],
            Entity::Currency => &["code", "curr_code"],
        }
    }

    /// Foreign key to the root entity (`None` for the root itself)
    pub fn foreign_key(&self) -> Option<ForeignKey> {
        let column = match self {
            Entity::Country => return None,
            Entity::Economy | Entity::Language | Entity::Currency => "code",
            Entity::City | Entity::Population => "country_code",
        };
        Some(ForeignKey {
            column,
            references: Entity::Country,
            referenced_column: "code",
        })
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Entity::Country)
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_first_and_only_root() {
        assert!(Entity::ALL[0].is_root());
        assert_eq!(Entity::ALL.iter().filter(|e| e.is_root()).count(), 1);
    }

    #[test]
    fn test_dependents_reference_country_code() {
        for entity in Entity::ALL.iter().skip(1) {
            let fk = entity.foreign_key().unwrap();
            assert_eq!(fk.references, Entity::Country);
            assert_eq!(fk.referenced_column, "code");
            assert!(entity.primary_key().contains(&fk.column));
        }
        assert!(Entity::Country.foreign_key().is_none());
    }

    #[test]
    fn test_population_reads_plural_file() {
        assert_eq!(Entity::Population.table_name(), "population");
        assert_eq!(Entity::Population.source_file(), "populations.csv");
    }
}
