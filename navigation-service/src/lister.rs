//! Child-listing data-fetch strategies.
//!
//! Builds the SQL for every navigation listing. Database enumeration picks
//! exactly one of three strategies from the settings:
//!
//! - catalog query against `INFORMATION_SCHEMA.SCHEMATA` (paged server-side),
//! - a single `SHOW DATABASES` with a constructed WHERE clause (paged here),
//! - one `SHOW DATABASES LIKE` per configured allow-list pattern (paged here).
//!
//! Hidden-database filtering is asymmetric on purpose, mirroring the
//! long-standing behavior of this tool family: the first two strategies
//! exclude hidden names inside the query, the per-pattern strategy filters
//! the fetched names afterwards.

use common::models::navigation::{ContainerKind, DatabaseEntry, NavigationConfig};
use common::utils::sql_text::{backquote, escape_wildcards, quote_string};
use regex::Regex;

/// The mutually exclusive database enumeration strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Query the information-schema catalog view.
    Catalog,
    /// One SHOW DATABASES with a WHERE clause.
    ShowFiltered,
    /// One SHOW DATABASES LIKE per allow-list pattern.
    ShowPerPattern,
}

/// Picks the enumeration strategy for the given settings.
pub fn choose_strategy(cfg: &NavigationConfig) -> FetchStrategy {
    if cfg.has_information_schema {
        FetchStrategy::Catalog
    } else if cfg.only_db.is_empty() {
        FetchStrategy::ShowFiltered
    } else {
        FetchStrategy::ShowPerPattern
    }
}

/// Which result column carries the listed name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameColumn {
    Index(usize),
    Named(&'static str),
}

/// A composed listing statement plus how to consume its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQuery {
    pub sql: String,
    pub column: NameColumn,
    /// True when the statement already applies LIMIT; otherwise the caller
    /// slices the full result in-process.
    pub server_side_page: bool,
}

fn search_clause(column: &str, search: &str) -> String {
    format!(
        "{} LIKE {}",
        column,
        quote_string(&format!("%{}%", escape_wildcards(search)))
    )
}

fn not_hidden_clause(column: &str, pattern: &str) -> String {
    format!("{} NOT REGEXP {}", column, quote_string(pattern))
}

fn allow_list_clause(column: &str, patterns: &[String]) -> String {
    let likes: Vec<String> = patterns
        .iter()
        .map(|p| format!("{} LIKE {}", column, quote_string(p)))
        .collect();
    format!("({})", likes.join(" OR "))
}

fn non_empty(search: Option<&str>) -> Option<&str> {
    search.filter(|s| !s.is_empty())
}

/// Strategy (a): catalog query, paged by the server.
pub fn catalog_databases_query(
    cfg: &NavigationConfig,
    search: Option<&str>,
    pos: u32,
) -> BuiltQuery {
    let column = "`SCHEMA_NAME`";
    let mut clauses = vec!["TRUE".to_string()];
    if let Some(s) = non_empty(search) {
        clauses.push(search_clause(column, s));
    }
    if let Some(hide) = cfg.hide_db.as_deref() {
        clauses.push(not_hidden_clause(column, hide));
    }
    if !cfg.only_db.is_empty() {
        clauses.push(allow_list_clause(column, &cfg.only_db));
    }

    BuiltQuery {
        sql: format!(
            "SELECT `SCHEMA_NAME` FROM `INFORMATION_SCHEMA`.`SCHEMATA` WHERE {} \
             ORDER BY `SCHEMA_NAME` LIMIT {}, {}",
            clauses.join(" AND "),
            pos,
            cfg.page_size
        ),
        column: NameColumn::Index(0),
        server_side_page: true,
    }
}

/// Strategy (b): one SHOW DATABASES, filtered in the WHERE clause,
/// paged in-process. Only selected when no allow-list is configured.
pub fn show_databases_query(cfg: &NavigationConfig, search: Option<&str>) -> BuiltQuery {
    let column = "`Database`";
    let mut clauses = vec!["TRUE".to_string()];
    if let Some(s) = non_empty(search) {
        clauses.push(search_clause(column, s));
    }
    if let Some(hide) = cfg.hide_db.as_deref() {
        clauses.push(not_hidden_clause(column, hide));
    }

    BuiltQuery {
        sql: format!("SHOW DATABASES WHERE {}", clauses.join(" AND ")),
        column: NameColumn::Index(0),
        server_side_page: false,
    }
}

/// Strategy (c): one SHOW DATABASES LIKE per allow-list pattern.
/// The hidden-database regex is NOT injected here; callers apply
/// [`apply_hidden_filter`] to the fetched names instead.
pub fn show_databases_like_queries(cfg: &NavigationConfig) -> Vec<BuiltQuery> {
    cfg.only_db
        .iter()
        .map(|pattern| BuiltQuery {
            sql: format!("SHOW DATABASES LIKE {}", quote_string(pattern)),
            column: NameColumn::Index(0),
            server_side_page: false,
        })
        .collect()
}

/// Post-fetch hidden-database filter for the per-pattern strategy.
/// An unparsable pattern filters nothing.
pub fn apply_hidden_filter(names: Vec<String>, hide_db: Option<&str>) -> Vec<String> {
    let Some(pattern) = hide_db else { return names };
    match Regex::new(pattern) {
        Ok(re) => names.into_iter().filter(|n| !re.is_match(n)).collect(),
        Err(e) => {
            tracing::warn!(pattern = pattern, error = %e, "invalid hide_db regex ignored");
            names
        }
    }
}

/// Builds the listing for one container level under a database.
pub fn container_query(
    cfg: &NavigationConfig,
    db: &str,
    kind: ContainerKind,
    search: Option<&str>,
    pos: u32,
) -> BuiltQuery {
    if cfg.has_information_schema {
        catalog_container_query(cfg, db, kind, search, pos)
    } else {
        show_container_query(db, kind, search)
    }
}

fn catalog_container_query(
    cfg: &NavigationConfig,
    db: &str,
    kind: ContainerKind,
    search: Option<&str>,
    pos: u32,
) -> BuiltQuery {
    let (name_col, table, mut clauses) = match kind {
        ContainerKind::Tables => (
            "`TABLE_NAME`",
            "`TABLES`",
            vec![
                format!("`TABLE_SCHEMA` = {}", quote_string(db)),
                "`TABLE_TYPE` = 'BASE TABLE'".to_string(),
            ],
        ),
        ContainerKind::Views => (
            "`TABLE_NAME`",
            "`TABLES`",
            vec![
                format!("`TABLE_SCHEMA` = {}", quote_string(db)),
                "`TABLE_TYPE` IN ('VIEW', 'SYSTEM VIEW')".to_string(),
            ],
        ),
        ContainerKind::Procedures => (
            "`ROUTINE_NAME`",
            "`ROUTINES`",
            vec![
                format!("`ROUTINE_SCHEMA` = {}", quote_string(db)),
                "`ROUTINE_TYPE` = 'PROCEDURE'".to_string(),
            ],
        ),
        ContainerKind::Functions => (
            "`ROUTINE_NAME`",
            "`ROUTINES`",
            vec![
                format!("`ROUTINE_SCHEMA` = {}", quote_string(db)),
                "`ROUTINE_TYPE` = 'FUNCTION'".to_string(),
            ],
        ),
        ContainerKind::Events => (
            "`EVENT_NAME`",
            "`EVENTS`",
            vec![format!("`EVENT_SCHEMA` = {}", quote_string(db))],
        ),
    };
    if let Some(s) = non_empty(search) {
        clauses.push(search_clause(name_col, s));
    }

    BuiltQuery {
        sql: format!(
            "SELECT {} FROM `INFORMATION_SCHEMA`.{} WHERE {} ORDER BY {} LIMIT {}, {}",
            name_col,
            table,
            clauses.join(" AND "),
            name_col,
            pos,
            cfg.page_size
        ),
        column: NameColumn::Index(0),
        server_side_page: true,
    }
}

fn show_container_query(db: &str, kind: ContainerKind, search: Option<&str>) -> BuiltQuery {
    match kind {
        ContainerKind::Tables | ContainerKind::Views => {
            let name_col = backquote(&format!("Tables_in_{}", db));
            let mut clauses = vec![if kind == ContainerKind::Tables {
                "`Table_type` = 'BASE TABLE'".to_string()
            } else {
                "`Table_type` IN ('VIEW', 'SYSTEM VIEW')".to_string()
            }];
            if let Some(s) = non_empty(search) {
                clauses.push(search_clause(&name_col, s));
            }
            BuiltQuery {
                sql: format!(
                    "SHOW FULL TABLES FROM {} WHERE {}",
                    backquote(db),
                    clauses.join(" AND ")
                ),
                column: NameColumn::Index(0),
                server_side_page: false,
            }
        }
        ContainerKind::Procedures | ContainerKind::Functions => {
            let command = if kind == ContainerKind::Procedures {
                "SHOW PROCEDURE STATUS"
            } else {
                "SHOW FUNCTION STATUS"
            };
            let mut clauses = vec![format!("`Db` = {}", quote_string(db))];
            if let Some(s) = non_empty(search) {
                clauses.push(search_clause("`Name`", s));
            }
            BuiltQuery {
                sql: format!("{} WHERE {}", command, clauses.join(" AND ")),
                column: NameColumn::Named("Name"),
                server_side_page: false,
            }
        }
        ContainerKind::Events => {
            let mut sql = format!("SHOW EVENTS FROM {}", backquote(db));
            if let Some(s) = non_empty(search) {
                sql.push_str(&format!(" WHERE {}", search_clause("`Name`", s)));
            }
            BuiltQuery {
                sql,
                column: NameColumn::Named("Name"),
                server_side_page: false,
            }
        }
    }
}

/// Builds the column listing for one table (third tree level).
pub fn columns_query(cfg: &NavigationConfig, db: &str, table: &str, pos: u32) -> BuiltQuery {
    if cfg.has_information_schema {
        BuiltQuery {
            sql: format!(
                "SELECT `COLUMN_NAME` FROM `INFORMATION_SCHEMA`.`COLUMNS` \
                 WHERE `TABLE_SCHEMA` = {} AND `TABLE_NAME` = {} \
                 ORDER BY `ORDINAL_POSITION` LIMIT {}, {}",
                quote_string(db),
                quote_string(table),
                pos,
                cfg.page_size
            ),
            column: NameColumn::Index(0),
            server_side_page: true,
        }
    } else {
        BuiltQuery {
            sql: format!("SHOW COLUMNS FROM {} FROM {}", backquote(table), backquote(db)),
            column: NameColumn::Named("Field"),
            server_side_page: false,
        }
    }
}

/// Builds the index listing for one table (third tree level). Key names
/// repeat per indexed column, so callers de-duplicate the fetched names.
pub fn indexes_query(db: &str, table: &str) -> BuiltQuery {
    BuiltQuery {
        sql: format!("SHOW INDEX FROM {} FROM {}", backquote(table), backquote(db)),
        column: NameColumn::Named("Key_name"),
        server_side_page: false,
    }
}

/// Slices one page out of a full result and reports the total.
pub fn paginate(names: &[String], pos: u32, page_size: u32) -> (Vec<String>, u64) {
    let total = names.len() as u64;
    let page = names
        .iter()
        .skip(pos as usize)
        .take(page_size as usize)
        .cloned()
        .collect();
    (page, total)
}

/// Buckets one page of names by the group separator.
///
/// Names containing the separator collapse into one entry per distinct
/// prefix, carrying the number of folded names; the rest pass through in
/// order. Bucketing happens strictly within the page: pagination has
/// already been applied to the raw names.
pub fn group_page(names: &[String], separator: &str) -> Vec<DatabaseEntry> {
    let mut entries: Vec<DatabaseEntry> = Vec::new();
    for name in names {
        let prefix = name
            .find(separator)
            .filter(|&idx| idx > 0)
            .map(|idx| &name[..idx]);
        match prefix {
            Some(prefix) => {
                if let Some(existing) = entries
                    .iter_mut()
                    .find(|e| e.is_group && e.name == prefix)
                {
                    existing.count += 1;
                } else {
                    entries.push(DatabaseEntry::group(prefix, 1));
                }
            }
            None => entries.push(DatabaseEntry::database(name.clone())),
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(has_is: bool, only_db: Vec<&str>, hide_db: Option<&str>) -> NavigationConfig {
        NavigationConfig {
            has_information_schema: has_is,
            grouping: true,
            separator: "_".to_string(),
            page_size: 50,
            hide_db: hide_db.map(String::from),
            only_db: only_db.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(choose_strategy(&cfg(true, vec![], None)), FetchStrategy::Catalog);
        // The catalog wins even with an allow-list; the list becomes a clause
        assert_eq!(
            choose_strategy(&cfg(true, vec!["a%"], None)),
            FetchStrategy::Catalog
        );
        assert_eq!(
            choose_strategy(&cfg(false, vec![], None)),
            FetchStrategy::ShowFiltered
        );
        assert_eq!(
            choose_strategy(&cfg(false, vec!["a%"], None)),
            FetchStrategy::ShowPerPattern
        );
    }

    #[test]
    fn test_catalog_query_plain() {
        let q = catalog_databases_query(&cfg(true, vec![], None), None, 0);
        assert_eq!(
            q.sql,
            "SELECT `SCHEMA_NAME` FROM `INFORMATION_SCHEMA`.`SCHEMATA` WHERE TRUE \
             ORDER BY `SCHEMA_NAME` LIMIT 0, 50"
        );
        assert!(q.server_side_page);
    }

    #[test]
    fn test_catalog_query_full_clauses() {
        let q = catalog_databases_query(
            &cfg(true, vec!["app\\_%", "shop"], Some("^mysql$")),
            Some("in_v"),
            100,
        );
        assert_eq!(
            q.sql,
            "SELECT `SCHEMA_NAME` FROM `INFORMATION_SCHEMA`.`SCHEMATA` WHERE TRUE \
             AND `SCHEMA_NAME` LIKE '%in\\\\_v%' \
             AND `SCHEMA_NAME` NOT REGEXP '^mysql$' \
             AND (`SCHEMA_NAME` LIKE 'app\\\\_%' OR `SCHEMA_NAME` LIKE 'shop') \
             ORDER BY `SCHEMA_NAME` LIMIT 100, 50"
        );
    }

    #[test]
    fn test_show_databases_query_injects_hidden_clause() {
        let q = show_databases_query(&cfg(false, vec![], Some("^tmp")), Some("co"));
        assert_eq!(
            q.sql,
            "SHOW DATABASES WHERE TRUE AND `Database` LIKE '%co%' AND `Database` NOT REGEXP '^tmp'"
        );
        assert!(!q.server_side_page);
    }

    #[test]
    fn test_per_pattern_queries_leave_hidden_to_post_filter() {
        let queries = show_databases_like_queries(&cfg(false, vec!["app\\_%", "shop"], Some("^tmp")));
        let sql: Vec<&str> = queries.iter().map(|q| q.sql.as_str()).collect();
        // No REGEXP clause here: the hidden filter runs after the fetch
        assert_eq!(
            sql,
            vec![
                "SHOW DATABASES LIKE 'app\\\\_%'",
                "SHOW DATABASES LIKE 'shop'",
            ]
        );
    }

    #[test]
    fn test_apply_hidden_filter() {
        let names = vec!["app_a".to_string(), "tmp_1".to_string(), "shop".to_string()];
        assert_eq!(
            apply_hidden_filter(names.clone(), Some("^tmp")),
            vec!["app_a".to_string(), "shop".to_string()]
        );
        assert_eq!(apply_hidden_filter(names.clone(), None), names);
        // Broken regex filters nothing
        assert_eq!(apply_hidden_filter(names.clone(), Some("(")), names);
    }

    #[test]
    fn test_container_query_catalog() {
        let q = container_query(&cfg(true, vec![], None), "sakila", ContainerKind::Tables, None, 0);
        assert_eq!(
            q.sql,
            "SELECT `TABLE_NAME` FROM `INFORMATION_SCHEMA`.`TABLES` \
             WHERE `TABLE_SCHEMA` = 'sakila' AND `TABLE_TYPE` = 'BASE TABLE' \
             ORDER BY `TABLE_NAME` LIMIT 0, 50"
        );

        let q = container_query(
            &cfg(true, vec![], None),
            "sakila",
            ContainerKind::Functions,
            Some("get"),
            25,
        );
        assert_eq!(
            q.sql,
            "SELECT `ROUTINE_NAME` FROM `INFORMATION_SCHEMA`.`ROUTINES` \
             WHERE `ROUTINE_SCHEMA` = 'sakila' AND `ROUTINE_TYPE` = 'FUNCTION' \
             AND `ROUTINE_NAME` LIKE '%get%' ORDER BY `ROUTINE_NAME` LIMIT 25, 50"
        );
    }

    #[test]
    fn test_container_query_show_variants() {
        let cfg = cfg(false, vec![], None);
        let q = container_query(&cfg, "sakila", ContainerKind::Views, None, 0);
        assert_eq!(
            q.sql,
            "SHOW FULL TABLES FROM `sakila` WHERE `Table_type` IN ('VIEW', 'SYSTEM VIEW')"
        );
        assert!(!q.server_side_page);

        let q = container_query(&cfg, "sakila", ContainerKind::Procedures, Some("film"), 0);
        assert_eq!(
            q.sql,
            "SHOW PROCEDURE STATUS WHERE `Db` = 'sakila' AND `Name` LIKE '%film%'"
        );
        assert_eq!(q.column, NameColumn::Named("Name"));

        let q = container_query(&cfg, "sakila", ContainerKind::Events, None, 0);
        assert_eq!(q.sql, "SHOW EVENTS FROM `sakila`");
    }

    #[test]
    fn test_columns_and_indexes_queries() {
        let q = columns_query(&cfg(true, vec![], None), "sakila", "film", 10);
        assert_eq!(
            q.sql,
            "SELECT `COLUMN_NAME` FROM `INFORMATION_SCHEMA`.`COLUMNS` \
             WHERE `TABLE_SCHEMA` = 'sakila' AND `TABLE_NAME` = 'film' \
             ORDER BY `ORDINAL_POSITION` LIMIT 10, 50"
        );

        let q = columns_query(&cfg(false, vec![], None), "sakila", "film", 0);
        assert_eq!(q.sql, "SHOW COLUMNS FROM `film` FROM `sakila`");
        assert_eq!(q.column, NameColumn::Named("Field"));

        let q = indexes_query("sakila", "film");
        assert_eq!(q.sql, "SHOW INDEX FROM `film` FROM `sakila`");
        assert_eq!(q.column, NameColumn::Named("Key_name"));
    }

    #[test]
    fn test_paginate() {
        let names: Vec<String> = (0..7).map(|i| format!("db{}", i)).collect();
        let (page, total) = paginate(&names, 2, 3);
        assert_eq!(page, vec!["db2", "db3", "db4"]);
        assert_eq!(total, 7);

        let (page, _) = paginate(&names, 6, 3);
        assert_eq!(page, vec!["db6"]);

        let (page, _) = paginate(&names, 10, 3);
        assert!(page.is_empty());
    }

    #[test]
    fn test_group_page_buckets_by_prefix() {
        let names: Vec<String> = ["customer_eu", "customer_us", "sakila", "customer_apac", "world"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let entries = group_page(&names, "_");
        assert_eq!(
            entries,
            vec![
                DatabaseEntry::group("customer", 3),
                DatabaseEntry::database("sakila"),
                DatabaseEntry::database("world"),
            ]
        );
    }

    #[test]
    fn test_group_page_leading_separator_not_a_group() {
        let names = vec!["_private".to_string(), "a_b".to_string()];
        let entries = group_page(&names, "_");
        assert_eq!(
            entries,
            vec![
                DatabaseEntry::database("_private"),
                DatabaseEntry::group("a", 1),
            ]
        );
    }
}
