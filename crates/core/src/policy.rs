use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::dataset;

/// Statement verbs a generated query must never contain as a standalone
/// word. DDL and mutation only; the pipeline is strictly read-only.
pub const DENIED_KEYWORDS: [&str; 10] = [
    "UPDATE", "DELETE", "INSERT", "DROP", "CREATE", "ALTER", "TRUNCATE", "MERGE", "GRANT",
    "REVOKE",
];

// Whole-word match, so a column value like 'DROPzone' passes while a bare
// DROP anywhere in the statement rejects. Known to be stricter than a
// grammar-aware check; that strictness is inherited behavior.
static KEYWORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = DENIED_KEYWORDS.join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("keyword alternation is a valid pattern")
});

static TABLE_REFERENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("table reference pattern is valid"));

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SqlRejection {
    #[error("query contains the forbidden keyword `{keyword}`")]
    ForbiddenKeyword { keyword: String },
    #[error("query references a table outside the allowlist: `{table}`")]
    DisallowedTable { table: String },
}

/// Static safety gate applied to every generated query before execution.
///
/// This is pattern inspection, not SQL parsing: a denylist of mutating
/// verbs matched as whole words over the case-folded query, plus an
/// allowlist check on every back-quoted table identifier.
#[derive(Clone, Debug)]
pub struct SqlPolicy {
    allowed_tables: Vec<String>,
}

impl Default for SqlPolicy {
    fn default() -> Self {
        Self::new(dataset::ALLOWED_TABLES)
    }
}

impl SqlPolicy {
    pub fn new(allowed_tables: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed_tables: allowed_tables
                .into_iter()
                .map(|table| table.into().to_lowercase())
                .collect(),
        }
    }

    /// Returns `Ok(())` for a safe query; the caller treats that as a
    /// no-op. Either rejection carries enough detail for the log line.
    pub fn validate(&self, sql: &str) -> Result<(), SqlRejection> {
        let folded = sql.to_uppercase();
        if let Some(found) = KEYWORD_PATTERN.find(&folded) {
            return Err(SqlRejection::ForbiddenKeyword { keyword: found.as_str().to_string() });
        }

        let lowered = sql.to_lowercase();
        for capture in TABLE_REFERENCE_PATTERN.captures_iter(&lowered) {
            let table = &capture[1];
            if !self.allowed_tables.iter().any(|allowed| allowed == table) {
                return Err(SqlRejection::DisallowedTable { table: table.to_string() });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{SqlPolicy, SqlRejection};

    #[test]
    fn keyword_inside_a_literal_word_is_not_flagged() {
        let policy = SqlPolicy::default();
        let sql = "SELECT x FROM `datario.adm_central_atendimento_1746.chamado` \
                   WHERE x='DROPzone'";
        assert_eq!(policy.validate(sql), Ok(()));
    }

    #[test]
    fn standalone_mutating_keyword_rejects() {
        let policy = SqlPolicy::default();
        let rejection = policy.validate("DROP TABLE x").expect_err("must reject");
        assert_eq!(rejection, SqlRejection::ForbiddenKeyword { keyword: "DROP".to_string() });
    }

    #[test]
    fn lowercase_mutating_keyword_still_rejects() {
        let policy = SqlPolicy::default();
        let rejection = policy
            .validate("delete from `datario.adm_central_atendimento_1746.chamado`")
            .expect_err("must reject");
        assert!(matches!(rejection, SqlRejection::ForbiddenKeyword { .. }));
    }

    #[test]
    fn table_outside_allowlist_rejects() {
        let policy = SqlPolicy::default();
        let rejection =
            policy.validate("SELECT a FROM `other.project.table`").expect_err("must reject");
        assert_eq!(
            rejection,
            SqlRejection::DisallowedTable { table: "other.project.table".to_string() }
        );
    }

    #[test]
    fn allowlisted_tables_pass_regardless_of_identifier_case() {
        let policy = SqlPolicy::default();
        let sql = "SELECT COUNT(*) AS total FROM `DATARIO.dados_mestres.BAIRRO`";
        assert_eq!(policy.validate(sql), Ok(()));
    }

    #[test]
    fn every_denied_keyword_rejects_as_a_whole_word() {
        let policy = SqlPolicy::default();
        for keyword in super::DENIED_KEYWORDS {
            let sql = format!("SELECT 1; {keyword} something");
            assert!(
                policy.validate(&sql).is_err(),
                "{keyword} should have been rejected"
            );
        }
    }

    #[test]
    fn custom_allowlist_is_honored() {
        let policy = SqlPolicy::new(["my.dataset.table"]);
        assert!(policy.validate("SELECT a FROM `my.dataset.table`").is_ok());
        assert!(policy
            .validate("SELECT a FROM `datario.adm_central_atendimento_1746.chamado`")
            .is_err());
    }
}
