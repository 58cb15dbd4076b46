use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LIMIT_COMMA: Regex = Regex::new(r"LIMIT ([0-9]+),([ 0-9]+)").unwrap();
    static ref INSERT_TABLE: Regex = Regex::new(r"(?is)^INSERT INTO ([a-z0-9_\-]+)").unwrap();
}

/// Rewrite the MySQL-style `LIMIT offset,count` clause into the
/// `LIMIT count OFFSET offset` form this dialect accepts.
///
/// This is a textual substitution, not a parser; it runs only when the text
/// contains `LIMIT` at all. Returns a borrowed `Cow` when nothing changed.
pub(crate) fn rewrite_limit(sql: &str) -> Cow<'_, str> {
    if !sql.contains("LIMIT") {
        return Cow::Borrowed(sql);
    }
    LIMIT_COMMA.replace_all(sql, "LIMIT ${2} OFFSET ${1}")
}

/// Recover the table name targeted by the most recent `INSERT INTO` so its
/// implicit sequence can be queried for a last-insert-id.
///
/// Best-effort: multi-table inserts, quoted or schema-qualified identifiers,
/// and non-sequence keys all miss. Tables ending in `groups` get a `_g`
/// suffix appended before the sequence lookup (legacy naming workaround).
pub(crate) fn insert_target_table(sql: &str) -> Option<String> {
    let caps = INSERT_TABLE.captures(sql)?;
    let mut table = caps[1].to_string();
    if table.ends_with("groups") {
        table.push_str("_g");
    }
    Some(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_limit_is_rewritten() {
        assert_eq!(
            rewrite_limit("SELECT * FROM t LIMIT 5,10"),
            "SELECT * FROM t LIMIT 10 OFFSET 5"
        );
    }

    #[test]
    fn comma_limit_with_space_is_rewritten() {
        assert_eq!(
            rewrite_limit("SELECT * FROM t LIMIT 5, 10"),
            "SELECT * FROM t LIMIT  10 OFFSET 5"
        );
    }

    #[test]
    fn plain_limit_is_untouched() {
        let sql = "SELECT * FROM t LIMIT 10 OFFSET 5";
        assert!(matches!(rewrite_limit(sql), Cow::Borrowed(_)));
    }

    #[test]
    fn statements_without_limit_are_untouched() {
        let sql = "SELECT 5,10";
        assert!(matches!(rewrite_limit(sql), Cow::Borrowed(_)));
        assert_eq!(rewrite_limit(sql), sql);
    }

    #[test]
    fn insert_table_is_extracted() {
        assert_eq!(
            insert_target_table("INSERT INTO posts (id) VALUES (1)"),
            Some("posts".to_string())
        );
        assert_eq!(
            insert_target_table("insert into topics VALUES (1)"),
            Some("topics".to_string())
        );
    }

    #[test]
    fn groups_tables_get_the_sequence_suffix() {
        assert_eq!(
            insert_target_table("INSERT INTO user_groups VALUES (1)"),
            Some("user_groups_g".to_string())
        );
    }

    #[test]
    fn non_inserts_do_not_match() {
        assert_eq!(insert_target_table("UPDATE posts SET id = 1"), None);
        assert_eq!(
            insert_target_table("SELECT 'INSERT INTO posts' FROM t"),
            None
        );
    }
}
