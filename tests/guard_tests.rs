// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use query_sentinel::guard::{first_keyword, is_safe, is_select, validate};

#[test]
fn test_select_is_safe() {
    assert!(is_safe("SELECT * FROM users"));
}

#[test]
fn test_cte_is_safe() {
    assert!(validate("with cte as (select 1) select * from cte").is_ok());
}

#[test]
fn test_explain_show_describe_are_safe() {
    assert!(is_safe("EXPLAIN SELECT 1"));
    assert!(is_safe("SHOW TABLES"));
    assert!(is_safe("DESCRIBE users"));
    assert!(is_safe("desc users"));
}

#[test]
fn test_writes_are_unsafe() {
    for sql in [
        "INSERT INTO users VALUES (1)",
        "UPDATE users SET name = 'x'",
        "DELETE FROM users",
        "DROP TABLE users",
        "TRUNCATE users",
        "ALTER TABLE users ADD COLUMN x INT",
        "CREATE TABLE t (id INT)",
        "GRANT ALL ON db.* TO 'x'",
        "REPLACE INTO users VALUES (1)",
        "CALL cleanup()",
        "LOCK TABLES users WRITE",
    ] {
        assert!(!is_safe(sql), "expected unsafe: {}", sql);
    }
}

#[test]
fn test_empty_input_is_unsafe() {
    assert!(!is_safe(""));
    assert!(!is_safe("   "));
    assert!(!is_safe("-- just a comment"));
}

#[test]
fn test_validate_rejects_insert() {
    let err = validate("INSERT INTO users VALUES (1)").unwrap_err();
    assert!(err.to_string().contains("unsafe_query"));
}

#[test]
fn test_validate_rejects_empty() {
    assert!(validate("").is_err());
}

#[test]
fn test_is_select_only_for_select_and_with() {
    assert!(is_select("SELECT 1"));
    assert!(is_select("WITH x AS (SELECT 1) SELECT * FROM x"));
    assert!(!is_select("EXPLAIN SELECT 1"));
    assert!(!is_select("SHOW TABLES"));
}

#[test]
fn test_keyword_is_case_insensitive() {
    assert!(is_safe("select 1"));
    assert_eq!(first_keyword("  select 1").as_deref(), Some("SELECT"));
}

#[test]
fn test_keyword_extracted_through_comments() {
    assert_eq!(
        first_keyword("/* leading */ SELECT 1").as_deref(),
        Some("SELECT")
    );
}
