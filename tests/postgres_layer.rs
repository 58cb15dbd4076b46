#![cfg(feature = "postgres")]

// These tests need a running PostgreSQL server and are ignored by default.
// Point them at a scratch database with:
//   MYTHDB_TEST_PG_HOST=localhost:5432 MYTHDB_TEST_PG_USER=postgres \
//   MYTHDB_TEST_PG_PASSWORD=postgres MYTHDB_TEST_PG_DB=mythdb_test \
//   cargo test -- --ignored

use mythdb::prelude::*;
use tokio::runtime::Runtime;

fn pg_settings() -> ConnectionSettings {
    let host = std::env::var("MYTHDB_TEST_PG_HOST").unwrap_or_else(|_| "localhost".to_string());
    let user = std::env::var("MYTHDB_TEST_PG_USER").unwrap_or_else(|_| "postgres".to_string());
    let password =
        std::env::var("MYTHDB_TEST_PG_PASSWORD").unwrap_or_else(|_| "postgres".to_string());
    let db = std::env::var("MYTHDB_TEST_PG_DB").unwrap_or_else(|_| "mythdb_test".to_string());
    ConnectionSettings::new(DriverKind::Postgres, host, user, password, db)
}

#[test]
#[ignore = "needs a running PostgreSQL server"]
fn select_one_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let mut db = Database::new(pg_settings());
        let mut res = db.query("SELECT 1", false).await?;
        assert!(res.is_valid());
        match db.fetch_row(&mut res).await? {
            Fetched::Row(row) => assert_eq!(row[0].as_int(), Some(1)),
            other => panic!("expected a row, got {other:?}"),
        }

        let res = db.query("SELECT * FROM no_such_table", false).await?;
        assert!(!res.is_valid());
        let report = db.error().await?;
        assert_eq!(report.error_no, 0);
        assert!(!report.error_msg.is_empty());

        let version = db.get_version().await?;
        assert_eq!(version.name, "PostgreSQL");
        assert!(version.version.chars().next().unwrap_or('x').is_ascii_digit());

        assert!(db.close().await);
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
#[ignore = "needs a running PostgreSQL server"]
fn comma_limit_is_rewritten_before_execution() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let mut db = Database::new(pg_settings());
        db.query("DROP TABLE IF EXISTS limit_probe", false).await?;
        db.query("CREATE TABLE limit_probe(n INTEGER)", false).await?;
        for n in 1..=20 {
            let res = db
                .query(&format!("INSERT INTO limit_probe VALUES({n})"), false)
                .await?;
            assert!(res.is_valid());
        }

        // MySQL-style pagination: offset 5, count 10 — rows 6..=15.
        let mut res = db
            .query("SELECT n FROM limit_probe ORDER BY n LIMIT 5,10", false)
            .await?;
        assert!(res.is_valid());
        assert_eq!(db.num_rows(&res).await?, Some(10));

        let mut seen = Vec::new();
        while let Fetched::Row(row) = db.fetch_row(&mut res).await? {
            seen.push(row[0].as_int().unwrap());
        }
        assert_eq!(seen, (6..=15).collect::<Vec<i64>>());

        db.query("DROP TABLE limit_probe", false).await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
#[ignore = "needs a running PostgreSQL server"]
fn insert_id_uses_the_sequence_heuristic() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let mut db = Database::new(pg_settings());
        db.query("DROP TABLE IF EXISTS id_probe", false).await?;
        db.query("CREATE TABLE id_probe(id SERIAL PRIMARY KEY, s TEXT)", false)
            .await?;

        let res = db
            .query("INSERT INTO id_probe (s) VALUES ('first')", false)
            .await?;
        assert!(res.is_valid());
        assert_eq!(db.insert_id().await?, Some(1));

        db.query("INSERT INTO id_probe (s) VALUES ('second')", false)
            .await?;
        assert_eq!(db.insert_id().await?, Some(2));

        db.query("DROP TABLE id_probe", false).await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[test]
#[ignore = "needs a running PostgreSQL server"]
fn set_charset_is_unsupported_but_set_names_works() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let mut db = Database::new(pg_settings());
        let res = db.set_names("UTF8").await?;
        assert!(res.is_valid());
        assert!(!db.set_charset("UTF8").await?);

        let escaped = db.escape(r"it's a backslash: \").await?;
        assert_eq!(escaped, r"it''s a backslash: \");
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}
