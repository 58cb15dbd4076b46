#![cfg(feature = "sqlite")]

use mythdb::prelude::*;
use tokio::runtime::Runtime;

fn sqlite_settings(database: &str) -> ConnectionSettings {
    ConnectionSettings::new(DriverKind::Sqlite, "", "", "", database)
}

#[test]
fn close_before_first_use_does_not_connect() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    let dir = tempfile::tempdir()?;
    let base = dir.path().join("untouched");

    rt.block_on(async {
        let mut db = Database::new(sqlite_settings(base.to_str().unwrap()));

        // Closing a never-used facade is a no-op; nothing connects, no file
        // appears.
        assert!(!db.close().await);
        assert!(!db.is_active());
        assert!(!dir.path().join("untouched.sqlite3").exists());

        // The facade is still usable afterwards.
        let res = db.query("SELECT 1", false).await?;
        assert!(res.is_valid());
        assert!(db.is_active());
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}

#[test]
fn operations_after_close_fail_with_a_connection_error() -> Result<(), Box<dyn std::error::Error>>
{
    let rt = Runtime::new()?;
    let dir = tempfile::tempdir()?;
    let base = dir.path().join("closed");

    rt.block_on(async {
        let mut db = Database::new(sqlite_settings(base.to_str().unwrap()));
        db.query("SELECT 1", false).await?;
        assert!(db.close().await);
        assert!(!db.is_active());

        match db.query("SELECT 1", false).await {
            Err(DbError::ConnectionError(_)) => {}
            other => panic!("expected a connection error, got {other:?}"),
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}

#[test]
fn every_operation_triggers_the_lazy_connection() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    let dir = tempfile::tempdir()?;
    let base = dir.path().join("lazy");

    rt.block_on(async {
        // escape() is forwarded like everything else, so it connects too.
        let mut db = Database::new(sqlite_settings(base.to_str().unwrap()));
        assert!(!db.is_active());
        let escaped = db.escape("it's").await?;
        assert_eq!(escaped, "it''s");
        assert!(db.is_active());
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}

#[test]
fn positional_result_access_is_absolute_on_sqlite() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    let dir = tempfile::tempdir()?;
    let base = dir.path().join("positional");

    rt.block_on(async {
        let mut db = Database::new(sqlite_settings(base.to_str().unwrap()));
        db.query("CREATE TABLE t(n INTEGER)", false).await?;
        for n in [10, 20, 30] {
            db.query(&format!("INSERT INTO t VALUES({n})"), false).await?;
        }

        let mut res = db.query("SELECT n FROM t ORDER BY n", false).await?;
        assert_eq!(
            db.result(&mut res, 2, 0).await?.and_then(|v| v.as_int()),
            Some(30)
        );
        // The cursor did not move: offset 0 still addresses the first row.
        assert_eq!(
            db.result(&mut res, 0, 0).await?.and_then(|v| v.as_int()),
            Some(10)
        );
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}

#[test]
fn handles_from_interleaved_queries_are_independent() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    let dir = tempfile::tempdir()?;
    let base = dir.path().join("interleaved");

    rt.block_on(async {
        let mut db = Database::new(sqlite_settings(base.to_str().unwrap()));
        db.query("CREATE TABLE t(n INTEGER)", false).await?;
        db.query("INSERT INTO t VALUES(1)", false).await?;
        db.query("INSERT INTO t VALUES(2)", false).await?;

        let mut first = db.query("SELECT n FROM t ORDER BY n", false).await?;
        let mut second = db.query("SELECT n FROM t ORDER BY n DESC", false).await?;

        let a = db.fetch_row(&mut first).await?.row().unwrap();
        let b = db.fetch_row(&mut second).await?.row().unwrap();
        assert_eq!(a[0].as_int(), Some(1));
        assert_eq!(b[0].as_int(), Some(2));

        // Each handle keeps its own cursor.
        let a = db.fetch_row(&mut first).await?.row().unwrap();
        assert_eq!(a[0].as_int(), Some(2));
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}
