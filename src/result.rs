use crate::types::DriverKind;

#[cfg(feature = "mysql")]
use crate::mysql::MysqlRows;
#[cfg(feature = "postgres")]
use crate::postgres::PostgresRows;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteRows;

/// Backend-native result payload, one variant per backend.
///
/// Each variant owns the rows the client library produced for one query,
/// together with a fetch cursor; the variant itself is the handle's tag.
#[derive(Debug)]
pub enum NativeResult {
    #[cfg(feature = "mysql")]
    Mysql(MysqlRows),
    #[cfg(feature = "postgres")]
    Postgres(PostgresRows),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteRows),
}

impl NativeResult {
    fn kind(&self) -> DriverKind {
        match self {
            #[cfg(feature = "mysql")]
            NativeResult::Mysql(_) => DriverKind::Mysql,
            #[cfg(feature = "postgres")]
            NativeResult::Postgres(_) => DriverKind::Postgres,
            #[cfg(feature = "sqlite")]
            NativeResult::Sqlite(_) => DriverKind::Sqlite,
        }
    }
}

/// The outcome of one `query` call.
///
/// A valid handle owns exactly one backend-native payload until it is freed
/// (explicitly, or by drop — the payload is owned, so release is
/// deterministic). Freeing twice is a no-op, and every fetch-family operation
/// on a freed or invalid handle reports a sentinel instead of panicking.
#[derive(Debug)]
pub struct DbResult {
    is_valid: bool,
    native: Option<NativeResult>,
}

impl DbResult {
    /// A valid handle wrapping one native payload.
    pub(crate) fn valid(native: NativeResult) -> Self {
        Self {
            is_valid: true,
            native: Some(native),
        }
    }

    /// The handle for a failed query: no payload, not valid.
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            is_valid: false,
            native: None,
        }
    }

    /// Whether the producing query executed without a fatal backend error.
    ///
    /// Stays `true` after the payload has been freed; only fetches care about
    /// the difference.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Which backend produced the payload, while one is held.
    #[must_use]
    pub fn backend(&self) -> Option<DriverKind> {
        self.native.as_ref().map(NativeResult::kind)
    }

    /// Release the native payload. Idempotent.
    pub fn free(&mut self) {
        self.native = None;
    }

    pub(crate) fn native(&self) -> Option<&NativeResult> {
        self.native.as_ref()
    }

    pub(crate) fn native_mut(&mut self) -> Option<&mut NativeResult> {
        if self.is_valid { self.native.as_mut() } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_handle_has_no_tag() {
        let res = DbResult::invalid();
        assert!(!res.is_valid());
        assert_eq!(res.backend(), None);
    }

    #[test]
    fn freeing_twice_is_a_no_op() {
        let mut res = DbResult::invalid();
        res.free();
        res.free();
        assert!(res.native().is_none());
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn valid_handle_reports_its_backend() {
        let rows = SqliteRows::new(vec!["id".to_string()], Vec::new());
        let mut res = DbResult::valid(NativeResult::Sqlite(rows));
        assert!(res.is_valid());
        assert_eq!(res.backend(), Some(DriverKind::Sqlite));

        res.free();
        // Validity is about the query, not the payload.
        assert!(res.is_valid());
        assert_eq!(res.backend(), None);
        assert!(res.native_mut().is_none());
    }
}
