

/// Database-backed tests run only when a Postgres URL is provided and
/// `SKIP_DB_TESTS` is not set.
pub(crate) fn db_tests_enabled() -> bool {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        println!("Skipping database tests (SKIP_DB_TESTS is set)");
        return false;
    }
    if std::env::var("DATABASE_URL").is_err() {
        println!("Skipping database tests (DATABASE_URL missing)");
        return false;
    }
    true
}
