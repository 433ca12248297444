use sqlx::PgPool;

/// Number of applied schema migrations; doubles as a connectivity probe.
pub(crate) async fn applied_migrations(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
        .fetch_one(pool)
        .await
}
