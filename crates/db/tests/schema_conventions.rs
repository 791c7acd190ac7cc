use sqlx::PgPool;

/// Every table (except _sqlx_migrations) must have created_at and updated_at as timestamptz.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_all_tables_have_timestamps(pool: PgPool) {
    let tables: Vec<(String,)> = sqlx::query_as(
        "SELECT table_name
         FROM information_schema.tables
         WHERE table_schema = 'public'
           AND table_type = 'BASE TABLE'
           AND table_name != '_sqlx_migrations'
         ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert!(!tables.is_empty());

    for (table,) in &tables {
        for col in ["created_at", "updated_at"] {
            let result: Option<(String,)> = sqlx::query_as(
                "SELECT data_type
                 FROM information_schema.columns
                 WHERE table_schema = 'public' AND table_name = $1 AND column_name = $2",
            )
            .bind(table)
            .bind(col)
            .fetch_optional(&pool)
            .await
            .unwrap();

            let (data_type,) =
                result.unwrap_or_else(|| panic!("Table {table} is missing column {col}"));
            assert_eq!(
                data_type, "timestamp with time zone",
                "Table {table}.{col} should be timestamptz, got {data_type}"
            );
        }
    }
}

/// Every table with updated_at must carry the shared trigger.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_updated_at_triggers_present(pool: PgPool) {
    let missing: Vec<(String,)> = sqlx::query_as(
        "SELECT c.table_name
         FROM information_schema.columns c
         WHERE c.table_schema = 'public'
           AND c.column_name = 'updated_at'
           AND NOT EXISTS (
               SELECT 1 FROM information_schema.triggers t
               WHERE t.event_object_table = c.table_name
                 AND t.action_statement LIKE '%trigger_set_updated_at%'
           )",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert!(missing.is_empty(), "tables without updated_at trigger: {missing:?}");
}

/// The document CHECK rejects rows that reference no subject or both.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_document_requires_exactly_one_subject(pool: PgPool) {
    let result = sqlx::query(
        "INSERT INTO documents (document_type_id, document_number, expiry_date)
         SELECT id, 'X', CURRENT_DATE FROM document_types LIMIT 1",
    )
    .execute(&pool)
    .await;
    let err = result.unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.constraint(), Some("ck_documents_single_subject"));
}
