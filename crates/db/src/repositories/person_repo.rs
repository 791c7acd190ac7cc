//! Read-only repository for the `persons` table.

use fleetdocs_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::person::Person;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, client_id, run_number, run_check, first_names, last_names, \
    is_active, created_at, updated_at";

/// Provides lookups for persons.
pub struct PersonRepo;

impl PersonRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Person>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM persons WHERE id = $1");
        sqlx::query_as::<_, Person>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a client's person by RUN body (digits before the check digit).
    pub async fn find_by_run(
        pool: &PgPool,
        client_id: DbId,
        run_number: &str,
    ) -> Result<Option<Person>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM persons WHERE client_id = $1 AND run_number = $2"
        );
        sqlx::query_as::<_, Person>(&query)
            .bind(client_id)
            .bind(run_number)
            .fetch_optional(pool)
            .await
    }

    /// Read a person and hold a share lock on it until the transaction ends.
    pub async fn lock_for_share(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Person>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM persons WHERE id = $1 FOR SHARE");
        sqlx::query_as::<_, Person>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }
}
