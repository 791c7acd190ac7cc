//! Read-only repository for the `vehicles` table.

use fleetdocs_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::vehicle::{normalize_plate, Vehicle};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, client_id, plate, brand, model, year, is_active, created_at, updated_at";

/// Provides lookups for vehicles.
pub struct VehicleRepo;

impl VehicleRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Vehicle>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vehicles WHERE id = $1");
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a client's vehicle by plate, ignoring case, spaces, dots and dashes.
    pub async fn find_by_plate(
        pool: &PgPool,
        client_id: DbId,
        plate: &str,
    ) -> Result<Option<Vehicle>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM vehicles
             WHERE client_id = $1
               AND regexp_replace(UPPER(plate), '[[:space:].-]', '', 'g') = $2"
        );
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(client_id)
            .bind(normalize_plate(plate))
            .fetch_optional(pool)
            .await
    }

    /// Read a vehicle and hold a share lock on it until the transaction ends.
    pub async fn lock_for_share(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Vehicle>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vehicles WHERE id = $1 FOR SHARE");
        sqlx::query_as::<_, Vehicle>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }
}
