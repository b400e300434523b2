//! # Catalog Repository
//!
//! Room types and package types.
//!
//! A type that is still referenced cannot be deleted:
//! - a room type, while any room uses it
//! - a package type, while any reservation (in any status) uses it
//!
//! Reservations keep pointing at their package for the life of the record,
//! so a booked package stays in the catalog.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use hotelier_core::validation::{validate_description, validate_multiplier_bps, validate_name};
use hotelier_core::{CoreError, PackageMultiplier, PackageType, RoomType};

/// Repository for catalog database operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Room types
    // =========================================================================

    pub async fn insert_room_type(
        &self,
        name: &str,
        description: Option<&str>,
        image_ref: Option<&str>,
    ) -> DbResult<RoomType> {
        validate_name("name", name).map_err(CoreError::from)?;

        let room_type = RoomType {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            description: description.map(str::to_string),
            image_ref: image_ref.map(str::to_string),
        };

        sqlx::query(
            "INSERT INTO room_types (id, name, description, image_ref) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&room_type.id)
        .bind(&room_type.name)
        .bind(&room_type.description)
        .bind(&room_type.image_ref)
        .execute(&self.pool)
        .await?;

        debug!(id = %room_type.id, name = %room_type.name, "Room type created");
        Ok(room_type)
    }

    pub async fn get_room_type(&self, id: &str) -> DbResult<Option<RoomType>> {
        let room_type = sqlx::query_as::<_, RoomType>(
            "SELECT id, name, description, image_ref FROM room_types WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room_type)
    }

    pub async fn list_room_types(&self) -> DbResult<Vec<RoomType>> {
        let types = sqlx::query_as::<_, RoomType>(
            "SELECT id, name, description, image_ref FROM room_types ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(types)
    }

    /// Deletes a room type no room uses.
    pub async fn delete_room_type(&self, id: &str) -> DbResult<()> {
        self.delete_unreferenced(
            "room_types",
            "Room type",
            "SELECT COUNT(*) FROM rooms WHERE room_type_id = ?1",
            id,
        )
        .await
    }

    // =========================================================================
    // Package types
    // =========================================================================

    pub async fn insert_package_type(
        &self,
        name: &str,
        description: Option<&str>,
        image_ref: Option<&str>,
        multiplier: PackageMultiplier,
    ) -> DbResult<PackageType> {
        validate_name("name", name).map_err(CoreError::from)?;
        validate_multiplier_bps(multiplier.bps() as i64).map_err(CoreError::from)?;
        if let Some(text) = description {
            validate_description("description", text).map_err(CoreError::from)?;
        }

        let package = PackageType {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            description: description.map(str::to_string),
            image_ref: image_ref.map(str::to_string),
            multiplier_bps: multiplier.bps() as i64,
        };

        sqlx::query(
            r#"
            INSERT INTO package_types (id, name, description, image_ref, multiplier_bps)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&package.id)
        .bind(&package.name)
        .bind(&package.description)
        .bind(&package.image_ref)
        .bind(package.multiplier_bps)
        .execute(&self.pool)
        .await?;

        debug!(
            id = %package.id,
            name = %package.name,
            multiplier_bps = package.multiplier_bps,
            "Package type created"
        );
        Ok(package)
    }

    pub async fn get_package_type(&self, id: &str) -> DbResult<Option<PackageType>> {
        let package = sqlx::query_as::<_, PackageType>(
            "SELECT id, name, description, image_ref, multiplier_bps FROM package_types WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(package)
    }

    pub async fn list_package_types(&self) -> DbResult<Vec<PackageType>> {
        let packages = sqlx::query_as::<_, PackageType>(
            "SELECT id, name, description, image_ref, multiplier_bps FROM package_types ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(packages)
    }

    /// Deletes a package type no reservation uses.
    pub async fn delete_package_type(&self, id: &str) -> DbResult<()> {
        self.delete_unreferenced(
            "package_types",
            "Package type",
            "SELECT COUNT(*) FROM reservations WHERE package_id = ?1",
            id,
        )
        .await
    }

    /// Check-then-delete in one transaction.
    async fn delete_unreferenced(
        &self,
        table: &str,
        kind: &str,
        reference_count_sql: &str,
        id: &str,
    ) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let references: i64 = sqlx::query_scalar(reference_count_sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if references > 0 {
            return Err(CoreError::TypeInUse {
                kind: kind.to_string(),
                id: id.to_string(),
            }
            .into());
        }

        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?1"))
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found(kind, id));
        }

        tx.commit().await?;

        debug!(kind = %kind, id = %id, "Catalog entry deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::*;

    #[tokio::test]
    async fn test_package_round_trip() {
        let db = test_db().await;
        let package = seed_package(&db).await;

        let loaded = db.catalog().get_package_type(&package.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Half Board");
        assert_eq!(loaded.multiplier(), PackageMultiplier::from_bps(13_000));
        assert_eq!(db.catalog().list_package_types().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_discounting_multiplier_rejected() {
        let db = test_db().await;
        let result = db
            .catalog()
            .insert_package_type("Promo", None, None, PackageMultiplier::from_bps(9_000))
            .await;

        assert!(matches!(result, Err(DbError::Domain(CoreError::Validation(_)))));
    }

    #[tokio::test]
    async fn test_room_type_in_use_cannot_be_deleted() {
        let db = test_db().await;
        let rooms = seed_rooms(&db, &["101"]).await;

        let result = db.catalog().delete_room_type(&rooms[0].room_type_id).await;
        assert!(matches!(
            result,
            Err(DbError::Domain(CoreError::TypeInUse { .. }))
        ));

        let unused = db.catalog().insert_room_type("Suite", None, None).await.unwrap();
        db.catalog().delete_room_type(&unused.id).await.unwrap();
        assert_eq!(db.catalog().list_room_types().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_package_in_use_cannot_be_deleted() {
        let db = test_db().await;
        seed_rooms(&db, &["101"]).await;
        let package = seed_package(&db).await;
        let unused = db
            .catalog()
            .insert_package_type("Room Only", None, None, PackageMultiplier::ONE)
            .await
            .unwrap();

        book(&db, "101", &package.id, stay(10, 12), 50_000).await;

        let result = db.catalog().delete_package_type(&package.id).await;
        assert!(matches!(
            result,
            Err(DbError::Domain(CoreError::TypeInUse { .. }))
        ));

        db.catalog().delete_package_type(&unused.id).await.unwrap();
        let missing = db.catalog().delete_package_type(&unused.id).await;
        assert!(matches!(missing, Err(DbError::NotFound { .. })));
    }
}
