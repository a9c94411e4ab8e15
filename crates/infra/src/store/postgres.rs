//! Postgres-backed catalog store implementation.
//!
//! The store constraints live in the schema, which makes the database the true
//! enforcement point for concurrent requests:
//!
//! | constraint | enforces | surfaces as |
//! |---|---|---|
//! | `categories_name_key` | unique category name | `Duplicate` |
//! | `parts_pkey` | unique serial number | `Duplicate` |
//! | `parts_location_key` | one part per physical slot | `Duplicate` |
//! | `parts_category_fk` (`ON DELETE RESTRICT`) | parts reference existing categories | `Referenced` |
//! | `categories_parent_fk` (`ON DELETE SET NULL`) | children of a deleted category become roots | – |
//!
//! Two rules need more than a constraint, because a root category may never
//! hold parts:
//! - part writes only go through when `$4` names a non-root category, read
//!   under `FOR SHARE`
//! - category deletes and re-rooting run in a transaction that locks the
//!   affected rows and refuses when a category about to become a root still
//!   holds parts (`Referenced`)
//!
//! ## Error Mapping
//!
//! | PostgreSQL error code | StoreError |
//! |---|---|
//! | `23505` unique violation | `Duplicate` |
//! | `23503` foreign key violation | `Referenced` |
//! | anything else, pool/network errors | `Backend` |

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use stockroom_core::CategoryId;
use stockroom_inventory::{CategoryRecord, Location, NewCategory, PartRecord};

use super::r#trait::{CatalogStore, PartSearch, StoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id          UUID PRIMARY KEY,
    name        TEXT NOT NULL,
    parent_id   UUID NULL,
    CONSTRAINT categories_name_key UNIQUE (name),
    CONSTRAINT categories_parent_fk FOREIGN KEY (parent_id)
        REFERENCES categories (id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS categories_parent_idx ON categories (parent_id);

CREATE TABLE IF NOT EXISTS parts (
    serial_number     TEXT NOT NULL,
    name              TEXT NOT NULL,
    description       TEXT NOT NULL,
    category_id       UUID NOT NULL,
    quantity          BIGINT NOT NULL CHECK (quantity >= 0),
    price             DOUBLE PRECISION NOT NULL CHECK (price > 0),
    location_room     TEXT NOT NULL,
    location_bookcase BIGINT NOT NULL,
    location_shelf    BIGINT NOT NULL,
    location_cuvette  BIGINT NOT NULL,
    location_column   BIGINT NOT NULL,
    location_row      BIGINT NOT NULL,
    CONSTRAINT parts_pkey PRIMARY KEY (serial_number),
    CONSTRAINT parts_location_key UNIQUE (
        location_room, location_bookcase, location_shelf,
        location_cuvette, location_column, location_row
    ),
    CONSTRAINT parts_category_fk FOREIGN KEY (category_id)
        REFERENCES categories (id) ON DELETE RESTRICT
);

CREATE INDEX IF NOT EXISTS parts_category_idx ON parts (category_id);
"#;

const PART_COLUMNS: &str = "serial_number, name, description, category_id, quantity, price, \
     location_room, location_bookcase, location_shelf, location_cuvette, location_column, location_row";

/// Connection settings for [`PostgresCatalogStore::connect`].
#[derive(Debug, Clone)]
pub struct PostgresOptions {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

/// Postgres-backed catalog store.
///
/// ## Thread Safety
///
/// Uses SQLx connection pool which is thread-safe (Arc + Send + Sync).
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
}

impl PostgresCatalogStore {
    /// Create a new PostgresCatalogStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool and make sure the schema exists.
    pub async fn connect(options: &PostgresOptions) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect(&options.database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Create tables, constraints and indexes if they are missing.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn fetch_parts(
        &self,
        operation: &str,
        query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> Result<Vec<PartRecord>, StoreError> {
        let rows = query
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        rows.iter().map(part_from_row).collect()
    }
}

#[async_trait::async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[instrument(skip(self), fields(name = %category.name), err)]
    async fn insert_category(&self, category: NewCategory) -> Result<CategoryRecord, StoreError> {
        let record = category.into_record(CategoryId::new());
        sqlx::query("INSERT INTO categories (id, name, parent_id) VALUES ($1, $2, $3)")
            .bind(record.id.as_uuid())
            .bind(&record.name)
            .bind(record.parent.map(Uuid::from))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_category", e))?;
        Ok(record)
    }

    #[instrument(skip(self), err)]
    async fn category_by_id(&self, id: CategoryId) -> Result<Option<CategoryRecord>, StoreError> {
        let row = sqlx::query("SELECT id, name, parent_id FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("category_by_id", e))?;
        row.as_ref().map(category_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn category_by_name(&self, name: &str) -> Result<Option<CategoryRecord>, StoreError> {
        let row = sqlx::query("SELECT id, name, parent_id FROM categories WHERE name = $1")
            .bind(name)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("category_by_name", e))?;
        row.as_ref().map(category_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, StoreError> {
        // UUIDv7 ids sort by creation time.
        let rows = sqlx::query("SELECT id, name, parent_id FROM categories ORDER BY id ASC")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_categories", e))?;
        rows.iter().map(category_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn child_categories(&self, parent: CategoryId) -> Result<Vec<CategoryRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, parent_id FROM categories WHERE parent_id = $1 ORDER BY id ASC",
        )
        .bind(parent.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("child_categories", e))?;
        rows.iter().map(category_from_row).collect()
    }

    #[instrument(skip(self), fields(id = %category.id), err)]
    async fn update_category(&self, category: CategoryRecord) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("update_category", e))?;

        // The row lock waits for in-flight part inserts, whose guard holds FOR SHARE.
        let locked = sqlx::query("SELECT id FROM categories WHERE id = $1 FOR UPDATE")
            .bind(category.id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_category", e))?;
        if locked.is_none() {
            return Ok(false);
        }

        if category.parent.is_none() {
            let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM parts WHERE category_id = $1) AS found")
                .bind(category.id.as_uuid())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("update_category", e))?;
            if exists_flag(&row)? {
                return Err(StoreError::Referenced(format!(
                    "category {} holds parts and can't become a base category",
                    category.name
                )));
            }
        }

        sqlx::query("UPDATE categories SET name = $2, parent_id = $3 WHERE id = $1")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .bind(category.parent.map(Uuid::from))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_category", e))?;
        tx.commit().await.map_err(|e| map_sqlx_error("update_category", e))?;
        Ok(true)
    }

    #[instrument(skip(self), err)]
    async fn delete_category(&self, id: CategoryId) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("delete_category", e))?;

        // Lock the children that ON DELETE SET NULL is about to promote, so a
        // part insert racing into one of them either lands first and is seen
        // below, or waits and then fails its non-root guard.
        sqlx::query("SELECT id FROM categories WHERE parent_id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_category", e))?;

        let row = sqlx::query(
            "SELECT EXISTS (\
                SELECT 1 FROM parts p JOIN categories c ON p.category_id = c.id \
                WHERE c.parent_id = $1\
             ) AS found",
        )
        .bind(id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("delete_category", e))?;
        if exists_flag(&row)? {
            return Err(StoreError::Referenced(format!(
                "category {id} can't be deleted: a child category is still referenced by parts"
            )));
        }

        // Parts of the category itself are refused by parts_category_fk.
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_category", e))?;
        tx.commit().await.map_err(|e| map_sqlx_error("delete_category", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, part), fields(serial_number = %part.serial_number), err)]
    async fn insert_part(&self, part: PartRecord) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO parts ({PART_COLUMNS}) \
             SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12 \
             WHERE {PLACEABLE_CATEGORY}"
        );
        let result = bind_part(sqlx::query(&sql), &part)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_part", e))?;
        if result.rows_affected() == 0 {
            return Err(not_placeable(&part));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn part_by_serial(&self, serial_number: &str) -> Result<Option<PartRecord>, StoreError> {
        let sql = format!("SELECT {PART_COLUMNS} FROM parts WHERE serial_number = $1");
        let row = sqlx::query(&sql)
            .bind(serial_number)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("part_by_serial", e))?;
        row.as_ref().map(part_from_row).transpose()
    }

    #[instrument(skip(self, location), err)]
    async fn part_at_location(
        &self,
        location: &Location,
        excluding_serial: Option<&str>,
    ) -> Result<Option<PartRecord>, StoreError> {
        let sql = format!(
            "SELECT {PART_COLUMNS} FROM parts \
             WHERE location_room = $1 AND location_bookcase = $2 AND location_shelf = $3 \
               AND location_cuvette = $4 AND location_column = $5 AND location_row = $6 \
               AND ($7::text IS NULL OR serial_number <> $7) \
             LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(&location.room)
            .bind(location.bookcase)
            .bind(location.shelf)
            .bind(location.cuvette)
            .bind(location.column)
            .bind(location.row)
            .bind(excluding_serial)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("part_at_location", e))?;
        row.as_ref().map(part_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn any_part_in(&self, category: CategoryId) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM parts WHERE category_id = $1) AS found")
            .bind(category.as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("any_part_in", e))?;
        exists_flag(&row)
    }

    #[instrument(skip(self), err)]
    async fn list_parts(&self) -> Result<Vec<PartRecord>, StoreError> {
        let sql = format!("SELECT {PART_COLUMNS} FROM parts ORDER BY serial_number ASC");
        self.fetch_parts("list_parts", sqlx::query(&sql)).await
    }

    #[instrument(skip(self, search), fields(pattern = %search.pattern), err)]
    async fn search_parts(&self, search: &PartSearch) -> Result<Vec<PartRecord>, StoreError> {
        let sql = format!(
            "SELECT {PART_COLUMNS} FROM parts \
             WHERE serial_number ~ $1 OR name ~ $1 OR description ~ $1 OR location_room ~ $1 \
                OR category_id = ANY($2) \
             ORDER BY serial_number ASC"
        );
        let ids: Vec<Uuid> = search.category_ids.iter().map(|id| Uuid::from(*id)).collect();
        let query = sqlx::query(&sql).bind(search.pattern.as_str()).bind(ids);
        self.fetch_parts("search_parts", query).await
    }

    #[instrument(skip(self, part), err)]
    async fn replace_part(&self, serial_number: &str, part: PartRecord) -> Result<bool, StoreError> {
        let sql = "UPDATE parts SET serial_number = $1, name = $2, description = $3, category_id = $4, \
                   quantity = $5, price = $6, location_room = $7, location_bookcase = $8, \
                   location_shelf = $9, location_cuvette = $10, location_column = $11, location_row = $12 \
                   WHERE serial_number = $13";
        let sql = format!("{sql} AND {PLACEABLE_CATEGORY}");
        let result = bind_part(sqlx::query(&sql), &part)
            .bind(serial_number)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("replace_part", e))?;
        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // Nothing updated: either the part is gone or the target category is not placeable.
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM parts WHERE serial_number = $1) AS found")
            .bind(serial_number)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("replace_part", e))?;
        if exists_flag(&row)? {
            return Err(not_placeable(&part));
        }
        Ok(false)
    }

    #[instrument(skip(self), err)]
    async fn delete_part(&self, serial_number: &str) -> Result<Option<PartRecord>, StoreError> {
        let sql = format!("DELETE FROM parts WHERE serial_number = $1 RETURNING {PART_COLUMNS}");
        let row = sqlx::query(&sql)
            .bind(serial_number)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_part", e))?;
        row.as_ref().map(part_from_row).transpose()
    }
}

/// Guard shared by part writes: `$4` (the part's category) exists and is not a root.
/// FOR SHARE blocks a concurrent delete or re-rooting of that category until the write ends.
const PLACEABLE_CATEGORY: &str =
    "EXISTS (SELECT 1 FROM categories WHERE id = $4 AND parent_id IS NOT NULL FOR SHARE)";

fn not_placeable(part: &PartRecord) -> StoreError {
    StoreError::Referenced(format!(
        "category {} does not exist or is a base category and can't hold parts",
        part.category
    ))
}

fn exists_flag(row: &PgRow) -> Result<bool, StoreError> {
    row.try_get("found")
        .map_err(|e| StoreError::Backend(format!("failed to read exists flag: {e}")))
}

fn bind_part<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    part: &'q PartRecord,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(&part.serial_number)
        .bind(&part.name)
        .bind(&part.description)
        .bind(part.category.as_uuid())
        .bind(part.quantity)
        .bind(part.price)
        .bind(&part.location.room)
        .bind(part.location.bookcase)
        .bind(part.location.shelf)
        .bind(part.location.cuvette)
        .bind(part.location.column)
        .bind(part.location.row)
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate(duplicate_message(&constraint)),
                Some("23503") => StoreError::Referenced(format!(
                    "{operation} rejected by {constraint}: referenced category is missing or still in use"
                )),
                _ => StoreError::Backend(format!(
                    "database error in {operation}: {}",
                    db_err.message()
                )),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Backend(format!("timed out acquiring a connection in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

fn duplicate_message(constraint: &str) -> String {
    match constraint {
        "categories_name_key" => "category name already exists".to_string(),
        "parts_pkey" => "serial number already exists".to_string(),
        "parts_location_key" => "location is already taken".to_string(),
        other => format!("unique constraint {other} violated"),
    }
}

// SQLx row types

#[derive(Debug)]
struct CategoryRow {
    id: Uuid,
    name: String,
    parent_id: Option<Uuid>,
}

impl<'r> FromRow<'r, PgRow> for CategoryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CategoryRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            parent_id: row.try_get("parent_id")?,
        })
    }
}

impl From<CategoryRow> for CategoryRecord {
    fn from(row: CategoryRow) -> Self {
        CategoryRecord {
            id: CategoryId::from_uuid(row.id),
            name: row.name,
            parent: row.parent_id.map(CategoryId::from_uuid),
        }
    }
}

#[derive(Debug)]
struct PartRow {
    serial_number: String,
    name: String,
    description: String,
    category_id: Uuid,
    quantity: i64,
    price: f64,
    location_room: String,
    location_bookcase: i64,
    location_shelf: i64,
    location_cuvette: i64,
    location_column: i64,
    location_row: i64,
}

impl<'r> FromRow<'r, PgRow> for PartRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(PartRow {
            serial_number: row.try_get("serial_number")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category_id: row.try_get("category_id")?,
            quantity: row.try_get("quantity")?,
            price: row.try_get("price")?,
            location_room: row.try_get("location_room")?,
            location_bookcase: row.try_get("location_bookcase")?,
            location_shelf: row.try_get("location_shelf")?,
            location_cuvette: row.try_get("location_cuvette")?,
            location_column: row.try_get("location_column")?,
            location_row: row.try_get("location_row")?,
        })
    }
}

impl From<PartRow> for PartRecord {
    fn from(row: PartRow) -> Self {
        PartRecord {
            serial_number: row.serial_number,
            name: row.name,
            description: row.description,
            category: CategoryId::from_uuid(row.category_id),
            quantity: row.quantity,
            price: row.price,
            location: Location {
                room: row.location_room,
                bookcase: row.location_bookcase,
                shelf: row.location_shelf,
                cuvette: row.location_cuvette,
                column: row.location_column,
                row: row.location_row,
            },
        }
    }
}

fn category_from_row(row: &PgRow) -> Result<CategoryRecord, StoreError> {
    CategoryRow::from_row(row)
        .map(Into::into)
        .map_err(|e| StoreError::Backend(format!("failed to deserialize category row: {e}")))
}

fn part_from_row(row: &PgRow) -> Result<PartRecord, StoreError> {
    PartRow::from_row(row)
        .map(Into::into)
        .map_err(|e| StoreError::Backend(format!("failed to deserialize part row: {e}")))
}
