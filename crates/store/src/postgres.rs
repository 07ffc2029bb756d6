use async_trait::async_trait;
use common::{PageRequest, PagedResult};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    AuditInfo, EntityId, EntityRecord, Result, RowVersion, StoreError,
    store::{Change, EntityStore, validate_changes},
};

const SELECT_COLUMNS: &str = r#"
    SELECT entity_type, id, row_version, payload,
           created_at, created_by_user_id, created_by_ip, created_by_browser,
           modified_at, modified_by_user_id, modified_by_ip, modified_by_browser
    FROM entities
"#;

/// PostgreSQL-backed entity store implementation.
#[derive(Clone)]
pub struct PostgresEntityStore {
    pool: PgPool,
}

impl PostgresEntityStore {
    /// Creates a new PostgreSQL entity store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_record(row: PgRow) -> Result<EntityRecord> {
        Ok(EntityRecord {
            entity_type: row.try_get("entity_type")?,
            id: EntityId::from_uuid(row.try_get::<Uuid, _>("id")?),
            row_version: RowVersion::new(row.try_get("row_version")?),
            payload: row.try_get("payload")?,
            audit: AuditInfo {
                created_at: row.try_get("created_at")?,
                created_by_user_id: row
                    .try_get::<Option<Uuid>, _>("created_by_user_id")?
                    .map(EntityId::from_uuid),
                created_by_ip: row.try_get("created_by_ip")?,
                created_by_browser: row.try_get("created_by_browser")?,
                modified_at: row.try_get("modified_at")?,
                modified_by_user_id: row
                    .try_get::<Option<Uuid>, _>("modified_by_user_id")?
                    .map(EntityId::from_uuid),
                modified_by_ip: row.try_get("modified_by_ip")?,
                modified_by_browser: row.try_get("modified_by_browser")?,
            },
        })
    }

    /// Reads the current row version inside `tx`, for error reporting after
    /// a guarded write matched no row.
    async fn version_conflict(
        tx: &mut Transaction<'_, Postgres>,
        entity_type: &str,
        id: EntityId,
        expected: RowVersion,
    ) -> StoreError {
        let current: std::result::Result<Option<i64>, sqlx::Error> = sqlx::query_scalar(
            "SELECT row_version FROM entities WHERE entity_type = $1 AND id = $2",
        )
        .bind(entity_type)
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await;

        match current {
            Ok(Some(actual)) => StoreError::ConcurrencyConflict {
                entity_type: entity_type.to_string(),
                id,
                expected,
                actual: RowVersion::new(actual),
            },
            Ok(None) => StoreError::not_found(entity_type, id),
            Err(e) => StoreError::Database(e),
        }
    }

    async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        mut record: EntityRecord,
    ) -> Result<EntityRecord> {
        record.row_version = RowVersion::first();
        let audit = &record.audit;

        let inserted = sqlx::query(
            r#"
            INSERT INTO entities (
                entity_type, id, row_version, payload,
                created_at, created_by_user_id, created_by_ip, created_by_browser
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (entity_type, id) DO NOTHING
            "#,
        )
        .bind(&record.entity_type)
        .bind(record.id.as_uuid())
        .bind(record.row_version.as_i64())
        .bind(&record.payload)
        .bind(audit.created_at)
        .bind(audit.created_by_user_id.map(|id| id.as_uuid()))
        .bind(&audit.created_by_ip)
        .bind(&audit.created_by_browser)
        .execute(&mut **tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(StoreError::DuplicateKey {
                entity_type: record.entity_type,
                id: record.id,
            });
        }
        Ok(record)
    }

    async fn update(
        tx: &mut Transaction<'_, Postgres>,
        record: EntityRecord,
        expected: RowVersion,
    ) -> Result<EntityRecord> {
        let audit = &record.audit;

        let row: Option<PgRow> = sqlx::query(
            r#"
            UPDATE entities
            SET payload = $1,
                row_version = row_version + 1,
                modified_at = $2,
                modified_by_user_id = $3,
                modified_by_ip = $4,
                modified_by_browser = $5
            WHERE entity_type = $6 AND id = $7 AND row_version = $8
            RETURNING entity_type, id, row_version, payload,
                      created_at, created_by_user_id, created_by_ip, created_by_browser,
                      modified_at, modified_by_user_id, modified_by_ip, modified_by_browser
            "#,
        )
        .bind(&record.payload)
        .bind(audit.modified_at)
        .bind(audit.modified_by_user_id.map(|id| id.as_uuid()))
        .bind(&audit.modified_by_ip)
        .bind(&audit.modified_by_browser)
        .bind(&record.entity_type)
        .bind(record.id.as_uuid())
        .bind(expected.as_i64())
        .fetch_optional(&mut **tx)
        .await?;

        match row {
            Some(row) => Self::row_to_record(row),
            None => Err(Self::version_conflict(tx, &record.entity_type, record.id, expected).await),
        }
    }

    async fn delete(
        tx: &mut Transaction<'_, Postgres>,
        entity_type: &str,
        id: EntityId,
        expected: RowVersion,
    ) -> Result<()> {
        let deleted = sqlx::query(
            "DELETE FROM entities WHERE entity_type = $1 AND id = $2 AND row_version = $3",
        )
        .bind(entity_type)
        .bind(id.as_uuid())
        .bind(expected.as_i64())
        .execute(&mut **tx)
        .await?;

        if deleted.rows_affected() == 0 {
            return Err(Self::version_conflict(tx, entity_type, id, expected).await);
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for PostgresEntityStore {
    async fn get(&self, entity_type: &str, id: EntityId) -> Result<Option<EntityRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE entity_type = $1 AND id = $2");
        let row = sqlx::query(&sql)
            .bind(entity_type)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn list(
        &self,
        entity_type: &str,
        page: PageRequest,
    ) -> Result<PagedResult<EntityRecord>> {
        let total = self.count(entity_type).await?;

        let sql = format!(
            "{SELECT_COLUMNS} WHERE entity_type = $1 ORDER BY created_at ASC, id ASC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&sql)
            .bind(entity_type)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(Self::row_to_record)
            .collect::<Result<Vec<_>>>()?;

        Ok(PagedResult::new(items, total, page))
    }

    async fn count(&self, entity_type: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entities WHERE entity_type = $1")
            .bind(entity_type)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn commit(&self, changes: Vec<Change>) -> Result<Vec<EntityRecord>> {
        validate_changes(&changes)?;

        // Dropping the transaction on an early return rolls it back
        let mut tx = self.pool.begin().await?;
        let mut written = Vec::with_capacity(changes.len());

        for change in changes {
            match change {
                Change::Insert(record) => {
                    written.push(Self::insert(&mut tx, record).await?);
                }
                Change::Update { record, expected } => {
                    written.push(Self::update(&mut tx, record, expected).await?);
                }
                Change::Delete {
                    entity_type,
                    id,
                    expected,
                } => {
                    Self::delete(&mut tx, &entity_type, id, expected).await?;
                }
            }
        }

        tx.commit().await?;
        Ok(written)
    }
}
