use super::{new_sensor_id, SensorStore, StoreError, StoreResult};
use crate::config::DatabaseConfig;
use crate::model::{Annotation, Sensor};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::query::QueryAs;
use sqlx::types::Json;
use sqlx::{FromRow, Postgres};
use std::time::Duration;
use tracing::{debug, info, instrument};

const SENSOR_COLUMNS: &str = "uuid, collection, name, unit, ingress, annotations";

/// Row shape of the `sensors` table
#[derive(Debug, Clone, FromRow)]
struct SensorRow {
    uuid: String,
    collection: String,
    name: String,
    unit: String,
    ingress: String,
    annotations: Json<Vec<Annotation>>,
}

impl From<SensorRow> for Sensor {
    fn from(row: SensorRow) -> Self {
        Self {
            id: row.uuid,
            collection: row.collection,
            name: row.name,
            unit: row.unit,
            ingress: row.ingress,
            annotations: row.annotations.0,
        }
    }
}

type SensorQuery<'q> = QueryAs<'q, Postgres, SensorRow, PgArguments>;

/// Sensor store backed by PostgreSQL
pub struct PgSensorStore {
    pool: PgPool,
}

impl PgSensorStore {
    /// Create a new store with a connection pool.
    ///
    /// Without `database.url` the standard `PG*` environment variables are
    /// used to locate the server.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)));

        let pool = match &config.url {
            Some(url) => options.connect(url).await,
            None => options.connect_with(PgConnectOptions::new()).await,
        }
        .context("Failed to connect to PostgreSQL")?;

        info!("Connected to PostgreSQL database");

        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;

        info!("Database migrations completed");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Append a `WHERE` clause for every set field of `template`.
///
/// Placeholders are numbered from `*param_count + 1`; binding must follow
/// the same order via [`bind_filters`].
fn push_filters(sql: &mut String, template: &Sensor, param_count: &mut usize) {
    sql.push_str(" WHERE 1=1");

    for (column, value) in scalar_fields(template) {
        if !value.is_empty() {
            *param_count += 1;
            sql.push_str(&format!(" AND {} = ${}", column, param_count));
        }
    }

    if !template.annotations.is_empty() {
        *param_count += 1;
        sql.push_str(&format!(" AND annotations @> ${}", param_count));
    }
}

fn bind_filters<'q>(mut query: SensorQuery<'q>, template: &'q Sensor) -> SensorQuery<'q> {
    for (_, value) in scalar_fields(template) {
        if !value.is_empty() {
            query = query.bind(value);
        }
    }

    if !template.annotations.is_empty() {
        query = query.bind(Json(template.annotations.clone()));
    }

    query
}

fn scalar_fields(template: &Sensor) -> [(&'static str, &str); 5] {
    [
        ("uuid", template.id.as_str()),
        ("collection", template.collection.as_str()),
        ("name", template.name.as_str()),
        ("unit", template.unit.as_str()),
        ("ingress", template.ingress.as_str()),
    ]
}

fn map_insert_error(id: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        match db.kind() {
            ErrorKind::UniqueViolation => return StoreError::AlreadyExists(id.to_string()),
            ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                return StoreError::InvalidRecord(db.message().to_string())
            }
            _ => {}
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl SensorStore for PgSensorStore {
    #[instrument(skip(self, sensor), fields(id = %sensor.id))]
    async fn create_sensor(&self, mut sensor: Sensor) -> StoreResult<Sensor> {
        if sensor.id.is_empty() {
            sensor.id = new_sensor_id();
        }

        let row = sqlx::query_as::<_, SensorRow>(&format!(
            r#"
            INSERT INTO sensors ({SENSOR_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SENSOR_COLUMNS}
            "#
        ))
        .bind(&sensor.id)
        .bind(&sensor.collection)
        .bind(&sensor.name)
        .bind(&sensor.unit)
        .bind(&sensor.ingress)
        .bind(Json(&sensor.annotations))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(&sensor.id, e))?;

        debug!(id = %row.uuid, "Sensor inserted");

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn get_sensors(&self, query: &Sensor) -> StoreResult<Vec<Sensor>> {
        let mut sql = format!("SELECT {SENSOR_COLUMNS} FROM sensors");
        let mut param_count = 0;
        push_filters(&mut sql, query, &mut param_count);
        sql.push_str(" ORDER BY uuid ASC");

        let rows = bind_filters(sqlx::query_as::<_, SensorRow>(&sql), query)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn update_sensors(&self, selector: &Sensor, update: &Sensor) -> StoreResult<Vec<Sensor>> {
        // Empty values keep the current column; an empty annotation list
        // keeps the current annotations.
        let mut sql = String::from(
            r#"
            UPDATE sensors SET
                collection = COALESCE(NULLIF($1, ''), collection),
                name = COALESCE(NULLIF($2, ''), name),
                unit = COALESCE(NULLIF($3, ''), unit),
                ingress = COALESCE(NULLIF($4, ''), ingress),
                annotations = CASE
                    WHEN jsonb_array_length($5) = 0 THEN annotations
                    ELSE $5
                END
            "#,
        );
        let mut param_count = 5;
        push_filters(&mut sql, selector, &mut param_count);
        sql.push_str(&format!(" RETURNING {SENSOR_COLUMNS}"));

        let query = sqlx::query_as::<_, SensorRow>(&sql)
            .bind(&update.collection)
            .bind(&update.name)
            .bind(&update.unit)
            .bind(&update.ingress)
            .bind(Json(update.annotations.clone()));

        let mut rows = bind_filters(query, selector).fetch_all(&self.pool).await?;
        rows.sort_by(|a, b| a.uuid.cmp(&b.uuid));

        debug!(updated = rows.len(), "Sensors updated");

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_template_has_no_filters() {
        let mut sql = String::from("SELECT * FROM sensors");
        let mut param_count = 0;
        push_filters(&mut sql, &Sensor::default(), &mut param_count);

        assert_eq!(sql, "SELECT * FROM sensors WHERE 1=1");
        assert_eq!(param_count, 0);
    }

    #[test]
    fn test_filters_number_placeholders_in_order() {
        let template = Sensor {
            collection: "lab".to_string(),
            ingress: "mqtt".to_string(),
            annotations: vec![Annotation::new("room", "b")],
            ..Default::default()
        };
        let mut sql = String::new();
        let mut param_count = 5;
        push_filters(&mut sql, &template, &mut param_count);

        assert_eq!(
            sql,
            " WHERE 1=1 AND collection = $6 AND ingress = $7 AND annotations @> $8"
        );
        assert_eq!(param_count, 8);
    }

    #[test]
    fn test_row_conversion() {
        let row = SensorRow {
            uuid: "fake1".to_string(),
            collection: "c".to_string(),
            name: "n".to_string(),
            unit: "u".to_string(),
            ingress: "i".to_string(),
            annotations: Json(vec![Annotation::new("foo", "1 2 3")]),
        };

        let sensor: Sensor = row.into();
        assert_eq!(sensor.id, "fake1");
        assert_eq!(sensor.annotations, vec![Annotation::new("foo", "1 2 3")]);
    }
}
