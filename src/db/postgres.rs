//! PostgreSQL document store. Every collection is a table of
//! `(id TEXT PRIMARY KEY, doc JSONB, seq BIGSERIAL)` inside a schema named
//! after the logical database name.

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

use super::{Collection, DbConfig, DocumentStore, FindOptions, SortDirection, StoreError};

lazy_static::lazy_static! {
    /// Field names are interpolated into index-friendly expressions, so they
    /// must be plain identifiers.
    static ref FIELD_REGEX: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

pub struct PgDocumentStore {
    pool: PgPool,
    schema: String,
    collections_ready: OnceCell<()>,
}

impl PgDocumentStore {
    /// Builds the connection pool without touching the network, so the
    /// service can start while the database is unreachable.
    pub fn connect_lazy(config: &DbConfig) -> Result<Self, StoreError> {
        config.validate()?;

        tracing::info!("Initializing database connection pool...");
        tracing::debug!(
            url = %config.redacted_url(),
            database = %config.database_name,
            "Database settings"
        );

        let options: PgConnectOptions = config.url.parse()?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(1800))
            .test_before_acquire(true)
            .connect_lazy_with(options);

        Ok(Self {
            pool,
            schema: config.database_name.clone(),
            collections_ready: OnceCell::new(),
        })
    }

    fn table(&self, collection: Collection) -> String {
        table_name(&self.schema, collection)
    }

    /// Creates the schema and collection tables once per process. Retried on
    /// the next call if it fails.
    async fn ready(&self) -> Result<(), StoreError> {
        self.collections_ready
            .get_or_try_init(|| self.create_collections())
            .await
            .map(|_| ())
    }

    async fn create_collections(&self) -> Result<(), StoreError> {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS \"{}\"", self.schema))
            .execute(&self.pool)
            .await?;

        for collection in Collection::ALL {
            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    id TEXT PRIMARY KEY,
                    doc JSONB NOT NULL,
                    seq BIGSERIAL
                )
                "#,
                self.table(collection)
            ))
            .execute(&self.pool)
            .await?;
        }

        tracing::debug!(schema = %self.schema, "Collection tables ready");
        Ok(())
    }
}

fn table_name(schema: &str, collection: Collection) -> String {
    format!("\"{}\".\"{}\"", schema, collection.name())
}

/// `doc->>'field'` under byte-order collation, the text value used for
/// filtering, sorting and indexes. Comparisons must not depend on the
/// database locale.
fn text_expr(field: &str) -> Result<String, StoreError> {
    if FIELD_REGEX.is_match(field) {
        Ok(format!("((doc->>'{}') COLLATE \"C\")", field))
    } else {
        Err(StoreError::Config(format!("invalid document field name `{}`", field)))
    }
}

fn json_expr(field: &str) -> Result<String, StoreError> {
    if FIELD_REGEX.is_match(field) {
        Ok(format!("(doc->'{}')", field))
    } else {
        Err(StoreError::Config(format!("invalid document field name `{}`", field)))
    }
}

fn document_id(collection: Collection, doc: &Value) -> Result<String, StoreError> {
    doc.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(StoreError::MissingId(collection))
}

fn map_insert_error(collection: Collection, id: Option<&str>, e: sqlx::Error) -> StoreError {
    let unique = e
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);
    if unique {
        StoreError::DuplicateId {
            collection,
            id: id.unwrap_or("<batch>").to_string(),
        }
    } else {
        StoreError::Database(e)
    }
}

/// Distinct non-null values, ordered by their text form in byte order.
fn distinct_sql(table: &str, field: &str) -> Result<String, StoreError> {
    let expr = json_expr(field)?;
    Ok(format!(
        "SELECT v FROM (SELECT DISTINCT {expr} AS v FROM {table} \
         WHERE {expr} IS NOT NULL AND {expr} <> 'null'::jsonb) d \
         ORDER BY (v #>> '{{}}') COLLATE \"C\"",
        expr = expr,
        table = table
    ))
}

/// Built on the same expression `build_find` filters and sorts on.
fn index_sql(name: &str, table: &str, field: &str) -> Result<String, StoreError> {
    Ok(format!(
        "CREATE INDEX IF NOT EXISTS \"{}\" ON {} ({})",
        name,
        table,
        text_expr(field)?
    ))
}

fn build_find(table: &str, options: &FindOptions) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT doc FROM {}", table));

    if let Some(filter) = &options.filter {
        builder
            .push(" WHERE ")
            .push(text_expr(filter.field)?)
            .push(" = ")
            .push_bind(filter.value.clone());
    }

    match options.sort {
        Some((field, direction)) => {
            let order = match direction {
                SortDirection::Ascending => "ASC NULLS FIRST",
                SortDirection::Descending => "DESC NULLS LAST",
            };
            builder
                .push(" ORDER BY ")
                .push(text_expr(field)?)
                .push(" ")
                .push(order)
                .push(", seq ASC");
        }
        None => {
            builder.push(" ORDER BY seq ASC");
        }
    }

    if let Some(limit) = options.limit {
        builder
            .push(" LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    if options.skip > 0 {
        builder
            .push(" OFFSET ")
            .push_bind(i64::try_from(options.skip).unwrap_or(i64::MAX));
    }

    Ok(builder)
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert_one(&self, collection: Collection, doc: Value) -> Result<(), StoreError> {
        self.ready().await?;
        let id = document_id(collection, &doc)?;

        let result = sqlx::query(&format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2)",
            self.table(collection)
        ))
        .bind(&id)
        .bind(Json(&doc))
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(collection, Some(&id), e))?;

        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(StoreError::NotAcknowledged(collection))
        }
    }

    async fn insert_many(&self, collection: Collection, docs: Vec<Value>) -> Result<u64, StoreError> {
        if docs.is_empty() {
            return Ok(0);
        }
        self.ready().await?;

        let rows = docs
            .into_iter()
            .map(|doc| document_id(collection, &doc).map(|id| (id, doc)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder =
            QueryBuilder::<Postgres>::new(format!("INSERT INTO {} (id, doc) ", self.table(collection)));
        builder.push_values(rows, |mut row, (id, doc)| {
            row.push_bind(id).push_bind(Json(doc));
        });

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(collection, None, e))?;

        Ok(result.rows_affected())
    }

    async fn find(&self, collection: Collection, options: FindOptions) -> Result<Vec<Value>, StoreError> {
        self.ready().await?;
        let mut builder = build_find(&self.table(collection), &options)?;
        let docs = builder
            .build_query_scalar::<Json<Value>>()
            .fetch_all(&self.pool)
            .await?;
        Ok(docs.into_iter().map(|Json(doc)| doc).collect())
    }

    async fn find_by_id(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        self.ready().await?;
        let doc = sqlx::query_scalar::<_, Json<Value>>(&format!(
            "SELECT doc FROM {} WHERE id = $1",
            self.table(collection)
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(doc.map(|Json(doc)| doc))
    }

    async fn set_field(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<u64, StoreError> {
        self.ready().await?;
        let result = sqlx::query(&format!(
            "UPDATE {} SET doc = jsonb_set(doc, ARRAY[$1::text], $2) WHERE id = $3",
            self.table(collection)
        ))
        .bind(field)
        .bind(Json(&value))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_all(&self, collection: Collection) -> Result<u64, StoreError> {
        self.ready().await?;
        let result = sqlx::query(&format!("DELETE FROM {}", self.table(collection)))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count(&self, collection: Collection) -> Result<u64, StoreError> {
        self.ready().await?;
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", self.table(collection)))
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn distinct(&self, collection: Collection, field: &str) -> Result<Vec<Value>, StoreError> {
        self.ready().await?;
        let values = sqlx::query_scalar::<_, Json<Value>>(&distinct_sql(&self.table(collection), field)?)
            .fetch_all(&self.pool)
            .await?;
        Ok(values.into_iter().map(|Json(v)| v).collect())
    }

    async fn create_index(&self, collection: Collection, field: &'static str) -> Result<String, StoreError> {
        self.ready().await?;
        let name = collection.index_name(field);
        sqlx::query(&index_sql(&name, &self.table(collection), field)?)
            .execute(&self.pool)
            .await?;
        Ok(name)
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(start.elapsed())
    }

    async fn close(&self) {
        tracing::info!("Closing database connection pool");
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Execute;

    #[test]
    fn test_table_names_are_schema_qualified() {
        assert_eq!(
            table_name("portfolio_db", Collection::TechnicalExpertise),
            "\"portfolio_db\".\"technical_expertise\""
        );
    }

    #[test]
    fn test_field_expressions_reject_injection() {
        assert_eq!(
            text_expr("category").unwrap(),
            "((doc->>'category') COLLATE \"C\")"
        );
        assert_eq!(json_expr("category").unwrap(), "(doc->'category')");
        assert!(text_expr("category'; DROP TABLE x; --").is_err());
        assert!(json_expr("a b").is_err());
    }

    #[test]
    fn test_connect_lazy_refuses_unsafe_schema() {
        let config = DbConfig {
            url: "postgresql://localhost/portfolio".to_string(),
            database_name: "portfolio-db".to_string(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout_secs: 10,
            idle_timeout_secs: 300,
        };
        assert!(matches!(
            PgDocumentStore::connect_lazy(&config),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn test_find_sql_shape() {
        let options = FindOptions::new()
            .filter_eq("category", "AI")
            .sort_desc("created_at")
            .skip(5)
            .limit(10);
        let mut builder = build_find("\"db\".\"projects\"", &options).unwrap();
        let query = builder.build();
        assert_eq!(
            query.sql(),
            "SELECT doc FROM \"db\".\"projects\" WHERE ((doc->>'category') COLLATE \"C\") = $1 \
             ORDER BY ((doc->>'created_at') COLLATE \"C\") DESC NULLS LAST, seq ASC LIMIT $2 OFFSET $3"
        );
    }

    #[test]
    fn test_index_matches_query_expression() {
        let sql = index_sql("idx_experiences_period", "\"db\".\"experiences\"", "period").unwrap();
        assert_eq!(
            sql,
            "CREATE INDEX IF NOT EXISTS \"idx_experiences_period\" ON \"db\".\"experiences\" \
             (((doc->>'period') COLLATE \"C\"))"
        );
        assert!(sql.contains(&text_expr("period").unwrap()));
        assert!(index_sql("idx", "t", "bad field").is_err());
    }

    #[test]
    fn test_distinct_orders_by_byte_collation() {
        let sql = distinct_sql("\"db\".\"projects\"", "category").unwrap();
        assert_eq!(
            sql,
            "SELECT v FROM (SELECT DISTINCT (doc->'category') AS v FROM \"db\".\"projects\" \
             WHERE (doc->'category') IS NOT NULL AND (doc->'category') <> 'null'::jsonb) d \
             ORDER BY (v #>> '{}') COLLATE \"C\""
        );
    }

    #[test]
    fn test_unsorted_find_uses_insertion_order() {
        let mut builder = build_find("\"db\".\"experiences\"", &FindOptions::new()).unwrap();
        let query = builder.build();
        assert_eq!(
            query.sql(),
            "SELECT doc FROM \"db\".\"experiences\" ORDER BY seq ASC"
        );
    }
}
