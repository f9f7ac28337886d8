//! PostgreSQL backend: one table per collection, documents kept as JSONB.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};

use super::{
    filter::{Condition, Filter, Sort, Window},
    StoreError,
};

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    for (i, condition) in filter.conditions().iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        match condition {
            Condition::IdEq(id) => {
                qb.push("id = ");
                qb.push_bind(id.clone());
            }
            Condition::IdNot(id) => {
                qb.push("id <> ");
                qb.push_bind(id.clone());
            }
            Condition::Eq(field, value) => {
                qb.push("doc ->> ");
                qb.push_bind(*field);
                qb.push(" = ");
                qb.push_bind(value.clone());
            }
            Condition::EqIgnoreCase(field, value) => {
                qb.push("LOWER(doc ->> ");
                qb.push_bind(*field);
                qb.push(") = LOWER(");
                qb.push_bind(value.clone());
                qb.push(")");
            }
            Condition::NotFalse(field) => {
                qb.push("(doc ->> ");
                qb.push_bind(*field);
                qb.push(") IS DISTINCT FROM 'false'");
            }
        }
    }
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Duplicate,
        _ => StoreError::Backend(err),
    }
}

pub(super) async fn find(
    pool: &PgPool,
    table: &'static str,
    filter: &Filter,
    sort: Sort,
    window: Window,
) -> Result<Vec<Value>, StoreError> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT doc FROM {table}"));
    push_filter(&mut qb, filter);

    qb.push(match sort {
        Sort::NewestFirst => " ORDER BY created_at DESC, id DESC",
        Sort::NameAscending => " ORDER BY LOWER(doc ->> 'name') ASC, id ASC",
    });

    if let Some(limit) = window.limit {
        qb.push(" LIMIT ");
        qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    if window.skip > 0 {
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(window.skip).unwrap_or(i64::MAX));
    }

    let rows = qb
        .build_query_scalar::<Json<Value>>()
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|Json(doc)| doc).collect())
}

pub(super) async fn count(
    pool: &PgPool,
    table: &'static str,
    filter: &Filter,
) -> Result<u64, StoreError> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {table}"));
    push_filter(&mut qb, filter);

    let total: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    Ok(u64::try_from(total).unwrap_or(0))
}

pub(super) async fn insert(
    pool: &PgPool,
    table: &'static str,
    id: &str,
    created_at: DateTime<Utc>,
    doc: Value,
) -> Result<(), StoreError> {
    let sql = format!("INSERT INTO {table} (id, doc, created_at) VALUES ($1, $2, $3)");
    sqlx::query(&sql)
        .bind(id)
        .bind(Json(doc))
        .bind(created_at)
        .execute(pool)
        .await
        .map_err(map_write_error)?;
    Ok(())
}

pub(super) async fn update(
    pool: &PgPool,
    table: &'static str,
    id: &str,
    doc: Value,
) -> Result<bool, StoreError> {
    let sql = format!("UPDATE {table} SET doc = $1 WHERE id = $2");
    let result = sqlx::query(&sql)
        .bind(Json(doc))
        .bind(id)
        .execute(pool)
        .await
        .map_err(map_write_error)?;
    Ok(result.rows_affected() > 0)
}

pub(super) async fn delete(pool: &PgPool, table: &'static str, id: &str) -> Result<bool, StoreError> {
    let sql = format!("DELETE FROM {table} WHERE id = $1");
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
