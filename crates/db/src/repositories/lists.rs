//! Replace-all helpers for entity list tables.
//!
//! List relationships are rewritten wholesale inside the apply transaction:
//! delete every row for the owner, then insert the new set with `UNNEST`.
//! Table and column names are always compile-time constants.

use catalog_core::relations::{BodyModification, Url};
use catalog_core::types::DbId;
use sqlx::PgConnection;

use crate::models::entity::{BodyModificationRow, UrlRow};

/// Identifies one list table: `(table, owner column, value column)`.
pub(crate) type ListTable = (&'static str, &'static str, &'static str);

pub(crate) async fn load_strings(
    conn: &mut PgConnection,
    (table, owner, column): ListTable,
    id: DbId,
) -> Result<Vec<String>, sqlx::Error> {
    let query = format!("SELECT {column} FROM {table} WHERE {owner} = $1 ORDER BY {column}");
    let rows: Vec<(String,)> = sqlx::query_as(&query).bind(id).fetch_all(&mut *conn).await?;
    Ok(rows.into_iter().map(|(v,)| v).collect())
}

pub(crate) async fn replace_strings(
    conn: &mut PgConnection,
    (table, owner, column): ListTable,
    id: DbId,
    values: &[String],
) -> Result<(), sqlx::Error> {
    clear(conn, table, owner, id).await?;
    if values.is_empty() {
        return Ok(());
    }
    let query = format!(
        "INSERT INTO {table} ({owner}, {column}) SELECT $1, UNNEST($2::TEXT[]) ON CONFLICT DO NOTHING"
    );
    sqlx::query(&query).bind(id).bind(values).execute(&mut *conn).await?;
    Ok(())
}

pub(crate) async fn load_ids(
    conn: &mut PgConnection,
    (table, owner, column): ListTable,
    id: DbId,
) -> Result<Vec<DbId>, sqlx::Error> {
    let query = format!("SELECT {column} FROM {table} WHERE {owner} = $1 ORDER BY {column}");
    let rows: Vec<(DbId,)> = sqlx::query_as(&query).bind(id).fetch_all(&mut *conn).await?;
    Ok(rows.into_iter().map(|(v,)| v).collect())
}

pub(crate) async fn replace_ids(
    conn: &mut PgConnection,
    (table, owner, column): ListTable,
    id: DbId,
    values: &[DbId],
) -> Result<(), sqlx::Error> {
    clear(conn, table, owner, id).await?;
    if values.is_empty() {
        return Ok(());
    }
    let query = format!(
        "INSERT INTO {table} ({owner}, {column}) SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING"
    );
    sqlx::query(&query).bind(id).bind(values).execute(&mut *conn).await?;
    Ok(())
}

pub(crate) async fn load_urls(
    conn: &mut PgConnection,
    table: &'static str,
    owner: &'static str,
    id: DbId,
) -> Result<Vec<Url>, sqlx::Error> {
    let query = format!("SELECT url, site FROM {table} WHERE {owner} = $1 ORDER BY url, site");
    let rows: Vec<UrlRow> = sqlx::query_as(&query).bind(id).fetch_all(&mut *conn).await?;
    Ok(rows.into_iter().map(Url::from).collect())
}

pub(crate) async fn replace_urls(
    conn: &mut PgConnection,
    table: &'static str,
    owner: &'static str,
    id: DbId,
    urls: &[Url],
) -> Result<(), sqlx::Error> {
    clear(conn, table, owner, id).await?;
    if urls.is_empty() {
        return Ok(());
    }
    let (links, sites): (Vec<String>, Vec<String>) =
        urls.iter().map(|u| (u.url.clone(), u.site.clone())).unzip();
    let query = format!(
        "INSERT INTO {table} ({owner}, url, site)
         SELECT $1, t.url, t.site FROM UNNEST($2::TEXT[], $3::TEXT[]) AS t(url, site)
         ON CONFLICT DO NOTHING"
    );
    sqlx::query(&query)
        .bind(id)
        .bind(links)
        .bind(sites)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub(crate) async fn load_body_modifications(
    conn: &mut PgConnection,
    table: &'static str,
    id: DbId,
) -> Result<Vec<BodyModification>, sqlx::Error> {
    let query = format!(
        "SELECT location, description FROM {table} WHERE performer_id = $1 ORDER BY location"
    );
    let rows: Vec<BodyModificationRow> =
        sqlx::query_as(&query).bind(id).fetch_all(&mut *conn).await?;
    Ok(rows.into_iter().map(BodyModification::from).collect())
}

pub(crate) async fn replace_body_modifications(
    conn: &mut PgConnection,
    table: &'static str,
    id: DbId,
    mods: &[BodyModification],
) -> Result<(), sqlx::Error> {
    clear(conn, table, "performer_id", id).await?;
    if mods.is_empty() {
        return Ok(());
    }
    let (locations, descriptions): (Vec<String>, Vec<Option<String>>) = mods
        .iter()
        .map(|m| (m.location.clone(), m.description.clone()))
        .unzip();
    let query = format!(
        "INSERT INTO {table} (performer_id, location, description)
         SELECT $1, t.location, t.description
         FROM UNNEST($2::TEXT[], $3::TEXT[]) AS t(location, description)"
    );
    sqlx::query(&query)
        .bind(id)
        .bind(locations)
        .bind(descriptions)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Delete every row owned by `id`.
pub(crate) async fn clear(
    conn: &mut PgConnection,
    table: &'static str,
    owner: &'static str,
    id: DbId,
) -> Result<u64, sqlx::Error> {
    let query = format!("DELETE FROM {table} WHERE {owner} = $1");
    let result = sqlx::query(&query).bind(id).execute(&mut *conn).await?;
    Ok(result.rows_affected())
}
