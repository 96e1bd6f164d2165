//! Generic CRUD keyed by entity type. Each persisted model implements
//! [`Record`] once and gets fetch/list/delete for free.

use exemplar::Model;
use rusqlite::{Connection, OptionalExtension};
use sea_query::{Alias, Expr, Query, SelectStatement, SimpleExpr, SqliteQueryBuilder};
use sea_query_rusqlite::RusqliteBinder;
use tracing::debug;

use crate::{DomainError, Object};

pub trait Record: Model + Sized {
    const OBJECT: Object;

    /// `SELECT <all columns> FROM <table>` with no conditions
    fn select_star() -> SelectStatement;

    /// Condition matching the row with this primary key
    fn id_eq(id: i64) -> SimpleExpr;
}

pub fn fetch_optional<T: Record>(conn: &Connection, id: i64) -> Result<Option<T>, DomainError> {
    let (sql, values) = T::select_star()
        .and_where(T::id_eq(id))
        .limit(1)
        .build_rusqlite(SqliteQueryBuilder);

    let mut stmt = conn.prepare_cached(&sql)?;
    let res = stmt.query_row(&*values.as_params(), T::from_row).optional()?;
    Ok(res)
}

pub fn fetch<T: Record>(conn: &Connection, id: i64) -> Result<T, DomainError> {
    fetch_optional(conn, id)?.ok_or_else(|| DomainError::not_found(T::OBJECT, id))
}

/// Runs an arbitrary select built from [`Record::select_star`]
pub fn query_all<T: Record>(conn: &Connection, query: &SelectStatement) -> Result<Vec<T>, DomainError> {
    let (sql, values) = query.build_rusqlite(SqliteQueryBuilder);

    let mut stmt = conn.prepare_cached(&sql)?;
    let res = stmt
        .query_map(&*values.as_params(), T::from_row)?
        .collect::<Result<_, _>>()?;
    Ok(res)
}

pub fn fetch_where<T: Record>(conn: &Connection, condition: SimpleExpr) -> Result<Vec<T>, DomainError> {
    query_all(conn, T::select_star().and_where(condition))
}

pub fn fetch_all<T: Record>(conn: &Connection) -> Result<Vec<T>, DomainError> {
    query_all(conn, &T::select_star())
}

pub fn exists_where<T: Record>(conn: &Connection, condition: SimpleExpr) -> Result<bool, DomainError> {
    let (sql, values) = Query::select()
        .expr(Expr::val(1))
        .from(Alias::new(T::OBJECT.table()))
        .and_where(condition)
        .limit(1)
        .build_rusqlite(SqliteQueryBuilder);

    let mut stmt = conn.prepare_cached(&sql)?;
    Ok(stmt.exists(&*values.as_params())?)
}

/// Deletes by primary key. Foreign keys cascade to owned rows.
pub fn delete<T: Record>(conn: &Connection, id: i64) -> Result<(), DomainError> {
    let (sql, values) = Query::delete()
        .from_table(Alias::new(T::OBJECT.table()))
        .and_where(T::id_eq(id))
        .build_rusqlite(SqliteQueryBuilder);

    let mut stmt = conn.prepare_cached(&sql)?;
    let deleted = stmt.execute(&*values.as_params())?;
    debug!(object = %T::OBJECT, id, deleted);

    if deleted == 0 {
        Err(DomainError::not_found(T::OBJECT, id))
    } else {
        Ok(())
    }
}
