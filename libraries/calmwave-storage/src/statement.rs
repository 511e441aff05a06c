//! Statement gateway
//!
//! Every statement the catalog runs is a `&'static str` plus an ordered list of bound
//! parameters. Runtime values can only reach the engine as parameters, never as SQL text.

use calmwave_core::{CatalogError, PlaylistId, Result, UserId};
use chrono::{NaiveDateTime, NaiveTime};
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::{query::Query, Sqlite};
use std::future::Future;
use std::time::Duration;

/// A positional parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Int(i64),
    Text(String),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Null,
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Param {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveTime> for Param {
    fn from(value: NaiveTime) -> Self {
        Self::Time(value)
    }
}

impl From<NaiveDateTime> for Param {
    fn from(value: NaiveDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl From<UserId> for Param {
    fn from(value: UserId) -> Self {
        Self::Int(value.get())
    }
}

impl From<PlaylistId> for Param {
    fn from(value: PlaylistId) -> Self {
        Self::Int(value.get())
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// SQL text with its bound parameters
#[derive(Debug, Clone)]
pub struct Statement {
    sql: &'static str,
    params: Vec<Param>,
}

impl Statement {
    pub fn new(sql: &'static str) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }

    /// Append the next positional parameter
    #[must_use]
    pub fn bind(mut self, param: impl Into<Param>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn sql(&self) -> &'static str {
        self.sql
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Number of `?` placeholders outside string literals
    pub fn placeholder_count(&self) -> usize {
        let mut in_literal = false;
        let mut count = 0;
        for c in self.sql.chars() {
            match c {
                '\'' => in_literal = !in_literal,
                '?' if !in_literal => count += 1,
                _ => {}
            }
        }
        count
    }

    /// Check that every placeholder has exactly one parameter
    pub fn check(&self) -> Result<()> {
        let expected = self.placeholder_count();
        if expected != self.params.len() {
            return Err(CatalogError::statement(format!(
                "expected {} parameters, got {}: {}",
                expected,
                self.params.len(),
                self.sql.trim()
            )));
        }
        Ok(())
    }

    fn query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        let mut query = sqlx::query(self.sql);
        for param in &self.params {
            query = match param {
                Param::Int(v) => query.bind(*v),
                Param::Text(v) => query.bind(v.as_str()),
                Param::Time(v) => query.bind(*v),
                Param::Timestamp(v) => query.bind(*v),
                Param::Null => query.bind(Option::<i64>::None),
            };
        }
        query
    }
}

/// Result of a write statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Executed {
    pub rows_affected: u64,
    pub last_insert_id: i64,
}

/// Runs statements over one borrowed connection
pub struct Gateway<'c> {
    conn: &'c mut SqliteConnection,
    timeout: Option<Duration>,
}

impl<'c> Gateway<'c> {
    pub(crate) fn new(conn: &'c mut SqliteConnection, timeout: Option<Duration>) -> Self {
        Self { conn, timeout }
    }

    /// Run a write statement
    pub async fn execute(&mut self, statement: &Statement) -> Result<Executed> {
        statement.check()?;
        log_statement(statement);

        let done = bounded(self.timeout, statement.sql, statement.query().execute(&mut *self.conn)).await?;

        Ok(Executed {
            rows_affected: done.rows_affected(),
            last_insert_id: done.last_insert_rowid(),
        })
    }

    /// Run a read statement, collecting every row
    pub async fn fetch_all(&mut self, statement: &Statement) -> Result<Vec<SqliteRow>> {
        statement.check()?;
        log_statement(statement);

        bounded(self.timeout, statement.sql, statement.query().fetch_all(&mut *self.conn)).await
    }

    /// Run a read statement expecting at most one row
    pub async fn fetch_optional(&mut self, statement: &Statement) -> Result<Option<SqliteRow>> {
        statement.check()?;
        log_statement(statement);

        bounded(
            self.timeout,
            statement.sql,
            statement.query().fetch_optional(&mut *self.conn),
        )
        .await
    }
}

fn log_statement(statement: &Statement) {
    // parameter values may hold credentials; only their count is logged
    tracing::debug!(
        sql = statement.sql.trim(),
        params = statement.params.len(),
        "executing statement"
    );
}

async fn bounded<T, F>(timeout: Option<Duration>, sql: &str, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| {
                CatalogError::Timeout(format!("statement exceeded {:?}: {}", limit, sql.trim()))
            })?
            .map_err(Into::into),
        None => fut.await.map_err(Into::into),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_placeholders_outside_literals() {
        let stmt = Statement::new("UPDATE t SET a = ?, b = '?' WHERE id = ?");
        assert_eq!(stmt.placeholder_count(), 2);
    }

    #[test]
    fn check_rejects_missing_parameters() {
        let stmt = Statement::new("DELETE FROM playlists WHERE id_playlist = ?");
        let err = stmt.check().unwrap_err();
        assert!(matches!(err, CatalogError::Statement(_)));
    }

    #[test]
    fn check_rejects_extra_parameters() {
        let stmt = Statement::new("SELECT 1").bind(5_i64);
        assert!(stmt.check().is_err());
    }

    #[test]
    fn binds_in_order() {
        let time = NaiveTime::from_hms_opt(0, 3, 30).unwrap();
        let stmt = Statement::new("INSERT INTO musicas VALUES (?, ?, ?, ?, ?)")
            .bind("Song")
            .bind("Artist")
            .bind(time)
            .bind(2020)
            .bind(PlaylistId::new(3));

        assert!(stmt.check().is_ok());
        assert_eq!(
            stmt.params(),
            &[
                Param::Text("Song".into()),
                Param::Text("Artist".into()),
                Param::Time(time),
                Param::Int(2020),
                Param::Int(3),
            ]
        );
    }

    #[test]
    fn none_binds_null() {
        let stmt = Statement::new("SELECT ?").bind(Option::<i64>::None);
        assert_eq!(stmt.params(), &[Param::Null]);
    }
}
