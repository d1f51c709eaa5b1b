//! Row queries against `rest/v1/{table}`.
//!
//! Mirrors the SDK chain `from(table).select(cols).eq(col, value)`:
//!
//! ```ignore
//! let meetings: Vec<Meeting> = backend
//!     .table("meetings")
//!     .select("*")
//!     .eq("user_id", &user.id)
//!     .execute(&session.access_token)
//!     .await?;
//! ```

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::{Backend, check_status, parse_json};
use crate::error::MeetPrepResult;

pub struct TableQuery<'a> {
    backend: &'a Backend,
    table: String,
    columns: String,
    filters: Vec<(String, String)>,
}

impl Backend {
    pub fn table(&self, name: &str) -> TableQuery<'_> {
        TableQuery {
            backend: self,
            table: name.to_string(),
            columns: "*".to_string(),
            filters: Vec::new(),
        }
    }
}

impl TableQuery<'_> {
    pub fn select(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    fn url(&self, include_select: bool) -> MeetPrepResult<Url> {
        let mut url = self.backend.endpoint(&format!("rest/v1/{}", self.table))?;
        {
            let mut query = url.query_pairs_mut();
            if include_select {
                query.append_pair("select", &self.columns);
            }
            for (column, filter) in &self.filters {
                query.append_pair(column, filter);
            }
        }
        Ok(url)
    }

    /// Run the select and decode every matching row.
    pub async fn execute<T: DeserializeOwned>(self, access_token: &str) -> MeetPrepResult<Vec<T>> {
        let response = self
            .backend
            .authed(Method::GET, self.url(true)?, access_token)
            .send()
            .await?;

        parse_json(response).await
    }

    /// Insert rows, merging with existing rows that collide on `on_conflict`.
    pub async fn upsert<T: Serialize>(
        self,
        rows: &[T],
        on_conflict: &str,
        access_token: &str,
    ) -> MeetPrepResult<()> {
        let mut url = self.url(false)?;
        url.query_pairs_mut().append_pair("on_conflict", on_conflict);

        let response = self
            .backend
            .authed(Method::POST, url, access_token)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    /// Delete every row matching the filters.
    pub async fn delete(self, access_token: &str) -> MeetPrepResult<()> {
        let response = self
            .backend
            .authed(Method::DELETE, self.url(false)?, access_token)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }
}
