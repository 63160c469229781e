use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde_json::Value;
use tracing::{debug, info};

use super::{wire, Collection, ScheduleStore, Scope};
use crate::error::{StoreError, StoreResult};
use crate::model::{DateFields, DateSpan, ItemKey, ScheduleInfo};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the schedule REST backend.
///
/// Reads are `GET {base}/{resource}?proyectoId=..&cronogramaId=..`; writes are
/// `PATCH {base}/{resource}/{id}` with a level-specific date body.
#[derive(Debug, Clone)]
pub struct RestStore {
    base_url: String,
    client: Client,
    token: Option<String>,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>) -> StoreResult<Self> {
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, req: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn get_json(&self, path: &str, query: &[(&str, String)]) -> StoreResult<Value> {
        let url = self.url(path);
        debug!(%url, ?query, "GET");
        let resp = self.authorize(self.client.get(&url).query(query)).send()?;
        Ok(check(resp)?.json()?)
    }
}

/// Map any non-2xx answer to [`StoreError::Status`] with the body as message.
fn check(resp: Response) -> StoreResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}

impl ScheduleStore for RestStore {
    fn fetch(&self, collection: Collection, scope: &Scope) -> StoreResult<Value> {
        let mut query = vec![("proyectoId", scope.project_id.to_string())];
        if let (true, Some(schedule)) = (collection.schedule_scoped(), scope.schedule_id) {
            query.push(("cronogramaId", schedule.to_string()));
        }
        self.get_json(collection.path(), &query)
    }

    fn patch_dates(&mut self, item: ItemKey, fields: DateFields, dates: DateSpan) -> StoreResult<()> {
        let url = self.url(&format!("{}/{}", Collection::for_level(item.level).path(), item.id));
        let body = wire::patch_body(item.level, fields, dates);
        info!(%url, %body, "PATCH");
        let resp = self.authorize(self.client.patch(&url).json(&body)).send()?;
        check(resp)?;
        Ok(())
    }

    fn fetch_schedule(&self, schedule_id: i64) -> StoreResult<Option<ScheduleInfo>> {
        let value = match self.get_json(&format!("cronogramas/{schedule_id}"), &[]) {
            Ok(value) => value,
            Err(StoreError::Status { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let record = match value {
            Value::Object(mut obj) if obj.contains_key("data") => obj.remove("data").unwrap_or(Value::Null),
            Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
            other => other,
        };
        Ok(wire::schedule_from_record(&record))
    }

    fn fetch_baseline_tree(&self, schedule_id: i64) -> StoreResult<Value> {
        self.get_json(&format!("cronogramas/{schedule_id}/arbol"), &[])
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_without_doubled_slashes() {
        let store = RestStore::new("http://localhost:3000/api/").unwrap();
        assert_eq!(store.url("fases"), "http://localhost:3000/api/fases");
        assert_eq!(store.url("/tareas/4"), "http://localhost:3000/api/tareas/4");
        assert_eq!(store.describe(), "http://localhost:3000/api");
    }

    #[test]
    fn empty_tokens_are_ignored() {
        let store = RestStore::new("http://x").unwrap().with_token(Some(String::new()));
        assert!(store.token.is_none());
    }
}
