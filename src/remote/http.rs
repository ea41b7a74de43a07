//! HttpRemote: blocking client for the catalog REST API.
//!
//! URL = `http://host:port` + apiroot + "/" + endpoint.
//!
//! Контракт ответа: JSON-массив записей `{id: int, name?: str, ...}` или
//! одиночный объект (считается массивом из одного элемента). Всё остальное:
//! ошибка `Remote` с методом, URL, телом запроса и сырым ответом.
//!
//! POST допускает 4xx (каталог так сообщает «уже существует»), если тело
//! ответа всё равно проходит контракт. 5xx и сетевые ошибки фатальны.
//! PUT/GET требуют 2xx.

use anyhow::{Context, Result};
use log::{debug, trace};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

use super::{Component, Entry, PayloadIovEntry, PilSubmission, Remote};
use crate::config::XploadConfig;
use crate::consts::{PAYLOAD_IOVS_ENDPOINT, POST_ENDPOINTS, PUT_ENDPOINTS};
use crate::error::XploadError;
use crate::stage::StagedTag;

pub struct HttpRemote {
    base_url: String,
    client: Client,
    dry_run: bool,
}

impl HttpRemote {
    pub fn new(cfg: &XploadConfig) -> Result<Self> {
        Ok(Self::with_base_url(&cfg.url(), cfg.timeout_secs)?.with_dry_run(cfg.remote_dry_run))
    }

    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            dry_run: false,
        })
    }

    pub fn with_dry_run(mut self, on: bool) -> Self {
        self.dry_run = on;
        self
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// POST to one of the create endpoints.
    pub fn post(&self, endpoint: &str, params: &Value) -> Result<Vec<Entry>> {
        let url = self.url(endpoint);
        let body = params.to_string();
        if !POST_ENDPOINTS.contains(&endpoint) {
            return Err(remote_error("POST", &url, &body, "", format!("Wrong endpoint {endpoint}")));
        }
        trace!("-H 'Content-Type: application/json' -X POST -d '{body}' {url}");

        let resp = self
            .client
            .post(&url)
            .json(params)
            .send()
            .map_err(|e| remote_error("POST", &url, &body, "", e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| remote_error("POST", &url, &body, "", e.to_string()))?;

        if status.is_server_error() {
            return Err(remote_error("POST", &url, &body, &text, format!("HTTP {status}")));
        }
        if status.is_client_error() {
            debug!("POST {url}: HTTP {status} tolerated");
        }
        parse_entries(&text).map_err(|reason| remote_error("POST", &url, &body, &text, reason))
    }

    /// PUT to one of the attach/change endpoints. Returns `name` or `id`.
    pub fn put(&self, endpoint: &str, params: &Value) -> Result<String> {
        let url = self.url(endpoint);
        let body = params.to_string();
        if !PUT_ENDPOINTS.contains(&endpoint) {
            return Err(remote_error("PUT", &url, &body, "", format!("Wrong endpoint {endpoint}")));
        }
        trace!("-H 'Content-Type: application/json' -X PUT -d '{body}' {url}");

        let resp = self
            .client
            .put(&url)
            .json(params)
            .send()
            .map_err(|e| remote_error("PUT", &url, &body, "", e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| remote_error("PUT", &url, &body, "", e.to_string()))?;

        if !status.is_success() {
            return Err(remote_error("PUT", &url, &body, &text, format!("HTTP {status}")));
        }
        let entries =
            parse_entries(&text).map_err(|reason| remote_error("PUT", &url, &body, &text, reason))?;
        first_label(&entries).map_err(|reason| remote_error("PUT", &url, &body, &text, reason))
    }

    /// GET `url` with `query` pairs appended (percent-encoded by reqwest).
    fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<Vec<T>> {
        let mut builder = self.client.get(url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        let req = builder
            .build()
            .map_err(|e| remote_error("GET", url, "", "", e.to_string()))?;
        let url = req.url().to_string();
        trace!("-X GET '{url}'");

        let resp = self
            .client
            .execute(req)
            .map_err(|e| remote_error("GET", &url, "", "", e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| remote_error("GET", &url, "", "", e.to_string()))?;
        if !status.is_success() {
            return Err(remote_error("GET", &url, "", &text, format!("HTTP {status}")));
        }
        parse_list(&text).map_err(|reason| remote_error("GET", &url, "", &text, reason))
    }

    /// List a component, or fetch one entry of it by id.
    pub fn fetch_entries(&self, component: Component, id: Option<i64>) -> Result<Vec<Entry>> {
        let mut url = self.url(component.endpoint());
        if let Some(id) = id {
            url.push_str(&format!("/{id}"));
        }
        self.get(&url, &[])
    }

    /// Payload IOVs of `tag` valid at `start`, optionally narrowed to a domain.
    pub fn fetch_payloads(
        &self,
        tag: &str,
        domain: Option<&str>,
        start: u64,
    ) -> Result<Vec<PayloadIovEntry>> {
        let url = format!("{}/", self.url(PAYLOAD_IOVS_ENDPOINT));
        let start = start.to_string();
        let mut entries: Vec<PayloadIovEntry> = self.get(
            &url,
            &[("gtName", tag), ("majorIOV", "0"), ("minorIOV", start.as_str())],
        )?;
        if let Some(domain) = domain {
            entries.retain(|e| e.payload_type == domain);
        }
        Ok(entries)
    }
}

impl Remote for HttpRemote {
    fn create_and_link_tag(&self, tag: &StagedTag) -> Result<String> {
        self.post("gttype", &json!({ "name": tag.tag_type }))?;
        self.post("gtstatus", &json!({ "name": tag.status }))?;
        let created = self.post(
            "gt",
            &json!({ "name": tag.name, "type": tag.tag_type, "status": tag.status }),
        )?;

        for domain in &tag.domains {
            self.post("pt", &json!({ "name": domain }))?;
            let list = self.post("pl", &json!({ "payload_type": domain }))?;
            let list_name = first_label(&list).map_err(|reason| {
                remote_error("POST", &self.url("pl"), domain, "", reason)
            })?;
            self.put(
                "pl_attach",
                &json!({ "payload_list": list_name, "global_tag": tag.name }),
            )?;
            debug!("tag {}: linked domain {} via {}", tag.name, domain, list_name);
        }

        Ok(first_label(&created).unwrap_or_else(|_| tag.name.clone()))
    }

    fn create_and_link_pil(&self, pil: &PilSubmission, dry_run: bool) -> Result<String> {
        let params = json!({
            "tag": pil.tag,
            "domain": pil.domain,
            "payload": pil.payload,
            "start": pil.start,
            "end": pil.end,
            "dry_run": dry_run,
        });
        let entries = self.post("pil", &params)?;
        first_label(&entries)
            .map_err(|reason| remote_error("POST", &self.url("pil"), &params.to_string(), "", reason))
    }

    fn supports_dry_run(&self) -> bool {
        self.dry_run
    }
}

// ----------------- разбор ответов -----------------

fn normalize(text: &str) -> std::result::Result<Vec<Value>, String> {
    let v: Value = serde_json::from_str(text).map_err(|e| format!("invalid JSON: {e}"))?;
    match v {
        Value::Array(items) => Ok(items),
        obj @ Value::Object(_) => Ok(vec![obj]),
        other => Err(format!("expected an array of entries, got {other}")),
    }
}

fn parse_list<T: DeserializeOwned>(text: &str) -> std::result::Result<Vec<T>, String> {
    normalize(text)?
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(|e| format!("invalid entry: {e}")))
        .collect()
}

/// Response body -> entries; every entry must carry an integer `id`.
pub fn parse_entries(text: &str) -> std::result::Result<Vec<Entry>, String> {
    parse_list(text)
}

fn first_label(entries: &[Entry]) -> std::result::Result<String, String> {
    entries
        .first()
        .map(Entry::label)
        .ok_or_else(|| "empty response".to_string())
}

fn remote_error(
    method: &'static str,
    url: &str,
    request: &str,
    response: &str,
    reason: String,
) -> anyhow::Error {
    XploadError::Remote {
        method,
        url: url.to_string(),
        request: request.to_string(),
        response: if response.is_empty() {
            String::new()
        } else {
            format!("{response} ")
        },
        reason,
    }
    .into()
}
