//! Docker Engine remote API adapter.
//!
//! `DockerConnector` implements the `RuntimeConnector` port: it builds
//! a per-host reqwest client (bounded connect and request timeouts,
//! optional TLS client identity) and verifies reachability with a
//! ping before handing out a [`DockerApi`]. Every `DockerApi` call
//! maps transport failures and non-2xx responses to
//! [`RuntimeError`] carrying the host identity and the raw cause.

use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use flotilla_common::RepoResult;

use crate::application::ports::{ContainerInfo, CreatedContainer, HostRuntime, RuntimeConnector};
use crate::domain::container::{ContainerSpec, parse_link, parse_port, parse_volume};
use crate::domain::error::{ConnectionError, RuntimeError, ValidationError};
use crate::domain::host::Host;

/// Connects to Docker Engine APIs over HTTP(S).
pub struct DockerConnector {
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl DockerConnector {
    #[must_use]
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            request_timeout,
        }
    }

    async fn client_for(&self, host: &Host) -> Result<reqwest::Client, ConnectionError> {
        let misconfigured = |reason: String| ConnectionError {
            host: host.name.clone(),
            endpoint: host.endpoint(),
            reason,
        };

        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout);

        if let Some(tls) = &host.tls {
            let ca = tokio::fs::read(&tls.ca_cert)
                .await
                .map_err(|e| misconfigured(format!("reading {}: {e}", tls.ca_cert.display())))?;
            let ca = reqwest::Certificate::from_pem(&ca)
                .map_err(|e| misconfigured(format!("invalid CA certificate: {e}")))?;

            let mut identity = tokio::fs::read(&tls.client_cert).await.map_err(|e| {
                misconfigured(format!("reading {}: {e}", tls.client_cert.display()))
            })?;
            let key = tokio::fs::read(&tls.client_key)
                .await
                .map_err(|e| misconfigured(format!("reading {}: {e}", tls.client_key.display())))?;
            identity.extend_from_slice(&key);
            let identity = reqwest::Identity::from_pem(&identity)
                .map_err(|e| misconfigured(format!("invalid client identity: {e}")))?;

            builder = builder.add_root_certificate(ca).identity(identity);
        }

        builder
            .build()
            .map_err(|e| misconfigured(format!("building HTTP client: {e}")))
    }
}

impl RuntimeConnector for DockerConnector {
    type Conn = DockerApi;

    async fn connect(&self, host: &Host) -> Result<DockerApi, ConnectionError> {
        let api = DockerApi {
            http: self.client_for(host).await?,
            base: host.endpoint(),
            host: host.name.clone(),
        };
        api.ping().await?;
        Ok(api)
    }
}

/// A live connection to one host's engine API.
pub struct DockerApi {
    http: reqwest::Client,
    base: String,
    host: String,
}

/// How much of an error body ends up in the failure reason.
const BODY_EXCERPT: usize = 200;

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() > BODY_EXCERPT {
        let mut end = BODY_EXCERPT;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &trimmed[..end])
    } else {
        trimmed.to_string()
    }
}

#[derive(Deserialize)]
struct ApiContainer {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Image", default)]
    image: String,
    #[serde(rename = "Command", default)]
    command: String,
    #[serde(rename = "Status", default)]
    status: String,
    #[serde(rename = "Names", default)]
    names: Vec<String>,
    #[serde(rename = "Created", default)]
    created: i64,
}

#[derive(Deserialize)]
struct CreateResponse {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Warnings", default)]
    warnings: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct InspectResponse {
    #[serde(rename = "Config")]
    config: InspectConfig,
}

#[derive(Deserialize)]
struct InspectConfig {
    #[serde(rename = "Image")]
    image: String,
    #[serde(rename = "Cmd", default)]
    cmd: Option<Vec<String>>,
    #[serde(rename = "Env", default)]
    env: Option<Vec<String>>,
}

impl DockerApi {
    async fn ping(&self) -> Result<(), ConnectionError> {
        let url = format!("{}/_ping", self.base);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ConnectionError {
                host: self.host.clone(),
                endpoint: self.base.clone(),
                reason: e.to_string(),
            })?;
        if !resp.status().is_success() {
            return Err(ConnectionError {
                host: self.host.clone(),
                endpoint: self.base.clone(),
                reason: format!("ping returned {}", resp.status()),
            });
        }
        Ok(())
    }

    fn runtime_err(
        &self,
        op: &'static str,
        container: Option<&str>,
        reason: String,
    ) -> RuntimeError {
        RuntimeError {
            host: self.host.clone(),
            container: container.map(str::to_string),
            op,
            reason,
        }
    }

    /// Send a request and require a 2xx (or explicitly tolerated)
    /// status, folding transport errors and error bodies into
    /// [`RuntimeError`].
    async fn expect_ok(
        &self,
        req: reqwest::RequestBuilder,
        op: &'static str,
        container: Option<&str>,
        tolerated: &[u16],
    ) -> Result<reqwest::Response, RuntimeError> {
        let resp = req
            .send()
            .await
            .map_err(|e| self.runtime_err(op, container, e.to_string()))?;
        let status = resp.status();
        if status.is_success() || tolerated.contains(&status.as_u16()) {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(self.runtime_err(op, container, format!("{status}: {}", excerpt(&body))))
    }

    /// Map a spec onto the engine's create schema. Malformed entries
    /// surface as [`ValidationError`] rather than being dropped, so a
    /// caller that skipped [`ContainerSpec::validate`] still cannot
    /// lose fields silently.
    fn create_body(spec: &ContainerSpec) -> Result<serde_json::Value, ValidationError> {
        let cmd: Vec<&str> = spec
            .command
            .as_deref()
            .map(str::split_whitespace)
            .map(Iterator::collect)
            .unwrap_or_default();

        let mut exposed = serde_json::Map::new();
        let mut bindings = serde_json::Map::new();
        for raw in &spec.ports {
            let mapping = parse_port(raw)?;
            let key = mapping.engine_key();
            exposed.insert(key.clone(), json!({}));
            if let Some(host_port) = mapping.host_port {
                bindings.insert(key, json!([{ "HostPort": host_port.to_string() }]));
            }
        }

        let mut binds = Vec::new();
        for raw in &spec.volumes {
            let mount = parse_volume(raw)?;
            // anonymous volumes don't become binds
            if let Some(host_path) = mount.host_path {
                let mode = if mount.read_only { ":ro" } else { "" };
                binds.push(format!("{host_path}:{}{mode}", mount.container_path));
            }
        }

        let mut links = Vec::new();
        for raw in &spec.links {
            let link = parse_link(raw)?;
            links.push(format!("{}:{}", link.name, link.alias));
        }

        let volumes_from: Vec<&str> = spec.volumes_from.as_deref().into_iter().collect();
        let memory_mb = spec.memory_mb.unwrap_or(0);
        let memory_bytes = memory_mb
            .checked_mul(1024 * 1024)
            .ok_or(ValidationError::InvalidMemory(memory_mb))?;

        Ok(json!({
            "Image": spec.image,
            "Cmd": cmd,
            "Env": spec.environment,
            "Hostname": spec.hostname,
            "ExposedPorts": exposed,
            "HostConfig": {
                "PortBindings": bindings,
                "Binds": binds,
                "Links": links,
                "VolumesFrom": volumes_from,
                "Memory": memory_bytes,
                "Privileged": spec.privileged,
            },
        }))
    }

    async fn create_and_start(
        &self,
        op: &'static str,
        body: serde_json::Value,
        name: Option<&str>,
    ) -> Result<CreatedContainer> {
        let mut req = self.http.post(format!("{}/containers/create", self.base));
        if let Some(name) = name {
            req = req.query(&[("name", name)]);
        }
        let resp = self.expect_ok(req.json(&body), op, None, &[]).await?;
        let created: CreateResponse = resp
            .json()
            .await
            .map_err(|e| self.runtime_err(op, None, format!("decoding create response: {e}")))?;

        let start = self
            .http
            .post(format!("{}/containers/{}/start", self.base, created.id));
        self.expect_ok(start, op, Some(&created.id), &[304]).await?;

        debug!(host = %self.host, container = %created.id, "engine created container");
        Ok(CreatedContainer {
            id: created.id,
            warnings: created.warnings.unwrap_or_default(),
        })
    }
}

impl HostRuntime for DockerApi {
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerInfo>> {
        let req = self
            .http
            .get(format!("{}/containers/json", self.base))
            .query(&[("all", if all { "1" } else { "0" })]);
        let resp = self.expect_ok(req, "list containers", None, &[]).await?;
        let listed: Vec<ApiContainer> = resp.json().await.map_err(|e| {
            self.runtime_err("list containers", None, format!("decoding listing: {e}"))
        })?;
        Ok(listed
            .into_iter()
            .map(|c| ContainerInfo {
                id: c.id,
                image: c.image,
                command: c.command,
                status: c.status,
                names: c.names,
                created: c.created,
            })
            .collect())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<CreatedContainer> {
        let body = Self::create_body(spec)?;
        self.create_and_start("create container", body, spec.name.as_deref())
            .await
    }

    async fn stop(&self, id: &str) -> Result<()> {
        let req = self
            .http
            .post(format!("{}/containers/{id}/stop", self.base))
            .query(&[("t", "10")]);
        // 304: already stopped
        self.expect_ok(req, "stop container", Some(id), &[304])
            .await?;
        Ok(())
    }

    async fn restart(&self, id: &str) -> Result<()> {
        let req = self
            .http
            .post(format!("{}/containers/{id}/restart", self.base))
            .query(&[("t", "10")]);
        self.expect_ok(req, "restart container", Some(id), &[])
            .await?;
        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<()> {
        let req = self
            .http
            .delete(format!("{}/containers/{id}", self.base))
            .query(&[("force", "1"), ("v", "1")]);
        self.expect_ok(req, "destroy container", Some(id), &[])
            .await?;
        Ok(())
    }

    async fn clone_container(&self, id: &str) -> Result<CreatedContainer> {
        let req = self.http.get(format!("{}/containers/{id}/json", self.base));
        let resp = self.expect_ok(req, "clone container", Some(id), &[]).await?;
        let inspected: InspectResponse = resp.json().await.map_err(|e| {
            self.runtime_err("clone container", Some(id), format!("decoding inspect: {e}"))
        })?;

        let body = json!({
            "Image": inspected.config.image,
            "Cmd": inspected.config.cmd.unwrap_or_default(),
            "Env": inspected.config.env.unwrap_or_default(),
        });
        self.create_and_start("clone container", body, None).await
    }

    async fn logs(&self, id: &str) -> Result<String> {
        let req = self
            .http
            .get(format!("{}/containers/{id}/logs", self.base))
            .query(&[("stdout", "1"), ("stderr", "1"), ("tail", "500")]);
        let resp = self.expect_ok(req, "fetch logs", Some(id), &[]).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| self.runtime_err("fetch logs", Some(id), e.to_string()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn search(&self, query: &str) -> Result<Vec<RepoResult>> {
        let req = self
            .http
            .get(format!("{}/images/search", self.base))
            .query(&[("term", query)]);
        let resp = self.expect_ok(req, "search repository", None, &[]).await?;
        let results: Vec<RepoResult> = resp.json().await.map_err(|e| {
            self.runtime_err("search repository", None, format!("decoding results: {e}"))
        })?;
        Ok(results)
    }

    async fn build_image(&self, definition: &[u8], tag: &str) -> Result<String> {
        let req = self
            .http
            .post(format!("{}/build", self.base))
            .query(&[("t", tag), ("q", "1")])
            .header("Content-Type", "application/x-tar")
            .body(definition.to_vec());
        // The engine streams progress; the control plane only
        // guarantees submission, so the stream is not consumed here.
        self.expect_ok(req, "build image", None, &[]).await?;
        let build_id = Uuid::new_v4().simple().to_string();
        debug!(host = %self.host, tag, build_id, "build submitted");
        Ok(build_id)
    }
}
