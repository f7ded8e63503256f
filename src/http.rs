//==================================================
// File: http.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Net::HTTP capability adapter
// Objective: Perform blocking GET/POST content fetches for scripts and return
//            the body or an InternalError value
//==================================================

use std::io::Read;

use tracing::debug;

use crate::config::HttpConfig;
use crate::error::{BridgeError, BridgeResult, argument_count, wrong_argument_type};
use crate::value::ScriptValue;

//==================================================
// Section 1.0 - Transport seam
//==================================================
// @ZNOTE[HTTP]: Response status is never surfaced. A 404 or 500 body is content
// like any other; only transport and body-read failures become errors.

pub trait HttpTransport: Send + Sync {
    fn get(&self, url: &str) -> BridgeResult<String>;
    fn post(&self, url: &str, content_type: &str, body: &str) -> BridgeResult<String>;
}

/// Blocking transport backed by a shared `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new(config: &HttpConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(&config.user_agent)
            .build();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&HttpConfig::default())
    }
}

impl HttpTransport for UreqTransport {
    fn get(&self, url: &str) -> BridgeResult<String> {
        debug!(url, "http get");
        into_content(self.agent.get(url).call())
    }

    fn post(&self, url: &str, content_type: &str, body: &str) -> BridgeResult<String> {
        debug!(url, content_type, bytes = body.len(), "http post");
        into_content(
            self.agent
                .post(url)
                .set("Content-Type", content_type)
                .send_bytes(body.as_bytes()),
        )
    }
}

fn into_content(result: Result<ureq::Response, ureq::Error>) -> BridgeResult<String> {
    match result {
        Ok(response) => read_body(response),
        Err(ureq::Error::Status(status, response)) => {
            debug!(status, "non-success status treated as content");
            read_body(response)
        }
        Err(ureq::Error::Transport(transport)) => Err(BridgeError::Transport(transport.to_string())),
    }
}

fn read_body(response: ureq::Response) -> BridgeResult<String> {
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|err| BridgeError::BodyRead(err.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

//==================================================
// Section 2.0 - Script entry points
//==================================================

/// Prefixes `/` unless already present; the empty path becomes `/`.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// `Net::HTTP.get(domain, path = "")`
pub fn get(transport: &dyn HttpTransport, args: &[ScriptValue]) -> BridgeResult<ScriptValue> {
    if args.is_empty() || args.len() > 2 {
        return Err(argument_count("1 or 2", args.len()));
    }
    let domain = string_arg(&args[0])?;
    let path = match args.get(1) {
        Some(value) => string_arg(value)?,
        None => "",
    };
    let url = format!("{domain}{}", normalize_path(path));
    transport.get(&url).map(ScriptValue::String)
}

/// `Net::HTTP.post(url, content_type, body)`
pub fn post(transport: &dyn HttpTransport, args: &[ScriptValue]) -> BridgeResult<ScriptValue> {
    if args.len() != 3 {
        return Err(argument_count("3", args.len()));
    }
    let url = string_arg(&args[0])?;
    let content_type = string_arg(&args[1])?;
    let body = string_arg(&args[2])?;
    transport
        .post(url, content_type, body)
        .map(ScriptValue::String)
}

fn string_arg(value: &ScriptValue) -> BridgeResult<&str> {
    value
        .as_str()
        .ok_or_else(|| wrong_argument_type("String", value))
}
