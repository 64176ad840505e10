//! Scripted transport for workflow tests.

use crate::error::{Error, Result};
use crate::http::{Payload, Transport};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Payload,
}

#[derive(Debug, Clone)]
enum Reply {
    Body(Option<Value>),
    Fail(Error),
}

/// Records every call and answers from per-route queues.
///
/// The last reply queued for a route repeats once the queue drains.
/// `GET version` answers with a stub version unless scripted.
#[derive(Debug, Default)]
pub struct FakeTransport {
    routes: HashMap<(String, String), VecDeque<Reply>>,
    calls: Vec<Call>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, method: &str, path: &str, reply: Reply) {
        self.routes
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back(reply);
    }

    pub fn respond(&mut self, method: &str, path: &str, body: Value) -> &mut Self {
        self.push(method, path, Reply::Body(Some(body)));
        self
    }

    pub fn respond_empty(&mut self, method: &str, path: &str) -> &mut Self {
        self.push(method, path, Reply::Body(None));
        self
    }

    pub fn fail(&mut self, method: &str, path: &str, err: Error) -> &mut Self {
        self.push(method, path, Reply::Fail(err));
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Calls made after the two connection probes.
    pub fn calls_after_connect(&self) -> &[Call] {
        &self.calls[2.min(self.calls.len())..]
    }

    pub fn paths(&self, method: &str) -> Vec<&str> {
        self.calls
            .iter()
            .filter(|c| c.method == method)
            .map(|c| c.path.as_str())
            .collect()
    }

    fn reply(&mut self, method: &'static str, path: &str, query: &[(&str, &str)], body: Payload) -> Result<Option<Value>> {
        self.calls.push(Call {
            method,
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body,
        });

        let key = (method.to_string(), path.to_string());
        let reply = match self.routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        match reply {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Fail(err)) => Err(err),
            None if method == "GET" && path == "version" => Ok(Some(json!({"version": "10.60"}))),
            None => Err(Error::internal_unexpected(format!(
                "unscripted {} {}",
                method, path
            ))),
        }
    }
}

impl Transport for FakeTransport {
    fn get(&mut self, path: &str, query: &[(&str, &str)]) -> Result<Option<Value>> {
        self.reply("GET", path, query, Payload::Empty)
    }

    fn put(&mut self, path: &str, body: Payload) -> Result<Option<Value>> {
        self.reply("PUT", path, &[], body)
    }

    fn post(&mut self, path: &str, body: Payload) -> Result<Option<Value>> {
        self.reply("POST", path, &[], body)
    }

    fn central_url(&self) -> &str {
        "https://blah:1234"
    }
}
