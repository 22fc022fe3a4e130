//! In-memory transport implementation for testing
//!
//! Commands never leave the process: every call is matched against scripted
//! rules, recorded in order, and answered with canned output or a failure.
//! Copies pull from an in-memory file table and write to the real local
//! filesystem so callers can read the artifacts back.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use devnet_transport::{
    CopyDirection, CopyEndpoint, RemoteAddress, RemoteTransport, Result, TransportError,
};
use parking_lot::Mutex;
use tracing::debug;

/// What a scripted rule answers with.
#[derive(Clone, Debug)]
pub enum Response {
    /// Succeed and print this to standard output.
    Output(String),

    /// Fail the attempt with this message.
    Fail(String),
}

impl Response {
    /// Successful response with the given output.
    pub fn output(output: impl Into<String>) -> Self {
        Self::Output(output.into())
    }

    /// Failing response with the given message.
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }
}

/// A recorded call.
#[derive(Clone, Debug)]
pub struct Call {
    /// Global order in which the call was received.
    pub seq: usize,

    /// Host the call was directed at.
    pub address: RemoteAddress,

    /// What was requested.
    pub kind: CallKind,

    /// Whether the scripted answer was a success.
    pub succeeded: bool,
}

/// The kind of a recorded call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CallKind {
    /// A shell command.
    Execute(String),

    /// A copy between two endpoints.
    Copy {
        /// Rendered source endpoint.
        src: String,

        /// Rendered destination endpoint.
        dest: String,
    },
}

impl Call {
    /// The command string if this was an execute call.
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        match &self.kind {
            CallKind::Execute(command) => Some(command),
            CallKind::Copy { .. } => None,
        }
    }
}

struct Rule {
    host: Option<String>,
    pattern: String,
    responses: VecDeque<Response>,
}

impl Rule {
    fn matches(&self, address: &RemoteAddress, command: &str) -> bool {
        self.host.as_deref().is_none_or(|host| host == address.host())
            && command.contains(&self.pattern)
    }

    /// Pops the next response; the last one repeats forever.
    fn next(&mut self) -> Response {
        if self.responses.len() > 1 {
            self.responses.pop_front().unwrap_or(Response::Output(String::new()))
        } else {
            self.responses
                .front()
                .cloned()
                .unwrap_or(Response::Output(String::new()))
        }
    }
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    files: HashMap<(String, String), String>,
    latencies: HashMap<String, Duration>,
    rules: Vec<Rule>,
}

/// Scripted transport shared between the test and the code under test.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<State>>,
}

impl MemoryTransport {
    /// Create an empty transport. Unmatched commands succeed with no output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands containing `pattern` (on `host`, or any host) with
    /// `responses` in order; the last response keeps repeating.
    ///
    /// Rules are matched in the order they were added.
    pub fn script(&self, host: Option<&str>, pattern: &str, responses: Vec<Response>) -> &Self {
        self.state.lock().rules.push(Rule {
            host: host.map(ToString::to_string),
            pattern: pattern.to_string(),
            responses: responses.into(),
        });
        self
    }

    /// Always answer matching commands with `output`.
    pub fn respond(&self, host: Option<&str>, pattern: &str, output: &str) -> &Self {
        self.script(host, pattern, vec![Response::output(output)])
    }

    /// Always fail matching commands.
    pub fn fail(&self, host: Option<&str>, pattern: &str) -> &Self {
        self.script(host, pattern, vec![Response::fail("scripted failure")])
    }

    /// Fail matching commands `times` times, then succeed with no output.
    pub fn fail_times(&self, host: Option<&str>, pattern: &str, times: usize) -> &Self {
        let mut responses = vec![Response::fail("scripted failure"); times];
        responses.push(Response::output(""));
        self.script(host, pattern, responses)
    }

    /// Make `path` on `host` available for pulls.
    pub fn serve_file(&self, host: &str, path: &str, contents: &str) -> &Self {
        self.state
            .lock()
            .files
            .insert((host.to_string(), path.to_string()), contents.to_string());
        self
    }

    /// Delay every call to `host` by `latency`.
    pub fn latency(&self, host: &str, latency: Duration) -> &Self {
        self.state.lock().latencies.insert(host.to_string(), latency);
        self
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Commands executed on `host`, in order, including failed attempts.
    #[must_use]
    pub fn commands_for(&self, host: &str) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.address.host() == host)
            .filter_map(|call| call.command().map(ToString::to_string))
            .collect()
    }

    /// Sequence number of the first call whose command contains `pattern`.
    #[must_use]
    pub fn first_seq(&self, pattern: &str) -> Option<usize> {
        self.state
            .lock()
            .calls
            .iter()
            .find(|call| call.command().is_some_and(|c| c.contains(pattern)))
            .map(|call| call.seq)
    }

    /// Sequence number of the last call whose command contains `pattern`.
    #[must_use]
    pub fn last_seq(&self, pattern: &str) -> Option<usize> {
        self.state
            .lock()
            .calls
            .iter()
            .rev()
            .find(|call| call.command().is_some_and(|c| c.contains(pattern)))
            .map(|call| call.seq)
    }

    fn record(&self, address: &RemoteAddress, kind: CallKind, succeeded: bool) {
        let mut state = self.state.lock();
        let seq = state.calls.len();
        state.calls.push(Call {
            seq,
            address: address.clone(),
            kind,
            succeeded,
        });
    }

    async fn simulate_latency(&self, address: &RemoteAddress) {
        let latency = self.state.lock().latencies.get(address.host()).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl RemoteTransport for MemoryTransport {
    async fn execute(&self, address: &RemoteAddress, command: &str) -> Result<String> {
        self.simulate_latency(address).await;

        let response = {
            let mut state = self.state.lock();
            state
                .rules
                .iter_mut()
                .find(|rule| rule.matches(address, command))
                .map_or(Response::Output(String::new()), Rule::next)
        };

        debug!(%address, "memory execute: {command} -> {response:?}");

        match response {
            Response::Output(output) => {
                self.record(address, CallKind::Execute(command.to_string()), true);
                Ok(output)
            }
            Response::Fail(message) => {
                self.record(address, CallKind::Execute(command.to_string()), false);
                Err(TransportError::Other(message))
            }
        }
    }

    async fn copy(&self, src: &CopyEndpoint, dest: &CopyEndpoint) -> Result<()> {
        let direction = CopyDirection::infer(src, dest)?;
        let kind = CallKind::Copy {
            src: src.to_string(),
            dest: dest.to_string(),
        };

        match (direction, src, dest) {
            (
                CopyDirection::Pull,
                CopyEndpoint::Remote { address, path },
                CopyEndpoint::Local(local),
            ) => {
                self.simulate_latency(address).await;

                let contents = self
                    .state
                    .lock()
                    .files
                    .get(&(address.host().to_string(), path.clone()))
                    .cloned();

                let Some(contents) = contents else {
                    self.record(address, kind, false);
                    return Err(TransportError::Other(format!("no such file: {src}")));
                };

                tokio::fs::write(local, contents)
                    .await
                    .map_err(|e| TransportError::Io("failed to write pulled file", e))?;
                self.record(address, kind, true);

                Ok(())
            }
            (
                CopyDirection::Push,
                CopyEndpoint::Local(local),
                CopyEndpoint::Remote { address, path },
            ) => {
                self.simulate_latency(address).await;

                let contents = tokio::fs::read_to_string(local)
                    .await
                    .map_err(|e| TransportError::Io("failed to read pushed file", e))?;
                self.state
                    .lock()
                    .files
                    .insert((address.host().to_string(), path.clone()), contents);
                self.record(address, kind, true);

                Ok(())
            }
            _ => Err(TransportError::InvalidAddress(format!("{src} -> {dest}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> RemoteAddress {
        RemoteAddress::new("ubuntu", "10.0.0.1")
    }

    #[tokio::test]
    async fn test_unmatched_commands_succeed_silently() {
        let _ = tracing_subscriber::fmt::try_init();

        let transport = MemoryTransport::new();
        let output = transport.execute(&address(), "uptime").await.unwrap();

        assert_eq!(output, "");
        assert_eq!(transport.commands_for("10.0.0.1"), vec!["uptime"]);
    }

    #[tokio::test]
    async fn test_scripted_sequence_repeats_last_response() {
        let transport = MemoryTransport::new();
        transport.script(
            Some("10.0.0.1"),
            "eth.syncing",
            vec![Response::output("true"), Response::output("false")],
        );

        let mut outputs = Vec::new();
        for _ in 0..3 {
            let output = transport
                .execute(&address(), "bor attach --exec eth.syncing")
                .await
                .unwrap();
            outputs.push(output);
        }

        assert_eq!(outputs, vec!["true", "false", "false"]);
    }

    #[tokio::test]
    async fn test_fail_times_then_succeed() {
        let transport = MemoryTransport::new();
        transport.fail_times(None, "systemctl", 2);

        assert!(transport.execute(&address(), "sudo systemctl start bor").await.is_err());
        assert!(transport.execute(&address(), "sudo systemctl start bor").await.is_err());
        assert!(transport.execute(&address(), "sudo systemctl start bor").await.is_ok());

        let calls = transport.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls.iter().map(|c| c.succeeded).collect::<Vec<_>>(),
            vec![false, false, true]
        );
    }

    #[tokio::test]
    async fn test_pull_and_push_files() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("address.txt");

        let transport = MemoryTransport::new();
        transport.serve_file("10.0.0.1", "/var/lib/bor/address.txt", "0xabc\n");

        transport
            .copy(
                &address().endpoint("/var/lib/bor/address.txt"),
                &CopyEndpoint::Local(local.clone()),
            )
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&local).unwrap(), "0xabc\n");

        transport
            .copy(
                &CopyEndpoint::Local(local),
                &RemoteAddress::new("ubuntu", "10.0.0.2").endpoint("/tmp/address.txt"),
            )
            .await
            .unwrap();
        assert_eq!(transport.calls().len(), 2);

        let missing = transport
            .copy(
                &address().endpoint("/nope"),
                &CopyEndpoint::Local(dir.path().join("nope")),
            )
            .await;
        assert!(missing.is_err());
    }
}
