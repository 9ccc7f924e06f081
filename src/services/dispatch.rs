use serde_json::Value;
use std::time::Duration;

use crate::config::DispatchConfiguration;
use crate::error::ServerError;
use crate::services::Transport;

/// Terminal result of one command dispatch.
#[derive(Debug)]
pub struct CommandOutcome {
    pub payload: Value,
    /// Number of status polls it took; zero for immediately terminal commands.
    pub polls: u32,
}

fn follow_up_url(payload: &Value) -> Option<&str> {
    payload
        .pointer("/commandResponse/url")
        .and_then(Value::as_str)
}

fn command_status(payload: &Value) -> Option<&str> {
    payload
        .pointer("/commandResponse/status")
        .and_then(Value::as_str)
}

fn is_terminal(payload: &Value) -> bool {
    follow_up_url(payload).is_none() || command_status(payload) != Some("inProgress")
}

/// Submit a command and, if the remote reports it as asynchronous, poll its
/// status URL until it leaves "inProgress".
///
/// The initial POST failing is fatal. A poll request failing is logged and
/// consumes one attempt; the loop continues. Exhausting the attempt budget
/// while still in progress is a timeout, distinct from a transport error so
/// callers can re-invoke the command out-of-band.
///
/// The engine holds no state between calls; each dispatch is independent
/// and keyed only by the URLs it is given.
pub async fn dispatch(
    transport: &Transport,
    policy: &DispatchConfiguration,
    url: &str,
    body: &Value,
    access_token: &str,
) -> Result<CommandOutcome, ServerError> {
    let (status, payload) = transport.post_json(url, body, access_token).await?;
    if !status.is_success() {
        return Err(ServerError::Upstream(format!(
            "Command rejected with {status}"
        )));
    }
    if is_terminal(&payload) {
        return Ok(CommandOutcome { payload, polls: 0 });
    }

    let poll_url = follow_up_url(&payload)
        .map(str::to_string)
        .ok_or_else(|| ServerError::Protocol("In-progress response missing status URL".into()))?;
    let interval = Duration::from_secs(policy.poll_interval_seconds);

    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(interval).await;

        match transport.get_json(&poll_url, access_token).await {
            Ok((status, payload)) => {
                if !status.is_success() {
                    tracing::warn!(attempt, %status, "Status poll returned an error response");
                    continue;
                }
                if command_status(&payload) != Some("inProgress") {
                    tracing::info!(attempt, "Command completed");
                    return Ok(CommandOutcome {
                        payload,
                        polls: attempt,
                    });
                }
                tracing::debug!(attempt, "Command still in progress");
            }
            // A failed poll is not a verdict on the command; it only costs
            // an attempt.
            Err(e) => tracing::warn!(attempt, error = %e, "Status poll failed"),
        }
    }

    Err(ServerError::Timeout {
        attempts: policy.max_attempts,
    })
}
