use std::{cell::Cell, time::Duration};

use serde::{Deserialize, Serialize};

use super::{ClockError, ClockResult, ClockSource};

////////////////////////////////////////////////////////////////////////////////

const DEFAULT_TRANSPORT_TIMEOUT: Duration = Duration::from_secs(10);

////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize)]
struct BlockRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: (&'a str, bool),
}

#[derive(Deserialize)]
struct Reply {
    #[serde(default)]
    result: Option<Block>,
    #[serde(default)]
    error: Option<ErrorObject>,
}

#[derive(Deserialize)]
struct Block {
    timestamp: String,
}

#[derive(Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

////////////////////////////////////////////////////////////////////////////////

/// Reads the timestamp of the latest block from an Ethereum-style
/// JSON-RPC endpoint (`eth_getBlockByNumber`).
///
/// Requests are blocking HTTP calls, so they are moved onto the tokio
/// blocking pool; reads must happen inside a tokio runtime.
pub struct JsonRpcClock {
    endpoint: String,
    agent: ureq::Agent,
    next_id: Cell<u64>,
}

impl JsonRpcClock {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_transport_timeout(endpoint, DEFAULT_TRANSPORT_TIMEOUT)
    }

    pub fn with_transport_timeout(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            next_id: Cell::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self) -> ClockResult<String> {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        let request = BlockRequest {
            jsonrpc: "2.0",
            id,
            method: "eth_getBlockByNumber",
            params: ("latest", false),
        };
        Ok(serde_json::to_string(&request)?)
    }
}

impl ClockSource for JsonRpcClock {
    async fn timestamp(&self) -> ClockResult<u64> {
        let body = self.request_body()?;
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();
        let raw = tokio::task::spawn_blocking(move || -> ClockResult<String> {
            agent
                .post(&endpoint)
                .set("Content-Type", "application/json")
                .send_string(&body)
                .map_err(|e| ClockError::Transport {
                    info: e.to_string(),
                })?
                .into_string()
                .map_err(|e| ClockError::Transport {
                    info: e.to_string(),
                })
        })
        .await
        .map_err(|e| ClockError::Unavailable {
            info: e.to_string(),
        })??;
        parse_block_timestamp(&raw)
    }
}

////////////////////////////////////////////////////////////////////////////////

pub(crate) fn parse_block_timestamp(raw: &str) -> ClockResult<u64> {
    let reply: Reply = serde_json::from_str(raw)?;
    if let Some(error) = reply.error {
        return Err(ClockError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    let block = reply.result.ok_or_else(|| ClockError::Malformed {
        info: "no latest block in reply".to_owned(),
    })?;
    let digits = block
        .timestamp
        .strip_prefix("0x")
        .ok_or_else(|| ClockError::Malformed {
            info: format!("timestamp {:?} is not hex quantity", block.timestamp),
        })?;
    // from_str_radix alone would accept a sign
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ClockError::Malformed {
            info: format!("timestamp {:?} is not hex quantity", block.timestamp),
        });
    }
    u64::from_str_radix(digits, 16).map_err(|e| ClockError::Malformed {
        info: format!("timestamp {:?}: {e}", block.timestamp),
    })
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    ////////////////////////////////////////////////////////////////////////////////

    #[rstest]
    #[case(r#"{"jsonrpc":"2.0","id":1,"result":{"number":"0x10","timestamp":"0x6553f100"}}"#, 1_700_000_000)]
    #[case(r#"{"jsonrpc":"2.0","id":2,"result":{"timestamp":"0x0"}}"#, 0)]
    fn parses_timestamp(#[case] raw: &str, #[case] expected: u64) {
        assert_eq!(parse_block_timestamp(raw), Ok(expected));
    }

    ////////////////////////////////////////////////////////////////////////////////

    #[rstest]
    #[case(r#"{"jsonrpc":"2.0","id":1,"result":null}"#)]
    #[case(r#"{"jsonrpc":"2.0","id":1,"result":{"timestamp":"1700000000"}}"#)]
    #[case(r#"{"jsonrpc":"2.0","id":1,"result":{"timestamp":"0xzz"}}"#)]
    #[case(r#"{"jsonrpc":"2.0","id":1,"result":{"timestamp":"0x+1a"}}"#)]
    #[case(r#"{"jsonrpc":"2.0","id":1,"result":{"timestamp":"0x"}}"#)]
    #[case("not json")]
    fn rejects_malformed(#[case] raw: &str) {
        let result = parse_block_timestamp(raw);
        assert!(matches!(result, Err(ClockError::Malformed { .. })), "{result:?}");
    }

    ////////////////////////////////////////////////////////////////////////////////

    #[test]
    fn surfaces_rpc_error() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"header not found"}}"#;
        assert_eq!(
            parse_block_timestamp(raw),
            Err(ClockError::Rpc {
                code: -32000,
                message: "header not found".to_owned()
            })
        );
    }

    ////////////////////////////////////////////////////////////////////////////////

    #[test]
    fn request_ids_advance() {
        let clock = JsonRpcClock::new("http://127.0.0.1:8545");
        let first = clock.request_body().unwrap();
        let second = clock.request_body().unwrap();
        assert!(first.contains(r#""method":"eth_getBlockByNumber""#));
        assert!(first.contains(r#""params":["latest",false]"#));
        assert!(first.contains(r#""id":1"#));
        assert!(second.contains(r#""id":2"#));
    }
}
