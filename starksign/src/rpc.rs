//! Minimal JSON-RPC 2.0 client for the read-only `starknet_call` request
//! that on-chain signature verification relies on.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use url::Url;

use starksign_crypto::Felt;

use crate::errors::RemoteVerificationError;

/// JSON-RPC error code: the target contract has no code.
const CONTRACT_NOT_FOUND: i64 = 20;
/// JSON-RPC error code: the contract reverted.
const CONTRACT_ERROR: i64 = 40;

/// A read-only function call.
#[derive(Debug, Serialize)]
pub(crate) struct FunctionCall {
    pub contract_address: Felt,
    pub entry_point_selector: Felt,
    pub calldata: Vec<Felt>,
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: CallParams<'a>,
}

#[derive(Debug, Serialize)]
struct CallParams<'a> {
    request: &'a FunctionCall,
    block_id: &'static str,
}

/// What a completed round trip tells us: the entrypoint either returned
/// values or reverted inside the contract. Everything else is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CallOutcome {
    Values(Vec<Felt>),
    Reverted(String),
}

pub(crate) struct RpcClient {
    http: reqwest::Client,
    url: Url,
}

impl RpcClient {
    pub(crate) fn new(url: Url, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            url,
        })
    }

    /// One `starknet_call` round trip against the latest block.
    pub(crate) async fn call_contract(
        &self,
        call: &FunctionCall,
    ) -> Result<CallOutcome, RemoteVerificationError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "starknet_call",
            params: CallParams {
                request: call,
                block_id: "latest",
            },
        };
        tracing::debug!(contract = %call.contract_address, "sending starknet_call");
        let response = self.http.post(self.url.clone()).json(&request).send().await?;
        let body: Value = response.json().await?;
        interpret_response(&body)
    }
}

/// Map a JSON-RPC response body onto a call outcome, distinguishing an
/// undeployed account from every other failure.
pub(crate) fn interpret_response(body: &Value) -> Result<CallOutcome, RemoteVerificationError> {
    if let Some(error) = body.get("error") {
        let code = error
            .get("code")
            .and_then(Value::as_i64)
            .ok_or_else(|| RemoteVerificationError::MalformedResponse(error.to_string()))?;
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return match code {
            CONTRACT_NOT_FOUND => Err(RemoteVerificationError::AccountNotDeployed),
            CONTRACT_ERROR => Ok(CallOutcome::Reverted(message)),
            _ => Err(RemoteVerificationError::Rpc { code, message }),
        };
    }
    let Some(result) = body.get("result") else {
        return Err(RemoteVerificationError::MalformedResponse(body.to_string()));
    };
    let items = result
        .as_array()
        .ok_or_else(|| RemoteVerificationError::MalformedResponse(result.to_string()))?;
    let values = items
        .iter()
        .map(|item| {
            item.as_str()
                .and_then(|s| Felt::from_hex(s).ok())
                .ok_or_else(|| RemoteVerificationError::MalformedResponse(item.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CallOutcome::Values(values))
}
