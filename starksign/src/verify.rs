//! Signature verification over typed-data documents: locally against a
//! public key, or remotely against an account contract's
//! `is_valid_signature` entrypoint.

use std::time::Duration;

use url::Url;

use starksign_crypto::{selector_from_name, Felt, Signature, SigningKey, VerifyingKey};

use crate::errors::{RemoteVerificationError, SignMessageError, TypedDataError};
use crate::rpc::{CallOutcome, FunctionCall, RpcClient};
use crate::typed_data::TypedData;

const IS_VALID_SIGNATURE: &str = "is_valid_signature";

/// Sign a typed-data document. The message hash is bound to the signer's
/// public key, matching how key-pair wallets hash before signing.
pub fn sign_message(
    typed_data: &TypedData,
    key: &SigningKey,
) -> Result<Signature, SignMessageError> {
    let hash = typed_data.message_hash(&key.verifying_key().stark_key())?;
    Ok(key.sign(&hash)?)
}

/// Verify a typed-data signature against a public key, locally.
pub fn verify_message(
    typed_data: &TypedData,
    key: &VerifyingKey,
    signature: &Signature,
) -> Result<bool, TypedDataError> {
    let hash = typed_data.message_hash(&key.stark_key())?;
    Ok(key.verify(&hash, signature))
}

/// Builder for [`RemoteVerifier`]. The timeout bounds the single network
/// round trip each verification performs; there are no automatic retries.
#[derive(Debug)]
pub struct RemoteVerifierBuilder {
    rpc_url: Url,
    timeout: Option<Duration>,
}

impl RemoteVerifierBuilder {
    pub fn new(rpc_url: Url) -> Self {
        Self {
            rpc_url,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<RemoteVerifier, RemoteVerificationError> {
        Ok(RemoteVerifier {
            client: RpcClient::new(self.rpc_url, self.timeout)?,
        })
    }
}

/// Asks a deployed account contract whether a signature is valid for a
/// message hash. This is the verification path for accounts whose signing
/// logic is not a bare key pair, or when only an address is known.
///
/// Each verification is one request with no state kept across calls;
/// dropping the returned future simply abandons the round trip.
pub struct RemoteVerifier {
    client: RpcClient,
}

impl RemoteVerifier {
    pub fn builder(rpc_url: Url) -> RemoteVerifierBuilder {
        RemoteVerifierBuilder::new(rpc_url)
    }

    /// Hash the document bound to the account address, then verify
    /// on-chain.
    pub async fn verify_message(
        &self,
        typed_data: &TypedData,
        account: &Felt,
        signature: &Signature,
    ) -> Result<bool, RemoteVerificationError> {
        let hash = typed_data.message_hash(account)?;
        self.verify_message_hash(account, &hash, signature).await
    }

    /// Call `is_valid_signature(hash, [r, s])` on the account contract.
    ///
    /// `Ok(false)` covers both a non-`VALID` return value and a revert
    /// inside the contract; an undeployed account and transport problems
    /// surface as distinct errors, never as a negative result.
    pub async fn verify_message_hash(
        &self,
        account: &Felt,
        message_hash: &Felt,
        signature: &Signature,
    ) -> Result<bool, RemoteVerificationError> {
        if let Err(reason) = signature.validate() {
            tracing::debug!(%reason, "malformed signature, skipping the call");
            return Ok(false);
        }
        let call = FunctionCall {
            contract_address: *account,
            entry_point_selector: selector_from_name(IS_VALID_SIGNATURE),
            calldata: vec![*message_hash, Felt::from_u64(2), signature.r, signature.s],
        };
        match self.client.call_contract(&call).await? {
            CallOutcome::Values(values) => Ok(values.first() == Some(&valid_marker())),
            CallOutcome::Reverted(reason) => {
                tracing::debug!(%reason, "account contract rejected the signature");
                Ok(false)
            }
        }
    }
}

/// The `'VALID'` short string returned by compliant account contracts.
fn valid_marker() -> Felt {
    Felt::from_short_string("VALID").expect("static short string")
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::typed_data::tests_support::load_typed_data;

    const ACCOUNT: &str = "0xcd2a3d9f938e13cd947ec05abc7fe734df8dd826";
    const PRIVATE_KEY: &str = "0x1234567890987654321";

    fn felt(s: &str) -> Felt {
        Felt::from_hex(s).unwrap()
    }

    fn signing_key() -> SigningKey {
        SigningKey::from_secret_scalar(felt(PRIVATE_KEY)).unwrap()
    }

    #[test]
    fn test_sign_and_verify_message_locally() {
        let typed_data = load_typed_data("typed_data_playground_example.json");
        let key = signing_key();
        let signature = sign_message(&typed_data, &key).unwrap();
        assert!(verify_message(&typed_data, &key.verifying_key(), &signature).unwrap());

        let tampered = Signature::new(signature.r, signature.r);
        assert!(!verify_message(&typed_data, &key.verifying_key(), &tampered).unwrap());
    }

    fn verifier(server: &MockServer) -> RemoteVerifier {
        RemoteVerifier::builder(Url::parse(&server.base_url()).unwrap())
            .with_timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap()
    }

    fn plausible_signature() -> Signature {
        Signature::new(felt("0x123abc"), felt("0x456def"))
    }

    #[tokio::test]
    async fn test_remote_valid() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).json_body_partial(r#"{ "method": "starknet_call" }"#);
            then.status(200)
                .json_body(json!({ "jsonrpc": "2.0", "id": 1, "result": ["0x56414c4944"] }));
        });

        let verifier = verifier(&server);
        let result = verifier
            .verify_message_hash(&felt(ACCOUNT), &Felt::ONE, &plausible_signature())
            .await
            .unwrap();
        mock.assert();
        assert!(result);
    }

    #[tokio::test]
    async fn test_remote_invalid_return_value() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200)
                .json_body(json!({ "jsonrpc": "2.0", "id": 1, "result": ["0x0"] }));
        });

        let result = verifier(&server)
            .verify_message_hash(&felt(ACCOUNT), &Felt::ONE, &plausible_signature())
            .await
            .unwrap();
        assert!(!result);
    }

    #[tokio::test]
    async fn test_remote_revert_is_invalid() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": 40, "message": "Contract error: is invalid signature" }
            }));
        });

        let result = verifier(&server)
            .verify_message_hash(&felt(ACCOUNT), &Felt::ONE, &plausible_signature())
            .await
            .unwrap();
        assert!(!result);
    }

    #[tokio::test]
    async fn test_remote_undeployed_account() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": 20, "message": "Contract not found" }
            }));
        });

        let error = verifier(&server)
            .verify_message_hash(&felt(ACCOUNT), &Felt::ONE, &plausible_signature())
            .await
            .unwrap_err();
        assert!(matches!(error, RemoteVerificationError::AccountNotDeployed));
    }

    #[tokio::test]
    async fn test_remote_transport_failure() {
        // nothing listens here
        let verifier = RemoteVerifier::builder(Url::parse("http://127.0.0.1:9").unwrap())
            .build()
            .unwrap();
        let error = verifier
            .verify_message_hash(&felt(ACCOUNT), &Felt::ONE, &plausible_signature())
            .await
            .unwrap_err();
        assert!(matches!(error, RemoteVerificationError::Transport(_)));
    }

    #[tokio::test]
    async fn test_remote_malformed_signature_short_circuits() {
        // no server needed: the malformed signature never hits the wire
        let verifier = RemoteVerifier::builder(Url::parse("http://127.0.0.1:9").unwrap())
            .build()
            .unwrap();
        let zero = Signature::new(Felt::ZERO, Felt::ONE);
        let result = verifier
            .verify_message_hash(&felt(ACCOUNT), &Felt::ONE, &zero)
            .await
            .unwrap();
        assert!(!result);
    }

    #[tokio::test]
    async fn test_remote_verify_message_hashes_document() {
        let server = MockServer::start();
        // the playground document bound to the account address
        let expected_hash = load_typed_data("typed_data_playground_example.json")
            .message_hash(&felt(ACCOUNT))
            .unwrap();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .body_contains(format!("{expected_hash:#x}"));
            then.status(200)
                .json_body(json!({ "jsonrpc": "2.0", "id": 1, "result": ["0x56414c4944"] }));
        });

        let typed_data = load_typed_data("typed_data_playground_example.json");
        let result = verifier(&server)
            .verify_message(&typed_data, &felt(ACCOUNT), &plausible_signature())
            .await
            .unwrap();
        mock.assert();
        assert!(result);
    }
}
