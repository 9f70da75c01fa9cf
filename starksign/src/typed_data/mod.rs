//! Typed-data documents and their hashing.
//!
//! A document carries a type schema, a domain separator, a primary type
//! and a message tree. Hashing follows the legacy (`StarkNetDomain`)
//! scheme: type signature strings are hashed with the starknet Keccak,
//! values fold into Pedersen chain hashes, and the final message hash
//! binds the domain and the signer identity so a signature can be
//! replayed neither across dapps nor across accounts.

mod schema;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use starksign_crypto::{hash_elements, selector_from_name, Felt, FeltError};

use crate::errors::{EncodingError, SchemaError, TypedDataError};
use crate::merkle::MerkleTree;

/// Reserved name of the domain separator type.
pub const DOMAIN_TYPE_NAME: &str = "StarkNetDomain";

/// Prefix mixed into every message hash.
const MESSAGE_PREFIX: &str = "StarkNet Message";

/// One field declaration inside a type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: String,
    /// Leaf type of a `merkletree` field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
}

/// A typed-data document, matching the JSON layout wallets sign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedData {
    pub types: IndexMap<String, Vec<Parameter>>,
    #[serde(rename = "primaryType")]
    pub primary_type: String,
    pub domain: Map<String, Value>,
    pub message: Map<String, Value>,
}

impl TypedData {
    pub fn new(
        types: IndexMap<String, Vec<Parameter>>,
        primary_type: impl Into<String>,
        domain: Map<String, Value>,
        message: Map<String, Value>,
    ) -> Self {
        Self {
            types,
            primary_type: primary_type.into(),
            domain,
            message,
        }
    }

    /// Validate the whole document against the schema: the primary and
    /// domain types resolve, and both value trees match their declared
    /// shapes. Called once before any hashing so malformed input is
    /// rejected at a single boundary.
    pub fn validate(&self) -> Result<(), TypedDataError> {
        schema::dependencies(&self.types, &self.primary_type)?;
        schema::dependencies(&self.types, DOMAIN_TYPE_NAME)?;
        self.check_struct(DOMAIN_TYPE_NAME, &self.domain, "domain")?;
        self.check_struct(&self.primary_type, &self.message, "message")?;
        Ok(())
    }

    /// The canonical signature string of a type: the type itself followed
    /// by every referenced struct type.
    pub fn encode_type(&self, type_name: &str) -> Result<String, SchemaError> {
        let ordered = schema::dependencies(&self.types, type_name)?;
        let mut encoded = String::new();
        for name in ordered {
            let fields = self.types.get(&name).expect("resolved types are defined");
            let joined = fields
                .iter()
                .map(|f| format!("{}:{}", f.name, f.r#type))
                .collect::<Vec<_>>()
                .join(",");
            encoded.push_str(&format!("{name}({joined})"));
        }
        Ok(encoded)
    }

    /// Selector of the canonical signature string.
    pub fn type_hash(&self, type_name: &str) -> Result<Felt, SchemaError> {
        Ok(selector_from_name(&self.encode_type(type_name)?))
    }

    /// Chain-hash a struct value: its type hash followed by every encoded
    /// field, in declaration order.
    pub fn struct_hash(
        &self,
        type_name: &str,
        data: &Map<String, Value>,
    ) -> Result<Felt, TypedDataError> {
        self.struct_hash_at(type_name, data, type_name)
    }

    /// Hash of the domain separator.
    pub fn domain_hash(&self) -> Result<Felt, TypedDataError> {
        self.struct_hash_at(DOMAIN_TYPE_NAME, &self.domain, "domain")
    }

    /// The full message hash, bound to `signer` (an account address or a
    /// public key, depending on the flow).
    pub fn message_hash(&self, signer: &Felt) -> Result<Felt, TypedDataError> {
        self.validate()?;
        let prefix =
            Felt::from_short_string(MESSAGE_PREFIX).expect("prefix is a valid short string");
        let domain = self.domain_hash()?;
        let message = self.struct_hash_at(&self.primary_type, &self.message, "message")?;
        Ok(hash_elements(&[prefix, domain, *signer, message]))
    }

    fn struct_hash_at(
        &self,
        type_name: &str,
        data: &Map<String, Value>,
        path: &str,
    ) -> Result<Felt, TypedDataError> {
        let fields = self
            .types
            .get(type_name)
            .ok_or_else(|| SchemaError::UnknownType(type_name.to_string()))?;
        let mut elements = vec![self.type_hash(type_name)?];
        for field in fields {
            let field_path = format!("{path}.{}", field.name);
            let value = data.get(&field.name).ok_or_else(|| EncodingError::MissingField {
                path: field_path.clone(),
            })?;
            elements.push(self.encode_value(field, value, &field_path)?);
        }
        Ok(hash_elements(&elements))
    }

    fn encode_value(
        &self,
        field: &Parameter,
        value: &Value,
        path: &str,
    ) -> Result<Felt, TypedDataError> {
        if schema::is_pointer(&field.r#type) {
            let Value::Array(items) = value else {
                return Err(EncodingError::TypeMismatch {
                    path: path.to_string(),
                    expected: "an array",
                }
                .into());
            };
            let element = Parameter {
                name: field.name.clone(),
                r#type: schema::strip_pointer(&field.r#type).to_string(),
                contains: None,
            };
            let hashes = items
                .iter()
                .enumerate()
                .map(|(i, item)| self.encode_value(&element, item, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(hash_elements(&hashes));
        }
        if field.r#type == "merkletree" {
            return self.merkle_root(field, value, path);
        }
        if self.types.contains_key(&field.r#type) {
            let Value::Object(data) = value else {
                return Err(EncodingError::TypeMismatch {
                    path: path.to_string(),
                    expected: "an object",
                }
                .into());
            };
            return self.struct_hash_at(&field.r#type, data, path);
        }
        encode_primitive(&field.r#type, value, path).map_err(Into::into)
    }

    fn merkle_root(
        &self,
        field: &Parameter,
        value: &Value,
        path: &str,
    ) -> Result<Felt, TypedDataError> {
        let leaf_type = field
            .contains
            .as_deref()
            .ok_or_else(|| SchemaError::MissingLeafType(field.name.clone()))?;
        let Value::Array(items) = value else {
            return Err(EncodingError::TypeMismatch {
                path: path.to_string(),
                expected: "an array",
            }
            .into());
        };
        let leaf = Parameter {
            name: field.name.clone(),
            r#type: leaf_type.to_string(),
            contains: None,
        };
        let leaves = items
            .iter()
            .enumerate()
            .map(|(i, item)| self.encode_value(&leaf, item, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;
        let tree = MerkleTree::new(leaves).map_err(|_| EncodingError::EmptyMerkleTree {
            path: path.to_string(),
        })?;
        Ok(tree.root_hash)
    }

    fn check_struct(
        &self,
        type_name: &str,
        data: &Map<String, Value>,
        path: &str,
    ) -> Result<(), TypedDataError> {
        let fields = self
            .types
            .get(type_name)
            .ok_or_else(|| SchemaError::UnknownType(type_name.to_string()))?;
        for field in fields {
            let field_path = format!("{path}.{}", field.name);
            let value = data.get(&field.name).ok_or_else(|| EncodingError::MissingField {
                path: field_path.clone(),
            })?;
            self.check_value(field, value, &field_path)?;
        }
        Ok(())
    }

    fn check_value(&self, field: &Parameter, value: &Value, path: &str) -> Result<(), TypedDataError> {
        if schema::is_pointer(&field.r#type) || field.r#type == "merkletree" {
            let base = if field.r#type == "merkletree" {
                field
                    .contains
                    .as_deref()
                    .ok_or_else(|| SchemaError::MissingLeafType(field.name.clone()))?
            } else {
                schema::strip_pointer(&field.r#type)
            };
            let Value::Array(items) = value else {
                return Err(EncodingError::TypeMismatch {
                    path: path.to_string(),
                    expected: "an array",
                }
                .into());
            };
            let element = Parameter {
                name: field.name.clone(),
                r#type: base.to_string(),
                contains: None,
            };
            for (i, item) in items.iter().enumerate() {
                self.check_value(&element, item, &format!("{path}[{i}]"))?;
            }
            return Ok(());
        }
        if self.types.contains_key(&field.r#type) {
            let Value::Object(data) = value else {
                return Err(EncodingError::TypeMismatch {
                    path: path.to_string(),
                    expected: "an object",
                }
                .into());
            };
            return self.check_struct(&field.r#type, data, path);
        }
        encode_primitive(&field.r#type, value, path)?;
        Ok(())
    }
}

/// Coerce a JSON leaf to a field element according to its declared tag.
fn encode_primitive(tag: &str, value: &Value, path: &str) -> Result<Felt, EncodingError> {
    match tag {
        "felt" | "shortstring" => felt_from_value(value, path, true, "a felt"),
        "contractAddress" => felt_from_value(value, path, false, "a contract address"),
        "timestamp" | "u128" => {
            let felt = felt_from_value(value, path, false, "an unsigned 128-bit integer")?;
            if felt > Felt::from_u128(u128::MAX) {
                return Err(EncodingError::OutOfRange {
                    path: path.to_string(),
                    kind: "u128",
                });
            }
            Ok(felt)
        }
        "i128" => {
            let repr = match value {
                Value::Number(n) => n.to_string(),
                Value::String(s) => s.clone(),
                _ => {
                    return Err(EncodingError::TypeMismatch {
                        path: path.to_string(),
                        expected: "a signed 128-bit integer",
                    })
                }
            };
            if repr.contains(['.', 'e', 'E']) {
                return Err(EncodingError::NonInteger {
                    path: path.to_string(),
                });
            }
            let parsed: i128 = repr.parse().map_err(|_| EncodingError::OutOfRange {
                path: path.to_string(),
                kind: "i128",
            })?;
            Ok(Felt::from_i128(parsed))
        }
        "bool" => match value {
            Value::Bool(true) => Ok(Felt::ONE),
            Value::Bool(false) => Ok(Felt::ZERO),
            _ => Err(EncodingError::TypeMismatch {
                path: path.to_string(),
                expected: "a boolean",
            }),
        },
        "string" => match value {
            Value::String(s) => {
                Felt::from_short_string(s).map_err(|source| felt_error(source, path))
            }
            _ => Err(EncodingError::TypeMismatch {
                path: path.to_string(),
                expected: "a string",
            }),
        },
        "selector" => match value {
            Value::String(s) if s.starts_with("0x") => {
                Felt::from_hex(s).map_err(|source| felt_error(source, path))
            }
            Value::String(s) => Ok(selector_from_name(s)),
            _ => Err(EncodingError::TypeMismatch {
                path: path.to_string(),
                expected: "a selector name",
            }),
        },
        _ => Err(EncodingError::TypeMismatch {
            path: path.to_string(),
            expected: "a known primitive type",
        }),
    }
}

/// The coercion ladder shared by numeric tags: JSON numbers, `0x` hex
/// strings and decimal strings; short strings where the tag allows them.
fn felt_from_value(
    value: &Value,
    path: &str,
    allow_short_string: bool,
    expected: &'static str,
) -> Result<Felt, EncodingError> {
    match value {
        Value::Number(n) => {
            let repr = n.to_string();
            if repr.contains(['.', 'e', 'E']) {
                return Err(EncodingError::NonInteger {
                    path: path.to_string(),
                });
            }
            if repr.starts_with('-') {
                return Err(EncodingError::NegativeUnsigned {
                    path: path.to_string(),
                });
            }
            Felt::from_dec_str(&repr).map_err(|source| felt_error(source, path))
        }
        Value::String(s) if s.starts_with("0x") || s.starts_with("0X") => {
            Felt::from_hex(s).map_err(|source| felt_error(source, path))
        }
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            Felt::from_dec_str(s).map_err(|source| felt_error(source, path))
        }
        Value::String(s) if allow_short_string => {
            Felt::from_short_string(s).map_err(|source| felt_error(source, path))
        }
        _ => Err(EncodingError::TypeMismatch {
            path: path.to_string(),
            expected,
        }),
    }
}

fn felt_error(source: FeltError, path: &str) -> EncodingError {
    EncodingError::Felt {
        path: path.to_string(),
        source,
    }
}
