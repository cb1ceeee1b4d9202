use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{address::AccountAddress, error::ParseIdError};

/// A published Move module, e.g. `0xc506…2d01::AlumniDonation`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModuleId {
    pub address: AccountAddress,
    pub name: String,
}

impl ModuleId {
    pub fn new(address: AccountAddress, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
        }
    }

    pub fn function(&self, name: impl Into<String>) -> EntryFunctionId {
        EntryFunctionId {
            module: self.clone(),
            name: name.into(),
        }
    }

    pub fn struct_tag(&self, name: impl Into<String>) -> StructTag {
        StructTag {
            module: self.clone(),
            name: name.into(),
            type_params: None,
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.address, self.name)
    }
}

impl FromStr for ModuleId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split("::").collect::<Vec<_>>().as_slice() {
            [address, name] if !name.is_empty() => Ok(Self::new(address.parse()?, *name)),
            _ => Err(ParseIdError::Shape(s.to_string())),
        }
    }
}

/// Fully qualified entry function, e.g. `0x1::coin::transfer`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntryFunctionId {
    pub module: ModuleId,
    pub name: String,
}

impl fmt::Display for EntryFunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.name)
    }
}

impl FromStr for EntryFunctionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split("::").collect::<Vec<_>>().as_slice() {
            [address, module, name] if !module.is_empty() && !name.is_empty() => Ok(Self {
                module: ModuleId::new(address.parse()?, *module),
                name: name.to_string(),
            }),
            _ => Err(ParseIdError::Shape(s.to_string())),
        }
    }
}

impl Serialize for EntryFunctionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntryFunctionId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Type tag of an on-chain resource. Generic parameters are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructTag {
    pub module: ModuleId,
    pub name: String,
    pub type_params: Option<String>,
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.name)?;
        if let Some(params) = &self.type_params {
            write!(f, "<{params}>")?;
        }
        Ok(())
    }
}

impl FromStr for StructTag {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (head, type_params) = match s.find('<') {
            Some(idx) => {
                let params = s[idx + 1..]
                    .strip_suffix('>')
                    .ok_or_else(|| ParseIdError::Shape(s.to_string()))?;
                (&s[..idx], Some(params.to_string()))
            }
            None => (s, None),
        };

        let function: EntryFunctionId = head
            .parse()
            .map_err(|_| ParseIdError::Shape(s.to_string()))?;

        Ok(Self {
            module: function.module,
            name: function.name,
            type_params,
        })
    }
}

/// An account resource as returned by the node's REST API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub data: serde_json::Value,
}

impl Resource {
    /// Whether this resource is an instance of `tag`. Addresses are compared after
    /// normalisation, so `0x1::coin::CoinStore` matches its long-form spelling.
    pub fn is(&self, tag: &StructTag) -> bool {
        self.type_tag
            .parse::<StructTag>()
            .map(|parsed| parsed == *tag)
            .unwrap_or(false)
    }
}

/// Entry function payload handed to a signing agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "entry_function_payload")]
pub struct TransactionRequest {
    pub function: EntryFunctionId,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<String>,
}

impl TransactionRequest {
    pub fn new(function: EntryFunctionId, arguments: Vec<String>) -> Self {
        Self {
            function,
            type_arguments: vec![],
            arguments,
        }
    }
}

/// Hash of a submitted transaction, used to poll for its confirmation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A transaction the ledger has executed, successfully or not.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommittedTx {
    pub hash: TxHash,
    pub version: Option<u64>,
    pub success: bool,
    pub vm_status: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxStatus {
    /// The node doesn't know the transaction (yet).
    NotFound,
    /// In the mempool, not yet executed.
    Pending,
    Committed(CommittedTx),
}
