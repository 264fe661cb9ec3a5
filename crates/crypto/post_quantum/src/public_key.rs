use alloy_primitives::hex;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{
    VariableList,
    typenum::{U64, Unsigned},
};
use tree_hash_derive::TreeHash;

use crate::errors::PQError;

pub type PublicKeyLength = U64;

#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct PQPublicKey {
    #[serde(with = "ssz_types::serde_utils::hex_var_list")]
    pub inner: VariableList<u8, PublicKeyLength>,
}

impl PQPublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PQError> {
        let inner = VariableList::new(bytes.to_vec()).map_err(|_| PQError::PublicKeyTooLong {
            length: bytes.len(),
            limit: PublicKeyLength::to_usize(),
        })?;
        Ok(Self { inner })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }
}

impl Default for PQPublicKey {
    fn default() -> Self {
        Self {
            inner: VariableList::empty(),
        }
    }
}

impl std::fmt::Display for PQPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.as_bytes()))
    }
}
