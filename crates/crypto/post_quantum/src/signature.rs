use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{
    VariableList,
    typenum::{U4096, Unsigned},
};
use tree_hash_derive::TreeHash;

use crate::errors::PQError;

pub type SignatureLength = U4096;

/// Hash-based signatures are not aggregatable, so consensus objects carry them as opaque bytes
/// and keep one entry per signer.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct PQSignature {
    #[serde(with = "ssz_types::serde_utils::hex_var_list")]
    pub inner: VariableList<u8, SignatureLength>,
}

impl PQSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PQError> {
        let inner = VariableList::new(bytes.to_vec()).map_err(|_| PQError::SignatureTooLong {
            length: bytes.len(),
            limit: SignatureLength::to_usize(),
        })?;
        Ok(Self { inner })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for PQSignature {
    fn default() -> Self {
        Self {
            inner: VariableList::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use ssz::{Decode, Encode};

    use super::*;

    #[test]
    fn test_signature_length_limit() {
        assert!(PQSignature::from_bytes(&[7u8; 4096]).is_ok());
        assert!(matches!(
            PQSignature::from_bytes(&[7u8; 4097]),
            Err(PQError::SignatureTooLong {
                length: 4097,
                limit: 4096
            })
        ));
    }

    #[test]
    fn test_signature_ssz_and_json() -> anyhow::Result<()> {
        let signature = PQSignature::from_bytes(b"signature")?;

        let decoded = PQSignature::from_ssz_bytes(&signature.as_ssz_bytes())
            .map_err(|err| anyhow::anyhow!("{err:?}"))?;
        assert_eq!(decoded, signature);

        let json = serde_json::to_string(&signature)?;
        assert_eq!(json, r#"{"inner":"0x7369676e6174757265"}"#);

        Ok(())
    }

    #[test]
    fn test_default_signature_is_empty() {
        assert!(PQSignature::default().is_empty());
        assert!(!PQSignature::from_bytes(b"a").expect("valid length").is_empty());
    }
}
