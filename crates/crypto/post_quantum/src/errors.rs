#[derive(Debug, thiserror::Error)]
pub enum PQError {
    #[error("Signature is {length} bytes, exceeding the limit of {limit} bytes")]
    SignatureTooLong { length: usize, limit: usize },

    #[error("Public key is {length} bytes, exceeding the limit of {limit} bytes")]
    PublicKeyTooLong { length: usize, limit: usize },
}
