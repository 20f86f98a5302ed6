pub const DID_DELIMITER: &str = ":";
pub const DID_PREFIX: &str = "did";
pub const DID_METHOD_KEY: &str = "key";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DidError {
    #[error("Invalid DID prefix")]
    Prefix,

    #[error("Invalid DID method")]
    Method,

    #[error("Invalid DID format")]
    Format,
}

/// Returns the method-specific part of `did`, e.g. `z6Mk...` for
/// `did:key:z6Mk...`.
pub fn extract_did_data<'a>(did: &'a str, method: &str) -> Result<&'a str, DidError> {
    did.strip_prefix(DID_PREFIX)
        .ok_or(DidError::Prefix)?
        .strip_prefix(DID_DELIMITER)
        .ok_or(DidError::Format)?
        .strip_prefix(method)
        .ok_or(DidError::Method)?
        .strip_prefix(DID_DELIMITER)
        .ok_or(DidError::Format)
}

pub fn combine_did_data(method: &str, data: &str) -> String {
    format!("{DID_PREFIX}{DID_DELIMITER}{method}{DID_DELIMITER}{data}")
}
