use grove_core::StoreError;

/// Storage backend holding vault documents, addressed by vault-relative,
/// forward-slash paths.
pub trait FileStore: Send + Sync {
    /// Human-readable location, used in messages.
    fn describe(&self) -> String;

    /// Every document path in the vault. Order is unspecified.
    fn list_documents(&self) -> Result<Vec<String>, StoreError>;

    fn read(&self, path: &str) -> Result<String, StoreError>;

    fn write(&self, path: &str, text: &str) -> Result<(), StoreError>;

    fn remove(&self, path: &str) -> Result<(), StoreError>;
}

/// Forward slashes, no leading `./` or `/`.
pub fn normalize_rel_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut rest = path.as_str();
    loop {
        if let Some(r) = rest.strip_prefix("./") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix('/') {
            rest = r;
        } else {
            break;
        }
    }
    rest.to_string()
}
