use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::CoreError;

/// Read a JSON document, returning `T::default()` when the file does
/// not exist yet or is empty. A present-but-corrupt file is an error,
/// never an empty default.
pub fn load_or_default<T>(path: &Path) -> Result<T, CoreError>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }
    let bytes = fs::read(path)?;
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(T::default());
    }
    serde_json::from_slice(&bytes).map_err(Into::into)
}

/// Write a JSON document atomically: serialize to a temporary file in
/// the same directory, then rename it over the target. A crash mid-write
/// leaves the previously committed file intact.
pub fn save_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), CoreError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }

    let json = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("tmp");

    fs::write(&tmp, &json)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
