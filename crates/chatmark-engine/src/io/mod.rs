use std::fs;
use std::io::Read;
use std::path::Path;

use crate::error::EngineError;

/// Path that stands for standard input.
pub const STDIN_PATH: &str = "-";

/// Read markdown source from a file, or from stdin when `path` is `-`
pub fn read_source(path: &Path) -> Result<String, EngineError> {
    if path.as_os_str() == STDIN_PATH {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    if !path.exists() {
        return Err(EngineError::NotFound(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

/// Write rendered output, creating parent directories as needed
pub fn write_output(path: &Path, content: &str) -> Result<(), EngineError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(fs::write(path, content)?)
}
