//! Shared utilities: logging, name normalization, input bounds.

use std::path::Path;
use tracing::Level;

/// Initialize tracing with env filter. Safe to call once at startup.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Normalize an item, chassis or modifier name for lookup (lowercase, trim).
pub fn normalize_id(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Check an input file exists and is within the size limit.
pub fn check_file_size(path: &Path, max_bytes: usize) -> Result<u64, String> {
    let meta = std::fs::metadata(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    if !meta.is_file() {
        return Err(format!("{} is not a file", path.display()));
    }
    let size = meta.len();
    if size > max_bytes as u64 {
        return Err(format!(
            "file too large: {} bytes (max {})",
            size, max_bytes
        ));
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn normalize_id_trim_lower() {
        assert_eq!(normalize_id("  HBK-4P  "), "hbk-4p");
        assert_eq!(normalize_id("Medium Laser"), "medium laser");
    }

    #[test]
    fn file_size_bounded() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&[b'x'; 64]).unwrap();
        assert_eq!(check_file_size(f.path(), 64).unwrap(), 64);
        assert!(check_file_size(f.path(), 63).is_err());
        assert!(check_file_size(Path::new("/definitely/not/here"), 64).is_err());
    }
}
