use std::io::{ErrorKind, Write};
use std::{fs, path::Path, path::PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

/// Development fallback for `SECRET_KEY`: reuse the key persisted next to the
/// crate (or at `SECRET_KEY_FILE`), generating it on first start.
pub(super) fn load_or_create_secret_key() -> String {
    let path = secret_file_path();
    if let Some(existing) = read_key(&path) {
        return existing;
    }

    let generated = generate_secret_key();
    match persist_key(&path, &generated) {
        Ok(()) => generated,
        // Another process won the race; its key wins too.
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            read_key(&path).unwrap_or(generated)
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                path = %path.display(),
                "Could not persist generated secret key; tokens will not survive a restart"
            );
            generated
        }
    }
}

fn read_key(path: &Path) -> Option<String> {
    let raw = fs::read_to_string(path).ok()?;
    let key = raw.trim();
    (!key.is_empty()).then(|| key.to_string())
}

fn persist_key(path: &Path, key: &str) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(key.as_bytes())
}

fn generate_secret_key() -> String {
    let mut bytes = [0u8; 64];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn secret_file_path() -> PathBuf {
    super::parsing::env_optional("SECRET_KEY_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".secret_key"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_unique_and_url_safe() {
        let first = generate_secret_key();
        let second = generate_secret_key();

        assert_ne!(first, second);
        assert!(first.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'));
    }

    #[test]
    fn persisted_key_is_read_back() {
        let path = std::env::temp_dir()
            .join(format!("akademika-secret-{}", uuid::Uuid::new_v4()))
            .join(".secret_key");

        persist_key(&path, "stored-key").expect("persist");
        assert_eq!(read_key(&path).as_deref(), Some("stored-key"));
        assert_eq!(
            persist_key(&path, "other").expect_err("second write").kind(),
            ErrorKind::AlreadyExists
        );

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }
}
