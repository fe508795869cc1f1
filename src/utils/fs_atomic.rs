use crate::constants::transfer::PARTIAL_SUFFIX;
use rand::{distributions::Alphanumeric, Rng};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub fn ensure_dir_for_file(path: impl AsRef<Path>) -> io::Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Hidden sibling used while a download is in flight.
pub fn partial_sibling_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("download");
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    parent.join(format!(".{}.{}.{}", file_name, token, PARTIAL_SUFFIX))
}

pub fn commit_partial(partial: impl AsRef<Path>, target: impl AsRef<Path>) -> io::Result<()> {
    fs::rename(partial, target)
}

pub fn discard_partial(partial: impl AsRef<Path>) {
    let _ = fs::remove_file(partial);
}

#[cfg(test)]
mod tests {
    use super::partial_sibling_path;
    use std::path::Path;

    #[test]
    fn partial_path_stays_in_target_directory() {
        let partial = partial_sibling_path("/data/out/result.tar");
        assert_eq!(partial.parent(), Some(Path::new("/data/out")));
        let name = partial.file_name().and_then(|s| s.to_str()).expect("name");
        assert!(name.starts_with(".result.tar."));
        assert!(name.ends_with(".partial"));
    }
}
