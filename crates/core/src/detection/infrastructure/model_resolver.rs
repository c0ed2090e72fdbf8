use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model file not found: {0}")]
    Missing(PathBuf),
    #[error("model {name} not found in {cache} or {bundled}; pass --model or --model-url")]
    NotFound {
        name: String,
        cache: PathBuf,
        bundled: PathBuf,
    },
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64)>;

/// Where to look for a model file.
#[derive(Clone, Debug, Default)]
pub struct ModelSource<'a> {
    /// File name used inside the cache and bundled directories.
    pub name: &'a str,
    /// A path given by the user; wins over everything else and must exist.
    pub explicit: Option<&'a Path>,
    pub bundled_dir: Option<&'a Path>,
    /// Download location used only when no local copy exists.
    pub url: Option<&'a str>,
}

/// Resolve a model file, checking local locations before downloading.
///
/// Resolution order:
/// 1. Explicit path
/// 2. User cache directory (platform-specific)
/// 3. Bundled directory
/// 4. Download from URL into the cache
pub fn resolve(
    source: &ModelSource<'_>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    resolve_in(&model_cache_dir()?, source, progress)
}

fn resolve_in(
    cache_dir: &Path,
    source: &ModelSource<'_>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = source.explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(ModelResolveError::Missing(path.to_path_buf()))
        };
    }

    let cached_path = cache_dir.join(source.name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    if let Some(dir) = source.bundled_dir {
        let bundled_path = dir.join(source.name);
        if bundled_path.exists() {
            return Ok(bundled_path);
        }
    }

    let Some(url) = source.url else {
        return Err(ModelResolveError::NotFound {
            name: source.name.to_string(),
            cache: cache_dir.to_path_buf(),
            bundled: source.bundled_dir.map(Path::to_path_buf).unwrap_or_default(),
        });
    };

    log::info!("Downloading {} from {url}", source.name);
    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/Headcount/models/`
/// - Linux: `$XDG_CACHE_HOME/Headcount/models/` or `~/.cache/Headcount/models/`
/// - Windows: `%LOCALAPPDATA%/Headcount/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("Headcount").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("Headcount").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");

    let result = download_inner(url, dest, &temp_path, progress);

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn download_inner(
    url: &str,
    dest: &Path,
    temp_path: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;

    let write_err = |source: std::io::Error| ModelResolveError::Write {
        path: temp_path.to_path_buf(),
        source,
    };

    let mut file = fs::File::create(temp_path).map_err(write_err)?;

    // Stream in chunks; detector models run to hundreds of MB.
    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let n = response.read(&mut buf).map_err(write_err)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err)?;
        downloaded += n as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(write_err)?;
    drop(file);

    fs::rename(temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source<'a>(bundled: Option<&'a Path>) -> ModelSource<'a> {
        ModelSource {
            name: "test_model.onnx",
            explicit: None,
            bundled_dir: bundled,
            url: None,
        }
    }

    #[test]
    fn test_explicit_path_wins() {
        let tmp = TempDir::new().unwrap();
        let explicit = tmp.path().join("mine.onnx");
        fs::write(&explicit, b"x").unwrap();
        let cache = tmp.path().join("cache");
        fs::create_dir_all(&cache).unwrap();
        fs::write(cache.join("test_model.onnx"), b"cached").unwrap();

        let src = ModelSource {
            explicit: Some(&explicit),
            ..source(None)
        };
        assert_eq!(resolve_in(&cache, &src, None).unwrap(), explicit);
    }

    #[test]
    fn test_missing_explicit_path_errors() {
        let tmp = TempDir::new().unwrap();
        let explicit = tmp.path().join("nope.onnx");
        let src = ModelSource {
            explicit: Some(&explicit),
            ..source(None)
        };
        let err = resolve_in(tmp.path(), &src, None).unwrap_err();
        assert!(matches!(err, ModelResolveError::Missing(p) if p == explicit));
    }

    #[test]
    fn test_cache_checked_before_bundled() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        let bundled = tmp.path().join("bundled");
        fs::create_dir_all(&cache).unwrap();
        fs::create_dir_all(&bundled).unwrap();
        fs::write(cache.join("test_model.onnx"), b"cached").unwrap();
        fs::write(bundled.join("test_model.onnx"), b"bundled").unwrap();

        let path = resolve_in(&cache, &source(Some(&bundled)), None).unwrap();
        assert_eq!(path, cache.join("test_model.onnx"));
    }

    #[test]
    fn test_finds_bundled_file() {
        let tmp = TempDir::new().unwrap();
        let bundled = tmp.path().join("bundled");
        fs::create_dir_all(&bundled).unwrap();
        fs::write(bundled.join("test_model.onnx"), b"bundled").unwrap();

        let path = resolve_in(&tmp.path().join("cache"), &source(Some(&bundled)), None).unwrap();
        assert_eq!(path, bundled.join("test_model.onnx"));
    }

    #[test]
    fn test_not_found_without_url() {
        let tmp = TempDir::new().unwrap();
        let err = resolve_in(tmp.path(), &source(None), None).unwrap_err();
        assert!(matches!(err, ModelResolveError::NotFound { ref name, .. } if name == "test_model.onnx"));
        assert!(err.to_string().contains("--model-url"));
    }

    #[test]
    fn test_model_cache_dir_returns_path() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains("Headcount"));
        assert!(path.ends_with("models"));
    }

    #[test]
    fn test_download_atomic_no_partial_on_failure() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let result = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
