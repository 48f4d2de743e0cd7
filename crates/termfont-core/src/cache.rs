//! Font cache management
//!
//! Enumerating installed fonts is slow (tens of seconds on a typical Mac), so
//! the distinct family/style pairs are persisted as newline-delimited JSON
//! records. The cache never expires; it is rebuilt only on an explicit refresh
//! or when the file is missing.

use crate::{fs_util, profiler, Font, FontEnumerator, FontError, FontResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Notice emitted before the enumerator runs
pub const REBUILD_NOTICE: &str =
    "Creating the font cache, please be patient, this could take some time.";

type ProgressFn = Box<dyn Fn(&str) + Send + Sync>;

/// Persistent cache of installed fonts backed by a [`FontEnumerator`]
pub struct FontCache {
    path: PathBuf,
    enumerator: Arc<dyn FontEnumerator>,
    raw_capture: Option<PathBuf>,
    progress: Option<ProgressFn>,
}

impl FontCache {
    pub fn new(path: impl Into<PathBuf>, enumerator: Arc<dyn FontEnumerator>) -> Self {
        Self {
            path: path.into(),
            enumerator,
            raw_capture: None,
            progress: None,
        }
    }

    /// Also write the enumerator's raw JSON to `destination` whenever the cache is rebuilt
    pub fn with_raw_capture(mut self, destination: Option<PathBuf>) -> Self {
        self.raw_capture = destination;
        self
    }

    /// Receive progress notices (the CLI prints them to stderr)
    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached records, building the cache first if it does not exist yet
    pub fn read(&self) -> FontResult<Vec<u8>> {
        self.load(false)
    }

    /// Re-enumerate and overwrite the cache
    pub fn refresh(&self) -> FontResult<Vec<u8>> {
        self.load(true)
    }

    /// Return the cache contents as newline-delimited JSON records.
    ///
    /// An existing cache file is returned byte for byte (even when empty)
    /// unless `force` is set.
    pub fn load(&self, force: bool) -> FontResult<Vec<u8>> {
        fs_util::create_parent_dir(&self.path)?;

        if !force {
            match fs::read(&self.path) {
                Ok(bytes) => {
                    log::debug!(
                        "Using font cache {} ({} bytes)",
                        self.path.display(),
                        bytes.len()
                    );
                    return Ok(bytes);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    log::debug!("No font cache at {}", self.path.display());
                }
                Err(e) => return Err(FontError::IoError(e)),
            }
        }

        self.rebuild()
    }

    fn rebuild(&self) -> FontResult<Vec<u8>> {
        if let Some(progress) = &self.progress {
            progress(REBUILD_NOTICE);
        }
        log::info!("Rebuilding font cache at {}", self.path.display());

        let raw = self.enumerator.enumerate()?;

        if let Some(destination) = &self.raw_capture {
            fs::write(destination, &raw)?;
            log::info!("Wrote raw font report to {}", destination.display());
        }

        let fonts = profiler::decode(&raw)?.fonts();
        let bytes = encode_records(&fonts)?;
        fs::write(&self.path, &bytes)?;

        log::info!(
            "Cached {} font records in {}",
            fonts.len(),
            self.path.display()
        );
        Ok(bytes)
    }
}

/// Encode fonts as one JSON record per line
pub fn encode_records(fonts: &[Font]) -> FontResult<Vec<u8>> {
    let mut out = Vec::new();
    for font in fonts {
        out.extend_from_slice(font.to_record()?.as_bytes());
        out.push(b'\n');
    }
    Ok(out)
}

/// Parse a cache stream back into fonts; blank lines are skipped
///
/// Lines that are not JSON records are read as bare family names, the way
/// older plain-text caches were written.
pub fn records(bytes: &[u8]) -> FontResult<Vec<Font>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| FontError::InvalidFormat(format!("Font cache is not UTF-8: {}", e)))?;

    let mut legacy = 0;
    let fonts = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.starts_with('{') {
                Font::from_record(line)
            } else {
                legacy += 1;
                Ok(Font::with_default_style(line, None))
            }
        })
        .collect::<FontResult<Vec<_>>>()?;

    if legacy > 0 {
        log::warn!(
            "{} font cache lines are plain family names; run `termfont refresh` to rebuild the cache",
            legacy
        );
    }
    Ok(fonts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct CountingEnumerator {
        report: String,
        calls: AtomicUsize,
    }

    impl CountingEnumerator {
        fn new(report: &str) -> Arc<Self> {
            Arc::new(Self {
                report: report.to_string(),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl FontEnumerator for CountingEnumerator {
        fn enumerate(&self) -> FontResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.report.clone().into_bytes())
        }
    }

    struct FailingEnumerator;

    impl FontEnumerator for FailingEnumerator {
        fn enumerate(&self) -> FontResult<Vec<u8>> {
            Err(FontError::EnumerationFailed("exit status: 1".to_string()))
        }
    }

    const DUPLICATES: &str = r#"{"SPFontsDataType":[
        {"typefaces":[{"family":"Menlo","style":"Regular"}]},
        {"typefaces":[{"family":"Menlo","style":"Regular"},{"family":"Fira Code","style":"Bold"}]}
    ]}"#;

    #[test]
    fn builds_distinct_records_when_missing() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("share").join("fonts.txt");
        let enumerator = CountingEnumerator::new(DUPLICATES);
        let cache = FontCache::new(&path, enumerator.clone());

        let bytes = cache.read().expect("build cache");

        assert_eq!(enumerator.calls(), 1);
        assert_eq!(
            records(&bytes).expect("records"),
            vec![Font::new("Fira Code", "Bold"), Font::new("Menlo", "Regular")]
        );
        assert_eq!(fs::read(&path).expect("cache file"), bytes);
    }

    #[test]
    fn duplicate_order_does_not_matter() {
        let tmp = TempDir::new().expect("tempdir");
        let reversed = r#"{"SPFontsDataType":[
            {"typefaces":[{"family":"Fira Code","style":"Bold"},{"family":"Menlo","style":"Regular"}]},
            {"typefaces":[{"family":"Menlo","style":"Regular"}]}
        ]}"#;

        let a = FontCache::new(tmp.path().join("a.txt"), CountingEnumerator::new(DUPLICATES))
            .read()
            .expect("a");
        let b = FontCache::new(tmp.path().join("b.txt"), CountingEnumerator::new(reversed))
            .read()
            .expect("b");

        assert_eq!(a, b);
    }

    #[test]
    fn existing_cache_is_returned_verbatim() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("fonts.txt");
        let contents = b"{\"family\":\"Hand\",\"style\":\"Edited\"}\n";
        fs::write(&path, contents).expect("seed cache");

        let enumerator = CountingEnumerator::new(DUPLICATES);
        let bytes = FontCache::new(&path, enumerator.clone())
            .read()
            .expect("read cache");

        assert_eq!(bytes, contents);
        assert_eq!(enumerator.calls(), 0, "enumerator must not run");
    }

    #[test]
    fn empty_cache_is_not_an_error() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("fonts.txt");
        fs::write(&path, b"").expect("seed cache");

        let enumerator = CountingEnumerator::new(DUPLICATES);
        let bytes = FontCache::new(&path, enumerator.clone())
            .read()
            .expect("read cache");

        assert!(bytes.is_empty());
        assert_eq!(enumerator.calls(), 0);
    }

    #[test]
    fn refresh_overwrites_existing_cache() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("fonts.txt");
        fs::write(&path, b"{\"family\":\"Stale\",\"style\":\"Regular\"}\n").expect("seed cache");

        let enumerator = CountingEnumerator::new(DUPLICATES);
        let cache = FontCache::new(&path, enumerator.clone());
        let bytes = cache.refresh().expect("refresh");

        assert_eq!(enumerator.calls(), 1);
        let on_disk = fs::read_to_string(&path).expect("cache file");
        assert!(!on_disk.contains("Stale"));
        assert_eq!(on_disk.as_bytes(), bytes.as_slice());

        cache.refresh().expect("second refresh");
        assert_eq!(enumerator.calls(), 2);
    }

    #[test]
    fn raw_capture_receives_enumerator_output() {
        let tmp = TempDir::new().expect("tempdir");
        let capture = tmp.path().join("sp_fonts_data_type.json");

        FontCache::new(tmp.path().join("fonts.txt"), CountingEnumerator::new(DUPLICATES))
            .with_raw_capture(Some(capture.clone()))
            .read()
            .expect("build cache");

        assert_eq!(fs::read_to_string(&capture).expect("capture"), DUPLICATES);
    }

    #[test]
    fn progress_notice_only_on_rebuild() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("fonts.txt");
        let notices = Arc::new(Mutex::new(Vec::<String>::new()));

        let sink = notices.clone();
        let cache = FontCache::new(&path, CountingEnumerator::new(DUPLICATES)).with_progress(
            move |msg| sink.lock().expect("lock").push(msg.to_string()),
        );

        cache.read().expect("build");
        cache.read().expect("reuse");

        assert_eq!(*notices.lock().expect("lock"), vec![REBUILD_NOTICE.to_string()]);
    }

    #[test]
    fn enumeration_failure_leaves_no_cache() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("fonts.txt");

        let err = FontCache::new(&path, Arc::new(FailingEnumerator))
            .read()
            .unwrap_err();

        assert!(matches!(err, FontError::EnumerationFailed(_)));
        assert!(!path.exists());
    }

    #[test]
    fn undecodable_report_is_an_error() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("fonts.txt");

        let err = FontCache::new(&path, CountingEnumerator::new("<plist/>"))
            .read()
            .unwrap_err();

        assert!(matches!(err, FontError::InvalidFormat(_)));
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn creates_private_data_directory() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().expect("tempdir");
        let dir = tmp.path().join(".local").join("share");

        FontCache::new(dir.join("fonts.txt"), CountingEnumerator::new(DUPLICATES))
            .read()
            .expect("build");

        let mode = fs::metadata(&dir).expect("dir").permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn records_skip_blank_lines() {
        let fonts = records(b"{\"family\":\"A\",\"style\":\"Bold\"}\n\n{\"family\":\"B\"}\n")
            .expect("records");
        assert_eq!(fonts, vec![Font::new("A", "Bold"), Font::new("B", "Regular")]);
    }

    #[test]
    fn plain_text_cache_lines_read_as_families() {
        let fonts = records(b"Menlo\n  Fira Code  \n{\"family\":\"Monaco\",\"style\":\"Bold\"}\n")
            .expect("legacy records");
        assert_eq!(
            fonts,
            vec![
                Font::new("Menlo", "Regular"),
                Font::new("Fira Code", "Regular"),
                Font::new("Monaco", "Bold"),
            ]
        );
    }

    #[test]
    fn malformed_json_record_is_rejected() {
        assert!(matches!(
            records(b"{\"family\":\n"),
            Err(FontError::InvalidFormat(_))
        ));
    }
}
