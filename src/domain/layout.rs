use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::app::{ConvertError, Result};
use crate::config::ConfigError;

pub const DEFAULT_ROOT: &str = "out";
pub const DEFAULT_IMAGE_DIR: &str = "images";
pub const DEFAULT_TEMP_IMAGE_DIR: &str = "_temp_images";
pub const PLACEHOLDER_FILENAME: &str = "placeholder.jpg";

const PLACEHOLDER_JPG: &[u8] = include_bytes!("../../assets/placeholder/placeholder.jpg");
const DEJAVU_SANS_TTF: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Bundled placeholder image used for `<img>` elements without a source.
pub fn bundled_placeholder() -> PathBuf {
    bundled_file(PLACEHOLDER_FILENAME, PLACEHOLDER_JPG)
}

/// Bundled Cyrillic-capable font used for PDF output.
pub fn bundled_font() -> PathBuf {
    bundled_file("DejaVuSans.ttf", DEJAVU_SANS_TTF)
}

/// Path of a file compiled into the binary, written out under the system temp
/// directory the first time it is asked for.
///
/// A failed write is logged; the caller then reports the missing file.
fn bundled_file(name: &str, bytes: &[u8]) -> PathBuf {
    let dir = std::env::temp_dir().join(concat!("feedbind-", env!("CARGO_PKG_VERSION")));
    let path = dir.join(name);
    if path.is_file() {
        return path;
    }

    // readers only ever see a complete file
    static WRITES: AtomicUsize = AtomicUsize::new(0);
    let partial = dir.join(format!(
        "{}.{}-{}.partial",
        name,
        std::process::id(),
        WRITES.fetch_add(1, Ordering::Relaxed)
    ));
    let written = std::fs::create_dir_all(&dir)
        .and_then(|_| std::fs::write(&partial, bytes))
        .and_then(|_| std::fs::rename(&partial, &path));
    match written {
        Ok(()) => tracing::debug!(path = %path.display(), "Installed bundled asset"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Cannot install bundled asset"),
    }
    path
}

/// Reject image directories that are not plain subdirectories of the root.
///
/// The transient directory is deleted after every PDF build, so neither directory
/// may leave the root or overlap the other.
fn check_image_dirs(image_dir: &Path, temp_image_dir: &Path) -> std::result::Result<(), ConfigError> {
    for (key, dir) in [("image_dir", image_dir), ("temp_image_dir", temp_image_dir)] {
        let plain = dir.components().next().is_some()
            && dir.components().all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(ConfigError::InvalidLayout(format!(
                "{} must be a relative subdirectory of the output root, got {:?}",
                key, dir
            )));
        }
    }

    if image_dir.starts_with(temp_image_dir) || temp_image_dir.starts_with(image_dir) {
        return Err(ConfigError::InvalidLayout(format!(
            "image_dir {:?} and temp_image_dir {:?} must not overlap",
            image_dir, temp_image_dir
        )));
    }
    Ok(())
}

/// How long a resolved image is expected to live on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetLifetime {
    /// Under the persistent image directory; used by HTML and embedded into EPUB.
    Persistent,
    /// Under the transient image directory; removed after each PDF build.
    Transient,
}

/// A local image reference as it appears in rewritten markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    pub src: String,
    pub lifetime: AssetLifetime,
}

/// Where a conversion run writes its files.
///
/// Directories are created lazily by [`OutputLayout::ensure_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub image_dir: PathBuf,
    pub temp_image_dir: PathBuf,
    pub placeholder: PathBuf,
    pub font: PathBuf,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            temp_image_dir: PathBuf::from(DEFAULT_TEMP_IMAGE_DIR),
            placeholder: bundled_placeholder(),
            font: bundled_font(),
        }
    }

    pub fn with_image_dirs(
        mut self,
        image_dir: impl Into<PathBuf>,
        temp_image_dir: impl Into<PathBuf>,
    ) -> std::result::Result<Self, ConfigError> {
        let image_dir = image_dir.into();
        let temp_image_dir = temp_image_dir.into();
        check_image_dirs(&image_dir, &temp_image_dir)?;

        self.image_dir = image_dir;
        self.temp_image_dir = temp_image_dir;
        Ok(self)
    }

    /// Re-check the image directories, which are public fields and may have been
    /// changed after construction.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        check_image_dirs(&self.image_dir, &self.temp_image_dir)
    }

    pub fn with_assets(mut self, placeholder: impl Into<PathBuf>, font: impl Into<PathBuf>) -> Self {
        self.placeholder = placeholder.into();
        self.font = font.into();
        self
    }

    /// `root/image_dir`
    pub fn persistent_dir(&self) -> PathBuf {
        self.root.join(&self.image_dir)
    }

    /// `root/temp_image_dir`
    pub fn transient_dir(&self) -> PathBuf {
        self.root.join(&self.temp_image_dir)
    }

    pub fn image_dir_for(&self, lifetime: AssetLifetime) -> PathBuf {
        match lifetime {
            AssetLifetime::Persistent => self.persistent_dir(),
            AssetLifetime::Transient => self.transient_dir(),
        }
    }

    pub fn output_file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Create the output root and `dir` if they are missing.
    ///
    /// An existing directory is not an error.
    pub fn ensure_dir(&self, dir: &Path) -> Result<()> {
        for path in [self.root.as_path(), dir] {
            if path.is_dir() {
                continue;
            }
            tracing::info!(path = %path.display(), "Creating directory");
            std::fs::create_dir_all(path).map_err(|e| ConvertError::DirectoryCreation {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Fully qualified form of `path`, resolved against the working directory.
    pub fn absolute(path: &Path) -> Result<PathBuf> {
        Ok(std::path::absolute(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directories() {
        let layout = OutputLayout::new("out");
        assert_eq!(layout.persistent_dir(), PathBuf::from("out/images"));
        assert_eq!(layout.transient_dir(), PathBuf::from("out/_temp_images"));
        assert_eq!(layout.output_file("out.html"), PathBuf::from("out/out.html"));
    }

    #[test]
    fn test_image_dir_for_lifetime() {
        let layout = OutputLayout::new("o").with_image_dirs("img", "tmp").unwrap();
        assert_eq!(
            layout.image_dir_for(AssetLifetime::Persistent),
            PathBuf::from("o/img")
        );
        assert_eq!(
            layout.image_dir_for(AssetLifetime::Transient),
            PathBuf::from("o/tmp")
        );
    }

    #[test]
    fn test_ensure_dir_creates_nested_and_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(tmp.path().join("a/b"));
        let images = layout.persistent_dir();

        layout.ensure_dir(&images).unwrap();
        assert!(images.is_dir());

        // second call on existing directories succeeds
        layout.ensure_dir(&images).unwrap();
    }

    #[test]
    fn test_ensure_dir_reports_directory_creation_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"not a dir").unwrap();

        let layout = OutputLayout::new(blocker.join("root"));
        let err = layout.ensure_dir(&layout.persistent_dir()).unwrap_err();
        assert!(matches!(err, ConvertError::DirectoryCreation { .. }));
    }

    #[test]
    fn test_nested_image_dirs_are_accepted() {
        let layout = OutputLayout::new("o")
            .with_image_dirs("media/img", "media/tmp")
            .unwrap();
        assert_eq!(layout.transient_dir(), PathBuf::from("o/media/tmp"));
    }

    #[test]
    fn test_image_dirs_outside_root_are_rejected() {
        for (image_dir, temp_image_dir) in [
            ("images", ""),
            ("images", "."),
            ("images", "../tmp"),
            ("images", "/tmp/feedbind"),
            ("../shared", "_temp_images"),
            ("", "_temp_images"),
            ("./images", "_temp_images"),
        ] {
            let result = OutputLayout::new("o").with_image_dirs(image_dir, temp_image_dir);
            assert!(
                matches!(result, Err(ConfigError::InvalidLayout(_))),
                "{:?} / {:?} accepted",
                image_dir,
                temp_image_dir
            );
        }
    }

    #[test]
    fn test_overlapping_image_dirs_are_rejected() {
        for (image_dir, temp_image_dir) in [
            ("images", "images"),
            ("images", "images/tmp"),
            ("cache/images", "cache"),
        ] {
            assert!(OutputLayout::new("o")
                .with_image_dirs(image_dir, temp_image_dir)
                .is_err());
        }
    }

    #[test]
    fn test_bundled_assets_exist() {
        assert!(bundled_placeholder().is_file());
        assert!(bundled_font().is_file());
    }

    #[test]
    fn test_bundled_assets_are_written_from_the_binary() {
        let placeholder = bundled_placeholder();
        assert!(!placeholder.starts_with(env!("CARGO_MANIFEST_DIR")));
        assert_eq!(std::fs::read(&placeholder).unwrap(), PLACEHOLDER_JPG);
        assert_eq!(std::fs::read(bundled_font()).unwrap(), DEJAVU_SANS_TTF);
    }

    #[test]
    fn test_absolute_is_absolute() {
        let abs = OutputLayout::absolute(Path::new("out/_temp_images/a.png")).unwrap();
        assert!(abs.is_absolute());
        assert!(abs.ends_with("out/_temp_images/a.png"));
    }
}
