use crate::error::{IoContext, Result, TilError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Largest file `til add` accepts: 10 MiB.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Copies of files waiting for the next commit.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Copies `source` into the staging dir under its base name, replacing a
    /// staged file with the same name. Returns that base name.
    pub fn stage(&self, source: &Path) -> Result<String> {
        let meta = match fs::metadata(source) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(TilError::FileNotFound(source.to_path_buf()));
            }
            Err(e) => return Err(e).with_context(|| format!("reading {}", source.display())),
        };
        if meta.is_dir() {
            return Err(TilError::IsDirectory(source.to_path_buf()));
        }
        if meta.len() > MAX_FILE_SIZE {
            return Err(TilError::FileTooLarge {
                path: source.to_path_buf(),
                size: meta.len(),
                max: MAX_FILE_SIZE,
            });
        }

        let name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| TilError::FileNotFound(source.to_path_buf()))?;

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating staging dir {}", self.dir.display()))?;
        let dest = self.path_of(&name);
        fs::copy(source, &dest)
            .with_context(|| format!("copying {} to {}", source.display(), dest.display()))?;
        tracing::debug!("staged {}", name);
        Ok(name)
    }

    /// Staged base names, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("listing {}", self.dir.display())),
        };

        let mut names = Vec::new();
        for item in read_dir {
            let item = item.with_context(|| format!("listing {}", self.dir.display()))?;
            if item.path().is_file() {
                names.push(item.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Empties the staging dir. Clearing an absent or empty area is a no-op.
    pub fn clear(&self) -> Result<()> {
        if !self.dir.exists() {
            return Ok(());
        }
        fs::remove_dir_all(&self.dir)
            .with_context(|| format!("clearing {}", self.dir.display()))?;
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating staging dir {}", self.dir.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind as TilErrorKind;
    use crate::tests::common::write_file;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn stage_copies_by_base_name_and_overwrites() {
        let tmp = tempdir().unwrap();
        let staging = StagingArea::new(tmp.path().join("staging"));
        let source = tmp.path().join("src").join("notes.txt");
        write_file(&source, "v1");

        assert_eq!(staging.stage(&source).unwrap(), "notes.txt");
        write_file(&source, "v2");
        staging.stage(&source).unwrap();

        assert_eq!(staging.list().unwrap(), ["notes.txt"]);
        assert_eq!(fs::read_to_string(staging.path_of("notes.txt")).unwrap(), "v2");
    }

    #[test]
    fn list_is_sorted_and_empty_when_absent() {
        let tmp = tempdir().unwrap();
        let staging = StagingArea::new(tmp.path().join("staging"));
        assert!(staging.list().unwrap().is_empty());

        for name in ["b.txt", "a.txt", "c.txt"] {
            let source = tmp.path().join(name);
            write_file(&source, name);
            staging.stage(&source).unwrap();
        }
        assert_eq!(staging.list().unwrap(), ["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn rejects_missing_and_directories() {
        let tmp = tempdir().unwrap();
        let staging = StagingArea::new(tmp.path().join("staging"));

        let err = staging.stage(&tmp.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, TilError::FileNotFound(_)));

        let err = staging.stage(tmp.path()).unwrap_err();
        assert!(matches!(err, TilError::IsDirectory(_)));
        assert_eq!(err.kind(), TilErrorKind::InvalidInput);
    }

    #[test]
    fn size_limit_is_inclusive() {
        let tmp = tempdir().unwrap();
        let staging = StagingArea::new(tmp.path().join("staging"));

        let at_limit = tmp.path().join("limit.bin");
        File::create(&at_limit).unwrap().set_len(MAX_FILE_SIZE).unwrap();
        staging.stage(&at_limit).unwrap();

        let over = tmp.path().join("over.bin");
        File::create(&over).unwrap().set_len(MAX_FILE_SIZE + 1).unwrap();
        let err = staging.stage(&over).unwrap_err();
        assert!(matches!(err, TilError::FileTooLarge { size, .. } if size == MAX_FILE_SIZE + 1));
        assert_eq!(staging.list().unwrap(), ["limit.bin"]);
    }

    #[test]
    fn clear_is_idempotent() {
        let tmp = tempdir().unwrap();
        let staging = StagingArea::new(tmp.path().join("staging"));
        staging.clear().unwrap();

        let source = tmp.path().join("a.txt");
        write_file(&source, "a");
        staging.stage(&source).unwrap();

        staging.clear().unwrap();
        staging.clear().unwrap();
        assert!(staging.list().unwrap().is_empty());
        assert!(staging.dir().is_dir());
    }
}
