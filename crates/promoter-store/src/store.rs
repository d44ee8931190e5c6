//! [`FsRecordStore`] — the filesystem implementation of [`RecordStore`].

use std::{
  fs::{self, File, OpenOptions},
  io::{BufReader, BufWriter, ErrorKind, Seek, SeekFrom, Write},
  path::{Path, PathBuf},
};

use promoter_core::{Error as CoreError, record::Record, store::RecordStore};

use crate::{Error, Result};

/// Records stored as one property-list file each, anywhere below `root`.
#[derive(Debug, Clone)]
pub struct FsRecordStore {
  root: PathBuf,
}

impl FsRecordStore {
  /// Open the repository at `root`, which must be an existing directory the
  /// current user can create files in.
  pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
    let root = root.into();
    match fs::metadata(&root) {
      Ok(meta) if meta.is_dir() => {}
      Ok(_) => return Err(Error::MissingRoot(root)),
      Err(e) if e.kind() == ErrorKind::NotFound => {
        return Err(Error::MissingRoot(root));
      }
      Err(e) => return Err(Error::io(&root)(e)),
    }

    // An anonymous file is removed as soon as it is dropped.
    match tempfile::tempfile_in(&root) {
      Ok(_) => Ok(Self { root }),
      Err(e)
        if matches!(
          e.kind(),
          ErrorKind::PermissionDenied | ErrorKind::ReadOnlyFilesystem
        ) =>
      {
        Err(Error::ReadOnlyRoot(root))
      }
      Err(e) => Err(Error::io(&root)(e)),
    }
  }

  pub fn root(&self) -> &Path { &self.root }
}

impl RecordStore for FsRecordStore {
  type Error = Error;

  /// All non-hidden files below the root, sorted by path.
  fn list(&self) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    collect_files(&self.root, &mut paths)?;
    paths.sort();
    Ok(paths)
  }

  fn load(&self, path: &Path) -> Result<Record> {
    let file = File::open(path).map_err(Error::io(path))?;
    Record::from_reader(BufReader::new(file)).map_err(|e| {
      Error::Core(CoreError::MalformedRecord {
        path:   path.to_path_buf(),
        source: Box::new(e),
      })
    })
  }

  /// Overwrite in place: seek to the start, write, drop any trailing bytes
  /// of the previous contents.
  fn save(&self, path: &Path, record: &Record) -> Result<()> {
    let mut file = OpenOptions::new()
      .read(true)
      .write(true)
      .open(path)
      .map_err(Error::io(path))?;
    file.seek(SeekFrom::Start(0)).map_err(Error::io(path))?;

    let mut writer = BufWriter::new(&mut file);
    record.write_xml(&mut writer)?;
    writer.flush().map_err(Error::io(path))?;
    drop(writer);

    let len = file.stream_position().map_err(Error::io(path))?;
    file.set_len(len).map_err(Error::io(path))?;
    Ok(())
  }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
  for entry in fs::read_dir(dir).map_err(Error::io(dir))? {
    let entry = entry.map_err(Error::io(dir))?;
    let path = entry.path();
    let file_type = entry.file_type().map_err(Error::io(&path))?;
    if file_type.is_dir() {
      collect_files(&path, out)?;
    } else if file_type.is_symlink() && path.is_dir() {
      // Linked directories are not followed.
      continue;
    } else if !entry.file_name().to_string_lossy().starts_with('.') {
      out.push(path);
    }
  }
  Ok(())
}
