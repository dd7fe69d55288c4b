//! Battery RAM kept as `<save_dir>/<save id>.sav`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gbmu_core::save::{SaveId, SaveRegion, SaveStore};
use log::debug;

pub struct FileSaveStore {
    dir: PathBuf,
}

impl FileSaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, id: &SaveId) -> PathBuf {
        self.dir.join(format!("{id}.sav"))
    }
}

impl SaveStore for FileSaveStore {
    /// Reads the existing file if any, then zero-fills or truncates it to
    /// `len` bytes. The directory is created on demand.
    fn open(&mut self, id: &SaveId, len: usize) -> io::Result<Box<dyn SaveRegion>> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(id);
        let mut data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e),
        };
        if data.len() != len {
            debug!(
                "Resizing save {} from {} to {len} bytes",
                path.display(),
                data.len()
            );
            data.resize(len, 0);
        }
        Ok(Box::new(FileRegion { path, data }))
    }
}

struct FileRegion {
    path: PathBuf,
    data: Vec<u8>,
}

impl SaveRegion for FileRegion {
    fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn flush(&mut self) -> io::Result<()> {
        write_atomically(&self.path, &self.data)
    }
}

fn write_atomically(path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("sav.tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)
}
