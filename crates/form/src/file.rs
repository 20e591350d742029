//! Uploaded file handles.
//!
//! A file part is kept in memory while it fits in the parser's memory budget, otherwise
//! it's written to a named temporary file. The temporary file lives exactly as long as
//! its [`UploadedFile`]: dropping the handle (or the [`FormFiles`](crate::FormFiles)
//! holding it) removes the file on every exit path, including panics and early returns
//! in the caller. Use [`UploadedFile::persist`] to keep the content.
//!
//! The file name and content type come straight from the client. Neither is validated,
//! and the file name must not be used as a path without sanitizing it first.

use bytes::Bytes;
use mime::Mime;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Debug)]
pub struct UploadedFile {
    file_name: String,
    content_type: Option<Mime>,
    size: u64,
    storage: Storage,
}

#[derive(Debug)]
enum Storage {
    Memory(Bytes),
    Disk(NamedTempFile),
}

impl UploadedFile {
    pub(crate) fn in_memory(file_name: String, content_type: Option<Mime>, bytes: Bytes) -> Self {
        let size = bytes.len() as u64;
        Self { file_name, content_type, size, storage: Storage::Memory(bytes) }
    }

    pub(crate) fn on_disk(file_name: String, content_type: Option<Mime>, size: u64, file: NamedTempFile) -> Self {
        Self { file_name, content_type, size, storage: Storage::Disk(file) }
    }

    /// The file name sent by the client, unsanitized.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The content type sent by the client, if it sent a parseable one.
    pub fn content_type(&self) -> Option<&Mime> {
        self.content_type.as_ref()
    }

    /// The size of the uploaded content in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_in_memory(&self) -> bool {
        matches!(self.storage, Storage::Memory(_))
    }

    /// The path of the temporary file backing this upload, `None` for in-memory uploads.
    pub fn path(&self) -> Option<&Path> {
        match &self.storage {
            Storage::Memory(_) => None,
            Storage::Disk(file) => Some(file.path()),
        }
    }

    /// Opens a reader positioned at the start of the content.
    ///
    /// Every call returns an independent reader.
    pub fn open(&self) -> io::Result<FileReader> {
        match &self.storage {
            Storage::Memory(bytes) => Ok(FileReader::Memory(Cursor::new(bytes.clone()))),
            Storage::Disk(file) => {
                let mut reopened = file.reopen()?;
                reopened.seek(SeekFrom::Start(0))?;
                Ok(FileReader::Disk(reopened))
            }
        }
    }

    /// Reads the whole content.
    pub fn bytes(&self) -> io::Result<Bytes> {
        match &self.storage {
            Storage::Memory(bytes) => Ok(bytes.clone()),
            Storage::Disk(file) => std::fs::read(file.path()).map(Bytes::from),
        }
    }

    /// Moves the content to `path`, where it outlives this handle.
    pub fn persist<P: AsRef<Path>>(self, path: P) -> io::Result<()> {
        match self.storage {
            Storage::Memory(bytes) => std::fs::write(path, &bytes),
            Storage::Disk(file) => file.persist(path).map(|_| ()).map_err(io::Error::from),
        }
    }

    /// Releases the temporary storage now, reporting a failure to remove it.
    ///
    /// Dropping the handle does the same but swallows the error.
    pub fn close(self) -> io::Result<()> {
        match self.storage {
            Storage::Memory(_) => Ok(()),
            Storage::Disk(file) => file.close(),
        }
    }
}

/// A reader over the content of an [`UploadedFile`].
#[derive(Debug)]
pub enum FileReader {
    Memory(Cursor<Bytes>),
    Disk(File),
}

impl Read for FileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            FileReader::Memory(cursor) => cursor.read(buf),
            FileReader::Disk(file) => file.read(buf),
        }
    }
}

impl Seek for FileReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            FileReader::Memory(cursor) => cursor.seek(pos),
            FileReader::Disk(file) => file.seek(pos),
        }
    }
}
