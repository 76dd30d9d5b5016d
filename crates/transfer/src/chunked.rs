use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::TransferError;

/// A chunk of file data for transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Byte offset within the file.
    pub offset: u64,
    /// Raw chunk data.
    pub data: Vec<u8>,
}

impl Chunk {
    /// Offset just past the last byte of this chunk.
    pub fn end(&self) -> u64 {
        self.offset + self.data.len() as u64
    }
}

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// Positional chunk reader over a local file.
///
/// Unlike a streaming reader it holds no cursor of its own: every read
/// names its offset, so the caller can always restart from whatever
/// offset the server confirmed.
pub struct ChunkReader {
    file: File,
    path: PathBuf,
    file_size: u64,
}

impl ChunkReader {
    /// Opens `path` and records its current size.
    pub fn open(path: &Path) -> Result<Self, TransferError> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        Ok(Self {
            file,
            path: path.to_path_buf(),
            file_size,
        })
    }

    /// Reads up to `max_len` bytes starting at `offset`.
    ///
    /// Returns an empty chunk at end of file. Fails with
    /// [`TransferError::FileChanged`] if the file no longer has the size it
    /// had when opened.
    pub fn read_at(&mut self, offset: u64, max_len: usize) -> Result<Chunk, TransferError> {
        if offset > self.file_size {
            return Err(TransferError::OutOfRange(offset));
        }
        self.ensure_unchanged()?;

        let want = (self.file_size - offset).min(max_len as u64) as usize;
        let mut buf = vec![0u8; want];
        self.file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < want {
            let n = self.file.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(TransferError::FileChanged {
                    expected: self.file_size,
                    actual: offset + filled as u64,
                });
            }
            filled += n;
        }

        Ok(Chunk { offset, data: buf })
    }

    fn ensure_unchanged(&self) -> Result<(), TransferError> {
        let actual = self.file.metadata()?.len();
        if actual != self.file_size {
            return Err(TransferError::FileChanged {
                expected: self.file_size,
                actual,
            });
        }
        Ok(())
    }

    /// Total file size in bytes, as observed at open time.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_test_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(data).unwrap();
        path
    }

    #[test]
    fn reads_sequential_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_test_file(dir.path(), "test.bin", b"AABBCCDDEE");

        let mut reader = ChunkReader::open(&path).unwrap();
        assert_eq!(reader.file_size(), 10);

        let c1 = reader.read_at(0, 4).unwrap();
        assert_eq!(c1.offset, 0);
        assert_eq!(&c1.data, b"AABB");
        assert_eq!(c1.end(), 4);

        let c2 = reader.read_at(c1.end(), 4).unwrap();
        assert_eq!(&c2.data, b"CCDD");

        let c3 = reader.read_at(c2.end(), 4).unwrap();
        assert_eq!(&c3.data, b"EE");
        assert_eq!(c3.end(), 10);

        let eof = reader.read_at(10, 4).unwrap();
        assert!(eof.data.is_empty());
    }

    #[test]
    fn reads_from_arbitrary_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_test_file(dir.path(), "test.bin", b"0123456789");

        let mut reader = ChunkReader::open(&path).unwrap();
        let c = reader.read_at(6, 100).unwrap();
        assert_eq!(c.offset, 6);
        assert_eq!(&c.data, b"6789");

        // Re-reading an earlier range is allowed.
        let again = reader.read_at(2, 3).unwrap();
        assert_eq!(&again.data, b"234");
    }

    #[test]
    fn offset_past_end_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_test_file(dir.path(), "test.bin", b"abc");
        let mut reader = ChunkReader::open(&path).unwrap();
        assert!(matches!(
            reader.read_at(4, 1),
            Err(TransferError::OutOfRange(4))
        ));
    }

    #[test]
    fn detects_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_test_file(dir.path(), "test.bin", b"0123456789");
        let mut reader = ChunkReader::open(&path).unwrap();

        create_test_file(dir.path(), "test.bin", b"0123");
        let err = reader.read_at(0, 4).unwrap_err();
        assert!(matches!(
            err,
            TransferError::FileChanged {
                expected: 10,
                actual: 4
            }
        ));
    }

    #[test]
    fn empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_test_file(dir.path(), "empty.bin", b"");
        let mut reader = ChunkReader::open(&path).unwrap();
        assert_eq!(reader.file_size(), 0);
        assert!(reader.read_at(0, 16).unwrap().data.is_empty());
    }
}
