use std::fs;
use std::io;
use std::path::PathBuf;

/// Filesystem side of the sorter: bucket listings are the only state that
/// survives between runs.
pub trait BucketStore {
    /// File names in the bucket, directories excluded. An absent bucket is empty.
    fn list(&self, bucket: &str) -> io::Result<Vec<String>>;
    fn exists(&self, bucket: &str) -> bool;
    fn create(&mut self, bucket: &str) -> io::Result<()>;
    fn write(&mut self, bucket: &str, filename: &str, payload: &[u8]) -> io::Result<()>;
}

/// Buckets as sub-directories of a download directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryStore { root: root.into() }
    }

    pub fn bucket_path(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }
}

impl BucketStore for DirectoryStore {
    fn list(&self, bucket: &str) -> io::Result<Vec<String>> {
        let path = self.bucket_path(bucket);
        if !path.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(files)
    }

    fn exists(&self, bucket: &str) -> bool {
        self.bucket_path(bucket).is_dir()
    }

    fn create(&mut self, bucket: &str) -> io::Result<()> {
        fs::create_dir_all(self.bucket_path(bucket))
    }

    fn write(&mut self, bucket: &str, filename: &str, payload: &[u8]) -> io::Result<()> {
        fs::write(self.bucket_path(bucket).join(filename), payload)
    }
}
