//! JSONL writer for per-match results.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::simulator::GameResult;

pub struct OutputWriter {
    writer: Box<dyn Write>,
    path: PathBuf,
}

impl OutputWriter {
    /// Create `path`, or `path.gz` when compressing.
    pub fn new(path: &Path, compress: bool) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        if compress {
            let mut gz_path = path.as_os_str().to_owned();
            gz_path.push(".gz");
            let gz_path = PathBuf::from(gz_path);
            let encoder = GzEncoder::new(File::create(&gz_path)?, Compression::default());
            Ok(Self {
                writer: Box::new(BufWriter::new(encoder)),
                path: gz_path,
            })
        } else {
            Ok(Self {
                writer: Box::new(BufWriter::new(File::create(path)?)),
                path: path.to_path_buf(),
            })
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_game(&mut self, result: &GameResult) -> Result<(), Box<dyn std::error::Error>> {
        serde_json::to_writer(&mut self.writer, result)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.writer.flush()?;
        Ok(())
    }
}
