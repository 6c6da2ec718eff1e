use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::annotation::domain::annotation_sink::AnnotationSink;
use crate::annotation::domain::identity_annotation::FrameAnnotations;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("annotation sink is not open")]
    NotOpen,
    #[error("failed to write frame {frame}: {source}")]
    Write {
        frame: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode frame {frame}: {source}")]
    Encode {
        frame: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Writes one JSON object per frame per line.
pub struct JsonlAnnotationWriter {
    out: Option<BufWriter<File>>,
    frames_written: usize,
}

impl JsonlAnnotationWriter {
    pub fn new() -> Self {
        Self {
            out: None,
            frames_written: 0,
        }
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }
}

impl Default for JsonlAnnotationWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationSink for JsonlAnnotationWriter {
    fn open(&mut self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| SinkError::Create {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = File::create(path).map_err(|source| SinkError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        self.out = Some(BufWriter::new(file));
        self.frames_written = 0;
        Ok(())
    }

    fn write(&mut self, frame: &FrameAnnotations) -> Result<(), Box<dyn std::error::Error>> {
        let out = self.out.as_mut().ok_or(SinkError::NotOpen)?;
        serde_json::to_writer(&mut *out, frame).map_err(|source| SinkError::Encode {
            frame: frame.frame,
            source,
        })?;
        out.write_all(b"\n").map_err(|source| SinkError::Write {
            frame: frame.frame,
            source,
        })?;
        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(mut out) = self.out.take() {
            out.flush()?;
        }
        Ok(())
    }
}
