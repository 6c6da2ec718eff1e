//! Replays detections recorded by an upstream detector/embedder.
//!
//! Format: one `FrameDetections` JSON object per line. Blank lines are
//! skipped and do not count as frames.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::detection::domain::detection_source::{DetectionSource, SourceInfo};
use crate::shared::person_detection::FrameDetections;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed detections on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

pub struct JsonlDetectionReader {
    lines: Option<std::io::Lines<BufReader<File>>>,
}

impl JsonlDetectionReader {
    pub fn new() -> Self {
        Self { lines: None }
    }
}

impl Default for JsonlDetectionReader {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionSource for JsonlDetectionReader {
    fn open(&mut self, path: &Path) -> Result<SourceInfo, Box<dyn std::error::Error>> {
        let open = || {
            File::open(path).map_err(|source| SourceError::Open {
                path: path.to_path_buf(),
                source,
            })
        };

        // First pass only counts frames so progress has a total.
        let mut total_frames = 0;
        for (i, line) in BufReader::new(open()?).lines().enumerate() {
            let line = line.map_err(|source| SourceError::Read { line: i + 1, source })?;
            if !line.trim().is_empty() {
                total_frames += 1;
            }
        }

        self.lines = Some(BufReader::new(open()?).lines());
        Ok(SourceInfo {
            total_frames,
            path: Some(path.to_path_buf()),
        })
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<FrameDetections, Box<dyn std::error::Error>>> + '_> {
        let Some(lines) = self.lines.as_mut() else {
            return Box::new(std::iter::empty());
        };

        Box::new(
            lines
                .enumerate()
                .filter_map(|(i, line)| parse_line(i + 1, line)),
        )
    }

    fn close(&mut self) {
        self.lines = None;
    }
}

fn parse_line(
    line_no: usize,
    line: std::io::Result<String>,
) -> Option<Result<FrameDetections, Box<dyn std::error::Error>>> {
    let line = match line {
        Ok(l) => l,
        Err(source) => {
            return Some(Err(SourceError::Read {
                line: line_no,
                source,
            }
            .into()))
        }
    };
    if line.trim().is_empty() {
        return None;
    }
    Some(
        serde_json::from_str::<FrameDetections>(&line).map_err(
            |source| -> Box<dyn std::error::Error> {
                SourceError::Parse {
                    line: line_no,
                    source,
                }
                .into()
            },
        ),
    )
}
