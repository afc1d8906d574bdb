//! Capture Layer
//!
//! The camera loop and recognizer live outside this crate. What reaches us is
//! their output: one [`FrameResult`] per processed frame. Those can be recorded
//! as JSON Lines and replayed later.

pub mod frame;

pub use frame::{FieldBox, FieldKind, FieldPayload, FrameResult, Token};

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Failure while reading a frame recording
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("failed to access recording: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid frame on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse frame results from JSON Lines text, skipping blank lines
pub fn parse_recording<R: BufRead>(reader: R) -> Result<Vec<FrameResult>, RecordingError> {
    let mut frames = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame = serde_json::from_str(&line).map_err(|source| RecordingError::Parse {
            line: idx + 1,
            source,
        })?;
        frames.push(frame);
    }

    Ok(frames)
}

/// Load a recording from file
pub fn load_recording(path: &Path) -> Result<Vec<FrameResult>, RecordingError> {
    let file = std::fs::File::open(path)?;
    let frames = parse_recording(BufReader::new(file))?;
    debug!("Loaded {} frames from {:?}", frames.len(), path);
    Ok(frames)
}

/// Save a recording to file, one frame per line
pub fn save_recording(frames: &[FrameResult], path: &Path) -> Result<(), RecordingError> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    for frame in frames {
        let line = serde_json::to_string(frame).map_err(std::io::Error::from)?;
        writeln!(file, "{}", line)?;
    }
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_skips_blank_lines() {
        let text = "{\"timestamp\":1,\"boxes\":[]}\n\n   \n{\"timestamp\":2,\"boxes\":[{\"id\":\"a\",\"kind\":\"checkbox\",\"checked\":false}]}\n";
        let frames = parse_recording(text.as_bytes()).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].boxes[0].kind(), FieldKind::Checkbox);
    }

    #[test]
    fn test_parse_reports_line_number() {
        let text = "{\"timestamp\":1,\"boxes\":[]}\nnot json\n";
        match parse_recording(text.as_bytes()) {
            Err(RecordingError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_save_and_load_recording() {
        let frames = vec![
            FrameResult::new(10, vec![FieldBox::text("p1", "12,3").with_confidence(0.5)]),
            FrameResult::new(20, vec![FieldBox::scrollbar("s1", ["v", "1,0", "2,0", "bar"])]),
        ];

        let temp_file = NamedTempFile::new().unwrap();
        save_recording(&frames, temp_file.path()).unwrap();

        let loaded = load_recording(temp_file.path()).unwrap();
        assert_eq!(loaded, frames);
    }

    #[test]
    fn test_load_recording_file_not_found() {
        let result = load_recording(Path::new("/nonexistent/path/frames.jsonl"));
        assert!(matches!(result, Err(RecordingError::Io(_))));
    }
}
