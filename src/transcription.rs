//! Interface to the external image transcription service.
//!
//! The service itself lives outside this crate. It receives an image and
//! streams text chunks back in order; the workspace appends each chunk to
//! the document as it arrives. A stream that ends with only whitespace is a
//! failure.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::TranscriptionError;

/// Raw image bytes plus their MIME type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Read an image file, guessing its MIME type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let mime_type = match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("png") => "image/png",
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            _ => "application/octet-stream",
        };
        Ok(Self::new(mime_type, fs::read(path)?))
    }
}

/// A source of transcribed text.
///
/// Implementations call `on_chunk` once per chunk, in delivery order, and
/// return once the stream has ended. Closures with the same signature
/// implement the trait, which keeps tests short.
pub trait TranscriptionProducer {
    fn transcribe(&mut self, image: &ImagePayload, on_chunk: &mut dyn FnMut(&str)) -> Result<(), TranscriptionError>;
}

impl<F> TranscriptionProducer for F
where
    F: FnMut(&ImagePayload, &mut dyn FnMut(&str)) -> Result<(), TranscriptionError>,
{
    fn transcribe(&mut self, image: &ImagePayload, on_chunk: &mut dyn FnMut(&str)) -> Result<(), TranscriptionError> {
        self(image, on_chunk)
    }
}

/// Lifecycle of the text being transcribed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TranscriptionPhase {
    /// No transcription has run (text was pasted, or nothing loaded yet).
    #[default]
    Idle,
    Streaming,
    Complete,
}

/// Accumulates streamed chunks and decides whether the result is usable.
#[derive(Clone, Debug, Default)]
pub struct TranscriptBuffer {
    phase: TranscriptionPhase,
    received: usize,
    meaningful: bool,
}

impl TranscriptBuffer {
    pub fn phase(&self) -> TranscriptionPhase {
        self.phase
    }

    pub fn is_streaming(&self) -> bool {
        self.phase == TranscriptionPhase::Streaming
    }

    /// Number of chunks received so far.
    pub fn chunks(&self) -> usize {
        self.received
    }

    pub fn begin(&mut self) {
        *self = Self {
            phase: TranscriptionPhase::Streaming,
            ..Self::default()
        };
    }

    pub fn record(&mut self, chunk: &str) -> Result<(), TranscriptionError> {
        if !self.is_streaming() {
            return Err(TranscriptionError::NotRunning);
        }
        self.received += 1;
        self.meaningful |= !chunk.trim().is_empty();
        Ok(())
    }

    /// Close the stream. Fails when nothing but whitespace arrived.
    pub fn finish(&mut self) -> Result<(), TranscriptionError> {
        if !self.is_streaming() {
            return Err(TranscriptionError::NotRunning);
        }
        if !self.meaningful {
            self.phase = TranscriptionPhase::Idle;
            return Err(TranscriptionError::EmptyResult);
        }
        self.phase = TranscriptionPhase::Complete;
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
