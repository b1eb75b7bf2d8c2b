//! Byte-stream attachments (images, documents) sent alongside a task.

use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex, MutexGuard};

/// Reader that can be rewound and resent.
pub trait SeekableSource: Read + Seek + Send {}

impl<T: Read + Seek + Send> SeekableSource for T {}

enum Source {
    Seekable(Box<dyn SeekableSource>),
    /// Non-seekable readers are drained once and served from the cache afterwards.
    OneShot {
        reader: Option<Box<dyn Read + Send>>,
        cached: Option<Vec<u8>>,
    },
}

/// A named binary payload attached to a task.
///
/// Cloning shares the underlying source. Adapters read it with
/// [`Attachment::read_all`]; the agent loop rewinds seekable sources after
/// every provider call so the same bytes can be sent on the next turn.
#[derive(Clone)]
pub struct Attachment {
    name: String,
    mime_type: String,
    source: Arc<Mutex<Source>>,
}

impl Attachment {
    /// Create from in-memory bytes.
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self::from_reader(name, mime_type, Cursor::new(data))
    }

    /// Create from a seekable reader (e.g. an open file).
    pub fn from_reader<R>(name: impl Into<String>, mime_type: impl Into<String>, reader: R) -> Self
    where
        R: Read + Seek + Send + 'static,
    {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            source: Arc::new(Mutex::new(Source::Seekable(Box::new(reader)))),
        }
    }

    /// Create from a forward-only reader.
    pub fn from_stream<R>(name: impl Into<String>, mime_type: impl Into<String>, reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            source: Arc::new(Mutex::new(Source::OneShot {
                reader: Some(Box::new(reader)),
                cached: None,
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn is_seekable(&self) -> bool {
        self.lock()
            .map(|source| matches!(*source, Source::Seekable(_)))
            .unwrap_or(false)
    }

    /// Read from the current position to the end.
    pub fn read_all(&self) -> io::Result<Vec<u8>> {
        let mut source = self.lock()?;
        match &mut *source {
            Source::Seekable(reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                Ok(buf)
            }
            Source::OneShot { reader, cached } => {
                if let Some(mut reader) = reader.take() {
                    let mut buf = Vec::new();
                    reader.read_to_end(&mut buf)?;
                    *cached = Some(buf);
                }
                Ok(cached.clone().unwrap_or_default())
            }
        }
    }

    /// Seek a seekable source back to its start. No-op for forward-only sources.
    pub fn rewind(&self) -> io::Result<()> {
        let mut source = self.lock()?;
        if let Source::Seekable(reader) = &mut *source {
            reader.seek(SeekFrom::Start(0))?;
        }
        Ok(())
    }

    /// Read the payload and encode it as base64.
    pub fn to_base64(&self) -> io::Result<String> {
        use base64::Engine;
        let data = self.read_all()?;
        Ok(base64::engine::general_purpose::STANDARD.encode(data))
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, Source>> {
        self.source
            .lock()
            .map_err(|_| io::Error::other("attachment source lock poisoned"))
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .finish()
    }
}
