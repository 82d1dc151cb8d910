//! Tokio async-I/O stream adapter.
//!
//! Wraps any `AsyncRead` + `AsyncWrite` pair as a polled [`ByteStream`]:
//! a reader task fills a shared receive queue that backs `available` and
//! `read`, and a writer task drains an unbounded channel that backs `write`.
//! Device files (a UART's tty, a pty) and process stdio both fit.
//!
//! On unix, FIFOs and character devices are read through a non-blocking
//! descriptor registered with the reactor, so dropping the stream cancels a
//! read parked on a quiet device. Regular files and stdio fall back to
//! tokio's blocking-pool I/O.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::StreamConfig;
use crate::ports::{ByteStream, StreamError};

const READ_BUFFER_SIZE: usize = 1024;

/// [`ByteStream`] over an async reader and writer.
///
/// Must be created inside a tokio runtime.
pub struct AsyncIoStream {
    received: Arc<Mutex<VecDeque<u8>>>,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    tasks: Vec<JoinHandle<()>>,
}

impl AsyncIoStream {
    /// Open the stream described by `config`.
    pub async fn open(config: &StreamConfig) -> Result<Self, StreamError> {
        if config.is_stdio() {
            tracing::info!("Using stdio as stream");
            Ok(Self::stdio())
        } else {
            tracing::info!(device = %config.device, "Opening stream device");
            Self::open_device(&config.device).await
        }
    }

    /// Open a device or file for reading and writing.
    ///
    /// Reads and writes use separate handles so a read parked on a quiet
    /// device never holds up a write.
    pub async fn open_device(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        let path = path.as_ref();

        #[cfg(unix)]
        {
            if let Some(stream) = Self::open_pollable(path).await {
                return Ok(stream);
            }
        }

        let open_error = |source| StreamError::Open {
            path: path.to_path_buf(),
            source,
        };

        let reader = File::open(path).await.map_err(open_error)?;
        let writer = OpenOptions::new()
            .write(true)
            .open(path)
            .await
            .map_err(open_error)?;

        Ok(Self::spawn(reader, writer))
    }

    /// Open a FIFO or character device as non-blocking pipe ends.
    ///
    /// Returns `None` for other file types, or when the device cannot be
    /// registered with the reactor (`/dev/null` for one).
    #[cfg(unix)]
    async fn open_pollable(path: &Path) -> Option<Self> {
        use std::os::unix::fs::FileTypeExt;
        use tokio::net::unix::pipe;

        let file_type = tokio::fs::metadata(path).await.ok()?.file_type();
        if !(file_type.is_fifo() || file_type.is_char_device()) {
            return None;
        }

        let mut options = pipe::OpenOptions::new();
        options.unchecked(true);
        let opened = options
            .open_receiver(path)
            .and_then(|reader| Ok((reader, options.open_sender(path)?)));

        match opened {
            Ok((reader, writer)) => Some(Self::spawn(reader, writer)),
            Err(e) => {
                tracing::debug!(device = %path.display(), error = %e, "Device not pollable, using blocking I/O");
                None
            }
        }
    }

    /// Use the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::spawn(tokio::io::stdin(), tokio::io::stdout())
    }

    /// Pump `reader` into the receive queue and the write channel into `writer`.
    pub fn spawn<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let received = Arc::new(Mutex::new(VecDeque::new()));
        let (tx, rx) = mpsc::unbounded_channel();

        let tasks = vec![
            tokio::spawn(read_loop(reader, Arc::clone(&received))),
            tokio::spawn(write_loop(writer, rx)),
        ];

        Self {
            received,
            outbound: tx,
            tasks,
        }
    }
}

impl ByteStream for AsyncIoStream {
    fn available(&self) -> usize {
        self.received.lock().len()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut received = self.received.lock();
        let len = buf.len().min(received.len());
        for (dst, src) in buf.iter_mut().zip(received.drain(..len)) {
            *dst = src;
        }
        len
    }

    fn write(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        if self.outbound.send(bytes.to_vec()).is_err() {
            tracing::warn!(len = bytes.len(), "Stream writer stopped, dropping data");
        }
    }
}

impl Drop for AsyncIoStream {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

async fn read_loop<R>(mut reader: R, received: Arc<Mutex<VecDeque<u8>>>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                tracing::info!("Stream reached end of input");
                return;
            }
            Ok(n) => received.lock().extend(&buf[..n]),
            Err(e) => {
                tracing::warn!(error = %e, "Stream read failed");
                return;
            }
        }
    }
}

async fn write_loop<W>(mut writer: W, mut outbound: mpsc::UnboundedReceiver<Vec<u8>>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(bytes) = outbound.recv().await {
        let result = async {
            writer.write_all(&bytes).await?;
            writer.flush().await
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, "Stream write failed");
            return;
        }
    }
}
