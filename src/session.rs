use std::io::{self, BufReader, Read, SeekFrom, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::GopherError;
use crate::menu::{DirectoryEntry, DirectoryListing};
use crate::url::GopherUrl;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// A blocking, request-scoped network connection.
///
/// `set_write_buffer` exists for wrapper-option parity; the one-line gopher
/// request is written and flushed at open time, so there is nothing left to
/// buffer afterwards.
pub trait Transport: Read + Write {
    fn set_blocking(&mut self, blocking: bool) -> bool;
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> bool;
    fn set_write_buffer(&mut self, size: usize) -> bool;
}

impl Transport for TcpStream {
    fn set_blocking(&mut self, blocking: bool) -> bool {
        TcpStream::set_nonblocking(self, !blocking).is_ok()
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> bool {
        TcpStream::set_read_timeout(self, timeout).is_ok()
    }

    fn set_write_buffer(&mut self, _size: usize) -> bool {
        true
    }
}

/// Opens transports for a session. The TCP implementation is the default;
/// tests substitute a scripted one.
pub trait Connector {
    type Transport: Transport;

    fn connect(&self, host: &str, port: u16) -> io::Result<Self::Transport>;
}

/// Default connector: plain TCP with connect and read timeouts.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for TcpConnector {
    fn default() -> Self {
        TcpConnector {
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
        }
    }
}

impl Connector for TcpConnector {
    type Transport = TcpStream;

    fn connect(&self, host: &str, port: u16) -> io::Result<TcpStream> {
        let mut last_err = None;
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.read_timeout))?;
                    return Ok(stream);
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no addresses resolved")))
    }
}

/// Open mode requested by the caller. Gopher is read-only, so only the
/// read variants parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    ReadBinary,
    ReadText,
}

impl FromStr for OpenMode {
    type Err = GopherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" => Ok(OpenMode::Read),
            "rb" => Ok(OpenMode::ReadBinary),
            "rt" => Ok(OpenMode::ReadText),
            other => Err(GopherError::UnsupportedMode {
                mode: other.to_string(),
            }),
        }
    }
}

/// Caller-supplied flags for `open`/`opendir`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOptions {
    /// Emit warning diagnostics on failure. Errors are returned as values
    /// either way; this only controls the side channel.
    pub report_errors: bool,
    /// Ask `open` to echo back the opened path. Gopher performs no URL
    /// rewriting, so the echo always equals the input.
    pub use_path: bool,
}

/// Runtime adjustment of an open byte-stream connection.
#[derive(Debug, Clone, Copy)]
pub enum StreamOption {
    Blocking(bool),
    ReadTimeout(Option<Duration>),
    WriteBuffer(usize),
}

/// Metadata for an open byte stream. A live socket has no known size.
#[derive(Debug, Clone, Copy)]
pub struct StreamStat {
    pub size: Option<u64>,
    pub position: u64,
    pub eof: bool,
}

/// The operation set a virtual-filesystem dispatch layer invokes on a URL
/// scheme handler: an open/read/seek/stat/close stream family and an
/// opendir/readdir/rewinddir/closedir directory family.
pub trait StreamWrapper {
    fn open(
        &mut self,
        url: &str,
        mode: &str,
        opts: &OpenOptions,
    ) -> Result<Option<String>, GopherError>;
    fn read(&mut self, count: usize) -> Result<Vec<u8>, GopherError>;
    fn eof(&self) -> bool;
    fn seek(&mut self, pos: SeekFrom) -> bool;
    fn tell(&self) -> u64;
    fn set_option(&mut self, option: StreamOption) -> bool;
    fn stat(&self) -> Option<StreamStat>;
    fn close(&mut self) -> bool;

    fn opendir(&mut self, url: &str, opts: &OpenOptions) -> Result<(), GopherError>;
    fn readdir(&mut self) -> Option<DirectoryEntry>;
    fn rewinddir(&mut self) -> bool;
    fn closedir(&mut self) -> bool;
}

struct StreamState<T> {
    transport: T,
    position: u64,
    eof: bool,
}

/// One gopher session: at most one live byte-stream connection and at most
/// one retrieved directory listing, both exclusively owned.
///
/// All I/O is blocking and runs on the calling thread. Directory retrieval
/// uses its own single-use connection and never interleaves with the byte
/// stream.
pub struct GopherSession<C: Connector = TcpConnector> {
    connector: C,
    stream: Option<StreamState<C::Transport>>,
    listing: Option<DirectoryListing>,
}

impl GopherSession<TcpConnector> {
    pub fn new() -> Self {
        Self::with_connector(TcpConnector::default())
    }
}

impl Default for GopherSession<TcpConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> GopherSession<C> {
    pub fn with_connector(connector: C) -> Self {
        GopherSession {
            connector,
            stream: None,
            listing: None,
        }
    }

    /// Connects to the resolved target and sends the selector line. Gopher
    /// has no further handshake; the request is exactly one line.
    fn request(&self, target: &GopherUrl, opts: &OpenOptions) -> Result<C::Transport, GopherError> {
        let mut transport = match self.connector.connect(&target.host, target.port) {
            Ok(t) => t,
            Err(source) => {
                if opts.report_errors {
                    warn!(host = %target.host, port = target.port, error = %source,
                        "unable to open TCP connection");
                }
                return Err(GopherError::Connect {
                    host: target.host.clone(),
                    port: target.port,
                    source,
                });
            }
        };

        write!(transport, "{}\r\n", target.selector())?;
        transport.flush()?;
        Ok(transport)
    }
}

impl<C: Connector> StreamWrapper for GopherSession<C> {
    fn open(
        &mut self,
        url: &str,
        mode: &str,
        opts: &OpenOptions,
    ) -> Result<Option<String>, GopherError> {
        if let Err(err) = mode.parse::<OpenMode>() {
            if opts.report_errors {
                warn!(mode, "gopher only supports read-only streams");
            }
            return Err(err);
        }

        let target = GopherUrl::resolve(url)?;

        // Replacing the connection closes the previous one; no-op otherwise.
        self.stream = None;

        let transport = self.request(&target, opts)?;
        self.stream = Some(StreamState {
            transport,
            position: 0,
            eof: false,
        });

        Ok(opts.use_path.then(|| url.to_string()))
    }

    fn read(&mut self, count: usize) -> Result<Vec<u8>, GopherError> {
        let state = match self.stream.as_mut() {
            Some(s) => s,
            None => return Err(io::Error::from(io::ErrorKind::NotConnected).into()),
        };

        let mut buf = vec![0u8; count];
        let n = state.transport.read(&mut buf)?;
        buf.truncate(n);
        if count > 0 && n == 0 {
            state.eof = true;
        }
        state.position += n as u64;
        Ok(buf)
    }

    fn eof(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.eof)
    }

    fn seek(&mut self, pos: SeekFrom) -> bool {
        let state = match self.stream.as_ref() {
            Some(s) => s,
            None => return false,
        };
        // The socket is consumed as it is read and nothing is buffered for
        // replay, so only a seek to the current position can succeed.
        match pos {
            SeekFrom::Start(offset) => offset == state.position,
            SeekFrom::Current(delta) => delta == 0,
            SeekFrom::End(_) => false,
        }
    }

    fn tell(&self) -> u64 {
        self.stream.as_ref().map_or(0, |s| s.position)
    }

    fn set_option(&mut self, option: StreamOption) -> bool {
        let state = match self.stream.as_mut() {
            Some(s) => s,
            None => return false,
        };
        match option {
            StreamOption::Blocking(blocking) => state.transport.set_blocking(blocking),
            StreamOption::ReadTimeout(timeout) => state.transport.set_read_timeout(timeout),
            StreamOption::WriteBuffer(size) => state.transport.set_write_buffer(size),
        }
    }

    fn stat(&self) -> Option<StreamStat> {
        self.stream.as_ref().map(|s| StreamStat {
            size: None,
            position: s.position,
            eof: s.eof,
        })
    }

    fn close(&mut self) -> bool {
        self.stream.take().is_some()
    }

    fn opendir(&mut self, url: &str, opts: &OpenOptions) -> Result<(), GopherError> {
        self.listing = None;

        let target = GopherUrl::resolve(url)?;
        let transport = self.request(&target, opts)?;

        // Single-use connection: drained to EOF here and dropped on every
        // path out of this block.
        let listing = match DirectoryListing::parse(BufReader::new(transport)) {
            Ok(listing) => listing,
            Err(err) => {
                if opts.report_errors {
                    warn!(url, error = %err, "discarding menu response");
                }
                return Err(err);
            }
        };

        self.listing = Some(listing);
        Ok(())
    }

    fn readdir(&mut self) -> Option<DirectoryEntry> {
        self.listing.as_mut()?.next_entry()
    }

    fn rewinddir(&mut self) -> bool {
        match self.listing.as_mut() {
            Some(listing) => {
                listing.rewind();
                true
            }
            None => false,
        }
    }

    fn closedir(&mut self) -> bool {
        self.listing.take().is_some()
    }
}
