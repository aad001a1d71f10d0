//! Blocking Gopher protocol client exposing the stream-wrapper operation set
//! expected by URL-addressed virtual filesystem layers: content resources as
//! raw byte streams, menu resources as rewindable directory listings.

pub mod error;
pub mod menu;
pub mod session;
pub mod url;

pub use crate::error::GopherError;
pub use crate::menu::{DirectoryEntry, DirectoryListing, ItemType};
pub use crate::session::{
    Connector, GopherSession, OpenMode, OpenOptions, StreamOption, StreamStat, StreamWrapper,
    TcpConnector, Transport,
};
pub use crate::url::{normalize_selector, GopherUrl, DEFAULT_PORT};
