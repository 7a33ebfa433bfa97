use arp_packets::ArpDecodeError;
use std::error;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    /// The device could not be opened or its addresses could not be enumerated when the
    /// session was created.
    Config(String),
    /// A transport read or write failed; the underlying error is passed through
    /// unmodified.
    Transport(io::Error),
    /// An ARP-tagged frame carried a payload the codec rejected.
    Malformed(ArpDecodeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Config(reason) => write!(f, "configuration error: {}", reason),
            Error::Transport(err) => write!(f, "transport error: {}", err),
            Error::Malformed(defect) => write!(f, "malformed ARP packet: {}", defect),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Config(_) => None,
            Error::Transport(err) => Some(err),
            Error::Malformed(defect) => Some(defect),
        }
    }
}

impl From<ArpDecodeError> for Error {
    fn from(defect: ArpDecodeError) -> Error {
        Error::Malformed(defect)
    }
}
