//! Request execution: HTTP plumbing and the transport seam.

pub mod http;
mod request;
mod transport;

pub use request::{StreamRequest, UploadPart, UploadRequest};
pub use transport::{BinaryResponse, HttpTransport, Transport};
