use std::time::Duration;

use crate::error::Result;
use crate::refs::Ref;

/// Release of a remote resource.
/// Implementations log failures instead of returning them, so that a
/// close never hides the error that caused it.
pub trait Close {
    fn close(&mut self);
}

impl<T: Close + ?Sized> Close for Box<T> {
    fn close(&mut self) {
        (**self).close()
    }
}

/// Session with upload-pack after the initial ref advertisement
pub trait FetchConnection: Close {
    /// The refs advertised by the remote, in the order it sent them
    fn refs(&mut self) -> Result<Vec<Ref>>;

    /// Capabilities advertised alongside the refs
    fn capabilities(&self) -> &[String];
}

/// Connection to a single remote endpoint
pub trait Transport: Close {
    /// Bound the time spent waiting on the remote
    fn set_timeout(&mut self, timeout: Duration);

    /// Contact the remote and read its ref advertisement
    fn open_fetch(&mut self) -> Result<Box<dyn FetchConnection>>;
}

/// Opens transports for endpoint strings
pub trait Connector {
    fn open(&self, remote: &str) -> Result<Box<dyn Transport>>;
}
