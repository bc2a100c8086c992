use std::io::Write;
use std::time::Duration;

use crate::emit;
use crate::error::Result;
use crate::filter::filter_refs;
use crate::pattern::Patterns;
use crate::transport::{CloseOnDrop, Connector, FetchConnection, Transport};

/// One ls-remote invocation: list the refs of `remote` that match `patterns`
pub struct LsRemote {
    remote: String,
    timeout: Option<Duration>,
    patterns: Patterns,
}

impl LsRemote {
    pub fn new(remote: impl Into<String>, patterns: Patterns) -> Self {
        Self {
            remote: remote.into(),
            timeout: None,
            patterns,
        }
    }

    /// Set the timeout in seconds; a negative value leaves it unset
    pub fn with_timeout_secs(mut self, seconds: i64) -> Self {
        self.timeout = u64::try_from(seconds).ok().map(Duration::from_secs);
        self
    }

    /// Connect, list matching refs to `output`, and hang up.
    ///
    /// The fetch connection and then the transport are closed on every
    /// path out of here, including errors part way through the listing.
    /// Returns the number of lines written.
    pub fn run<W: Write>(&self, connector: &dyn Connector, output: &mut W) -> Result<usize> {
        tracing::info!("Listing refs of {}", self.remote);
        if self.patterns.is_empty() {
            tracing::debug!("No patterns given, listing every ref");
        } else {
            tracing::debug!("Filtering with {} patterns", self.patterns.len());
        }

        let mut transport = CloseOnDrop::new(connector.open(&self.remote)?);
        if let Some(timeout) = self.timeout {
            tracing::debug!("Using timeout of {:?}", timeout);
            transport.set_timeout(timeout);
        }

        let mut connection = CloseOnDrop::new(transport.open_fetch()?);
        tracing::debug!("Remote capabilities: {:?}", connection.capabilities());
        let refs = connection.refs()?;

        let shown = emit::show_all(output, filter_refs(&refs, &self.patterns))?;
        output.flush()?;

        tracing::debug!("Listed {} of {} refs", shown, refs.len());
        Ok(shown)
    }
}
