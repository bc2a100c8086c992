//! Connections to remote repositories
//!
//! A [`Transport`] is opened for one endpoint, and in turn opens a
//! [`FetchConnection`] whose only job here is to report the remote's refs.

mod guard;
mod http;
mod process;
mod tcp;
mod traits;

pub use guard::CloseOnDrop;
pub use http::HttpTransport;
pub use process::{ProcessTransport, UploadPackCommand};
pub use tcp::GitDaemonTransport;
pub use traits::{Close, Connector, FetchConnection, Transport};

use crate::error::Result;
use crate::remote::RemoteUrl;

/// Programs used to reach upload-pack on local and ssh remotes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    pub upload_pack: String,
    pub ssh_command: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            upload_pack: "git-upload-pack".to_string(),
            ssh_command: "ssh".to_string(),
        }
    }
}

/// Picks a transport from the shape of the remote URL
#[derive(Debug, Clone, Default)]
pub struct DefaultConnector {
    settings: TransportSettings,
}

impl DefaultConnector {
    pub fn new(settings: TransportSettings) -> Self {
        Self { settings }
    }
}

impl Connector for DefaultConnector {
    fn open(&self, remote: &str) -> Result<Box<dyn Transport>> {
        let url = RemoteUrl::parse(remote)?;
        tracing::debug!("Resolved remote {} to {:?}", remote, url);

        let transport: Box<dyn Transport> = match url {
            RemoteUrl::Local(path) => Box::new(ProcessTransport::new(
                UploadPackCommand::Local { path },
                &self.settings,
            )),
            RemoteUrl::Ssh {
                user,
                host,
                port,
                path,
            } => Box::new(ProcessTransport::new(
                UploadPackCommand::Ssh {
                    user,
                    host,
                    port,
                    path,
                },
                &self.settings,
            )),
            RemoteUrl::Git { host, port, path } => {
                Box::new(GitDaemonTransport::new(host, port, path))
            }
            RemoteUrl::Http(url) => Box::new(HttpTransport::new(url)),
        };

        Ok(transport)
    }
}
