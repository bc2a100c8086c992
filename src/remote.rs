use std::path::PathBuf;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::{Error, Result};

/// Default port of the git daemon
pub const GIT_DAEMON_PORT: u16 = 9418;

/// Where a remote lives and how to reach it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteUrl {
    /// Repository on the local filesystem
    Local(PathBuf),
    Ssh {
        user: Option<String>,
        host: String,
        port: Option<u16>,
        path: String,
    },
    /// git:// daemon
    Git { host: String, port: u16, path: String },
    Http(Url),
}

impl RemoteUrl {
    /// Classify an endpoint string the way git does
    ///
    /// - `scheme://...` URLs for file, ssh, git, http and https
    /// - scp-like `[user@]host:path` for ssh
    /// - anything else is a local path
    pub fn parse(remote: &str) -> Result<Self> {
        if remote.is_empty() {
            return Err(Error::UnsupportedUrl("empty remote".to_string()));
        }

        if remote.contains("://") {
            return Self::parse_url(remote);
        }

        if let Some(remote) = Self::parse_scp_like(remote) {
            return Ok(remote);
        }

        Ok(RemoteUrl::Local(PathBuf::from(remote)))
    }

    fn parse_url(remote: &str) -> Result<Self> {
        let url = Url::parse(remote)
            .map_err(|e| Error::UnsupportedUrl(format!("{}: {}", remote, e)))?;

        match url.scheme() {
            "file" => url
                .to_file_path()
                .map(RemoteUrl::Local)
                .map_err(|()| Error::UnsupportedUrl(format!("not a local file URL: {}", remote))),
            "ssh" | "git+ssh" | "ssh+git" => {
                let host = Self::require_host(&url, remote)?;
                let user = Some(url.username())
                    .filter(|u| !u.is_empty())
                    .map(str::to_string);
                let path = Self::decoded_path(&url, remote)?;
                // ssh://host/~user/repo is relative to that user's home
                let path = match path.strip_prefix('/') {
                    Some(rest) if rest.starts_with('~') => rest.to_string(),
                    _ => path,
                };
                Ok(RemoteUrl::Ssh {
                    user,
                    host,
                    port: url.port(),
                    path,
                })
            }
            "git" => Ok(RemoteUrl::Git {
                host: Self::require_host(&url, remote)?,
                port: url.port().unwrap_or(GIT_DAEMON_PORT),
                path: Self::decoded_path(&url, remote)?,
            }),
            "http" | "https" => Ok(RemoteUrl::Http(url)),
            other => Err(Error::UnsupportedUrl(format!(
                "unknown scheme '{}' in {}",
                other, remote
            ))),
        }
    }

    /// The URL path with `%XX` escapes undone, as the remote side expects it
    fn decoded_path(url: &Url, remote: &str) -> Result<String> {
        percent_decode_str(url.path())
            .decode_utf8()
            .map(|p| p.into_owned())
            .map_err(|e| Error::UnsupportedUrl(format!("{}: {}", remote, e)))
    }

    fn require_host(url: &Url, remote: &str) -> Result<String> {
        url.host_str()
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::UnsupportedUrl(format!("no host in {}", remote)))
    }

    /// `[user@]host:path`, as long as the colon comes before any slash
    fn parse_scp_like(remote: &str) -> Option<Self> {
        let colon = remote.find(':')?;
        if let Some(slash) = remote.find('/') {
            if slash < colon {
                return None;
            }
        }

        let (host_part, path) = (&remote[..colon], &remote[colon + 1..]);
        // A single letter before the colon is a Windows drive, not a host
        if host_part.len() <= 1 || path.is_empty() {
            return None;
        }

        let (user, host) = match host_part.rsplit_once('@') {
            Some((user, host)) => (Some(user.to_string()), host),
            None => (None, host_part),
        };
        let host = host.trim_start_matches('[').trim_end_matches(']');

        Some(RemoteUrl::Ssh {
            user,
            host: host.to_string(),
            port: None,
            path: path.to_string(),
        })
    }
}
