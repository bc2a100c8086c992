//! git:// daemon transport

use std::io::BufReader;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::advertisement::{read_advertisement, Advertisement};
use crate::error::{Error, Result};
use crate::pktline::{write_flush, write_packet, PacketReader};
use crate::refs::Ref;
use crate::remote::GIT_DAEMON_PORT;

use super::{Close, FetchConnection, Transport};

pub struct GitDaemonTransport {
    host: String,
    port: u16,
    path: String,
    timeout: Option<Duration>,
}

impl GitDaemonTransport {
    pub fn new(host: String, port: u16, path: String) -> Self {
        Self {
            host,
            port,
            path,
            timeout: None,
        }
    }

    /// First packet sent to the daemon, naming the service and repository
    fn request(&self) -> Vec<u8> {
        let host = if self.port == GIT_DAEMON_PORT {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        };
        format!("git-upload-pack {}\0host={}\0", self.path, host).into_bytes()
    }

    fn connect(&self) -> Result<TcpStream> {
        let addrs = (self.host.as_str(), self.port).to_socket_addrs().map_err(|e| {
            Error::Connection(format!("Cannot resolve {}: {}", self.host, e))
        })?;

        let mut last_error = None;
        for addr in addrs {
            let attempt = match self.timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    stream.set_read_timeout(self.timeout)?;
                    stream.set_write_timeout(self.timeout)?;
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::debug!("Connection to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        Err(Error::Connection(match last_error {
            Some(e) => format!("Cannot connect to {}:{}: {}", self.host, self.port, e),
            None => format!("No addresses found for {}", self.host),
        }))
    }
}

impl Transport for GitDaemonTransport {
    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    fn open_fetch(&mut self) -> Result<Box<dyn FetchConnection>> {
        let mut stream = self.connect()?;
        write_packet(&mut stream, &self.request())?;

        let advertisement = {
            let mut reader = PacketReader::new(BufReader::new(&stream));
            read_advertisement(&mut reader)?
        };

        Ok(Box::new(DaemonConnection {
            stream,
            advertisement,
        }))
    }
}

impl Close for GitDaemonTransport {
    fn close(&mut self) {
        tracing::debug!("Closing git daemon transport for {}", self.host);
    }
}

struct DaemonConnection {
    stream: TcpStream,
    advertisement: Advertisement,
}

impl FetchConnection for DaemonConnection {
    fn refs(&mut self) -> Result<Vec<Ref>> {
        Ok(self.advertisement.refs.clone())
    }

    fn capabilities(&self) -> &[String] {
        &self.advertisement.capabilities
    }
}

impl Close for DaemonConnection {
    fn close(&mut self) {
        if let Err(e) = write_flush(&mut self.stream) {
            tracing::warn!("Failed to hang up on git daemon: {}", e);
        }
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            tracing::debug!("Socket shutdown failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    #[test]
    fn test_request_packet() {
        let transport = GitDaemonTransport::new(
            "example.com".to_string(),
            GIT_DAEMON_PORT,
            "/repo.git".to_string(),
        );
        assert_eq!(
            transport.request(),
            b"git-upload-pack /repo.git\0host=example.com\0".to_vec()
        );

        let transport =
            GitDaemonTransport::new("example.com".to_string(), 1234, "/repo.git".to_string());
        assert_eq!(
            transport.request(),
            b"git-upload-pack /repo.git\0host=example.com:1234\0".to_vec()
        );
    }

    #[test]
    fn test_advertisement_over_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut header = [0u8; 4];
            socket.read_exact(&mut header).unwrap();
            let len = usize::from_str_radix(std::str::from_utf8(&header).unwrap(), 16).unwrap();
            let mut request = vec![0u8; len - 4];
            socket.read_exact(&mut request).unwrap();

            let mut reply = Vec::new();
            write_packet(
                &mut reply,
                format!("{} refs/heads/main\0agent=git/2\n", "a".repeat(40)).as_bytes(),
            )
            .unwrap();
            reply.extend_from_slice(b"0000");
            socket.write_all(&reply).unwrap();

            let mut hangup = [0u8; 4];
            socket.read_exact(&mut hangup).unwrap();
            (request, hangup)
        });

        let mut transport =
            GitDaemonTransport::new("127.0.0.1".to_string(), port, "/repo.git".to_string());
        transport.set_timeout(Duration::from_secs(5));
        {
            let mut connection = transport.open_fetch().unwrap();
            let refs = connection.refs().unwrap();
            assert_eq!(refs.len(), 1);
            assert_eq!(refs[0].name, "refs/heads/main");
            assert_eq!(connection.capabilities(), ["agent=git/2".to_string()]);
            connection.close();
        }
        transport.close();

        let (request, hangup) = server.join().unwrap();
        assert!(request.starts_with(b"git-upload-pack /repo.git\0host=127.0.0.1:"));
        assert_eq!(&hangup, b"0000");
    }
}
