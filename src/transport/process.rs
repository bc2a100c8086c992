//! upload-pack run as a child process, either locally or through ssh

use std::io::BufReader;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::advertisement::{read_advertisement, Advertisement};
use crate::error::{Error, Result};
use crate::pktline::{write_flush, PacketReader};
use crate::refs::Ref;

use super::{Close, FetchConnection, Transport, TransportSettings};

/// How to start upload-pack for a remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPackCommand {
    Local {
        path: PathBuf,
    },
    Ssh {
        user: Option<String>,
        host: String,
        port: Option<u16>,
        path: String,
    },
}

pub struct ProcessTransport {
    command: UploadPackCommand,
    upload_pack: String,
    ssh_command: String,
    timeout: Option<Duration>,
}

impl ProcessTransport {
    pub fn new(command: UploadPackCommand, settings: &TransportSettings) -> Self {
        Self {
            command,
            upload_pack: settings.upload_pack.clone(),
            ssh_command: settings.ssh_command.clone(),
            timeout: None,
        }
    }

    /// Build the command line that starts upload-pack
    fn build_command(&self) -> Result<Command> {
        match &self.command {
            UploadPackCommand::Local { path } => {
                let (program, args) = split_command(&self.upload_pack)?;
                let mut cmd = Command::new(program);
                cmd.args(args).arg(path);
                Ok(cmd)
            }
            UploadPackCommand::Ssh {
                user,
                host,
                port,
                path,
            } => {
                let (program, args) = split_command(&self.ssh_command)?;
                let mut cmd = Command::new(program);
                cmd.args(args);
                if let Some(port) = port {
                    cmd.arg("-p").arg(port.to_string());
                }
                if let Some(timeout) = self.timeout {
                    cmd.arg("-o")
                        .arg(format!("ConnectTimeout={}", timeout.as_secs().max(1)));
                }
                let destination = match user {
                    Some(user) => format!("{}@{}", user, host),
                    None => host.clone(),
                };
                cmd.arg(destination)
                    .arg(format!("{} {}", self.upload_pack, shell_quote(path)));
                Ok(cmd)
            }
        }
    }
}

/// Split a configured command into its program and leading arguments
fn split_command(command: &str) -> Result<(&str, Vec<&str>)> {
    let mut words = command.split_whitespace();
    let program = words
        .next()
        .ok_or_else(|| Error::Connection("Empty command configured".to_string()))?;
    Ok((program, words.collect()))
}

/// Quote for a POSIX shell on the far side of ssh
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

impl Transport for ProcessTransport {
    /// Bounds the ssh connect and the wait for the advertisement, whole seconds
    /// and at least one
    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    fn open_fetch(&mut self) -> Result<Box<dyn FetchConnection>> {
        let mut cmd = self.build_command()?;
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        let program = cmd.get_program().to_string_lossy().into_owned();
        tracing::debug!("Spawning {:?}", cmd);

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::Connection(format!("Failed to run {}: {}", program, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Connection(format!("No stdout from {}", program)))?;
        let stdin = child.stdin.take();

        // Read on a separate thread so a silent upload-pack can be given up on
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = {
                let mut reader = PacketReader::new(BufReader::new(stdout));
                read_advertisement(&mut reader)
            };
            // Nobody is listening any more if we already timed out
            let _ = tx.send(result);
        });

        let received = match self.timeout {
            Some(timeout) => rx.recv_timeout(timeout.max(Duration::from_secs(1))),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(Ok(advertisement)) => Ok(Box::new(ProcessConnection {
                program,
                child,
                stdin,
                advertisement,
            })),
            Ok(Err(e)) => {
                // Closing stdin lets upload-pack exit before we reap it
                drop(stdin);
                match child.wait() {
                    Ok(status) if !status.success() => Err(Error::Connection(format!(
                        "{} exited with {}: {}",
                        program, status, e
                    ))),
                    _ => Err(e),
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!("No ref advertisement from {}, giving up", program);
                kill(&program, &mut child);
                Err(Error::Connection(format!(
                    "Timed out waiting for {} to advertise refs",
                    program
                )))
            }
            Err(RecvTimeoutError::Disconnected) => {
                kill(&program, &mut child);
                Err(Error::Connection(format!(
                    "Lost the output of {} before its ref advertisement",
                    program
                )))
            }
        }
    }
}

fn kill(program: &str, child: &mut Child) {
    if let Err(e) = child.kill() {
        tracing::warn!("Failed to kill {}: {}", program, e);
    }
    if let Err(e) = child.wait() {
        tracing::warn!("Failed to wait for {}: {}", program, e);
    }
}

impl Close for ProcessTransport {
    fn close(&mut self) {
        tracing::debug!("Closing process transport for {:?}", self.command);
    }
}

struct ProcessConnection {
    program: String,
    child: Child,
    stdin: Option<ChildStdin>,
    advertisement: Advertisement,
}

impl FetchConnection for ProcessConnection {
    fn refs(&mut self) -> Result<Vec<Ref>> {
        Ok(self.advertisement.refs.clone())
    }

    fn capabilities(&self) -> &[String] {
        &self.advertisement.capabilities
    }
}

impl Close for ProcessConnection {
    fn close(&mut self) {
        // A flush tells upload-pack we want nothing
        if let Some(mut stdin) = self.stdin.take() {
            if let Err(e) = write_flush(&mut stdin) {
                tracing::warn!("Failed to hang up on {}: {}", self.program, e);
            }
        }

        match self.child.wait() {
            Ok(status) if status.success() => {
                tracing::debug!("{} finished", self.program);
            }
            Ok(status) => tracing::warn!("{} exited with {}", self.program, status),
            Err(e) => tracing::warn!("Failed to wait for {}: {}", self.program, e),
        }
    }
}
