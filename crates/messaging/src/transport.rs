use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::MessagingError;

/// Directory holding IPC sockets for single-host deployments.
const IPC_DIR: &str = "/tmp/status-updater";

/// Transport layer for ZeroMQ connections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "address")]
pub enum Transport {
    /// Unix domain socket at an absolute path.
    Ipc(PathBuf),

    /// TCP, for agents publishing from other hosts.
    Tcp { host: String, port: u16 },
}

impl Transport {
    /// IPC transport for a named socket under the shared IPC directory.
    pub fn ipc(name: &str) -> Self {
        Self::Ipc(Path::new(IPC_DIR).join(format!("{name}.sock")))
    }

    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Parse an endpoint string: `ipc:///path/to.sock` or `tcp://host:port`.
    pub fn parse(endpoint: &str) -> Result<Self, MessagingError> {
        let invalid = || MessagingError::InvalidEndpoint(endpoint.to_string());

        if let Some(path) = endpoint.strip_prefix("ipc://") {
            if path.is_empty() {
                return Err(invalid());
            }
            return Ok(Self::Ipc(PathBuf::from(path)));
        }

        let addr = endpoint.strip_prefix("tcp://").ok_or_else(invalid)?;
        let (host, port) = addr.rsplit_once(':').ok_or_else(invalid)?;
        let port = port.parse::<u16>().map_err(|_| invalid())?;
        if host.is_empty() {
            return Err(invalid());
        }
        Ok(Self::tcp(host, port))
    }

    /// Generate the ZeroMQ endpoint address string.
    pub fn endpoint(&self) -> String {
        match self {
            Self::Ipc(path) => format!("ipc://{}", path.display()),
            Self::Tcp { host, port } => format!("tcp://{host}:{port}"),
        }
    }

    /// For IPC transports, make sure the socket's parent directory exists.
    ///
    /// ZeroMQ requires the directory to exist before binding. No-op for TCP.
    pub fn ensure_ipc_dir(&self) -> std::io::Result<()> {
        if let Self::Ipc(path) = self {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.endpoint())
    }
}
