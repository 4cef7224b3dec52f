//! Loopback port selection for smbd.

use std::net::{Ipv4Addr, SocketAddrV4, TcpListener};

use tracing::debug;

use crate::error::{Error, Result};

/// Ask the OS for a free loopback TCP port.
///
/// The listener is closed before returning, so the port is only known to have
/// been free at that instant. Another process can take it before smbd binds;
/// there is no handoff of the bound socket to the daemon.
pub fn reserve_port() -> Result<u16> {
    let listener = TcpListener::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0))
        .map_err(Error::Listen)?;
    let port = listener.local_addr().map_err(Error::Listen)?.port();
    drop(listener);

    debug!(port, "Reserved loopback port");
    Ok(port)
}
