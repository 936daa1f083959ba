use crate::err::{AppliesTo, IoErrorExt};
use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};

pub async fn bind(addr: SocketAddr) -> Result<TcpListener, io::Error> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("Starting server on {}", listener.local_addr()?);
    Ok(listener)
}

pub async fn accept(listener: &mut TcpListener) -> Result<TcpStream, io::Error> {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(e) => match e.applies_to() {
                AppliesTo::Connection => log::debug!("Aborted connection dropped: {}", e),
                AppliesTo::Listener => return Err(e),
            },
        }
    }
}
