use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};

use tracing::{info, warn};

use crate::integration::Engine;

/// Written after every response so clients know where it ends.
pub const END_OF_TRANSMISSION: u8 = 0x04;

/// Line-oriented TCP front end. Connections are served one after another,
/// so commands never run concurrently.
pub struct Server {
    listener: TcpListener,
    engine: Engine,
}

impl Server {
    pub fn bind<A: ToSocketAddrs>(addr: A, engine: Engine) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        info!(addr = %listener.local_addr()?, "server listening");
        Ok(Self { listener, engine })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn run(&mut self) -> io::Result<()> {
        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    continue;
                }
            };
            let peer = stream.peer_addr().ok();
            info!(?peer, "client connected");

            let reader = match stream.try_clone() {
                Ok(read_half) => BufReader::new(read_half),
                Err(e) => {
                    warn!(?peer, error = %e, "failed to split connection");
                    continue;
                }
            };
            let writer = BufWriter::new(stream);
            match serve_connection(&mut self.engine, reader, writer) {
                Ok(()) => info!(?peer, "client disconnected"),
                Err(e) => warn!(?peer, error = %e, "connection closed with error"),
            }
        }
        Ok(())
    }
}

/// Executes one statement per line until the reader is exhausted. Each
/// response is followed by a newline, the end-of-transmission byte and
/// another newline.
pub fn serve_connection<R: BufRead, W: Write>(
    engine: &mut Engine,
    reader: R,
    mut writer: W,
) -> io::Result<()> {
    for line in reader.lines() {
        let line = line?;
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        let response = engine.handle_command(query);
        writer.write_all(response.as_bytes())?;
        writer.write_all(&[b'\n', END_OF_TRANSMISSION, b'\n'])?;
        writer.flush()?;
    }
    Ok(())
}
