use std::io;

use tokio::net::TcpStream;
use tracing::trace;

pub async fn connect(host: &str, port: u16) -> io::Result<TcpStream> {
    let stream = TcpStream::connect((host, port)).await?;
    // the whole request goes out at once, don't let nagle hold it back
    stream.set_nodelay(true)?;
    trace!("connected to {host}:{port} from {:?}", stream.local_addr());
    Ok(stream)
}
