use std::io;

use solio::{net::TcpStream, Runtime};

async fn run(port: u16) -> io::Result<()> {
    let stream = TcpStream::connect(([127, 0, 0, 1], port).into()).await?;
    println!("connected to {}", stream.peer_addr()?);

    stream.write(b"hello solio").await?;
    let mut buf = [0u8; 1024];
    let n = stream.read(&mut buf).await?;
    println!("server sent: {}", String::from_utf8_lossy(&buf[..n]));
    Ok(())
}

fn main() -> io::Result<()> {
    let port = std::env::args()
        .nth(1)
        .map(|p| p.parse().expect("port must be a number"))
        .unwrap_or(9900);
    Runtime::new()?.block_on(run(port))
}
