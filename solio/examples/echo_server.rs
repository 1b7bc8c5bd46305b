use std::io;

use solio::{net::TcpListener, Runtime};

async fn serve(port: u16) -> io::Result<()> {
    let listener = TcpListener::bind(([127, 0, 0, 1], port).into())?;
    println!("listening on {}", listener.local_addr()?);

    loop {
        let (stream, peer) = listener.accept().await?;
        println!("accepted connection from {peer}");
        solio::spawn(async move {
            let mut buf = [0u8; 1024];
            loop {
                let n = match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => n,
                };
                let mut written = 0;
                while written < n {
                    match stream.write(&buf[written..n]).await {
                        Ok(w) => written += w,
                        Err(_) => return,
                    }
                }
            }
            println!("connection from {peer} closed");
        })
        .detach();
    }
}

fn main() -> io::Result<()> {
    let port = std::env::args()
        .nth(1)
        .map(|p| p.parse().expect("port must be a number"))
        .unwrap_or(9900);
    Runtime::new()?.block_on(serve(port))
}
