use std::{cell::Cell, future::poll_fn, panic::resume_unwind, rc::Rc, task::Poll};

use solio_net::{TcpListener, TcpStream};
use solio_runtime::Runtime;

fn any_addr() -> std::net::SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

async fn yield_now() {
    let mut yielded = false;
    poll_fn(|cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
    .await;
}

#[test]
fn echo_roundtrip() {
    Runtime::new().unwrap().block_on(async {
        let listener = TcpListener::bind(any_addr()).unwrap();
        let addr = listener.local_addr().unwrap();

        let server = solio_runtime::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 16];
            let n = stream.read(&mut buf).await.unwrap();
            stream.write(&buf[..n]).await.unwrap();
        });

        let client = TcpStream::connect(addr).await.unwrap();
        assert_eq!(client.write(b"ping").await.unwrap(), 4);

        let mut buf = [0u8; 16];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buf[..n], b"ping");

        server.await.unwrap_or_else(|e| resume_unwind(e));
    });
}

#[test]
fn partial_read_then_close() {
    Runtime::new().unwrap().block_on(async {
        let listener = TcpListener::bind(any_addr()).unwrap();
        let addr = listener.local_addr().unwrap();

        let server = solio_runtime::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            stream.write(b"hi").await.unwrap();
            // Dropping the stream closes the socket.
        });

        let client = TcpStream::connect(addr).await.unwrap();
        let mut buf = [0u8; 1024];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(n, 2);
        assert_eq!(&buf[..n], b"hi");
        assert_eq!(client.read(&mut buf).await.unwrap(), 0);

        server.await.unwrap_or_else(|e| resume_unwind(e));
    });
}

#[test]
fn read_suspends_until_data_arrives() {
    Runtime::new().unwrap().block_on(async {
        let listener = TcpListener::bind(any_addr()).unwrap();
        let addr = listener.local_addr().unwrap();
        let wrote = Rc::new(Cell::new(false));

        let flag = wrote.clone();
        let server = solio_runtime::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            // Nothing has been sent yet: in a single-threaded runtime this
            // read can only complete if it suspended and yielded to the
            // client task below.
            let n = stream.read(&mut buf).await.unwrap();
            assert!(flag.get());
            assert_eq!(n, 1);
            assert_eq!(buf[0], b'x');
        });

        let client = TcpStream::connect(addr).await.unwrap();
        // Give the server task time to enter its read.
        for _ in 0..8 {
            yield_now().await;
        }
        wrote.set(true);
        client.write(b"x").await.unwrap();

        server.await.unwrap_or_else(|e| resume_unwind(e));
    });
}

#[test]
fn drains_a_burst_across_one_readiness_edge() {
    const TOTAL: usize = 64 * 1024;

    Runtime::new().unwrap().block_on(async {
        let listener = TcpListener::bind(any_addr()).unwrap();
        let addr = listener.local_addr().unwrap();

        let server = solio_runtime::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let payload = vec![0x5au8; TOTAL];
            let mut written = 0;
            while written < TOTAL {
                written += stream.write(&payload[written..]).await.unwrap();
            }
        });

        let client = TcpStream::connect(addr).await.unwrap();
        let mut buf = [0u8; 1024];
        let mut total = 0;
        while total < TOTAL {
            let n = client.read(&mut buf).await.unwrap();
            assert!(n > 0);
            assert!(buf[..n].iter().all(|&b| b == 0x5a));
            total += n;
        }
        assert_eq!(total, TOTAL);

        server.await.unwrap_or_else(|e| resume_unwind(e));
    });
}
