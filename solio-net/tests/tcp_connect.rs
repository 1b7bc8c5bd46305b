use std::panic::resume_unwind;

use solio_net::{TcpListener, TcpStream};
use solio_runtime::Runtime;

#[test]
fn connect_to_a_dead_port_is_refused() {
    Runtime::new().unwrap().block_on(async {
        let listener = TcpListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = TcpStream::connect(addr).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::ConnectionRefused);
    });
}

#[test]
fn accept_and_connect_in_one_task() {
    Runtime::new().unwrap().block_on(async {
        let listener = TcpListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let (accepted, cli) =
            futures_util::try_join!(listener.accept(), TcpStream::connect(addr)).unwrap();
        let (srv, _) = accepted;

        assert_eq!(cli.local_addr().unwrap(), srv.peer_addr().unwrap());
    });
}

#[test]
fn streams_survive_across_spawned_tasks() {
    Runtime::new().unwrap().block_on(async {
        let listener = TcpListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let server = solio_runtime::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            let n = stream.read(&mut buf).await.unwrap();
            (stream, n)
        });

        let cli = TcpStream::connect(addr).await.unwrap();
        cli.write(b"done").await.unwrap();

        let (srv, n) = server.await.unwrap_or_else(|e| resume_unwind(e));
        assert_eq!(n, 4);
        srv.write(b"ok").await.unwrap();

        let mut buf = [0u8; 2];
        cli.read(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ok");
    });
}
