use std::panic::resume_unwind;

use solio_net::{TcpListener, TcpStream};
use solio_runtime::Runtime;

#[test]
fn accepted_and_connected_addrs_match() {
    Runtime::new().unwrap().block_on(async {
        let listener = TcpListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let task = solio_runtime::spawn(async move {
            let (socket, peer) = listener.accept().await.unwrap();
            (socket, peer)
        });

        let cli = TcpStream::connect(addr).await.unwrap();
        let (srv, peer) = task.await.unwrap_or_else(|e| resume_unwind(e));

        assert_eq!(cli.local_addr().unwrap(), srv.peer_addr().unwrap());
        assert_eq!(cli.local_addr().unwrap(), peer);
        assert_eq!(cli.peer_addr().unwrap(), addr);
    });
}

#[test]
fn accept_resolves_for_a_connection_in_the_backlog() {
    Runtime::new().unwrap().block_on(async {
        let listener = TcpListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        // Connect first; the pending connection sits in the backlog until
        // accept is awaited.
        let _cli = TcpStream::connect(addr).await.unwrap();
        let (srv, _) = listener.accept().await.unwrap();
        assert_eq!(srv.local_addr().unwrap(), addr);
    });
}
