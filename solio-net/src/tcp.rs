use std::{io, net::SocketAddr};

use socket2::{Protocol, SockAddr, Type};

use crate::socket::Socket;

/// A TCP socket server, listening for connections.
///
/// Binding registers the socket with the current runtime, so a listener can
/// only be created inside [`Runtime::block_on`](solio_runtime::Runtime).
///
/// # Examples
///
/// ```
/// use solio_net::{TcpListener, TcpStream};
///
/// # solio_runtime::Runtime::new().unwrap().block_on(async move {
/// let listener = TcpListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
/// let addr = listener.local_addr().unwrap();
///
/// let task = solio_runtime::spawn(async move {
///     let (stream, _) = listener.accept().await.unwrap();
///     stream.write(b"test").await.unwrap();
/// });
///
/// let stream = TcpStream::connect(addr).await.unwrap();
/// let mut buf = [0u8; 4];
/// stream.read(&mut buf).await.unwrap();
/// assert_eq!(&buf, b"test");
/// # task.await.unwrap();
/// # });
/// ```
#[derive(Debug)]
pub struct TcpListener {
    inner: Socket,
}

impl TcpListener {
    /// Creates a new `TcpListener` bound to the specified address.
    ///
    /// The listener is ready for accepting connections. Binding with a port
    /// number of 0 will request that the OS assigns a port; query it with
    /// [`TcpListener::local_addr`]. `SO_REUSEADDR` is enabled by default.
    ///
    /// ## Panics
    ///
    /// Panics when called outside a runtime.
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let sa = SockAddr::from(addr);
        let socket = Socket::new(sa.domain(), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&sa)?;
        socket.listen(128)?;
        Ok(Self { inner: socket })
    }

    /// Accepts a new incoming connection from this listener.
    ///
    /// This function will yield once a new TCP connection is established;
    /// the corresponding [`TcpStream`] is registered with the driver before
    /// it is returned.
    pub async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        let (socket, addr) = self.inner.accept().await?;
        let stream = TcpStream { inner: socket };
        Ok((stream, addr.as_socket().expect("should be an inet address")))
    }

    /// Returns the local address that this listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner
            .local_addr()
            .map(|addr| addr.as_socket().expect("should be an inet address"))
    }
}

/// A TCP stream between a local and a remote socket.
///
/// Reading and writing take `&self`: the kernel socket is the synchronization
/// point, and one task per direction is the supported usage.
#[derive(Debug)]
pub struct TcpStream {
    inner: Socket,
}

impl TcpStream {
    /// Opens a TCP connection to `addr`.
    ///
    /// The socket is registered with the current runtime before the
    /// connection attempt starts.
    ///
    /// ## Panics
    ///
    /// Panics when called outside a runtime.
    pub async fn connect(addr: SocketAddr) -> io::Result<Self> {
        let sa = SockAddr::from(addr);
        let socket = Socket::new(sa.domain(), Type::STREAM, Some(Protocol::TCP))?;
        socket.connect(&sa).await?;
        Ok(Self { inner: socket })
    }

    /// Receive bytes into `buf`, suspending until the socket is readable.
    ///
    /// A return of `Ok(0)` means the peer closed the connection.
    pub async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.recv(buf).await
    }

    /// Send bytes from `buf`, suspending until the socket accepts them.
    ///
    /// Short writes are returned as-is; callers loop to send everything.
    pub async fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.inner.send(buf).await
    }

    /// Returns the local address of this stream.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner
            .local_addr()
            .map(|addr| addr.as_socket().expect("should be an inet address"))
    }

    /// Returns the remote address this stream is connected to.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.inner
            .peer_addr()
            .map(|addr| addr.as_socket().expect("should be an inet address"))
    }
}
