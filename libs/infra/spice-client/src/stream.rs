// [libs/infra/spice-client/src/stream.rs]
/*!
 * =================================================================
 * APARATO: HYPERVISOR STREAM (ESTRATO L3)
 * RESPONSABILIDAD: UNIFICAR SOCKET PLANO Y TLS PARA EL BUCLE DE PROXY
 * =================================================================
 */

use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

/// Either a plain TCP socket to the hypervisor, or one upgraded to TLS
/// after a `RetrySecured` reply. Both variants are `Unpin`, so the
/// forwarding loop can hold this behind a plain `&mut` without pinning.
pub enum HypervisorStream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl HypervisorStream {
    /// The leaf certificate the hypervisor presented, if this connection
    /// is TLS-wrapped. `None` for plaintext streams.
    pub fn peer_certificate_der(&self) -> Option<Vec<u8>> {
        match self {
            HypervisorStream::Plain(_) => None,
            HypervisorStream::Tls(tls) => tls
                .get_ref()
                .1
                .peer_certificates()
                .and_then(|certs| certs.first())
                .map(|cert| cert.as_ref().to_vec()),
        }
    }
}

impl AsyncRead for HypervisorStream {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            HypervisorStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            HypervisorStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for HypervisorStream {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            HypervisorStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            HypervisorStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            HypervisorStream::Plain(s) => Pin::new(s).poll_flush(cx),
            HypervisorStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            HypervisorStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            HypervisorStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}
