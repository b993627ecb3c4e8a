use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::error::ProbeError;
use super::reply::{ReplyError, ReplyParser};
use super::types::{ProbeStage, SmtpReply};

/// Transport seam: opens the byte stream a probe talks over.
#[async_trait]
pub trait Connector: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    async fn connect(&self, host: &str, port: u16) -> io::Result<Self::Stream>;
}

/// Plain TCP, the only transport a real probe uses.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, host: &str, port: u16) -> io::Result<TcpStream> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

/// One probe's connection. Once closed, every write fails with
/// [`ProbeError::Closed`] instead of touching the socket.
pub(crate) struct SmtpSession<S> {
    stream: Option<S>,
    parser: ReplyParser,
    command_timeout: Duration,
}

impl<S> SmtpSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub(crate) async fn connect<C>(
        connector: &C,
        host: &str,
        port: u16,
        connect_timeout: Duration,
        command_timeout: Duration,
    ) -> Result<Self, ProbeError>
    where
        C: Connector<Stream = S> + ?Sized,
    {
        let stream = timeout(connect_timeout, connector.connect(host, port))
            .await
            .map_err(|_| ProbeError::timeout(ProbeStage::Connecting, connect_timeout))?
            .map_err(|err| ProbeError::connect(host, port, err))?;
        Ok(Self {
            stream: Some(stream),
            parser: ReplyParser::new(),
            command_timeout,
        })
    }

    pub(crate) fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub(crate) async fn send_command(
        &mut self,
        command: &str,
        stage: ProbeStage,
    ) -> Result<(), ProbeError> {
        let stream = self.stream.as_mut().ok_or(ProbeError::Closed)?;
        let mut line = command.as_bytes().to_vec();
        line.extend_from_slice(b"\r\n");
        let write = async {
            stream.write_all(&line).await?;
            stream.flush().await
        };
        timeout(self.command_timeout, write)
            .await
            .map_err(|_| ProbeError::timeout(stage, self.command_timeout))?
            .map_err(ProbeError::io)
    }

    /// Reads until one complete reply is buffered. The outer error is the
    /// transport failing; the inner one a reply that could not be parsed.
    /// `command_timeout` bounds the whole reply, however it is chunked.
    pub(crate) async fn read_reply(
        &mut self,
        stage: ProbeStage,
    ) -> Result<Result<SmtpReply, ReplyError>, ProbeError> {
        let limit = self.command_timeout;
        timeout(limit, self.read_reply_unbounded())
            .await
            .map_err(|_| ProbeError::timeout(stage, limit))?
    }

    async fn read_reply_unbounded(
        &mut self,
    ) -> Result<Result<SmtpReply, ReplyError>, ProbeError> {
        let mut buf = [0u8; 512];
        loop {
            if let Some(reply) = self.parser.next_reply() {
                return Ok(reply);
            }
            let stream = self.stream.as_mut().ok_or(ProbeError::Closed)?;
            let read = stream.read(&mut buf).await.map_err(ProbeError::io)?;
            if read == 0 {
                return Err(ProbeError::ClosedByPeer);
            }
            self.parser.feed(&buf[..read]);
        }
    }

    /// Idempotent. The stream is dropped even if the shutdown handshake
    /// fails or stalls.
    pub(crate) async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = timeout(self.command_timeout, stream.shutdown()).await;
        }
    }
}
