//! # Live Telegram Receiver
//!
//! Receives live telegrams over UDP and decodes each datagram.
//!
//! This module handles:
//! - Binding the UDP socket the logger streams to
//! - Decoding each datagram as a live telegram
//! - Skipping wrong-sized datagrams without stopping the stream
//! - Tracking heading change across the stream

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::codec::decoder::decode;
use crate::codec::heading::HeadingTracker;
use crate::codec::protocol::{TelemetryRecord, Variant};
use crate::error::DecodeError;

/// Trait for datagram sources, so the receiver can run against a mock
#[async_trait]
pub trait DatagramSource: Send {
    /// Wait for the next datagram and return its bytes and sender
    async fn recv(&mut self) -> io::Result<(Vec<u8>, SocketAddr)>;
}

/// UDP socket wrapper implementing [`DatagramSource`]
pub struct UdpDatagramSource {
    socket: UdpSocket,
    max_datagram_size: usize,
}

impl UdpDatagramSource {
    /// Bind a UDP socket on `addr`
    ///
    /// # Arguments
    ///
    /// * `addr` - Local address to listen on (e.g., `0.0.0.0:9000`)
    /// * `max_datagram_size` - Receive buffer size; longer datagrams are cut
    ///   short and will fail the size check
    pub async fn bind(addr: SocketAddr, max_datagram_size: usize) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        info!("Listening for live telegrams on UDP {}", socket.local_addr()?);
        Ok(Self {
            socket,
            max_datagram_size,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[async_trait]
impl DatagramSource for UdpDatagramSource {
    async fn recv(&mut self) -> io::Result<(Vec<u8>, SocketAddr)> {
        let mut buf = vec![0u8; self.max_datagram_size];
        let (len, from) = self.socket.recv_from(&mut buf).await?;
        buf.truncate(len);
        Ok((buf, from))
    }
}

/// One received datagram and what became of it
#[derive(Debug, Clone)]
pub struct LivePacket {
    /// 1-based count of datagrams received on this stream
    pub index: u64,

    pub from: SocketAddr,

    /// Raw datagram bytes, kept for diagnostics
    pub raw: Vec<u8>,

    pub outcome: Result<TelemetryRecord, DecodeError>,

    /// Heading change since the previous decoded telegram
    pub heading_delta: Option<f64>,
}

/// Live telegram receiver over any [`DatagramSource`]
///
/// Owns the heading history of its stream.
pub struct LiveReceiver<S: DatagramSource> {
    source: S,
    headings: HeadingTracker,
    received: u64,
    decoded: u64,
}

impl<S: DatagramSource> LiveReceiver<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            headings: HeadingTracker::new(),
            received: 0,
            decoded: 0,
        }
    }

    /// Receive and decode the next datagram
    ///
    /// Wrong-sized datagrams come back with a `SizeMismatch` outcome and leave
    /// the heading history untouched; the caller can keep receiving.
    ///
    /// # Errors
    ///
    /// Returns error only if the underlying source fails.
    pub async fn next_packet(&mut self) -> io::Result<LivePacket> {
        let (raw, from) = self.source.recv().await?;
        self.received += 1;
        debug!("Received {} bytes from {}", raw.len(), from);

        let outcome = decode(&raw, Variant::Live);
        let heading_delta = match &outcome {
            Ok(record) => {
                self.decoded += 1;
                self.headings.observe(record.heading.degrees)
            }
            Err(e) => {
                warn!("Skipping packet #{} from {}: {}", self.received, from, e);
                None
            }
        };

        Ok(LivePacket {
            index: self.received,
            from,
            raw,
            outcome,
            heading_delta,
        })
    }

    /// Datagrams received so far
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Datagrams that decoded into a record
    pub fn decoded(&self) -> u64 {
        self.decoded
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::collections::VecDeque;

    /// Mock datagram source replaying queued datagrams
    pub struct MockDatagramSource {
        pub datagrams: VecDeque<Vec<u8>>,
        pub from: SocketAddr,
    }

    impl MockDatagramSource {
        pub fn new(datagrams: Vec<Vec<u8>>) -> Self {
            Self {
                datagrams: datagrams.into(),
                from: "192.168.4.1:4210".parse().unwrap(),
            }
        }
    }

    #[async_trait]
    impl DatagramSource for MockDatagramSource {
        async fn recv(&mut self) -> io::Result<(Vec<u8>, SocketAddr)> {
            match self.datagrams.pop_front() {
                Some(datagram) => Ok((datagram, self.from)),
                None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no more datagrams")),
            }
        }
    }
}
