//! Video channel receiver
//!
//! Owns the listening socket, classifies each inbound datagram by its
//! type byte, and routes it to the reassembly engine or the parameter
//! handler. Completed frames and format descriptions are delivered on a
//! channel passed at construction; the receiver never owns its consumer.

use std::net::SocketAddr;

use bytes::Bytes;
use decoder::{FormatDescription, VideoEvent};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};
use wire_protocol::{
    MAX_DATAGRAM_SIZE, NAL_UNIT_HEADER_LENGTH, PacketKind, VideoHeader, parse_parameter_sets,
};

use crate::{AssemblerConfig, FrameAssembler, VideoChannelError, VideoChannelResult};

/// What to do when a receive call fails mid-session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecvErrorPolicy {
    /// Log the error and re-arm the receive (default)
    #[default]
    Continue,
    /// Treat the error as session-ending and return it
    Stop,
}

/// Receiver configuration
#[derive(Debug, Clone, Default)]
pub struct ReceiverConfig {
    pub assembler: AssemblerConfig,
    pub recv_error_policy: RecvErrorPolicy,
}

/// Idempotent stop signal for a running receiver
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: mpsc::Sender<()>,
}

impl ShutdownHandle {
    /// Ask the receiver to stop after the current datagram. Safe to call
    /// more than once.
    pub fn shutdown(&self) {
        let _ = self.tx.try_send(());
    }
}

/// UDP listener and dispatcher for the video channel
pub struct VideoReceiver {
    socket: UdpSocket,
    assembler: FrameAssembler,
    events: mpsc::Sender<VideoEvent>,
    config: ReceiverConfig,
    shutdown: mpsc::Receiver<()>,
}

impl VideoReceiver {
    /// Bind the listening socket. Reassembled frames and format
    /// descriptions flow to `events`; the returned handle stops the
    /// receive loop.
    pub async fn bind(
        addr: SocketAddr,
        config: ReceiverConfig,
        events: mpsc::Sender<VideoEvent>,
    ) -> VideoChannelResult<(Self, ShutdownHandle)> {
        let socket = UdpSocket::bind(addr).await?;
        info!(addr = %socket.local_addr()?, "video channel listening");
        Ok(Self::with_socket(socket, config, events))
    }

    /// Build a receiver around an already bound socket
    pub fn with_socket(
        socket: UdpSocket,
        config: ReceiverConfig,
        events: mpsc::Sender<VideoEvent>,
    ) -> (Self, ShutdownHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let assembler = FrameAssembler::new(config.assembler.clone());

        (
            Self {
                socket,
                assembler,
                events,
                config,
                shutdown: shutdown_rx,
            },
            ShutdownHandle { tx: shutdown_tx },
        )
    }

    /// Local address of the listening socket
    pub fn local_addr(&self) -> VideoChannelResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive datagrams until shutdown, the consumer dropping its end of
    /// the event channel, or a transport failure under
    /// [`RecvErrorPolicy::Stop`]. The socket is released when this
    /// returns.
    pub async fn run(self) -> VideoChannelResult<()> {
        let Self {
            socket,
            mut assembler,
            events,
            config,
            mut shutdown,
        } = self;
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("video receiver shutting down");
                    return Ok(());
                }
                received = socket.recv_from(&mut buf) => match received {
                    Ok((len, _peer)) => {
                        match dispatch(&buf[..len], &mut assembler, &events).await {
                            Ok(()) => {}
                            Err(VideoChannelError::ChannelClosed) => {
                                info!("event consumer gone, video receiver stopping");
                                return Ok(());
                            }
                            // Recoverable at packet granularity: drop the
                            // offending unit, keep the session
                            Err(e) => warn!(error = %e, "dropping datagram"),
                        }
                    }
                    Err(e) => match config.recv_error_policy {
                        RecvErrorPolicy::Continue => {
                            warn!(error = %e, "receive error, re-arming");
                        }
                        RecvErrorPolicy::Stop => {
                            warn!(error = %e, "receive error, stopping receiver");
                            return Err(e.into());
                        }
                    },
                },
            }
        }
    }
}

async fn dispatch(
    datagram: &[u8],
    assembler: &mut FrameAssembler,
    events: &mpsc::Sender<VideoEvent>,
) -> VideoChannelResult<()> {
    let (header, payload) = VideoHeader::decode(datagram)?;

    match header.kind {
        PacketKind::Frame => {
            let payload = Bytes::copy_from_slice(payload);
            if let Some(encoded) = assembler.handle_packet(&header, payload)? {
                debug!(
                    sequence = header.frame_sequence,
                    len = encoded.len(),
                    "reassembled frame"
                );
                events
                    .send(VideoEvent::EncodedFrame(encoded))
                    .await
                    .map_err(|_| VideoChannelError::ChannelClosed)?;
            }
        }
        PacketKind::Parameters => {
            let sets = parse_parameter_sets(payload)?;
            debug!(sets = sets.len(), "received format description");
            let format = FormatDescription::new(sets, NAL_UNIT_HEADER_LENGTH);
            events
                .send(VideoEvent::FormatDescription(format))
                .await
                .map_err(|_| VideoChannelError::ChannelClosed)?;
        }
        PacketKind::Unknown(value) => {
            trace!(value, "ignoring unknown packet type");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::task::JoinHandle;

    use super::*;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("video_channel=debug")
            .try_init();
    }

    async fn spawn_receiver() -> (
        SocketAddr,
        mpsc::Receiver<VideoEvent>,
        ShutdownHandle,
        JoinHandle<VideoChannelResult<()>>,
    ) {
        let (tx, rx) = mpsc::channel(16);
        let (receiver, handle) = VideoReceiver::bind(
            "127.0.0.1:0".parse().unwrap(),
            ReceiverConfig::default(),
            tx,
        )
        .await
        .unwrap();
        let addr = receiver.local_addr().unwrap();
        let task = tokio::spawn(receiver.run());
        (addr, rx, handle, task)
    }

    fn frame_packet(sequence: u32, index: u16, total: u16, payload: &[u8]) -> Vec<u8> {
        let header = VideoHeader {
            kind: PacketKind::Frame,
            fragment_index: index,
            fragment_total: total,
            frame_sequence: sequence,
        };
        let mut packet = header.encode().to_vec();
        packet.extend_from_slice(payload);
        packet
    }

    fn parameters_packet(json: &[u8]) -> Vec<u8> {
        let header = VideoHeader {
            kind: PacketKind::Parameters,
            fragment_index: 0,
            fragment_total: 0,
            frame_sequence: 0,
        };
        let mut packet = header.encode().to_vec();
        packet.extend_from_slice(json);
        packet
    }

    async fn expect_frame(rx: &mut mpsc::Receiver<VideoEvent>) -> Bytes {
        match rx.recv().await.expect("event channel closed early") {
            VideoEvent::EncodedFrame(frame) => frame,
            other => panic!("expected frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delivers_unfragmented_and_fragmented_frames() {
        init_tracing();
        let (addr, mut rx, handle, task) = spawn_receiver().await;
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        sender
            .send_to(&frame_packet(5, 0, 0, b"AAA"), addr)
            .await
            .unwrap();
        sender
            .send_to(&frame_packet(7, 1, 2, b"Y"), addr)
            .await
            .unwrap();
        sender
            .send_to(&frame_packet(7, 0, 2, b"X"), addr)
            .await
            .unwrap();

        assert_eq!(&expect_frame(&mut rx).await[..], b"AAA");
        assert_eq!(&expect_frame(&mut rx).await[..], b"XY");

        handle.shutdown();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn delivers_format_description() {
        init_tracing();
        let (addr, mut rx, handle, task) = spawn_receiver().await;
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let json = br#"[{"parameterSetCount": 1, "parameterDataBase64": "AQID", "parameterDataSizeInBytes": 3}]"#;
        sender
            .send_to(&parameters_packet(json), addr)
            .await
            .unwrap();

        match rx.recv().await.unwrap() {
            VideoEvent::FormatDescription(format) => {
                assert_eq!(format.nal_unit_header_length, NAL_UNIT_HEADER_LENGTH);
                assert_eq!(format.parameter_sets.len(), 1);
                assert_eq!(&format.parameter_sets[0][..], &[1, 2, 3]);
            }
            other => panic!("expected format description, got {other:?}"),
        }

        handle.shutdown();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn tolerates_short_malformed_and_unknown_datagrams() {
        init_tracing();
        let (addr, mut rx, handle, task) = spawn_receiver().await;
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        // Too short to classify
        sender.send_to(&[1, 1, 0], addr).await.unwrap();
        // Unknown type byte
        let mut unknown = frame_packet(1, 0, 0, b"ignored");
        unknown[1] = 0x7F;
        sender.send_to(&unknown, addr).await.unwrap();
        // Malformed parameters payload
        sender
            .send_to(&parameters_packet(b"not json"), addr)
            .await
            .unwrap();
        // A valid frame still gets through afterwards
        sender
            .send_to(&frame_packet(9, 0, 0, b"ok"), addr)
            .await
            .unwrap();

        assert_eq!(&expect_frame(&mut rx).await[..], b"ok");

        handle.shutdown();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        init_tracing();
        let (_addr, _rx, handle, task) = spawn_receiver().await;

        handle.shutdown();
        handle.shutdown();
        task.await.unwrap().unwrap();
    }

    /// Connect `socket` to a freshly closed loopback port and poke it, so
    /// the kernel queues ECONNREFUSED for the socket's next receive call.
    /// Returns the refused port for callers that want to rebind it.
    async fn prime_receive_error(socket: &UdpSocket) -> SocketAddr {
        let dead = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let dead_addr = dead.local_addr().unwrap();
        drop(dead);

        socket.connect(dead_addr).await.unwrap();
        socket.send(b"probe").await.unwrap();
        // Give the ICMP rejection time to land on the error queue
        tokio::time::sleep(Duration::from_millis(100)).await;
        dead_addr
    }

    #[tokio::test]
    async fn stop_policy_ends_run_on_receive_error() {
        init_tracing();
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        prime_receive_error(&socket).await;

        let (tx, _rx) = mpsc::channel(4);
        let config = ReceiverConfig {
            recv_error_policy: RecvErrorPolicy::Stop,
            ..Default::default()
        };
        let (receiver, _handle) = VideoReceiver::with_socket(socket, config, tx);

        let result = tokio::time::timeout(Duration::from_secs(5), receiver.run())
            .await
            .expect("receiver should stop on the queued error");
        assert!(matches!(result, Err(VideoChannelError::Transport(_))));
    }

    #[tokio::test]
    async fn continue_policy_rearms_after_receive_error() {
        init_tracing();
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let receiver_addr = socket.local_addr().unwrap();
        let peer_addr = prime_receive_error(&socket).await;

        let (tx, mut rx) = mpsc::channel(4);
        let (receiver, handle) = VideoReceiver::with_socket(socket, ReceiverConfig::default(), tx);
        let task = tokio::spawn(receiver.run());

        // Rebind the refused port and deliver a valid frame from it; the
        // connected receiver only accepts that peer, and only reaches the
        // frame by re-arming past the queued error
        let peer = UdpSocket::bind(peer_addr).await.unwrap();
        peer.send_to(&frame_packet(3, 0, 0, b"ok"), receiver_addr)
            .await
            .unwrap();

        assert_eq!(&expect_frame(&mut rx).await[..], b"ok");
        handle.shutdown();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn stops_when_consumer_drops_event_channel() {
        init_tracing();
        let (addr, rx, _handle, task) = spawn_receiver().await;
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        drop(rx);
        sender
            .send_to(&frame_packet(1, 0, 0, b"gone"), addr)
            .await
            .unwrap();

        task.await.unwrap().unwrap();
    }
}
