use crate::capture::{LocalTrack, TrackKind};
use crate::error::TransportError;
use crate::negotiation::SessionKey;
use crate::transport::{
    Connectivity, PeerTransport, RemoteTrackInfo, TransportConfig, TransportEvent,
    TransportFactory,
};
use async_trait::async_trait;
use beacon_core::{IceCandidate, SdpKind, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_remote::TrackRemote;

pub struct WebRtcTransport {
    key: SessionKey,
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebRtcTransport {
    /// Build a peer connection and wire its callbacks into `event_tx`.
    pub async fn new(
        key: SessionKey,
        config: &TransportConfig,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self, TransportError> {
        // 1. Codecs and interceptors (RTCP reports, NACK)
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        // 2. STUN/TURN servers from static configuration
        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        // A. Connectivity changes
        let state_tx = event_tx.clone();
        let state_key = key.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let key = state_key.clone();

                Box::pin(async move {
                    info!("Peer connection state for {}: {:?}", key, s);
                    let connectivity = match s {
                        RTCPeerConnectionState::Unspecified | RTCPeerConnectionState::New => {
                            Connectivity::New
                        }
                        RTCPeerConnectionState::Connecting => Connectivity::Connecting,
                        RTCPeerConnectionState::Connected => Connectivity::Connected,
                        RTCPeerConnectionState::Disconnected => Connectivity::Disconnected,
                        RTCPeerConnectionState::Failed => Connectivity::Failed,
                        RTCPeerConnectionState::Closed => Connectivity::Closed,
                    };
                    let _ = tx
                        .send(TransportEvent::ConnectivityChanged(key, connectivity))
                        .await;
                })
            },
        ));

        // B. Trickle ICE: local candidates go out through signaling
        let ice_tx = event_tx.clone();
        let ice_key = key.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let key = ice_key.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(key, candidate))
                    .await;
            })
        }));

        // C. Inbound media
        let track_tx = event_tx;
        let track_key = key.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let key = track_key.clone();

                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => TrackKind::Audio,
                        _ => TrackKind::Video,
                    };
                    let info = RemoteTrackInfo {
                        stream_id: track.stream_id(),
                        track_id: track.id(),
                        kind,
                    };
                    debug!("Remote {:?} track from {}", kind, key);
                    let _ = tx.send(TransportEvent::RemoteTrack(key, info)).await;
                })
            },
        ));

        Ok(Self {
            key,
            peer_connection,
        })
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }
}

fn to_rtc(desc: SessionDescription) -> Result<RTCSessionDescription, TransportError> {
    let rtc = match desc.kind {
        SdpKind::Offer => RTCSessionDescription::offer(desc.sdp)?,
        SdpKind::Answer => RTCSessionDescription::answer(desc.sdp)?,
    };
    Ok(rtc)
}

#[async_trait]
impl PeerTransport for WebRtcTransport {
    async fn add_track(&self, track: &LocalTrack) -> Result<(), TransportError> {
        self.peer_connection.add_track(track.source()).await?;
        Ok(())
    }

    async fn replace_track(&self, track: &LocalTrack) -> Result<bool, TransportError> {
        let wanted = match track.kind() {
            TrackKind::Audio => RTPCodecType::Audio,
            TrackKind::Video => RTPCodecType::Video,
        };

        for sender in self.peer_connection.get_senders().await {
            let Some(current) = sender.track().await else {
                continue;
            };
            if current.kind() == wanted {
                sender.replace_track(Some(track.source())).await?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn create_offer(&self) -> Result<SessionDescription, TransportError> {
        let offer = self.peer_connection.create_offer(None).await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, TransportError> {
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.peer_connection
            .set_local_description(to_rtc(desc)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), TransportError> {
        self.peer_connection
            .set_remote_description(to_rtc(desc)?)
            .await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.peer_connection.signaling_state() == RTCSignalingState::Closed
            || self.peer_connection.connection_state() == RTCPeerConnectionState::Closed
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Creates a [`WebRtcTransport`] per session.
#[derive(Clone)]
pub struct WebRtcTransportFactory {
    config: TransportConfig,
}

impl WebRtcTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TransportFactory for WebRtcTransportFactory {
    async fn create(
        &self,
        key: SessionKey,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>, TransportError> {
        let transport = WebRtcTransport::new(key, &self.config, events).await?;
        Ok(Box::new(transport))
    }
}
