use crate::capture::{CaptureConstraints, CaptureDevice, LocalCapture};
use crate::config::EngineConfig;
use crate::engine::{
    EngineCommand, EngineEvent, EngineHandle, EngineSnapshot, HostStage, LocalRole, MediaContext,
    Membership, SessionSnapshot,
};
use crate::error::{NegotiationError, PeerError};
use crate::negotiation::{
    CandidateOutcome, Delay, NegotiationState, PendingQueue, RetryDecision, SessionRegistry,
    SessionRole,
};
use crate::signaling::SignalingOutput;
use crate::transport::{TransportEvent, TransportFactory};
use beacon_core::{ClientSignal, IceCandidate, PeerId, RoomId, SessionDescription};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// The negotiation engine: a single task that owns every session.
///
/// Signaling messages, local actions and scheduled retries arrive as
/// [`EngineCommand`]s; transports report back through [`TransportEvent`]s.
/// Both are handled one at a time, so session state is never touched
/// concurrently. Events for a session generation that has since been replaced
/// are dropped.
pub struct NegotiationEngine {
    config: EngineConfig,
    registry: SessionRegistry,
    pending: PendingQueue,
    membership: Membership,
    capture: Option<LocalCapture>,
    /// Outstanding retry per peer; a resumed retry whose ticket no longer
    /// matches was superseded.
    retry_tickets: HashMap<PeerId, u64>,
    next_ticket: u64,
    media: MediaContext,
    command_rx: mpsc::Receiver<EngineCommand>,
    command_tx: mpsc::WeakSender<EngineCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    signaling: Arc<dyn SignalingOutput>,
    capture_device: Arc<dyn CaptureDevice>,
    delay: Arc<dyn Delay>,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl NegotiationEngine {
    pub fn new(
        config: EngineConfig,
        factory: Arc<dyn TransportFactory>,
        signaling: Arc<dyn SignalingOutput>,
        capture_device: Arc<dyn CaptureDevice>,
        delay: Arc<dyn Delay>,
    ) -> (Self, EngineHandle, mpsc::UnboundedReceiver<EngineEvent>) {
        let (command_tx, command_rx) = mpsc::channel(config.channel_capacity);
        let (transport_tx, transport_rx) = mpsc::channel(config.channel_capacity);
        let (events, events_rx) = mpsc::unbounded_channel();
        let media = MediaContext::new();

        let engine = Self {
            registry: SessionRegistry::new(factory, transport_tx),
            pending: PendingQueue::new(),
            membership: Membership::Lobby,
            capture: None,
            retry_tickets: HashMap::new(),
            next_ticket: 1,
            media: media.clone(),
            command_rx,
            command_tx: command_tx.downgrade(),
            transport_rx,
            signaling,
            capture_device,
            delay,
            events,
            config,
        };

        (engine, EngineHandle::new(command_tx, media), events_rx)
    }

    pub async fn run(mut self) {
        info!("Negotiation engine started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(EngineCommand::Shutdown) | None => {
                            info!("Command channel closed. Shutting down engine.");
                            break;
                        }
                        Some(c) => self.handle_command(c).await,
                    }
                }

                Some(evt) = self.transport_rx.recv() => {
                    self.handle_transport_event(evt).await;
                }
            }
        }

        self.teardown().await;
        info!("Negotiation engine finished");
    }

    async fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::ParticipantJoined(peer_id) => self.on_participant_joined(peer_id).await,
            EngineCommand::ParticipantLeft(peer_id) => self.on_participant_left(&peer_id).await,
            EngineCommand::Offer { from, sdp } => self.on_remote_offer(from, sdp).await,
            EngineCommand::Answer { from, sdp } => self.on_remote_answer(from, sdp).await,
            EngineCommand::IceCandidate { from, candidate } => {
                self.on_remote_candidate(from, candidate).await
            }

            EngineCommand::RoomCreated => self.on_room_created().await,
            EngineCommand::RoomJoined { host_streaming } => self.on_room_joined(host_streaming),
            EngineCommand::RoomRejected(reason) => {
                if matches!(
                    self.membership,
                    Membership::Creating(_) | Membership::Joining(_)
                ) {
                    warn!("Room request rejected: {:?}", reason);
                    self.membership = Membership::Lobby;
                }
                self.emit(EngineEvent::RoomRejected(reason));
            }
            EngineCommand::HostIdentified(host) => self.on_host_identified(host).await,
            EngineCommand::HostStartedStreaming => {
                if let Membership::Viewer { host_streaming, .. } = &mut self.membership {
                    info!("Host started streaming");
                    *host_streaming = true;
                    self.emit(EngineEvent::HostStreaming);
                }
            }
            EngineCommand::HostLeft => {
                if self.membership.is_viewer() {
                    info!("Host left the room");
                    self.reset_room().await;
                    self.emit(EngineEvent::HostLeft);
                }
            }
            EngineCommand::RoomClosed => {
                info!("Room closed by server");
                self.reset_room().await;
                self.emit(EngineEvent::RoomClosed);
            }
            EngineCommand::ServerError(message) => {
                warn!("Signaling server error: {}", message);
                self.emit(EngineEvent::RoomError(message));
            }

            EngineCommand::SignalingLost => {
                warn!("Signaling unavailable, negotiation paused");
                self.emit(EngineEvent::SignalingLost);
            }
            EngineCommand::SignalingRestored => self.on_signaling_restored().await,

            EngineCommand::CreateRoom(room) => self.request_room(room, LocalRole::Host).await,
            EngineCommand::JoinRoom(room) => self.request_room(room, LocalRole::Viewer).await,
            EngineCommand::StartStream => self.start_stream().await,
            EngineCommand::EndStream => {
                if !self.membership.is_host() {
                    warn!("End stream requested while not hosting");
                    return;
                }
                self.leave().await;
                self.emit(EngineEvent::StreamEnded);
            }
            EngineCommand::LeaveRoom => self.leave().await,
            EngineCommand::SwitchCamera => self.switch_camera().await,
            EngineCommand::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }

            EngineCommand::RetryOffer {
                peer_id,
                attempt,
                ticket,
            } => self.on_retry_offer(peer_id, attempt, ticket).await,

            EngineCommand::Shutdown => {}
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        if !self.registry.is_current(event.key()) {
            debug!("Ignoring event for superseded session {}", event.key());
            return;
        }

        match event {
            TransportEvent::CandidateGenerated(key, candidate) => {
                if let Err(e) = self.signaling.send_ice(key.peer_id.clone(), candidate).await {
                    warn!("Failed to relay local candidate to {}: {}", key.peer_id, e);
                }
            }

            TransportEvent::ConnectivityChanged(key, connectivity) => {
                debug!("Connectivity for {}: {:?}", key, connectivity);
                if !connectivity.is_terminal() {
                    return;
                }

                info!("Transport for {} reported {:?}", key, connectivity);
                if let Some(session) = self.registry.get_current_mut(&key) {
                    session.mark_failed();
                    let role = session.role();
                    let state = session.state();
                    self.emit_state(&key.peer_id, role, state);
                }
                self.on_participant_left(&key.peer_id).await;
            }

            TransportEvent::RemoteTrack(key, info) => {
                let Some(session) = self.registry.get_current_mut(&key) else {
                    return;
                };
                info!("Remote {:?} track from {}", info.kind, key);
                let media = session.add_remote_track(info);
                self.media.insert(key.peer_id.clone(), media.clone());
                self.emit(EngineEvent::RemoteMedia {
                    peer_id: key.peer_id,
                    media,
                });
            }
        }
    }

    // ---- participants -------------------------------------------------

    async fn on_participant_joined(&mut self, peer_id: PeerId) {
        if !self.membership.is_host() {
            debug!("Ignoring join of {} while not hosting", peer_id);
            return;
        }
        if self.registry.has_live(&peer_id) {
            debug!("User {} already has a live session", peer_id);
            return;
        }
        if self.pending.contains(&peer_id) || self.retry_tickets.contains_key(&peer_id) {
            debug!("User {} is already waiting for an offer", peer_id);
            return;
        }

        if !self.is_ready() {
            info!("User {} joined before broadcast is ready, queueing", peer_id);
            self.pending.enqueue(peer_id);
            return;
        }

        self.start_offer(peer_id, 1).await;
    }

    async fn on_participant_left(&mut self, peer_id: &PeerId) {
        self.pending.remove(peer_id);
        self.retry_tickets.remove(peer_id);
        self.media.remove(peer_id);

        if let Some(key) = self.registry.remove(peer_id).await {
            info!("Disposed session {} after departure", key);
        }

        if let Membership::Viewer { host, .. } = &mut self.membership {
            if host.as_ref() == Some(peer_id) {
                *host = None;
            }
        }

        self.emit(EngineEvent::PeerLeft(peer_id.clone()));
    }

    // ---- offering side ------------------------------------------------

    /// Host and live with at least one live local track.
    fn is_ready(&self) -> bool {
        self.membership.is_live_host()
            && self
                .capture
                .as_ref()
                .is_some_and(LocalCapture::has_live_tracks)
    }

    async fn start_offer(&mut self, peer_id: PeerId, attempt: u32) {
        if !self.is_ready() {
            self.pending.enqueue(peer_id);
            return;
        }

        if let Err(e) = self.offer_attempt(&peer_id, attempt).await {
            self.on_offer_failed(peer_id, attempt, e).await;
        }
    }

    /// Create, commit and transmit one offer.
    async fn offer_attempt(
        &mut self,
        peer_id: &PeerId,
        attempt: u32,
    ) -> Result<(), NegotiationError> {
        let tracks = self
            .capture
            .as_ref()
            .map(LocalCapture::live_tracks)
            .unwrap_or_default();

        let session = self
            .registry
            .get_or_create(peer_id, SessionRole::HostSide, attempt)
            .await?;
        let key = session.key().clone();

        info!("Offering to {} (attempt {})", key, attempt);
        session.attach_tracks(&tracks).await?;
        let offer = session.create_offer().await?;
        let state = session.state();

        self.signaling.send_offer(peer_id.clone(), offer).await?;

        if !self.registry.is_current(&key) {
            return Err(NegotiationError::Superseded);
        }
        self.emit_state(peer_id, SessionRole::HostSide, state);
        Ok(())
    }

    async fn on_offer_failed(&mut self, peer_id: PeerId, attempt: u32, error: NegotiationError) {
        warn!(
            "Offer attempt {} to viewer {} failed: {}",
            attempt, peer_id, error
        );

        // Never retry on a half-configured session.
        self.registry.remove(&peer_id).await;
        self.emit(EngineEvent::OfferAttemptFailed {
            peer_id: peer_id.clone(),
            attempt,
            reason: error.to_string(),
        });

        match self.config.retry.after_failure(attempt) {
            RetryDecision::RetryAfter {
                next_attempt,
                delay,
            } => self.schedule_retry(peer_id, next_attempt, delay),
            RetryDecision::Exhausted => {
                error!(
                    "Giving up on viewer {} after {} attempts, requeueing",
                    peer_id, attempt
                );
                self.pending.enqueue(peer_id.clone());
                self.emit(EngineEvent::PeerFailed(PeerError {
                    peer_id,
                    side: SessionRole::HostSide.remote_label(),
                    source: error,
                }));
            }
        }
    }

    fn schedule_retry(&mut self, peer_id: PeerId, attempt: u32, delay: Duration) {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.retry_tickets.insert(peer_id.clone(), ticket);

        debug!("Retrying {} in {:?} (attempt {})", peer_id, delay, attempt);

        let commands = self.command_tx.clone();
        let timer = Arc::clone(&self.delay);
        tokio::spawn(async move {
            timer.sleep(delay).await;
            let Some(commands) = commands.upgrade() else {
                return;
            };
            let _ = commands
                .send(EngineCommand::RetryOffer {
                    peer_id,
                    attempt,
                    ticket,
                })
                .await;
        });
    }

    async fn on_retry_offer(&mut self, peer_id: PeerId, attempt: u32, ticket: u64) {
        if self.retry_tickets.get(&peer_id) != Some(&ticket) {
            debug!("Dropping superseded retry for {}", peer_id);
            return;
        }
        self.retry_tickets.remove(&peer_id);

        if !self.membership.is_host() || self.registry.has_live(&peer_id) {
            return;
        }
        if !self.is_ready() {
            info!("Broadcast no longer ready, queueing {}", peer_id);
            self.pending.enqueue(peer_id);
            return;
        }

        self.start_offer(peer_id, attempt).await;
    }

    /// Offer to every queued participant once the host is live.
    async fn drain_when_ready(&mut self) {
        if !self.is_ready() {
            return;
        }

        let snapshot = self.pending.take_snapshot();
        if snapshot.is_empty() {
            return;
        }

        info!("Draining {} pending participants", snapshot.len());
        for peer_id in snapshot {
            if self.registry.has_live(&peer_id) || self.retry_tickets.contains_key(&peer_id) {
                continue;
            }
            self.start_offer(peer_id, 1).await;
        }
    }

    async fn on_remote_answer(&mut self, from: PeerId, sdp: SessionDescription) {
        let Some(session) = self.registry.get_mut(&from) else {
            debug!("Answer from {} without a session", from);
            return;
        };

        let attempt = session.attempt();
        match session.accept_answer(sdp).await {
            Ok(applied) => {
                info!(
                    "Session {} established ({} buffered candidates applied)",
                    session.key(),
                    applied
                );
                let state = session.state();
                self.emit_state(&from, SessionRole::HostSide, state);
            }
            Err(NegotiationError::InvalidTransition { from: state, .. }) => {
                warn!("Ignoring answer from {} in state {}", from, state);
            }
            Err(e) => self.on_offer_failed(from, attempt, e).await,
        }
    }

    // ---- answering side -----------------------------------------------

    async fn on_remote_offer(&mut self, from: PeerId, sdp: SessionDescription) {
        if !self.membership.is_viewer() {
            warn!("Ignoring offer from {} while not viewing", from);
            return;
        }

        let renegotiation = self
            .registry
            .get(&from)
            .is_some_and(|s| s.state() != NegotiationState::Idle);
        if renegotiation {
            info!("New offer from {}, replacing its session", from);
            self.registry.remove(&from).await;
            self.media.remove(&from);
        }

        if let Err(e) = self.answer_offer(&from, sdp).await {
            error!("Failed to answer host {}: {}", from, e);
            self.registry.remove(&from).await;
            self.emit(EngineEvent::PeerFailed(PeerError {
                peer_id: from,
                side: SessionRole::ViewerSide.remote_label(),
                source: e,
            }));
        }
    }

    async fn answer_offer(
        &mut self,
        from: &PeerId,
        sdp: SessionDescription,
    ) -> Result<(), NegotiationError> {
        let session = self
            .registry
            .get_or_create(from, SessionRole::ViewerSide, 1)
            .await?;
        let key = session.key().clone();

        let answer = session.accept_offer(sdp).await?;
        self.signaling.send_answer(from.clone(), answer).await?;

        let session = self
            .registry
            .get_current_mut(&key)
            .ok_or(NegotiationError::Superseded)?;
        session.mark_answer_sent()?;
        info!("Session {} established", key);

        let state = session.state();
        self.emit_state(from, SessionRole::ViewerSide, state);
        Ok(())
    }

    async fn on_host_identified(&mut self, host_id: PeerId) {
        let Membership::Viewer { host, .. } = &mut self.membership else {
            return;
        };
        *host = Some(host_id.clone());

        // An idle session lets early candidates be buffered.
        match self
            .registry
            .get_or_create(&host_id, SessionRole::ViewerSide, 1)
            .await
        {
            Ok(session) => debug!("Prepared session {} for host", session.key()),
            Err(e) => warn!("Could not prepare session for host {}: {}", host_id, e),
        }
    }

    async fn on_remote_candidate(&mut self, from: PeerId, candidate: IceCandidate) {
        let session = if self.membership.is_viewer() {
            match self
                .registry
                .get_or_create(&from, SessionRole::ViewerSide, 1)
                .await
            {
                Ok(session) => session,
                Err(e) => {
                    warn!("Dropping candidate from {}: {}", from, e);
                    return;
                }
            }
        } else {
            match self.registry.get_mut(&from) {
                Some(session) if !session.is_stale() => session,
                _ => {
                    debug!("Dropping candidate from {} without a session", from);
                    return;
                }
            }
        };

        match session.add_remote_candidate(candidate).await {
            Ok(CandidateOutcome::Applied) => debug!("Applied candidate from {}", from),
            Ok(CandidateOutcome::Buffered) => debug!(
                "Buffered candidate from {} ({} pending)",
                from,
                session.buffered_candidates()
            ),
            Err(e) => warn!("Failed to add ICE candidate for {}: {}", from, e),
        }
    }

    // ---- room lifecycle -----------------------------------------------

    async fn request_room(&mut self, room: RoomId, role: LocalRole) {
        if self.membership != Membership::Lobby {
            warn!("Already in room {:?}, ignoring request", self.membership.room());
            return;
        }

        let signal = match role {
            LocalRole::Host => ClientSignal::CreateRoom(room.clone()),
            LocalRole::Viewer => ClientSignal::JoinRoom(room.clone()),
        };
        if let Err(e) = self.signaling.send(signal).await {
            error!("Failed to request room {}: {}", room, e);
            self.emit(EngineEvent::RoomError(e.to_string()));
            return;
        }

        self.membership = match role {
            LocalRole::Host => Membership::Creating(room),
            LocalRole::Viewer => Membership::Joining(room),
        };
    }

    async fn on_room_created(&mut self) {
        let Membership::Creating(room) = &self.membership else {
            debug!("Room creation confirmed again, nothing to do");
            return;
        };
        let room = room.clone();

        info!("Room {} created, hosting", room);
        self.membership = Membership::Host {
            room: room.clone(),
            stage: HostStage::AwaitingCapture,
        };
        self.emit(EngineEvent::RoleAssigned {
            room,
            role: LocalRole::Host,
        });

        if self.acquire_capture().await {
            self.set_host_stage(HostStage::Standby);
        }
    }

    fn on_room_joined(&mut self, host_streaming: bool) {
        let Membership::Joining(room) = &self.membership else {
            debug!("Room join confirmed again, nothing to do");
            return;
        };
        let room = room.clone();

        info!("Joined room {} (host streaming: {})", room, host_streaming);
        self.membership = Membership::Viewer {
            room: room.clone(),
            host: None,
            host_streaming,
        };
        self.emit(EngineEvent::RoleAssigned {
            room,
            role: LocalRole::Viewer,
        });
    }

    async fn on_signaling_restored(&mut self) {
        info!("Signaling restored");
        self.emit(EngineEvent::SignalingRestored);

        let announcements = match &self.membership {
            Membership::Host { room, stage } => {
                let mut signals = vec![ClientSignal::CreateRoom(room.clone())];
                if *stage == HostStage::Live {
                    signals.push(ClientSignal::HostStreaming(room.clone()));
                }
                signals
            }
            Membership::Creating(room) => vec![ClientSignal::CreateRoom(room.clone())],
            Membership::Viewer { room, .. } | Membership::Joining(room) => {
                vec![ClientSignal::JoinRoom(room.clone())]
            }
            Membership::Lobby => Vec::new(),
        };

        for signal in announcements {
            if let Err(e) = self.signaling.send(signal).await {
                warn!("Failed to re-announce role: {}", e);
            }
        }
    }

    /// Returns whether usable capture is now held.
    async fn acquire_capture(&mut self) -> bool {
        if self
            .capture
            .as_ref()
            .is_some_and(LocalCapture::has_live_tracks)
        {
            return true;
        }

        match self.capture_device.open(&self.config.capture).await {
            Ok(capture) => {
                info!("Local capture acquired ({} tracks)", capture.tracks().len());
                self.capture = Some(capture);
                true
            }
            Err(e) => {
                error!("Local capture unavailable: {}", e);
                self.emit(EngineEvent::CaptureUnavailable(e));
                false
            }
        }
    }

    fn set_host_stage(&mut self, next: HostStage) {
        if let Membership::Host { stage, .. } = &mut self.membership {
            *stage = next;
        }
    }

    async fn start_stream(&mut self) {
        let Membership::Host { room, stage } = &self.membership else {
            warn!("Start stream requested while not hosting");
            return;
        };
        if *stage == HostStage::Live {
            debug!("Already live");
            return;
        }
        let room = room.clone();

        if !self.acquire_capture().await {
            self.set_host_stage(HostStage::AwaitingCapture);
            return;
        }

        if let Err(e) = self.signaling.send(ClientSignal::HostStreaming(room)).await {
            warn!("Failed to announce stream start: {}", e);
        }
        self.set_host_stage(HostStage::Live);
        info!("Broadcast started");
        self.emit(EngineEvent::StreamStarted);

        // Pre-connected peers that never got an offer.
        let idle: Vec<PeerId> = self
            .registry
            .iter()
            .filter(|s| {
                s.role() == SessionRole::HostSide
                    && s.state() == NegotiationState::Idle
            })
            .map(|s| s.peer_id().clone())
            .collect();
        for peer_id in idle {
            self.start_offer(peer_id, 1).await;
        }

        self.drain_when_ready().await;
    }

    async fn switch_camera(&mut self) {
        let Some(capture) = &self.capture else {
            warn!("Camera switch requested without capture");
            return;
        };

        let facing = capture.facing().flipped();
        let constraints = CaptureConstraints {
            facing,
            ..self.config.capture
        };

        let track = match self.capture_device.open_video(&constraints).await {
            Ok(track) => track,
            Err(e) => {
                error!("Camera switch failed: {}", e);
                self.emit(EngineEvent::CaptureUnavailable(e));
                return;
            }
        };

        if let Some(capture) = self.capture.as_mut() {
            capture.replace_video(track.clone(), facing);
        }

        for session in self.registry.iter_mut() {
            match session.replace_track(&track).await {
                Ok(true) => debug!("Replaced video track for {}", session.key()),
                Ok(false) => {}
                Err(e) => warn!("Failed to replace track for {}: {}", session.key(), e),
            }
        }

        info!("Switched camera to {:?}", facing);
        self.emit(EngineEvent::CameraSwitched(facing));
    }

    async fn leave(&mut self) {
        if let Some(room) = self.membership.room().cloned() {
            if let Err(e) = self.signaling.send(ClientSignal::LeaveRoom(room)).await {
                warn!("Failed to announce leave: {}", e);
            }
        }
        self.reset_room().await;
    }

    /// Back to the lobby with nothing negotiated and no capture held.
    async fn reset_room(&mut self) {
        self.teardown().await;
        self.membership = Membership::Lobby;
    }

    async fn teardown(&mut self) {
        if let Some(capture) = self.capture.take() {
            capture.stop();
        }

        for peer_id in self.registry.peers() {
            if let Some(session) = self.registry.get(&peer_id) {
                let role = session.role();
                self.registry.remove(&peer_id).await;
                self.emit_state(&peer_id, role, NegotiationState::Closed);
            }
        }

        self.pending.clear();
        self.retry_tickets.clear();
        self.media.clear();
    }

    // ---- output -------------------------------------------------------

    fn snapshot(&self) -> EngineSnapshot {
        let mut sessions: Vec<SessionSnapshot> =
            self.registry.iter().map(SessionSnapshot::from).collect();
        sessions.sort_by(|a, b| a.peer_id.cmp(&b.peer_id));

        let mut scheduled_retries: Vec<PeerId> = self.retry_tickets.keys().cloned().collect();
        scheduled_retries.sort();

        EngineSnapshot {
            membership: self.membership.clone(),
            sessions,
            pending: self.pending.peers(),
            scheduled_retries,
            capturing: self
                .capture
                .as_ref()
                .is_some_and(LocalCapture::has_live_tracks),
        }
    }

    fn emit_state(&self, peer_id: &PeerId, role: SessionRole, state: NegotiationState) {
        self.emit(EngineEvent::SessionState {
            peer_id: peer_id.clone(),
            role,
            state,
        });
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }
}
