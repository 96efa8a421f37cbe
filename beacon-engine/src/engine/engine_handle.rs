use crate::engine::{EngineCommand, EngineSnapshot, MediaContext};
use crate::error::EngineError;
use beacon_core::{RoomId, ServerSignal};
use tokio::sync::{mpsc, oneshot};

/// Cloneable front door to a running [`NegotiationEngine`](crate::NegotiationEngine).
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
    media: MediaContext,
}

impl EngineHandle {
    pub(crate) fn new(commands: mpsc::Sender<EngineCommand>, media: MediaContext) -> Self {
        Self { commands, media }
    }

    pub async fn send(&self, cmd: EngineCommand) -> Result<(), EngineError> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| EngineError::Stopped)
    }

    /// Forward a message received from the signaling server.
    pub async fn dispatch(&self, signal: ServerSignal) -> Result<(), EngineError> {
        self.send(signal.into()).await
    }

    pub async fn create_room(&self, room: &str) -> Result<(), EngineError> {
        let room = RoomId::parse(room).ok_or(EngineError::InvalidRoomId)?;
        self.send(EngineCommand::CreateRoom(room)).await
    }

    pub async fn join_room(&self, room: &str) -> Result<(), EngineError> {
        let room = RoomId::parse(room).ok_or(EngineError::InvalidRoomId)?;
        self.send(EngineCommand::JoinRoom(room)).await
    }

    pub async fn start_stream(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::StartStream).await
    }

    pub async fn end_stream(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::EndStream).await
    }

    pub async fn leave_room(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::LeaveRoom).await
    }

    pub async fn switch_camera(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::SwitchCamera).await
    }

    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::Shutdown).await
    }

    pub async fn snapshot(&self) -> Result<EngineSnapshot, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.send(EngineCommand::Snapshot(tx)).await?;
        rx.await.map_err(|_| EngineError::Stopped)
    }

    pub fn media(&self) -> &MediaContext {
        &self.media
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}
