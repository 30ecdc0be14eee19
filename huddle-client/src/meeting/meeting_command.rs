use crate::error::MeetingError;
use huddle_core::ParticipantId;
use tokio::sync::{mpsc, oneshot};

/// Requests other tasks send into a running meeting session.
#[derive(Debug)]
pub enum MeetingCommand {
    StartCall {
        peer_id: ParticipantId,
        reply: oneshot::Sender<Result<(), MeetingError>>,
    },
    SendMessage {
        text: String,
        reply: oneshot::Sender<Result<(), MeetingError>>,
    },
    Leave {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to a meeting session's event loop.
#[derive(Debug, Clone)]
pub struct MeetingHandle {
    tx: mpsc::Sender<MeetingCommand>,
}

impl MeetingHandle {
    pub(crate) fn new(tx: mpsc::Sender<MeetingCommand>) -> Self {
        Self { tx }
    }

    pub async fn start_call(&self, peer_id: ParticipantId) -> Result<(), MeetingError> {
        let (reply, rx) = oneshot::channel();
        self.request(MeetingCommand::StartCall { peer_id, reply })
            .await?;
        rx.await.map_err(|_| MeetingError::SessionEnded)?
    }

    pub async fn send_message(&self, text: impl Into<String>) -> Result<(), MeetingError> {
        let (reply, rx) = oneshot::channel();
        self.request(MeetingCommand::SendMessage {
            text: text.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| MeetingError::SessionEnded)?
    }

    /// Asks the session to leave and waits until teardown finished.
    pub async fn leave(&self) -> Result<(), MeetingError> {
        let (reply, rx) = oneshot::channel();
        self.request(MeetingCommand::Leave { reply }).await?;
        rx.await.map_err(|_| MeetingError::SessionEnded)
    }

    async fn request(&self, cmd: MeetingCommand) -> Result<(), MeetingError> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| MeetingError::SessionEnded)
    }
}
