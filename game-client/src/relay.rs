use game_types::ClientMessage;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("relay connection is closed")]
    Disconnected,
}

/// Outbound side of the relay. Emission is fire-and-forget: nothing is
/// acknowledged and success only means the message was queued.
pub trait RelayAdapter {
    fn emit(&self, message: ClientMessage) -> Result<(), RelayError>;
}

/// Queues outbound messages for the websocket transport.
#[derive(Debug, Clone)]
pub struct ChannelRelay {
    sender: mpsc::UnboundedSender<ClientMessage>,
}

impl ChannelRelay {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ClientMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl RelayAdapter for ChannelRelay {
    fn emit(&self, message: ClientMessage) -> Result<(), RelayError> {
        self.sender
            .send(message)
            .map_err(|_| RelayError::Disconnected)
    }
}
