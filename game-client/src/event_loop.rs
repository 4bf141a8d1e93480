use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::info;

use crate::{ClientInput, GameClient, RelayAdapter};

/// Drain the inbound queue and the one-second clock into `client`, one input
/// at a time, until the client settles or the queue closes. A finished game
/// keeps the loop alive until the authority's final scores arrive or the
/// watchdog grace runs out.
pub async fn run<R: RelayAdapter>(
    mut client: GameClient<R>,
    mut inbound: mpsc::UnboundedReceiver<ClientInput>,
) -> GameClient<R> {
    let mut ticker = time::interval_at(
        Instant::now() + Duration::from_secs(1),
        Duration::from_secs(1),
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let input = tokio::select! {
            input = inbound.recv() => match input {
                Some(input) => input,
                None => {
                    info!("Inbound queue closed, stopping event loop");
                    break;
                }
            },
            _ = ticker.tick() => ClientInput::Tick,
        };

        client.handle(input, Instant::now().into_std());

        if client.is_departed() {
            info!("Left the room, stopping event loop");
            break;
        }
        if client.is_settled(Instant::now().into_std()) {
            info!("Game finished, stopping event loop");
            break;
        }
    }

    client
}
