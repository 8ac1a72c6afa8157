use chatroom::{ChatError, Participant, Room};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ChatError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatroom=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let room = Room::new("test");
    let chatters = ["justin", "carl", "connor"].map(Participant::new);

    for chatter in &chatters {
        let name = chatter.name().to_string();
        chatter.set_reaction(move |message| println!("[{}] {}", name, message));
        chatter.join(&room).await?;
    }

    for chatter in &chatters {
        chatter
            .send(&format!("testing from {}", chatter.name()))
            .await?;
    }

    room.flush().await;
    info!(chatters = ?room.chatters(), "All messages delivered");

    room.close().await;
    Ok(())
}
