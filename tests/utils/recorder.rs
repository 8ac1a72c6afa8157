//! Recording reaction - captures what a participant's consumption loop delivers
#![allow(dead_code)] // Test utilities may not all be used in every test

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

use chatroom::{Message, Participant};

const RECEIVE_TIMEOUT: Duration = Duration::from_secs(2);
const SILENCE_WINDOW: Duration = Duration::from_millis(50);

pub struct Recorder {
    name: String,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl Recorder {
    /// Install a reaction on `participant` that records every message it handles
    pub fn attach(participant: &Participant) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        participant.set_reaction(move |message| {
            let _ = tx.send(message);
        });

        Self {
            name: participant.name().to_string(),
            rx,
        }
    }

    /// Wait for the next handled message
    pub async fn next(&mut self) -> Message {
        match timeout(RECEIVE_TIMEOUT, self.rx.recv()).await {
            Ok(Some(message)) => message,
            Ok(None) => panic!("{} stopped recording", self.name),
            Err(_) => panic!("{} received nothing in time", self.name),
        }
    }

    /// Assert the next handled messages render exactly as `expected`, in order
    pub async fn expect_messages(&mut self, expected: &[&str]) {
        for want in expected {
            let got = self.next().await.display_string();
            assert_eq!(&got, want, "{} received an unexpected message", self.name);
        }
    }

    /// Assert nothing more is handled for a short while
    pub async fn expect_silence(&mut self) {
        if let Ok(Some(message)) = timeout(SILENCE_WINDOW, self.rx.recv()).await {
            panic!("{} should not have received {}", self.name, message);
        }
    }

    /// Everything handled so far without waiting
    pub fn drain(&mut self) -> Vec<String> {
        let mut messages = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            messages.push(message.display_string());
        }
        messages
    }
}
