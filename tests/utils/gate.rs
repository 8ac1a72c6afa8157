#![allow(dead_code)]

use std::sync::{Arc, Condvar, Mutex};
use tokio::sync::mpsc;

use chatroom::Participant;

/// Holds every reaction of one participant until opened
pub struct Gate {
    open: Mutex<bool>,
    cv: Condvar,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            open: Mutex::new(false),
            cv: Condvar::new(),
        })
    }

    pub fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cv.wait(open).unwrap();
        }
    }

    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.cv.notify_all();
    }
}

/// Reaction that reports each message as it starts handling it, then blocks on the gate
pub fn gated(participant: &Participant, gate: Arc<Gate>) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    participant.set_reaction(move |message| {
        let _ = tx.send(message.contents);
        gate.wait();
    });
    rx
}
