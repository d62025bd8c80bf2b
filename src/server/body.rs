//! Streaming upload bodies
//!
//! Bridges request body chunks arriving on the async side to the blocking
//! `Read` the storage core consumes, so an upload is never held in memory
//! as a whole.

use axum::body::Bytes;
use std::io::{self, Read};
use tokio::sync::mpsc;

pub type ChunkSender = mpsc::Sender<io::Result<Bytes>>;

/// Blocking reader over chunks sent from an async task
///
/// Only read it off the async runtime (inside `spawn_blocking`).
pub struct ChunkReader {
    rx: mpsc::Receiver<io::Result<Bytes>>,
    current: Bytes,
}

impl ChunkReader {
    /// A reader and the sender feeding it; at most `depth` chunks are queued
    pub fn channel(depth: usize) -> (ChunkSender, Self) {
        let (tx, rx) = mpsc::channel(depth);
        (
            tx,
            Self {
                rx,
                current: Bytes::new(),
            },
        )
    }
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.current.is_empty() {
            match self.rx.blocking_recv() {
                Some(Ok(chunk)) => self.current = chunk,
                Some(Err(e)) => return Err(e),
                // Sender dropped: end of body
                None => return Ok(0),
            }
        }

        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current = self.current.slice(n..);
        Ok(n)
    }
}
