//! Degraded display for non-interactive output.

use super::board::{glyph, lock, Board};
use super::hub::{write_line, Sink};
use super::{Callback, Progress, ProgressError, SlotKey};
use std::sync::Mutex;

/// Prints the banner once at start and once, with a glyph, at completion.
/// Slot text is tracked but never drawn; there is no timer thread.
pub struct PlainBoard {
    board: Mutex<Board>,
    sink: Sink,
}

impl PlainBoard {
    pub fn start(title: impl Into<String>, sink: Sink) -> Self {
        let board = Board::new(title);
        write_line(&sink, &board.headline());
        PlainBoard {
            board: Mutex::new(board),
            sink,
        }
    }
}

impl Progress for PlainBoard {
    fn acquire_slot(&self) -> Result<SlotKey, ProgressError> {
        lock(&self.board).acquire()
    }

    fn update(&self, key: SlotKey, text: &str) -> Result<(), ProgressError> {
        lock(&self.board).update(key, text)
    }

    fn release(&self, key: SlotKey) -> Result<(), ProgressError> {
        lock(&self.board).release(key)
    }

    fn add_to_list(&self, label: &str) -> Result<(), ProgressError> {
        lock(&self.board).add_to_list(label)
    }

    fn remove_from_list(&self, label: &str) -> Result<(), ProgressError> {
        lock(&self.board).remove_from_list(label)
    }

    fn complete(&self, success: bool) -> Result<(), ProgressError> {
        let (callbacks, line) = {
            let mut board = lock(&self.board);
            let callbacks = board.finish(success)?;
            (callbacks, board.final_headline())
        };
        write_line(&self.sink, &format!("{} {}", glyph(success), line));
        for cb in callbacks {
            cb();
        }
        Ok(())
    }

    fn on(&self, event: &str, callback: Callback) -> Result<(), ProgressError> {
        lock(&self.board).register(event, callback)
    }

    fn is_complete(&self) -> bool {
        lock(&self.board).is_complete()
    }
}
