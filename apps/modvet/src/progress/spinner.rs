//! Interactive display: a spinner banner plus one line per live slot,
//! redrawn in place by a background thread.

use super::board::{glyph, lock, Board};
use super::hub::{write_raw, Sink};
use super::{Callback, Progress, ProgressError, SlotKey};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::warn;

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const TICK: Duration = Duration::from_millis(80);

struct Renderer {
    stop: mpsc::Sender<()>,
    handle: JoinHandle<usize>,
}

pub struct SpinnerBoard {
    board: Arc<Mutex<Board>>,
    sink: Sink,
    renderer: Mutex<Option<Renderer>>,
}

impl SpinnerBoard {
    /// Create the board and start its render thread.
    pub fn start(title: impl Into<String>, sink: Sink) -> Self {
        let board = Arc::new(Mutex::new(Board::new(title)));
        let (stop, stopped) = mpsc::channel::<()>();
        let thread_board = Arc::clone(&board);
        let thread_sink = sink.clone();
        let renderer = match thread::Builder::new()
            .name("modvet-progress".into())
            .spawn(move || render_loop(&thread_board, &thread_sink, &stopped))
        {
            Ok(handle) => Some(Renderer { stop, handle }),
            Err(e) => {
                // The run still works without live redraws.
                warn!("could not start progress renderer: {}", e);
                None
            }
        };
        SpinnerBoard {
            board,
            sink,
            renderer: Mutex::new(renderer),
        }
    }

    /// Stop the render thread and return how many lines it left on screen.
    fn stop_renderer(&self) -> usize {
        let renderer = match self.renderer.lock() {
            Ok(mut r) => r.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match renderer {
            Some(Renderer { stop, handle }) => {
                drop(stop);
                handle.join().unwrap_or(0)
            }
            None => 0,
        }
    }
}

fn render_loop(board: &Mutex<Board>, sink: &Sink, stopped: &mpsc::Receiver<()>) -> usize {
    let mut drawn = 0usize;
    let mut frame = 0usize;
    loop {
        let (head, slots) = {
            let b = lock(board);
            (b.headline(), b.slot_lines())
        };
        let mut out = String::new();
        if drawn > 0 {
            // back to the first line of the previous frame, then clear below
            out.push_str(&format!("\x1b[{}F\x1b[J", drawn));
        }
        out.push_str(&format!("[{}] {}\n", FRAMES[frame % FRAMES.len()], head));
        for line in &slots {
            out.push_str(&format!("    {}\n", line));
        }
        write_raw(sink, &out);
        drawn = 1 + slots.len();
        frame += 1;
        match stopped.recv_timeout(TICK) {
            Err(RecvTimeoutError::Timeout) => continue,
            _ => return drawn,
        }
    }
}

impl Progress for SpinnerBoard {
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
        let drawn = self.stop_renderer();
        let mut out = String::new();
        if drawn > 0 {
            out.push_str(&format!("\x1b[{}F\x1b[J", drawn));
        }
        out.push_str(&format!("{} {}\n", glyph(success), line));
        write_raw(&self.sink, &out);
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

impl Drop for SpinnerBoard {
    fn drop(&mut self) {
        self.stop_renderer();
    }
}
