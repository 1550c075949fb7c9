//! Terminal seam between the compositor runtime and a real tty.
//!
//! The runtime never touches file descriptors directly. Everything it needs
//! from a terminal is behind this trait: a byte sink for composed frames and
//! control sequences, callbacks for input and resize, and the current size.
//! `ProcessTerminal` implements it against `/dev/tty`; tests substitute an
//! in-memory double.

/// Backend contract consumed by the runtime.
pub trait Terminal {
    /// Put the terminal into interactive mode and begin delivering input.
    ///
    /// `on_input` receives raw byte chunks (possibly several escape
    /// sequences per call); `on_resize` fires on window-size changes. Both
    /// are called from backend threads and must only enqueue work.
    fn start(
        &mut self,
        on_input: Box<dyn FnMut(String) + Send>,
        on_resize: Box<dyn FnMut() + Send>,
    ) -> std::io::Result<()>;

    /// Leave interactive mode and restore the terminal the user had.
    fn stop(&mut self) -> std::io::Result<()>;

    /// Swallow pending input before exiting so queued escape sequences do
    /// not spill onto the shell prompt over slow connections.
    fn drain_input(&mut self, max_ms: u64, idle_ms: u64);

    /// Write already-encoded output. Frames arrive as one call each.
    fn write(&mut self, data: &str);

    /// Viewport dimensions in cells.
    fn columns(&self) -> u16;
    fn rows(&self) -> u16;

    /// Both dimensions at once, as (columns, rows).
    fn size(&self) -> (u16, u16) {
        (self.columns(), self.rows())
    }
}

/// RAII wrapper that guarantees terminal restoration.
///
/// Dropping the guard drains input and stops the backend, so a panic or an
/// early return cannot leave the user's shell in raw mode with the alternate
/// screen active. `restore_now` does the same eagerly when the caller wants
/// the restoration error.
pub struct TerminalGuard<T: Terminal> {
    terminal: Option<T>,
    max_drain_ms: u64,
    idle_drain_ms: u64,
}

impl<T: Terminal> TerminalGuard<T> {
    /// Wrap a terminal with default drain timings (max 1000ms, idle 50ms).
    pub fn new(terminal: T) -> Self {
        Self {
            terminal: Some(terminal),
            max_drain_ms: 1000,
            idle_drain_ms: 50,
        }
    }

    pub fn set_drain_timings(&mut self, max_ms: u64, idle_ms: u64) {
        self.max_drain_ms = max_ms;
        self.idle_drain_ms = idle_ms;
    }

    /// Access the wrapped terminal.
    pub fn terminal(&self) -> &T {
        self.terminal
            .as_ref()
            .expect("terminal already taken from guard")
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        self.terminal
            .as_mut()
            .expect("terminal already taken from guard")
    }

    /// Drain and stop immediately, reporting the stop error. After this the
    /// drop handler is a no-op.
    pub fn restore_now(&mut self) -> std::io::Result<()> {
        match self.terminal.take() {
            Some(mut terminal) => {
                terminal.drain_input(self.max_drain_ms, self.idle_drain_ms);
                terminal.stop()
            }
            None => Ok(()),
        }
    }

    /// Consume the guard without running cleanup.
    pub fn into_inner(mut self) -> T {
        self.terminal
            .take()
            .expect("terminal already taken from guard")
    }
}

impl<T: Terminal> Drop for TerminalGuard<T> {
    fn drop(&mut self) {
        if let Some(terminal) = self.terminal.as_mut() {
            terminal.drain_input(self.max_drain_ms, self.idle_drain_ms);
            let _ = terminal.stop();
        }
    }
}
