//! The blocking runtime: terminal lifecycle, the wake queue fed by the
//! input and tick threads, and the compose-diff-flush cycle.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::config::EnvConfig;
use crate::core::input::parse_events;
use crate::core::output::{OutputGate, TerminalCmd};
use crate::core::terminal::{Terminal, TerminalGuard};
use crate::logging::log_debug;
use crate::render::CellRenderer;
use crate::runtime::context::Context;

/// Block the calling thread. The one sanctioned sleep for application code
/// (typewriter-style dialog printing and the like); the runtime itself
/// never calls it.
pub fn sleep_ms(ms: u64) {
    std::thread::sleep(Duration::from_millis(ms));
}

#[derive(Default)]
struct WakeState {
    pending_inputs: Vec<String>,
    pending_resize: bool,
    redraw_requested: bool,
    tick_pending: bool,
    stop_requested: bool,
}

/// Wake queue between the producer threads and the event loop. The input
/// thread, the resize watcher, the ticker, and application handles all push
/// here and notify; the loop drains everything it finds on each wake.
#[derive(Default)]
struct RuntimeWake {
    state: Mutex<WakeState>,
    cvar: Condvar,
}

impl RuntimeWake {
    fn locked(&self) -> std::sync::MutexGuard<'_, WakeState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Block until anything is pending. Returns false once stop was
    /// requested.
    fn wait_for_event(&self) -> bool {
        let mut state = self.locked();
        while !state.stop_requested
            && state.pending_inputs.is_empty()
            && !state.pending_resize
            && !state.redraw_requested
            && !state.tick_pending
        {
            state = self
                .cvar
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        !state.stop_requested
    }

    fn enqueue_input(&self, data: String) {
        self.locked().pending_inputs.push(data);
        self.cvar.notify_all();
    }

    fn signal_resize(&self) {
        self.locked().pending_resize = true;
        self.cvar.notify_all();
    }

    fn signal_tick(&self) {
        self.locked().tick_pending = true;
        self.cvar.notify_all();
    }

    fn request_redraw(&self) {
        self.locked().redraw_requested = true;
        self.cvar.notify_all();
    }

    fn request_stop(&self) {
        self.locked().stop_requested = true;
        self.cvar.notify_all();
    }

    fn drain_inputs(&self) -> Vec<String> {
        std::mem::take(&mut self.locked().pending_inputs)
    }

    fn take_pending_resize(&self) -> bool {
        std::mem::take(&mut self.locked().pending_resize)
    }

    fn take_tick_pending(&self) -> bool {
        std::mem::take(&mut self.locked().tick_pending)
    }

    fn take_redraw_requested(&self) -> bool {
        std::mem::take(&mut self.locked().redraw_requested)
    }

    fn reset_for_start(&self) {
        *self.locked() = WakeState::default();
    }
}

/// Cloneable handle for waking the loop from widget callbacks or other
/// threads.
#[derive(Clone)]
pub struct RuntimeHandle {
    wake: Arc<RuntimeWake>,
}

impl RuntimeHandle {
    /// Ask the loop to compose and flush a frame on its next pass.
    pub fn request_redraw(&self) {
        self.wake.request_redraw();
    }

    /// Ask the loop to exit. [`Tui::step`] returns false afterwards.
    pub fn request_stop(&self) {
        self.wake.request_stop();
    }
}

/// Stop signal for the tick thread, separate from the wake queue so loop
/// notifications never reset the tick countdown.
#[derive(Default)]
struct TickStop {
    stopped: Mutex<bool>,
    cvar: Condvar,
}

struct Ticker {
    stop: Arc<TickStop>,
    handle: JoinHandle<()>,
}

fn run_ticker(wake: Arc<RuntimeWake>, stop: Arc<TickStop>, interval: Duration) {
    let mut next_tick = Instant::now() + interval;
    let mut stopped = match stop.stopped.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    loop {
        if *stopped {
            return;
        }
        let now = Instant::now();
        if now >= next_tick {
            wake.signal_tick();
            next_tick = now + interval;
            continue;
        }
        let (guard, _) = stop
            .cvar
            .wait_timeout(stopped, next_tick - now)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        stopped = guard;
    }
}

/// Cleanup run from the signal and panic hooks. Best-effort and idempotent:
/// at crash time we cannot know which protocol toggles actually took, and
/// terminals ignore the ones that did not.
#[derive(Debug, Default)]
struct CrashCleanup {
    ran: AtomicBool,
}

impl CrashCleanup {
    fn run<T: Terminal>(&self, terminal: &mut T) {
        if self.ran.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut output = OutputGate::new();
        output.push(TerminalCmd::MouseDisable);
        output.push(TerminalCmd::ShowCursor);
        output.push(TerminalCmd::LeaveAltScreen);
        output.flush(terminal);
    }

    #[cfg(all(unix, not(test)))]
    fn run_best_effort(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut terminal = crate::platform::process_terminal::RescueTerminal::new();
            self.run(&mut terminal);
        }));
    }
}

/// The event loop plus everything it owns: the terminal (behind a guard
/// that restores it on every exit path), the diff renderer, the write gate,
/// and the wake queue.
///
/// Lifecycle: [`Tui::start`] switches the terminal into interactive mode
/// and spawns the producers, [`Tui::step`] (or [`Tui::run`]) drives the
/// loop, [`Tui::stop`] restores the terminal. Dropping a started runtime
/// stops it.
pub struct Tui<T: Terminal> {
    terminal: TerminalGuard<T>,
    output: OutputGate,
    renderer: CellRenderer,
    wake: Arc<RuntimeWake>,
    config: EnvConfig,
    ticker: Option<Ticker>,
    stopped: bool,
    #[cfg(all(unix, not(test)))]
    signal_guard: Option<crate::platform::SignalHookGuard>,
    #[cfg(all(unix, not(test)))]
    panic_guard: Option<crate::platform::PanicHookGuard>,
}

impl<T: Terminal> Tui<T> {
    pub fn new(terminal: T) -> Self {
        Self::with_config(terminal, EnvConfig::from_env())
    }

    pub fn with_config(terminal: T, config: EnvConfig) -> Self {
        Self {
            terminal: TerminalGuard::new(terminal),
            output: OutputGate::new(),
            renderer: CellRenderer::new(),
            wake: Arc::new(RuntimeWake::default()),
            config,
            ticker: None,
            stopped: true,
            #[cfg(all(unix, not(test)))]
            signal_guard: None,
            #[cfg(all(unix, not(test)))]
            panic_guard: None,
        }
    }

    pub fn columns(&self) -> u16 {
        self.terminal.terminal().columns()
    }

    pub fn rows(&self) -> u16 {
        self.terminal.terminal().rows()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            wake: Arc::clone(&self.wake),
        }
    }

    pub fn request_redraw(&self) {
        self.wake.request_redraw();
    }

    /// Enter interactive mode: raw terminal, input and resize producers,
    /// protocol toggles, the tick thread, and the crash hooks.
    pub fn start(&mut self) -> io::Result<()> {
        if !self.stopped {
            return Ok(());
        }
        self.output.clear();
        self.wake.reset_for_start();

        // Mark running early so Drop still cleans up if start panics.
        self.stopped = false;

        #[cfg(all(unix, not(test)))]
        self.install_cleanup_hooks();

        let wake_input = Arc::clone(&self.wake);
        let wake_resize = Arc::clone(&self.wake);
        if let Err(err) = self.terminal.terminal_mut().start(
            Box::new(move |data| wake_input.enqueue_input(data)),
            Box::new(move || wake_resize.signal_resize()),
        ) {
            self.stopped = true;
            #[cfg(all(unix, not(test)))]
            self.uninstall_cleanup_hooks();
            return Err(err);
        }

        if !self.config.no_alt_screen {
            self.output.push(TerminalCmd::EnterAltScreen);
        }
        self.output.push(TerminalCmd::HideCursor);
        if !self.config.no_mouse {
            self.output.push(TerminalCmd::MouseEnable);
        }
        self.output.push(TerminalCmd::ClearAll);
        self.flush_output();

        self.renderer.request_full_redraw();
        self.wake.request_redraw();

        let stop = Arc::new(TickStop::default());
        let ticker_wake = Arc::clone(&self.wake);
        let ticker_stop = Arc::clone(&stop);
        let interval = Duration::from_millis(self.config.tick_ms);
        let handle = std::thread::spawn(move || run_ticker(ticker_wake, ticker_stop, interval));
        self.ticker = Some(Ticker { stop, handle });

        log_debug(
            "runtime",
            &format!("started, viewport {}x{}", self.columns(), self.rows()),
        );
        Ok(())
    }

    /// Reverse everything [`Tui::start`] did and hand the terminal back to
    /// the shell. Safe to call more than once.
    pub fn stop(&mut self) -> io::Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.wake.request_stop();
        self.stop_ticker();

        if !self.config.no_mouse {
            self.output.push(TerminalCmd::MouseDisable);
        }
        self.output.push(TerminalCmd::ShowCursor);
        if !self.config.no_alt_screen {
            self.output.push(TerminalCmd::LeaveAltScreen);
        }
        self.flush_output();

        self.stopped = true;
        let result = self.terminal.restore_now();
        #[cfg(all(unix, not(test)))]
        self.uninstall_cleanup_hooks();
        log_debug("runtime", "stopped");
        result
    }

    /// Block until something happens, process it, and render if anything
    /// reported dirty. Returns false once a stop was requested; callers
    /// loop on this and run their own logic (keyboard FIFO polling, layer
    /// updates) between iterations.
    pub fn step(&mut self, ctx: &mut Context) -> bool {
        if self.stopped {
            return false;
        }
        if !self.wake.wait_for_event() {
            return false;
        }
        self.process_pending(ctx);
        true
    }

    /// [`Tui::step`] in a loop, for applications living entirely in widget
    /// callbacks.
    pub fn run(&mut self, ctx: &mut Context) {
        while self.step(ctx) {}
    }

    /// Drain whatever is already queued without blocking.
    pub fn run_once(&mut self, ctx: &mut Context) {
        if self.stopped {
            return;
        }
        self.process_pending(ctx);
    }

    fn process_pending(&mut self, ctx: &mut Context) {
        let mut dirty = false;

        if self.wake.take_pending_resize() {
            let (columns, rows) = self.terminal.terminal().size();
            ctx.set_viewport(columns as i32, rows as i32);
            self.renderer.request_full_redraw();
            dirty = true;
            log_debug("runtime", &format!("resized to {columns}x{rows}"));
        }

        for data in self.wake.drain_inputs() {
            for event in parse_events(&data) {
                dirty |= ctx.handle_event(event);
            }
        }

        if self.wake.take_tick_pending() {
            dirty |= ctx.handle_tick(Instant::now());
        }

        if self.wake.take_redraw_requested() {
            dirty = true;
        }

        if dirty {
            let frame = ctx.refresh();
            let cmds = self.renderer.render(frame);
            self.output.extend(cmds);
            self.flush_output();
        }
    }

    fn flush_output(&mut self) {
        if self.output.is_empty() {
            return;
        }
        self.output.flush(self.terminal.terminal_mut());
    }

    fn stop_ticker(&mut self) {
        let Some(ticker) = self.ticker.take() else {
            return;
        };
        {
            let mut stopped = match ticker.stop.stopped.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *stopped = true;
        }
        ticker.stop.cvar.notify_all();
        let _ = ticker.handle.join();
    }

    #[cfg(all(unix, not(test)))]
    fn install_cleanup_hooks(&mut self) {
        let cleanup = Arc::new(CrashCleanup::default());
        let signal_cleanup = Arc::clone(&cleanup);
        let panic_cleanup = Arc::clone(&cleanup);
        self.signal_guard = Some(crate::platform::install_signal_handlers(move || {
            signal_cleanup.run_best_effort()
        }));
        self.panic_guard = Some(crate::platform::install_panic_hook(move || {
            panic_cleanup.run_best_effort()
        }));
    }

    #[cfg(all(unix, not(test)))]
    fn uninstall_cleanup_hooks(&mut self) {
        self.signal_guard = None;
        self.panic_guard = None;
    }
}

impl<T: Terminal> Drop for Tui<T> {
    fn drop(&mut self) {
        if self.stopped {
            return;
        }
        // Never panic in Drop, especially during unwind.
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = self.stop();
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::{CrashCleanup, Tui};
    use crate::config::EnvConfig;
    use crate::core::input::Key;
    use crate::core::terminal::Terminal;
    use crate::runtime::context::Context;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    type InputCallback = Box<dyn FnMut(String) + Send>;

    #[derive(Default)]
    struct TestState {
        output: String,
        on_input: Option<InputCallback>,
    }

    struct TestTerminal {
        state: Arc<Mutex<TestState>>,
        columns: u16,
        rows: u16,
    }

    impl TestTerminal {
        fn new(columns: u16, rows: u16) -> (Self, Arc<Mutex<TestState>>) {
            let state = Arc::new(Mutex::new(TestState::default()));
            (
                Self {
                    state: Arc::clone(&state),
                    columns,
                    rows,
                },
                state,
            )
        }
    }

    impl Terminal for TestTerminal {
        fn start(
            &mut self,
            on_input: Box<dyn FnMut(String) + Send>,
            _on_resize: Box<dyn FnMut() + Send>,
        ) -> std::io::Result<()> {
            self.state.lock().unwrap().on_input = Some(on_input);
            Ok(())
        }
        fn stop(&mut self) -> std::io::Result<()> {
            Ok(())
        }
        fn drain_input(&mut self, _max_ms: u64, _idle_ms: u64) {}
        fn write(&mut self, data: &str) {
            self.state.lock().unwrap().output.push_str(data);
        }
        fn columns(&self) -> u16 {
            self.columns
        }
        fn rows(&self) -> u16 {
            self.rows
        }
    }

    fn feed(state: &Arc<Mutex<TestState>>, data: &str) {
        let mut state = state.lock().unwrap();
        let on_input = state.on_input.as_mut().expect("terminal not started");
        on_input(data.to_string());
    }

    fn quiet_config() -> EnvConfig {
        EnvConfig {
            tick_ms: 60_000,
            ..EnvConfig::default()
        }
    }

    #[test]
    fn start_and_stop_bracket_the_protocol_toggles() {
        let (terminal, state) = TestTerminal::new(40, 20);
        let mut tui = Tui::with_config(terminal, quiet_config());

        tui.start().expect("start");
        assert_eq!(
            state.lock().unwrap().output,
            "\x1b[?1049h\x1b[?25l\x1b[?1002h\x1b[?1003h\x1b[?1006h\x1b[3J\x1b[2J\x1b[H"
        );

        state.lock().unwrap().output.clear();
        tui.stop().expect("stop");
        assert_eq!(
            state.lock().unwrap().output,
            "\x1b[?1006l\x1b[?1003l\x1b[?1002l\x1b[?25h\x1b[?1049l"
        );
    }

    #[test]
    fn opt_outs_skip_alt_screen_and_mouse() {
        let (terminal, state) = TestTerminal::new(40, 20);
        let config = EnvConfig {
            no_mouse: true,
            no_alt_screen: true,
            ..quiet_config()
        };
        let mut tui = Tui::with_config(terminal, config);

        tui.start().expect("start");
        assert_eq!(
            state.lock().unwrap().output,
            "\x1b[?25l\x1b[3J\x1b[2J\x1b[H"
        );

        state.lock().unwrap().output.clear();
        tui.stop().expect("stop");
        assert_eq!(state.lock().unwrap().output, "\x1b[?25h");
    }

    #[test]
    fn step_parses_queued_input_into_the_keyboard_fifo() {
        let (terminal, state) = TestTerminal::new(40, 20);
        let mut tui = Tui::with_config(terminal, quiet_config());
        tui.start().expect("start");
        let mut ctx = Context::new(40, 20);

        // Consume the initial redraw request first.
        assert!(tui.step(&mut ctx));

        feed(&state, "x");
        assert!(tui.step(&mut ctx));
        assert_eq!(ctx.keyboard.next_key(), Some(Key::Char('x')));

        tui.stop().expect("stop");
    }

    #[test]
    fn initial_step_renders_a_full_frame() {
        let (terminal, state) = TestTerminal::new(10, 4);
        let mut tui = Tui::with_config(terminal, quiet_config());
        tui.start().expect("start");
        state.lock().unwrap().output.clear();

        let mut ctx = Context::new(10, 4);
        assert!(tui.step(&mut ctx));
        let written = state.lock().unwrap().output.clone();
        assert!(
            written.contains("\x1b[?2026h"),
            "frame not sync-wrapped: {written:?}"
        );
        assert!(written.contains("\x1b[?2026l"));

        tui.stop().expect("stop");
    }

    #[test]
    fn stop_request_ends_the_loop() {
        let (terminal, _state) = TestTerminal::new(40, 20);
        let mut tui = Tui::with_config(terminal, quiet_config());
        tui.start().expect("start");
        let mut ctx = Context::new(40, 20);
        assert!(tui.step(&mut ctx));

        tui.runtime_handle().request_stop();
        assert!(!tui.step(&mut ctx));
        tui.stop().expect("stop");
    }

    #[test]
    fn ticker_wakes_the_loop() {
        let (terminal, _state) = TestTerminal::new(40, 20);
        let config = EnvConfig {
            tick_ms: 5,
            ..EnvConfig::default()
        };
        let mut tui = Tui::with_config(terminal, config);
        tui.start().expect("start");
        let mut ctx = Context::new(40, 20);

        let began = Instant::now();
        assert!(tui.step(&mut ctx)); // initial redraw
        assert!(tui.step(&mut ctx)); // first tick
        assert!(began.elapsed() < Duration::from_secs(5));

        tui.stop().expect("stop");
    }

    #[test]
    fn crash_cleanup_writes_once() {
        let (mut terminal, state) = TestTerminal::new(40, 20);
        let cleanup = CrashCleanup::default();
        cleanup.run(&mut terminal);
        cleanup.run(&mut terminal);
        assert_eq!(
            state.lock().unwrap().output,
            "\x1b[?1006l\x1b[?1003l\x1b[?1002l\x1b[?25h\x1b[?1049l"
        );
    }
}
