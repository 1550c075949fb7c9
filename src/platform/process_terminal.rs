//! The process terminal: raw mode on stdin/stdout, the reader and resize
//! threads, and the crash hooks that put the terminal back together on the
//! way down.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::core::terminal::Terminal;

#[cfg(unix)]
use crate::platform::sequence::SequenceAssembler;
#[cfg(unix)]
use libc::{self, c_int};
#[cfg(unix)]
use signal_hook::iterator::Signals;

#[cfg(unix)]
const ESCAPE_HOLD_MS: u64 = 10;
#[cfg(unix)]
const READ_POLL_MS: i32 = 50;

type InputHandlerFn = dyn FnMut(String) + Send;
type InputHandler = Arc<Mutex<Option<Box<InputHandlerFn>>>>;
type ResizeHandlerFn = dyn FnMut() + Send;
type ResizeHandler = Arc<Mutex<Option<Box<ResizeHandlerFn>>>>;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_millis() as u64
}

fn set_handler<T: ?Sized>(slot: &Arc<Mutex<Option<Box<T>>>>, value: Option<Box<T>>) {
    let mut slot = slot.lock().expect("handler lock poisoned");
    *slot = value;
}

#[cfg(unix)]
fn await_writable(fd: c_int) -> std::io::Result<()> {
    let mut pollfd = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };
    loop {
        let rc = unsafe { libc::poll(&mut pollfd, 1, -1) };
        if rc < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if rc == 0 {
            continue;
        }
        if (pollfd.revents & libc::POLLOUT) != 0 {
            return Ok(());
        }
        return Err(std::io::Error::other(format!(
            "poll reported revents {:#x} while waiting to write",
            pollfd.revents
        )));
    }
}

/// Write every byte, riding out EINTR, short writes and EAGAIN.
#[cfg(unix)]
fn write_full<W, P>(fd: c_int, bytes: &[u8], mut write_some: W, mut park: P) -> std::io::Result<()>
where
    W: FnMut(c_int, &[u8]) -> std::io::Result<usize>,
    P: FnMut(c_int) -> std::io::Result<()>,
{
    let mut done = 0;
    while done < bytes.len() {
        match write_some(fd, &bytes[done..]) {
            Ok(0) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "terminal write returned zero bytes",
                ));
            }
            Ok(count) => {
                if count > bytes.len() - done {
                    return Err(std::io::Error::other("terminal write overran the buffer"));
                }
                done += count;
            }
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => park(fd)?,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

#[cfg(unix)]
fn write_fd(fd: c_int, data: &str) {
    if data.is_empty() {
        return;
    }
    let outcome = write_full(
        fd,
        data.as_bytes(),
        |fd, buf| {
            let rc = unsafe { libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
            if rc < 0 {
                Err(std::io::Error::last_os_error())
            } else {
                Ok(rc as usize)
            }
        },
        await_writable,
    );
    if let Err(err) = outcome {
        panic!("terminal write failed: {err}");
    }
}

#[cfg(unix)]
fn read_winsize(fd: c_int) -> Option<(u16, u16)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let rc = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if rc == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some((size.ws_col, size.ws_row))
    } else {
        None
    }
}

#[cfg(unix)]
fn poll_readable(fd: c_int, timeout_ms: i32) -> bool {
    let mut pollfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let rc = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };
    rc > 0 && (pollfd.revents & libc::POLLIN) != 0
}

#[cfg(unix)]
fn read_termios(fd: c_int) -> std::io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    if unsafe { libc::tcgetattr(fd, &mut termios) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(termios)
}

#[cfg(unix)]
fn apply_termios(fd: c_int, termios: &libc::termios) -> std::io::Result<()> {
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Raw-mode stdin/stdout terminal with a reader thread and a SIGWINCH
/// watcher. This is the terminal real applications hand to the runtime;
/// tests use in-memory stand-ins.
#[cfg(unix)]
pub struct ProcessTerminal {
    stdin_fd: c_int,
    stdout_fd: c_int,
    saved_termios: Option<libc::termios>,
    input_handler: InputHandler,
    resize_handler: ResizeHandler,
    reader: Option<JoinHandle<()>>,
    reader_stop: Arc<AtomicBool>,
    discard_input: Arc<AtomicBool>,
    last_input_ms: Arc<AtomicU64>,
    winch_handle: Option<signal_hook::iterator::Handle>,
    winch_thread: Option<JoinHandle<()>>,
}

#[cfg(unix)]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self {
            stdin_fd: libc::STDIN_FILENO,
            stdout_fd: libc::STDOUT_FILENO,
            saved_termios: None,
            input_handler: Arc::new(Mutex::new(None)),
            resize_handler: Arc::new(Mutex::new(None)),
            reader: None,
            reader_stop: Arc::new(AtomicBool::new(false)),
            discard_input: Arc::new(AtomicBool::new(false)),
            last_input_ms: Arc::new(AtomicU64::new(now_ms())),
            winch_handle: None,
            winch_thread: None,
        }
    }

    fn enter_raw_mode(&mut self) -> std::io::Result<()> {
        let saved = match self.saved_termios {
            Some(saved) => saved,
            None => {
                let saved = read_termios(self.stdin_fd)?;
                self.saved_termios = Some(saved);
                saved
            }
        };
        let mut raw = saved;
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        apply_termios(self.stdin_fd, &raw)
    }

    fn leave_raw_mode(&mut self) -> std::io::Result<()> {
        match self.saved_termios.as_ref() {
            Some(saved) => apply_termios(self.stdin_fd, saved),
            None => Ok(()),
        }
    }

    fn spawn_reader(&mut self) {
        let fd = self.stdin_fd;
        let handler = Arc::clone(&self.input_handler);
        let stop = Arc::clone(&self.reader_stop);
        let discard = Arc::clone(&self.discard_input);
        let last_input_ms = Arc::clone(&self.last_input_ms);

        self.reader = Some(thread::spawn(move || {
            let mut buffer = [0u8; 4096];
            let mut assembler = SequenceAssembler::new(ESCAPE_HOLD_MS);

            while !stop.load(Ordering::SeqCst) {
                let timeout_ms = assembler.next_timeout_ms(Instant::now(), READ_POLL_MS);
                let chunk = if poll_readable(fd, timeout_ms) {
                    let count =
                        unsafe { libc::read(fd, buffer.as_mut_ptr() as *mut _, buffer.len()) };
                    if count == 0 {
                        break; // stdin closed
                    }
                    if count < 0 {
                        let err = std::io::Error::last_os_error();
                        if err.kind() == std::io::ErrorKind::Interrupted
                            || err.kind() == std::io::ErrorKind::WouldBlock
                        {
                            continue;
                        }
                        break;
                    }
                    last_input_ms.store(now_ms(), Ordering::SeqCst);
                    assembler.feed(&buffer[..count as usize], Instant::now())
                } else {
                    assembler.flush_due(Instant::now())
                };

                let Some(data) = chunk else { continue };
                if discard.load(Ordering::SeqCst) {
                    continue;
                }
                let mut handler = handler.lock().expect("input handler lock poisoned");
                if let Some(handler) = handler.as_mut() {
                    handler(data);
                }
            }
        }));
    }

    fn stop_reader(&mut self) {
        self.reader_stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
    }

    fn spawn_winch_watcher(&mut self) {
        let mut signals = Signals::new([libc::SIGWINCH]).expect("failed to register SIGWINCH");
        let handle = signals.handle();
        let resize_handler = Arc::clone(&self.resize_handler);

        self.winch_thread = Some(thread::spawn(move || {
            for _ in signals.forever() {
                let mut handler = resize_handler.lock().expect("resize handler lock poisoned");
                if let Some(handler) = handler.as_mut() {
                    handler();
                }
            }
        }));
        self.winch_handle = Some(handle);
    }

    fn stop_winch_watcher(&mut self) {
        if let Some(handle) = self.winch_handle.take() {
            handle.close();
        }
        if let Some(thread) = self.winch_thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(unix)]
impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl Terminal for ProcessTerminal {
    fn start(
        &mut self,
        on_input: Box<dyn FnMut(String) + Send>,
        on_resize: Box<dyn FnMut() + Send>,
    ) -> std::io::Result<()> {
        set_handler(&self.input_handler, Some(on_input));
        set_handler(&self.resize_handler, Some(on_resize));

        self.reader_stop.store(false, Ordering::SeqCst);
        self.discard_input.store(false, Ordering::SeqCst);
        self.last_input_ms.store(now_ms(), Ordering::SeqCst);

        if let Err(err) = self.enter_raw_mode() {
            set_handler(&self.input_handler, None);
            set_handler(&self.resize_handler, None);
            return Err(err);
        }

        self.spawn_winch_watcher();
        // Deliver the initial viewport size through the same path as real
        // resizes.
        unsafe {
            libc::raise(libc::SIGWINCH);
        }
        self.spawn_reader();
        Ok(())
    }

    fn stop(&mut self) -> std::io::Result<()> {
        self.stop_reader();
        self.stop_winch_watcher();
        set_handler(&self.input_handler, None);
        set_handler(&self.resize_handler, None);

        // Flush pending input while still in raw mode so held-back bytes
        // cannot leak into the shell after restore.
        let _ = unsafe { libc::tcflush(self.stdin_fd, libc::TCIFLUSH) };
        self.leave_raw_mode()
    }

    fn drain_input(&mut self, max_ms: u64, idle_ms: u64) {
        self.discard_input.store(true, Ordering::SeqCst);
        self.last_input_ms.store(now_ms(), Ordering::SeqCst);

        let deadline = now_ms().saturating_add(max_ms);
        loop {
            let now = now_ms();
            if now >= deadline {
                break;
            }
            let quiet_for = now.saturating_sub(self.last_input_ms.load(Ordering::SeqCst));
            if quiet_for >= idle_ms {
                break;
            }
            let nap = idle_ms.min(deadline.saturating_sub(now)).max(1);
            thread::sleep(Duration::from_millis(nap));
        }

        self.discard_input.store(false, Ordering::SeqCst);
    }

    fn write(&mut self, data: &str) {
        write_fd(self.stdout_fd, data);
    }

    fn columns(&self) -> u16 {
        read_winsize(self.stdout_fd).map_or(80, |(columns, _)| columns)
    }

    fn rows(&self) -> u16 {
        read_winsize(self.stdout_fd).map_or(24, |(_, rows)| rows)
    }
}

/// Joins the signal watcher thread on drop and unregisters it.
#[cfg(unix)]
pub struct SignalHookGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<JoinHandle<()>>,
}

#[cfg(unix)]
impl Drop for SignalHookGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(unix)]
const FATAL_SIGNALS: [c_int; 4] = [libc::SIGINT, libc::SIGTERM, libc::SIGHUP, libc::SIGQUIT];

/// Run `cleanup` when a fatal signal arrives, then exit with the
/// conventional 128+signal status. Raw mode reports Ctrl-C as byte 0x03
/// instead of SIGINT, so these fire only for signals sent from outside.
#[cfg(unix)]
pub fn install_signal_handlers<F>(cleanup: F) -> SignalHookGuard
where
    F: Fn() + Send + 'static,
{
    let mut signals = Signals::new(FATAL_SIGNALS).expect("failed to register signal handlers");
    let handle = signals.handle();

    let thread = thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            cleanup();
            std::process::exit(128 + signal);
        }
    });

    SignalHookGuard {
        handle,
        thread: Some(thread),
    }
}

#[cfg(unix)]
type PanicHookFn = dyn Fn(&std::panic::PanicHookInfo) + Send + Sync + 'static;

#[cfg(unix)]
struct PanicCleanup {
    id: u64,
    run: Arc<dyn Fn() + Send + Sync>,
    ran: Arc<AtomicBool>,
}

#[cfg(unix)]
struct PanicHookState {
    cleanups: Vec<PanicCleanup>,
    next_id: u64,
    /// Data address of the wrapper hook we installed, used to detect
    /// whether another part of the program replaced it.
    wrapper: Option<usize>,
    previous: Option<Arc<Box<PanicHookFn>>>,
}

#[cfg(unix)]
static PANIC_STATE: Mutex<PanicHookState> = Mutex::new(PanicHookState {
    cleanups: Vec::new(),
    next_id: 0,
    wrapper: None,
    previous: None,
});

#[cfg(unix)]
fn lock_panic_state() -> std::sync::MutexGuard<'static, PanicHookState> {
    match PANIC_STATE.lock() {
        Ok(state) => state,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(unix)]
fn hook_addr(hook: &PanicHookFn) -> usize {
    hook as *const PanicHookFn as *const () as usize
}

/// Runs on the panicking thread. The registry lock is taken only long
/// enough to snapshot the cleanups, so a panic raised from inside a cleanup
/// re-enters here without deadlocking.
#[cfg(unix)]
fn run_panic_cleanups() {
    type Snapshot = Vec<(Arc<dyn Fn() + Send + Sync>, Arc<AtomicBool>)>;
    let pending: Snapshot = {
        let state = lock_panic_state();
        state
            .cleanups
            .iter()
            .map(|cleanup| (Arc::clone(&cleanup.run), Arc::clone(&cleanup.ran)))
            .collect()
    };
    for (run, ran) in pending {
        if !ran.swap(true, Ordering::SeqCst) {
            run();
        }
    }
}

#[cfg(unix)]
fn install_wrapper(state: &mut PanicHookState) {
    let previous = Arc::new(std::panic::take_hook());
    let previous_for_hook = Arc::clone(&previous);
    let wrapper: Box<PanicHookFn> = Box::new(move |info| {
        run_panic_cleanups();
        (previous_for_hook)(info);
    });
    state.wrapper = Some(hook_addr(wrapper.as_ref()));
    state.previous = Some(previous);
    std::panic::set_hook(wrapper);
}

#[cfg(unix)]
fn uninstall_wrapper(state: &mut PanicHookState) {
    let Some(installed) = state.wrapper.take() else {
        state.previous = None;
        return;
    };
    let current = std::panic::take_hook();
    if hook_addr(current.as_ref()) != installed {
        // Another part of the program installed a newer hook over ours;
        // leave it in place.
        std::panic::set_hook(current);
        state.previous = None;
        return;
    }
    drop(current);
    let Some(previous) = state.previous.take() else {
        // take_hook already reinstated the default hook.
        return;
    };
    match Arc::try_unwrap(previous) {
        Ok(previous) => std::panic::set_hook(previous),
        Err(previous) => std::panic::set_hook(Box::new(move |info| (previous)(info))),
    }
}

/// Removes its cleanup from the panic registry on drop; the last guard out
/// also restores the hook that was installed before ours.
#[cfg(unix)]
pub struct PanicHookGuard {
    id: u64,
}

#[cfg(unix)]
impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        let mut state = lock_panic_state();
        state.cleanups.retain(|cleanup| cleanup.id != self.id);
        if state.cleanups.is_empty() {
            uninstall_wrapper(&mut state);
        }
    }
}

/// Run `cleanup` ahead of the standard panic output so it can restore the
/// terminal first, then delegate to whichever hook was installed before.
#[cfg(unix)]
pub fn install_panic_hook<F>(cleanup: F) -> PanicHookGuard
where
    F: Fn() + Send + Sync + 'static,
{
    let mut state = lock_panic_state();
    state.next_id += 1;
    let id = state.next_id;
    state.cleanups.push(PanicCleanup {
        id,
        run: Arc::new(cleanup),
        ran: Arc::new(AtomicBool::new(false)),
    });
    if state.wrapper.is_none() {
        install_wrapper(&mut state);
    }
    PanicHookGuard { id }
}

/// Last-resort writer for the crash hooks. Opens the controlling TTY in
/// non-blocking mode and drops whatever it cannot deliver; crash cleanup
/// must never hang or panic.
#[cfg(unix)]
pub(crate) struct RescueTerminal {
    fd: c_int,
    owns_fd: bool,
}

#[cfg(unix)]
impl RescueTerminal {
    pub(crate) fn new() -> Self {
        let flags = libc::O_WRONLY | libc::O_NONBLOCK | libc::O_NOCTTY | libc::O_CLOEXEC;
        let fd = unsafe { libc::open(c"/dev/tty".as_ptr(), flags) };
        if fd >= 0 {
            Self { fd, owns_fd: true }
        } else {
            // No controlling TTY. Disable output instead of risking a
            // blocking write to stdout, which may be a full pipe.
            Self {
                fd: -1,
                owns_fd: false,
            }
        }
    }

    fn write_best_effort(&self, data: &str) {
        if self.fd < 0 || data.is_empty() {
            return;
        }
        let bytes = data.as_bytes();
        let mut done = 0;
        while done < bytes.len() {
            let remaining = &bytes[done..];
            let rc = unsafe {
                libc::write(
                    self.fd,
                    remaining.as_ptr() as *const libc::c_void,
                    remaining.len(),
                )
            };
            if rc > 0 {
                done = done.saturating_add(rc as usize);
                continue;
            }
            if rc == 0 {
                break;
            }
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            // EAGAIN or anything else: drop the remaining output.
            break;
        }
    }
}

#[cfg(unix)]
impl Drop for RescueTerminal {
    fn drop(&mut self) {
        if self.owns_fd {
            unsafe {
                libc::close(self.fd);
            }
        }
    }
}

#[cfg(unix)]
impl Terminal for RescueTerminal {
    fn start(
        &mut self,
        _on_input: Box<dyn FnMut(String) + Send>,
        _on_resize: Box<dyn FnMut() + Send>,
    ) -> std::io::Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn drain_input(&mut self, _max_ms: u64, _idle_ms: u64) {}

    fn write(&mut self, data: &str) {
        self.write_best_effort(data);
    }

    fn columns(&self) -> u16 {
        80
    }

    fn rows(&self) -> u16 {
        24
    }
}

#[cfg(not(unix))]
pub struct ProcessTerminal;

#[cfg(not(unix))]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(unix))]
impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(unix))]
impl Terminal for ProcessTerminal {
    fn start(
        &mut self,
        _on_input: Box<dyn FnMut(String) + Send>,
        _on_resize: Box<dyn FnMut() + Send>,
    ) -> std::io::Result<()> {
        panic!("ProcessTerminal requires a Unix platform");
    }

    fn stop(&mut self) -> std::io::Result<()> {
        panic!("ProcessTerminal requires a Unix platform");
    }

    fn drain_input(&mut self, _max_ms: u64, _idle_ms: u64) {
        panic!("ProcessTerminal requires a Unix platform");
    }

    fn write(&mut self, _data: &str) {
        panic!("ProcessTerminal requires a Unix platform");
    }

    fn columns(&self) -> u16 {
        80
    }

    fn rows(&self) -> u16 {
        24
    }
}
