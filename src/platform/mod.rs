//! Process-level terminal plumbing: raw mode, input assembly, crash hooks.

pub mod process_terminal;
pub mod sequence;

pub use process_terminal::ProcessTerminal;
#[cfg(unix)]
pub use process_terminal::{
    install_panic_hook, install_signal_handlers, PanicHookGuard, SignalHookGuard,
};
