pub mod progress;
pub mod tui;

pub use progress::ProgressObserver;
pub use tui::{TuiInputPort, TuiLoginPrompt};

/// Prints the program header and applies the prompt theme. Call once at startup.
pub fn init_ui() {
    println!("tg-contacts v{}", env!("CARGO_PKG_VERSION"));
    tui::apply_theme();
}
