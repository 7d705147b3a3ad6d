//! joypuppet - puppeteer an emulated game controller
//!
//! One command vocabulary (`stick`, `hold`, `release`, bare button names,
//! `&&` chaining) driven from two front-ends: a console REPL and a MIDI
//! device translated through a hold/release debounce state machine. Input
//! reports are flushed through the [`transport::Transport`] seam.

pub mod cli;
pub mod config;
pub mod controller;
pub mod midi;
pub mod translator;
pub mod transport;

pub use cli::{Cli, ControllerCli};
pub use config::AppConfig;
pub use controller::ControllerState;
pub use translator::MidiTranslator;
pub use transport::{ConsoleTransport, Transport};
