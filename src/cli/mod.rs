//! Console command registry, dispatch, and session loops
//!
//! `Cli` owns the explicit name → handler registry and the dispatch rules
//! shared by every front-end; `ControllerCli` overlays the controller-bound
//! commands and the button-class dispatch, and runs the console REPL and the
//! MIDI session loop.

pub mod command;
pub mod doc;
pub mod parser;


use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::controller::{button_push, ControllerState, SharedControllerState};
use crate::midi::input::MidiInputStream;
use crate::translator::MidiTranslator;
use crate::transport::Transport;
use command::{Command, HoldCommand, ReleaseCommand, StickCommand, WaitCommand};
use parser::Invocation;

const PROMPT: &str = "cmd >> ";
const DEFAULT_PUSH_HOLD: Duration = Duration::from_millis(100);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("command \"{0}\" already registered")]
    DuplicateCommand(String),
}

/// Outcome of dispatching one invocation
#[derive(Debug, PartialEq, Eq)]
enum Dispatch {
    /// The literal `exit` token
    Exit,
    /// Ran a built-in or registered handler (including a handler error,
    /// which is printed and does not abort the chain)
    Handled,
    /// Nothing matched; the caller may have a fallback
    Unknown,
}

/// Whether the surrounding session loop should keep running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Command registry plus the dispatch rules shared by all front-ends
pub struct Cli {
    commands: HashMap<String, Arc<dyn Command>>,
    help_preamble: Option<String>,
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}

impl Cli {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            help_preamble: None,
        }
    }

    /// Register a command. Names are unique for the session; re-registering
    /// is an error and leaves the original handler in place.
    pub fn add_command(&mut self, command: Arc<dyn Command>) -> Result<(), CliError> {
        let name = command.name().to_string();
        if self.commands.contains_key(&name) {
            return Err(CliError::DuplicateCommand(name));
        }
        self.commands.insert(name, command);
        Ok(())
    }

    /// Extra text printed before the command listing in `help`
    pub fn set_help_preamble(&mut self, preamble: impl Into<String>) {
        self.help_preamble = Some(preamble.into());
    }

    fn render_help(&self) -> String {
        let mut out = String::new();

        if let Some(preamble) = &self.help_preamble {
            out.push_str(preamble);
            out.push('\n');
        }

        out.push_str(&format!("{}\n", "Commands:".bold()));
        let mut documented: Vec<&Arc<dyn Command>> = self
            .commands
            .values()
            .filter(|c| c.help().is_some())
            .collect();
        documented.sort_by(|a, b| a.name().cmp(b.name()));
        for command in documented {
            if let Some(help) = command.help() {
                out.push_str(&doc::normalize_help(help));
                out.push('\n');
            }
        }

        out.push_str("\nCommands can be chained using \"&&\"\n");
        out.push_str("Type \"exit\" to close.");
        out
    }

    /// Dispatch one invocation: `exit`, `help`, then the registry
    async fn dispatch(&self, invocation: &Invocation) -> Dispatch {
        match invocation.name.as_str() {
            "exit" => Dispatch::Exit,
            "help" => {
                println!("{}", self.render_help());
                Dispatch::Handled
            }
            name => match self.commands.get(name) {
                Some(command) => {
                    match command.run(&invocation.args).await {
                        Ok(Some(output)) => println!("{}", output),
                        Ok(None) => {}
                        Err(e) => println!("{}", e),
                    }
                    Dispatch::Handled
                }
                None => Dispatch::Unknown,
            },
        }
    }

    /// Dispatch a parsed chain left-to-right. Unknown sub-commands are
    /// reported and skipped; they do not abort the rest of the chain.
    pub async fn dispatch_invocations(&self, invocations: &[Invocation]) -> LoopControl {
        for invocation in invocations {
            match self.dispatch(invocation).await {
                Dispatch::Exit => return LoopControl::Exit,
                Dispatch::Handled => {}
                Dispatch::Unknown => print_not_found(&invocation.name),
            }
        }
        LoopControl::Continue
    }

    /// Line-oriented REPL until `exit` or end of input
    pub async fn run(&mut self) -> Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(line);

                    let invocations = match parser::parse_line(line) {
                        Ok(invocations) => invocations,
                        Err(e) => {
                            println!("{}", e);
                            continue;
                        }
                    };
                    if self.dispatch_invocations(&invocations).await == LoopControl::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }
}

fn print_not_found(name: &str) {
    println!("command {} not found, call help for help.", name);
}

/// Console overlay bound to one controller session.
///
/// Registers the controller commands at construction and adds the
/// button-class dispatch: chain tokens matching an available button name are
/// accumulated and pushed together in one report.
pub struct ControllerCli {
    cli: Cli,
    state: SharedControllerState,
    transport: Arc<dyn Transport>,
    push_hold: Duration,
}

impl ControllerCli {
    pub fn new(state: ControllerState, transport: Arc<dyn Transport>) -> Result<Self, CliError> {
        let button_list = state
            .buttons()
            .available_buttons()
            .collect::<Vec<_>>()
            .join(", ");
        let state: SharedControllerState = Arc::new(tokio::sync::Mutex::new(state));

        let mut cli = Cli::new();
        cli.set_help_preamble(format!("{}\n{}\n", "Button commands:".bold(), button_list));
        cli.add_command(Arc::new(StickCommand::new(state.clone())))?;
        cli.add_command(Arc::new(HoldCommand::new(state.clone(), transport.clone())))?;
        cli.add_command(Arc::new(ReleaseCommand::new(
            state.clone(),
            transport.clone(),
        )))?;
        cli.add_command(Arc::new(WaitCommand))?;

        Ok(Self {
            cli,
            state,
            transport,
            push_hold: DEFAULT_PUSH_HOLD,
        })
    }

    /// Register a session-specific command
    pub fn add_command(&mut self, command: Arc<dyn Command>) -> Result<(), CliError> {
        self.cli.add_command(command)
    }

    /// Shared handle to the session's controller state
    pub fn state(&self) -> SharedControllerState {
        self.state.clone()
    }

    /// How long pushed buttons stay pressed before the release report
    pub fn set_push_hold(&mut self, hold: Duration) {
        self.push_hold = hold;
    }

    /// Dispatch a parsed chain with the button-class fallback.
    ///
    /// Button tokens are collected across the whole chain and pushed in one
    /// call afterwards, so `x&&y` lands both buttons in a single report. A
    /// lost connection during the push ends the session.
    pub async fn dispatch_invocations(&self, invocations: &[Invocation]) -> LoopControl {
        let mut buttons_to_push: Vec<String> = Vec::new();

        for invocation in invocations {
            match self.cli.dispatch(invocation).await {
                Dispatch::Exit => return LoopControl::Exit,
                Dispatch::Handled => {}
                Dispatch::Unknown => {
                    let is_button = self
                        .state
                        .lock()
                        .await
                        .buttons()
                        .is_available(&invocation.name);
                    if is_button {
                        buttons_to_push.push(invocation.name.clone());
                    } else {
                        print_not_found(&invocation.name);
                    }
                }
            }
        }

        if !buttons_to_push.is_empty() {
            debug!("button push: {:?}", buttons_to_push);
            if let Err(e) = button_push(
                &self.state,
                self.transport.as_ref(),
                &buttons_to_push,
                self.push_hold,
            )
            .await
            {
                if e.is_disconnect() {
                    warn!("connection lost during button push");
                    return LoopControl::Exit;
                }
                println!("{}", e);
            }
        }

        LoopControl::Continue
    }

    /// Console REPL front-end
    pub async fn run_console(&mut self) -> Result<()> {
        let mut rl = DefaultEditor::new()?;
        info!("console session started, type \"help\" for commands");

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(line);

                    let invocations = match parser::parse_line(line) {
                        Ok(invocations) => invocations,
                        Err(e) => {
                            println!("{}", e);
                            continue;
                        }
                    };
                    if self.dispatch_invocations(&invocations).await == LoopControl::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }

        info!("console session closed");
        Ok(())
    }

    /// MIDI front-end: poll, translate, dispatch through the same path as
    /// typed input. Idle ticks sleep for `poll_interval`.
    pub async fn run_midi(
        &self,
        stream: &mut MidiInputStream,
        translator: &mut MidiTranslator,
        poll_interval: Duration,
    ) -> Result<()> {
        info!("MIDI session started on port '{}'", stream.port_name());
        let mut last_tick = Instant::now();

        loop {
            let now = Instant::now();
            let elapsed = now.duration_since(last_tick);
            last_tick = now;

            let event = stream.try_next();
            match translator.tick(elapsed, event.as_ref()) {
                Some(chain) => {
                    info!("{}", chain);
                    if self.dispatch_invocations(&chain.to_invocations()).await == LoopControl::Exit
                    {
                        break;
                    }
                }
                None => tokio::time::sleep(poll_interval).await,
            }
        }

        info!("MIDI session closed");
        Ok(())
    }
}
