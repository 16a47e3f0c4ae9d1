use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use console_core::{update, AppState, Msg, View};
use console_gateway::{Engine, GatewaySettings, ReqwestGateway};
use console_logging::{console_info, console_trace};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::unbounded_channel;

use super::commands::{self, Command, HELP};
use super::persistence::RonSelectionStore;
use super::render;

pub struct AppConfig {
    pub settings: GatewaySettings,
    pub state_file: PathBuf,
    pub initial_view: View,
}

/// Runs the console until stdin closes or the operator quits.
///
/// Operator commands and engine replies are interleaved on one task; every
/// message goes through `update`, its effects go to the engine, and a dirty
/// state is printed.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    console_info!("Connecting to {}", config.settings.base_url);
    let gateway = Arc::new(ReqwestGateway::new(config.settings)?);
    let store = Arc::new(RonSelectionStore::open(config.state_file));
    let (msg_tx, mut msg_rx) = unbounded_channel::<Msg>();
    let mut engine = Engine::new(gateway, store, msg_tx);

    let state = dispatch(AppState::new(), Msg::Navigate(config.initial_view), &mut engine);
    let mut state = dispatch(state, Msg::ScraperStatusRequested, &mut engine);
    print_if_dirty(&mut state)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match commands::parse(&line, state.session().active()) {
                    Ok(Command::Quit) => break,
                    Ok(Command::Help) => println!("{HELP}"),
                    Ok(Command::Show) => print!("{}", render::render(&state.view(), Local::now())),
                    Ok(Command::Dispatch(msg)) => {
                        state = dispatch(state, msg, &mut engine);
                    }
                    Err(err) => println!("{err}"),
                }
            }
            Some(msg) = msg_rx.recv() => {
                state = dispatch(state, msg, &mut engine);
            }
        }
        print_if_dirty(&mut state)?;
    }

    console_info!("Shutting down");
    engine.shutdown();
    Ok(())
}

fn dispatch(state: AppState, msg: Msg, engine: &mut Engine) -> AppState {
    console_trace!(
        "[session {}] dispatch {:?}",
        console_logging::session_generation(),
        msg
    );
    let (state, effects) = update(state, msg);
    engine.run(effects);
    state
}

fn print_if_dirty(state: &mut AppState) -> std::io::Result<()> {
    if !state.consume_dirty() {
        return Ok(());
    }
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(render::render(&state.view(), Local::now()).as_bytes())?;
    stdout.flush()
}
