use std::io::BufRead;

use bevy::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};

use super::{CommandInterpreter, NavCommand, parse_raw_actions};

/// Commands typed on the terminal, decoded off the main thread.
#[derive(Resource, Deref)]
pub struct ConsoleReceiver(pub Receiver<NavCommand>);

pub fn spawn_console(interpreter: CommandInterpreter) -> ConsoleReceiver {
    let (tx, rx) = unbounded();
    let spawned = std::thread::Builder::new()
        .name("console".to_string())
        .spawn(move || read_console(interpreter, tx));
    if let Err(e) = spawned {
        warn!("Console input unavailable: {e}");
    }
    ConsoleReceiver(rx)
}

fn read_console(interpreter: CommandInterpreter, tx: Sender<NavCommand>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        let decoded =
            parse_raw_actions(&line).unwrap_or_else(|| interpreter.interpret(line.trim()));
        match decoded {
            Ok(commands) if commands.is_empty() => warn!("Nothing to do for {line:?}"),
            Ok(commands) => {
                for command in commands {
                    if tx.send(command).is_err() {
                        return;
                    }
                }
            }
            Err(e) => warn!("Could not interpret {line:?}: {e}"),
        }
    }
    debug!("Console input closed");
}

pub fn forward_console_commands(
    console: Res<ConsoleReceiver>,
    mut commands: EventWriter<NavCommand>,
) {
    for command in console.try_iter() {
        info!("Console command: {command:?}");
        commands.write(command);
    }
}
