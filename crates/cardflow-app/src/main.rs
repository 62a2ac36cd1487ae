//! Replay a board session and print the resulting board.

use cardflow_app::{ReplayError, Session, run};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("usage: cardflow <session.json>");
        return ExitCode::from(2);
    };

    match replay(&path) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Replay of {} failed: {}", path.display(), e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn replay(path: &Path) -> Result<String, ReplayError> {
    log::info!("Replaying {}", path.display());
    let session = Session::load(path)?;
    let board = run(session)?;
    Ok(board.to_json()?)
}
