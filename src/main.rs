use crossterm::{
    cursor::{Hide, Show},
    execute,
    style::ResetColor,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, warn, LevelFilter};
use simplelog::{Config, WriteLogger};
use std::fs::OpenOptions;
use std::io::{self, stdout};
use std::panic;
use std::path::Path;
use std::process::ExitCode;

use termrast::core::{Mesh, Texture};
use termrast::renderers::terminal::engine::Engine;
use termrast::{cli_command, DEFAULT_MESH, DEFAULT_TEXTURE};

fn terminal_enter() -> io::Result<()> {
    terminal::enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen, Hide, Clear(ClearType::All))
}

fn terminal_leave() -> io::Result<()> {
    terminal::disable_raw_mode()?;
    execute!(stdout(), ResetColor, Show, LeaveAlternateScreen)
}

fn main() -> ExitCode {
    // Stdout carries frames, so logs go to a file.
    if let Ok(log_file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open("termrast.log")
    {
        let _ = WriteLogger::init(LevelFilter::Info, Config::default(), log_file);
    }

    let matches = cli_command().get_matches();
    let mesh_path = matches
        .get_one::<String>("mesh")
        .map(String::as_str)
        .unwrap_or(DEFAULT_MESH);
    let texture_path = matches
        .get_one::<String>("texture")
        .map(String::as_str)
        .unwrap_or(DEFAULT_TEXTURE);

    let mesh = match Mesh::from_obj(Path::new(mesh_path)) {
        Ok(mesh) => mesh,
        Err(e) => {
            error!("{}", e);
            eprintln!("Failed to load mesh from {}: {}", mesh_path, e);
            return ExitCode::FAILURE;
        }
    };

    let texture = match Texture::from_file(Path::new(texture_path)) {
        Ok(tex) => tex,
        Err(e) => {
            warn!("{}; rendering with neutral gray", e);
            eprintln!("Warning: failed to load texture, using default color");
            Texture::default()
        }
    };

    // A panic mid-frame must not leave the terminal raw with the cursor
    // hidden.
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = terminal_leave();
        error!("panic: {}", panic_info);
        original_hook(panic_info);
    }));

    let result = terminal_enter().and_then(|()| Engine::new(mesh, texture)?.run());
    let cleanup = terminal_leave();

    if let Err(e) = result.and(cleanup) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
