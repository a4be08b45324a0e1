//! wu-token - prints the Windows Update token of the signed-in Microsoft account.
//!
//! Runs the same silent acquisition as the `GetWUToken` export, in-process.

#![deny(clippy::all)]

use std::process::ExitCode;

use tracing::{error, info};
use wutokenhelper::{logging, Config};

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            logging::init("info");
            error!("Failed to load configuration: {:#}", e);
            eprintln!("Configuration error: {:#}", e);
            eprintln!("\nCheck the following environment variables:");
            eprintln!("  WU_TOKEN_AUTHORITY, WU_TOKEN_AUDIENCE, WU_TOKEN_TARGET, WU_TOKEN_CLIENT_ID");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.logging.level);
    info!("Starting wu-token v{}", env!("CARGO_PKG_VERSION"));

    run(&config)
}

#[cfg(windows)]
fn run(config: &Config) -> ExitCode {
    use windows::Win32::System::Com::{CoInitializeEx, CoUninitialize, COINIT_MULTITHREADED};

    let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
    if hr.is_err() {
        error!("CoInitializeEx failed: {:?}", hr);
        return ExitCode::FAILURE;
    }

    let result = wutokenhelper::fetch_windows_update_token(config);

    unsafe { CoUninitialize() };

    match result {
        Ok(token) => {
            println!("{}", token.as_str());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Token fetch failed: {}", e);
            eprintln!("{}", e.user_message());
            if e.requires_sign_in() {
                eprintln!("Add a Microsoft account under Settings > Accounts > Email & accounts.");
            }
            eprintln!("Status: 0x{:08X}", e.status_code());
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(windows))]
fn run(_config: &Config) -> ExitCode {
    error!("The Windows identity broker is not available on this platform");
    eprintln!("wu-token only runs on Windows.");
    ExitCode::FAILURE
}
