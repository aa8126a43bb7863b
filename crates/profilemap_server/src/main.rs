//! Server entry point.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match profilemap_server::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=server_start module=server status=error error={err}");
            eprintln!("profilemap: {err}");
            ExitCode::FAILURE
        }
    }
}
