use job_board_cli::run;

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("application error: {err}");
            1
        }
    };
    // A pending stdin read from `offers watch` would otherwise hold the runtime open.
    std::process::exit(code);
}
