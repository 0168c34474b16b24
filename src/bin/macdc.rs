// src/bin/macdc.rs
//
// The control-plane client. No flags: it always binds macd.socket.client
// and connects to macd.socket.server in the current directory, per
// spec.md §4.7/§9.

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let stream = match macd::client::connect() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Connection Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = macd::client::run_session(stream).await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
