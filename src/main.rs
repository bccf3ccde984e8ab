use ferraco_whatsapp::cli::{parse_args, version_line, CliCommand, RunOptions, USAGE};
use ferraco_whatsapp::domain::{connection_status_category, ConnectionEvent, ConnectionState};
use ferraco_whatsapp::session::{SessionCallbacks, WhatsAppSession};
use ferraco_whatsapp::websocket::WsClientConfig;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    color_eyre::install()?;

    let command = parse_args(std::env::args())?;

    let options = match command {
        CliCommand::Version => {
            println!("{}", version_line());
            return Ok(());
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        CliCommand::Run(options) => options,
    };

    // stdout carries state lines only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = WsClientConfig::from_env().wrap_err("invalid FERRACO_WS_* environment")?;
    if let Some(url) = &options.url {
        config.url = url.clone();
        config.validate()?;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(watch(config, options))
}

/// Connect, drive the session and print state changes until Ctrl-C.
async fn watch(config: WsClientConfig, options: RunOptions) -> Result<()> {
    info!(url = %config.url, "Connecting to WhatsApp event stream");

    let callbacks = SessionCallbacks::new()
        .on_qr(|qr| info!(attempt = qr.attempt, "QR code received"))
        .on_ready(|account| info!(phone = %account.phone, name = %account.name, "WhatsApp ready"))
        .on_error(|message| info!(%message, "Bridge reported an error"))
        .on_message(|m| {
            info!(conversation_id = %m.conversation_id, from_me = m.from_me, "New message")
        });

    let session = WhatsAppSession::connect(config, callbacks)
        .await
        .wrap_err("failed to connect to the WhatsApp event stream")?;

    let mut state_rx = session.state_receiver();
    session.dispatch(ConnectionEvent::Initialize);

    for conversation_id in &options.subscribe {
        session.subscribe_to_conversation(conversation_id).await;
    }

    print_state(&state_rx.borrow_and_update(), options.json)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result?;
                info!("Interrupted, closing session");
                break;
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                print_state(&state, options.json)?;
            }
        }
    }

    session.shutdown();
    Ok(())
}

fn print_state(state: &ConnectionState, json: bool) -> Result<()> {
    let category = connection_status_category(state);
    if json {
        let line = serde_json::json!({
            "at": chrono::Utc::now(),
            "category": category,
            "state": state,
        });
        println!("{}", serde_json::to_string(&line)?);
    } else {
        println!(
            "{} [{}] {}",
            chrono::Local::now().format("%H:%M:%S"),
            category,
            state
        );
    }
    Ok(())
}
