use anyhow::Context;
use base64::Engine;
use clap::{Parser, Subcommand};
use doctor_lib::events::StreamEvent;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "doctor-agent")]
#[command(about = "AI Doctor Agent CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and default files (config, bundled skills, system prompt).
    Init {
        /// Config file path (default: DOCTOR_AGENT_CONFIG_PATH or ~/.doctor-agent/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the HTTP server (/health, /skills, /chat).
    Serve {
        /// Config file path (default: DOCTOR_AGENT_CONFIG_PATH or ~/.doctor-agent/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from config or 8000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Send a message to a running server and print the event stream. Interactive when no message is given.
    Chat {
        /// Config file path (default: DOCTOR_AGENT_CONFIG_PATH or ~/.doctor-agent/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Message to send; omit for an interactive prompt.
        #[arg(long, short)]
        message: Option<String>,

        /// Patient id sent with every message.
        #[arg(long, default_value = doctor_lib::gateway::DEFAULT_PATIENT_ID)]
        patient: String,

        /// Image file attached to the (first) message.
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Only the server writes log files; other commands log to stderr.
    let log_dir = match &cli.command {
        Some(Commands::Serve { config, .. }) => doctor_lib::config::load_config(config.clone())
            .ok()
            .and_then(|(c, path)| doctor_lib::config::resolve_log_dir(&c, &path)),
        _ => None,
    };
    if let Err(e) = doctor_lib::logging::init(log_dir.as_deref()) {
        eprintln!("logging setup failed: {:#}", e);
        std::process::exit(1);
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("doctor-agent {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("server failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat {
            config,
            message,
            patient,
            image,
        }) => {
            if let Err(e) = run_chat(config, message, patient, image).await {
                log::error!("chat failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(doctor_lib::config::default_config_path);
    let dir = doctor_lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_serve(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let (mut config, path) = doctor_lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!("starting server on {}:{}", config.gateway.bind, config.gateway.port);
    doctor_lib::gateway::run_gateway(config, path).await
}

/// `data:` URL for an image file; the mime type follows the extension, defaulting to JPEG.
fn image_data_url(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("reading image {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let mime = match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    };
    Ok(format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    ))
}

async fn run_chat(
    config_path: Option<PathBuf>,
    message: Option<String>,
    patient: String,
    image: Option<PathBuf>,
) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let (config, _) = doctor_lib::config::load_config(config_path)?;
    let url = format!("http://{}:{}/chat", config.gateway.bind.trim(), config.gateway.port);
    let client = reqwest::Client::new();
    let mut image = image.as_deref().map(image_data_url).transpose()?;

    if let Some(message) = message {
        return send_and_print(&client, &url, &message, &patient, image).await;
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }
        if let Err(e) = send_and_print(&client, &url, input, &patient, image.take()).await {
            eprintln!("chat error: {:#}", e);
        }
    }
    Ok(())
}

/// Post one message and print each event line as it arrives.
async fn send_and_print(
    client: &reqwest::Client,
    url: &str,
    message: &str,
    patient: &str,
    image: Option<String>,
) -> anyhow::Result<()> {
    let mut body = serde_json::json!({ "message": message, "patientId": patient });
    if let Some(img) = image {
        body["image"] = serde_json::Value::String(img);
    }
    let resp = client
        .post(url)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("posting to {}", url))?;
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        anyhow::bail!("server returned {}: {}", status, text);
    }

    let mut stream = resp.bytes_stream();
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk.context("reading event stream")?);
        while let Some(pos) = buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = buf.drain(..=pos).collect();
            print_event(&String::from_utf8_lossy(&line));
        }
    }
    if !buf.is_empty() {
        print_event(&String::from_utf8_lossy(&buf));
    }
    Ok(())
}

fn print_event(line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    match serde_json::from_str::<StreamEvent>(line) {
        Ok(StreamEvent::Log(l)) => match l.description {
            Some(d) => println!("[{}] {} ({})", l.step, l.message, d),
            None => println!("[{}] {}", l.step, l.message),
        },
        Ok(StreamEvent::Response(r)) => println!("\n{}\n", r.content.trim()),
        Err(e) => log::warn!("unparsable event line ({}): {}", e, line),
    }
}
