use anyhow::{Context, Result, bail};
use clap::Parser;
use reqwest::Method;
use reqwest::cookie::Jar;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use washdesk::cookies::JarCookies;
use washdesk::notify::{ConsoleNotifier, LogNotifier, Notifier};
use washdesk::{ApiRequest, ClientConfig, SessionClient};

/// washdesk - car wash back-office API client
///
/// Sends requests to the operations backend, attaching the CSRF token to
/// state-changing calls and renewing the session when the backend asks for it.
///
/// Examples:
///   washdesk --api-url https://api.example.com request GET /report/9
///   washdesk request POST /order --data '{"wash": 2}'
#[derive(Parser, Debug)]
#[command(author, version = env!("WASHDESK_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL (also via WASHDESK_API_URL)
    #[arg(long = "api-url", env = "WASHDESK_API_URL", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// JSON message catalog for error notifications (also via WASHDESK_MESSAGES)
    #[arg(long, env = "WASHDESK_MESSAGES", value_name = "PATH", global = true)]
    pub messages: Option<PathBuf>,

    /// Initial CSRF token, as if the csrf-token cookie were already set
    #[arg(long = "csrf-token", value_name = "TOKEN", global = true)]
    pub csrf_token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    /// Emit structured request/response events to stderr and log notifications
    #[arg(long, global = true)]
    pub trace: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Send one request and print the response body
    Request(RequestArgs),

    /// Fetch a fresh CSRF token and print it
    Csrf,
}

#[derive(clap::Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE, ...)
    #[arg(value_name = "METHOD")]
    pub method: String,

    /// Path relative to the API base URL
    #[arg(value_name = "PATH")]
    pub path: String,

    /// JSON request body
    #[arg(long, short = 'd', value_name = "JSON")]
    pub data: Option<String>,
}

fn init_logging(trace: bool) {
    if trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("washdesk=info")),
            )
            .with_writer(std::io::stderr)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }
}

fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let Some(api_url) = &cli.api_url else {
        bail!("No API URL given. Use --api-url or set WASHDESK_API_URL.");
    };

    let mut config = ClientConfig::new(api_url.as_str());
    if let Some(messages) = &cli.messages {
        config = config.with_messages(messages);
    }
    if let Some(seconds) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(seconds));
    }
    Ok(config)
}

fn build_request(args: &RequestArgs) -> Result<ApiRequest> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method: {}", args.method))?;

    let mut request = ApiRequest::new(method, args.path.as_str());
    if let Some(data) = &args.data {
        let body = serde_json::from_str(data).context("--data is not valid JSON")?;
        request = request.with_json(body);
    }
    Ok(request)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.trace);

    let config = build_config(&cli)?;
    let base_url = config.validate()?;
    let jar = Arc::new(Jar::default());
    if let Some(token) = &cli.csrf_token {
        JarCookies::new(Arc::clone(&jar), base_url).set(&config.csrf_cookie, token);
    }

    let notifier: Arc<dyn Notifier> = if cli.trace {
        Arc::new(LogNotifier)
    } else {
        Arc::new(ConsoleNotifier)
    };

    let client = SessionClient::builder(config, notifier)
        .cookie_jar(jar)
        .build()?;

    match cli.command {
        Commands::Request(args) => {
            let request = build_request(&args)?;
            let response = client.execute(request).await?;
            println!("{}", response.text());
        }
        Commands::Csrf => match client.fetch_csrf_token().await? {
            Some(token) => println!("{}", token),
            None => bail!("The backend did not set a {} cookie", client.config().csrf_cookie),
        },
    }
    Ok(())
}
