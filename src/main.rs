use clap::Parser;
use reqwest::Client;
use tracing::{error, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sgctl::config::{self, AuthTransport, OutputFormat};
use sgctl::search::{search_graph, SearchConfig};
use sgctl::{auth, format};

const DEFAULT_CSV_HEADERS: &str =
    "id,name,kind,/ancestors.cloud.reported.id,/ancestors.account.reported.id,/ancestors.region.reported.id";

/// sgctl searches the SentriGraph security graph and exports cloud
/// inventory data for further processing.
#[derive(Parser, Debug)]
#[clap(name = "sgctl", version)]
struct CliArgs {
    /// API endpoint URL.
    #[clap(long, env = "SG_ENDPOINT", default_value = config::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Auth token.
    #[clap(long, env = "SG_TOKEN", default_value = "", hide_env_values = true)]
    token: String,

    /// Workspace ID.
    #[clap(long, env = "SG_WORKSPACE", default_value = "")]
    workspace: String,

    /// Username.
    #[clap(long, env = "SG_USERNAME", default_value = "")]
    username: String,

    /// Password.
    #[clap(long, env = "SG_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Search string.
    #[clap(long, default_value = "")]
    search: String,

    /// Output format.
    #[clap(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// CSV headers: comma-separated field paths, bare names resolve
    /// under /reported.
    #[clap(long, default_value = DEFAULT_CSV_HEADERS)]
    csv_headers: String,

    /// Include edges in search results.
    #[clap(long)]
    with_edges: bool,

    /// How the session token is sent with the search request.
    #[clap(long, value_enum, default_value_t = AuthTransport::Cookie)]
    auth_transport: AuthTransport,

    /// Enable verbose output.
    #[clap(long)]
    verbose: bool,
}

struct ValidatedArgs {
    endpoint: String,
    token: String,
    workspace: String,
    username: String,
    password: String,
    search: String,
    csv_headers: Vec<String>,
}

/// Validate every input before acting on any of them, so a user with
/// several mistakes sees them all at once.
fn validate(args: &CliArgs) -> Result<ValidatedArgs, ()> {
    let mut invalid = false;

    let credentials = config::sanitize_credentials(&args.username, &args.password)
        .map_err(|err| {
            error!("Invalid username or password: {err}");
            invalid = true;
        })
        .ok();
    let search = config::sanitize_search_string(&args.search)
        .map_err(|err| {
            error!("Invalid search string: {err}");
            invalid = true;
        })
        .ok();
    let endpoint = config::sanitize_api_endpoint(&args.endpoint)
        .map_err(|err| {
            error!("Invalid API endpoint: {err}");
            invalid = true;
        })
        .ok();
    let token = config::sanitize_token(&args.token)
        .map_err(|err| {
            error!("Invalid token: {err}");
            invalid = true;
        })
        .ok();
    let workspace = config::sanitize_workspace_id(&args.workspace)
        .map_err(|err| {
            error!("Invalid workspace ID: {err}");
            invalid = true;
        })
        .ok();
    let csv_headers = config::sanitize_csv_headers(&args.csv_headers)
        .map_err(|err| {
            error!("Invalid CSV headers: {err}");
            invalid = true;
        })
        .ok();

    if invalid {
        return Err(());
    }

    let (username, password) = credentials.unwrap();
    Ok(ValidatedArgs {
        endpoint: endpoint.unwrap(),
        token: token.unwrap(),
        workspace: workspace.unwrap(),
        username,
        password,
        search: search.unwrap(),
        csv_headers: csv_headers.unwrap(),
    })
}

async fn run(args: CliArgs) -> i32 {
    let validated = match validate(&args) {
        Ok(validated) => validated,
        Err(()) => return 1,
    };

    let client = match Client::builder().user_agent(config::user_agent()).build() {
        Ok(client) => client,
        Err(err) => {
            error!("Failed to build HTTP client: {err}");
            return 1;
        }
    };

    let session_token = if validated.token.is_empty() {
        if validated.username.is_empty() || validated.password.is_empty() {
            error!("Either token or username and password are required");
            return 1;
        }
        match auth::login_with_password(
            &client,
            &validated.endpoint,
            &validated.username,
            &validated.password,
        )
        .await
        {
            Ok(session_token) => session_token,
            Err(err) => {
                error!("Login error: {err}");
                return 1;
            }
        }
    } else {
        match auth::login_with_access_token(&client, &validated.endpoint, &validated.token).await {
            Ok(session_token) => session_token,
            Err(err) => {
                error!("Login error: {err}");
                return 1;
            }
        }
    };

    let search_config = SearchConfig {
        endpoint: validated.endpoint,
        workspace_id: validated.workspace,
        session_token,
        auth_transport: args.auth_transport,
    };
    let mut stream = search_graph(client, search_config, validated.search, args.with_edges);

    let mut first_record = true;
    while let Some(record) = stream.next_record().await {
        let output = match args.format {
            OutputFormat::Yaml => {
                let separator = if first_record { "" } else { "---\n" };
                format::to_yaml(&record).map(|yaml| format!("{separator}{yaml}"))
            }
            OutputFormat::Csv => format::to_csv(&record, &validated.csv_headers),
            OutputFormat::Json => format::to_json(&record),
        };
        first_record = false;

        match output {
            Ok(output) => print!("{output}"),
            Err(err) => {
                error!("Error formatting output: {err}");
                return 2;
            }
        }
    }

    if let Err(err) = stream.finish().await {
        error!("Search error: {err}");
        return 1;
    }

    0
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let default_level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .init();

    let exit_code = run(args).await;
    std::process::exit(exit_code);
}
