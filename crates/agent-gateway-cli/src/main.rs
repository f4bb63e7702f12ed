//! Agent Gateway CLI, the `agw` command.
//!
//! Registers agents, logs them in for bearer tokens, and checks tokens
//! against scope requirements, over a file-backed store.

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use agent_gateway::time::{micros_to_rfc3339, secs_to_rfc3339};
use agent_gateway::{
    AgentId, AgentProfile, FileStore, Gateway, GatewayConfig, GatewayError, RegisterRequest,
    ScopePolicy,
};

// ── Password helper ───────────────────────────────────────────────────────────

/// Read one line from stdin. The prompt goes to stderr so that piped
/// output stays clean.
fn read_password(prompt: &str) -> Result<String> {
    eprint!("{prompt}");
    let mut password = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut password)
        .context("failed to read password")?;
    let password = password.trim_end_matches(&['\r', '\n'][..]).to_string();
    if password.is_empty() {
        return Err(anyhow!("password cannot be empty"));
    }
    Ok(password)
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// Agent Gateway CLI: credentials and scoped tokens for AI agents.
#[derive(Parser, Debug)]
#[command(
    name = "agw",
    about = "Agent Gateway CLI",
    version,
    long_about = "agw: Agent Gateway CLI\n\nRegister agents, issue bearer tokens, and check tokens against\nscope requirements. The signing secret is read from SECRET_KEY."
)]
struct Cli {
    /// JSON config file (defaults to environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides AGENT_GATEWAY_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a new agent (password read from stdin)
    Register {
        /// Unique agent name
        #[arg(long)]
        name: String,

        /// Scope to grant; repeat for several (default: read)
        #[arg(long = "scope")]
        scopes: Vec<String>,

        /// Free-form description
        #[arg(long)]
        description: Option<String>,
    },

    /// Log in and print an access token as JSON (password read from stdin)
    Login {
        #[arg(long)]
        name: String,
    },

    /// Show the agent a token belongs to
    Whoami {
        #[arg(long, env = "AGW_TOKEN")]
        token: String,
    },

    /// Check a token against required scopes
    Check {
        #[arg(long, env = "AGW_TOKEN")]
        token: String,

        /// Required scope; repeat for several
        #[arg(long = "require")]
        required: Vec<String>,
    },

    /// Deactivate an agent
    Deactivate {
        #[arg(long)]
        id: String,
    },

    /// Reactivate an agent
    Activate {
        #[arg(long)]
        id: String,
    },

    /// List all agents
    List,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let verbose = cli.verbose;

    let result = open_gateway(cli.config.as_deref(), cli.data_dir).and_then(|gateway| {
        match cli.command {
            Commands::Register {
                name,
                scopes,
                description,
            } => cmd_register(&gateway, name, scopes, description, verbose),
            Commands::Login { name } => cmd_login(&gateway, &name),
            Commands::Whoami { token } => cmd_whoami(&gateway, &token, verbose),
            Commands::Check { token, required } => cmd_check(&gateway, &token, required),
            Commands::Deactivate { id } => cmd_deactivate(&gateway, &id),
            Commands::Activate { id } => cmd_activate(&gateway, &id),
            Commands::List => cmd_list(&gateway, verbose),
        }
    });

    if let Err(e) = result {
        eprintln!("error: {}", public_message(&e));
        std::process::exit(1);
    }
}

/// What the user is shown for a failure. Gateway errors collapse to their
/// public outcome, so every authentication failure reads the same; the
/// detailed cause goes to the debug log. Fatal errors are shown in full.
fn public_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<GatewayError>() {
        Some(gateway_err) if !gateway_err.is_fatal() => {
            log::debug!("{err:#}");
            gateway_err.outcome().message().to_string()
        }
        _ => format!("{err:#}"),
    }
}

fn open_gateway(
    config_path: Option<&std::path::Path>,
    data_dir: Option<PathBuf>,
) -> Result<Gateway<FileStore>> {
    let mut config = match config_path {
        Some(path) => GatewayConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => GatewayConfig::from_env().context("failed to read configuration")?,
    };
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }

    let store_dir = config.data_dir.join("agents");
    log::debug!("using store at {}", store_dir.display());
    let store = FileStore::new(&store_dir)
        .with_context(|| format!("failed to open store at {}", store_dir.display()))?;

    Gateway::from_config(&config, store).context("invalid gateway configuration")
}

fn print_profile(profile: &AgentProfile, verbose: bool) {
    println!("Agent: {}", profile.name);
    println!("  ID:      {}", profile.id);
    println!("  Scopes:  {}", join_scopes(profile.scopes.iter()));
    println!("  Active:  {}", if profile.active { "yes" } else { "no" });
    if let Some(ref description) = profile.description {
        println!("  About:   {description}");
    }
    if verbose {
        println!("  Created: {}", micros_to_rfc3339(profile.created_at));
        match profile.last_auth_at {
            Some(at) => println!("  Last login: {}", micros_to_rfc3339(at)),
            None => println!("  Last login: never"),
        }
    }
}

fn join_scopes<'a>(scopes: impl Iterator<Item = &'a String>) -> String {
    let joined = scopes.map(String::as_str).collect::<Vec<_>>().join(",");
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}

// ── Command implementations ───────────────────────────────────────────────────

/// `agw register --name NAME [--scope S]... [--description D]`
fn cmd_register(
    gateway: &Gateway<FileStore>,
    name: String,
    scopes: Vec<String>,
    description: Option<String>,
    verbose: bool,
) -> Result<()> {
    let password = read_password("Password for new agent: ")?;

    let mut request = RegisterRequest::new(name, password);
    if !scopes.is_empty() {
        request = request.with_scopes(scopes);
    }
    if let Some(description) = description {
        request = request.with_description(description);
    }

    let profile = gateway.register(request)?;
    println!("Registered agent '{}'", profile.name);
    print_profile(&profile, verbose);
    Ok(())
}

/// `agw login --name NAME`
fn cmd_login(gateway: &Gateway<FileStore>, name: &str) -> Result<()> {
    let password = read_password("Password: ")?;
    let token = gateway.login(name, &password)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&token).context("failed to encode token")?
    );
    Ok(())
}

/// `agw whoami --token TOKEN`
fn cmd_whoami(gateway: &Gateway<FileStore>, token: &str, verbose: bool) -> Result<()> {
    let agent = gateway.resolve_token(token)?;
    print_profile(&gateway.profile(&agent), verbose);
    println!("  Token scopes: {}", join_scopes(agent.scopes.iter()));

    if verbose {
        let claims = gateway
            .codec()
            .validate(token)
            .map_err(GatewayError::from)?;
        println!("  Issued:  {}", secs_to_rfc3339(claims.issued_at));
        println!("  Expires: {}", secs_to_rfc3339(claims.expiry));
        println!(
            "  Remaining: {}s",
            claims.remaining_at(agent_gateway::time::now_secs())
        );
    }
    Ok(())
}

/// `agw check --token TOKEN --require S...`
fn cmd_check(gateway: &Gateway<FileStore>, token: &str, required: Vec<String>) -> Result<()> {
    let agent = gateway.resolve_token(token)?;
    let policy = ScopePolicy::require(required);
    gateway.authorize(&agent, &policy)?;
    println!(
        "authorized: {} has {}",
        agent.profile.name,
        join_scopes(policy.required().iter())
    );
    Ok(())
}

/// `agw deactivate --id ID`
fn cmd_deactivate(gateway: &Gateway<FileStore>, id: &str) -> Result<()> {
    let id = AgentId::from(id);
    gateway.deactivate(&id)?;
    println!("Deactivated {id}");
    Ok(())
}

/// `agw activate --id ID`
fn cmd_activate(gateway: &Gateway<FileStore>, id: &str) -> Result<()> {
    let id = AgentId::from(id);
    gateway.reactivate(&id)?;
    println!("Activated {id}");
    Ok(())
}

/// `agw list`
fn cmd_list(gateway: &Gateway<FileStore>, verbose: bool) -> Result<()> {
    let agents = gateway.list()?;
    if agents.is_empty() {
        println!("No agents registered");
        return Ok(());
    }

    println!("{:<24} {:<30} {:<8} SCOPES", "NAME", "ID", "ACTIVE");
    println!("{}", "-".repeat(80));
    for agent in &agents {
        println!(
            "{:<24} {:<30} {:<8} {}",
            agent.name,
            agent.id,
            if agent.active { "yes" } else { "no" },
            join_scopes(agent.scopes.iter())
        );
        if verbose {
            println!("    created {}", micros_to_rfc3339(agent.created_at));
        }
    }
    Ok(())
}
