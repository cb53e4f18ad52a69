use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use entity::{Application, ApplicationStatus, Conversation, Message, Role, User, UserStatus};
use platform_authz::Collection;
use platform_db::{Actor, GuardedStore};
use platform_obs::{init_tracing, ObsConfig};
use tracing::info;

use server::{
    config::AppConfig,
    http::{self, AppState, ServeConfig},
    mail::Mailer,
};

#[derive(Parser, Debug)]
#[command(name = "concierge-server", version, about = "Concierge job-search service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API.
    Serve(ServeCommand),
    /// Mint a bearer token for local development.
    Token {
        #[arg(long)]
        uid: String,
        #[arg(long, help = "Override the configured token lifetime")]
        ttl_minutes: Option<i64>,
    },
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Seed the demo identities and fixtures at startup")]
    seed_demo: bool,
}

impl From<&ServeCommand> for ServeConfig {
    fn from(value: &ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(ObsConfig::default())?;
    let cli = Cli::parse();
    let app_config = Arc::new(AppConfig::load()?);
    match cli.command {
        Command::Serve(cmd) => run_server(cmd, app_config).await,
        Command::Token { uid, ttl_minutes } => mint_token(&uid, ttl_minutes, &app_config),
    }
}

async fn run_server(cmd: ServeCommand, config: Arc<AppConfig>) -> Result<()> {
    let store = Arc::new(GuardedStore::new());
    if cmd.seed_demo {
        seed_demo_data(&store)?;
        info!("demo fixtures seeded");
    }
    let mailer = config.mail.clone().map(Mailer::new);
    if mailer.is_none() {
        info!("mail not configured; notifications will be stored only");
    }
    let state = AppState {
        store,
        config: config.clone(),
        mailer,
    };
    http::serve((&cmd).into(), state).await
}

fn mint_token(uid: &str, ttl_minutes: Option<i64>, config: &AppConfig) -> Result<()> {
    let mut auth = config.auth.clone();
    if let Some(ttl) = ttl_minutes {
        auth.token_ttl_minutes = ttl;
    }
    let token = platform_authn::issue_token(uid, &auth)?;
    println!("{token}");
    Ok(())
}

/// The fixed identities the docs and smoke tests refer to, written through
/// the trusted path.
fn seed_demo_data(store: &GuardedStore) -> Result<()> {
    let service = Actor::Service;

    let mut admin = User::signup("admin_123", "admin@concierge.example", "Avery Admin");
    admin.role = Role::Admin;
    admin.status = UserStatus::Active;
    let mut staff = User::signup("staff_456", "staff@concierge.example", "Sam Staff");
    staff.role = Role::Staff;
    staff.status = UserStatus::Active;
    let mut client = User::signup("client_789", "client@concierge.example", "Casey Client");
    client.status = UserStatus::Waitlisted;
    client.assigned_staff_id = Some("staff_456".into());

    for user in [&admin, &staff, &client] {
        store.create(
            &service,
            Collection::Users,
            &user.id,
            serde_json::to_value(user)?,
        )?;
    }

    let application = Application {
        id: "app_123".into(),
        client_id: "client_789".into(),
        assigned_staff_id: Some("staff_456".into()),
        company: "ACME".into(),
        position: "Platform Engineer".into(),
        status: ApplicationStatus::Applied,
        notes: None,
        created_at: Utc::now(),
    };
    store.create(
        &service,
        Collection::Applications,
        &application.id,
        serde_json::to_value(&application)?,
    )?;

    let conversation = Conversation {
        id: "conv_1".into(),
        client_id: "client_789".into(),
        staff_id: "staff_456".into(),
        created_at: Utc::now(),
        last_message_at: Utc::now(),
    };
    store.create(
        &service,
        Collection::Conversations,
        &conversation.id,
        serde_json::to_value(&conversation)?,
    )?;

    let message = Message {
        id: "msg_123".into(),
        conversation_id: "conv_1".into(),
        sender_id: "staff_456".into(),
        recipient_id: "client_789".into(),
        content: "Welcome aboard! I will start applying this week.".into(),
        timestamp: Utc::now(),
        read: false,
    };
    store.create(
        &service,
        Collection::Messages,
        &message.id,
        serde_json::to_value(&message)?,
    )?;

    Ok(())
}
