//! `booker`: terminal frontend for the resource booking API.
//!
//! # Usage
//!
//! ```
//! booker --url http://localhost:8080 --token $TOKEN resource create
//! booker --config ~/.config/booker/config.toml resource edit 42
//! booker resource list --page 2
//! booker types create --name "Meeting Room" --schema '{"capacity":"number"}'
//! ```

mod app;
mod client;
mod ui;

use std::{
  fs::File,
  io::{self, Write as _},
  path::{Path, PathBuf},
  sync::{Arc, Mutex},
  time::Duration,
};

use anyhow::{Context, Result, anyhow, bail};
use app::App;
use booker_core::{
  api::ResourceApi,
  controller::ResourceFormController,
  envelope::{Envelope, RESOURCE_KEYS, RESOURCE_TYPE_KEYS, RESOURCE_TYPES_KEYS, RESOURCES_KEYS},
  form::FormMode,
  resource::{Resource, ResourceType},
  schema::validate_type_draft,
  session::{Role, SessionContext, StaticSession},
};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:8080";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "booker", about = "Terminal frontend for the resource booking API")]
struct Args {
  /// Path to a TOML config file (url, token, role).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the booking server (default: http://localhost:8080).
  #[arg(long, env = "BOOKER_URL")]
  url: Option<String>,

  /// Bearer token obtained at login.
  #[arg(long, env = "BOOKER_TOKEN")]
  token: Option<String>,

  /// Role of the logged-in user (`admin` or `user`).
  #[arg(long, env = "BOOKER_ROLE")]
  role: Option<Role>,

  /// Write logs of interactive sessions to this file.
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create or edit a resource.
  #[command(subcommand)]
  Resource(ResourceCommand),

  /// List or create resource types.
  #[command(subcommand)]
  Types(TypesCommand),
}

#[derive(Subcommand, Debug)]
enum ResourceCommand {
  /// Open the form for a new resource.
  Create,
  /// Open the form for an existing resource.
  Edit { id: i64 },
  /// Print one page of resources.
  List {
    #[arg(long, default_value_t = 1)]
    page:  u32,
    #[arg(long, default_value_t = 10)]
    limit: u32,
  },
  /// Delete a resource.
  Delete {
    id:  i64,
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes: bool,
  },
}

#[derive(Subcommand, Debug)]
enum TypesCommand {
  /// Print every resource type with its schema.
  List,
  /// Validate and create a resource type.
  Create {
    #[arg(long)]
    name:   String,
    /// JSON object mapping property names to kinds.
    #[arg(long)]
    schema: String,
  },
  /// Delete a resource type.
  Delete {
    id:  i64,
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes: bool,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional config file and `BOOKER_*` environment.
#[derive(Deserialize, Default)]
struct Settings {
  #[serde(default)]
  url:   Option<String>,
  #[serde(default)]
  token: Option<String>,
  #[serde(default)]
  role:  Option<Role>,
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
  let mut builder = config::Config::builder();
  if let Some(path) = path {
    builder = builder.add_source(config::File::from(path));
  }
  builder
    .add_source(config::Environment::with_prefix("BOOKER"))
    .build()
    .context("failed to read config")?
    .try_deserialize()
    .context("failed to deserialise config")
}

// ─── Logging ──────────────────────────────────────────────────────────────────

/// Interactive sessions own the terminal, so they log only to `log_file`.
fn init_tracing(interactive: bool, log_file: Option<&Path>) -> Result<()> {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();

  match (interactive, log_file) {
    (false, _) => tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_writer(io::stderr)
      .init(),
    (true, Some(path)) => {
      let file = File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    }
    (true, None) => {}
  }
  Ok(())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let interactive = matches!(
    args.command,
    Command::Resource(ResourceCommand::Create | ResourceCommand::Edit { .. })
  );
  init_tracing(interactive, args.log_file.as_deref())?;

  let settings = load_settings(args.config.as_deref())?;

  // CLI flags override config file and environment, which override defaults.
  let session = StaticSession::new(args.token.or(settings.token), args.role.or(settings.role));
  let api_config = ApiConfig {
    base_url: args
      .url
      .or(settings.url)
      .filter(|url| !url.trim().is_empty())
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
  };
  tracing::debug!(base_url = %api_config.base_url, "using booking API");
  let client = Arc::new(ApiClient::new(api_config, Arc::new(session))?);

  match args.command {
    Command::Resource(ResourceCommand::Create) => {
      require_admin(&client)?;
      run_tui(ResourceFormController::for_create(client)).await
    }
    Command::Resource(ResourceCommand::Edit { id }) => {
      require_admin(&client)?;
      let resource = fetch_resource(&client, id).await?;
      run_tui(ResourceFormController::for_edit(client, resource)).await
    }
    Command::Resource(ResourceCommand::List { page, limit }) => {
      list_resources(&client, page, limit).await
    }
    Command::Resource(ResourceCommand::Delete { id, yes }) => {
      require_admin(&client)?;
      if yes || confirm(&format!("Delete resource {id}?"))? {
        delete_resource(&client, id).await?;
      }
      Ok(())
    }
    Command::Types(TypesCommand::List) => list_types(&client).await,
    Command::Types(TypesCommand::Create { name, schema }) => {
      require_admin(&client)?;
      create_type(&client, &name, &schema).await
    }
    Command::Types(TypesCommand::Delete { id, yes }) => {
      require_admin(&client)?;
      if yes || confirm(&format!("Delete resource type {id}? This cannot be undone."))? {
        delete_type(&client, id).await?;
      }
      Ok(())
    }
  }
}

fn require_admin(client: &ApiClient) -> Result<()> {
  if !client.session().may_administer() {
    bail!("this action requires the admin role");
  }
  Ok(())
}

/// Ask a yes/no question on the terminal; anything but `y`/`yes` is no.
fn confirm(question: &str) -> Result<bool> {
  print!("{question} [y/N] ");
  io::stdout().flush().context("flushing stdout")?;
  let mut answer = String::new();
  io::stdin()
    .read_line(&mut answer)
    .context("reading confirmation")?;
  let answer = answer.trim();
  Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

// ─── Subcommands ──────────────────────────────────────────────────────────────

async fn fetch_resource(client: &ApiClient, id: i64) -> Result<Resource> {
  let body = client
    .get_resource(id)
    .await
    .map_err(|e| anyhow!(e.user_message("Failed to load resource")))?;
  Envelope::<Resource>::decode(body, RESOURCE_KEYS)
    .map(Envelope::into_inner)
    .with_context(|| format!("resource {id} not found"))
}

async fn list_resources(client: &ApiClient, page: u32, limit: u32) -> Result<()> {
  let body = client
    .list_resources(page, limit)
    .await
    .map_err(|e| anyhow!(e.user_message("Failed to load resources")))?;
  let resources = Envelope::<Vec<Resource>>::decode(body, RESOURCES_KEYS)
    .map(Envelope::into_inner)
    .unwrap_or_default();

  if resources.is_empty() {
    println!("No resources on page {page}.");
  }
  for resource in &resources {
    let status = if resource.is_active { "active" } else { "inactive" };
    println!(
      "{:>5}  {:<24}  type {:<4}  {:<20}  {status}",
      resource.id, resource.name, resource.type_id, resource.location
    );
  }
  Ok(())
}

async fn delete_resource(client: &ApiClient, id: i64) -> Result<()> {
  client
    .delete_resource(id)
    .await
    .map_err(|e| anyhow!(e.user_message("Failed to delete resource")))?;
  println!("Deleted resource {id}.");
  Ok(())
}

async fn list_types(client: &ApiClient) -> Result<()> {
  let body = client
    .list_resource_types()
    .await
    .map_err(|e| anyhow!(e.user_message("Failed to load resource types")))?;
  let types = Envelope::<Vec<ResourceType>>::decode(body, RESOURCE_TYPES_KEYS)
    .map(Envelope::into_inner)
    .unwrap_or_default();

  if types.is_empty() {
    println!("No resource types.");
  }
  for resource_type in &types {
    let schema = resource_type
      .schema()
      .iter()
      .map(|(key, kind)| format!("{key}: {kind}"))
      .collect::<Vec<_>>()
      .join(", ");
    println!(
      "{:>5}  {:<24}  {schema}",
      resource_type.id,
      resource_type.display_name()
    );
  }
  Ok(())
}

async fn create_type(client: &ApiClient, name: &str, schema: &str) -> Result<()> {
  let draft = match validate_type_draft(name, schema) {
    Ok(draft) => draft,
    Err(errors) => {
      let messages: Vec<_> = errors.into_values().collect();
      bail!(messages.join("; "));
    }
  };

  let body = client
    .create_resource_type(&draft)
    .await
    .map_err(|e| anyhow!(e.user_message("Failed to create resource type")))?;

  match Envelope::<ResourceType>::decode(body, RESOURCE_TYPE_KEYS) {
    Some(created) => println!(
      "Created resource type {} (id {}).",
      draft.type_name,
      created.into_inner().id
    ),
    None => println!("Created resource type {}.", draft.type_name),
  }
  Ok(())
}

async fn delete_type(client: &ApiClient, id: i64) -> Result<()> {
  client
    .delete_resource_type(id)
    .await
    .map_err(|e| anyhow!(e.user_message("Failed to delete resource type")))?;
  println!("Deleted resource type {id}.");
  Ok(())
}

// ─── Terminal UI ──────────────────────────────────────────────────────────────

async fn run_tui(form: ResourceFormController<ApiClient>) -> Result<()> {
  let mode = form.mode();
  let mut app = App::new(form);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  app.load().await;

  // Run the event loop; restore terminal even on error.
  let run_result = run_event_loop(&mut terminal, &mut app).await;

  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result?;

  if app.saved.is_some() {
    let verb = match mode {
      FormMode::Create => "created",
      FormMode::Edit { .. } => "updated",
    };
    println!("Resource {} {verb} successfully.", app.form.draft.name.trim());
  }
  Ok(())
}

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    app.drain_events();
    if app.saved.is_some() {
      break;
    }

    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event {
      if !app.handle_key(key) {
        break;
      }
    }
  }

  Ok(())
}
