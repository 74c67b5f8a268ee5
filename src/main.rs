use std::{io, path::PathBuf, sync::Mutex};

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use color_eyre::eyre::{Result, WrapErr};
use miette::{Diagnostic, GraphicalReportHandler};
use mktask::{
	Conduit, EditSession, ResolveError, Resolver, SourceText, TEMPLATE,
	config::{APP_NAME, Settings, Transport},
	conduit, parse,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Open a task template in $EDITOR and create the task in Maniphest.
///
/// The template has the sections Title, Description, Owner, CC, Projects, Priority and Points. Users are referenced as
/// `@name` and projects as `#name`; the prefix may be left out. Sections left empty are not sent.
#[derive(Parser)]
#[command(author, version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"), about)]
struct Cli {
	/// Config file to use instead of $XDG_CONFIG_HOME/mktask/config.toml
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Read a filled-in template from this file instead of opening the editor
	#[arg(short, long)]
	file: Option<PathBuf>,

	/// Resolve references and print the payload, but don't create the task
	#[arg(short = 'n', long)]
	dry_run: bool,

	/// How to reach Conduit (overrides `conduit.transport`)
	#[arg(long, value_enum)]
	transport: Option<Transport>,

	/// Print shell completions and exit
	#[arg(long, value_name = "SHELL")]
	completions: Option<Shell>,

	/// Extra arguments for `arc call-conduit`, e.g. `-- --conduit-uri https://phab.example.com`
	#[arg(last = true)]
	arc_args: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	let cli = Cli::parse();

	if let Some(shell) = cli.completions {
		clap_complete::generate(shell, &mut Cli::command(), APP_NAME, &mut io::stdout());
		return Ok(());
	}

	init_tracing()?;

	match run(cli).await {
		Err(report) => match report.downcast_ref::<ResolveError>().and_then(|e| render_diagnostic(e)) {
			Some(rendered) => {
				eprintln!("{rendered}");
				std::process::exit(1);
			}
			None => Err(report),
		},
		ok => ok,
	}
}

async fn run(cli: Cli) -> Result<()> {
	let settings = Settings::load(cli.config.as_deref()).wrap_err("failed to load configuration")?;
	let transport = cli.transport.unwrap_or(settings.conduit.transport);
	let conduit = conduit::create_conduit(&settings.conduit, transport, cli.arc_args).wrap_err("failed to set up the conduit transport")?;

	if let Some(path) = &cli.file {
		let content = std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))?;
		let source = SourceText::new(path.display().to_string(), content);
		return submit(conduit.as_ref(), &source, cli.dry_run).await;
	}

	let session = EditSession::from_env(&settings.editor).suffix(settings.file_suffix);
	let edited = session.edit(TEMPLATE).await.wrap_err("editing session failed")?;
	let source = SourceText::new(edited.path().display().to_string(), edited.text.clone());

	let result = submit(conduit.as_ref(), &source, cli.dry_run).await;
	if result.is_err() {
		match edited.keep() {
			Ok(path) => eprintln!("Your task text was kept at {}", path.display()),
			Err(e) => tracing::warn!(error = %e, "failed to keep the edited task"),
		}
	}
	result
}

async fn submit(conduit: &dyn Conduit, source: &SourceText, dry_run: bool) -> Result<()> {
	let fields = parse(&source.content);
	tracing::debug!(fields = fields.len(), "parsed template");

	let task = Resolver::new(conduit, source).task_spec(&fields).await?;
	if task.is_empty() {
		eprintln!("Nothing filled in, no task created.");
		return Ok(());
	}
	if dry_run {
		println!("{}", serde_json::to_string_pretty(&task)?);
		return Ok(());
	}

	let created = conduit.create_task(&task).await.wrap_err("failed to create the task")?;
	println!("Task {} successfully created at {}", created.object_name, created.uri);
	Ok(())
}

fn render_diagnostic(diagnostic: &dyn Diagnostic) -> Option<String> {
	let mut out = String::new();
	GraphicalReportHandler::new().render_report(&mut out, diagnostic).ok()?;
	Some(out)
}

fn init_tracing() -> Result<()> {
	let directives = option_env!("LOG_DIRECTIVES").unwrap_or("mktask=info");
	let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(directives))?;

	let console = tracing_subscriber::fmt::layer().with_writer(io::stderr).with_target(false).without_time().compact();

	// JSON traces for tests and bug reports
	let trace_file = match std::env::var_os("MKTASK_TRACE_FILE") {
		Some(path) => Some(std::fs::File::create(&path).wrap_err("failed to create the trace file")?),
		None => None,
	};
	let json = trace_file.map(|file| tracing_subscriber::fmt::layer().json().with_writer(Mutex::new(file)));

	tracing_subscriber::registry().with(filter).with(console).with(json).try_init()?;
	Ok(())
}
