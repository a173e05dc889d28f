//! Command dispatch

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::generate;
use serde_json::ser::{CompactFormatter, PrettyFormatter};
use tracing::{debug, instrument};

use crate::application::ForestService;
use crate::cli::args::{Cli, Commands, ConfigCommands, OutputFormat};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings, LOCAL_CONFIG_FILE};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::workbook::CalamineOpener;
use crate::infrastructure::InfraError;
use crate::server;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Serve {
            host,
            port,
            static_dir,
            upload_dir,
        }) => {
            let overrides = ServeOverrides {
                host: host.clone(),
                port: *port,
                static_dir: static_dir.clone(),
                upload_dir: upload_dir.clone(),
            };
            cmd_serve(cli.config.as_deref(), overrides)
        }
        Some(Commands::Parse {
            file,
            format,
            compact,
        }) => cmd_parse(cli.config.as_deref(), file, *format, *compact),
        Some(Commands::Config { command }) => cmd_config(cli.config.as_deref(), command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, run with --help for usage".into(),
        )),
    }
}

/// `serve` flags that override loaded settings.
#[derive(Debug, Default)]
struct ServeOverrides {
    host: Option<String>,
    port: Option<u16>,
    static_dir: Option<PathBuf>,
    upload_dir: Option<PathBuf>,
}

impl ServeOverrides {
    fn apply(self, settings: &mut Settings) {
        if let Some(host) = self.host {
            settings.server.host = host;
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(dir) = self.static_dir {
            settings.server.static_dir = dir;
        }
        if let Some(dir) = self.upload_dir {
            settings.upload.dir = dir;
        }
    }
}

#[instrument]
fn cmd_serve(config: Option<&Path>, overrides: ServeOverrides) -> CliResult<()> {
    let mut settings = Settings::load(config)?;
    overrides.apply(&mut settings);
    settings.validate()?;
    debug!("effective settings: {:?}", settings);

    if !settings.server.static_dir.is_dir() {
        output::warning(&format!(
            "static directory {} does not exist, only /upload and /health are served",
            settings.server.static_dir.display()
        ));
    }

    let container = Arc::new(ServiceContainer::new(settings));
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| InfraError::io("start async runtime", e))?;

    runtime.block_on(run_server(container))?;
    Ok(())
}

async fn run_server(container: Arc<ServiceContainer>) -> Result<(), InfraError> {
    let listener = server::bind(&container).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| InfraError::io("read listener address", e))?;
    output::success(&format!("Server running on http://{}", addr));
    server::serve(listener, container).await
}

#[instrument]
fn cmd_parse(
    config: Option<&Path>,
    file: &Path,
    format: OutputFormat,
    compact: bool,
) -> CliResult<()> {
    if !file.is_file() {
        return Err(CliError::InvalidArgs(format!(
            "workbook not found: {}",
            file.display()
        )));
    }
    let settings = Settings::load(config)?;
    let forest = ForestService::new(Arc::new(CalamineOpener))
        .with_limits(settings.forest.limits())
        .build_from_path(file)?;

    match format {
        OutputFormat::Json => {
            let mut stdout = io::stdout().lock();
            let written = if compact {
                forest.write_json(&mut stdout, &mut CompactFormatter)
            } else {
                forest.write_json(&mut stdout, &mut PrettyFormatter::new())
            };
            written.map_err(|e| CliError::Output(e.to_string()))?;
            writeln!(stdout).map_err(|e| CliError::Output(e.to_string()))?;
        }
        OutputFormat::Tree => {
            if forest.is_empty() {
                output::warning("workbook has no root objects");
            }
            for tree in forest.to_termtree() {
                output::info(&tree);
            }
        }
    }
    Ok(())
}

fn cmd_config(config: Option<&Path>, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(config)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &describe_path(&path)),
                None => output::action("global", &"unavailable (no home directory)"),
            }
            let local = config
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));
            output::action("local", &describe_path(&local));
            output::detail(&"environment: BOGRAPH_<SECTION>__<KEY>, e.g. BOGRAPH_SERVER__PORT");
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}

fn describe_path(path: &Path) -> String {
    let state = if path.exists() { "exists" } else { "not found" };
    format!("{} ({})", path.display(), state)
}
