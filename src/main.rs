use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use invoice_studio::{Config, Database, Profile, cli::Cli};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    // Logs go to stderr; RUST_LOG overrides the default level
    env_logger::init_from_env(Env::default().default_filter_or("warn"));

    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev {
        Profile::Dev
    } else {
        Profile::Prod
    };

    // An explicit --config file wins over the profile's config
    let config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from(&invoice_studio::utils::expand_path(path))?;
            if config.database_path.trim().is_empty() {
                config.database_path = Config::load_with_profile(profile)?.database_path;
            }
            config
        }
        None => Config::load_with_profile(profile)?,
    };

    // Initialize database
    let db_path = config.get_database_path();
    let db = Database::new(
        db_path
            .to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?,
    )?;
    log::debug!("Using storage at {:?} ({:?} profile)", db_path, profile);

    let output = invoice_studio::cli::run(cli.command, &db, &config)?;
    if !output.is_empty() {
        println!("{}", output);
    }

    Ok(())
}
