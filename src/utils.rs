use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;
use uuid::Uuid;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    pub fn app_name(&self) -> &'static str {
        match self {
            Profile::Dev => "invoice-studio-dev",
            Profile::Prod => "invoice-studio",
        }
    }
}

/// Get the configuration directory path
/// If profile is Dev, uses "invoice-studio-dev" instead of "invoice-studio"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "invoice-studio", profile.app_name())
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path, where the storage database lives
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "invoice-studio", profile.app_name())
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// `n` pseudo-random decimal digits
pub fn random_digits(n: usize) -> String {
    let modulus = 10u128.pow(n as u32);
    let value = Uuid::new_v4().as_u128() % modulus;
    format!("{:0width$}", value, width = n)
}

/// Invoice number shown on a fresh draft, e.g. `INV-0427`
pub fn generate_invoice_number() -> String {
    format!("INV-{}", random_digits(4))
}

pub fn generate_invoice_id() -> String {
    format!("invoice_{}", Uuid::new_v4().simple())
}

pub fn generate_template_id() -> String {
    format!("template_{}", Uuid::new_v4().simple())
}

pub fn generate_section_id() -> String {
    format!("section-{}", Uuid::new_v4().simple())
}

/// Format a money amount with two decimals
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}
