use clap::Parser;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "gallery-gateway")]
#[command(about = "Presigned-URL photo gallery API")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Rate limit window in seconds, shared by all policies
    #[arg(long, default_value_t = 900)]
    pub rate_window: u64,

    // Generic API quota per window (listing, deletion)
    #[arg(long, default_value_t = 100)]
    pub api_limit: u32,

    // Upload URL quota per window, stricter than generic traffic
    #[arg(long, default_value_t = 50)]
    pub upload_limit: u32,

    // Download URL quota per window
    #[arg(long, default_value_t = 200)]
    pub download_limit: u32,

    // PIN verification quota per window, strictest of all
    #[arg(long, default_value_t = 10)]
    pub pin_limit: u32,

    // Key prefix all gallery objects live under
    #[arg(long, default_value = "uploads/")]
    pub upload_prefix: String,
}

/// Secrets and storage settings come from the environment, never the CLI.
/// Every field is optional at startup; a missing value surfaces as a 500 on
/// the endpoint that needs it, with the detail kept server-side.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub region: Option<String>,
    pub bucket: Option<String>,
    pub upload_pin: Option<String>,
    pub pin_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            region: env_var("AWS_REGION"),
            bucket: env_var("S3_BUCKET_NAME"),
            upload_pin: env_var("UPLOAD_PIN"),
            pin_secret: env_var("PIN_SECRET_KEY"),
        }
    }
}

// empty values count as unset
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
