use clap::{Parser, ValueEnum};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Storage {
    Postgres,
    Memory,
}

#[derive(Parser, Clone, Debug)]
#[command(about = "Visit reservation service for the shelter")]
pub struct Config {
    #[clap(env, long, default_value = "development")]
    pub environment: String,
    #[clap(env, long, default_value = "127.0.0.1")]
    pub host: String,
    #[clap(env, long, default_value_t = 8080)]
    pub port: u16,
    /// Comma separated list of origins allowed by CORS
    #[clap(env, long, default_value = "http://localhost:5173")]
    pub origin_urls: String,
    #[clap(env, long, value_enum, default_value_t = Storage::Postgres)]
    pub storage: Storage,
    #[clap(env, long, required_if_eq("storage", "postgres"))]
    pub database_url: Option<String>,
    #[clap(env, long, default_value_t = default_pool_size())]
    pub pool_size: u32,
}

fn default_pool_size() -> u32 {
    (num_cpus::get() * 4) as u32
}
