//! CLI configuration

#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the build server
    pub server_url: String,
}
