use clap::Parser;
use std::net::{IpAddr, SocketAddr};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Gamified investment platform API", long_about = None)]
pub struct Config {
    /// Interface to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(short, long, default_value_t = 6957)]
    pub port: u16,

    /// Accounts registered with this email get admin rights (repeatable)
    #[arg(long = "admin-email")]
    pub admin_emails: Vec<String>,

    /// Locked bonus credited to every new account
    #[arg(long, default_value_t = 5000)]
    pub signup_bonus: u64,

    /// Seed for reproducible game draws; entropy-seeded when omitted
    #[arg(long)]
    pub rng_seed: Option<u64>,
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim();
        self.admin_emails
            .iter()
            .any(|admin| admin.trim().eq_ignore_ascii_case(email))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 6957,
            admin_emails: Vec::new(),
            signup_bonus: 5000,
            rng_seed: None,
        }
    }
}
