use clap::Parser;

use crate::admin::DEFAULT_LIST_PER_PAGE;

const DEFAULT_DATABASE_URL: &str = "sqlite://./parsim.db?mode=rwc";

#[derive(Debug, Clone, Parser)]
#[command(name = "parsim")]
#[command(about = "Parsim Marketplace Server", long_about = None)]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, clap::Subcommand)]
pub enum Command {
    /// Start the marketplace server
    Serve(ServeConfig),

    /// Run database migrations
    Migrate {
        /// Database connection URL
        #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        database_url: String,
    },

    /// Create a new user
    CreateUser {
        /// Username
        #[arg(short, long)]
        username: String,

        /// Password
        #[arg(short, long)]
        password: String,

        /// Email address
        #[arg(short, long, default_value = "")]
        email: String,

        /// Allow the user into the admin site
        #[arg(long)]
        staff: bool,

        /// Grant every permission
        #[arg(long)]
        superuser: bool,

        /// Database connection URL
        #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        database_url: String,
    },

    /// List all users
    ListUsers {
        /// Database connection URL
        #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        database_url: String,
    },

    /// Delete a user
    DeleteUser {
        /// Username to delete
        #[arg(short, long)]
        username: String,

        /// Database connection URL
        #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        database_url: String,
    },
}

#[derive(Debug, Clone, Parser)]
pub struct ServeConfig {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Server bind address
    #[arg(long, env = "BIND_ADDRESS", default_value = "127.0.0.1:8080")]
    pub bind_address: String,

    /// Allowed CORS origins (comma-separated)
    #[arg(
        long,
        env = "CORS_ORIGINS",
        default_value = "http://localhost:3000,http://localhost:5173"
    )]
    pub cors_origins: String,

    /// Log level
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Rows per page on admin change lists
    #[arg(long, env = "ADMIN_LIST_PER_PAGE", default_value_t = DEFAULT_LIST_PER_PAGE)]
    pub list_per_page: u64,
}

impl ServeConfig {
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_origin_parsing() {
        let config = ServeConfig {
            database_url: "sqlite::memory:".to_string(),
            bind_address: "127.0.0.1:8080".to_string(),
            cors_origins: "http://localhost:3000, http://example.com,".to_string(),
            log_level: "info".to_string(),
            list_per_page: DEFAULT_LIST_PER_PAGE,
        };

        let origins = config.cors_origin_list();
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "http://localhost:3000");
        assert_eq!(origins[1], "http://example.com");
    }

    #[test]
    fn test_parse_create_user_flags() {
        let config = Config::try_parse_from([
            "parsim",
            "create-user",
            "--username",
            "admin",
            "--password",
            "correct-horse",
            "--staff",
            "--database-url",
            "sqlite::memory:",
        ])
        .unwrap();

        match config.command {
            Command::CreateUser {
                username,
                staff,
                superuser,
                email,
                database_url,
                ..
            } => {
                assert_eq!(username, "admin");
                assert!(staff);
                assert!(!superuser);
                assert_eq!(email, "");
                assert_eq!(database_url, "sqlite::memory:");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
