use clap::Parser;
use migration::MigratorTrait;
use parsim_lib::{
    config::{Command, Config},
    error::StoreError,
    models::UserForm,
    server::run_server,
    store::users,
};
use sea_orm::{Database, DatabaseConnection};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let config = Config::parse();

    // Initialize logger based on command
    let log_level = match &config.command {
        Command::Serve(serve_config) => serve_config.log_level.as_str(),
        _ => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match config.command {
        Command::Serve(serve_config) => {
            run_server(serve_config).await?;
        }
        Command::Migrate { database_url } => {
            run_migrations(&database_url).await?;
        }
        Command::CreateUser {
            username,
            password,
            email,
            staff,
            superuser,
            database_url,
        } => {
            let mut form = UserForm::new(username, password);
            form.email = email;
            form.is_staff = staff || superuser;
            form.is_superuser = superuser;
            create_user(&database_url, form).await?;
        }
        Command::ListUsers { database_url } => {
            list_users(&database_url).await?;
        }
        Command::DeleteUser {
            username,
            database_url,
        } => {
            delete_user(&database_url, &username).await?;
        }
    }

    Ok(())
}

async fn connect(database_url: &str) -> anyhow::Result<DatabaseConnection> {
    log::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn run_migrations(database_url: &str) -> anyhow::Result<()> {
    log::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    log::info!("Running database migrations...");
    migration::Migrator::up(&db, None).await?;

    println!("✅ Database migrations completed successfully!");

    Ok(())
}

/// Store errors carry per-field messages; flatten them for the terminal.
fn cli_error(err: StoreError) -> anyhow::Error {
    match err {
        StoreError::Validation(errors) => {
            let lines: Vec<String> = errors
                .fields()
                .flat_map(|field| {
                    errors
                        .get(field)
                        .unwrap_or_default()
                        .iter()
                        .map(move |msg| format!("{field}: {msg}"))
                })
                .collect();
            anyhow::anyhow!("Invalid user:\n  {}", lines.join("\n  "))
        }
        other => anyhow::Error::new(other),
    }
}

async fn create_user(database_url: &str, form: UserForm) -> anyhow::Result<()> {
    let db = connect(database_url).await?;

    let user = users::create(&db, form).await.map_err(cli_error)?;

    println!("✅ User created successfully!");
    println!("   ID: {}", user.id);
    println!("   Username: {}", user.username);
    if user.is_superuser {
        println!("   Role: superuser");
    } else if user.is_staff {
        println!("   Role: staff");
    }

    Ok(())
}

async fn list_users(database_url: &str) -> anyhow::Result<()> {
    let db = connect(database_url).await?;

    let mut page_number = 1;
    let mut printed_header = false;
    loop {
        let page = users::list(&db, page_number, 100).await?;
        if page.count == 0 {
            println!("No users found.");
            break;
        }
        if !printed_header {
            println!("Users:");
            println!(
                "{:<5} {:<20} {:<30} {:<6} {:<20}",
                "ID", "Username", "Email", "Staff", "Date Joined"
            );
            println!("{}", "-".repeat(85));
            printed_header = true;
        }
        for user in &page.results {
            println!(
                "{:<5} {:<20} {:<30} {:<6} {:<20}",
                user.id,
                user.username,
                user.email,
                if user.is_staff { "yes" } else { "no" },
                user.date_joined.format("%Y-%m-%d %H:%M:%S")
            );
        }
        if page_number >= page.total_pages {
            break;
        }
        page_number += 1;
    }

    Ok(())
}

async fn delete_user(database_url: &str, username: &str) -> anyhow::Result<()> {
    let db = connect(database_url).await?;

    match users::find_by_username(&db, username).await? {
        Some(user) => {
            users::delete(&db, user.id).await?;
            println!("✅ User '{}' deleted successfully!", user.username);
        }
        None => {
            anyhow::bail!("User '{}' not found", username);
        }
    }

    Ok(())
}
