use clap::{Parser, Subcommand};
use skillswap::{
    db,
    repositories::user_repository::SqliteUserRepository,
    services::{
        user_service::{UpdatePasswordRequest, UserService},
        MessageCipher,
    },
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "skillswap-cli")]
#[command(about = "CLI tool for managing SkillSwap users", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Key management commands
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List all users
    List {
        /// Maximum number of users to display
        #[arg(short, long, default_value_t = 100)]
        limit: i64,

        /// Offset for pagination
        #[arg(short = 'o', long, default_value_t = 0)]
        offset: i64,
    },

    /// Verify a user's email without the OTP flow
    Verify {
        /// Email address of the user to verify
        #[arg(short, long)]
        email: String,
    },

    /// Set a new password for a user
    SetPassword {
        /// Email address of the user
        #[arg(short, long)]
        email: String,

        /// New password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Generate a fresh message encryption key
    Generate,
}

async fn get_password(prompt: &str) -> Result<String, Box<dyn std::error::Error>> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

async fn confirm_password(prompt: &str) -> Result<(String, String), Box<dyn std::error::Error>> {
    let password = get_password(prompt).await?;
    let confirm = get_password("Confirm password").await?;
    Ok((password, confirm))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Key generation needs no database
    if let Commands::Key { command } = &cli.command {
        match command {
            KeyCommands::Generate => {
                println!("Generated AES-256 key (base64):");
                println!("{}", MessageCipher::generate_key());
                println!();
                println!("Set this as ENCRYPTION_KEY before starting the server.");
            }
        }
        return Ok(());
    }

    // Connect to database
    let pool = db::create_pool().await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Initialize services
    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let user_service = Arc::new(UserService::new(user_repository));

    match cli.command {
        Commands::Key { .. } => unreachable!("handled above"),

        Commands::User { command } => match command {
            UserCommands::List { limit, offset } => {
                match user_service.list_users(Some(limit), Some(offset)).await {
                    Ok(users) => {
                        if users.is_empty() {
                            println!("No users found.");
                        } else {
                            println!(
                                "{:<5} {:<40} {:<25} {:<10} {:<20}",
                                "ID", "Email", "Name", "Verified", "Created"
                            );
                            println!("{}", "-".repeat(100));
                            for user in users {
                                println!(
                                    "{:<5} {:<40} {:<25} {:<10} {:<20}",
                                    user.id,
                                    user.email,
                                    user.full_name,
                                    if user.email_verified { "Yes" } else { "No" },
                                    user.created_at.as_deref().unwrap_or("N/A")
                                );
                            }
                        }
                    }
                    Err(err) => {
                        eprintln!("❌ Failed to list users: {}", err);
                        std::process::exit(1);
                    }
                }
            }

            UserCommands::Verify { email } => match user_service.find_user_by_email(&email).await {
                Ok(Some(user)) => {
                    if user.email_verified {
                        println!("ℹ️  User '{}' is already verified", email);
                    } else {
                        match user_service.verify_user_email(&email).await {
                            Ok(()) => {
                                println!("✅ User '{}' email verified successfully!", email);
                            }
                            Err(err) => {
                                eprintln!("❌ Failed to verify user: {}", err);
                                std::process::exit(1);
                            }
                        }
                    }
                }
                Ok(None) => {
                    eprintln!("❌ User '{}' not found", email);
                    std::process::exit(1);
                }
                Err(err) => {
                    eprintln!("❌ Failed to find user: {}", err);
                    std::process::exit(1);
                }
            },

            UserCommands::SetPassword { email, password } => {
                match user_service.find_user_by_email(&email).await {
                    Ok(Some(user)) => {
                        let (new_password, password_confirm) = if let Some(pw) = password {
                            (pw.clone(), pw)
                        } else {
                            confirm_password("New password").await?
                        };

                        let request = UpdatePasswordRequest {
                            user_id: user.id,
                            new_password,
                            new_password_confirm: Some(password_confirm),
                        };

                        match user_service.update_password(request).await {
                            Ok(()) => {
                                println!("✅ Password updated successfully for '{}'!", email);
                            }
                            Err(err) => {
                                eprintln!("❌ Failed to update password: {}", err);
                                std::process::exit(1);
                            }
                        }
                    }
                    Ok(None) => {
                        eprintln!("❌ User '{}' not found", email);
                        std::process::exit(1);
                    }
                    Err(err) => {
                        eprintln!("❌ Failed to find user: {}", err);
                        std::process::exit(1);
                    }
                }
            }
        },
    }

    Ok(())
}
