use std::io::{self, Read, Write};

use clap::{Parser, Subcommand};
use colored::Colorize;

use card_dealer::client::admin::{
    establish_session, AdminPanel, AuthOutcome, StatsSummary,
};
use card_dealer::client::claim::{render_result, ClaimForm};
use card_dealer::client::{ApiClient, ClientError};
use card_dealer::models::cards::{CardFilter, CardUpdate};
use card_dealer::models::users::UserUpdate;

const ADMIN_PASSWORD_ENV: &str = "CARD_DEALER_ADMIN_PASSWORD";

#[derive(Parser)]
#[command(version, about = "Reward card claim and administration client", long_about = None)]
struct Args {
    /// Server base URL
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    server: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Claim your reward cards
    Claim {
        /// Account identifier
        uid: String,
        /// Contact (QQ) number; it doubles as the claim password
        contact: String,
    },
    /// Administration commands (password required)
    Admin {
        /// Admin password; falls back to CARD_DEALER_ADMIN_PASSWORD,
        /// then to an interactive prompt
        #[arg(short, long)]
        password: Option<String>,
        #[command(subcommand)]
        command: AdminCommand,
    },
}

#[derive(Subcommand)]
enum AdminCommand {
    /// Show user totals and remaining stock
    Stats,
    /// User record management
    Users {
        #[command(subcommand)]
        command: UserCommand,
    },
    /// Card record management
    Cards {
        #[command(subcommand)]
        command: CardCommand,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    /// List users, one page at a time
    List {
        #[arg(short, long, default_value_t = 1)]
        page: i64,
    },
    /// Bulk-import users from freeform text (file path, or - for stdin)
    Import { input: String },
    /// Edit a user record
    Edit {
        id: i32,
        #[arg(long)]
        nickname: Option<String>,
        #[arg(long)]
        contact: Option<String>,
        #[arg(long)]
        reward_count: Option<i32>,
        #[arg(long)]
        has_claimed: Option<bool>,
    },
    /// Delete a user record
    Delete { id: i32 },
}

#[derive(Subcommand)]
enum CardCommand {
    /// List cards, one page at a time
    List {
        #[arg(short, long, default_value_t = 1)]
        page: i64,
        #[arg(long)]
        value: Option<i32>,
        #[arg(long)]
        used: Option<bool>,
    },
    /// Bulk-add codes at one face value (file path, or - for stdin)
    Add {
        #[arg(long)]
        value: i32,
        input: String,
    },
    /// Edit a card record
    Edit {
        id: i32,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        value: Option<i32>,
        #[arg(long)]
        used: Option<bool>,
    },
    /// Delete a card record
    Delete { id: i32 },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let result = match args.command {
        Command::Claim { uid, contact } => run_claim(&args.server, uid, contact).await,
        Command::Admin { password, command } => {
            run_admin(&args.server, password, command).await
        }
    };

    if let Err(error) = result {
        eprintln!("{}", error.to_string().red());
        std::process::exit(1);
    }
}

async fn run_claim(server: &str, uid: String, contact: String) -> Result<(), anyhow::Error> {
    let client = ApiClient::new(server);
    let form = ClaimForm { uid, contact };

    match form.submit(&client).await {
        Ok(result) => {
            print!("{}", render_result(&result));
            Ok(())
        }
        Err(validation) => Err(anyhow::anyhow!(validation)),
    }
}

async fn run_admin(
    server: &str,
    password: Option<String>,
    command: AdminCommand,
) -> Result<(), anyhow::Error> {
    let stored = password.or_else(|| std::env::var(ADMIN_PASSWORD_ENV).ok());

    let server_url = server.to_string();
    let fetch = |password: String| {
        let server_url = server_url.clone();
        async move {
            let client = ApiClient::new(server_url).with_admin_password(password);
            match client.stats().await {
                Ok(stats) => AuthOutcome::Authorized(stats),
                Err(ClientError::Unauthorized) => AuthOutcome::Rejected,
                Err(error) => AuthOutcome::Unreachable(error.to_string()),
            }
        }
    };

    let (password, stats) = establish_session(stored, fetch, prompt_password).await?;

    let client = ApiClient::new(server).with_admin_password(password);
    let mut panel = AdminPanel::new(client);

    match command {
        AdminCommand::Stats => {
            print_stats(&StatsSummary::from(&stats));
        }
        AdminCommand::Users { command } => run_user_command(&mut panel, command).await?,
        AdminCommand::Cards { command } => run_card_command(&mut panel, command).await?,
    }

    Ok(())
}

async fn run_user_command(
    panel: &mut AdminPanel,
    command: UserCommand,
) -> Result<(), anyhow::Error> {
    match command {
        UserCommand::List { page } => {
            panel.users_page = page.max(1);
            panel.load_users().await?;

            for user in &panel.users {
                println!(
                    "{:>5}  {:<16} {:<20} {:<14} {:>4}  {}",
                    user.id,
                    user.uid,
                    user.nickname,
                    user.contact,
                    user.reward_count,
                    if user.has_claimed {
                        "claimed".green()
                    } else {
                        "unclaimed".yellow()
                    }
                );
            }
            println!("{}", panel.users_page_label());
        }
        UserCommand::Import { input } => {
            let text = read_input(&input)?;
            let message = panel.import_users(&text).await?;
            println!("{}", message.green());
        }
        UserCommand::Edit {
            id,
            nickname,
            contact,
            reward_count,
            has_claimed,
        } => {
            let data = UserUpdate {
                nickname,
                contact,
                reward_count,
                has_claimed,
            };
            let user = panel.save_user(id, &data).await?;
            println!("updated user {} ({})", user.id, user.nickname);
        }
        UserCommand::Delete { id } => {
            panel.remove_user(id).await?;
            println!("deleted user {}", id);
        }
    }

    Ok(())
}

async fn run_card_command(
    panel: &mut AdminPanel,
    command: CardCommand,
) -> Result<(), anyhow::Error> {
    match command {
        CardCommand::List { page, value, used } => {
            panel.set_card_filter(CardFilter { value, used });
            panel.cards_page = page.max(1);
            panel.load_cards().await?;

            for card in &panel.cards {
                println!(
                    "{:>5}  {:<24} {:>4}  {}  {}",
                    card.id,
                    card.code,
                    card.value,
                    if card.is_used {
                        "used".yellow()
                    } else {
                        "free".green()
                    },
                    card.used_by.as_deref().unwrap_or("-"),
                );
            }
            println!("{}", panel.cards_page_label());
        }
        CardCommand::Add { value, input } => {
            let content = read_input(&input)?;
            let message = panel.add_cards(&content, value).await?;
            println!("{}", message.green());
        }
        CardCommand::Edit {
            id,
            code,
            value,
            used,
        } => {
            let data = CardUpdate {
                code,
                value,
                is_used: used,
            };
            let card = panel.save_card(id, &data).await?;
            println!("updated card {} ({})", card.id, card.code);
        }
        CardCommand::Delete { id } => {
            panel.remove_card(id).await?;
            println!("deleted card {}", id);
        }
    }

    Ok(())
}

fn print_stats(summary: &StatsSummary) {
    println!(
        "users:  {} total, {} claimed",
        summary.total_users, summary.claimed_users
    );
    println!(
        "stock:  10 => {}, 5 => {}, 3 => {}, 1 => {}",
        summary.stock_10, summary.stock_5, summary.stock_3, summary.stock_1
    );
}

fn prompt_password() -> Option<String> {
    print!("admin password: ");
    io::stdout().flush().ok()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line).ok()?;

    let password = line.trim();
    if password.is_empty() {
        None
    } else {
        Some(password.to_string())
    }
}

fn read_input(input: &str) -> Result<String, anyhow::Error> {
    if input == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(std::fs::read_to_string(input)?)
    }
}
