use clap::{Parser, Subcommand};
use estate_crm::api_client::{CrmApi, HttpApi};
use estate_crm::config::LogConfig;
use estate_crm::create_flow::{CreateFlow, Submission};
use estate_crm::logging;
use estate_crm::models::{Entity, LeadData, LeadDraft, PropertyData, PropertyDraft};
use estate_crm::query_cache::QueryCache;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;

const TOKEN_FILE: &str = ".crm_token";

#[derive(Parser)]
#[command(name = "crm-cli")]
#[command(about = "CLI for the estate CRM API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    CreateLead {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        phone: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(short, long)]
        status: Option<String>,
        #[arg(short, long)]
        budget: Option<f64>,
        #[arg(long)]
        notes: Option<String>,
    },
    CreateProperty {
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        price: Option<f64>,
        #[arg(long = "type")]
        property_type: Option<String>,
        #[arg(short, long)]
        status: Option<String>,
        #[arg(short, long)]
        address: Option<String>,
        #[arg(short, long)]
        city: Option<String>,
        #[arg(short, long)]
        bedrooms: Option<i64>,
        #[arg(long)]
        bathrooms: Option<f64>,
    },
    /// List a collection: leads, properties, agents, messages, activities
    List {
        collection: String,
        #[arg(short, long)]
        search: Option<String>,
    },
    Get {
        collection: String,
        id: String,
    },
    Stats,
    Logout,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let _guard = logging::init(&LogConfig::from_env());

    let cli = Cli::parse();
    let mut api = HttpApi::new(&cli.url);
    if let Ok(token) = fs::read_to_string(TOKEN_FILE) {
        api = api.with_token(token.trim());
    }

    match cli.command {
        Commands::Login { username, password } => {
            let body = json!({ "username": username, "password": password });
            match api.post_json("/api/auth/login", &body).await {
                Ok(response) => {
                    let login: LoginResponse = serde_json::from_value(response)?;
                    fs::write(TOKEN_FILE, login.token)?;
                    println!("Logged in. Token saved to {TOKEN_FILE}");
                }
                Err(err) => println!("Login failed: {err}"),
            }
        }
        Commands::CreateLead {
            first_name,
            last_name,
            email,
            phone,
            source,
            status,
            budget,
            notes,
        } => {
            let draft = LeadDraft {
                first_name,
                last_name,
                email,
                phone,
                source,
                status,
                budget,
                notes,
                ..Default::default()
            };
            let flow = CreateFlow::new(api, QueryCache::new());
            let outcome = flow.submit::<LeadData>(draft).await;
            report(&flow, outcome).await?;
        }
        Commands::CreateProperty {
            title,
            price,
            property_type,
            status,
            address,
            city,
            bedrooms,
            bathrooms,
        } => {
            let draft = PropertyDraft {
                title,
                price,
                property_type,
                status,
                address,
                city,
                bedrooms,
                bathrooms,
                ..Default::default()
            };
            let flow = CreateFlow::new(api, QueryCache::new());
            let outcome = flow.submit::<PropertyData>(draft).await;
            report(&flow, outcome).await?;
        }
        Commands::List { collection, search } => {
            let path = format!("/api/{collection}");
            let listed = match search {
                Some(search) => api.get_json_with_query(&path, &[("search", search.as_str())]).await?,
                None => api.get_json(&path).await?,
            };
            print_json(listed)?;
        }
        Commands::Get { collection, id } => {
            print_json(api.get_json(&format!("/api/{collection}/{id}")).await?)?;
        }
        Commands::Stats => {
            print_json(api.get_json("/api/dashboard/stats").await?)?;
        }
        Commands::Logout => {
            let _ = fs::remove_file(TOKEN_FILE);
            println!("Logged out (token removed).");
        }
    }

    Ok(())
}

/// Prints the outcome of a create and, on success, follows the redirect by
/// loading the refreshed list through the cache.
async fn report<T: Entity>(
    flow: &CreateFlow<HttpApi>,
    outcome: Submission<T>,
) -> Result<(), Box<dyn std::error::Error>> {
    match outcome {
        Submission::Invalid { errors, .. } => {
            println!("Please fix the following fields:");
            for field in &errors.errors {
                println!("  {}: {}", field.field, field.message);
            }
        }
        Submission::Created {
            record,
            redirect,
            notice,
        } => {
            println!("{}: {}", notice.title, notice.description);
            println!("id: {}", record.id);
            println!("-> {redirect}");
            print_json(flow.list::<T>().await?)?;
        }
        Submission::Failed { notice, error, .. } => {
            println!("{}: {}", notice.title, notice.description);
            println!("({error})");
        }
    }
    Ok(())
}

fn print_json(value: Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
