use agent_templates::adk::model::GeminiProvider;
use agent_templates::adk::runner::{final_responses, Runner};
use agent_templates::adk::session::{InMemorySessionService, SessionService};
use agent_templates::templates::deploy::{
    self, AgentEngineClient, CloudConfig, GcloudTokenSource, VertexEndpoint,
};
use agent_templates::templates::{console, server, Template};
use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with a template interactively
    Run {
        #[arg(short, long, value_enum)]
        template: Template,

        /// Topic for templates that read one from state
        #[arg(long)]
        topic: Option<String>,

        #[arg(long, default_value = "user123")]
        user_id: String,

        #[arg(long, default_value = "session001")]
        session_id: String,
    },
    /// Send a single message to a template
    Prompt {
        #[arg(short, long, value_enum)]
        template: Template,

        #[arg(short, long)]
        message: String,

        #[arg(long)]
        topic: Option<String>,
    },
    /// List the available templates
    List,
    /// Deploy a template to Vertex AI Agent Engine
    Deploy {
        #[arg(short, long, value_enum)]
        template: Template,

        /// Directory holding the packaged artifact
        #[arg(long, default_value = deploy::DEFAULT_DEPLOYMENT_DIR)]
        dir: PathBuf,
    },
    /// Exercise a deployed agent
    TestDeployment {
        #[arg(long)]
        resource_id: String,

        #[arg(long, default_value = "test_user")]
        user_id: String,

        #[arg(long, default_value = "What's the weather in Paris?")]
        message: String,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },
}

async fn runner_for(
    template: Template,
    user_id: &str,
    session_id: &str,
    topic: Option<&str>,
) -> anyhow::Result<Runner> {
    let provider = GeminiProvider::from_env()?;
    let agent = template.build(&provider)?;

    let sessions = Arc::new(InMemorySessionService::new());
    sessions
        .create(
            template.package_name(),
            user_id,
            Some(session_id.to_string()),
            template.initial_state(topic),
        )
        .await?;

    Ok(Runner::new(template.package_name(), agent, sessions))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        eprintln!("Warning: .env file not found. Make sure GOOGLE_API_KEY is set in the environment.");
    }
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Run {
            template,
            topic,
            user_id,
            session_id,
        } => {
            let runner = runner_for(template, &user_id, &session_id, topic.as_deref()).await?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            console::run_console(&runner, &user_id, &session_id, stdin, &mut std::io::stdout())
                .await?;
        }
        Commands::Prompt {
            template,
            message,
            topic,
        } => {
            let session_id = uuid::Uuid::new_v4().to_string();
            let runner = runner_for(template, "user", &session_id, topic.as_deref()).await?;
            let events = runner.run("user", &session_id, &message).await?;

            let responses = final_responses(&events);
            if responses.is_empty() {
                println!("Agent: (no final response)");
            }
            for text in responses {
                println!("Agent: {}", text);
            }
        }
        Commands::List => {
            for template in Template::ALL {
                println!(
                    "{:<18} {:<16} {}",
                    template.display_name(),
                    template.package_name(),
                    template.description()
                );
            }
        }
        Commands::Deploy { template, dir } => {
            let config = CloudConfig::from_env(template.needs_rag_corpus())?;
            let endpoint = VertexEndpoint::new(
                config.project.clone(),
                config.location.clone(),
                Arc::new(GcloudTokenSource),
            );
            let client = AgentEngineClient::new(endpoint);

            println!("Deploying {}...", template.display_name());
            match deploy::deploy(template, &config, &client, &dir).await? {
                Some(resource) => println!("\nAgent deployed: {}", resource),
                None => println!("{}", deploy::build_hint(template, &dir)),
            }
        }
        Commands::TestDeployment {
            resource_id,
            user_id,
            message,
        } => {
            let config = CloudConfig::from_env(false)?;
            let endpoint =
                VertexEndpoint::new(config.project, config.location, Arc::new(GcloudTokenSource));
            let client = AgentEngineClient::new(endpoint);

            let session_id = client
                .create_session(&resource_id, &user_id)
                .await
                .context("creating a session on the deployed agent")?;
            println!("Session created: {}", session_id);

            println!("\nTesting agent with query: '{}'", message);
            let texts = client
                .stream_query(&resource_id, &user_id, &session_id, &message)
                .await?;
            println!("{}", texts.concat());
            println!("\nTest completed successfully!");
        }
        Commands::Serve { port } => {
            // Request traces from tower-http; application logs stay on env_logger
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(tracing::Level::INFO)
                .finish();
            if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
                log::warn!("Could not install trace subscriber: {}", e);
            }
            let provider = GeminiProvider::from_env()?;
            server::serve(port, Arc::new(provider)).await?;
        }
    }

    Ok(())
}
