//! Command-line tour of the Bedrock helpers.
//!
//! # Prerequisites
//!
//! AWS credentials with Bedrock model access, e.g. `export AWS_PROFILE=claude`
//! after `aws sso login --profile claude`.
//!
//! # Run
//!
//! ```bash
//! cargo run --example bedrock_demo -- stream "Provide details about beluga"
//! RUST_LOG=bedrock_ox=debug cargo run --example bedrock_demo -- tool
//! ```

use std::path::PathBuf;

use bedrock_ox::prelude::*;
use bedrock_ox::tool::DEFAULT_TOOL_MODEL_ID;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bedrock_demo")]
#[command(about = "Invoke Amazon Bedrock models, agents and Textract")]
struct Args {
    /// Model id for model-backed commands (defaults to BEDROCK_MODEL_ID or Claude 3 Haiku)
    #[arg(long, global = true)]
    model: Option<String>,

    /// AWS region override
    #[arg(long, global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// One-shot model invocation
    Invoke { prompt: String },
    /// Streamed model invocation, printed as it arrives
    Stream { prompt: String },
    /// Describe an image with the Converse API
    DescribeImage { path: PathBuf },
    /// Run a command against a PDF document
    Document {
        path: PathBuf,
        #[arg(default_value = "Summarize the document")]
        command: String,
    },
    /// Send one turn to a Bedrock agent
    Agent {
        prompt: String,
        #[arg(long)]
        agent_id: String,
        #[arg(long)]
        agent_alias_id: String,
        #[arg(long)]
        session_id: String,
    },
    /// Retrieve-and-generate over a knowledge base
    KnowledgeBase {
        text: String,
        #[arg(long)]
        knowledge_base_id: String,
        #[arg(long)]
        model_arn: String,
    },
    /// Tool use round trip with the top-song tool
    Tool {
        #[arg(default_value = "What is the most popular song on WZPZ?")]
        prompt: String,
    },
    /// Extract fields from an identity document with Textract
    AnalyzeId { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = BedrockConfig::from_env();
    if let Some(region) = args.region {
        config.region = Some(region);
    }
    let model_id = args
        .model
        .clone()
        .unwrap_or_else(|| config.model_id.clone());

    match args.command {
        Command::Invoke { prompt } => {
            let bedrock = Bedrock::from_config(&config).await;
            println!("{}", bedrock.invoke_model(&model_id, &prompt).await?);
        }
        Command::Stream { prompt } => {
            let bedrock = Bedrock::from_config(&config).await;
            let text = bedrock
                .invoke_model_with_stream(&model_id, &prompt, StdoutSink::new())
                .await?;
            println!("\n\n{} characters received", text.chars().count());
        }
        Command::DescribeImage { path } => {
            let bedrock = Bedrock::from_config(&config).await;
            println!("{}", bedrock.converse_image_file(&model_id, path).await?);
        }
        Command::Document { path, command } => {
            let bedrock = Bedrock::from_config(&config).await;
            println!(
                "{}",
                bedrock
                    .document_insight_file(&model_id, path, &command)
                    .await?
            );
        }
        Command::Agent {
            prompt,
            agent_id,
            agent_alias_id,
            session_id,
        } => {
            let agent = BedrockAgent::from_config(&config).await;
            let invocation = AgentInvocation::builder()
                .agent_id(agent_id)
                .agent_alias_id(agent_alias_id)
                .session_id(session_id)
                .input_text(prompt)
                .build();
            agent.invoke_agent(&invocation, StdoutSink::new()).await?;
            println!();
        }
        Command::KnowledgeBase {
            text,
            knowledge_base_id,
            model_arn,
        } => {
            let agent = BedrockAgent::from_config(&config).await;
            println!(
                "{}",
                agent
                    .query_knowledge_base(&knowledge_base_id, &text, &model_arn)
                    .await?
            );
        }
        Command::Tool { prompt } => {
            let bedrock = Bedrock::from_config(&config).await;
            // The default chat model is not tool-capable everywhere.
            let tool_model = args.model.as_deref().unwrap_or(DEFAULT_TOOL_MODEL_ID);
            println!("{}", bedrock.use_tool(tool_model, &prompt, &TopSongTool).await?);
        }
        Command::AnalyzeId { path } => {
            let textract = Textract::from_config(&config).await;
            for field in textract.analyze_id_file(path).await? {
                match field.confidence {
                    Some(confidence) => {
                        println!("{}: {} ({confidence:.1}%)", field.kind, field.value);
                    }
                    None => println!("{}: {}", field.kind, field.value),
                }
            }
        }
    }

    Ok(())
}
