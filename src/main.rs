use anyhow::{Context, Result};
use caption_gen::catalog::{self, TemplateCatalog};
use caption_gen::pipeline::{run_pipeline, CaptionBundle, PipelineConfig, UserInput};
use caption_gen::{config, extract, llm, publish, search};
use clap::Parser;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

mod cli;

use cli::{Command, ExtractArgs, GenerateArgs, PostArgs, RootArgs};

fn main() -> Result<()> {
    config::load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = RootArgs::parse();
    match args.command {
        Command::Generate(args) => cmd_generate(args),
        Command::Post(args) => cmd_post(args),
        Command::ExtractTemplate(args) => cmd_extract(args),
    }
}

fn cmd_generate(args: GenerateArgs) -> Result<()> {
    let bundle = generate_bundle(&args.user_input, &args.templates, args.model.as_deref())?;

    if let Some(out) = &args.out {
        write_json(out, &bundle)?;
        println!("Wrote result bundle to {}", out.display());
    }
    println!("{}", bundle.final_caption);
    Ok(())
}

fn cmd_post(args: PostArgs) -> Result<()> {
    // Publishing credentials are checked up front so a missing token fails
    // the job before any model call is paid for.
    let publish_creds = config::publish_credentials()?;

    let bundle = generate_bundle(&args.user_input, &args.templates, args.model.as_deref())?;

    let instagram =
        publish::InstagramClient::new(publish_creds.ig_user_id, publish_creds.ig_access_token);
    let published_id = publish::publish_urls(&instagram, &args.image_urls, &bundle.final_caption)?;

    println!("Published carousel {published_id}");
    println!("{}", bundle.final_caption);
    Ok(())
}

fn cmd_extract(args: ExtractArgs) -> Result<()> {
    let model_creds = config::model_credentials()?;
    let caption_text = std::fs::read_to_string(&args.caption)
        .with_context(|| format!("read caption {}", args.caption.display()))?;
    let mut catalog = load_catalog(&args.templates)?;

    let model = llm::OpenAiClient::new(model_creds.api_key);
    let template = extract::extract_template(&model, &caption_text, &catalog)?;

    if args.append {
        catalog.categories.push(template);
        write_json(&args.templates, &catalog)?;
        println!("Appended template to {}", args.templates.display());
    } else {
        println!(
            "{}",
            serde_json::to_string_pretty(&template).context("serialize template")?
        );
    }
    Ok(())
}

/// Run the caption pipeline for one job described by input files.
fn generate_bundle(
    user_input_path: &Path,
    templates_path: &Path,
    model_override: Option<&str>,
) -> Result<CaptionBundle> {
    let model_creds = config::model_credentials()?;
    let search_creds = config::search_credentials()?;

    let user_input: UserInput = read_json(user_input_path)?;
    let catalog = load_catalog(templates_path)?;

    let model = llm::OpenAiClient::new(model_creds.api_key);
    let search = search::GoogleSearch::new(search_creds.api_key, search_creds.engine_id);

    let mut pipeline_config = PipelineConfig::default();
    if let Some(name) = model_override {
        pipeline_config.model = name.to_string();
    }

    let bundle = run_pipeline(&model, &search, &user_input, &catalog, &pipeline_config)?;
    Ok(bundle)
}

/// Load and validate a template catalog file.
fn load_catalog(path: &Path) -> Result<TemplateCatalog> {
    let catalog: TemplateCatalog = read_json(path)?;
    catalog::validate(&catalog)?;
    Ok(catalog)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value =
        serde_json::from_str(&content).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize output")?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
