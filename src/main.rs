use anyhow::Context;
use mailcanon::capability::RawMessageParser;
use mailcanon::config::PipelineConfig;
use mailcanon::message::standardize::SourceRecord;
use mailcanon::pipeline::MessagePipeline;
use mailcanon::rfc822::Rfc822Parser;

/// Parse .eml files given on the command line, normalize them, group them
/// into conversations, and print the result as JSON.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("Usage: mailcanon <message.eml> [more.eml ...]");
        std::process::exit(1);
    }

    let parser = Rfc822Parser::new();
    let mut records = Vec::with_capacity(paths.len());
    for path in &paths {
        let raw = std::fs::read(path).with_context(|| format!("reading {path}"))?;
        let parsed = parser
            .parse(&raw)
            .with_context(|| format!("parsing {path}"))?;
        records.push(SourceRecord::Rfc822(parsed));
    }

    let pipeline = MessagePipeline::new(PipelineConfig::default());
    let messages = pipeline.ingest(records).await;

    for message in &messages {
        tracing::info!(
            id = %message.id,
            subject = %message.subject,
            preview = %pipeline.preview(message),
            "Normalized message"
        );
    }

    let conversations = pipeline.group(messages);
    println!("{}", serde_json::to_string_pretty(&conversations)?);
    Ok(())
}
