//! Web server command.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use webdoctor_capture::{CaptureConfig, ChromeCapture};
use webdoctor_core::analyze::Analyzer;
use webdoctor_core::config::AppConfig;
use webdoctor_core::vision::VisionClient;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, default_value = "3030")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
}

pub async fn execute(args: ServeArgs) -> Result<()> {
    let config = AppConfig::from_env()?;

    let vision = match &config.api_key {
        Some(key) => Some(VisionClient::new(&config.api_base, key, &config.model)),
        None => {
            tracing::warn!("OPENAI_API_KEY is not set; analyze requests will fail until it is");
            None
        }
    };

    let capture = ChromeCapture::new(CaptureConfig {
        timeout: config.screenshot_timeout,
        executable: config.chrome_executable.clone(),
    });

    let analyzer = Arc::new(Analyzer::new(vision, Arc::new(capture), config.screenshot_policy));

    println!();
    println!("  {} {}", "WebDoctor".cyan().bold(), "Web Server".bold());
    println!();
    println!("  {}  http://{}:{}", "Upload page".green(), args.host, args.port);
    println!("  {}          http://{}:{}/api/analyze", "API".green(), args.host, args.port);
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    webdoctor_web::run_server(analyzer, &args.host, args.port).await?;

    Ok(())
}
