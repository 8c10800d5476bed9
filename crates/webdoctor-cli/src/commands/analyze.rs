//! One-shot critique command.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use webdoctor_capture::{CaptureConfig, ChromeCapture};
use webdoctor_core::analyze::model::{AnalysisRequest, UploadedFile};
use webdoctor_core::analyze::Analyzer;
use webdoctor_core::config::AppConfig;
use webdoctor_core::vision::VisionClient;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Image file path, image URL, or webpage URL to critique
    pub input: String,

    /// Model to use for the critique
    #[arg(long)]
    pub model: Option<String>,
}

pub async fn execute(args: AnalyzeArgs) -> Result<()> {
    let mut config = AppConfig::from_env()?;
    if let Some(model) = args.model {
        config.model = model;
    }

    let api_key = config.api_key.clone().ok_or_else(|| {
        anyhow::anyhow!(
            "OPENAI_API_KEY environment variable not set.\n\
             Set it with: export OPENAI_API_KEY=your-key"
        )
    })?;

    let request = build_request(&args.input)?;

    let vision = VisionClient::new(&config.api_base, &api_key, &config.model);
    let capture = ChromeCapture::new(CaptureConfig {
        timeout: config.screenshot_timeout,
        executable: config.chrome_executable.clone(),
    });
    let analyzer = Analyzer::new(Some(vision), Arc::new(capture), config.screenshot_policy);

    println!("{} Analyzing: {}", "→".dimmed(), args.input);
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    spinner.set_message("Waiting for the critique...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));

    let result = analyzer.analyze(request).await;
    spinner.finish_and_clear();

    match result {
        Ok(critique) => {
            println!("{} Analysis complete\n", "✓".green().bold());
            println!("{}", critique);
            Ok(())
        }
        Err(err) => Err(anyhow::anyhow!(err.user_message())),
    }
}

/// Local files become uploads; anything else goes through the URL path.
fn build_request(input: &str) -> Result<AnalysisRequest> {
    let path = Path::new(input);
    if path.is_file() {
        let bytes = std::fs::read(path)?;
        let media_type = media_type_from_extension(path);
        return Ok(AnalysisRequest::UploadedFile(UploadedFile { bytes, media_type }));
    }

    if !input.starts_with("http://") && !input.starts_with("https://") {
        anyhow::bail!("Input is neither an existing file nor an http(s) URL: {}", input);
    }

    Ok(AnalysisRequest::from_parts(Some(input.to_string()), None)?)
}

fn media_type_from_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let media_type = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => return None,
    };
    Some(media_type.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_maps_to_media_type() {
        assert_eq!(
            media_type_from_extension(Path::new("shot.PNG")),
            Some("image/png".to_string())
        );
        assert_eq!(
            media_type_from_extension(Path::new("photo.jpeg")),
            Some("image/jpeg".to_string())
        );
        assert_eq!(media_type_from_extension(Path::new("notes.txt")), None);
    }

    #[test]
    fn urls_are_not_treated_as_files() {
        let req = build_request("https://example.com/shot.png").unwrap();
        assert!(matches!(req, AnalysisRequest::ImageUrl(_)));
    }
}
