use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

const EXAMPLE_BATCH: &str = r#"{
  "nodes": [
    {
      "mode": "update",
      "id": "status",
      "properties": { "styleDisplay": "none" }
    },
    {
      "mode": "update",
      "id": "list",
      "tag": "ul",
      "children": [
        {
          "tag": "li",
          "id": "item3",
          "position": 3,
          "properties": { "innerHtml": "Third item", "class": "fresh" },
          "events": [ { "event": "click", "signal": "s3", "exposed": true } ]
        }
      ]
    }
  ]
}
"#;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory holding the batch descriptions
    #[arg(short, long, default_value = "mutations")]
    pub input_dir: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing domsync project...".bright_blue().bold());

    let input_dir = PathBuf::from(cwd).join(&args.input_dir);
    if !input_dir.exists() {
        fs::create_dir_all(&input_dir)?;
        println!("  {} Created {}/", "✓".green(), args.input_dir);
    }

    let example_file = input_dir.join("example.json");
    if !example_file.exists() {
        fs::write(&example_file, EXAMPLE_BATCH)?;
        println!("  {} Created example.json", "✓".green());
    }

    let config = Config {
        input_dir: args.input_dir.clone(),
        out_dir: Some("dist".to_string()),
        ..Config::default()
    };
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {}/example.json", args.input_dir);
    println!("  2. Run: domsync render");
    println!("  3. Check output in dist/");

    Ok(())
}
