use crate::config::Config;
use crate::batch::BatchFile;
use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use domsync_dom::escape::sanitize;
use domsync_dom::{RenderSession, UserAgent};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    /// Markup for a first render, created elements only
    Html,
    /// Update script for elements already on the client
    Js,
}

impl Target {
    fn extension(self) -> &'static str {
        match self {
            Target::Html => "html",
            Target::Js => "js",
        }
    }
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Batch file or directory (defaults to the configured input directory)
    pub path: Option<String>,

    /// Output kind
    #[arg(short, long, value_enum, default_value = "js")]
    pub target: Target,

    /// Render for this user agent (e.g. ie8, gecko)
    #[arg(short, long)]
    pub agent: Option<String>,

    /// Render for a client without scripting
    #[arg(long)]
    pub no_script: bool,

    /// Output to stdout instead of files
    #[arg(long)]
    pub stdout: bool,

    /// Output directory (overrides config)
    #[arg(short, long)]
    pub out_dir: Option<String>,
}

pub fn render(args: RenderArgs, cwd: &str) -> Result<()> {
    let mut config = Config::load(cwd)?;
    if let Some(agent) = &args.agent {
        config.client.agent = parse_agent(agent)?;
    }
    if args.no_script {
        config.client.scripting = false;
    }

    let input = match &args.path {
        Some(path) => PathBuf::from(cwd).join(path),
        None => config.get_input_dir(cwd),
    };
    if !input.exists() {
        return Err(anyhow!("Input does not exist: {:?}", input));
    }

    let (root, files) = if input.is_file() {
        let root = input.parent().map(Path::to_path_buf).unwrap_or_default();
        (root, vec![input.clone()])
    } else {
        (input.clone(), find_batch_files(&input))
    };

    if !args.stdout {
        println!("{}", "🔨 Rendering mutation batches...".bright_blue().bold());
    }
    if files.is_empty() {
        println!("{}", "⚠️  No .json files found".yellow());
        return Ok(());
    }

    let out_dir = PathBuf::from(cwd).join(
        args.out_dir
            .clone()
            .or_else(|| config.out_dir.clone())
            .unwrap_or_else(|| "dist".to_string()),
    );

    let mut success_count = 0;
    let mut error_count = 0;

    for file in &files {
        let relative_path = file.strip_prefix(&root).unwrap_or(file);
        let result = render_file(file, args.target, &config).and_then(|output| {
            if args.stdout {
                println!("{}", output);
                Ok("stdout".to_string())
            } else {
                let output_file = out_dir
                    .join(relative_path)
                    .with_extension(args.target.extension());
                if let Some(parent) = output_file.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&output_file, output)?;
                Ok(output_file.display().to_string())
            }
        });

        match result {
            Ok(destination) => {
                success_count += 1;
                if !args.stdout {
                    println!(
                        "  {} {} → {}",
                        "✓".green(),
                        relative_path.display(),
                        destination
                    );
                }
            }
            Err(e) => {
                error_count += 1;
                eprintln!(
                    "  {} {} - {}",
                    "✗".red(),
                    relative_path.display(),
                    e.to_string().red()
                );
            }
        }
    }

    info!(rendered = success_count, failed = error_count, "Rendered batches");

    if args.stdout {
        return if error_count == 0 {
            Ok(())
        } else {
            Err(anyhow!("{} batches failed to render", error_count))
        };
    }

    println!();
    if error_count == 0 {
        println!(
            "{} Rendered {} batches successfully",
            "✅".green(),
            success_count
        );
    } else {
        println!(
            "{} Rendered {} batches, {} errors",
            "⚠️".yellow(),
            success_count,
            error_count
        );
    }

    Ok(())
}

fn parse_agent(name: &str) -> Result<UserAgent> {
    serde_json::from_value(serde_json::Value::String(name.to_string()))
        .map_err(|_| anyhow!("Unknown user agent: {}", name))
}

fn find_batch_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.path().to_path_buf())
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    files.sort();
    files
}

#[instrument(skip(config), fields(target = ?target))]
fn render_file(path: &Path, target: Target, config: &Config) -> Result<String> {
    let bytes = fs::read(path)?;
    let nodes = BatchFile::parse(&sanitize(&bytes))?.build()?;
    debug!(roots = nodes.len(), "Loaded batch");
    render_nodes(nodes, target, &mut config.session())
}

fn render_nodes(
    nodes: Vec<domsync_dom::MutationNode>,
    target: Target,
    session: &mut RenderSession,
) -> Result<String> {
    match target {
        Target::Js => Ok(session.render_script(nodes)?),
        Target::Html => {
            let mut html = String::new();
            let mut script = String::new();
            let mut timeouts = Vec::new();
            for node in nodes {
                let output = session.render_markup(node)?;
                html.push_str(&output.html);
                html.push('\n');
                script.push_str(&output.script);
                timeouts.extend(output.timeouts);
            }
            script.push_str(&session.timeout_script(&timeouts));
            if !script.is_empty() {
                html.push_str("<script type=\"text/javascript\">\n");
                html.push_str(&script);
                html.push_str("</script>\n");
            }
            Ok(html)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCH: &str = r#"{
        "nodes": [
            { "tag": "div", "id": "w1", "timeout": { "delayMs": 100 }, "methods": ["focus()"] }
        ]
    }"#;

    #[test]
    fn test_render_file_as_html() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.json");
        fs::write(&path, BATCH).unwrap();

        let output = render_file(&path, Target::Html, &Config::default()).unwrap();
        assert_eq!(
            output,
            "<div id=\"w1\"></div>\n\
             <script type=\"text/javascript\">\n\
             var j0=Wt.$('w1');\nj0.focus();\n\
             APP._p_.addTimerEvent('w1', 100,-1);\n\
             </script>\n"
        );
    }

    #[test]
    fn test_render_file_as_script_rejects_created_roots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.json");
        fs::write(&path, BATCH).unwrap();

        assert!(render_file(&path, Target::Js, &Config::default()).is_err());
    }

    #[test]
    fn test_find_batch_files_recurses() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("nested/a.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = find_batch_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "json"));
    }

    #[test]
    fn test_parse_agent() {
        assert_eq!(parse_agent("ie8").unwrap(), UserAgent::Ie8);
        assert_eq!(parse_agent("webKit").unwrap(), UserAgent::WebKit);
        assert!(parse_agent("netscape").is_err());
    }
}
