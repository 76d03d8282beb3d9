use blogsmith::imaging::RustBackend;
use blogsmith::{config, generate, output, serve};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blogsmith")]
#[command(about = "Static site generator for a personal Markdown blog")]
#[command(long_about = "\
Static site generator for a personal Markdown blog

Each post is a directory with an index.md and the images it references.
Pages and static files are merged into a single HTML template.

Site structure:

  site/
  ├── site.toml                    # Optional config (gen-config prints one)
  ├── posts/
  │   └── hello-world/             # Post code → build/posts/hello-world.html
  │       ├── index.md             # Front matter: title, date (MM-DD-YYYY), tags
  │       └── diagram.png          # → build/posts/images/hello-world/diagram.png
  ├── pages/
  │   ├── index.html               # Home page, followed by the post list
  │   └── about.md                 # Rendered and linked from the nav bar
  └── static/
      ├── template.html            # {{ content }} and {{ nav_links }}
      └── style.css                # Copied to the output root

Titles come from front matter or the first '# ' heading. A heading like
'# [rust][web] Title' sets the tags when front matter has none.

With --dev (or LIVE_RELOAD set to anything but 0) the site is served after
the build and rebuilt whenever posts/, pages/ or static/ change.")]
#[command(version)]
struct Cli {
    /// Site root containing posts/, pages/, static/ and site.toml
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Serve the build with live reload after building
    #[arg(long)]
    dev: bool,

    /// Dev server host (overrides [serve] host)
    #[arg(long)]
    host: Option<String>,

    /// Dev server port (overrides [serve] port)
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print a stock site.toml with all options documented
    GenConfig,
}

/// `LIVE_RELOAD` enables the dev server unless it is unset, empty or `0`.
fn live_reload_requested(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty() && v != "0")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Some(Command::GenConfig) = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let site_config = config::load_config(&cli.root)?;
    let backend = RustBackend::new();

    println!("==> Building {}", cli.root.display());
    let report = generate::build_site(&site_config, &cli.root, &backend)?;
    output::print_build_output(&report);

    let live_env = std::env::var("LIVE_RELOAD").ok();
    if cli.dev || live_reload_requested(live_env.as_deref()) {
        let host = cli.host.unwrap_or_else(|| site_config.serve.host.clone());
        let port = cli.port.unwrap_or(site_config.serve.port);
        serve::serve(site_config, cli.root, backend, &host, port)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_reload_env_values() {
        assert!(!live_reload_requested(None));
        assert!(!live_reload_requested(Some("")));
        assert!(!live_reload_requested(Some("0")));
        assert!(live_reload_requested(Some("1")));
        assert!(live_reload_requested(Some("yes")));
    }

    #[test]
    fn cli_parses_dev_flags() {
        let cli = Cli::parse_from(["blogsmith", "--dev", "--port", "9000", "--root", "site"]);
        assert!(cli.dev);
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.host, None);
        assert_eq!(cli.root, PathBuf::from("site"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_parses_gen_config() {
        let cli = Cli::parse_from(["blogsmith", "gen-config"]);
        assert!(matches!(cli.command, Some(Command::GenConfig)));
    }
}
