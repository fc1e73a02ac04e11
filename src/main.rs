use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use sentinel_core::env::{GITHUB_API_URL, GITHUB_TOKEN, PR_NUMBER};
use sentinel_core::{EnvSnapshot, RunMode, SentinelConfig, CONFIG_FILE_NAME};
use sentinel_difflens::collect::{BranchName, GitDiff};
use sentinel_review::gateway::LlmGateway;
use sentinel_review::github::GitHubClient;
use sentinel_review::workflow::{run_explain, run_review, ExplainOutcome, Workflow};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sentinel",
    version,
    about = "AI pull request reviewer and explainer for CI",
    long_about = "Sentinel sends the sanitized diff of a pull request to an LLM and writes the\n\
                   result back to GitHub: a risk-gated APPROVE / REQUEST_CHANGES review, or a\n\
                   plain-language explanation of the change.\n\n\
                   Examples:\n  \
                     sentinel review                 Review HEAD against origin/$DEFAULT_BRANCH\n  \
                     sentinel explain                Explain the PR named by $PR_NUMBER\n  \
                     sentinel doctor                 Check setup and environment"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .sentinel.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose (debug) logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Review the current change and post an approve/request-changes review
    #[command(long_about = "Review the current change with an LLM.\n\n\
        Diffs HEAD against origin/$DEFAULT_BRANCH (default: main), truncates and\n\
        redacts it, asks the configured providers for a review, and posts it on\n\
        $PR_NUMBER as APPROVE, or REQUEST_CHANGES when the review mentions a high\n\
        risk. Without $PR_NUMBER the review is printed and nothing is posted.\n\n\
        Required: $GITHUB_TOKEN and the primary provider key (default $OPENROUTER_API_KEY).")]
    Review {
        /// Repository checkout to diff (default: current directory)
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
    /// Explain a pull request in a comment, or ask for a proper description
    #[command(long_about = "Explain the pull request named by $PR_NUMBER.\n\n\
        If the PR body is empty or just the unfilled template, the body is replaced\n\
        with a fill-in outline and a comment asks the author to complete it; no\n\
        model is called. Otherwise the explanation is posted as a comment.\n\n\
        Required: $GITHUB_TOKEN, $GITHUB_REPOSITORY, $PR_NUMBER and the primary key.")]
    Explain {
        /// Repository checkout to diff and read the PR template from
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
    /// Create a default .sentinel.toml configuration file
    #[command(long_about = "Create a default .sentinel.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if the file already exists.")]
    Init,
    /// Check your Sentinel setup and environment
    #[command(long_about = "Check your Sentinel setup and environment.\n\n\
        Reports the git checkout, config file, provider keys and models, base branch,\n\
        repository, PR number and PR template. Use --format json for machine-readable\n\
        output.")]
    Doctor {
        /// Repository checkout to inspect
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Text,
    /// Machine-readable JSON
    Json,
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<SentinelConfig> {
    let cwd = std::env::current_dir().into_diagnostic()?;
    let config = SentinelConfig::discover(explicit, &cwd)?;
    tracing::debug!(
        primary = %config.primary.name,
        fallback = %config.fallback.name,
        fallback_models = config.fallback.models.len(),
        "configuration loaded"
    );
    Ok(config)
}

fn github_client(env: &EnvSnapshot) -> Result<GitHubClient> {
    let token = env.require(GITHUB_TOKEN)?;
    let client = match env.get(GITHUB_API_URL) {
        Some(url) => GitHubClient::with_base_uri(token, url)?,
        None => GitHubClient::new(token)?,
    };
    Ok(client)
}

fn spinner(message: &'static str) -> Option<indicatif::ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    Some(pb)
}

fn finish(spinner: Option<indicatif::ProgressBar>, message: &'static str) {
    if let Some(pb) = spinner {
        pb.finish_with_message(message);
    }
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");
    if use_color {
        println!("\x1b[1msentinel\x1b[0m v{version} - AI pull request review for CI\n");
    } else {
        println!("sentinel v{version} - AI pull request review for CI\n");
    }
    println!("Commands:");
    println!("  review    Review the change and post APPROVE / REQUEST_CHANGES");
    println!("  explain   Explain the PR in a comment");
    println!("  init      Create a .sentinel.toml config file");
    println!("  doctor    Check your setup and environment");
}

#[derive(serde::Serialize)]
struct CheckResult {
    name: &'static str,
    status: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "pass",
            detail: detail.into(),
            hint: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: "fail",
            detail: detail.into(),
            hint: Some(hint.into()),
        }
    }

    fn info(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "info",
            detail: detail.into(),
            hint: None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self.status {
            "pass" => "\u{2713}",
            "fail" => "\u{2717}",
            _ => "~",
        }
    }

    fn colored_symbol(&self) -> String {
        match self.status {
            "pass" => "\x1b[32m\u{2713}\x1b[0m".into(),
            "fail" => "\x1b[31m\u{2717}\x1b[0m".into(),
            _ => "\x1b[33m~\x1b[0m".into(),
        }
    }
}

fn run_doctor(
    config_path: Option<&Path>,
    env: &EnvSnapshot,
    repo: &Path,
    format: OutputFormat,
    use_color: bool,
) -> Result<()> {
    let mut checks: Vec<CheckResult> = Vec::new();

    let root = repo.canonicalize().unwrap_or_else(|_| repo.to_path_buf());
    match root.ancestors().find(|dir| dir.join(".git").exists()) {
        Some(dir) => checks.push(CheckResult::pass(
            "git_repository",
            format!("detected at {}", dir.display()),
        )),
        None => checks.push(CheckResult::fail(
            "git_repository",
            "not inside a git repository",
            "run from a checkout with the base branch fetched (fetch-depth: 0)",
        )),
    }

    let config = match SentinelConfig::discover(config_path, &root) {
        Ok(config) => {
            let local = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.join(CONFIG_FILE_NAME));
            if local.exists() {
                checks.push(CheckResult::pass("config_file", local.display().to_string()));
            } else {
                checks.push(CheckResult::info(
                    "config_file",
                    "not found, using defaults (run `sentinel init`)",
                ));
            }
            config
        }
        Err(e) => {
            checks.push(CheckResult::fail(
                "config_file",
                e.to_string(),
                "fix the file or delete it to use defaults",
            ));
            SentinelConfig::default()
        }
    };

    if env.is_set(GITHUB_TOKEN) {
        checks.push(CheckResult::pass("github_token", "GITHUB_TOKEN set"));
    } else {
        checks.push(CheckResult::fail(
            "github_token",
            "GITHUB_TOKEN not set",
            "expose secrets.GITHUB_TOKEN to the job",
        ));
    }

    let primary = &config.primary;
    let primary_model = primary.models.first().map_or("<none>", String::as_str);
    if env.is_set(&primary.api_key_env) {
        checks.push(CheckResult::pass(
            "primary_provider",
            format!("{} ({primary_model}), {} set", primary.name, primary.api_key_env),
        ));
    } else {
        checks.push(CheckResult::fail(
            "primary_provider",
            format!("{} not set", primary.api_key_env),
            format!("export {}=<key>", primary.api_key_env),
        ));
    }

    let fallback = &config.fallback;
    if env.is_set(&fallback.api_key_env) {
        checks.push(CheckResult::pass(
            "fallback_provider",
            format!("{} ({} models), {} set", fallback.name, fallback.models.len(), fallback.api_key_env),
        ));
    } else {
        checks.push(CheckResult::info(
            "fallback_provider",
            format!("{} not set, fallback disabled", fallback.api_key_env),
        ));
    }

    match BranchName::parse(env.default_branch()) {
        Ok(branch) => checks.push(CheckResult::pass(
            "base_branch",
            format!("diffs against {}", branch.merge_base_range()),
        )),
        Err(e) => checks.push(CheckResult::fail(
            "base_branch",
            e.to_string(),
            "DEFAULT_BRANCH may only contain letters, digits, '_' and '-'",
        )),
    }

    match env.repository() {
        Ok(slug) => checks.push(CheckResult::pass("repository", slug.to_string())),
        Err(sentinel_core::SentinelError::MissingEnv { .. }) => checks.push(CheckResult::info(
            "repository",
            "GITHUB_REPOSITORY not set (required to post)",
        )),
        Err(e) => checks.push(CheckResult::fail(
            "repository",
            e.to_string(),
            "use the owner/repo form",
        )),
    }

    match env.pr_number() {
        Ok(Some(number)) => checks.push(CheckResult::pass("pr_number", format!("#{number}"))),
        Ok(None) => checks.push(CheckResult::info(
            "pr_number",
            format!("{PR_NUMBER} not set (review prints only, explain fails)"),
        )),
        Err(e) => checks.push(CheckResult::fail(
            "pr_number",
            e.to_string(),
            "set PR_NUMBER to github.event.pull_request.number",
        )),
    }

    let template_path = root.join(&config.explain.template_path);
    match sentinel_review::template::load_template(&template_path) {
        Ok(template) if template.is_empty() => checks.push(CheckResult::info(
            "pr_template",
            format!("{} not found", config.explain.template_path.display()),
        )),
        Ok(_) => checks.push(CheckResult::pass(
            "pr_template",
            config.explain.template_path.display().to_string(),
        )),
        Err(e) => checks.push(CheckResult::fail(
            "pr_template",
            e.to_string(),
            "remove HTML comments and <placeholders> from the template",
        )),
    }

    let mode = match env.run_mode() {
        RunMode::Production => "production (errors print message only)",
        RunMode::Development => "development (errors print full diagnostics)",
    };
    checks.push(CheckResult::info("run_mode", mode));

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "checks": checks,
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        OutputFormat::Text => {
            let version = env!("CARGO_PKG_VERSION");
            println!("Sentinel v{version} - Environment Check\n");

            for check in &checks {
                let sym = if use_color {
                    check.colored_symbol()
                } else {
                    check.symbol().to_string()
                };
                let label = check.name.replace('_', " ");
                println!("  {sym} {label:<20} {}", check.detail);
                if let Some(hint) = &check.hint {
                    println!("    hint: {hint}");
                }
            }

            let passed = checks.iter().filter(|c| c.status == "pass").count();
            let failed = checks.iter().filter(|c| c.status == "fail").count();
            let info = checks.iter().filter(|c| c.status == "info").count();
            println!("\n{passed} checks passed, {failed} failed, {info} info");
        }
    }

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Sentinel Configuration
# Secrets are never read from this file; only the names of the variables
# that hold them.

[primary]
# name = "openrouter"
# base_url = "https://openrouter.ai/api/v1"
# api_key_env = "OPENROUTER_API_KEY"
# models = ["tngtech/deepseek-r1t2-chimera:free"]

[fallback]
# name = "together"
# base_url = "https://api.together.xyz/v1"
# api_key_env = "TOGETHER_API_KEY"
# models = [
#     "deepseek-ai/DeepSeek-R1-Distill-Llama-70B-free",
#     "deepseek-ai/DeepSeek-R1-0528",
#     "meta-llama/Llama-3.3-70B-Instruct-Turbo-Free",
# ]

[http]
# timeout_secs = 120

[retry]
# max_attempts = 2
# base_delay_ms = 1000

[review]
# max_diff_size = 7000
# language = "pt-br"

[explain]
# max_diff_size = 5000
# template_path = ".github/pull_request_template.md"
# language = "pt-br"
"#;

async fn run(cli: Cli, env: &EnvSnapshot) -> Result<()> {
    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && !env.is_set("NO_COLOR"),
    };

    match cli.command {
        None => print_welcome(use_color),
        Some(Command::Review { repo }) => {
            let config = load_config(cli.config.as_deref())?;
            env.validate(&Workflow::required_vars(&config))?;
            let gateway = LlmGateway::from_config(&config, env)?;
            let host = github_client(env)?;
            let diffs = GitDiff::new(&repo);
            let flow = Workflow {
                config: &config,
                env,
                gateway: &gateway,
                host: &host,
                diffs: &diffs,
                repo_root: &repo,
            };

            let pb = spinner("Reviewing changes...");
            let outcome = match run_review(&flow).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    finish(pb, "Failed");
                    return Err(e.into());
                }
            };
            finish(pb, "Done");

            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&outcome).into_diagnostic()?);
                }
                OutputFormat::Text => {
                    println!("==== AI Code Review ====");
                    println!("{}", outcome.review);
                    match outcome.posted_to {
                        Some(number) => println!("\n{} posted on #{number}", outcome.event),
                        None => println!("\n{} (not posted, {PR_NUMBER} not set)", outcome.event),
                    }
                }
            }
        }
        Some(Command::Explain { repo }) => {
            let config = load_config(cli.config.as_deref())?;
            env.validate(&Workflow::required_vars(&config))?;
            let gateway = LlmGateway::from_config(&config, env)?;
            let host = github_client(env)?;
            let diffs = GitDiff::new(&repo);
            let flow = Workflow {
                config: &config,
                env,
                gateway: &gateway,
                host: &host,
                diffs: &diffs,
                repo_root: &repo,
            };

            let pb = spinner("Explaining pull request...");
            let outcome = match run_explain(&flow).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    finish(pb, "Failed");
                    return Err(e.into());
                }
            };
            finish(pb, "Done");

            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&outcome).into_diagnostic()?);
                }
                OutputFormat::Text => match outcome {
                    ExplainOutcome::FillInRequested { number } => {
                        println!("PR #{number} had no description; fill-in outline posted.");
                    }
                    ExplainOutcome::Explained {
                        number,
                        explanation,
                        ..
                    } => {
                        println!("{explanation}");
                        println!("\nExplanation posted on #{number}");
                    }
                },
            }
        }
        Some(Command::Init) => {
            let path = cli
                .config
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            if path.exists() {
                miette::bail!("{} already exists", path.display());
            }
            std::fs::write(&path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {} with default configuration", path.display());
        }
        Some(Command::Doctor { repo }) => {
            run_doctor(cli.config.as_deref(), env, &repo, cli.format, use_color)?;
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "sentinel", &mut std::io::stdout());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let env = EnvSnapshot::capture();

    match run(cli, &env).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            match env.run_mode() {
                RunMode::Production => eprintln!("Error: {report}"),
                RunMode::Development => eprintln!("{report:?}"),
            }
            ExitCode::FAILURE
        }
    }
}
