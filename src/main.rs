use chrono::Utc;
use clap::Parser;
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

use wave_codegen::cli::Args;
use wave_codegen::config::Config;
use wave_codegen::credits::CreditStore;
use wave_codegen::export;
use wave_codegen::fallback::{Orchestrator, RetryPolicy, Router};
use wave_codegen::log::{self, ArtifactLog};
use wave_codegen::provider;
use wave_codegen::session::{submit_and_export, ChatSession, SessionOptions, Turn};
use wave_codegen::ux;
use wave_codegen::wire::StylePreferences;

fn style_from_args(args: &Args) -> StylePreferences {
    let mut style = StylePreferences::default();
    if let Some(c) = &args.color { style.primary_color = c.clone(); }
    if let Some(f) = &args.fonts { style = style.with_font_pair(f); }
    if let Some(d) = args.density { style.layout_density = d; }
    style
}

/// Prints transcript entries added since `*shown`.
fn flush_messages(session: &ChatSession, shown: &mut usize) {
    for m in &session.messages()[*shown..] {
        ux::print_message(m);
    }
    *shown = session.messages().len();
}

async fn run_turn(session: &mut ChatSession, store: &CreditStore, input: &str, out_dir: &Path) -> anyhow::Result<Turn> {
    let pb = ux::spinner("Generating your website...");
    let res = submit_and_export(session, store, input, out_dir).await;
    pb.finish_and_clear();

    let (turn, summary) = res?;
    if let Some(sum) = summary {
        ux::print_export_dashboard(&sum);
    }
    Ok(turn)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    log::init_tracing(args.debug);

    let mut cfg = Config::load(args.config.as_deref().map(Path::new))?;
    cfg.apply_args(&args);
    debug!(code_chain = ?cfg.provider_order, text_chain = ?cfg.text_provider_order, "config loaded");

    let store = CreditStore::new(&cfg.state_path, cfg.max_credits);
    let credits = store.load_for(Utc::now().date_naive());

    let key_status = provider::key_status(&cfg);
    ux::print_key_status(&key_status);

    let router = Router::new(
        Orchestrator::new(provider::make_providers(&cfg.provider_order, &cfg)),
        Orchestrator::new(provider::make_providers(&cfg.text_provider_order, &cfg)),
    );
    debug!(code = ?router.code.provider_names(), text = ?router.text.provider_names(), "provider chains");
    let options = SessionOptions {
        style: style_from_args(&args),
        retry: RetryPolicy {
            attempts: cfg.retry_attempts,
            base_delay: std::time::Duration::from_millis(cfg.retry_base_delay_ms),
        },
        unlock_code: cfg.unlock_code.clone(),
        key_status,
    };

    let txid = Uuid::new_v4();
    let mut session = ChatSession::new(router, credits, options);
    let artifacts = ArtifactLog::new(Path::new(&cfg.root), txid, args.save_request, args.save_response);
    if artifacts.enabled() {
        if args.debug {
            println!("debug: artifacts directory: {}", artifacts.dir().display());
        }
        session = session.with_artifacts(artifacts);
    }

    if let Some(code) = &args.unlock {
        session.unlock(code);
    }

    let out_dir = Path::new(&cfg.out_dir).to_path_buf();
    let mut shown = 0usize;

    let task = match (&args.task, &args.task_file) {
        (Some(t), _) => Some(t.clone()),
        (None, Some(file)) => match session.load_prompt_file(Path::new(file)) {
            Ok(text) => Some(text),
            Err(_) => {
                flush_messages(&session, &mut shown);
                std::process::exit(2);
            }
        },
        (None, None) => None,
    };

    if let Some(task) = task {
        let res = run_turn(&mut session, &store, &task, &out_dir).await;
        flush_messages(&session, &mut shown);
        let turn = res?;
        ux::print_suggestions(session.suggestions());
        if let Turn::Failed { .. } = turn {
            std::process::exit(1);
        }
        return Ok(());
    }

    flush_messages(&session, &mut shown);
    ux::print_credits(session.credits());
    while let Some(line) = ux::read_line(">") {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/credits" => {
                ux::print_credits(session.credits());
                continue;
            }
            "/export" => {
                match session.site() {
                    Some(site) => match export::export_site(&out_dir, site) {
                        Ok(sum) => ux::print_export_dashboard(&sum),
                        Err(e) => warn!(error = %format!("{e:#}"), "export failed"),
                    },
                    None => println!("Nothing generated yet.\n"),
                }
                continue;
            }
            _ => {}
        }

        if let Some(color) = line.strip_prefix("/color ") {
            let style = session.style_mut();
            style.primary_color = color.trim().to_lowercase();
            println!("Primary color: {} ({})\n", style.primary_color, style.primary_hex());
            continue;
        }
        if let Some(pair) = line.strip_prefix("/fonts ") {
            let style = session.style_mut();
            *style = style.clone().with_font_pair(pair.trim());
            println!("Fonts: {} / {}\n", style.heading_font, style.body_font);
            continue;
        }
        if let Some(n) = line.strip_prefix("/density ") {
            match n.trim().parse::<u8>() {
                Ok(d) if d <= 100 => session.style_mut().layout_density = d,
                _ => println!("Density must be a number from 0 to 100.\n"),
            }
            continue;
        }

        if let Some(code) = line.strip_prefix("/unlock ") {
            session.unlock(code);
        } else if let Some(question) = line.strip_prefix("/ask ") {
            let pb = ux::spinner("Thinking...");
            let res = session.ask(question).await;
            pb.finish_and_clear();
            if let Err(e) = res {
                debug!(error = %e, "ask failed");
            }
        } else if line == "/explain" {
            let pb = ux::spinner("Explaining...");
            let res = session.explain().await;
            pb.finish_and_clear();
            if let Err(e) = res {
                debug!(error = %e, "explain failed");
            }
        } else if let Some(path) = line.strip_prefix("/file ") {
            if let Ok(text) = session.load_prompt_file(Path::new(path.trim())) {
                flush_messages(&session, &mut shown);
                if let Err(e) = run_turn(&mut session, &store, &text, &out_dir).await {
                    warn!(error = %format!("{e:#}"), "turn did not complete");
                }
            }
        } else if let Err(e) = run_turn(&mut session, &store, line, &out_dir).await {
            warn!(error = %format!("{e:#}"), "turn did not complete");
        }

        flush_messages(&session, &mut shown);
        ux::print_suggestions(session.suggestions());
        if let Err(e) = store.save(session.credits()) {
            warn!(error = %e, path = %store.path().display(), "could not persist credits");
        }
    }

    store.save(session.credits())?;
    Ok(())
}
