use fs_err as fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Installs the global subscriber. `RUST_LOG` wins over the `--debug` flag.
pub fn init_tracing(debug: bool) {
    let default = if debug { "wave_codegen=debug,info" } else { "wave_codegen=info,warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .compact()
        .try_init();
}

pub struct SavedPaths {
    pub dir: PathBuf,
    pub request: Option<PathBuf>,
    pub response: Option<PathBuf>,
}

fn tx_dir(root: &Path, tx: Uuid) -> PathBuf {
    root.join(".wave").join("tx").join(tx.to_string())
}

/// Per-run directory for the prompts sent and raw responses received.
#[derive(Debug, Clone)]
pub struct ArtifactLog {
    dir: PathBuf,
    save_request: bool,
    save_response: bool,
}

impl ArtifactLog {
    pub fn new(root: &Path, tx: Uuid, save_request: bool, save_response: bool) -> Self {
        Self { dir: tx_dir(root, tx), save_request, save_response }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn enabled(&self) -> bool {
        self.save_request || self.save_response
    }

    pub fn save_stage(&self, stage: &str, prompt: &str, response: Option<&str>) -> anyhow::Result<SavedPaths> {
        let mut request_path = None;
        let mut response_path = None;
        if !self.enabled() {
            return Ok(SavedPaths { dir: self.dir.clone(), request: None, response: None });
        }
        fs::create_dir_all(&self.dir)?;

        if self.save_request {
            let p = self.dir.join(format!("{stage}.prompt.txt"));
            fs::write(&p, prompt)?;
            request_path = Some(p);
        }

        if let (true, Some(body)) = (self.save_response, response) {
            let p = self.dir.join(format!("{stage}.response.txt"));
            fs::write(&p, body)?;
            response_path = Some(p);
        }

        Ok(SavedPaths { dir: self.dir.clone(), request: request_path, response: response_path })
    }
}

pub fn describe_saved(stage: &str, saved: &SavedPaths) -> Vec<String> {
    let mut out = vec![format!("[{stage}] artifacts directory: {}", saved.dir.display())];
    match &saved.request {
        Some(p) => out.push(format!("[{stage}] prompt saved at: {}", p.display())),
        None => out.push(format!("[{stage}] prompt not saved (flag off)")),
    }
    match &saved.response {
        Some(p) => out.push(format!("[{stage}] response saved at: {}", p.display())),
        None => out.push(format!("[{stage}] response not saved")),
    }
    out
}
