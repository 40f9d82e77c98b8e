use std::path::{Path, PathBuf};

use crate::adapters::audit::json_audit_logger::JsonAuditLogger;
use crate::adapters::stores::SelectedLocator;
use crate::adapters::x509::X509Decoder;
use crate::cli::{Cli, OutputFormat};
use crate::config::app_config::{AppConfig, BackendKind};
use crate::config::layout::{self, StoreLayout};
use crate::core::errors::Result;
use crate::core::services::certificate_service::CertificateService;
use crate::core::services::key_file_resolver::KeyFileResolver;

/// Everything a command needs, resolved once from flags, environment
/// and the configuration file (in that order of precedence).
#[derive(Debug, Clone)]
pub struct Context {
    pub config: AppConfig,
    pub layout: StoreLayout,
    pub backend: BackendKind,
    pub format: OutputFormat,
}

impl Context {
    pub fn resolve(cli: &Cli) -> Result<Self> {
        // The config file itself lives under the user data dir, so only
        // the flag or the platform default can locate it.
        let bootstrap_user_dir = match &cli.user_data_dir {
            Some(dir) => dir.clone(),
            None => layout::default_user_data_dir()?,
        };
        let state_dir = bootstrap_user_dir.join("certstore");
        let config = AppConfig::discover(cli.config.as_deref(), &state_dir)?;

        let layout = StoreLayout {
            machine_data_dir: pick(
                cli.machine_data_dir.as_deref(),
                config.paths.machine_data_dir.as_deref(),
            )
            .unwrap_or_else(layout::default_machine_data_dir),
            user_data_dir: match (&cli.user_data_dir, &config.paths.user_data_dir) {
                (Some(dir), _) => dir.clone(),
                (None, Some(dir)) => dir.clone(),
                (None, None) => bootstrap_user_dir,
            },
            user_key_dir_name: config
                .paths
                .user_key_dir_name
                .clone()
                .unwrap_or_else(layout::default_user_key_dir_name),
        };

        let backend = config
            .store
            .backend
            .unwrap_or_else(BackendKind::platform_default);

        Ok(Self {
            config,
            layout,
            backend,
            format: cli.format,
        })
    }

    /// The store a command targets: `--store` or the configured default.
    pub fn store_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_string)
            .unwrap_or_else(|| self.config.store.default_name.clone())
    }

    pub fn locator(&self) -> Result<SelectedLocator> {
        SelectedLocator::new(self.backend, self.layout.clone())
    }

    pub fn service(&self) -> Result<CertificateService<SelectedLocator, X509Decoder>> {
        Ok(CertificateService {
            locator: self.locator()?,
            decoder: X509Decoder,
            resolver: KeyFileResolver::new(self.layout.key_directories()),
        })
    }

    /// The audit logger, unless auditing is disabled.
    pub fn audit_logger(&self) -> Option<JsonAuditLogger> {
        self.config
            .audit
            .enabled
            .then(|| JsonAuditLogger::from_config(&self.layout.state_dir(), &self.config.audit))
    }
}

fn pick(flag: Option<&Path>, configured: Option<&Path>) -> Option<PathBuf> {
    flag.or(configured).map(Path::to_path_buf)
}
