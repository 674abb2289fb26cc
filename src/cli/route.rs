//! CLI route: single route table and run context. Dispatches to the tree service and presentation.

use crate::cli::output::{
    format_pending_text, format_roots_json, format_roots_text, format_witness_json,
};
use crate::cli::parse::{Cli, Commands};
use crate::config::{ConfigLoader, SyncConfig};
use crate::document::DocumentLeafWriter;
use crate::error::{StorageError, SyncError};
use crate::scheduler::BuildScheduler;
use crate::service::MerkleTreeService;
use crate::store::Storage;
use crate::types::{hash_from_hex, hash_to_hex, Hash};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Load configuration for a CLI invocation and fold in flag overrides.
pub fn resolve_config(cli: &Cli) -> Result<SyncConfig, SyncError> {
    let mut config = match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load(&cli.workspace)?,
    };
    if let Some(ref store) = cli.store {
        config.storage.path = store.clone();
    }
    if let Some(ref database) = cli.database {
        config.tree.database = database.clone();
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.logging.format = format.clone();
    }
    ConfigLoader::validated(config)
}

/// Runtime context for CLI execution: opened store and the tree service.
pub struct RunContext {
    config: SyncConfig,
    storage: Storage,
    service: Arc<MerkleTreeService>,
}

impl RunContext {
    pub fn new(config: SyncConfig) -> Result<Self, SyncError> {
        let storage = Storage::open(&config.storage.path)?;
        let service = Arc::new(MerkleTreeService::open(&storage, &config.tree.database)?);
        Ok(Self {
            config,
            storage,
            service,
        })
    }

    pub fn service(&self) -> &MerkleTreeService {
        &self.service
    }

    /// Execute a command and return its printable output.
    pub fn execute(&self, command: &Commands) -> Result<String, SyncError> {
        let output = match command {
            Commands::Create { height } => {
                let height = height.unwrap_or(self.config.tree.default_height);
                let record = self.service.create(height)?;
                format!(
                    "Created tree '{}' with height {}\nroot {}",
                    self.service.database(),
                    height,
                    hash_to_hex(&record.root)
                )
            }
            Commands::AddLeaf { index, hash } => {
                let leaf = self.service.add_leaf_to_pool(*index, parse_hash(hash)?)?;
                format!("Queued leaf {} (seq {})", leaf.index, leaf.seq)
            }
            Commands::AddDocument { content } => {
                let leaf = DocumentLeafWriter::new(&self.service).index_document(content.as_bytes())?;
                format!("Queued document at leaf {}\nhash {}", leaf.index, hash_to_hex(&leaf.hash))
            }
            Commands::RemoveDocument { index } => {
                DocumentLeafWriter::new(&self.service).remove_document(*index)?;
                format!("Queued removal of leaf {}", index)
            }
            Commands::Build { amount } => {
                let amount = amount.unwrap_or(self.config.tree.build_batch_size);
                let report = self.service.try_build(amount)?;
                match report.record {
                    Some(record) => format!(
                        "Built {} leaves at version {}\nroot {}",
                        report.leaves_applied,
                        record.version,
                        hash_to_hex(&report.root)
                    ),
                    None => format!("Nothing to build\nroot {}", hash_to_hex(&report.root)),
                }
            }
            Commands::Height => match self.service.get_height()? {
                Some(height) => height.to_string(),
                None => "Tree not created".to_string(),
            },
            Commands::Roots { format } => {
                let records = self.service.root_records()?;
                match format.as_str() {
                    "json" => format_roots_json(&records),
                    _ => format_roots_text(&records),
                }
            }
            Commands::Pending { limit } => format_pending_text(&self.service.pending_leaves(*limit)?),
            Commands::Node { root, level, index } => {
                let value = self.service.get_node(&parse_hash(root)?, *level, *index)?;
                hash_to_hex(&value)
            }
            Commands::Witness { root, index } => {
                let witness = self.service.get_witness(&parse_hash(root)?, *index)?;
                format_witness_json(*index, &witness)
            }
            Commands::NextIndex => self.service.next_leaf_index()?.to_string(),
            Commands::Status => {
                let height = match self.service.get_height()? {
                    Some(height) => height.to_string(),
                    None => "not created".to_string(),
                };
                let root = match self.service.latest_root()? {
                    Some(record) => format!("{} (version {})", hash_to_hex(&record.root), record.version),
                    None => "none".to_string(),
                };
                format!(
                    "database {}\nheight {}\nroot {}\npending {}\nnext index {}",
                    self.service.database(),
                    height,
                    root,
                    self.service.pending_count(),
                    self.service.peek_leaf_index()?
                )
            }
            Commands::Watch { interval_ms } => {
                let interval = interval_ms.unwrap_or(self.config.tree.build_interval_ms);
                self.watch(Duration::from_millis(interval))?
            }
        };
        self.storage.flush()?;
        Ok(output)
    }

    fn watch(&self, interval: Duration) -> Result<String, SyncError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| SyncError::Storage(StorageError::IoError(e)))?;
        let scheduler = BuildScheduler::new(
            Arc::clone(&self.service),
            interval,
            self.config.tree.build_batch_size,
        );
        let stats = runtime.block_on(async move {
            let handle = scheduler.spawn();
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for Ctrl-C; stopping");
            }
            info!("Interrupt received, stopping scheduler");
            handle.shutdown().await
        });
        Ok(format!(
            "Stopped after {} builds ({} leaves, {} failures)",
            stats.builds, stats.leaves_applied, stats.failures
        ))
    }
}

fn parse_hash(s: &str) -> Result<Hash, SyncError> {
    hash_from_hex(s).map_err(|e| SyncError::ConfigError(format!("Invalid hash '{}': {}", s, e)))
}
