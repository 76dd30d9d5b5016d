use std::path::PathBuf;

use anyhow::{Result, bail};
use gxupload_transfer::{Fingerprint, ResumeStore};

use crate::args::{ResumeArgs, ResumeCommand};
use crate::config::CliConfig;
use crate::ui::resume_table;

pub fn run(args: ResumeArgs, config: &CliConfig) -> Result<()> {
    match args.command {
        ResumeCommand::List { storage } => {
            let store = open_store(storage, config)?;
            let records = store.list();
            if records.is_empty() {
                println!("No resume records in {}", store.path().display());
            } else {
                println!("{}", resume_table(&records));
            }
        }
        ResumeCommand::Clear {
            storage,
            fingerprint,
        } => {
            let store = open_store(storage, config)?;
            let fingerprint = Fingerprint::from_raw(fingerprint);
            if store.lookup(&fingerprint).is_none() {
                println!(
                    "{fingerprint} not found in {}, nothing to clear",
                    store.path().display()
                );
                return Ok(());
            }
            store.remove(&fingerprint)?;
            println!("Removed {fingerprint} from {}", store.path().display());
        }
    }
    Ok(())
}

fn open_store(flag: Option<PathBuf>, config: &CliConfig) -> Result<ResumeStore> {
    match config.storage(flag.as_deref()) {
        Some(path) => Ok(ResumeStore::new(path)),
        None => bail!("no resume store given, pass --storage or set \"storage\" in the config file"),
    }
}
