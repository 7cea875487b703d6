//! tb init command implementation
//!
//! Creates the data directory and a default `taskbuddy.toml`, then opens the
//! app so the demo account and its tasks get seeded.

use std::path::{Path, PathBuf};

use crate::app::{App, SeedReport};
use crate::cli::GlobalOptions;
use crate::config::{Config, CONFIG_FILENAME};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::user::{DEMO_EMAIL, DEMO_PASSWORD};

#[derive(serde::Serialize)]
struct InitReport {
    data_dir: PathBuf,
    created: InitCreated,
    seeded: SeedReport,
}

#[derive(serde::Serialize)]
struct InitCreated {
    data_dir: bool,
    config: bool,
}

pub fn run(global: &GlobalOptions) -> Result<()> {
    let data_dir = global.resolve_data_dir()?;

    let created_data_dir = ensure_dir(&data_dir)?;
    let created_config = ensure_config(&data_dir)?;
    let app = App::open(&data_dir)?;
    let seeded = app.seed_report();

    let report = InitReport {
        data_dir: data_dir.clone(),
        created: InitCreated {
            data_dir: created_data_dir,
            config: created_config,
        },
        seeded,
    };

    let nothing_new = !created_data_dir
        && !created_config
        && !seeded.demo_user_created
        && seeded.demo_tasks_created == 0;
    let header = if nothing_new {
        "tb init: nothing to do".to_string()
    } else {
        "tb init: initialized data directory".to_string()
    };

    let mut created_items = Vec::new();
    if created_data_dir {
        created_items.push("data dir".to_string());
    }
    if created_config {
        created_items.push(CONFIG_FILENAME.to_string());
    }
    if seeded.demo_user_created {
        created_items.push("demo user".to_string());
    }
    if seeded.demo_tasks_created > 0 {
        created_items.push(format!("{} demo tasks", seeded.demo_tasks_created));
    }

    let mut human = HumanOutput::new(header);
    human.push_summary("data dir", data_dir.display().to_string());
    human.push_summary(
        "created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    if app.config().demo.seed {
        human.push_next_step(format!("tb login {DEMO_EMAIL} --password {DEMO_PASSWORD}"));
    }
    human.push_next_step("tb register <email> --name <name>");

    emit_success(global.output(), "init", &report, Some(&human))
}

fn ensure_dir(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    std::fs::create_dir_all(path)?;
    Ok(true)
}

fn ensure_config(data_dir: &Path) -> Result<bool> {
    let path = data_dir.join(CONFIG_FILENAME);
    if path.exists() {
        return Ok(false);
    }
    Config::default().save(&path)?;
    Ok(true)
}
