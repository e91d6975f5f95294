// ==========================================
// 船员轮换系统 - 命令行入口
// ==========================================
// 子命令:
//   derive <grid.csv|grid.xlsx>  推导首次轮换月份，输出 JSON
//   locks [db_path]              列出已锁定的船组
// ==========================================

use crew_rotation::app::get_default_db_path;
use crew_rotation::engine::{FirstRotationDeriver, LockLedger, LockStore};
use crew_rotation::i18n::t;
use crew_rotation::importer::UniversalGridParser;
use crew_rotation::repository::LockRepository;
use serde_json::json;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    crew_rotation::logging::init();

    tracing::info!("{} {}", crew_rotation::APP_NAME, crew_rotation::VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        Some("derive") => match args.get(1) {
            Some(path) => derive(path),
            None => usage(),
        },
        Some("locks") => {
            let db_path = args.get(1).cloned().unwrap_or_else(get_default_db_path);
            locks(&db_path)
        }
        _ => usage(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "命令执行失败");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn usage() -> anyhow::Result<()> {
    Err(anyhow::anyhow!(t("cli.usage")))
}

fn derive(path: &str) -> anyhow::Result<()> {
    let mut grid = UniversalGridParser.parse(path)?;
    let annotated = FirstRotationDeriver::annotate(&mut grid);
    tracing::info!(path, rows = annotated, "首次轮换月份推导完成");
    println!("{}", serde_json::to_string_pretty(&grid)?);
    Ok(())
}

fn locks(db_path: &str) -> anyhow::Result<()> {
    let store: Arc<dyn LockStore> = Arc::new(LockRepository::new(db_path)?);
    let ledger = LockLedger::rehydrate(store)?;
    let entries = ledger.entries();

    if entries.is_empty() {
        println!("{}", t("cli.no_locks"));
        return Ok(());
    }

    let listing: Vec<_> = entries
        .iter()
        .map(|e| {
            json!({
                "group_key": e.group_key,
                "lock_id": e.lock_id,
                "person_ids": e.person_ids,
                "locked_at": e.locked_at.to_rfc3339(),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}
