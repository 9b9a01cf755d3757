use mbrs_logger::{LevelFilter, LogFormat, Logger};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn json_file_logging_writes_records() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");

    let logger = Logger::builder()
        .name("mbrs-file-logging")
        .console(false)
        .format(LogFormat::Json)
        .level(LevelFilter::INFO)
        .directory(&log_dir)
        .max_files(2)
        .init()?;

    tracing::info!(slave = 1, "response sent");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(&log_file)?;
    let records = contents
        .lines()
        .map(serde_json::from_str::<serde_json::Value>)
        .collect::<Result<Vec<_>, _>>()?;
    assert!(records.iter().any(|record| record["fields"]["message"] == "response sent"));

    Ok(())
}
