use mbrs_logger::{LevelFilter, LogFormat, Logger};

#[test]
fn console_only_has_no_file_output() {
    let logger = Logger::builder()
        .name("mbrs-console-only")
        .format(LogFormat::Pretty)
        .level(LevelFilter::DEBUG)
        .init()
        .expect("logger should initialize");

    assert!(!logger.has_file_output(), "console-only logger should not start a file writer");
}
