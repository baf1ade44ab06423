//! Panic hook for crash reporting

use backtrace::Backtrace;
use chrono::Local;
use std::panic::PanicHookInfo;

/// Initialize the panic hook for crash reporting
pub fn init_panic_hook() {
    std::panic::set_hook(Box::new(panic_handler));
    tracing::debug!("Panic hook initialized");
}

fn panic_handler(info: &PanicHookInfo) {
    let thread = std::thread::current();
    let report = crash_report(
        thread.name().unwrap_or("<unnamed>"),
        &format!("{:?}", info.location()),
        &payload_message(info.payload()),
        &format!("{:?}", Backtrace::new()),
    );

    // 1. Log to stderr (always available)
    eprintln!("{}", report);

    // 2. Log via tracing (file writer may already be gone)
    tracing::error!("{}", report);

    // 3. Write crash dump file
    let dump_filename = format!(
        "site_survey_viewer_crash_{}.txt",
        Local::now().format("%Y%m%d_%H%M%S")
    );
    let dump_path = std::env::temp_dir().join(&dump_filename);

    if let Err(e) = std::fs::write(&dump_path, &report) {
        eprintln!("Failed to write crash dump: {}", e);
    } else {
        eprintln!("Crash report written to {}", dump_path.display());
    }
}

fn payload_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<unknown>".to_string()
    }
}

fn crash_report(thread: &str, location: &str, payload: &str, backtrace: &str) -> String {
    format!(
        "=== CRITICAL PANIC ===\n\
         Timestamp: {}\n\
         Thread: {}\n\
         Location: {}\n\
         Payload: {}\n\n\
         Stack Trace:\n{}",
        Local::now().to_rfc3339(),
        thread,
        location,
        payload,
        backtrace
    )
}
