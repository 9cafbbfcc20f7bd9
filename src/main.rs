fn main() {
    if let Err(err) = emotion_report::run() {
        log::error!("Report generation failed: {err:#}");
        std::process::exit(1);
    }
}
