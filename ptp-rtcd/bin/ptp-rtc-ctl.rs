#![forbid(unsafe_code)]

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::io::Result<std::process::ExitCode> {
    ptp_rtcd::ctl_main().await
}
