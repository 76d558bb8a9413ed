use domain::{Delivery, PollOutcome, Transcriber};
use log::{error, info, warn};
use service::{config::Config, logging::Logger};

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!(
        "Starting speechkit_transcriber {} for {}",
        clap::crate_version!(),
        config.audio_file().display()
    );

    let transcriber = match Transcriber::from_config(&config) {
        Ok(transcriber) => transcriber,
        Err(e) => {
            error!("Invalid configuration: {e}");
            println!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut job = match transcriber.start(config.audio_file()).await {
        Ok(job) => job,
        Err(e) => {
            error!("Failed to start transcription: {e}");
            println!("Error: {e}");
            std::process::exit(1);
        }
    };

    let delivery = tokio::select! {
        delivery = job.delivery() => delivery,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling transcription");
            job.cancel();
            job.delivery().await
        }
    };

    if let Some(delivery) = &delivery {
        if *delivery == Delivery::TimedOut {
            warn!("Operation did not finish within {:?}", config.poll_timeout());
        }
        println!("{delivery}");
    }

    // Cleanup of the uploaded object finishes here, after the result is printed.
    match (delivery, job.finish().await) {
        (Some(_), _) => {}
        (None, PollOutcome::Cancelled) => {
            info!("Transcription cancelled");
            std::process::exit(130);
        }
        (None, PollOutcome::Aborted(e)) => {
            error!("Transcription failed: {e}");
            println!("Error: {e}");
            std::process::exit(1);
        }
        (None, outcome) => {
            error!("Transcription ended without a result: {outcome:?}");
            std::process::exit(1);
        }
    }
}
